use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type AssemblyResult<T> = Result<T, AssemblyError>;

/// Failures that abort an assembly request and are reported to the caller.
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("{what} not found: {}", .path.display())]
    MissingInput { what: &'static str, path: PathBuf },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("ffmpeg failed (exit code {}): {stderr}", exit_code_text(.exit_code))]
    EncodeFailure { exit_code: Option<i32>, stderr: String },

    #[error("{tool} timed out after {}s", .after.as_secs())]
    Timeout { tool: String, after: Duration },

    #[error("unsafe path for subtitle filter: {0}")]
    UnsafeFilterPath(String),

    #[error("{0}")]
    Unexpected(String),
}

fn exit_code_text(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

impl AssemblyError {
    /// HTTP-style status class a surrounding service would answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            AssemblyError::MissingInput { .. } => 404,
            AssemblyError::InvalidRequest(_) => 400,
            AssemblyError::Timeout { .. } => 504,
            AssemblyError::EncodeFailure { .. }
            | AssemblyError::UnsafeFilterPath(_)
            | AssemblyError::Unexpected(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    pub(crate) fn missing(what: &'static str, path: impl Into<PathBuf>) -> Self {
        AssemblyError::MissingInput {
            what,
            path: path.into(),
        }
    }
}

impl From<std::io::Error> for AssemblyError {
    fn from(err: std::io::Error) -> Self {
        AssemblyError::Unexpected(err.to_string())
    }
}

/// Why a duration probe could not produce a usable number. Never surfaced past the
/// assembler, which substitutes the fallback duration.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("could not launch ffprobe: {0}")]
    Launch(#[from] std::io::Error),

    #[error("ffprobe exited with code {exit_code:?}: {stderr}")]
    Exit { exit_code: Option<i32>, stderr: String },

    #[error("ffprobe returned a non-numeric duration: {0:?}")]
    NotNumeric(String),

    #[error("ffprobe returned an unusable duration: {0}")]
    OutOfRange(f64),

    #[error("ffprobe timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}
