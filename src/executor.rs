use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::error::{AssemblyError, AssemblyResult};
use crate::ffmpeg::RunError;
use crate::toolkit::MediaToolkit;
use crate::{logi, logok, logw};

/// Runs the encoder and turns its outcome into the finished artifact path.
///
/// Success requires a zero exit status and a non-empty file at `output_path`. On every
/// failure the partially written output is removed.
pub async fn run_encode(
    toolkit: &dyn MediaToolkit,
    args: &[String],
    output_path: &Path,
    timeout: Duration,
) -> AssemblyResult<PathBuf> {
    logi(format!("Running encoder: {}", args.join(" ")));

    let result = execute(toolkit, args, output_path, timeout).await;
    if let Err(err) = &result {
        logw(format!("Encode failed: {}", err));
        discard_partial(output_path).await;
    }
    result
}

async fn execute(
    toolkit: &dyn MediaToolkit,
    args: &[String],
    output_path: &Path,
    timeout: Duration,
) -> AssemblyResult<PathBuf> {
    let tool = args.first().cloned().unwrap_or_else(|| "ffmpeg".to_string());

    let output = match toolkit.encode(args, timeout).await {
        Ok(output) => output,
        Err(RunError::TimedOut(after)) => return Err(AssemblyError::Timeout { tool, after }),
        Err(RunError::Launch(err)) => {
            return Err(AssemblyError::Unexpected(format!(
                "could not launch {}: {}",
                tool, err
            )));
        }
    };

    if !output.success() {
        return Err(AssemblyError::EncodeFailure {
            exit_code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        });
    }

    let size = fs::metadata(output_path).await.map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        return Err(AssemblyError::EncodeFailure {
            exit_code: output.exit_code,
            stderr: format!(
                "encoder exited cleanly but {} is missing or empty",
                output_path.display()
            ),
        });
    }

    logok(format!("Encoded {} ({} bytes)", output_path.display(), size));
    Ok(output_path.to_path_buf())
}

async fn discard_partial(output_path: &Path) {
    if fs::metadata(output_path).await.is_ok() {
        if let Err(err) = fs::remove_file(output_path).await {
            logw(format!(
                "Could not remove partial output {}: {}",
                output_path.display(),
                err
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::ffmpeg::CommandOutput;
    use async_trait::async_trait;

    enum Outcome {
        Exit { code: i32, write: &'static [u8], stderr: &'static str },
        ExitWithoutOutput,
        TimedOut,
        Launch,
    }

    struct ScriptedEncoder(Outcome);

    #[async_trait]
    impl MediaToolkit for ScriptedEncoder {
        async fn probe_duration(&self, _path: &Path) -> Result<f64, ProbeError> {
            Ok(1.0)
        }

        async fn encode(&self, args: &[String], timeout: Duration) -> Result<CommandOutput, RunError> {
            match &self.0 {
                Outcome::Exit { code, write, stderr } => {
                    if let Some(out) = args.last() {
                        fs::write(out, write).await.unwrap();
                    }
                    Ok(CommandOutput {
                        exit_code: Some(*code),
                        stdout: String::new(),
                        stderr: stderr.to_string(),
                    })
                }
                Outcome::ExitWithoutOutput => Ok(CommandOutput {
                    exit_code: Some(0),
                    ..CommandOutput::default()
                }),
                Outcome::TimedOut => Err(RunError::TimedOut(timeout)),
                Outcome::Launch => Err(RunError::Launch(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no such file",
                ))),
            }
        }
    }

    fn argv(out: &Path) -> Vec<String> {
        vec!["ffmpeg".to_string(), out.display().to_string()]
    }

    #[tokio::test]
    async fn clean_exit_with_output_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output_1.mp4");
        let enc = ScriptedEncoder(Outcome::Exit { code: 0, write: b"mp4", stderr: "" });

        let path = run_encode(&enc, &argv(&out), &out, Duration::from_secs(1)).await.unwrap();
        assert_eq!(path, out);
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr_and_removes_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output_2.mp4");
        let enc = ScriptedEncoder(Outcome::Exit {
            code: 1,
            write: b"half",
            stderr: "Error opening input files\n",
        });

        let err = run_encode(&enc, &argv(&out), &out, Duration::from_secs(1)).await.unwrap_err();
        match err {
            AssemblyError::EncodeFailure { exit_code, stderr } => {
                assert_eq!(exit_code, Some(1));
                assert_eq!(stderr, "Error opening input files");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn clean_exit_with_empty_output_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output_3.mp4");
        let enc = ScriptedEncoder(Outcome::Exit { code: 0, write: b"", stderr: "" });

        let err = run_encode(&enc, &argv(&out), &out, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, AssemblyError::EncodeFailure { exit_code: Some(0), .. }));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn clean_exit_without_output_file_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output_6.mp4");
        let enc = ScriptedEncoder(Outcome::ExitWithoutOutput);

        let err = run_encode(&enc, &argv(&out), &out, Duration::from_secs(1)).await.unwrap_err();
        match err {
            AssemblyError::EncodeFailure { exit_code, stderr } => {
                assert_eq!(exit_code, Some(0));
                assert!(stderr.contains("missing or empty"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn timeout_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output_4.mp4");
        let enc = ScriptedEncoder(Outcome::TimedOut);

        let err = run_encode(&enc, &argv(&out), &out, Duration::from_secs(300)).await.unwrap_err();
        match err {
            AssemblyError::Timeout { tool, after } => {
                assert_eq!(tool, "ffmpeg");
                assert_eq!(after, Duration::from_secs(300));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn launch_failure_is_unexpected() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output_5.mp4");
        let enc = ScriptedEncoder(Outcome::Launch);

        let err = run_encode(&enc, &argv(&out), &out, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, AssemblyError::Unexpected(_)));
    }
}
