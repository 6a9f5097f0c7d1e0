use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::config::Config;
use crate::error::ProbeError;
use crate::ffmpeg::{self, CommandOutput, RunError};

/// The two external media operations the pipeline depends on. Tests substitute their own
/// implementation so no real ffmpeg is needed.
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Container duration of `path` in seconds.
    async fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError>;

    /// Runs the encoder argv (program first) and reports how it exited.
    async fn encode(&self, args: &[String], timeout: Duration) -> Result<CommandOutput, RunError>;
}

/// ffprobe/ffmpeg found on `PATH` or at the configured locations.
#[derive(Debug, Clone)]
pub struct FfmpegToolkit {
    ffprobe_bin: String,
    probe_timeout: Duration,
}

impl FfmpegToolkit {
    pub fn new(ffprobe_bin: impl Into<String>, probe_timeout: Duration) -> Self {
        Self {
            ffprobe_bin: ffprobe_bin.into(),
            probe_timeout,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.ffprobe_bin.clone(), cfg.probe_timeout())
    }
}

/// Parses ffprobe's `format=duration` output.
pub fn parse_duration_output(stdout: &str) -> Result<f64, ProbeError> {
    let text = stdout.trim();
    let duration = text
        .parse::<f64>()
        .map_err(|_| ProbeError::NotNumeric(text.to_string()))?;
    if !duration.is_finite() || duration <= 0.0 {
        return Err(ProbeError::OutOfRange(duration));
    }
    Ok(duration)
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError> {
        let args = ffmpeg::ffprobe_duration_args(&self.ffprobe_bin, path);
        let output = match ffmpeg::run_cmd_with_timeout(&args, self.probe_timeout).await {
            Ok(output) => output,
            Err(RunError::Launch(err)) => return Err(ProbeError::Launch(err)),
            Err(RunError::TimedOut(after)) => return Err(ProbeError::Timeout(after)),
        };

        if !output.success() {
            return Err(ProbeError::Exit {
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        parse_duration_output(&output.stdout)
    }

    async fn encode(&self, args: &[String], timeout: Duration) -> Result<CommandOutput, RunError> {
        ffmpeg::run_cmd_with_timeout(args, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_duration() {
        assert_eq!(parse_duration_output("12.345000\n").unwrap(), 12.345);
    }

    #[test]
    fn rejects_unusable_output() {
        assert!(matches!(parse_duration_output("N/A"), Err(ProbeError::NotNumeric(_))));
        assert!(matches!(parse_duration_output(""), Err(ProbeError::NotNumeric(_))));
        assert!(matches!(parse_duration_output("-2.0"), Err(ProbeError::OutOfRange(_))));
        assert!(matches!(parse_duration_output("NaN"), Err(ProbeError::OutOfRange(_))));
        assert!(matches!(parse_duration_output("0"), Err(ProbeError::OutOfRange(_))));
    }

    #[tokio::test]
    async fn absent_ffprobe_is_a_launch_error() {
        let toolkit = FfmpegToolkit::new("ffprobe-missing-7c1e", Duration::from_secs(5));
        let err = toolkit
            .probe_duration(Path::new("/nonexistent.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Launch(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_numeric_probe_output_is_reported() {
        // `echo` stands in for ffprobe and prints its arguments instead of a number.
        let toolkit = FfmpegToolkit::new("echo", Duration::from_secs(5));
        let err = toolkit
            .probe_duration(Path::new("/srv/audio/n.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::NotNumeric(_)));
    }
}
