use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::AssemblyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeMode {
    /// Background video looped indefinitely under the narration.
    Video,
    /// One still image looped for the length of the narration.
    Image,
}

#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub mode: EncodeMode,
    pub visual_path: PathBuf,
    pub audio_path: PathBuf,
    pub subtitle_path: PathBuf,
    pub output_path: PathBuf,
}

/// libass `force_style` values for the burned-in subtitles.
#[derive(Debug, Clone)]
pub struct SubtitleStyle {
    pub font_name: String,
    pub font_size: u32,
    pub primary_colour: String,
    pub outline_colour: String,
    pub border_style: u32,
    pub outline: u32,
    pub shadow: u32,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_name: "Arial".to_string(),
            font_size: 22,
            primary_colour: "&H00FFFFFF&".to_string(),
            outline_colour: "&H00000000&".to_string(),
            border_style: 1,
            outline: 2,
            shadow: 1,
        }
    }
}

impl SubtitleStyle {
    pub fn force_style(&self) -> String {
        format!(
            "FontName={},FontSize={},PrimaryColour={},OutlineColour={},BorderStyle={},Outline={},Shadow={}",
            self.font_name,
            self.font_size,
            self.primary_colour,
            self.outline_colour,
            self.border_style,
            self.outline,
            self.shadow
        )
    }
}

/// Encoder settings shared by both modes.
#[derive(Debug, Clone)]
pub struct EncodeSettings {
    pub ffmpeg_bin: String,
    pub frame_rate: u32,
    pub style: SubtitleStyle,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
            frame_rate: 30,
            style: SubtitleStyle::default(),
        }
    }
}

/// Escapes a path for use as a quoted value inside a `-vf` filter graph.
///
/// The value is wrapped in single quotes, which keeps `,` `;` `[` `]` literal at the graph
/// level, and `:` is backslash-escaped for the filter's own option parser. On Windows
/// backslash separators become `/`; elsewhere a backslash is part of a file name and is
/// rejected. Quotes and control characters cannot be expressed inside the quoted token
/// and are rejected too.
pub fn escape_filter_path(path: &Path) -> Result<String, AssemblyError> {
    let Some(text) = path.to_str() else {
        return Err(AssemblyError::UnsafeFilterPath(format!(
            "{} is not valid UTF-8",
            path.display()
        )));
    };

    let normalized = normalize_separators(text)?;
    let mut escaped = String::with_capacity(normalized.len() + 8);
    for ch in normalized.chars() {
        match ch {
            '\'' => {
                return Err(AssemblyError::UnsafeFilterPath(format!(
                    "{text} contains a single quote"
                )));
            }
            c if c.is_control() => {
                return Err(AssemblyError::UnsafeFilterPath(format!(
                    "{} contains a control character",
                    text.escape_debug()
                )));
            }
            ':' => escaped.push_str("\\:"),
            c => escaped.push(c),
        }
    }
    Ok(escaped)
}

#[cfg(windows)]
fn normalize_separators(text: &str) -> Result<String, AssemblyError> {
    Ok(text.replace('\\', "/"))
}

#[cfg(not(windows))]
fn normalize_separators(text: &str) -> Result<String, AssemblyError> {
    if text.contains('\\') {
        return Err(AssemblyError::UnsafeFilterPath(format!(
            "{text} contains a backslash"
        )));
    }
    Ok(text.to_string())
}

pub fn subtitle_filter(subtitle_path: &Path, style: &SubtitleStyle) -> Result<String, AssemblyError> {
    Ok(format!(
        "subtitles='{}':force_style='{}'",
        escape_filter_path(subtitle_path)?,
        style.force_style()
    ))
}

/// Full argv (program first) for one encode job.
pub fn build_encode_args(job: &EncodeJob, settings: &EncodeSettings) -> Result<Vec<String>, AssemblyError> {
    let filter = subtitle_filter(&job.subtitle_path, &settings.style)?;

    let mut args = vec![
        settings.ffmpeg_bin.clone(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ];

    match job.mode {
        EncodeMode::Video => args.extend(["-stream_loop".to_string(), "-1".to_string()]),
        EncodeMode::Image => args.extend(["-loop".to_string(), "1".to_string()]),
    }

    args.extend([
        "-i".to_string(),
        job.visual_path.display().to_string(),
        "-i".to_string(),
        job.audio_path.display().to_string(),
        // Never let ffmpeg pick the looping video's own audio track.
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "1:a:0".to_string(),
        "-r".to_string(),
        settings.frame_rate.to_string(),
        "-vf".to_string(),
        filter,
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "23".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "192k".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-shortest".to_string(),
        job.output_path.display().to_string(),
    ]);

    Ok(args)
}

pub fn ffprobe_duration_args(ffprobe_bin: &str, path: &Path) -> Vec<String> {
    vec![
        ffprobe_bin.to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-show_entries".to_string(),
        "format=duration".to_string(),
        "-of".to_string(),
        "default=noprint_wrappers=1:nokey=1".to_string(),
        path.display().to_string(),
    ]
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug)]
pub enum RunError {
    Launch(std::io::Error),
    TimedOut(Duration),
}

/// Runs `args` (program first) with captured output. The child is killed if it is still
/// running when `timeout` elapses.
pub async fn run_cmd_with_timeout(args: &[String], timeout: Duration) -> Result<CommandOutput, RunError> {
    let Some((program, rest)) = args.split_first() else {
        return Err(RunError::Launch(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "empty command line",
        )));
    };

    let child = Command::new(program)
        .args(rest)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(RunError::Launch)?;

    // Dropping the pending wait on timeout drops the child, which kills it.
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(res) => res.map_err(RunError::Launch)?,
        Err(_) => return Err(RunError::TimedOut(timeout)),
    };

    Ok(CommandOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
