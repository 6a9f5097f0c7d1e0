use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One export request: the narration script, the narration audio and a background visual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyRequest {
    #[serde(rename = "script", default)]
    pub script_text: String,
    #[serde(rename = "image", default)]
    pub image_ref: Option<String>,
    #[serde(rename = "video", default)]
    pub video_ref: Option<String>,
    #[serde(rename = "audio_url", default)]
    pub audio_ref: Option<String>,
    #[serde(rename = "useVideo", default = "default_use_video")]
    pub use_video: bool,
}

fn default_use_video() -> bool {
    true
}

/// Which background the encoder loops under the narration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualSource<'a> {
    Video(&'a str),
    Image(Option<&'a str>),
}

impl AssemblyRequest {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).with_context(|| "Failed to parse assembly request JSON")
    }

    /// Video mode needs both the flag and a video reference; anything else falls back to
    /// the still image.
    pub fn visual_source(&self) -> VisualSource<'_> {
        match (self.use_video, self.video_ref.as_deref()) {
            (true, Some(video)) if !video.trim().is_empty() => VisualSource::Video(video),
            _ => VisualSource::Image(
                self.image_ref
                    .as_deref()
                    .filter(|image| !image.trim().is_empty()),
            ),
        }
    }
}
