use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::srt::TimingStrategy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: String,
    #[serde(default = "default_ffprobe_bin")]
    pub ffprobe_bin: String,
    #[serde(default = "default_encode_timeout_secs")]
    pub encode_timeout_secs: u64,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_fallback_duration_secs")]
    pub fallback_duration_secs: f64,
    #[serde(default)]
    pub subtitle_timing: TimingStrategy,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("audio")
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_ffmpeg_bin() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_bin() -> String {
    "ffprobe".to_string()
}

fn default_encode_timeout_secs() -> u64 {
    300
}

fn default_probe_timeout_secs() -> u64 {
    30
}

fn default_fallback_duration_secs() -> f64 {
    10.0
}

fn default_frame_rate() -> u32 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio_dir: default_audio_dir(),
            assets_dir: default_assets_dir(),
            output_dir: default_output_dir(),
            temp_dir: default_temp_dir(),
            ffmpeg_bin: default_ffmpeg_bin(),
            ffprobe_bin: default_ffprobe_bin(),
            encode_timeout_secs: default_encode_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            fallback_duration_secs: default_fallback_duration_secs(),
            subtitle_timing: TimingStrategy::default(),
            frame_rate: default_frame_rate(),
        }
    }
}

impl Config {
    /// Default layout rooted at `base`: `audio/`, `assets/` and `output/` beneath it.
    pub fn with_base_dir<P: AsRef<Path>>(base: P) -> Self {
        let base = base.as_ref();
        Self {
            audio_dir: base.join(default_audio_dir()),
            assets_dir: base.join(default_assets_dir()),
            output_dir: base.join(default_output_dir()),
            ..Self::default()
        }
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if fs::metadata(&path).await.is_err() {
            return Ok(Self::default());
        }
        Self::load(path).await
    }

    pub fn validate(&self) -> Result<()> {
        if self.encode_timeout_secs == 0 {
            anyhow::bail!("config.json: encode_timeout_secs must be positive");
        }
        if self.probe_timeout_secs == 0 {
            anyhow::bail!("config.json: probe_timeout_secs must be positive");
        }
        if !(self.fallback_duration_secs.is_finite() && self.fallback_duration_secs > 0.0) {
            anyhow::bail!("config.json: fallback_duration_secs must be a positive number");
        }
        if self.frame_rate == 0 {
            anyhow::bail!("config.json: frame_rate must be positive");
        }
        if self.ffmpeg_bin.is_empty() || self.ffprobe_bin.is_empty() {
            anyhow::bail!("config.json: ffmpeg_bin and ffprobe_bin must not be empty");
        }
        Ok(())
    }

    pub fn encode_timeout(&self) -> Duration {
        Duration::from_secs(self.encode_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}
