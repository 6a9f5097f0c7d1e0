use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

use crate::config::Config;
use crate::logi;

pub async fn ensure_directories(cfg: &Config) -> Result<()> {
    for dir in [&cfg.audio_dir, &cfg.assets_dir, &cfg.output_dir] {
        if !Path::new(dir).exists() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            logi(format!("Created directory: {}", dir.display()));
        }
    }
    Ok(())
}

pub async fn check_ffmpeg(cfg: &Config) -> bool {
    match tokio::process::Command::new(&cfg.ffmpeg_bin)
        .arg("-version")
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}
