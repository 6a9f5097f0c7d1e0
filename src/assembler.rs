use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{AssemblyError, AssemblyResult};
use crate::executor;
use crate::ffmpeg::{self, EncodeJob, EncodeMode, EncodeSettings};
use crate::paths::AssetResolver;
use crate::request::{AssemblyRequest, VisualSource};
use crate::script::segment_sentences;
use crate::srt::SubtitleTrack;
use crate::toolkit::{FfmpegToolkit, MediaToolkit};
use crate::{logi, logok, logw};

/// Turns assembly requests into subtitled videos. Holds no per-request state, so one
/// instance can serve concurrent requests.
pub struct Assembler {
    cfg: Config,
    resolver: AssetResolver,
    toolkit: Arc<dyn MediaToolkit>,
    settings: EncodeSettings,
}

fn random_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn output_file_name() -> String {
    format!("output_{}.mp4", random_token())
}

impl Assembler {
    pub fn new(cfg: Config) -> Self {
        let toolkit = Arc::new(FfmpegToolkit::from_config(&cfg));
        Self::with_toolkit(cfg, toolkit)
    }

    pub fn with_toolkit(cfg: Config, toolkit: Arc<dyn MediaToolkit>) -> Self {
        let resolver = AssetResolver::new(cfg.audio_dir.clone(), cfg.assets_dir.clone());
        let settings = EncodeSettings {
            ffmpeg_bin: cfg.ffmpeg_bin.clone(),
            frame_rate: cfg.frame_rate,
            ..EncodeSettings::default()
        };
        Self {
            cfg,
            resolver,
            toolkit,
            settings,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Duration of the narration, or the configured fallback when probing fails.
    pub async fn probe_duration(&self, audio_path: &Path) -> f64 {
        match self.toolkit.probe_duration(audio_path).await {
            Ok(duration) => {
                logi(format!("Narration duration: {:.3}s", duration));
                duration
            }
            Err(err) => {
                logw(format!(
                    "Duration probe degraded ({}); using fallback {:.1}s",
                    err, self.cfg.fallback_duration_secs
                ));
                self.cfg.fallback_duration_secs
            }
        }
    }

    async fn resolve_inputs(&self, req: &AssemblyRequest) -> AssemblyResult<(EncodeMode, PathBuf, PathBuf)> {
        let audio_ref = req
            .audio_ref
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| AssemblyError::InvalidRequest("audio_url required".to_string()))?;
        let audio_path = self.resolver.resolve_audio(audio_ref).await?;

        let (mode, visual_path) = match req.visual_source() {
            VisualSource::Video(video) => (
                EncodeMode::Video,
                self.resolver.resolve_asset(video, "video").await?,
            ),
            VisualSource::Image(Some(image)) => (
                EncodeMode::Image,
                self.resolver.resolve_asset(image, "image").await?,
            ),
            VisualSource::Image(None) => {
                return Err(AssemblyError::missing("image", self.cfg.assets_dir.clone()));
            }
        };

        logi(format!(
            "Resolved audio {} and {:?} background {}",
            audio_path.display(),
            mode,
            visual_path.display()
        ));
        Ok((mode, audio_path, visual_path))
    }

    /// Runs the whole pipeline for one request and returns the finished video's path.
    pub async fn assemble(&self, req: &AssemblyRequest) -> AssemblyResult<PathBuf> {
        let (mode, audio_path, visual_path) = self.resolve_inputs(req).await?;

        let duration = self.probe_duration(&audio_path).await;
        let sentences = segment_sentences(&req.script_text);
        let track = SubtitleTrack::build(&sentences, duration, self.cfg.subtitle_timing);
        logi(format!(
            "Built {} subtitle cue(s) over {:.3}s ({:?} timing)",
            track.len(),
            duration,
            self.cfg.subtitle_timing
        ));

        // Removed when it goes out of scope, on success and failure alike.
        let subtitle_file = track.write_temp(&self.cfg.temp_dir).map_err(|e| {
            AssemblyError::Unexpected(format!(
                "could not write subtitle file in {}: {}",
                self.cfg.temp_dir.display(),
                e
            ))
        })?;

        let output_dir = absolute(&self.cfg.output_dir)?;
        tokio::fs::create_dir_all(&output_dir).await?;
        let output_path = output_dir.join(output_file_name());
        let job = EncodeJob {
            mode,
            visual_path,
            audio_path,
            subtitle_path: subtitle_file.path().to_path_buf(),
            output_path,
        };
        let args = ffmpeg::build_encode_args(&job, &self.settings)?;

        let result = executor::run_encode(
            self.toolkit.as_ref(),
            &args,
            &job.output_path,
            self.cfg.encode_timeout(),
        )
        .await;

        if let Err(err) = subtitle_file.close() {
            logw(format!("Could not remove subtitle file: {}", err));
        }

        let output = result?;
        logok(format!("Video ready: {}", output.display()));
        Ok(output)
    }
}

fn absolute(dir: &Path) -> AssemblyResult<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(dir))
}
