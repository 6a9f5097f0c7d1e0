use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use story_shorts::{init, Assembler, AssemblyRequest, Config};

/// Burns a narration script into a looping background as subtitles and muxes in the
/// narration audio.
#[derive(Parser, Debug)]
#[command(name = "story-shorts", version)]
struct Args {
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// JSON request body: { "script", "image", "video", "audio_url", "useVideo" }.
    #[arg(long, conflicts_with_all = ["script", "script_file", "audio", "image", "video", "use_video"])]
    request: Option<PathBuf>,

    #[arg(long, conflicts_with = "script_file")]
    script: Option<String>,

    #[arg(long)]
    script_file: Option<PathBuf>,

    /// Narration file name inside the audio directory.
    #[arg(long)]
    audio: Option<String>,

    /// Still image inside the assets directory.
    #[arg(long)]
    image: Option<String>,

    /// Looping background video inside the assets directory.
    #[arg(long)]
    video: Option<String>,

    /// Loop the video when one is given; `--use-video false` forces the still image.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    use_video: bool,
}

async fn build_request(args: &Args) -> Result<AssemblyRequest> {
    if let Some(path) = &args.request {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read request: {}", path.display()))?;
        return AssemblyRequest::from_json(&text);
    }

    let script_text = match (&args.script, &args.script_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read script: {}", path.display()))?,
        (None, None) => String::new(),
    };

    Ok(AssemblyRequest {
        script_text,
        image_ref: args.image.clone(),
        video_ref: args.video.clone(),
        audio_ref: args.audio.clone(),
        use_video: args.use_video,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = Config::load_or_default(&args.config).await?;

    init::ensure_directories(&cfg).await?;
    if !init::check_ffmpeg(&cfg).await {
        warn!("FFmpeg not found at {:?}. Please install FFmpeg.", cfg.ffmpeg_bin);
    }

    let request = build_request(&args).await?;
    let assembler = Assembler::new(cfg);

    let code = match assembler.assemble(&request).await {
        Ok(path) => {
            info!("Assembly finished");
            println!("{}", path.display());
            0
        }
        Err(err) => {
            error!("Assembly failed ({}): {}", err.status_code(), err);
            if err.is_client_error() { 2 } else { 1 }
        }
    };
    std::process::exit(code);
}
