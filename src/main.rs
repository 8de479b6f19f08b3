use anyhow::Result;
use clap::{ArgAction, Parser};
use env_logger::Env;
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use embedplayer::controls::ControlIntent;
use embedplayer::engine::{ScriptedFetcher, SimScript, SimulatedEngine};
use embedplayer::host::HeadlessHost;
use embedplayer::loader::EngineLoader;
use embedplayer::player::{PlayerCallbacks, PlayerStatus, VideoPlayer};
use embedplayer::source::VideoDescriptor;
use embedplayer::utils::{format_media_time, load_config, Config};

/// EmbedPlayer - an embeddable video player control layer
///
/// Drives a complete playback session against the simulated provider
/// runtime: resolves the source, mounts a player into a headless host
/// surface, and walks the session to its end.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Video URL or bare media id to play
    #[arg(value_name = "URL_OR_ID")]
    source: Option<String>,

    /// Read the video descriptor from a JSON file instead
    #[arg(long, value_name = "FILE")]
    descriptor: Option<PathBuf>,

    /// Begin playback as soon as the player is ready
    #[arg(short, long)]
    autoplay: bool,

    /// Set initial volume (0-100)
    #[arg(short, long, value_name = "VOLUME", default_value = "70")]
    volume: u32,

    /// Simulated media duration in seconds
    #[arg(long, value_name = "SECONDS", default_value = "30")]
    duration: f64,

    /// Fail playback with this provider error code partway through
    #[arg(long, value_name = "CODE")]
    error_code: Option<u32>,

    /// Use the provider's native controls instead of the custom overlay
    #[arg(long = "no-controls", action = ArgAction::SetFalse)]
    custom_controls: bool,

    /// Simulate a touch-driven host surface
    #[arg(long)]
    touch: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    info!("Starting EmbedPlayer v{}", env!("CARGO_PKG_VERSION"));

    // Player configuration
    let mut config = load_config().unwrap_or_else(|e| {
        warn!("Using default configuration: {}", e);
        Config::default()
    });
    config.player.default_volume = args.volume.min(100);

    // The demo plays against the simulated provider runtime, installed
    // as the process-wide loader the way a real embedding would install
    // the provider script fetcher
    let mut script = SimScript::default().with_duration(args.duration);
    if let Some(code) = args.error_code {
        script = script.with_error_at(args.duration / 3.0, code);
    }
    let engine = Arc::new(SimulatedEngine::new(script));
    let fetcher = Arc::new(ScriptedFetcher::new(engine));
    EngineLoader::install_global(Arc::new(EngineLoader::new(fetcher)));

    let host = if args.touch {
        Arc::new(HeadlessHost::new().with_touch())
    } else {
        Arc::new(HeadlessHost::new())
    };

    let descriptor = build_descriptor(&args)?;
    info!("Playing \"{}\" from {}", descriptor.title, descriptor.raw_url);

    // Build the player; the loader comes from the global install above
    let mut player = VideoPlayer::builder(descriptor)
        .autoplay(args.autoplay)
        .custom_controls(args.custom_controls)
        .config(config)
        .host(host)
        .callbacks(logging_callbacks())
        .build()?;

    let mut status_rx = player.status_updates();
    player.mount();

    // Walk the session from the status stream; without autoplay the
    // first Paused presses play
    let mut pressed_play = false;
    loop {
        if status_rx.changed().await.is_err() {
            break;
        }
        let status = *status_rx.borrow_and_update();
        info!("Status: {}", status);

        match status {
            PlayerStatus::Paused if !args.autoplay && !pressed_play => {
                pressed_play = true;
                player.dispatch(ControlIntent::TogglePlay);
            }
            PlayerStatus::Ended => {
                info!(
                    "Finished at {}",
                    format_media_time(player.state().current_time)
                );
                break;
            }
            PlayerStatus::Error => {
                let state = player.state();
                error!(
                    "Playback failed: {}",
                    state.error_message().unwrap_or("unknown failure")
                );
                break;
            }
            _ => {}
        }
    }

    player.unmount().await;
    info!("EmbedPlayer exited");
    Ok(())
}

/// Build the video descriptor from the command line
fn build_descriptor(args: &Args) -> Result<VideoDescriptor> {
    if let Some(path) = &args.descriptor {
        if !path.exists() {
            error!("Descriptor file not found: {:?}", path);
            return Err(anyhow::anyhow!("Descriptor file not found"));
        }
        let json = std::fs::read_to_string(path)?;
        let descriptor: VideoDescriptor = serde_json::from_str(&json)?;
        return Ok(descriptor);
    }

    let source = args
        .source
        .clone()
        .unwrap_or_else(|| "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string());
    Ok(VideoDescriptor::new("demo", "EmbedPlayer Demo", source).with_duration_hint(args.duration))
}

/// Callbacks that log playback milestones
fn logging_callbacks() -> PlayerCallbacks {
    PlayerCallbacks::new()
        .on_play(|| info!("Playback started"))
        .on_pause(|| info!("Playback paused"))
        .on_ended(|| info!("End of media reached"))
        .on_time_update(|position| debug!("Position: {}", format_media_time(position)))
        .on_reload_requested(|| info!("Reload requested from the failure notice"))
}
