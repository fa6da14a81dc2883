use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cinebot_core::catalog::Catalog;
use cinebot_core::config::{AppConfig, StreamOptions};
use cinebot_core::platforms::discord::DiscordPlatform;
use cinebot_core::services::{OccupancyChecker, SessionManager, ShufflePlaylistRunner};
use cinebot_core::tasks::MonitorLoop;

#[derive(Parser, Debug, Clone)]
#[command(name = "cinebot")]
#[command(
    author,
    version,
    about = "Plays a shuffled local video library into an occupied Discord voice channel"
)]
struct Args {
    /// Guild that owns the watched voice channel
    #[arg(long)]
    guild_id: u64,

    /// Voice channel to watch
    #[arg(long)]
    channel_id: u64,

    /// Root directory of the video library
    #[arg(long, default_value = "videos")]
    media_dir: PathBuf,

    /// Seconds between occupancy polls
    #[arg(long, default_value_t = 1)]
    poll_interval_secs: u64,

    /// Outbound stream width
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Outbound stream height
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Outbound stream frame rate
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Target bitrate in kbps
    #[arg(long, default_value_t = 5000)]
    bitrate_kbps: u32,

    /// Bitrate ceiling in kbps
    #[arg(long, default_value_t = 7500)]
    max_bitrate_kbps: u32,

    /// Video codec name
    #[arg(long, default_value = "H264")]
    codec: String,

    /// Use hardware-accelerated decoding where available
    #[arg(long, default_value_t = false)]
    hardware_acceleration: bool,

    /// Encoder preset
    #[arg(long, default_value = "ultrafast")]
    preset: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let token =
        std::env::var("DISCORD_TOKEN").map_err(|_| anyhow!("DISCORD_TOKEN is not set"))?;

    let stream = StreamOptions {
        width: args.width,
        height: args.height,
        fps: args.fps,
        bitrate_kbps: args.bitrate_kbps,
        max_bitrate_kbps: args.max_bitrate_kbps,
        codec: args.codec,
        hardware_acceleration: args.hardware_acceleration,
        preset: args.preset,
    };
    let config = AppConfig::new(
        token,
        args.guild_id,
        args.channel_id,
        args.media_dir,
        Duration::from_secs(args.poll_interval_secs),
        stream,
    )?;

    let catalog = Catalog::scan(&config.media_dir)?;
    info!(
        "resolved media catalog under {} ({} items):",
        config.media_dir.display(),
        catalog.len()
    );
    for item in catalog.items() {
        info!("  {} => {}", item.display_name, item.path.display());
    }

    // Login failure is the only fatal error; everything past this point is
    // contained by the monitor loop.
    let platform = Arc::new(DiscordPlatform::connect(&config.token).await?);

    let occupancy = Arc::new(OccupancyChecker::new(
        platform.clone(),
        config.guild_id,
        config.channel_id,
    ));
    let session = Arc::new(SessionManager::new(
        platform.clone(),
        config.guild_id,
        config.channel_id,
        config.stream.clone(),
    ));
    let runner = Arc::new(ShufflePlaylistRunner::new(
        Arc::new(catalog),
        occupancy.clone(),
    ));
    let monitor = MonitorLoop::new(occupancy, session, runner, config.poll_interval);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received; shutting down");
            signal_token.cancel();
        }
    });

    monitor.run(shutdown).await;
    platform.disconnect().await;
    Ok(())
}
