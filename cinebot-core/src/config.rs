// src/config.rs
//
// Static settings the bot is wired with at startup. Everything in
// `StreamOptions` is pass-through for the media transport; the orchestration
// code never interprets it.

use std::path::PathBuf;
use std::time::Duration;

use crate::Error;

/// Outbound stream quality settings, handed to the transport untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamOptions {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub bitrate_kbps: u32,
    pub max_bitrate_kbps: u32,
    pub codec: String,
    pub hardware_acceleration: bool,
    pub preset: String,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 30,
            bitrate_kbps: 5000,
            max_bitrate_kbps: 7500,
            codec: "H264".to_string(),
            hardware_acceleration: false,
            preset: "ultrafast".to_string(),
        }
    }
}

/// Canonical form of a codec name as the transport expects it ("h264 " and
/// "H264" are the same codec).
pub fn normalize_codec(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub token: String,
    pub guild_id: u64,
    pub channel_id: u64,
    pub media_dir: PathBuf,
    pub poll_interval: Duration,
    pub stream: StreamOptions,
}

impl AppConfig {
    pub fn new(
        token: String,
        guild_id: u64,
        channel_id: u64,
        media_dir: PathBuf,
        poll_interval: Duration,
        stream: StreamOptions,
    ) -> Result<Self, Error> {
        if token.is_empty() {
            return Err(Error::Auth("bot token is empty".into()));
        }
        if guild_id == 0 || channel_id == 0 {
            return Err(Error::Config("guild and channel ids must be non-zero".into()));
        }
        if poll_interval.is_zero() {
            return Err(Error::Config("poll interval must be non-zero".into()));
        }
        let mut stream = stream;
        stream.codec = normalize_codec(&stream.codec);
        Ok(Self {
            token,
            guild_id,
            channel_id,
            media_dir,
            poll_interval,
            stream,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_names_are_normalized() {
        assert_eq!(normalize_codec(" h264 "), "H264");
        assert_eq!(normalize_codec("VP8"), "VP8");
    }

    #[test]
    fn zero_ids_are_rejected() {
        let cfg = AppConfig::new(
            "tok".into(),
            0,
            5,
            PathBuf::from("videos"),
            Duration::from_secs(1),
            StreamOptions::default(),
        );
        assert!(matches!(cfg, Err(Error::Config(_))));
    }

    #[test]
    fn config_normalizes_stream_codec() {
        let mut opts = StreamOptions::default();
        opts.codec = "h264".into();
        let cfg = AppConfig::new(
            "tok".into(),
            1,
            2,
            PathBuf::from("videos"),
            Duration::from_secs(1),
            opts,
        )
        .unwrap();
        assert_eq!(cfg.stream.codec, "H264");
    }
}
