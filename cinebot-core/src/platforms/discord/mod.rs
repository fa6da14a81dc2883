// src/platforms/discord/mod.rs

pub mod runtime;
pub mod transport;

pub use runtime::DiscordPlatform;
pub use transport::DiscordTransport;
