// src/platforms/mod.rs
//
// Seams between the orchestration logic and the platform it drives. The
// monitor loop and its services only ever talk to these traits; the Discord
// implementation lives in `platforms::discord`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::Error;
use crate::config::StreamOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Voice,
    Stage,
    Other,
}

impl ChannelKind {
    pub fn is_voice_capable(&self) -> bool {
        matches!(self, ChannelKind::Voice | ChannelKind::Stage)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMember {
    pub user_id: u64,
    pub is_bot: bool,
}

/// The bot's effective permissions in one channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoicePermissions {
    pub view: bool,
    pub connect: bool,
    pub speak: bool,
}

impl VoicePermissions {
    pub fn can_stream(&self) -> bool {
        self.view && self.connect && self.speak
    }
}

/// How a single-file stream ended. Cancellation is an expected outcome, not
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    Finished,
    Canceled,
}

/// An active outbound media stream bound to a voice session.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Advertised speaking state for the session.
    fn set_speaking(&self, on: bool);

    /// Advertised video-active state for the session.
    fn set_video(&self, on: bool);

    /// Streams one file to completion, or until `cancel` fires. Stops the
    /// underlying stream promptly on cancellation.
    async fn stream_file(&self, path: &Path, cancel: &CancellationToken)
    -> Result<StreamEnd, Error>;
}

/// Guild/channel lookup and voice-session lifecycle of the chat platform.
///
/// Resolution methods answer `None`/`false` for anything that cannot be
/// resolved right now; callers decide what that means (the occupancy checker
/// deliberately collapses it to "empty").
#[async_trait]
pub trait VoicePlatform: Send + Sync {
    /// The bot's own account id, known once logged in.
    fn self_user_id(&self) -> u64;

    async fn guild_exists(&self, guild_id: u64) -> bool;

    async fn channel_kind(&self, guild_id: u64, channel_id: u64) -> Option<ChannelKind>;

    /// Everyone currently in the voice channel, bots included.
    async fn channel_members(&self, guild_id: u64, channel_id: u64)
    -> Option<Vec<ChannelMember>>;

    async fn self_permissions(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> Result<VoicePermissions, Error>;

    async fn join_voice(&self, guild_id: u64, channel_id: u64) -> Result<(), Error>;

    /// Disconnects from voice. Succeeds (quietly) when no session is active.
    async fn leave_voice(&self, guild_id: u64) -> Result<(), Error>;

    /// Binds a new outbound media transport to the current voice session.
    /// `Ok(None)` means no transport is available yet; try again later.
    async fn create_stream(
        &self,
        guild_id: u64,
        options: &StreamOptions,
    ) -> Result<Option<Arc<dyn MediaTransport>>, Error>;
}

pub mod discord;
