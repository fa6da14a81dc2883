// src/services/session.rs
//
// Lifecycle of "joined to voice + outbound media transport". Joins are
// gated behind resolution and permission checks; every failure here is
// non-fatal and just means no session this cycle. `leave` is idempotent and
// is called on every path that ends a session.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::StreamOptions;
use crate::platforms::{MediaTransport, VoicePlatform};

pub struct SessionManager {
    platform: Arc<dyn VoicePlatform>,
    guild_id: u64,
    channel_id: u64,
    stream: StreamOptions,
}

impl SessionManager {
    pub fn new(
        platform: Arc<dyn VoicePlatform>,
        guild_id: u64,
        channel_id: u64,
        stream: StreamOptions,
    ) -> Self {
        Self {
            platform,
            guild_id,
            channel_id,
            stream,
        }
    }

    /// Joins the watched voice channel. Returns false (after logging) when
    /// the channel is unresolvable, not voice-capable, the bot lacks
    /// view/connect/speak, or the join itself fails.
    pub async fn join(&self) -> bool {
        if !self.platform.guild_exists(self.guild_id).await {
            warn!("cannot join: guild {} not found", self.guild_id);
            return false;
        }
        match self
            .platform
            .channel_kind(self.guild_id, self.channel_id)
            .await
        {
            Some(kind) if kind.is_voice_capable() => {}
            Some(_) => {
                warn!("cannot join: channel {} is not a voice channel", self.channel_id);
                return false;
            }
            None => {
                warn!("cannot join: channel {} not found", self.channel_id);
                return false;
            }
        }
        match self
            .platform
            .self_permissions(self.guild_id, self.channel_id)
            .await
        {
            Ok(perms) if perms.can_stream() => {}
            Ok(_) => {
                warn!(
                    "cannot join channel {}: missing view/connect/speak permission",
                    self.channel_id
                );
                return false;
            }
            Err(e) => {
                warn!("cannot join channel {}: {e}", self.channel_id);
                return false;
            }
        }
        match self.platform.join_voice(self.guild_id, self.channel_id).await {
            Ok(()) => {
                info!("joined voice channel {}", self.channel_id);
                true
            }
            Err(e) => {
                error!("voice join failed for channel {}: {e}", self.channel_id);
                false
            }
        }
    }

    /// Requests an outbound transport for the current voice session. None
    /// means "not available yet, retry next poll".
    pub async fn create_stream(&self) -> Option<Arc<dyn MediaTransport>> {
        match self.platform.create_stream(self.guild_id, &self.stream).await {
            Ok(Some(transport)) => Some(transport),
            Ok(None) => {
                info!("no media transport available yet; retrying next poll");
                None
            }
            Err(e) => {
                error!("creating media transport failed: {e}");
                None
            }
        }
    }

    /// Tears the voice session down. Safe to call with no session active.
    pub async fn leave(&self) {
        if let Err(e) = self.platform.leave_voice(self.guild_id).await {
            debug!("voice leave reported: {e}");
        }
        info!("left voice channel {}", self.channel_id);
    }
}
