// src/services/occupancy.rs
//
// Live occupancy decision for the watched voice channel. Always computed
// from current platform state, never cached.

use std::sync::Arc;

use tracing::debug;

use crate::platforms::VoicePlatform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Occupied,
    Empty,
    /// Guild or channel unresolvable, or the channel is not voice-capable.
    Unknown,
}

pub struct OccupancyChecker {
    platform: Arc<dyn VoicePlatform>,
    guild_id: u64,
    channel_id: u64,
}

impl OccupancyChecker {
    pub fn new(platform: Arc<dyn VoicePlatform>, guild_id: u64, channel_id: u64) -> Self {
        Self {
            platform,
            guild_id,
            channel_id,
        }
    }

    /// Counts qualifying participants: bots and the bot's own account are
    /// excluded.
    pub async fn check(&self) -> Occupancy {
        if !self.platform.guild_exists(self.guild_id).await {
            debug!("guild {} unresolvable during occupancy check", self.guild_id);
            return Occupancy::Unknown;
        }
        match self.platform.channel_kind(self.guild_id, self.channel_id).await {
            Some(kind) if kind.is_voice_capable() => {}
            Some(_) => {
                debug!("channel {} is not voice-capable", self.channel_id);
                return Occupancy::Unknown;
            }
            None => {
                debug!("channel {} unresolvable during occupancy check", self.channel_id);
                return Occupancy::Unknown;
            }
        }
        match self
            .platform
            .channel_members(self.guild_id, self.channel_id)
            .await
        {
            None => Occupancy::Unknown,
            Some(members) => {
                let self_id = self.platform.self_user_id();
                let humans = members
                    .iter()
                    .filter(|m| !m.is_bot && m.user_id != self_id)
                    .count();
                if humans == 0 {
                    Occupancy::Empty
                } else {
                    Occupancy::Occupied
                }
            }
        }
    }

    /// Collapses `Unknown` to empty: a channel we cannot resolve must never
    /// start or keep a session.
    pub async fn is_empty(&self) -> bool {
        !matches!(self.check().await, Occupancy::Occupied)
    }
}
