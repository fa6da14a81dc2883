// src/platforms/discord/runtime.rs
//
// Twilight-backed Discord client. One shard runner per shard keeps the
// in-memory cache and the songbird voice manager fed with gateway events;
// everything the orchestrator needs is answered from the cache first, with
// an HTTP fallback for resolution queries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use songbird::Songbird;
use songbird::error::JoinError;
use songbird::shards::TwilightMap;
use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_gateway::{
    self as gateway,
    CloseFrame,
    Config,
    Event,
    EventTypeFlags,
    Intents,
    MessageSender,
    Shard,
    StreamExt,
};
use twilight_http::Client as HttpClient;
use twilight_http::client::ClientBuilder;
use twilight_model::channel::ChannelType;
use twilight_model::guild::Permissions;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};

use super::transport::DiscordTransport;
use crate::Error;
use crate::config::StreamOptions;
use crate::platforms::{
    ChannelKind, ChannelMember, MediaTransport, VoicePermissions, VoicePlatform,
};

/// The shard runner:
///   - calls `shard.next_event(...)`
///   - updates the in-memory cache
///   - forwards voice events to songbird.
async fn shard_runner(mut shard: Shard, cache: Arc<InMemoryCache>, songbird: Arc<Songbird>) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        match item {
            Ok(event) => {
                cache.update(&event);
                songbird.process(&event).await;

                match &event {
                    Event::Ready(ready) => {
                        info!(
                            "Shard {shard_id} => READY as {} (ID={})",
                            ready.user.name, ready.user.id
                        );
                    }
                    _ => {
                        trace!("Shard {shard_id} => unhandled event: {event:?}");
                    }
                }
            }
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

pub struct DiscordPlatform {
    user_id: Id<UserMarker>,
    http: Arc<HttpClient>,
    cache: Arc<InMemoryCache>,
    songbird: Arc<Songbird>,
    shard_senders: Vec<MessageSender>,
    shard_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl DiscordPlatform {
    /// Logs in, spawns the shard runners, and wires up the voice manager.
    /// Failure here is the one fatal startup case.
    pub async fn connect(token: &str) -> Result<Self, Error> {
        if token.is_empty() {
            return Err(Error::Auth("Discord token is empty".into()));
        }

        let http = Arc::new(
            ClientBuilder::new()
                .token(token.to_string())
                .timeout(Duration::from_secs(30))
                .build(),
        );

        // Identify ourselves up front; songbird needs the user id before the
        // shards start producing voice events.
        let user = http
            .current_user()
            .await
            .map_err(|e| Error::Auth(format!("Discord login failed: {e}")))?
            .model()
            .await
            .map_err(|e| Error::Auth(format!("Discord login failed: {e}")))?;
        info!("(DiscordPlatform) Logged in as {} (ID={})", user.name, user.id);

        let cache = Arc::new(
            InMemoryCache::builder()
                .resource_types(
                    ResourceType::GUILD
                        | ResourceType::CHANNEL
                        | ResourceType::MEMBER
                        | ResourceType::ROLE
                        | ResourceType::USER
                        | ResourceType::VOICE_STATE,
                )
                .build(),
        );

        let config = Config::new(
            token.to_string(),
            Intents::GUILDS | Intents::GUILD_MEMBERS | Intents::GUILD_VOICE_STATES,
        );

        let shards: Vec<Shard> = gateway::create_recommended(&http, config, |_, b| b.build())
            .await
            .map_err(|e| Error::Platform(format!("create_recommended error: {e}")))?
            .collect();

        let mut sender_map = HashMap::new();
        for shard in &shards {
            sender_map.insert(shard.id().number(), shard.sender());
        }
        let songbird = Arc::new(Songbird::twilight(
            Arc::new(TwilightMap::new(sender_map)),
            user.id,
        ));

        let mut shard_senders = Vec::new();
        let mut shard_tasks = Vec::new();
        for shard in shards {
            shard_senders.push(shard.sender());

            let cache_for_shard = cache.clone();
            let songbird_for_shard = songbird.clone();
            shard_tasks.push(tokio::spawn(async move {
                shard_runner(shard, cache_for_shard, songbird_for_shard).await;
            }));
        }

        Ok(Self {
            user_id: user.id,
            http,
            cache,
            songbird,
            shard_senders,
            shard_tasks: Mutex::new(shard_tasks),
        })
    }

    /// Gracefully closes the shards and waits for their runners.
    pub async fn disconnect(&self) {
        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        let mut tasks = self.shard_tasks.lock().await;
        for task in tasks.drain(..) {
            let _ = task.await;
        }
    }
}

#[async_trait]
impl VoicePlatform for DiscordPlatform {
    fn self_user_id(&self) -> u64 {
        self.user_id.get()
    }

    async fn guild_exists(&self, guild_id: u64) -> bool {
        let id = Id::<GuildMarker>::new(guild_id);
        if self.cache.guild(id).is_some() {
            return true;
        }
        match self.http.guild(id).await {
            Ok(_) => true,
            Err(e) => {
                debug!("guild {guild_id} not resolvable: {e}");
                false
            }
        }
    }

    async fn channel_kind(&self, _guild_id: u64, channel_id: u64) -> Option<ChannelKind> {
        let id = Id::<ChannelMarker>::new(channel_id);
        let kind = if let Some(channel) = self.cache.channel(id) {
            channel.kind
        } else {
            match self.http.channel(id).await {
                Ok(resp) => match resp.model().await {
                    Ok(ch) => ch.kind,
                    Err(e) => {
                        debug!("error parsing channel {channel_id}: {e:?}");
                        return None;
                    }
                },
                Err(e) => {
                    debug!("error fetching channel {channel_id}: {e:?}");
                    return None;
                }
            }
        };
        Some(match kind {
            ChannelType::GuildVoice => ChannelKind::Voice,
            ChannelType::GuildStageVoice => ChannelKind::Stage,
            _ => ChannelKind::Other,
        })
    }

    async fn channel_members(
        &self,
        _guild_id: u64,
        channel_id: u64,
    ) -> Option<Vec<ChannelMember>> {
        let id = Id::<ChannelMarker>::new(channel_id);
        let mut members = Vec::new();
        if let Some(states) = self.cache.voice_channel_states(id) {
            for state in states {
                let user_id = state.user_id();
                // An uncached user is counted as human; only guild/channel
                // resolution failures bias toward "empty".
                let is_bot = self.cache.user(user_id).map(|u| u.bot).unwrap_or(false);
                members.push(ChannelMember {
                    user_id: user_id.get(),
                    is_bot,
                });
            }
        }
        Some(members)
    }

    async fn self_permissions(
        &self,
        _guild_id: u64,
        channel_id: u64,
    ) -> Result<VoicePermissions, Error> {
        let perms = self
            .cache
            .permissions()
            .in_channel(self.user_id, Id::<ChannelMarker>::new(channel_id))
            .map_err(|e| Error::Platform(format!("permission lookup failed: {e}")))?;
        Ok(VoicePermissions {
            view: perms.contains(Permissions::VIEW_CHANNEL),
            connect: perms.contains(Permissions::CONNECT),
            speak: perms.contains(Permissions::SPEAK),
        })
    }

    async fn join_voice(&self, guild_id: u64, channel_id: u64) -> Result<(), Error> {
        self.songbird
            .join(
                Id::<GuildMarker>::new(guild_id),
                Id::<ChannelMarker>::new(channel_id),
            )
            .await
            .map_err(|e| Error::Platform(format!("voice join failed: {e}")))?;
        Ok(())
    }

    async fn leave_voice(&self, guild_id: u64) -> Result<(), Error> {
        match self.songbird.remove(Id::<GuildMarker>::new(guild_id)).await {
            Ok(()) | Err(JoinError::NoCall) => Ok(()),
            Err(e) => Err(Error::Platform(format!("voice leave failed: {e}"))),
        }
    }

    async fn create_stream(
        &self,
        guild_id: u64,
        options: &StreamOptions,
    ) -> Result<Option<Arc<dyn MediaTransport>>, Error> {
        let Some(call) = self.songbird.get(Id::<GuildMarker>::new(guild_id)) else {
            return Ok(None);
        };
        Ok(Some(Arc::new(DiscordTransport::new(call, options.clone()))))
    }
}
