// File: cinebot-core/tests/playlist_tests.rs

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use cinebot_core::Error;
use cinebot_core::catalog::{Catalog, MediaItem};
use cinebot_core::config::StreamOptions;
use cinebot_core::platforms::{
    ChannelKind, ChannelMember, MediaTransport, StreamEnd, VoicePermissions, VoicePlatform,
};
use cinebot_core::services::{OccupancyChecker, PassOutcome, ShufflePlaylistRunner};

/// Platform whose channel membership is scripted: each occupancy check pops
/// the next "is empty" answer; once the script runs out the channel stays
/// occupied.
struct ScriptedPlatform {
    empties: Mutex<VecDeque<bool>>,
}

impl ScriptedPlatform {
    fn new(script: &[bool]) -> Arc<Self> {
        Arc::new(Self {
            empties: Mutex::new(script.iter().copied().collect()),
        })
    }
}

#[async_trait]
impl VoicePlatform for ScriptedPlatform {
    fn self_user_id(&self) -> u64 {
        0
    }

    async fn guild_exists(&self, _guild_id: u64) -> bool {
        true
    }

    async fn channel_kind(&self, _guild_id: u64, _channel_id: u64) -> Option<ChannelKind> {
        Some(ChannelKind::Voice)
    }

    async fn channel_members(
        &self,
        _guild_id: u64,
        _channel_id: u64,
    ) -> Option<Vec<ChannelMember>> {
        let empty = self.empties.lock().unwrap().pop_front().unwrap_or(false);
        if empty {
            Some(Vec::new())
        } else {
            Some(vec![ChannelMember {
                user_id: 7,
                is_bot: false,
            }])
        }
    }

    async fn self_permissions(
        &self,
        _guild_id: u64,
        _channel_id: u64,
    ) -> Result<VoicePermissions, Error> {
        Ok(VoicePermissions {
            view: true,
            connect: true,
            speak: true,
        })
    }

    async fn join_voice(&self, _guild_id: u64, _channel_id: u64) -> Result<(), Error> {
        Ok(())
    }

    async fn leave_voice(&self, _guild_id: u64) -> Result<(), Error> {
        Ok(())
    }

    async fn create_stream(
        &self,
        _guild_id: u64,
        _options: &StreamOptions,
    ) -> Result<Option<Arc<dyn MediaTransport>>, Error> {
        Ok(None)
    }
}

/// Transport that records which files were streamed and finishes instantly.
struct CountingTransport {
    played: Mutex<Vec<PathBuf>>,
}

impl CountingTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            played: Mutex::new(Vec::new()),
        })
    }

    fn played(&self) -> Vec<PathBuf> {
        self.played.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaTransport for CountingTransport {
    fn set_speaking(&self, _on: bool) {}

    fn set_video(&self, _on: bool) {}

    async fn stream_file(
        &self,
        path: &Path,
        _cancel: &CancellationToken,
    ) -> Result<StreamEnd, Error> {
        self.played.lock().unwrap().push(path.to_path_buf());
        Ok(StreamEnd::Finished)
    }
}

fn catalog_of(n: usize) -> Arc<Catalog> {
    let items = (0..n)
        .map(|i| MediaItem {
            display_name: format!("clip{i}"),
            path: PathBuf::from(format!("clip{i}.mp4")),
        })
        .collect();
    Arc::new(Catalog::from_items(items))
}

fn runner_with(
    catalog: Arc<Catalog>,
    platform: Arc<ScriptedPlatform>,
) -> ShufflePlaylistRunner {
    let occupancy = Arc::new(OccupancyChecker::new(platform, 1, 2));
    ShufflePlaylistRunner::new(catalog, occupancy)
}

#[tokio::test]
async fn full_pass_plays_every_item_exactly_once() {
    let catalog = catalog_of(5);
    let platform = ScriptedPlatform::new(&[]);
    let transport = CountingTransport::new();
    let runner = runner_with(catalog.clone(), platform);

    let outcome = runner
        .run(transport.clone(), &CancellationToken::new())
        .await;

    assert_eq!(outcome, PassOutcome::Exhausted);
    let played = transport.played();
    assert_eq!(played.len(), 5);
    let distinct: HashSet<&PathBuf> = played.iter().collect();
    assert_eq!(distinct.len(), 5);
    let expected: HashSet<PathBuf> = catalog.items().iter().map(|i| i.path.clone()).collect();
    assert_eq!(played.into_iter().collect::<HashSet<_>>(), expected);
}

#[tokio::test]
async fn emptiness_at_an_item_boundary_ends_the_pass() {
    let catalog = catalog_of(5);
    // pre-item1, post-item1, pre-item2 occupied; post-item2 empty.
    let platform = ScriptedPlatform::new(&[false, false, false, true]);
    let transport = CountingTransport::new();
    let runner = runner_with(catalog, platform);

    let outcome = runner
        .run(transport.clone(), &CancellationToken::new())
        .await;

    assert_eq!(outcome, PassOutcome::ChannelEmpty);
    assert_eq!(transport.played().len(), 2);
}

#[tokio::test]
async fn emptiness_before_the_first_item_plays_nothing() {
    let catalog = catalog_of(3);
    let platform = ScriptedPlatform::new(&[true]);
    let transport = CountingTransport::new();
    let runner = runner_with(catalog, platform);

    let outcome = runner
        .run(transport.clone(), &CancellationToken::new())
        .await;

    assert_eq!(outcome, PassOutcome::ChannelEmpty);
    assert!(transport.played().is_empty());
}

#[tokio::test]
async fn cancellation_stops_the_pass() {
    let catalog = catalog_of(3);
    let platform = ScriptedPlatform::new(&[]);
    let transport = CountingTransport::new();
    let runner = runner_with(catalog, platform);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = runner.run(transport.clone(), &cancel).await;

    assert_eq!(outcome, PassOutcome::Canceled);
    assert!(transport.played().len() <= 1);
}

#[tokio::test]
async fn empty_catalog_ends_the_pass_without_playing() {
    let catalog = Arc::new(Catalog::from_items(Vec::new()));
    let platform = ScriptedPlatform::new(&[]);
    let transport = CountingTransport::new();
    let runner = runner_with(catalog, platform);

    let outcome = runner
        .run(transport.clone(), &CancellationToken::new())
        .await;

    assert_eq!(outcome, PassOutcome::NoMedia);
    assert!(transport.played().is_empty());
}
