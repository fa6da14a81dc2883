// File: cinebot-core/tests/session_tests.rs

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;

use cinebot_core::Error;
use cinebot_core::config::StreamOptions;
use cinebot_core::platforms::{
    ChannelKind, ChannelMember, MediaTransport, VoicePermissions, VoicePlatform,
};
use cinebot_core::services::SessionManager;

mock! {
    Platform {}

    #[async_trait]
    impl VoicePlatform for Platform {
        fn self_user_id(&self) -> u64;
        async fn guild_exists(&self, guild_id: u64) -> bool;
        async fn channel_kind(&self, guild_id: u64, channel_id: u64) -> Option<ChannelKind>;
        async fn channel_members(&self, guild_id: u64, channel_id: u64) -> Option<Vec<ChannelMember>>;
        async fn self_permissions(&self, guild_id: u64, channel_id: u64) -> Result<VoicePermissions, Error>;
        async fn join_voice(&self, guild_id: u64, channel_id: u64) -> Result<(), Error>;
        async fn leave_voice(&self, guild_id: u64) -> Result<(), Error>;
        async fn create_stream(&self, guild_id: u64, options: &StreamOptions) -> Result<Option<Arc<dyn MediaTransport>>, Error>;
    }
}

const ALL_PERMS: VoicePermissions = VoicePermissions {
    view: true,
    connect: true,
    speak: true,
};

fn manager(platform: MockPlatform) -> SessionManager {
    SessionManager::new(Arc::new(platform), 1, 2, StreamOptions::default())
}

#[tokio::test]
async fn join_succeeds_with_voice_channel_and_permissions() {
    let mut platform = MockPlatform::new();
    platform.expect_guild_exists().returning(|_| true);
    platform
        .expect_channel_kind()
        .returning(|_, _| Some(ChannelKind::Voice));
    platform
        .expect_self_permissions()
        .returning(|_, _| Ok(ALL_PERMS));
    platform
        .expect_join_voice()
        .times(1)
        .returning(|_, _| Ok(()));

    assert!(manager(platform).join().await);
}

#[tokio::test]
async fn join_refuses_without_speak_permission() {
    let mut platform = MockPlatform::new();
    platform.expect_guild_exists().returning(|_| true);
    platform
        .expect_channel_kind()
        .returning(|_, _| Some(ChannelKind::Voice));
    platform.expect_self_permissions().returning(|_, _| {
        Ok(VoicePermissions {
            view: true,
            connect: true,
            speak: false,
        })
    });
    platform.expect_join_voice().times(0);

    assert!(!manager(platform).join().await);
}

#[tokio::test]
async fn join_refuses_non_voice_channel() {
    let mut platform = MockPlatform::new();
    platform.expect_guild_exists().returning(|_| true);
    platform
        .expect_channel_kind()
        .returning(|_, _| Some(ChannelKind::Other));
    platform.expect_join_voice().times(0);

    assert!(!manager(platform).join().await);
}

#[tokio::test]
async fn failed_join_is_non_fatal() {
    let mut platform = MockPlatform::new();
    platform.expect_guild_exists().returning(|_| true);
    platform
        .expect_channel_kind()
        .returning(|_, _| Some(ChannelKind::Voice));
    platform
        .expect_self_permissions()
        .returning(|_, _| Ok(ALL_PERMS));
    platform
        .expect_join_voice()
        .returning(|_, _| Err(Error::Platform("gateway down".into())));

    assert!(!manager(platform).join().await);
}

#[tokio::test]
async fn leave_is_idempotent() {
    let mut platform = MockPlatform::new();
    platform
        .expect_leave_voice()
        .times(2)
        .returning(|_| Ok(()));

    let session = manager(platform);
    session.leave().await;
    session.leave().await;
}

#[tokio::test]
async fn leave_with_no_active_session_only_logs() {
    let mut platform = MockPlatform::new();
    platform
        .expect_leave_voice()
        .returning(|_| Err(Error::Platform("no call".into())));

    manager(platform).leave().await;
}

#[tokio::test]
async fn missing_transport_is_a_retry_not_an_error() {
    let mut platform = MockPlatform::new();
    platform
        .expect_create_stream()
        .returning(|_, _| Ok(None));

    assert!(manager(platform).create_stream().await.is_none());
}
