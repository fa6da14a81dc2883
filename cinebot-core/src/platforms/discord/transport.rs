// src/platforms/discord/transport.rs
//
// Outbound media transport over an established songbird call. One transport
// is created per session; single-item playback is driven through
// `stream_file`, which resolves on track end, track error, or cancellation.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use songbird::driver::Bitrate;
use songbird::input::File;
use songbird::{Call, Event, EventContext, EventHandler, TrackEvent};

use crate::Error;
use crate::config::StreamOptions;
use crate::platforms::{MediaTransport, StreamEnd};

enum TrackDone {
    Ended,
    Failed,
}

/// Forwards a track's terminal event to the waiting `stream_file` call.
struct TrackNotifier {
    failed: bool,
    tx: UnboundedSender<TrackDone>,
}

#[async_trait]
impl EventHandler for TrackNotifier {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        let done = if self.failed {
            TrackDone::Failed
        } else {
            TrackDone::Ended
        };
        let _ = self.tx.send(done);
        None
    }
}

pub struct DiscordTransport {
    call: Arc<Mutex<Call>>,
    options: StreamOptions,
    speaking: AtomicBool,
    video: AtomicBool,
}

impl DiscordTransport {
    pub fn new(call: Arc<Mutex<Call>>, options: StreamOptions) -> Self {
        Self {
            call,
            options,
            speaking: AtomicBool::new(false),
            video: AtomicBool::new(false),
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    pub fn is_video_active(&self) -> bool {
        self.video.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaTransport for DiscordTransport {
    // The driver manages the wire-level speaking flag on its own; these track
    // the session's advertised presence for the orchestration contract.
    fn set_speaking(&self, on: bool) {
        self.speaking.store(on, Ordering::SeqCst);
    }

    fn set_video(&self, on: bool) {
        self.video.store(on, Ordering::SeqCst);
    }

    async fn stream_file(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<StreamEnd, Error> {
        let handle = {
            let mut call = self.call.lock().await;
            call.set_bitrate(Bitrate::BitsPerSecond(
                (self.options.bitrate_kbps * 1000) as i32,
            ));
            call.play_input(File::new(path.to_path_buf()).into())
        };

        let (tx, mut rx) = unbounded_channel();
        let hooked = handle
            .add_event(
                Event::Track(TrackEvent::End),
                TrackNotifier {
                    failed: false,
                    tx: tx.clone(),
                },
            )
            .and_then(|()| {
                handle.add_event(Event::Track(TrackEvent::Error), TrackNotifier {
                    failed: true,
                    tx,
                })
            });
        if let Err(e) = hooked {
            let _ = handle.stop();
            return Err(Error::Playback(format!("track event hook failed: {e:?}")));
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                if let Err(e) = handle.stop() {
                    debug!("stopping track after cancel: {e:?}");
                }
                Ok(StreamEnd::Canceled)
            }
            done = rx.recv() => match done {
                Some(TrackDone::Failed) => Err(Error::Playback(format!(
                    "track for {} failed",
                    path.display()
                ))),
                _ => Ok(StreamEnd::Finished),
            }
        }
    }
}
