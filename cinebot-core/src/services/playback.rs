// src/services/playback.rs
//
// One cancelable playback of a single media item. The controller holds a
// single optional slot, so at most one playback task can be in flight; the
// type, not convention, enforces it. Presence signals are set before the
// stream starts and reset inside the same task on every exit path.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::Error;
use crate::catalog::MediaItem;
use crate::platforms::{MediaTransport, StreamEnd};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    Canceled,
    Errored,
}

struct PlaybackHandle {
    cancel: CancellationToken,
    task: JoinHandle<PlaybackOutcome>,
}

#[derive(Default)]
pub struct PlaybackController {
    slot: Option<PlaybackHandle>,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self { slot: None }
    }

    /// Starts playing `item`. The playback's cancellation token is a child
    /// of `parent`, so canceling the whole session stops the stream too.
    pub fn start(
        &mut self,
        item: &MediaItem,
        transport: Arc<dyn MediaTransport>,
        parent: &CancellationToken,
    ) -> Result<(), Error> {
        if self.slot.is_some() {
            return Err(Error::Playback("a playback is already in flight".into()));
        }

        let cancel = parent.child_token();
        let token = cancel.clone();
        let name = item.display_name.clone();
        let path = item.path.clone();

        let task = tokio::spawn(async move {
            transport.set_speaking(true);
            transport.set_video(true);

            let outcome = match transport.stream_file(&path, &token).await {
                Ok(StreamEnd::Finished) => {
                    info!("finished playing {name}");
                    PlaybackOutcome::Completed
                }
                Ok(StreamEnd::Canceled) => {
                    info!("playback of {name} canceled");
                    PlaybackOutcome::Canceled
                }
                Err(e) => {
                    error!("error while playing {name}: {e}");
                    PlaybackOutcome::Errored
                }
            };

            // Reset on every exit path, cancellation and error included.
            transport.set_speaking(false);
            transport.set_video(false);
            outcome
        });

        self.slot = Some(PlaybackHandle { cancel, task });
        Ok(())
    }

    /// Requests cancellation of the in-flight playback, if any.
    pub fn cancel_current(&self) {
        if let Some(handle) = &self.slot {
            handle.cancel.cancel();
        }
    }

    /// Awaits the in-flight playback and frees the slot. Returns
    /// `Completed` when nothing was playing.
    pub async fn finish(&mut self) -> PlaybackOutcome {
        match self.slot.take() {
            Some(handle) => match handle.task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("playback task failed to complete: {e}");
                    PlaybackOutcome::Errored
                }
            },
            None => PlaybackOutcome::Completed,
        }
    }
}
