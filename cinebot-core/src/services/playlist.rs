// src/services/playlist.rs
//
// One pass over a freshly shuffled ordering of the catalog. Occupancy is
// re-checked at every item boundary; the pass ends early as soon as the
// channel empties or the session is canceled.

use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::catalog::{Catalog, MediaItem};
use crate::platforms::MediaTransport;
use crate::services::occupancy::OccupancyChecker;
use crate::services::playback::{PlaybackController, PlaybackOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// The channel emptied at an item boundary; the session should end.
    ChannelEmpty,
    /// External cancellation stopped the pass.
    Canceled,
    /// Every item played; the caller loops back to monitoring.
    Exhausted,
    /// Nothing to play.
    NoMedia,
}

pub struct ShufflePlaylistRunner {
    catalog: Arc<Catalog>,
    occupancy: Arc<OccupancyChecker>,
}

impl ShufflePlaylistRunner {
    pub fn new(catalog: Arc<Catalog>, occupancy: Arc<OccupancyChecker>) -> Self {
        Self { catalog, occupancy }
    }

    pub async fn run(
        &self,
        transport: Arc<dyn MediaTransport>,
        cancel: &CancellationToken,
    ) -> PassOutcome {
        if self.catalog.is_empty() {
            error!("media catalog is empty; nothing to play");
            return PassOutcome::NoMedia;
        }

        // Fresh permutation of the whole catalog for each pass.
        let mut order: Vec<MediaItem> = self.catalog.items().to_vec();
        order.shuffle(&mut rand::rng());
        debug!("starting playlist pass over {} items", order.len());

        let mut controller = PlaybackController::new();
        for item in &order {
            if self.occupancy.is_empty().await {
                info!("channel is empty; ending playlist pass");
                return PassOutcome::ChannelEmpty;
            }

            info!("now playing {}", item.display_name);
            if let Err(e) = controller.start(item, transport.clone(), cancel) {
                error!("could not start playback of {}: {e}", item.display_name);
            } else {
                let outcome = controller.finish().await;
                if outcome == PlaybackOutcome::Canceled {
                    return PassOutcome::Canceled;
                }
            }

            if self.occupancy.is_empty().await {
                info!("channel is empty; ending playlist pass");
                return PassOutcome::ChannelEmpty;
            }
            if cancel.is_cancelled() {
                return PassOutcome::Canceled;
            }
        }

        debug!("playlist pass exhausted all items");
        PassOutcome::Exhausted
    }
}
