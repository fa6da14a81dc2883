// src/tasks/monitor.rs
//
// Top-level control loop: poll occupancy, and while the channel has people
// in it, hold a voice session and run shuffled playlist passes. One monitor
// drives all session activity sequentially; there is never more than one
// session or one playback at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::services::occupancy::OccupancyChecker;
use crate::services::playlist::ShufflePlaylistRunner;
use crate::services::session::SessionManager;

pub struct MonitorLoop {
    occupancy: Arc<OccupancyChecker>,
    session: Arc<SessionManager>,
    runner: Arc<ShufflePlaylistRunner>,
    poll_interval: Duration,
}

impl MonitorLoop {
    pub fn new(
        occupancy: Arc<OccupancyChecker>,
        session: Arc<SessionManager>,
        runner: Arc<ShufflePlaylistRunner>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            occupancy,
            session,
            runner,
            poll_interval,
        }
    }

    /// Runs until `shutdown` fires. Shutdown cancellation is independent of
    /// per-playback cancellation: `tick` passes the token down so an
    /// in-flight stream stops too.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            "voice monitor started; polling every {:?}",
            self.poll_interval
        );
        let mut ticker = interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("voice monitor stopping");
                    break;
                }
                _ = ticker.tick() => {}
            }
            self.tick(&shutdown).await;
        }
    }

    /// One monitor iteration. Every failure inside is contained: logged at
    /// its source, session released, loop unaffected.
    pub async fn tick(&self, shutdown: &CancellationToken) {
        if self.occupancy.is_empty().await {
            return;
        }

        if !self.session.join().await {
            return;
        }

        let Some(transport) = self.session.create_stream().await else {
            // No transport this cycle; release the session and let the next
            // poll re-join if the channel is still occupied.
            self.session.leave().await;
            return;
        };

        let outcome = self.runner.run(transport, shutdown).await;
        debug!("playlist pass ended: {outcome:?}");
        self.session.leave().await;
    }
}

/// Spawns the monitor as a process-lifetime background task.
pub fn spawn_monitor_task(monitor: Arc<MonitorLoop>, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        monitor.run(shutdown).await;
    })
}
