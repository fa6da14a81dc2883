// File: src/services/mod.rs

pub mod occupancy;
pub mod playback;
pub mod playlist;
pub mod session;

pub use occupancy::{Occupancy, OccupancyChecker};
pub use playback::{PlaybackController, PlaybackOutcome};
pub use playlist::{PassOutcome, ShufflePlaylistRunner};
pub use session::SessionManager;
