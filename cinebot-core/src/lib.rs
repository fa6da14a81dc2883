// src/lib.rs

pub mod catalog;
pub mod config;
pub mod error;
pub mod platforms;
pub mod services;
pub mod tasks;

pub use catalog::{Catalog, MediaItem};
pub use config::{AppConfig, StreamOptions};
pub use error::Error;
