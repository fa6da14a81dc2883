// src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Playback error: {0}")]
    Playback(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Platform(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Platform(s.to_string())
    }
}
