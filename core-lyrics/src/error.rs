use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LyricsError {
    #[error("Storage error: {0}")]
    Storage(#[from] BridgeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Lyrics provider failed: {0}")]
    Provider(String),

    #[error("Invalid lyrics bundle: {0}")]
    InvalidBundle(String),
}

pub type Result<T> = std::result::Result<T, LyricsError>;
