use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EqError {
    #[error("Unknown equalizer profile: {0}")]
    UnknownProfile(String),

    #[error("Band index {index} out of range (0..{count})")]
    BandOutOfRange { index: usize, count: usize },

    #[error("Gain must be a finite number (got {0})")]
    InvalidGain(f32),
}

pub type Result<T> = std::result::Result<T, EqError>;
