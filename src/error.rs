//! Error types for feature extraction

use thiserror::Error;

/// Errors surfaced by the feature extraction pipeline.
///
/// Every DSP operation is deterministic, so none of these are worth retrying:
/// the same inputs fail the same way.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// The decoder could not recognise or parse the container
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The input holds no samples or frames
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// A matrix or spectrum shape disagrees with the configuration
    #[error("dimension mismatch: expected {expected}, got {actual} ({context})")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The container parsed but the stream could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// Sample rate conversion failed
    #[error("resample error: {0}")]
    Resample(String),

    #[error("FFT error: {0}")]
    Fft(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FeatureError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub(crate) fn empty(msg: impl Into<String>) -> Self {
        Self::EmptyInput(msg.into())
    }
}

impl From<realfft::FftError> for FeatureError {
    fn from(err: realfft::FftError) -> Self {
        Self::Fft(err.to_string())
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, FeatureError>;
