/// Conversion-specific errors
use thiserror::Error;

use crate::resampling::ResamplingError;

/// Result type alias using `DpcmError`
pub type Result<T> = std::result::Result<T, DpcmError>;

/// DPCM conversion error types
#[derive(Error, Debug)]
pub enum DpcmError {
    /// Malformed or unsupported container
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Conversion parameter outside its legal range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Resampler construction or processing failure
    #[error("Resampling error: {0}")]
    Resampling(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DpcmError {
    pub(crate) fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }
}

impl From<ResamplingError> for DpcmError {
    fn from(err: ResamplingError) -> Self {
        Self::Resampling(err.to_string())
    }
}
