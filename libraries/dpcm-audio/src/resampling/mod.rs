//! Band-limited sample rate conversion
//!
//! Converts the decoded mono stream from the source rate to one of the
//! hardware playback rates.
//!
//! ## Backends
//!
//! - **Sinc** (default): streaming windowed-sinc interpolation. Pulls one
//!   input sample at a time into a bounded window, so the whole source is
//!   never materialised. Bit-reproducible across runs.
//! - **Rubato**: drains the source up front and runs it through `rubato`'s
//!   `SincFixedIn`. Same output length, slightly different filter. An
//!   output limit bounds how much of the source it reads.
//!
//! ## Example
//!
//! ```rust
//! use dpcm_audio::resampling::{IterSource, Resampler, ResamplerBackend, SincKernel};
//! use std::sync::Arc;
//!
//! let kernel = Arc::new(SincKernel::default());
//! let input = IterSource::new(vec![0.0f32; 441].into_iter());
//!
//! // 44.1 kHz -> 33.1 kHz
//! let resampler = Resampler::new(ResamplerBackend::Sinc, input, 33_144.0 / 44_100.0, &kernel).unwrap();
//! assert_eq!(resampler.count(), 332);
//! ```

mod kernel;
mod rubato_backend;
mod sinc;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub use kernel::SincKernel;
pub use rubato_backend::RubatoResampler;
pub use sinc::SincResampler;

/// Cutoff frequency relative to the lower of the two Nyquist frequencies
pub const CUTOFF: f64 = 0.9;

/// Resampling errors
#[derive(Error, Debug)]
pub enum ResamplingError {
    #[error("Invalid resample ratio: {0} (must be finite and > 0)")]
    InvalidRatio(f64),

    #[error("Invalid kernel: {0}")]
    InvalidKernel(String),

    #[error("Resampler initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

pub type Result<T> = std::result::Result<T, ResamplingError>;

/// A pull-based producer of mono samples
///
/// Each call yields the next sample, or `None` once the source is exhausted.
/// Sources are not restartable.
pub trait SampleSource {
    fn next_sample(&mut self) -> Option<f32>;
}

impl<S: SampleSource + ?Sized> SampleSource for &mut S {
    fn next_sample(&mut self) -> Option<f32> {
        (**self).next_sample()
    }
}

/// Adapts any `f32` iterator into a [`SampleSource`]
#[derive(Debug, Clone)]
pub struct IterSource<I> {
    inner: I,
}

impl<I: Iterator<Item = f32>> IterSource<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> I {
        self.inner
    }
}

impl<I: Iterator<Item = f32>> SampleSource for IterSource<I> {
    fn next_sample(&mut self) -> Option<f32> {
        self.inner.next()
    }
}

/// Resampler backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResamplerBackend {
    /// Streaming windowed sinc (reference implementation)
    #[default]
    Sinc,

    /// rubato `SincFixedIn`, buffered
    Rubato,
}

pub(crate) fn validate_ratio(ratio: f64) -> Result<()> {
    if ratio.is_finite() && ratio > 0.0 {
        Ok(())
    } else {
        Err(ResamplingError::InvalidRatio(ratio))
    }
}

/// Number of output samples produced for `input_samples` at `ratio`
pub fn output_len(input_samples: u64, ratio: f64) -> u64 {
    (input_samples as f64 * ratio).ceil() as u64
}

/// High-level resampler over either backend
pub enum Resampler<S> {
    Sinc(SincResampler<S>),
    Rubato(RubatoResampler<S>),
}

impl<S: SampleSource> Resampler<S> {
    /// Create a resampler pulling from `source`
    ///
    /// # Arguments
    /// - `backend`: Resampler backend to use
    /// - `source`: Upstream mono samples
    /// - `ratio`: Output rate divided by input rate
    /// - `kernel`: Shared sinc table (used by the sinc backend)
    pub fn new(
        backend: ResamplerBackend,
        source: S,
        ratio: f64,
        kernel: &Arc<SincKernel>,
    ) -> Result<Self> {
        validate_ratio(ratio)?;

        Ok(match backend {
            ResamplerBackend::Sinc => {
                Self::Sinc(SincResampler::new(source, ratio, Arc::clone(kernel))?)
            }
            ResamplerBackend::Rubato => Self::Rubato(RubatoResampler::new(source, ratio)?),
        })
    }

    /// Stop after at most `samples` output samples
    #[must_use]
    pub fn with_output_limit(self, samples: u64) -> Self {
        match self {
            Self::Sinc(r) => Self::Sinc(r.with_tick_limit(samples)),
            Self::Rubato(r) => Self::Rubato(r.with_output_limit(samples)),
        }
    }

    /// The upstream source, e.g. to inspect truncation after a run
    pub fn source(&self) -> &S {
        match self {
            Self::Sinc(r) => r.source(),
            Self::Rubato(r) => r.source(),
        }
    }

    pub fn source_mut(&mut self) -> &mut S {
        match self {
            Self::Sinc(r) => r.source_mut(),
            Self::Rubato(r) => r.source_mut(),
        }
    }

    /// The failure that ended the output early, if any
    ///
    /// The sinc backend cannot fail once constructed.
    pub fn take_error(&mut self) -> Option<ResamplingError> {
        match self {
            Self::Sinc(_) => None,
            Self::Rubato(r) => r.take_error(),
        }
    }

    pub fn ratio(&self) -> f64 {
        match self {
            Self::Sinc(r) => r.ratio(),
            Self::Rubato(r) => r.ratio(),
        }
    }
}

impl<S: SampleSource> Iterator for Resampler<S> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        match self {
            Self::Sinc(r) => r.next(),
            Self::Rubato(r) => r.next(),
        }
    }
}
