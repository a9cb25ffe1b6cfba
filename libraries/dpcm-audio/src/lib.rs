//! DPCM Audio
//!
//! Converts PCM WAVE recordings into 1-bit delta-modulation samples for the
//! NES/Famicom DMC channel.
//!
//! This crate provides:
//! - RIFF/WAVE parsing for 8/16/24/32-bit linear PCM, mono or stereo
//! - Band-limited windowed-sinc resampling to the sixteen DMC playback rates
//! - Delta encoding with the hardware's `16k + 1` length alignment
//! - An importer that caches the last preview conversion
//!
//! # Example: Converting a file
//!
//! ```rust,no_run
//! use dpcm_audio::{ConversionRequest, Quality, SampleImporter};
//!
//! # fn example() -> dpcm_audio::Result<()> {
//! let mut importer = SampleImporter::open("kick.wav")?;
//! println!("{}", importer.describe());
//!
//! let request = ConversionRequest::new(Quality::new(15)?, -3.0)?;
//! let sample = importer.import(&request)?;
//! println!("{}: {} bytes", sample.name, sample.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Example: Encoding raw samples
//!
//! ```rust
//! use dpcm_audio::dpcm::{DeltaEncoder, EncoderSettings};
//!
//! let encoder = DeltaEncoder::new(EncoderSettings::default()).unwrap();
//! let sample = encoder.encode(vec![0.0f32; 8 * 17]);
//! assert_eq!(sample.len(), 17);
//! ```

mod converter;
pub mod dpcm;
mod error;
mod importer;
pub mod quality;
pub mod resampling;
pub mod wav;

pub use converter::{
    Conversion, ConversionReport, ConversionRequest, DpcmConverter, MAX_GAIN_DB,
};
pub use dpcm::{EncodedSample, EncoderSettings};
pub use error::{DpcmError, Result};
pub use importer::{sample_name, SampleImporter};
pub use quality::{Quality, Region};
pub use resampling::ResamplerBackend;
pub use wav::{AudioFormat, WavHeader};
