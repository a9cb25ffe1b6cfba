//! WAVE container input
//!
//! - [`WavHeader::read`] walks the RIFF chunks and validates the format
//! - [`FrameDecoder`] pulls mono integer samples out of the data region
//!
//! Supported input: linear PCM, mono or stereo, 8/16/24/32-bit.

mod frames;
mod header;

pub use frames::{decode_frame, FrameDecoder};
pub use header::{AudioFormat, RawSampleRegion, WavHeader, WAVE_FORMAT_PCM};
