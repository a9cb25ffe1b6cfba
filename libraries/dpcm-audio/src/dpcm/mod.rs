//! 1-bit delta modulation
//!
//! - [`DeltaEncoder`] turns resampled PCM into DMC payload bytes
//! - [`decode_levels`] replays a payload for previews and checks

mod decoder;
mod encoder;

pub use decoder::{decode_levels, levels_to_pcm};
pub use encoder::{
    is_legal_length, DeltaEncoder, DeltaState, EncodedSample, EncoderSettings, Encoding, BIAS,
    CLAMP, DIVISOR, FILLER, MAX_LEVEL,
};
