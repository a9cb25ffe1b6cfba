//! Delta-modulation encoder
//!
//! Converts resampled PCM into the 1-bit delta stream played by the
//! console's DMC channel. Each input sample moves a 6-bit counter one step
//! up or down; the step direction is the output bit.

use crate::error::{DpcmError, Result};
use tracing::debug;

/// Counter value a conversion starts from (middle of the 0-63 range)
pub const BIAS: i32 = 32;

/// Highest counter value
pub const MAX_LEVEL: i32 = 63;

/// Input samples are clamped to +/- this before gain (absorbs resampler ringing)
pub const CLAMP: f32 = 65_535.0;

/// Scales 16-bit magnitudes down to the counter's range
pub const DIVISOR: f32 = 1024.0;

/// Pad byte used to reach a legal sample length
pub const FILLER: u8 = 0xAA;

/// Per-conversion encoder state
///
/// Created fresh for every encoding pass and threaded through
/// [`DeltaState::push`]; nothing is carried between conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaState {
    accumulator: u8,
    counter: i32,
    bits_filled: u8,
}

impl Default for DeltaState {
    fn default() -> Self {
        Self::new()
    }
}

impl DeltaState {
    pub fn new() -> Self {
        Self {
            accumulator: 0,
            counter: BIAS,
            bits_filled: 0,
        }
    }

    /// Current delta counter, always within 0..=63
    pub fn counter(&self) -> i32 {
        self.counter
    }

    pub fn accumulator(&self) -> u8 {
        self.accumulator
    }

    /// Bits collected toward the next byte (0..8)
    pub fn bits_filled(&self) -> u8 {
        self.bits_filled
    }

    /// Feed one quantised level, returning a byte once eight bits are collected
    ///
    /// The accumulator shifts right and the new bit enters at bit 7, so the
    /// first sample of a group ends up in bit 0.
    pub fn push(&mut self, level: i32) -> Option<u8> {
        self.accumulator >>= 1;

        if level >= self.counter {
            self.counter = (self.counter + 1).min(MAX_LEVEL);
            self.accumulator |= 0x80;
        } else {
            self.counter = (self.counter - 1).max(0);
        }

        self.bits_filled += 1;
        if self.bits_filled == 8 {
            self.bits_filled = 0;
            Some(self.accumulator)
        } else {
            None
        }
    }
}

/// A finished DPCM payload
///
/// Raw bytes only; no header is embedded. The length is either `1 + 16k` or
/// the encoder's capacity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodedSample {
    pub name: String,
    pub data: Vec<u8>,
}

impl EncodedSample {
    /// Largest payload the channel can address (0xFF * 16 + 1)
    pub const MAX_LEN: usize = 0x0FF1;

    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

/// Whether `len` is a length the channel plays back unchanged
pub fn is_legal_length(len: usize, max_len: usize) -> bool {
    len == max_len || len % 16 == 1
}

/// Encoder parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderSettings {
    /// Gain applied after clamping, in decibels
    pub gain_db: f32,

    /// Output capacity in bytes
    pub max_len: usize,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            gain_db: 0.0,
            max_len: EncodedSample::MAX_LEN,
        }
    }
}

impl EncoderSettings {
    pub fn with_gain(gain_db: f32) -> Self {
        Self {
            gain_db,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.gain_db.is_finite() {
            return Err(DpcmError::InvalidParameter(format!(
                "gain {} dB is not finite",
                self.gain_db
            )));
        }
        if self.max_len == 0 {
            return Err(DpcmError::InvalidParameter(
                "encoder capacity must be at least one byte".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of one encoding pass with its bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    pub sample: EncodedSample,
    /// Input samples consumed
    pub samples_consumed: u64,
    /// Encoding stopped at capacity with input still pending
    pub capacity_reached: bool,
    /// Bytes appended to reach a legal length
    pub padding: usize,
}

/// PCM to DPCM encoder
#[derive(Debug, Clone)]
pub struct DeltaEncoder {
    settings: EncoderSettings,
    gain: f32,
}

impl DeltaEncoder {
    pub fn new(settings: EncoderSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            gain: 10.0f32.powf(settings.gain_db / 20.0),
            settings,
        })
    }

    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    /// Linear gain factor derived from the dB setting
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Map one resampled value onto the counter scale
    #[inline]
    pub fn quantize(&self, sample: f32) -> i32 {
        let clamped = sample.clamp(-CLAMP, CLAMP);
        (clamped * self.gain / DIVISOR) as i32 + BIAS
    }

    /// Encode a stream of samples
    pub fn encode<I>(&self, samples: I) -> EncodedSample
    where
        I: IntoIterator<Item = f32>,
    {
        self.encode_counted(samples, |_| {}).sample
    }

    /// Encode, calling `observer` with the state after every sample
    pub fn encode_observed<I, F>(&self, samples: I, observer: F) -> EncodedSample
    where
        I: IntoIterator<Item = f32>,
        F: FnMut(&DeltaState),
    {
        self.encode_counted(samples, observer).sample
    }

    /// Encode and report how the pass ended
    pub fn encode_counted<I, F>(&self, samples: I, mut observer: F) -> Encoding
    where
        I: IntoIterator<Item = f32>,
        F: FnMut(&DeltaState),
    {
        let max_len = self.settings.max_len;
        let mut samples = samples.into_iter();
        let mut state = DeltaState::new();
        let mut data = Vec::with_capacity(max_len);
        let mut consumed = 0u64;
        let mut exhausted = false;

        while data.len() < max_len {
            let Some(sample) = samples.next() else {
                exhausted = true;
                break;
            };
            consumed += 1;

            if let Some(byte) = state.push(self.quantize(sample)) {
                data.push(byte);
            }
            observer(&state);
        }

        let capacity_reached = !exhausted && samples.next().is_some();
        if state.bits_filled() > 0 {
            debug!("Dropping {} bits of an incomplete byte", state.bits_filled());
        }

        let payload = data.len();
        while data.len() < max_len && data.len() % 16 != 1 {
            data.push(FILLER);
        }

        debug!(
            "Encoded {} samples into {} bytes ({} padding), final level {}",
            consumed,
            data.len(),
            data.len() - payload,
            state.counter()
        );

        Encoding {
            padding: data.len() - payload,
            sample: EncodedSample::new(String::new(), data),
            samples_consumed: consumed,
            capacity_reached,
        }
    }
}

impl Default for DeltaEncoder {
    fn default() -> Self {
        let settings = EncoderSettings::default();
        Self {
            gain: 1.0,
            settings,
        }
    }
}
