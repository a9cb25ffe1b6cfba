//! WAV to DPCM conversion pipeline
//!
//! Header parse, frame decode, resample and delta encode in one synchronous
//! pull-driven pass. Every stage pulls from the one before it, so only the
//! resampler's kernel window is ever buffered (with the sinc backend).

use crate::dpcm::{DeltaEncoder, EncodedSample, EncoderSettings};
use crate::error::{DpcmError, Result};
use crate::quality::{resample_ratio, Quality, Region};
use crate::resampling::{Resampler, ResamplerBackend, SincKernel};
use crate::wav::{AudioFormat, FrameDecoder, WavHeader};
use std::io::{Cursor, Read, Seek};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Largest gain boost or cut accepted, in dB
pub const MAX_GAIN_DB: f32 = 12.0;

/// Parameters for one conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionRequest {
    quality: Quality,
    gain_db: f32,
    region: Region,
    backend: ResamplerBackend,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            quality: Quality::MAX,
            gain_db: 0.0,
            region: Region::default(),
            backend: ResamplerBackend::default(),
        }
    }
}

impl ConversionRequest {
    /// Create a request, rejecting gains outside +/-12 dB
    pub fn new(quality: Quality, gain_db: f32) -> Result<Self> {
        if !gain_db.is_finite() || gain_db.abs() > MAX_GAIN_DB {
            return Err(DpcmError::InvalidParameter(format!(
                "gain {} dB out of range (-{max}..={max})",
                gain_db,
                max = MAX_GAIN_DB
            )));
        }

        Ok(Self {
            quality,
            gain_db,
            ..Default::default()
        })
    }

    #[must_use]
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: ResamplerBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn backend(&self) -> ResamplerBackend {
        self.backend
    }

    /// Playback rate the request targets
    pub fn target_rate_hz(&self) -> f32 {
        self.quality.target_rate_hz(self.region)
    }
}

/// What happened during a conversion
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub format: AudioFormat,
    pub target_rate_hz: f32,
    /// Output rate over source rate
    pub ratio: f32,
    pub frames_declared: u64,
    pub frames_decoded: u64,
    /// The data chunk ended before its declared length
    pub input_truncated: bool,
    /// Output filled up before the input ran out
    pub capacity_reached: bool,
    pub encoded_len: usize,
}

/// A converted sample together with its report
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub sample: EncodedSample,
    pub report: ConversionReport,
}

/// Reusable converter
///
/// Holds the shared sinc table; cheap to clone and safe to use from several
/// threads, each conversion owning its own reader and state.
#[derive(Debug, Clone)]
pub struct DpcmConverter {
    kernel: Arc<SincKernel>,
    capacity: usize,
}

impl Default for DpcmConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl DpcmConverter {
    pub fn new() -> Self {
        Self {
            kernel: Arc::new(SincKernel::default()),
            capacity: EncodedSample::MAX_LEN,
        }
    }

    /// Converter with a custom output capacity (at most [`EncodedSample::MAX_LEN`])
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 || capacity > EncodedSample::MAX_LEN {
            return Err(DpcmError::InvalidParameter(format!(
                "capacity {} out of range (1..={})",
                capacity,
                EncodedSample::MAX_LEN
            )));
        }
        Ok(Self {
            capacity,
            ..Self::new()
        })
    }

    /// Use an existing kernel table
    #[must_use]
    pub fn with_kernel(mut self, kernel: Arc<SincKernel>) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn kernel(&self) -> &Arc<SincKernel> {
        &self.kernel
    }

    /// Convert a WAVE container
    ///
    /// # Errors
    /// `InvalidFormat` for malformed or unsupported input, `Resampling` if the
    /// ratio cannot be honoured or the backend fails, `Io` if reading the
    /// sample data fails. A short data chunk is not an error; see
    /// [`ConversionReport::input_truncated`].
    pub fn convert<R: Read + Seek>(
        &self,
        mut reader: R,
        request: &ConversionRequest,
    ) -> Result<Conversion> {
        let header = WavHeader::read(&mut reader)?;
        let format = header.format;

        let target_rate_hz = request.target_rate_hz();
        let ratio = resample_ratio(target_rate_hz, format.sample_rate);
        debug!(
            "Converting {} to {:.1} Hz (quality {}, {}), ratio {:.4}",
            format.describe(),
            target_rate_hz,
            request.quality(),
            request.region().display_name(),
            ratio
        );

        let encoder = DeltaEncoder::new(EncoderSettings {
            gain_db: request.gain_db(),
            max_len: self.capacity,
        })?;

        // One sample past a full payload tells a filled capacity from pending input
        let output_limit = self.capacity as u64 * 8 + 1;
        let decoder = FrameDecoder::from_header(reader, &header)?;
        let mut resampler =
            Resampler::new(request.backend(), decoder, f64::from(ratio), &self.kernel)?
                .with_output_limit(output_limit);

        let encoding = encoder.encode_counted(&mut resampler, |_| {});

        if let Some(e) = resampler.take_error() {
            return Err(e.into());
        }
        if let Some(e) = resampler.source_mut().take_error() {
            warn!("Reading sample data failed: {}", e);
            return Err(e);
        }

        let decoder = resampler.source();
        let report = ConversionReport {
            format,
            target_rate_hz,
            ratio,
            frames_declared: decoder.frames_declared(),
            frames_decoded: decoder.frames_read(),
            input_truncated: decoder.is_truncated(),
            capacity_reached: encoding.capacity_reached,
            encoded_len: encoding.sample.len(),
        };

        if report.input_truncated {
            warn!(
                "Sample data truncated: decoded {} of {} frames",
                report.frames_decoded, report.frames_declared
            );
        }
        if report.capacity_reached {
            info!(
                "Output capacity of {} bytes reached, remaining input dropped",
                self.capacity
            );
        }
        info!(
            "Converted {} frames into {} bytes",
            report.frames_decoded, report.encoded_len
        );

        Ok(Conversion {
            sample: encoding.sample,
            report,
        })
    }

    /// Convert an in-memory WAVE file
    pub fn convert_bytes(&self, bytes: &[u8], request: &ConversionRequest) -> Result<Conversion> {
        self.convert(Cursor::new(bytes), request)
    }
}
