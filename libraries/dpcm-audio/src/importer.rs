//! Sample importer
//!
//! Loads a WAVE file once, validates it up front, and converts it on request.
//! The last conversion is cached so re-previewing with unchanged settings
//! does not redo the work.

use crate::converter::{Conversion, ConversionReport, ConversionRequest, DpcmConverter};
use crate::dpcm::EncodedSample;
use crate::error::Result;
use crate::wav::{AudioFormat, WavHeader};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A loaded source file ready for conversion
#[derive(Debug, Clone)]
pub struct SampleImporter {
    name: String,
    bytes: Arc<[u8]>,
    header: WavHeader,
    converter: DpcmConverter,
    cached: Option<(ConversionRequest, Conversion)>,
}

impl SampleImporter {
    /// Read and validate a WAVE file
    ///
    /// The sample name defaults to the file name without its `.wav` extension.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::from_bytes(sample_name(&file_name), bytes)
    }

    /// Validate an in-memory WAVE file
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        let bytes: Arc<[u8]> = bytes.into();
        let header = WavHeader::read(&mut Cursor::new(&bytes[..]))?;
        let name = name.into();
        debug!("Loaded '{}': {}", name, header.format.describe());

        Ok(Self {
            name,
            bytes,
            header,
            converter: DpcmConverter::new(),
            cached: None,
        })
    }

    /// Use a specific converter (shared kernel, custom capacity)
    #[must_use]
    pub fn with_converter(mut self, converter: DpcmConverter) -> Self {
        self.converter = converter;
        self.cached = None;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn format(&self) -> &AudioFormat {
        &self.header.format
    }

    /// Declared length of the sample data in bytes
    pub fn data_len(&self) -> u32 {
        self.header.region.byte_length
    }

    /// Format summary, e.g. `44100 Hz, 16 bits, Mono`
    pub fn describe(&self) -> String {
        self.header.format.describe()
    }

    pub fn target_rate_hz(&self, request: &ConversionRequest) -> f32 {
        request.target_rate_hz()
    }

    /// Convert without touching the cache
    ///
    /// Each call reads through its own cursor, so this can run from several
    /// threads at once.
    pub fn convert(&self, request: &ConversionRequest) -> Result<Conversion> {
        self.converter.convert(Cursor::new(&self.bytes[..]), request)
    }

    /// Convert for previewing, reusing the last result if `request` is unchanged
    pub fn preview(&mut self, request: &ConversionRequest) -> Result<&EncodedSample> {
        Ok(&self.cached_conversion(request)?.sample)
    }

    /// Report of the cached conversion, if any
    pub fn last_report(&self) -> Option<&ConversionReport> {
        self.cached.as_ref().map(|(_, conversion)| &conversion.report)
    }

    /// Convert, name the result and hand it over
    ///
    /// Clears the preview cache.
    pub fn import(&mut self, request: &ConversionRequest) -> Result<EncodedSample> {
        let conversion = match self.cached.take() {
            Some((cached, conversion)) if cached == *request => conversion,
            _ => self.convert(request)?,
        };

        let mut sample = conversion.sample;
        sample.rename(self.name.clone());
        Ok(sample)
    }

    fn cached_conversion(&mut self, request: &ConversionRequest) -> Result<&Conversion> {
        let conversion = match self.cached.take() {
            Some((cached, conversion)) if cached == *request => {
                debug!("Reusing cached conversion for '{}'", self.name);
                conversion
            }
            _ => self.convert(request)?,
        };

        let (_, conversion) = self.cached.insert((*request, conversion));
        Ok(conversion)
    }
}

/// Default sample name for a file: the name without a `.wav` extension
pub fn sample_name(file_name: &str) -> String {
    let len = file_name.len();
    if len > 4
        && file_name.is_char_boundary(len - 4)
        && file_name[len - 4..].eq_ignore_ascii_case(".wav")
    {
        file_name[..len - 4].to_string()
    } else {
        file_name.to_string()
    }
}
