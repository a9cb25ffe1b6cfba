//! Subcommand implementations
//!
//! Kept apart from argument parsing so they can be driven from tests.

use crate::error::Result;
use dpcm_audio::dpcm::{decode_levels, levels_to_pcm, BIAS};
use dpcm_audio::{
    ConversionReport, ConversionRequest, EncodedSample, Quality, Region, SampleImporter,
};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Extension of raw DPCM payload files
pub const OUTPUT_EXTENSION: &str = "dmc";

/// Parsed format plus the playback rates available for it
pub fn info(input: &Path, region: Region) -> Result<String> {
    let importer = SampleImporter::open(input)?;
    let format = importer.format();

    let mut out = String::new();
    let _ = writeln!(out, "{}: {}", importer.name(), importer.describe());
    let _ = writeln!(
        out,
        "  data: {} bytes, {} frames",
        importer.data_len(),
        u64::from(importer.data_len()) / format.frame_len() as u64
    );
    let _ = writeln!(out, "  {} rates:", region.display_name());
    for quality in Quality::all() {
        let rate = quality.target_rate_hz(region);
        let _ = writeln!(
            out,
            "    {:>2}: {:>8.1} Hz (ratio {:.4})",
            quality,
            rate,
            rate / format.sample_rate as f32
        );
    }

    Ok(out)
}

/// Options for `convert`
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub input: PathBuf,
    /// Defaults to the input path with a `.dmc` extension
    pub output: Option<PathBuf>,
    /// Write the decoded levels back out as a WAV file
    pub preview: Option<PathBuf>,
    /// Sample name; defaults to the file name without `.wav`
    pub name: Option<String>,
    pub request: ConversionRequest,
}

/// What `convert` produced
#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    pub name: String,
    pub output: PathBuf,
    pub preview: Option<PathBuf>,
    pub report: ConversionReport,
}

/// Convert one file and write the payload (and optional preview)
pub fn convert(options: &ConvertOptions) -> Result<ConvertOutcome> {
    let mut importer = SampleImporter::open(&options.input)?;
    if let Some(name) = &options.name {
        importer.set_name(name.clone());
    }

    let conversion = importer.convert(&options.request)?;
    let report = conversion.report;
    let mut sample = conversion.sample;
    sample.rename(importer.name());

    if report.input_truncated {
        warn!(
            "{}: data chunk is truncated ({} of {} frames)",
            options.input.display(),
            report.frames_decoded,
            report.frames_declared
        );
    }

    let output = options
        .output
        .clone()
        .unwrap_or_else(|| options.input.with_extension(OUTPUT_EXTENSION));
    std::fs::write(&output, sample.as_bytes())?;
    info!(
        "Wrote '{}' ({} bytes) to {}",
        sample.name,
        sample.len(),
        output.display()
    );

    if let Some(path) = &options.preview {
        write_preview(path, &sample, report.target_rate_hz)?;
        info!("Wrote preview to {}", path.display());
    }

    Ok(ConvertOutcome {
        name: sample.name,
        output,
        preview: options.preview.clone(),
        report,
    })
}

/// Render a sample's counter levels as 16-bit mono PCM at its playback rate
pub fn write_preview(path: &Path, sample: &EncodedSample, rate_hz: f32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: rate_hz.round() as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let levels = decode_levels(sample.as_bytes(), BIAS as u8);
    let mut writer = hound::WavWriter::create(path, spec)?;
    for value in levels_to_pcm(&levels) {
        writer.write_sample((value * f32::from(i16::MAX)) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
