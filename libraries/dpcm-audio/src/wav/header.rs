//! RIFF/WAVE header walking
//!
//! Locates the `fmt ` and `data` chunks of a WAVE container without reading
//! the sample data itself. Chunks may appear in any order after the `RIFF`
//! signature; unknown chunks are skipped by their declared length.

use crate::error::{DpcmError, Result};
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use tracing::debug;

/// Format tag of uncompressed linear PCM
pub const WAVE_FORMAT_PCM: u16 = 0x0001;

/// Bytes of the `fmt ` body that are interpreted (the classic PCMWAVEFORMAT)
const FMT_BODY_LEN: usize = 16;

/// Sample layout of the source recording
///
/// Produced once by [`WavHeader::read`] and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Number of interleaved channels (1 or 2)
    pub channels: u16,
    /// Effective sample width in bits (8, 16, 24 or 32)
    pub bits_per_sample: u16,
    /// Source sample rate in Hz
    pub sample_rate: u32,
    /// Bytes per frame as declared by the container
    pub block_align: u16,
}

impl AudioFormat {
    /// Bytes read per channel word
    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_per_sample / 8)
    }

    /// Bytes consumed per decoded frame
    pub fn frame_len(&self) -> usize {
        self.bytes_per_sample() * usize::from(self.channels)
    }

    pub fn is_stereo(&self) -> bool {
        self.channels == 2
    }

    /// Short human-readable summary, e.g. `44100 Hz, 16 bits, Stereo`
    pub fn describe(&self) -> String {
        format!(
            "{} Hz, {} bits, {}",
            self.sample_rate,
            self.bits_per_sample,
            if self.is_stereo() { "Stereo" } else { "Mono" }
        )
    }
}

/// Location of the raw sample bytes inside the container
///
/// A view only: the bytes are read on demand by the frame decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSampleRegion {
    /// Absolute offset of the first sample byte
    pub byte_offset: u64,
    /// Declared length of the `data` chunk
    pub byte_length: u32,
}

impl RawSampleRegion {
    /// Number of whole frames the region declares for `format`
    pub fn frame_count(&self, format: &AudioFormat) -> u64 {
        match format.frame_len() {
            0 => 0,
            len => u64::from(self.byte_length) / len as u64,
        }
    }
}

/// Parsed WAVE header: the format plus where its samples live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub format: AudioFormat,
    pub region: RawSampleRegion,
}

/// Raw `fmt ` fields before validation
#[derive(Debug, Clone, Copy, Default)]
struct FmtChunk {
    format_tag: u16,
    channels: u16,
    sample_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
}

impl FmtChunk {
    fn from_bytes(data: &[u8; FMT_BODY_LEN]) -> Self {
        Self {
            format_tag: u16::from_le_bytes([data[0], data[1]]),
            channels: u16::from_le_bytes([data[2], data[3]]),
            sample_rate: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
            // bytes 8..12 hold the average byte rate, which is not needed
            block_align: u16::from_le_bytes([data[12], data[13]]),
            bits_per_sample: u16::from_le_bytes([data[14], data[15]]),
        }
    }
}

impl WavHeader {
    /// Walk the chunk list of a WAVE container
    ///
    /// On success the reader is left somewhere after the last chunk visited;
    /// callers seek to [`RawSampleRegion::byte_offset`] before decoding.
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let mut tag = [0u8; 4];
        let mut word = [0u8; 4];

        if read_up_to(reader, &mut tag)? < tag.len() || &tag != b"RIFF" {
            return Err(DpcmError::invalid_format("missing RIFF signature"));
        }
        // The RIFF size is not trusted; the walk runs to end of stream instead
        read_up_to(reader, &mut word)?;

        let mut is_wave = false;
        let mut fmt: Option<FmtChunk> = None;
        let mut region: Option<RawSampleRegion> = None;

        loop {
            if read_up_to(reader, &mut tag)? < tag.len() {
                debug!("End of file reached");
                break;
            }

            if &tag == b"WAVE" {
                is_wave = true;
                continue;
            }

            if read_up_to(reader, &mut word)? < word.len() {
                debug!("Truncated chunk header {}", fourcc(&tag));
                break;
            }
            let chunk_len = u32::from_le_bytes(word);

            match &tag {
                b"fmt " => {
                    debug!("Found fmt chunk ({} bytes)", chunk_len);
                    let mut body = [0u8; FMT_BODY_LEN];
                    let wanted = (chunk_len as usize).min(FMT_BODY_LEN);
                    let got = read_up_to(reader, &mut body[..wanted])?;
                    let chunk = FmtChunk::from_bytes(&body);

                    if chunk.format_tag != WAVE_FORMAT_PCM {
                        return Err(DpcmError::InvalidFormat(format!(
                            "unsupported format tag {:#06x} (only linear PCM is accepted)",
                            chunk.format_tag
                        )));
                    }

                    fmt = Some(chunk);
                    skip_chunk(reader, chunk_len, got as u32)?;
                }
                b"data" => {
                    let byte_offset = reader.stream_position()?;
                    debug!(
                        "Found data chunk ({} bytes at offset {})",
                        chunk_len, byte_offset
                    );
                    region = Some(RawSampleRegion {
                        byte_offset,
                        byte_length: chunk_len,
                    });
                    skip_chunk(reader, chunk_len, 0)?;
                }
                _ => {
                    debug!("Unrecognized chunk {} ({} bytes)", fourcc(&tag), chunk_len);
                    skip_chunk(reader, chunk_len, 0)?;
                }
            }

            if fmt.is_some() && region.is_some() {
                break;
            }
        }

        if !is_wave {
            return Err(DpcmError::invalid_format("missing WAVE form type"));
        }
        let fmt = fmt.ok_or_else(|| DpcmError::invalid_format("missing fmt chunk"))?;
        let region = region.ok_or_else(|| DpcmError::invalid_format("missing data chunk"))?;

        let format = validate_format(&fmt)?;
        if region.byte_length == 0 {
            return Err(DpcmError::invalid_format("data chunk is empty"));
        }
        if region.frame_count(&format) == 0 {
            return Err(DpcmError::InvalidFormat(format!(
                "data chunk of {} bytes holds no complete {}-byte frame",
                region.byte_length,
                format.frame_len()
            )));
        }

        debug!(
            "Scan done ({} Hz, {} bits, {} channels)",
            format.sample_rate, format.bits_per_sample, format.channels
        );

        Ok(Self { format, region })
    }
}

fn validate_format(fmt: &FmtChunk) -> Result<AudioFormat> {
    if fmt.channels != 1 && fmt.channels != 2 {
        return Err(DpcmError::InvalidFormat(format!(
            "unsupported channel count {} (must be 1 or 2)",
            fmt.channels
        )));
    }

    if fmt.sample_rate == 0 {
        return Err(DpcmError::invalid_format("sample rate is zero"));
    }

    // The sample width is taken from the block alignment, which is what the
    // frames are actually laid out by.
    let bytes_per_sample = fmt.block_align / fmt.channels;
    if !(1..=4).contains(&bytes_per_sample) {
        return Err(DpcmError::InvalidFormat(format!(
            "unsupported sample width of {} bytes (block align {}, {} channels)",
            bytes_per_sample, fmt.block_align, fmt.channels
        )));
    }

    let bits_per_sample = bytes_per_sample * 8;
    if fmt.bits_per_sample != bits_per_sample {
        debug!(
            "Header declares {} bits per sample, reading {}-bit words",
            fmt.bits_per_sample, bits_per_sample
        );
    }

    Ok(AudioFormat {
        channels: fmt.channels,
        bits_per_sample,
        sample_rate: fmt.sample_rate,
        block_align: fmt.block_align,
    })
}

/// Skip the rest of a chunk body plus its RIFF pad byte
fn skip_chunk<R: Seek>(reader: &mut R, chunk_len: u32, consumed: u32) -> Result<()> {
    let pad = i64::from(chunk_len & 1);
    let remaining = i64::from(chunk_len.saturating_sub(consumed)) + pad;
    if remaining > 0 {
        reader.seek(SeekFrom::Current(remaining))?;
    }
    Ok(())
}

/// Fill as much of `buf` as the stream allows, returning the byte count
pub(crate) fn read_up_to<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

fn fourcc(tag: &[u8; 4]) -> String {
    tag.iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
        .collect()
}
