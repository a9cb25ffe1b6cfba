//! Frame decoding: raw PCM frames to mono integer samples
//!
//! Every supported width is brought to the same 16-bit scale so the encoder
//! can use a single divisor regardless of the source format.

use super::header::{read_up_to, AudioFormat, RawSampleRegion, WavHeader};
use crate::error::{DpcmError, Result};
use crate::resampling::SampleSource;
use std::io::{Read, Seek, SeekFrom};
use tracing::debug;

/// Decode one interleaved frame into a single mono value
///
/// `frame` must hold `channels * bytes_per_sample` bytes. Stereo frames are
/// averaged with integer division (truncating toward zero).
pub fn decode_frame(frame: &[u8], channels: u16, bytes_per_sample: usize) -> i32 {
    let stereo = channels == 2;

    match bytes_per_sample {
        1 => {
            // Unsigned with a 128 bias. The stereo sum is shifted by one bit
            // less, which halves it.
            if stereo {
                (i32::from(frame[0]) + i32::from(frame[1]) - 256) << 7
            } else {
                (i32::from(frame[0]) - 128) << 8
            }
        }
        2 => {
            let left = i32::from(i16::from_le_bytes([frame[0], frame[1]]));
            if stereo {
                let right = i32::from(i16::from_le_bytes([frame[2], frame[3]]));
                (left + right) / 2
            } else {
                left
            }
        }
        3 => {
            // Keep the two most significant bytes of each 24-bit word
            let left = i32::from(i16::from_le_bytes([frame[1], frame[2]]));
            if stereo {
                let right = i32::from(i16::from_le_bytes([frame[4], frame[5]]));
                (left + right) / 2
            } else {
                left
            }
        }
        4 => {
            let left = i32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]) >> 16;
            if stereo {
                let right = i32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]) >> 16;
                (left + right) / 2
            } else {
                left
            }
        }
        _ => 0,
    }
}

/// Lazy, finite reader of mono samples from a PCM data region
///
/// Reads one frame per call and never rewinds. A short read before the
/// declared frame count ends the sequence and marks the decoder truncated.
/// A failing read also ends it; the error is kept for [`Self::take_error`].
pub struct FrameDecoder<R> {
    reader: R,
    format: AudioFormat,
    frame: Vec<u8>,
    frames_declared: u64,
    frames_read: u64,
    truncated: bool,
    finished: bool,
    error: Option<DpcmError>,
}

impl<R: Read> FrameDecoder<R> {
    /// Create a decoder over a reader already positioned at the region start
    pub fn new(reader: R, format: AudioFormat, region: RawSampleRegion) -> Self {
        let frames_declared = region.frame_count(&format);
        let leftover = u64::from(region.byte_length) - frames_declared * format.frame_len() as u64;
        if leftover > 0 {
            debug!("Ignoring {} trailing bytes of a partial frame", leftover);
        }

        Self {
            reader,
            frame: vec![0; format.frame_len()],
            format,
            frames_declared,
            frames_read: 0,
            truncated: false,
            finished: frames_declared == 0,
            error: None,
        }
    }

    /// Frames the data chunk declares
    pub fn frames_declared(&self) -> u64 {
        self.frames_declared
    }

    /// Frames decoded so far
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Whether the stream ended before the declared frame count
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    /// The read error that ended the stream, if any
    pub fn take_error(&mut self) -> Option<DpcmError> {
        self.error.take()
    }

    fn read_frame(&mut self) -> Option<i32> {
        if self.finished {
            return None;
        }

        let got = match read_up_to(&mut self.reader, &mut self.frame) {
            Ok(n) => n,
            Err(e) => {
                debug!("Read error after {} frames: {}", self.frames_read, e);
                self.error = Some(e);
                self.finished = true;
                return None;
            }
        };

        if got < self.frame.len() {
            self.truncated = true;
            self.finished = true;
            debug!(
                "Sample data ended after {} of {} frames",
                self.frames_read, self.frames_declared
            );
            return None;
        }

        self.frames_read += 1;
        if self.frames_read == self.frames_declared {
            self.finished = true;
        }

        Some(decode_frame(
            &self.frame,
            self.format.channels,
            self.format.bytes_per_sample(),
        ))
    }
}

impl<R: Read + Seek> FrameDecoder<R> {
    /// Seek to the data region described by `header` and start decoding
    pub fn from_header(mut reader: R, header: &WavHeader) -> Result<Self> {
        reader.seek(SeekFrom::Start(header.region.byte_offset))?;
        Ok(Self::new(reader, header.format, header.region))
    }
}

impl<R: Read> Iterator for FrameDecoder<R> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        self.read_frame()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            return (0, Some(0));
        }
        let remaining = self.frames_declared - self.frames_read;
        (0, usize::try_from(remaining).ok())
    }
}

impl<R: Read> SampleSource for FrameDecoder<R> {
    fn next_sample(&mut self) -> Option<f32> {
        self.read_frame().map(|v| v as f32)
    }
}
