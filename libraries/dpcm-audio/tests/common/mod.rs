//! Shared fixtures for the integration tests
//!
//! WAVE files are built by hand so the tests control every header field,
//! plus a `hound` writer for files that must look like real-world output.

#![allow(dead_code)]

use std::path::Path;

/// Append one RIFF chunk (tag, length, body, pad byte)
pub fn push_chunk(out: &mut Vec<u8>, tag: &[u8; 4], body: &[u8]) {
    out.extend_from_slice(tag);
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(body);
    if body.len() % 2 == 1 {
        out.push(0);
    }
}

/// A 16-byte PCM `fmt ` body
pub fn fmt_body(format_tag: u16, channels: u16, sample_rate: u32, bits: u16) -> Vec<u8> {
    let block_align = channels * bits / 8;
    let byte_rate = sample_rate * u32::from(block_align);

    let mut body = Vec::with_capacity(16);
    body.extend_from_slice(&format_tag.to_le_bytes());
    body.extend_from_slice(&channels.to_le_bytes());
    body.extend_from_slice(&sample_rate.to_le_bytes());
    body.extend_from_slice(&byte_rate.to_le_bytes());
    body.extend_from_slice(&block_align.to_le_bytes());
    body.extend_from_slice(&bits.to_le_bytes());
    body
}

/// Wrap already-built chunks in a RIFF/WAVE envelope
pub fn riff(chunks: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(chunks.len() + 12);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((chunks.len() + 4) as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(chunks);
    out
}

/// Canonical `fmt ` + `data` file with raw sample bytes
pub fn wav_bytes(channels: u16, bits: u16, sample_rate: u32, data: &[u8]) -> Vec<u8> {
    let mut chunks = Vec::new();
    push_chunk(&mut chunks, b"fmt ", &fmt_body(1, channels, sample_rate, bits));
    push_chunk(&mut chunks, b"data", data);
    riff(&chunks)
}

/// 16-bit file from interleaved samples
pub fn wav_i16(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
    let data: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    wav_bytes(channels, 16, sample_rate, &data)
}

/// Square wave alternating every `half_period` samples
pub fn square_wave(len: usize, half_period: usize, amplitude: i16) -> Vec<i16> {
    (0..len)
        .map(|i| {
            if (i / half_period) % 2 == 0 {
                amplitude
            } else {
                -amplitude
            }
        })
        .collect()
}

/// Duplicate mono samples into an interleaved stereo buffer
pub fn to_stereo(mono: &[i16]) -> Vec<i16> {
    mono.iter().flat_map(|&s| [s, s]).collect()
}

/// Write a 16-bit WAV through hound
pub fn write_hound_wav(path: &Path, channels: u16, sample_rate: u32, samples: &[i16]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV file");
    for &s in samples {
        writer.write_sample(s).expect("Failed to write sample");
    }
    writer.finalize().expect("Failed to finalize WAV file");
}

/// Expected aligned output length for `frames` input frames at `ratio`
pub fn expected_len(frames: u64, ratio: f64, max_len: usize) -> usize {
    let ticks = (frames as f64 * ratio).ceil() as usize;
    let mut len = (ticks / 8).min(max_len);
    while len < max_len && len % 16 != 1 {
        len += 1;
    }
    len
}
