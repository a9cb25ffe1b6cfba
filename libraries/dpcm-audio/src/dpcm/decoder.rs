//! DPCM playback model
//!
//! Replays an encoded byte stream through the same bounded counter the
//! encoder uses, least significant bit first.

use super::encoder::{BIAS, MAX_LEVEL};

/// Expand `bytes` into one counter level per bit
pub fn decode_levels(bytes: &[u8], initial_level: u8) -> Vec<u8> {
    let mut level = i32::from(initial_level).min(MAX_LEVEL);
    let mut levels = Vec::with_capacity(bytes.len() * 8);

    for &byte in bytes {
        for bit in 0..8 {
            if byte & (1 << bit) != 0 {
                level = (level + 1).min(MAX_LEVEL);
            } else {
                level = (level - 1).max(0);
            }
            levels.push(level as u8);
        }
    }

    levels
}

/// Map counter levels to `f32` samples in [-1, 1], centred on the bias
pub fn levels_to_pcm(levels: &[u8]) -> Vec<f32> {
    levels
        .iter()
        .map(|&l| ((i32::from(l) - BIAS) as f32 / BIAS as f32).clamp(-1.0, 1.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dpcm::{DeltaEncoder, EncoderSettings};

    #[test]
    fn test_decode_alternating() {
        let levels = decode_levels(&[0x55], 32);
        assert_eq!(levels, vec![33, 32, 33, 32, 33, 32, 33, 32]);
    }

    #[test]
    fn test_decode_saturates() {
        let levels = decode_levels(&[0xFF; 8], 60);
        assert_eq!(levels.iter().copied().max(), Some(63));
        let levels = decode_levels(&[0x00; 8], 3);
        assert_eq!(levels.last(), Some(&0));
    }

    #[test]
    fn test_replays_encoder_counter() {
        let input: Vec<f32> = (0..800)
            .map(|i| ((i as f32) * 0.02).sin() * 20_000.0)
            .collect();

        let mut counters = Vec::new();
        let encoder = DeltaEncoder::new(EncoderSettings::default()).unwrap();
        let sample = encoder.encode_observed(input, |s| counters.push(s.counter() as u8));

        let levels = decode_levels(&sample.as_bytes()[..100], BIAS as u8);
        assert_eq!(&levels[..], &counters[..800]);
    }

    #[test]
    fn test_levels_to_pcm_range() {
        let pcm = levels_to_pcm(&[0, 32, 63]);
        assert_eq!(pcm[0], -1.0);
        assert_eq!(pcm[1], 0.0);
        assert!(pcm[2] > 0.9 && pcm[2] <= 1.0);
    }
}
