//! Property-based tests for the conversion pipeline
//!
//! These tests use proptest to verify invariants across many random inputs.

mod common;

use common::*;
use dpcm_audio::dpcm::{decode_levels, is_legal_length, DeltaEncoder, EncoderSettings, BIAS};
use dpcm_audio::resampling::{output_len, IterSource, Resampler, ResamplerBackend, SincKernel};
use dpcm_audio::{ConversionRequest, DpcmConverter, EncodedSample, Quality};
use proptest::prelude::*;
use std::sync::Arc;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Property: every conversion ends on a length the hardware can address
    #[test]
    fn output_length_is_always_legal(
        quality in 0u8..16,
        gain_db in -12.0f32..12.0,
        sample_rate in prop::sample::select(vec![8000u32, 11025, 22050, 44100, 48000]),
        samples in prop::collection::vec(any::<i16>(), 1..3000)
    ) {
        let bytes = wav_i16(1, sample_rate, &samples);
        let request = ConversionRequest::new(Quality::new(quality).unwrap(), gain_db).unwrap();
        let conversion = DpcmConverter::new().convert_bytes(&bytes, &request).unwrap();

        let len = conversion.sample.len();
        prop_assert!(is_legal_length(len, EncodedSample::MAX_LEN), "length {}", len);
        prop_assert_eq!(
            len,
            expected_len(samples.len() as u64, f64::from(conversion.report.ratio), EncodedSample::MAX_LEN)
        );
    }

    /// Property: the delta counter never leaves 0..=63, whatever the input
    #[test]
    fn delta_counter_stays_in_range(
        gain_db in -12.0f32..12.0,
        samples in prop::collection::vec(-200_000.0f32..200_000.0, 0..2000)
    ) {
        let encoder = DeltaEncoder::new(EncoderSettings::with_gain(gain_db)).unwrap();
        let mut out_of_range = 0usize;
        encoder.encode_observed(samples, |state| {
            if !(0..=63).contains(&state.counter()) {
                out_of_range += 1;
            }
        });
        prop_assert_eq!(out_of_range, 0);
    }

    /// Property: replaying the payload reproduces the encoder's counter
    #[test]
    fn decoded_levels_track_encoder(
        samples in prop::collection::vec(-40_000.0f32..40_000.0, 8..1600)
    ) {
        let encoder = DeltaEncoder::new(EncoderSettings::default()).unwrap();
        let mut counters = Vec::new();
        let sample = encoder.encode_observed(samples.clone(), |s| counters.push(s.counter() as u8));

        let whole_bytes = samples.len() / 8;
        let levels = decode_levels(&sample.as_bytes()[..whole_bytes], BIAS as u8);
        prop_assert_eq!(&levels[..], &counters[..whole_bytes * 8]);
    }

    /// Property: the sinc resampler yields ceil(N * ratio) samples
    #[test]
    fn resampler_length_follows_ratio(
        len in 0usize..2000,
        ratio in 0.05f64..4.0
    ) {
        let kernel = Arc::new(SincKernel::default());
        let source = IterSource::new(std::iter::repeat(0.25f32).take(len));
        let resampler = Resampler::new(ResamplerBackend::Sinc, source, ratio, &kernel).unwrap();
        prop_assert_eq!(resampler.count() as u64, output_len(len as u64, ratio));
    }

    /// Property: resampler output stays finite and near the input's peak
    #[test]
    fn resampler_output_is_bounded(
        samples in prop::collection::vec(-32768.0f32..32767.0, 1..1500),
        ratio in 0.1f64..2.0
    ) {
        let kernel = Arc::new(SincKernel::default());
        let source = IterSource::new(samples.into_iter());
        let resampler = Resampler::new(ResamplerBackend::Sinc, source, ratio, &kernel).unwrap();
        for value in resampler {
            prop_assert!(value.is_finite());
            // Ringing may overshoot, but never by orders of magnitude
            prop_assert!(value.abs() < 32768.0 * 4.0, "value {}", value);
        }
    }
}
