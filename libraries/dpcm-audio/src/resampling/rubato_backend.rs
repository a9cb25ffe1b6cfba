//! Rubato resampler backend
//!
//! Drains the source on the first pull, runs it through rubato's
//! `SincFixedIn` in fixed chunks, and trims the filter delay so the output
//! lines up with the streaming sinc backend. With an output limit only the
//! input needed for that many samples is read.

use super::{output_len, validate_ratio, ResamplingError, Result, SampleSource, CUTOFF};
use rubato::{
    Resampler as _, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
    WindowFunction,
};
use tracing::{debug, warn};

/// Input frames per rubato `process` call
const CHUNK_SIZE: usize = 1024;

/// Filter length in input samples
const SINC_LEN: usize = 256;

/// Upper bound on flush calls once the input is consumed
const MAX_FLUSH_ROUNDS: usize = 64;

/// Buffered resampler backed by rubato
pub struct RubatoResampler<S> {
    source: S,
    ratio: f64,
    output_limit: Option<u64>,
    output: Option<std::vec::IntoIter<f32>>,
    error: Option<ResamplingError>,
    failed: bool,
}

impl<S: SampleSource> RubatoResampler<S> {
    pub fn new(source: S, ratio: f64) -> Result<Self> {
        validate_ratio(ratio)?;
        Ok(Self {
            source,
            ratio,
            output_limit: None,
            output: None,
            error: None,
            failed: false,
        })
    }

    /// Stop after at most `samples` output samples
    #[must_use]
    pub fn with_output_limit(mut self, samples: u64) -> Self {
        self.output_limit = Some(samples);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// The failure that ended the output early, if any
    pub fn take_error(&mut self) -> Option<ResamplingError> {
        self.error.take()
    }

    fn params() -> SincInterpolationParameters {
        SincInterpolationParameters {
            sinc_len: SINC_LEN,
            f_cutoff: CUTOFF as f32,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 512,
            window: WindowFunction::Blackman,
        }
    }

    /// Input samples needed to produce `limit` outputs, filter reach included
    fn input_budget(limit: u64, ratio: f64) -> usize {
        (limit as f64 / ratio).ceil() as usize + 2 * SINC_LEN
    }

    /// Pull the remaining samples from the source, up to the input budget
    fn drain_source(&mut self) -> Vec<f32> {
        let budget = self
            .output_limit
            .map(|limit| Self::input_budget(limit, self.ratio));

        let mut input = Vec::new();
        while !budget.is_some_and(|budget| input.len() >= budget) {
            match self.source.next_sample() {
                Some(sample) => input.push(sample),
                None => break,
            }
        }
        input
    }

    /// Resample `input` in one go, returning `ceil(len * ratio)` samples
    /// capped at the output limit
    fn run(&self, input: &[f32]) -> Result<Vec<f32>> {
        let mut expected = output_len(input.len() as u64, self.ratio);
        if let Some(limit) = self.output_limit {
            expected = expected.min(limit);
        }
        let expected = expected as usize;
        if expected == 0 {
            return Ok(Vec::new());
        }

        let mut resampler = SincFixedIn::<f32>::new(self.ratio, 1.0, Self::params(), CHUNK_SIZE, 1)
            .map_err(|e| {
                ResamplingError::InitializationFailed(format!("SincFixedIn creation failed: {}", e))
            })?;

        let delay = resampler.output_delay();
        let mut output = Vec::with_capacity(expected + delay);
        let mut pos = 0;

        // Complete chunks only; the tail goes through process_partial
        loop {
            let needed = resampler.input_frames_next();
            if input.len() - pos < needed {
                break;
            }
            let chunk = [&input[pos..pos + needed]];
            let out = resampler.process(&chunk[..], None).map_err(|e| {
                ResamplingError::ProcessingFailed(format!("SincFixedIn resampling failed: {}", e))
            })?;
            output.extend_from_slice(&out[0]);
            pos += needed;
        }

        if pos < input.len() {
            let chunk = [&input[pos..]];
            let out = resampler
                .process_partial(Some(&chunk[..]), None)
                .map_err(|e| {
                    ResamplingError::ProcessingFailed(format!("SincFixedIn tail failed: {}", e))
                })?;
            output.extend_from_slice(&out[0]);
        }

        // Push the delayed samples out of the filter
        let mut rounds = 0;
        while output.len() < expected + delay && rounds < MAX_FLUSH_ROUNDS {
            let out = resampler
                .process_partial::<&[f32]>(None, None)
                .map_err(|e| {
                    ResamplingError::ProcessingFailed(format!("SincFixedIn flush failed: {}", e))
                })?;
            output.extend_from_slice(&out[0]);
            rounds += 1;
        }

        output.drain(..delay.min(output.len()));
        output.resize(expected, 0.0);

        debug!(
            "rubato: {} in, {} out, delay {} frames",
            input.len(),
            output.len(),
            delay
        );
        Ok(output)
    }
}

impl<S: SampleSource> Iterator for RubatoResampler<S> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.failed {
            return None;
        }

        if self.output.is_none() {
            let input = self.drain_source();
            match self.run(&input) {
                Ok(samples) => self.output = Some(samples.into_iter()),
                Err(e) => {
                    warn!("Resampling failed, output ends early: {}", e);
                    self.error = Some(e);
                    self.failed = true;
                    return None;
                }
            }
        }

        self.output.as_mut().and_then(Iterator::next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resampling::IterSource;

    fn resample(input: Vec<f32>, ratio: f64) -> Vec<f32> {
        RubatoResampler::new(IterSource::new(input.into_iter()), ratio)
            .unwrap()
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(resample(Vec::new(), 0.75).is_empty());
    }

    #[test]
    fn test_exact_output_length() {
        assert_eq!(resample(vec![0.0; 5000], 0.5).len(), 2500);
        assert_eq!(resample(vec![0.0; 300], 0.7516).len(), 226);
        assert_eq!(resample(vec![0.0; 1000], 1.5).len(), 1500);
    }

    #[test]
    fn test_dc_level_preserved() {
        let out = resample(vec![5_000.0; 8000], 0.75);
        for &s in &out[1000..5000] {
            assert!((s - 5_000.0).abs() < 100.0, "{}", s);
        }
    }

    #[test]
    fn test_output_limit_reads_bounded_input() {
        let mut pulled = 0u64;
        let source = IterSource::new(std::iter::repeat(0.0f32).inspect(|_| pulled += 1));
        let out: Vec<f32> = RubatoResampler::new(source, 0.5)
            .unwrap()
            .with_output_limit(1000)
            .collect();
        assert_eq!(out.len(), 1000);
        assert_eq!(pulled, 2000 + 2 * SINC_LEN as u64);
    }

    #[test]
    fn test_output_limit_matches_unlimited_prefix() {
        let input: Vec<f32> = (0..6000).map(|i| (i as f32 * 0.03).sin() * 9000.0).collect();
        let full = resample(input.clone(), 0.75);
        let limited: Vec<f32> = RubatoResampler::new(IterSource::new(input.into_iter()), 0.75)
            .unwrap()
            .with_output_limit(2000)
            .collect();

        assert_eq!(limited.len(), 2000);
        for (i, (a, b)) in limited.iter().zip(&full).enumerate() {
            assert!((a - b).abs() < 1.0, "i {}: {} vs {}", i, a, b);
        }
    }

    #[test]
    fn test_limit_above_input_keeps_natural_length() {
        let out: Vec<f32> = RubatoResampler::new(IterSource::new(vec![0.0f32; 300].into_iter()), 0.5)
            .unwrap()
            .with_output_limit(10_000)
            .collect();
        assert_eq!(out.len(), 150);
    }

    #[test]
    fn test_failure_is_kept_and_ends_output() {
        let mut resampler =
            RubatoResampler::new(IterSource::new(vec![1.0f32; 100].into_iter()), 0.5).unwrap();
        resampler.error = Some(ResamplingError::ProcessingFailed("boom".to_string()));
        resampler.failed = true;

        assert_eq!(resampler.next(), None);
        assert!(matches!(
            resampler.take_error(),
            Some(ResamplingError::ProcessingFailed(_))
        ));
        assert!(resampler.take_error().is_none());
    }

    #[test]
    fn test_rejects_bad_ratio() {
        let source = IterSource::new(std::iter::empty());
        assert!(RubatoResampler::new(source, 0.0).is_err());
    }
}
