//! Streaming windowed-sinc resampler
//!
//! Band-limited interpolation: each output tick `n` sits at input time
//! `t = n / ratio`, and its value is the weighted sum of the input samples
//! within the kernel's reach of `t`. When downsampling the kernel is
//! stretched so its cutoff follows the output Nyquist frequency.

use super::{validate_ratio, SampleSource, SincKernel, CUTOFF, Result};
use std::collections::VecDeque;
use std::sync::Arc;

/// Pull-based sinc resampler
///
/// Holds at most one kernel width of input at a time. Yields
/// `ceil(N * ratio)` samples for an upstream of `N` samples and is not
/// restartable.
pub struct SincResampler<S> {
    source: S,
    kernel: Arc<SincKernel>,
    ratio: f64,
    /// Input samples advanced per output tick
    step: f64,
    /// Kernel scale: cutoff relative to the input Nyquist frequency
    scale: f64,
    /// Input samples on each side of `t` within the kernel's reach
    half_taps: i64,
    window: VecDeque<f32>,
    /// Absolute input index of `window[0]`
    window_start: i64,
    delivered: u64,
    exhausted: bool,
    tick: u64,
    tick_limit: Option<u64>,
}

impl<S: SampleSource> SincResampler<S> {
    /// Create a resampler with the given output/input rate ratio
    pub fn new(source: S, ratio: f64, kernel: Arc<SincKernel>) -> Result<Self> {
        validate_ratio(ratio)?;

        let scale = ratio.min(1.0) * CUTOFF;
        let half_taps = (kernel.zero_crossings() as f64 / scale).ceil() as i64;

        Ok(Self {
            source,
            kernel,
            ratio,
            step: 1.0 / ratio,
            scale,
            half_taps,
            window: VecDeque::with_capacity(2 * half_taps as usize + 1),
            window_start: 0,
            delivered: 0,
            exhausted: false,
            tick: 0,
            tick_limit: None,
        })
    }

    /// Stop after at most `ticks` output samples
    #[must_use]
    pub fn with_tick_limit(mut self, ticks: u64) -> Self {
        self.tick_limit = Some(ticks);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Output samples produced so far
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Pull upstream samples until index `last` is buffered or the source ends
    fn fill_to(&mut self, last: i64) {
        while !self.exhausted && (self.delivered as i64) <= last {
            match self.source.next_sample() {
                Some(sample) => {
                    self.window.push_back(sample);
                    self.delivered += 1;
                }
                None => self.exhausted = true,
            }
        }
    }

    /// Drop buffered samples before index `first`
    fn discard_before(&mut self, first: i64) {
        while self.window_start < first && !self.window.is_empty() {
            self.window.pop_front();
            self.window_start += 1;
        }
    }
}

impl<S: SampleSource> Iterator for SincResampler<S> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.tick_limit.is_some_and(|limit| self.tick >= limit) {
            return None;
        }

        let t = self.tick as f64 * self.step;
        let center = t.floor() as i64;
        let first = center - self.half_taps + 1;
        let last = center + self.half_taps;

        self.fill_to(last);
        if self.exhausted && self.tick >= super::output_len(self.delivered, self.ratio) {
            return None;
        }
        self.discard_before(first);

        // Indices outside the delivered input contribute zero
        let lo = first.max(self.window_start);
        let hi = last.min(self.window_start + self.window.len() as i64 - 1);

        let mut acc = 0.0f64;
        for i in lo..=hi {
            let x = f64::from(self.window[(i - self.window_start) as usize]);
            acc += x * self.kernel.value((t - i as f64) * self.scale);
        }

        self.tick += 1;
        Some((acc * self.scale) as f32)
    }
}
