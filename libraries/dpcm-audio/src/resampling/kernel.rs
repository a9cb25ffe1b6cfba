//! Windowed-sinc kernel table
//!
//! One side of a Blackman-windowed sinc, sampled `oversampling` times per
//! zero crossing. The table is immutable once built and is meant to be
//! shared (`Arc`) between any number of concurrent conversions.

use super::{ResamplingError, Result};
use std::f64::consts::PI;

/// Precomputed half of a windowed sinc
#[derive(Debug, Clone)]
pub struct SincKernel {
    zero_crossings: usize,
    oversampling: usize,
    /// `zero_crossings * oversampling + 1` points from x = 0 to x = zero_crossings
    table: Vec<f64>,
}

impl SincKernel {
    /// Zero crossings on each side of the kernel centre
    pub const DEFAULT_ZERO_CROSSINGS: usize = 32;

    /// Table points per zero crossing
    pub const DEFAULT_OVERSAMPLING: usize = 512;

    /// Build a kernel table
    ///
    /// # Arguments
    /// * `zero_crossings` - Half-width of the kernel in zero crossings
    /// * `oversampling` - Table resolution per zero crossing
    pub fn new(zero_crossings: usize, oversampling: usize) -> Result<Self> {
        if zero_crossings == 0 || oversampling == 0 {
            return Err(ResamplingError::InvalidKernel(format!(
                "{} zero crossings x {} oversampling",
                zero_crossings, oversampling
            )));
        }

        Ok(Self {
            zero_crossings,
            oversampling,
            table: build_table(zero_crossings, oversampling),
        })
    }

    pub fn zero_crossings(&self) -> usize {
        self.zero_crossings
    }

    pub fn oversampling(&self) -> usize {
        self.oversampling
    }

    /// Kernel value at `x`, measured in zero crossings from the centre
    ///
    /// Linearly interpolates between table points; zero outside the window.
    #[inline]
    pub fn value(&self, x: f64) -> f64 {
        let pos = x.abs() * self.oversampling as f64;
        let idx = pos as usize;
        if idx + 1 >= self.table.len() {
            return 0.0;
        }

        let frac = pos - idx as f64;
        let a = self.table[idx];
        let b = self.table[idx + 1];
        a + (b - a) * frac
    }
}

impl Default for SincKernel {
    fn default() -> Self {
        Self {
            zero_crossings: Self::DEFAULT_ZERO_CROSSINGS,
            oversampling: Self::DEFAULT_OVERSAMPLING,
            table: build_table(Self::DEFAULT_ZERO_CROSSINGS, Self::DEFAULT_OVERSAMPLING),
        }
    }
}

fn build_table(zero_crossings: usize, oversampling: usize) -> Vec<f64> {
    let len = zero_crossings * oversampling;
    (0..=len)
        .map(|k| {
            let x = k as f64 / oversampling as f64;
            sinc(x) * blackman(k as f64 / len as f64)
        })
        .collect()
}

/// Normalised sinc, sin(pi x) / (pi x)
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

/// Blackman window centred at 0, reaching zero at |t| = 1
fn blackman(t: f64) -> f64 {
    0.42 + 0.5 * (PI * t).cos() + 0.08 * (2.0 * PI * t).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_shape() {
        let kernel = SincKernel::default();
        assert_eq!(kernel.zero_crossings(), 32);
        assert_eq!(kernel.oversampling(), 512);

        assert!((kernel.value(0.0) - 1.0).abs() < 1e-12);
        // Zero crossings of the sinc survive windowing
        for n in 1..32 {
            assert!(kernel.value(n as f64).abs() < 1e-9, "x = {}", n);
        }
        assert_eq!(kernel.value(32.0), 0.0);
        assert_eq!(kernel.value(100.0), 0.0);
    }

    #[test]
    fn test_kernel_is_symmetric() {
        let kernel = SincKernel::default();
        for x in [0.1, 0.5, 1.25, 7.3, 31.9] {
            assert_eq!(kernel.value(x), kernel.value(-x));
        }
    }

    #[test]
    fn test_unit_dc_gain() {
        // Sum over integer offsets of a band-limited kernel is ~1
        let kernel = SincKernel::default();
        for phase in [0.0, 0.25, 0.5, 0.8] {
            let sum: f64 = (-40..=40).map(|i| kernel.value(i as f64 + phase)).sum();
            assert!((sum - 1.0).abs() < 1e-2, "phase {}: {}", phase, sum);
        }
    }

    #[test]
    fn test_custom_kernel() {
        let kernel = SincKernel::new(8, 64).unwrap();
        assert_eq!(kernel.zero_crossings(), 8);
        assert_eq!(kernel.value(8.5), 0.0);
        assert!(SincKernel::new(0, 64).is_err());
        assert!(SincKernel::new(8, 0).is_err());
    }
}
