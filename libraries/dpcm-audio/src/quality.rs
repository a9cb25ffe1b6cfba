//! Quality model: selector index to hardware playback rate
//!
//! The delta-modulation channel only plays back at sixteen rates, each a
//! fixed divisor of the console's CPU clock. A quality index picks one of
//! them; higher indices mean shorter periods and therefore higher rates.

use crate::error::{DpcmError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of selectable quality levels
pub const QUALITY_RANGE: u8 = 16;

/// NTSC CPU clock in Hz
pub const MASTER_CLOCK_NTSC: u32 = 1_789_773;

/// PAL CPU clock in Hz
pub const MASTER_CLOCK_PAL: u32 = 1_662_607;

/// Channel periods in CPU cycles per output bit, NTSC
pub const DMC_PERIODS_NTSC: [u16; QUALITY_RANGE as usize] = [
    428, 380, 340, 320, 286, 254, 226, 214, 190, 160, 142, 128, 106, 84, 72, 54,
];

/// Channel periods in CPU cycles per output bit, PAL
pub const DMC_PERIODS_PAL: [u16; QUALITY_RANGE as usize] = [
    398, 354, 316, 298, 276, 236, 210, 198, 176, 148, 132, 118, 98, 78, 66, 50,
];

/// Console timing region the sample is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Ntsc,
    Pal,
}

impl Region {
    pub fn master_clock(self) -> u32 {
        match self {
            Region::Ntsc => MASTER_CLOCK_NTSC,
            Region::Pal => MASTER_CLOCK_PAL,
        }
    }

    pub fn periods(self) -> &'static [u16; QUALITY_RANGE as usize] {
        match self {
            Region::Ntsc => &DMC_PERIODS_NTSC,
            Region::Pal => &DMC_PERIODS_PAL,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Region::Ntsc => "NTSC",
            Region::Pal => "PAL",
        }
    }
}

/// Quality selector, 0 (lowest rate) to 15 (highest rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(QUALITY_RANGE - 1);

    /// Create a quality selector, rejecting indices above 15
    pub fn new(index: u8) -> Result<Self> {
        if index < QUALITY_RANGE {
            Ok(Self(index))
        } else {
            Err(DpcmError::InvalidParameter(format!(
                "quality {} out of range (0-{})",
                index,
                QUALITY_RANGE - 1
            )))
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// All selectable levels, lowest first
    pub fn all() -> impl Iterator<Item = Quality> {
        (0..QUALITY_RANGE).map(Quality)
    }

    /// Channel period in CPU cycles for this level
    pub fn period(self, region: Region) -> u16 {
        region.periods()[usize::from(self.0)]
    }

    /// Playback rate in Hz for this level
    pub fn target_rate_hz(self, region: Region) -> f32 {
        region.master_clock() as f32 / f32::from(self.period(region))
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::MAX
    }
}

impl TryFrom<u8> for Quality {
    type Error = DpcmError;

    fn try_from(index: u8) -> Result<Self> {
        Self::new(index)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Resampling ratio (target / source) for a conversion
pub fn resample_ratio(target_rate_hz: f32, source_rate_hz: u32) -> f32 {
    target_rate_hz / source_rate_hz as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_bounds() {
        assert!(Quality::new(0).is_ok());
        assert!(Quality::new(15).is_ok());
        assert!(matches!(
            Quality::new(16),
            Err(DpcmError::InvalidParameter(_))
        ));
        assert_eq!(Quality::default(), Quality::MAX);
        assert_eq!(Quality::all().count(), 16);
    }

    #[test]
    fn test_known_rates() {
        let top = Quality::MAX.target_rate_hz(Region::Ntsc);
        assert!((top - 33_143.9).abs() < 0.1, "got {}", top);

        let bottom = Quality::MIN.target_rate_hz(Region::Ntsc);
        assert!((bottom - 4_181.7).abs() < 0.1, "got {}", bottom);

        let pal_top = Quality::MAX.target_rate_hz(Region::Pal);
        assert!((pal_top - 33_252.1).abs() < 0.1, "got {}", pal_top);
    }

    #[test]
    fn test_rates_never_decrease() {
        for region in [Region::Ntsc, Region::Pal] {
            let rates: Vec<f32> = Quality::all().map(|q| q.target_rate_hz(region)).collect();
            for pair in rates.windows(2) {
                assert!(pair[1] >= pair[0], "{:?}: {:?}", region, rates);
            }
        }
    }

    #[test]
    fn test_resample_ratio() {
        let ratio = resample_ratio(Quality::MAX.target_rate_hz(Region::Ntsc), 44100);
        assert!((ratio - 0.7516).abs() < 0.001);
        assert!(resample_ratio(33_000.0, 22050) > 1.0);
    }
}
