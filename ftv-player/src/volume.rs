//! Display volume
//!
//! The front-end shows volume on a 0.0-10.0 scale with one decimal; the
//! widget takes 0-100.

use serde::{Deserialize, Serialize};

/// Volume on the display scale
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Volume(f64);

impl Volume {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 10.0;

    /// Round to one decimal and clamp to [0, 10]
    ///
    /// Non-finite input maps to the minimum.
    pub fn new(display: f64) -> Self {
        if !display.is_finite() {
            return Self(Self::MIN);
        }
        let rounded = (display * 10.0).round() / 10.0;
        Self(rounded.clamp(Self::MIN, Self::MAX))
    }

    /// Apply a signed step
    ///
    /// ```
    /// use ftv_player::volume::Volume;
    ///
    /// assert_eq!(Volume::new(9.5).adjusted(1.0).display(), 10.0);
    /// assert_eq!(Volume::new(5.0).adjusted(-0.5).percent(), 45);
    /// ```
    pub fn adjusted(self, delta: f64) -> Self {
        if !delta.is_finite() {
            return self;
        }
        Self::new(self.0 + delta)
    }

    pub fn display(self) -> f64 {
        self.0
    }

    /// Widget volume (display × 10)
    pub fn percent(self) -> u8 {
        (self.0 * 10.0).round() as u8
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self(5.0)
    }
}

impl std::fmt::Display for Volume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_sum_matches_display() {
        let starts = [0.0, 0.1, 2.5, 5.0, 9.9, 10.0];
        let deltas = [-20.0, -1.0, -0.5, -0.1, 0.0, 0.1, 0.5, 1.0, 20.0];

        for &start in &starts {
            for &delta in &deltas {
                let volume = Volume::new(start).adjusted(delta);
                let expected = ((start + delta) * 10.0).round() / 10.0;
                let expected = expected.clamp(0.0, 10.0);
                assert!(
                    (volume.display() - expected).abs() < 1e-9,
                    "start {} delta {}: got {}",
                    start,
                    delta,
                    volume.display()
                );
                assert_eq!(volume.percent() as f64, (volume.display() * 10.0).round());
            }
        }
    }

    #[test]
    fn test_float_drift_is_rounded_away() {
        // 0.1 + 0.2 is not 0.3 in binary floating point
        let volume = Volume::new(0.1).adjusted(0.2);
        assert_eq!(volume.display(), 0.3);
        assert_eq!(volume.percent(), 3);
        assert_eq!(volume.to_string(), "0.3");
    }

    #[test]
    fn test_bounds() {
        assert_eq!(Volume::new(10.0).percent(), 100);
        assert_eq!(Volume::new(0.0).percent(), 0);
        assert_eq!(Volume::new(-3.0).display(), 0.0);
        assert_eq!(Volume::new(42.0).display(), 10.0);
    }

    #[test]
    fn test_non_finite_input() {
        assert_eq!(Volume::new(f64::NAN).display(), 0.0);
        assert_eq!(Volume::new(6.0).adjusted(f64::INFINITY).display(), 6.0);
    }

    #[test]
    fn test_default_is_half() {
        assert_eq!(Volume::default().percent(), 50);
    }
}
