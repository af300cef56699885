//! Two-point linear calibration from raw sensor samples to diameter.

use crate::error::BuildError;

/// Fixed scale applied to incoming ADC fractions before interpolation.
///
/// The anchor raw values are expressed in this scaled integer domain.
/// Changing this constant would silently shift every calibration, so it is
/// preserved as-is.
pub const RAW_SCALE: f64 = 10_000.0;

/// Linear calibration line through two (raw, diameter) anchors:
/// diameter = diameter_1 + (diameter_2 - diameter_1) / (raw_2 - raw_1) * (raw - raw_1)
#[derive(Debug, Clone)]
pub struct Calibration {
    pub diameter_1: f64,
    pub diameter_2: f64,
    pub raw_1: i32,
    pub raw_2: i32,
}

impl Calibration {
    /// Build a calibration line; equal raw anchors leave the slope undefined
    /// and are rejected as a configuration fault.
    pub fn new(diameter_1: f64, diameter_2: f64, raw_1: i32, raw_2: i32) -> Result<Self, BuildError> {
        if raw_1 == raw_2 {
            return Err(BuildError::InvalidConfig(
                "calibration raw anchors must differ",
            ));
        }
        Ok(Self {
            diameter_1,
            diameter_2,
            raw_1,
            raw_2,
        })
    }

    /// Scale an incoming sample into the calibration's integer raw domain.
    /// Non-finite samples map to 0 (transient noise must not raise errors).
    #[inline]
    pub fn scale_raw(&self, sample: f64) -> i64 {
        // `as` casts of NaN/out-of-range floats saturate; rounding first keeps
        // the value faithful for every realistic sensor output.
        (sample * RAW_SCALE).round() as i64
    }

    /// Interpolate the diameter for a scaled raw value, rounded to 2 decimals.
    /// Out-of-range raws extrapolate linearly by design.
    pub fn diameter_at(&self, raw: i64) -> f64 {
        let slope = (self.diameter_2 - self.diameter_1) / f64::from(self.raw_2 - self.raw_1);
        let d = self.diameter_1 + slope * ((raw - i64::from(self.raw_1)) as f64);
        round2(d)
    }

    /// Convenience: scale and interpolate in one step.
    pub fn sample_to_diameter(&self, sample: f64) -> f64 {
        self.diameter_at(self.scale_raw(sample))
    }
}

impl Default for Calibration {
    fn default() -> Self {
        // Anchors of the reference hall sensor board.
        Self {
            diameter_1: 1.5,
            diameter_2: 2.0,
            raw_1: 6250,
            raw_2: 8750,
        }
    }
}

/// Round to 2 decimal places (diameters are reported in hundredths of a mm).
#[inline]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
