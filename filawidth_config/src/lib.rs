#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and startup validation for the filament width compensator.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - All faults found by `validate()` are fatal: the sensor must not be
//!   initialized from a config that fails here.

use serde::Deserialize;

/// `[sensor]` table: calibration anchors, bounds and controller flags.
#[derive(Debug, Deserialize, Clone)]
pub struct SensorCfg {
    /// Opaque analog pin identifier; routed to the host's ADC setup.
    pub pin: String,
    /// Calibration anchor diameters (mm).
    #[serde(default = "default_diameter_1")]
    pub diameter_1: f64,
    #[serde(default = "default_diameter_2")]
    pub diameter_2: f64,
    /// Calibration anchor raw values (scaled sensor counts).
    #[serde(default = "default_raw_1")]
    pub raw_1: i32,
    #[serde(default = "default_raw_2")]
    pub raw_2: i32,
    /// Minimum extruder travel (mm) between queued measurements.
    #[serde(default = "default_measurement_interval")]
    pub measurement_interval: u32,
    /// Nominal filament diameter (mm); must be > 1.0.
    pub nominal_diameter: f64,
    /// Transport distance between sensor and hot end, in extruder mm; must be > 0.
    pub measurement_delay: f64,
    /// Half-width of the plausible diameter window around nominal (mm).
    #[serde(default = "default_max_difference")]
    pub max_difference: f64,
    /// Start with compensation active.
    #[serde(default)]
    pub enabled: bool,
    /// Presence window; diameters outside it are treated as runout.
    #[serde(default = "default_runout_min_diameter")]
    pub runout_min_diameter: f64,
    /// Defaults to `nominal_diameter + max_difference` when absent.
    #[serde(default)]
    pub runout_max_diameter: Option<f64>,
    /// Report each queued diameter through the command responder.
    #[serde(default)]
    pub logging: bool,
    /// While the first delayed measurement is still in transit, use the live
    /// reading instead of the nominal diameter.
    #[serde(default)]
    pub use_current_diameter_while_delay: bool,
}

/// `[sampling]` table: ADC report pacing for the background sampler.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SamplingCfg {
    /// Sensor report rate in Hz (original ADC report time: 0.5 s).
    pub report_hz: u32,
    /// Max time to wait for one sensor read before failing (ms).
    pub sensor_timeout_ms: u64,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            report_hz: 2,
            sensor_timeout_ms: 150,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub sensor: SensorCfg,
    #[serde(default)]
    pub sampling: SamplingCfg,
}

fn default_diameter_1() -> f64 {
    1.5
}
fn default_diameter_2() -> f64 {
    2.0
}
fn default_raw_1() -> i32 {
    6250
}
fn default_raw_2() -> i32 {
    8750
}
fn default_measurement_interval() -> u32 {
    10
}
fn default_max_difference() -> f64 {
    0.2
}
fn default_runout_min_diameter() -> f64 {
    1.0
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    /// Validate the parsed config; every fault here is fatal at startup.
    pub fn validate(&self) -> eyre::Result<()> {
        let s = &self.sensor;
        if s.pin.trim().is_empty() {
            eyre::bail!("pin must not be empty");
        }
        for (name, v) in [
            ("diameter_1", s.diameter_1),
            ("diameter_2", s.diameter_2),
            ("nominal_diameter", s.nominal_diameter),
            ("measurement_delay", s.measurement_delay),
            ("max_difference", s.max_difference),
            ("runout_min_diameter", s.runout_min_diameter),
        ] {
            if !v.is_finite() {
                eyre::bail!("{name} must be finite");
            }
        }
        if s.raw_1 == s.raw_2 {
            eyre::bail!("raw_1 and raw_2 must differ (calibration line is undefined)");
        }
        if s.measurement_interval == 0 {
            eyre::bail!("measurement_interval must be > 0");
        }
        if s.nominal_diameter <= 1.0 {
            eyre::bail!("nominal_diameter must be > 1.0");
        }
        if s.measurement_delay <= 0.0 {
            eyre::bail!("measurement_delay must be > 0.0");
        }
        if s.max_difference < 0.0 {
            eyre::bail!("max_difference must be >= 0");
        }
        let runout_max = self.runout_max_diameter();
        if !runout_max.is_finite() {
            eyre::bail!("runout_max_diameter must be finite");
        }
        if s.runout_min_diameter > runout_max {
            eyre::bail!("runout_min_diameter must be <= runout_max_diameter");
        }
        if self.sampling.report_hz == 0 {
            eyre::bail!("report_hz must be > 0");
        }
        if self.sampling.sensor_timeout_ms == 0 {
            eyre::bail!("sensor_timeout_ms must be >= 1");
        }
        Ok(())
    }

    /// Effective runout ceiling: explicit value or `nominal + max_difference`.
    pub fn runout_max_diameter(&self) -> f64 {
        self.sensor.runout_max_diameter()
    }
}

impl SensorCfg {
    /// Effective runout ceiling: explicit value or `nominal + max_difference`.
    pub fn runout_max_diameter(&self) -> f64 {
        self.runout_max_diameter
            .unwrap_or(self.nominal_diameter + self.max_difference)
    }
}
