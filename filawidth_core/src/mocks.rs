//! Test and helper mocks for filawidth_core.

use filawidth_traits::{HwResult, RunoutSink, WidthSensor};

/// A sensor that always errors on read; useful when driving the controller
/// with externally sampled values via `note_sample`.
pub struct NoopSensor;

impl WidthSensor for NoopSensor {
    fn read(&mut self, _timeout: std::time::Duration) -> HwResult<f64> {
        Err(Box::new(std::io::Error::other("noop sensor")))
    }
}

/// Presence sink that discards notifications; the builder default for hosts
/// without a runout subsystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRunout;

impl RunoutSink for NullRunout {
    fn note_filament_present(&mut self, _present: bool) {}
}
