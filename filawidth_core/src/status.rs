//! Snapshot and scheduling types surfaced by the controller.

use std::time::Duration;

/// Non-blocking snapshot of the latest sensor state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Status {
    /// Last calibrated diameter (mm, 2 decimals).
    pub diameter: f64,
    /// Last raw sample in the scaled integer domain.
    pub raw: i64,
    /// Whether the compensation loop is running.
    pub enabled: bool,
}

/// Scheduling request returned to the external timer after a tick or command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Fire the tick immediately.
    Now,
    /// Fire the next tick after this delay.
    After(Duration),
    /// Do not tick again until explicitly re-enabled.
    Never,
}
