//! The periodic extrusion-multiplier controller.

use crate::bounds::Bounds;
use crate::calibration::Calibration;
use crate::error::{Report, Result, WidthError};
use crate::queue::DelayQueue;
use crate::status::{Schedule, Status};
use eyre::WrapErr;
use filawidth_traits::{FlowCommand, PositionTracker, RunoutSink};
use std::time::Duration;

/// Spacing between ticks while the loop is running.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Flow override emitted while no valid diameter is available.
pub const NEUTRAL_FLOW_PERCENT: u32 = 100;

/// Latest calibrated sensor state; overwritten by every incoming sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reading {
    pub raw: i64,
    pub diameter: f64,
}

/// Closed-loop width compensator tying together calibration, the delay
/// queue and runout detection.
///
/// The controller owns all mutable state and is driven from one logical
/// execution context: the host feeds sensor samples through
/// [`note_sample`](Self::note_sample), calls [`tick`](Self::tick) per the
/// returned [`Schedule`], and routes operator commands through
/// [`dispatch`](Self::dispatch).
pub struct WidthController<P: PositionTracker, F: FlowCommand, R: RunoutSink> {
    pub(crate) position: P,
    pub(crate) flow: F,
    pub(crate) runout: R,
    pub(crate) calibration: Calibration,
    pub(crate) bounds: Bounds,
    pub(crate) queue: DelayQueue,
    pub(crate) reading: Reading,
    /// Transport distance sensor -> nozzle, in extruder mm.
    pub(crate) measurement_delay: f64,
    pub(crate) enabled: bool,
    pub(crate) logging: bool,
    pub(crate) use_current_diameter_while_delay: bool,
}

impl<P: PositionTracker, F: FlowCommand, R: RunoutSink> core::fmt::Debug
    for WidthController<P, F, R>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WidthController")
            .field("diameter", &self.reading.diameter)
            .field("raw", &self.reading.raw)
            .field("enabled", &self.enabled)
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl<P: PositionTracker, F: FlowCommand, R: RunoutSink> WidthController<P, F, R> {
    /// Sensor callback: convert a raw sample into the calibrated reading.
    ///
    /// Runs regardless of `enabled`, so re-enabling resumes with a live value.
    pub fn note_sample(&mut self, sample: f64) {
        let raw = self.calibration.scale_raw(sample);
        self.reading = Reading {
            raw,
            diameter: self.calibration.diameter_at(raw),
        };
    }

    /// One controller tick.
    ///
    /// Samples the extruder position, updates the delay queue, notifies the
    /// runout sink, resolves the diameter to use via the queue/fallback
    /// policy, and emits the flow override. Returns the scheduling request
    /// for the next tick.
    pub fn tick(&mut self) -> Result<Schedule> {
        let epos = self
            .position
            .extruder_position()
            .map_err(|e| Report::new(map_hw_error(&*e)))
            .wrap_err("reading extruder position")?;
        // Take the shared reading once, at the start of the tick.
        let diameter = self.reading.diameter;

        let projected = epos + self.measurement_delay;
        if self.queue.maybe_push(projected, diameter) {
            tracing::trace!(
                epos,
                projected,
                diameter,
                queued = self.queue.len(),
                "measurement queued"
            );
            if self.logging {
                tracing::info!("Filament diameter: {diameter:.2}");
            }
        }

        let present = self.bounds.filament_present(diameter);
        self.runout.note_filament_present(present);

        if present {
            let mut diameter_to_use = if let Some(entry) = self
                .queue
                .pop_front_if(|head| epos >= head.projected_position)
            {
                // The segment measured back then has reached the nozzle.
                entry.diameter
            } else if self.use_current_diameter_while_delay {
                diameter
            } else {
                self.bounds.nominal_diameter
            };
            if !self.bounds.plausible(diameter_to_use) {
                // Implausible values must not drive flow compensation.
                diameter_to_use = self.bounds.nominal_diameter;
            }
            self.emit_flow(flow_percent(self.bounds.nominal_diameter, diameter_to_use))?;
        } else {
            // No valid flow data while filament is absent; stale queue state
            // would resurface diameters for filament that is no longer there.
            self.emit_flow(NEUTRAL_FLOW_PERCENT)?;
            self.queue.clear();
        }

        Ok(self.next_schedule())
    }

    /// Snapshot of the latest values; callable at any time.
    pub fn status(&self) -> Status {
        Status {
            diameter: self.reading.diameter,
            raw: self.reading.raw,
            enabled: self.enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of measurements currently deferred in the delay queue.
    pub fn queued_measurements(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn next_schedule(&self) -> Schedule {
        if self.enabled {
            Schedule::After(TICK_PERIOD)
        } else {
            Schedule::Never
        }
    }

    pub(crate) fn emit_flow(&mut self, percent: u32) -> Result<()> {
        tracing::debug!(percent, "flow override");
        self.flow
            .set_flow_percent(percent)
            .map_err(|e| Report::new(map_hw_error(&*e)))
            .wrap_err("set_flow_percent")
    }
}

/// Extrusion multiplier percent for a round cross-section:
/// `round((nominal / diameter)^2 * 100)` (area ratio).
///
/// The caller guarantees plausibility, but a degenerate window can still
/// admit values near zero; non-finite results fall back to neutral and the
/// percent is clamped to a sane command range.
pub fn flow_percent(nominal_diameter: f64, diameter: f64) -> u32 {
    let ratio = nominal_diameter / diameter;
    let pct = (ratio * ratio * 100.0).round();
    if !pct.is_finite() {
        return NEUTRAL_FLOW_PERCENT;
    }
    pct.clamp(1.0, 1_000_000.0) as u32
}

/// Map a boxed collaborator error to a typed WidthError.
pub(crate) fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> WidthError {
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        WidthError::Timeout
    } else {
        WidthError::Hardware(s)
    }
}
