//! Simulated collaborators for running the loop without printer hardware.

use filawidth_traits::{FlowCommand, HwResult, PositionTracker, RunoutSink, WidthSensor};
use std::time::{Duration, Instant};

/// Analog sensor emitting a slow sinusoidal drift around a center fraction,
/// with an optional scripted runout window.
pub struct SimulatedSensor {
    start: Instant,
    center: f64,
    swing: f64,
    period_s: f64,
    runout: Option<(f64, f64)>,
}

impl SimulatedSensor {
    /// `center` is the ADC fraction at nominal diameter (0.75 -> 1.75 mm with
    /// the reference calibration).
    pub fn new(center: f64, runout: Option<(f64, f64)>) -> Self {
        Self {
            start: Instant::now(),
            center,
            swing: 0.02,
            period_s: 20.0,
            runout,
        }
    }
}

impl WidthSensor for SimulatedSensor {
    fn read(&mut self, _timeout: Duration) -> HwResult<f64> {
        let t = self.start.elapsed().as_secs_f64();
        if let Some((at, dur)) = self.runout
            && t >= at
            && t < at + dur
        {
            // Sensor sees air: raw collapses to near zero.
            return Ok(0.01);
        }
        let phase = std::f64::consts::TAU * t / self.period_s;
        Ok(self.center + self.swing * phase.sin())
    }
}

/// Extruder position advancing at a constant feed rate.
pub struct SimulatedExtruder {
    start: Instant,
    feed_mm_s: f64,
}

impl SimulatedExtruder {
    pub fn new(feed_mm_s: f64) -> Self {
        Self {
            start: Instant::now(),
            feed_mm_s,
        }
    }
}

impl PositionTracker for SimulatedExtruder {
    fn extruder_position(&mut self) -> HwResult<f64> {
        Ok(self.start.elapsed().as_secs_f64() * self.feed_mm_s)
    }
}

/// Prints each emitted flow override the way a G-code console would see it.
pub struct ConsoleFlow;

impl FlowCommand for ConsoleFlow {
    fn set_flow_percent(&mut self, percent: u32) -> HwResult<()> {
        println!("M221 S{percent}");
        Ok(())
    }
}

/// Logs presence transitions instead of forwarding to a runout subsystem.
#[derive(Default)]
pub struct ConsoleRunout {
    last: Option<bool>,
}

impl RunoutSink for ConsoleRunout {
    fn note_filament_present(&mut self, present: bool) {
        if self.last != Some(present) {
            if present {
                tracing::info!("filament present");
            } else {
                tracing::warn!("filament NOT present");
            }
            self.last = Some(present);
        }
    }
}
