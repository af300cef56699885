//! Typed operator commands and their dispatcher.
//!
//! The original string-keyed console commands are expressed as a closed set
//! of variants handled in one place; the user-visible acknowledgments are
//! preserved verbatim.

use crate::controller::{NEUTRAL_FLOW_PERCENT, WidthController};
use crate::error::Result;
use crate::status::Schedule;
use filawidth_traits::{FlowCommand, PositionTracker, RunoutSink};

/// Operator commands accepted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Report the current diameter, or that filament is not present.
    QueryDiameter,
    /// Clear queued measurements and return to neutral flow.
    Reset,
    /// Start the compensation loop.
    Enable,
    /// Stop the loop, clear queued measurements, return to neutral flow.
    Disable,
    /// Report the last raw sample.
    QueryRaw,
    /// Report each queued diameter from now on.
    LogOn,
    /// Stop reporting queued diameters.
    LogOff,
}

/// Acknowledgment for a dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    /// Short informational text for the operator console.
    pub message: String,
    /// Scheduling request for the tick timer, when the command changes it.
    pub schedule: Option<Schedule>,
}

impl Ack {
    fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            schedule: None,
        }
    }

    fn scheduling(message: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            message: message.into(),
            schedule: Some(schedule),
        }
    }
}

impl<P: PositionTracker, F: FlowCommand, R: RunoutSink> WidthController<P, F, R> {
    /// Handle one operator command synchronously.
    ///
    /// Commands execute atomically relative to ticks; the external dispatcher
    /// serializes them with scheduled callbacks.
    pub fn dispatch(&mut self, cmd: Command) -> Result<Ack> {
        match cmd {
            Command::QueryDiameter => {
                let d = self.reading.diameter;
                Ok(Ack::info(if self.bounds.filament_present(d) {
                    format!("Filament diameter: {d:.2}")
                } else {
                    "Filament NOT present".to_string()
                }))
            }
            Command::Reset => {
                self.queue.clear();
                self.emit_flow(NEUTRAL_FLOW_PERCENT)?;
                Ok(Ack::info("Filament diameter measurements cleared!"))
            }
            Command::Enable => {
                if self.enabled {
                    Ok(Ack::info("Filament diameter sensor is already ON"))
                } else {
                    self.enabled = true;
                    tracing::info!("width compensation enabled");
                    Ok(Ack::scheduling(
                        "Filament diameter sensor turned ON",
                        Schedule::Now,
                    ))
                }
            }
            Command::Disable => {
                if !self.enabled {
                    Ok(Ack::info("Filament diameter sensor is already OFF"))
                } else {
                    self.enabled = false;
                    self.queue.clear();
                    self.emit_flow(NEUTRAL_FLOW_PERCENT)?;
                    tracing::info!("width compensation disabled");
                    Ok(Ack::scheduling(
                        "Filament diameter sensor turned OFF",
                        Schedule::Never,
                    ))
                }
            }
            Command::QueryRaw => Ok(Ack::info(format!("RAW={}", self.reading.raw))),
            Command::LogOn => {
                self.logging = true;
                Ok(Ack::info("Filament diameter logging turned ON"))
            }
            Command::LogOff => {
                self.logging = false;
                Ok(Ack::info("Filament diameter logging turned OFF"))
            }
        }
    }
}
