//! Host loop for environments without their own reactor.
//!
//! Owns the cooperative scheduling the core otherwise leaves to an external
//! timer: samples are drained from the background [`Sampler`], operator
//! commands are dispatched between ticks, and the tick timer honors the
//! [`Schedule`] the controller returns.

use crate::command::Command;
use crate::controller::WidthController;
use crate::error::Result;
use crate::sampler::{Sampler, period_for_hz};
use crate::status::Schedule;
use crossbeam_channel::Receiver;
use filawidth_traits::clock::Clock;
use filawidth_traits::{FlowCommand, PositionTracker, RunoutSink, WidthSensor};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Drive the controller until `shutdown` is set or `max_runtime` elapses.
///
/// Sampling keeps running while the controller is disabled; only the tick
/// timer is parked, so an `Enable` command resumes with a live reading.
#[allow(clippy::too_many_arguments)]
pub fn run<S, P, F, R, C>(
    sensor: S,
    controller: &mut WidthController<P, F, R>,
    report_hz: u32,
    sensor_timeout: Duration,
    clock: C,
    commands: Option<Receiver<Command>>,
    shutdown: Arc<AtomicBool>,
    max_runtime: Option<Duration>,
) -> Result<()>
where
    S: WidthSensor + Send + 'static,
    P: PositionTracker,
    F: FlowCommand,
    R: RunoutSink,
    C: Clock + Clone + Send + Sync + 'static,
{
    let sampler = Sampler::spawn(sensor, report_hz, sensor_timeout, clock.clone());
    let start = clock.now();
    let poll = period_for_hz(report_hz).min(Duration::from_millis(100));
    // System ready: request an immediate tick; a disabled controller parks
    // the timer itself by returning Schedule::Never from that first tick.
    let mut next_tick: Option<Instant> = Some(clock.now());
    tracing::info!(
        enabled = controller.is_enabled(),
        report_hz,
        "width compensation host started"
    );

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            break;
        }
        if let Some(max) = max_runtime
            && clock.now().saturating_duration_since(start) >= max
        {
            tracing::info!("max runtime reached");
            break;
        }

        if let Some(sample) = sampler.latest() {
            controller.note_sample(sample);
        }

        if let Some(rx) = &commands {
            while let Ok(cmd) = rx.try_recv() {
                let ack = controller.dispatch(cmd)?;
                tracing::info!(message = %ack.message, "command acknowledged");
                match ack.schedule {
                    Some(Schedule::Now) => next_tick = Some(clock.now()),
                    Some(Schedule::After(d)) => next_tick = Some(clock.now() + d),
                    Some(Schedule::Never) => next_tick = None,
                    None => {}
                }
            }
        }

        if next_tick.is_some_and(|t| clock.now() >= t) {
            match controller.tick()? {
                Schedule::Now => next_tick = Some(clock.now()),
                Schedule::After(d) => next_tick = Some(clock.now() + d),
                Schedule::Never => next_tick = None,
            }
        }

        clock.sleep(poll);
    }
    Ok(())
}
