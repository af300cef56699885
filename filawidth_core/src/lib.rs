#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Real-time filament width estimation and extrusion compensation
//! (hardware-agnostic).
//!
//! All hardware interactions go through the `filawidth_traits` seams:
//! `WidthSensor`, `PositionTracker`, `FlowCommand`, and `RunoutSink`.
//!
//! ## Architecture
//!
//! - **Calibration**: two-point linear raw→diameter model (`calibration`)
//! - **Delay queue**: position-indexed FIFO deferring each measurement until
//!   its filament segment reaches the nozzle (`queue`)
//! - **Runout**: presence detection from diameter bounds (`bounds`)
//! - **Controller**: the periodic tick tying the above together
//!   (`controller`), with typed operator commands (`command`)
//! - **Hosting**: background sampling (`sampler`) and a cooperative host
//!   loop (`runner`) for processes without their own reactor

pub mod bounds;
pub mod calibration;
pub mod command;
pub mod controller;
pub mod error;
pub mod mocks;
pub mod queue;
pub mod runner;
pub mod sampler;
pub mod status;

pub use bounds::Bounds;
pub use calibration::{Calibration, RAW_SCALE};
pub use command::{Ack, Command};
pub use controller::{
    NEUTRAL_FLOW_PERCENT, Reading, TICK_PERIOD, WidthController, flow_percent,
};
pub use error::{BuildError, Result, WidthError};
pub use queue::{DelayQueue, QueueEntry};
pub use status::{Schedule, Status};

use error::Report;
use filawidth_config::SensorCfg;
use filawidth_traits::{FlowCommand, PositionTracker, RunoutSink};
use std::marker::PhantomData;

/// Dynamic (boxed) controller produced by [`WidthBuilder`].
pub type BoxedWidthController =
    WidthController<Box<dyn PositionTracker>, Box<dyn FlowCommand>, Box<dyn RunoutSink>>;

/// Validate a sensor config and derive the immutable calibration and bounds.
fn validate_sensor_cfg(cfg: &SensorCfg) -> Result<(Calibration, Bounds)> {
    let calibration = Calibration::new(cfg.diameter_1, cfg.diameter_2, cfg.raw_1, cfg.raw_2)
        .map_err(Report::new)?;
    if cfg.measurement_interval == 0 {
        return Err(Report::new(BuildError::InvalidConfig(
            "measurement_interval must be > 0",
        )));
    }
    if !cfg.nominal_diameter.is_finite() || cfg.nominal_diameter <= 1.0 {
        return Err(Report::new(BuildError::InvalidConfig(
            "nominal_diameter must be > 1.0",
        )));
    }
    if !cfg.measurement_delay.is_finite() || cfg.measurement_delay <= 0.0 {
        return Err(Report::new(BuildError::InvalidConfig(
            "measurement_delay must be > 0.0",
        )));
    }
    if !cfg.max_difference.is_finite() || cfg.max_difference < 0.0 {
        return Err(Report::new(BuildError::InvalidConfig(
            "max_difference must be >= 0",
        )));
    }
    let runout_max = cfg.runout_max_diameter();
    if !cfg.runout_min_diameter.is_finite()
        || !runout_max.is_finite()
        || cfg.runout_min_diameter > runout_max
    {
        return Err(Report::new(BuildError::InvalidConfig(
            "runout window must be ordered and finite",
        )));
    }
    let bounds = Bounds::new(
        cfg.nominal_diameter,
        cfg.max_difference,
        cfg.runout_min_diameter,
        runout_max,
    );
    Ok((calibration, bounds))
}

/// Build a statically-dispatched controller from concrete collaborators.
pub fn build_controller<P, F, R>(
    position: P,
    flow: F,
    runout: R,
    cfg: &SensorCfg,
) -> Result<WidthController<P, F, R>>
where
    P: PositionTracker + 'static,
    F: FlowCommand + 'static,
    R: RunoutSink + 'static,
{
    let (calibration, bounds) = validate_sensor_cfg(cfg)?;
    Ok(WidthController {
        position,
        flow,
        runout,
        calibration,
        bounds,
        queue: DelayQueue::new(f64::from(cfg.measurement_interval)),
        reading: Reading::default(),
        measurement_delay: cfg.measurement_delay,
        enabled: cfg.enabled,
        logging: cfg.logging,
        use_current_diameter_while_delay: cfg.use_current_diameter_while_delay,
    })
}

// Type-state markers for the builder
pub struct Missing;
pub struct Set;

/// Builder for the boxed controller. Position tracker, flow sink, and sensor
/// config are mandatory (tracked in the type); the runout sink defaults to a
/// no-op for hosts without a runout subsystem.
pub struct WidthBuilder<P, F, C> {
    position: Option<Box<dyn PositionTracker>>,
    flow: Option<Box<dyn FlowCommand>>,
    runout: Option<Box<dyn RunoutSink>>,
    sensor_cfg: Option<SensorCfg>,
    _p: PhantomData<P>,
    _f: PhantomData<F>,
    _c: PhantomData<C>,
}

impl Default for WidthBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            position: None,
            flow: None,
            runout: None,
            sensor_cfg: None,
            _p: PhantomData,
            _f: PhantomData,
            _c: PhantomData,
        }
    }
}

impl WidthBuilder<Missing, Missing, Missing> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P, F, C> WidthBuilder<P, F, C> {
    /// Fallible build available in any type-state; returns a typed
    /// BuildError for missing pieces.
    pub fn try_build(self) -> Result<BoxedWidthController> {
        let WidthBuilder {
            position,
            flow,
            runout,
            sensor_cfg,
            _p: _,
            _f: _,
            _c: _,
        } = self;

        let position = position.ok_or_else(|| Report::new(BuildError::MissingPositionTracker))?;
        let flow = flow.ok_or_else(|| Report::new(BuildError::MissingFlowSink))?;
        let sensor_cfg = sensor_cfg.ok_or_else(|| Report::new(BuildError::MissingConfig))?;
        let runout: Box<dyn RunoutSink> =
            runout.unwrap_or_else(|| Box::new(mocks::NullRunout));

        build_controller(position, flow, runout, &sensor_cfg)
    }

    pub fn with_runout_sink(mut self, runout: impl RunoutSink + 'static) -> Self {
        self.runout = Some(Box::new(runout));
        self
    }
}

impl<F, C> WidthBuilder<Missing, F, C> {
    pub fn with_position_tracker(
        self,
        position: impl PositionTracker + 'static,
    ) -> WidthBuilder<Set, F, C> {
        let WidthBuilder {
            position: _,
            flow,
            runout,
            sensor_cfg,
            _p: _,
            _f: _,
            _c: _,
        } = self;
        WidthBuilder {
            position: Some(Box::new(position)),
            flow,
            runout,
            sensor_cfg,
            _p: PhantomData,
            _f: PhantomData,
            _c: PhantomData,
        }
    }
}

impl<P, C> WidthBuilder<P, Missing, C> {
    pub fn with_flow_sink(self, flow: impl FlowCommand + 'static) -> WidthBuilder<P, Set, C> {
        let WidthBuilder {
            position,
            flow: _,
            runout,
            sensor_cfg,
            _p: _,
            _f: _,
            _c: _,
        } = self;
        WidthBuilder {
            position,
            flow: Some(Box::new(flow)),
            runout,
            sensor_cfg,
            _p: PhantomData,
            _f: PhantomData,
            _c: PhantomData,
        }
    }
}

impl<P, F> WidthBuilder<P, F, Missing> {
    pub fn with_sensor_cfg(self, cfg: SensorCfg) -> WidthBuilder<P, F, Set> {
        let WidthBuilder {
            position,
            flow,
            runout,
            sensor_cfg: _,
            _p: _,
            _f: _,
            _c: _,
        } = self;
        WidthBuilder {
            position,
            flow,
            runout,
            sensor_cfg: Some(cfg),
            _p: PhantomData,
            _f: PhantomData,
            _c: PhantomData,
        }
    }
}

impl WidthBuilder<Set, Set, Set> {
    /// Validate and build. Only available once all mandatory pieces are set.
    pub fn build(self) -> Result<BoxedWidthController> {
        self.try_build()
    }
}
