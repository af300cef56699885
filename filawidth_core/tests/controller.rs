use std::sync::{Arc, Mutex};

use filawidth_config::SensorCfg;
use filawidth_core::{Schedule, TICK_PERIOD, build_controller};
use filawidth_traits::{FlowCommand, HwResult, PositionTracker, RunoutSink};

/// Position source that returns a fixed sequence, then repeats the last value.
struct SeqPosition {
    seq: Vec<f64>,
    idx: usize,
}

impl SeqPosition {
    fn new(seq: impl Into<Vec<f64>>) -> Self {
        Self {
            seq: seq.into(),
            idx: 0,
        }
    }
}

impl PositionTracker for SeqPosition {
    fn extruder_position(&mut self) -> HwResult<f64> {
        let v = if self.idx < self.seq.len() {
            let x = self.seq[self.idx];
            self.idx += 1;
            x
        } else {
            self.seq.last().copied().unwrap_or(0.0)
        };
        Ok(v)
    }
}

/// Flow sink spy recording every emitted percent.
#[derive(Clone, Default)]
struct SpyFlow(Arc<Mutex<Vec<u32>>>);

impl SpyFlow {
    fn emitted(&self) -> Vec<u32> {
        self.0.lock().expect("flow spy lock").clone()
    }
}

impl FlowCommand for SpyFlow {
    fn set_flow_percent(&mut self, percent: u32) -> HwResult<()> {
        self.0.lock().expect("flow spy lock").push(percent);
        Ok(())
    }
}

/// Runout sink spy recording every presence notification.
#[derive(Clone, Default)]
struct SpyRunout(Arc<Mutex<Vec<bool>>>);

impl SpyRunout {
    fn noted(&self) -> Vec<bool> {
        self.0.lock().expect("runout spy lock").clone()
    }
}

impl RunoutSink for SpyRunout {
    fn note_filament_present(&mut self, present: bool) {
        self.0.lock().expect("runout spy lock").push(present);
    }
}

fn sensor_cfg() -> SensorCfg {
    SensorCfg {
        pin: "PA3".to_string(),
        diameter_1: 1.5,
        diameter_2: 2.0,
        raw_1: 6250,
        raw_2: 8750,
        measurement_interval: 10,
        nominal_diameter: 1.75,
        measurement_delay: 70.0,
        max_difference: 0.2,
        enabled: true,
        runout_min_diameter: 1.0,
        runout_max_diameter: None,
        logging: false,
        use_current_diameter_while_delay: false,
    }
}

#[test]
fn queue_empty_without_live_flag_falls_back_to_nominal() {
    // First tick: the measurement just queued is still 70 mm from the nozzle.
    let flow = SpyFlow::default();
    let mut ctl = build_controller(
        SeqPosition::new([100.0]),
        flow.clone(),
        SpyRunout::default(),
        &sensor_cfg(),
    )
    .expect("build controller");

    ctl.note_sample(0.70); // raw 7000 -> 1.65 mm
    let schedule = ctl.tick().expect("tick");

    assert_eq!(schedule, Schedule::After(TICK_PERIOD));
    assert_eq!(flow.emitted(), vec![100]);
    assert_eq!(ctl.queued_measurements(), 1);
}

#[test]
fn live_reading_used_while_delay_when_configured() {
    let mut cfg = sensor_cfg();
    cfg.use_current_diameter_while_delay = true;
    let flow = SpyFlow::default();
    let mut ctl = build_controller(
        SeqPosition::new([100.0]),
        flow.clone(),
        SpyRunout::default(),
        &cfg,
    )
    .expect("build controller");

    ctl.note_sample(0.70); // 1.65 mm
    ctl.tick().expect("tick");

    // (1.75 / 1.65)^2 * 100 = 112.49 -> 112
    assert_eq!(flow.emitted(), vec![112]);
}

#[test]
fn delayed_measurement_applies_once_position_reached() {
    let flow = SpyFlow::default();
    let mut ctl = build_controller(
        SeqPosition::new([100.0, 170.0]),
        flow.clone(),
        SpyRunout::default(),
        &sensor_cfg(),
    )
    .expect("build controller");

    // Tick 1 at epos 100 queues (projected 170, diameter 1.65); head not
    // reached, so the nominal fallback is emitted.
    ctl.note_sample(0.70);
    ctl.tick().expect("tick 1");

    // Tick 2 at epos 170: the segment measured 70 mm ago is at the nozzle.
    // The live reading changed meanwhile; the queued 1.65 must win.
    ctl.note_sample(0.75); // 1.75 mm
    ctl.tick().expect("tick 2");

    assert_eq!(flow.emitted(), vec![100, 112]);
}

#[test]
fn thin_filament_scenario_emits_136() {
    // Widen the plausible window so a 1.50 mm reading may drive the flow.
    let mut cfg = sensor_cfg();
    cfg.max_difference = 0.3;
    cfg.use_current_diameter_while_delay = true;
    let flow = SpyFlow::default();
    let mut ctl = build_controller(
        SeqPosition::new([100.0]),
        flow.clone(),
        SpyRunout::default(),
        &cfg,
    )
    .expect("build controller");

    ctl.note_sample(0.625); // raw 6250 -> 1.50 mm
    ctl.tick().expect("tick");

    // (1.75 / 1.50)^2 * 100 = 136.1 -> 136
    assert_eq!(flow.emitted(), vec![136]);
}

#[test]
fn implausible_dequeued_diameter_falls_back_to_nominal() {
    // 1.50 mm is present (>= 1.0) but outside [1.55, 1.95].
    let flow = SpyFlow::default();
    let mut ctl = build_controller(
        SeqPosition::new([100.0, 170.0]),
        flow.clone(),
        SpyRunout::default(),
        &sensor_cfg(),
    )
    .expect("build controller");

    ctl.note_sample(0.625); // 1.50 mm
    ctl.tick().expect("tick 1");
    ctl.tick().expect("tick 2"); // pops the 1.50 entry

    // Both ticks must emit the neutral multiplier for nominal diameter.
    assert_eq!(flow.emitted(), vec![100, 100]);
}

#[test]
fn absence_clears_queue_and_emits_neutral() {
    let flow = SpyFlow::default();
    let runout = SpyRunout::default();
    let mut ctl = build_controller(
        SeqPosition::new([100.0, 105.0]),
        flow.clone(),
        runout.clone(),
        &sensor_cfg(),
    )
    .expect("build controller");

    ctl.note_sample(0.70);
    ctl.tick().expect("tick 1");
    assert_eq!(ctl.queued_measurements(), 1);

    // Diameter collapses below the runout floor: filament gone.
    ctl.note_sample(0.05); // raw 500 -> 0.35 mm
    ctl.tick().expect("tick 2");

    assert_eq!(runout.noted(), vec![true, false]);
    assert_eq!(flow.emitted(), vec![100, 100]);
    assert_eq!(ctl.queued_measurements(), 0);
}

#[test]
fn rate_limiting_spaces_queued_measurements() {
    // 5 mm advance per tick with a 10 mm interval: every other attempt queues.
    let positions: Vec<f64> = (0..8).map(|i| 100.0 + 5.0 * f64::from(i)).collect();
    let mut ctl = build_controller(
        SeqPosition::new(positions),
        SpyFlow::default(),
        SpyRunout::default(),
        &sensor_cfg(),
    )
    .expect("build controller");

    ctl.note_sample(0.75);
    for _ in 0..8 {
        ctl.tick().expect("tick");
    }
    assert_eq!(ctl.queued_measurements(), 4);
}

#[test]
fn disabled_controller_requests_no_further_ticks() {
    let mut cfg = sensor_cfg();
    cfg.enabled = false;
    let flow = SpyFlow::default();
    let mut ctl = build_controller(
        SeqPosition::new([100.0]),
        flow.clone(),
        SpyRunout::default(),
        &cfg,
    )
    .expect("build controller");

    ctl.note_sample(0.75);
    let schedule = ctl.tick().expect("tick");

    // The ready-time tick still runs once, then parks the timer.
    assert_eq!(schedule, Schedule::Never);
    assert_eq!(flow.emitted(), vec![100]);
}

#[test]
fn sampling_continues_while_disabled() {
    let mut cfg = sensor_cfg();
    cfg.enabled = false;
    let mut ctl = build_controller(
        SeqPosition::new([100.0]),
        SpyFlow::default(),
        SpyRunout::default(),
        &cfg,
    )
    .expect("build controller");

    ctl.note_sample(0.75);
    let status = ctl.status();
    assert_eq!(status.diameter, 1.75);
    assert_eq!(status.raw, 7500);
    assert!(!status.enabled);
}

#[test]
fn position_error_propagates_as_hardware_error() {
    struct ErrPosition;
    impl PositionTracker for ErrPosition {
        fn extruder_position(&mut self) -> HwResult<f64> {
            Err("encoder unavailable".into())
        }
    }

    let mut ctl = build_controller(
        ErrPosition,
        SpyFlow::default(),
        SpyRunout::default(),
        &sensor_cfg(),
    )
    .expect("build controller");

    let err = ctl.tick().expect_err("tick should fail");
    let msg = format!("{err:#}");
    assert!(
        msg.contains("extruder position"),
        "unexpected error: {msg}"
    );
}
