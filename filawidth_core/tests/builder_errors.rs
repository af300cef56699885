use filawidth_config::SensorCfg;
use filawidth_core::{WidthBuilder, build_controller, mocks::NullRunout};
use filawidth_traits::{FlowCommand, HwResult, PositionTracker};
use rstest::rstest;

struct FixedPosition;
impl PositionTracker for FixedPosition {
    fn extruder_position(&mut self) -> HwResult<f64> {
        Ok(0.0)
    }
}

struct NullFlow;
impl FlowCommand for NullFlow {
    fn set_flow_percent(&mut self, _percent: u32) -> HwResult<()> {
        Ok(())
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
        enabled: false,
        runout_min_diameter: 1.0,
        runout_max_diameter: None,
        logging: false,
        use_current_diameter_while_delay: false,
    }
}

#[test]
fn missing_position_tracker_is_reported_first() {
    let err = WidthBuilder::new().try_build().expect_err("must fail");
    assert!(format!("{err}").contains("missing position tracker"));
}

#[test]
fn missing_flow_sink_is_reported() {
    let err = WidthBuilder::new()
        .with_position_tracker(FixedPosition)
        .try_build()
        .expect_err("must fail");
    assert!(format!("{err}").contains("missing flow command sink"));
}

#[test]
fn missing_config_is_reported() {
    let err = WidthBuilder::new()
        .with_position_tracker(FixedPosition)
        .with_flow_sink(NullFlow)
        .try_build()
        .expect_err("must fail");
    assert!(format!("{err}").contains("missing sensor config"));
}

#[test]
fn complete_builder_succeeds_with_default_runout_sink() {
    let ctl = WidthBuilder::new()
        .with_position_tracker(FixedPosition)
        .with_flow_sink(NullFlow)
        .with_sensor_cfg(sensor_cfg())
        .build()
        .expect("build controller");
    assert!(!ctl.is_enabled());
}

#[rstest]
#[case(
    |c: &mut SensorCfg| c.raw_2 = c.raw_1,
    "calibration raw anchors must differ"
)]
#[case(
    |c: &mut SensorCfg| c.measurement_interval = 0,
    "measurement_interval must be > 0"
)]
#[case(
    |c: &mut SensorCfg| c.nominal_diameter = 1.0,
    "nominal_diameter must be > 1.0"
)]
#[case(
    |c: &mut SensorCfg| c.measurement_delay = 0.0,
    "measurement_delay must be > 0.0"
)]
#[case(
    |c: &mut SensorCfg| c.max_difference = -0.2,
    "max_difference must be >= 0"
)]
#[case(
    |c: &mut SensorCfg| c.runout_min_diameter = 99.0,
    "runout window must be ordered and finite"
)]
fn invalid_config_is_fatal(
    #[case] mutate: fn(&mut SensorCfg),
    #[case] expected: &str,
) {
    let mut cfg = sensor_cfg();
    mutate(&mut cfg);
    let err = build_controller(FixedPosition, NullFlow, NullRunout, &cfg)
        .expect_err("must reject invalid config");
    assert!(
        format!("{err}").contains(expected),
        "unexpected error: {err}"
    );
}
