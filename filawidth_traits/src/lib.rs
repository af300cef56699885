pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Boxed error type shared by all hardware-facing traits.
pub type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Analog filament width sensor delivering raw unitless samples.
///
/// A sample is the unscaled ADC fraction; the core tolerates arbitrary
/// real values and extrapolates its calibration line for out-of-range input.
pub trait WidthSensor {
    fn read(&mut self, timeout: std::time::Duration) -> HwResult<f64>;
}

/// On-demand extruder position in millimeters.
///
/// Positions are expected to be monotonically non-decreasing during normal
/// printing; behavior under retraction is unspecified.
pub trait PositionTracker {
    fn extruder_position(&mut self) -> HwResult<f64>;
}

/// Sink for percentage extrusion-rate overrides (the "M221 S<P>" equivalent).
pub trait FlowCommand {
    fn set_flow_percent(&mut self, percent: u32) -> HwResult<()>;
}

/// Filament-presence notification sink (runout subsystem).
pub trait RunoutSink {
    fn note_filament_present(&mut self, present: bool);
}

impl<T: WidthSensor + ?Sized> WidthSensor for Box<T> {
    fn read(&mut self, timeout: std::time::Duration) -> HwResult<f64> {
        (**self).read(timeout)
    }
}

impl<T: PositionTracker + ?Sized> PositionTracker for Box<T> {
    fn extruder_position(&mut self) -> HwResult<f64> {
        (**self).extruder_position()
    }
}

impl<T: FlowCommand + ?Sized> FlowCommand for Box<T> {
    fn set_flow_percent(&mut self, percent: u32) -> HwResult<()> {
        (**self).set_flow_percent(percent)
    }
}

impl<T: RunoutSink + ?Sized> RunoutSink for Box<T> {
    fn note_filament_present(&mut self, present: bool) {
        (**self).note_filament_present(present)
    }
}
