//! Static diameter windows derived once from configuration.

/// Plausibility and runout windows around the nominal diameter.
///
/// `min_diameter`/`max_diameter` bound what may feed the flow computation;
/// `runout_min_diameter`/`runout_max_diameter` bound what still counts as
/// filament being present at all. Immutable after startup.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub nominal_diameter: f64,
    pub min_diameter: f64,
    pub max_diameter: f64,
    pub runout_min_diameter: f64,
    pub runout_max_diameter: f64,
}

impl Bounds {
    pub fn new(
        nominal_diameter: f64,
        max_difference: f64,
        runout_min_diameter: f64,
        runout_max_diameter: f64,
    ) -> Self {
        Self {
            nominal_diameter,
            min_diameter: nominal_diameter - max_difference,
            max_diameter: nominal_diameter + max_difference,
            runout_min_diameter,
            runout_max_diameter,
        }
    }

    /// Runout detector: a diameter inside the runout window means filament
    /// is present.
    #[inline]
    pub fn filament_present(&self, diameter: f64) -> bool {
        (self.runout_min_diameter..=self.runout_max_diameter).contains(&diameter)
    }

    /// Whether a diameter is close enough to nominal to drive compensation.
    #[inline]
    pub fn plausible(&self, diameter: f64) -> bool {
        (self.min_diameter..=self.max_diameter).contains(&diameter)
    }
}
