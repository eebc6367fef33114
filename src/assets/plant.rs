use serde::{Deserialize, Serialize};

/// Operating envelope of a flexible power-consuming plant.
///
/// Fractions are of `capacity_mw` and expressed as 0–1. Invariants
/// (`capacity_mw > 0`, `min_load_fraction <= max_load_fraction`) are checked by
/// scenario validation, not here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlantConfig {
    /// Nameplate electrical capacity (MW).
    pub capacity_mw: f64,
    /// Minimum technical load as a fraction of capacity.
    pub min_load_fraction: f64,
    /// Maximum load as a fraction of capacity.
    pub max_load_fraction: f64,
    /// Largest change in output between consecutive intervals (MW).
    /// `None` or a non-positive value means unconstrained.
    pub ramp_limit_mw_per_step: Option<f64>,
    /// Never drop below minimum load.
    pub always_on: bool,
}

impl PlantConfig {
    /// Minimum load in MW.
    pub fn min_mw(&self) -> f64 {
        self.min_load_fraction * self.capacity_mw
    }

    /// Maximum load in MW.
    pub fn max_mw(&self) -> f64 {
        self.max_load_fraction * self.capacity_mw
    }

    /// Effective ramp limit, if any.
    pub fn ramp_limit(&self) -> Option<f64> {
        self.ramp_limit_mw_per_step
            .filter(|r| r.is_finite() && *r > 0.0)
    }

    /// Output the plant falls back to when it is not asked to run high.
    pub fn idle_mw(&self) -> f64 {
        if self.always_on { self.min_mw() } else { 0.0 }
    }
}

/// Moves from `prev_mw` towards `target_mw` by at most `ramp_mw`.
pub fn apply_ramp(prev_mw: f64, target_mw: f64, ramp_mw: Option<f64>) -> f64 {
    match ramp_mw {
        Some(r) => target_mw.clamp(prev_mw - r, prev_mw + r),
        None => target_mw,
    }
}

/// A plant that follows setpoints within its ramp and load limits.
///
/// The plant remembers its last output so ramp limits carry across
/// intervals. Before the first interval it sits at its idle level.
#[derive(Debug, Clone)]
pub struct Plant {
    config: PlantConfig,
    output_mw: f64,
}

impl Plant {
    pub fn new(config: PlantConfig) -> Self {
        Self {
            output_mw: config.idle_mw(),
            config,
        }
    }

    pub fn config(&self) -> &PlantConfig {
        &self.config
    }

    /// Output of the most recent interval (MW).
    pub fn output_mw(&self) -> f64 {
        self.output_mw
    }

    /// Applies one interval's setpoint and returns the realised output (MW).
    ///
    /// The setpoint is first ramp-limited against the previous output, then
    /// clamped into `[floor_mw, max_mw]`.
    pub fn follow(&mut self, target_mw: f64, floor_mw: f64) -> f64 {
        let ramped = apply_ramp(self.output_mw, target_mw, self.config.ramp_limit());
        let output = ramped.max(floor_mw).min(self.config.max_mw());
        self.output_mw = output;
        output
    }
}
