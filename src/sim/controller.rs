//! Rule-based controllers that turn a price into a setpoint.
//!
//! Controllers only decide; the assets in [`crate::assets`] enforce ramp,
//! load and state-of-charge limits.

use crate::assets::PlantConfig;

/// Setpoint for the plant for one interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantCommand {
    /// Desired output before ramp limits (MW).
    pub target_mw: f64,
    /// Lowest output allowed this interval (MW).
    pub floor_mw: f64,
}

/// Greedy single-threshold controller for the plant.
///
/// Runs at maximum load whenever `price >= threshold` (ties run high), and
/// otherwise falls back to minimum load when always-on or to zero. It never
/// looks ahead.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdController {
    threshold: f64,
    min_mw: f64,
    max_mw: f64,
    always_on: bool,
}

impl ThresholdController {
    pub fn new(plant: &PlantConfig, threshold: f64) -> Self {
        Self {
            threshold,
            min_mw: plant.min_mw(),
            max_mw: plant.max_mw(),
            always_on: plant.always_on,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether `price` triggers full-load operation.
    pub fn runs_high(&self, price: f64) -> bool {
        price >= self.threshold
    }

    pub fn command(&self, price: f64) -> PlantCommand {
        if self.runs_high(price) {
            PlantCommand {
                target_mw: self.max_mw,
                floor_mw: 0.0,
            }
        } else if self.always_on {
            PlantCommand {
                target_mw: self.min_mw,
                floor_mw: self.min_mw,
            }
        } else {
            PlantCommand {
                target_mw: 0.0,
                floor_mw: 0.0,
            }
        }
    }
}

/// What the price band asks the battery to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandSignal {
    Charge,
    Discharge,
    Hold,
}

/// Low/high price band for battery arbitrage.
///
/// Charging is checked first, so an inverted band (`low >= high`) charges at
/// prices that fall in both.
#[derive(Debug, Clone, Copy)]
pub struct PriceBandController {
    low: f64,
    high: f64,
}

impl PriceBandController {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn signal(&self, price: f64) -> BandSignal {
        if price <= self.low {
            BandSignal::Charge
        } else if price >= self.high {
            BandSignal::Discharge
        } else {
            BandSignal::Hold
        }
    }
}
