//! Plant dispatch engine: one forward pass over the price series.

use tracing::debug;

use crate::assets::{Plant, PlantConfig};
use crate::prices::PriceSeries;

use super::controller::ThresholdController;

/// Dispatch engine owning the plant model and its threshold controller.
///
/// The engine is myopic: each interval is decided from its own price and the
/// previous output only.
pub struct DispatchEngine {
    plant: Plant,
    controller: ThresholdController,
}

impl DispatchEngine {
    /// Creates an engine for `plant` dispatched against `threshold` (currency/MWh).
    pub fn new(plant: PlantConfig, threshold: f64) -> Self {
        Self {
            controller: ThresholdController::new(&plant, threshold),
            plant: Plant::new(plant),
        }
    }

    /// Decides and applies one interval, returning the plant output (MW).
    pub fn step(&mut self, price: f64) -> f64 {
        let command = self.controller.command(price);
        self.plant.follow(command.target_mw, command.floor_mw)
    }

    /// Runs every interval of `prices` in order and returns the MW schedule.
    pub fn run(&mut self, prices: &PriceSeries) -> Vec<f64> {
        let schedule: Vec<f64> = prices.iter().map(|p| self.step(p.price)).collect();
        debug!(
            intervals = schedule.len(),
            threshold = self.controller.threshold(),
            "plant dispatch complete"
        );
        schedule
    }

    pub fn plant(&self) -> &Plant {
        &self.plant
    }
}

/// Convenience wrapper: dispatches `plant` against `threshold` over `prices`.
pub fn dispatch(prices: &PriceSeries, plant: &PlantConfig, threshold: f64) -> Vec<f64> {
    DispatchEngine::new(*plant, threshold).run(prices)
}
