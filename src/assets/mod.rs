//! Physical asset models: the flexible plant, battery storage, and the grid connection.

/// Battery storage with state-of-charge bookkeeping.
pub mod battery;
pub mod grid;
/// Ramp- and load-limited flexible plant.
pub mod plant;

pub use battery::{Battery, BatteryConfig};
pub use grid::GridConnection;
pub use plant::{Plant, PlantConfig};
