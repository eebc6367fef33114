//! Quarter-hour dispatch simulator for a flexible power-consuming plant,
//! with optional battery storage and tolling revenue.

/// Physical asset models.
pub mod assets;
pub mod cli;
pub mod config;
pub mod error;
/// Price import and result export.
pub mod io;
pub mod logging;
pub mod prices;
pub mod runner;
/// Dispatch engines, economics, price cap, KPIs and sweeps.
pub mod sim;
