//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use dispatch_sim::assets::{BatteryConfig, PlantConfig};
use dispatch_sim::prices::{self, PriceSeries};

/// 2024-01-01 00:00, the start of every fixture series.
pub fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

/// Quarter-hour series starting at [`t0`].
pub fn quarter_hour_series(prices: &[f64]) -> PriceSeries {
    PriceSeries::from_prices(t0(), TimeDelta::minutes(15), prices).unwrap()
}

/// Seeded synthetic prices (`days` full days).
pub fn synthetic_series(days: usize) -> PriceSeries {
    prices::synthetic(days, t0(), 42)
}

/// 20 MW always-on plant, 10% minimum load, no ramp limit.
pub fn always_on_plant() -> PlantConfig {
    PlantConfig {
        capacity_mw: 20.0,
        min_load_fraction: 0.1,
        max_load_fraction: 1.0,
        ramp_limit_mw_per_step: None,
        always_on: true,
    }
}

/// 20 MW plant that may shut down, ramping at most 2 MW per interval.
pub fn ramp_limited_plant() -> PlantConfig {
    PlantConfig {
        capacity_mw: 20.0,
        min_load_fraction: 0.0,
        max_load_fraction: 1.0,
        ramp_limit_mw_per_step: Some(2.0),
        always_on: false,
    }
}

/// Lossless 10 MWh / 5 MW battery at half charge, band 30..80.
pub fn lossless_battery() -> BatteryConfig {
    BatteryConfig {
        enabled: true,
        energy_capacity_mwh: 10.0,
        charge_power_mw: 5.0,
        discharge_power_mw: 5.0,
        charge_efficiency: 1.0,
        discharge_efficiency: 1.0,
        soc_min_fraction: 0.0,
        soc_max_fraction: 1.0,
        soc_init_fraction: 0.5,
        low_price_threshold: 30.0,
        high_price_threshold: 80.0,
        degradation_cost_per_mwh_throughput: 0.0,
        enforce_final_soc: false,
    }
}
