//! Reference dispatch scenarios with hand-checked results.

mod common;

use dispatch_sim::config::ScenarioConfig;
use dispatch_sim::error::RunError;
use dispatch_sim::runner::run_scenario;
use dispatch_sim::sim::economics::EconomicsConfig;
use dispatch_sim::sim::engine;
use dispatch_sim::sim::price_cap::{MarginMethod, MarginTarget, PriceCapError, compute_threshold};
use dispatch_sim::sim::storage::BatteryEngine;
use dispatch_sim::sim::tolling::TollingConfig;

#[test]
fn always_on_plant_idles_at_min_load_below_threshold() {
    let prices = common::quarter_hour_series(&[40.0; 8]);
    let dispatch = engine::dispatch(&prices, &common::always_on_plant(), 50.0);
    assert_eq!(dispatch, vec![2.0; 8]);

    let mut cfg = ScenarioConfig::baseline();
    cfg.plant.ramp_limit_mw_per_step = 0.0;
    cfg.margin.target_margin_pct = 0.0;
    let outcome = run_scenario(&cfg, &prices).unwrap();
    assert_eq!(outcome.threshold(), 50.0);
    for r in &outcome.dispatch {
        assert_eq!(r.dispatch_mw, 2.0);
        assert!((r.energy_mwh - 0.5).abs() < 1e-12);
    }
}

#[test]
fn plant_runs_at_max_above_threshold() {
    let prices = common::quarter_hour_series(&[60.0; 8]);
    let dispatch = engine::dispatch(&prices, &common::always_on_plant(), 50.0);
    assert_eq!(dispatch, vec![20.0; 8]);
}

#[test]
fn ramp_limit_delays_step_change() {
    let prices = common::quarter_hour_series(&[40.0, 60.0, 60.0, 60.0]);
    let dispatch = engine::dispatch(&prices, &common::ramp_limited_plant(), 50.0);
    assert_eq!(dispatch, vec![0.0, 2.0, 4.0, 6.0]);
}

#[test]
fn full_economics_without_conversion_blocks_dispatch() {
    let econ = EconomicsConfig {
        mwh_per_output_unit: 0.0,
        ..EconomicsConfig::default()
    };
    let margin = MarginTarget {
        method: MarginMethod::FullEconomics,
        target_margin_fraction: 0.3,
    };
    let cap = compute_threshold(&margin, &econ, &TollingConfig::default(), 50.0);
    assert_eq!(cap.threshold, 0.0);
    assert!(matches!(
        cap.error,
        Some(PriceCapError::MissingConversion(_))
    ));

    let mut cfg = ScenarioConfig::baseline();
    cfg.margin.method = MarginMethod::FullEconomics;
    cfg.economics.mwh_per_unit = 0.0;
    let err = run_scenario(&cfg, &common::quarter_hour_series(&[40.0; 4])).unwrap_err();
    assert!(matches!(
        err,
        RunError::PriceCap(PriceCapError::MissingConversion(_))
    ));
}

#[test]
fn battery_band_arbitrage() {
    let prices = common::quarter_hour_series(&[20.0, 90.0]);
    let out = BatteryEngine::run(&prices, &common::lossless_battery(), None);

    assert_eq!(out.records[0].charge_mw, 5.0);
    assert!((out.records[0].soc_mwh - 6.25).abs() < 1e-12);
    assert_eq!(out.records[1].discharge_mw, 5.0);
    assert!((out.records[1].soc_mwh - 5.0).abs() < 1e-12);
    assert!((out.kpis.total_profit - 87.5).abs() < 1e-9);
}
