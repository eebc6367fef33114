//! End-to-end scenario pipeline: price cap, plant dispatch, economics,
//! tolling and battery.

use tracing::{debug, info};

use crate::assets::PlantConfig;
use crate::config::{BatteryStrategy, ScenarioConfig};
use crate::error::RunError;
use crate::prices::PriceSeries;
use crate::sim::economics::{self, EconomicsConfig};
use crate::sim::engine;
use crate::sim::kpi::{KpiSummary, PlantKpis};
use crate::sim::price_cap::{MarginTarget, PriceCap, compute_threshold};
use crate::sim::storage::{BatteryEngine, BatteryOutcome, PlantDispatchContext};
use crate::sim::tolling::{self, TollingOutcome};
use crate::sim::types::DispatchRecord;

/// Everything one scenario run produces.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub plant: PlantConfig,
    pub economics: EconomicsConfig,
    pub margin: MarginTarget,
    pub break_even: f64,
    pub price_cap: PriceCap,
    pub dispatch: Vec<DispatchRecord>,
    pub plant_kpis: PlantKpis,
    pub tolling: TollingOutcome,
    pub battery: BatteryOutcome,
}

impl ScenarioOutcome {
    /// Dispatch threshold the plant ran against.
    pub fn threshold(&self) -> f64 {
        self.price_cap.threshold
    }

    /// Plant profit under the active revenue model: tolling profit when a
    /// tolling contract was evaluated, true product profit otherwise.
    pub fn plant_profit(&self) -> f64 {
        if self.tolling.kpis.enabled {
            self.tolling.kpis.total_profit
        } else {
            self.plant_kpis.total_true_profit
        }
    }

    /// Plant profit plus battery profit.
    pub fn total_profit(&self) -> f64 {
        self.plant_profit() + self.battery.kpis.total_profit
    }

    /// Flat KPI summary: echoed inputs, then plant, tolling and battery
    /// results, then the combined profit.
    pub fn summary(&self) -> KpiSummary {
        let mut s = KpiSummary::new();
        s.push("margin_method", self.margin.method.tag());
        s.push("target_margin_fraction", self.margin.target_margin_fraction);
        s.push("break_even", self.break_even);
        s.push("dispatch_threshold", self.threshold());
        s.push("plant_capacity_mw", self.plant.capacity_mw);
        s.push("min_load_fraction", self.plant.min_load_fraction);
        s.push("max_load_fraction", self.plant.max_load_fraction);
        s.push("ramp_limit_mw_per_step", self.plant.ramp_limit());
        s.push("always_on", self.plant.always_on);
        s.push("mwh_per_output_unit", self.economics.mwh_per_output_unit);
        s.push("output_price_per_unit", self.economics.output_price_per_unit);
        s.push("co2_price_per_unit", self.economics.co2_price_per_unit);
        s.push(
            "co2_intensity_per_output_unit",
            self.economics.co2_intensity_per_output_unit,
        );
        s.push("opex_fraction_of_revenue", self.economics.opex_fraction());
        s.push("water_cost_per_unit", self.economics.water_cost_per_unit);
        s.push("other_opex_per_unit", self.economics.other_opex_per_unit);

        self.plant_kpis.write_to(&mut s);
        self.tolling.kpis.write_to(&mut s);
        self.battery.kpis.write_to(&mut s);

        s.push("plant_profit", self.plant_profit());
        s.push("total_profit", self.total_profit());
        s
    }
}

/// Runs `config` over `prices`.
///
/// The plant is dispatched first; the hybrid battery strategy then reads
/// the finished plant schedule.
///
/// # Arguments
///
/// * `config` - Scenario to run; validated before anything is dispatched
/// * `prices` - Price series that sets the horizon and interval length
///
/// # Returns
///
/// The finished [`ScenarioOutcome`] with plant, tolling and battery results.
///
/// # Errors
///
/// Returns [`RunError::InvalidScenario`] when validation fails and
/// [`RunError::PriceCap`] when no dispatch threshold can be derived. No
/// dispatch is attempted in either case.
pub fn run_scenario(
    config: &ScenarioConfig,
    prices: &PriceSeries,
) -> Result<ScenarioOutcome, RunError> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(RunError::InvalidScenario(
            errors.iter().map(ToString::to_string).collect(),
        ));
    }

    let plant = config.plant();
    let econ = config.economics();
    let margin = config.margin_target();
    let break_even = config.break_even();

    let price_cap = compute_threshold(&margin, &econ, &config.tolling(), break_even);
    let threshold = price_cap.checked()?;
    info!(
        intervals = prices.len(),
        step_hours = prices.step_hours(),
        method = %margin.method,
        threshold,
        "running scenario"
    );

    let dispatch_mw = engine::dispatch(prices, &plant, threshold);
    let (dispatch, plant_kpis) =
        economics::compute(prices, &dispatch_mw, &econ, break_even, plant.max_mw());
    let tolling = tolling::evaluate(
        &dispatch,
        &config.tolling(),
        plant.capacity_mw,
        prices.step_hours(),
    );

    let hybrid = config.battery.strategy == BatteryStrategy::Hybrid;
    let context = hybrid.then(|| PlantDispatchContext {
        dispatch_mw: &dispatch_mw,
        min_load_mw: plant.min_mw(),
        threshold,
        grid: config.grid(),
    });
    let battery = BatteryEngine::run(prices, &config.battery(), context.as_ref());

    let outcome = ScenarioOutcome {
        plant,
        economics: econ,
        margin,
        break_even,
        price_cap,
        dispatch,
        plant_kpis,
        tolling,
        battery,
    };
    debug!(
        plant_profit = outcome.plant_profit(),
        battery_profit = outcome.battery.kpis.total_profit,
        "scenario finished"
    );
    info!(total_profit = outcome.total_profit(), "scenario complete");
    Ok(outcome)
}
