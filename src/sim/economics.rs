//! Converts a plant MW schedule into per-interval cost, revenue and profit.

use serde::{Deserialize, Serialize};

use crate::prices::PriceSeries;

use super::kpi::PlantKpis;
use super::types::DispatchRecord;

/// Product and operating-cost parameters of the plant.
///
/// All `*_fraction_of_revenue` values are 0–1.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EconomicsConfig {
    /// Electricity needed per unit of output (MWh/unit). Zero disables product economics.
    pub mwh_per_output_unit: f64,
    pub output_price_per_unit: f64,
    pub co2_price_per_unit: f64,
    /// CO₂ consumed per unit of output.
    pub co2_intensity_per_output_unit: f64,
    pub maintenance_fraction_of_revenue: f64,
    pub sga_fraction_of_revenue: f64,
    pub insurance_fraction_of_revenue: f64,
    pub water_cost_per_unit: f64,
    pub other_opex_per_unit: f64,
}

impl EconomicsConfig {
    /// Sum of the revenue-share cost fractions.
    pub fn opex_fraction(&self) -> f64 {
        self.maintenance_fraction_of_revenue
            + self.sga_fraction_of_revenue
            + self.insurance_fraction_of_revenue
    }

    /// Whether output quantities can be derived from energy.
    pub fn has_product_model(&self) -> bool {
        self.mwh_per_output_unit > 0.0
    }

    /// Output produced from `energy_mwh`, or zero without a product model.
    pub fn output_units(&self, energy_mwh: f64) -> f64 {
        if self.has_product_model() {
            energy_mwh / self.mwh_per_output_unit
        } else {
            0.0
        }
    }
}

/// Builds one [`DispatchRecord`] per interval.
///
/// # Arguments
///
/// * `prices` - Price series; its step length converts MW to MWh
/// * `dispatch_mw` - Plant schedule, one entry per price point
/// * `econ` - Product economics
/// * `break_even` - Price used for the proxy profit
///
/// # Returns
///
/// One record per paired interval. Extra entries on either side are ignored.
pub fn evaluate(
    prices: &PriceSeries,
    dispatch_mw: &[f64],
    econ: &EconomicsConfig,
    break_even: f64,
) -> Vec<DispatchRecord> {
    let dt = prices.step_hours();
    let opex_fraction = econ.opex_fraction();
    let per_unit_opex = econ.water_cost_per_unit + econ.other_opex_per_unit;

    prices
        .iter()
        .zip(dispatch_mw)
        .map(|(point, &mw)| {
            let energy_mwh = mw * dt;
            let power_cost = point.price * energy_mwh;
            let output_units = econ.output_units(energy_mwh);
            let revenue = output_units * econ.output_price_per_unit;
            let co2_cost =
                output_units * econ.co2_intensity_per_output_unit * econ.co2_price_per_unit;
            let opex_misc = revenue * opex_fraction + output_units * per_unit_opex;

            DispatchRecord {
                timestamp: point.timestamp,
                price: point.price,
                dispatch_mw: mw,
                energy_mwh,
                power_cost,
                output_units,
                revenue,
                co2_cost,
                opex_misc,
                true_profit: revenue - power_cost - co2_cost - opex_misc,
                proxy_profit: (point.price - break_even) * energy_mwh,
            }
        })
        .collect()
}

/// Evaluates the schedule and aggregates plant KPIs in one call.
///
/// # Returns
///
/// The per-interval records and the [`PlantKpis`] computed from them, with
/// `max_load_mw` as the full-load reference.
pub fn compute(
    prices: &PriceSeries,
    dispatch_mw: &[f64],
    econ: &EconomicsConfig,
    break_even: f64,
    max_load_mw: f64,
) -> (Vec<DispatchRecord>, PlantKpis) {
    let records = evaluate(prices, dispatch_mw, econ, break_even);
    let kpis = PlantKpis::from_records(&records, max_load_mw);
    (records, kpis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    fn series(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        PriceSeries::from_prices(start, TimeDelta::minutes(15), prices).unwrap()
    }

    fn methanol() -> EconomicsConfig {
        EconomicsConfig {
            mwh_per_output_unit: 10.0,
            output_price_per_unit: 1000.0,
            co2_price_per_unit: 40.0,
            co2_intensity_per_output_unit: 1.5,
            maintenance_fraction_of_revenue: 0.03,
            sga_fraction_of_revenue: 0.02,
            insurance_fraction_of_revenue: 0.01,
            water_cost_per_unit: 5.0,
            other_opex_per_unit: 1.0,
        }
    }

    #[test]
    fn single_interval_breakdown() {
        let records = evaluate(&series(&[40.0]), &[20.0], &methanol(), 50.0);
        let r = &records[0];
        assert_eq!(r.energy_mwh, 5.0);
        assert_eq!(r.power_cost, 200.0);
        assert!((r.output_units - 0.5).abs() < 1e-12);
        assert!((r.revenue - 500.0).abs() < 1e-9);
        assert!((r.co2_cost - 30.0).abs() < 1e-9);
        // 6% of 500 plus 0.5 t * 6 per t
        assert!((r.opex_misc - 33.0).abs() < 1e-9);
        assert!((r.true_profit - 237.0).abs() < 1e-9);
        assert!((r.proxy_profit + 50.0).abs() < 1e-9);
    }

    #[test]
    fn no_product_model_zeroes_product_terms() {
        let econ = EconomicsConfig {
            mwh_per_output_unit: 0.0,
            ..methanol()
        };
        let r = &evaluate(&series(&[80.0]), &[4.0], &econ, 50.0)[0];
        assert_eq!(r.output_units, 0.0);
        assert_eq!(r.revenue, 0.0);
        assert_eq!(r.co2_cost, 0.0);
        assert_eq!(r.opex_misc, 0.0);
        assert_eq!(r.true_profit, -80.0);
        assert_eq!(r.proxy_profit, 30.0);
    }

    #[test]
    fn profit_identity_holds_exactly() {
        let prices = [-30.0, 0.0, 47.3, 112.9];
        let mw = [2.0, 7.5, 13.25, 20.0];
        for r in evaluate(&series(&prices), &mw, &methanol(), 55.0) {
            assert_eq!(
                r.true_profit,
                r.revenue - r.power_cost - r.co2_cost - r.opex_misc
            );
        }
    }

    #[test]
    fn mismatched_lengths_use_shorter() {
        let records = evaluate(&series(&[1.0, 2.0, 3.0]), &[1.0], &methanol(), 0.0);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn compute_returns_matching_kpis() {
        let prices = series(&[40.0, 60.0]);
        let (records, kpis) = compute(&prices, &[2.0, 20.0], &methanol(), 50.0, 20.0);
        assert_eq!(records.len(), 2);
        assert!((kpis.total_energy_mwh - 5.5).abs() < 1e-12);
    }
}
