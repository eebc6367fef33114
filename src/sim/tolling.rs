//! Tolling revenue model: capacity fee plus a per-MWh variable fee.
//!
//! Under tolling the plant earns a fixed fee for contracted capacity and a
//! variable fee for every MWh it runs, independent of product sales.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::kpi::KpiSummary;
use super::types::DispatchRecord;

/// Average month length used to pro-rate the capacity fee.
pub const HOURS_PER_MONTH: f64 = 24.0 * 30.4375;

/// Tolling contract terms. Fractions are of variable toll revenue, 0–1.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TollingConfig {
    pub enabled: bool,
    /// Capacity under contract (MW); capped at plant capacity.
    pub contracted_mw: f64,
    pub capacity_fee_per_mw_month: f64,
    pub variable_fee_per_mwh: f64,
    pub other_variable_cost_per_mwh: f64,
    pub maintenance_fraction: f64,
    pub sga_fraction: f64,
    pub insurance_fraction: f64,
}

impl TollingConfig {
    pub fn opex_fraction(&self) -> f64 {
        self.maintenance_fraction + self.sga_fraction + self.insurance_fraction
    }
}

/// Tolling economics for one interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TollingRecord {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub energy_mwh: f64,
    /// Even share of the pro-rated capacity fee.
    pub capacity_revenue: f64,
    pub variable_revenue: f64,
    pub power_cost: f64,
    pub other_variable_cost: f64,
    /// Revenue-share costs on the variable fee.
    pub pct_costs: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TollingKpis {
    pub enabled: bool,
    /// Effective contracted capacity (MW).
    pub contracted_mw: f64,
    pub months: f64,
    pub capacity_revenue: f64,
    pub variable_revenue: f64,
    pub power_cost: f64,
    pub other_variable_cost: f64,
    pub pct_costs: f64,
    pub total_profit: f64,
}

impl TollingKpis {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Appends the tolling entries to `summary`.
    pub fn write_to(&self, summary: &mut KpiSummary) {
        summary.push("tolling_enabled", self.enabled);
        summary.push("tolling_total_profit", self.total_profit);
        if !self.enabled {
            return;
        }
        summary.push("tolling_contracted_mw", self.contracted_mw);
        summary.push("tolling_months", self.months);
        summary.push("tolling_capacity_revenue", self.capacity_revenue);
        summary.push("tolling_variable_revenue", self.variable_revenue);
        summary.push("tolling_power_cost", self.power_cost);
        summary.push("tolling_other_variable_cost", self.other_variable_cost);
        summary.push("tolling_pct_costs", self.pct_costs);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TollingOutcome {
    pub records: Vec<TollingRecord>,
    pub kpis: TollingKpis,
}

/// Evaluates the tolling contract over a finished plant dispatch.
///
/// # Arguments
///
/// * `records` - Plant dispatch records
/// * `cfg` - Tolling contract terms
/// * `plant_capacity_mw` - Upper bound for the contracted capacity
/// * `step_hours` - Interval length in hours
///
/// # Returns
///
/// Per-interval tolling rows and totals. An empty timeline and disabled KPIs
/// when tolling is off or there is nothing to evaluate.
pub fn evaluate(
    records: &[DispatchRecord],
    cfg: &TollingConfig,
    plant_capacity_mw: f64,
    step_hours: f64,
) -> TollingOutcome {
    if !cfg.enabled || records.is_empty() {
        return TollingOutcome::default();
    }

    let months = step_hours * records.len() as f64 / HOURS_PER_MONTH;
    let contracted_mw = cfg.contracted_mw.min(plant_capacity_mw).max(0.0);
    let capacity_total = contracted_mw * cfg.capacity_fee_per_mw_month * months;
    let capacity_per_step = capacity_total / records.len() as f64;
    let opex_fraction = cfg.opex_fraction();

    let timeline: Vec<TollingRecord> = records
        .iter()
        .map(|r| {
            let variable_revenue = cfg.variable_fee_per_mwh * r.energy_mwh;
            let other_variable_cost = cfg.other_variable_cost_per_mwh * r.energy_mwh;
            let pct_costs = variable_revenue * opex_fraction;
            TollingRecord {
                timestamp: r.timestamp,
                price: r.price,
                energy_mwh: r.energy_mwh,
                capacity_revenue: capacity_per_step,
                variable_revenue,
                power_cost: r.power_cost,
                other_variable_cost,
                pct_costs,
                profit: capacity_per_step + variable_revenue
                    - r.power_cost
                    - other_variable_cost
                    - pct_costs,
            }
        })
        .collect();

    let kpis = TollingKpis {
        enabled: true,
        contracted_mw,
        months,
        capacity_revenue: capacity_total,
        variable_revenue: timeline.iter().map(|t| t.variable_revenue).sum(),
        power_cost: timeline.iter().map(|t| t.power_cost).sum(),
        other_variable_cost: timeline.iter().map(|t| t.other_variable_cost).sum(),
        pct_costs: timeline.iter().map(|t| t.pct_costs).sum(),
        total_profit: timeline.iter().map(|t| t.profit).sum(),
    };

    TollingOutcome {
        records: timeline,
        kpis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(price: f64, mw: f64) -> DispatchRecord {
        let energy_mwh = mw * 0.25;
        DispatchRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap(),
            price,
            dispatch_mw: mw,
            energy_mwh,
            power_cost: price * energy_mwh,
            output_units: 0.0,
            revenue: 0.0,
            co2_cost: 0.0,
            opex_misc: 0.0,
            true_profit: -price * energy_mwh,
            proxy_profit: 0.0,
        }
    }

    fn contract() -> TollingConfig {
        TollingConfig {
            enabled: true,
            contracted_mw: 30.0,
            capacity_fee_per_mw_month: 7305.0,
            variable_fee_per_mwh: 100.0,
            other_variable_cost_per_mwh: 10.0,
            maintenance_fraction: 0.1,
            sga_fraction: 0.0,
            insurance_fraction: 0.0,
        }
    }

    #[test]
    fn disabled_contract_yields_nothing() {
        let cfg = TollingConfig {
            enabled: false,
            ..contract()
        };
        let out = evaluate(&[record(50.0, 20.0)], &cfg, 20.0, 0.25);
        assert!(out.records.is_empty());
        assert!(!out.kpis.enabled);
        assert_eq!(out.kpis.total_profit, 0.0);
    }

    #[test]
    fn empty_dispatch_yields_nothing() {
        assert!(!evaluate(&[], &contract(), 20.0, 0.25).kpis.enabled);
    }

    #[test]
    fn capacity_fee_is_prorated_and_capped() {
        // 96 quarter-hours = 24 h = 1/30.4375 month; 20 MW * 7305 / 30.4375 = 4800
        let records = vec![record(0.0, 0.0); 96];
        let out = evaluate(&records, &contract(), 20.0, 0.25);
        assert_eq!(out.kpis.contracted_mw, 20.0);
        assert!((out.kpis.capacity_revenue - 4800.0).abs() < 1e-6);
        assert!((out.records[0].capacity_revenue - 50.0).abs() < 1e-9);
        assert!((out.kpis.total_profit - 4800.0).abs() < 1e-6);
    }

    #[test]
    fn variable_terms_per_interval() {
        let out = evaluate(&[record(40.0, 20.0)], &contract(), 20.0, 0.25);
        let r = &out.records[0];
        assert_eq!(r.variable_revenue, 500.0);
        assert_eq!(r.other_variable_cost, 50.0);
        assert!((r.pct_costs - 50.0).abs() < 1e-12);
        assert_eq!(r.power_cost, 200.0);
        let expected = r.capacity_revenue + 500.0 - 200.0 - 50.0 - 50.0;
        assert!((r.profit - expected).abs() < 1e-9);
    }
}
