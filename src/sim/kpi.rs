//! Post-hoc KPI computation from simulation records.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::types::{BatteryRecord, DispatchRecord};

/// Tolerance for "running at maximum load" checks (MW).
const FULL_LOAD_EPS_MW: f64 = 1e-9;

/// One value in a flat KPI summary.
#[derive(Debug, Clone, PartialEq)]
pub enum KpiValue {
    Number(f64),
    /// Undefined ratio, e.g. a weighted average over zero energy.
    Missing,
    Flag(bool),
    Text(String),
}

impl KpiValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            KpiValue::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for KpiValue {
    fn from(v: f64) -> Self {
        KpiValue::Number(v)
    }
}

impl From<Option<f64>> for KpiValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(KpiValue::Missing, KpiValue::Number)
    }
}

impl From<usize> for KpiValue {
    fn from(v: usize) -> Self {
        KpiValue::Number(v as f64)
    }
}

impl From<bool> for KpiValue {
    fn from(v: bool) -> Self {
        KpiValue::Flag(v)
    }
}

impl From<&str> for KpiValue {
    fn from(v: &str) -> Self {
        KpiValue::Text(v.to_owned())
    }
}

impl From<String> for KpiValue {
    fn from(v: String) -> Self {
        KpiValue::Text(v)
    }
}

impl Serialize for KpiValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            KpiValue::Number(v) if v.is_finite() => serializer.serialize_f64(*v),
            KpiValue::Number(_) | KpiValue::Missing => serializer.serialize_none(),
            KpiValue::Flag(b) => serializer.serialize_bool(*b),
            KpiValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl fmt::Display for KpiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KpiValue::Number(v) => write!(f, "{v:.4}"),
            KpiValue::Missing => f.write_str("n/a"),
            KpiValue::Flag(b) => write!(f, "{b}"),
            KpiValue::Text(s) => f.write_str(s),
        }
    }
}

/// Ordered, flat key/value KPI summary.
///
/// Keys keep insertion order so CSV and JSON output is stable. Pushing an
/// existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KpiSummary {
    entries: Vec<(String, KpiValue)>,
}

impl KpiSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<KpiValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&KpiValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Numeric value of `key`, if present and a number.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(KpiValue::as_f64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &KpiValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for KpiSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl fmt::Display for KpiSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ---")?;
        let width = self.entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (k, v) in &self.entries {
            writeln!(f, "{k:<width$}  {v}")?;
        }
        Ok(())
    }
}

/// Aggregate plant KPIs derived from a complete dispatch run.
///
/// Computed post-hoc from the records so the totals always match the
/// per-interval data. Ratios that would divide by zero are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlantKpis {
    pub intervals: usize,
    pub total_energy_mwh: f64,
    /// `Σ(price·energy) / Σenergy`.
    pub weighted_avg_price: Option<f64>,
    pub total_power_cost: f64,
    pub total_output_units: f64,
    pub total_revenue: f64,
    pub total_co2_cost: f64,
    pub total_opex_misc: f64,
    pub total_true_profit: f64,
    pub total_proxy_profit: f64,
    pub true_profit_per_unit: Option<f64>,
    /// True profit over revenue.
    pub true_profit_margin: Option<f64>,
    /// Revenue less power cost, over revenue.
    pub gross_margin: Option<f64>,
    /// Power, CO₂ and opex cost per output unit.
    pub all_in_cost_per_unit: Option<f64>,
    /// Energy expressed as hours at maximum load.
    pub full_load_hours: Option<f64>,
    /// Share of intervals dispatched at maximum load.
    pub running_share: Option<f64>,
}

impl PlantKpis {
    /// Aggregates plant KPIs from a complete dispatch run.
    ///
    /// # Arguments
    ///
    /// * `records` - Per-interval dispatch records
    /// * `max_load_mw` - Plant maximum output, for full-load hours and running share
    ///
    /// # Returns
    ///
    /// Totals plus ratios; a ratio with a non-positive denominator is `None`.
    pub fn from_records(records: &[DispatchRecord], max_load_mw: f64) -> Self {
        let mut k = Self {
            intervals: records.len(),
            ..Self::default()
        };
        let mut full_load_count = 0_usize;

        for r in records {
            k.total_energy_mwh += r.energy_mwh;
            k.total_power_cost += r.power_cost;
            k.total_output_units += r.output_units;
            k.total_revenue += r.revenue;
            k.total_co2_cost += r.co2_cost;
            k.total_opex_misc += r.opex_misc;
            k.total_true_profit += r.true_profit;
            k.total_proxy_profit += r.proxy_profit;
            if max_load_mw > 0.0 && r.dispatch_mw >= max_load_mw - FULL_LOAD_EPS_MW {
                full_load_count += 1;
            }
        }

        let price_energy: f64 = records.iter().map(|r| r.price * r.energy_mwh).sum();
        k.weighted_avg_price = ratio(price_energy, k.total_energy_mwh);
        k.true_profit_per_unit = ratio(k.total_true_profit, k.total_output_units);
        k.true_profit_margin = ratio(k.total_true_profit, k.total_revenue);
        k.gross_margin = ratio(k.total_revenue - k.total_power_cost, k.total_revenue);
        k.all_in_cost_per_unit = ratio(
            k.total_power_cost + k.total_co2_cost + k.total_opex_misc,
            k.total_output_units,
        );
        k.full_load_hours = ratio(k.total_energy_mwh, max_load_mw);
        k.running_share = ratio(full_load_count as f64, records.len() as f64);
        k
    }

    /// Appends the plant entries to `summary`.
    pub fn write_to(&self, summary: &mut KpiSummary) {
        summary.push("intervals", self.intervals);
        summary.push("total_energy_mwh", self.total_energy_mwh);
        summary.push("weighted_avg_price", self.weighted_avg_price);
        summary.push("total_power_cost", self.total_power_cost);
        summary.push("total_output_units", self.total_output_units);
        summary.push("total_revenue", self.total_revenue);
        summary.push("total_co2_cost", self.total_co2_cost);
        summary.push("total_opex_misc", self.total_opex_misc);
        summary.push("total_true_profit", self.total_true_profit);
        summary.push("total_proxy_profit", self.total_proxy_profit);
        summary.push("true_profit_per_unit", self.true_profit_per_unit);
        summary.push("true_profit_margin", self.true_profit_margin);
        summary.push("gross_margin", self.gross_margin);
        summary.push("all_in_cost_per_unit", self.all_in_cost_per_unit);
        summary.push("full_load_hours", self.full_load_hours);
        summary.push("running_share", self.running_share);
    }
}

/// Aggregate battery KPIs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatteryKpis {
    pub enabled: bool,
    pub intervals: usize,
    pub total_charge_mwh: f64,
    pub total_discharge_mwh: f64,
    /// Part of the discharge that covered plant load.
    pub self_supply_mwh: f64,
    pub total_cost: f64,
    pub total_revenue: f64,
    pub total_savings: f64,
    pub total_degradation_cost: f64,
    pub total_profit: f64,
    pub initial_soc_mwh: f64,
    pub final_soc_mwh: f64,
    pub average_soc_fraction: Option<f64>,
    /// Charge plus discharge energy (MWh).
    pub throughput_mwh: f64,
    /// `throughput / (2 * capacity)`.
    pub equivalent_full_cycles: f64,
}

impl BatteryKpis {
    /// KPIs of a battery that did not run.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Aggregates battery KPIs from a complete run.
    ///
    /// # Arguments
    ///
    /// * `records` - Per-interval battery records
    /// * `step_hours` - Interval length in hours
    /// * `initial_soc_mwh` - State of charge before the first interval
    /// * `capacity_mwh` - Energy capacity, for equivalent full cycles
    pub fn from_records(
        records: &[BatteryRecord],
        step_hours: f64,
        initial_soc_mwh: f64,
        capacity_mwh: f64,
    ) -> Self {
        let mut k = Self {
            enabled: true,
            intervals: records.len(),
            initial_soc_mwh,
            final_soc_mwh: records.last().map_or(initial_soc_mwh, |r| r.soc_mwh),
            ..Self::default()
        };

        for r in records {
            k.total_charge_mwh += r.charge_mw * step_hours;
            k.total_discharge_mwh += r.discharge_mw * step_hours;
            k.self_supply_mwh += r.self_supply_mw * step_hours;
            k.total_cost += r.cost;
            k.total_revenue += r.revenue;
            k.total_savings += r.savings;
            k.total_degradation_cost += r.degradation_cost;
            k.total_profit += r.profit;
        }

        let soc_sum: f64 = records.iter().map(|r| r.soc_fraction).sum();
        k.average_soc_fraction = ratio(soc_sum, records.len() as f64);
        k.throughput_mwh = k.total_charge_mwh + k.total_discharge_mwh;
        k.equivalent_full_cycles = ratio(k.throughput_mwh, 2.0 * capacity_mwh).unwrap_or(0.0);
        k
    }

    /// Appends the battery entries to `summary`.
    ///
    /// A disabled battery contributes only its flag and a zero profit.
    pub fn write_to(&self, summary: &mut KpiSummary) {
        summary.push("battery_enabled", self.enabled);
        summary.push("battery_profit", self.total_profit);
        if !self.enabled {
            return;
        }
        summary.push("battery_revenue", self.total_revenue);
        summary.push("battery_savings", self.total_savings);
        summary.push("battery_cost", self.total_cost);
        summary.push("battery_degradation_cost", self.total_degradation_cost);
        summary.push("battery_charge_mwh", self.total_charge_mwh);
        summary.push("battery_discharge_mwh", self.total_discharge_mwh);
        summary.push("battery_self_supply_mwh", self.self_supply_mwh);
        summary.push("battery_throughput_mwh", self.throughput_mwh);
        summary.push("battery_equivalent_full_cycles", self.equivalent_full_cycles);
        summary.push("battery_initial_soc_mwh", self.initial_soc_mwh);
        summary.push("battery_final_soc_mwh", self.final_soc_mwh);
        summary.push("battery_avg_soc_fraction", self.average_soc_fraction);
    }
}

/// `num / den`, or `None` when the denominator is not positive.
fn ratio(num: f64, den: f64) -> Option<f64> {
    (den > 0.0).then(|| num / den)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    fn record(price: f64, mw: f64) -> DispatchRecord {
        let energy_mwh = mw * 0.25;
        DispatchRecord {
            timestamp: ts(),
            price,
            dispatch_mw: mw,
            energy_mwh,
            power_cost: price * energy_mwh,
            output_units: energy_mwh / 10.0,
            revenue: energy_mwh * 100.0,
            co2_cost: 0.0,
            opex_misc: 0.0,
            true_profit: energy_mwh * 100.0 - price * energy_mwh,
            proxy_profit: (price - 50.0) * energy_mwh,
        }
    }

    #[test]
    fn weighted_average_price() {
        // 0.5 MWh at 40, 5 MWh at 60
        let k = PlantKpis::from_records(&[record(40.0, 2.0), record(60.0, 20.0)], 20.0);
        assert!((k.weighted_avg_price.unwrap() - 320.0 / 5.5).abs() < 1e-9);
        assert!((k.total_energy_mwh - 5.5).abs() < 1e-12);
        assert_eq!(k.running_share, Some(0.5));
        assert!((k.full_load_hours.unwrap() - 0.275).abs() < 1e-12);
    }

    #[test]
    fn zero_energy_leaves_ratios_undefined() {
        let k = PlantKpis::from_records(&vec![record(40.0, 0.0); 3], 20.0);
        assert_eq!(k.weighted_avg_price, None);
        assert_eq!(k.true_profit_per_unit, None);
        assert_eq!(k.true_profit_margin, None);
        assert_eq!(k.gross_margin, None);
        assert_eq!(k.running_share, Some(0.0));
    }

    #[test]
    fn gross_margin_counts_power_cost_only() {
        // revenue 500, power cost 300 (5 MWh at 60)
        let k = PlantKpis::from_records(&[record(60.0, 20.0)], 20.0);
        assert!((k.gross_margin.unwrap() - 0.4).abs() < 1e-12);
        let mut s = KpiSummary::new();
        k.write_to(&mut s);
        assert_eq!(s.number("gross_margin"), k.gross_margin);
    }

    #[test]
    fn empty_records_give_zeroed_kpis() {
        let k = PlantKpis::from_records(&[], 20.0);
        assert_eq!(k.intervals, 0);
        assert_eq!(k.total_true_profit, 0.0);
        assert_eq!(k.running_share, None);
    }

    #[test]
    fn summary_serializes_flat_with_nulls() {
        let mut s = KpiSummary::new();
        s.push("method", "power-only");
        s.push("weighted_avg_price", None::<f64>);
        s.push("battery_enabled", false);
        s.push("total_true_profit", 12.5);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(
            json,
            r#"{"method":"power-only","weighted_avg_price":null,"battery_enabled":false,"total_true_profit":12.5}"#
        );
    }

    #[test]
    fn push_replaces_existing_key() {
        let mut s = KpiSummary::new();
        s.push("a", 1.0);
        s.push("b", 2.0);
        s.push("a", 3.0);
        assert_eq!(s.len(), 2);
        assert_eq!(s.number("a"), Some(3.0));
        assert_eq!(s.iter().next().map(|(k, _)| k), Some("a"));
    }

    #[test]
    fn disabled_battery_reports_flag_and_zero_profit() {
        let mut s = KpiSummary::new();
        BatteryKpis::disabled().write_to(&mut s);
        assert_eq!(s.get("battery_enabled"), Some(&KpiValue::Flag(false)));
        assert_eq!(s.number("battery_profit"), Some(0.0));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn report_header() {
        let mut s = KpiSummary::new();
        s.push("x", 1.0);
        assert!(s.to_string().starts_with("--- KPI Report ---"));
    }
}
