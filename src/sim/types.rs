//! Per-interval result records produced by the engines.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

/// Plant dispatch and economics for one interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchRecord {
    pub timestamp: NaiveDateTime,
    /// Market price (currency/MWh).
    pub price: f64,
    /// Plant consumption (MW).
    pub dispatch_mw: f64,
    /// Energy drawn this interval (MWh).
    pub energy_mwh: f64,
    /// `price * energy_mwh`.
    pub power_cost: f64,
    /// Product output (units, e.g. tonnes).
    pub output_units: f64,
    /// Product sales revenue.
    pub revenue: f64,
    pub co2_cost: f64,
    /// Revenue-share costs plus per-unit variable opex.
    pub opex_misc: f64,
    /// `revenue - power_cost - co2_cost - opex_misc`.
    pub true_profit: f64,
    /// `(price - break_even) * energy_mwh`.
    pub proxy_profit: f64,
}

impl fmt::Display for DispatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | price={:>8.2}  dispatch={:>7.3} MW  energy={:>7.3} MWh | \
             cost={:>9.2}  revenue={:>9.2}  profit={:>9.2}  proxy={:>9.2}",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.price,
            self.dispatch_mw,
            self.energy_mwh,
            self.power_cost,
            self.revenue,
            self.true_profit,
            self.proxy_profit,
        )
    }
}

/// Battery action, state of charge and economics for one interval.
///
/// `discharge_mw` is the total discharge; `self_supply_mw` is the part of it
/// that covered the plant's own load instead of being sold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryRecord {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub charge_mw: f64,
    pub discharge_mw: f64,
    pub self_supply_mw: f64,
    /// State of charge after this interval (MWh).
    pub soc_mwh: f64,
    /// State of charge after this interval as a fraction of capacity.
    pub soc_fraction: f64,
    /// Cost of charging energy.
    pub cost: f64,
    /// Sales of energy discharged to the grid.
    pub revenue: f64,
    /// Avoided plant purchases from self-supply.
    pub savings: f64,
    pub degradation_cost: f64,
    /// `revenue + savings - cost - degradation_cost`.
    pub profit: f64,
}

impl fmt::Display for BatteryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | price={:>8.2}  charge={:>6.3} MW  discharge={:>6.3} MW (self={:.3}) | \
             SoC={:>7.3} MWh ({:>5.1}%)  profit={:>8.2}",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.price,
            self.charge_mw,
            self.discharge_mw,
            self.self_supply_mw,
            self.soc_mwh,
            self.soc_fraction * 100.0,
            self.profit,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(12, 15, 0))
            .unwrap()
    }

    #[test]
    fn dispatch_record_display_does_not_panic() {
        let r = DispatchRecord {
            timestamp: ts(),
            price: -12.5,
            dispatch_mw: 20.0,
            energy_mwh: 5.0,
            power_cost: -62.5,
            output_units: 0.45,
            revenue: 454.5,
            co2_cost: 24.8,
            opex_misc: 27.3,
            true_profit: 464.9,
            proxy_profit: -312.5,
        };
        let s = format!("{r}");
        assert!(s.starts_with("2024-03-01 12:15"));
    }

    #[test]
    fn battery_record_display_does_not_panic() {
        let r = BatteryRecord {
            timestamp: ts(),
            price: 95.0,
            charge_mw: 0.0,
            discharge_mw: 5.0,
            self_supply_mw: 2.0,
            soc_mwh: 3.75,
            soc_fraction: 0.375,
            cost: 0.0,
            revenue: 71.25,
            savings: 47.5,
            degradation_cost: 0.0,
            profit: 118.75,
        };
        assert!(format!("{r}").contains("37.5%"));
    }
}
