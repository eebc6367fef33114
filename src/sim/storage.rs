//! Battery dispatch: price-band arbitrage with optional plant self-supply.

use tracing::{debug, warn};

use crate::assets::{Battery, BatteryConfig, GridConnection};
use crate::config::ConfigError;
use crate::prices::{PricePoint, PriceSeries};

use super::controller::{BandSignal, PriceBandController};
use super::kpi::BatteryKpis;
use super::types::BatteryRecord;

/// Read-only view of a finished plant dispatch, used by the hybrid strategy.
#[derive(Debug, Clone, Copy)]
pub struct PlantDispatchContext<'a> {
    /// Plant schedule (MW), one entry per price interval.
    pub dispatch_mw: &'a [f64],
    /// Plant minimum load (MW) the battery tries to cover.
    pub min_load_mw: f64,
    /// Plant dispatch threshold; self-supply only happens below it.
    pub threshold: f64,
    pub grid: GridConnection,
}

impl PlantDispatchContext<'_> {
    /// Plant situation in interval `index`. Missing entries read as 0 MW.
    pub fn interval(&self, index: usize, price: f64) -> PlantInterval {
        let dispatch_mw = self.dispatch_mw.get(index).copied().unwrap_or(0.0);
        PlantInterval {
            self_supply_target_mw: if price < self.threshold {
                self.min_load_mw.min(dispatch_mw).max(0.0)
            } else {
                0.0
            },
            import_headroom_mw: self.grid.import_headroom_mw(dispatch_mw),
        }
    }
}

/// What the plant asks of the battery in one interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantInterval {
    /// Plant load the battery should cover before arbitrage (MW).
    pub self_supply_target_mw: f64,
    /// Grid import left for charging (MW).
    pub import_headroom_mw: f64,
}

/// Battery records and KPIs of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatteryOutcome {
    pub records: Vec<BatteryRecord>,
    pub kpis: BatteryKpis,
}

impl BatteryOutcome {
    pub fn disabled() -> Self {
        Self::default()
    }
}

/// Battery engine: a battery plus its band controller.
pub struct BatteryEngine {
    battery: Battery,
    band: PriceBandController,
    degradation_cost_per_mwh: f64,
    dt_hours: f64,
}

impl BatteryEngine {
    /// Creates an engine, rejecting configurations that cannot be simulated.
    ///
    /// # Errors
    ///
    /// Returns every validation failure of `cfg`.
    pub fn new(cfg: &BatteryConfig, dt_hours: f64) -> Result<Self, Vec<ConfigError>> {
        let errors = cfg.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self {
            battery: Battery::new(cfg, dt_hours),
            band: PriceBandController::new(cfg.low_price_threshold, cfg.high_price_threshold),
            degradation_cost_per_mwh: cfg.degradation_cost_per_mwh_throughput,
            dt_hours,
        })
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    /// Decides and applies one interval.
    ///
    /// With `plant` set, discharge first covers the plant's self-supply
    /// target. Band charging only happens in intervals without self-supply,
    /// capped by the remaining grid import; the rest of the discharge limit
    /// is sold when the band says so.
    pub fn step(&mut self, point: &PricePoint, plant: Option<PlantInterval>) -> BatteryRecord {
        let signal = self.band.signal(point.price);
        let available = self.battery.discharge_limit_mw();
        let (mut charge, mut grid) = (0.0, 0.0);
        let mut self_supply =
            plant.map_or(0.0, |p| available.min(p.self_supply_target_mw).max(0.0));

        match signal {
            BandSignal::Charge if self_supply <= 0.0 => {
                charge = self.battery.charge_limit_mw();
                if let Some(p) = plant {
                    charge = charge.min(p.import_headroom_mw);
                }
            }
            BandSignal::Discharge => grid = available - self_supply,
            _ => {}
        }

        let (charge, discharge) = self.battery.apply(charge, self_supply + grid);
        // Boundary re-derivation trims the grid sale before self-supply.
        if discharge < self_supply + grid {
            self_supply = self_supply.min(discharge);
            grid = discharge - self_supply;
        }

        let dt = self.dt_hours;
        let cost = point.price * charge * dt;
        let revenue = point.price * grid * dt;
        let savings = point.price * self_supply * dt;
        let degradation_cost = self.degradation_cost_per_mwh * (charge + discharge) * dt;

        BatteryRecord {
            timestamp: point.timestamp,
            price: point.price,
            charge_mw: charge,
            discharge_mw: discharge,
            self_supply_mw: self_supply,
            soc_mwh: self.battery.soc_mwh(),
            soc_fraction: self.battery.soc_fraction(),
            cost,
            revenue,
            savings,
            degradation_cost,
            profit: revenue + savings - cost - degradation_cost,
        }
    }

    /// Records an interval with no charge or discharge.
    pub fn hold(&self, point: &PricePoint) -> BatteryRecord {
        BatteryRecord {
            timestamp: point.timestamp,
            price: point.price,
            charge_mw: 0.0,
            discharge_mw: 0.0,
            self_supply_mw: 0.0,
            soc_mwh: self.battery.soc_mwh(),
            soc_fraction: self.battery.soc_fraction(),
            cost: 0.0,
            revenue: 0.0,
            savings: 0.0,
            degradation_cost: 0.0,
            profit: 0.0,
        }
    }

    /// Runs the battery over `prices`.
    ///
    /// Pass `plant` for the hybrid self-supply strategy; `None` gives plain
    /// price-band arbitrage. With `enforce_final_soc` the last interval holds.
    /// A disabled or invalid configuration yields an empty schedule and
    /// disabled KPIs.
    pub fn run(
        prices: &PriceSeries,
        cfg: &BatteryConfig,
        plant: Option<&PlantDispatchContext<'_>>,
    ) -> BatteryOutcome {
        if !cfg.enabled {
            debug!("battery disabled");
            return BatteryOutcome::disabled();
        }
        let mut engine = match Self::new(cfg, prices.step_hours()) {
            Ok(engine) => engine,
            Err(errors) => {
                for e in &errors {
                    warn!(field = %e.field, "battery config rejected: {}", e.message);
                }
                return BatteryOutcome::disabled();
            }
        };

        let initial_soc_mwh = engine.battery.soc_mwh();
        let last = prices.len().saturating_sub(1);
        let records: Vec<BatteryRecord> = prices
            .iter()
            .enumerate()
            .map(|(i, point)| {
                if cfg.enforce_final_soc && i == last {
                    return engine.hold(point);
                }
                let interval = plant.map(|ctx| ctx.interval(i, point.price));
                engine.step(point, interval)
            })
            .collect();

        let kpis = BatteryKpis::from_records(
            &records,
            prices.step_hours(),
            initial_soc_mwh,
            cfg.energy_capacity_mwh,
        );
        debug!(
            intervals = records.len(),
            hybrid = plant.is_some(),
            profit = kpis.total_profit,
            "battery dispatch complete"
        );
        BatteryOutcome { records, kpis }
    }
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

    fn cfg() -> BatteryConfig {
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

    #[test]
    fn band_arbitrage_buys_low_sells_high() {
        let out = BatteryEngine::run(&series(&[20.0, 90.0]), &cfg(), None);
        let r = &out.records;
        assert_eq!(r[0].charge_mw, 5.0);
        assert!((r[0].soc_mwh - 6.25).abs() < 1e-12);
        assert_eq!(r[1].discharge_mw, 5.0);
        assert!((r[1].soc_mwh - 5.0).abs() < 1e-12);
        assert!((out.kpis.total_profit - 87.5).abs() < 1e-9);
    }

    #[test]
    fn holds_inside_band() {
        let out = BatteryEngine::run(&series(&[50.0, 60.0]), &cfg(), None);
        for r in &out.records {
            assert_eq!((r.charge_mw, r.discharge_mw), (0.0, 0.0));
        }
        assert_eq!(out.kpis.final_soc_mwh, 5.0);
    }

    #[test]
    fn disabled_battery_returns_empty_schedule() {
        let c = BatteryConfig {
            enabled: false,
            ..cfg()
        };
        let out = BatteryEngine::run(&series(&[20.0]), &c, None);
        assert!(out.records.is_empty());
        assert!(!out.kpis.enabled);
        assert_eq!(out.kpis.total_profit, 0.0);
    }

    #[test]
    fn invalid_battery_is_treated_as_disabled() {
        let c = BatteryConfig {
            energy_capacity_mwh: 0.0,
            ..cfg()
        };
        let out = BatteryEngine::run(&series(&[20.0, 90.0]), &c, None);
        assert!(out.records.is_empty());
        assert!(!out.kpis.enabled);
    }

    #[test]
    fn degradation_is_charged_on_throughput() {
        let c = BatteryConfig {
            degradation_cost_per_mwh_throughput: 2.0,
            ..cfg()
        };
        let out = BatteryEngine::run(&series(&[20.0, 90.0]), &c, None);
        // 2.5 MWh throughput * 2
        assert!((out.kpis.total_degradation_cost - 5.0).abs() < 1e-9);
        assert!((out.kpis.total_profit - 82.5).abs() < 1e-9);
        assert!((out.kpis.equivalent_full_cycles - 0.125).abs() < 1e-12);
    }

    #[test]
    fn hybrid_covers_min_load_below_threshold() {
        let dispatch = [2.0, 2.0];
        let ctx = PlantDispatchContext {
            dispatch_mw: &dispatch,
            min_load_mw: 2.0,
            threshold: 50.0,
            grid: GridConnection::unlimited(),
        };
        // 45: inside band, below plant threshold -> self-supply only
        // 90: above plant threshold and band high -> grid sale only
        let out = BatteryEngine::run(&series(&[45.0, 90.0]), &cfg(), Some(&ctx));
        let r = &out.records;
        assert_eq!(r[0].self_supply_mw, 2.0);
        assert_eq!(r[0].discharge_mw, 2.0);
        assert_eq!(r[0].revenue, 0.0);
        assert!((r[0].savings - 22.5).abs() < 1e-9);
        assert_eq!(r[1].self_supply_mw, 0.0);
        assert_eq!(r[1].discharge_mw, 5.0);
        assert!((r[1].revenue - 112.5).abs() < 1e-9);
    }

    #[test]
    fn hybrid_sells_remaining_power_after_self_supply() {
        let c = BatteryConfig {
            high_price_threshold: 40.0,
            ..cfg()
        };
        let dispatch = [2.0];
        let ctx = PlantDispatchContext {
            dispatch_mw: &dispatch,
            min_load_mw: 2.0,
            threshold: 50.0,
            grid: GridConnection::unlimited(),
        };
        let r = &BatteryEngine::run(&series(&[45.0]), &c, Some(&ctx)).records[0];
        assert_eq!(r.self_supply_mw, 2.0);
        assert_eq!(r.discharge_mw, 5.0);
        assert!((r.revenue - 45.0 * 3.0 * 0.25).abs() < 1e-9);
    }

    #[test]
    fn hybrid_charging_respects_import_limit() {
        // plant runs high at 10 >= 5, so nothing to self-supply
        let dispatch = [20.0];
        let ctx = PlantDispatchContext {
            dispatch_mw: &dispatch,
            min_load_mw: 2.0,
            threshold: 5.0,
            grid: GridConnection::with_import_limit(22.0),
        };
        let r = &BatteryEngine::run(&series(&[10.0]), &cfg(), Some(&ctx)).records[0];
        assert_eq!(r.charge_mw, 2.0);
    }

    #[test]
    fn self_supply_never_exceeds_plant_draw() {
        let dispatch = [0.0];
        let ctx = PlantDispatchContext {
            dispatch_mw: &dispatch,
            min_load_mw: 2.0,
            threshold: 50.0,
            grid: GridConnection::unlimited(),
        };
        let r = &BatteryEngine::run(&series(&[45.0]), &cfg(), Some(&ctx)).records[0];
        assert_eq!(r.self_supply_mw, 0.0);
        assert_eq!(r.discharge_mw, 0.0);
    }

    #[test]
    fn self_supply_takes_priority_over_cheap_charging() {
        let full = BatteryConfig {
            soc_init_fraction: 1.0,
            ..cfg()
        };
        let dispatch = [2.0];
        let ctx = PlantDispatchContext {
            dispatch_mw: &dispatch,
            min_load_mw: 2.0,
            threshold: 50.0,
            grid: GridConnection::unlimited(),
        };
        // 20 is in the charge band and below the plant threshold
        let r = &BatteryEngine::run(&series(&[20.0]), &full, Some(&ctx)).records[0];
        assert_eq!(r.charge_mw, 0.0);
        assert_eq!(r.self_supply_mw, 2.0);
        assert_eq!(r.discharge_mw, 2.0);
        assert!((r.soc_mwh - 9.5).abs() < 1e-12);
        assert!((r.savings - 10.0).abs() < 1e-12);

        let half = &BatteryEngine::run(&series(&[20.0]), &cfg(), Some(&ctx)).records[0];
        assert_eq!(half.charge_mw, 0.0);
        assert_eq!(half.self_supply_mw, 2.0);
    }

    #[test]
    fn empty_battery_falls_back_to_charging() {
        let empty = BatteryConfig {
            soc_init_fraction: 0.0,
            ..cfg()
        };
        let dispatch = [2.0];
        let ctx = PlantDispatchContext {
            dispatch_mw: &dispatch,
            min_load_mw: 2.0,
            threshold: 50.0,
            grid: GridConnection::unlimited(),
        };
        let r = &BatteryEngine::run(&series(&[20.0]), &empty, Some(&ctx)).records[0];
        assert_eq!(r.self_supply_mw, 0.0);
        assert_eq!(r.charge_mw, 5.0);
    }

    #[test]
    fn final_interval_holds_when_enforced() {
        let c = BatteryConfig {
            enforce_final_soc: true,
            ..cfg()
        };
        let out = BatteryEngine::run(&series(&[20.0, 90.0]), &c, None);
        let r = &out.records;
        assert_eq!(r[0].charge_mw, 5.0);
        assert_eq!(r[1].charge_mw, 0.0);
        assert_eq!(r[1].discharge_mw, 0.0);
        assert_eq!(r[1].profit, 0.0);
        assert!((out.kpis.final_soc_mwh - 6.25).abs() < 1e-12);
        assert!((out.kpis.total_profit + 25.0).abs() < 1e-9);
    }
}
