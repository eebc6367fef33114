use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Battery storage parameters.
///
/// State-of-charge fractions are of `energy_capacity_mwh` and expressed as 0–1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryConfig {
    pub enabled: bool,
    /// Usable energy capacity (MWh).
    pub energy_capacity_mwh: f64,
    /// Maximum grid-side charging power (MW).
    pub charge_power_mw: f64,
    /// Maximum grid-side discharging power (MW).
    pub discharge_power_mw: f64,
    /// Fraction of charged energy that reaches the cells, in (0, 1].
    pub charge_efficiency: f64,
    /// Fraction of drawn cell energy delivered to the grid, in (0, 1].
    pub discharge_efficiency: f64,
    pub soc_min_fraction: f64,
    pub soc_max_fraction: f64,
    pub soc_init_fraction: f64,
    /// Charge at or below this price (currency/MWh).
    pub low_price_threshold: f64,
    /// Discharge at or above this price (currency/MWh).
    pub high_price_threshold: f64,
    /// Wear cost per MWh of charge plus discharge throughput.
    pub degradation_cost_per_mwh_throughput: f64,
    /// Hold (no charge or discharge) in the last interval.
    pub enforce_final_soc: bool,
}

impl BatteryConfig {
    pub fn soc_min_mwh(&self) -> f64 {
        self.soc_min_fraction * self.energy_capacity_mwh
    }

    pub fn soc_max_mwh(&self) -> f64 {
        self.soc_max_fraction * self.energy_capacity_mwh
    }

    /// Initial state of charge, clamped into the allowed band.
    pub fn initial_soc_mwh(&self) -> f64 {
        let init = self.soc_init_fraction * self.energy_capacity_mwh;
        init.max(self.soc_min_mwh()).min(self.soc_max_mwh())
    }

    /// Checks physical consistency of the parameters.
    ///
    /// Returns an empty vector if the battery can be simulated.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if !(self.energy_capacity_mwh.is_finite() && self.energy_capacity_mwh > 0.0) {
            errors.push(ConfigError::new(
                "battery.energy_capacity_mwh",
                "must be > 0",
            ));
        }
        if !(self.charge_power_mw.is_finite() && self.charge_power_mw >= 0.0) {
            errors.push(ConfigError::new("battery.charge_power_mw", "must be >= 0"));
        }
        if !(self.discharge_power_mw.is_finite() && self.discharge_power_mw >= 0.0) {
            errors.push(ConfigError::new(
                "battery.discharge_power_mw",
                "must be >= 0",
            ));
        }
        if !(self.charge_efficiency > 0.0 && self.charge_efficiency <= 1.0) {
            errors.push(ConfigError::new("battery.charge_efficiency", "must be in (0, 1]"));
        }
        if !(self.discharge_efficiency > 0.0 && self.discharge_efficiency <= 1.0) {
            errors.push(ConfigError::new("battery.discharge_efficiency", "must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.soc_min_fraction)
            || !(0.0..=1.0).contains(&self.soc_max_fraction)
        {
            errors.push(ConfigError::new("battery.soc_bounds", "must lie in [0, 1]"));
        } else if self.soc_min_fraction >= self.soc_max_fraction {
            errors.push(ConfigError::new(
                "battery.soc_min",
                "must be < battery.soc_max",
            ));
        }
        if !(0.0..=1.0).contains(&self.soc_init_fraction) {
            errors.push(ConfigError::new("battery.soc_init", "must lie in [0, 1]"));
        }
        if !(self.degradation_cost_per_mwh_throughput.is_finite()
            && self.degradation_cost_per_mwh_throughput >= 0.0)
        {
            errors.push(ConfigError::new(
                "battery.degradation_cost_per_mwh",
                "must be >= 0",
            ));
        }

        errors
    }
}

/// A battery whose state of charge evolves interval by interval.
///
/// Power values are grid-side: charging `P` MW for `dt` hours stores
/// `P * eta_c * dt` MWh, discharging `P` MW delivers `P * dt` MWh and
/// drains `P / eta_d * dt` MWh.
#[derive(Debug, Clone)]
pub struct Battery {
    capacity_mwh: f64,
    soc_mwh: f64,
    soc_min_mwh: f64,
    soc_max_mwh: f64,
    max_charge_mw: f64,
    max_discharge_mw: f64,
    eta_c: f64,
    eta_d: f64,
    dt_hours: f64,
}

impl Battery {
    /// Creates a battery at its initial state of charge.
    ///
    /// `config` is assumed to have passed [`BatteryConfig::validate`].
    pub fn new(config: &BatteryConfig, dt_hours: f64) -> Self {
        Self {
            capacity_mwh: config.energy_capacity_mwh,
            soc_mwh: config.initial_soc_mwh(),
            soc_min_mwh: config.soc_min_mwh(),
            soc_max_mwh: config.soc_max_mwh(),
            max_charge_mw: config.charge_power_mw,
            max_discharge_mw: config.discharge_power_mw,
            eta_c: config.charge_efficiency,
            eta_d: config.discharge_efficiency,
            dt_hours,
        }
    }

    pub fn soc_mwh(&self) -> f64 {
        self.soc_mwh
    }

    pub fn soc_fraction(&self) -> f64 {
        self.soc_mwh / self.capacity_mwh
    }

    /// Largest charging power this interval, limited by power rating and headroom.
    pub fn charge_limit_mw(&self) -> f64 {
        self.max_charge_mw.min(self.power_to_full_mw())
    }

    /// Largest discharging power this interval, limited by power rating and stored energy.
    pub fn discharge_limit_mw(&self) -> f64 {
        self.max_discharge_mw.min(self.power_to_empty_mw())
    }

    /// Applies one interval of charging and discharging.
    ///
    /// If the requested action would carry the state of charge past a bound,
    /// the action is re-derived so it lands exactly on that bound instead of
    /// losing the excess energy. Returns the realised `(charge_mw, discharge_mw)`.
    pub fn apply(&mut self, charge_mw: f64, discharge_mw: f64) -> (f64, f64) {
        let (mut charge, mut discharge) = (charge_mw.max(0.0), discharge_mw.max(0.0));
        let next = self.soc_mwh + self.delta_mwh(charge, discharge);

        if next > self.soc_max_mwh {
            charge = self.power_to_full_mw();
            discharge = 0.0;
        } else if next < self.soc_min_mwh {
            discharge = self.power_to_empty_mw();
            charge = 0.0;
        }

        self.soc_mwh = (self.soc_mwh + self.delta_mwh(charge, discharge))
            .max(self.soc_min_mwh)
            .min(self.soc_max_mwh);
        (charge, discharge)
    }

    /// Charging power that reaches `soc_max` in exactly one interval.
    fn power_to_full_mw(&self) -> f64 {
        let room = self.soc_max_mwh - self.soc_mwh;
        (room / (self.eta_c * self.dt_hours)).max(0.0)
    }

    /// Discharging power that reaches `soc_min` in exactly one interval.
    fn power_to_empty_mw(&self) -> f64 {
        let stored = self.soc_mwh - self.soc_min_mwh;
        (stored * self.eta_d / self.dt_hours).max(0.0)
    }

    fn delta_mwh(&self, charge_mw: f64, discharge_mw: f64) -> f64 {
        self.eta_c * charge_mw * self.dt_hours - discharge_mw / self.eta_d * self.dt_hours
    }
}
