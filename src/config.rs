//! TOML-based scenario configuration and preset definitions.
//!
//! Operator-facing shares are percentages; the accessor methods on
//! [`ScenarioConfig`] convert them to the 0–1 fractions the simulation uses.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::assets::{BatteryConfig, GridConnection, PlantConfig};
use crate::sim::economics::EconomicsConfig;
use crate::sim::price_cap::{MarginMethod, MarginTarget, benchmark_break_even};
use crate::sim::tolling::TollingConfig;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub plant: PlantSection,
    #[serde(default)]
    pub economics: EconomicsSection,
    /// Target margin and dispatch threshold method.
    #[serde(default)]
    pub margin: MarginSection,
    #[serde(default)]
    pub battery: BatterySection,
    #[serde(default)]
    pub tolling: TollingSection,
    /// Site grid connection limits.
    #[serde(default)]
    pub grid: GridSection,
}

/// Plant operating envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlantSection {
    /// Nameplate capacity (MW, must be > 0).
    pub capacity_mw: f64,
    /// Minimum technical load (% of capacity).
    pub min_load_pct: f64,
    /// Maximum load (% of capacity).
    pub max_load_pct: f64,
    /// Ramp limit per 15-minute interval (MW); 0 disables it.
    pub ramp_limit_mw_per_step: f64,
    /// Never drop below minimum load.
    pub always_on: bool,
}

impl Default for PlantSection {
    fn default() -> Self {
        Self {
            capacity_mw: 20.0,
            min_load_pct: 10.0,
            max_load_pct: 100.0,
            ramp_limit_mw_per_step: 2.0,
            always_on: true,
        }
    }
}

/// Product economics. Defaults describe a methanol plant (per tonne).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EconomicsSection {
    /// Electricity per output unit (MWh/unit).
    pub mwh_per_unit: f64,
    pub output_price_per_unit: f64,
    /// CO₂ price per tonne.
    pub co2_price: f64,
    /// Tonnes of CO₂ per output unit.
    pub co2_intensity: f64,
    /// Maintenance cost (% of revenue).
    pub maintenance_pct: f64,
    /// Selling, general and administrative cost (% of revenue).
    pub sga_pct: f64,
    /// Insurance cost (% of revenue).
    pub insurance_pct: f64,
    pub water_cost_per_unit: f64,
    pub other_opex_per_unit: f64,
}

impl Default for EconomicsSection {
    fn default() -> Self {
        Self {
            mwh_per_unit: 11.0,
            output_price_per_unit: 1000.0,
            co2_price: 40.0,
            co2_intensity: 1.375,
            maintenance_pct: 3.0,
            sga_pct: 2.0,
            insurance_pct: 1.0,
            water_cost_per_unit: 7.3,
            other_opex_per_unit: 0.0,
        }
    }
}

/// How the dispatch threshold is derived.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarginSection {
    pub method: MarginMethod,
    /// Desired margin (%, must be in [0, 100)).
    pub target_margin_pct: f64,
    /// Power-only break-even price (currency/MWh).
    pub break_even: f64,
    /// Replace `break_even` with the product-derived benchmark.
    pub use_benchmark_break_even: bool,
    /// Trader margin used by the benchmark only (% of product price).
    pub trader_margin_pct: f64,
}

impl Default for MarginSection {
    fn default() -> Self {
        Self {
            method: MarginMethod::PowerOnly,
            target_margin_pct: 30.0,
            break_even: 50.0,
            use_benchmark_break_even: false,
            trader_margin_pct: 10.0,
        }
    }
}

/// Battery dispatch strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatteryStrategy {
    /// Buy below the low price, sell above the high price.
    #[default]
    PriceBand,
    /// Cover plant minimum load first, then arbitrage.
    Hybrid,
}

/// Battery storage parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatterySection {
    pub enabled: bool,
    pub strategy: BatteryStrategy,
    pub energy_capacity_mwh: f64,
    pub charge_power_mw: f64,
    pub discharge_power_mw: f64,
    /// Charge efficiency (0.0–1.0).
    pub charge_efficiency: f64,
    /// Discharge efficiency (0.0–1.0).
    pub discharge_efficiency: f64,
    pub soc_init_pct: f64,
    pub soc_min_pct: f64,
    pub soc_max_pct: f64,
    /// Charge at or below this price.
    pub low_price: f64,
    /// Discharge at or above this price.
    pub high_price: f64,
    pub degradation_cost_per_mwh: f64,
    /// Hold in the last interval instead of trading.
    pub enforce_final_soc: bool,
}

impl Default for BatterySection {
    fn default() -> Self {
        Self {
            enabled: false,
            strategy: BatteryStrategy::PriceBand,
            energy_capacity_mwh: 10.0,
            charge_power_mw: 5.0,
            discharge_power_mw: 5.0,
            charge_efficiency: 0.95,
            discharge_efficiency: 0.95,
            soc_init_pct: 50.0,
            soc_min_pct: 5.0,
            soc_max_pct: 95.0,
            low_price: 40.0,
            high_price: 80.0,
            degradation_cost_per_mwh: 0.0,
            enforce_final_soc: false,
        }
    }
}

/// Tolling contract terms.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TollingSection {
    pub enabled: bool,
    pub contracted_mw: f64,
    pub capacity_fee_per_mw_month: f64,
    pub variable_fee_per_mwh: f64,
    pub other_variable_cost_per_mwh: f64,
    /// Maintenance cost (% of variable toll revenue).
    pub maintenance_pct: f64,
    pub sga_pct: f64,
    pub insurance_pct: f64,
}

/// Grid connection limits.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridSection {
    /// Site import limit (MW); 0 means unlimited.
    pub max_import_mw: f64,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"plant.capacity_mw"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn pct(v: f64) -> f64 {
    v / 100.0
}

fn check_pct(errors: &mut Vec<ConfigError>, field: &str, v: f64) {
    if !(0.0..=100.0).contains(&v) {
        errors.push(ConfigError::new(field, "must be in [0, 100]"));
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: always-on plant, power-only margin, no battery.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the flexible preset: plant may shut down, faster ramps,
    /// threshold from full product economics.
    pub fn flexible() -> Self {
        Self {
            plant: PlantSection {
                min_load_pct: 20.0,
                ramp_limit_mw_per_step: 5.0,
                always_on: false,
                ..PlantSection::default()
            },
            margin: MarginSection {
                method: MarginMethod::FullEconomics,
                target_margin_pct: 25.0,
                ..MarginSection::default()
            },
            ..Self::default()
        }
    }

    /// Returns the battery-hybrid preset: a battery that covers plant
    /// minimum load behind a 25 MW import limit.
    pub fn battery_hybrid() -> Self {
        Self {
            battery: BatterySection {
                enabled: true,
                strategy: BatteryStrategy::Hybrid,
                ..BatterySection::default()
            },
            grid: GridSection {
                max_import_mw: 25.0,
            },
            ..Self::default()
        }
    }

    /// Returns the tolling preset: the plant runs under a tolling contract
    /// and dispatches against the variable fee.
    pub fn tolling_contract() -> Self {
        Self {
            margin: MarginSection {
                method: MarginMethod::Tolling,
                target_margin_pct: 20.0,
                ..MarginSection::default()
            },
            tolling: TollingSection {
                enabled: true,
                contracted_mw: 20.0,
                capacity_fee_per_mw_month: 8000.0,
                variable_fee_per_mwh: 120.0,
                other_variable_cost_per_mwh: 5.0,
                maintenance_pct: 2.0,
                sga_pct: 1.0,
                insurance_pct: 0.5,
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "flexible", "battery_hybrid", "tolling"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "flexible" => Ok(Self::flexible()),
            "battery_hybrid" => Ok(Self::battery_hybrid()),
            "tolling" => Ok(Self::tolling_contract()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. The tolling
    /// section is only checked when enabled. Battery parameters are left to
    /// the battery engine, which runs an unusable battery as disabled.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let p = &self.plant;
        if !(p.capacity_mw.is_finite() && p.capacity_mw > 0.0) {
            errors.push(ConfigError::new("plant.capacity_mw", "must be > 0"));
        }
        check_pct(&mut errors, "plant.min_load_pct", p.min_load_pct);
        check_pct(&mut errors, "plant.max_load_pct", p.max_load_pct);
        if p.min_load_pct > p.max_load_pct {
            errors.push(ConfigError::new(
                "plant.min_load_pct",
                "must be <= plant.max_load_pct",
            ));
        }
        if !(p.ramp_limit_mw_per_step >= 0.0) {
            errors.push(ConfigError::new(
                "plant.ramp_limit_mw_per_step",
                "must be >= 0",
            ));
        }

        let e = &self.economics;
        if !(e.mwh_per_unit >= 0.0) {
            errors.push(ConfigError::new("economics.mwh_per_unit", "must be >= 0"));
        }
        check_pct(&mut errors, "economics.maintenance_pct", e.maintenance_pct);
        check_pct(&mut errors, "economics.sga_pct", e.sga_pct);
        check_pct(&mut errors, "economics.insurance_pct", e.insurance_pct);

        let m = &self.margin;
        if !(0.0..100.0).contains(&m.target_margin_pct) {
            errors.push(ConfigError::new(
                "margin.target_margin_pct",
                "must be in [0, 100)",
            ));
        }
        check_pct(&mut errors, "margin.trader_margin_pct", m.trader_margin_pct);

        let t = &self.tolling;
        if t.enabled {
            if !(t.contracted_mw >= 0.0) {
                errors.push(ConfigError::new("tolling.contracted_mw", "must be >= 0"));
            }
            check_pct(&mut errors, "tolling.maintenance_pct", t.maintenance_pct);
            check_pct(&mut errors, "tolling.sga_pct", t.sga_pct);
            check_pct(&mut errors, "tolling.insurance_pct", t.insurance_pct);
        }

        if !(self.grid.max_import_mw >= 0.0) {
            errors.push(ConfigError::new("grid.max_import_mw", "must be >= 0"));
        }

        errors
    }

    pub fn plant(&self) -> PlantConfig {
        let p = &self.plant;
        PlantConfig {
            capacity_mw: p.capacity_mw,
            min_load_fraction: pct(p.min_load_pct),
            max_load_fraction: pct(p.max_load_pct),
            ramp_limit_mw_per_step: (p.ramp_limit_mw_per_step > 0.0)
                .then_some(p.ramp_limit_mw_per_step),
            always_on: p.always_on,
        }
    }

    pub fn economics(&self) -> EconomicsConfig {
        let e = &self.economics;
        EconomicsConfig {
            mwh_per_output_unit: e.mwh_per_unit,
            output_price_per_unit: e.output_price_per_unit,
            co2_price_per_unit: e.co2_price,
            co2_intensity_per_output_unit: e.co2_intensity,
            maintenance_fraction_of_revenue: pct(e.maintenance_pct),
            sga_fraction_of_revenue: pct(e.sga_pct),
            insurance_fraction_of_revenue: pct(e.insurance_pct),
            water_cost_per_unit: e.water_cost_per_unit,
            other_opex_per_unit: e.other_opex_per_unit,
        }
    }

    pub fn margin_target(&self) -> MarginTarget {
        MarginTarget {
            method: self.margin.method,
            target_margin_fraction: pct(self.margin.target_margin_pct),
        }
    }

    /// Break-even price fed to the price cap and proxy profit.
    pub fn break_even(&self) -> f64 {
        if self.margin.use_benchmark_break_even {
            self.benchmark_break_even()
        } else {
            self.margin.break_even
        }
    }

    /// Break-even derived from product economics and the trader margin.
    pub fn benchmark_break_even(&self) -> f64 {
        benchmark_break_even(&self.economics(), pct(self.margin.trader_margin_pct))
    }

    pub fn battery(&self) -> BatteryConfig {
        let b = &self.battery;
        BatteryConfig {
            enabled: b.enabled,
            energy_capacity_mwh: b.energy_capacity_mwh,
            charge_power_mw: b.charge_power_mw,
            discharge_power_mw: b.discharge_power_mw,
            charge_efficiency: b.charge_efficiency,
            discharge_efficiency: b.discharge_efficiency,
            soc_min_fraction: pct(b.soc_min_pct),
            soc_max_fraction: pct(b.soc_max_pct),
            soc_init_fraction: pct(b.soc_init_pct),
            low_price_threshold: b.low_price,
            high_price_threshold: b.high_price,
            degradation_cost_per_mwh_throughput: b.degradation_cost_per_mwh,
            enforce_final_soc: b.enforce_final_soc,
        }
    }

    pub fn tolling(&self) -> TollingConfig {
        let t = &self.tolling;
        TollingConfig {
            enabled: t.enabled,
            contracted_mw: t.contracted_mw,
            capacity_fee_per_mw_month: t.capacity_fee_per_mw_month,
            variable_fee_per_mwh: t.variable_fee_per_mwh,
            other_variable_cost_per_mwh: t.other_variable_cost_per_mwh,
            maintenance_fraction: pct(t.maintenance_pct),
            sga_fraction: pct(t.sga_pct),
            insurance_fraction: pct(t.insurance_pct),
        }
    }

    pub fn grid(&self) -> GridConnection {
        GridConnection::with_import_limit(self.grid.max_import_mw)
    }
}
