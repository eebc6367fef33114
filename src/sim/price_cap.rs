//! Turns a target margin into the dispatch threshold price.
//!
//! The plant runs at maximum load whenever `price >= threshold`. Every method
//! clamps the threshold at zero.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::economics::EconomicsConfig;
use super::tolling::TollingConfig;

/// How the dispatch threshold is derived from the target margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarginMethod {
    /// Discount the plain break-even price by the margin.
    #[default]
    PowerOnly,
    /// Derive the threshold from product price, CO₂ cost and opex shares.
    FullEconomics,
    /// Derive the threshold from the tolling variable fee.
    Tolling,
}

impl MarginMethod {
    /// Short tag echoed in KPI summaries.
    pub fn tag(self) -> &'static str {
        match self {
            MarginMethod::PowerOnly => "power-only",
            MarginMethod::FullEconomics => "full-econ",
            MarginMethod::Tolling => "tolling",
        }
    }
}

impl fmt::Display for MarginMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Margin the operator wants to keep, as a fraction in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginTarget {
    pub method: MarginMethod,
    pub target_margin_fraction: f64,
}

/// A threshold that cannot be derived from the given parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PriceCapError {
    #[error("full-economics margin needs electricity per output unit > 0 (got {0} MWh/unit)")]
    MissingConversion(f64),
}

/// Resolved threshold plus any configuration error.
///
/// On error the threshold is `0.0` and must not be used for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceCap {
    pub threshold: f64,
    pub method: MarginMethod,
    pub error: Option<PriceCapError>,
}

impl PriceCap {
    fn ok(threshold: f64, method: MarginMethod) -> Self {
        Self {
            threshold: threshold.max(0.0),
            method,
            error: None,
        }
    }

    /// The threshold, or the error that makes it meaningless.
    pub fn checked(&self) -> Result<f64, PriceCapError> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(self.threshold),
        }
    }
}

/// Resolves the dispatch threshold for `margin`.
///
/// Configuration problems come back in [`PriceCap::error`] rather than as a
/// panic or `Err`, so callers can report them alongside the echoed inputs.
pub fn compute_threshold(
    margin: &MarginTarget,
    econ: &EconomicsConfig,
    tolling: &TollingConfig,
    break_even: f64,
) -> PriceCap {
    let m = margin.target_margin_fraction;
    let cap = match margin.method {
        MarginMethod::PowerOnly => PriceCap::ok((1.0 - m) * break_even, margin.method),
        MarginMethod::FullEconomics => {
            if econ.mwh_per_output_unit <= 0.0 {
                let err = PriceCapError::MissingConversion(econ.mwh_per_output_unit);
                warn!(error = %err, "price cap unresolved");
                return PriceCap {
                    threshold: 0.0,
                    method: margin.method,
                    error: Some(err),
                };
            }
            let per_unit = econ.output_price_per_unit * (1.0 - m - econ.opex_fraction())
                - econ.co2_price_per_unit * econ.co2_intensity_per_output_unit;
            PriceCap::ok(per_unit / econ.mwh_per_output_unit, margin.method)
        }
        MarginMethod::Tolling => PriceCap::ok(
            tolling.variable_fee_per_mwh * (1.0 - m - tolling.opex_fraction())
                - tolling.other_variable_cost_per_mwh,
            margin.method,
        ),
    };
    debug!(method = %cap.method, threshold = cap.threshold, "price cap resolved");
    cap
}

/// Break-even power price implied by product economics.
///
/// `(product_price - co2 cost - water cost - trader margin) / mwh_per_unit`,
/// floored at zero; zero when no conversion factor is set.
pub fn benchmark_break_even(econ: &EconomicsConfig, trader_margin_fraction: f64) -> f64 {
    if econ.mwh_per_output_unit <= 0.0 {
        return 0.0;
    }
    let net = econ.output_price_per_unit
        - econ.co2_intensity_per_output_unit * econ.co2_price_per_unit
        - econ.water_cost_per_unit
        - trader_margin_fraction * econ.output_price_per_unit;
    (net / econ.mwh_per_output_unit).max(0.0)
}
