//! Parameter matrix sweeps and multi-series portfolio runs.
//!
//! Every grid point or price series is an independent scenario run, so both
//! fan out over the rayon thread pool. Output order is deterministic.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::ScenarioConfig;
use crate::prices::PriceSeries;
use crate::runner::{ScenarioOutcome, run_scenario};

/// Scenario parameter that a sweep can vary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepParam {
    /// `margin.target_margin_pct`
    TargetMarginPct,
    /// `plant.min_load_pct`
    MinLoadPct,
    /// `plant.capacity_mw`
    CapacityMw,
    /// `plant.ramp_limit_mw_per_step`
    RampLimit,
    /// `margin.break_even`
    BreakEven,
}

impl SweepParam {
    pub const ALL: [SweepParam; 5] = [
        SweepParam::TargetMarginPct,
        SweepParam::MinLoadPct,
        SweepParam::CapacityMw,
        SweepParam::RampLimit,
        SweepParam::BreakEven,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SweepParam::TargetMarginPct => "target-margin",
            SweepParam::MinLoadPct => "min-load",
            SweepParam::CapacityMw => "capacity",
            SweepParam::RampLimit => "ramp-limit",
            SweepParam::BreakEven => "break-even",
        }
    }

    /// Writes `value` into the matching field of `cfg`.
    pub fn apply(self, cfg: &mut ScenarioConfig, value: f64) {
        match self {
            SweepParam::TargetMarginPct => cfg.margin.target_margin_pct = value,
            SweepParam::MinLoadPct => cfg.plant.min_load_pct = value,
            SweepParam::CapacityMw => cfg.plant.capacity_mw = value,
            SweepParam::RampLimit => cfg.plant.ramp_limit_mw_per_step = value,
            SweepParam::BreakEven => {
                cfg.margin.break_even = value;
                cfg.margin.use_benchmark_break_even = false;
            }
        }
    }
}

impl fmt::Display for SweepParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Invalid sweep parameter or range text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseSweepError {
    #[error(
        "unknown sweep parameter \"{0}\", expected one of: {list}",
        list = SweepParam::ALL.map(SweepParam::name).join(", ")
    )]
    UnknownParam(String),
    #[error("range \"{0}\" must look like start:stop:step")]
    Shape(String),
    #[error("range \"{range}\": \"{part}\" is not a finite number")]
    Number { range: String, part: String },
    #[error("range \"{range}\" has {points} points, at most {max} allowed")]
    TooManyPoints {
        range: String,
        points: usize,
        max: usize,
    },
    #[error("sweep grid has {points} points, at most {max} allowed")]
    GridTooLarge { points: usize, max: usize },
}

impl FromStr for SweepParam {
    type Err = ParseSweepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SweepParam::ALL
            .into_iter()
            .find(|p| p.name() == s || p.name().replace('-', "_") == s)
            .ok_or_else(|| ParseSweepError::UnknownParam(s.to_owned()))
    }
}

/// Evenly stepped values from `start` towards `stop`, inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepRange {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

/// Most values one parsed range may produce.
pub const MAX_AXIS_POINTS: usize = 1_000;

/// Most scenario runs one matrix sweep may request.
pub const MAX_GRID_POINTS: usize = 10_000;

impl SweepRange {
    /// Number of grid values, saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        if self.step == 0.0 {
            return 1;
        }
        // 1e-9 absorbs quotients like 0.3 / 0.1 = 2.9999999999999996.
        let n = ((self.stop - self.start) / self.step + 1e-9).floor();
        if n >= 0.0 {
            (n as usize).saturating_add(1)
        } else {
            1
        }
    }

    /// Always false: a range yields at least `start`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Grid values. A zero step, or a step pointing away from `stop`, yields
    /// `start` alone.
    pub fn values(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| round10(self.start + i as f64 * self.step))
            .collect()
    }
}

/// Checks that an `x` by `y` sweep stays within [`MAX_GRID_POINTS`].
///
/// # Returns
///
/// The number of grid points.
///
/// # Errors
///
/// Returns [`ParseSweepError::GridTooLarge`] when the grid is too big.
pub fn check_grid(x: &SweepAxis, y: &SweepAxis) -> Result<usize, ParseSweepError> {
    let points = x.range.len().saturating_mul(y.range.len());
    if points > MAX_GRID_POINTS {
        return Err(ParseSweepError::GridTooLarge {
            points,
            max: MAX_GRID_POINTS,
        });
    }
    Ok(points)
}

fn round10(v: f64) -> f64 {
    (v * 1e10).round() / 1e10
}

impl FromStr for SweepRange {
    type Err = ParseSweepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let [start, stop, step] = parts.as_slice() else {
            return Err(ParseSweepError::Shape(s.to_owned()));
        };
        let num = |part: &str| -> Result<f64, ParseSweepError> {
            part.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ParseSweepError::Number {
                    range: s.to_owned(),
                    part: part.to_owned(),
                })
        };
        let range = Self {
            start: num(*start)?,
            stop: num(*stop)?,
            step: num(*step)?,
        };
        if range.len() > MAX_AXIS_POINTS {
            return Err(ParseSweepError::TooManyPoints {
                range: s.to_owned(),
                points: range.len(),
                max: MAX_AXIS_POINTS,
            });
        }
        Ok(range)
    }
}

/// One axis of a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepAxis {
    pub param: SweepParam,
    pub range: SweepRange,
}

/// Result at one grid point. Runs that fail carry the error and no numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub x: f64,
    pub y: f64,
    pub threshold: Option<f64>,
    pub total_true_profit: Option<f64>,
    pub total_energy_mwh: Option<f64>,
    pub total_profit: Option<f64>,
    pub error: Option<String>,
}

impl SweepPoint {
    fn from_run(x: f64, y: f64, run: Result<ScenarioOutcome, String>) -> Self {
        match run {
            Ok(out) => Self {
                x,
                y,
                threshold: Some(out.threshold()),
                total_true_profit: Some(out.plant_kpis.total_true_profit),
                total_energy_mwh: Some(out.plant_kpis.total_energy_mwh),
                total_profit: Some(out.total_profit()),
                error: None,
            },
            Err(error) => Self {
                x,
                y,
                threshold: None,
                total_true_profit: None,
                total_energy_mwh: None,
                total_profit: None,
                error: Some(error),
            },
        }
    }
}

/// Runs `base` at every `(x, y)` combination in parallel.
///
/// # Arguments
///
/// * `base` - Scenario the axis values are written into
/// * `prices` - Price series shared by every run
/// * `x` - Outer axis
/// * `y` - Inner axis
///
/// # Returns
///
/// One point per combination, x-major. Runs that fail carry their error.
/// Callers taking ranges from user input should bound the grid with
/// [`check_grid`] first.
pub fn run_matrix(
    base: &ScenarioConfig,
    prices: &PriceSeries,
    x: &SweepAxis,
    y: &SweepAxis,
) -> Vec<SweepPoint> {
    let grid: Vec<(f64, f64)> = x
        .range
        .values()
        .into_iter()
        .flat_map(|xv| y.range.values().into_iter().map(move |yv| (xv, yv)))
        .collect();
    info!(
        x = %x.param,
        y = %y.param,
        points = grid.len(),
        "running parameter matrix"
    );

    grid.into_par_iter()
        .map(|(xv, yv)| {
            let mut cfg = base.clone();
            x.param.apply(&mut cfg, xv);
            y.param.apply(&mut cfg, yv);
            let run = run_scenario(&cfg, prices).map_err(|e| e.to_string());
            SweepPoint::from_run(xv, yv, run)
        })
        .collect()
}

/// A named price series in a portfolio run.
#[derive(Debug, Clone)]
pub struct PortfolioSource {
    pub name: String,
    pub prices: PriceSeries,
}

/// Summary of one portfolio member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioEntry {
    pub name: String,
    pub intervals: usize,
    pub threshold: Option<f64>,
    pub total_true_profit: Option<f64>,
    pub total_energy_mwh: Option<f64>,
    pub total_output_units: Option<f64>,
    pub weighted_avg_price: Option<f64>,
    pub total_profit: Option<f64>,
    pub error: Option<String>,
}

/// Runs the same scenario over every source, in source order.
pub fn run_portfolio(base: &ScenarioConfig, sources: &[PortfolioSource]) -> Vec<PortfolioEntry> {
    info!(sources = sources.len(), "running portfolio");
    sources
        .par_iter()
        .map(|src| match run_scenario(base, &src.prices) {
            Ok(out) => PortfolioEntry {
                name: src.name.clone(),
                intervals: src.prices.len(),
                threshold: Some(out.threshold()),
                total_true_profit: Some(out.plant_kpis.total_true_profit),
                total_energy_mwh: Some(out.plant_kpis.total_energy_mwh),
                total_output_units: Some(out.plant_kpis.total_output_units),
                weighted_avg_price: out.plant_kpis.weighted_avg_price,
                total_profit: Some(out.total_profit()),
                error: None,
            },
            Err(e) => PortfolioEntry {
                name: src.name.clone(),
                intervals: src.prices.len(),
                threshold: None,
                total_true_profit: None,
                total_energy_mwh: None,
                total_output_units: None,
                weighted_avg_price: None,
                total_profit: None,
                error: Some(e.to_string()),
            },
        })
        .collect()
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

    #[test]
    fn range_values_are_inclusive() {
        let r: SweepRange = "10:30:10".parse().unwrap();
        assert_eq!(r.values(), vec![10.0, 20.0, 30.0]);
        let r: SweepRange = "0:1:0.1".parse().unwrap();
        assert_eq!(r.values().len(), 11);
        assert_eq!(r.values()[3], 0.3);
    }

    #[test]
    fn degenerate_ranges_yield_start() {
        let zero = SweepRange {
            start: 5.0,
            stop: 9.0,
            step: 0.0,
        };
        assert_eq!(zero.values(), vec![5.0]);
        let backwards = SweepRange {
            start: 5.0,
            stop: 1.0,
            step: 1.0,
        };
        assert_eq!(backwards.values(), vec![5.0]);
    }

    #[test]
    fn bad_ranges_are_rejected() {
        assert!(matches!(
            "1:2".parse::<SweepRange>(),
            Err(ParseSweepError::Shape(_))
        ));
        assert!(matches!(
            "1:x:2".parse::<SweepRange>(),
            Err(ParseSweepError::Number { .. })
        ));
    }

    #[test]
    fn quotient_rounding_keeps_stop() {
        let r: SweepRange = "0:0.3:0.1".parse().unwrap();
        assert_eq!(r.values(), vec![0.0, 0.1, 0.2, 0.3]);
    }

    #[test]
    fn oversized_range_is_rejected() {
        assert!(matches!(
            "0:1e12:1".parse::<SweepRange>(),
            Err(ParseSweepError::TooManyPoints { max, .. }) if max == MAX_AXIS_POINTS
        ));
        assert_eq!("0:999:1".parse::<SweepRange>().map(|r| r.len()), Ok(1000));
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let axis = |stop: f64| SweepAxis {
            param: SweepParam::MinLoadPct,
            range: SweepRange {
                start: 0.0,
                stop,
                step: 1.0,
            },
        };
        assert_eq!(check_grid(&axis(99.0), &axis(99.0)), Ok(10_000));
        assert!(matches!(
            check_grid(&axis(100.0), &axis(99.0)),
            Err(ParseSweepError::GridTooLarge { points: 10_100, .. })
        ));
    }

    #[test]
    fn params_parse_by_name() {
        assert_eq!("min-load".parse::<SweepParam>(), Ok(SweepParam::MinLoadPct));
        assert_eq!("break_even".parse::<SweepParam>(), Ok(SweepParam::BreakEven));
        assert!("colour".parse::<SweepParam>().is_err());
    }

    #[test]
    fn unknown_param_lists_choices() {
        let err = "colour".parse::<SweepParam>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown sweep parameter \"colour\", expected one of: \
             target-margin, min-load, capacity, ramp-limit, break-even"
        );
    }

    #[test]
    fn matrix_is_x_major_and_complete() {
        let x = SweepAxis {
            param: SweepParam::TargetMarginPct,
            range: SweepRange {
                start: 0.0,
                stop: 20.0,
                step: 10.0,
            },
        };
        let y = SweepAxis {
            param: SweepParam::CapacityMw,
            range: SweepRange {
                start: 10.0,
                stop: 20.0,
                step: 10.0,
            },
        };
        let pts = run_matrix(&ScenarioConfig::baseline(), &series(&[30.0, 60.0]), &x, &y);
        assert_eq!(pts.len(), 6);
        assert_eq!((pts[0].x, pts[0].y), (0.0, 10.0));
        assert_eq!((pts[1].x, pts[1].y), (0.0, 20.0));
        assert_eq!((pts[5].x, pts[5].y), (20.0, 20.0));
        assert!(pts.iter().all(|p| p.error.is_none()));
        // threshold = (1 - margin) * 50
        assert_eq!(pts[2].threshold, Some(45.0));
    }

    #[test]
    fn invalid_grid_points_carry_errors() {
        let x = SweepAxis {
            param: SweepParam::CapacityMw,
            range: SweepRange {
                start: 0.0,
                stop: 10.0,
                step: 10.0,
            },
        };
        let y = SweepAxis {
            param: SweepParam::RampLimit,
            range: SweepRange {
                start: 0.0,
                stop: 0.0,
                step: 0.0,
            },
        };
        let pts = run_matrix(&ScenarioConfig::baseline(), &series(&[60.0]), &x, &y);
        assert!(pts[0].error.is_some());
        assert_eq!(pts[0].total_profit, None);
        assert!(pts[1].error.is_none());
    }

    #[test]
    fn portfolio_keeps_source_order() {
        let sources = vec![
            PortfolioSource { name: "cheap".into(), prices: series(&[10.0; 4]) },
            PortfolioSource { name: "dear".into(), prices: series(&[90.0; 4]) },
        ];
        let rows = run_portfolio(&ScenarioConfig::baseline(), &sources);
        assert_eq!(rows[0].name, "cheap");
        assert_eq!(rows[1].name, "dear");
        // baseline plant idles at 2 MW when cheap and ramps when dear
        assert!(rows[1].total_energy_mwh > rows[0].total_energy_mwh);
    }
}
