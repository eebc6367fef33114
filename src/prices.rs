//! Quarter-hour price series and a synthetic price generator.

use std::f64::consts::PI;

use chrono::{NaiveDateTime, TimeDelta};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::error::PriceSeriesError;

/// Step length assumed when a series is too short to measure one.
pub const DEFAULT_STEP_HOURS: f64 = 0.25;

/// Number of quarter-hour intervals in a day.
pub const QUARTER_HOURS_PER_DAY: usize = 96;

/// One market price observation (currency per MWh).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: NaiveDateTime,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: NaiveDateTime, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// An ordered, uniformly spaced price series.
///
/// Construction checks that timestamps strictly increase, that every interval
/// has the same length, and that prices are finite. The interval length is
/// measured from the timestamps rather than assumed.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
    step_hours: f64,
}

impl Default for PriceSeries {
    fn default() -> Self {
        Self::empty()
    }
}

impl PriceSeries {
    /// Builds a series from already-ordered points.
    ///
    /// # Errors
    ///
    /// Returns a `PriceSeriesError` if timestamps are not strictly increasing,
    /// spacing is irregular, or any price is NaN/infinite.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, PriceSeriesError> {
        if let Some(index) = points.iter().position(|p| !p.price.is_finite()) {
            return Err(PriceSeriesError::NonFinitePrice { index });
        }

        let mut expected_secs = None;
        for (index, pair) in points.windows(2).enumerate() {
            let (previous, current) = (pair[0].timestamp, pair[1].timestamp);
            let secs = (current - previous).num_seconds();
            if secs <= 0 {
                return Err(PriceSeriesError::NotIncreasing {
                    index: index + 1,
                    previous,
                    current,
                });
            }
            match expected_secs {
                None => expected_secs = Some(secs),
                Some(expected) if expected != secs => {
                    return Err(PriceSeriesError::IrregularStep {
                        index: index + 1,
                        expected_secs: expected,
                        found_secs: secs,
                    });
                }
                Some(_) => {}
            }
        }

        let step_hours = expected_secs.map_or(DEFAULT_STEP_HOURS, |secs| secs as f64 / 3600.0);
        Ok(Self { points, step_hours })
    }

    /// Builds a uniformly spaced series starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns a `PriceSeriesError` if `step` is not positive or a price is not finite.
    pub fn from_prices(
        start: NaiveDateTime,
        step: TimeDelta,
        prices: &[f64],
    ) -> Result<Self, PriceSeriesError> {
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint::new(start + step * i as i32, p))
            .collect();
        Self::new(points)
    }

    /// A series with no points.
    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            step_hours: DEFAULT_STEP_HOURS,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PricePoint> {
        self.points.iter()
    }

    /// Prices in order, without timestamps.
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Length of one interval in hours.
    pub fn step_hours(&self) -> f64 {
        self.step_hours
    }

    /// Hours covered by the whole series.
    pub fn total_hours(&self) -> f64 {
        self.step_hours * self.points.len() as f64
    }
}

impl<'a> IntoIterator for &'a PriceSeries {
    type Item = &'a PricePoint;
    type IntoIter = std::slice::Iter<'a, PricePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Generates a deterministic quarter-hour price series for demos and tests.
///
/// Prices follow a daily shape with a morning and an evening peak, a midday
/// solar dip that can go negative, and Gaussian noise drawn from a seeded RNG.
pub fn synthetic(days: usize, start: NaiveDateTime, seed: u64) -> PriceSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = days * QUARTER_HOURS_PER_DAY;
    let step = TimeDelta::minutes(15);

    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        let hour = (i % QUARTER_HOURS_PER_DAY) as f64 / 4.0;
        let daily = -25.0 * (2.0 * PI * (hour - 13.0) / 24.0).cos();
        let evening = 30.0 * (-((hour - 19.0) / 2.0).powi(2)).exp();
        let solar = -45.0 * (-((hour - 13.0) / 2.5).powi(2)).exp();
        let price = 75.0 + daily + evening + solar + gaussian_noise(&mut rng, 12.0);
        let rounded = (price * 100.0).round() / 100.0;
        points.push(PricePoint::new(start + step * i as i32, rounded));
    }

    // Uniform by construction.
    PriceSeries {
        points,
        step_hours: DEFAULT_STEP_HOURS,
    }
}

/// Gaussian noise via the Box-Muller transform.
///
/// Returns zero when `std_dev` is not positive.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    z0 * std_dev
}
