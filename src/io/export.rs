//! CSV and JSON export for simulation results.
//!
//! Every writer produces deterministic output for identical inputs.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::ExportError;
use crate::runner::ScenarioOutcome;
use crate::sim::kpi::{KpiSummary, KpiValue};
use crate::sim::sweep::{PortfolioEntry, SweepPoint};
use crate::sim::tolling::TollingRecord;
use crate::sim::types::{BatteryRecord, DispatchRecord};

/// A record type with a fixed CSV column layout.
pub trait CsvRow {
    /// Column names, in field order.
    const HEADER: &'static [&'static str];

    /// Formatted cells, one per header column.
    fn fields(&self) -> Vec<String>;
}

fn ts(t: &NaiveDateTime) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn num(v: f64) -> String {
    format!("{v:.4}")
}

fn opt(v: Option<f64>) -> String {
    v.map(num).unwrap_or_default()
}

impl CsvRow for DispatchRecord {
    const HEADER: &'static [&'static str] = &[
        "timestamp",
        "price",
        "dispatch_mw",
        "energy_mwh",
        "power_cost",
        "output_units",
        "revenue",
        "co2_cost",
        "opex_misc",
        "true_profit",
        "proxy_profit",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            ts(&self.timestamp),
            num(self.price),
            num(self.dispatch_mw),
            num(self.energy_mwh),
            num(self.power_cost),
            num(self.output_units),
            num(self.revenue),
            num(self.co2_cost),
            num(self.opex_misc),
            num(self.true_profit),
            num(self.proxy_profit),
        ]
    }
}

impl CsvRow for BatteryRecord {
    const HEADER: &'static [&'static str] = &[
        "timestamp",
        "price",
        "charge_mw",
        "discharge_mw",
        "self_supply_mw",
        "soc_mwh",
        "soc_fraction",
        "cost",
        "revenue",
        "savings",
        "degradation_cost",
        "profit",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            ts(&self.timestamp),
            num(self.price),
            num(self.charge_mw),
            num(self.discharge_mw),
            num(self.self_supply_mw),
            num(self.soc_mwh),
            num(self.soc_fraction),
            num(self.cost),
            num(self.revenue),
            num(self.savings),
            num(self.degradation_cost),
            num(self.profit),
        ]
    }
}

impl CsvRow for TollingRecord {
    const HEADER: &'static [&'static str] = &[
        "timestamp",
        "price",
        "energy_mwh",
        "capacity_revenue",
        "variable_revenue",
        "power_cost",
        "other_variable_cost",
        "pct_costs",
        "profit",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            ts(&self.timestamp),
            num(self.price),
            num(self.energy_mwh),
            num(self.capacity_revenue),
            num(self.variable_revenue),
            num(self.power_cost),
            num(self.other_variable_cost),
            num(self.pct_costs),
            num(self.profit),
        ]
    }
}

impl CsvRow for SweepPoint {
    const HEADER: &'static [&'static str] = &[
        "x",
        "y",
        "threshold",
        "total_true_profit",
        "total_energy_mwh",
        "total_profit",
        "error",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            num(self.x),
            num(self.y),
            opt(self.threshold),
            opt(self.total_true_profit),
            opt(self.total_energy_mwh),
            opt(self.total_profit),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

impl CsvRow for PortfolioEntry {
    const HEADER: &'static [&'static str] = &[
        "name",
        "intervals",
        "threshold",
        "total_true_profit",
        "total_energy_mwh",
        "total_output_units",
        "weighted_avg_price",
        "total_profit",
        "error",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.intervals.to_string(),
            opt(self.threshold),
            opt(self.total_true_profit),
            opt(self.total_energy_mwh),
            opt(self.total_output_units),
            opt(self.weighted_avg_price),
            opt(self.total_profit),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

/// Writes a header row followed by one row per record.
///
/// # Errors
///
/// Returns an `ExportError` if writing fails.
pub fn write_rows<R: CsvRow>(rows: &[R], writer: impl Write) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(R::HEADER)?;
    for r in rows {
        wtr.write_record(r.fields())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes records as CSV to the file at `path`.
///
/// # Errors
///
/// Returns an `ExportError` if file creation or writing fails.
pub fn export_rows<R: CsvRow>(rows: &[R], path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_rows(rows, io::BufWriter::new(file))
}

/// Writes the KPI summary as one flat JSON object.
///
/// # Errors
///
/// Returns an `ExportError` if serialization or writing fails.
pub fn write_kpis_json(summary: &KpiSummary, mut writer: impl Write) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writeln!(writer)?;
    Ok(())
}

/// Writes the KPI summary as `metric,value` rows. Undefined values are empty.
///
/// # Errors
///
/// Returns an `ExportError` if writing fails.
pub fn write_kpis_csv(summary: &KpiSummary, writer: impl Write) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(["metric", "value"])?;
    for (key, value) in summary.iter() {
        let cell = match value {
            KpiValue::Missing => String::new(),
            other => other.to_string(),
        };
        wtr.write_record([key, cell.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Files written by [`export_outcome`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportedFiles {
    pub paths: Vec<PathBuf>,
}

/// Writes a full scenario outcome into `dir`: `dispatch.csv`, `kpis.json`,
/// `kpis.csv`, plus `battery.csv` and `tolling.csv` when those ran.
///
/// # Errors
///
/// Returns an `ExportError` if the directory or any file cannot be written.
pub fn export_outcome(outcome: &ScenarioOutcome, dir: &Path) -> Result<ExportedFiles, ExportError> {
    fs::create_dir_all(dir)?;
    let mut written = ExportedFiles::default();

    let path = dir.join("dispatch.csv");
    export_rows(&outcome.dispatch, &path)?;
    written.paths.push(path);

    if !outcome.battery.records.is_empty() {
        let path = dir.join("battery.csv");
        export_rows(&outcome.battery.records, &path)?;
        written.paths.push(path);
    }
    if !outcome.tolling.records.is_empty() {
        let path = dir.join("tolling.csv");
        export_rows(&outcome.tolling.records, &path)?;
        written.paths.push(path);
    }

    let summary = outcome.summary();
    let path = dir.join("kpis.json");
    write_kpis_json(&summary, io::BufWriter::new(File::create(&path)?))?;
    written.paths.push(path);

    let path = dir.join("kpis.csv");
    write_kpis_csv(&summary, io::BufWriter::new(File::create(&path)?))?;
    written.paths.push(path);

    Ok(written)
}
