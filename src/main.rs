//! Dispatch simulator entry point: CLI wiring, scenario loading and output.

use std::io::{self, BufWriter};
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use tracing::info;

use dispatch_sim::cli::{
    Cli, Command, PortfolioArgs, PriceSource, RunArgs, ScenarioSource, SweepArgs,
};
use dispatch_sim::config::ScenarioConfig;
use dispatch_sim::io::export::{CsvRow, export_outcome, export_rows, write_rows};
use dispatch_sim::io::prices::read_prices_csv;
use dispatch_sim::logging;
use dispatch_sim::prices::{self, PriceSeries};
use dispatch_sim::runner::run_scenario;
use dispatch_sim::sim::sweep::{PortfolioSource, SweepAxis, check_grid, run_matrix, run_portfolio};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Run(args) => run(args),
        Command::Sweep(args) => sweep(args),
        Command::Portfolio(args) => portfolio(args),
    }
}

/// Loads the scenario: `--scenario` file, else `--preset`, else baseline.
fn load_scenario(src: &ScenarioSource) -> Result<ScenarioConfig> {
    let scenario = if let Some(path) = &src.scenario {
        ScenarioConfig::from_toml_file(path)?
    } else if let Some(name) = &src.preset {
        ScenarioConfig::from_preset(name)?
    } else {
        ScenarioConfig::baseline()
    };

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("scenario has {} invalid field(s)", errors.len());
    }
    Ok(scenario)
}

fn synthetic_start() -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid synthetic start date")
}

fn load_prices(src: &PriceSource, seed: u64) -> Result<PriceSeries> {
    match (&src.prices, src.synthetic_days) {
        (Some(path), _) => read_prices_csv(path)
            .with_context(|| format!("cannot load prices from \"{}\"", path.display())),
        (None, Some(days)) => {
            info!(days, seed, "generating synthetic prices");
            Ok(prices::synthetic(days, synthetic_start()?, seed))
        }
        (None, None) => bail!("either --prices or --synthetic-days is required"),
    }
}

fn print_rows<R: CsvRow>(rows: &[R], out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            export_rows(rows, path)
                .with_context(|| format!("cannot write \"{}\"", path.display()))?;
            eprintln!("Written to {}", path.display());
        }
        None => write_rows(rows, BufWriter::new(io::stdout().lock()))?,
    }
    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    let scenario = load_scenario(&args.scenario)?;
    let prices = load_prices(&args.prices, args.seed)?;
    let outcome = run_scenario(&scenario, &prices)?;

    if args.show_intervals {
        for r in &outcome.dispatch {
            println!("{r}");
        }
        for r in &outcome.battery.records {
            println!("{r}");
        }
        println!();
    }
    println!("{}", outcome.summary());

    if let Some(dir) = &args.out_dir {
        let files = export_outcome(&outcome, dir)
            .with_context(|| format!("cannot write results to \"{}\"", dir.display()))?;
        for path in &files.paths {
            eprintln!("Written {}", path.display());
        }
    }
    Ok(())
}

fn sweep(args: SweepArgs) -> Result<()> {
    let scenario = load_scenario(&args.scenario)?;
    let prices = load_prices(&args.prices, args.seed)?;
    let x = SweepAxis {
        param: args.x,
        range: args.x_range,
    };
    let y = SweepAxis {
        param: args.y,
        range: args.y_range,
    };
    check_grid(&x, &y)?;
    let points = run_matrix(&scenario, &prices, &x, &y);
    print_rows(&points, args.out.as_deref())
}

fn portfolio(args: PortfolioArgs) -> Result<()> {
    let scenario = load_scenario(&args.scenario)?;
    let sources = args
        .files
        .iter()
        .map(|path| {
            let prices = read_prices_csv(path)
                .with_context(|| format!("cannot load prices from \"{}\"", path.display()))?;
            let name = match path.file_name() {
                Some(n) => n.to_string_lossy().into_owned(),
                None => path.display().to_string(),
            };
            Ok(PortfolioSource { name, prices })
        })
        .collect::<Result<Vec<_>>>()?;

    let rows = run_portfolio(&scenario, &sources);
    print_rows(&rows, args.out.as_deref())
}
