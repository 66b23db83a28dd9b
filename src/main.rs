//! lf-rate entry point: CLI wiring and config-driven sweep.

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{error, info, warn};

use lf_rate::cli::Args;
use lf_rate::config::ScenarioConfig;
use lf_rate::engine::{SweepSummary, comprehensive_breakdown, run_sweep};
use lf_rate::io::export::{export_breakdown_csv, export_rows_csv};

fn load_scenario(args: &Args) -> Result<ScenarioConfig> {
    let mut scenario = match &args.scenario {
        Some(path) => ScenarioConfig::from_toml_file(path)?,
        None => ScenarioConfig::from_preset(&args.preset)?,
    };
    if let Some(year) = args.reference_year {
        scenario.calculation.reference_year = year;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("{e}");
        }
        bail!("scenario has {} configuration error(s)", errors.len());
    }
    Ok(scenario)
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .init();

    let scenario = load_scenario(&args)?;
    let inputs = scenario.to_inputs()?;
    let mode = args.mode();
    info!(tariff = %inputs.tariff.name, ?mode, "running sweep");

    let result = run_sweep(mode, &inputs)?;
    for notice in &result.notices {
        warn!("{notice}");
    }

    for row in &result.rows {
        println!("{row}");
    }
    println!("\n{}", SweepSummary::from_result(&result));

    if let Some(path) = &args.csv_out {
        export_rows_csv(&result.rows, path)
            .with_context(|| format!("failed to write CSV to {}", path.display()))?;
        info!(path = %path.display(), "sweep rows written");
    }
    if let Some(path) = &args.breakdown_out {
        let table = comprehensive_breakdown(&result, &inputs);
        export_breakdown_csv(&table, path)
            .with_context(|| format!("failed to write breakdown to {}", path.display()))?;
        info!(path = %path.display(), "breakdown written");
    }

    Ok(())
}
