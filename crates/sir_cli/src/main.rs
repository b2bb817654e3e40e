mod logging;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};
use serde::Serialize;
use sir_core::reporter::PlotData;
use sir_core::simulation::Comparison;
use sir_core::{compare, run_all, Report, SimulationConfig};
use std::fs;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "sir")]
#[command(about = "Integrates the SIR model with forward Euler at several step sizes and compares them")]
struct Cli {
    /// JSON configuration file; missing fields take their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Step size to run (repeatable); replaces the configured list
    #[arg(short = 'H', long = "step-size", value_name = "H")]
    step_sizes: Vec<f64>,

    /// End of the time horizon
    #[arg(long)]
    t_end: Option<f64>,

    /// Transmission index n (λ = 1 - 0.1 n with the default calibration)
    #[arg(short = 'n', long)]
    transmission_index: Option<u32>,

    /// Removal index m (μ = 0.1 + 0.005 m with the default calibration)
    #[arg(short = 'm', long)]
    removal_index: Option<u32>,

    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Write the plot series of every run to this file as JSON
    #[arg(long, value_name = "FILE")]
    plot_data: Option<PathBuf>,

    #[arg(long, default_value = "warn")]
    log_level: LevelFilter,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    reports: &'a [Report],
    comparisons: &'a [Comparison],
}

fn load_config(cli: &Cli) -> Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            SimulationConfig::from_json(&text)?
        }
        None => SimulationConfig::default(),
    };
    if !cli.step_sizes.is_empty() {
        config.step_sizes = cli.step_sizes.clone();
    }
    if let Some(t_end) = cli.t_end {
        config.horizon.t_end = t_end;
    }
    if let Some(n) = cli.transmission_index {
        config.transmission_index = n;
    }
    if let Some(m) = cli.removal_index {
        config.removal_index = m;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level)?;

    let config = load_config(&cli)?;
    let reports = run_all(&config).context("Simulation failed.")?;
    let comparisons = reports
        .iter()
        .skip(1)
        .map(|other| compare(&reports[0], other, &config.checkpoints))
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to compare runs.")?;

    match cli.format {
        OutputFormat::Table => {
            for report in &reports {
                println!("{}", render::checkpoint_table(report)?);
            }
            print!("{}", render::comparison_table(&reports, &comparisons)?);
        }
        OutputFormat::Json => {
            let output = JsonOutput {
                reports: &reports,
                comparisons: &comparisons,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    if let Some(path) = &cli.plot_data {
        let plots: Vec<&PlotData> = reports.iter().map(|report| &report.plot).collect();
        fs::write(path, serde_json::to_string(&plots)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote plot data to {}", path.display());
    }

    Ok(())
}
