//! Command Line Interface
//! Argument parsing and the `plot` / `tables` commands.

use crate::aggregate::SURFACE_CONDITIONS;
use crate::charts::{ChartKind, ChartOutput, ChartPipeline, StaticChartRenderer};
use crate::config::AppConfig;
use crate::data::AccidentLoader;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "accident_charts",
    version,
    about = "Charts of traffic accident consequences, causes and road conditions"
)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Accident CSV file, overrides the configured path
    #[arg(short, long, global = true)]
    pub data: Option<PathBuf>,

    /// Report table sizes while loading
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render charts to PNG files
    Plot {
        /// Directory for the images, overrides the configured one
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Open each image with the system viewer
        #[arg(long)]
        show: bool,

        /// Skip writing to the output directory; with --show the images go to
        /// the temp directory
        #[arg(long)]
        no_save: bool,

        #[arg(long, value_enum, default_value_t = ChartKind::All)]
        chart: ChartKind,
    },
    /// Print the shaped chart tables as JSON
    Tables {
        #[arg(long, value_enum, default_value_t = ChartKind::All)]
        chart: ChartKind,
    },
}

/// Config from `config` (or defaults) with the data path override applied.
pub fn resolve_config(config: Option<&Path>, data: Option<&Path>) -> Result<AppConfig> {
    let mut resolved = match config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(data) = data {
        resolved.data.path = data.to_path_buf();
    }
    Ok(resolved)
}

/// Read and normalize the configured dataset.
pub fn load_dataset(config: &AppConfig, verbose: bool) -> Result<DataFrame> {
    let loader = AccidentLoader::new(config.separator_byte()?);
    let df = loader
        .load(&config.data.path, verbose)
        .with_context(|| format!("Failed to load {}", config.data.path.display()))?;
    info!("Loaded {} accidents", df.height());
    Ok(df)
}

/// Render the requested charts; returns the written image paths.
///
/// Without `save` nothing lands in the output directory. Charts are then only
/// drawn when `show` is set.
pub fn cmd_plot(
    config: &AppConfig,
    df: &DataFrame,
    chart: ChartKind,
    save: bool,
    show: bool,
) -> Result<Vec<PathBuf>> {
    let output = &config.output;
    let output_for = |path: PathBuf| ChartOutput::new(save.then_some(path), show);
    let mut written = Vec::new();

    if chart.includes(ChartKind::Consequences) {
        let summaries = ChartPipeline::consequences(df)?;
        let target = output_for(output.consequences_path());
        written.extend(StaticChartRenderer::render_consequences(&summaries, &target)?);
    }

    if chart.includes(ChartKind::Damage) {
        let panels = ChartPipeline::damage(df, &config.regions)?;
        let target = output_for(output.damage_path());
        written.extend(StaticChartRenderer::render_damage(&panels, &target)?);
    }

    if chart.includes(ChartKind::Surface) {
        let panels = ChartPipeline::surface(df, &config.regions)?;
        let target = output_for(output.surface_path());
        written.extend(StaticChartRenderer::render_surface(
            &panels,
            &SURFACE_CONDITIONS.labels(),
            &target,
        )?);
    }

    Ok(written)
}

/// Shaped tables for `chart` as pretty-printed JSON.
pub fn cmd_tables(config: &AppConfig, df: &DataFrame, chart: ChartKind) -> Result<String> {
    let tables = ChartPipeline::tables(df, &config.regions, chart)?;
    Ok(serde_json::to_string_pretty(&tables)?)
}

pub fn run(cli: Cli) -> Result<()> {
    let mut config = resolve_config(cli.config.as_deref(), cli.data.as_deref())?;

    match cli.command {
        Command::Plot {
            output_dir,
            show,
            no_save,
            chart,
        } => {
            if let Some(dir) = output_dir {
                config.output.dir = dir;
            }
            let df = load_dataset(&config, cli.verbose)?;
            for path in cmd_plot(&config, &df, chart, !no_save, show)? {
                println!("{}", path.display());
            }
        }
        Command::Tables { chart } => {
            let df = load_dataset(&config, cli.verbose)?;
            println!("{}", cmd_tables(&config, &df, chart)?);
        }
    }

    Ok(())
}
