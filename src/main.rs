//! Accident Charts - Traffic Accident Data Shaping & Static Chart Generator
//!
//! Command line entry point.

use accident_charts::cli::{self, Cli};
use clap::Parser;
use log::LevelFilter;

fn init_logger(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };

    // RUST_LOG, when set, takes precedence over the default level.
    pretty_env_logger::formatted_builder()
        .filter_level(default_level)
        .parse_env("RUST_LOG")
        .try_init()
        .ok();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    cli::run(cli)
}
