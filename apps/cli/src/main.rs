//! datacatalog CLI: rebuilds the dataset catalog for a data directory.
//!
//! Scans CSV datasets and their `.meta.json` sidecars and writes a single
//! `catalog.json` describing all of them.

mod commands;

use std::process::ExitCode;

use clap::Parser;

use commands::Cli;

fn main() -> ExitCode {
    if let Err(err) = color_eyre::install() {
        eprintln!("Error: {err}");
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();
    commands::init_tracing(&cli);

    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
