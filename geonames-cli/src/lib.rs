//! Command-line interface for seeding and updating a Geonames store.
#![forbid(unsafe_code)]

use std::io::{self, Write};

use clap::{Parser, Subcommand};

mod config;
mod error;
mod run;

pub use error::CliError;

use config::{SeedArgs, UpdateArgs};

const ARG_DATE: &str = "date";
const ARG_SOURCE: &str = "source";
const ARG_WORKING_DIR: &str = "working-dir";

const DEFAULT_DATABASE: &str = "geonames.sqlite";
const DEFAULT_WORKING_DIR: &str = "geonames-downloads";

/// Run the Geonames CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = io::stdout().lock();
    dispatch(cli.command, &mut stdout)
}

fn dispatch(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Seed(args) => run::run_seed(args, writer),
        Command::Update(args) => run::run_update(args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "geonames",
    about = "Seed and incrementally update a Geonames store",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Populate the store from the bulk dumps.
    Seed(SeedArgs),
    /// Apply one day's modification and deletion deltas.
    Update(UpdateArgs),
}

#[cfg(test)]
mod tests;
