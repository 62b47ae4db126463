#![deny(missing_docs)]

//! # Contract Assert CLI
//!
//! Command Line Interface over the contract assertion engine.
//!
//! Supported Commands:
//! - `check`: Asserts recorded request/response exchanges against a document.
//! - `inspect`: Prints the rules resolved for one operation.

use crate::error::CliResult;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod check;
mod error;
mod exchange;
mod inspect;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Swagger contract assertions")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assert recorded exchanges against the contract.
    Check(check::CheckArgs),
    /// Show the contract rules for one operation.
    Inspect(inspect::InspectArgs),
}

fn main() -> CliResult<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Check(args) => check::execute(args)?,
        Commands::Inspect(args) => inspect::execute(args)?,
    }

    Ok(())
}
