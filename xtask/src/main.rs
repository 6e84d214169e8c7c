// Desktop/tooling crate: unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod check;
mod doc;
mod sim;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "CRI Quickstart development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check host and target builds, clippy and formatting
    Check,
    /// Run all tests (unit, integration and doc)
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
    /// Build API docs for platform and firmware (mocks included)
    Doc {
        /// Open documentation in browser
        #[arg(long)]
        open: bool,
        /// Include private items
        #[arg(long)]
        private: bool,
    },
    /// Run the desktop simulator
    Sim {
        /// How long to run, in seconds
        #[arg(long, default_value_t = 30)]
        seconds: u64,
        /// Stop one monitored task's loop to watch the watchdog trip
        #[arg(long, value_parser = ["io", "util"])]
        stall: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
        Commands::Doc { open, private } => doc::run(open, private),
        Commands::Sim { seconds, stall } => sim::run(seconds, stall.as_deref()),
    }
}
