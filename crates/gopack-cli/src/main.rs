#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;

use commands::run::RunAction;

#[derive(Parser, Debug)]
#[command(name = "gopack")]
#[command(author, version, about = "Link resolution for compiled component output", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the project root (the directory holding node_modules)
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Run link resolution over a build output directory
    Run {
        /// Build output directory containing spa/ejected/main.js
        build_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    logging::init(cli.verbose, cli.json);

    match cli.command {
        Some(Commands::Run { build_dir }) => {
            commands::run::run(RunAction { build_dir, cwd }, cli.json)
        }
        Some(Commands::Version) | None => commands::version::run(),
    }
}
