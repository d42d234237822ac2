use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Declare scheduled tasks with standard identity, defaults and alarms
#[derive(Parser)]
#[command(name = "gucdk")]
#[command(version)]
#[command(about = "Declare scheduled tasks with standard identity, defaults and alarms", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compose the configured scheduled task and print its declaration as JSON
    Synth {
        /// Path to configuration file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Write the declaration to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Overwrite the output file without prompting
        #[arg(long)]
        force: bool,

        /// Log level: trace, debug, info, warn, error
        #[arg(short = 'v', long, value_name = "LEVEL")]
        log_level: Option<String>,
    },

    /// Show the memory size and timeout a runtime defaults to
    Defaults {
        /// Runtime name, e.g. nodejs14.x or java11
        #[arg(short, long)]
        runtime: String,
    },
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Command::Synth {
                config,
                output,
                force,
                log_level,
            } => gucdk::synth::run(gucdk::SynthArgs {
                config,
                output,
                force,
                log_level,
            }),
            Command::Defaults { runtime } => gucdk::defaults::run(&runtime),
        }
    }
}

fn main() -> Result<()> {
    Cli::parse().command.run()
}
