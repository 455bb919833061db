//! `curbwatch` CLI: analyze detection logs for illegal parking and street
//! crowding, synthesize scenarios, batch runs.
//!
//! stdout carries exactly one JSON document per run (summary or error);
//! logs go to stderr.

mod annotate;
mod args;
mod error;
mod report;
mod run;

use args::{ThresholdArgs, ZoneArgs};
use clap::{Parser, Subcommand};
use error::FatalError;
use report::RunSummary;
use serde::Serialize;
use sim::scenarios::ScenarioKind;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "curbwatch", about = "Illegal parking and street crowding detection")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a recorded detection log.
    Analyze {
        /// Detection log JSON file
        #[arg(long)]
        input: PathBuf,
        /// Annotation log (JSON lines, one record per frame)
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        zones: ZoneArgs,
        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
    /// Synthesize a named scenario and analyze it.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Annotation log (JSON lines)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also save the synthesized detection log
        #[arg(long)]
        save_replay: Option<PathBuf>,
        /// Write the scenario's zone files into this directory
        #[arg(long)]
        export_zones: Option<PathBuf>,
        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
    /// Analyze several independent logs in parallel, one summary per line.
    Batch {
        #[arg(long, num_args = 1.., required = true)]
        inputs: Vec<PathBuf>,
        /// Directory receiving one annotation log per input
        #[arg(long)]
        output_dir: PathBuf,
        #[command(flatten)]
        zones: ZoneArgs,
        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    ExitCode::from(execute(cli.command))
}

fn execute(command: Commands) -> u8 {
    match command {
        Commands::Analyze {
            input,
            output,
            zones,
            thresholds,
        } => emit(thresholds.to_config().and_then(|config| {
            run::analyze_file(&input, Some(&output), run::load_zones(&zones), config)
        })),
        Commands::RunScenario {
            scenario,
            seed,
            output,
            save_replay,
            export_zones,
            thresholds,
        } => emit(thresholds.to_config().and_then(|config| {
            let options = run::ScenarioRun {
                output: output.as_deref(),
                save_replay: save_replay.as_deref(),
                export_zones: export_zones.as_deref(),
            };
            run::run_scenario(scenario, seed, options, config)
        })),
        Commands::Batch {
            inputs,
            output_dir,
            zones,
            thresholds,
        } => {
            let results = thresholds.to_config().and_then(|config| {
                run::analyze_batch(&inputs, &output_dir, &run::load_zones(&zones), &config)
            });
            match results {
                // first failing run decides the exit code
                Ok(results) => results
                    .into_iter()
                    .map(emit)
                    .fold(0, |code, c| if code == 0 { c } else { code }),
                Err(err) => emit(Err(err)),
            }
        }
    }
}

/// Print the run's document to stdout and return its exit code.
fn emit(result: Result<RunSummary, FatalError>) -> u8 {
    match result {
        Ok(summary) => {
            print_json(&summary);
            0
        }
        Err(err) => {
            tracing::error!(reason = err.reason(), "{}", err.details());
            print_json(&err.document());
            err.exit_code()
        }
    }
}

fn print_json<T: Serialize>(doc: &T) {
    match serde_json::to_string(doc) {
        Ok(line) => println!("{line}"),
        Err(err) => tracing::error!(%err, "cannot serialize output document"),
    }
}
