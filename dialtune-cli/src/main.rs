//! # dialtune - Terminal Tuner
//!
//! Command-line front-end for the dial tuner. It listens to the microphone
//! (or a simulated pitch feed), maps every detected pitch to the nearest
//! note and draws a tuning dial in the terminal.
//!
//! ## Architecture
//! - **Main Thread**: argument parsing, rendering
//! - **Listener Thread**: pitch feed and note mapping (see `dialtune_core::listener`)
//! - **Communication**: crossbeam channel of `TuningResult`s

mod logging;
mod ui;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dialtune_core::{
    Listener, PitchSource, ReferenceTable, TunerConfig, TuningResult,
    audio::MicrophoneSource,
    config,
    simulation::SimulatedSource,
};
use log::info;

#[derive(Parser)]
#[command(name = "dialtune")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// First octave of the reference table
    #[arg(long, global = true, allow_negative_numbers = true)]
    start_octave: Option<i32>,

    /// Last octave of the reference table
    #[arg(long, global = true, allow_negative_numbers = true)]
    end_octave: Option<i32>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Tune against the default microphone
    Listen {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Tune against random pitches, without audio
    Simulate {
        /// Seed for the random pitch feed (random when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Delay between simulated pitches in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the reference note table
    Table {
        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Clone, Copy)]
struct OutputArgs {
    /// Stop after this many results
    #[arg(long)]
    count: Option<usize>,

    /// Print one JSON result per line instead of the dial
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let mut tuner_config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => TunerConfig::default(),
    };
    if let Some(start) = cli.start_octave {
        tuner_config.start_octave = start;
    }
    if let Some(end) = cli.end_octave {
        tuner_config.end_octave = end;
    }
    tuner_config.validate()?;

    let table = tuner_config.reference_table();

    match cli.command {
        Commands::Listen { output } => {
            let capture_config = tuner_config.clone();
            run_tuner(move || MicrophoneSource::open(&capture_config), table, output)
        }
        Commands::Simulate {
            seed,
            interval_ms,
            output,
        } => {
            let seed = seed.unwrap_or_else(rand::random);
            if let Some(ms) = interval_ms {
                tuner_config.simulation_interval_ms = ms;
            }
            info!("Simulating with seed {seed}");
            let interval = tuner_config.simulation_interval();
            run_tuner(move || Ok(SimulatedSource::seeded(seed, interval)), table, output)
        }
        Commands::Table { json } => print_table(&table, json),
    }
}

/// Starts the listener and renders results until the feed ends or `count` is reached.
fn run_tuner<F, S>(make_source: F, table: ReferenceTable, output: OutputArgs) -> Result<()>
where
    F: FnOnce() -> Result<S> + Send + 'static,
    S: PitchSource,
{
    let (result_tx, result_rx) = crossbeam_channel::unbounded::<TuningResult>();
    let listener = Listener::start(make_source, Arc::new(table), result_tx)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut shown = 0usize;

    // Filtered pitches never arrive, so the last line stays on screen.
    for result in result_rx.iter() {
        if output.json {
            let line = serde_json::to_string(&result).context("serializing result")?;
            writeln!(out, "{line}")?;
        } else {
            write!(out, "\r{}", ui::readout::render_line(&result))?;
        }
        out.flush()?;

        shown += 1;
        if output.count.is_some_and(|count| shown >= count) {
            break;
        }
    }

    if !output.json {
        writeln!(out)?;
    }
    listener.stop();
    Ok(())
}

fn print_table(table: &ReferenceTable, json: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        let text = serde_json::to_string_pretty(table.notes()).context("serializing table")?;
        writeln!(out, "{text}")?;
        return Ok(());
    }

    let octaves = table.octave_range();
    writeln!(
        out,
        "{} notes, octaves {} to {}",
        table.len(),
        octaves.start(),
        octaves.end()
    )?;
    for entry in table {
        writeln!(
            out,
            "{:<4} {:>10.3} Hz",
            format!("{}{}", entry.note, entry.octave),
            entry.frequency
        )?;
    }
    Ok(())
}
