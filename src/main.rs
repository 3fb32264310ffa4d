//! tickstat
//!
//! Interval timing analyzer for serial-connected clock sources: MIDI clock
//! generators, DIN sync boxes, metronomes, bare pulse generators. The device
//! under test prints one decimal timestamp (microsecond ticks) per pulse;
//! tickstat turns those into interval statistics and a tempo readout.
//!
//! # Usage
//!
//! ```bash
//! # Live dashboard from a serial port (requires serial feature)
//! tickstat monitor -p /dev/ttyUSB0
//!
//! # Pin a bench setup in a config file, override the port ad hoc
//! tickstat monitor -c rig.toml -p /dev/ttyACM0
//!
//! # Analyze a captured timestamp file and chart the intervals
//! tickstat analyze readings_300bpm.txt --plot intervals.png
//!
//! # List serial ports / built-in clock source profiles
//! tickstat ports
//! tickstat sources
//! ```

mod analyze;
mod buffer;
mod config;
#[cfg(feature = "serial")]
mod monitor;
mod plot;
#[cfg(feature = "serial")]
mod serial;
#[cfg(feature = "serial")]
mod shutdown;
mod sources;
mod stats;
mod ticker;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

/// Interval timing analyzer for serial clock sources
#[derive(Parser)]
#[command(name = "tickstat")]
#[command(version)]
#[command(about = "Interval timing analyzer for serial-connected clock sources")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug-level logging)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Live-monitor pulse timing from a serial port
    #[cfg(feature = "serial")]
    Monitor {
        /// Serial port path (e.g., /dev/ttyUSB0)
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate (default: the clock source profile's)
        #[arg(short, long)]
        baud: Option<u32>,

        /// Rolling window size in intervals
        #[arg(long)]
        capacity: Option<usize>,

        /// Dashboard refresh period in milliseconds
        #[arg(long)]
        refresh_ms: Option<u64>,

        /// Clock source profile (see `tickstat sources`)
        #[arg(short, long)]
        source: Option<String>,

        /// Ticks per beat (overrides the profile)
        #[arg(short, long)]
        ticks_per_beat: Option<u32>,

        /// TOML config file with the same fields as the flags above
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Analyze a captured timestamp file
    Analyze {
        /// Whitespace/newline-delimited file of decimal timestamps
        file: PathBuf,

        /// Clock source profile (see `tickstat sources`)
        #[arg(short, long)]
        source: Option<String>,

        /// Ticks per beat (overrides the profile)
        #[arg(short, long)]
        ticks_per_beat: Option<u32>,

        /// Write a PNG chart of the interval sequence to this path
        #[arg(long)]
        plot: Option<PathBuf>,
    },

    /// List available serial ports
    #[cfg(feature = "serial")]
    Ports,

    /// List built-in clock source profiles
    Sources,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        #[cfg(feature = "serial")]
        Commands::Monitor {
            port,
            baud,
            capacity,
            refresh_ms,
            source,
            ticks_per_beat,
            config,
        } => {
            let file = match config {
                Some(ref path) => config::ConfigFile::load(path)?,
                None => config::ConfigFile::default(),
            };
            let overrides = config::MonitorOverrides {
                port,
                baud,
                capacity,
                refresh_ms,
                source,
                ticks_per_beat,
            };
            let options = config::resolve(overrides, file)?;
            monitor::LiveMonitor::new(options).run()
        }

        Commands::Analyze {
            file,
            source,
            ticks_per_beat,
            plot,
        } => {
            let (source, ticks_per_beat) =
                config::resolve_source(source.as_deref(), ticks_per_beat)?;
            analyze::run(&file, source, ticks_per_beat, plot.as_deref())
        }

        #[cfg(feature = "serial")]
        Commands::Ports => serial::port::print_ports(),

        Commands::Sources => {
            print_sources();
            Ok(())
        }
    }
}

fn print_sources() {
    println!("{}", "=".repeat(60));
    println!("{}", "Built-in Clock Source Profiles".cyan().bold());
    println!("{}", "=".repeat(60));

    for source in sources::all_sources() {
        println!("\n  {}: {}", source.name.white().bold(), source.description);
        println!("    Ticks per beat: {}", source.ticks_per_beat);
        println!("    Default baud:   {}", source.default_baud);
        if !source.aliases.is_empty() {
            println!("    Aliases: {}", source.aliases.join(", ").dimmed());
        }
    }

    println!("\n{}", "=".repeat(60));
    println!(
        "Use {} to override any profile field",
        "--ticks-per-beat / --baud".cyan()
    );
}
