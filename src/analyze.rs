//! Offline analysis of captured timestamp files.
//!
//! Loads a whole capture into memory, computes the difference sequence,
//! and prints the aggregate report. The statistics come from the same
//! functions as the live monitor, so bench captures and live readings
//! always agree.

use crate::plot;
use crate::sources::ClockSource;
use crate::stats::TimingReport;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::Path;

/// Load a whitespace/newline-delimited file of decimal timestamps.
///
/// Unlike the serial reader, a malformed token here is fatal: a capture
/// file is supposed to be clean, and silently skipping entries would skew
/// the report. The error names the token and its line.
pub fn load_timestamps(path: &Path) -> Result<Vec<i64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read timestamp file {}", path.display()))?;

    let mut times = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        for token in line.split_whitespace() {
            let value: i64 = token.parse().with_context(|| {
                format!(
                    "{}: invalid timestamp {:?} on line {}",
                    path.display(),
                    token,
                    lineno + 1
                )
            })?;
            times.push(value);
        }
    }

    if times.len() < 2 {
        bail!(
            "{}: need at least two timestamps to analyze, found {}",
            path.display(),
            times.len()
        );
    }
    Ok(times)
}

/// Consecutive differences of the timestamp sequence.
pub fn diff_sequence(times: &[i64]) -> Vec<i64> {
    times.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Analyze a capture file, print the report, and optionally chart it.
pub fn run(
    path: &Path,
    source: &'static ClockSource,
    ticks_per_beat: u32,
    plot_path: Option<&Path>,
) -> Result<()> {
    let times = load_timestamps(path)?;
    let deltas = diff_sequence(&times);
    let dropped = deltas.iter().filter(|&&d| d <= 0).count();

    let report = match TimingReport::from_deltas(&deltas, ticks_per_beat) {
        Some(report) => report,
        None => bail!(
            "{}: no positive intervals to analyze ({} non-positive dropped)",
            path.display(),
            dropped
        ),
    };

    print_report(path, times.len(), &deltas, dropped, &report, source, ticks_per_beat);

    if let Some(out) = plot_path {
        // The chart shows the raw difference sequence, dropped entries
        // included; dips below zero are exactly what a bench wants to see
        plot::render_intervals(&deltas, report.stats.mean_us, out)?;
        println!(
            "\n{} Chart written to {}",
            "[OK]".green().bold(),
            out.display()
        );
    }

    Ok(())
}

fn print_report(
    path: &Path,
    timestamps: usize,
    deltas: &[i64],
    dropped: usize,
    report: &TimingReport,
    source: &ClockSource,
    ticks_per_beat: u32,
) {
    println!("{}", "=".repeat(60));
    println!(
        "{}",
        format!("Timing Analysis: {}", path.display()).cyan().bold()
    );
    println!("{}", "=".repeat(60));

    println!(
        "\n{} timestamps, {} intervals ({} dropped as non-positive)",
        timestamps,
        deltas.len(),
        dropped
    );

    let s = &report.stats;
    println!("\n{:<22} {}", "sum (µs):".cyan(), report.sum_us);
    println!("{:<22} {:.2}", "mean interval (µs):".cyan(), s.mean_us);
    println!("{:<22} {:.2}", "std dev (µs):".cyan(), s.std_dev_us);
    println!(
        "{:<22} {:.2} / +{:.2}",
        "min/max dev (µs):".cyan(),
        report.min_deviation_us,
        report.max_deviation_us
    );
    println!("{:<22} {:.3}", "frequency (Hz):".cyan(), s.frequency_hz);
    println!(
        "{:<22} {} ({}, {} ticks/beat)",
        "tempo (BPM):".cyan(),
        format!("{:.1}", s.bpm).white().bold(),
        source.name,
        ticks_per_beat
    );

    println!("\n{}", "=".repeat(60));
}
