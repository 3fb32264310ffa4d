//! Live pulse monitor: the consumer side and session orchestration.
//!
//! The monitor owns the shared buffer and the running flag, spawns the
//! reader thread, and redraws an in-place console dashboard on a fixed
//! refresh period. It communicates with the reader only through the buffer
//! mutex, the counters, and the running flag.

use crate::buffer::{self, ReaderCounters, SharedIntervalBuffer};
use crate::config::MonitorOptions;
use crate::serial::{PortConfig, PulseReader, SerialConnection};
use crate::shutdown;
use crate::stats::IntervalStats;
use crate::ticker::{SystemClock, Ticker};
use anyhow::{anyhow, Result};
use chrono::Local;
use colored::Colorize;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub struct LiveMonitor {
    options: MonitorOptions,
    buffer: SharedIntervalBuffer,
    counters: Arc<ReaderCounters>,
    running: Arc<AtomicBool>,
    last_stats: Option<IntervalStats>,
}

impl LiveMonitor {
    pub fn new(options: MonitorOptions) -> Self {
        let buffer = buffer::shared(options.capacity);
        Self {
            options,
            buffer,
            counters: Arc::new(ReaderCounters::default()),
            running: Arc::new(AtomicBool::new(false)),
            last_stats: None,
        }
    }

    /// Run the session until Ctrl+C or a fatal serial error.
    pub fn run(mut self) -> Result<()> {
        self.print_header();

        let port_config = PortConfig::new(&self.options.port)
            .with_baud_rate(self.options.baud)
            .with_timeout(Duration::from_millis(100));
        let connection = SerialConnection::open(port_config)?;
        println!(
            "{} Connected to {} at {} baud",
            "[OK]".green().bold(),
            self.options.port.white().bold(),
            self.options.baud
        );
        println!("{}", "Press Ctrl+C to stop\n".yellow());

        shutdown::install();
        self.running.store(true, Ordering::SeqCst);

        let reader = PulseReader::new(
            connection,
            Arc::clone(&self.buffer),
            Arc::clone(&self.counters),
            Arc::clone(&self.running),
        );
        let reader_handle = thread::Builder::new()
            .name("pulse-reader".to_string())
            .spawn(move || reader.run())?;

        let started = Instant::now();
        let mut ticker = Ticker::new(SystemClock, self.options.refresh);

        while self.running.load(Ordering::SeqCst) && !shutdown::requested() {
            ticker.wait();

            let snapshot = self.buffer.lock().unwrap().snapshot();
            let stats = IntervalStats::from_deltas(&snapshot, self.options.ticks_per_beat);
            self.redraw(&snapshot, stats.as_ref());
            self.last_stats = stats;
        }

        self.running.store(false, Ordering::SeqCst);
        let reader_result = reader_handle
            .join()
            .map_err(|_| anyhow!("pulse reader thread panicked"))?;

        self.print_summary(started.elapsed().as_secs_f64());
        reader_result
    }

    /// Clear the console region and redraw the dashboard in place.
    fn redraw(&self, snapshot: &[i64], stats: Option<&IntervalStats>) {
        let fill = snapshot.iter().filter(|&&d| d > 0).count();

        print!("\x1b[2J\x1b[H");
        println!(
            "{} {} @ {} baud  ({}, {} ticks/beat)",
            "tickstat".cyan().bold(),
            self.options.port.white(),
            self.options.baud,
            self.options.source.name,
            self.options.ticks_per_beat
        );
        println!("{}", "=".repeat(48).dimmed());

        match stats {
            Some(s) => {
                println!("{:<14} {:>12.1}", "mean (µs):".cyan(), s.mean_us);
                println!("{:<14} {:>12.2}", "std dev (µs):".cyan(), s.std_dev_us);
                println!("{:<14} {:>12.3}", "freq (Hz):".cyan(), s.frequency_hz);
                println!(
                    "{:<14} {:>12}",
                    "tempo (BPM):".cyan(),
                    format!("{:.0}", s.bpm).white().bold()
                );
            }
            None => {
                println!("{}", "waiting for pulses...".yellow());
            }
        }

        println!("{}", "=".repeat(48).dimmed());
        println!(
            "window {}/{}  accepted {}  discarded {}  {}",
            fill,
            snapshot.len(),
            self.counters.accepted(),
            self.counters.discarded(),
            Local::now().format("%H:%M:%S").to_string().dimmed()
        );
        let _ = std::io::stdout().flush();
    }

    fn print_header(&self) {
        println!("{}", "=".repeat(60).dimmed());
        println!("{}", "Pulse Timing Monitor".cyan().bold());
        println!("{}", "=".repeat(60).dimmed());
        println!("{}: {}", "Port".cyan(), self.options.port.white());
        println!("{}: {}", "Baud".cyan(), self.options.baud.to_string().white());
        println!(
            "{}: {} ({})",
            "Source".cyan(),
            self.options.source.name.white(),
            self.options.source.description
        );
        println!(
            "{}: {}",
            "Ticks per beat".cyan(),
            self.options.ticks_per_beat.to_string().white()
        );
        println!(
            "{}: {} intervals",
            "Window".cyan(),
            self.options.capacity.to_string().white()
        );
        println!(
            "{}: {} ms",
            "Refresh".cyan(),
            self.options.refresh.as_millis().to_string().white()
        );
        println!("{}", "=".repeat(60).dimmed());
    }

    fn print_summary(&self, elapsed_secs: f64) {
        println!("\n{}", "=".repeat(60).dimmed());
        println!("{}", "--- Session Summary ---".cyan().bold());
        println!("Duration: {:.1} s", elapsed_secs);
        println!("Lines accepted: {}", self.counters.accepted());
        println!(
            "Lines discarded: {}",
            if self.counters.discarded() > 0 {
                self.counters.discarded().to_string().yellow().to_string()
            } else {
                self.counters.discarded().to_string().green().to_string()
            }
        );
        if let Some(ref stats) = self.last_stats {
            println!(
                "Last reading: {:.1} µs mean, {:.0} BPM",
                stats.mean_us, stats.bpm
            );
        }
        println!("{}", "=".repeat(60).dimmed());
    }
}
