//! Monitor configuration: defaults, TOML config file, CLI overrides.
//!
//! Resolution order for every parameter is CLI flag, then config file, then
//! the clock-source profile or built-in default. Everything is validated
//! with named ranges before any I/O happens.

use crate::sources::{self, ClockSource};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CAPACITY: usize = crate::buffer::DEFAULT_CAPACITY;
pub const DEFAULT_REFRESH_MS: u64 = 500;
pub const DEFAULT_SOURCE: &str = "midi";

/// Smallest refresh period the dashboard will accept.
pub const MIN_REFRESH_MS: u64 = 10;
/// A window of one delta has no deviation to speak of.
pub const MIN_CAPACITY: usize = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no serial port given; pass --port or set `port` in the config file")]
    MissingPort,

    #[error("unknown clock source `{name}`; known sources: {known}")]
    UnknownSource { name: String, known: String },

    #[error("{field} is {value}, must be {allowed}")]
    OutOfRange {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },
}

/// On-disk shape of a monitor config file. Every field is optional so a rig
/// file can pin just the values that matter to it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub port: Option<String>,
    pub baud: Option<u32>,
    pub capacity: Option<usize>,
    pub refresh_ms: Option<u64>,
    pub source: Option<String>,
    pub ticks_per_beat: Option<u32>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))
    }
}

/// Command-line values; `None` means the flag was not given.
#[derive(Debug, Clone, Default)]
pub struct MonitorOverrides {
    pub port: Option<String>,
    pub baud: Option<u32>,
    pub capacity: Option<usize>,
    pub refresh_ms: Option<u64>,
    pub source: Option<String>,
    pub ticks_per_beat: Option<u32>,
}

/// Fully resolved, validated monitor session parameters.
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub port: String,
    pub baud: u32,
    pub capacity: usize,
    pub refresh: Duration,
    pub source: &'static ClockSource,
    pub ticks_per_beat: u32,
}

/// Merge CLI overrides with a config file and validate the result.
pub fn resolve(cli: MonitorOverrides, file: ConfigFile) -> Result<MonitorOptions, ConfigError> {
    let source_name = cli
        .source
        .or(file.source)
        .unwrap_or_else(|| DEFAULT_SOURCE.to_string());
    let (source, ticks_per_beat) =
        resolve_source(Some(&source_name), cli.ticks_per_beat.or(file.ticks_per_beat))?;

    let options = MonitorOptions {
        port: cli.port.or(file.port).ok_or(ConfigError::MissingPort)?,
        baud: cli.baud.or(file.baud).unwrap_or(source.default_baud),
        capacity: cli.capacity.or(file.capacity).unwrap_or(DEFAULT_CAPACITY),
        refresh: Duration::from_millis(
            cli.refresh_ms.or(file.refresh_ms).unwrap_or(DEFAULT_REFRESH_MS),
        ),
        source,
        ticks_per_beat,
    };
    options.validate()?;
    Ok(options)
}

/// Resolve a clock source name plus an optional ticks-per-beat override.
/// Shared between the monitor and the offline analyzer.
pub fn resolve_source(
    name: Option<&str>,
    ticks_override: Option<u32>,
) -> Result<(&'static ClockSource, u32), ConfigError> {
    let name = name.unwrap_or(DEFAULT_SOURCE);
    let source = sources::get_source(name).ok_or_else(|| ConfigError::UnknownSource {
        name: name.to_string(),
        known: sources::source_names().join(", "),
    })?;

    let ticks_per_beat = ticks_override.unwrap_or(source.ticks_per_beat);
    if ticks_per_beat < 1 {
        return Err(ConfigError::OutOfRange {
            field: "ticks-per-beat",
            value: ticks_per_beat.to_string(),
            allowed: "at least 1",
        });
    }
    Ok((source, ticks_per_beat))
}

impl MonitorOptions {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.baud == 0 {
            return Err(ConfigError::OutOfRange {
                field: "baud rate",
                value: self.baud.to_string(),
                allowed: "greater than 0",
            });
        }
        if self.capacity < MIN_CAPACITY {
            return Err(ConfigError::OutOfRange {
                field: "buffer capacity",
                value: self.capacity.to_string(),
                allowed: "at least 2",
            });
        }
        if self.refresh < Duration::from_millis(MIN_REFRESH_MS) {
            return Err(ConfigError::OutOfRange {
                field: "refresh period",
                value: format!("{} ms", self.refresh.as_millis()),
                allowed: "at least 10 ms",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn port_only() -> MonitorOverrides {
        MonitorOverrides {
            port: Some("/dev/ttyUSB0".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_come_from_the_midi_profile() {
        let options = resolve(port_only(), ConfigFile::default()).unwrap();
        assert_eq!(options.baud, 38400);
        assert_eq!(options.capacity, 25);
        assert_eq!(options.refresh, Duration::from_millis(500));
        assert_eq!(options.source.name, "midi");
        assert_eq!(options.ticks_per_beat, 24);
    }

    #[test]
    fn missing_port_is_an_error() {
        let err = resolve(MonitorOverrides::default(), ConfigFile::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingPort));
    }

    #[test]
    fn cli_flags_win_over_file_values() {
        let file = ConfigFile {
            port: Some("/dev/ttyACM3".to_string()),
            baud: Some(115200),
            capacity: Some(50),
            ..Default::default()
        };
        let cli = MonitorOverrides {
            port: Some("/dev/ttyUSB1".to_string()),
            baud: Some(9600),
            ..Default::default()
        };

        let options = resolve(cli, file).unwrap();
        assert_eq!(options.port, "/dev/ttyUSB1");
        assert_eq!(options.baud, 9600);
        // Untouched by the CLI, so the file value holds
        assert_eq!(options.capacity, 50);
    }

    #[test]
    fn file_port_satisfies_the_port_requirement() {
        let file = ConfigFile {
            port: Some("/dev/ttyACM0".to_string()),
            ..Default::default()
        };
        let options = resolve(MonitorOverrides::default(), file).unwrap();
        assert_eq!(options.port, "/dev/ttyACM0");
    }

    #[test]
    fn out_of_range_values_are_rejected_by_field() {
        let too_small = MonitorOverrides {
            capacity: Some(1),
            ..port_only()
        };
        let err = resolve(too_small, ConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("buffer capacity"));

        let too_fast = MonitorOverrides {
            refresh_ms: Some(5),
            ..port_only()
        };
        let err = resolve(too_fast, ConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("refresh period"));

        let zero_baud = MonitorOverrides {
            baud: Some(0),
            ..port_only()
        };
        let err = resolve(zero_baud, ConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("baud rate"));

        let zero_ticks = MonitorOverrides {
            ticks_per_beat: Some(0),
            ..port_only()
        };
        let err = resolve(zero_ticks, ConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("ticks-per-beat"));
    }

    #[test]
    fn unknown_source_names_the_valid_ones() {
        let cli = MonitorOverrides {
            source: Some("smpte".to_string()),
            ..port_only()
        };
        let err = resolve(cli, ConfigFile::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("smpte"));
        assert!(message.contains("midi"));
    }

    #[test]
    fn ticks_override_beats_the_profile() {
        let (source, ticks) = resolve_source(Some("midi"), Some(48)).unwrap();
        assert_eq!(source.name, "midi");
        assert_eq!(ticks, 48);
    }

    #[test]
    fn config_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port = \"/dev/ttyUSB2\"\nbaud = 57600\nrefresh_ms = 250\nsource = \"sync48\""
        )
        .unwrap();

        let parsed = ConfigFile::load(file.path()).unwrap();
        let options = resolve(MonitorOverrides::default(), parsed).unwrap();
        assert_eq!(options.port, "/dev/ttyUSB2");
        assert_eq!(options.baud, 57600);
        assert_eq!(options.refresh, Duration::from_millis(250));
        assert_eq!(options.ticks_per_beat, 48);
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"/dev/ttyUSB0\"\nbuad = 38400").unwrap();
        assert!(ConfigFile::load(file.path()).is_err());
    }
}
