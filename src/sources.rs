//! Clock source profiles.
//!
//! A profile names the device family on the other end of the serial line
//! and carries the parameters that depend on it: how many ticks the device
//! emits per musical beat and the baud rate its firmware talks at. Every
//! field can be overridden from the command line; the profile only supplies
//! defaults.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Parameter set for one device family.
#[derive(Debug)]
pub struct ClockSource {
    pub name: &'static str,
    pub description: &'static str,
    /// Pulses emitted per musical beat (MIDI beat clock: 24 PPQN).
    pub ticks_per_beat: u32,
    pub default_baud: u32,
    pub aliases: &'static [&'static str],
}

static BUILTIN_SOURCES: &[ClockSource] = &[
    ClockSource {
        name: "midi",
        description: "MIDI beat clock, 24 pulses per quarter note",
        ticks_per_beat: 24,
        default_baud: 38400,
        aliases: &["midi-clock", "default"],
    },
    ClockSource {
        name: "sync24",
        description: "DIN sync, Roland convention (Sync24)",
        ticks_per_beat: 24,
        default_baud: 38400,
        aliases: &["din-sync"],
    },
    ClockSource {
        name: "sync48",
        description: "DIN sync, 48 pulses per quarter note (Sync48)",
        ticks_per_beat: 48,
        default_baud: 38400,
        aliases: &["korg-sync"],
    },
    ClockSource {
        name: "pulse",
        description: "Bare trigger pulse, one tick per beat",
        ticks_per_beat: 1,
        default_baud: 38400,
        aliases: &["trigger"],
    },
];

/// Registry of built-in profiles, keyed by canonical name and aliases.
static SOURCE_REGISTRY: Lazy<HashMap<&'static str, &'static ClockSource>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for source in BUILTIN_SOURCES {
        m.insert(source.name, source);
        for alias in source.aliases {
            m.insert(*alias, source);
        }
    }
    m
});

/// Look up a profile by name or alias, case-insensitively.
pub fn get_source(name: &str) -> Option<&'static ClockSource> {
    SOURCE_REGISTRY.get(name.to_lowercase().as_str()).copied()
}

/// All built-in profiles, in definition order.
pub fn all_sources() -> &'static [ClockSource] {
    BUILTIN_SOURCES
}

/// Canonical profile names, sorted.
pub fn source_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = BUILTIN_SOURCES.iter().map(|s| s.name).collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_lookup() {
        let midi = get_source("midi").unwrap();
        assert_eq!(midi.ticks_per_beat, 24);
        assert_eq!(midi.default_baud, 38400);
    }

    #[test]
    fn alias_and_case_insensitive_lookup() {
        assert_eq!(get_source("korg-sync").unwrap().name, "sync48");
        assert_eq!(get_source("MIDI-Clock").unwrap().name, "midi");
        assert_eq!(get_source("Trigger").unwrap().ticks_per_beat, 1);
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(get_source("smpte").is_none());
    }

    #[test]
    fn names_are_sorted_and_deduplicated() {
        let names = source_names();
        assert_eq!(names, vec!["midi", "pulse", "sync24", "sync48"]);
    }
}
