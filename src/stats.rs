//! Interval statistics shared by the live monitor and the offline analyzer.
//!
//! One computation path feeds both tools so their numbers always agree.
//! Only strictly positive deltas enter the statistics; zero and negative
//! entries (warm-up slots, device resets, clock rollover) are dropped here,
//! not at the write stage.

const MICROS_PER_SECOND: f64 = 1_000_000.0;
const MICROS_PER_MINUTE: f64 = 60_000_000.0;

/// Rolling statistics over a window of interval deltas.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalStats {
    /// Number of deltas that survived the positive filter.
    pub count: usize,
    pub mean_us: f64,
    /// Population standard deviation (denominator N, not N-1).
    pub std_dev_us: f64,
    pub frequency_hz: f64,
    pub bpm: f64,
}

impl IntervalStats {
    /// Compute statistics over the strictly positive deltas.
    ///
    /// Returns `None` when no positive delta is present, which covers both
    /// the warm-up all-zero buffer and a window full of reset garbage.
    pub fn from_deltas(deltas: &[i64], ticks_per_beat: u32) -> Option<Self> {
        let positive: Vec<f64> = deltas
            .iter()
            .filter(|&&d| d > 0)
            .map(|&d| d as f64)
            .collect();
        Self::from_positive(&positive, ticks_per_beat)
    }

    fn from_positive(values: &[f64], ticks_per_beat: u32) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        // Cannot be zero after the positive filter; never divide by it anyway
        if mean <= 0.0 || ticks_per_beat == 0 {
            return None;
        }

        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        Some(Self {
            count,
            mean_us: mean,
            std_dev_us: variance.sqrt(),
            frequency_hz: MICROS_PER_SECOND / mean,
            bpm: MICROS_PER_MINUTE / (mean * f64::from(ticks_per_beat)),
        })
    }
}

/// Aggregate report for the offline analyzer: the shared statistics plus
/// the totals the capture scripts printed.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingReport {
    pub stats: IntervalStats,
    /// Sum of the analyzed (positive) intervals, in ticks.
    pub sum_us: i64,
    /// Smallest interval minus the mean.
    pub min_deviation_us: f64,
    /// Largest interval minus the mean.
    pub max_deviation_us: f64,
}

impl TimingReport {
    pub fn from_deltas(deltas: &[i64], ticks_per_beat: u32) -> Option<Self> {
        let stats = IntervalStats::from_deltas(deltas, ticks_per_beat)?;

        let positive: Vec<i64> = deltas.iter().copied().filter(|&d| d > 0).collect();
        let min = *positive.iter().min()?;
        let max = *positive.iter().max()?;

        Some(Self {
            sum_us: positive.iter().sum(),
            min_deviation_us: min as f64 - stats.mean_us,
            max_deviation_us: max as f64 - stats.mean_us,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIDI_TICKS_PER_BEAT: u32 = 24;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn reference_capture_formulas() {
        // times [0, 1000, 2100, 3050] -> diffs [1000, 1100, 950]
        let deltas = [1000, 1100, 950];
        let stats = IntervalStats::from_deltas(&deltas, MIDI_TICKS_PER_BEAT).unwrap();

        assert_eq!(stats.count, 3);
        assert!(close(stats.mean_us, 1016.67, 0.01));
        assert!(close(stats.std_dev_us, 62.36, 0.01));
        assert!(close(stats.frequency_hz, 1_000_000.0 / stats.mean_us, 1e-9));
        assert!(close(stats.bpm, 60_000_000.0 / (stats.mean_us * 24.0), 1e-9));
        assert!(close(stats.bpm, 2459.02, 0.01));
    }

    #[test]
    fn report_adds_sum_and_deviation_bounds() {
        let deltas = [1000, 1100, 950];
        let report = TimingReport::from_deltas(&deltas, MIDI_TICKS_PER_BEAT).unwrap();

        assert_eq!(report.sum_us, 3050);
        assert!(close(report.min_deviation_us, 950.0 - report.stats.mean_us, 1e-9));
        assert!(close(report.max_deviation_us, 1100.0 - report.stats.mean_us, 1e-9));
        assert!(report.min_deviation_us < 0.0);
        assert!(report.max_deviation_us > 0.0);
    }

    #[test]
    fn non_positive_deltas_are_excluded() {
        let with_noise = [0, -500, 1000, 0, 1100, -3, 950, 0];
        let clean = [1000, 1100, 950];

        assert_eq!(
            IntervalStats::from_deltas(&with_noise, MIDI_TICKS_PER_BEAT),
            IntervalStats::from_deltas(&clean, MIDI_TICKS_PER_BEAT)
        );
    }

    #[test]
    fn empty_and_all_non_positive_windows_yield_none() {
        assert_eq!(IntervalStats::from_deltas(&[], MIDI_TICKS_PER_BEAT), None);
        assert_eq!(IntervalStats::from_deltas(&[0; 25], MIDI_TICKS_PER_BEAT), None);
        assert_eq!(
            IntervalStats::from_deltas(&[0, -1, -200], MIDI_TICKS_PER_BEAT),
            None
        );
        assert_eq!(TimingReport::from_deltas(&[0, 0], MIDI_TICKS_PER_BEAT), None);
    }

    #[test]
    fn repeated_computation_is_idempotent() {
        let deltas = [2500, 2498, 2502, 2499, 0, 0];
        let first = IntervalStats::from_deltas(&deltas, MIDI_TICKS_PER_BEAT);
        let second = IntervalStats::from_deltas(&deltas, MIDI_TICKS_PER_BEAT);
        assert_eq!(first, second);
    }

    #[test]
    fn ticks_per_beat_scales_bpm_only() {
        let deltas = [2500, 2500, 2500];
        let midi = IntervalStats::from_deltas(&deltas, 24).unwrap();
        let pulse = IntervalStats::from_deltas(&deltas, 1).unwrap();

        assert_eq!(midi.mean_us, pulse.mean_us);
        assert_eq!(midi.frequency_hz, pulse.frequency_hz);
        assert!(close(pulse.bpm, midi.bpm * 24.0, 1e-6));
    }
}
