//! Interval chart rendering for the offline analyzer.
//!
//! Draws the interval-delta sequence as a line with the mean overlaid as a
//! red horizontal reference. The bitmap backend is built without a font
//! stack, so the chart carries no text; it is the raw shape of the timing.

use anyhow::{anyhow, Result};
use plotters::prelude::*;
use std::path::Path;

const CHART_SIZE: (u32, u32) = (1200, 800);

/// Write a PNG chart of the interval sequence to `path`.
pub fn render_intervals(deltas: &[i64], mean_us: f64, path: &Path) -> Result<()> {
    if deltas.is_empty() {
        return Err(anyhow!("no intervals to plot"));
    }

    let mut y_min = deltas.iter().copied().min().unwrap_or(0) as f64;
    let mut y_max = deltas.iter().copied().max().unwrap_or(0) as f64;
    y_min = y_min.min(mean_us);
    y_max = y_max.max(mean_us);
    let pad = ((y_max - y_min) * 0.1).max(1.0);

    let x_max = (deltas.len().saturating_sub(1)).max(1) as f64;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| anyhow!("failed to render chart: {e}"))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(0.0..x_max, (y_min - pad)..(y_max + pad))
        .map_err(|e| anyhow!("failed to render chart: {e}"))?;

    chart
        .draw_series(LineSeries::new(
            deltas.iter().enumerate().map(|(i, &d)| (i as f64, d as f64)),
            BLUE.stroke_width(1),
        ))
        .map_err(|e| anyhow!("failed to render chart: {e}"))?;

    chart
        .draw_series(LineSeries::new(
            [(0.0, mean_us), (x_max, mean_us)],
            RED.stroke_width(1),
        ))
        .map_err(|e| anyhow!("failed to render chart: {e}"))?;

    root.present()
        .map_err(|e| anyhow!("failed to write chart to {}: {e}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_a_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intervals.png");

        render_intervals(&[1000, 1100, 950], 1016.67, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn single_interval_still_renders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.png");
        render_intervals(&[2500], 2500.0, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn empty_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.png");
        assert!(render_intervals(&[], 0.0, &path).is_err());
        assert!(!path.exists());
    }
}
