//! Plain-text rendering of harness measurements.
//!
//! Kept separate from the kernel and harness so the reduction itself never
//! performs I/O.

use std::fmt::Write as _;

use crate::harness::Measurement;

/// Render measurements as an aligned text table.
///
/// `simd_level` is the detected level name (see
/// [`crate::simd::SimdLevel::name`]).
#[must_use]
pub fn render(simd_level: &str, track_count: usize, measurements: &[Measurement]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "SIMD level: {simd_level}");
    let _ = writeln!(out, "Tracks: {track_count}");
    let _ = writeln!(out);
    let _ = writeln!(out, "{:<16} {:>14}", "strategy", "elapsed");
    for measurement in measurements {
        let _ = writeln!(
            out,
            "{:<16} {:>14.2?}",
            measurement.strategy, measurement.elapsed
        );
    }
    if let Some(first) = measurements.first() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Total play time: {}", format_play_time(first.total));
    }
    out
}

/// Format a seconds total the way the harness reports it: hours and days.
fn format_play_time(total_secs: i64) -> String {
    let hours = total_secs as f64 / 3600.0;
    let days = hours / 24.0;
    format!("{total_secs} s ({hours:.1} h, {days:.1} d)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample() -> Vec<Measurement> {
        vec![
            Measurement {
                strategy: "scalar",
                elapsed: Duration::from_micros(120),
                total: 7200,
            },
            Measurement {
                strategy: "lane-reduce",
                elapsed: Duration::from_micros(40),
                total: 7200,
            },
        ]
    }

    #[test]
    fn test_render_lists_every_strategy() {
        let text = render("AVX2 (256-bit)", 1000, &sample());
        assert!(text.contains("scalar"));
        assert!(text.contains("lane-reduce"));
        assert!(text.contains("AVX2"));
        assert!(text.contains("1000"));
    }

    #[test]
    fn test_render_reports_play_time() {
        let text = render("portable (no SIMD)", 2, &sample());
        assert!(text.contains("7200 s (2.0 h"));
    }

    #[test]
    fn test_render_empty_measurements() {
        let text = render("SSE4.1 (128-bit)", 0, &[]);
        assert!(!text.contains("Total play time"));
    }
}
