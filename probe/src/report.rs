//! Percentile reporting.
//!
//! Renders the measured histogram as a two-line tab-separated table. The
//! percentile ladder stops before the first percentile the sample count
//! cannot statistically resolve (`N <= (1/(1-p/100))^2`); the fixed extreme
//! 99.9999 "worst" column is reported regardless, as best-effort outlier
//! visibility even when statistically unsupported. That asymmetry is kept
//! deliberately.

use std::fmt;
use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::config::TrialConfig;
use crate::stats::LatencyHistogram;

/// Ascending percentile ladder, coarse to fine.
pub const PERCENTILES: [f64; 6] = [50.0, 90.0, 99.0, 99.9, 99.99, 99.999];

/// Fixed extreme percentile reported unconditionally as "worst".
pub const WORST_PERCENTILE: f64 = 99.9999;

/// One emitted percentile column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentileValue {
    pub percentile: f64,
    pub nanos: u64,
}

/// Rendered outcome of one trial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialReport {
    pub runs: u32,
    pub rate_per_milli: u32,
    pub warmup: u32,
    pub busy: bool,
    /// Measured samples (warmup excluded).
    pub sample_count: u64,
    /// Columns that survived the statistical cutoff.
    pub percentiles: Vec<PercentileValue>,
    pub worst_nanos: u64,
}

impl TrialReport {
    /// Query the measured histogram and apply the percentile cutoff.
    pub fn build(measured: &LatencyHistogram, config: &TrialConfig) -> Self {
        let n = measured.count();
        let mut percentiles = Vec::with_capacity(PERCENTILES.len());
        for p in PERCENTILES {
            let one_in = 1.0 / (1.0 - p / 100.0);
            if n as f64 <= one_in * one_in {
                break;
            }
            percentiles.push(PercentileValue {
                percentile: p,
                nanos: measured.percentile(p),
            });
        }
        Self {
            runs: config.runs,
            rate_per_milli: config.rate_per_milli,
            warmup: config.warmup,
            busy: config.busy,
            sample_count: n,
            percentiles,
            worst_nanos: measured.percentile(WORST_PERCENTILE),
        }
    }
}

impl fmt::Display for TrialReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut heading = String::from("runs\trate\twarmup\tbusy");
        let mut values = format!(
            "{}\t{}\t{}\t{}",
            self.runs, self.rate_per_milli, self.warmup, self.busy
        );
        for col in &self.percentiles {
            heading.push_str(&format!("\t{}%", percentile_label(col.percentile)));
            values.push_str(&format!("\t{}", scale_nanos(col.nanos)));
        }
        heading.push_str("\tworst");
        values.push_str(&format!("\t{}\tmicro-seconds", scale_nanos(self.worst_nanos)));
        writeln!(f, "{}", heading)?;
        write!(f, "{}", values)
    }
}

/// Header label for a percentile: whole percentiles keep one decimal
/// (`50.0`), fractional ones print as-is (`99.99`).
fn percentile_label(p: f64) -> String {
    if p.fract() == 0.0 {
        format!("{:.1}", p)
    } else {
        format!("{}", p)
    }
}

/// Rescale a nanosecond value to a readable microsecond-based string.
///
/// Three regimes: sub-10us values keep 3 decimals, values up to 1ms render
/// as whole microseconds, and everything above switches to a compact
/// `<v>e3` / `<v>e6` notation.
pub fn scale_nanos(nanos: u64) -> String {
    if nanos < 10_000 {
        format!("{:.3}", nanos as f64 / 1e3)
    } else if nanos < 1_000_000 {
        format!("{}", nanos / 1_000)
    } else if nanos < 10_000_000 {
        format!("{:.3}e3", nanos as f64 / 1e6)
    } else if nanos < 1_000_000_000 {
        format!("{}e3", nanos / 1_000_000)
    } else {
        format!("{:.3}e6", nanos as f64 / 1e9)
    }
}

/// Write collected trial reports to a JSON file.
pub fn write_json(path: &str, reports: &[TrialReport]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, reports)
        .with_context(|| format!("Failed to write reports to {}", path))?;
    info!("wrote {} trial report(s) to {}", reports.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram_with(n: u64) -> LatencyHistogram {
        let mut histo = LatencyHistogram::new().unwrap();
        for i in 0..n {
            histo.sample(1_000 + (i as i64 % 997));
        }
        histo
    }

    fn config() -> TrialConfig {
        TrialConfig {
            warmup: 10,
            runs: 100,
            rate_per_milli: 25,
            busy: false,
            tests: 1,
        }
    }

    #[test]
    fn test_cutoff_never_emits_unsupported_percentile() {
        for n in [1u64, 3, 5, 100, 101, 10_000, 1_000_000] {
            let report = TrialReport::build(&histogram_with(n), &config());
            for col in &report.percentiles {
                let one_in = 1.0 / (1.0 - col.percentile / 100.0);
                assert!(
                    n as f64 > one_in * one_in,
                    "n={} emitted unsupported percentile {}",
                    n,
                    col.percentile
                );
            }
        }
    }

    #[test]
    fn test_million_samples_stop_at_99() {
        let report = TrialReport::build(&histogram_with(1_000_000), &config());
        let emitted: Vec<f64> = report.percentiles.iter().map(|c| c.percentile).collect();
        assert_eq!(emitted, vec![50.0, 90.0, 99.0]);
    }

    #[test]
    fn test_worst_always_emitted() {
        // Even a sample count too small for the 50th percentile still
        // reports the fixed extreme column.
        let report = TrialReport::build(&histogram_with(3), &config());
        assert!(report.percentiles.is_empty());
        let rendered = report.to_string();
        assert!(rendered.contains("\tworst"));
        assert!(rendered.ends_with("micro-seconds"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let histo = histogram_with(10_000);
        let a = TrialReport::build(&histo, &config()).to_string();
        let b = TrialReport::build(&histo, &config()).to_string();
        assert_eq!(a, b);
    }

    #[test]
    fn test_table_shape() {
        let report = TrialReport::build(&histogram_with(10_000), &config());
        let rendered = report.to_string();
        let mut lines = rendered.lines();
        let heading = lines.next().unwrap();
        let values = lines.next().unwrap();
        assert!(lines.next().is_none());

        assert!(heading.starts_with("runs\trate\twarmup\tbusy\t50.0%"));
        assert!(heading.ends_with("\tworst"));
        assert!(!heading.contains("micro-seconds"));
        assert!(values.starts_with("100\t25\t10\tfalse\t"));
        assert!(values.ends_with("\tmicro-seconds"));
        // Values row has one extra column: the trailing unit label.
        assert_eq!(
            values.split('\t').count(),
            heading.split('\t').count() + 1
        );
    }

    #[test]
    fn test_fractional_percentile_labels() {
        assert_eq!(percentile_label(50.0), "50.0");
        assert_eq!(percentile_label(99.9), "99.9");
        assert_eq!(percentile_label(99.99), "99.99");
        assert_eq!(percentile_label(99.999), "99.999");
    }

    #[test]
    fn test_scaling_regimes() {
        assert_eq!(scale_nanos(0), "0.000");
        assert_eq!(scale_nanos(1_234), "1.234");
        assert_eq!(scale_nanos(9_999), "9.999");
        assert_eq!(scale_nanos(10_000), "10");
        assert_eq!(scale_nanos(999_999), "999");
        assert_eq!(scale_nanos(1_000_000), "1.000e3");
        assert_eq!(scale_nanos(2_345_678), "2.346e3");
        assert_eq!(scale_nanos(10_000_000), "10e3");
        assert_eq!(scale_nanos(999_999_999), "999e3");
        assert_eq!(scale_nanos(1_000_000_000), "1.000e6");
        assert_eq!(scale_nanos(2_500_000_000), "2.500e6");
    }
}
