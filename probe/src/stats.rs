//! Latency accumulation.
//!
//! Thin wrapper over `hdrhistogram` exposing only the collaborator contract
//! the engine consumes: `sample(nanos)` and `percentile(p)`. Two instances
//! exist per trial (warmup, measured); their lifetime is one trial.

use hdrhistogram::Histogram;

use crate::error::ProbeError;

/// Nanosecond latency accumulator, 3 significant figures, auto-resizing.
#[derive(Debug)]
pub struct LatencyHistogram {
    inner: Histogram<u64>,
}

impl LatencyHistogram {
    pub fn new() -> Result<Self, ProbeError> {
        Ok(Self {
            inner: Histogram::new(3)?,
        })
    }

    /// Record one round-trip time. Negative values (clock noise) clamp to
    /// zero rather than being dropped, so the sample count stays exact.
    pub fn sample(&mut self, nanos: i64) {
        self.inner.saturating_record(nanos.max(0) as u64);
    }

    /// Nanosecond value at percentile `p` (0..=100).
    pub fn percentile(&self, p: f64) -> u64 {
        self.inner.value_at_percentile(p)
    }

    /// Number of recorded samples.
    pub fn count(&self) -> u64 {
        self.inner.len()
    }
}
