//! Trial configuration.
//!
//! Built once at entry from CLI flags / environment and passed by reference
//! into every component; nothing mutates it afterwards.

/// Configuration for one probe trial (or a sweep of them).
#[derive(Debug, Clone)]
pub struct TrialConfig {
    /// Probes excluded from reported statistics while caches/connections
    /// stabilize.
    pub warmup: u32,

    /// Measured probes per trial.
    pub runs: u32,

    /// Probes per millisecond.
    pub rate_per_milli: u32,

    /// Busy mode: non-blocking sockets with spin-polling instead of
    /// descheduling.
    pub busy: bool,

    /// Trials per mode.
    pub tests: u32,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            warmup: 12_000,
            runs: 1_000_000,
            rate_per_milli: 25,
            busy: false,
            tests: 3,
        }
    }
}

impl TrialConfig {
    /// Total probes per trial, warmup included.
    pub fn total(&self) -> u32 {
        self.warmup + self.runs
    }

    /// The same configuration at a different rate, with the run count scaled
    /// so wall-clock duration stays comparable across rates.
    pub fn at_rate(&self, rate_per_milli: u32) -> Self {
        Self {
            rate_per_milli,
            runs: rate_per_milli * 10_000,
            ..self.clone()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.runs == 0 {
            anyhow::bail!("run count must be greater than 0");
        }

        if self.rate_per_milli == 0 {
            anyhow::bail!("rate must be greater than 0 probes/ms");
        }

        if self.tests == 0 {
            anyhow::bail!("trial count must be greater than 0");
        }

        // Sequence numbers are i32 on the wire.
        if self.warmup.checked_add(self.runs).is_none()
            || self.total() > i32::MAX as u32
        {
            anyhow::bail!("warmup + runs exceeds the probe sequence space");
        }

        Ok(())
    }
}
