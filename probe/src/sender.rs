//! Probe sender: paced, busy-wait scheduled writes.
//!
//! Targets follow an absolute schedule (`start + i * spacing`) rather than a
//! cumulative one, so timing drift never compounds. The instant encoded into
//! each probe is the target, not the actual send time: a late send then shows
//! up as round-trip latency instead of being hidden.

use std::net::TcpStream;

use hiccup_shared::Probe;

use crate::clock::{self, Clock};
use crate::config::TrialConfig;
use crate::error::ProbeError;
use crate::sockets;

/// Absolute target instant for probe `index` (1-based).
pub fn target_instant(start_nanos: i64, index: u32, rate_per_milli: u32) -> i64 {
    start_nanos + index as i64 * 1_000_000 / rate_per_milli as i64
}

/// Pace and transmit all probes for one trial. Any write failure is fatal;
/// a partially sent trial is unusable.
pub fn run(stream: &TcpStream, config: &TrialConfig, clock: &dyn Clock) -> Result<(), ProbeError> {
    let start = clock.now_nanos();
    for i in 1..=config.total() {
        let target = target_instant(start, i, config.rate_per_milli);
        clock::spin_until(clock, target);
        let frame = Probe {
            sequence: i as i32,
            send_instant_nanos: target,
        }
        .encode();
        sockets::write_all_spin(stream, &frame)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_form_arithmetic_sequence() {
        let start = 1_000;
        let rate = 25;
        let spacing = 1_000_000 / rate as i64;
        let mut prev = target_instant(start, 1, rate);
        assert_eq!(prev, start + spacing);
        for i in 2..=1_000 {
            let next = target_instant(start, i, rate);
            assert_eq!(next - prev, spacing);
            prev = next;
        }
    }

    #[test]
    fn test_targets_strictly_increase_for_all_rates() {
        for rate in [5, 10, 25, 1_000] {
            let mut prev = i64::MIN;
            for i in 1..=100 {
                let t = target_instant(0, i, rate);
                assert!(t > prev, "rate {} index {}", rate, i);
                prev = t;
            }
        }
    }

    #[test]
    fn test_absolute_schedule_does_not_drift() {
        // The i-th target depends only on i, never on when earlier probes
        // actually went out.
        let late_start = 5_000_000;
        assert_eq!(
            target_instant(late_start, 100, 10) - late_start,
            100 * 100_000
        );
    }
}
