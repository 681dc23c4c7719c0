//! End-to-end trials over the loopback interface.

use std::sync::Arc;
use std::thread;

use hiccup_probe::acceptor::{AcceptOutcome, Acceptor, CancelToken};
use hiccup_probe::clock::{Clock, MonotonicClock};
use hiccup_probe::{report, trial, TrialConfig, TrialReport};

fn small_config(busy: bool) -> TrialConfig {
    TrialConfig {
        warmup: 100,
        runs: 400,
        rate_per_milli: 1_000,
        busy,
        tests: 1,
    }
}

fn run_one(busy: bool) -> TrialReport {
    let acceptor = Acceptor::bind(0, busy).unwrap();
    let port = acceptor.local_port().unwrap();
    let cancel = CancelToken::new();
    let worker = {
        let cancel = cancel.clone();
        thread::spawn(move || acceptor.run(&cancel))
    };

    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let config = small_config(busy);
    let report = trial::run_trial("127.0.0.1", port, &config, &clock).unwrap();

    cancel.cancel();
    assert_eq!(worker.join().unwrap().unwrap(), AcceptOutcome::Cancelled);
    report
}

#[test]
fn blocking_trial_roundtrip() {
    let report = run_one(false);
    // Warmup excluded: exactly `runs` measured samples.
    assert_eq!(report.sample_count, 400);
    assert!(!report.busy);
    // N=400 supports 50% (one_in^2=4) and 90% (100) but not 99% (10000).
    let emitted: Vec<f64> = report.percentiles.iter().map(|c| c.percentile).collect();
    assert_eq!(emitted, vec![50.0, 90.0]);
    // The worst column is present no matter what the cutoff suppressed.
    let worst_floor = report.percentiles.last().map(|c| c.nanos).unwrap_or(0);
    assert!(report.worst_nanos >= worst_floor);
}

#[test]
fn busy_trial_roundtrip() {
    let report = run_one(true);
    assert_eq!(report.sample_count, 400);
    assert!(report.busy);
}

#[test]
fn consecutive_trials_share_one_acceptor() {
    let acceptor = Acceptor::bind(0, false).unwrap();
    let port = acceptor.local_port().unwrap();
    let cancel = CancelToken::new();
    let worker = {
        let cancel = cancel.clone();
        thread::spawn(move || acceptor.run(&cancel))
    };

    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let config = small_config(false);
    for _ in 0..2 {
        let report = trial::run_trial("127.0.0.1", port, &config, &clock).unwrap();
        assert_eq!(report.sample_count, 400);
    }

    cancel.cancel();
    assert_eq!(worker.join().unwrap().unwrap(), AcceptOutcome::Cancelled);
}

#[test]
fn reports_render_identically_and_serialize() {
    let report = run_one(false);
    assert_eq!(report.to_string(), report.to_string());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports.json");
    let path = path.to_str().unwrap();
    report::write_json(path, std::slice::from_ref(&report)).unwrap();

    let raw = std::fs::read_to_string(path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed[0]["runs"], 400);
    assert_eq!(parsed[0]["rate_per_milli"], 1_000);
    assert_eq!(parsed[0]["busy"], false);
    assert_eq!(parsed[0]["sample_count"], 400);
}
