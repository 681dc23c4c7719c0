//! Trial orchestration: self-test, server-only, and client-only modes.
//!
//! Per trial, two threads share one connection in a strict producer/consumer
//! split: the calling thread paces writes, a dedicated thread reads the
//! echoes. The caller joins the reader before returning, so no two trials
//! ever overlap. There are no timeouts anywhere; a stalled peer stalls the
//! trial indefinitely (trusted benchmarking environment).

use std::net::Shutdown;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use tracing::{info, warn};

use crate::acceptor::{AcceptOutcome, Acceptor, CancelToken};
use crate::clock::Clock;
use crate::config::TrialConfig;
use crate::error::ProbeError;
use crate::reader;
use crate::report::TrialReport;
use crate::sender;
use crate::sockets;

/// Client-mode rate ladder, probes per millisecond.
pub const RATE_SWEEP: [u32; 3] = [5, 10, 25];

/// Run one sender+reader round against an echo endpoint.
pub fn run_trial(
    host: &str,
    port: u16,
    config: &TrialConfig,
    clock: &Arc<dyn Clock>,
) -> Result<TrialReport, ProbeError> {
    let stream = sockets::connect((host, port), config.busy)?;
    let reader_stream = stream.try_clone()?;

    let (ready_tx, ready_rx) = mpsc::channel();
    let reader_config = config.clone();
    let reader_clock = Arc::clone(clock);
    let reader_thread = thread::Builder::new()
        .name("hiccup-reader".into())
        .spawn(move || {
            let _ = ready_tx.send(());
            reader::run(reader_stream, &reader_config, reader_clock.as_ref())
        })?;

    // The reader must be running before the pacing loop starts.
    ready_rx.recv().map_err(|_| ProbeError::ReaderLost)?;

    let sent = sender::run(&stream, config, clock.as_ref());
    if sent.is_err() {
        // Unblock the reader so the join below cannot hang on a dead trial.
        let _ = stream.shutdown(Shutdown::Both);
    }

    // Join barrier: the trial is over only once the reader has timed the
    // last echo.
    let read = reader_thread.join().map_err(|_| ProbeError::ReaderLost)?;
    sent?;
    read
}

/// Zero-argument mode: for each trial, exercise both blocking and busy
/// transports against a private acceptor on an ephemeral port.
pub fn self_test(
    config: &TrialConfig,
    clock: &Arc<dyn Clock>,
) -> Result<Vec<TrialReport>, ProbeError> {
    let mut reports = Vec::with_capacity(config.tests as usize * 2);
    for test in 0..config.tests {
        for busy in [false, true] {
            let trial_config = TrialConfig {
                busy,
                ..config.clone()
            };
            let acceptor = Acceptor::bind(0, busy)?;
            let port = acceptor.local_port()?;
            info!(
                "self-test {}/{}: busy={} port={}",
                test + 1,
                config.tests,
                busy,
                port
            );

            let cancel = CancelToken::new();
            let acceptor_thread = {
                let cancel = cancel.clone();
                thread::Builder::new()
                    .name("hiccup-acceptor".into())
                    .spawn(move || acceptor.run(&cancel))?
            };

            let result = run_trial("127.0.0.1", port, &trial_config, clock);

            cancel.cancel();
            match acceptor_thread.join() {
                Ok(Ok(AcceptOutcome::Cancelled)) => {}
                Ok(Err(e)) => warn!("acceptor exited with error: {}", e),
                Err(_) => warn!("acceptor thread panicked"),
            }

            let report = result?;
            println!("{}", report);
            reports.push(report);
        }
    }
    Ok(reports)
}

/// One-argument mode: run the echo responder indefinitely.
pub fn serve(port: u16, busy: bool) -> Result<(), ProbeError> {
    let acceptor = Acceptor::bind(port, busy)?;
    // The token is never cancelled here; run only returns on error.
    match acceptor.run(&CancelToken::new())? {
        AcceptOutcome::Cancelled => Ok(()),
    }
}

/// Two-argument mode: sweep the rate ladder against a remote echo endpoint,
/// scaling run counts so wall-clock duration stays comparable.
pub fn client_sweep(
    host: &str,
    port: u16,
    config: &TrialConfig,
    clock: &Arc<dyn Clock>,
) -> Result<Vec<TrialReport>, ProbeError> {
    let mut reports = Vec::with_capacity(RATE_SWEEP.len() * config.tests as usize);
    for rate in RATE_SWEEP {
        let trial_config = config.at_rate(rate);
        for test in 0..trial_config.tests {
            info!(
                "client trial {}/{} against {}:{} at {} probes/ms",
                test + 1,
                trial_config.tests,
                host,
                port,
                rate
            );
            let report = run_trial(host, port, &trial_config, clock)?;
            println!("{}", report);
            reports.push(report);
        }
    }
    Ok(reports)
}
