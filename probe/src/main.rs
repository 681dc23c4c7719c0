//! TCP hiccup probe
//!
//! Entry point and mode dispatch: no arguments runs the built-in self-test
//! sweep, one argument (port) runs the echo responder forever, two arguments
//! (host, port) sweep probe rates against a remote responder. Components
//! return typed results; process-exit decisions live only here.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hiccup_probe::clock::{Clock, MonotonicClock};
use hiccup_probe::{report, trial, ProbeError, TrialConfig};

#[derive(Parser, Debug)]
#[command(name = "hiccup")]
#[command(about = "Measure TCP round-trip latency hiccups", long_about = None)]
#[command(version)]
struct Args {
    /// With PORT: remote host to probe. Alone: port to serve echoes on.
    target: Option<String>,

    /// Remote port (client mode)
    port: Option<u16>,

    /// Probes excluded from statistics while the connection warms up
    #[arg(long, env = "HICCUP_WARMUP", default_value_t = 12_000)]
    warmup: u32,

    /// Measured probes per trial
    #[arg(long, env = "HICCUP_RUNS", default_value_t = 1_000_000)]
    runs: u32,

    /// Probes per millisecond
    #[arg(long, env = "HICCUP_RATE", default_value_t = 25)]
    rate: u32,

    /// Busy mode: non-blocking sockets with spin-polling
    #[arg(long, env = "HICCUP_BUSY")]
    busy: bool,

    /// Trials per mode
    #[arg(long, env = "HICCUP_TESTS", default_value_t = 3)]
    tests: u32,

    /// Also write the trial reports to this JSON file
    #[arg(long)]
    json: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(&args) {
        error!("{:#}", e);
        let code = e
            .downcast_ref::<ProbeError>()
            .map_or(1, ProbeError::exit_code);
        std::process::exit(code);
    }
}

fn run(args: &Args) -> Result<()> {
    let config = TrialConfig {
        warmup: args.warmup,
        runs: args.runs,
        rate_per_milli: args.rate,
        busy: args.busy,
        tests: args.tests,
    };
    config.validate()?;

    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());

    let reports = match (&args.target, args.port) {
        (None, _) => trial::self_test(&config, &clock)?,
        (Some(port), None) => {
            let port: u16 = port
                .parse()
                .with_context(|| format!("server port must be a number, got {:?}", port))?;
            trial::serve(port, config.busy)?;
            return Ok(());
        }
        (Some(host), Some(port)) => trial::client_sweep(host, port, &config, &clock)?,
    };

    if let Some(path) = &args.json {
        report::write_json(path, &reports)?;
    }

    Ok(())
}

/// Logs go to stderr so the percentile table on stdout stays clean.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
