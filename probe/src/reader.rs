//! Result reader: reassembles echoed probes, validates ordering, samples
//! round-trip latency.
//!
//! Runs on its own thread over a clone of the trial connection while the
//! sender writes on the original (full-duplex split, no shared state). A
//! read may return fewer than 12 bytes or span two probes, so decoding is
//! resumable across I/O calls.

use std::net::TcpStream;

use tracing::debug;

use hiccup_shared::{Probe, PROBE_SIZE};

use crate::clock::Clock;
use crate::config::TrialConfig;
use crate::error::ProbeError;
use crate::report::TrialReport;
use crate::sockets;
use crate::stats::LatencyHistogram;

/// Rolling byte buffer that yields complete probes from arbitrary-sized
/// reads, compacting after each extraction.
#[derive(Debug, Default)]
pub struct ProbeAssembler {
    buf: Vec<u8>,
}

impl ProbeAssembler {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(4096),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Next complete probe, if at least one full frame is buffered.
    pub fn next_probe(&mut self) -> Option<Probe> {
        if self.buf.len() < PROBE_SIZE {
            return None;
        }
        let mut frame = [0u8; PROBE_SIZE];
        frame.copy_from_slice(&self.buf[..PROBE_SIZE]);
        self.buf.drain(..PROBE_SIZE);
        Some(Probe::decode(&frame))
    }

    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

/// Read and time all echoed probes for one trial, then build the percentile
/// report. The connection clone is released on every exit path.
pub fn run(
    stream: TcpStream,
    config: &TrialConfig,
    clock: &dyn Clock,
) -> Result<TrialReport, ProbeError> {
    debug!("starting reader for {} probes", config.total());

    let mut warmup = LatencyHistogram::new()?;
    let mut measured = LatencyHistogram::new()?;
    let mut assembler = ProbeAssembler::new();
    let mut chunk = [0u8; 4096];

    for i in 1..=config.total() {
        let probe = loop {
            if let Some(probe) = assembler.next_probe() {
                break probe;
            }
            let n = sockets::read_spin(&stream, &mut chunk)?;
            if n == 0 {
                return Err(ProbeError::UnexpectedEof {
                    received: i - 1,
                    expected: config.total(),
                });
            }
            assembler.extend(&chunk[..n]);
        };

        if probe.sequence != i as i32 {
            return Err(ProbeError::SequenceMismatch {
                expected: i as i32,
                actual: probe.sequence,
            });
        }

        let took = clock.now_nanos() - probe.send_instant_nanos;
        if i <= config.warmup {
            warmup.sample(took);
        } else {
            measured.sample(took);
        }
    }

    debug!("reader done, {} measured samples", measured.count());
    Ok(TrialReport::build(&measured, config))
}
