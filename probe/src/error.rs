//! Typed errors for the probe engine.
//!
//! Components never terminate the process themselves; they return these and
//! the binary's `main` maps them to diagnostics and exit codes.

use std::io;
use thiserror::Error;

/// Fatal conditions for a probe trial or the echo responder.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Bind retries exhausted.
    #[error("failed to bind port {port} after {attempts} attempts: {source}")]
    BindExhausted {
        port: u16,
        attempts: u32,
        source: io::Error,
    },

    /// Protocol violation: the transport is assumed reliable and ordered, so
    /// a gap, duplicate, or reorder means the trial is unusable.
    #[error("probe sequence mismatch: expected {expected}, got {actual}")]
    SequenceMismatch { expected: i32, actual: i32 },

    /// The peer closed the connection before the trial completed.
    #[error("connection closed after {received} of {expected} probes")]
    UnexpectedEof { received: u32, expected: u32 },

    /// The reader thread panicked before delivering an outcome.
    #[error("reader thread terminated abnormally")]
    ReaderLost,

    #[error("histogram construction failed: {0}")]
    Histogram(#[from] hdrhistogram::errors::CreationError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ProbeError {
    /// Process exit status for this failure. Protocol violations are
    /// distinguished from other fatal I/O conditions.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProbeError::SequenceMismatch { .. } => 2,
            _ => 1,
        }
    }
}
