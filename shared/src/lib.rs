//! Wire codec shared by the hiccup probe sender and reader
//!
//! This crate contains the probe frame format that the sender and reader must
//! agree on bit-for-bit, even when built independently.

pub mod probe;

// Re-export commonly used types
pub use probe::{Probe, ProbeCodecError, PROBE_SIZE};
