//! TCP hiccup probe engine
//!
//! Measures round-trip latency anomalies caused by OS/network scheduling
//! jitter. A sender paces fixed 12-byte timestamped probes over one TCP
//! connection to a byte-exact echo endpoint; a concurrent reader times their
//! return and reports latency percentiles.

pub mod acceptor;
pub mod clock;
pub mod config;
pub mod error;
pub mod reader;
pub mod report;
pub mod retry;
pub mod sender;
pub mod sockets;
pub mod stats;
pub mod trial;

pub use config::TrialConfig;
pub use error::ProbeError;
pub use report::TrialReport;
