//! Echo responder: accepts one connection at a time and mirrors bytes
//! verbatim.
//!
//! The payload is never interpreted; the responder works for any probe
//! format. Per-connection I/O errors close that connection but never the
//! accept loop. Cancellation is cooperative and typed: a cancelled accept is
//! an expected outcome, not a failure.

use std::io::{self, Read};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::ProbeError;
use crate::retry;
use crate::sockets;

/// Bind attempts before giving up.
pub const BIND_ATTEMPTS: u32 = 3;

/// Fixed delay between bind attempts.
pub const BIND_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Idle pause between accept polls while no connection is pending.
const ACCEPT_POLL: Duration = Duration::from_millis(1);

const ECHO_BUF_SIZE: usize = 64 * 1024;

/// Cooperative cancellation signal shared with the accept loop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How an accept loop ended without failing.
#[derive(Debug, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// Cooperatively cancelled; the listening socket has been closed.
    Cancelled,
}

/// Listening echo endpoint.
#[derive(Debug)]
pub struct Acceptor {
    listener: TcpListener,
    busy: bool,
}

impl Acceptor {
    /// Bind the listening socket, retrying a bounded number of times with a
    /// fixed backoff before failing fatally.
    pub fn bind(port: u16, busy: bool) -> Result<Self, ProbeError> {
        let listener =
            retry::retry_with_fixed_delay("bind", BIND_ATTEMPTS, BIND_RETRY_DELAY, || {
                TcpListener::bind(("0.0.0.0", port))
            })
            .map_err(|source| ProbeError::BindExhausted {
                port,
                attempts: BIND_ATTEMPTS,
                source,
            })?;
        Ok(Self { listener, busy })
    }

    /// Actual bound port; useful when binding port 0 for self-test.
    pub fn local_port(&self) -> io::Result<u16> {
        Ok(self.listener.local_addr()?.port())
    }

    /// Accept and echo connections until cancelled. A pending accept
    /// observes cancellation and returns `Ok(Cancelled)`; the listener is
    /// closed on return.
    pub fn run(&self, cancel: &CancelToken) -> Result<AcceptOutcome, ProbeError> {
        // Accepts poll non-blocking so cancellation can interleave.
        self.listener.set_nonblocking(true)?;
        info!("accepting connections on :{}", self.local_port()?);

        loop {
            if cancel.is_cancelled() {
                return Ok(AcceptOutcome::Cancelled);
            }
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    info!("connection from {}", peer);
                    match self.echo(stream, cancel) {
                        Ok(bytes) => info!("disconnected from {} after {} bytes", peer, bytes),
                        Err(e) => warn!("connection to {} failed: {}", peer, e),
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Copy all bytes read back to the same connection until end-of-stream.
    fn echo(&self, stream: TcpStream, cancel: &CancelToken) -> io::Result<u64> {
        stream.set_nodelay(true)?;
        // Accepted sockets do not inherit the listener's mode everywhere;
        // set it explicitly.
        stream.set_nonblocking(self.busy)?;

        let mut buf = vec![0u8; ECHO_BUF_SIZE];
        let mut echoed = 0u64;
        loop {
            let n = match (&stream).read(&mut buf) {
                Ok(0) => return Ok(echoed),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if cancel.is_cancelled() {
                        return Ok(echoed);
                    }
                    std::hint::spin_loop();
                    continue;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            sockets::write_all_spin(&stream, &buf[..n])?;
            echoed += n as u64;
        }
    }
}
