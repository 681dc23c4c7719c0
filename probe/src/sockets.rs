//! Socket plumbing for the probe connection.
//!
//! Busy mode puts the socket in non-blocking mode, so `WouldBlock` is a
//! normal retry condition handled by true spinning, never an error. In
//! blocking mode these helpers degenerate to plain `write_all`/`read`.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

/// Connect the trial socket: `TCP_NODELAY` always, non-blocking in busy mode.
pub fn connect(addr: impl ToSocketAddrs, busy: bool) -> io::Result<TcpStream> {
    let stream = TcpStream::connect(addr)?;
    stream.set_nodelay(true)?;
    if busy {
        stream.set_nonblocking(true)?;
    }
    Ok(stream)
}

/// Write the whole buffer, spinning through `WouldBlock`.
pub fn write_all_spin(mut stream: &TcpStream, buf: &[u8]) -> io::Result<()> {
    let mut written = 0;
    while written < buf.len() {
        match stream.write(&buf[written..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "connection closed mid-frame",
                ))
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => std::hint::spin_loop(),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Read into `buf`, spinning through `WouldBlock`. Returns 0 at end of stream.
pub fn read_spin(mut stream: &TcpStream, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => std::hint::spin_loop(),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}
