//! Probe frame format.
//!
//! Every probe is exactly 12 bytes in machine-native byte order: bytes 0-3
//! hold the 1-based sequence number as an `i32`, bytes 4-11 the scheduled
//! send instant as an `i64` nanosecond timestamp. The echo side mirrors these
//! bytes verbatim and never interprets them, so the only parties that must
//! agree on the layout are the sender and reader of one trial.

use thiserror::Error;

/// Encoded size of one probe, on every platform.
pub const PROBE_SIZE: usize = 12;

/// Errors from decoding a probe out of a raw byte slice.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProbeCodecError {
    #[error("probe frame truncated: got {len} bytes, need {PROBE_SIZE}")]
    Truncated { len: usize },
}

/// One timestamped sequence number as it travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    /// 1-based sequence number, incremented per probe within a trial.
    pub sequence: i32,
    /// Scheduled send instant, nanoseconds on the sender's monotonic clock.
    pub send_instant_nanos: i64,
}

impl Probe {
    /// Encode into a fixed 12-byte frame.
    pub fn encode(&self) -> [u8; PROBE_SIZE] {
        let mut frame = [0u8; PROBE_SIZE];
        frame[..4].copy_from_slice(&self.sequence.to_ne_bytes());
        frame[4..].copy_from_slice(&self.send_instant_nanos.to_ne_bytes());
        frame
    }

    /// Decode from a complete 12-byte frame.
    pub fn decode(frame: &[u8; PROBE_SIZE]) -> Self {
        let mut seq = [0u8; 4];
        seq.copy_from_slice(&frame[..4]);
        let mut instant = [0u8; 8];
        instant.copy_from_slice(&frame[4..]);
        Self {
            sequence: i32::from_ne_bytes(seq),
            send_instant_nanos: i64::from_ne_bytes(instant),
        }
    }

    /// Decode from an arbitrary slice, validating the length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProbeCodecError> {
        let frame: &[u8; PROBE_SIZE] = bytes
            .get(..PROBE_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or(ProbeCodecError::Truncated { len: bytes.len() })?;
        Ok(Self::decode(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_is_always_12_bytes() {
        let probe = Probe {
            sequence: i32::MAX,
            send_instant_nanos: i64::MAX,
        };
        assert_eq!(probe.encode().len(), PROBE_SIZE);
        assert_eq!(PROBE_SIZE, 12);
    }

    #[test]
    fn test_roundtrip() {
        let probe = Probe {
            sequence: 42,
            send_instant_nanos: 1_234_567_890_123,
        };
        let frame = probe.encode();
        assert_eq!(Probe::decode(&frame), probe);
        assert_eq!(Probe::from_bytes(&frame).unwrap(), probe);
    }

    #[test]
    fn test_field_offsets() {
        let probe = Probe {
            sequence: 7,
            send_instant_nanos: 9,
        };
        let frame = probe.encode();
        assert_eq!(&frame[..4], &7i32.to_ne_bytes());
        assert_eq!(&frame[4..], &9i64.to_ne_bytes());
    }

    #[test]
    fn test_truncated_slice_fails() {
        let frame = Probe {
            sequence: 1,
            send_instant_nanos: 1,
        }
        .encode();
        let err = Probe::from_bytes(&frame[..7]).unwrap_err();
        assert_eq!(err, ProbeCodecError::Truncated { len: 7 });
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        // A frame followed by the start of the next probe still decodes.
        let mut bytes = Probe {
            sequence: 3,
            send_instant_nanos: 5,
        }
        .encode()
        .to_vec();
        bytes.extend_from_slice(&[0xAA; 5]);
        let probe = Probe::from_bytes(&bytes).unwrap();
        assert_eq!(probe.sequence, 3);
        assert_eq!(probe.send_instant_nanos, 5);
    }
}
