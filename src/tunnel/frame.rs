use thiserror::Error;

// Constants
pub const MAGIC: [u8; 4] = *b"crap";
pub const HEADER_SIZE: usize = 8; // magic(4) + length(2) + reserved(2)
pub const MAX_PAYLOAD_SIZE: usize = 65535;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("datagram too short for frame header: got {got} of {} bytes", HEADER_SIZE)]
    TruncatedHeader { got: usize },

    #[error("bad frame magic: {found:02x?}")]
    BadMagic { found: [u8; 4] },

    #[error("frame length mismatch: header declares {declared} bytes, {actual} follow")]
    LengthMismatch { declared: usize, actual: usize },
}

/// Wrap a ciphertext payload in the wire header.
///
/// The header is `magic ++ length ++ 2 reserved bytes`, length big-endian.
/// Payloads are bounded by the interface read size, so the u16 length field
/// always fits.
pub fn encode(payload: &[u8]) -> Vec<u8> {
    assert!(
        payload.len() <= MAX_PAYLOAD_SIZE,
        "frame payload exceeds the u16 length field"
    );

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&MAGIC);
    frame.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    frame.extend_from_slice(&[0u8; 2]);
    frame.extend_from_slice(payload);
    frame
}

/// Validate a received datagram and return its ciphertext payload.
///
/// The reserved header bytes are not inspected.
pub fn decode(datagram: &[u8]) -> Result<&[u8], FrameError> {
    if datagram.len() < HEADER_SIZE {
        return Err(FrameError::TruncatedHeader {
            got: datagram.len(),
        });
    }

    if datagram[0..4] != MAGIC {
        let mut found = [0u8; 4];
        found.copy_from_slice(&datagram[0..4]);
        return Err(FrameError::BadMagic { found });
    }

    let declared = u16::from_be_bytes([datagram[4], datagram[5]]) as usize;
    let payload = &datagram[HEADER_SIZE..];
    if payload.len() != declared {
        return Err(FrameError::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let payload = b"not actually encrypted";
        let frame = encode(payload);

        assert_eq!(frame.len(), HEADER_SIZE + payload.len());
        assert_eq!(decode(&frame).unwrap(), payload);
    }

    #[test]
    fn test_golden_frame_layout() {
        let frame = encode(&[0x2b, 0x02, 0x29]);

        assert_eq!(
            frame,
            [0x63, 0x72, 0x61, 0x70, 0x00, 0x03, 0x00, 0x00, 0x2b, 0x02, 0x29]
        );
        assert_eq!(decode(&frame).unwrap(), &[0x2b, 0x02, 0x29]);
    }

    #[test]
    fn test_empty_payload() {
        let frame = encode(&[]);

        assert_eq!(frame.len(), HEADER_SIZE);
        assert_eq!(decode(&frame).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn test_truncated_header() {
        let frame = encode(&[0x01]);

        for len in 0..HEADER_SIZE {
            assert_eq!(
                decode(&frame[..len]),
                Err(FrameError::TruncatedHeader { got: len })
            );
        }
    }

    #[test]
    fn test_bad_magic() {
        let mut frame = encode(&[0x2b, 0x02, 0x29]);
        frame[0] = b'x';

        assert_eq!(
            decode(&frame),
            Err(FrameError::BadMagic { found: *b"xrap" })
        );
    }

    #[test]
    fn test_length_mismatch() {
        // Declare 4 payload bytes while only 3 follow.
        let mut frame = encode(&[0x2b, 0x02, 0x29]);
        frame[5] = 4;

        assert_eq!(
            decode(&frame),
            Err(FrameError::LengthMismatch {
                declared: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_reserved_bytes_ignored() {
        let mut frame = encode(b"abc");
        frame[6] = 0xde;
        frame[7] = 0xad;

        assert_eq!(decode(&frame).unwrap(), b"abc");
    }

    #[test]
    fn test_max_payload_roundtrip() {
        let payload = vec![0x5a; MAX_PAYLOAD_SIZE];
        let frame = encode(&payload);

        assert_eq!(decode(&frame).unwrap(), payload.as_slice());
    }
}
