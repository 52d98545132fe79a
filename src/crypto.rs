//! Repeating-key stream cipher.
//!
//! Byte-wise XOR against a short key cycled to the data's length. It offers
//! no real confidentiality; it is what the wire protocol carries. A stronger
//! implementation can replace it behind the same `transform(data, key)`
//! contract, since both directions of the tunnel go through this single
//! seam.

/// XOR `data` with `key` repeated to the data's length.
///
/// The transform is its own inverse: applying it twice with the same key
/// recovers the input. Stateless, so concurrent callers on independent
/// buffers are fine.
///
/// The key must be non-empty; configuration validation rejects empty keys
/// before the tunnel starts.
pub fn transform(data: &[u8], key: &[u8]) -> Vec<u8> {
    assert!(!key.is_empty(), "cipher key must not be empty");

    data.iter()
        .zip(key.iter().cycle())
        .map(|(byte, k)| byte ^ k)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golden_vector() {
        let key = [0x2a, 0x00];
        let packet = [0x01, 0x02, 0x03];

        let ciphertext = transform(&packet, &key);
        assert_eq!(ciphertext, [0x2b, 0x02, 0x29]);

        let plaintext = transform(&ciphertext, &key);
        assert_eq!(plaintext, packet);
    }

    #[test]
    fn test_involution() {
        let key = b"secret";

        for len in [0usize, 1, 5, 6, 7, 64, 1500] {
            let data: Vec<u8> = (0..len).map(|i| (i * 31 % 251) as u8).collect();
            assert_eq!(transform(&transform(&data, key), key), data);
        }
    }

    #[test]
    fn test_single_byte_key() {
        let data = [0xff, 0x00, 0xa5];

        assert_eq!(transform(&data, &[0xff]), [0x00, 0xff, 0x5a]);
    }

    #[test]
    fn test_key_longer_than_data() {
        let data = [0x10, 0x20];
        let key = [0x01, 0x02, 0x03, 0x04];

        assert_eq!(transform(&data, &key), [0x11, 0x22]);
    }

    #[test]
    fn test_empty_data() {
        assert!(transform(&[], b"key").is_empty());
    }
}
