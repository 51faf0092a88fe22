//! Base32 prefix checking without producing the full encoding.

/// RFC 4648 base32 alphabet, lowercase.
pub const ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Reports whether the lowercase base32 (RFC 4648, no padding) encoding of
/// `data` starts with `prefix`, decoding only the 5-bit groups the prefix
/// covers. `prefix` must already be validated base32; uppercase letters are
/// folded before comparison.
pub fn has_prefix(data: &[u8], prefix: &str) -> bool {
    let prefix = prefix.as_bytes();
    if prefix.is_empty() {
        return true;
    }

    let max_chars = (data.len() * 8 + 4) / 5;
    if prefix.len() > max_chars {
        return false;
    }

    for (i, &want) in prefix.iter().enumerate() {
        let bit_offset = i * 5;
        let byte_idx = bit_offset / 8;
        let bit_idx = bit_offset % 8;

        let val = if bit_idx <= 3 {
            (data[byte_idx] >> (3 - bit_idx)) & 0x1f
        } else {
            // 5-bit group straddles two bytes; the second may not exist
            // for the final partial group.
            let mut v = (data[byte_idx] << (bit_idx - 3)) & 0x1f;
            if byte_idx + 1 < data.len() {
                v |= data[byte_idx + 1] >> (11 - bit_idx);
            }
            v
        };

        if ALPHABET[val as usize] != want.to_ascii_lowercase() {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(data: &[u8]) -> String {
        base32::encode(base32::Alphabet::Rfc4648Lower { padding: false }, data)
    }

    #[test]
    fn agrees_with_full_encoding() {
        let samples: [&[u8]; 5] = [
            &[0x00],
            &[0xff, 0x00, 0xff],
            &[0xde, 0xad, 0xbe, 0xef, 0x01, 0x23, 0x45, 0x67],
            b"the quick brown fox",
            &[0x8a; 32],
        ];

        for data in samples {
            let full = encode(data);
            for len in 0..=full.len() {
                assert!(
                    has_prefix(data, &full[..len]),
                    "prefix {:?} of {:?} should match",
                    &full[..len],
                    data
                );
            }
        }
    }

    #[test]
    fn rejects_wrong_character_at_every_position() {
        let data = [0x13, 0x37, 0xc0, 0xde, 0x42];
        let full = encode(&data);
        for i in 0..full.len() {
            let mut bad = full.clone().into_bytes();
            bad[i] = if bad[i] == b'a' { b'b' } else { b'a' };
            let bad = String::from_utf8(bad).unwrap();
            assert!(!has_prefix(&data, &bad[..=i]));
        }
    }

    #[test]
    fn empty_prefix_matches_anything() {
        assert!(has_prefix(&[], ""));
        assert!(has_prefix(&[0xab], ""));
    }

    #[test]
    fn prefix_longer_than_encoding_never_matches() {
        let data = [0xffu8; 2]; // encodes to 4 characters
        assert!(!has_prefix(&data, "77777"));
    }

    #[test]
    fn uppercase_prefix_is_folded() {
        let data = [0xde, 0xad, 0xbe, 0xef];
        let full = encode(&data);
        assert!(has_prefix(&data, &full[..4].to_uppercase()));
    }
}
