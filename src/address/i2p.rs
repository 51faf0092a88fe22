//! I2P destination candidates.
//!
//! An I2P destination is a 391-byte blob: a 256-byte ElGamal encryption
//! public-key area, a 128-byte signing-key area (96 bytes of zero padding
//! followed by a 32-byte Ed25519 public key), and a 7-byte key certificate.
//! The `.b32.i2p` address is the SHA-256 of the blob, base32-encoded.
//!
//! The search mutates only the first 8 bytes of the encryption-key area
//! (a little-endian counter), so each iteration costs one SHA-256 over the
//! 391 bytes and a prefix check on the digest.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::address::write_key_file;
use crate::b32;
use crate::error::SearchError;

/// Total size of the serialized destination.
pub const DESTINATION_LEN: usize = 391;

const ENC_KEY_LEN: usize = 256;
const SIGNING_KEY_PADDING: usize = 96;
const SIGNING_AREA_LEN: usize = 128;
const CERT_OFFSET: usize = ENC_KEY_LEN + SIGNING_AREA_LEN;

const CERT_TYPE_KEY: u8 = 5;
const CERT_PAYLOAD_LEN: u8 = 4;
const SIGTYPE_EDDSA_SHA512_ED25519: u8 = 7;
const CRYPTO_TYPE_ELGAMAL: u8 = 0;

/// An I2P destination with its private key material.
pub struct I2pCandidate {
    raw: [u8; DESTINATION_LEN],
    signing_key: SigningKey,
    encryption_private_key: [u8; ENC_KEY_LEN],
}

impl I2pCandidate {
    /// Generates a destination with a fresh Ed25519 signing keypair and
    /// random encryption-key material.
    pub fn generate() -> Result<Self, SearchError> {
        let mut seed = [0u8; 32];
        fill_random(&mut seed)?;
        let signing_key = SigningKey::from_bytes(&seed);

        let mut raw = [0u8; DESTINATION_LEN];
        // Encryption public-key area is random; the I2P router only
        // verifies the signing key for b32 lookups.
        fill_random(&mut raw[..ENC_KEY_LEN])?;

        let mut encryption_private_key = [0u8; ENC_KEY_LEN];
        fill_random(&mut encryption_private_key)?;

        // Signing-key area: 96 zero bytes of padding, then the Ed25519
        // public key (already zeroed by array init).
        raw[ENC_KEY_LEN + SIGNING_KEY_PADDING..CERT_OFFSET]
            .copy_from_slice(&signing_key.verifying_key().to_bytes());

        // Key certificate: type(1) + length(2, BE) + sigtype(2, BE) +
        // cryptotype(2, BE).
        raw[CERT_OFFSET] = CERT_TYPE_KEY;
        raw[CERT_OFFSET + 1] = 0;
        raw[CERT_OFFSET + 2] = CERT_PAYLOAD_LEN;
        raw[CERT_OFFSET + 3] = 0;
        raw[CERT_OFFSET + 4] = SIGTYPE_EDDSA_SHA512_ED25519;
        raw[CERT_OFFSET + 5] = 0;
        raw[CERT_OFFSET + 6] = CRYPTO_TYPE_ELGAMAL;

        Ok(Self {
            raw,
            signing_key,
            encryption_private_key,
        })
    }

    /// The raw destination bytes, used as the GPU hash template.
    pub fn raw(&self) -> &[u8; DESTINATION_LEN] {
        &self.raw
    }

    /// Embeds `counter` as little-endian bytes at the start of the
    /// encryption-key area. Bytes `[8..391)` are untouched.
    pub fn mutate_encryption_key(&mut self, counter: u64) {
        self.raw[..8].copy_from_slice(&counter.to_le_bytes());
    }

    /// SHA-256 digest of the current destination.
    pub fn digest(&self) -> [u8; 32] {
        Sha256::digest(self.raw).into()
    }

    /// Applies `counter` and reports whether the resulting address starts
    /// with `prefix`. On a hit the candidate is left in the matching state.
    pub fn mutate_and_check(&mut self, counter: u64, prefix: &str) -> bool {
        self.mutate_encryption_key(counter);
        b32::has_prefix(&self.digest(), prefix)
    }

    /// The 52-character base32 address without the suffix.
    pub fn address(&self) -> String {
        base32::encode(
            base32::Alphabet::Rfc4648Lower { padding: false },
            &self.digest(),
        )
    }

    /// The complete `.b32.i2p` address.
    pub fn full_address(&self) -> String {
        self.address() + ".b32.i2p"
    }

    /// Writes a single 679-byte key file: destination (391) followed by
    /// the encryption private key (256) and the Ed25519 seed (32).
    pub fn save_keys(&self, path: &Path) -> Result<(), SearchError> {
        let mut buf = Vec::with_capacity(DESTINATION_LEN + ENC_KEY_LEN + 32);
        buf.extend_from_slice(&self.raw);
        buf.extend_from_slice(&self.encryption_private_key);
        buf.extend_from_slice(&self.signing_key.to_bytes());
        write_key_file(path, &buf)
    }
}

fn fill_random(buf: &mut [u8]) -> Result<(), SearchError> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| SearchError::Randomness(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_layout() {
        let cand = I2pCandidate::generate().unwrap();
        let raw = cand.raw();

        // zero padding before the signing public key
        assert!(raw[ENC_KEY_LEN..ENC_KEY_LEN + SIGNING_KEY_PADDING]
            .iter()
            .all(|&b| b == 0));

        // Ed25519 public key sits at [352..384)
        assert_eq!(
            &raw[352..384],
            cand.signing_key.verifying_key().to_bytes().as_slice()
        );

        // key certificate
        assert_eq!(&raw[384..], &[5, 0, 4, 0, 7, 0, 0]);
    }

    #[test]
    fn mutate_writes_counter_and_preserves_rest() {
        let mut cand = I2pCandidate::generate().unwrap();
        let before = *cand.raw();

        cand.mutate_encryption_key(0x1122_3344_5566_7788);
        let after = cand.raw();

        assert_eq!(&after[..8], &0x1122_3344_5566_7788u64.to_le_bytes());
        assert_eq!(&after[8..], &before[8..]);
    }

    #[test]
    fn address_is_52_lowercase_base32_chars() {
        let cand = I2pCandidate::generate().unwrap();
        let addr = cand.address();
        assert_eq!(addr.len(), 52);
        assert!(addr.chars().all(|c| matches!(c, 'a'..='z' | '2'..='7')));
        assert!(cand.full_address().ends_with(".b32.i2p"));
    }

    #[test]
    fn mutate_and_check_matches_own_address() {
        let mut cand = I2pCandidate::generate().unwrap();
        cand.mutate_encryption_key(42);
        let addr = cand.address();

        assert!(cand.mutate_and_check(42, &addr));
        assert!(cand.mutate_and_check(42, &addr[..10]));
        // a different counter produces a different digest
        assert!(!cand.mutate_and_check(43, &addr));
    }

    #[test]
    fn save_keys_writes_679_bytes() {
        let cand = I2pCandidate::generate().unwrap();
        let dir = std::env::temp_dir().join(format!("i2p-keys-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("destination.key");

        cand.save_keys(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 679);
        assert_eq!(&bytes[..DESTINATION_LEN], cand.raw().as_slice());
        assert_eq!(
            &bytes[DESTINATION_LEN + ENC_KEY_LEN..],
            cand.signing_key.to_bytes().as_slice()
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        std::fs::remove_dir_all(&dir).ok();
    }
}
