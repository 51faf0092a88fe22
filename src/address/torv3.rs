//! Tor v3 onion-service candidates.
//!
//! The `.onion` address encodes a 35-byte payload: the Ed25519 public key,
//! a 2-byte SHA3-256 checksum, and the version byte `0x03`. Instead of
//! generating a fresh keypair per attempt, a candidate is advanced in
//! place: adding the curve generator to the public point and one to the
//! private scalar yields the neighbouring keypair.

use curve25519_dalek::constants::{ED25519_BASEPOINT_POINT, ED25519_BASEPOINT_TABLE};
use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha512};
use sha3::Sha3_256;
use std::fs;
use std::path::Path;

use crate::address::write_key_file;
use crate::b32;
use crate::error::SearchError;

const SECRET_KEY_HEADER: &[u8; 32] = b"== ed25519v1-secret: type0 ==\0\0\0";
const PUBLIC_KEY_HEADER: &[u8; 32] = b"== ed25519v1-public: type0 ==\0\0\0";

/// Ed25519 key material that can be advanced cheaply through neighbouring
/// keypairs. `point` always equals `scalar * G`.
#[derive(Clone)]
pub struct TorV3Candidate {
    seed: [u8; 32],
    hash_suffix: [u8; 32],
    scalar: Scalar,
    point: EdwardsPoint,
    counter: u64,
}

impl TorV3Candidate {
    /// Creates a candidate from a random seed.
    pub fn generate() -> Result<Self, SearchError> {
        let mut seed = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| SearchError::Randomness(e.to_string()))?;
        Ok(Self::from_seed(seed))
    }

    /// Derives the clamped scalar and its public point from `seed`
    /// (RFC 8032 key expansion).
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let h = Sha512::digest(seed);

        let mut scalar_bytes = [0u8; 32];
        scalar_bytes.copy_from_slice(&h[..32]);
        scalar_bytes[0] &= 248;
        scalar_bytes[31] &= 127;
        scalar_bytes[31] |= 64;
        let scalar = Scalar::from_bytes_mod_order(scalar_bytes);

        let mut hash_suffix = [0u8; 32];
        hash_suffix.copy_from_slice(&h[32..]);

        Self {
            seed,
            hash_suffix,
            point: ED25519_BASEPOINT_TABLE * &scalar,
            scalar,
            counter: 0,
        }
    }

    /// The current 32-byte public key.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.point.compress().to_bytes()
    }

    /// The original seed the candidate was constructed from. Later
    /// `advance` steps are not derivable from it.
    pub fn seed(&self) -> [u8; 32] {
        self.seed
    }

    /// Number of `advance` steps applied since construction.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Steps to the neighbouring keypair: `point += G`, `scalar += 1`.
    pub fn advance(&mut self) {
        self.point += ED25519_BASEPOINT_POINT;
        self.scalar += Scalar::ONE;
        self.counter += 1;
    }

    /// Jumps `n` keypairs ahead in one scalar multiplication; equivalent
    /// to `n` sequential `advance` calls.
    pub fn advance_by(&mut self, n: u64) {
        let n_scalar = Scalar::from(n);
        self.point += ED25519_BASEPOINT_TABLE * &n_scalar;
        self.scalar += n_scalar;
        self.counter += n;
    }

    /// The 35-byte onion payload: pubkey (32) | checksum (2) | version (1).
    pub fn payload(&self) -> [u8; 35] {
        let pubkey = self.public_key_bytes();
        let checksum = onion_checksum(&pubkey);

        let mut payload = [0u8; 35];
        payload[..32].copy_from_slice(&pubkey);
        payload[32] = checksum[0];
        payload[33] = checksum[1];
        payload[34] = 0x03;
        payload
    }

    /// Reports whether the current address starts with `prefix`, without
    /// encoding the full address.
    pub fn check_prefix(&self, prefix: &str) -> bool {
        b32::has_prefix(&self.payload(), prefix)
    }

    /// The 56-character base32 address without the suffix.
    pub fn address(&self) -> String {
        base32::encode(
            base32::Alphabet::Rfc4648Lower { padding: false },
            &self.payload(),
        )
    }

    /// The complete `.onion` address.
    pub fn full_address(&self) -> String {
        self.address() + ".onion"
    }

    /// Writes the Tor hidden-service key files (`hs_ed25519_secret_key`,
    /// `hs_ed25519_public_key`, `hostname`) into `dir`, creating it with
    /// mode 0700.
    pub fn save_keys(&self, dir: &Path) -> Result<(), SearchError> {
        fs::create_dir_all(dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
        }

        // header (32) | scalar (32) | SHA-512(seed) second half (32)
        let mut secret = Vec::with_capacity(96);
        secret.extend_from_slice(SECRET_KEY_HEADER);
        secret.extend_from_slice(&self.scalar.to_bytes());
        secret.extend_from_slice(&self.hash_suffix);
        write_key_file(&dir.join("hs_ed25519_secret_key"), &secret)?;

        // header (32) | public key (32)
        let mut public = Vec::with_capacity(64);
        public.extend_from_slice(PUBLIC_KEY_HEADER);
        public.extend_from_slice(&self.public_key_bytes());
        write_key_file(&dir.join("hs_ed25519_public_key"), &public)?;

        write_key_file(
            &dir.join("hostname"),
            format!("{}\n", self.full_address()).as_bytes(),
        )?;

        Ok(())
    }
}

/// SHA3-256(".onion checksum" | pubkey | 0x03), first two bytes.
fn onion_checksum(pubkey: &[u8; 32]) -> [u8; 2] {
    let mut hasher = Sha3_256::new();
    hasher.update(b".onion checksum");
    hasher.update(pubkey);
    hasher.update([0x03]);
    let sum = hasher.finalize();
    [sum[0], sum[1]]
}
