//! Address schemes for the supported overlay networks.
//!
//! Each network pairs a candidate type (the key material a worker mutates
//! in place) with the rules for turning key material into a base32 address.

mod i2p;
mod torv3;

pub use i2p::{I2pCandidate, DESTINATION_LEN};
pub use torv3::TorV3Candidate;

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::SearchError;

/// Overlay network an address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    I2p,
    TorV3,
}

impl Network {
    /// Address suffix appended to the base32 form.
    pub fn suffix(self) -> &'static str {
        match self {
            Network::I2p => ".b32.i2p",
            Network::TorV3 => ".onion",
        }
    }

    /// Longest prefix a caller may search for on this network.
    pub fn max_prefix_len(self) -> usize {
        match self {
            Network::I2p => 52,
            Network::TorV3 => 56,
        }
    }

    /// Whether a GPU worker can take part in the search. I2P hashes the
    /// whole destination on the device; Tor v3 is GPU-assisted, with key
    /// generation staying on the host.
    pub fn supports_gpu(self) -> bool {
        match self {
            Network::I2p => true,
            Network::TorV3 => true,
        }
    }

    /// Checks a caller-supplied prefix against the network's rules.
    /// Uppercase input is acceptable; it is folded before matching.
    pub fn validate_prefix(self, prefix: &str) -> Result<(), SearchError> {
        if prefix.is_empty() {
            return Err(SearchError::InvalidPrefix(
                "prefix cannot be empty".into(),
            ));
        }
        if prefix.len() > self.max_prefix_len() {
            return Err(SearchError::InvalidPrefix(format!(
                "prefix cannot exceed {} characters",
                self.max_prefix_len()
            )));
        }
        for (i, c) in prefix.to_lowercase().chars().enumerate() {
            if !matches!(c, 'a'..='z' | '2'..='7') {
                return Err(SearchError::InvalidPrefix(format!(
                    "invalid character '{c}' at position {i} (allowed: a-z, 2-7)"
                )));
            }
        }
        Ok(())
    }

    /// Average number of attempts to find a prefix of the given length
    /// over the 32-symbol alphabet: 32^len / 2.
    pub fn estimate_attempts(self, prefix_len: usize) -> f64 {
        if prefix_len == 0 {
            return 1.0;
        }
        32f64.powi(prefix_len as i32) / 2.0
    }

    /// Creates a fresh random candidate for this network.
    pub fn new_candidate(self) -> Result<Candidate, SearchError> {
        match self {
            Network::I2p => Ok(Candidate::I2p(I2pCandidate::generate()?)),
            Network::TorV3 => Ok(Candidate::TorV3(TorV3Candidate::generate()?)),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::I2p => write!(f, "i2p"),
            Network::TorV3 => write!(f, "torv3"),
        }
    }
}

impl FromStr for Network {
    type Err = std::convert::Infallible;

    // Unknown names are read as I2P.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "torv3" => Ok(Network::TorV3),
            _ => Ok(Network::I2p),
        }
    }
}

/// A generated keypair together with its derived address, owned by the
/// worker that produced it until a match hands it to the caller.
pub enum Candidate {
    I2p(I2pCandidate),
    TorV3(TorV3Candidate),
}

impl Candidate {
    /// The base32 address without the network suffix.
    pub fn address(&self) -> String {
        match self {
            Candidate::I2p(c) => c.address(),
            Candidate::TorV3(c) => c.address(),
        }
    }

    /// The complete address including the network suffix.
    pub fn full_address(&self) -> String {
        match self {
            Candidate::I2p(c) => c.full_address(),
            Candidate::TorV3(c) => c.full_address(),
        }
    }

    /// Writes the private key material to disk. For I2P `path` names a
    /// single key file; for Tor v3 it names a hidden-service directory.
    pub fn save_keys(&self, path: &Path) -> Result<(), SearchError> {
        match self {
            Candidate::I2p(c) => c.save_keys(path),
            Candidate::TorV3(c) => c.save_keys(path),
        }
    }
}

/// Writes `bytes` to `path` via a temporary sibling and a rename, so a
/// crash never leaves a partially written key file. Mode 0600 on Unix.
pub(crate) fn write_key_file(path: &Path, bytes: &[u8]) -> Result<(), SearchError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    fs::write(&tmp, bytes)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
