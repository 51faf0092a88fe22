//! Parallel vanity address search for the I2P and Tor v3 overlay networks.
//!
//! Addresses on both networks are digests of public keys, so the only way
//! to obtain one with a chosen base32 prefix is brute force. This crate
//! provides the data models for both address schemes, CPU worker loops
//! with disjoint counter partitions, an optional OpenCL offload path
//! (feature `opencl`), and a coordinator that delivers exactly one result
//! and shuts every worker down cleanly.
//!
//! ```no_run
//! use overlay_vanity::{Generator, Network};
//!
//! let generator = Generator::new(Network::TorV3, "ab", 4, false, 0);
//! let (results, _stats) = generator.start()?;
//! if let Ok(result) = results.recv() {
//!     println!("{} after {} attempts", result.address, result.attempts);
//!     result.candidate.save_keys("./keys".as_ref())?;
//! }
//! # Ok::<(), overlay_vanity::SearchError>(())
//! ```

pub mod address;
mod b32;
mod error;
pub mod gpu;
pub mod search;

pub use address::{Candidate, I2pCandidate, Network, TorV3Candidate};
pub use b32::has_prefix as has_base32_prefix;
pub use error::SearchError;
pub use gpu::{available as gpu_available, list_devices, DeviceInfo};
pub use search::{Generator, SearchResult, SearchStats};
