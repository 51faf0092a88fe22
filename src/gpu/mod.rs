//! Batched GPU hashing for the search hot loops.
//!
//! Compiled against OpenCL when the `opencl` feature is enabled;
//! otherwise this module is a stub that reports no devices, and the
//! search runs CPU-only with identical semantics.

#[cfg(feature = "opencl")]
mod opencl;

#[cfg(feature = "opencl")]
pub use opencl::{available, list_devices, I2pKernel, TorV3Kernel};

/// A detected GPU compute device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub vendor: String,
    pub max_work_group_size: usize,
    pub backend: &'static str,
}

/// Outcome of one kernel dispatch.
#[derive(Debug, Clone, Copy)]
pub struct BatchOutcome {
    pub found: bool,
    /// Matching counter (I2P) or batch index (Tor v3); meaningful only
    /// when `found` is set.
    pub match_counter: u64,
    /// Hashes computed in this dispatch.
    pub checked: u64,
}

#[cfg(not(feature = "opencl"))]
mod stub {
    use crate::address::DESTINATION_LEN;
    use crate::error::SearchError;

    use super::BatchOutcome;

    /// Always false in builds without GPU support.
    pub fn available() -> bool {
        false
    }

    pub fn list_devices() -> Vec<super::DeviceInfo> {
        Vec::new()
    }

    fn unavailable() -> SearchError {
        SearchError::GpuUnavailable("built without the `opencl` feature".into())
    }

    pub struct I2pKernel {
        _private: (),
    }

    impl I2pKernel {
        pub fn new(
            _device_index: usize,
            _template: &[u8; DESTINATION_LEN],
            _prefix: &str,
            _batch_size: u64,
        ) -> Result<Self, SearchError> {
            Err(unavailable())
        }

        pub fn run_batch(&self, _counter_base: u64) -> Result<BatchOutcome, SearchError> {
            Err(unavailable())
        }
    }

    pub struct TorV3Kernel {
        _private: (),
    }

    impl TorV3Kernel {
        pub fn new(
            _device_index: usize,
            _prefix: &str,
            _batch_size: u64,
        ) -> Result<Self, SearchError> {
            Err(unavailable())
        }

        pub fn run_batch(
            &self,
            _pubkeys: &[u8],
            _key_count: u64,
        ) -> Result<BatchOutcome, SearchError> {
            Err(unavailable())
        }
    }
}

#[cfg(not(feature = "opencl"))]
pub use stub::{available, list_devices, I2pKernel, TorV3Kernel};
