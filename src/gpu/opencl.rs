//! OpenCL host plumbing: device enumeration, buffer management, and
//! per-batch kernel dispatch.

use ocl::{flags, Buffer, Device, DeviceType, Platform, ProQue};

use crate::address::DESTINATION_LEN;
use crate::error::SearchError;

use super::{BatchOutcome, DeviceInfo};

const I2P_KERNEL_SRC: &str = include_str!("cl/i2p_sha256.cl");
const TORV3_KERNEL_SRC: &str = include_str!("cl/torv3_sha3.cl");

/// GPU devices across all platforms, in stable enumeration order. The
/// device index callers pass refers to a position in this list.
fn gpu_devices() -> Vec<(Platform, Device)> {
    let mut found = Vec::new();
    for platform in Platform::list() {
        if let Ok(devices) = Device::list(platform, Some(DeviceType::GPU)) {
            for device in devices {
                found.push((platform, device));
            }
        }
    }
    found
}

/// True if at least one OpenCL GPU device is present.
pub fn available() -> bool {
    !gpu_devices().is_empty()
}

/// Enumerates OpenCL GPU devices.
pub fn list_devices() -> Vec<DeviceInfo> {
    gpu_devices()
        .into_iter()
        .map(|(_, device)| DeviceInfo {
            name: device.name().unwrap_or_else(|_| "unknown".into()),
            vendor: device.vendor().unwrap_or_else(|_| "unknown".into()),
            max_work_group_size: device.max_wg_size().unwrap_or(0),
            backend: "OpenCL",
        })
        .collect()
}

fn select_device(device_index: usize) -> Result<(Platform, Device), SearchError> {
    gpu_devices()
        .get(device_index)
        .copied()
        .ok_or_else(|| {
            SearchError::GpuUnavailable(format!("no OpenCL GPU device at index {device_index}"))
        })
}

fn init_err(e: ocl::Error) -> SearchError {
    SearchError::GpuUnavailable(e.to_string())
}

fn dispatch_err(e: ocl::Error) -> SearchError {
    SearchError::GpuDispatch(e.to_string())
}

/// One compute session for the I2P scheme: the 391-byte destination
/// template is uploaded once, each dispatch hashes `batch_size`
/// counter-mutated copies.
pub struct I2pKernel {
    pro_que: ProQue,
    template: Buffer<u8>,
    prefix: Buffer<u8>,
    match_found: Buffer<i32>,
    match_counter: Buffer<u64>,
    prefix_len: u32,
    batch_size: u64,
}

impl I2pKernel {
    pub fn new(
        device_index: usize,
        template: &[u8; DESTINATION_LEN],
        prefix: &str,
        batch_size: u64,
    ) -> Result<Self, SearchError> {
        let (platform, device) = select_device(device_index)?;

        let pro_que = ProQue::builder()
            .platform(platform)
            .device(device)
            .src(I2P_KERNEL_SRC)
            .dims(batch_size as usize)
            .build()
            .map_err(init_err)?;

        let template_buf = pro_que
            .buffer_builder::<u8>()
            .len(DESTINATION_LEN)
            .flags(flags::MEM_READ_ONLY)
            .copy_host_slice(template)
            .build()
            .map_err(init_err)?;

        let prefix_buf = pro_que
            .buffer_builder::<u8>()
            .len(prefix.len())
            .flags(flags::MEM_READ_ONLY)
            .copy_host_slice(prefix.as_bytes())
            .build()
            .map_err(init_err)?;

        let match_found = pro_que
            .buffer_builder::<i32>()
            .len(1)
            .flags(flags::MEM_READ_WRITE)
            .copy_host_slice(&[0])
            .build()
            .map_err(init_err)?;

        let match_counter = pro_que
            .buffer_builder::<u64>()
            .len(1)
            .flags(flags::MEM_READ_WRITE)
            .copy_host_slice(&[0])
            .build()
            .map_err(init_err)?;

        Ok(Self {
            pro_que,
            template: template_buf,
            prefix: prefix_buf,
            match_found,
            match_counter,
            prefix_len: prefix.len() as u32,
            batch_size,
        })
    }

    /// Dispatches one batch starting at `counter_base`; blocks until the
    /// device finishes.
    pub fn run_batch(&self, counter_base: u64) -> Result<BatchOutcome, SearchError> {
        self.match_found.write(&[0i32][..]).enq().map_err(dispatch_err)?;

        let kernel = self
            .pro_que
            .kernel_builder("vanity_search")
            .arg(&self.template)
            .arg(counter_base)
            .arg(self.prefix_len)
            .arg(&self.prefix)
            .arg(&self.match_found)
            .arg(&self.match_counter)
            .global_work_size(self.batch_size as usize)
            .build()
            .map_err(dispatch_err)?;

        unsafe { kernel.enq().map_err(dispatch_err)? };
        self.pro_que.queue().finish().map_err(dispatch_err)?;

        let mut found = [0i32];
        self.match_found.read(&mut found[..]).enq().map_err(dispatch_err)?;
        let mut counter = [0u64];
        self.match_counter.read(&mut counter[..]).enq().map_err(dispatch_err)?;

        Ok(BatchOutcome {
            found: found[0] != 0,
            match_counter: counter[0],
            checked: self.batch_size,
        })
    }
}

/// One compute session for Tor v3: the host supplies a fresh batch of
/// public keys per dispatch, the device reports a matching batch index.
pub struct TorV3Kernel {
    pro_que: ProQue,
    pubkeys: Buffer<u8>,
    prefix: Buffer<u8>,
    match_found: Buffer<i32>,
    match_index: Buffer<u64>,
    prefix_len: u32,
}

impl TorV3Kernel {
    pub fn new(device_index: usize, prefix: &str, batch_size: u64) -> Result<Self, SearchError> {
        let (platform, device) = select_device(device_index)?;

        let pro_que = ProQue::builder()
            .platform(platform)
            .device(device)
            .src(TORV3_KERNEL_SRC)
            .dims(batch_size as usize)
            .build()
            .map_err(init_err)?;

        let pubkeys = pro_que
            .buffer_builder::<u8>()
            .len(batch_size as usize * 32)
            .flags(flags::MEM_READ_ONLY)
            .build()
            .map_err(init_err)?;

        let prefix_buf = pro_que
            .buffer_builder::<u8>()
            .len(prefix.len())
            .flags(flags::MEM_READ_ONLY)
            .copy_host_slice(prefix.as_bytes())
            .build()
            .map_err(init_err)?;

        let match_found = pro_que
            .buffer_builder::<i32>()
            .len(1)
            .flags(flags::MEM_READ_WRITE)
            .copy_host_slice(&[0])
            .build()
            .map_err(init_err)?;

        let match_index = pro_que
            .buffer_builder::<u64>()
            .len(1)
            .flags(flags::MEM_READ_WRITE)
            .copy_host_slice(&[0])
            .build()
            .map_err(init_err)?;

        Ok(Self {
            pro_que,
            pubkeys,
            prefix: prefix_buf,
            match_found,
            match_index,
            prefix_len: prefix.len() as u32,
        })
    }

    /// Uploads `key_count` 32-byte public keys and dispatches the
    /// checksum/prefix kernel over them.
    pub fn run_batch(&self, pubkeys: &[u8], key_count: u64) -> Result<BatchOutcome, SearchError> {
        self.pubkeys
            .write(&pubkeys[..key_count as usize * 32])
            .enq()
            .map_err(dispatch_err)?;
        self.match_found.write(&[0i32][..]).enq().map_err(dispatch_err)?;

        let kernel = self
            .pro_que
            .kernel_builder("torv3_check")
            .arg(&self.pubkeys)
            .arg(key_count as u32)
            .arg(self.prefix_len)
            .arg(&self.prefix)
            .arg(&self.match_found)
            .arg(&self.match_index)
            .global_work_size(key_count as usize)
            .build()
            .map_err(dispatch_err)?;

        unsafe { kernel.enq().map_err(dispatch_err)? };
        self.pro_que.queue().finish().map_err(dispatch_err)?;

        let mut found = [0i32];
        self.match_found.read(&mut found[..]).enq().map_err(dispatch_err)?;
        let mut index = [0u64];
        self.match_index.read(&mut index[..]).enq().map_err(dispatch_err)?;

        Ok(BatchOutcome {
            found: found[0] != 0,
            match_counter: index[0],
            checked: key_count,
        })
    }
}
