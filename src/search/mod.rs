//! Parallel search coordination.
//!
//! `Generator::start` spawns one thread per CPU worker plus an optional
//! GPU worker, a stats reporter, and a supervisor that joins everything
//! and closes both output streams. Workers share three pieces of state:
//! a monotonic attempt counter, a one-shot `found` flag whose
//! compare-and-swap elects the single result publisher, and a cooperative
//! cancellation flag.

mod cpu;
mod gpu_worker;

use crossbeam_channel::{bounded, Receiver};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::address::{Candidate, Network};
use crate::error::SearchError;
use crate::gpu;

/// Iterations between cancellation polls in the CPU hot loops.
pub(crate) const CPU_POLL_BATCH: u64 = 1024;

/// Interval between stats snapshots.
pub const STATS_INTERVAL: Duration = Duration::from_millis(250);

/// Each worker owns the 48-bit counter range selected by its id in the
/// top 16 bits; ranges are disjoint and far larger than any realistic run.
pub(crate) const PARTITION_SHIFT: u32 = 48;

/// A successfully found vanity address.
pub struct SearchResult {
    /// The winning key material, ready for `save_keys`.
    pub candidate: Candidate,
    /// The complete address including the network suffix.
    pub address: String,
    /// Total attempts across all workers at the time of the find.
    pub attempts: u64,
    /// Time from search start to the find.
    pub duration: Duration,
}

/// Periodic progress snapshot. Advisory: samples are dropped rather than
/// queued when the consumer lags.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    pub checked: u64,
    pub keys_per_sec: f64,
    pub elapsed: Duration,
}

/// State shared by every thread of one search.
pub(crate) struct SearchContext {
    pub(crate) prefix: String,
    pub(crate) total_checked: AtomicU64,
    pub(crate) found: AtomicBool,
    pub(crate) cancelled: AtomicBool,
    pub(crate) started_at: Instant,
}

impl SearchContext {
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub(crate) fn is_found(&self) -> bool {
        self.found.load(Ordering::Relaxed)
    }

    /// One-shot election of the result publisher.
    pub(crate) fn claim_found(&self) -> bool {
        self.found
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn result(&self, candidate: Candidate) -> SearchResult {
        SearchResult {
            address: candidate.full_address(),
            candidate,
            attempts: self.total_checked.load(Ordering::SeqCst),
            duration: self.started_at.elapsed(),
        }
    }
}

/// Coordinates a parallel vanity search for one prefix.
pub struct Generator {
    network: Network,
    prefix: String,
    cpu_workers: usize,
    use_gpu: bool,
    gpu_device: usize,
    active: Mutex<Option<Arc<SearchContext>>>,
}

impl Generator {
    /// Builds a generator. The prefix is lowercased here; validation
    /// happens in `start`.
    pub fn new(
        network: Network,
        prefix: &str,
        cpu_workers: usize,
        use_gpu: bool,
        gpu_device: usize,
    ) -> Self {
        Self {
            network,
            prefix: prefix.to_lowercase(),
            cpu_workers,
            use_gpu,
            gpu_device,
            active: Mutex::new(None),
        }
    }

    /// Starts the search and returns the result stream (zero or one
    /// element) and the stats stream (~4 Hz, best effort). An invalid
    /// prefix is rejected before any worker is spawned.
    pub fn start(&self) -> Result<(Receiver<SearchResult>, Receiver<SearchStats>), SearchError> {
        self.network.validate_prefix(&self.prefix)?;

        let ctx = Arc::new(SearchContext {
            prefix: self.prefix.clone(),
            total_checked: AtomicU64::new(0),
            found: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            started_at: Instant::now(),
        });
        *self.active.lock().unwrap() = Some(ctx.clone());

        let (result_tx, result_rx) = bounded::<SearchResult>(1);
        let (stats_tx, stats_rx) = bounded::<SearchStats>(1);

        let mut workers = Vec::new();

        // The GPU worker, when present, reserves partition 0.
        let mut cpu_offset = 0u64;
        if self.use_gpu && self.network.supports_gpu() && gpu::available() {
            cpu_offset = 1;
            let network = self.network;
            let device = self.gpu_device;
            let ctx = ctx.clone();
            let tx = result_tx.clone();
            workers.push(thread::spawn(move || {
                gpu_worker::run(network, device, &ctx, &tx);
            }));
        }

        let cpu_workers = self.cpu_workers.clamp(1, num_cpus::get());
        for i in 0..cpu_workers {
            let network = self.network;
            let ctx = ctx.clone();
            let tx = result_tx.clone();
            let worker_id = i as u64 + cpu_offset;
            workers.push(thread::spawn(move || {
                cpu::run(network, worker_id, &ctx, &tx);
            }));
        }
        drop(result_tx);

        let stats_ctx = ctx.clone();
        let stats_handle = thread::spawn(move || {
            while !stats_ctx.is_cancelled() {
                thread::sleep(STATS_INTERVAL);
                let checked = stats_ctx.total_checked.load(Ordering::Relaxed);
                let elapsed = stats_ctx.started_at.elapsed();
                let keys_per_sec = if elapsed.as_secs_f64() > 0.0 {
                    checked as f64 / elapsed.as_secs_f64()
                } else {
                    0.0
                };
                let _ = stats_tx.try_send(SearchStats {
                    checked,
                    keys_per_sec,
                    elapsed,
                });
            }
        });

        // Supervisor: workers first, then stop the reporter. Both streams
        // close once every sender is dropped.
        thread::spawn(move || {
            for handle in workers {
                let _ = handle.join();
            }
            ctx.cancelled.store(true, Ordering::SeqCst);
            let _ = stats_handle.join();
        });

        Ok((result_rx, stats_rx))
    }

    /// Signals all workers of the current search to terminate. CPU
    /// workers observe it within one poll batch, the GPU worker at the
    /// next dispatch boundary, the stats reporter within one interval.
    pub fn stop(&self) {
        if let Some(ctx) = self.active.lock().unwrap().as_ref() {
            ctx.cancelled.store(true, Ordering::SeqCst);
        }
    }
}

/// Formats a key rate for display, e.g. `1.2M`.
pub fn format_speed(speed: u64) -> String {
    if speed >= 1_000_000_000 {
        format!("{:.1}B", speed as f64 / 1_000_000_000.0)
    } else if speed >= 1_000_000 {
        format!("{:.1}M", speed as f64 / 1_000_000.0)
    } else if speed >= 1_000 {
        format!("{:.1}K", speed as f64 / 1_000.0)
    } else {
        format!("{speed}")
    }
}
