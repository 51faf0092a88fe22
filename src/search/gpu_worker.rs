//! GPU worker loops (host side).
//!
//! The device never holds secret material: the I2P kernel receives the
//! public destination template and reports a matching counter, the Tor v3
//! kernel receives a batch of public keys and reports a matching index.
//! Every reported match is reconstructed on the CPU from host-held state,
//! so the emitted result is bit-identical to a CPU-only find.

use crossbeam_channel::Sender;
use std::sync::atomic::Ordering;
use tracing::{debug, warn};

use crate::address::{Candidate, I2pCandidate, Network, TorV3Candidate};
use crate::gpu::{I2pKernel, TorV3Kernel};

use super::{SearchContext, SearchResult};

/// Hashes per I2P kernel dispatch.
const I2P_BATCH: u64 = 1 << 22;

/// Public keys per Tor v3 dispatch; the host generates these serially,
/// so the batch stays small enough to keep the device fed.
const TORV3_BATCH: u64 = 1 << 16;

pub(crate) fn run(
    network: Network,
    device_index: usize,
    ctx: &SearchContext,
    result_tx: &Sender<SearchResult>,
) {
    match network {
        Network::I2p => i2p_gpu_worker(device_index, ctx, result_tx),
        Network::TorV3 => torv3_gpu_worker(device_index, ctx, result_tx),
    }
}

fn i2p_gpu_worker(device_index: usize, ctx: &SearchContext, result_tx: &Sender<SearchResult>) {
    let mut cand = match I2pCandidate::generate() {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "gpu worker failed to create candidate");
            return;
        }
    };

    let kernel = match I2pKernel::new(device_index, cand.raw(), &ctx.prefix, I2P_BATCH) {
        Ok(k) => k,
        Err(e) => {
            // CPU workers keep the search alive.
            warn!(device_index, error = %e, "gpu worker unavailable");
            return;
        }
    };

    // The GPU owns partition 0 and walks it from counter 0.
    let mut counter = 0u64;

    loop {
        if ctx.is_found() || ctx.is_cancelled() {
            return;
        }

        let batch = match kernel.run_batch(counter) {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "gpu dispatch failed, stopping gpu worker");
                return;
            }
        };

        ctx.total_checked.fetch_add(batch.checked, Ordering::Relaxed);
        counter += batch.checked;

        if batch.found {
            if ctx.claim_found() {
                // Re-apply the counter on the host template; [8..391) of
                // the candidate never changed, so the digest reproduces.
                cand.mutate_encryption_key(batch.match_counter);
                let _ = result_tx.send(ctx.result(Candidate::I2p(cand)));
            }
            return;
        }
    }
}

fn torv3_gpu_worker(device_index: usize, ctx: &SearchContext, result_tx: &Sender<SearchResult>) {
    let mut cand = match TorV3Candidate::generate() {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "gpu worker failed to create candidate");
            return;
        }
    };

    let kernel = match TorV3Kernel::new(device_index, &ctx.prefix, TORV3_BATCH) {
        Ok(k) => k,
        Err(e) => {
            warn!(device_index, error = %e, "gpu worker unavailable");
            return;
        }
    };

    let mut pubkeys = vec![0u8; (TORV3_BATCH as usize) * 32];

    loop {
        if ctx.is_found() || ctx.is_cancelled() {
            return;
        }

        // Snapshot before filling the batch so a reported index can be
        // replayed onto identical state.
        let snapshot = cand.clone();

        for i in 0..TORV3_BATCH as usize {
            pubkeys[i * 32..(i + 1) * 32].copy_from_slice(&cand.public_key_bytes());
            cand.advance();
        }

        let batch = match kernel.run_batch(&pubkeys, TORV3_BATCH) {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "gpu dispatch failed, stopping gpu worker");
                return;
            }
        };

        ctx.total_checked.fetch_add(batch.checked, Ordering::Relaxed);

        if batch.found {
            if ctx.claim_found() {
                let mut winner = snapshot;
                winner.advance_by(batch.match_counter);
                let _ = result_tx.send(ctx.result(Candidate::TorV3(winner)));
            }
            return;
        }
    }
}
