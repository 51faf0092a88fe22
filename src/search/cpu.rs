//! CPU worker loops.
//!
//! One worker owns one candidate and one 48-bit counter partition. The
//! hot loop never blocks; the cancellation flag is polled once per
//! `CPU_POLL_BATCH` iterations and the `found` flag every iteration.

use crossbeam_channel::Sender;
use std::sync::atomic::Ordering;
use tracing::debug;

use crate::address::{Candidate, I2pCandidate, Network, TorV3Candidate};

use super::{SearchContext, SearchResult, CPU_POLL_BATCH, PARTITION_SHIFT};

/// Dispatches on the network once at spawn time, not per iteration.
pub(crate) fn run(
    network: Network,
    worker_id: u64,
    ctx: &SearchContext,
    result_tx: &Sender<SearchResult>,
) {
    match network {
        Network::I2p => i2p_worker(worker_id, ctx, result_tx),
        Network::TorV3 => torv3_worker(worker_id, ctx, result_tx),
    }
}

fn i2p_worker(worker_id: u64, ctx: &SearchContext, result_tx: &Sender<SearchResult>) {
    let mut cand = match I2pCandidate::generate() {
        Ok(c) => c,
        Err(e) => {
            // The search continues with the remaining workers.
            debug!(worker_id, error = %e, "i2p worker failed to create candidate");
            return;
        }
    };

    let base = worker_id << PARTITION_SHIFT;
    let mut counter = base;

    loop {
        if ctx.is_found() {
            return;
        }
        if (counter - base) % CPU_POLL_BATCH == 0 && ctx.is_cancelled() {
            return;
        }

        if cand.mutate_and_check(counter, &ctx.prefix) {
            ctx.total_checked.fetch_add(1, Ordering::Relaxed);
            if ctx.claim_found() {
                let _ = result_tx.send(ctx.result(Candidate::I2p(cand)));
            }
            return;
        }

        counter += 1;
        ctx.total_checked.fetch_add(1, Ordering::Relaxed);
    }
}

fn torv3_worker(worker_id: u64, ctx: &SearchContext, result_tx: &Sender<SearchResult>) {
    let mut cand = match TorV3Candidate::generate() {
        Ok(c) => c,
        Err(e) => {
            debug!(worker_id, error = %e, "torv3 worker failed to create candidate");
            return;
        }
    };

    // Jump into this worker's partition so counter ranges stay disjoint.
    if worker_id > 0 {
        cand.advance_by(worker_id << PARTITION_SHIFT);
    }

    let mut checked = 0u64;

    loop {
        if ctx.is_found() {
            return;
        }
        if checked % CPU_POLL_BATCH == 0 && ctx.is_cancelled() {
            return;
        }

        if cand.check_prefix(&ctx.prefix) {
            ctx.total_checked.fetch_add(1, Ordering::Relaxed);
            if ctx.claim_found() {
                let _ = result_tx.send(ctx.result(Candidate::TorV3(cand)));
            }
            return;
        }

        cand.advance();
        checked += 1;
        ctx.total_checked.fetch_add(1, Ordering::Relaxed);
    }
}
