//! GPU/CPU equivalence for the OpenCL kernels. These tests compile only
//! with the `opencl` feature and skip themselves when no device exists.

#![cfg(feature = "opencl")]

use overlay_vanity::gpu::{available, I2pKernel, TorV3Kernel};
use overlay_vanity::{I2pCandidate, TorV3Candidate};

fn flip_last_char(prefix: &str) -> String {
    let mut bytes = prefix.as_bytes().to_vec();
    let last = bytes.last_mut().unwrap();
    *last = if *last == b'a' { b'b' } else { b'a' };
    String::from_utf8(bytes).unwrap()
}

#[test]
fn i2p_batch_finds_exact_self_match() {
    if !available() {
        eprintln!("no OpenCL GPU, skipping");
        return;
    }

    let mut cand = I2pCandidate::generate().unwrap();
    cand.mutate_encryption_key(0);
    let prefix = cand.address();

    let kernel = I2pKernel::new(0, cand.raw(), &prefix, 1).unwrap();
    let outcome = kernel.run_batch(0).unwrap();

    assert!(outcome.found);
    assert_eq!(outcome.match_counter, 0);
    assert_eq!(outcome.checked, 1);
}

#[test]
fn i2p_batch_rejects_off_by_one_prefix() {
    if !available() {
        eprintln!("no OpenCL GPU, skipping");
        return;
    }

    let mut cand = I2pCandidate::generate().unwrap();
    cand.mutate_encryption_key(0);
    let prefix = flip_last_char(&cand.address());

    let kernel = I2pKernel::new(0, cand.raw(), &prefix, 1).unwrap();
    let outcome = kernel.run_batch(0).unwrap();

    assert!(!outcome.found);
    assert_eq!(outcome.checked, 1);
}

#[test]
fn i2p_match_counter_reproduces_on_cpu() {
    if !available() {
        eprintln!("no OpenCL GPU, skipping");
        return;
    }

    // A short prefix so a 2^16 batch almost certainly contains a match.
    let mut cand = I2pCandidate::generate().unwrap();
    let prefix = "ab";
    let kernel = I2pKernel::new(0, cand.raw(), prefix, 1 << 16).unwrap();

    let mut counter = 0u64;
    for _ in 0..64 {
        let outcome = kernel.run_batch(counter).unwrap();
        if outcome.found {
            assert!(cand.mutate_and_check(outcome.match_counter, prefix));
            return;
        }
        counter += outcome.checked;
    }
    panic!("no match in 64 batches of 65536 for a 2-char prefix");
}

#[test]
fn torv3_batch_reports_matching_index() {
    if !available() {
        eprintln!("no OpenCL GPU, skipping");
        return;
    }

    let batch: u64 = 8;
    let target_index: u64 = 5;

    let base = TorV3Candidate::from_seed([42u8; 32]);

    let mut walker = base.clone();
    let mut pubkeys = vec![0u8; batch as usize * 32];
    for i in 0..batch as usize {
        pubkeys[i * 32..(i + 1) * 32].copy_from_slice(&walker.public_key_bytes());
        walker.advance();
    }

    let mut target = base.clone();
    target.advance_by(target_index);
    let prefix = target.address();

    let kernel = TorV3Kernel::new(0, &prefix, batch).unwrap();
    let outcome = kernel.run_batch(&pubkeys, batch).unwrap();

    assert!(outcome.found);
    assert_eq!(outcome.match_counter, target_index);
    assert_eq!(outcome.checked, batch);

    // host-side reconstruction, as the search worker does it
    let mut winner = base.clone();
    winner.advance_by(outcome.match_counter);
    assert_eq!(winner.address(), prefix);
}
