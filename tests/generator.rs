//! Coordinator behavior: result delivery, cancellation, stats reporting.

use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use overlay_vanity::{Generator, Network, SearchError};

const FIND_TIMEOUT: Duration = Duration::from_secs(60);

#[test]
fn invalid_prefix_is_rejected_before_spawning() {
    let too_long = "a".repeat(57);
    for prefix in ["", "abc1", "has space", too_long.as_str()] {
        let generator = Generator::new(Network::TorV3, prefix, 2, false, 0);
        match generator.start() {
            Err(SearchError::InvalidPrefix(_)) => {}
            Err(e) => panic!("expected InvalidPrefix for {prefix:?}, got {e}"),
            Ok(_) => panic!("prefix {prefix:?} was unexpectedly accepted"),
        }
    }
}

#[test]
fn torv3_search_delivers_exactly_one_result() {
    let generator = Generator::new(Network::TorV3, "a", 2, false, 0);
    let (results, _stats) = generator.start().unwrap();

    let result = results.recv_timeout(FIND_TIMEOUT).expect("search should find a 1-char prefix");
    assert!(result.address.starts_with('a'));
    assert!(result.address.ends_with(".onion"));
    assert_eq!(result.address.len(), 56 + ".onion".len());
    assert!(result.attempts >= 1);
    assert!(result.candidate.full_address() == result.address);

    // the stream closes after the single element
    match results.recv_timeout(Duration::from_secs(10)) {
        Err(RecvTimeoutError::Disconnected) => {}
        Err(RecvTimeoutError::Timeout) => panic!("result stream did not close"),
        Ok(_) => panic!("a second result was delivered"),
    }
}

#[test]
fn i2p_search_delivers_matching_result() {
    let generator = Generator::new(Network::I2p, "b", 2, false, 0);
    let (results, _stats) = generator.start().unwrap();

    let result = results.recv_timeout(FIND_TIMEOUT).expect("search should find a 1-char prefix");
    assert!(result.address.starts_with('b'));
    assert!(result.address.ends_with(".b32.i2p"));
    assert_eq!(result.candidate.address().len(), 52);
}

#[test]
fn uppercase_prefix_is_normalized() {
    let generator = Generator::new(Network::TorV3, "A", 1, false, 0);
    let (results, _stats) = generator.start().unwrap();
    let result = results.recv_timeout(FIND_TIMEOUT).unwrap();
    assert!(result.address.starts_with('a'));
}

#[test]
fn cancellation_closes_both_streams_without_a_result() {
    // ~32^10 expected attempts; this will never be found.
    let generator = Generator::new(Network::TorV3, "abcdefghij", 2, false, 0);
    let (results, stats) = generator.start().unwrap();

    std::thread::sleep(Duration::from_millis(300));
    generator.stop();

    match results.recv_timeout(Duration::from_secs(10)) {
        Err(RecvTimeoutError::Disconnected) => {}
        Err(RecvTimeoutError::Timeout) => panic!("result stream did not close"),
        Ok(_) => panic!("a cancelled search delivered a result"),
    }

    // drain until the stats stream closes too
    loop {
        match stats.recv_timeout(Duration::from_secs(10)) {
            Ok(_) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => panic!("stats stream did not close"),
        }
    }
}

#[test]
fn stats_are_reported_during_a_long_search() {
    let generator = Generator::new(Network::I2p, "abcdefghij", 2, false, 0);
    let (_results, stats) = generator.start().unwrap();

    let sample = stats
        .recv_timeout(Duration::from_secs(5))
        .expect("a stats sample should arrive within the interval");
    assert!(sample.elapsed > Duration::ZERO);

    // attempts keep accumulating between samples
    let later = stats.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(later.checked >= sample.checked);

    generator.stop();
}
