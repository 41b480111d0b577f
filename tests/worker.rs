extern crate env_logger;
extern crate lzma_alone;

use lzma_alone::decompress::Options;
use lzma_alone::error::Error;
use lzma_alone::{Decompressor, Status};
use std::sync::mpsc;
use std::time::Duration;

const HELLO_WORLD: &[u8] = b"\x5d\x00\x00\x80\x00\xff\xff\xff\xff\xff\xff\xff\xff\x00\x24\x19\
                             \x49\x98\x6f\x10\x19\xc6\xd7\x31\xeb\x36\x50\xb2\x98\x48\xff\xfe\
                             \xa5\xb0\x00";

#[test]
fn decode_sync() {
    let _ = env_logger::try_init();
    let decompressor = Decompressor::new(Options::default());
    let decoded = decompressor.decode(HELLO_WORLD).unwrap();
    assert_eq!(decoded.data, b"Hello world\x0a");
    assert_eq!(decoded.outcome.status, Status::FinishedWithMarker);
    assert!(!decompressor.is_busy());
}

#[test]
fn decode_async_delivers_result() {
    let _ = env_logger::try_init();
    let decompressor = Decompressor::new(Options::default());
    let (tx, rx) = mpsc::channel();
    let handle = decompressor
        .decode_async(HELLO_WORLD.to_vec(), move |result| {
            tx.send(result.map(|decoded| decoded.data)).unwrap();
        })
        .unwrap();

    let data = rx.recv_timeout(Duration::from_secs(10)).unwrap().unwrap();
    assert_eq!(data, b"Hello world\x0a");
    handle.join().unwrap();
    assert!(!decompressor.is_busy());
}

#[test]
fn decode_async_rejects_second_request() {
    let _ = env_logger::try_init();
    let decompressor = Decompressor::new(Options::default());
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    // The first callback blocks until released, keeping the request in flight.
    let handle = decompressor
        .decode_async(HELLO_WORLD.to_vec(), move |result| {
            assert!(result.is_ok());
            started_tx.send(()).unwrap();
            release_rx.recv().unwrap();
        })
        .unwrap();

    started_rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(decompressor.is_busy());
    match decompressor.decode_async(HELLO_WORLD.to_vec(), |_| panic!("must not run")) {
        Err(Error::Busy) => {}
        Err(e) => panic!("unexpected error: {:?}", e),
        Ok(_) => panic!("second request was accepted"),
    }
    // Synchronous decoding is not affected by the background request.
    assert!(decompressor.decode(HELLO_WORLD).is_ok());

    release_tx.send(()).unwrap();
    handle.join().unwrap();
    assert!(!decompressor.is_busy());

    // Once the first request completed, a new one is accepted.
    let (tx, rx) = mpsc::channel();
    decompressor
        .decode_async(HELLO_WORLD.to_vec(), move |result| {
            tx.send(result.is_ok()).unwrap();
        })
        .unwrap()
        .join()
        .unwrap();
    assert!(rx.recv().unwrap());
}

#[test]
fn decode_async_releases_after_panic() {
    let _ = env_logger::try_init();
    let decompressor = Decompressor::new(Options::default());
    let handle = decompressor
        .decode_async(HELLO_WORLD.to_vec(), |_| panic!("callback failure"))
        .unwrap();
    assert!(handle.join().is_err());
    assert!(!decompressor.is_busy());
}
