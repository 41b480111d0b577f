#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate lzma_alone;
extern crate xz2;

use std::io::Write;

fn encode_lzma_xz2(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let options = xz2::stream::LzmaOptions::new_preset(6)?;
    let stream = xz2::stream::Stream::new_lzma_encoder(&options)?;
    let mut encoder = xz2::write::XzEncoder::new_stream(Vec::new(), stream);
    encoder.write_all(data)?;
    encoder.finish()
}

fuzz_target!(|data: &[u8]| {
    let compressed = encode_lzma_xz2(data).expect("liblzma failed to compress data");
    let decoded =
        lzma_alone::decode(&compressed).expect("We've failed to decompress what liblzma compressed");
    assert!(
        data == decoded.data.as_slice(),
        "Decompressed data is different from the original"
    );
    assert!(!decoded.outcome.corrupted);
});
