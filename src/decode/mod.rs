//! Decoding logic.

pub mod lzbuffer;
pub mod lzma;
pub mod options;
pub mod rangecoder;
pub mod stream;
pub mod worker;
