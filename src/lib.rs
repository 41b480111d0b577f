//! Pure-Rust decoder for `.lzma` ("LZMA alone") files.
//!
//! A `.lzma` file is a 13-byte header (properties byte, dictionary size,
//! unpacked size) followed by a range-coded LZMA payload. Decoding is
//! bit-exact with the reference decoder, including its acceptance rules for
//! truncated dictionaries and its reporting of non-fatal corruption.
//!
//! ```no_run
//! # fn main() -> lzma_alone::error::Result<()> {
//! let compressed = std::fs::read("data.lzma")?;
//! let decoded = lzma_alone::decode(&compressed)?;
//! if decoded.outcome.corrupted {
//!     eprintln!("warning: stream is corrupted");
//! }
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod macros;

mod decode;
pub mod error;
mod util;

use std::io;

/// Decompression helpers.
pub mod decompress {
    pub use crate::decode::options::*;
}

pub use crate::decode::lzma::{LzmaParams, Status};
pub use crate::decode::stream::{Decoded, LzmaStream, Outcome};
pub use crate::decode::worker::Decompressor;

/// Decompress a `.lzma` file held in memory.
pub fn decode(data: &[u8]) -> error::Result<Decoded> {
    decode_with_options(data, &decompress::Options::default())
}

/// Decompress a `.lzma` file held in memory with the provided options.
pub fn decode_with_options(data: &[u8], options: &decompress::Options) -> error::Result<Decoded> {
    let mut input = data;
    let stream = LzmaStream::read_header(&mut input, options)?;
    stream.decode(&mut input)
}

/// Decompress LZMA data with default [`Options`](decompress/struct.Options.html).
///
/// See [`lzma_decompress_with_options`] for how `output` is written.
pub fn lzma_decompress<R: io::BufRead, W: io::Write>(
    input: &mut R,
    output: &mut W,
) -> error::Result<Outcome> {
    lzma_decompress_with_options(input, output, &decompress::Options::default())
}

/// Decompress LZMA data with the provided options.
///
/// The whole stream is decoded in memory before anything is written, so
/// `output` receives nothing when decoding fails.
pub fn lzma_decompress_with_options<R: io::BufRead, W: io::Write>(
    input: &mut R,
    output: &mut W,
    options: &decompress::Options,
) -> error::Result<Outcome> {
    let stream = LzmaStream::read_header(input, options)?;
    let decoded = stream.decode(input)?;
    output.write_all(&decoded.data)?;
    output.flush()?;
    Ok(decoded.outcome)
}
