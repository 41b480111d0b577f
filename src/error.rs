//! Error types returned by the decoder.

use std::fmt::Display;
use std::io;
use std::result;

/// Fatal decoding errors.
///
/// Non-fatal corruption (a non-zero leading payload byte, or a range coder
/// that starts or lands on `code == range`) is not reported here but through
/// [`Outcome::corrupted`](crate::Outcome::corrupted).
#[derive(Debug)]
pub enum Error {
    /// I/O error, including the compressed payload ending before the stream is complete.
    IoError(io::Error),
    /// Not enough bytes to read the LZMA header.
    HeaderTooShort(io::Error),
    /// The properties byte does not encode a valid `(lc, lp, pb)` triple.
    InvalidProperties(u8),
    /// A back-reference points beyond the dictionary or before the first written byte.
    InvalidDistance {
        /// Decoded distance, as stored in the repeat register (`distance - 1`).
        distance: u32,
        /// Effective dictionary size.
        dict_size: u32,
        /// Number of bytes written so far.
        available: u64,
    },
    /// The end-of-stream marker was decoded but the range coder did not finish cleanly.
    CorruptedEndMarker,
    /// A symbol was decoded after the declared unpacked size was reached.
    UnpackedSizeExceeded {
        /// Declared unpacked size.
        unpacked_size: u64,
    },
    /// A match ran past the declared unpacked size; the output was truncated.
    SizeMismatch {
        /// Declared unpacked size.
        expected: u64,
        /// Length the match would have produced.
        actual: u64,
    },
    /// The dictionary window would exceed the configured memory limit.
    MemoryLimit {
        /// Bytes the window needed.
        required: usize,
        /// Configured limit.
        memlimit: usize,
    },
    /// A background decode is already running on this decompressor.
    Busy,
}

/// Library result alias.
pub type Result<T> = result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::IoError(e)
    }
}

impl Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(fmt, "io error: {}", e),
            Error::HeaderTooShort(e) => write!(fmt, "header too short: {}", e),
            Error::InvalidProperties(props) => write!(
                fmt,
                "LZMA header invalid properties: {} must be < 225",
                props
            ),
            Error::InvalidDistance {
                distance,
                dict_size,
                available,
            } => write!(
                fmt,
                "LZ distance {} is beyond dictionary size {} or output size {}",
                *distance as u64 + 1,
                dict_size,
                available
            ),
            Error::CorruptedEndMarker => write!(
                fmt,
                "found end-of-stream marker but the range decoder is not finished"
            ),
            Error::UnpackedSizeExceeded { unpacked_size } => write!(
                fmt,
                "stream continues past the declared unpacked size of {}",
                unpacked_size
            ),
            Error::SizeMismatch { expected, actual } => write!(
                fmt,
                "expected unpacked size of {} but the last match extends to {}",
                expected, actual
            ),
            Error::MemoryLimit { required, memlimit } => write!(
                fmt,
                "dictionary window of {} bytes exceeds memory limit of {}",
                required, memlimit
            ),
            Error::Busy => write!(fmt, "a background decode is already in flight"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) | Error::HeaderTooShort(e) => Some(e),
            _ => None,
        }
    }
}
