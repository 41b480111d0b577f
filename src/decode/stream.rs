use crate::decode::lzma::{DecoderState, LzmaParams, Status};
use crate::decode::options::{Options, UnpackedSize};
use crate::decode::rangecoder::RangeDecoder;
use crate::error;
use std::io;

/// Summary of a successful decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// How the stream ended.
    pub status: Status,
    /// The stream carried a non-fatal corruption marker (a non-zero first
    /// payload byte, or the range coder hitting `code == range`).
    pub corrupted: bool,
    /// Unpacked size the decoder worked against, if one was known.
    pub unpacked_size: Option<u64>,
    /// Compressed bytes consumed, header included.
    pub bytes_read: u64,
    /// Decompressed bytes produced.
    pub bytes_written: u64,
}

impl Outcome {
    /// The end marker arrived although a different unpacked size was declared.
    pub fn size_mismatch(&self) -> bool {
        self.status == Status::FinishedWithMarker
            && self
                .unpacked_size
                .map_or(false, |size| size != self.bytes_written)
    }
}

/// Decompressed data along with how the stream ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
    /// The decompressed bytes.
    pub data: Vec<u8>,
    /// How the stream ended.
    pub outcome: Outcome,
}

/// A `.lzma` stream whose header has been parsed.
#[derive(Debug)]
pub struct LzmaStream {
    params: LzmaParams,
    options: Options,
}

impl LzmaStream {
    /// Parse the header: 13 bytes, or 5 when the unpacked size is provided
    /// out of band.
    pub fn read_header<R: io::BufRead>(input: &mut R, options: &Options) -> error::Result<Self> {
        let params = LzmaParams::read_header(input, options)?;
        Ok(LzmaStream {
            params,
            options: *options,
        })
    }

    pub fn params(&self) -> &LzmaParams {
        &self.params
    }

    fn header_len(&self) -> u64 {
        match self.options.unpacked_size {
            UnpackedSize::UseProvided(_) => 5,
            _ => 13,
        }
    }

    /// Decode the payload following the header.
    pub fn decode<R: io::BufRead>(self, input: &mut R) -> error::Result<Decoded> {
        let memlimit = self.options.memlimit.unwrap_or(usize::MAX);
        let mut decoder = DecoderState::new(&self.params, memlimit);
        let mut rangecoder = RangeDecoder::new(input)?;

        let status = decoder.process(&mut rangecoder)?;

        let data = decoder.output.finish();
        let outcome = Outcome {
            status,
            corrupted: rangecoder.is_corrupted(),
            unpacked_size: self.params.unpacked_size,
            bytes_read: self.header_len() + rangecoder.bytes_read(),
            bytes_written: data.len() as u64,
        };

        lzma_info!("Read {} bytes", outcome.bytes_read);
        lzma_info!("Written {} bytes", outcome.bytes_written);
        lzma_info!("{:?}", outcome.status);
        if outcome.size_mismatch() {
            lzma_warn!(
                "Finished with end marker at {} bytes instead of the declared {:?}",
                outcome.bytes_written,
                outcome.unpacked_size
            );
        }
        if outcome.corrupted {
            lzma_warn!("LZMA stream is corrupted");
        }

        Ok(Decoded { data, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // "AAAA", lc=3 lp=0 pb=2, 64 KiB dictionary, unknown size
    const AAAA: &[u8] = &[
        0x5d, 0x00, 0x00, 0x01, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00, 0x20,
        0xe8, 0xbd, 0xff, 0xff, 0xff, 0xff, 0xe0, 0x00, 0x00, 0x00,
    ];

    #[test]
    fn test_decode_aaaa() {
        let mut input = AAAA;
        let stream = LzmaStream::read_header(&mut input, &Options::default()).unwrap();
        assert_eq!(stream.params().dict_size, 0x1_0000);
        let decoded = stream.decode(&mut input).unwrap();
        assert_eq!(decoded.data, b"AAAA");
        assert_eq!(
            decoded.outcome,
            Outcome {
                status: Status::FinishedWithMarker,
                corrupted: false,
                unpacked_size: None,
                bytes_read: AAAA.len() as u64,
                bytes_written: 4,
            }
        );
        assert!(!decoded.outcome.size_mismatch());
        assert!(input.is_empty());
    }

    #[test]
    fn test_size_mismatch() {
        let outcome = Outcome {
            status: Status::FinishedWithMarker,
            corrupted: false,
            unpacked_size: Some(20),
            bytes_read: 28,
            bytes_written: 12,
        };
        assert!(outcome.size_mismatch());
        assert!(!Outcome {
            status: Status::FinishedWithoutMarker,
            bytes_written: 20,
            ..outcome
        }
        .size_mismatch());
    }
}
