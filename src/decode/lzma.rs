use crate::decode::lzbuffer::OutWindow;
use crate::decode::options::{Options, UnpackedSize};
use crate::decode::rangecoder::{BitTree, LenDecoder, RangeDecoder, PROB_INIT};
use crate::error;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io;

/// Smallest dictionary a decoder allocates, whatever the header says.
pub const DICT_SIZE_MIN: u32 = 1 << 12;

const NUM_STATES: usize = 12;
const NUM_POS_BITS_MAX: usize = 4;
const NUM_LEN_TO_POS_STATES: usize = 4;
const NUM_ALIGN_BITS: usize = 4;
const END_POS_MODEL_INDEX: u32 = 14;
const NUM_FULL_DISTANCES: usize = 1 << (END_POS_MODEL_INDEX >> 1);
const MATCH_MIN_LEN: usize = 2;
const LITERAL_CODER_SIZE: usize = 0x300;

/// Distance value that encodes the end-of-stream marker.
const END_MARKER: u32 = 0xFFFF_FFFF;

/// How a successfully decoded stream ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// The end-of-stream marker was decoded.
    FinishedWithMarker,
    /// The declared unpacked size was reached and the range coder finished cleanly.
    FinishedWithoutMarker,
}

/// Result of the next iteration of processing.
#[derive(Debug, PartialEq)]
enum ProcessingStatus {
    Continue,
    Finished(Status),
}

/// Stream parameters from the `.lzma` header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LzmaParams {
    /// Number of high bits of the previous byte used as literal context (0..=8).
    pub lc: u32,
    /// Number of low bits of the position used as literal context (0..=4).
    pub lp: u32,
    /// Number of low bits of the position used as match context (0..=4).
    pub pb: u32,
    /// Dictionary size as written in the header.
    pub dict_size_in_properties: u32,
    /// Dictionary size used for decoding, at least [`DICT_SIZE_MIN`].
    pub dict_size: u32,
    /// Expected output size; `None` means an end marker is mandatory.
    pub unpacked_size: Option<u64>,
}

impl LzmaParams {
    /// Split a properties byte into `(lc, lp, pb)`.
    pub fn decode_properties(props: u8) -> error::Result<(u32, u32, u32)> {
        let mut pb = props as u32;
        if pb >= 225 {
            return Err(error::Error::InvalidProperties(props));
        }

        let lc: u32 = pb % 9;
        pb /= 9;
        let lp: u32 = pb % 5;
        pb /= 5;

        Ok((lc, lp, pb))
    }

    pub fn read_header<R>(input: &mut R, options: &Options) -> error::Result<LzmaParams>
    where
        R: io::BufRead,
    {
        // Properties
        let props = input.read_u8().map_err(error::Error::HeaderTooShort)?;
        let (lc, lp, pb) = Self::decode_properties(props)?;

        lzma_info!("Properties {{ lc: {}, lp: {}, pb: {} }}", lc, lp, pb);

        // Dictionary
        let dict_size_in_properties = input
            .read_u32::<LittleEndian>()
            .map_err(error::Error::HeaderTooShort)?;
        let dict_size = dict_size_in_properties.max(DICT_SIZE_MIN);

        lzma_info!(
            "Dict size: {} (in properties: {})",
            dict_size,
            dict_size_in_properties
        );

        // Unpacked size
        let unpacked_size: Option<u64> = match options.unpacked_size {
            UnpackedSize::ReadFromHeader => {
                let unpacked_size_provided = input
                    .read_u64::<LittleEndian>()
                    .map_err(error::Error::HeaderTooShort)?;
                let marker_mandatory: bool = unpacked_size_provided == 0xFFFF_FFFF_FFFF_FFFF;
                if marker_mandatory {
                    None
                } else {
                    Some(unpacked_size_provided)
                }
            }
            UnpackedSize::ReadHeaderButUseProvided(x) => {
                input
                    .read_u64::<LittleEndian>()
                    .map_err(error::Error::HeaderTooShort)?;
                x
            }
            UnpackedSize::UseProvided(x) => x,
        };

        lzma_info!("Unpacked size: {:?}", unpacked_size);
        if unpacked_size.is_none() {
            lzma_info!("End marker is expected");
        }

        Ok(LzmaParams {
            lc,
            lp,
            pb,
            dict_size_in_properties,
            dict_size,
            unpacked_size,
        })
    }
}

/// The LZMA symbol decoder: adaptive probability tables, repeat distances and
/// the 12-valued state, driving a range decoder into an output window.
pub struct DecoderState {
    pub output: OutWindow,
    // most lc significant bits of previous byte are part of the literal context
    lc: u32, // 0..8
    lp: u32, // 0..4
    // context for literal/match is plaintext offset modulo 2^pb
    pb: u32, // 0..4
    dict_size: u32,
    unpacked_size: Option<u64>,
    literal_probs: Vec<u16>, // LITERAL_CODER_SIZE probabilities per literal state
    pos_slot_decoder: [BitTree<{ 1 << 6 }>; NUM_LEN_TO_POS_STATES],
    align_decoder: BitTree<{ 1 << NUM_ALIGN_BITS }>,
    pos_decoders: [u16; 1 + NUM_FULL_DISTANCES - END_POS_MODEL_INDEX as usize],
    is_match: [u16; NUM_STATES << NUM_POS_BITS_MAX], // true = LZ, false = literal
    is_rep: [u16; NUM_STATES],
    is_rep_g0: [u16; NUM_STATES],
    is_rep_g1: [u16; NUM_STATES],
    is_rep_g2: [u16; NUM_STATES],
    is_rep_0long: [u16; NUM_STATES << NUM_POS_BITS_MAX],
    state: usize,
    rep: [u32; 4],
    len_decoder: LenDecoder,
    rep_len_decoder: LenDecoder,
}

impl DecoderState {
    pub fn new(params: &LzmaParams, memlimit: usize) -> Self {
        DecoderState {
            output: OutWindow::new(params.dict_size as usize, memlimit, params.unpacked_size),
            lc: params.lc,
            lp: params.lp,
            pb: params.pb,
            dict_size: params.dict_size,
            unpacked_size: params.unpacked_size,
            literal_probs: vec![PROB_INIT; LITERAL_CODER_SIZE << (params.lc + params.lp)],
            pos_slot_decoder: [BitTree::new(); NUM_LEN_TO_POS_STATES],
            align_decoder: BitTree::new(),
            pos_decoders: [PROB_INIT; 1 + NUM_FULL_DISTANCES - END_POS_MODEL_INDEX as usize],
            is_match: [PROB_INIT; NUM_STATES << NUM_POS_BITS_MAX],
            is_rep: [PROB_INIT; NUM_STATES],
            is_rep_g0: [PROB_INIT; NUM_STATES],
            is_rep_g1: [PROB_INIT; NUM_STATES],
            is_rep_g2: [PROB_INIT; NUM_STATES],
            is_rep_0long: [PROB_INIT; NUM_STATES << NUM_POS_BITS_MAX],
            state: 0,
            rep: [0; 4],
            len_decoder: LenDecoder::new(),
            rep_len_decoder: LenDecoder::new(),
        }
    }

    /// Run the decoder until the end marker, the declared size, or an error.
    pub fn process<'a, R: io::BufRead>(
        &mut self,
        rangecoder: &mut RangeDecoder<'a, R>,
    ) -> error::Result<Status> {
        loop {
            if let Some(unpacked_size) = self.unpacked_size {
                if self.output.total_pos() >= unpacked_size && rangecoder.is_finished_ok() {
                    return Ok(Status::FinishedWithoutMarker);
                }
            }

            if let ProcessingStatus::Finished(status) = self.process_next(rangecoder)? {
                return Ok(status);
            }
        }
    }

    /// Fails once the declared size is reached: any further symbol other
    /// than the end marker overruns it.
    fn check_size_not_reached(&self) -> error::Result<()> {
        match self.unpacked_size {
            Some(unpacked_size) if self.output.total_pos() >= unpacked_size => {
                Err(error::Error::UnpackedSizeExceeded { unpacked_size })
            }
            _ => Ok(()),
        }
    }

    fn invalid_distance(&self, distance: u32) -> error::Error {
        error::Error::InvalidDistance {
            distance,
            dict_size: self.dict_size,
            available: self.output.total_pos(),
        }
    }

    /// Decode one symbol.
    fn process_next<'a, R: io::BufRead>(
        &mut self,
        rangecoder: &mut RangeDecoder<'a, R>,
    ) -> error::Result<ProcessingStatus> {
        let pos_state = self.output.total_pos() as usize & ((1 << self.pb) - 1);

        // Literal
        if !rangecoder
            .decode_bit(&mut self.is_match[(self.state << NUM_POS_BITS_MAX) + pos_state])?
        {
            self.check_size_not_reached()?;

            let byte: u8 = self.decode_literal(rangecoder)?;
            lzma_debug!("Literal: {}", byte);
            self.output.put_byte(byte)?;

            self.state = if self.state < 4 {
                0
            } else if self.state < 10 {
                self.state - 3
            } else {
                self.state - 6
            };
            return Ok(ProcessingStatus::Continue);
        }

        // LZ
        let mut len: usize;
        // Distance is repeated from LRU
        if rangecoder.decode_bit(&mut self.is_rep[self.state])? {
            self.check_size_not_reached()?;
            if self.output.is_empty() {
                return Err(self.invalid_distance(self.rep[0]));
            }

            // dist = rep[0]
            if !rangecoder.decode_bit(&mut self.is_rep_g0[self.state])? {
                // len = 1
                if !rangecoder.decode_bit(
                    &mut self.is_rep_0long[(self.state << NUM_POS_BITS_MAX) + pos_state],
                )? {
                    // update state (short rep)
                    self.state = if self.state < 7 { 9 } else { 11 };
                    let byte = self.output.get_byte(self.rep[0] as usize + 1);
                    self.output.put_byte(byte)?;
                    return Ok(ProcessingStatus::Continue);
                }
            // dist = rep[i]
            } else {
                let idx: usize;
                if !rangecoder.decode_bit(&mut self.is_rep_g1[self.state])? {
                    idx = 1;
                } else if !rangecoder.decode_bit(&mut self.is_rep_g2[self.state])? {
                    idx = 2;
                } else {
                    idx = 3;
                }
                // Update LRU
                let dist = self.rep[idx];
                for i in (0..idx).rev() {
                    self.rep[i + 1] = self.rep[i];
                }
                self.rep[0] = dist
            }

            len = self.rep_len_decoder.decode(rangecoder, pos_state)?;

            // update state (rep)
            self.state = if self.state < 7 { 8 } else { 11 };
        // New distance
        } else {
            // Update LRU
            self.rep[3] = self.rep[2];
            self.rep[2] = self.rep[1];
            self.rep[1] = self.rep[0];

            len = self.len_decoder.decode(rangecoder, pos_state)?;

            // update state (match)
            self.state = if self.state < 7 { 7 } else { 10 };

            let rep_0 = self.decode_distance(rangecoder, len)?;
            self.rep[0] = rep_0;
            if rep_0 == END_MARKER {
                if rangecoder.is_finished_ok() {
                    return Ok(ProcessingStatus::Finished(Status::FinishedWithMarker));
                }
                return Err(error::Error::CorruptedEndMarker);
            }

            self.check_size_not_reached()?;
            if rep_0 >= self.dict_size || !self.output.check_distance(rep_0 as usize) {
                return Err(self.invalid_distance(rep_0));
            }
        }

        len += MATCH_MIN_LEN;
        let dist = self.rep[0] as usize + 1;

        if let Some(unpacked_size) = self.unpacked_size {
            let remaining = unpacked_size.saturating_sub(self.output.total_pos());
            if remaining < len as u64 {
                let actual = self.output.total_pos() + len as u64;
                self.output.copy_match(dist, remaining as usize)?;
                return Err(error::Error::SizeMismatch {
                    expected: unpacked_size,
                    actual,
                });
            }
        }

        self.output.copy_match(dist, len)?;
        Ok(ProcessingStatus::Continue)
    }

    fn decode_literal<'a, R: io::BufRead>(
        &mut self,
        rangecoder: &mut RangeDecoder<'a, R>,
    ) -> io::Result<u8> {
        let prev_byte = if self.output.is_empty() {
            0
        } else {
            self.output.get_byte(1) as usize
        };

        let mut result: usize = 1;
        let lit_state = ((self.output.total_pos() as usize & ((1 << self.lp) - 1)) << self.lc)
            + (prev_byte >> (8 - self.lc));
        let offset = LITERAL_CODER_SIZE * lit_state;
        let probs = &mut self.literal_probs[offset..offset + LITERAL_CODER_SIZE];

        // After a match the byte at rep0 predicts the literal; the prediction
        // is followed bit by bit until the first mismatch, then the remaining
        // bits are decoded without it.
        if self.state >= 7 {
            let mut match_byte = self.output.get_byte(self.rep[0] as usize + 1) as usize;

            while result < 0x100 {
                let match_bit = (match_byte >> 7) & 1;
                match_byte <<= 1;
                let bit = rangecoder.decode_bit(&mut probs[((1 + match_bit) << 8) + result])?
                    as usize;
                result = (result << 1) ^ bit;
                if match_bit != bit {
                    break;
                }
            }
        }

        while result < 0x100 {
            result = (result << 1) ^ (rangecoder.decode_bit(&mut probs[result])? as usize);
        }

        Ok((result - 0x100) as u8)
    }

    /// Decode the distance of a new match; `length` is the decoded length
    /// code (before adding the minimum match length).
    fn decode_distance<'a, R: io::BufRead>(
        &mut self,
        rangecoder: &mut RangeDecoder<'a, R>,
        length: usize,
    ) -> io::Result<u32> {
        let len_state = if length > NUM_LEN_TO_POS_STATES - 1 {
            NUM_LEN_TO_POS_STATES - 1
        } else {
            length
        };

        let pos_slot = self.pos_slot_decoder[len_state].parse(rangecoder)?;
        if pos_slot < 4 {
            return Ok(pos_slot);
        }

        let num_direct_bits = ((pos_slot >> 1) - 1) as usize;
        let mut result: u32 = (2 | (pos_slot & 1)) << num_direct_bits;

        if pos_slot < END_POS_MODEL_INDEX {
            result += rangecoder.parse_reverse_bit_tree(
                num_direct_bits,
                &mut self.pos_decoders,
                (result - pos_slot) as usize,
            )?;
        } else {
            result = result.wrapping_add(
                rangecoder.decode_direct_bits(num_direct_bits - NUM_ALIGN_BITS)? << NUM_ALIGN_BITS,
            );
            result = result.wrapping_add(self.align_decoder.parse_reverse(rangecoder)?);
        }

        Ok(result)
    }
}
