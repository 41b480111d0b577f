use crate::util::const_assert;
use byteorder::{BigEndian, ReadBytesExt};
use std::io;

/// Initial value of every adaptive probability (P(bit = 0) = 0.5).
pub const PROB_INIT: u16 = 0x400;

const NUM_BIT_MODEL_TOTAL_BITS: u32 = 11;
const NUM_MOVE_BITS: u32 = 5;
const TOP_VALUE: u32 = 1 << 24;

/// Binary arithmetic decoder over the compressed payload.
pub struct RangeDecoder<'a, R>
where
    R: 'a + io::BufRead,
{
    stream: &'a mut R,
    range: u32,
    code: u32,
    corrupted: bool,
    bytes_read: u64,
}

impl<'a, R> RangeDecoder<'a, R>
where
    R: io::BufRead,
{
    /// Read the 5 initialization bytes: a leading byte that must be zero and
    /// the first 32 bits of `code`, big-endian.
    pub fn new(stream: &'a mut R) -> io::Result<Self> {
        let mut dec = Self {
            stream,
            range: 0xFFFF_FFFF,
            code: 0,
            corrupted: false,
            bytes_read: 5,
        };
        if dec.stream.read_u8()? != 0 {
            dec.corrupted = true;
        }
        dec.code = dec.stream.read_u32::<BigEndian>()?;
        if dec.code == dec.range {
            dec.corrupted = true;
        }
        lzma_debug!("0 {{ range: {:08x}, code: {:08x} }}", dec.range, dec.code);
        Ok(dec)
    }

    /// Whether the decoder saw one of the non-fatal corruption markers.
    pub fn is_corrupted(&self) -> bool {
        self.corrupted
    }

    /// Number of payload bytes consumed so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// A well-formed stream ends with `code == 0`.
    #[inline]
    pub fn is_finished_ok(&self) -> bool {
        self.code == 0
    }

    #[inline]
    fn normalize(&mut self) -> io::Result<()> {
        lzma_trace!("  {{ range: {:08x}, code: {:08x} }}", self.range, self.code);
        // One shift always restores range >= 2^24: a decoded bit never
        // shrinks the range by more than a factor of 2^8.
        if self.range < TOP_VALUE {
            self.range <<= 8;
            self.code = (self.code << 8) ^ (self.stream.read_u8()? as u32);
            self.bytes_read += 1;

            lzma_debug!("+ {{ range: {:08x}, code: {:08x} }}", self.range, self.code);
        }
        Ok(())
    }

    /// Decode `count` bits with a fixed probability of one half, MSB first.
    pub fn decode_direct_bits(&mut self, count: usize) -> io::Result<u32> {
        let mut result = 0u32;
        for _ in 0..count {
            self.range >>= 1;
            self.code = self.code.wrapping_sub(self.range);
            // all ones if the subtraction underflowed (bit 0), zero otherwise
            let mask = 0u32.wrapping_sub(self.code >> 31);
            self.code = self.code.wrapping_add(self.range & mask);

            if self.code == self.range {
                self.corrupted = true;
            }

            self.normalize()?;
            result = (result << 1).wrapping_add(mask.wrapping_add(1));
        }
        Ok(result)
    }

    /// Decode one bit with the adaptive probability `prob`, updating it.
    #[inline]
    pub fn decode_bit(&mut self, prob: &mut u16) -> io::Result<bool> {
        let bound: u32 = (self.range >> NUM_BIT_MODEL_TOTAL_BITS) * (*prob as u32);

        lzma_trace!(
            " bound: {:08x}, prob: {:04x}, bit: {}",
            bound,
            prob,
            (self.code >= bound) as u8
        );
        if self.code < bound {
            *prob += ((1 << NUM_BIT_MODEL_TOTAL_BITS) - *prob) >> NUM_MOVE_BITS;
            self.range = bound;

            self.normalize()?;
            Ok(false)
        } else {
            *prob -= *prob >> NUM_MOVE_BITS;
            self.code -= bound;
            self.range -= bound;

            self.normalize()?;
            Ok(true)
        }
    }

    fn parse_bit_tree(&mut self, num_bits: usize, probs: &mut [u16]) -> io::Result<u32> {
        let mut tmp: u32 = 1;
        for _ in 0..num_bits {
            let bit = self.decode_bit(&mut probs[tmp as usize])?;
            tmp = (tmp << 1) ^ (bit as u32);
        }
        Ok(tmp - (1 << num_bits))
    }

    /// Decode `num_bits` bits LSB first, walking the tree rooted at `probs[offset + 1]`.
    pub fn parse_reverse_bit_tree(
        &mut self,
        num_bits: usize,
        probs: &mut [u16],
        offset: usize,
    ) -> io::Result<u32> {
        let mut result = 0u32;
        let mut tmp: usize = 1;
        for i in 0..num_bits {
            let bit = self.decode_bit(&mut probs[offset + tmp])?;
            tmp = (tmp << 1) ^ (bit as usize);
            result ^= (bit as u32) << i;
        }
        Ok(result)
    }
}

/// Fixed-width symbol decoder over a binary tree of `PROBS_ARRAY_LEN`
/// probabilities (root at index 1).
#[derive(Clone, Copy)]
pub struct BitTree<const PROBS_ARRAY_LEN: usize> {
    probs: [u16; PROBS_ARRAY_LEN],
}

impl<const PROBS_ARRAY_LEN: usize> BitTree<PROBS_ARRAY_LEN> {
    const NUM_BITS: usize = PROBS_ARRAY_LEN.trailing_zeros() as usize;

    pub fn new() -> Self {
        const_assert!("BitTree's PROBS_ARRAY_LEN must be a power of two", PROBS_ARRAY_LEN: usize => PROBS_ARRAY_LEN.is_power_of_two());

        BitTree {
            probs: [PROB_INIT; PROBS_ARRAY_LEN],
        }
    }

    /// MSB-first decode.
    pub fn parse<R: io::BufRead>(&mut self, rangecoder: &mut RangeDecoder<R>) -> io::Result<u32> {
        rangecoder.parse_bit_tree(Self::NUM_BITS, &mut self.probs)
    }

    /// LSB-first decode.
    pub fn parse_reverse<R: io::BufRead>(
        &mut self,
        rangecoder: &mut RangeDecoder<R>,
    ) -> io::Result<u32> {
        rangecoder.parse_reverse_bit_tree(Self::NUM_BITS, &mut self.probs, 0)
    }
}

/// Number of posState-indexed low/mid coders (`2^pb` for the largest `pb`).
const NUM_POS_STATES_MAX: usize = 1 << 4;

/// Three-tier match length decoder: `0..8` (low), `8..16` (mid), `16..272` (high).
pub struct LenDecoder {
    choice: u16,
    choice2: u16,
    low_coder: [BitTree<{ 1 << 3 }>; NUM_POS_STATES_MAX],
    mid_coder: [BitTree<{ 1 << 3 }>; NUM_POS_STATES_MAX],
    high_coder: BitTree<{ 1 << 8 }>,
}

impl LenDecoder {
    pub fn new() -> Self {
        LenDecoder {
            choice: PROB_INIT,
            choice2: PROB_INIT,
            low_coder: [BitTree::new(); NUM_POS_STATES_MAX],
            mid_coder: [BitTree::new(); NUM_POS_STATES_MAX],
            high_coder: BitTree::new(),
        }
    }

    /// Decode a length code. The caller adds the minimum match length.
    pub fn decode<R: io::BufRead>(
        &mut self,
        rangecoder: &mut RangeDecoder<R>,
        pos_state: usize,
    ) -> io::Result<usize> {
        if !rangecoder.decode_bit(&mut self.choice)? {
            Ok(self.low_coder[pos_state].parse(rangecoder)? as usize)
        } else if !rangecoder.decode_bit(&mut self.choice2)? {
            Ok(self.mid_coder[pos_state].parse(rangecoder)? as usize + 8)
        } else {
            Ok(self.high_coder.parse(rangecoder)? as usize + 16)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A bit sequence on a single probability, 10 direct bits, four 8-bit
    // bit-tree symbols, four reverse 4-bit symbols and seven lengths.
    const PRIMITIVES: &[u8] = &[
        0x00, 0x31, 0x28, 0x71, 0x98, 0x8a, 0xf5, 0xdf, 0xd6, 0xcb, 0xdd, 0x29, 0x85, 0xb6, 0x8b,
        0x6e, 0x69, 0x27, 0x81, 0x76, 0x88, 0x00,
    ];

    const BITS: [u8; 32] = [
        0, 0, 1, 0, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 1, 1, 0, 1, 0, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 1,
        0, 0,
    ];

    #[test]
    fn test_decode_primitives() {
        let mut input = PRIMITIVES;
        let mut rangecoder = RangeDecoder::new(&mut input).unwrap();
        assert!(!rangecoder.is_corrupted());

        let mut prob = PROB_INIT;
        for &expected in BITS.iter() {
            assert_eq!(rangecoder.decode_bit(&mut prob).unwrap(), expected == 1);
        }
        assert_eq!(prob, 1002);

        assert_eq!(rangecoder.decode_direct_bits(10).unwrap(), 0x2A5);

        let mut tree = BitTree::<256>::new();
        for &expected in [0, 255, 0x5A, 7].iter() {
            assert_eq!(tree.parse(&mut rangecoder).unwrap(), expected);
        }

        let mut reverse = BitTree::<16>::new();
        for &expected in [0, 15, 9, 6].iter() {
            assert_eq!(reverse.parse_reverse(&mut rangecoder).unwrap(), expected);
        }

        let mut len_decoder = LenDecoder::new();
        let lengths = [(0, 0), (7, 1), (8, 2), (15, 3), (16, 0), (271, 1), (100, 2)];
        for &(expected, pos_state) in lengths.iter() {
            assert_eq!(
                len_decoder.decode(&mut rangecoder, pos_state).unwrap(),
                expected
            );
        }

        assert!(rangecoder.is_finished_ok());
        assert_eq!(rangecoder.bytes_read(), PRIMITIVES.len() as u64);
        assert!(!rangecoder.is_corrupted());
    }

    #[test]
    fn test_nonzero_leading_byte_is_corrupted() {
        let mut input: &[u8] = &[0x01, 0x00, 0x00, 0x00, 0x00];
        let rangecoder = RangeDecoder::new(&mut input).unwrap();
        assert!(rangecoder.is_corrupted());
        assert!(rangecoder.is_finished_ok());
    }

    #[test]
    fn test_code_equal_to_range_is_corrupted() {
        let mut input: &[u8] = &[0x00, 0xFF, 0xFF, 0xFF, 0xFF];
        let rangecoder = RangeDecoder::new(&mut input).unwrap();
        assert!(rangecoder.is_corrupted());
    }

    #[test]
    fn test_direct_bits_landing_on_range_is_corrupted() {
        let mut input: &[u8] = &[0x00, 0xFF, 0xFF, 0xFF, 0xFE, 0x00, 0x00, 0x00, 0x00];
        let mut rangecoder = RangeDecoder::new(&mut input).unwrap();
        assert!(!rangecoder.is_corrupted());
        // range halves to 0x7FFF_FFFF and code drops to the same value
        assert_eq!(rangecoder.decode_direct_bits(1).unwrap(), 1);
        assert!(rangecoder.is_corrupted());
    }

    #[test]
    fn test_short_input() {
        let mut input: &[u8] = &[0x00, 0x00, 0x00];
        assert_eq!(
            RangeDecoder::new(&mut input).err().map(|e| e.kind()),
            Some(io::ErrorKind::UnexpectedEof)
        );
    }

    #[test]
    fn test_out_of_input_is_an_error() {
        // range is only renormalized after it drops below 2^24
        let mut input: &[u8] = &[0x00, 0x00, 0x00, 0x00, 0x00];
        let mut rangecoder = RangeDecoder::new(&mut input).unwrap();
        let result = rangecoder.decode_direct_bits(32);
        assert_eq!(
            result.err().map(|e| e.kind()),
            Some(io::ErrorKind::UnexpectedEof)
        );
    }

    #[test]
    fn test_probability_adaptation() {
        let mut input: &[u8] = &[0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let mut rangecoder = RangeDecoder::new(&mut input).unwrap();
        let mut prob = PROB_INIT;
        // code == 0 is always below the bound: a zero bit
        assert!(!rangecoder.decode_bit(&mut prob).unwrap());
        assert_eq!(prob, PROB_INIT + ((0x800 - PROB_INIT) >> 5));
    }
}
