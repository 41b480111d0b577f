use crate::error;

/// Upper bound on the output reservation made from a declared unpacked size.
const MAX_PREALLOC: u64 = 64 << 20;

/// Smallest growth step of the circular buffer.
const MIN_GROW: usize = 0x1000;

/// Sliding dictionary window plus the linear output it feeds.
///
/// The circular buffer has a capacity of `dict_size` bytes but is only
/// allocated as far as it has been written, so a header announcing a huge
/// dictionary does not cost anything up front.
pub struct OutWindow {
    buf: Vec<u8>,      // Circular buffer, grows up to dict_size
    dict_size: usize,  // Capacity of the circular buffer
    memlimit: usize,   // Largest allocation allowed for buf
    pos: usize,        // Write cursor inside buf
    is_full: bool,     // The cursor has wrapped at least once
    total_pos: u64,    // Total number of bytes written
    output: Vec<u8>,   // Everything written, in order
}

impl OutWindow {
    pub fn new(dict_size: usize, memlimit: usize, unpacked_size: Option<u64>) -> Self {
        let reserve = unpacked_size.map_or(0, |size| size.min(MAX_PREALLOC) as usize);
        Self {
            buf: Vec::new(),
            dict_size,
            memlimit,
            pos: 0,
            is_full: false,
            total_pos: 0,
            output: Vec::with_capacity(reserve),
        }
    }

    /// Number of bytes written since creation.
    pub fn total_pos(&self) -> u64 {
        self.total_pos
    }

    /// Nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.pos == 0 && !self.is_full
    }

    /// Whether a back-reference register value `dist` (distance - 1) can be
    /// served from bytes already written.
    pub fn check_distance(&self, dist: usize) -> bool {
        dist <= self.pos || self.is_full
    }

    /// Byte `dist` positions behind the cursor; `dist = 1` is the last byte written.
    ///
    /// `check_distance` admits one slot before the first written byte; slots
    /// that were never written read as zero.
    pub fn get_byte(&self, dist: usize) -> u8 {
        let offset = if dist <= self.pos {
            self.pos - dist
        } else {
            self.dict_size - dist + self.pos
        };
        self.buf.get(offset).copied().unwrap_or(0)
    }

    /// Append a byte to both the window and the output.
    pub fn put_byte(&mut self, byte: u8) -> error::Result<()> {
        if self.pos == self.buf.len() {
            self.grow()?;
        }

        self.buf[self.pos] = byte;
        self.pos += 1;
        self.total_pos += 1;
        if self.pos == self.dict_size {
            self.pos = 0;
            self.is_full = true;
        }

        self.output.push(byte);
        Ok(())
    }

    /// Copy `len` bytes starting `dist` bytes back, one at a time, so that
    /// overlapping copies (`dist < len`) repeat the pattern.
    pub fn copy_match(&mut self, dist: usize, len: usize) -> error::Result<()> {
        lzma_debug!("LZ {{ len: {}, dist: {} }}", len, dist);
        for _ in 0..len {
            let byte = self.get_byte(dist);
            self.put_byte(byte)?;
        }
        Ok(())
    }

    /// Hand over the linear output.
    pub fn finish(self) -> Vec<u8> {
        self.output
    }

    fn grow(&mut self) -> error::Result<()> {
        let new_len = (self.buf.len() * 2).max(MIN_GROW).min(self.dict_size);
        if new_len > self.memlimit {
            return Err(error::Error::MemoryLimit {
                required: new_len,
                memlimit: self.memlimit,
            });
        }
        self.buf.resize(new_len, 0);
        Ok(())
    }
}
