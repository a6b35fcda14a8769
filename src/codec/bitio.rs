//! MSB-first bit packing.
//!
//! `BitWriter` zero-pads the final partial byte. `BitReader` cannot tell
//! padding from data, so the decoder stops after the number of symbols
//! recorded in the entry header rather than at the end of the buffer.

/// Packs bit strings into bytes, most significant bit first.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    /// Partial byte, filled from the high bit down
    current: u8,
    /// Bits used in `current` (0-7)
    filled: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer whose buffer is pre-sized for `bytes` output bytes.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            ..Self::default()
        }
    }

    /// Append the low `count` bits of `value`, highest of those bits first.
    pub fn write_bits(&mut self, value: u64, count: u8) {
        debug_assert!(count <= 64, "cannot write {count} bits from a u64");

        let mut remaining = count;
        while remaining > 0 {
            let room = 8 - self.filled;
            let take = remaining.min(room);
            let shift = remaining - take;
            let chunk = ((value >> shift) & ((1u64 << take) - 1)) as u8;

            self.current |= chunk << (room - take);
            self.filled += take;
            remaining -= take;

            if self.filled == 8 {
                self.bytes.push(self.current);
                self.current = 0;
                self.filled = 0;
            }
        }
    }

    /// Total bits written, including the partial byte.
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 + self.filled as usize
    }

    /// Flush the partial byte (zero padded) and return the packed bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.filled > 0 {
            self.bytes.push(self.current);
        }
        self.bytes
    }
}

/// Reads single bits MSB-first from a byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Next bit to read; 0 is the high bit of `data[0]`
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Next bit, or `None` once every byte has been consumed.
    #[inline]
    pub fn read_bit(&mut self) -> Option<bool> {
        let byte = *self.data.get(self.position / 8)?;
        let bit = (byte >> (7 - self.position % 8)) & 1;
        self.position += 1;
        Some(bit == 1)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn bits_remaining(&self) -> usize {
        self.data.len() * 8 - self.position
    }
}
