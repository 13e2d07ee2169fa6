//! Flat bit addressing over byte buffers.
//!
//! ```text
//! byte i:   [ b7 b6 b5 b4 b3 b2 b1 b0 ]
//! flat:       i*8+7      ...      i*8+0
//! ```
//!
//! Bit 0 of every byte is its least-significant bit.

/// Bits per byte of a response vector.
pub const BITS_PER_BYTE: usize = 8;

/// Number of addressable bits in a vector of `byte_len` bytes.
#[inline]
pub fn bit_width(byte_len: usize) -> usize {
    byte_len * BITS_PER_BYTE
}

/// Value of the bit at flat position `pos`, `None` past the end.
#[inline]
pub fn bit_at(v: &[u8], pos: usize) -> Option<bool> {
    v.get(pos / BITS_PER_BYTE)
        .map(|byte| (byte >> (pos % BITS_PER_BYTE)) & 1 == 1)
}

/// Iterate the set bit offsets (0..8) of a single byte, lowest first.
#[inline]
pub fn set_bits(byte: u8) -> SetBits {
    SetBits(byte)
}

/// Iterator returned by [`set_bits`].
#[derive(Debug, Clone, Copy)]
pub struct SetBits(u8);

impl Iterator for SetBits {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        if self.0 == 0 {
            return None;
        }
        let bit = self.0.trailing_zeros();
        self.0 &= self.0 - 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for SetBits {}
