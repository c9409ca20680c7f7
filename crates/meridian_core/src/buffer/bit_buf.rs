//! # Bit Packing
//!
//! Growable bit writer and the matching reader.

/// Returns the mask covering the low `bits` bits.
#[inline]
const fn low_mask(bits: u8) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

/// Bit writer for the avatar info bit section.
///
/// Packs values using only the bits required, most-significant bit first.
/// The backing vector can be taken from a [`crate::BufferPool`] and handed
/// back once the packet has been sent.
#[derive(Clone, Debug, Default)]
pub struct BitBuf {
    bytes: Vec<u8>,
    bit_position: usize,
}

impl BitBuf {
    /// Creates an empty bit buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: Vec::new(),
            bit_position: 0,
        }
    }

    /// Creates a bit buffer on top of a recycled vector.
    ///
    /// The vector is cleared; only its capacity is reused.
    #[must_use]
    pub fn from_vec(mut bytes: Vec<u8>) -> Self {
        bytes.clear();
        Self {
            bytes,
            bit_position: 0,
        }
    }

    /// Returns true if the value can be written in `bits` bits without loss.
    #[inline]
    #[must_use]
    pub const fn fits(value: u32, bits: u8) -> bool {
        value & !low_mask(bits) == 0
    }

    /// Returns the number of bits written.
    #[inline]
    #[must_use]
    pub const fn bit_len(&self) -> usize {
        self.bit_position
    }

    /// Returns the number of bytes written (rounded up).
    #[inline]
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        (self.bit_position + 7) / 8
    }

    /// Returns the packed data.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.byte_len()]
    }

    /// Consumes the buffer, returning the packed bytes.
    #[must_use]
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.bytes.truncate(self.byte_len());
        self.bytes
    }

    /// Writes bits to the buffer.
    ///
    /// Bits of `value` above `bits` are discarded. Callers that must not
    /// lose data check [`BitBuf::fits`] first.
    ///
    /// # Arguments
    ///
    /// * `value` - The value to write
    /// * `bits` - Number of bits to write (1-32)
    pub fn write_bits(&mut self, value: u32, bits: u8) {
        debug_assert!(bits > 0 && bits <= 32, "bit count out of range: {bits}");

        let value = value & low_mask(bits);
        let mut remaining = usize::from(bits);

        while remaining > 0 {
            let byte_index = self.bit_position >> 3;
            if byte_index == self.bytes.len() {
                self.bytes.push(0);
            }

            let free = 8 - (self.bit_position & 7);
            let take = free.min(remaining);
            let shift = remaining - take;
            #[allow(clippy::cast_possible_truncation)]
            let chunk = ((value >> shift) & ((1u32 << take) - 1)) as u8;

            self.bytes[byte_index] |= chunk << (free - take);
            self.bit_position += take;
            remaining -= take;
        }
    }

    /// Writes a boolean (1 bit).
    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.write_bits(u32::from(value), 1);
    }
}

/// Bit reader over a packed byte slice.
pub struct BitReader<'a> {
    bytes: &'a [u8],
    bit_position: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new reader from a buffer.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            bit_position: 0,
        }
    }

    /// Returns the number of unread bits.
    #[inline]
    #[must_use]
    pub const fn remaining_bits(&self) -> usize {
        (self.bytes.len() * 8).saturating_sub(self.bit_position)
    }

    /// Returns the byte offset of the first byte not touched by the reader.
    #[inline]
    #[must_use]
    pub const fn byte_position(&self) -> usize {
        (self.bit_position + 7) / 8
    }

    /// Reads `bits` bits (1-32).
    pub fn read_bits(&mut self, bits: u8) -> Option<u32> {
        debug_assert!(bits > 0 && bits <= 32, "bit count out of range: {bits}");

        if usize::from(bits) > self.remaining_bits() {
            return None;
        }

        let mut value = 0u32;
        let mut remaining = usize::from(bits);

        while remaining > 0 {
            let byte = u32::from(self.bytes[self.bit_position >> 3]);
            let free = 8 - (self.bit_position & 7);
            let take = free.min(remaining);
            let chunk = (byte >> (free - take)) & ((1u32 << take) - 1);

            value = (value << take) | chunk;
            self.bit_position += take;
            remaining -= take;
        }

        Some(value)
    }

    /// Reads a single bit as a boolean.
    #[inline]
    pub fn read_bool(&mut self) -> Option<bool> {
        self.read_bits(1).map(|bit| bit == 1)
    }
}
