//! # Byte Buffers
//!
//! Byte-aligned writes used by the extended info encoders.
//!
//! ## Transformed Writes
//!
//! The client obfuscates some fields with simple byte transforms:
//!
//! | Method   | Written byte      |
//! |----------|-------------------|
//! | `p1_alt1`| `value + 128`     |
//! | `p1_alt2`| `-value`          |
//! | `p1_alt3`| `128 - value`     |
//! | `p2_alt1`| little-endian u16 |
//!
//! All arithmetic wraps modulo 256.

/// Growable byte writer.
#[derive(Clone, Debug, Default)]
pub struct ByteBuf {
    bytes: Vec<u8>,
}

impl ByteBuf {
    /// Creates an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Creates a buffer on top of a recycled vector.
    #[must_use]
    pub fn from_vec(mut bytes: Vec<u8>) -> Self {
        bytes.clear();
        Self { bytes }
    }

    /// Continues writing after existing content, such as a finished bit
    /// section.
    #[must_use]
    pub const fn wrap(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Returns the number of bytes written.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if no bytes have been written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns a slice of the written data.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the buffer, returning the written bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Writes a single byte.
    #[inline]
    pub fn p1(&mut self, value: u8) {
        self.bytes.push(value);
    }

    /// Writes `value + 128`.
    #[inline]
    pub fn p1_alt1(&mut self, value: u8) {
        self.bytes.push(value.wrapping_add(128));
    }

    /// Writes `-value`.
    #[inline]
    pub fn p1_alt2(&mut self, value: u8) {
        self.bytes.push(value.wrapping_neg());
    }

    /// Writes `128 - value`.
    #[inline]
    pub fn p1_alt3(&mut self, value: u8) {
        self.bytes.push(128u8.wrapping_sub(value));
    }

    /// Writes a u16 in big-endian format.
    #[inline]
    pub fn p2(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a u16 in little-endian format.
    #[inline]
    pub fn p2_alt1(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a u32 in big-endian format.
    #[inline]
    pub fn p4(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes raw bytes.
    #[inline]
    pub fn pdata(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }
}

/// Byte reader - the mirror of [`ByteBuf`].
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a new reader from a buffer.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Returns the number of bytes remaining.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.position)
    }

    /// Reads a single byte.
    #[inline]
    pub fn g1(&mut self) -> Option<u8> {
        let value = *self.bytes.get(self.position)?;
        self.position += 1;
        Some(value)
    }

    /// Reads a byte written with [`ByteBuf::p1_alt1`].
    #[inline]
    pub fn g1_alt1(&mut self) -> Option<u8> {
        self.g1().map(|b| b.wrapping_sub(128))
    }

    /// Reads a byte written with [`ByteBuf::p1_alt2`].
    #[inline]
    pub fn g1_alt2(&mut self) -> Option<u8> {
        self.g1().map(u8::wrapping_neg)
    }

    /// Reads a byte written with [`ByteBuf::p1_alt3`].
    #[inline]
    pub fn g1_alt3(&mut self) -> Option<u8> {
        self.g1().map(|b| 128u8.wrapping_sub(b))
    }

    /// Reads a big-endian u16.
    #[inline]
    pub fn g2(&mut self) -> Option<u16> {
        let raw = self.take::<2>()?;
        Some(u16::from_be_bytes(raw))
    }

    /// Reads a little-endian u16.
    #[inline]
    pub fn g2_alt1(&mut self) -> Option<u16> {
        let raw = self.take::<2>()?;
        Some(u16::from_le_bytes(raw))
    }

    /// Reads a big-endian u32.
    #[inline]
    pub fn g4(&mut self) -> Option<u32> {
        let raw = self.take::<4>()?;
        Some(u32::from_be_bytes(raw))
    }

    /// Reads bytes up to (and consuming) a zero terminator.
    pub fn gjstr(&mut self) -> Option<&'a [u8]> {
        let rest = self.bytes.get(self.position..)?;
        let end = rest.iter().position(|&b| b == 0)?;
        self.position += end + 1;
        Some(&rest[..end])
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let slice = self.bytes.get(self.position..self.position + N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.position += N;
        Some(out)
    }
}
