//! # Wire Buffers
//!
//! Bit-level and byte-level buffers for the avatar info protocol.
//!
//! ## Bit Order
//!
//! ```text
//! put_bits(3, 0b101) then put_bits(2, 0b11):
//!
//!   byte 0:  1 0 1 1 1 0 0 0
//!            └─┬─┘ └┬┘
//!             first second
//! ```
//!
//! Bits are written most-significant first, which is the order the client
//! reads them in. Byte buffers are big-endian unless a method says otherwise.

mod bit_buf;
mod byte_buf;

pub use bit_buf::{BitBuf, BitReader};
pub use byte_buf::{ByteBuf, ByteReader};
