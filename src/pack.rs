//! # Raw Frame Packing
//!
//! The panel controller takes palette indices two pixels per byte:
//!
//! ```text
//! byte n = (index[2n] << 4) | index[2n + 1]
//! ```
//!
//! Row-major scan, no row padding, `ceil(width * height / 2)` bytes. When the
//! pixel count is odd the final low nibble is zero.
//!
//! This nibble layout is the device contract. A one-byte-per-pixel layout is
//! not produced.

use crate::palette::{IndexBuffer, PALETTE_SIZE};
use thiserror::Error;

/// Pixels stored in each output byte.
pub const PIXELS_PER_BYTE: usize = 2;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PackError {
    /// A pixel carries an index the panel has no ink for
    #[error("palette index {index} at pixel {position} is out of range")]
    IndexOutOfRange { index: u8, position: usize },

    /// Raw byte stream does not match the frame dimensions
    #[error("expected {expected} packed bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Packed length for a `width` × `height` frame.
///
/// ```
/// use kitchen_epaper_lib::pack::packed_len;
///
/// assert_eq!(packed_len(800, 480), 192_000);
/// assert_eq!(packed_len(3, 1), 2);
/// ```
pub fn packed_len(width: u32, height: u32) -> usize {
    (width as usize * height as usize).div_ceil(PIXELS_PER_BYTE)
}

fn checked(index: u8, position: usize) -> Result<u8, PackError> {
    if (index as usize) < PALETTE_SIZE {
        Ok(index)
    } else {
        Err(PackError::IndexOutOfRange { index, position })
    }
}

/// Pack an index buffer into the panel's nibble stream.
pub fn pack_nibbles(buffer: &IndexBuffer) -> Result<Vec<u8>, PackError> {
    let mut packed = Vec::with_capacity(packed_len(buffer.width(), buffer.height()));

    for (pair_index, pair) in buffer.indices().chunks(PIXELS_PER_BYTE).enumerate() {
        let position = pair_index * PIXELS_PER_BYTE;
        let high = checked(pair[0], position)?;
        let low = match pair.get(1) {
            Some(&index) => checked(index, position + 1)?,
            None => 0,
        };
        packed.push((high << 4) | low);
    }

    Ok(packed)
}

/// Inverse of [`pack_nibbles`].
pub fn unpack_nibbles(bytes: &[u8], width: u32, height: u32) -> Result<IndexBuffer, PackError> {
    let expected = packed_len(width, height);
    if bytes.len() != expected {
        return Err(PackError::LengthMismatch {
            expected,
            actual: bytes.len(),
        });
    }

    let pixel_count = width as usize * height as usize;
    let mut indices = Vec::with_capacity(pixel_count);
    for (byte_index, &byte) in bytes.iter().enumerate() {
        let position = byte_index * PIXELS_PER_BYTE;
        indices.push(checked(byte >> 4, position)?);
        if position + 1 < pixel_count {
            indices.push(checked(byte & 0x0F, position + 1)?);
        }
    }

    // Length was validated above, so the dimensions always agree
    IndexBuffer::from_raw(width, height, indices).ok_or(PackError::LengthMismatch {
        expected,
        actual: bytes.len(),
    })
}
