//! LSB steganography over RGBA pixel buffers.
//!
//! The bit layout is a fixed contract shared by [`embed`] and [`extract`]:
//!
//! - pixels are visited in raster order (row-major, top to bottom, left to right)
//! - each pixel carries three bits, in the R, G then B least-significant bit
//! - alpha is never read or written
//! - bytes are consumed in order, most-significant bit first
//!
//! Changing any of these silently breaks every key image produced so far.

use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::payload::{BODY_LEN, EmbeddedPayload, HEADER_LEN, PAYLOAD_LEN};
use crate::pixels::{Channel, PixelBuffer};

/// Bits carried by one pixel (one per colour channel).
pub const BITS_PER_PIXEL: usize = 3;

/// Pixels needed to carry an [`EmbeddedPayload`] (256).
pub const MIN_PIXELS: usize = required_pixels(PAYLOAD_LEN);

/// Pixels needed to carry `len` bytes.
pub const fn required_pixels(len: usize) -> usize {
    (len * 8).div_ceil(BITS_PER_PIXEL)
}

/// [`required_pixels`] without overflow, for lengths that come from callers.
fn checked_required_pixels(len: usize) -> Option<usize> {
    Some(len.checked_mul(8)?.div_ceil(BITS_PER_PIXEL))
}

/// Whole bytes the buffer can carry.
pub fn capacity_bytes(buffer: &PixelBuffer) -> usize {
    buffer.pixel_count() * BITS_PER_PIXEL / 8
}

/// Location of the `bit`-th bit of the stream.
fn slot(buffer: &PixelBuffer, bit: usize) -> (usize, usize, Channel) {
    let (row, col) = buffer.position(bit / BITS_PER_PIXEL);
    (row, col, Channel::COLOR[bit % BITS_PER_PIXEL])
}

fn bits(data: &[u8]) -> impl Iterator<Item = u8> + '_ {
    data.iter()
        .flat_map(|&byte| (0..8).rev().map(move |shift| (byte >> shift) & 1))
}

/// Writes `data` into the buffer's colour LSBs.
///
/// # Errors
///
/// Returns [`Error::Capacity`] if the buffer has fewer pixels than
/// [`required_pixels`]`(data.len())`. The buffer is untouched in that case.
pub fn embed(buffer: &mut PixelBuffer, data: &[u8]) -> Result<()> {
    let available = buffer.pixel_count();
    let required = checked_required_pixels(data.len()).unwrap_or(usize::MAX);
    if required > available {
        return Err(Error::Capacity {
            required,
            available,
        });
    }

    for (i, bit) in bits(data).enumerate() {
        let (row, col, channel) = slot(buffer, i);
        let value = buffer.channel(row, col, channel);
        buffer.set_channel(row, col, channel, (value & 0xFE) | bit);
    }

    debug!(
        bytes = data.len(),
        pixels = required,
        width = buffer.width(),
        height = buffer.height(),
        "embedded payload"
    );
    Ok(())
}

/// Reads `len` bytes from the start of the bit stream without interpreting them.
fn read_bytes(buffer: &PixelBuffer, len: usize) -> Zeroizing<Vec<u8>> {
    let mut out = Zeroizing::new(vec![0u8; len]);
    for i in 0..len * 8 {
        let (row, col, channel) = slot(buffer, i);
        let bit = buffer.channel(row, col, channel) & 1;
        out[i / 8] |= bit << (7 - i % 8);
    }
    out
}

/// Extracts a length-prefixed payload of `expected_len` body bytes.
///
/// Returns the prefix and the body together (`4 + expected_len` bytes). The
/// buffer may have any dimensions as long as enough pixels exist.
///
/// # Errors
///
/// Returns [`Error::Format`] if the buffer is too small to hold the payload or
/// the big-endian prefix is not `expected_len`.
pub fn extract(buffer: &PixelBuffer, expected_len: usize) -> Result<Zeroizing<Vec<u8>>> {
    let Some((total, required)) = HEADER_LEN
        .checked_add(expected_len)
        .and_then(|total| Some((total, checked_required_pixels(total)?)))
    else {
        return Err(Error::Format(format!(
            "payload length {expected_len} is out of range"
        )));
    };
    if required > buffer.pixel_count() {
        return Err(Error::Format(format!(
            "image has {} pixels, an embedded payload needs {required}",
            buffer.pixel_count()
        )));
    }

    let header = read_bytes(buffer, HEADER_LEN);
    let declared = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    if declared as usize != expected_len {
        return Err(Error::Format(format!(
            "length prefix is {declared}, expected {expected_len}"
        )));
    }

    Ok(read_bytes(buffer, total))
}

/// Extracts and parses the [`EmbeddedPayload`] from a key image.
pub fn extract_payload(buffer: &PixelBuffer) -> Result<EmbeddedPayload> {
    let bytes = extract(buffer, BODY_LEN)?;
    EmbeddedPayload::from_bytes(&bytes)
}
