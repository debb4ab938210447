//! Fixed-stride RGBA pixel storage.

use std::fmt;

use crate::error::{Error, Result};

/// Bytes per RGBA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red = 0,
    Green = 1,
    Blue = 2,
    Alpha = 3,
}

impl Channel {
    /// The colour channels in the order the codec visits them. Alpha is
    /// deliberately absent.
    pub const COLOR: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];
}

/// A `width x height` grid of 8-bit RGBA pixels stored row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

fn byte_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|p| p.checked_mul(BYTES_PER_PIXEL))
        .ok_or_else(|| Error::Validation("image dimensions overflow".into()))
}

impl PixelBuffer {
    /// Wraps raw RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `data` is not exactly
    /// `width * height * 4` bytes long.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height)?;

        if data.len() != expected {
            return Err(Error::Validation(format!(
                "{width}x{height} RGBA buffer needs {expected} bytes, got {}",
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A buffer with every pixel set to `rgba`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the dimensions overflow `usize`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let len = byte_len(width, height)?;
        let data = rgba.iter().copied().cycle().take(len).collect();
        Self::new(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Row and column of the `index`-th pixel in raster order.
    pub fn position(&self, index: usize) -> (usize, usize) {
        let width = self.width as usize;
        (index / width, index % width)
    }

    fn offset(&self, row: usize, col: usize, channel: Channel) -> usize {
        assert!(
            row < self.height as usize && col < self.width as usize,
            "pixel ({row}, {col}) outside {}x{} buffer",
            self.width,
            self.height
        );
        (row * self.width as usize + col) * BYTES_PER_PIXEL + channel as usize
    }

    pub fn channel(&self, row: usize, col: usize, channel: Channel) -> u8 {
        self.data[self.offset(row, col, channel)]
    }

    pub fn set_channel(&mut self, row: usize, col: usize, channel: Channel, value: u8) {
        let at = self.offset(row, col, channel);
        self.data[at] = value;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}
