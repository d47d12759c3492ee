//! Decoded image consumed by window icons
//!
//! Decoding itself happens elsewhere; this is the in-memory contract a
//! decoder hands over: dimensions, an 8-bit channel layout and a tightly
//! packed row-major byte buffer of `height * row_bytes` bytes.

use thiserror::Error;

/// Channel layout of a decoded image, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Single channel (grey)
    R8,
    /// Grey plus alpha
    RA8,
    RGB8,
    RGBA8,
}

impl ImageFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ImageFormat::R8 => 1,
            ImageFormat::RA8 => 2,
            ImageFormat::RGB8 => 3,
            ImageFormat::RGBA8 => 4,
        }
    }

    /// Expands one pixel of this format into straight-alpha RGBA
    pub fn to_rgba(self, pixel: &[u8]) -> [u8; 4] {
        match self {
            ImageFormat::R8 => [pixel[0], pixel[0], pixel[0], 255],
            ImageFormat::RA8 => [pixel[0], pixel[0], pixel[0], pixel[1]],
            ImageFormat::RGB8 => [pixel[0], pixel[1], pixel[2], 255],
            ImageFormat::RGBA8 => [pixel[0], pixel[1], pixel[2], pixel[3]],
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("Image dimensions {width}x{height} are empty")]
    EmptyImage { width: u32, height: u32 },

    #[error("Image data holds {actual} bytes, expected {expected}")]
    DataSizeMismatch { expected: usize, actual: usize },
}

/// Decoded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    format: ImageFormat,
    data: Vec<u8>,
}

impl Image {
    pub fn new(
        width: u32,
        height: u32,
        format: ImageFormat,
        data: Vec<u8>,
    ) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::EmptyImage { width, height });
        }

        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(ImageError::DataSizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// Iterates the pixels as straight-alpha RGBA, row by row
    pub fn rgba_pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        let format = self.format;
        self.data
            .chunks_exact(format.bytes_per_pixel())
            .map(move |pixel| format.to_rgba(pixel))
    }
}
