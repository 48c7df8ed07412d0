use std::borrow::Cow;

use image::{RgbImage, RgbaImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Bgra8,
    Rgba8,
    Rgb8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgra8 | PixelFormat::Rgba8 => 4,
            PixelFormat::Rgb8 => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitmapError {
    #[error("bitmap has zero width or height")]
    Empty,

    #[error("expected {expected} bytes of pixel data, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Decoded, uncompressed pixels handed to the recognition engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Bitmap {
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, BitmapError> {
        if width == 0 || height == 0 {
            return Err(BitmapError::Empty);
        }

        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(BitmapError::SizeMismatch {
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

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixels as BGRA8, converting only when the source is in another layout
    pub fn to_bgra8(&self) -> Cow<'_, [u8]> {
        match self.format {
            PixelFormat::Bgra8 => Cow::Borrowed(&self.data),
            PixelFormat::Rgba8 => Cow::Owned(
                self.data
                    .chunks_exact(4)
                    .flat_map(|px| [px[2], px[1], px[0], px[3]])
                    .collect(),
            ),
            PixelFormat::Rgb8 => Cow::Owned(
                self.data
                    .chunks_exact(3)
                    .flat_map(|px| [px[2], px[1], px[0], u8::MAX])
                    .collect(),
            ),
        }
    }
}

impl TryFrom<RgbaImage> for Bitmap {
    type Error = BitmapError;

    fn try_from(image: RgbaImage) -> Result<Self, Self::Error> {
        let (width, height) = image.dimensions();
        Bitmap::new(width, height, PixelFormat::Rgba8, image.into_raw())
    }
}

impl TryFrom<RgbImage> for Bitmap {
    type Error = BitmapError;

    fn try_from(image: RgbImage) -> Result<Self, Self::Error> {
        let (width, height) = image.dimensions();
        Bitmap::new(width, height, PixelFormat::Rgb8, image.into_raw())
    }
}
