use crate::error::{Result, ShapeError};
use image::{GrayImage, Rgb, RgbImage};
use ndarray::Array3;

/// Owned frame samples laid out as (height, width, channels)
///
/// Holds 1 (grayscale) or 3 (RGB) channels per pixel. Accessors are
/// bounds-checked; the row/channel stride never leaves this type.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    data: Array3<u8>,
}

impl PixelBuffer {
    /// Create a zero-filled buffer
    pub fn new(width: u32, height: u32, channels: usize) -> Self {
        Self {
            data: Array3::zeros((height as usize, width as usize, channels)),
        }
    }

    /// Wrap interleaved row-major samples
    pub fn from_raw(width: u32, height: u32, channels: usize, samples: Vec<u8>) -> Result<Self> {
        let data = Array3::from_shape_vec((height as usize, width as usize, channels), samples)
            .map_err(|e| {
                ShapeError::InvalidBuffer(format!(
                    "{}x{}x{} samples do not fit: {}",
                    width, height, channels, e
                ))
            })?;
        Ok(Self { data })
    }

    pub fn width(&self) -> u32 {
        self.data.shape()[1] as u32
    }

    pub fn height(&self) -> u32 {
        self.data.shape()[0] as u32
    }

    pub fn channels(&self) -> usize {
        self.data.shape()[2]
    }

    /// Returns (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// True when the buffer has no pixels or no channels
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read one channel of one pixel
    pub fn sample(&self, x: u32, y: u32, channel: usize) -> Option<u8> {
        self.data
            .get([y as usize, x as usize, channel])
            .copied()
    }

    /// Read the RGB value at a pixel, `None` outside the frame or for grayscale buffers
    pub fn rgb(&self, x: u32, y: u32) -> Option<Rgb<u8>> {
        if self.channels() < 3 {
            return None;
        }
        Some(Rgb([
            self.sample(x, y, 0)?,
            self.sample(x, y, 1)?,
            self.sample(x, y, 2)?,
        ]))
    }

    /// Unchecked read for the per-pixel loops of the extraction stages
    pub(crate) fn at(&self, x: usize, y: usize, channel: usize) -> u8 {
        self.data[[y, x, channel]]
    }

    /// Convert to a single-channel luma buffer
    ///
    /// Grayscale input is copied as-is.
    pub fn to_gray(&self) -> PixelBuffer {
        if self.channels() < 3 {
            return self.clone();
        }

        let (height, width) = (self.data.shape()[0], self.data.shape()[1]);
        let data = Array3::from_shape_fn((height, width, 1), |(y, x, _)| {
            luma(self.at(x, y, 0), self.at(x, y, 1), self.at(x, y, 2))
        });
        Self { data }
    }
}

/// RGB to luma with the BT.601 weights
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    y.round().clamp(0.0, 255.0) as u8
}

/// Reference color under a clicked/picked pixel, `None` outside the frame
pub fn pick_color(buffer: &PixelBuffer, x: u32, y: u32) -> Option<Rgb<u8>> {
    let color = buffer.rgb(x, y);
    tracing::debug!("Picked color at ({}, {}): {:?}", x, y, color);
    color
}

impl From<&RgbImage> for PixelBuffer {
    fn from(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let data = Array3::from_shape_fn((height as usize, width as usize, 3), |(y, x, c)| {
            image.get_pixel(x as u32, y as u32)[c]
        });
        Self { data }
    }
}

impl From<RgbImage> for PixelBuffer {
    fn from(image: RgbImage) -> Self {
        Self::from(&image)
    }
}

impl From<&GrayImage> for PixelBuffer {
    fn from(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        let data = Array3::from_shape_fn((height as usize, width as usize, 1), |(y, x, _)| {
            image.get_pixel(x as u32, y as u32)[0]
        });
        Self { data }
    }
}
