use crate::error::Result;
use crate::frame::PixelBuffer;
use image::{GrayImage, Luma};
use ndarray::Array2;

/// Value written for matched pixels
pub const MASK_ON: u8 = 255;

/// Value written for unmatched pixels
pub const MASK_OFF: u8 = 0;

/// Single-channel match map, indexed (row, column)
///
/// Classifiers and the refiner only ever write `MASK_ON`/`MASK_OFF`; the
/// intermediate blur result is the one place other values appear.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    data: Array2<u8>,
}

impl Mask {
    /// All-off mask
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: Array2::zeros((height as usize, width as usize)),
        }
    }

    /// Zero-sized mask
    pub fn empty() -> Self {
        Self::new(0, 0)
    }

    /// Build a binary mask from a per-pixel predicate
    pub fn from_fn<F>(width: u32, height: u32, mut matched: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let data = Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            if matched(x as u32, y as u32) {
                MASK_ON
            } else {
                MASK_OFF
            }
        });
        Self { data }
    }

    pub(crate) fn from_array(data: Array2<u8>) -> Self {
        Self { data }
    }

    pub(crate) fn as_array(&self) -> &Array2<u8> {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.data.ncols() as u32
    }

    pub fn height(&self) -> u32 {
        self.data.nrows() as u32
    }

    /// Returns (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        self.data.get([y as usize, x as usize]).copied()
    }

    /// True when the pixel exists and is fully on
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.get(x, y) == Some(MASK_ON)
    }

    /// Number of fully-on pixels
    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v == MASK_ON).count()
    }

    /// True when every value is `MASK_ON` or `MASK_OFF`
    pub fn is_binary(&self) -> bool {
        self.data.iter().all(|&v| v == MASK_ON || v == MASK_OFF)
    }

    /// Copy into a grayscale image for inspection
    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width(), self.height(), |x, y| {
            Luma([self.data[[y as usize, x as usize]]])
        })
    }
}

/// Trait for per-frame region classifiers
///
/// Allows swapping between color matching and motion detection
pub trait Classifier {
    /// Classify a frame into a binary mask
    ///
    /// # Returns
    /// * `Ok(None)` when the classifier has nothing to compare against yet
    ///   (the first frame of a motion sequence)
    fn segment(&mut self, frame: &PixelBuffer) -> Result<Option<Mask>>;

    /// Reset internal state (for classifiers that remember earlier frames)
    ///
    /// Call this when:
    /// - Scene cuts detected
    /// - Starting a new sequence
    fn reset_state(&mut self) {
        // Default implementation: no-op for stateless classifiers
    }

    /// Short name for logs
    fn name(&self) -> &'static str;
}
