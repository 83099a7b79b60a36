mod buffer;
mod sequence;

pub use buffer::{pick_color, PixelBuffer};
pub use sequence::ImageSequence;

use crate::error::Result;
use image::RgbImage;

/// Trait for frame producers (image sequences, decoded video, ...)
pub trait FrameSource {
    /// Produce the next frame, `None` once the source is exhausted
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Get the resolution of the most recent frame
    fn resolution(&self) -> (u32, u32);
}
