mod classify;
mod refine;
pub mod types;

pub use classify::{classify_by_color, classify_by_motion, ColorMatcher, MotionDetector};
pub use refine::{binarize, box_blur, refine, BINARIZE_LEVEL, BLUR_KERNEL_SIZE};
pub use types::{Classifier, Mask, MASK_OFF, MASK_ON};

use image::Rgb;

/// Create the classifier for a run: color matching when a reference color
/// is given, frame-difference motion detection otherwise
pub fn create_classifier(reference: Option<Rgb<u8>>, threshold: u32) -> Box<dyn Classifier> {
    match reference {
        Some(color) => Box::new(ColorMatcher::new(color, threshold)),
        None => Box::new(MotionDetector::new(threshold)),
    }
}
