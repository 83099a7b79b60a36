use super::types::{Classifier, Mask};
use crate::error::{Result, ShapeError};
use crate::frame::PixelBuffer;
use image::Rgb;

/// Mark pixels whose color is close to `reference`
///
/// The squared RGB distance (no square root) is compared against
/// `threshold³`. The mixed exponents are kept for compatibility with
/// existing threshold values: a threshold of 20 admits squared distances
/// below 8000, i.e. a Euclidean radius of about 89.
pub fn classify_by_color(buffer: &PixelBuffer, reference: Rgb<u8>, threshold: u32) -> Result<Mask> {
    let _span = tracing::debug_span!("classify_color").entered();

    if buffer.is_empty() {
        return Err(ShapeError::InvalidBuffer("zero-sized frame".to_string()));
    }
    if buffer.channels() < 3 {
        return Err(ShapeError::InvalidBuffer(format!(
            "color matching needs an RGB frame, got {} channel(s)",
            buffer.channels()
        )));
    }

    let cutoff = u64::from(threshold).saturating_pow(3);
    let Rgb([ref_r, ref_g, ref_b]) = reference;

    let mask = Mask::from_fn(buffer.width(), buffer.height(), |x, y| {
        let (x, y) = (x as usize, y as usize);
        let dr = i64::from(buffer.at(x, y, 0)) - i64::from(ref_r);
        let dg = i64::from(buffer.at(x, y, 1)) - i64::from(ref_g);
        let db = i64::from(buffer.at(x, y, 2)) - i64::from(ref_b);
        let distance = (dr * dr + dg * dg + db * db) as u64;
        distance < cutoff
    });

    tracing::debug!("{} pixels match {:?}", mask.count_set(), reference.0);
    Ok(mask)
}

/// Mark pixels that changed by more than `threshold` between two grayscale frames
pub fn classify_by_motion(
    current: &PixelBuffer,
    previous: &PixelBuffer,
    threshold: u32,
) -> Result<Mask> {
    let _span = tracing::debug_span!("classify_motion").entered();

    if current.is_empty() || previous.is_empty() {
        return Err(ShapeError::InvalidBuffer("zero-sized frame".to_string()));
    }
    if current.dimensions() != previous.dimensions() {
        return Err(ShapeError::InvalidBuffer(format!(
            "frame size changed from {:?} to {:?}",
            previous.dimensions(),
            current.dimensions()
        )));
    }
    if current.channels() != 1 || previous.channels() != 1 {
        return Err(ShapeError::InvalidBuffer(
            "motion detection needs grayscale frames".to_string(),
        ));
    }

    let mask = Mask::from_fn(current.width(), current.height(), |x, y| {
        let (x, y) = (x as usize, y as usize);
        u32::from(current.at(x, y, 0).abs_diff(previous.at(x, y, 0))) > threshold
    });

    tracing::debug!("{} pixels changed", mask.count_set());
    Ok(mask)
}

/// Stateless color matcher around a fixed reference color
#[derive(Debug, Clone)]
pub struct ColorMatcher {
    reference: Rgb<u8>,
    threshold: u32,
}

impl ColorMatcher {
    pub fn new(reference: Rgb<u8>, threshold: u32) -> Self {
        Self {
            reference,
            threshold,
        }
    }

    pub fn reference(&self) -> Rgb<u8> {
        self.reference
    }
}

impl Classifier for ColorMatcher {
    fn segment(&mut self, frame: &PixelBuffer) -> Result<Option<Mask>> {
        classify_by_color(frame, self.reference, self.threshold).map(Some)
    }

    fn name(&self) -> &'static str {
        "color"
    }
}

/// Frame-difference detector
///
/// Keeps the previous grayscale frame between calls. The first frame after
/// construction or `reset_state` only primes that state.
#[derive(Debug, Clone)]
pub struct MotionDetector {
    threshold: u32,
    previous: Option<PixelBuffer>,
}

impl MotionDetector {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            previous: None,
        }
    }
}

impl Classifier for MotionDetector {
    fn segment(&mut self, frame: &PixelBuffer) -> Result<Option<Mask>> {
        let current = frame.to_gray();
        let previous = self.previous.replace(current);

        match (previous, self.previous.as_ref()) {
            (Some(previous), Some(current)) => {
                classify_by_motion(current, &previous, self.threshold).map(Some)
            }
            _ => {
                tracing::debug!("Priming motion detector");
                Ok(None)
            }
        }
    }

    fn reset_state(&mut self) {
        tracing::info!("Resetting motion detector");
        self.previous = None;
    }

    fn name(&self) -> &'static str {
        "motion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbImage};

    fn gray(width: u32, height: u32, values: &[u8]) -> PixelBuffer {
        PixelBuffer::from_raw(width, height, 1, values.to_vec()).unwrap()
    }

    #[test]
    fn test_color_uses_cubed_threshold() {
        // Squared distances 0, 7994, 8000 and 8100 against a threshold of 20
        let image = RgbImage::from_fn(4, 1, |x, _| match x {
            0 => Rgb([100, 100, 100]),
            1 => Rgb([100 + 89, 100 + 8, 100 + 3]),
            2 => Rgb([100 + 80, 100 + 40, 100]),
            _ => Rgb([100 + 90, 100, 100]),
        });
        let mask = classify_by_color(&PixelBuffer::from(&image), Rgb([100, 100, 100]), 20).unwrap();

        assert!(mask.is_set(0, 0));
        assert!(mask.is_set(1, 0));
        assert!(!mask.is_set(2, 0));
        assert!(!mask.is_set(3, 0));
        assert!(mask.is_binary());
    }

    #[test]
    fn test_color_zero_threshold_matches_nothing() {
        let image = RgbImage::from_pixel(3, 3, Rgb([10, 20, 30]));
        let mask = classify_by_color(&PixelBuffer::from(&image), Rgb([10, 20, 30]), 0).unwrap();
        assert_eq!(mask.count_set(), 0);
    }

    #[test]
    fn test_color_rejects_invalid_buffers() {
        assert!(matches!(
            classify_by_color(&PixelBuffer::new(0, 0, 3), Rgb([0, 0, 0]), 20),
            Err(ShapeError::InvalidBuffer(_))
        ));
        assert!(matches!(
            classify_by_color(&PixelBuffer::new(2, 2, 1), Rgb([0, 0, 0]), 20),
            Err(ShapeError::InvalidBuffer(_))
        ));
    }

    #[test]
    fn test_motion_marks_changes_above_threshold() {
        let previous = gray(4, 1, &[10, 10, 10, 200]);
        let current = gray(4, 1, &[10, 45, 46, 100]);
        let mask = classify_by_motion(&current, &previous, 35).unwrap();

        assert!(!mask.is_set(0, 0));
        assert!(!mask.is_set(1, 0));
        assert!(mask.is_set(2, 0));
        assert!(mask.is_set(3, 0));
    }

    #[test]
    fn test_motion_zero_threshold_marks_every_difference() {
        let previous = gray(3, 1, &[10, 10, 10]);
        let current = gray(3, 1, &[10, 11, 9]);
        let mask = classify_by_motion(&current, &previous, 0).unwrap();

        assert!(!mask.is_set(0, 0));
        assert!(mask.is_set(1, 0));
        assert!(mask.is_set(2, 0));
    }

    #[test]
    fn test_motion_rejects_mismatched_frames() {
        let previous = gray(2, 1, &[0, 0]);
        let current = gray(1, 2, &[0, 0]);
        assert!(matches!(
            classify_by_motion(&current, &previous, 10),
            Err(ShapeError::InvalidBuffer(_))
        ));
    }

    #[test]
    fn test_motion_detector_primes_on_first_frame() {
        let mut detector = MotionDetector::new(35);
        let dark = PixelBuffer::from(&GrayImage::from_pixel(3, 3, Luma([0])));
        let bright = PixelBuffer::from(&GrayImage::from_pixel(3, 3, Luma([200])));

        assert!(detector.segment(&dark).unwrap().is_none());
        let mask = detector.segment(&bright).unwrap().unwrap();
        assert_eq!(mask.count_set(), 9);

        detector.reset_state();
        assert!(detector.segment(&bright).unwrap().is_none());
    }

    #[test]
    fn test_motion_detector_converts_rgb_frames() {
        let mut detector = MotionDetector::new(35);
        let black = PixelBuffer::from(&RgbImage::from_pixel(2, 2, Rgb([0, 0, 0])));
        let white = PixelBuffer::from(&RgbImage::from_pixel(2, 2, Rgb([255, 255, 255])));

        assert!(detector.segment(&black).unwrap().is_none());
        assert_eq!(detector.segment(&white).unwrap().unwrap().count_set(), 4);
    }
}
