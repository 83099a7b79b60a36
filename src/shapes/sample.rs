use crate::contour::{Point, Region};
use crate::error::{Result, ShapeError};
use crate::frame::PixelBuffer;
use crate::segmentation::Mask;
use image::Rgb;
use rand::Rng;

/// Matched pixels averaged per region
pub const SAMPLE_COUNT: usize = 5;

/// Default bound on random draws before giving up on a region
pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;

/// Monte Carlo estimate of a region's color
///
/// Draws uniform points inside the region's bounding box and keeps the ones
/// that land on distinct matched mask pixels. This is a fast approximation,
/// not the full-region mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSampler {
    samples: usize,
    max_attempts: usize,
}

impl Default for ColorSampler {
    fn default() -> Self {
        Self {
            samples: SAMPLE_COUNT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ColorSampler {
    pub fn new(samples: usize, max_attempts: usize) -> Self {
        Self {
            samples: samples.max(1),
            max_attempts,
        }
    }

    pub fn with_max_attempts(self, max_attempts: usize) -> Self {
        Self {
            max_attempts,
            ..self
        }
    }

    /// Average `samples` distinct matched pixels of `source` inside `region`
    ///
    /// # Errors
    /// * `InvalidBuffer` if the source is not RGB, does not match the mask
    ///   size, or the region lies outside the mask
    /// * `SamplingExhausted` if the attempt budget runs out first, which is
    ///   always the case when fewer than `samples` pixels match
    pub fn sample<R: Rng + ?Sized>(
        &self,
        region: &Region,
        mask: &Mask,
        source: &PixelBuffer,
        rng: &mut R,
    ) -> Result<Rgb<u8>> {
        let _span = tracing::debug_span!("sample_color").entered();

        if source.channels() < 3 {
            return Err(ShapeError::InvalidBuffer(
                "color sampling needs an RGB source".to_string(),
            ));
        }
        if source.dimensions() != mask.dimensions() {
            return Err(ShapeError::InvalidBuffer(format!(
                "mask {:?} does not match source {:?}",
                mask.dimensions(),
                source.dimensions()
            )));
        }

        let bbox = region.bounding_box();
        if bbox.x < 0
            || bbox.y < 0
            || bbox.max_x() >= mask.width() as i32
            || bbox.max_y() >= mask.height() as i32
        {
            return Err(ShapeError::InvalidBuffer(format!(
                "region bounds {:?} exceed the {}x{} mask",
                bbox,
                mask.width(),
                mask.height()
            )));
        }

        let mut accepted: Vec<Point> = Vec::with_capacity(self.samples);
        let mut sums = [0u32; 3];

        for _ in 0..self.max_attempts {
            let p = Point::new(
                bbox.x + rng.random_range(0..bbox.width) as i32,
                bbox.y + rng.random_range(0..bbox.height) as i32,
            );
            let (x, y) = (p.x as usize, p.y as usize);

            if !mask.is_set(p.x as u32, p.y as u32) || accepted.contains(&p) {
                continue;
            }

            for (c, sum) in sums.iter_mut().enumerate() {
                *sum += u32::from(source.at(x, y, c));
            }
            accepted.push(p);

            if accepted.len() == self.samples {
                let n = self.samples as u32;
                return Ok(Rgb([
                    (sums[0] / n) as u8,
                    (sums[1] / n) as u8,
                    (sums[2] / n) as u8,
                ]));
            }
        }

        Err(ShapeError::SamplingExhausted {
            found: accepted.len(),
            wanted: self.samples,
            attempts: self.max_attempts,
        })
    }
}

/// Sample a region's color with the default sampler
pub fn sample_color<R: Rng + ?Sized>(
    region: &Region,
    mask: &Mask,
    source: &PixelBuffer,
    rng: &mut R,
) -> Result<Rgb<u8>> {
    ColorSampler::default().sample(region, mask, source, rng)
}
