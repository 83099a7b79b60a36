use crate::contour::find_regions_limited;
use crate::error::{Result, ShapeError};
use crate::frame::{FrameSource, PixelBuffer};
use crate::output::OutputSink;
use crate::segmentation::{refine, Classifier, Mask};
use crate::shapes::{ColorSampler, FrameHistory, Shape, ShapeCollection};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};

/// Upper bound on region area, resolved against each frame's size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaLimit {
    /// The whole frame
    ImageArea,
    /// Frame area divided by the given factor
    ImageFraction(u32),
    /// A fixed number of pixels
    Pixels(u32),
}

impl AreaLimit {
    pub fn resolve(self, width: u32, height: u32) -> u32 {
        let area = u64::from(width) * u64::from(height);
        let limit = match self {
            AreaLimit::ImageArea => area,
            AreaLimit::ImageFraction(divisor) => area / u64::from(divisor.max(1)),
            AreaLimit::Pixels(pixels) => u64::from(pixels),
        };
        limit.min(u64::from(u32::MAX)) as u32
    }
}

/// Per-frame extraction parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    /// Smallest region kept, in pixels
    pub min_area: u32,
    /// Largest region kept
    pub max_area: AreaLimit,
    /// Regions kept per frame at most
    pub max_regions: usize,
    pub sampler: ColorSampler,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_area: 5,
            max_area: AreaLimit::ImageArea,
            max_regions: 20_000,
            sampler: ColorSampler::default(),
        }
    }
}

/// classify -> refine -> trace -> sample for one frame at a time
pub struct FramePipeline {
    config: ExtractConfig,
    classifier: Box<dyn Classifier>,
    rng: StdRng,
    last_mask: Option<Mask>,
}

impl FramePipeline {
    pub fn new(config: ExtractConfig, classifier: Box<dyn Classifier>) -> Self {
        Self::with_rng(config, classifier, StdRng::from_os_rng())
    }

    /// Deterministic color sampling
    pub fn with_seed(config: ExtractConfig, classifier: Box<dyn Classifier>, seed: u64) -> Self {
        Self::with_rng(config, classifier, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: ExtractConfig, classifier: Box<dyn Classifier>, rng: StdRng) -> Self {
        tracing::debug!("Pipeline using {} classifier: {:?}", classifier.name(), config);
        Self {
            config,
            classifier,
            rng,
            last_mask: None,
        }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Refined mask of the most recent frame that produced one
    pub fn last_mask(&self) -> Option<&Mask> {
        self.last_mask.as_ref()
    }

    /// Forget earlier frames (motion detection restarts from the next frame)
    pub fn reset(&mut self) {
        self.classifier.reset_state();
        self.last_mask = None;
    }

    /// Extract the shapes of one frame
    ///
    /// Frames the classifier rejects (`InvalidBuffer`) and the first frame of
    /// a motion run yield an empty collection. Regions whose color sampling
    /// is exhausted are skipped.
    pub fn process(&mut self, frame: &PixelBuffer) -> Result<ShapeCollection> {
        let _span = tracing::debug_span!("process_frame").entered();

        let mask = match self.classifier.segment(frame) {
            Ok(Some(mask)) => mask,
            Ok(None) => return Ok(ShapeCollection::default()),
            Err(ShapeError::InvalidBuffer(reason)) => {
                tracing::warn!("Skipping frame: {}", reason);
                return Ok(ShapeCollection::default());
            }
            Err(e) => return Err(e),
        };

        let refined = refine(&mask);
        let (width, height) = refined.dimensions();
        let max_area = self.config.max_area.resolve(width, height);
        let regions = find_regions_limited(
            &refined,
            self.config.min_area,
            max_area,
            self.config.max_regions,
        );

        let mut shapes = Vec::with_capacity(regions.len());
        for region in regions {
            match self
                .config
                .sampler
                .sample(&region, &refined, frame, &mut self.rng)
            {
                Ok(color) => shapes.push(Shape::new(region, color)),
                Err(ShapeError::SamplingExhausted { found, wanted, .. }) => {
                    tracing::warn!(
                        "Skipping region at {:?}: only {} of {} color samples",
                        region.bounding_box(),
                        found,
                        wanted
                    );
                }
                Err(e) => return Err(e),
            }
        }

        self.last_mask = Some(refined);
        tracing::debug!("Frame produced {} shapes", shapes.len());

        Ok(shapes.into_iter().collect())
    }
}

/// Run every frame of `source` through the pipeline, writing each frame's
/// shapes to `sink` and returning the full history
pub fn run_pipeline<S, O>(
    source: &mut S,
    sink: &mut O,
    pipeline: &mut FramePipeline,
) -> Result<FrameHistory>
where
    S: FrameSource,
    O: OutputSink,
{
    let mut history = FrameHistory::new();
    let mut total_decode_time = Duration::ZERO;
    let mut total_extract_time = Duration::ZERO;
    let mut total_output_time = Duration::ZERO;

    tracing::info!("Starting frame loop");

    loop {
        let decode_start = Instant::now();
        let Some(frame) = source.next_frame()? else {
            break;
        };
        total_decode_time += decode_start.elapsed();

        let extract_start = Instant::now();
        let shapes = pipeline.process(&PixelBuffer::from(&frame))?;
        total_extract_time += extract_start.elapsed();

        let output_start = Instant::now();
        let index = history.len();
        sink.write_frame(index, &shapes)?;
        total_output_time += output_start.elapsed();

        tracing::debug!("Frame {}: {} shapes", index, shapes.len());
        history.push(shapes);

        let frame_count = history.len();

        // Log stats every 30 frames
        if frame_count % 30 == 0 {
            let avg_decode_ms = total_decode_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_extract_ms = total_extract_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_output_ms = total_output_time.as_secs_f64() * 1000.0 / frame_count as f64;

            tracing::info!(
                "Frame {}: decode={:.1}ms, extract={:.1}ms, output={:.1}ms, shapes so far={}",
                frame_count,
                avg_decode_ms,
                avg_extract_ms,
                avg_output_ms,
                history.total_shapes()
            );
        }
    }

    tracing::info!(
        "Finished {} frames with {} shapes",
        history.len(),
        history.total_shapes()
    );

    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::BoundingBox;
    use crate::segmentation::{ColorMatcher, MotionDetector};
    use image::{Rgb, RgbImage};

    fn red_square_frame() -> RgbImage {
        RgbImage::from_fn(100, 100, |x, y| {
            if (40..60).contains(&x) && (40..60).contains(&y) {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    struct Frames(Vec<RgbImage>);

    impl FrameSource for Frames {
        fn next_frame(&mut self) -> Result<Option<RgbImage>> {
            if self.0.is_empty() {
                Ok(None)
            } else {
                Ok(Some(self.0.remove(0)))
            }
        }

        fn resolution(&self) -> (u32, u32) {
            (100, 100)
        }
    }

    #[derive(Default)]
    struct Recorder(Vec<(usize, usize)>);

    impl OutputSink for Recorder {
        fn write_frame(&mut self, index: usize, shapes: &ShapeCollection) -> Result<()> {
            self.0.push((index, shapes.len()));
            Ok(())
        }
    }

    #[test]
    fn test_area_limit() {
        assert_eq!(AreaLimit::ImageArea.resolve(100, 50), 5000);
        assert_eq!(AreaLimit::ImageFraction(25).resolve(100, 50), 200);
        assert_eq!(AreaLimit::ImageFraction(0).resolve(10, 10), 100);
        assert_eq!(AreaLimit::Pixels(7).resolve(100, 50), 7);
    }

    #[test]
    fn test_red_square_end_to_end() {
        let frame = PixelBuffer::from(&red_square_frame());
        let classifier = Box::new(ColorMatcher::new(Rgb([255, 0, 0]), 20));
        let mut pipeline = FramePipeline::with_seed(ExtractConfig::default(), classifier, 9);

        let shapes = pipeline.process(&frame).unwrap();

        assert_eq!(shapes.len(), 1);
        let shape = &shapes.shapes()[0];
        assert_eq!(
            shape.region().bounding_box(),
            BoundingBox { x: 40, y: 40, width: 20, height: 20 }
        );
        assert_eq!(shape.color(), Rgb([255, 0, 0]));
        assert!(pipeline.last_mask().unwrap().is_binary());
    }

    #[test]
    fn test_area_limits_filter_regions() {
        let frame = PixelBuffer::from(&red_square_frame());
        let config = ExtractConfig {
            max_area: AreaLimit::ImageFraction(100),
            ..ExtractConfig::default()
        };
        let classifier = Box::new(ColorMatcher::new(Rgb([255, 0, 0]), 20));
        let mut pipeline = FramePipeline::with_seed(config, classifier, 1);

        // Square is ~388 pixels after refinement, limit is 100
        assert!(pipeline.process(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_frame_yields_empty_collection() {
        let classifier = Box::new(ColorMatcher::new(Rgb([255, 0, 0]), 20));
        let mut pipeline = FramePipeline::with_seed(ExtractConfig::default(), classifier, 1);

        let shapes = pipeline.process(&PixelBuffer::new(0, 0, 3)).unwrap();
        assert!(shapes.is_empty());
    }

    #[test]
    fn test_reset_primes_motion_again() {
        let blank = PixelBuffer::from(&RgbImage::from_pixel(100, 100, Rgb([0, 0, 0])));
        let square = PixelBuffer::from(&red_square_frame());
        let mut pipeline =
            FramePipeline::with_seed(ExtractConfig::default(), Box::new(MotionDetector::new(35)), 2);

        assert!(pipeline.process(&blank).unwrap().is_empty());
        assert_eq!(pipeline.process(&square).unwrap().len(), 1);
        assert!(pipeline.last_mask().is_some());

        pipeline.reset();
        assert!(pipeline.last_mask().is_none());
        // Back to priming, so the change is not seen
        assert!(pipeline.process(&blank).unwrap().is_empty());
        assert_eq!(pipeline.process(&square).unwrap().len(), 1);
    }

    #[test]
    fn test_motion_run_over_sequence() {
        let blank = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        let mut source = Frames(vec![blank.clone(), red_square_frame(), red_square_frame()]);
        let mut sink = Recorder::default();
        let mut pipeline =
            FramePipeline::with_seed(ExtractConfig::default(), Box::new(MotionDetector::new(35)), 4);

        let history = run_pipeline(&mut source, &mut sink, &mut pipeline).unwrap();

        // Priming frame, the square appearing, then no change
        assert_eq!(sink.0, vec![(0, 0), (1, 1), (2, 0)]);
        assert_eq!(history.len(), 3);
        assert_eq!(history.get(1).unwrap().shapes()[0].color(), Rgb([255, 0, 0]));
    }
}
