mod collection;
mod sample;

pub use collection::{
    DrawCommand, FrameHistory, Shape, ShapeCollection, SplatterCommand, SPLATTER_MAX_OFFSET,
    SPLATTER_MAX_ROTATION,
};
pub use sample::{sample_color, ColorSampler, DEFAULT_MAX_ATTEMPTS, SAMPLE_COUNT};
