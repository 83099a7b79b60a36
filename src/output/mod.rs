mod svg;
mod xml;

pub use svg::{save_collection_svg, save_paths_svg, write_collection_svg, write_paths_svg};
pub use xml::{
    frame_file_name, load_first_shape, read_first_shape, save_shapes, write_shapes,
    XmlSequenceWriter,
};

use crate::error::Result;
use crate::shapes::ShapeCollection;

/// Trait for per-frame shape destinations
pub trait OutputSink {
    /// Write one frame's shapes
    fn write_frame(&mut self, index: usize, shapes: &ShapeCollection) -> Result<()>;
}
