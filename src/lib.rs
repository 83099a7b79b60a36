//! Raster to vector shape extraction.
//!
//! Frames are classified into a binary mask (by reference color or by motion
//! against the previous frame), the mask is denoised, its connected regions
//! are traced into outline polygons and each polygon is given a sampled
//! color. Outlines can be re-fitted as smooth closed cubic curves and written
//! to XML or SVG.

pub mod contour;
pub mod error;
pub mod frame;
pub mod output;
pub mod pipeline;
pub mod segmentation;
pub mod shapes;
pub mod smoothing;

pub use error::{Result, ShapeError};
