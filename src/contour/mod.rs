mod region;
mod trace;

pub use region::{polygon_area, BoundingBox, Point, Region};
pub use trace::{find_regions, find_regions_limited};
