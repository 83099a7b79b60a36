use crate::contour::{Point, Region};
use image::Rgb;
use rand::Rng;

/// Maximum splatter rotation either way, in degrees
pub const SPLATTER_MAX_ROTATION: f32 = 30.0;

/// Maximum splatter offset along each axis, in pixels
pub const SPLATTER_MAX_OFFSET: f32 = 20.0;

/// A traced region with its sampled color
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    region: Region,
    color: Rgb<u8>,
}

impl Shape {
    pub fn new(region: Region, color: Rgb<u8>) -> Self {
        Self { region, color }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn color(&self) -> Rgb<u8> {
        self.color
    }

    /// Rotation pivot for splatter rendering (bounding-box center)
    pub fn pivot(&self) -> (f32, f32) {
        self.region.bounding_box().center()
    }
}

/// One filled polygon, drawn as-is
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand<'a> {
    pub polygon: &'a [Point],
    pub color: Rgb<u8>,
}

/// One filled polygon with a random rotation about `pivot` followed by a
/// random offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplatterCommand<'a> {
    pub polygon: &'a [Point],
    pub color: Rgb<u8>,
    pub pivot: (f32, f32),
    pub rotation_degrees: f32,
    pub offset: (f32, f32),
}

impl SplatterCommand<'_> {
    /// Where a polygon point ends up after rotation and offset
    ///
    /// The point is rotated about `pivot` first; `offset` is then added in
    /// image space, so the jitter direction does not turn with the shape.
    pub fn transform(&self, p: Point) -> (f32, f32) {
        let (sin, cos) = self.rotation_degrees.to_radians().sin_cos();
        let dx = p.x as f32 - self.pivot.0;
        let dy = p.y as f32 - self.pivot.1;
        (
            self.pivot.0 + dx * cos - dy * sin + self.offset.0,
            self.pivot.1 + dx * sin + dy * cos + self.offset.1,
        )
    }

    /// All polygon points, transformed
    pub fn transformed_polygon(&self) -> Vec<(f32, f32)> {
        self.polygon.iter().map(|&p| self.transform(p)).collect()
    }
}

/// All shapes found in one frame, in detection order
///
/// Built once and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeCollection {
    shapes: Vec<Shape>,
}

impl ShapeCollection {
    /// Pair index-aligned regions and colors; `None` if the lengths differ
    pub fn from_parts(regions: Vec<Region>, colors: Vec<Rgb<u8>>) -> Option<Self> {
        if regions.len() != colors.len() {
            return None;
        }
        Some(
            regions
                .into_iter()
                .zip(colors)
                .map(|(region, color)| Shape::new(region, color))
                .collect(),
        )
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn get(&self, index: usize) -> Option<&Shape> {
        self.shapes.get(index)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Shape> {
        self.shapes.iter()
    }

    /// Plain rendering: each polygon filled with its color, in order
    pub fn draw(&self) -> impl Iterator<Item = DrawCommand<'_>> + '_ {
        self.shapes.iter().map(|shape| DrawCommand {
            polygon: shape.region.points(),
            color: shape.color,
        })
    }

    /// Splatter rendering: like `draw`, with a fresh random rotation within
    /// ±30° about each shape's bounding-box center and an offset within
    /// ±20 px on every call
    pub fn draw_splatter<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<SplatterCommand<'_>> {
        self.shapes
            .iter()
            .map(|shape| SplatterCommand {
                polygon: shape.region.points(),
                color: shape.color,
                pivot: shape.pivot(),
                rotation_degrees: rng.random_range(-SPLATTER_MAX_ROTATION..=SPLATTER_MAX_ROTATION),
                offset: (
                    rng.random_range(-SPLATTER_MAX_OFFSET..=SPLATTER_MAX_OFFSET),
                    rng.random_range(-SPLATTER_MAX_OFFSET..=SPLATTER_MAX_OFFSET),
                ),
            })
            .collect()
    }
}

impl FromIterator<Shape> for ShapeCollection {
    fn from_iter<I: IntoIterator<Item = Shape>>(iter: I) -> Self {
        Self {
            shapes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ShapeCollection {
    type Item = &'a Shape;
    type IntoIter = std::slice::Iter<'a, Shape>;

    fn into_iter(self) -> Self::IntoIter {
        self.shapes.iter()
    }
}

/// Per-frame collections in frame order; only ever appended to
#[derive(Debug, Clone, Default)]
pub struct FrameHistory {
    frames: Vec<ShapeCollection>,
}

impl FrameHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next frame's shapes, returning its frame index
    pub fn push(&mut self, frame: ShapeCollection) -> usize {
        self.frames.push(frame);
        self.frames.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&ShapeCollection> {
        self.frames.get(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ShapeCollection> {
        self.frames.iter()
    }

    /// Shapes across all frames
    pub fn total_shapes(&self) -> usize {
        self.frames.iter().map(ShapeCollection::len).sum()
    }
}
