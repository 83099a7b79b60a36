use crate::contour::Point;
use image::Rgb;
use std::ops::{Add, Mul, Sub};

/// Floating-point 2D point used for curve construction
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn distance(self, other: Self) -> f32 {
        let d = other - self;
        (d.x * d.x + d.y * d.y).sqrt()
    }
}

impl From<Point> for PointF {
    fn from(p: Point) -> Self {
        Self::new(p.x as f32, p.y as f32)
    }
}

impl Add for PointF {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for PointF {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for PointF {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Cubic Bezier from the previous anchor to `to`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicSegment {
    pub ctrl1: PointF,
    pub ctrl2: PointF,
    pub to: PointF,
}

/// Closed chain of cubic segments starting and ending at `start`
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedPath {
    pub start: PointF,
    pub segments: Vec<CubicSegment>,
    pub color: Rgb<u8>,
}

impl SmoothedPath {
    pub fn empty(color: Rgb<u8>) -> Self {
        Self {
            start: PointF::default(),
            segments: Vec::new(),
            color,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Anchor points in order, starting with `start`
    pub fn anchors(&self) -> Vec<PointF> {
        if self.is_empty() {
            return Vec::new();
        }
        std::iter::once(self.start)
            .chain(self.segments.iter().map(|s| s.to))
            .collect()
    }

    /// Evaluate segment `index` at `t` in [0, 1]
    pub fn point_at(&self, index: usize, t: f32) -> Option<PointF> {
        let segment = self.segments.get(index)?;
        let from = if index == 0 {
            self.start
        } else {
            self.segments[index - 1].to
        };

        let u = 1.0 - t;
        Some(
            from * (u * u * u)
                + segment.ctrl1 * (3.0 * u * u * t)
                + segment.ctrl2 * (3.0 * u * t * t)
                + segment.to * (t * t * t),
        )
    }
}
