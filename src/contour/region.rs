/// Integer pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub(crate) fn offset(self, (dx, dy): (i32, i32)) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned pixel rectangle; `width`/`height` count pixels, so a single
/// pixel has size 1x1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Tight box around a set of points, `None` for an empty set
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);

        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Some(Self {
            x: min_x,
            y: min_y,
            width: (max_x - min_x) as u32 + 1,
            height: (max_y - min_y) as u32 + 1,
        })
    }

    /// Inclusive right edge
    pub fn max_x(&self) -> i32 {
        self.x + self.width as i32 - 1
    }

    /// Inclusive bottom edge
    pub fn max_y(&self) -> i32 {
        self.y + self.height as i32 - 1
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Geometric center, used as the rotation pivot for splatter rendering
    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.y >= self.y && p.x <= self.max_x() && p.y <= self.max_y()
    }
}

/// Traced outline of one connected mask component
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    points: Vec<Point>,
    bounding_box: BoundingBox,
    area: u32,
}

impl Region {
    /// Build a region from its ordered boundary; `None` if there are no points
    pub fn new(points: Vec<Point>, area: u32) -> Option<Self> {
        let bounding_box = BoundingBox::enclosing(&points)?;
        Some(Self {
            points,
            bounding_box,
            area,
        })
    }

    /// Build a region from a bare polygon, estimating its area with the
    /// shoelace formula
    pub fn from_polygon(points: Vec<Point>) -> Option<Self> {
        let area = polygon_area(&points).round() as u32;
        Self::new(points, area)
    }

    /// Boundary points in tracing order
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// Pixel count of the component (estimated for imported polygons)
    pub fn area(&self) -> u32 {
        self.area
    }

    /// Mean of the boundary points
    pub fn centroid(&self) -> (f32, f32) {
        let n = self.points.len() as f32;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0f32, 0.0f32), |(sx, sy), p| (sx + p.x as f32, sy + p.y as f32));
        (sx / n, sy / n)
    }
}

/// Absolute shoelace area of a closed polygon
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();
    twice.abs() as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_is_tight() {
        let points = vec![Point::new(3, 4), Point::new(7, 4), Point::new(5, 9)];
        let bbox = BoundingBox::enclosing(&points).unwrap();

        assert_eq!(bbox, BoundingBox { x: 3, y: 4, width: 5, height: 6 });
        assert_eq!((bbox.max_x(), bbox.max_y()), (7, 9));
        assert!(points.iter().all(|&p| bbox.contains(p)));
        assert_eq!(bbox.center(), (5.5, 7.0));
    }

    #[test]
    fn test_region_requires_points() {
        assert!(Region::new(Vec::new(), 0).is_none());

        let single = Region::new(vec![Point::new(2, 2)], 1).unwrap();
        assert_eq!(single.bounding_box().area(), 1);
        assert_eq!(single.centroid(), (2.0, 2.0));
    }

    #[test]
    fn test_polygon_area() {
        let square = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(polygon_area(&square), 100.0);
        assert_eq!(Region::from_polygon(square).unwrap().area(), 100);
    }
}
