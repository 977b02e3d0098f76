//! Core geometry types for layered-infill.
//!
//! ## Rust Lesson #3: Structs & Derives
//!
//! Every coordinate is an `i64` in microns. Integer points can derive
//! `Eq` and `Hash` (floats can't), so they work as map keys and compare
//! exactly - no epsilon juggling when checking whether two points meet.
//!
//! The `#[derive(...)]` macro auto-generates common functionality:
//! - `Debug` = printable with `{:?}`
//! - `Clone` / `Copy` = duplicate the value (Copy only for small values)
//! - `PartialEq` / `Eq` = compare with `==`

use crate::error::{InfillError, Result};

/// Largest coordinate magnitude accepted from contours and WKT files.
///
/// Up to 2^53 an `i64` converts to `f64` exactly, and sums or differences
/// of two such values stay well inside `i64`.
pub const MAX_COORD: i64 = 1 << 53;

/// A 2D point in fixed-point units (microns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

/// An open sequence of points (an infill stroke).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Polyline {
    pub points: Vec<Point>,
}

/// A closed ring of points. The closing point is never stored.
///
/// Whether a polygon is an outline or a hole depends on where it sits in
/// its set; see [`crate::clip`] for the even-odd convention.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Polygon {
    pub points: Vec<Point>,
}

/// Axis-aligned bounding box. `min <= max` componentwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

// ============================================================================
// IMPLEMENTATIONS (methods)
// ============================================================================

impl Point {
    #[inline]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Point as a float pair, for intersection math.
    #[inline]
    pub fn to_f64(self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }

    /// Round a float pair back to the integer grid.
    #[inline]
    pub fn from_f64(x: f64, y: f64) -> Self {
        Self::new(x.round() as i64, y.round() as i64)
    }
}

impl Polyline {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate the segments `(start, end)` in order.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate the edges, including the closing edge back to the start.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Calculate signed area using the shoelace formula.
    ///
    /// Positive for counter-clockwise winding (Y up), negative for clockwise.
    #[inline]
    pub fn signed_area(&self) -> f64 {
        signed_area_of_points(&self.points)
    }

    /// Check if the ring has clockwise winding.
    #[inline]
    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }
}

impl BoundingBox {
    /// Tight box around a point sequence.
    ///
    /// ## Rust Lesson #6: Option vs Result
    ///
    /// An empty input has no box. Instead of returning a sentinel like
    /// `(+inf, -inf)`, we return `Err(InfillError::EmptyInput)` and let the
    /// caller decide. `?` forwards it up the stack in one character.
    pub fn of_points<'a, I>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next().ok_or(InfillError::EmptyInput)?;

        Ok(iter.fold(Self { min: first, max: first }, |bb, p| bb.including(*p)))
    }

    /// Box of a polygon set (e.g. all outer contours).
    pub fn of_polygons(polygons: &[Polygon]) -> Result<Self> {
        Self::of_points(polygons.iter().flat_map(|p| p.points.iter()))
    }

    /// Box of a heterogeneous mix of polylines and polygons.
    pub fn of_shapes(lines: &[Polyline], polygons: &[Polygon]) -> Result<Self> {
        Self::of_points(
            lines
                .iter()
                .flat_map(|l| l.points.iter())
                .chain(polygons.iter().flat_map(|p| p.points.iter())),
        )
    }

    /// Grow the box to include `p`.
    #[inline]
    pub fn including(self, p: Point) -> Self {
        Self {
            min: Point::new(self.min.x.min(p.x), self.min.y.min(p.y)),
            max: Point::new(self.max.x.max(p.x), self.max.y.max(p.y)),
        }
    }

    /// Midpoint of the box (floor division), used as a local origin.
    ///
    /// This is NOT an area-weighted centroid of the shapes inside.
    #[inline]
    pub fn centroid(&self) -> Point {
        // The midpoint of two i64 always fits, the sum may not
        let mid = |a: i64, b: i64| (i128::from(a) + i128::from(b)).div_euclid(2) as i64;
        Point::new(mid(self.min.x, self.max.x), mid(self.min.y, self.max.y))
    }

    /// Saturates at `i64::MAX` for boxes wider than the `i64` range.
    #[inline]
    pub fn width(&self) -> i64 {
        self.max.x.saturating_sub(self.min.x)
    }

    #[inline]
    pub fn height(&self) -> i64 {
        self.max.y.saturating_sub(self.min.y)
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        (self.min.x..=self.max.x).contains(&p.x) && (self.min.y..=self.max.y).contains(&p.y)
    }

    /// Overlap test, edges inclusive.
    #[inline]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

/// Free-function form of [`BoundingBox::of_points`].
pub fn bounding_box(points: &[Point]) -> Result<BoundingBox> {
    BoundingBox::of_points(points)
}

/// Calculate signed area of a point sequence using the shoelace formula.
///
/// Returns:
/// - Positive value for counter-clockwise winding
/// - Negative value for clockwise winding
pub fn signed_area_of_points(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        let (xi, yi) = points[i].to_f64();
        let (xj, yj) = points[j].to_f64();
        area += xi * yj;
        area -= xj * yi;
    }
    area / 2.0
}

// ============================================================================
// TESTS
// ============================================================================
