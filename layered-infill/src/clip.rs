//! Clipping of assembled infill against the outer contour set.
//!
//! The outer contours are one region with even-odd semantics: a point is
//! inside when it lies inside an odd number of rings. Outlines and holes
//! don't need to be told apart, a hole is just a ring nested inside an
//! outline.
//!
//! - Polylines are open geometry: each segment is cut at every ring
//!   crossing and the pieces whose midpoint is inside are kept. A piece
//!   lying on a ring edge counts as inside, whichever side the edge is on.
//! - Polygons go through a real polygon/polygon intersection (`geo`).

use geo::{BooleanOps, Coord, LineString, MultiPolygon, Polygon as GeoPolygon};
use tracing::debug;

use crate::error::{InfillError, Result};
use crate::geometry::{BoundingBox, MAX_COORD, Point, Polygon, Polyline};

/// Parameters closer than this along a segment are the same cut.
const T_EPSILON: f64 = 1e-12;

/// A point this close to an edge (in microns) lies on it.
const EDGE_EPSILON: f64 = 1e-6;

// ============================================================================
// POINT IN POLYGON (Ray Casting Algorithm)
// ============================================================================
//
// ## Rust Lesson #8: References & Slices
//
// `&[Point]` is a "slice" - a borrowed view into a contiguous sequence.
// It works with Vec<Point>, arrays, or any contiguous memory.

/// Test if a point is inside a single ring using ray casting.
///
/// Casts a ray to the right and counts edge crossings.
/// Odd crossings = inside, even = outside.
#[inline]
pub fn point_in_polygon(px: f64, py: f64, polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = polygon[i].to_f64();
        let (xj, yj) = polygon[j].to_f64();

        if ((yi > py) != (yj > py)) && (px < (xj - xi) * (py - yi) / (yj - yi) + xi) {
            inside = !inside;
        }

        j = i;
    }

    inside
}

/// Even-odd membership over a whole contour set.
#[inline]
pub fn point_in_region(px: f64, py: f64, contours: &[Polygon]) -> bool {
    contours
        .iter()
        .filter(|ring| point_in_polygon(px, py, &ring.points))
        .count()
        % 2
        == 1
}

/// True when `(px, py)` lies on the segment `a-b`.
///
/// Ray casting alone is asymmetric on the boundary: it reports bottom and
/// left edges as inside and top and right edges as outside.
#[inline]
pub fn point_on_segment(px: f64, py: f64, a: Point, b: Point) -> bool {
    let (ax, ay) = a.to_f64();
    let (bx, by) = b.to_f64();
    let length = (bx - ax).hypot(by - ay);
    if length == 0.0 {
        return false;
    }

    // |cross| / length is the distance from the point to the line
    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    cross.abs() <= EDGE_EPSILON * length
        && (ax.min(bx) - EDGE_EPSILON..=ax.max(bx) + EDGE_EPSILON).contains(&px)
        && (ay.min(by) - EDGE_EPSILON..=ay.max(by) + EDGE_EPSILON).contains(&py)
}

/// True when `(px, py)` lies on an edge of any ring of the set.
pub fn point_on_boundary(px: f64, py: f64, contours: &[Polygon]) -> bool {
    contours
        .iter()
        .flat_map(|ring| ring.edges())
        .any(|(a, b)| point_on_segment(px, py, a, b))
}

// ============================================================================
// LINE-LINE INTERSECTION
// ============================================================================

/// Result of a segment-segment intersection test.
///
/// ## Rust Lesson #10: Enums (Sum Types)
///
/// Rust enums can carry data. The compiler makes every `match` handle
/// both variants, so "forgot to check for no intersection" can't happen.
#[derive(Debug, Clone, Copy)]
pub enum Intersection {
    None,
    Point { x: f64, y: f64, t: f64 },
}

/// Find the intersection of segment `(x1,y1)-(x2,y2)` with `(x3,y3)-(x4,y4)`.
///
/// `t` is the parameter along the first segment (0..=1).
#[inline]
#[allow(clippy::too_many_arguments)]
pub fn line_segment_intersection(
    x1: f64, y1: f64, x2: f64, y2: f64,
    x3: f64, y3: f64, x4: f64, y4: f64,
) -> Intersection {
    let denom = (y4 - y3) * (x2 - x1) - (x4 - x3) * (y2 - y1);

    // Parallel or coincident lines
    if denom.abs() < 1e-10 {
        return Intersection::None;
    }

    let ua = ((x4 - x3) * (y1 - y3) - (y4 - y3) * (x1 - x3)) / denom;
    let ub = ((x2 - x1) * (y1 - y3) - (y2 - y1) * (x1 - x3)) / denom;

    if (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub) {
        let ix = x1 + ua * (x2 - x1);
        let iy = y1 + ua * (y2 - y1);
        Intersection::Point { x: ix, y: iy, t: ua }
    } else {
        Intersection::None
    }
}

// ============================================================================
// CLIP REGION
// ============================================================================

/// The outer contour set plus its cached bounding box.
struct Region<'a> {
    contours: &'a [Polygon],
    bbox: BoundingBox,
}

impl<'a> Region<'a> {
    fn new(contours: &'a [Polygon]) -> Result<Option<Self>> {
        validate_contours(contours)?;
        if contours.is_empty() {
            return Ok(None);
        }
        let bbox = BoundingBox::of_polygons(contours)?;
        Ok(Some(Self { contours, bbox }))
    }

    /// Region membership with the boundary counted as inside.
    fn contains(&self, x: f64, y: f64) -> bool {
        point_on_boundary(x, y, self.contours) || point_in_region(x, y, self.contours)
    }

    /// Sorted, de-duplicated cut parameters of segment `a-b` against every
    /// ring edge, always including 0 and 1.
    fn cuts(&self, a: Point, b: Point) -> Vec<f64> {
        let (x1, y1) = a.to_f64();
        let (x2, y2) = b.to_f64();

        let mut cuts = vec![0.0, 1.0];
        for ring in self.contours {
            for (p, q) in ring.edges() {
                let (x3, y3) = p.to_f64();
                let (x4, y4) = q.to_f64();
                if let Intersection::Point { t, .. } =
                    line_segment_intersection(x1, y1, x2, y2, x3, y3, x4, y4)
                {
                    cuts.push(t);
                }
            }
        }

        cuts.sort_by(f64::total_cmp);
        cuts.dedup_by(|a, b| (*a - *b).abs() < T_EPSILON);
        cuts
    }

    /// Parameter spans of `a-b` that lie inside the region, adjacent spans merged.
    fn inside_spans(&self, a: Point, b: Point) -> Vec<(f64, f64)> {
        let seg_box = BoundingBox { min: a, max: a }.including(b);
        if !self.bbox.intersects(&seg_box) {
            return Vec::new();
        }

        let (x1, y1) = a.to_f64();
        let (x2, y2) = b.to_f64();

        // ## Rust Lesson #14: Iterators & Collecting
        //
        // .windows(2) gives sliding windows: [a,b], [b,c], [c,d], ...
        // Each window is one candidate piece between two cuts.
        let mut spans: Vec<(f64, f64)> = Vec::new();
        for pair in self.cuts(a, b).windows(2) {
            let (t0, t1) = (pair[0], pair[1]);
            let tm = (t0 + t1) / 2.0;
            if !self.contains(x1 + tm * (x2 - x1), y1 + tm * (y2 - y1)) {
                continue;
            }
            match spans.last_mut() {
                Some(last) if (last.1 - t0).abs() < T_EPSILON => last.1 = t1,
                _ => spans.push((t0, t1)),
            }
        }
        spans
    }
}

/// Reject outer contours the clipper can't process.
pub fn validate_contours(contours: &[Polygon]) -> Result<()> {
    for (i, ring) in contours.iter().enumerate() {
        if ring.len() < 3 {
            return Err(InfillError::ClipFailure(format!(
                "outer contour {} has {} points, at least 3 are required",
                i,
                ring.len()
            )));
        }
        if ring
            .points
            .iter()
            .any(|p| p.x.abs() > MAX_COORD || p.y.abs() > MAX_COORD)
        {
            return Err(InfillError::ClipFailure(format!(
                "outer contour {} has coordinates beyond +/-2^53",
                i
            )));
        }
    }
    Ok(())
}

#[inline]
fn lerp(a: Point, b: Point, t: f64) -> Point {
    let (x1, y1) = a.to_f64();
    let (x2, y2) = b.to_f64();
    Point::from_f64(x1 + t * (x2 - x1), y1 + t * (y2 - y1))
}

// ============================================================================
// POLYLINE CLIPPING
// ============================================================================

/// Clip open polylines to the interior of the outer contour set.
///
/// A polyline that leaves and re-enters the region comes back as several
/// polylines. Pieces that round to a single point are dropped.
pub fn clip_polylines(lines: &[Polyline], outer: &[Polygon]) -> Result<Vec<Polyline>> {
    let Some(region) = Region::new(outer)? else {
        return Ok(Vec::new());
    };

    let clipped: Vec<Polyline> = lines
        .iter()
        .flat_map(|line| clip_polyline(line, &region))
        .collect();

    debug!(input = lines.len(), output = clipped.len(), "clipped polylines");
    Ok(clipped)
}

fn clip_polyline(line: &Polyline, region: &Region<'_>) -> Vec<Polyline> {
    let mut out = Vec::new();
    let mut current: Vec<Point> = Vec::new();

    let flush = |current: &mut Vec<Point>, out: &mut Vec<Polyline>| {
        if current.len() >= 2 {
            out.push(Polyline::new(std::mem::take(current)));
        } else {
            current.clear();
        }
    };

    for (a, b) in line.segments() {
        if a == b {
            continue;
        }
        for (t0, t1) in region.inside_spans(a, b) {
            let p0 = lerp(a, b, t0);
            let p1 = lerp(a, b, t1);
            if p0 == p1 {
                continue;
            }
            if current.last() == Some(&p0) {
                current.push(p1);
            } else {
                flush(&mut current, &mut out);
                current.push(p0);
                current.push(p1);
            }
        }
    }
    flush(&mut current, &mut out);

    out
}

// ============================================================================
// POLYGON CLIPPING
// ============================================================================

fn to_line_string(points: &[Point]) -> LineString<f64> {
    LineString::from(
        points
            .iter()
            .map(|p| Coord { x: p.x as f64, y: p.y as f64 })
            .collect::<Vec<_>>(),
    )
}

/// Convert a geo ring back to our integer ring (closing point dropped).
fn from_line_string(ring: &LineString<f64>) -> Option<Polygon> {
    let mut points: Vec<Point> = ring.coords().map(|c| Point::from_f64(c.x, c.y)).collect();
    points.dedup();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    (points.len() >= 3).then(|| Polygon::new(points))
}

/// The even-odd region of all rings: XOR folds nesting parity into area.
fn even_odd_region(contours: &[Polygon]) -> MultiPolygon<f64> {
    let mut rings = contours
        .iter()
        .map(|ring| GeoPolygon::new(to_line_string(&ring.points), vec![]));

    let Some(first) = rings.next() else {
        return MultiPolygon::new(Vec::new());
    };
    rings.fold(MultiPolygon::new(vec![first]), |acc, ring| acc.xor(&ring))
}

/// Intersect each polygon with the outer contour set.
///
/// Results are returned as outline rings, each followed by its hole rings.
pub fn clip_polygons(polygons: &[Polygon], outer: &[Polygon]) -> Result<Vec<Polygon>> {
    validate_contours(outer)?;
    if outer.is_empty() || polygons.is_empty() {
        return Ok(Vec::new());
    }

    let region = even_odd_region(outer);
    let region_box = BoundingBox::of_polygons(outer)?;

    let mut clipped = Vec::new();
    for polygon in polygons {
        if polygon.len() < 3 {
            continue;
        }
        // Cheap reject before the boolean op
        let Ok(bb) = BoundingBox::of_points(&polygon.points) else {
            continue;
        };
        if !bb.intersects(&region_box) {
            continue;
        }

        let subject = GeoPolygon::new(to_line_string(&polygon.points), vec![]);
        for piece in subject.intersection(&region) {
            if let Some(outline) = from_line_string(piece.exterior()) {
                clipped.push(outline);
                clipped.extend(piece.interiors().iter().filter_map(from_line_string));
            }
        }
    }

    debug!(input = polygons.len(), output = clipped.len(), "clipped polygons");
    Ok(clipped)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: i64, y0: i64, x1: i64, y1: i64) -> Polygon {
        Polygon::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    fn line(points: &[(i64, i64)]) -> Polyline {
        Polyline::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    fn sorted_vertices(polygon: &Polygon) -> Vec<(i64, i64)> {
        let mut v: Vec<_> = polygon.points.iter().map(|p| (p.x, p.y)).collect();
        v.sort();
        v
    }

    fn area_sum(polygons: &[Polygon]) -> f64 {
        polygons.iter().map(|p| p.signed_area().abs()).sum()
    }

    #[test]
    fn point_inside_square() {
        let sq = rect(0, 0, 10, 10);
        assert!(point_in_polygon(5.0, 5.0, &sq.points));
        assert!(!point_in_polygon(15.0, 5.0, &sq.points));
        assert!(!point_in_polygon(-1.0, 5.0, &sq.points));
    }

    #[test]
    fn even_odd_treats_nested_ring_as_hole() {
        let contours = [rect(0, 0, 100, 100), rect(25, 25, 75, 75)];
        assert!(point_in_region(10.0, 10.0, &contours));
        assert!(!point_in_region(50.0, 50.0, &contours));
        assert!(!point_in_region(150.0, 50.0, &contours));
    }

    #[test]
    fn line_segment_intersection_test() {
        let result = line_segment_intersection(0.0, 0.0, 10.0, 10.0, 0.0, 10.0, 10.0, 0.0);
        if let Intersection::Point { x, y, t } = result {
            assert!((x - 5.0).abs() < 1e-10);
            assert!((y - 5.0).abs() < 1e-10);
            assert!((t - 0.5).abs() < 1e-10);
        } else {
            panic!("Expected intersection");
        }

        let result = line_segment_intersection(0.0, 0.0, 10.0, 0.0, 0.0, 5.0, 10.0, 5.0);
        assert!(matches!(result, Intersection::None));
    }

    #[test]
    fn polyline_entirely_inside_is_unchanged() {
        let input = line(&[(2, 5), (8, 5), (8, 8)]);
        let result = clip_polylines(&[input.clone()], &[rect(0, 0, 10, 10)]).unwrap();
        assert_eq!(result, vec![input]);
    }

    #[test]
    fn polyline_touching_corners_is_kept_whole() {
        let input = line(&[(0, 0), (10, 10)]);
        let result = clip_polylines(&[input.clone()], &[rect(0, 0, 10, 10)]).unwrap();
        assert_eq!(result, vec![input]);
    }

    #[test]
    fn polylines_on_every_edge_are_kept() {
        let square = [rect(0, 0, 10, 10)];
        let edges = [
            line(&[(2, 0), (8, 0)]),
            line(&[(2, 10), (8, 10)]),
            line(&[(0, 2), (0, 8)]),
            line(&[(10, 2), (10, 8)]),
        ];
        for edge in edges {
            let result = clip_polylines(&[edge.clone()], &square).unwrap();
            assert_eq!(result, vec![edge.clone()], "{edge:?}");
        }
    }

    #[test]
    fn polyline_along_top_edge_is_trimmed_to_it() {
        let result = clip_polylines(&[line(&[(-5, 10), (15, 10)])], &[rect(0, 0, 10, 10)]).unwrap();
        assert_eq!(result, vec![line(&[(0, 10), (10, 10)])]);
    }

    #[test]
    fn boundary_points_are_on_segment() {
        let (a, b) = (Point::new(0, 10), Point::new(10, 10));
        assert!(point_on_segment(5.0, 10.0, a, b));
        assert!(point_on_segment(10.0, 10.0, a, b));
        assert!(!point_on_segment(5.0, 10.5, a, b));
        assert!(!point_on_segment(-2.5, 10.0, a, b));
        assert!(point_on_boundary(10.0, 5.0, &[rect(0, 0, 10, 10)]));
        assert!(!point_on_boundary(5.0, 5.0, &[rect(0, 0, 10, 10)]));
    }

    #[test]
    fn polyline_entirely_outside_is_dropped() {
        let result = clip_polylines(&[line(&[(15, 5), (20, 5)])], &[rect(0, 0, 10, 10)]).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn polyline_crossing_is_cut_at_boundary() {
        let result = clip_polylines(&[line(&[(-5, 5), (15, 5)])], &[rect(0, 0, 10, 10)]).unwrap();
        assert_eq!(result, vec![line(&[(0, 5), (10, 5)])]);
    }

    #[test]
    fn polyline_through_hole_splits_in_two() {
        let contours = [rect(0, 0, 100, 100), rect(40, 40, 60, 60)];
        let result = clip_polylines(&[line(&[(-10, 50), (110, 50)])], &contours).unwrap();
        assert_eq!(result, vec![line(&[(0, 50), (40, 50)]), line(&[(60, 50), (100, 50)])]);
    }

    #[test]
    fn polyline_leaving_and_reentering_splits() {
        // U-shaped path that dips below the square between its two legs
        let input = line(&[(2, 8), (2, -5), (8, -5), (8, 8)]);
        let result = clip_polylines(&[input], &[rect(0, 0, 10, 10)]).unwrap();
        assert_eq!(result, vec![line(&[(2, 8), (2, 0)]), line(&[(8, 0), (8, 8)])]);
    }

    #[test]
    fn polyline_corners_stay_joined() {
        let input = line(&[(-5, 2), (5, 2), (5, 15)]);
        let result = clip_polylines(&[input], &[rect(0, 0, 10, 10)]).unwrap();
        assert_eq!(result, vec![line(&[(0, 2), (5, 2), (5, 10)])]);
    }

    #[test]
    fn intersection_points_round_to_nearest_unit() {
        // Crosses x = 0 at y = 2.5 -> rounds to 3 (half away from zero)
        let result = clip_polylines(&[line(&[(-1, 2), (1, 3)])], &[rect(0, 0, 10, 10)]).unwrap();
        assert_eq!(result, vec![line(&[(0, 3), (1, 3)])]);
    }

    #[test]
    fn degenerate_contour_is_clip_failure() {
        let bad = Polygon::new(vec![Point::new(0, 0), Point::new(1, 1)]);
        assert!(matches!(
            clip_polylines(&[line(&[(0, 0), (1, 1)])], &[bad.clone()]),
            Err(InfillError::ClipFailure(_))
        ));
        assert!(matches!(
            clip_polygons(&[rect(0, 0, 1, 1)], &[bad]),
            Err(InfillError::ClipFailure(_))
        ));
    }

    #[test]
    fn huge_coordinates_are_clip_failure() {
        let huge = rect(0, 0, i64::MAX / 2, 10);
        assert!(matches!(validate_contours(&[huge]), Err(InfillError::ClipFailure(_))));
    }

    #[test]
    fn no_contours_clip_everything_away() {
        assert!(clip_polylines(&[line(&[(0, 0), (1, 1)])], &[]).unwrap().is_empty());
        assert!(clip_polygons(&[rect(0, 0, 1, 1)], &[]).unwrap().is_empty());
    }

    #[test]
    fn square_motif_inside_equal_square_is_unchanged() {
        let motif = rect(0, 0, 1000, 1000);
        let result = clip_polygons(&[motif.clone()], &[rect(0, 0, 1000, 1000)]).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(sorted_vertices(&result[0]), sorted_vertices(&motif));
    }

    #[test]
    fn polygon_is_cut_to_region() {
        let motif = rect(500, 500, 1500, 1500);
        let result = clip_polygons(&[motif], &[rect(0, 0, 1000, 1000)]).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(
            sorted_vertices(&result[0]),
            sorted_vertices(&rect(500, 500, 1000, 1000))
        );
    }

    #[test]
    fn polygon_over_hole_keeps_hole_ring() {
        let contours = [rect(0, 0, 1000, 1000), rect(400, 400, 600, 600)];
        let motif = rect(100, 100, 900, 900);
        let result = clip_polygons(&[motif], &contours).unwrap();

        // Outline followed by its hole
        assert_eq!(result.len(), 2);
        assert_eq!(sorted_vertices(&result[0]), sorted_vertices(&rect(100, 100, 900, 900)));
        assert_eq!(sorted_vertices(&result[1]), sorted_vertices(&rect(400, 400, 600, 600)));
        let net = result[0].signed_area().abs() - result[1].signed_area().abs();
        assert!((net - (640_000.0 - 40_000.0)).abs() < 1.0);
    }

    #[test]
    fn polygon_outside_region_is_dropped() {
        let result = clip_polygons(&[rect(2000, 2000, 3000, 3000)], &[rect(0, 0, 1000, 1000)]).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn overlapping_outlines_cancel_under_even_odd() {
        // Two overlapping outlines: the overlap counts twice and drops out
        let contours = [rect(0, 0, 1000, 1000), rect(500, 0, 1500, 1000)];
        let result = clip_polygons(&[rect(0, 0, 1500, 1000)], &contours).unwrap();
        assert!((area_sum(&result) - 1_000_000.0).abs() < 1.0);
        assert!(!point_in_region(750.0, 500.0, &contours));
    }
}
