//! SVG motif parsing - extract lines and polygons from SVG files.
//!
//! Uses usvg for complete SVG resolution (CSS, transforms, etc.)
//! then walks the tree and splits every path into its subpaths:
//! closed subpaths become polygons, open ones become polylines.
//!
//! ## Curve Flattening
//!
//! SVG paths contain Bézier curves (cubic and quadratic). These are
//! "flattened" into line segments with lyon_geom before conversion to
//! integer units.

use lyon_geom::{CubicBezierSegment, QuadraticBezierSegment, point};
use usvg::tiny_skia_path::PathSegment;

use crate::content::Content;
use crate::geometry::{Point, Polygon, Polyline};

/// Error type for SVG parsing.
#[derive(Debug)]
pub enum SvgError {
    ParseError(String),
    NoGeometry,
}

impl std::fmt::Display for SvgError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SvgError::ParseError(msg) => write!(f, "SVG parse error: {}", msg),
            SvgError::NoGeometry => write!(f, "No paths found in SVG"),
        }
    }
}

impl std::error::Error for SvgError {}

/// Tolerance for curve flattening, in SVG user units.
const CURVE_TOLERANCE: f32 = 0.01;

/// Extract a motif from SVG text.
///
/// `unit_scale` converts user units to output units (1000 for millimeters
/// to microns). Y is flipped so the motif reads upright on the print bed.
pub fn extract_content_from_svg(svg_content: &str, unit_scale: f64) -> Result<Content, SvgError> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg_content, &options)
        .map_err(|e| SvgError::ParseError(e.to_string()))?;

    let mut builder = ContentBuilder { unit_scale, content: Content::default() };
    extract_from_group(tree.root(), &mut builder);

    if builder.content.is_empty() {
        Err(SvgError::NoGeometry)
    } else {
        Ok(builder.content)
    }
}

/// Collects subpaths in document order.
struct ContentBuilder {
    unit_scale: f64,
    content: Content,
}

impl ContentBuilder {
    fn to_point(&self, x: f32, y: f32) -> Point {
        Point::from_f64(x as f64 * self.unit_scale, -(y as f64) * self.unit_scale)
    }

    /// Finish one subpath.
    fn push(&mut self, raw: &[(f32, f32)], closed: bool) {
        let mut points: Vec<Point> = raw.iter().map(|&(x, y)| self.to_point(x, y)).collect();
        points.dedup();

        if closed {
            if points.len() > 1 && points.first() == points.last() {
                points.pop();
            }
            if points.len() >= 3 {
                self.content.polygons.push(Polygon::new(points));
            }
        } else if points.len() >= 2 {
            self.content.lines.push(Polyline::new(points));
        }
    }
}

/// Recursively extract geometry from a usvg Group.
fn extract_from_group(group: &usvg::Group, builder: &mut ContentBuilder) {
    for child in group.children() {
        match child {
            usvg::Node::Group(group) => extract_from_group(group, builder),
            usvg::Node::Path(path) => extract_from_path(path, builder),
            // Ignore text, images, etc.
            _ => {}
        }
    }
}

fn extract_from_path(path: &usvg::Path, builder: &mut ContentBuilder) {
    // Bake the absolute transform in so nested groups land in place
    let Some(data) = path.data().clone().transform(path.abs_transform()) else {
        return;
    };

    let mut current: Vec<(f32, f32)> = Vec::new();
    let mut subpath_start: Option<(f32, f32)> = None;

    for segment in data.segments() {
        let last_point = current.last().copied();
        match segment {
            PathSegment::MoveTo(p) => {
                builder.push(&current, false);
                current.clear();
                current.push((p.x, p.y));
                subpath_start = Some((p.x, p.y));
            }
            PathSegment::LineTo(p) => {
                current.push((p.x, p.y));
            }
            PathSegment::QuadTo(ctrl, p) => {
                if let Some((lx, ly)) = last_point {
                    let curve = QuadraticBezierSegment {
                        from: point(lx, ly),
                        ctrl: point(ctrl.x, ctrl.y),
                        to: point(p.x, p.y),
                    };
                    curve.for_each_flattened(CURVE_TOLERANCE, &mut |segment| {
                        current.push((segment.to.x, segment.to.y));
                    });
                } else {
                    current.push((p.x, p.y));
                }
            }
            PathSegment::CubicTo(ctrl1, ctrl2, p) => {
                if let Some((lx, ly)) = last_point {
                    let curve = CubicBezierSegment {
                        from: point(lx, ly),
                        ctrl1: point(ctrl1.x, ctrl1.y),
                        ctrl2: point(ctrl2.x, ctrl2.y),
                        to: point(p.x, p.y),
                    };
                    curve.for_each_flattened(CURVE_TOLERANCE, &mut |segment| {
                        current.push((segment.to.x, segment.to.y));
                    });
                } else {
                    current.push((p.x, p.y));
                }
            }
            PathSegment::Close => {
                builder.push(&current, true);
                current.clear();
                // A segment after Close without MoveTo restarts at the subpath start
                if let Some(start) = subpath_start {
                    current.push(start);
                }
            }
        }
    }

    builder.push(&current, false);
}

// ============================================================================
// TESTS
// ============================================================================
