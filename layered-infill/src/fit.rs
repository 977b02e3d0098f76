//! Place a motif into a tile.

use crate::config::InfillConfig;
use crate::content::Content;
use crate::error::Result;
use crate::geometry::Point;
use crate::grid::Tile;

/// Center `content` on `tile` and scale it by `tile.size / reference_size`.
///
/// The content's local origin is the midpoint of its bounding box. Every
/// point `p` maps to `tile.center + scale * (p - origin)`, truncated toward
/// zero. The first polygon of every motif file is a reference marker and is
/// dropped from the result.
///
/// Errors with `EmptyInput` when the content has no geometry at all.
pub fn fit(content: &Content, tile: &Tile, config: &InfillConfig) -> Result<Content> {
    let origin = content.bounding_box()?.centroid();
    let scale = config.scale_for(tile.size);
    // Float math saturates on the way back instead of overflowing
    let place_axis = |center: i64, v: i64, o: i64| (center as f64 + (scale * (v as f64 - o as f64)).trunc()) as i64;
    let place = |p: &Point| {
        Point::new(
            place_axis(tile.center.x, p.x, origin.x),
            place_axis(tile.center.y, p.y, origin.y),
        )
    };

    let mut fitted = Content::default();
    for line in &content.lines {
        let mut line = line.clone();
        line.points.iter_mut().for_each(|p| *p = place(p));
        fitted.lines.push(line);
    }
    // Skip the reference marker
    for polygon in content.polygons.iter().skip(1) {
        let mut polygon = polygon.clone();
        polygon.points.iter_mut().for_each(|p| *p = place(p));
        fitted.polygons.push(polygon);
    }

    Ok(fitted)
}
