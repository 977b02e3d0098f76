//! Pattern assembly: grid → fitted motifs → clipped fill.
//!
//! This is the one entry point the request layer talks to. Everything it
//! needs arrives in a [`GenerateRequest`]; nothing is cached between calls.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::clip::{clip_polygons, clip_polylines, validate_contours};
use crate::config::InfillConfig;
use crate::content::{Content, parse_content, resolve_content_path};
use crate::error::Result;
use crate::fit::fit;
use crate::geometry::{BoundingBox, Point, Polygon, Polyline};
use crate::grid::{Grid, OriginMode, TileShape, build_grid, single_tile};

/// Clipped fill for one layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillResult {
    pub lines: Vec<Polyline>,
    pub polygons: Vec<Polygon>,
}

impl FillResult {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.polygons.is_empty()
    }
}

/// Parameters of one `generate` call.
///
/// ## Rust Lesson #9: Builder Methods
///
/// The required inputs go through `new`, the optional ones through
/// `with_*` methods that take and return `self`, so a request reads as one
/// expression:
///
/// ```ignore
/// let request = GenerateRequest::new(contours, "web", 5_000, 120, "tiles")
///     .with_shape(TileShape::Square)
///     .with_origin(OriginMode::Relative);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Outlines, each followed by its holes. All rings together form one
    /// even-odd region.
    pub outer_contours: Vec<Polygon>,
    pub pattern: String,
    pub tile_size: i64,
    pub shape: TileShape,
    pub origin: OriginMode,
    /// Layer height, used to pick the content file.
    pub z: i64,
    pub directory: PathBuf,
    /// Place one tile here instead of tiling the whole region.
    pub center: Option<Point>,
}

impl GenerateRequest {
    pub fn new(
        outer_contours: Vec<Polygon>,
        pattern: impl Into<String>,
        tile_size: i64,
        z: i64,
        directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            outer_contours,
            pattern: pattern.into(),
            tile_size,
            shape: TileShape::default(),
            origin: OriginMode::default(),
            z,
            directory: directory.into(),
            center: None,
        }
    }

    pub fn with_shape(mut self, shape: TileShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_origin(mut self, origin: OriginMode) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_center(mut self, center: Point) -> Self {
        self.center = Some(center);
        self
    }

    /// The tile layout this request asks for.
    pub fn grid(&self, content_path: &Path, config: &InfillConfig) -> Result<Grid> {
        match self.center {
            Some(center) => single_tile(center, self.tile_size, self.shape, content_path),
            None => build_grid(
                &self.outer_contours,
                self.tile_size,
                self.shape,
                self.origin,
                content_path,
                config,
            ),
        }
    }
}

/// Load, fit and concatenate the motif of every tile, row by row.
///
/// Each distinct content path is parsed once per call.
pub fn render(grid: &Grid, config: &InfillConfig) -> Result<Content> {
    let mut cache: HashMap<&Path, Content> = HashMap::new();
    let mut assembled = Content::default();

    for tile in grid.tiles() {
        let path = tile.content_path.as_path();
        if !cache.contains_key(path) {
            cache.insert(path, parse_content(path, config)?);
        }
        let content = &cache[path];

        let mut fitted = fit(content, tile, config)?;
        assembled.append(&mut fitted);
    }

    Ok(assembled)
}

/// Build the fill for one layer.
///
/// Resolves the layer's content file, lays out tiles, renders them and
/// clips lines and polygons against the outer contours.
pub fn generate(request: &GenerateRequest, config: &InfillConfig) -> Result<FillResult> {
    config.validate()?;
    // Fail on bad or empty contours before touching the filesystem
    validate_contours(&request.outer_contours)?;
    BoundingBox::of_polygons(&request.outer_contours)?;

    let content_path = resolve_content_path(&request.pattern, &request.directory, request.z)?;
    let grid = request.grid(&content_path, config)?;
    info!(
        pattern = %request.pattern,
        z = request.z,
        tiles = grid.len(),
        path = %content_path.display(),
        "generating infill"
    );

    let assembled = render(&grid, config)?;
    let lines = clip_polylines(&assembled.lines, &request.outer_contours)?;
    let polygons = clip_polygons(&assembled.polygons, &request.outer_contours)?;

    debug!(
        lines_in = assembled.lines.len(),
        lines_out = lines.len(),
        polygons_in = assembled.polygons.len(),
        polygons_out = polygons.len(),
        "clipped to outer contours"
    );
    Ok(FillResult { lines, polygons })
}

/// Holds a configuration for repeated `generate` calls.
#[derive(Debug, Clone, Default)]
pub struct InfillGenerator {
    config: InfillConfig,
}

impl InfillGenerator {
    pub fn new(config: InfillConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InfillConfig {
        &self.config
    }

    pub fn generate(&self, request: &GenerateRequest) -> Result<FillResult> {
        generate(request, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InfillError;
    use std::fs;
    use tempfile::TempDir;

    fn square(x0: i64, y0: i64, x1: i64, y1: i64) -> Polygon {
        Polygon::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    fn line(a: (i64, i64), b: (i64, i64)) -> Polyline {
        Polyline::new(vec![Point::new(a.0, a.1), Point::new(b.0, b.1)])
    }

    fn shared_diagonal() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("diag.wkt"), "LINESTRING (0 0, 5 5)\n").unwrap();
        dir
    }

    #[test]
    fn ten_by_ten_square_keeps_four_diagonals() {
        let dir = shared_diagonal();
        let request = GenerateRequest::new(vec![square(0, 0, 10, 10)], "diag", 5, 0, dir.path())
            .with_shape(TileShape::Square)
            .with_origin(OriginMode::Absolute);
        let config = InfillConfig::with_reference_size(5);

        let result = generate(&request, &config).unwrap();

        assert_eq!(
            result.lines,
            vec![
                line((0, 0), (5, 5)),
                line((5, 0), (10, 5)),
                line((0, 5), (5, 10)),
                line((5, 5), (10, 10)),
            ]
        );
        assert!(result.polygons.is_empty());
    }

    #[test]
    fn output_is_deterministic() {
        let dir = shared_diagonal();
        let request = GenerateRequest::new(vec![square(-7, -3, 23, 19)], "diag", 5, 0, dir.path());
        let config = InfillConfig { line_width: 1, ..InfillConfig::with_reference_size(5) };

        let a = generate(&request, &config).unwrap();
        let b = generate(&request, &config).unwrap();
        assert_eq!(a, b);
        assert!(!a.lines.is_empty());
    }

    #[test]
    fn lines_outside_a_hole_are_cut() {
        let dir = shared_diagonal();
        let outer = vec![square(0, 0, 10, 10), square(0, 0, 5, 5)];
        let request = GenerateRequest::new(outer, "diag", 5, 0, dir.path()).with_shape(TileShape::Square);

        let result = generate(&request, &InfillConfig::with_reference_size(5)).unwrap();
        assert_eq!(result.lines.len(), 3);
        assert!(!result.lines.contains(&line((0, 0), (5, 5))));
    }

    #[test]
    fn polygons_are_clipped_and_marker_dropped() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("cells.wkt"),
            "POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))\nPOLYGON ((2 2, 8 2, 8 8, 2 8, 2 2))\n",
        )
        .unwrap();
        let request = GenerateRequest::new(vec![square(0, 0, 100, 100)], "cells", 10, 0, dir.path())
            .with_center(Point::new(100, 50));

        let result = generate(&request, &InfillConfig::with_reference_size(10)).unwrap();

        // Only the left half of the inner square survives the x <= 100 edge
        assert_eq!(result.polygons.len(), 1);
        let bb = BoundingBox::of_polygons(&result.polygons).unwrap();
        assert_eq!(bb.min, Point::new(97, 47));
        assert_eq!(bb.max, Point::new(100, 53));
    }

    #[test]
    fn layered_directory_is_used_per_z() {
        let dir = TempDir::new().unwrap();
        let layers = dir.path().join("diag");
        fs::create_dir(&layers).unwrap();
        fs::write(layers.join("0_diag.wkt"), "LINESTRING (0 0, 5 5)\n").unwrap();
        fs::write(layers.join("100_diag.wkt"), "LINESTRING (0 5, 5 0)\n").unwrap();

        let generator = InfillGenerator::new(InfillConfig::with_reference_size(5));
        let request = GenerateRequest::new(vec![square(0, 0, 5, 5)], "diag", 5, 50, dir.path())
            .with_shape(TileShape::Square);

        let result = generator.generate(&request).unwrap();
        assert_eq!(result.lines, vec![line((0, 5), (5, 0))]);
    }

    #[test]
    fn render_parses_each_path_once_and_keeps_tile_order() {
        let dir = shared_diagonal();
        let path = dir.path().join("diag.wkt");
        let config = InfillConfig::with_reference_size(5);
        let grid = build_grid(&[square(0, 0, 10, 5)], 5, TileShape::Square, OriginMode::Absolute, &path, &config).unwrap();

        let content = render(&grid, &config).unwrap();
        assert_eq!(content.lines, vec![line((0, 0), (5, 5)), line((5, 0), (10, 5))]);
    }

    #[test]
    fn empty_contours_are_rejected() {
        let dir = shared_diagonal();
        let request = GenerateRequest::new(vec![], "diag", 5, 0, dir.path());
        let result = generate(&request, &InfillConfig::default());
        assert!(matches!(result, Err(InfillError::EmptyInput)));
    }

    #[test]
    fn out_of_range_contours_fail_before_gridding() {
        let dir = shared_diagonal();
        let wide = square(-(1 << 62), 0, 1 << 62, 10);
        let request = GenerateRequest::new(vec![wide], "diag", 5, 0, dir.path()).with_shape(TileShape::Square);

        let result = generate(&request, &InfillConfig::with_reference_size(5));
        assert!(matches!(result, Err(InfillError::ClipFailure(_))));
    }

    #[test]
    fn missing_content_is_reported() {
        let dir = TempDir::new().unwrap();
        let request = GenerateRequest::new(vec![square(0, 0, 10, 10)], "nothing", 5, 0, dir.path());
        let result = generate(&request, &InfillConfig::default());
        assert!(matches!(result, Err(InfillError::ContentNotFound(_))));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = shared_diagonal();
        let request = GenerateRequest::new(vec![square(0, 0, 10, 10)], "diag", 5, 0, dir.path());
        let config = InfillConfig { reference_size: 0, ..InfillConfig::default() };
        assert!(matches!(generate(&request, &config), Err(InfillError::InvalidConfig(_))));
    }
}
