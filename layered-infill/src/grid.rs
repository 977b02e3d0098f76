//! Tile placement over the bounding box of the outer contours.
//!
//! ## Rust Lesson #12: Closed Enums
//!
//! `TileShape` has exactly two variants and every `match` on it lists
//! both. Adding a third shape later makes the compiler point at every
//! place that needs to learn about it, which a string or integer tag
//! never would.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::InfillConfig;
use crate::error::{InfillError, Result};
use crate::geometry::{BoundingBox, Point, Polygon};

/// Upper bound on tiles per grid, to catch tile sizes far too small for
/// the part.
pub const MAX_TILES: usize = 1_000_000;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Cell shape of the tiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileShape {
    Square,
    #[default]
    Hexagon,
}

impl TileShape {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "square" => Some(TileShape::Square),
            "hexagon" | "hex" => Some(TileShape::Hexagon),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TileShape::Square => "square",
            TileShape::Hexagon => "hexagon",
        }
    }

    /// Center-to-center distance `(width, height)` between neighboring tiles.
    ///
    /// Hexagon rows interlock, so the vertical pitch is only 3/4 of a
    /// hexagon's height. `line_width` keeps a wall between motifs.
    pub fn pitch(&self, size: i64, line_width: i64) -> (f64, f64) {
        let size = size as f64;
        match self {
            TileShape::Square => (size, size),
            TileShape::Hexagon => (
                SQRT_3 * size + line_width as f64,
                1.5 * size + line_width as f64,
            ),
        }
    }
}

/// Where the grid starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginMode {
    /// Snap to multiples of the pitch, so tiles line up across parts and layers.
    #[default]
    Absolute,
    /// Start one pitch before this part's own bounding box.
    Relative,
}

impl OriginMode {
    pub fn from_absolute(absolute: bool) -> Self {
        if absolute { OriginMode::Absolute } else { OriginMode::Relative }
    }

    fn start(&self, min: i64, pitch: f64) -> f64 {
        match self {
            OriginMode::Absolute => (min as f64 / pitch).floor() * pitch,
            OriginMode::Relative => min as f64 - pitch,
        }
    }
}

/// One placement of the motif.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub center: Point,
    pub size: i64,
    pub shape: TileShape,
    pub content_path: PathBuf,
}

impl Tile {
    pub fn new(center: Point, size: i64, shape: TileShape, content_path: PathBuf) -> Self {
        Self { center, size, shape, content_path }
    }

    /// Contour of the cell: a square of side `size`, or a pointy-top
    /// hexagon with circumradius `size`.
    pub fn outline(&self) -> Polygon {
        let Point { x, y } = self.center;
        match self.shape {
            TileShape::Square => {
                let half = self.size / 2;
                Polygon::new(vec![
                    Point::new(x - half, y - half),
                    Point::new(x - half, y + half),
                    Point::new(x + half, y + half),
                    Point::new(x + half, y - half),
                ])
            }
            TileShape::Hexagon => {
                let r = self.size;
                let dx = (r as f64 * SQRT_3 / 2.0) as i64;
                let dy = r / 2;
                Polygon::new(vec![
                    Point::new(x, y + r),
                    Point::new(x + dx, y + dy),
                    Point::new(x + dx, y - dy),
                    Point::new(x, y - r),
                    Point::new(x - dx, y - dy),
                    Point::new(x - dx, y + dy),
                ])
            }
        }
    }
}

/// Tiles in rows, bottom to top. Row parity drives the hexagon offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    pub rows: Vec<Vec<Tile>>,
}

impl Grid {
    /// All tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.rows.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn centers(&self) -> Vec<Point> {
        self.tiles().map(|t| t.center).collect()
    }
}

/// Lay tiles over the bounding box of `outer`.
///
/// Cells are anchored at the origin and each center sits half a pitch in.
/// Rows and columns continue while the cell's lower edge is below the box
/// maximum, so every point of the box falls inside some cell. Odd hexagon
/// rows shift by half a width pitch and start one cell early to keep the
/// left edge covered.
pub fn build_grid(
    outer: &[Polygon],
    tile_size: i64,
    shape: TileShape,
    origin: OriginMode,
    content_path: &Path,
    config: &InfillConfig,
) -> Result<Grid> {
    check_tile_size(tile_size)?;
    let bbox = BoundingBox::of_polygons(outer)?;
    let (pitch_x, pitch_y) = shape.pitch(tile_size, config.line_width);

    let columns = ((bbox.width() as f64 / pitch_x).ceil() as usize).saturating_add(2);
    let rows = ((bbox.height() as f64 / pitch_y).ceil() as usize).saturating_add(2);
    if columns.saturating_mul(rows) > MAX_TILES {
        return Err(InfillError::InvalidTileSize(format!(
            "tile size {tile_size} needs about {} tiles for a {}x{} region (limit {MAX_TILES})",
            columns.saturating_mul(rows),
            bbox.width(),
            bbox.height()
        )));
    }

    let origin_x = origin.start(bbox.min.x, pitch_x);
    let origin_y = origin.start(bbox.min.y, pitch_y);
    let max_x = bbox.max.x as f64;
    let max_y = bbox.max.y as f64;

    let mut grid = Grid::default();
    let mut row_index = 0usize;
    loop {
        let lower_y = origin_y + row_index as f64 * pitch_y;
        if lower_y >= max_y && row_index > 0 {
            break;
        }
        let center_y = (lower_y + pitch_y / 2.0).floor() as i64;

        let shifted = shape == TileShape::Hexagon && row_index % 2 == 1;
        let row_start = if shifted { origin_x - pitch_x / 2.0 } else { origin_x };

        let mut row = Vec::new();
        let mut column = 0usize;
        loop {
            let lower_x = row_start + column as f64 * pitch_x;
            if lower_x >= max_x && column > 0 {
                break;
            }
            let center = Point::new((lower_x + pitch_x / 2.0).floor() as i64, center_y);
            row.push(Tile::new(center, tile_size, shape, content_path.to_path_buf()));
            column += 1;
        }

        grid.rows.push(row);
        row_index += 1;
    }

    debug!(
        rows = grid.rows.len(),
        tiles = grid.len(),
        shape = shape.name(),
        "built tile grid"
    );
    Ok(grid)
}

/// A grid of exactly one tile at a fixed center.
pub fn single_tile(center: Point, tile_size: i64, shape: TileShape, content_path: &Path) -> Result<Grid> {
    check_tile_size(tile_size)?;
    Ok(Grid {
        rows: vec![vec![Tile::new(center, tile_size, shape, content_path.to_path_buf())]],
    })
}

fn check_tile_size(tile_size: i64) -> Result<()> {
    if tile_size <= 0 {
        return Err(InfillError::InvalidTileSize(format!("tile size must be > 0, got {tile_size}")));
    }
    Ok(())
}
