//! # layered-infill
//!
//! Tiled infill from pre-authored motifs, one motif file per print layer.
//!
//! A call to [`generate`] lays square or hexagon tiles over the outer
//! contours of a layer, loads the motif authored for that layer height,
//! fits it into every tile and clips the result to the contours.
//!
//! ## Rust Lesson #7: Modules
//!
//! Rust modules are like ES6 modules but more explicit:
//! - `mod foo;` = load from `foo.rs` or `foo/mod.rs`
//! - `pub mod foo;` = also export it publicly
//! - `pub use foo::Bar;` = re-export Bar at this level
//!
//! Unlike Node.js, you must explicitly declare every module.

pub mod assemble;
pub mod clip;
pub mod config;
pub mod content;
pub mod error;
pub mod fit;
pub mod geometry;
pub mod grid;
pub mod svg;
pub mod wkt;

// Re-export common types at crate root for convenience.
pub use assemble::{FillResult, GenerateRequest, InfillGenerator, generate, render};
pub use clip::{clip_polygons, clip_polylines, point_in_polygon};
pub use config::InfillConfig;
pub use content::{Content, PatternEntry, discover_patterns, parse_content, resolve_content_path};
pub use error::{InfillError, Result};
pub use fit::fit;
pub use geometry::{BoundingBox, Point, Polygon, Polyline, bounding_box};
pub use grid::{Grid, OriginMode, Tile, TileShape, build_grid, single_tile};
pub use svg::{SvgError, extract_content_from_svg};
pub use wkt::{WktError, parse_wkt, write_wkt};
