//! Content store: pick the motif file for a layer and parse it.
//!
//! A pattern lives either in a layer directory
//!
//! ```text
//! tiles/honeycomb/0_honeycomb.wkt
//! tiles/honeycomb/200_honeycomb.wkt
//! tiles/honeycomb/400_honeycomb.svg
//! ```
//!
//! or, when `tiles/honeycomb/` does not exist, in a single shared file
//! `tiles/honeycomb.wkt` (or `.svg`) used for every layer.
//!
//! Lookup is keyed purely by `z`. Nothing in the directory is renamed or
//! moved, so the same call can be repeated or issued out of order.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::ops::Bound::{Excluded, Unbounded};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::InfillConfig;
use crate::error::{InfillError, Result};
use crate::geometry::{BoundingBox, Polygon, Polyline};
use crate::svg::extract_content_from_svg;
use crate::wkt::parse_wkt;

/// Geometry file extensions, in order of preference.
pub const CONTENT_EXTENSIONS: [&str; 2] = ["wkt", "svg"];

/// One motif: the open and closed geometry loaded from a content file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Content {
    pub lines: Vec<Polyline>,
    pub polygons: Vec<Polygon>,
}

impl Content {
    pub fn new(lines: Vec<Polyline>, polygons: Vec<Polygon>) -> Self {
        Self { lines, polygons }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.polygons.is_empty()
    }

    /// Box around every line and polygon point.
    pub fn bounding_box(&self) -> Result<BoundingBox> {
        BoundingBox::of_shapes(&self.lines, &self.polygons)
    }

    /// Move all geometry from `other` onto the end of `self`.
    pub fn append(&mut self, other: &mut Content) {
        self.lines.append(&mut other.lines);
        self.polygons.append(&mut other.polygons);
    }
}

// ============================================================================
// LAYER RESOLUTION
// ============================================================================

/// Find the content file to use for `pattern` at layer height `z`.
///
/// 1. No `directory/pattern` directory: the shared `directory/pattern.<ext>`.
/// 2. A file named `{z}_{pattern}.<ext>`: exact match.
/// 3. Otherwise the next higher authored layer.
/// 4. Otherwise the highest authored layer.
///
/// The returned path is not checked for existence in the shared-file case;
/// [`parse_content`] reports a missing file.
pub fn resolve_content_path(pattern: &str, directory: &Path, z: i64) -> Result<PathBuf> {
    let layer_dir = directory.join(pattern);

    if !layer_dir.is_dir() {
        let shared = shared_content_path(directory, pattern);
        info!(path = %shared.display(), "no layer directory, using shared content file");
        return Ok(shared);
    }

    let layers = scan_layers(&layer_dir, pattern)?;
    let (layer, path) = select_layer(&layers, z).ok_or_else(|| InfillError::MissingContent {
        dir: layer_dir.clone(),
        pattern: pattern.to_string(),
    })?;

    if layer == z {
        debug!(z, path = %path.display(), "exact layer match");
    } else {
        info!(z, layer, path = %path.display(), "no exact layer, using nearest authored layer");
    }
    Ok(path.clone())
}

/// The single file used when a pattern has no layer directory.
fn shared_content_path(directory: &Path, pattern: &str) -> PathBuf {
    CONTENT_EXTENSIONS
        .iter()
        .map(|ext| directory.join(format!("{pattern}.{ext}")))
        .find(|path| path.is_file())
        .unwrap_or_else(|| directory.join(format!("{pattern}.{}", CONTENT_EXTENSIONS[0])))
}

/// Index the layer files of a pattern directory by their height prefix.
///
/// Names that don't follow `{integer}_{pattern}.<ext>` are skipped. When a
/// layer exists in more than one format the preferred extension wins.
pub fn scan_layers(layer_dir: &Path, pattern: &str) -> Result<BTreeMap<i64, PathBuf>> {
    let io_err = |source: io::Error| InfillError::Io {
        path: layer_dir.to_path_buf(),
        source,
    };

    let mut layers: BTreeMap<i64, (usize, PathBuf)> = BTreeMap::new();
    for entry in fs::read_dir(layer_dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!(path = %path.display(), "skipping non UTF-8 file name");
            continue;
        };
        let Some((layer, rank)) = parse_layer_name(name, pattern) else {
            continue;
        };

        match layers.get(&layer) {
            Some((existing, _)) if *existing <= rank => {}
            _ => {
                layers.insert(layer, (rank, path));
            }
        }
    }

    Ok(layers.into_iter().map(|(z, (_, path))| (z, path)).collect())
}

/// Split `{z}_{pattern}.{ext}` into the layer height and the extension's rank.
fn parse_layer_name(name: &str, pattern: &str) -> Option<(i64, usize)> {
    CONTENT_EXTENSIONS.iter().enumerate().find_map(|(rank, ext)| {
        let stem = name.strip_suffix(ext)?.strip_suffix('.')?;
        let (prefix, rest) = stem.split_once('_')?;
        if rest != pattern {
            return None;
        }
        prefix.parse::<i64>().ok().map(|z| (z, rank))
    })
}

/// Exact layer, else next higher, else the highest one.
pub fn select_layer(layers: &BTreeMap<i64, PathBuf>, z: i64) -> Option<(i64, &PathBuf)> {
    if let Some(path) = layers.get(&z) {
        return Some((z, path));
    }
    layers
        .range((Excluded(z), Unbounded))
        .next()
        .or_else(|| layers.iter().next_back())
        .map(|(layer, path)| (*layer, path))
}

// ============================================================================
// PARSING
// ============================================================================

/// Read and parse a content file, dispatching on its extension.
///
/// Files with an `.svg` extension go through usvg; everything else is read
/// as WKT.
pub fn parse_content(path: &Path, config: &InfillConfig) -> Result<Content> {
    let text = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => InfillError::ContentNotFound(path.to_path_buf()),
        _ => InfillError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let is_svg = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));

    let content = if is_svg {
        extract_content_from_svg(&text, config.svg_unit_scale).map_err(|e| {
            InfillError::ContentParse {
                path: path.to_path_buf(),
                line: 0,
                message: e.to_string(),
            }
        })?
    } else {
        parse_wkt(&text).map_err(|e| InfillError::ContentParse {
            path: path.to_path_buf(),
            line: e.line,
            message: e.message,
        })?
    };

    debug!(
        path = %path.display(),
        lines = content.lines.len(),
        polygons = content.polygons.len(),
        "parsed content file"
    );
    Ok(content)
}

// ============================================================================
// DISCOVERY
// ============================================================================

/// A pattern available under a tiles directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternEntry {
    pub name: String,
    /// Authored layer heights, ascending. Empty for shared-file patterns.
    pub layers: Vec<i64>,
    /// The shared content file, if the pattern has one.
    pub shared: Option<PathBuf>,
}

/// List every pattern under `root`, sorted by name.
pub fn discover_patterns(root: &Path) -> Result<Vec<PatternEntry>> {
    let io_err = |source: io::Error| InfillError::Io {
        path: root.to_path_buf(),
        source,
    };

    let mut entries: BTreeMap<String, PatternEntry> = BTreeMap::new();
    for entry in fs::read_dir(root).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();

        if path.is_dir() {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let layers: Vec<i64> = scan_layers(&path, name)?.into_keys().collect();
            if layers.is_empty() {
                continue;
            }
            entry_for(&mut entries, name).layers = layers;
        } else {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
            if !CONTENT_EXTENSIONS.contains(&ext) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|n| n.to_str()) else {
                continue;
            };
            let pattern = entry_for(&mut entries, name);
            // Keep the preferred extension when both exist
            let better = pattern.shared.as_ref().is_none_or(|current| {
                let current_ext = current.extension().and_then(|e| e.to_str()).unwrap_or_default();
                rank_of(ext) < rank_of(current_ext)
            });
            if better {
                pattern.shared = Some(path.clone());
            }
        }
    }

    Ok(entries.into_values().collect())
}

fn entry_for<'a>(entries: &'a mut BTreeMap<String, PatternEntry>, name: &str) -> &'a mut PatternEntry {
    entries.entry(name.to_string()).or_insert_with(|| PatternEntry {
        name: name.to_string(),
        layers: Vec::new(),
        shared: None,
    })
}

fn rank_of(ext: &str) -> usize {
    CONTENT_EXTENSIONS
        .iter()
        .position(|e| *e == ext)
        .unwrap_or(CONTENT_EXTENSIONS.len())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use tempfile::TempDir;

    const MOTIF: &str = "LINESTRING (0 0, 10 10)\nPOLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))\n";

    /// tiles/web/{0,10,20}_web.wkt
    fn layered_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        let layer_dir = dir.path().join("web");
        fs::create_dir(&layer_dir).unwrap();
        for z in [0, 10, 20] {
            fs::write(layer_dir.join(format!("{z}_web.wkt")), MOTIF).unwrap();
        }
        dir
    }

    fn resolved_name(dir: &TempDir, z: i64) -> String {
        let path = resolve_content_path("web", dir.path(), z).unwrap();
        path.file_name().unwrap().to_str().unwrap().to_string()
    }

    #[test]
    fn exact_layer_wins() {
        let dir = layered_dir();
        assert_eq!(resolved_name(&dir, 10), "10_web.wkt");
    }

    #[test]
    fn between_layers_picks_next_higher() {
        let dir = layered_dir();
        assert_eq!(resolved_name(&dir, 15), "20_web.wkt");
    }

    #[test]
    fn above_all_layers_wraps_to_top() {
        let dir = layered_dir();
        assert_eq!(resolved_name(&dir, 25), "20_web.wkt");
    }

    #[test]
    fn below_all_layers_picks_lowest() {
        let dir = layered_dir();
        assert_eq!(resolved_name(&dir, -5), "0_web.wkt");
    }

    #[test]
    fn empty_layer_dir_is_missing_content() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("web")).unwrap();

        let result = resolve_content_path("web", dir.path(), 0);
        assert!(matches!(result, Err(InfillError::MissingContent { .. })));
    }

    #[test]
    fn unrelated_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        let layer_dir = dir.path().join("web");
        fs::create_dir(&layer_dir).unwrap();
        fs::write(layer_dir.join("readme.txt"), "notes").unwrap();
        fs::write(layer_dir.join("5_grid.wkt"), MOTIF).unwrap();
        fs::write(layer_dir.join("top_web.wkt"), MOTIF).unwrap();

        let result = resolve_content_path("web", dir.path(), 0);
        assert!(matches!(result, Err(InfillError::MissingContent { .. })));

        fs::write(layer_dir.join("-40_web.wkt"), MOTIF).unwrap();
        let path = resolve_content_path("web", dir.path(), 0).unwrap();
        assert!(path.ends_with("-40_web.wkt"));
    }

    #[test]
    fn wkt_preferred_over_svg_for_same_layer() {
        let dir = TempDir::new().unwrap();
        let layer_dir = dir.path().join("web");
        fs::create_dir(&layer_dir).unwrap();
        fs::write(layer_dir.join("0_web.svg"), "<svg/>").unwrap();
        fs::write(layer_dir.join("0_web.wkt"), MOTIF).unwrap();
        fs::write(layer_dir.join("10_web.svg"), "<svg/>").unwrap();

        let layers = scan_layers(&layer_dir, "web").unwrap();
        assert!(layers[&0].ends_with("0_web.wkt"));
        assert!(layers[&10].ends_with("10_web.svg"));
    }

    #[test]
    fn missing_layer_dir_falls_back_to_shared_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("web.svg"), "<svg/>").unwrap();

        let path = resolve_content_path("web", dir.path(), 42).unwrap();
        assert_eq!(path, dir.path().join("web.svg"));
    }

    #[test]
    fn missing_shared_file_resolves_then_fails_to_parse() {
        let dir = TempDir::new().unwrap();

        let path = resolve_content_path("web", dir.path(), 0).unwrap();
        assert_eq!(path, dir.path().join("web.wkt"));

        let result = parse_content(&path, &InfillConfig::default());
        assert!(matches!(result, Err(InfillError::ContentNotFound(_))));
    }

    #[test]
    fn parse_wkt_file() {
        let dir = layered_dir();
        let path = dir.path().join("web").join("0_web.wkt");

        let content = parse_content(&path, &InfillConfig::default()).unwrap();
        assert_eq!(content.lines.len(), 1);
        assert_eq!(content.polygons.len(), 1);
        assert_eq!(content.lines[0].points, vec![Point::new(0, 0), Point::new(10, 10)]);
    }

    #[test]
    fn malformed_wkt_reports_path_and_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.wkt");
        fs::write(&path, "LINESTRING (0 0, 1 1)\nPOLYGON ((0 0, 1\n").unwrap();

        match parse_content(&path, &InfillConfig::default()) {
            Err(InfillError::ContentParse { path: p, line, .. }) => {
                assert_eq!(p, path);
                assert_eq!(line, 2);
            }
            other => panic!("expected ContentParse, got {other:?}"),
        }
    }

    #[test]
    fn parse_svg_file_uses_unit_scale() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("web.svg");
        fs::write(
            &path,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
                <path d="M 0,0 L 2,0" stroke="black"/>
            </svg>"#,
        )
        .unwrap();

        let content = parse_content(&path, &InfillConfig::default()).unwrap();
        assert_eq!(content.lines[0].points, vec![Point::new(0, 0), Point::new(2000, 0)]);
    }

    #[test]
    fn discover_lists_layered_and_shared_patterns() {
        let dir = layered_dir();
        fs::write(dir.path().join("dots.svg"), "<svg/>").unwrap();
        fs::write(dir.path().join("dots.wkt"), MOTIF).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();

        let patterns = discover_patterns(dir.path()).unwrap();
        let names: Vec<&str> = patterns.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["dots", "web"]);

        assert!(patterns[0].layers.is_empty());
        assert_eq!(patterns[0].shared, Some(dir.path().join("dots.wkt")));
        assert_eq!(patterns[1].layers, vec![0, 10, 20]);
        assert_eq!(patterns[1].shared, None);
    }

    #[test]
    fn content_bounding_box_spans_lines_and_polygons() {
        let content = Content::new(
            vec![Polyline::new(vec![Point::new(-5, 0), Point::new(0, 0)])],
            vec![Polygon::new(vec![Point::new(0, 0), Point::new(4, 0), Point::new(4, 7)])],
        );
        let bb = content.bounding_box().unwrap();
        assert_eq!(bb.min, Point::new(-5, 0));
        assert_eq!(bb.max, Point::new(4, 7));
        assert!(Content::default().bounding_box().is_err());
    }
}
