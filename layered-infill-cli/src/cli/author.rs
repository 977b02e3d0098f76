//! Author command: turn a motif into a layer file.
//!
//! Layer files always start with a square reference polygon. The generator
//! uses it to find the motif's center and then throws it away, so the
//! motif is placed relative to the square rather than to its own extent.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use layered_infill::{Content, InfillConfig, Point, Polygon, parse_content, write_wkt};

use super::common::flag_value;

const DEFAULT_MARKER_SIZE: i64 = 20_000;

/// Execute the author command.
pub fn cmd_author(args: &[String], config: &InfillConfig) -> Result<()> {
    let mut positional: Vec<&str> = Vec::new();
    let mut size = DEFAULT_MARKER_SIZE;
    let mut force = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--size" => {
                let value = flag_value(args, &mut i, "--size")?;
                size = value
                    .parse()
                    .with_context(|| format!("--size must be an integer, got '{value}'"))?;
            }
            "-f" | "--force" => force = true,
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            // Negative layer heights are positional too
            arg if !arg.starts_with('-') || arg.parse::<i64>().is_ok() => positional.push(arg),
            other => bail!("unknown option '{other}' for author"),
        }
        i += 1;
    }

    let [tiles_dir, pattern, z, motif] = positional.as_slice() else {
        print_usage();
        bail!("expected 4 arguments, got {}", positional.len());
    };
    let z: i64 = z.parse().with_context(|| format!("z must be an integer, got '{z}'"))?;
    if size <= 0 {
        bail!("--size must be positive, got {size}");
    }

    let motif = parse_content(Path::new(motif), config)?;
    let layer = with_marker(&motif, size)?;

    let path = layer_path(Path::new(tiles_dir), pattern, z);
    if path.exists() && !force {
        bail!("{} already exists, pass --force to overwrite", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, write_wkt(&layer)).with_context(|| format!("failed to write {}", path.display()))?;

    info!(
        path = %path.display(),
        lines = layer.lines.len(),
        polygons = layer.polygons.len() - 1,
        "wrote layer file"
    );
    println!("{}", path.display());
    Ok(())
}

/// `tiles_dir/pattern/{z}_{pattern}.wkt`
pub fn layer_path(tiles_dir: &Path, pattern: &str, z: i64) -> PathBuf {
    tiles_dir.join(pattern).join(format!("{z}_{pattern}.wkt"))
}

/// Center the motif on a `0..size` square and put the square first.
pub fn with_marker(motif: &Content, size: i64) -> Result<Content> {
    let center = motif.bounding_box()?.centroid();
    let (dx, dy) = (size / 2 - center.x, size / 2 - center.y);
    let shift = |p: &mut Point| *p = Point::new(p.x + dx, p.y + dy);

    let mut layer = motif.clone();
    for line in &mut layer.lines {
        line.points.iter_mut().for_each(shift);
    }
    for polygon in &mut layer.polygons {
        polygon.points.iter_mut().for_each(shift);
    }

    let marker = Polygon::new(vec![
        Point::new(0, 0),
        Point::new(0, size),
        Point::new(size, size),
        Point::new(size, 0),
    ]);
    layer.polygons.insert(0, marker);
    Ok(layer)
}

/// Print usage information.
pub fn print_usage() {
    eprintln!("layered-infill author - Write a motif as a layer file");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    layered-infill author <tiles_dir> <pattern> <z> <motif.svg|motif.wkt> [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    --size <n>     Side of the reference square (default: {})", DEFAULT_MARKER_SIZE);
    eprintln!("    -f, --force    Overwrite an existing layer file");
}

#[cfg(test)]
mod tests {
    use super::*;
    use layered_infill::{InfillGenerator, GenerateRequest, Polyline, TileShape, parse_wkt};

    #[test]
    fn marker_comes_first_and_motif_is_centered() {
        let motif = Content::new(vec![Polyline::new(vec![Point::new(-10, -10), Point::new(10, 10)])], vec![]);

        let layer = with_marker(&motif, 100).unwrap();
        assert_eq!(layer.polygons.len(), 1);
        assert_eq!(layer.polygons[0].points[2], Point::new(100, 100));
        assert_eq!(layer.lines[0].points, vec![Point::new(40, 40), Point::new(60, 60)]);
    }

    #[test]
    fn layer_path_follows_naming_scheme() {
        assert_eq!(
            layer_path(Path::new("tiles"), "web", -200),
            PathBuf::from("tiles/web/-200_web.wkt")
        );
    }

    #[test]
    fn authored_layer_is_used_by_the_generator() {
        let dir = tempfile::TempDir::new().unwrap();
        let motif = Content::new(vec![Polyline::new(vec![Point::new(0, 0), Point::new(10, 0)])], vec![]);
        let layer = with_marker(&motif, 20).unwrap();
        let path = layer_path(dir.path(), "bar", 0);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, write_wkt(&layer)).unwrap();
        assert_eq!(parse_wkt(&fs::read_to_string(&path).unwrap()).unwrap(), layer);

        let outer = vec![Polygon::new(vec![
            Point::new(0, 0),
            Point::new(20, 0),
            Point::new(20, 20),
            Point::new(0, 20),
        ])];
        let request = GenerateRequest::new(outer, "bar", 20, 0, dir.path()).with_shape(TileShape::Square);
        let generator = InfillGenerator::new(InfillConfig::with_reference_size(20));

        let result = generator.generate(&request).unwrap();
        assert!(result.polygons.is_empty());
        assert_eq!(result.lines, vec![Polyline::new(vec![Point::new(5, 10), Point::new(15, 10)])]);
    }
}
