//! Preview command: draw a layer's fill as SVG or PNG.
//!
//! Coordinates are microns with Y pointing away from the printer front, so
//! Y is negated on the way out to keep the picture upright.

use std::fmt::Write as _;

use anyhow::{Context, Result, bail};
use resvg::usvg;
use tiny_skia::Pixmap;
use tracing::info;

use layered_infill::{
    BoundingBox, FillResult, InfillConfig, InfillGenerator, Point, Polygon, resolve_content_path,
};

use super::common::{flag_value, has_extension, read_input, write_output};
use super::request::InfillRequest;

const DEFAULT_PNG_WIDTH: u32 = 1600;
const MAX_PNG_SIDE: u32 = 8192;

/// Execute the preview command.
pub fn cmd_preview(args: &[String], config: &InfillConfig) -> Result<()> {
    let mut input: Option<&str> = None;
    let mut output: Option<&str> = None;
    let mut show_tiles = false;
    let mut png_width = DEFAULT_PNG_WIDTH;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => output = Some(flag_value(args, &mut i, "--output")?),
            "--show-tiles" => show_tiles = true,
            "--width" => {
                let value = flag_value(args, &mut i, "--width")?;
                png_width = value
                    .parse()
                    .with_context(|| format!("--width must be a pixel count, got '{value}'"))?;
            }
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            path if path == "-" || !path.starts_with('-') => {
                if input.is_none() {
                    input = Some(path);
                }
            }
            other => bail!("unknown option '{other}' for preview"),
        }
        i += 1;
    }

    let Some(input) = input else {
        print_usage();
        bail!("request file required");
    };

    let request = InfillRequest::from_json(&read_input(input)?)?.to_generate_request()?;
    let result = InfillGenerator::new(config.clone())
        .generate(&request)
        .context("infill generation failed")?;

    let tiles = if show_tiles {
        let content_path = resolve_content_path(&request.pattern, &request.directory, request.z)?;
        let grid = request.grid(&content_path, config)?;
        grid.tiles().map(|t| t.outline()).collect()
    } else {
        Vec::new()
    };

    let svg = fill_to_svg(&result, &request.outer_contours, &tiles)?;

    match output {
        Some(path) if has_extension(path, "png") => render_png(&svg, path, png_width),
        _ => write_output(output, &svg),
    }
}

/// Scene bounds in SVG space: (min_x, min_y, width, height) with Y flipped.
fn view_box(outer: &[Polygon], result: &FillResult) -> Result<(i64, i64, i64, i64)> {
    let bbox = BoundingBox::of_polygons(outer)
        .or_else(|_| BoundingBox::of_shapes(&result.lines, &result.polygons))
        .context("nothing to draw")?;

    let margin = (bbox.width().max(bbox.height()) / 20).max(1);
    Ok((
        bbox.min.x - margin,
        -bbox.max.y - margin,
        bbox.width() + 2 * margin,
        bbox.height() + 2 * margin,
    ))
}

fn push_points(svg: &mut String, points: &[Point]) {
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            svg.push(' ');
        }
        let _ = write!(svg, "{},{}", p.x, -p.y);
    }
}

fn push_group(svg: &mut String, id: &str, style: &str, element: &str, rings: &[Vec<Point>]) {
    if rings.is_empty() {
        return;
    }
    let _ = writeln!(svg, r#"<g id="{id}" {style}>"#);
    for ring in rings {
        let _ = write!(svg, r#"  <{element} points=""#);
        push_points(svg, ring);
        svg.push_str("\"/>\n");
    }
    svg.push_str("</g>\n");
}

/// Build an SVG of the outer contours, tile outlines and the clipped fill.
pub fn fill_to_svg(result: &FillResult, outer: &[Polygon], tiles: &[Polygon]) -> Result<String> {
    let (x, y, width, height) = view_box(outer, result)?;
    let stroke = (width.max(height) as f64 / 800.0).max(1.0);

    let mut svg = String::new();
    let _ = writeln!(svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{x} {y} {width} {height}">"#
    );
    let _ = writeln!(svg, r#"<rect x="{x}" y="{y}" width="{width}" height="{height}" fill="white"/>"#);

    let rings = |polygons: &[Polygon]| polygons.iter().map(|p| p.points.clone()).collect::<Vec<_>>();

    push_group(
        &mut svg,
        "tiles",
        &format!(r##"stroke="#9ecae1" stroke-width="{stroke}" fill="none""##),
        "polygon",
        &rings(tiles),
    );
    push_group(
        &mut svg,
        "contours",
        &format!(r##"stroke="#888888" stroke-width="{}" fill="none""##, stroke * 2.0),
        "polygon",
        &rings(outer),
    );
    push_group(
        &mut svg,
        "polygons",
        &format!(r##"stroke="#c0392b" stroke-width="{stroke}" fill="#c0392b" fill-opacity="0.2" fill-rule="evenodd""##),
        "polygon",
        &rings(&result.polygons),
    );
    push_group(
        &mut svg,
        "lines",
        &format!(r#"stroke="black" stroke-width="{stroke}" stroke-linecap="round" fill="none""#),
        "polyline",
        &result.lines.iter().map(|l| l.points.clone()).collect::<Vec<_>>(),
    );

    svg.push_str("</svg>\n");
    Ok(svg)
}

/// Rasterize SVG content to a PNG of the given width using resvg.
pub fn render_png(svg_content: &str, png_path: &str, width: u32) -> Result<()> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg_content, &options).context("generated SVG did not parse")?;

    let size = tree.size();
    let scale = width as f32 / size.width();
    let pixmap_width = width.clamp(1, MAX_PNG_SIDE);
    let pixmap_height = ((size.height() * scale).ceil() as u32).clamp(1, MAX_PNG_SIDE);

    let mut pixmap = Pixmap::new(pixmap_width, pixmap_height).context("could not create pixmap")?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let transform = tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    pixmap
        .save_png(png_path)
        .with_context(|| format!("failed to write {png_path}"))?;
    info!(path = png_path, width = pixmap_width, height = pixmap_height, "wrote preview");
    Ok(())
}

/// Print usage information.
pub fn print_usage() {
    eprintln!("layered-infill preview - Draw an infill request's result");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    layered-infill preview <request.json|-> [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -o, --output <file>   .svg or .png (default: SVG on stdout)");
    eprintln!("    --show-tiles          Draw the tile outlines");
    eprintln!("    --width <px>          PNG width in pixels (default: {})", DEFAULT_PNG_WIDTH);
}

#[cfg(test)]
mod tests {
    use super::*;
    use layered_infill::Polyline;

    fn square(x0: i64, y0: i64, x1: i64, y1: i64) -> Polygon {
        Polygon::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    #[test]
    fn svg_flips_y_and_groups_layers() {
        let result = FillResult {
            lines: vec![Polyline::new(vec![Point::new(0, 0), Point::new(500, 800)])],
            polygons: vec![],
        };
        let svg = fill_to_svg(&result, &[square(0, 0, 1000, 1000)], &[]).unwrap();

        assert!(svg.contains(r#"viewBox="-50 -1050 1100 1100""#), "{svg}");
        assert!(svg.contains(r#"<polyline points="0,0 500,-800"/>"#), "{svg}");
        assert!(svg.contains(r#"id="contours""#));
        assert!(!svg.contains(r#"id="tiles""#));
        assert!(!svg.contains(r#"id="polygons""#));
    }

    #[test]
    fn tiles_are_drawn_when_given() {
        let result = FillResult::default();
        let svg = fill_to_svg(&result, &[square(0, 0, 10, 10)], &[square(0, 0, 5, 5)]).unwrap();
        assert!(svg.contains(r#"id="tiles""#));
    }

    #[test]
    fn nothing_to_draw_is_an_error() {
        assert!(fill_to_svg(&FillResult::default(), &[], &[]).is_err());
    }

    #[test]
    fn png_is_written() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fill.png");
        let svg = fill_to_svg(&FillResult::default(), &[square(0, 0, 1000, 500)], &[]).unwrap();

        render_png(&svg, path.to_str().unwrap(), 200).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
