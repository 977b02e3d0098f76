//! Pattern directory inspection: `patterns` and `resolve`.

use std::path::Path;

use anyhow::{Context, Result, bail};

use layered_infill::{discover_patterns, resolve_content_path};

/// List the patterns under a tiles directory.
pub fn cmd_patterns(args: &[String]) -> Result<()> {
    let Some(root) = args.iter().find(|a| !a.starts_with('-')) else {
        eprintln!("USAGE:");
        eprintln!("    layered-infill patterns <tiles_dir>");
        bail!("tiles directory required");
    };

    let patterns = discover_patterns(Path::new(root))?;
    if patterns.is_empty() {
        println!("No patterns found in {root}");
        return Ok(());
    }

    println!("{:<24} {:<8} LAYERS", "PATTERN", "SHARED");
    for pattern in &patterns {
        let shared = pattern
            .shared
            .as_ref()
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .unwrap_or("-");
        let layers = match pattern.layers.as_slice() {
            [] => "-".to_string(),
            [only] => only.to_string(),
            [first, .., last] => format!("{} ({first} .. {last})", pattern.layers.len()),
        };
        println!("{:<24} {:<8} {}", pattern.name, shared, layers);
    }
    Ok(())
}

/// Print the content file a layer would use.
pub fn cmd_resolve(args: &[String]) -> Result<()> {
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with('-') || a.parse::<i64>().is_ok()).collect();
    let [dir, pattern, z] = positional.as_slice() else {
        eprintln!("USAGE:");
        eprintln!("    layered-infill resolve <tiles_dir> <pattern> <z>");
        bail!("expected 3 arguments, got {}", positional.len());
    };

    let z: i64 = z.parse().with_context(|| format!("z must be an integer, got '{z}'"))?;
    let path = resolve_content_path(pattern, Path::new(dir.as_str()), z)?;
    println!("{}", path.display());
    Ok(())
}
