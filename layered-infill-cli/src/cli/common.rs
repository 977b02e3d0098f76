//! Common utilities shared across CLI commands.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use layered_infill::InfillConfig;

/// Load the generator config from a YAML file, or the defaults.
///
/// Missing keys fall back to their defaults, so a file can set just
/// `line_width: 300`.
pub fn load_config(path: Option<&str>) -> Result<InfillConfig> {
    let Some(path) = path else {
        return Ok(InfillConfig::default());
    };

    let text = fs::read_to_string(path).with_context(|| format!("failed to read config {path}"))?;
    let config: InfillConfig =
        serde_yaml::from_str(&text).with_context(|| format!("failed to parse config {path}"))?;
    config.validate()?;

    info!(path, ?config, "loaded config");
    Ok(config)
}

/// Read a file, or stdin when the path is `-`.
pub fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
}

/// Write to a file, or stdout when no path is given.
pub fn write_output(path: Option<&str>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {path}"))?;
            info!(path, bytes = text.len(), "wrote output");
        }
        None => print!("{text}"),
    }
    Ok(())
}

/// Take the value following a flag, or fail naming the flag.
pub fn flag_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .with_context(|| format!("{flag} needs a value"))
}

pub fn has_extension(path: &str, ext: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}
