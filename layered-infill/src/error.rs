//! Error type for infill generation.
//!
//! ## Rust Lesson #20: Error Handling
//!
//! Rust uses `Result<T, E>` instead of exceptions. `thiserror` derives the
//! `Display` and `std::error::Error` impls from the `#[error(...)]`
//! attributes, so each variant documents its own message.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can make a `generate` call fail.
///
/// None of these are retried internally.
#[derive(Debug, Error)]
pub enum InfillError {
    /// No geometry to compute a bounding box from.
    #[error("cannot compute a bounding box of empty geometry")]
    EmptyInput,

    /// The layer directory exists but holds no usable file for the pattern.
    #[error("pattern directory {} has no content files for pattern '{pattern}'", .dir.display())]
    MissingContent { dir: PathBuf, pattern: String },

    /// The resolved content file does not exist.
    #[error("content file not found: {}", .0.display())]
    ContentNotFound(PathBuf),

    /// Malformed geometry text.
    #[error("{}:{line}: {message}", .path.display())]
    ContentParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Degenerate input the clipper cannot process.
    #[error("clip failed: {0}")]
    ClipFailure(String),

    /// Reading a directory or file failed for a reason other than absence.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration values out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Tile size that cannot produce a grid.
    #[error("invalid tile size: {0}")]
    InvalidTileSize(String),
}

pub type Result<T> = std::result::Result<T, InfillError>;
