//! CLI command implementations.
//!
//! This module contains the implementations for the various CLI subcommands:
//! - `generate` - Answer a JSON infill request
//! - `preview` - Render a request's fill to SVG or PNG
//! - `resolve` - Show which content file a layer uses
//! - `patterns` - List patterns in a tiles directory
//! - `author` - Write a motif as a layer file

pub mod author;
pub mod common;
pub mod generate;
pub mod patterns;
pub mod preview;
pub mod request;

pub use author::cmd_author;
pub use common::load_config;
pub use generate::cmd_generate;
pub use patterns::{cmd_patterns, cmd_resolve};
pub use preview::cmd_preview;
