//! Tunables that would otherwise be compiled-in constants.
//!
//! Passed explicitly into the grid builder and tile fitter so the core
//! carries no hidden process-wide state.

use serde::{Deserialize, Serialize};

use crate::error::{InfillError, Result};

/// Configuration shared by every `generate` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfillConfig {
    /// Wall clearance between hexagon motifs, in microns.
    pub line_width: i64,

    /// Tile size at which content is placed at scale 1.
    ///
    /// Motifs scale by `tile_size / reference_size`. With the default of
    /// 1000, a 5 micron tile shrinks its motif to 1/200 and short strokes
    /// collapse to points that clipping then drops. To place motifs
    /// unscaled at every tile size, set this to the tile size in use.
    pub reference_size: i64,

    /// Microns per SVG user unit (1000 = SVG authored in millimeters).
    pub svg_unit_scale: f64,
}

impl Default for InfillConfig {
    fn default() -> Self {
        Self {
            line_width: 400,
            reference_size: 1000,
            svg_unit_scale: 1000.0,
        }
    }
}

impl InfillConfig {
    pub fn with_reference_size(reference_size: i64) -> Self {
        Self { reference_size, ..Self::default() }
    }

    /// Reject values the pipeline can't work with.
    pub fn validate(&self) -> Result<()> {
        if self.line_width < 0 {
            return Err(InfillError::InvalidConfig(format!(
                "line_width must be >= 0, got {}",
                self.line_width
            )));
        }
        if self.reference_size <= 0 {
            return Err(InfillError::InvalidConfig(format!(
                "reference_size must be > 0, got {}",
                self.reference_size
            )));
        }
        if !(self.svg_unit_scale.is_finite() && self.svg_unit_scale > 0.0) {
            return Err(InfillError::InvalidConfig(format!(
                "svg_unit_scale must be a positive number, got {}",
                self.svg_unit_scale
            )));
        }
        Ok(())
    }

    /// Scale factor applied to content placed in a tile of `tile_size`.
    #[inline]
    pub fn scale_for(&self, tile_size: i64) -> f64 {
        tile_size as f64 / self.reference_size as f64
    }
}
