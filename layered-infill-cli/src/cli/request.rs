//! Request layer: JSON generation requests in, JSON fill responses out.
//!
//! A request mirrors what a slicer sends for one layer:
//!
//! ```json
//! {
//!   "settings": {
//!     "pattern": "honeycomb",
//!     "infill_scale": "5000",
//!     "infill_directory": "tiles",
//!     "tile_shape": "hexagon"
//!   },
//!   "z": 200,
//!   "infill_areas": [
//!     { "outline": [[0, 0], [40000, 0], [40000, 40000], [0, 40000]],
//!       "holes": [[[10000, 10000], [10000, 20000], [20000, 20000], [20000, 10000]]] }
//!   ]
//! }
//! ```
//!
//! Setting values may be strings or JSON scalars; slicers send everything
//! as strings.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use layered_infill::{FillResult, GenerateRequest, OriginMode, Point, Polygon, TileShape};

/// A coordinate pair on the wire.
pub type WirePoint = [i64; 2];

/// One region to fill: an outline and the holes inside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfillArea {
    pub outline: Vec<WirePoint>,
    #[serde(default)]
    pub holes: Vec<Vec<WirePoint>>,
}

/// A generation request for one layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfillRequest {
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
    /// Layer height. May also be given as the `z` setting.
    #[serde(default)]
    pub z: Option<i64>,
    #[serde(default)]
    pub infill_areas: Vec<InfillArea>,
}

/// The fill for one layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfillResponse {
    pub poly_lines: Vec<Vec<WirePoint>>,
    pub polygons: Vec<Vec<WirePoint>>,
}

impl From<&FillResult> for InfillResponse {
    fn from(result: &FillResult) -> Self {
        let wire = |points: &[Point]| -> Vec<WirePoint> { points.iter().map(|p| [p.x, p.y]).collect() };
        Self {
            poly_lines: result.lines.iter().map(|l| wire(&l.points)).collect(),
            polygons: result.polygons.iter().map(|p| wire(&p.points)).collect(),
        }
    }
}

impl InfillRequest {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("malformed infill request")
    }

    /// A setting as text, whatever JSON type it was sent as.
    fn setting(&self, name: &str) -> Option<String> {
        match self.settings.get(name)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn number(&self, name: &str, value: &str) -> Result<f64> {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| anyhow!("setting '{name}' is not a number: '{value}'"))
    }

    /// Outlines followed by their holes, as one contour set.
    pub fn outer_contours(&self) -> Vec<Polygon> {
        let ring = |points: &[WirePoint]| Polygon::new(points.iter().map(|&[x, y]| Point::new(x, y)).collect());

        self.infill_areas
            .iter()
            .flat_map(|area| std::iter::once(ring(&area.outline)).chain(area.holes.iter().map(|h| ring(h))))
            .collect()
    }

    /// Extract everything `generate` needs, failing if a required setting
    /// is missing or malformed.
    pub fn to_generate_request(&self) -> Result<GenerateRequest> {
        let pattern = self.setting("pattern");
        let infill_scale = self.setting("infill_scale");
        let infill_directory = self.setting("infill_directory");
        let z = match self.z {
            Some(z) => Some(z.to_string()),
            None => self.setting("z"),
        };

        let (Some(pattern), Some(infill_scale), Some(infill_directory), Some(z)) =
            (pattern.clone(), infill_scale.clone(), infill_directory.clone(), z.clone())
        else {
            bail!(
                "could not retrieve settings! pattern: {}, infill scale: {}, infill directory: {}, z: {}",
                pattern.is_some(),
                infill_scale.is_some(),
                infill_directory.is_some(),
                z.is_some()
            );
        };

        let tile_size = self.number("infill_scale", &infill_scale)? as i64;
        let z = self.number("z", &z)? as i64;

        let mut request = GenerateRequest::new(self.outer_contours(), pattern, tile_size, z, infill_directory);

        if let Some(shape) = self.setting("tile_shape") {
            let shape = TileShape::from_name(&shape)
                .ok_or_else(|| anyhow!("unknown tile_shape '{shape}', use 'square' or 'hexagon'"))?;
            request = request.with_shape(shape);
        }

        if let Some(absolute) = self.setting("absolute_origin") {
            let absolute: bool = absolute
                .to_lowercase()
                .parse()
                .map_err(|_| anyhow!("absolute_origin must be true or false, got '{absolute}'"))?;
            request = request.with_origin(OriginMode::from_absolute(absolute));
        }

        if let Some(center) = self.center()? {
            request = request.with_center(center);
        }

        Ok(request)
    }

    /// Single-tile center from `center_x`/`center_y`, given in millimeters
    /// from the machine center with Y pointing to the front.
    fn center(&self) -> Result<Option<Point>> {
        let center_x = self.setting("center_x");
        let center_y = self.setting("center_y");
        if center_x.is_none() && center_y.is_none() {
            return Ok(None);
        }

        let width = self.setting("machine_width");
        let depth = self.setting("machine_depth");
        let (Some(cx), Some(cy), Some(width), Some(depth)) =
            (center_x.clone(), center_y.clone(), width.clone(), depth.clone())
        else {
            bail!(
                "could not retrieve settings! center distance x: {}, center distance y: {}, machine width: {}, machine depth: {}",
                center_x.is_some(),
                center_y.is_some(),
                width.is_some(),
                depth.is_some()
            );
        };

        let cx = self.number("center_x", &cx)?;
        let cy = self.number("center_y", &cy)?;
        let width = self.number("machine_width", &width)?;
        let depth = self.number("machine_depth", &depth)?;

        Ok(Some(Point::new(
            (1000.0 * (width / 2.0 + cx)) as i64,
            (1000.0 * (depth / 2.0 - cy)) as i64,
        )))
    }
}
