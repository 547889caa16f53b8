//! GeoJSON reading of region boundaries and writing of pixel masks.
//!
//! Only the subset the mask builder needs is modelled: feature collections
//! of `Polygon` / `MultiPolygon` features on the way in, and a collection
//! of single-ring `Polygon` features with an `id` property on the way out.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MaskError, Result};
use crate::grid::{Boundary, MaskResult, Ring};

#[derive(Debug, Deserialize)]
struct InputCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<InputFeature>,
}

#[derive(Debug, Deserialize)]
struct InputFeature {
    geometry: Option<InputGeometry>,
}

#[derive(Debug, Deserialize)]
struct InputGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: serde_json::Value,
}

/// GeoJSON position list: each position is `[x, y]` with an optional altitude.
type RawRing = Vec<Vec<f64>>;

/// Reads a boundary feature collection from `path`.
///
/// # Errors
///
/// Returns [`MaskError::Io`] if the file cannot be read and
/// [`MaskError::InvalidInput`] if it is not a valid polygon collection.
pub fn load_boundary(path: impl AsRef<Path>) -> Result<Boundary> {
    let path = path.as_ref();
    tracing::info!("Loading GeoJSON from: {}", path.display());
    let text = fs::read_to_string(path).map_err(|e| MaskError::io(path, e))?;
    parse_boundary(&text)
}

/// Parses a boundary feature collection from GeoJSON text.
pub fn parse_boundary(text: &str) -> Result<Boundary> {
    let collection: InputCollection = serde_json::from_str(text)
        .map_err(|e| MaskError::InvalidInput(format!("malformed GeoJSON: {e}")))?;

    if collection.kind != "FeatureCollection" {
        return Err(MaskError::InvalidInput(format!(
            "expected a FeatureCollection, found {:?}",
            collection.kind
        )));
    }

    let feature_count = collection.features.len();
    let mut polygons = Vec::new();
    for (index, feature) in collection.features.into_iter().enumerate() {
        let geometry = feature
            .geometry
            .ok_or_else(|| MaskError::InvalidInput(format!("feature {index} has no geometry")))?;
        polygons.extend(feature_polygons(index, geometry)?);
    }

    tracing::info!(
        "Loaded {} features ({} polygons).",
        feature_count,
        polygons.len()
    );
    Boundary::from_rings(polygons)
}

fn feature_polygons(index: usize, geometry: InputGeometry) -> Result<Vec<Vec<Ring>>> {
    let InputGeometry { kind, coordinates } = geometry;
    let invalid = |e: serde_json::Error| {
        MaskError::InvalidInput(format!("feature {index}: bad {kind} coordinates: {e}"))
    };

    let raw: Vec<Vec<RawRing>> = match kind.as_str() {
        "Polygon" => vec![serde_json::from_value(coordinates).map_err(invalid)?],
        "MultiPolygon" => serde_json::from_value(coordinates).map_err(invalid)?,
        other => {
            return Err(MaskError::InvalidInput(format!(
                "feature {index}: unsupported geometry type {other:?}"
            )))
        }
    };

    raw.into_iter()
        .map(|rings| {
            rings
                .into_iter()
                .map(|ring| to_ring(index, ring))
                .collect::<Result<Vec<Ring>>>()
        })
        .collect()
}

fn to_ring(index: usize, raw: RawRing) -> Result<Ring> {
    raw.into_iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Ok([*x, *y]),
            _ => Err(MaskError::InvalidInput(format!(
                "feature {index}: position {position:?} needs at least two numbers"
            ))),
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct OutputCollection<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    features: Vec<OutputFeature<'a>>,
}

#[derive(Debug, Serialize)]
struct OutputFeature<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    properties: CellProperties<'a>,
    geometry: OutputPolygon,
}

#[derive(Debug, Serialize)]
struct CellProperties<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct OutputPolygon {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: [[[f64; 2]; 5]; 1],
}

impl MaskResult {
    fn to_collection(&self) -> OutputCollection<'_> {
        OutputCollection {
            kind: "FeatureCollection",
            features: self
                .cells
                .iter()
                .map(|kept| OutputFeature {
                    kind: "Feature",
                    properties: CellProperties { id: &kept.id },
                    geometry: OutputPolygon {
                        kind: "Polygon",
                        coordinates: [kept.cell.ring()],
                    },
                })
                .collect(),
        }
    }

    /// Serialises the mask as a compact GeoJSON feature collection.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_collection())?)
    }
}

/// Writes `mask` to `path`, creating parent directories as needed.
///
/// The JSON goes to a temporary file next to `path` which is then renamed
/// over it, so `path` holds either the previous content or the full new mask.
pub fn write_mask(path: impl AsRef<Path>, mask: &MaskResult) -> Result<()> {
    let path = path.as_ref();
    let json = mask.to_json()?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| MaskError::io(dir, e))?;

    let mut file = tempfile::Builder::new()
        .prefix(".berlin-pixels-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| MaskError::io(dir, e))?;
    file.write_all(json.as_bytes())
        .and_then(|()| file.as_file().sync_all())
        .map_err(|e| MaskError::io(file.path(), e))?;
    file.persist(path).map_err(|e| MaskError::io(path, e.error))?;

    tracing::info!(
        "Wrote {} pixels to {}",
        mask.cells.len(),
        path.display()
    );
    Ok(())
}
