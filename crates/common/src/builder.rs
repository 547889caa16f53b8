//! End-to-end mask build: load the boundary, rasterize it, write the mask.

use crate::config::Config;
use crate::error::Result;
use crate::geojson::{load_boundary, write_mask};
use crate::grid::{rasterize, MaskResult};

/// Runs one mask build with the paths and cell size from `config`.
///
/// The output file is only replaced once the whole mask has been computed
/// and serialised. Any error leaves a previous output untouched.
pub fn build_mask(config: &Config) -> Result<MaskResult> {
    config.validate()?;

    let boundary = load_boundary(&config.input_path)?;
    let bbox = boundary.bbox();
    tracing::info!("BBox (local units): {:?}", bbox.to_array());

    tracing::info!(
        "Generating grid with cell size {} units...",
        config.cell_size
    );
    let mask = rasterize(&boundary, config.cell_size)?;
    tracing::info!("Processed {} potential cells.", mask.scanned);
    tracing::info!("Finished filtering. Kept {} cells.", mask.cells.len());
    if mask.cells.is_empty() {
        tracing::warn!("No cell centroid fell inside the boundary; writing an empty mask");
    }

    write_mask(&config.output_path, &mask)?;
    Ok(mask)
}
