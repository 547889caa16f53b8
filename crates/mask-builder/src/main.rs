//! Offline tool that rasterizes the Berlin district boundary into the
//! 500 m pixel mask consumed by the badge viewer.
//!
//! Settings come from `MASK_*` environment variables (or a `.env` file):
//! `MASK_INPUT_PATH`, `MASK_OUTPUT_PATH`, `MASK_CELL_SIZE`, `MASK_LOG_LEVEL`.

use anyhow::{Context, Result};
use berlin_pixels_common::{build_mask, init_tracing, Config};

fn main() -> Result<()> {
    // 1. Load config before logging so the level can come from it
    let config = Config::from_env()?;

    // 2. Logs
    init_tracing("make-berlin-pixel-mask", &config.log_level);
    tracing::info!(
        input = %config.input_path.display(),
        output = %config.output_path.display(),
        cell_size = config.cell_size,
        "Using config"
    );

    // 3. Build and write the mask
    let mask = build_mask(&config).with_context(|| {
        format!(
            "Failed to build pixel mask from {}",
            config.input_path.display()
        )
    })?;

    tracing::info!(
        "✅ Done: {} of {} cells of {} units kept.",
        mask.cells.len(),
        mask.scanned,
        mask.cell_size
    );
    Ok(())
}
