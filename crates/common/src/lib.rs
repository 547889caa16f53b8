//! Shared library for the Berlin pixel mask builder.
//!
//! This crate turns a GeoJSON region boundary into a grid "pixel mask" and
//! provides the configuration, error handling and telemetry setup used by
//! the `make-berlin-pixel-mask` tool.

// Configuration management
pub mod config;
pub use config::Config;

// Error handling types
pub mod error;
pub use error::{MaskError, Result};

// Telemetry and observability
pub mod telemetry;

// Boundary model and rasterizer
pub mod grid;

// GeoJSON input and output
pub mod geojson;

// Load, rasterize, write
pub mod builder;
pub use builder::build_mask;

pub use telemetry::init_tracing;
