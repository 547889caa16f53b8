use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::MaskError;

/// Environment prefix for every mask builder setting (`MASK_CELL_SIZE`, ...).
pub const ENV_PREFIX: &str = "MASK_";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_input_path")]
    pub input_path: PathBuf,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// Side length of one grid cell, in the units of the input CRS.
    #[serde(default = "default_cell_size")]
    pub cell_size: f64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_input_path() -> PathBuf {
    PathBuf::from("public/assets/lor_prognoseraeume.geojson")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("public/masks/berlin_pixels.geojson")
}

fn default_cell_size() -> f64 {
    500.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            output_path: default_output_path(),
            cell_size: default_cell_size(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        let dotenv = Path::new(".env");
        if dotenv.is_file() {
            return Self::from_env_file(dotenv);
        }
        Self::from_vars(std::env::vars())
    }

    /// Like [`Config::from_env`], with defaults read from the dotenv file at `path`.
    ///
    /// Variables already set in the process environment win over the file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut vars = BTreeMap::new();
        for entry in dotenvy::from_path_iter(path)
            .with_context(|| format!("Failed to open {}", path.display()))?
        {
            let (key, value) =
                entry.with_context(|| format!("Failed to parse {}", path.display()))?;
            vars.insert(key, value);
        }
        vars.extend(std::env::vars());
        Self::from_vars(vars)
    }

    /// Builds a config from explicit `(key, value)` pairs, e.g. a captured environment.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::prefixed(ENV_PREFIX)
            .from_iter(vars)
            .context("Failed to load config from environment")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        validate_cell_size(self.cell_size)
    }
}

pub(crate) fn validate_cell_size(cell_size: f64) -> crate::Result<()> {
    if !cell_size.is_finite() || cell_size <= 0.0 {
        return Err(MaskError::InvalidConfig(format!(
            "cell size must be a positive finite number, got {cell_size}"
        )));
    }
    Ok(())
}
