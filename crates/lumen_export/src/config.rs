//! Export configuration.
//!
//! Loaded once from TOML by the host. Every field has a default, so an empty
//! file is a valid configuration.
//!
//! ```toml
//! single_color_textures = true
//! export_water_octree = true
//! emitter_grid = false
//! ```

use std::path::Path;

use lumen_pack::MaterialOptions;
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, ExportResult};

/// Settings that shape what a load pass exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Replace opaque, non-refractive textures with their average color.
    pub single_color_textures: bool,
    /// Export the water octree. When off, a one-word placeholder is published.
    pub export_water_octree: bool,
    /// Export the emitter grid. When off, placeholder buffers are published.
    pub emitter_grid: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            single_color_textures: false,
            export_water_octree: true,
            emitter_grid: true,
        }
    }
}

impl ExportConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidConfig`] if the text is not a valid
    /// configuration.
    pub fn from_toml_str(text: &str) -> ExportResult<Self> {
        toml::from_str(text).map_err(|e| ExportError::InvalidConfig(e.to_string()))
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::ConfigIo`] if the file cannot be read and
    /// [`ExportError::InvalidConfig`] if it cannot be parsed.
    pub fn from_path(path: impl AsRef<Path>) -> ExportResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ExportError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Material settings derived from this configuration.
    #[must_use]
    pub const fn material_options(&self) -> MaterialOptions {
        MaterialOptions {
            single_color_textures: self.single_color_textures,
        }
    }
}
