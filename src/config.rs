use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::SchemaMap;

/// Environment variable naming a JSON file with [`ViewerConfig`] overrides.
pub const CONFIG_ENV: &str = "HALO_VIEWER_CONFIG";

// ---------------------------------------------------------------------------
// Viewer configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Scatter plots draw at most this many halos (heaviest first).
    pub max_scatter_points: usize,
    /// Marker radius in points.
    pub point_radius: f32,
    /// Number of colour steps in the log-mass ramp.
    pub mass_color_bins: usize,
    /// Where confirmed schema maps are kept between sessions.
    pub schema_cache_path: Option<PathBuf>,
    /// Initial window size in logical pixels.
    pub window_size: [f32; 2],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_scatter_points: 50_000,
            point_radius: 1.5,
            mass_color_bins: 8,
            schema_cache_path: None,
            window_size: [1280.0, 820.0],
        }
    }
}

impl ViewerConfig {
    /// Read a config file; absent keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load from `$HALO_VIEWER_CONFIG` when set, defaults otherwise.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Schema cache: catalog path → confirmed schema map
// ---------------------------------------------------------------------------

/// Schema maps keyed by catalog path, so a catalog is only detected once and
/// user edits survive reloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaCache {
    entries: BTreeMap<PathBuf, SchemaMap>,
}

impl SchemaCache {
    /// Load a cache file; a missing file is an empty cache.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading schema cache {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing schema cache {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)
            .with_context(|| format!("writing schema cache {}", path.display()))
    }

    pub fn get(&self, catalog: &Path) -> Option<&SchemaMap> {
        self.entries.get(catalog)
    }

    pub fn insert(&mut self, catalog: PathBuf, schema: SchemaMap) {
        self.entries.insert(catalog, schema);
    }

    pub fn remove(&mut self, catalog: &Path) -> Option<SchemaMap> {
        self.entries.remove(catalog)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
