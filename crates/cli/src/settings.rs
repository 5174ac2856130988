use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use facegate_core::shared::constants::{
    DEFAULT_MATCH_THRESHOLD, DEFAULT_MIN_NEIGHBORS, DEFAULT_SCALE_FACTOR,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Minimum histogram correlation accepted as a match.
    pub threshold: f64,
    pub scale_factor: f64,
    pub min_neighbors: usize,
    /// Smallest face side in pixels; 0 uses the cascade window.
    pub min_face_size: u32,
    /// Cascade XML to use instead of the cached or downloaded one.
    pub cascade_path: Option<PathBuf>,
    /// Where user reference photos live.
    pub store_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            min_face_size: 0,
            cascade_path: None,
            store_dir: None,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceGate").join("settings.json"))
    }

    /// Settings from the default location, or defaults when the file is
    /// missing or unreadable.
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    /// Settings from an explicitly named file, which must exist and parse.
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read config {}: {e}", path.display()))?;
        let settings: Settings = serde_json::from_str(&json)
            .map_err(|e| format!("Invalid config {}: {e}", path.display()))?;
        Ok(settings)
    }

    /// Configured store directory, else the per-user data directory.
    pub fn resolved_store_dir(&self) -> Option<PathBuf> {
        self.store_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("FaceGate").join("users")))
    }

    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if !(-1.0..=1.0).contains(&self.threshold) {
            return Err(format!(
                "Threshold must be between -1.0 and 1.0, got {}",
                self.threshold
            )
            .into());
        }
        if !self.scale_factor.is_finite() || self.scale_factor <= 1.0 {
            return Err(format!(
                "Scale factor must be greater than 1.0, got {}",
                self.scale_factor
            )
            .into());
        }
        Ok(())
    }
}
