use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SketchError};
use crate::mode::{ModeConfig, ModeKey};

/// Front-end settings kept in a JSON file next to the models.
///
/// Mode presets (class count, labels, orientation) are fixed; only where the
/// model files live and where the studio listens can be changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    pub addr: String,
    pub digit_model: Option<PathBuf>,
    pub letter_model: Option<PathBuf>,
    /// Canvas edge in pixels for stroke files rendered by the CLI.
    pub canvas_size: u32,
}

impl Default for SketchConfig {
    fn default() -> Self {
        SketchConfig {
            addr: "127.0.0.1:7878".to_string(),
            digit_model: None,
            letter_model: None,
            canvas_size: 280,
        }
    }
}

impl SketchConfig {
    /// Reads `path`, or writes and returns the defaults if it does not exist.
    pub fn load_or_init(path: &Path) -> Result<SketchConfig> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            serde_json::from_str(&contents)
                .map_err(|e| SketchError::Config(format!("failed to parse {}: {}", path.display(), e)))
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let value = SketchConfig::default();
            let serialized = serde_json::to_string_pretty(&value)
                .map_err(|e| SketchError::Config(e.to_string()))?;
            fs::write(path, serialized)?;
            log::info!("wrote default config to {}", path.display());
            Ok(value)
        }
    }

    /// Configured model path for `key`, falling back to the mode's default.
    pub fn model_path(&self, key: ModeKey) -> PathBuf {
        let over = match key {
            ModeKey::Digit => &self.digit_model,
            ModeKey::Letter => &self.letter_model,
        };
        over.clone()
            .unwrap_or_else(|| PathBuf::from(ModeConfig::for_key(key).default_model))
    }
}
