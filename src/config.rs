// src/config.rs

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::editor::generator::GeneratorConfig;
use crate::editor::history::DEFAULT_HISTORY_CAPACITY;
use crate::error::{LevelError, Result};
use crate::map::TileId;

/// Settings shared by the editor and the game.
///
/// Every field has a default, so a config file only needs to name what it
/// changes:
///
/// ```json
/// { "history_capacity": 100, "generator": { "door_chance": 0.25 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum undo depth.
    pub history_capacity: usize,
    /// Where `SaveLevel(name)` / `LoadLevel(name)` read and write.
    pub levels_dir: PathBuf,
    /// Tile ids that block movement.
    pub solid_tiles: BTreeSet<TileId>,
    pub generator: GeneratorConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            levels_dir: PathBuf::from("levels"),
            solid_tiles: [TileId::wall()].into_iter().collect(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Reads a JSON config. A missing file gives the defaults; an unreadable
    /// or invalid one is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Config {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config: EditorConfig = serde_json::from_str(&text)
            .map_err(|e| LevelError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(LevelError::Config("history_capacity must be at least 1".into()));
        }
        self.generator.validate()
    }

    pub fn is_solid(&self, id: &TileId) -> bool {
        self.solid_tiles.contains(id)
    }

    /// File backing a level name inside `levels_dir`.
    pub fn level_path(&self, name: &str) -> PathBuf {
        let file = if name.ends_with(".json") {
            name.to_string()
        } else {
            format!("{}.json", name)
        };
        self.levels_dir.join(file)
    }
}
