// src/assets/texture_store.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::RwLock;

use crate::error::Result;
use crate::map::{Room, TileId};

pub const TEXTURE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Lookup from tile id to the image a renderer should draw for it.
pub trait TextureStore: Send + Sync {
    fn resolve(&self, id: &TileId) -> Option<PathBuf>;

    fn contains(&self, id: &TileId) -> bool {
        self.resolve(id).is_some()
    }
}

/// Texture paths keyed by tile id. Clones share the same table, so the
/// editor and the renderer see the same registrations.
#[derive(Debug, Clone, Default)]
pub struct TextureRegistry {
    textures: Arc<RwLock<BTreeMap<TileId, PathBuf>>>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the texture for `id`.
    pub fn register(&self, id: impl Into<TileId>, path: impl Into<PathBuf>) {
        let id = id.into();
        let path = path.into();
        debug!("Texture {} -> {}", id, path.display());
        self.textures.write().insert(id, path);
    }

    /// Registers every `*.png`, `*.jpg` and `*.jpeg` file in `dir` under its
    /// file stem and returns how many were found. A missing directory
    /// registers nothing.
    pub fn scan_directory(&self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Texture directory {} does not exist", dir.display());
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        let mut found = BTreeMap::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || !has_texture_extension(&path) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                found.insert(TileId::new(stem), path.clone());
            }
        }

        let count = found.len();
        self.textures.write().extend(found);
        info!("Registered {} texture(s) from {}", count, dir.display());
        Ok(count)
    }

    /// Tile ids used in `room` that have no texture.
    pub fn missing_tiles(&self, room: &Room) -> BTreeSet<TileId> {
        let textures = self.textures.read();
        room.grid
            .cells()
            .filter_map(|(_, tile)| tile)
            .filter(|tile| !textures.contains_key(&tile.id))
            .map(|tile| tile.id.clone())
            .collect()
    }

    pub fn tile_ids(&self) -> Vec<TileId> {
        self.textures.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.textures.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.read().is_empty()
    }
}

impl TextureStore for TextureRegistry {
    fn resolve(&self, id: &TileId) -> Option<PathBuf> {
        self.textures.read().get(id).cloned()
    }
}

fn has_texture_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TEXTURE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
