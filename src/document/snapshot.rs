// src/document/snapshot.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{LevelError, Result};
use crate::map::{
    GridPos, LevelMetadata, Passage, PassageGraph, Room, RoomId, Tile, TileGrid, TileId,
    MAX_ROOM_HEIGHT, MAX_ROOM_WIDTH,
};

/// Properties of one tile, stored beside the id grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileProperties {
    pub position: GridPos,
    pub properties: BTreeMap<String, String>,
}

/// The persisted form of one room.
///
/// ```json
/// {
///   "width": 5,
///   "height": 5,
///   "tiles": [["wall", null, ...], ...],
///   "passages": [{ "position": [0, 2], "direction": "left", "kind": "edge",
///                  "target_room": null, "target_position": null }],
///   "metadata": { "name": "New Level", "author": "", "version": "1.0" }
/// }
/// ```
///
/// Field order is fixed by the struct and maps are ordered, so saving the
/// same state twice produces the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub width: u32,
    pub height: u32,
    /// Row-major: `tiles[y][x]`.
    pub tiles: Vec<Vec<Option<TileId>>>,
    #[serde(default)]
    pub passages: Vec<Passage>,
    #[serde(default)]
    pub metadata: LevelMetadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tile_properties: Vec<TileProperties>,
}

impl RoomSnapshot {
    pub fn from_room(room: &Room) -> Self {
        let tile_properties = room
            .grid
            .cells()
            .filter_map(|(position, tile)| match tile {
                Some(t) if !t.properties.is_empty() => Some(TileProperties {
                    position,
                    properties: t.properties.clone(),
                }),
                _ => None,
            })
            .collect();
        RoomSnapshot {
            width: room.width(),
            height: room.height(),
            tiles: room.grid.rows(),
            passages: room.passages.all().to_vec(),
            metadata: room.metadata.clone(),
            tile_properties,
        }
    }

    /// Rebuilds a room. Fails with `MalformedLevel` if the snapshot does not
    /// describe a consistent room.
    pub fn to_room(&self, id: RoomId) -> Result<Room> {
        self.check_shape()?;
        let mut grid = TileGrid::new(self.width, self.height)?;
        for (y, row) in self.tiles.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if let Some(tile_id) = cell {
                    grid.set(x as i32, y as i32, Some(Tile::from(tile_id.clone())))?;
                }
            }
        }
        for entry in &self.tile_properties {
            let (x, y) = (entry.position.x, entry.position.y);
            let id = grid.tile_id(x, y).cloned().ok_or_else(|| {
                LevelError::MalformedLevel(format!("properties for empty cell {}", entry.position))
            })?;
            let tile = Tile {
                id,
                properties: entry.properties.clone(),
            };
            grid.set(x, y, Some(tile))?;
        }

        let mut room = Room::from_parts(id, grid, PassageGraph::new());
        room.metadata = self.metadata.clone();
        for passage in &self.passages {
            room.add_passage(passage.clone())
                .map_err(|e| LevelError::MalformedLevel(format!("passage rejected: {}", e)))?;
        }
        Ok(room)
    }

    /// Structural check of the required fields. Says nothing about
    /// gameplay properties such as reachability.
    pub fn validate(&self) -> bool {
        self.check_shape().is_ok()
    }

    fn check_shape(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LevelError::MalformedLevel(format!(
                "dimensions {}x{} are empty",
                self.width, self.height
            )));
        }
        if self.width > MAX_ROOM_WIDTH || self.height > MAX_ROOM_HEIGHT {
            return Err(LevelError::MalformedLevel(format!(
                "dimensions {}x{} exceed the {}x{} room limit",
                self.width, self.height, MAX_ROOM_WIDTH, MAX_ROOM_HEIGHT
            )));
        }
        if self.tiles.len() != self.height as usize {
            return Err(LevelError::MalformedLevel(format!(
                "height is {} but tiles has {} rows",
                self.height,
                self.tiles.len()
            )));
        }
        if let Some((y, row)) = self
            .tiles
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.width as usize)
        {
            return Err(LevelError::MalformedLevel(format!(
                "width is {} but row {} has {} cells",
                self.width,
                y,
                row.len()
            )));
        }
        let in_bounds = |p: GridPos| {
            p.x >= 0 && p.y >= 0 && (p.x as u32) < self.width && (p.y as u32) < self.height
        };
        if let Some(p) = self.passages.iter().find(|p| !in_bounds(p.position)) {
            return Err(LevelError::MalformedLevel(format!(
                "passage at {} is outside the grid",
                p.position
            )));
        }
        if let Some(t) = self.tile_properties.iter().find(|t| !in_bounds(t.position)) {
            return Err(LevelError::MalformedLevel(format!(
                "tile properties at {} are outside the grid",
                t.position
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self)
            .map_err(|e| LevelError::MalformedLevel(e.to_string()))?;
        text.push('\n');
        Ok(text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let snapshot: RoomSnapshot =
            serde_json::from_str(text).map_err(|e| LevelError::MalformedLevel(e.to_string()))?;
        snapshot.check_shape()?;
        Ok(snapshot)
    }
}

/// Writes `snapshot` to `path`. The bytes go to a sibling temporary file
/// first and are renamed into place, so a failed save never leaves a
/// truncated level behind.
pub fn save(snapshot: &RoomSnapshot, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let text = snapshot.to_json()?;
    let tmp = temp_path(path);
    if let Err(e) = fs::write(&tmp, text.as_bytes()) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    info!("Saved {}x{} level to {}", snapshot.width, snapshot.height, path.display());
    Ok(())
}

/// Reads and structurally checks a snapshot.
pub fn load(path: impl AsRef<Path>) -> Result<RoomSnapshot> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let snapshot = RoomSnapshot::from_json(&text)?;
    debug!("Loaded level {} from {}", snapshot.metadata.name, path.display());
    Ok(snapshot)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
