// src/map/tile.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque name of a tile category ("wall", "floor", "door", ...).
///
/// Carries no image data; the texture store maps it to something drawable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(String);

impl TileId {
    pub const WALL: &'static str = "wall";
    pub const FLOOR: &'static str = "floor";
    pub const DOOR: &'static str = "door";

    pub fn new(name: impl Into<String>) -> Self {
        TileId(name.into())
    }

    pub fn wall() -> Self {
        Self::new(Self::WALL)
    }

    pub fn floor() -> Self {
        Self::new(Self::FLOOR)
    }

    pub fn door() -> Self {
        Self::new(Self::DOOR)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is(&self, name: &str) -> bool {
        self.0 == name
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TileId {
    fn from(name: &str) -> Self {
        TileId::new(name)
    }
}

impl From<String> for TileId {
    fn from(name: String) -> Self {
        TileId(name)
    }
}

/// A tile value. Tiles have no identity beyond the cell holding them;
/// replacing a tile overwrites the cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    /// Free-form editor properties. Ordered so saves are byte-stable.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Tile {
    pub fn new(id: impl Into<TileId>) -> Self {
        Tile {
            id: id.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.id.is(name)
    }
}

impl From<TileId> for Tile {
    fn from(id: TileId) -> Self {
        Tile {
            id,
            properties: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_id_display_and_compare() {
        let id = TileId::from("lava");
        assert_eq!(id.to_string(), "lava");
        assert!(id.is("lava"));
        assert!(!TileId::wall().is(TileId::FLOOR));
    }

    #[test]
    fn test_tile_properties_are_ordered() {
        let tile = Tile::new("chest")
            .with_property("loot", "gold")
            .with_property("locked", "true");
        let keys: Vec<&str> = tile.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["locked", "loot"]);
    }

    #[test]
    fn test_plain_tile_serializes_without_properties() {
        let json = serde_json::to_string(&Tile::new("floor")).unwrap();
        assert_eq!(json, r#"{"id":"floor"}"#);
    }
}
