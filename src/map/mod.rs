// src/map/mod.rs
pub mod grid;
pub mod passage;
pub mod room;
pub mod tile;

pub use grid::{GridPos, TileGrid, MAX_ROOM_HEIGHT, MAX_ROOM_WIDTH};
pub use passage::{Direction, Passage, PassageGraph, PassageKind, RoomId};
pub use room::{LevelMetadata, Room};
pub use tile::{Tile, TileId};
