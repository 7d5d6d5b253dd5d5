// src/document/mod.rs
mod snapshot;

pub use self::snapshot::{load, save, RoomSnapshot, TileProperties};
pub use crate::map::LevelMetadata;
