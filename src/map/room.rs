// src/map/room.rs

use serde::{Deserialize, Serialize};

use crate::error::{LevelError, Result};
use crate::map::grid::{GridPos, TileGrid};
use crate::map::passage::{Direction, Passage, PassageGraph, RoomId};
use crate::map::tile::TileId;

/// Descriptive fields persisted with every room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelMetadata {
    pub name: String,
    pub author: String,
    pub version: String,
}

impl Default for LevelMetadata {
    fn default() -> Self {
        LevelMetadata {
            name: "New Level".to_string(),
            author: String::new(),
            version: "1.0".to_string(),
        }
    }
}

/// One room: its grid, its passages and its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub grid: TileGrid,
    pub passages: PassageGraph,
    pub metadata: LevelMetadata,
    /// Seed the layout was generated from, if it was generated.
    pub seed: Option<u64>,
}

impl Room {
    /// An empty room of the given size.
    pub fn new(id: RoomId, width: u32, height: u32) -> Result<Self> {
        Ok(Room::from_parts(id, TileGrid::new(width, height)?, PassageGraph::new()))
    }

    pub fn from_parts(id: RoomId, grid: TileGrid, passages: PassageGraph) -> Self {
        Room {
            id,
            grid,
            passages,
            metadata: LevelMetadata::default(),
            seed: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.grid.width()
    }

    pub fn height(&self) -> u32 {
        self.grid.height()
    }

    /// A passage may sit on the outer ring or on an interior doorway tile.
    pub fn can_host_passage(&self, position: GridPos) -> Result<()> {
        let (x, y) = (position.x, position.y);
        if !self.grid.in_bounds(x, y) {
            return Err(LevelError::OutOfBounds {
                x,
                y,
                width: self.grid.width(),
                height: self.grid.height(),
            });
        }
        if is_passage_site(&self.grid, position) {
            Ok(())
        } else {
            Err(LevelError::CommandNotApplicable(format!(
                "{} is neither on the boundary nor a doorway",
                position
            )))
        }
    }

    /// Validated insertion into the passage graph.
    pub fn add_passage(&mut self, passage: Passage) -> Result<()> {
        self.can_host_passage(passage.position)?;
        self.passages.add(passage)
    }

    pub fn remove_passage(&mut self, position: GridPos, direction: Direction) -> Option<Passage> {
        self.passages.remove(position, direction).map(|(_, p)| p)
    }

    /// Resizes the grid and drops passages that no longer fit.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<usize> {
        self.grid.resize(width, height)?;
        let before = self.passages.len();
        let grid = &self.grid;
        self.passages.retain(|p| is_passage_site(grid, p.position));
        Ok(before - self.passages.len())
    }
}

fn is_passage_site(grid: &TileGrid, pos: GridPos) -> bool {
    grid.is_boundary(pos.x, pos.y) || grid.tile_id(pos.x, pos.y).is_some_and(|id| id.is(TileId::DOOR))
}
