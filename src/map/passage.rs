// src/map/passage.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LevelError, Result};
use crate::map::grid::GridPos;
use crate::map::tile::TileId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn all() -> &'static [Direction] {
        &[Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Unit step in grid coordinates (y grows downwards).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassageKind {
    Door,
    Stairs,
    Portal,
    /// An opening in the room's outer wall, possibly linked to a neighbour.
    Edge,
}

impl PassageKind {
    pub fn all() -> &'static [PassageKind] {
        &[
            PassageKind::Door,
            PassageKind::Stairs,
            PassageKind::Portal,
            PassageKind::Edge,
        ]
    }

    /// Tile id the generator paints under a passage of this kind.
    pub fn tile_id(self) -> TileId {
        TileId::new(self.name())
    }

    pub fn name(self) -> &'static str {
        match self {
            PassageKind::Door => "door",
            PassageKind::Stairs => "stairs",
            PassageKind::Portal => "portal",
            PassageKind::Edge => "edge",
        }
    }

    /// True if `id` names one of the passage kinds.
    pub fn is_passage_tile(id: &TileId) -> bool {
        Self::all().iter().any(|k| id.is(k.name()))
    }
}

impl fmt::Display for PassageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier of a room inside a dungeon.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(name: impl Into<String>) -> Self {
        RoomId(name.into())
    }

    pub fn indexed(index: usize) -> Self {
        RoomId(format!("room_{}", index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A typed connection point on a room boundary or interior doorway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub position: GridPos,
    pub direction: Direction,
    pub kind: PassageKind,
    #[serde(default)]
    pub target_room: Option<RoomId>,
    #[serde(default)]
    pub target_position: Option<GridPos>,
}

impl Passage {
    pub fn new(position: impl Into<GridPos>, direction: Direction, kind: PassageKind) -> Self {
        Passage {
            position: position.into(),
            direction,
            kind,
            target_room: None,
            target_position: None,
        }
    }

    pub fn linked_to(mut self, room: RoomId, position: GridPos) -> Self {
        self.target_room = Some(room);
        self.target_position = Some(position);
        self
    }

    pub fn key(&self) -> (GridPos, Direction) {
        (self.position, self.direction)
    }

    pub fn is_linked(&self) -> bool {
        self.target_room.is_some()
    }
}

/// The passages of one room, keyed by `(position, direction)` and kept in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassageGraph {
    passages: Vec<Passage>,
}

impl PassageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn position_of(&self, position: GridPos, direction: Direction) -> Option<usize> {
        self.passages
            .iter()
            .position(|p| p.position == position && p.direction == direction)
    }

    pub fn contains(&self, position: GridPos, direction: Direction) -> bool {
        self.position_of(position, direction).is_some()
    }

    /// Appends a passage. Fails if `(position, direction)` is already taken.
    pub fn add(&mut self, passage: Passage) -> Result<()> {
        let len = self.passages.len();
        self.insert_at(len, passage)
    }

    /// Inserts a passage at `index` (clamped to the end). Used to put a
    /// removed passage back exactly where it was.
    pub fn insert_at(&mut self, index: usize, passage: Passage) -> Result<()> {
        if self.contains(passage.position, passage.direction) {
            return Err(LevelError::DuplicatePassage {
                position: passage.position,
                direction: passage.direction,
            });
        }
        let index = index.min(self.passages.len());
        self.passages.insert(index, passage);
        Ok(())
    }

    /// Removes and returns the passage with its former index. No-op if absent.
    pub fn remove(&mut self, position: GridPos, direction: Direction) -> Option<(usize, Passage)> {
        let idx = self.position_of(position, direction)?;
        Some((idx, self.passages.remove(idx)))
    }

    pub fn resolve(&self, position: GridPos, direction: Direction) -> Option<&Passage> {
        self.position_of(position, direction).map(|i| &self.passages[i])
    }

    /// Index in insertion order, if present.
    pub fn index_of(&self, position: GridPos, direction: Direction) -> Option<usize> {
        self.position_of(position, direction)
    }

    /// Points an existing passage at another room.
    pub fn link(
        &mut self,
        position: GridPos,
        direction: Direction,
        target_room: RoomId,
        target_position: GridPos,
    ) -> bool {
        match self.position_of(position, direction) {
            Some(idx) => {
                let passage = &mut self.passages[idx];
                passage.target_room = Some(target_room);
                passage.target_position = Some(target_position);
                true
            }
            None => false,
        }
    }

    pub fn all(&self) -> &[Passage] {
        &self.passages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Passage> {
        self.passages.iter()
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Drops every passage for which `keep` returns false.
    pub fn retain(&mut self, keep: impl FnMut(&Passage) -> bool) {
        self.passages.retain(keep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn door(x: i32, y: i32, dir: Direction) -> Passage {
        Passage::new((x, y), dir, PassageKind::Door)
    }

    #[test]
    fn test_add_rejects_duplicate_key() {
        let mut graph = PassageGraph::new();
        graph.add(door(0, 3, Direction::Left)).unwrap();
        // Same cell, other direction is a different key.
        graph.add(door(0, 3, Direction::Up)).unwrap();

        let err = graph
            .add(Passage::new((0, 3), Direction::Left, PassageKind::Portal))
            .unwrap_err();
        assert!(matches!(err, LevelError::DuplicatePassage { .. }));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut graph = PassageGraph::new();
        graph.add(door(1, 0, Direction::Up)).unwrap();
        assert!(graph.remove(GridPos::new(5, 5), Direction::Up).is_none());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_all_keeps_insertion_order() {
        let mut graph = PassageGraph::new();
        graph.add(door(4, 0, Direction::Up)).unwrap();
        graph.add(door(0, 2, Direction::Left)).unwrap();
        graph.add(door(2, 4, Direction::Down)).unwrap();

        let (idx, removed) = graph.remove(GridPos::new(0, 2), Direction::Left).unwrap();
        assert_eq!(idx, 1);
        graph.insert_at(idx, removed).unwrap();

        let order: Vec<GridPos> = graph.all().iter().map(|p| p.position).collect();
        assert_eq!(
            order,
            vec![GridPos::new(4, 0), GridPos::new(0, 2), GridPos::new(2, 4)]
        );
    }

    #[test]
    fn test_resolve_and_link() {
        let mut graph = PassageGraph::new();
        graph
            .add(Passage::new((9, 4), Direction::Right, PassageKind::Edge))
            .unwrap();
        assert!(graph.resolve(GridPos::new(9, 4), Direction::Left).is_none());

        assert!(graph.link(
            GridPos::new(9, 4),
            Direction::Right,
            RoomId::indexed(1),
            GridPos::new(0, 6),
        ));
        let p = graph.resolve(GridPos::new(9, 4), Direction::Right).unwrap();
        assert_eq!(p.target_room, Some(RoomId::new("room_1")));
        assert_eq!(p.target_position, Some(GridPos::new(0, 6)));
    }

    #[test]
    fn test_passage_json_shape() {
        let p = Passage::new((2, 0), Direction::Up, PassageKind::Stairs);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(
            json,
            r#"{"position":[2,0],"direction":"up","kind":"stairs","target_room":null,"target_position":null}"#
        );
    }

    #[test]
    fn test_passage_tile_ids() {
        assert!(PassageKind::is_passage_tile(&TileId::door()));
        assert!(PassageKind::is_passage_tile(&PassageKind::Edge.tile_id()));
        assert!(!PassageKind::is_passage_tile(&TileId::wall()));
        assert_eq!(Direction::Left.opposite(), Direction::Right);
    }
}
