// src/editor/history.rs

use std::collections::VecDeque;

use log::debug;

use crate::editor::commands::{Command, EditCommand};
use crate::error::{LevelError, Result};
use crate::map::Room;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Linear undo/redo timeline with a bounded undo depth.
///
/// `undo`/`redo` move commands between the two stacks and apply the
/// matching half of the command to the room passed in. Pushing a new
/// command drops everything on the redo stack; branching is not kept.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    capacity: usize,
    undo_stack: VecDeque<EditCommand>,
    redo_stack: Vec<EditCommand>,
}

impl HistoryManager {
    /// A capacity of 0 is bumped to 1.
    pub fn new(capacity: usize) -> Self {
        HistoryManager {
            capacity: capacity.max(1),
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Applies `command` and records it. A command that fails leaves both
    /// the room and the history untouched.
    pub fn execute(&mut self, room: &mut Room, command: EditCommand) -> Result<()> {
        command.execute(room)?;
        self.push(command);
        Ok(())
    }

    /// Records a command that has already been applied.
    pub fn push(&mut self, command: EditCommand) {
        self.undo_stack.push_back(command);
        self.redo_stack.clear();
        while self.undo_stack.len() > self.capacity {
            if let Some(evicted) = self.undo_stack.pop_front() {
                debug!("History full, dropping oldest command: {}", evicted.name());
            }
        }
    }

    /// Reverts the newest command and returns its name.
    pub fn undo(&mut self, room: &mut Room) -> Result<&'static str> {
        let command = self.undo_stack.pop_back().ok_or(LevelError::NothingToUndo)?;
        if let Err(err) = command.unexecute(room) {
            self.undo_stack.push_back(command);
            return Err(err);
        }
        let name = command.name();
        self.redo_stack.push(command);
        Ok(name)
    }

    /// Re-applies the most recently undone command and returns its name.
    pub fn redo(&mut self, room: &mut Room) -> Result<&'static str> {
        let command = self.redo_stack.pop().ok_or(LevelError::NothingToRedo)?;
        if let Err(err) = command.execute(room) {
            self.redo_stack.push(command);
            return Err(err);
        }
        let name = command.name();
        self.undo_stack.push_back(command);
        Ok(name)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{GridPos, RoomId, Tile, TileId};

    fn floor_room() -> Room {
        let mut room = Room::new(RoomId::indexed(0), 6, 6).unwrap();
        for y in 0..6 {
            for x in 0..6 {
                room.grid.set(x, y, Some(Tile::new(TileId::FLOOR))).unwrap();
            }
        }
        room
    }

    fn paint(history: &mut HistoryManager, room: &mut Room, x: i32, y: i32, id: &str) {
        let cmd = EditCommand::paint(room, GridPos::new(x, y), Tile::new(id)).unwrap();
        history.execute(room, cmd).unwrap();
    }

    #[test]
    fn test_undo_all_then_redo_all() {
        let mut room = floor_room();
        let start = room.clone();
        let mut history = HistoryManager::new(10);

        paint(&mut history, &mut room, 1, 1, "lava");
        paint(&mut history, &mut room, 1, 1, "water");
        paint(&mut history, &mut room, 4, 2, "wall");
        let cmd = EditCommand::erase(&room, GridPos::new(0, 0)).unwrap();
        history.execute(&mut room, cmd).unwrap();
        let end = room.clone();

        for _ in 0..4 {
            history.undo(&mut room).unwrap();
        }
        assert_eq!(room, start);
        assert!(matches!(history.undo(&mut room), Err(LevelError::NothingToUndo)));

        for _ in 0..4 {
            history.redo(&mut room).unwrap();
        }
        assert_eq!(room, end);
        assert!(matches!(history.redo(&mut room), Err(LevelError::NothingToRedo)));
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut room = floor_room();
        let mut history = HistoryManager::default();
        paint(&mut history, &mut room, 2, 2, "lava");
        paint(&mut history, &mut room, 3, 3, "lava");

        history.undo(&mut room).unwrap();
        assert!(history.can_redo());
        paint(&mut history, &mut room, 1, 4, "ice");

        assert!(!history.can_redo());
        let before = room.clone();
        assert!(matches!(history.redo(&mut room), Err(LevelError::NothingToRedo)));
        assert_eq!(room, before);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut room = floor_room();
        let mut history = HistoryManager::new(3);
        for x in 0..5 {
            paint(&mut history, &mut room, x, 0, "lava");
        }
        assert_eq!(history.undo_depth(), 3);

        for _ in 0..3 {
            history.undo(&mut room).unwrap();
        }
        assert!(matches!(history.undo(&mut room), Err(LevelError::NothingToUndo)));
        // The two evicted paints stay applied.
        assert!(room.grid.tile(0, 0).unwrap().is("lava"));
        assert!(room.grid.tile(1, 0).unwrap().is("lava"));
        assert!(room.grid.tile(2, 0).unwrap().is(TileId::FLOOR));
    }

    #[test]
    fn test_failed_execute_is_not_recorded() {
        let mut room = floor_room();
        let mut history = HistoryManager::default();
        let stale = EditCommand::PaintTile {
            pos: GridPos::new(1, 1),
            new: Tile::new("lava"),
            old: None,
        };
        assert!(history.execute(&mut room, stale).is_err());
        assert!(!history.can_undo());
    }

    #[test]
    fn test_undo_that_cannot_revert_stays_on_stack() {
        let mut room = floor_room();
        let mut history = HistoryManager::default();
        paint(&mut history, &mut room, 1, 1, "lava");

        // Someone changed the cell behind the history's back.
        room.grid.set(1, 1, Some(Tile::new("mud"))).unwrap();
        assert!(matches!(
            history.undo(&mut room),
            Err(LevelError::CommandNotApplicable(_))
        ));
        assert_eq!(history.undo_depth(), 1);
        assert!(room.grid.tile(1, 1).unwrap().is("mud"));
    }

    #[test]
    fn test_zero_capacity_is_bumped() {
        assert_eq!(HistoryManager::new(0).capacity(), 1);
    }
}
