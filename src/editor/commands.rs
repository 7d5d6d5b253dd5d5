// src/editor/commands.rs

use crate::error::{LevelError, Result};
use crate::map::{GridPos, Passage, Room, Tile};

pub trait Command {
    /// Applies the command. On error the room is left untouched.
    fn execute(&self, room: &mut Room) -> Result<()>;
    /// Reverts a previous `execute`. On error the room is left untouched.
    fn unexecute(&self, room: &mut Room) -> Result<()>;
}

/// A reversible edit. Each variant records everything it needs to undo
/// itself, so `unexecute(execute(room)) == room` holds exactly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditCommand {
    PaintTile {
        pos: GridPos,
        new: Tile,
        old: Option<Tile>,
    },
    EraseTile {
        pos: GridPos,
        old: Tile,
    },
    AddPassage {
        passage: Passage,
    },
    /// `index` is the passage's slot in insertion order, restored on undo.
    RemovePassage {
        passage: Passage,
        index: usize,
    },
}

impl EditCommand {
    /// Builds a paint command against the room's current contents.
    pub fn paint(room: &Room, pos: GridPos, new: Tile) -> Result<Self> {
        let old = room.grid.get(pos.x, pos.y)?.cloned();
        Ok(EditCommand::PaintTile { pos, new, old })
    }

    /// Builds an erase command. Erasing an empty cell is not applicable.
    pub fn erase(room: &Room, pos: GridPos) -> Result<Self> {
        match room.grid.get(pos.x, pos.y)? {
            Some(old) => Ok(EditCommand::EraseTile {
                pos,
                old: old.clone(),
            }),
            None => Err(LevelError::CommandNotApplicable(format!(
                "cell {} is already empty",
                pos
            ))),
        }
    }

    /// Builds a remove command for an existing passage.
    pub fn remove_passage(room: &Room, passage: &Passage) -> Result<Self> {
        let index = room
            .passages
            .index_of(passage.position, passage.direction)
            .ok_or_else(|| {
                LevelError::CommandNotApplicable(format!(
                    "no {} passage at {}",
                    passage.direction, passage.position
                ))
            })?;
        Ok(EditCommand::RemovePassage {
            passage: room.passages.all()[index].clone(),
            index,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            EditCommand::PaintTile { .. } => "Paint Tile",
            EditCommand::EraseTile { .. } => "Erase Tile",
            EditCommand::AddPassage { .. } => "Add Passage",
            EditCommand::RemovePassage { .. } => "Remove Passage",
        }
    }
}

fn expect_cell(room: &Room, pos: GridPos, expected: Option<&Tile>) -> Result<()> {
    let current = room.grid.get(pos.x, pos.y)?;
    if current == expected {
        Ok(())
    } else {
        Err(LevelError::CommandNotApplicable(format!(
            "cell {} holds {:?}, expected {:?}",
            pos,
            current.map(|t| t.id.as_str()),
            expected.map(|t| t.id.as_str())
        )))
    }
}

fn write_cell(room: &mut Room, pos: GridPos, tile: Option<Tile>) -> Result<()> {
    room.grid.set(pos.x, pos.y, tile).map(|_| ())
}

fn expect_passage(room: &Room, passage: &Passage, index: Option<usize>) -> Result<()> {
    match room.passages.index_of(passage.position, passage.direction) {
        Some(i) if room.passages.all()[i] == *passage && index.map_or(true, |idx| idx == i) => {
            Ok(())
        }
        _ => Err(LevelError::CommandNotApplicable(format!(
            "{} passage at {} does not match",
            passage.direction, passage.position
        ))),
    }
}

impl Command for EditCommand {
    fn execute(&self, room: &mut Room) -> Result<()> {
        match self {
            EditCommand::PaintTile { pos, new, old } => {
                expect_cell(room, *pos, old.as_ref())?;
                write_cell(room, *pos, Some(new.clone()))
            }
            EditCommand::EraseTile { pos, old } => {
                expect_cell(room, *pos, Some(old))?;
                write_cell(room, *pos, None)
            }
            EditCommand::AddPassage { passage } => room.add_passage(passage.clone()),
            EditCommand::RemovePassage { passage, index } => {
                expect_passage(room, passage, Some(*index))?;
                room.passages.remove(passage.position, passage.direction);
                Ok(())
            }
        }
    }

    fn unexecute(&self, room: &mut Room) -> Result<()> {
        match self {
            EditCommand::PaintTile { pos, new, old } => {
                expect_cell(room, *pos, Some(new))?;
                write_cell(room, *pos, old.clone())
            }
            EditCommand::EraseTile { pos, old } => {
                expect_cell(room, *pos, None)?;
                write_cell(room, *pos, Some(old.clone()))
            }
            EditCommand::AddPassage { passage } => {
                expect_passage(room, passage, None)?;
                room.passages.remove(passage.position, passage.direction);
                Ok(())
            }
            EditCommand::RemovePassage { passage, index } => {
                room.passages.insert_at(*index, passage.clone())
            }
        }
    }
}
