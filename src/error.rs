// src/error.rs

use std::io;

use thiserror::Error;

use crate::map::{Direction, GridPos};

/// Everything that can go wrong inside the layout core.
///
/// Structural errors (`OutOfBounds`, `DuplicatePassage`,
/// `CommandNotApplicable`, `NothingToUndo`, `NothingToRedo`) come from user
/// actions and are recoverable: the editor session reports them and carries
/// on. `MalformedLevel` and `Io` are surfaced to the caller.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },

    #[error("invalid dimensions {width}x{height}: {reason}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("a {direction} passage already exists at {position}")]
    DuplicatePassage {
        position: GridPos,
        direction: Direction,
    },

    #[error("command not applicable: {0}")]
    CommandNotApplicable(String),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("malformed level: {0}")]
    MalformedLevel(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl LevelError {
    /// True for errors an editing session absorbs as a rejected no-op.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LevelError::OutOfBounds { .. }
                | LevelError::InvalidDimensions { .. }
                | LevelError::DuplicatePassage { .. }
                | LevelError::CommandNotApplicable(_)
                | LevelError::NothingToUndo
                | LevelError::NothingToRedo
        )
    }
}

pub type Result<T> = std::result::Result<T, LevelError>;
