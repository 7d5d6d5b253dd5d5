// src/editor/mod.rs

pub mod commands;
pub mod core;
pub mod generator;
pub mod history;

pub use self::commands::{Command, EditCommand};
pub use self::core::{EditorIntent, EditorSession, Outcome, Tool};
pub use self::generator::{Connection, Dungeon, GeneratorConfig, RoomGenerator};
pub use self::history::{HistoryManager, DEFAULT_HISTORY_CAPACITY};
