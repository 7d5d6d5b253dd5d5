// src/lib.rs

pub mod assets;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod map;
pub mod utils;

pub use crate::config::EditorConfig;
pub use crate::error::{LevelError, Result};
