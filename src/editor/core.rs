// src/editor/core.rs

use std::fs;

use log::{error, info, warn};

use crate::assets::TextureRegistry;
use crate::config::EditorConfig;
use crate::document::{self, RoomSnapshot};
use crate::editor::commands::EditCommand;
use crate::editor::generator::RoomGenerator;
use crate::editor::history::HistoryManager;
use crate::error::{LevelError, Result};
use crate::map::{
    Direction, GridPos, LevelMetadata, Passage, PassageKind, Room, RoomId, Tile, TileId,
};
use crate::utils::Camera;

/// Tools for the room editor.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Tool {
    Paint,
    Erase,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Paint => "Paint",
            Tool::Erase => "Erase",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[Tool::Paint, Tool::Erase]
    }
}

/// Everything the editor front end can ask a session to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorIntent {
    PaintTile { x: i32, y: i32, id: TileId },
    EraseTile { x: i32, y: i32 },
    AddPassage {
        x: i32,
        y: i32,
        direction: Direction,
        kind: PassageKind,
    },
    RemovePassage { x: i32, y: i32, direction: Direction },
    Undo,
    Redo,
    SaveLevel(String),
    LoadLevel(String),
}

/// Result of an intent the session could process.
#[derive(Debug)]
pub enum Outcome {
    Applied,
    /// The intent was refused and nothing changed.
    Rejected(LevelError),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

/// One editing session over one room.
pub struct EditorSession {
    room: Room,
    history: HistoryManager,
    config: EditorConfig,
    generator: RoomGenerator,

    pub camera: Camera,
    current_tool: Tool,
    current_tile: TileId,

    /// Messages or status for UI.
    pub status_message: String,
    pub error_message: Option<String>,

    textures: Option<TextureRegistry>,
    is_dirty: bool,
}

impl EditorSession {
    /// Starts on an empty `width x height` level.
    pub fn new(config: EditorConfig, width: u32, height: u32) -> Result<Self> {
        config.validate()?;
        let generator = RoomGenerator::new(config.generator.clone())?;
        Ok(Self {
            room: Room::new(RoomId::indexed(0), width, height)?,
            history: HistoryManager::new(config.history_capacity),
            config,
            generator,
            camera: Camera::default(),
            current_tool: Tool::Paint,
            current_tile: TileId::floor(),
            status_message: String::new(),
            error_message: None,
            textures: None,
            is_dirty: false,
        })
    }

    /// Shares a texture registry with the session; loaded levels are
    /// checked against it.
    pub fn attach_textures(&mut self, textures: TextureRegistry) {
        self.textures = Some(textures);
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn current_tool(&self) -> Tool {
        self.current_tool
    }

    pub fn set_current_tool(&mut self, tool: Tool) {
        self.current_tool = tool;
        self.status_message = format!("Selected tool: {}", tool.name());
    }

    pub fn current_tile(&self) -> &TileId {
        &self.current_tile
    }

    pub fn set_current_tile(&mut self, id: impl Into<TileId>) {
        self.current_tile = id.into();
        self.status_message = format!("Selected tile: {}", self.current_tile);
    }

    // --- Intents ---

    /// Processes one intent. Structural problems come back as
    /// `Outcome::Rejected` with the session unchanged; malformed files and
    /// I/O failures are returned as errors, also with the session unchanged.
    pub fn handle(&mut self, intent: EditorIntent) -> Result<Outcome> {
        let result = match intent {
            EditorIntent::PaintTile { x, y, id } => self.paint(GridPos::new(x, y), id),
            EditorIntent::EraseTile { x, y } => self.erase(GridPos::new(x, y)),
            EditorIntent::AddPassage {
                x,
                y,
                direction,
                kind,
            } => self.add_passage(Passage::new((x, y), direction, kind)),
            EditorIntent::RemovePassage { x, y, direction } => {
                self.remove_passage(GridPos::new(x, y), direction)
            }
            EditorIntent::Undo => self.undo(),
            EditorIntent::Redo => self.redo(),
            EditorIntent::SaveLevel(name) => self.save_level(&name),
            EditorIntent::LoadLevel(name) => self.load_level(&name),
        };

        match result {
            Ok(()) => {
                self.error_message = None;
                Ok(Outcome::Applied)
            }
            Err(err) if err.is_recoverable() => {
                warn!("Rejected: {}", err);
                self.error_message = Some(err.to_string());
                Ok(Outcome::Rejected(err))
            }
            Err(err) => {
                error!("{}", err);
                self.error_message = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Applies the current tool at a screen point.
    pub fn use_tool_at(&mut self, sx: f32, sy: f32) -> Result<Outcome> {
        let pos = self.camera.screen_to_grid(sx, sy);
        let intent = match self.current_tool {
            Tool::Paint => EditorIntent::PaintTile {
                x: pos.x,
                y: pos.y,
                id: self.current_tile.clone(),
            },
            Tool::Erase => EditorIntent::EraseTile { x: pos.x, y: pos.y },
        };
        self.handle(intent)
    }

    fn paint(&mut self, pos: GridPos, id: TileId) -> Result<()> {
        let tile = Tile::from(id);
        if self.room.grid.tile(pos.x, pos.y) == Some(&tile) {
            return Err(LevelError::CommandNotApplicable(format!(
                "{} is already {}",
                pos, tile.id
            )));
        }
        if !tile.is(TileId::DOOR) {
            self.check_doorway_free(pos)?;
        }
        let command = EditCommand::paint(&self.room, pos, tile)?;
        self.execute(command)
    }

    fn erase(&mut self, pos: GridPos) -> Result<()> {
        self.check_doorway_free(pos)?;
        let command = EditCommand::erase(&self.room, pos)?;
        self.execute(command)
    }

    /// An interior doorway that hosts a passage must keep its door tile.
    fn check_doorway_free(&self, pos: GridPos) -> Result<()> {
        let grid = &self.room.grid;
        let hosts_passage = self.room.passages.iter().any(|p| p.position == pos);
        if hosts_passage && grid.in_bounds(pos.x, pos.y) && !grid.is_boundary(pos.x, pos.y) {
            return Err(LevelError::CommandNotApplicable(format!(
                "doorway {} still has a passage",
                pos
            )));
        }
        Ok(())
    }

    fn add_passage(&mut self, passage: Passage) -> Result<()> {
        self.room.can_host_passage(passage.position)?;
        self.execute(EditCommand::AddPassage { passage })
    }

    fn remove_passage(&mut self, position: GridPos, direction: Direction) -> Result<()> {
        let passage = self
            .room
            .passages
            .resolve(position, direction)
            .cloned()
            .ok_or_else(|| {
                LevelError::CommandNotApplicable(format!("no {} passage at {}", direction, position))
            })?;
        let command = EditCommand::remove_passage(&self.room, &passage)?;
        self.execute(command)
    }

    fn execute(&mut self, command: EditCommand) -> Result<()> {
        let name = command.name();
        self.history.execute(&mut self.room, command)?;
        self.is_dirty = true;
        self.status_message = name.to_string();
        Ok(())
    }

    fn undo(&mut self) -> Result<()> {
        let name = self.history.undo(&mut self.room)?;
        self.is_dirty = true;
        self.status_message = format!("Undo {}", name);
        Ok(())
    }

    fn redo(&mut self) -> Result<()> {
        let name = self.history.redo(&mut self.room)?;
        self.is_dirty = true;
        self.status_message = format!("Redo {}", name);
        Ok(())
    }

    fn save_level(&mut self, name: &str) -> Result<()> {
        let path = self.config.level_path(name);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        document::save(&RoomSnapshot::from_room(&self.room), &path)?;
        self.is_dirty = false;
        self.status_message = format!("Saved {}", path.display());
        Ok(())
    }

    fn load_level(&mut self, name: &str) -> Result<()> {
        let path = self.config.level_path(name);
        let snapshot = document::load(&path)?;
        let room = snapshot.to_room(RoomId::new(name.trim_end_matches(".json")))?;
        if let Some(textures) = &self.textures {
            let missing = textures.missing_tiles(&room);
            if !missing.is_empty() {
                warn!("Level {} uses tiles without textures: {:?}", name, missing);
            }
        }
        self.replace_room(room);
        self.status_message = format!("Loaded {}", path.display());
        Ok(())
    }

    // --- Whole-level operations (not undoable) ---

    /// Replaces the level with an empty one and clears history.
    pub fn new_level(&mut self, width: u32, height: u32) -> Result<()> {
        let room = Room::new(RoomId::indexed(0), width, height)?;
        self.replace_room(room);
        self.status_message = format!("New {}x{} level", width, height);
        Ok(())
    }

    /// Replaces the level with a generated one of the current size.
    pub fn generate_level(&mut self, seed: Option<u64>) -> Result<()> {
        let room = self.generator.generate_room(
            self.room.id.clone(),
            seed,
            self.room.width(),
            self.room.height(),
        )?;
        let seed = room.seed;
        self.replace_room(room);
        self.is_dirty = true;
        if let Some(seed) = seed {
            self.status_message = format!("Generated level from seed {}", seed);
        }
        Ok(())
    }

    /// Resizes the grid, dropping passages that no longer fit. History is
    /// cleared because recorded positions may be gone.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let dropped = self.room.resize(width, height)?;
        if dropped > 0 {
            info!("Resize to {}x{} dropped {} passage(s)", width, height, dropped);
        }
        self.history.clear();
        self.is_dirty = true;
        self.status_message = format!("Resized to {}x{}", width, height);
        Ok(())
    }

    pub fn set_metadata(&mut self, metadata: LevelMetadata) {
        self.room.metadata = metadata;
        self.is_dirty = true;
    }

    fn replace_room(&mut self, room: Room) {
        self.room = room;
        self.history.clear();
        self.is_dirty = false;
        self.error_message = None;
    }

    // --- Queries ---

    pub fn tile_at(&self, x: i32, y: i32) -> Option<&TileId> {
        self.room.grid.tile_id(x, y)
    }

    /// Out-of-bounds cells count as solid.
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        if !self.room.grid.in_bounds(x, y) {
            return true;
        }
        self.room
            .grid
            .tile_id(x, y)
            .is_some_and(|id| self.config.is_solid(id))
    }

    pub fn passages(&self) -> &[Passage] {
        self.room.passages.all()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.is_dirty
    }
}
