// src/utils/viewport.rs

use serde::{Deserialize, Serialize};

use crate::map::{GridPos, TileGrid};

pub const DEFAULT_TILE_SIZE: f32 = 32.0;

/// Maps between screen pixels and grid cells.
///
/// `x`/`y` is the screen-space offset of the grid origin, so panning right
/// increases `x`. The camera knows nothing about drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub tile_size: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            x: 0.0,
            y: 0.0,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

impl Camera {
    /// Tile size is clamped to at least one pixel.
    pub fn new(tile_size: f32) -> Self {
        Camera {
            tile_size: tile_size.max(1.0),
            ..Default::default()
        }
    }

    /// Cell under a screen point. May be outside the grid.
    pub fn screen_to_grid(&self, sx: f32, sy: f32) -> GridPos {
        GridPos::new(
            ((sx + self.x) / self.tile_size).floor() as i32,
            ((sy + self.y) / self.tile_size).floor() as i32,
        )
    }

    /// Top-left screen corner of a cell.
    pub fn grid_to_screen(&self, pos: GridPos) -> (f32, f32) {
        (
            pos.x as f32 * self.tile_size - self.x,
            pos.y as f32 * self.tile_size - self.y,
        )
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    /// Sets the tile size, keeping the cell under `(sx, sy)` in place.
    pub fn zoom_at(&mut self, tile_size: f32, sx: f32, sy: f32) {
        let tile_size = tile_size.clamp(1.0, 512.0);
        let wx = (sx + self.x) / self.tile_size;
        let wy = (sy + self.y) / self.tile_size;
        self.tile_size = tile_size;
        self.x = wx * tile_size - sx;
        self.y = wy * tile_size - sy;
    }

    /// Inclusive corners of the grid cells covered by a `view_w x view_h`
    /// viewport, clipped to the grid. `None` when nothing is visible.
    pub fn visible_cells(&self, view_w: f32, view_h: f32, grid: &TileGrid) -> Option<(GridPos, GridPos)> {
        if view_w <= 0.0 || view_h <= 0.0 {
            return None;
        }
        let top_left = self.screen_to_grid(0.0, 0.0);
        let bottom_right = GridPos::new(
            ((view_w + self.x) / self.tile_size).ceil() as i32 - 1,
            ((view_h + self.y) / self.tile_size).ceil() as i32 - 1,
        );
        let max_x = grid.width() as i32 - 1;
        let max_y = grid.height() as i32 - 1;
        if bottom_right.x < 0 || bottom_right.y < 0 || top_left.x > max_x || top_left.y > max_y {
            return None;
        }
        Some((
            GridPos::new(top_left.x.max(0), top_left.y.max(0)),
            GridPos::new(bottom_right.x.min(max_x), bottom_right.y.min(max_y)),
        ))
    }
}
