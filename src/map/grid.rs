// src/map/grid.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LevelError, Result};
use crate::map::tile::{Tile, TileId};

pub const MAX_ROOM_WIDTH: u32 = 1024;
pub const MAX_ROOM_HEIGHT: u32 = 1024;

/// Integer cell coordinate. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        GridPos { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        GridPos::new(self.x + dx, self.y + dy)
    }
}

impl From<[i32; 2]> for GridPos {
    fn from([x, y]: [i32; 2]) -> Self {
        GridPos { x, y }
    }
}

impl From<GridPos> for [i32; 2] {
    fn from(pos: GridPos) -> Self {
        [pos.x, pos.y]
    }
}

impl From<(i32, i32)> for GridPos {
    fn from((x, y): (i32, i32)) -> Self {
        GridPos { x, y }
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Fixed-size, row-major grid of optional tiles.
///
/// Every write is bounds-checked; out-of-bounds writes fail with
/// [`LevelError::OutOfBounds`] and leave the grid untouched. The only way to
/// change the dimensions is [`TileGrid::resize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    cells: Vec<Option<Tile>>,
}

impl TileGrid {
    /// Creates an empty grid. Dimensions must be within
    /// `1..=MAX_ROOM_WIDTH` x `1..=MAX_ROOM_HEIGHT`.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(TileGrid {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        })
    }

    /// Creates a grid with every cell set to `tile`.
    pub fn filled(width: u32, height: u32, tile: Tile) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(TileGrid {
            width,
            height,
            cells: vec![Some(tile); width as usize * height as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// True for cells on the outermost ring.
    pub fn is_boundary(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y)
            && (x == 0 || y == 0 || x as u32 == self.width - 1 || y as u32 == self.height - 1)
    }

    fn index(&self, x: i32, y: i32) -> Result<usize> {
        if self.in_bounds(x, y) {
            Ok(y as usize * self.width as usize + x as usize)
        } else {
            Err(LevelError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Returns the tile at `(x, y)`, `None` for an empty cell.
    pub fn get(&self, x: i32, y: i32) -> Result<Option<&Tile>> {
        let idx = self.index(x, y)?;
        Ok(self.cells[idx].as_ref())
    }

    /// Lenient lookup for queries: out-of-bounds reads as empty.
    pub fn tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.get(x, y).ok().flatten()
    }

    pub fn tile_id(&self, x: i32, y: i32) -> Option<&TileId> {
        self.tile(x, y).map(|t| &t.id)
    }

    /// Writes a cell and returns what was there before.
    pub fn set(&mut self, x: i32, y: i32, tile: Option<Tile>) -> Result<Option<Tile>> {
        let idx = self.index(x, y)?;
        Ok(std::mem::replace(&mut self.cells[idx], tile))
    }

    pub fn clear(&mut self, x: i32, y: i32) -> Result<Option<Tile>> {
        self.set(x, y, None)
    }

    /// Changes the dimensions, keeping the overlapping region. New cells
    /// start empty.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        check_dimensions(width, height)?;
        let mut cells = vec![None; width as usize * height as usize];
        let keep_w = self.width.min(width) as usize;
        let keep_h = self.height.min(height) as usize;
        for y in 0..keep_h {
            for x in 0..keep_w {
                let old = y * self.width as usize + x;
                cells[y * width as usize + x] = self.cells[old].take();
            }
        }
        self.width = width;
        self.height = height;
        self.cells = cells;
        Ok(())
    }

    /// Sets every cell on the outer ring.
    pub fn fill_border(&mut self, tile: &Tile) {
        let (w, h) = (self.width as i32, self.height as i32);
        for x in 0..w {
            self.cells[x as usize] = Some(tile.clone());
            self.cells[((h - 1) * w + x) as usize] = Some(tile.clone());
        }
        for y in 0..h {
            self.cells[(y * w) as usize] = Some(tile.clone());
            self.cells[(y * w + w - 1) as usize] = Some(tile.clone());
        }
    }

    /// Row-major iteration over every cell.
    pub fn cells(&self) -> impl Iterator<Item = (GridPos, Option<&Tile>)> + '_ {
        let w = self.width as usize;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (GridPos::new((i % w) as i32, (i / w) as i32), cell.as_ref()))
    }

    /// Positions of the outer ring, clockwise from the top-left corner.
    pub fn boundary_positions(&self) -> Vec<GridPos> {
        let (w, h) = (self.width as i32, self.height as i32);
        let mut ring = Vec::new();
        for x in 0..w {
            ring.push(GridPos::new(x, 0));
        }
        for y in 1..h {
            ring.push(GridPos::new(w - 1, y));
        }
        if h > 1 {
            for x in (0..w - 1).rev() {
                ring.push(GridPos::new(x, h - 1));
            }
        }
        if w > 1 {
            for y in (1..h - 1).rev() {
                ring.push(GridPos::new(0, y));
            }
        }
        ring
    }

    /// Number of cells holding a tile with the given id.
    pub fn count(&self, name: &str) -> usize {
        self.cells
            .iter()
            .filter(|c| c.as_ref().is_some_and(|t| t.is(name)))
            .count()
    }

    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Rows of tile ids, used by the snapshot encoder.
    pub fn rows(&self) -> Vec<Vec<Option<TileId>>> {
        self.cells
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|c| c.as_ref().map(|t| t.id.clone())).collect())
            .collect()
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(LevelError::InvalidDimensions {
            width,
            height,
            reason: "grid must be at least 1x1".into(),
        });
    }
    if width > MAX_ROOM_WIDTH || height > MAX_ROOM_HEIGHT {
        return Err(LevelError::InvalidDimensions {
            width,
            height,
            reason: format!("grid may be at most {}x{}", MAX_ROOM_WIDTH, MAX_ROOM_HEIGHT),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get_in_bounds() {
        let mut grid = TileGrid::new(5, 4).unwrap();
        for y in 0..4 {
            for x in 0..5 {
                grid.set(x, y, Some(Tile::new("lava"))).unwrap();
                assert_eq!(grid.tile_id(x, y), Some(&TileId::from("lava")));
            }
        }
    }

    #[test]
    fn test_out_of_bounds_rejected_and_grid_unchanged() {
        let mut grid = TileGrid::new(3, 3).unwrap();
        grid.set(1, 1, Some(Tile::new(TileId::FLOOR))).unwrap();
        let before = grid.clone();
        for (x, y) in [(-1, 0), (0, -1), (3, 0), (0, 3), (100, 100)] {
            let err = grid.set(x, y, Some(Tile::new("wall"))).unwrap_err();
            assert!(matches!(err, LevelError::OutOfBounds { .. }));
        }
        assert_eq!(grid, before);
    }

    #[test]
    fn test_get_unset_is_empty() {
        let grid = TileGrid::new(2, 2).unwrap();
        assert_eq!(grid.get(1, 1).unwrap(), None);
        assert!(grid.get(2, 1).is_err());
        assert_eq!(grid.tile(-5, 0), None);
    }

    #[test]
    fn test_clear_returns_previous() {
        let mut grid = TileGrid::new(2, 2).unwrap();
        grid.set(0, 1, Some(Tile::new("door"))).unwrap();
        let old = grid.clear(0, 1).unwrap();
        assert_eq!(old, Some(Tile::new("door")));
        assert_eq!(grid.get(0, 1).unwrap(), None);
    }

    #[test]
    fn test_resize_preserves_overlap() {
        let mut grid = TileGrid::new(4, 4).unwrap();
        grid.set(1, 1, Some(Tile::new("a"))).unwrap();
        grid.set(3, 3, Some(Tile::new("b"))).unwrap();

        grid.resize(2, 6).unwrap();
        assert_eq!((grid.width(), grid.height()), (2, 6));
        assert_eq!(grid.tile_id(1, 1), Some(&TileId::from("a")));
        assert_eq!(grid.occupied(), 1);
        assert_eq!(grid.tile(1, 5), None);
    }

    #[test]
    fn test_resize_rejects_zero() {
        let mut grid = TileGrid::new(4, 4).unwrap();
        assert!(matches!(
            grid.resize(0, 3),
            Err(LevelError::InvalidDimensions { .. })
        ));
        assert_eq!((grid.width(), grid.height()), (4, 4));
        assert!(TileGrid::new(1, 0).is_err());
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        assert!(matches!(
            TileGrid::new(MAX_ROOM_WIDTH + 1, 4),
            Err(LevelError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            TileGrid::filled(4, u32::MAX, Tile::new(TileId::WALL)),
            Err(LevelError::InvalidDimensions { .. })
        ));
        let mut grid = TileGrid::new(MAX_ROOM_WIDTH, MAX_ROOM_HEIGHT).unwrap();
        assert!(matches!(
            grid.resize(MAX_ROOM_WIDTH, MAX_ROOM_HEIGHT + 1),
            Err(LevelError::InvalidDimensions { .. })
        ));
        assert_eq!((grid.width(), grid.height()), (MAX_ROOM_WIDTH, MAX_ROOM_HEIGHT));
    }

    #[test]
    fn test_boundary_ring() {
        let grid = TileGrid::new(4, 3).unwrap();
        let ring = grid.boundary_positions();
        assert_eq!(ring.len(), 2 * 4 + 2 * 3 - 4);
        assert!(ring.iter().all(|p| grid.is_boundary(p.x, p.y)));
        assert!(!grid.is_boundary(1, 1));

        let single = TileGrid::new(1, 1).unwrap();
        assert_eq!(single.boundary_positions(), vec![GridPos::new(0, 0)]);
    }

    #[test]
    fn test_fill_border_and_count() {
        let mut grid = TileGrid::filled(5, 5, Tile::new("floor")).unwrap();
        grid.fill_border(&Tile::new("wall"));
        assert_eq!(grid.count("wall"), 16);
        assert_eq!(grid.count("floor"), 9);
    }

    #[test]
    fn test_grid_pos_serializes_as_pair() {
        let json = serde_json::to_string(&GridPos::new(3, -1)).unwrap();
        assert_eq!(json, "[3,-1]");
        let back: GridPos = serde_json::from_str("[7,2]").unwrap();
        assert_eq!(back, GridPos::new(7, 2));
    }
}
