// src/editor/generator.rs

use std::collections::HashMap;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use union_find::{QuickUnionUf, UnionBySize, UnionFind};

use crate::error::{LevelError, Result};
use crate::map::{
    Direction, GridPos, Passage, PassageKind, Room, RoomId, Tile, TileGrid, TileId,
    MAX_ROOM_HEIGHT, MAX_ROOM_WIDTH,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
    /// Chance that a door-eligible wall cell becomes a door.
    pub door_chance: f64,
    /// Chance, per side, that the room gets an edge opening.
    pub edge_passage_chance: f64,
    /// Chance that a room is split by an interior wall.
    pub partition_chance: f64,
    /// Force one door when eligible cells exist but none was rolled, so a
    /// partitioned room stays connected.
    pub ensure_internal_door: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            min_width: 16,
            max_width: 64,
            min_height: 12,
            max_height: 48,
            door_chance: 0.1,
            edge_passage_chance: 0.75,
            partition_chance: 0.0,
            ensure_internal_door: false,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_width < 3 || self.min_height < 3 {
            return Err(LevelError::Config(
                "rooms need at least 3x3 cells to have an interior".into(),
            ));
        }
        if self.max_width > MAX_ROOM_WIDTH || self.max_height > MAX_ROOM_HEIGHT {
            return Err(LevelError::Config(format!(
                "size bounds {}x{} exceed the {}x{} room limit",
                self.max_width, self.max_height, MAX_ROOM_WIDTH, MAX_ROOM_HEIGHT
            )));
        }
        if self.min_width > self.max_width || self.min_height > self.max_height {
            return Err(LevelError::Config(format!(
                "inverted size bounds {}..{} x {}..{}",
                self.min_width, self.max_width, self.min_height, self.max_height
            )));
        }
        for (name, p) in [
            ("door_chance", self.door_chance),
            ("edge_passage_chance", self.edge_passage_chance),
            ("partition_chance", self.partition_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(LevelError::Config(format!("{} must be within [0, 1], got {}", name, p)));
            }
        }
        Ok(())
    }
}

/// Link between two rooms of a dungeon, recorded once per stitched pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub from: RoomId,
    pub from_position: GridPos,
    pub to: RoomId,
    pub to_position: GridPos,
    pub kind: PassageKind,
}

/// Rooms laid out on a square slot grid, row-major, and the links between
/// horizontally or vertically adjacent slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dungeon {
    pub seed: u64,
    pub columns: usize,
    pub rooms: Vec<Room>,
    pub connections: Vec<Connection>,
}

impl Dungeon {
    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| &r.id == id)
    }

    /// Number of groups of rooms reachable from each other through links.
    pub fn connected_components(&self) -> usize {
        if self.rooms.is_empty() {
            return 0;
        }
        let index: HashMap<&RoomId, usize> =
            self.rooms.iter().enumerate().map(|(i, r)| (&r.id, i)).collect();
        let mut sets = QuickUnionUf::<UnionBySize>::new(self.rooms.len());
        for conn in &self.connections {
            if let (Some(&a), Some(&b)) = (index.get(&conn.from), index.get(&conn.to)) {
                sets.union(a, b);
            }
        }
        let mut roots: Vec<usize> = (0..self.rooms.len()).map(|i| sets.find(i)).collect();
        roots.sort_unstable();
        roots.dedup();
        roots.len()
    }

    pub fn is_fully_connected(&self) -> bool {
        self.connected_components() <= 1
    }

    /// Edge passages that did not find a partner.
    pub fn dead_ends(&self) -> usize {
        self.rooms
            .iter()
            .flat_map(|r| r.passages.iter())
            .filter(|p| p.kind == PassageKind::Edge && !p.is_linked())
            .count()
    }
}

/// Procedural room and dungeon layouts.
///
/// Output depends only on the seed and the config: the same inputs give
/// bit-identical rooms. Without a seed one is drawn from the thread RNG and
/// recorded on the room.
#[derive(Debug, Clone)]
pub struct RoomGenerator {
    config: GeneratorConfig,
}

impl RoomGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(RoomGenerator { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<()> {
        let c = &self.config;
        if !(c.min_width..=c.max_width).contains(&width)
            || !(c.min_height..=c.max_height).contains(&height)
        {
            return Err(LevelError::InvalidDimensions {
                width,
                height,
                reason: format!(
                    "rooms must be {}..={} x {}..={}",
                    c.min_width, c.max_width, c.min_height, c.max_height
                ),
            });
        }
        Ok(())
    }

    /// Deterministic room of the given size.
    pub fn generate(&self, seed: u64, width: u32, height: u32) -> Result<Room> {
        self.generate_room(RoomId::indexed(0), Some(seed), width, height)
    }

    pub fn generate_room(
        &self,
        id: RoomId,
        seed: Option<u64>,
        width: u32,
        height: u32,
    ) -> Result<Room> {
        self.check_dimensions(width, height)?;
        let seed = seed.unwrap_or_else(rand::random);
        info!("Generating {}x{} room {} with seed {}", width, height, id, seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut room = self.layout(&mut rng, id, width, height)?;
        room.seed = Some(seed);
        Ok(room)
    }

    /// Room whose size is also drawn from the configured bounds.
    pub fn generate_random(&self, id: RoomId, seed: Option<u64>) -> Result<Room> {
        let seed = seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let (width, height) = self.pick_dimensions(&mut rng);
        debug!("Room {} picked size {}x{} from seed {}", id, width, height, seed);
        let mut room = self.layout(&mut rng, id, width, height)?;
        room.seed = Some(seed);
        Ok(room)
    }

    /// Generates `num_rooms` independent rooms and stitches neighbours
    /// together through matching edge passages.
    pub fn generate_dungeon(&self, num_rooms: usize, seed: Option<u64>) -> Result<Dungeon> {
        let seed = seed.unwrap_or_else(rand::random);
        let columns = (num_rooms as f64).sqrt().ceil().max(1.0) as usize;
        info!("Generating dungeon of {} rooms with seed {}", num_rooms, seed);

        // Each room owns its RNG, so parallel generation stays deterministic.
        let mut rooms = (0..num_rooms)
            .into_par_iter()
            .map(|i| self.generate_random(RoomId::indexed(i), Some(room_seed(seed, i))))
            .collect::<Result<Vec<Room>>>()?;

        let mut connections = Vec::new();
        for i in 0..num_rooms {
            if i % columns + 1 < columns && i + 1 < num_rooms {
                connections.extend(stitch(&mut rooms, i, i + 1, Direction::Right));
            }
            if i + columns < num_rooms {
                connections.extend(stitch(&mut rooms, i, i + columns, Direction::Down));
            }
        }

        let dungeon = Dungeon {
            seed,
            columns,
            rooms,
            connections,
        };
        info!(
            "Dungeon stitched: {} links, {} dead ends, {} component(s)",
            dungeon.connections.len(),
            dungeon.dead_ends(),
            dungeon.connected_components()
        );
        Ok(dungeon)
    }

    fn pick_dimensions(&self, rng: &mut StdRng) -> (u32, u32) {
        let c = &self.config;
        let width = rng.random_range(c.min_width..=c.max_width);
        let height = rng.random_range(c.min_height..=c.max_height);
        (width, height)
    }

    fn layout(&self, rng: &mut StdRng, id: RoomId, width: u32, height: u32) -> Result<Room> {
        let mut grid = TileGrid::filled(width, height, Tile::new(TileId::FLOOR))?;
        grid.fill_border(&Tile::new(TileId::WALL));
        let mut room = Room::from_parts(id, grid, Default::default());

        if rng.random_bool(self.config.partition_chance) {
            add_partition(rng, &mut room.grid)?;
        }
        self.place_doors(rng, &mut room)?;
        self.place_edges(rng, &mut room)?;
        Ok(room)
    }

    /// Turns each door-eligible wall into a door with `door_chance`. With
    /// `ensure_internal_door`, one is forced when the dice picked none.
    fn place_doors(&self, rng: &mut StdRng, room: &mut Room) -> Result<()> {
        let eligible = door_candidates(&room.grid);
        let mut chosen: Vec<(GridPos, Direction)> = eligible
            .iter()
            .copied()
            .filter(|_| rng.random_bool(self.config.door_chance))
            .collect();
        if self.config.ensure_internal_door && chosen.is_empty() && !eligible.is_empty() {
            chosen.push(eligible[rng.random_range(0..eligible.len())]);
        }
        for (pos, direction) in chosen {
            room.grid.set(pos.x, pos.y, Some(Tile::new(TileId::DOOR)))?;
            room.add_passage(Passage::new(pos, direction, PassageKind::Door))?;
        }
        Ok(())
    }

    fn place_edges(&self, rng: &mut StdRng, room: &mut Room) -> Result<()> {
        for &direction in &[Direction::Up, Direction::Right, Direction::Down, Direction::Left] {
            if !rng.random_bool(self.config.edge_passage_chance) {
                continue;
            }
            let candidates = edge_candidates(&room.grid, direction);
            if candidates.is_empty() {
                continue;
            }
            let pos = candidates[rng.random_range(0..candidates.len())];
            room.grid
                .set(pos.x, pos.y, Some(Tile::from(PassageKind::Edge.tile_id())))?;
            room.add_passage(Passage::new(pos, direction, PassageKind::Edge))?;
        }
        Ok(())
    }
}

impl Default for RoomGenerator {
    fn default() -> Self {
        RoomGenerator {
            config: GeneratorConfig::default(),
        }
    }
}

fn room_seed(master: u64, index: usize) -> u64 {
    master ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Splits the interior with one straight wall, keeping at least one floor
/// column/row on each side.
fn add_partition(rng: &mut StdRng, grid: &mut TileGrid) -> Result<()> {
    let (w, h) = (grid.width() as i32, grid.height() as i32);
    let wall = Tile::new(TileId::WALL);
    let vertical = rng.random_bool(0.5);
    if vertical && w >= 5 {
        let cx = rng.random_range(2..=w - 3);
        for y in 1..h - 1 {
            grid.set(cx, y, Some(wall.clone()))?;
        }
    } else if h >= 5 {
        let cy = rng.random_range(2..=h - 3);
        for x in 1..w - 1 {
            grid.set(x, cy, Some(wall.clone()))?;
        }
    }
    Ok(())
}

fn is_floor(grid: &TileGrid, x: i32, y: i32) -> bool {
    grid.tile(x, y).is_some_and(|t| t.is(TileId::FLOOR))
}

/// Wall cells whose two opposite neighbours are both floor, in row-major
/// order, with the direction the doorway leads.
fn door_candidates(grid: &TileGrid) -> Vec<(GridPos, Direction)> {
    grid.cells()
        .filter(|(_, tile)| tile.is_some_and(|t| t.is(TileId::WALL)))
        .filter_map(|(pos, _)| {
            if is_floor(grid, pos.x - 1, pos.y) && is_floor(grid, pos.x + 1, pos.y) {
                Some((pos, Direction::Right))
            } else if is_floor(grid, pos.x, pos.y - 1) && is_floor(grid, pos.x, pos.y + 1) {
                Some((pos, Direction::Down))
            } else {
                None
            }
        })
        .collect()
}

/// Non-corner wall cells on one side whose inward neighbour is floor.
fn edge_candidates(grid: &TileGrid, side: Direction) -> Vec<GridPos> {
    let (w, h) = (grid.width() as i32, grid.height() as i32);
    let cells: Vec<GridPos> = match side {
        Direction::Up => (1..w - 1).map(|x| GridPos::new(x, 0)).collect(),
        Direction::Down => (1..w - 1).map(|x| GridPos::new(x, h - 1)).collect(),
        Direction::Left => (1..h - 1).map(|y| GridPos::new(0, y)).collect(),
        Direction::Right => (1..h - 1).map(|y| GridPos::new(w - 1, y)).collect(),
    };
    let (dx, dy) = side.opposite().delta();
    cells
        .into_iter()
        .filter(|p| grid.tile(p.x, p.y).is_some_and(|t| t.is(TileId::WALL)))
        .filter(|p| is_floor(grid, p.x + dx, p.y + dy))
        .collect()
}

/// Links a free edge of room `a` facing `direction` with a free edge of
/// room `b` facing back. Returns `None` when either side has no opening.
fn stitch(rooms: &mut [Room], a: usize, b: usize, direction: Direction) -> Option<Connection> {
    let free_edge = |room: &Room, dir: Direction| {
        room.passages
            .iter()
            .find(|p| p.kind == PassageKind::Edge && p.direction == dir && !p.is_linked())
            .map(|p| p.position)
    };
    let from_position = free_edge(&rooms[a], direction)?;
    let to_position = free_edge(&rooms[b], direction.opposite())?;
    let (from, to) = (rooms[a].id.clone(), rooms[b].id.clone());

    rooms[a]
        .passages
        .link(from_position, direction, to.clone(), to_position);
    rooms[b]
        .passages
        .link(to_position, direction.opposite(), from.clone(), from_position);
    debug!("Linked {} {} -> {} {}", from, from_position, to, to_position);

    Some(Connection {
        from,
        from_position,
        to,
        to_position,
        kind: PassageKind::Edge,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary_is_closed(room: &Room) -> bool {
        room.grid.boundary_positions().iter().all(|p| {
            room.grid
                .tile_id(p.x, p.y)
                .is_some_and(|id| id.is(TileId::WALL) || PassageKind::is_passage_tile(id))
        })
    }

    #[test]
    fn test_same_seed_same_room() {
        let generator = RoomGenerator::default();
        let a = generator.generate(7, 30, 20).unwrap();
        let b = generator.generate(7, 30, 20).unwrap();
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.passages, b.passages);
    }

    #[test]
    fn test_seed_42_scenario() {
        let generator = RoomGenerator::default();
        let room = generator.generate(42, 20, 15).unwrap();
        assert_eq!((room.width(), room.height()), (20, 15));
        assert_eq!(room.seed, Some(42));

        let mut interior_floor = 0;
        for y in 1..14 {
            for x in 1..19 {
                if room.grid.tile(x, y).is_some_and(|t| t.is(TileId::FLOOR)) {
                    interior_floor += 1;
                }
            }
        }
        assert_eq!(interior_floor, (20 - 2) * (15 - 2));
        assert_eq!(interior_floor, 234);
        assert!(boundary_is_closed(&room));

        let again = generator.generate(42, 20, 15).unwrap();
        let ring: Vec<_> = room
            .grid
            .boundary_positions()
            .iter()
            .map(|p| room.grid.tile_id(p.x, p.y).cloned())
            .collect();
        let ring_again: Vec<_> = again
            .grid
            .boundary_positions()
            .iter()
            .map(|p| again.grid.tile_id(p.x, p.y).cloned())
            .collect();
        assert_eq!(ring, ring_again);
    }

    #[test]
    fn test_boundaries_closed_across_seeds() {
        let generator = RoomGenerator::new(GeneratorConfig {
            partition_chance: 0.5,
            ..Default::default()
        })
        .unwrap();
        for seed in 0..40 {
            let room = generator
                .generate_random(RoomId::indexed(seed as usize), Some(seed))
                .unwrap();
            assert!(boundary_is_closed(&room), "seed {} left a hole", seed);
            for p in room.passages.iter() {
                assert!(room.can_host_passage(p.position).is_ok());
            }
        }
    }

    #[test]
    fn test_invalid_dimensions() {
        let generator = RoomGenerator::default();
        for (w, h) in [(15, 20), (65, 20), (20, 11), (20, 49), (0, 0)] {
            assert!(matches!(
                generator.generate(1, w, h),
                Err(LevelError::InvalidDimensions { .. })
            ));
        }
    }

    #[test]
    fn test_zero_door_chance_places_no_doors() {
        let generator = RoomGenerator::new(GeneratorConfig {
            partition_chance: 1.0,
            door_chance: 0.0,
            ..Default::default()
        })
        .unwrap();
        for seed in 0..10 {
            let room = generator.generate(seed, 20, 16).unwrap();
            assert_eq!(room.grid.count(TileId::DOOR), 0, "seed {}", seed);
            assert!(room.passages.iter().all(|p| p.kind != PassageKind::Door));
        }
    }

    #[test]
    fn test_ensure_internal_door_forces_one() {
        let generator = RoomGenerator::new(GeneratorConfig {
            partition_chance: 1.0,
            door_chance: 0.0,
            ensure_internal_door: true,
            ..Default::default()
        })
        .unwrap();
        for seed in 0..10 {
            let room = generator.generate(seed, 20, 16).unwrap();
            let doors: Vec<_> = room
                .passages
                .iter()
                .filter(|p| p.kind == PassageKind::Door)
                .collect();
            assert_eq!(doors.len(), 1, "seed {}", seed);
            let d = doors[0];
            assert!(room.grid.tile(d.position.x, d.position.y).unwrap().is(TileId::DOOR));
            assert!(!room.grid.is_boundary(d.position.x, d.position.y));
        }
    }

    #[test]
    fn test_plain_room_has_no_doors() {
        let generator = RoomGenerator::new(GeneratorConfig {
            door_chance: 1.0,
            ..Default::default()
        })
        .unwrap();
        let room = generator.generate(3, 16, 12).unwrap();
        assert_eq!(room.grid.count(TileId::DOOR), 0);
    }

    #[test]
    fn test_edge_passages_on_every_side() {
        let generator = RoomGenerator::new(GeneratorConfig {
            edge_passage_chance: 1.0,
            ..Default::default()
        })
        .unwrap();
        let room = generator.generate(11, 24, 18).unwrap();
        let mut sides: Vec<Direction> = room
            .passages
            .iter()
            .filter(|p| p.kind == PassageKind::Edge)
            .map(|p| p.direction)
            .collect();
        sides.sort();
        assert_eq!(
            sides,
            vec![Direction::Up, Direction::Down, Direction::Left, Direction::Right]
        );
        assert_eq!(room.grid.count(PassageKind::Edge.name()), 4);
    }

    #[test]
    fn test_dungeon_is_deterministic_and_linked() {
        let generator = RoomGenerator::new(GeneratorConfig {
            edge_passage_chance: 1.0,
            ..Default::default()
        })
        .unwrap();
        let a = generator.generate_dungeon(5, Some(99)).unwrap();
        let b = generator.generate_dungeon(5, Some(99)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.rooms.len(), 5);
        assert_eq!(a.columns, 3);
        // 3 columns: 0-1, 1-2, 3-4 horizontally; 0-3, 1-4 vertically.
        assert_eq!(a.connections.len(), 5);
        assert!(a.is_fully_connected());

        for conn in &a.connections {
            let from = a.room(&conn.from).unwrap();
            let to = a.room(&conn.to).unwrap();
            let out = from
                .passages
                .iter()
                .find(|p| p.position == conn.from_position)
                .unwrap();
            let back = to
                .passages
                .iter()
                .find(|p| p.position == conn.to_position)
                .unwrap();
            assert_eq!(out.target_room.as_ref(), Some(&conn.to));
            assert_eq!(out.target_position, Some(conn.to_position));
            assert_eq!(back.target_room.as_ref(), Some(&conn.from));
            assert_eq!(back.direction, out.direction.opposite());
        }
    }

    #[test]
    fn test_dungeon_without_edges_is_disconnected() {
        let generator = RoomGenerator::new(GeneratorConfig {
            edge_passage_chance: 0.0,
            ..Default::default()
        })
        .unwrap();
        let dungeon = generator.generate_dungeon(4, Some(5)).unwrap();
        assert!(dungeon.connections.is_empty());
        assert_eq!(dungeon.connected_components(), 4);
        assert_eq!(dungeon.dead_ends(), 0);
    }

    #[test]
    fn test_config_validation() {
        let bad = GeneratorConfig {
            door_chance: 1.5,
            ..Default::default()
        };
        assert!(matches!(RoomGenerator::new(bad), Err(LevelError::Config(_))));
        let inverted = GeneratorConfig {
            min_width: 40,
            max_width: 20,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_config_rejects_oversized_rooms() {
        let huge = GeneratorConfig {
            max_width: u32::MAX,
            max_height: u32::MAX,
            ..Default::default()
        };
        assert!(matches!(huge.validate(), Err(LevelError::Config(_))));
        let wide = GeneratorConfig {
            max_width: MAX_ROOM_WIDTH + 1,
            ..Default::default()
        };
        assert!(matches!(wide.validate(), Err(LevelError::Config(_))));
        let at_limit = GeneratorConfig {
            max_width: MAX_ROOM_WIDTH,
            max_height: MAX_ROOM_HEIGHT,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());
    }
}
