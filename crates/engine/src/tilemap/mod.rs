//! Sparse tile grid plus free-floating decorations.
//!
//! Cells are keyed by integer grid coordinates; a cell holds at most one
//! tile. Decorations live outside the grid at pixel positions. Every moving
//! body queries this store each tick, but only ever through the 3x3
//! neighborhood around its position, never through a whole-map scan.

mod autotile;
mod document;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Vec2};

pub use document::LevelError;

pub const DEFAULT_TILE_SIZE: u32 = 16;

/// Self plus the 8 surrounding cells.
const NEIGHBOR_OFFSETS: [(i32, i32); 9] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (0, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Decor,
    Grass,
    LargeDecor,
    Stone,
    Spawners,
}

impl TileKind {
    pub const ALL: [TileKind; 5] = [
        TileKind::Decor,
        TileKind::Grass,
        TileKind::LargeDecor,
        TileKind::Stone,
        TileKind::Spawners,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            TileKind::Decor => "decor",
            TileKind::Grass => "grass",
            TileKind::LargeDecor => "large_decor",
            TileKind::Stone => "stone",
            TileKind::Spawners => "spawners",
        }
    }

    /// Tiles bodies collide with.
    pub const fn is_physics(self) -> bool {
        matches!(self, TileKind::Grass | TileKind::Stone)
    }

    pub const fn is_autotiled(self) -> bool {
        matches!(self, TileKind::Grass | TileKind::Stone)
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// `None` past the edge of the coordinate space.
    pub fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }

    /// Canonical `"<x>;<y>"` key used by level documents.
    pub fn key(self) -> String {
        format!("{};{}", self.x, self.y)
    }

    pub fn parse_key(key: &str) -> Option<Self> {
        let (x, y) = key.split_once(';')?;
        Some(Self::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub kind: TileKind,
    pub variant: u32,
    pub cell: Cell,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoration {
    pub kind: TileKind,
    pub variant: u32,
    pub position: Vec2,
}

/// A tile or decoration copied out of the store, always in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub kind: TileKind,
    pub variant: u32,
    pub position: Vec2,
}

/// Inclusive range of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

impl CellRange {
    pub fn cells(self) -> impl Iterator<Item = Cell> {
        (self.x_min..=self.x_max)
            .flat_map(move |x| (self.y_min..=self.y_max).map(move |y| Cell::new(x, y)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileMap {
    tile_size: u32,
    tiles: HashMap<Cell, Tile>,
    offgrid: Vec<Decoration>,
}

impl Default for TileMap {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SIZE)
    }
}

impl TileMap {
    pub fn new(tile_size: u32) -> Self {
        Self {
            tile_size: tile_size.max(1),
            tiles: HashMap::new(),
            offgrid: Vec::new(),
        }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty() && self.offgrid.is_empty()
    }

    /// Places a tile, returning whatever the cell held before.
    pub fn set(&mut self, cell: Cell, kind: TileKind, variant: u32) -> Option<Tile> {
        self.tiles.insert(
            cell,
            Tile {
                kind,
                variant,
                cell,
            },
        )
    }

    pub fn remove(&mut self, cell: Cell) -> Option<Tile> {
        self.tiles.remove(&cell)
    }

    pub fn get(&self, cell: Cell) -> Option<&Tile> {
        self.tiles.get(&cell)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn offgrid(&self) -> &[Decoration] {
        &self.offgrid
    }

    pub fn push_decoration(&mut self, kind: TileKind, variant: u32, position: Vec2) {
        self.offgrid.push(Decoration {
            kind,
            variant,
            position,
        });
    }

    pub fn remove_decorations_where(&mut self, mut predicate: impl FnMut(&Decoration) -> bool) -> usize {
        let before = self.offgrid.len();
        self.offgrid.retain(|decoration| !predicate(decoration));
        before - self.offgrid.len()
    }

    /// Cell containing a pixel position (floor division, so negatives round down).
    pub fn cell_at(&self, position: Vec2) -> Cell {
        let size = self.tile_size as f32;
        Cell::new(
            (position.x / size).floor() as i32,
            (position.y / size).floor() as i32,
        )
    }

    pub fn cell_origin(&self, cell: Cell) -> Vec2 {
        let size = self.tile_size as f32;
        Vec2::new(cell.x as f32 * size, cell.y as f32 * size)
    }

    pub fn cell_rect(&self, cell: Cell) -> Rect {
        let size = self.tile_size as f32;
        Rect::from_position_size(self.cell_origin(cell), Vec2::new(size, size))
    }

    /// Tiles present in the 3x3 block of cells around `position`.
    pub fn neighbors(&self, position: Vec2) -> impl Iterator<Item = &Tile> + '_ {
        let center = self.cell_at(position);
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |&(dx, dy)| self.tiles.get(&center.offset(dx, dy)?))
    }

    /// World boxes of the collidable tiles around `position`.
    pub fn physics_rects(&self, position: Vec2) -> impl Iterator<Item = Rect> + '_ {
        self.neighbors(position)
            .filter(|tile| tile.kind.is_physics())
            .map(move |tile| self.cell_rect(tile.cell))
    }

    /// Single-cell lookup, `Some` only for a collidable tile.
    pub fn solid_at(&self, position: Vec2) -> Option<&Tile> {
        self.tiles
            .get(&self.cell_at(position))
            .filter(|tile| tile.kind.is_physics())
    }

    /// Copies out every tile and decoration matching one of `id_pairs`.
    ///
    /// Grid tiles come back with their cell converted to pixels. With
    /// `keep == false` the matches are removed from the store.
    pub fn extract(&mut self, id_pairs: &[(TileKind, u32)], keep: bool) -> Vec<Placement> {
        let wanted = |kind: TileKind, variant: u32| id_pairs.contains(&(kind, variant));
        let mut matches: Vec<Placement> = self
            .offgrid
            .iter()
            .filter(|decoration| wanted(decoration.kind, decoration.variant))
            .map(|decoration| Placement {
                kind: decoration.kind,
                variant: decoration.variant,
                position: decoration.position,
            })
            .collect();
        if !keep {
            self.offgrid
                .retain(|decoration| !wanted(decoration.kind, decoration.variant));
        }

        let mut cells: Vec<Cell> = self
            .tiles
            .values()
            .filter(|tile| wanted(tile.kind, tile.variant))
            .map(|tile| tile.cell)
            .collect();
        cells.sort();
        for cell in cells {
            let tile = if keep {
                self.tiles.get(&cell).copied()
            } else {
                self.tiles.remove(&cell)
            };
            if let Some(tile) = tile {
                matches.push(Placement {
                    kind: tile.kind,
                    variant: tile.variant,
                    position: self.cell_origin(tile.cell),
                });
            }
        }
        matches
    }

    /// Cells overlapping a view rectangle, padded by one cell on every side.
    pub fn visible_cells(&self, view_origin: Vec2, view_size: Vec2) -> CellRange {
        let size = self.tile_size as f32;
        CellRange {
            x_min: ((view_origin.x / size).floor() as i32).saturating_sub(1),
            x_max: (((view_origin.x + view_size.x) / size).ceil() as i32).saturating_add(1),
            y_min: ((view_origin.y / size).floor() as i32).saturating_sub(1),
            y_max: (((view_origin.y + view_size.y) / size).ceil() as i32).saturating_add(1),
        }
    }

    pub fn tiles_in_view(&self, view_origin: Vec2, view_size: Vec2) -> impl Iterator<Item = &Tile> + '_ {
        self.visible_cells(view_origin, view_size)
            .cells()
            .filter_map(move |cell| self.tiles.get(&cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_strip() -> TileMap {
        let mut map = TileMap::new(16);
        for x in -2..=2 {
            map.set(Cell::new(x, 1), TileKind::Grass, 1);
        }
        map.set(Cell::new(0, -1), TileKind::Decor, 0);
        map
    }

    #[test]
    fn cell_key_round_trips_negative_coordinates() {
        let cell = Cell::new(-3, 12);
        assert_eq!(cell.key(), "-3;12");
        assert_eq!(Cell::parse_key("-3;12"), Some(cell));
        assert_eq!(Cell::parse_key("3,12"), None);
        assert_eq!(Cell::parse_key("a;1"), None);
    }

    #[test]
    fn cell_at_floors_negative_positions() {
        let map = TileMap::new(16);
        assert_eq!(map.cell_at(Vec2::new(-0.5, 15.9)), Cell::new(-1, 0));
        assert_eq!(map.cell_at(Vec2::new(32.0, -16.0)), Cell::new(2, -1));
    }

    #[test]
    fn set_replaces_existing_tile_in_cell() {
        let mut map = TileMap::new(16);
        assert!(map.set(Cell::new(0, 0), TileKind::Grass, 0).is_none());
        let previous = map.set(Cell::new(0, 0), TileKind::Stone, 3).expect("previous");
        assert_eq!(previous.kind, TileKind::Grass);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(Cell::new(0, 0)).map(|tile| tile.kind), Some(TileKind::Stone));
    }

    #[test]
    fn neighbors_cover_only_the_surrounding_block() {
        let map = floor_strip();
        let found: Vec<Cell> = map
            .neighbors(Vec2::new(4.0, 4.0))
            .map(|tile| tile.cell)
            .collect();
        assert_eq!(found.len(), 4);
        assert!(found.contains(&Cell::new(-1, 1)));
        assert!(found.contains(&Cell::new(0, 1)));
        assert!(found.contains(&Cell::new(1, 1)));
        assert!(found.contains(&Cell::new(0, -1)));
        assert!(!found.contains(&Cell::new(2, 1)));
    }

    #[test]
    fn neighbors_stop_at_the_coordinate_edge() {
        assert_eq!(Cell::new(i32::MAX, 0).offset(1, 0), None);
        assert_eq!(Cell::new(0, i32::MIN).offset(0, -1), None);
        assert_eq!(Cell::new(3, 4).offset(-1, 1), Some(Cell::new(2, 5)));

        let mut map = TileMap::new(16);
        map.set(Cell::new(i32::MAX, 0), TileKind::Stone, 0);
        map.set(Cell::new(i32::MIN, 0), TileKind::Stone, 0);
        let edge = Vec2::new(f32::MAX, 8.0);
        let found: Vec<Cell> = map.neighbors(edge).map(|tile| tile.cell).collect();
        assert_eq!(found, vec![Cell::new(i32::MAX, 0)]);
    }

    #[test]
    fn physics_rects_skip_decorative_tiles() {
        let map = floor_strip();
        let rects: Vec<Rect> = map.physics_rects(Vec2::new(4.0, 4.0)).collect();
        assert_eq!(rects.len(), 3);
        assert!(rects.contains(&Rect::new(-16.0, 16.0, 16.0, 16.0)));
        assert!(rects.iter().all(|rect| rect.y == 16.0));
    }

    #[test]
    fn queries_on_empty_space_return_nothing() {
        let map = floor_strip();
        assert_eq!(map.neighbors(Vec2::new(1000.0, 1000.0)).count(), 0);
        assert_eq!(map.physics_rects(Vec2::new(-900.0, 4.0)).count(), 0);
        assert!(map.solid_at(Vec2::new(1000.0, 1000.0)).is_none());
    }

    #[test]
    fn solid_at_is_a_single_cell_lookup() {
        let map = floor_strip();
        assert!(map.solid_at(Vec2::new(8.0, 20.0)).is_some());
        assert!(map.solid_at(Vec2::new(8.0, 8.0)).is_none());
        assert!(map.solid_at(Vec2::new(8.0, -8.0)).is_none(), "decor is not solid");
    }

    #[test]
    fn extract_removes_matches_from_grid_and_offgrid() {
        let mut map = TileMap::new(16);
        map.set(Cell::new(3, 2), TileKind::Spawners, 1);
        map.set(Cell::new(4, 2), TileKind::Grass, 1);
        map.push_decoration(TileKind::Spawners, 1, Vec2::new(10.5, 7.25));
        map.push_decoration(TileKind::LargeDecor, 2, Vec2::new(40.0, 40.0));

        let found = map.extract(&[(TileKind::Spawners, 1)], false);
        assert_eq!(found.len(), 2);
        assert!(found.contains(&Placement {
            kind: TileKind::Spawners,
            variant: 1,
            position: Vec2::new(10.5, 7.25),
        }));
        assert!(found.contains(&Placement {
            kind: TileKind::Spawners,
            variant: 1,
            position: Vec2::new(48.0, 32.0),
        }));
        assert!(map.get(Cell::new(3, 2)).is_none());
        assert_eq!(map.offgrid().len(), 1);
        assert!(map.get(Cell::new(4, 2)).is_some());

        assert!(map.extract(&[(TileKind::Spawners, 1)], false).is_empty());
    }

    #[test]
    fn extract_with_keep_leaves_store_untouched() {
        let mut map = TileMap::new(16);
        map.push_decoration(TileKind::LargeDecor, 2, Vec2::new(40.0, 40.0));
        map.set(Cell::new(1, 1), TileKind::LargeDecor, 2);
        let before = map.clone();

        let found = map.extract(&[(TileKind::LargeDecor, 2)], true);
        assert_eq!(found.len(), 2);
        assert_eq!(map, before);
    }

    #[test]
    fn extract_ignores_other_variants() {
        let mut map = TileMap::new(16);
        map.set(Cell::new(0, 0), TileKind::Spawners, 0);
        map.set(Cell::new(1, 0), TileKind::Spawners, 1);
        let found = map.extract(&[(TileKind::Spawners, 0)], false);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].position, Vec2::ZERO);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn visible_cells_pad_the_view_by_one_cell() {
        let map = TileMap::new(16);
        let range = map.visible_cells(Vec2::new(-8.0, 0.0), Vec2::new(320.0, 240.0));
        assert_eq!(
            range,
            CellRange {
                x_min: -2,
                x_max: 21,
                y_min: -1,
                y_max: 16,
            }
        );
    }

    #[test]
    fn tiles_in_view_skips_far_tiles() {
        let mut map = TileMap::new(16);
        map.set(Cell::new(2, 2), TileKind::Stone, 0);
        map.set(Cell::new(500, 2), TileKind::Stone, 0);
        let seen: Vec<Cell> = map
            .tiles_in_view(Vec2::ZERO, Vec2::new(320.0, 240.0))
            .map(|tile| tile.cell)
            .collect();
        assert_eq!(seen, vec![Cell::new(2, 2)]);
    }

    #[test]
    fn remove_decorations_reports_count() {
        let mut map = TileMap::new(16);
        map.push_decoration(TileKind::Decor, 0, Vec2::new(1.0, 1.0));
        map.push_decoration(TileKind::Decor, 1, Vec2::new(50.0, 1.0));
        let removed = map.remove_decorations_where(|decoration| decoration.position.x < 10.0);
        assert_eq!(removed, 1);
        assert_eq!(map.offgrid().len(), 1);
    }
}
