use tracing::debug;

use super::{Cell, TileMap};

const RIGHT: u8 = 0b0001;
const LEFT: u8 = 0b0010;
const UP: u8 = 0b0100;
const DOWN: u8 = 0b1000;

const AXIS_NEIGHBORS: [(i32, i32, u8); 4] = [(1, 0, RIGHT), (-1, 0, LEFT), (0, -1, UP), (0, 1, DOWN)];

/// Variant chosen for a set of same-kind axis neighbors.
///
/// Only nine combinations have an entry; any other set (isolated tiles,
/// straight runs) keeps whatever variant the tile already has.
fn variant_for_neighbors(mask: u8) -> Option<u32> {
    match mask {
        m if m == RIGHT | DOWN => Some(0),
        m if m == LEFT | RIGHT | DOWN => Some(1),
        m if m == LEFT | DOWN => Some(2),
        m if m == LEFT | UP | DOWN => Some(3),
        m if m == LEFT | UP => Some(4),
        m if m == LEFT | RIGHT | UP => Some(5),
        m if m == RIGHT | UP => Some(6),
        m if m == RIGHT | UP | DOWN => Some(7),
        m if m == LEFT | RIGHT | UP | DOWN => Some(8),
        _ => None,
    }
}

impl TileMap {
    /// Rewrites variants of autotiled kinds from their same-kind neighbors.
    ///
    /// Only variants change and the rule reads kinds, so the pass does not
    /// depend on visiting order. Returns how many tiles changed.
    pub fn autotile(&mut self) -> usize {
        let updates: Vec<(Cell, u32)> = self
            .tiles
            .values()
            .filter(|tile| tile.kind.is_autotiled())
            .filter_map(|tile| {
                let mask = AXIS_NEIGHBORS
                    .iter()
                    .filter(|(dx, dy, _)| {
                        tile.cell
                            .offset(*dx, *dy)
                            .and_then(|cell| self.tiles.get(&cell))
                            .is_some_and(|neighbor| neighbor.kind == tile.kind)
                    })
                    .fold(0u8, |mask, (_, _, bit)| mask | bit);
                let variant = variant_for_neighbors(mask)?;
                (variant != tile.variant).then_some((tile.cell, variant))
            })
            .collect();

        for (cell, variant) in &updates {
            if let Some(tile) = self.tiles.get_mut(cell) {
                tile.variant = *variant;
            }
        }
        debug!(changed = updates.len(), "autotile_pass");
        updates.len()
    }
}
