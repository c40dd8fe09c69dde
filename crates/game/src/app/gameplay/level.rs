use std::path::{Path, PathBuf};

use engine::{LevelError, Placement, TileKind, TileMap, Vec2};
use tracing::debug;

use super::effects::LeafEmitter;

const TREE: (TileKind, u32) = (TileKind::LargeDecor, 2);
const PLAYER_SPAWNER: (TileKind, u32) = (TileKind::Spawners, 0);
const ENEMY_SPAWNER: (TileKind, u32) = (TileKind::Spawners, 1);
const DEFAULT_PLAYER_SPAWN: Vec2 = Vec2::new(50.0, 50.0);

/// Where gameplay reads its numbered levels from.
pub(crate) trait LevelSource {
    fn level_count(&self) -> usize;
    fn load_level(&self, index: usize) -> Result<TileMap, LevelError>;
}

/// `maps/0.json`, `maps/1.json`, ... up to the first missing index.
#[derive(Debug, Clone)]
pub(crate) struct DirectoryLevels {
    maps_dir: PathBuf,
    count: usize,
}

impl DirectoryLevels {
    pub(crate) fn discover(maps_dir: &Path) -> Self {
        let count = (0..)
            .take_while(|index| level_path(maps_dir, *index).is_file())
            .count();
        debug!(maps_dir = %maps_dir.display(), count, "levels_discovered");
        Self {
            maps_dir: maps_dir.to_path_buf(),
            count,
        }
    }

    pub(crate) fn path_for(&self, index: usize) -> PathBuf {
        level_path(&self.maps_dir, index)
    }
}

impl LevelSource for DirectoryLevels {
    fn level_count(&self) -> usize {
        self.count
    }

    fn load_level(&self, index: usize) -> Result<TileMap, LevelError> {
        TileMap::load(&self.path_for(index))
    }
}

pub(crate) fn level_path(maps_dir: &Path, index: usize) -> PathBuf {
    maps_dir.join(format!("{index}.json"))
}

/// A loaded level with its spawn markers taken out of the tile store.
#[derive(Debug, Clone)]
pub(crate) struct LevelLayout {
    pub(crate) tiles: TileMap,
    pub(crate) player_spawn: Vec2,
    pub(crate) enemy_spawns: Vec<Vec2>,
    pub(crate) leaf_emitters: Vec<LeafEmitter>,
}

impl LevelLayout {
    /// Trees stay in the map as scenery; spawners are removed.
    pub(crate) fn from_tiles(mut tiles: TileMap) -> Self {
        let leaf_emitters = tiles
            .extract(&[TREE], true)
            .into_iter()
            .map(|tree| LeafEmitter::around_tree(tree.position))
            .collect();

        let mut player_spawn = DEFAULT_PLAYER_SPAWN;
        let mut enemy_spawns = Vec::new();
        for Placement {
            kind,
            variant,
            position,
        } in tiles.extract(&[PLAYER_SPAWNER, ENEMY_SPAWNER], false)
        {
            if (kind, variant) == PLAYER_SPAWNER {
                player_spawn = position;
            } else {
                enemy_spawns.push(position);
            }
        }

        Self {
            tiles,
            player_spawn,
            enemy_spawns,
            leaf_emitters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::Cell;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn discover_counts_contiguous_levels() {
        let dir = TempDir::new().expect("tempdir");
        let map = TileMap::new(16);
        for index in [0, 1, 3] {
            map.save(&level_path(dir.path(), index)).expect("save");
        }
        fs::write(dir.path().join("notes.txt"), "x").expect("write");

        let levels = DirectoryLevels::discover(dir.path());
        assert_eq!(levels.level_count(), 2);
        assert!(levels.load_level(1).expect("level 1").is_empty());
        assert!(matches!(levels.load_level(2), Err(LevelError::Read { .. })));
    }

    #[test]
    fn layout_pulls_out_spawners_and_keeps_trees() {
        let mut tiles = TileMap::new(16);
        tiles.set(Cell::new(0, 2), TileKind::Grass, 1);
        tiles.set(Cell::new(2, 1), TileKind::Spawners, 0);
        tiles.set(Cell::new(5, 1), TileKind::Spawners, 1);
        tiles.push_decoration(TileKind::Spawners, 1, Vec2::new(100.0, 12.0));
        tiles.push_decoration(TileKind::LargeDecor, 2, Vec2::new(40.0, 0.0));

        let layout = LevelLayout::from_tiles(tiles);
        assert_eq!(layout.player_spawn, Vec2::new(32.0, 16.0));
        assert_eq!(layout.enemy_spawns.len(), 2);
        assert!(layout.enemy_spawns.contains(&Vec2::new(80.0, 16.0)));
        assert!(layout.enemy_spawns.contains(&Vec2::new(100.0, 12.0)));
        assert_eq!(layout.leaf_emitters, vec![LeafEmitter::around_tree(Vec2::new(40.0, 0.0))]);
        assert_eq!(layout.tiles.len(), 1);
        assert_eq!(layout.tiles.offgrid().len(), 1);
    }

    #[test]
    fn missing_player_spawner_uses_default() {
        let layout = LevelLayout::from_tiles(TileMap::new(16));
        assert_eq!(layout.player_spawn, DEFAULT_PLAYER_SPAWN);
        assert!(layout.enemy_spawns.is_empty());
    }
}
