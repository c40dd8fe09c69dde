use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::geometry::Vec2;

use super::{Cell, Decoration, Tile, TileKind, TileMap};

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write level file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse level document {origin} at {at}: {source}")]
    Parse {
        origin: String,
        at: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode level document: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("invalid tilemap key '{key}', expected \"<x>;<y>\"")]
    InvalidCellKey { key: String },
    #[error("tile stored under '{key}' claims position [{x}, {y}]")]
    CellKeyMismatch { key: String, x: i32, y: i32 },
    #[error("tile_size must be positive")]
    ZeroTileSize,
}

#[derive(Debug, Serialize, Deserialize)]
struct LevelDocument {
    tilemap: BTreeMap<String, TileRecord>,
    tile_size: u32,
    offgrid: Vec<DecorationRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TileRecord {
    #[serde(rename = "type")]
    kind: TileKind,
    variant: u32,
    pos: [i32; 2],
}

#[derive(Debug, Serialize, Deserialize)]
struct DecorationRecord {
    #[serde(rename = "type")]
    kind: TileKind,
    variant: u32,
    pos: [f32; 2],
}

impl TileMap {
    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let raw = fs::read_to_string(path).map_err(|source| LevelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let map = Self::parse_document(&raw, &path.display().to_string())?;
        info!(
            path = %path.display(),
            tiles = map.len(),
            decorations = map.offgrid().len(),
            "level_document_loaded"
        );
        Ok(map)
    }

    /// Like [`TileMap::load`], but a missing file yields an empty map.
    pub fn load_or_empty(path: &Path, tile_size: u32) -> Result<Self, LevelError> {
        match Self::load(path) {
            Err(LevelError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "level_document_missing_starting_empty");
                Ok(Self::new(tile_size))
            }
            other => other,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, LevelError> {
        Self::parse_document(raw, "<memory>")
    }

    pub fn to_json_string(&self) -> Result<String, LevelError> {
        serde_json::to_string(&self.to_document()).map_err(LevelError::Encode)
    }

    /// Writes through a sibling temp file so a crash never leaves half a level.
    pub fn save(&self, path: &Path) -> Result<(), LevelError> {
        let json = self.to_json_string()?;
        write_text_atomic(path, &json).map_err(|source| LevelError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            path = %path.display(),
            tiles = self.len(),
            decorations = self.offgrid().len(),
            "level_document_saved"
        );
        Ok(())
    }

    fn parse_document(raw: &str, origin: &str) -> Result<Self, LevelError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let document: LevelDocument = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|error| {
                let at = error.path().to_string();
                LevelError::Parse {
                    origin: origin.to_string(),
                    at,
                    source: error.into_inner(),
                }
            })?;
        Self::from_document(document)
    }

    fn from_document(document: LevelDocument) -> Result<Self, LevelError> {
        if document.tile_size == 0 {
            return Err(LevelError::ZeroTileSize);
        }
        let mut tiles = HashMap::with_capacity(document.tilemap.len());
        for (key, record) in document.tilemap {
            let cell = Cell::parse_key(&key)
                .ok_or_else(|| LevelError::InvalidCellKey { key: key.clone() })?;
            let [x, y] = record.pos;
            if cell != Cell::new(x, y) {
                return Err(LevelError::CellKeyMismatch { key, x, y });
            }
            tiles.insert(
                cell,
                Tile {
                    kind: record.kind,
                    variant: record.variant,
                    cell,
                },
            );
        }
        let offgrid = document
            .offgrid
            .into_iter()
            .map(|record| Decoration {
                kind: record.kind,
                variant: record.variant,
                position: Vec2::new(record.pos[0], record.pos[1]),
            })
            .collect();
        Ok(Self {
            tile_size: document.tile_size,
            tiles,
            offgrid,
        })
    }

    fn to_document(&self) -> LevelDocument {
        LevelDocument {
            tilemap: self
                .tiles
                .values()
                .map(|tile| {
                    (
                        tile.cell.key(),
                        TileRecord {
                            kind: tile.kind,
                            variant: tile.variant,
                            pos: [tile.cell.x, tile.cell.y],
                        },
                    )
                })
                .collect(),
            tile_size: self.tile_size,
            offgrid: self
                .offgrid
                .iter()
                .map(|decoration| DecorationRecord {
                    kind: decoration.kind,
                    variant: decoration.variant,
                    pos: [decoration.position.x, decoration.position.y],
                })
                .collect(),
        }
    }
}

fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, text)?;
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("level.json");
    path.with_file_name(format!("{file_name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_map() -> TileMap {
        let mut map = TileMap::new(16);
        map.set(Cell::new(0, 5), TileKind::Grass, 1);
        map.set(Cell::new(-3, 2), TileKind::Stone, 8);
        map.set(Cell::new(4, 4), TileKind::Spawners, 0);
        map.push_decoration(TileKind::LargeDecor, 2, Vec2::new(100.5, 130.0));
        map.push_decoration(TileKind::Decor, 3, Vec2::new(-12.25, 7.0));
        map
    }

    #[test]
    fn save_then_load_reproduces_the_map() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("maps").join("0.json");
        let map = sample_map();

        map.save(&path).expect("save");
        let loaded = TileMap::load(&path).expect("load");

        assert_eq!(loaded, map);
        assert!(!path.with_file_name("0.json.tmp").exists());
    }

    #[test]
    fn document_uses_the_established_json_shape() {
        let value: serde_json::Value =
            serde_json::from_str(&sample_map().to_json_string().expect("json")).expect("value");

        assert_eq!(value["tile_size"], json!(16));
        assert_eq!(
            value["tilemap"]["-3;2"],
            json!({"type": "stone", "variant": 8, "pos": [-3, 2]})
        );
        assert_eq!(
            value["offgrid"][0],
            json!({"type": "large_decor", "variant": 2, "pos": [100.5, 130.0]})
        );
    }

    #[test]
    fn loads_documents_written_with_integer_decoration_positions() {
        let raw = json!({
            "tilemap": {"3;10": {"type": "grass", "variant": 1, "pos": [3, 10]}},
            "tile_size": 16,
            "offgrid": [{"type": "decor", "variant": 0, "pos": [100, 40]}]
        })
        .to_string();
        let map = TileMap::from_json_str(&raw).expect("parse");
        assert_eq!(map.get(Cell::new(3, 10)).map(|tile| tile.variant), Some(1));
        assert_eq!(map.offgrid()[0].position, Vec2::new(100.0, 40.0));
    }

    #[test]
    fn missing_required_key_is_a_parse_error() {
        let raw = json!({"tilemap": {}, "offgrid": []}).to_string();
        let error = TileMap::from_json_str(&raw).expect_err("missing tile_size");
        assert!(matches!(error, LevelError::Parse { .. }), "{error}");
        assert!(error.to_string().contains("tile_size"), "{error}");
    }

    #[test]
    fn parse_error_reports_path_inside_document() {
        let raw = json!({
            "tilemap": {"0;0": {"type": "lava", "variant": 0, "pos": [0, 0]}},
            "tile_size": 16,
            "offgrid": []
        })
        .to_string();
        match TileMap::from_json_str(&raw) {
            Err(LevelError::Parse { at, .. }) => assert!(at.starts_with("tilemap"), "{at}"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn key_and_position_must_agree() {
        let raw = json!({
            "tilemap": {"1;1": {"type": "grass", "variant": 0, "pos": [1, 2]}},
            "tile_size": 16,
            "offgrid": []
        })
        .to_string();
        assert!(matches!(
            TileMap::from_json_str(&raw),
            Err(LevelError::CellKeyMismatch { x: 1, y: 2, .. })
        ));
    }

    #[test]
    fn malformed_key_is_rejected() {
        let raw = json!({
            "tilemap": {"1,1": {"type": "grass", "variant": 0, "pos": [1, 1]}},
            "tile_size": 16,
            "offgrid": []
        })
        .to_string();
        assert!(matches!(
            TileMap::from_json_str(&raw),
            Err(LevelError::InvalidCellKey { .. })
        ));
    }

    #[test]
    fn missing_file_starts_empty_only_through_load_or_empty() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("absent.json");

        assert!(matches!(TileMap::load(&path), Err(LevelError::Read { .. })));
        let map = TileMap::load_or_empty(&path, 16).expect("empty map");
        assert!(map.is_empty());
        assert_eq!(map.tile_size(), 16);
    }

    #[test]
    fn malformed_file_is_not_treated_as_missing() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"tilemap\": ").expect("write");
        assert!(matches!(
            TileMap::load_or_empty(&path, 16),
            Err(LevelError::Parse { .. })
        ));
    }
}
