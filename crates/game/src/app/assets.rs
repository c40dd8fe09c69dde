//! Sprite catalog loaded once at startup and shared by both scenes.
//!
//! Every image group is looked up under `assets/images`. A group that is
//! missing or fails to decode is replaced by flat-colored placeholders so a
//! bare checkout still runs; each such key logs a single warning.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use engine::{AnimationDef, Sprite, SpriteImage, TileKind};
use thiserror::Error;
use tracing::{info, warn};

use super::gameplay::{ActionState, ActorKind, ACTION_COUNT, ACTOR_KIND_COUNT};

#[derive(Debug, Error)]
pub(crate) enum AssetError {
    #[error("animation {key} has no frames")]
    EmptyAnimation { key: String },
    #[error("no {action} animation registered for {kind}")]
    MissingAnimation {
        kind: &'static str,
        action: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ParticleKind {
    Leaf,
    Dust,
}

impl ParticleKind {
    const fn index(self) -> usize {
        match self {
            ParticleKind::Leaf => 0,
            ParticleKind::Dust => 1,
        }
    }

    const fn key(self) -> &'static str {
        match self {
            ParticleKind::Leaf => "particles/leaf",
            ParticleKind::Dust => "particles/particle",
        }
    }

    const fn frame_duration(self) -> u32 {
        match self {
            ParticleKind::Leaf => 20,
            ParticleKind::Dust => 6,
        }
    }

    const fn placeholder_color(self) -> [u8; 4] {
        match self {
            ParticleKind::Leaf => [196, 92, 64, 255],
            ParticleKind::Dust => [240, 240, 240, 255],
        }
    }
}

/// Animation lookup keyed by (kind, state).
///
/// Construction fails unless every state a kind can enter has frames;
/// states a kind never enters fall back to its idle animation, so lookups
/// never fail at runtime.
#[derive(Debug, Clone)]
pub(crate) struct ActorAnimations {
    table: Vec<[Arc<AnimationDef>; ACTION_COUNT]>,
}

impl ActorAnimations {
    pub(crate) fn from_entries(
        entries: impl IntoIterator<Item = (ActorKind, ActionState, Arc<AnimationDef>)>,
    ) -> Result<Self, AssetError> {
        let mut slots: [[Option<Arc<AnimationDef>>; ACTION_COUNT]; ACTOR_KIND_COUNT] =
            Default::default();
        for (kind, action, def) in entries {
            slots[kind.index()][action.index()] = Some(def);
        }

        let mut table = Vec::with_capacity(ACTOR_KIND_COUNT);
        for kind in ActorKind::ALL {
            let row = &slots[kind.index()];
            let missing = |action: ActionState| AssetError::MissingAnimation {
                kind: kind.as_str(),
                action: action.as_str(),
            };
            for &action in kind.required_actions() {
                if row[action.index()].is_none() {
                    return Err(missing(action));
                }
            }
            let idle = row[ActionState::Idle.index()]
                .clone()
                .ok_or_else(|| missing(ActionState::Idle))?;
            table.push(
                ActionState::ALL.map(|action| {
                    row[action.index()]
                        .clone()
                        .unwrap_or_else(|| Arc::clone(&idle))
                }),
            );
        }
        Ok(Self { table })
    }

    pub(crate) fn get(&self, kind: ActorKind, action: ActionState) -> &Arc<AnimationDef> {
        &self.table[kind.index()][action.index()]
    }

    /// Flat-colored frames for every state.
    #[cfg(test)]
    pub(crate) fn placeholder() -> Self {
        let entries = ActorKind::ALL.into_iter().flat_map(|kind| {
            ActionState::ALL.into_iter().map(move |action| {
                let def = placeholder_def(
                    vec![actor_placeholder(kind)],
                    actor_frame_duration(kind, action),
                    true,
                );
                (kind, action, Arc::new(def))
            })
        });
        Self::from_entries(entries).expect("placeholder table is complete")
    }
}

/// Everything the play and edit scenes draw.
#[derive(Debug, Clone)]
pub(crate) struct Assets {
    tiles: HashMap<TileKind, Vec<Sprite>>,
    pub(crate) actors: ActorAnimations,
    particles: [Arc<AnimationDef>; 2],
    pub(crate) background: Sprite,
    pub(crate) clouds: Vec<Sprite>,
    pub(crate) gun: Sprite,
    pub(crate) projectile: Sprite,
}

impl Assets {
    pub(crate) fn load(images_dir: &Path) -> Result<Self, AssetError> {
        let mut loader = SpriteLoader::new(images_dir);

        let tiles = TileKind::ALL
            .into_iter()
            .map(|kind| {
                let key = format!("tiles/{kind}");
                let frames = loader.sequence(&key, || tile_placeholders(kind));
                (kind, frames)
            })
            .collect();

        let mut entries = Vec::new();
        for kind in ActorKind::ALL {
            for &action in kind.required_actions() {
                let key = format!("entities/{}/{}", kind.as_str(), action.as_str());
                let frames = loader.sequence(&key, || vec![actor_placeholder(kind)]);
                let def = AnimationDef::new(frames, actor_frame_duration(kind, action), true)
                    .ok_or(AssetError::EmptyAnimation { key })?;
                entries.push((kind, action, Arc::new(def)));
            }
        }
        let actors = ActorAnimations::from_entries(entries)?;

        let particle = |loader: &mut SpriteLoader, kind: ParticleKind| {
            let frames = loader.sequence(kind.key(), || {
                vec![Arc::new(SpriteImage::solid(3, 3, kind.placeholder_color()))]
            });
            AnimationDef::new(frames, kind.frame_duration(), false)
                .map(Arc::new)
                .ok_or_else(|| AssetError::EmptyAnimation {
                    key: kind.key().to_string(),
                })
        };
        let particles = [
            particle(&mut loader, ParticleKind::Leaf)?,
            particle(&mut loader, ParticleKind::Dust)?,
        ];

        let assets = Self {
            tiles,
            actors,
            particles,
            background: loader.single("background.png", || {
                SpriteImage::solid(320, 240, [18, 24, 48, 255])
            }),
            clouds: loader.sequence("clouds", || {
                vec![Arc::new(SpriteImage::solid(48, 16, [220, 224, 240, 255]))]
            }),
            gun: loader.single("gun.png", || SpriteImage::solid(7, 3, [120, 120, 120, 255])),
            projectile: loader.single("projectile.png", || {
                SpriteImage::solid(5, 3, [255, 220, 120, 255])
            }),
        };
        info!(
            images_dir = %images_dir.display(),
            loaded = loader.loaded,
            placeholders = loader.placeholders,
            "assets_loaded"
        );
        Ok(assets)
    }

    /// Catalog built entirely from placeholders, without touching disk.
    #[cfg(test)]
    pub(crate) fn placeholder() -> Self {
        Self {
            tiles: TileKind::ALL
                .into_iter()
                .map(|kind| (kind, tile_placeholders(kind)))
                .collect(),
            actors: ActorAnimations::placeholder(),
            particles: [ParticleKind::Leaf, ParticleKind::Dust].map(|kind| {
                Arc::new(placeholder_def(
                    vec![Arc::new(SpriteImage::solid(3, 3, kind.placeholder_color()))],
                    kind.frame_duration(),
                    false,
                ))
            }),
            background: Arc::new(SpriteImage::solid(320, 240, [18, 24, 48, 255])),
            clouds: vec![Arc::new(SpriteImage::solid(48, 16, [220, 224, 240, 255]))],
            gun: Arc::new(SpriteImage::solid(7, 3, [120, 120, 120, 255])),
            projectile: Arc::new(SpriteImage::solid(5, 3, [255, 220, 120, 255])),
        }
    }

    pub(crate) fn tile(&self, kind: TileKind, variant: u32) -> Option<&Sprite> {
        self.tiles.get(&kind)?.get(variant as usize)
    }

    pub(crate) fn variant_count(&self, kind: TileKind) -> usize {
        self.tiles.get(&kind).map_or(0, Vec::len)
    }

    pub(crate) fn particle(&self, kind: ParticleKind) -> &Arc<AnimationDef> {
        &self.particles[kind.index()]
    }
}

struct SpriteLoader {
    images_dir: PathBuf,
    loaded: usize,
    placeholders: usize,
}

impl SpriteLoader {
    fn new(images_dir: &Path) -> Self {
        Self {
            images_dir: images_dir.to_path_buf(),
            loaded: 0,
            placeholders: 0,
        }
    }

    fn single(&mut self, key: &str, placeholder: impl FnOnce() -> SpriteImage) -> Sprite {
        let path = self.images_dir.join(key);
        match SpriteImage::load(&path) {
            Ok(image) => {
                self.loaded += 1;
                Arc::new(image)
            }
            Err(error) => {
                warn!(key, error = %error, "sprite_load_failed_using_placeholder");
                self.placeholders += 1;
                Arc::new(placeholder())
            }
        }
    }

    /// Every `.png` in a directory, in file-name order.
    fn sequence(&mut self, key: &str, placeholder: impl FnOnce() -> Vec<Sprite>) -> Vec<Sprite> {
        let dir = self.images_dir.join(key);
        match load_sorted_pngs(&dir) {
            Ok(frames) if !frames.is_empty() => {
                self.loaded += frames.len();
                frames
            }
            Ok(_) => {
                warn!(key, "sprite_dir_empty_using_placeholder");
                self.placeholders += 1;
                placeholder()
            }
            Err(error) => {
                warn!(key, error = %error, "sprite_load_failed_using_placeholder");
                self.placeholders += 1;
                placeholder()
            }
        }
    }
}

fn load_sorted_pngs(dir: &Path) -> Result<Vec<Sprite>, Box<dyn std::error::Error>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_png = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("png"));
        if is_png {
            paths.push(path);
        }
    }
    paths.sort();

    let mut frames = Vec::with_capacity(paths.len());
    for path in paths {
        frames.push(Arc::new(SpriteImage::load(&path)?));
    }
    Ok(frames)
}

fn actor_frame_duration(kind: ActorKind, action: ActionState) -> u32 {
    match (kind, action) {
        (_, ActionState::Idle) => 6,
        (_, ActionState::Run) => 4,
        _ => 5,
    }
}

fn actor_placeholder(kind: ActorKind) -> Sprite {
    let color = match kind {
        ActorKind::Player => [232, 232, 240, 255],
        ActorKind::Enemy => [200, 60, 60, 255],
    };
    Arc::new(SpriteImage::solid(14, 18, color))
}

fn tile_placeholders(kind: TileKind) -> Vec<Sprite> {
    let (count, size, base): (u8, u32, [u8; 3]) = match kind {
        TileKind::Decor => (4, 8, [90, 160, 90]),
        TileKind::Grass => (9, 16, [64, 148, 64]),
        TileKind::LargeDecor => (3, 32, [40, 110, 60]),
        TileKind::Stone => (9, 16, [128, 128, 136]),
        TileKind::Spawners => (2, 16, [220, 200, 40]),
    };
    (0..count)
        .map(|variant| {
            let shade = variant.saturating_mul(6);
            let color = [
                base[0].saturating_add(shade),
                base[1].saturating_add(shade),
                base[2].saturating_add(shade),
                255,
            ];
            Arc::new(SpriteImage::solid(size, size, color))
        })
        .collect()
}

#[cfg(test)]
fn placeholder_def(frames: Vec<Sprite>, frame_duration: u32, looping: bool) -> AnimationDef {
    AnimationDef::new(frames, frame_duration, looping).expect("placeholder frames")
}
