use std::cell::Cell;
use std::env;
use std::path::PathBuf;
use std::rc::Rc;

use engine::{resolve_app_paths, AppPaths, LoopConfig, Scene, SceneKey, StartupError};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::assets::{AssetError, Assets};
use super::audio::LogAudio;
use super::editor::EditorScene;
use super::gameplay::{shake_scale, DirectoryLevels, GameplayScene, LevelSource};

const START_LEVEL_ENV_VAR: &str = "NINJA_START_LEVEL";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to load assets: {0}")]
    Assets(#[from] AssetError),
    #[error("no levels found in {maps_dir}; expected 0.json")]
    NoLevels { maps_dir: PathBuf },
}

#[derive(Debug, Clone)]
pub(crate) struct GameConfig {
    pub(crate) paths: AppPaths,
    pub(crate) start_level: usize,
}

impl GameConfig {
    pub(crate) fn from_env() -> Result<Self, StartupError> {
        Ok(Self {
            paths: resolve_app_paths()?,
            start_level: parse_start_level(env::var(START_LEVEL_ENV_VAR).ok().as_deref()),
        })
    }
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) play: Box<dyn Scene>,
    pub(crate) edit: Box<dyn Scene>,
    pub(crate) start_scene: SceneKey,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Ninja Game Startup ===");

    let game = GameConfig::from_env()?;
    info!(
        root = %game.paths.root.display(),
        images_dir = %game.paths.images_dir.display(),
        maps_dir = %game.paths.maps_dir.display(),
        start_level = game.start_level,
        "startup_paths"
    );

    let assets = Rc::new(Assets::load(&game.paths.images_dir)?);
    let levels = DirectoryLevels::discover(&game.paths.maps_dir);
    if levels.level_count() == 0 {
        return Err(BootstrapError::NoLevels {
            maps_dir: game.paths.maps_dir,
        });
    }
    info!(level_count = levels.level_count(), "levels_ready");

    let config = LoopConfig::default();
    let current_level = Rc::new(Cell::new(game.start_level));
    let play = GameplayScene::new(
        Rc::clone(&assets),
        Box::new(levels),
        Box::new(LogAudio),
        Rc::clone(&current_level),
        (config.display_width, config.display_height),
        shake_scale(config.display_width, config.window_width),
    );
    let edit = EditorScene::new(assets, game.paths.maps_dir, current_level);

    Ok(AppWiring {
        config,
        play: Box::new(play),
        edit: Box::new(edit),
        start_scene: SceneKey::Play,
    })
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_start_level(raw: Option<&str>) -> usize {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return 0;
    };
    match raw.parse::<usize>() {
        Ok(level) => level,
        Err(_) => {
            warn!(
                var = START_LEVEL_ENV_VAR,
                value = raw,
                "invalid_start_level_using_default"
            );
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_level_defaults_to_zero() {
        assert_eq!(parse_start_level(None), 0);
        assert_eq!(parse_start_level(Some("   ")), 0);
    }

    #[test]
    fn start_level_parses_trimmed_index() {
        assert_eq!(parse_start_level(Some(" 1 ")), 1);
    }

    #[test]
    fn invalid_start_level_falls_back() {
        assert_eq!(parse_start_level(Some("-2")), 0);
        assert_eq!(parse_start_level(Some("first")), 0);
    }
}
