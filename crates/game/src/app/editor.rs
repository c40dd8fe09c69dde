//! Level editor scene: paints tiles into the level document the play scene
//! loads, on the same canvas and input shell.

use std::path::PathBuf;
use std::rc::Rc;

use engine::{
    Canvas, InputAction, InputSnapshot, Rect, Scene, SceneCommand, SceneError, SceneKey,
    TileKind, TileMap, Vec2, DEFAULT_TILE_SIZE,
};
use tracing::{info, warn};

use super::assets::Assets;
use super::gameplay::{draw_tile_layer, level_path, CurrentLevel};

const PAN_SPEED: f32 = 2.0;
const GHOST_ALPHA: u8 = 100;
const BACKDROP: [u8; 4] = [0, 0, 0, 255];
const PREVIEW_ORIGIN: (i32, i32) = (5, 5);

pub(crate) struct EditorScene {
    assets: Rc<Assets>,
    maps_dir: PathBuf,
    current_level: CurrentLevel,
    level_path: PathBuf,
    tiles: TileMap,
    scroll: Vec2,
    group: usize,
    variant: u32,
    on_grid: bool,
    cursor: Option<Vec2>,
}

impl EditorScene {
    pub(crate) fn new(assets: Rc<Assets>, maps_dir: PathBuf, current_level: CurrentLevel) -> Self {
        let level_path = level_path(&maps_dir, current_level.get());
        Self {
            assets,
            maps_dir,
            current_level,
            level_path,
            tiles: TileMap::default(),
            scroll: Vec2::ZERO,
            group: 0,
            variant: 0,
            on_grid: true,
            cursor: None,
        }
    }

    fn brush(&self) -> TileKind {
        TileKind::ALL[self.group % TileKind::ALL.len()]
    }

    fn render_scroll(&self) -> Vec2 {
        Vec2::new(self.scroll.x.trunc(), self.scroll.y.trunc())
    }

    fn cycle_brush(&mut self, steps: i32, variants: bool) {
        if variants {
            let count = self.assets.variant_count(self.brush()).max(1) as i64;
            self.variant = (self.variant as i64 - steps as i64).rem_euclid(count) as u32;
        } else {
            let count = TileKind::ALL.len() as i64;
            self.group = (self.group as i64 - steps as i64).rem_euclid(count) as usize;
            self.variant = 0;
        }
    }

    fn paint(&mut self, input: &InputSnapshot, world: Vec2) {
        let cell = self.tiles.cell_at(world);
        let kind = self.brush();

        if input.left_mouse_down() && self.on_grid {
            self.tiles.set(cell, kind, self.variant);
        }
        if input.left_click_pressed() && !self.on_grid {
            self.tiles.push_decoration(kind, self.variant, world);
        }
        if input.right_mouse_down() {
            self.tiles.remove(cell);
            let assets = &self.assets;
            self.tiles.remove_decorations_where(|decoration| {
                assets
                    .tile(decoration.kind, decoration.variant)
                    .is_some_and(|image| {
                        Rect::from_position_size(
                            decoration.position,
                            Vec2::new(image.width() as f32, image.height() as f32),
                        )
                        .contains_point(world)
                    })
            });
        }
    }

    fn save(&self) {
        if let Err(error) = self.tiles.save(&self.level_path) {
            warn!(
                path = %self.level_path.display(),
                error = %error,
                "level_save_failed"
            );
        }
    }
}

impl Scene for EditorScene {
    fn load(&mut self) -> Result<(), SceneError> {
        self.level_path = level_path(&self.maps_dir, self.current_level.get());
        self.tiles = TileMap::load_or_empty(&self.level_path, DEFAULT_TILE_SIZE)?;
        self.scroll = Vec2::ZERO;
        info!(
            path = %self.level_path.display(),
            tiles = self.tiles.len(),
            "editor_loaded"
        );
        Ok(())
    }

    fn update(&mut self, input: &InputSnapshot) -> Result<SceneCommand, SceneError> {
        if input.was_pressed(InputAction::SwitchScene) {
            return Ok(SceneCommand::HardResetTo(SceneKey::Play));
        }

        self.scroll += Vec2::new(input.horizontal_axis(), input.vertical_axis()) * PAN_SPEED;

        let steps = input.wheel_steps();
        if steps != 0 {
            self.cycle_brush(steps, input.is_down(InputAction::Modifier));
        }

        self.cursor = input.cursor_position();
        if let Some(cursor) = self.cursor {
            self.paint(input, cursor + self.render_scroll());
        }

        if input.was_pressed(InputAction::ToggleGrid) {
            self.on_grid = !self.on_grid;
        }
        if input.was_pressed(InputAction::Autotile) {
            let updated = self.tiles.autotile();
            info!(updated, "autotile_applied");
        }
        if input.was_pressed(InputAction::Save) {
            self.save();
        }
        Ok(SceneCommand::None)
    }

    fn render(&mut self, canvas: &mut Canvas) -> (i32, i32) {
        canvas.clear(BACKDROP);
        let scroll = self.render_scroll();
        draw_tile_layer(canvas, &self.tiles, &self.assets, scroll);

        let Some(image) = self.assets.tile(self.brush(), self.variant) else {
            return (0, 0);
        };
        if let Some(cursor) = self.cursor {
            let at = if self.on_grid {
                let cell = self.tiles.cell_at(cursor + scroll);
                self.tiles.cell_origin(cell) - scroll
            } else {
                cursor
            };
            canvas.blit_with_alpha(image, at.x as i32, at.y as i32, false, GHOST_ALPHA);
        }
        canvas.blit(image, PREVIEW_ORIGIN.0, PREVIEW_ORIGIN.1, false);
        (0, 0)
    }

    fn unload(&mut self) {
        self.tiles = TileMap::default();
        self.cursor = None;
    }

    fn debug_title(&self) -> Option<String> {
        let mode = if self.on_grid { "grid" } else { "free" };
        Some(format!(
            "Ninja Game Editor | {} | {} {} | {mode}",
            self.level_path.display(),
            self.brush(),
            self.variant
        ))
    }
}
