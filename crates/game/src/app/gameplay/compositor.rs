//! Layered frame composition for the play scene.
//!
//! Back layer: scaled background and parallax clouds. Front layer: tiles,
//! actors, projectiles and sparks, whose silhouette is stamped onto the
//! back layer as a one-pixel outline before particles and the transition
//! wipe are added.

use engine::{Canvas, TileMap, Vec2, TRANSPARENT};

use super::actor::Actor;
use super::simulation::{Simulation, TRANSITION_SPAN};
use crate::app::assets::Assets;

const OUTLINE_COLOR: [u8; 3] = [0, 0, 0];
const OUTLINE_ALPHA: u8 = 180;
const OUTLINE_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, -1), (0, 1)];
const SPARK_COLOR: [u8; 4] = [255, 255, 255, 255];
const WIPE_COLOR: [u8; 4] = [0, 0, 0, 255];

/// Shake magnitudes are authored in window pixels; the frame is composed at
/// display resolution.
pub(crate) fn shake_scale(display_width: u32, window_width: u32) -> f32 {
    if window_width == 0 {
        return 1.0;
    }
    display_width as f32 / window_width as f32
}

pub(crate) struct Compositor {
    front: Canvas,
    shake_scale: f32,
}

impl Compositor {
    pub(crate) fn new(width: u32, height: u32, shake_scale: f32) -> Self {
        Self {
            front: Canvas::new(width, height),
            shake_scale,
        }
    }

    /// Draws the frame into `canvas` and returns the shake offset.
    pub(crate) fn render(
        &mut self,
        simulation: &mut Simulation,
        assets: &Assets,
        canvas: &mut Canvas,
    ) -> (i32, i32) {
        if self.front.width() != canvas.width() || self.front.height() != canvas.height() {
            self.front = Canvas::new(canvas.width(), canvas.height());
        }
        let (scroll_x, scroll_y) = simulation.camera.render_scroll();
        let scroll = Vec2::new(scroll_x as f32, scroll_y as f32);
        let view = canvas.size();

        canvas.blit_scaled(&assets.background, 0, 0, canvas.width(), canvas.height());
        for cloud in simulation.clouds.iter() {
            let Some(image) = assets.clouds.get(cloud.image) else {
                continue;
            };
            let image_size = Vec2::new(image.width() as f32, image.height() as f32);
            let at = cloud.screen_position(scroll, view, image_size);
            canvas.blit(image, at.x as i32, at.y as i32, false);
        }

        let front = &mut self.front;
        front.clear(TRANSPARENT);
        draw_tile_layer(front, &simulation.tiles, assets, scroll);

        for enemy in &simulation.enemies {
            draw_actor(front, &enemy.actor, scroll);
            let gun = enemy.gun_origin(assets.gun.width()) - scroll;
            front.blit(
                &assets.gun,
                gun.x.floor() as i32,
                gun.y.floor() as i32,
                enemy.actor.body.flip,
            );
        }
        if !simulation.flow.is_player_dead() && simulation.player.is_visible() {
            draw_actor(front, &simulation.player.actor, scroll);
        }
        for projectile in simulation.projectiles.iter() {
            let image = &assets.projectile;
            let at = projectile.position
                - Vec2::new(image.width() as f32 / 2.0, image.height() as f32 / 2.0)
                - scroll;
            front.blit(image, at.x.floor() as i32, at.y.floor() as i32, false);
        }
        for spark in simulation.sparks.iter() {
            let points = spark.polygon().map(|point| point - scroll);
            front.fill_polygon(&points, SPARK_COLOR);
        }

        let silhouette = front.silhouette(OUTLINE_COLOR, OUTLINE_ALPHA);
        for (dx, dy) in OUTLINE_OFFSETS {
            canvas.draw_canvas(&silhouette, dx, dy);
        }

        for particle in simulation.particles.iter() {
            let at = particle.sprite_origin() - scroll;
            front.blit(
                particle.animation.image(),
                at.x.floor() as i32,
                at.y.floor() as i32,
                false,
            );
        }

        let transition = simulation.flow.transition;
        if transition != 0 {
            let radius = wipe_radius(transition, front.width());
            let center = Vec2::new((front.width() / 2) as f32, (front.height() / 2) as f32);
            front.mask_outside_circle(center, radius, WIPE_COLOR);
        }

        canvas.draw_canvas(front, 0, 0);
        simulation.shake_offset(self.shake_scale)
    }
}

/// Visible radius of the wipe circle; zero at either end of the span.
pub(crate) fn wipe_radius(transition: i32, display_width: u32) -> f32 {
    let step = display_width as i32 / TRANSITION_SPAN;
    ((TRANSITION_SPAN - transition.abs()).max(0) * step) as f32
}

/// Off-grid decorations first, then on-grid tiles around the view.
pub(crate) fn draw_tile_layer(canvas: &mut Canvas, tiles: &TileMap, assets: &Assets, scroll: Vec2) {
    for decoration in tiles.offgrid() {
        if let Some(image) = assets.tile(decoration.kind, decoration.variant) {
            let at = decoration.position - scroll;
            canvas.blit(image, at.x.floor() as i32, at.y.floor() as i32, false);
        }
    }
    for tile in tiles.tiles_in_view(scroll, canvas.size()) {
        if let Some(image) = assets.tile(tile.kind, tile.variant) {
            let at = tiles.cell_origin(tile.cell) - scroll;
            canvas.blit(image, at.x.floor() as i32, at.y.floor() as i32, false);
        }
    }
}

fn draw_actor(canvas: &mut Canvas, actor: &Actor, scroll: Vec2) {
    let at = actor.sprite_origin() - scroll;
    canvas.blit(
        actor.animation().image(),
        at.x.floor() as i32,
        at.y.floor() as i32,
        actor.body.flip,
    );
}
