use std::mem;
use std::rc::Rc;

use engine::{InputAction, InputSnapshot, LevelError, TileMap, Vec2};
use rand::rngs::StdRng;
use tracing::info;

use super::camera::{Camera, ScreenShake};
use super::clouds::{Clouds, CLOUD_COUNT};
use super::effects::{EffectPool, LeafEmitter, Particle, Projectile, Spark};
use super::enemy::{Enemy, EnemyTuning};
use super::events::{EventSink, SimEvent, Sound};
use super::level::{LevelLayout, LevelSource};
use super::player::Player;
use crate::app::assets::Assets;

/// Length of the wipe in either direction, in ticks.
pub(crate) const TRANSITION_SPAN: i32 = 30;
const DEATH_FADE_AFTER: u32 = 10;
const DEATH_RELOAD_AFTER: u32 = 60;
const PLAYER_RUN_SPEED: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlowPhase {
    Playing,
    PlayerDead { ticks: u32 },
    LevelTransition { progress: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlowAction {
    Continue,
    Reload,
    Advance,
}

/// Death and level-transition counters.
///
/// `transition` starts at `-TRANSITION_SPAN` on load and climbs to zero
/// (wipe in); it climbs above zero once the level is cleared or the player
/// has been dead for a while (wipe out).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LevelFlow {
    pub(crate) transition: i32,
    pub(crate) dead: u32,
}

impl LevelFlow {
    pub(crate) fn starting() -> Self {
        Self {
            transition: -TRANSITION_SPAN,
            dead: 0,
        }
    }

    pub(crate) fn phase(&self) -> FlowPhase {
        if self.dead > 0 {
            FlowPhase::PlayerDead { ticks: self.dead }
        } else if self.transition > 0 {
            FlowPhase::LevelTransition {
                progress: self.transition,
            }
        } else {
            FlowPhase::Playing
        }
    }

    pub(crate) fn is_player_dead(&self) -> bool {
        self.dead > 0
    }

    /// Returns `false` if the player was already dead.
    pub(crate) fn kill_player(&mut self) -> bool {
        if self.dead > 0 {
            return false;
        }
        self.dead = 1;
        true
    }

    pub(crate) fn tick(&mut self, enemies_remaining: bool) -> FlowAction {
        if !enemies_remaining {
            self.transition += 1;
            if self.transition > TRANSITION_SPAN {
                return FlowAction::Advance;
            }
        }
        if self.transition < 0 {
            self.transition += 2;
        }
        if self.dead > 0 {
            self.dead += 1;
            if self.dead >= DEATH_FADE_AFTER {
                self.transition = (self.transition + 1).min(TRANSITION_SPAN);
            }
            if self.dead > DEATH_RELOAD_AFTER {
                return FlowAction::Reload;
            }
        }
        FlowAction::Continue
    }
}

/// The whole play state of one level plus the rules that advance it.
pub(crate) struct Simulation {
    assets: Rc<Assets>,
    view_size: Vec2,
    rng: StdRng,
    events: EventSink,
    sounds: Vec<Sound>,
    pub(crate) tuning: EnemyTuning,
    pub(crate) level_index: usize,
    pub(crate) tiles: TileMap,
    pub(crate) player: Player,
    pub(crate) enemies: Vec<Enemy>,
    pub(crate) projectiles: EffectPool<Projectile>,
    pub(crate) particles: EffectPool<Particle>,
    pub(crate) sparks: EffectPool<Spark>,
    pub(crate) leaf_emitters: Vec<LeafEmitter>,
    pub(crate) clouds: Clouds,
    pub(crate) camera: Camera,
    pub(crate) shake: ScreenShake,
    pub(crate) flow: LevelFlow,
}

impl Simulation {
    pub(crate) fn new(
        assets: Rc<Assets>,
        levels: &dyn LevelSource,
        level_index: usize,
        view_size: Vec2,
        rng: StdRng,
    ) -> Result<Self, LevelError> {
        let layout = LevelLayout::from_tiles(levels.load_level(level_index)?);
        let player = Player::new(layout.player_spawn, &assets.actors);
        let mut simulation = Self {
            assets,
            view_size,
            rng,
            events: EventSink::default(),
            sounds: Vec::new(),
            tuning: EnemyTuning::default(),
            level_index,
            tiles: TileMap::default(),
            player,
            enemies: Vec::new(),
            projectiles: EffectPool::default(),
            particles: EffectPool::default(),
            sparks: EffectPool::default(),
            leaf_emitters: Vec::new(),
            clouds: Clouds::default(),
            camera: Camera::default(),
            shake: ScreenShake::default(),
            flow: LevelFlow::starting(),
        };
        simulation.install(level_index, layout);
        Ok(simulation)
    }

    pub(crate) fn load_level(
        &mut self,
        levels: &dyn LevelSource,
        level_index: usize,
    ) -> Result<(), LevelError> {
        let layout = LevelLayout::from_tiles(levels.load_level(level_index)?);
        self.install(level_index, layout);
        Ok(())
    }

    fn install(&mut self, level_index: usize, layout: LevelLayout) {
        let actors = &self.assets.actors;
        self.level_index = level_index;
        self.player = Player::new(layout.player_spawn, actors);
        self.enemies = layout
            .enemy_spawns
            .iter()
            .map(|&position| Enemy::new(position, actors))
            .collect();
        self.tiles = layout.tiles;
        self.leaf_emitters = layout.leaf_emitters;
        self.projectiles.clear();
        self.particles.clear();
        self.sparks.clear();
        self.events = EventSink::default();
        self.clouds = Clouds::generate(&mut self.rng, self.assets.clouds.len(), CLOUD_COUNT);
        self.camera = Camera::default();
        self.flow = LevelFlow::starting();
        info!(
            level = level_index,
            enemy_count = self.enemies.len(),
            leaf_emitters = self.leaf_emitters.len(),
            "level_loaded"
        );
    }

    /// Advances one fixed step.
    pub(crate) fn tick(
        &mut self,
        input: &InputSnapshot,
        levels: &dyn LevelSource,
    ) -> Result<(), LevelError> {
        self.shake.tick();

        match self.flow.tick(!self.enemies.is_empty()) {
            FlowAction::Advance => {
                let next = (self.level_index + 1).min(levels.level_count().saturating_sub(1));
                info!(from = self.level_index, to = next, "level_advanced");
                return self.load_level(levels, next);
            }
            FlowAction::Reload => {
                info!(level = self.level_index, "level_reloaded");
                return self.load_level(levels, self.level_index);
            }
            FlowAction::Continue => {}
        }

        let alive = !self.flow.is_player_dead();
        if alive {
            if input.was_pressed(InputAction::MoveUp) {
                self.player.jump(&mut self.events);
            }
            if input.was_pressed(InputAction::Dash) {
                self.player.dash(&mut self.events);
            }
        }

        self.camera
            .follow(self.player.actor.body.center(), self.view_size);
        for emitter in &self.leaf_emitters {
            emitter.maybe_spawn(&mut self.events, &mut self.rng);
        }
        self.clouds.update();

        let probe = self.player.probe(alive);
        let level = self.level_index;
        self.enemies.retain_mut(|enemy| {
            let killed = enemy.update(
                &self.tiles,
                &probe,
                &self.tuning,
                &self.assets.actors,
                &mut self.events,
                &mut self.rng,
            );
            if killed {
                info!(level, "enemy_killed");
            }
            !killed
        });
        self.apply_events();

        if alive {
            let movement = Vec2::new(input.horizontal_axis() * PLAYER_RUN_SPEED, 0.0);
            self.player.update(
                &self.tiles,
                movement,
                &self.assets.actors,
                &mut self.events,
                &mut self.rng,
            );
            self.apply_events();
        }

        let probe = self.player.probe(!self.flow.is_player_dead());
        self.projectiles.update(|projectile| {
            projectile.update(&self.tiles, &probe, &mut self.events, &mut self.rng)
        });
        self.apply_events();

        self.sparks.update(Spark::update);
        self.particles.update(Particle::update);
        Ok(())
    }

    fn apply_events(&mut self) {
        for event in self.events.drain() {
            match event {
                SimEvent::Sound(sound) => self.sounds.push(sound),
                SimEvent::Shake(ticks) => self.shake.raise_to(ticks),
                SimEvent::PlayerKilled => {
                    if self.flow.kill_player() {
                        info!(level = self.level_index, "player_died");
                    }
                }
                SimEvent::Particle {
                    kind,
                    position,
                    velocity,
                    start_frame,
                } => self.particles.push(Particle {
                    kind,
                    position,
                    velocity,
                    animation: self.assets.particle(kind).instantiate_at(start_frame),
                }),
                SimEvent::Spark {
                    position,
                    angle,
                    speed,
                } => self.sparks.push(Spark {
                    position,
                    angle,
                    speed,
                }),
                SimEvent::Projectile {
                    position,
                    velocity_x,
                } => self.projectiles.push(Projectile::new(position, velocity_x)),
            }
        }
    }

    /// Sound requests since the last call.
    pub(crate) fn take_sounds(&mut self) -> Vec<Sound> {
        mem::take(&mut self.sounds)
    }

    pub(crate) fn shake_offset(&mut self, scale: f32) -> (i32, i32) {
        self.shake.offset(&mut self.rng, scale)
    }
}
