use std::f32::consts::PI;

use engine::{TileMap, Vec2};
use rand::Rng;

use super::actor::{ActionState, Actor, ActorKind};
use super::effects::{kill_burst, PlayerProbe, DASH_ATTACK_THRESHOLD, HIT_SHAKE};
use super::events::{EventSink, Sound};
use crate::app::assets::ActorAnimations;

/// Patrol and shooting parameters for enemies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EnemyTuning {
    pub(crate) walk_speed: f32,
    /// Horizontal offset from the body center (mirrored when facing left)
    /// and vertical offset from the body top. The probed point must be solid
    /// for the patrol to continue.
    pub(crate) ground_probe: Vec2,
    pub(crate) muzzle_offset: f32,
    pub(crate) projectile_speed: f32,
    /// Max vertical distance at which the player counts as in line of fire.
    pub(crate) sight_band: f32,
    pub(crate) start_walk_chance: f32,
    pub(crate) walk_ticks_min: u32,
    pub(crate) walk_ticks_max: u32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            walk_speed: 0.5,
            ground_probe: Vec2::new(7.0, 23.0),
            muzzle_offset: 7.0,
            projectile_speed: 5.0,
            sight_band: 16.0,
            start_walk_chance: 0.01,
            walk_ticks_min: 30,
            walk_ticks_max: 120,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Enemy {
    pub(crate) actor: Actor,
    /// Remaining patrol ticks; zero means standing still.
    pub(crate) walking: u32,
}

impl Enemy {
    pub(crate) fn new(position: Vec2, animations: &ActorAnimations) -> Self {
        Self {
            actor: Actor::new(ActorKind::Enemy, position, animations),
            walking: 0,
        }
    }

    /// Patrols, shoots at the end of a patrol and dies to a dashing player.
    /// Returns `true` when killed this tick.
    pub(crate) fn update(
        &mut self,
        tiles: &TileMap,
        player: &PlayerProbe,
        tuning: &EnemyTuning,
        animations: &ActorAnimations,
        events: &mut EventSink,
        rng: &mut impl Rng,
    ) -> bool {
        let mut movement = Vec2::ZERO;
        if self.walking > 0 {
            self.patrol(tiles, tuning, &mut movement);
            if self.walking == 0 {
                self.try_shoot(player, tuning, events, rng);
            }
        } else if rng.gen::<f32>() < tuning.start_walk_chance {
            self.walking = rng.gen_range(tuning.walk_ticks_min..=tuning.walk_ticks_max);
        }

        let action = if movement.x != 0.0 {
            ActionState::Run
        } else {
            ActionState::Idle
        };
        self.actor.set_action(action, animations);
        self.actor.step(tiles, movement);

        let rect = self.actor.body.rect();
        if player.dashing.abs() < DASH_ATTACK_THRESHOLD || !rect.overlaps(&player.rect) {
            return false;
        }
        kill_burst(events, rng, rect.center());
        events.shake(HIT_SHAKE);
        events.sound(Sound::Hit);
        true
    }

    fn patrol(&mut self, tiles: &TileMap, tuning: &EnemyTuning, movement: &mut Vec2) {
        let body = &mut self.actor.body;
        let probe_x = if body.flip {
            -tuning.ground_probe.x
        } else {
            tuning.ground_probe.x
        };
        let probe = Vec2::new(
            body.center().x + probe_x,
            body.position.y + tuning.ground_probe.y,
        );
        let has_ground = tiles.solid_at(probe).is_some();

        if body.collisions.horizontal() || !has_ground {
            body.flip = !body.flip;
        }
        movement.x = if body.flip {
            -tuning.walk_speed
        } else {
            tuning.walk_speed
        };
        self.walking -= 1;
    }

    fn try_shoot(
        &self,
        player: &PlayerProbe,
        tuning: &EnemyTuning,
        events: &mut EventSink,
        rng: &mut impl Rng,
    ) {
        let body = &self.actor.body;
        let distance = player.position - body.position;
        if distance.y.abs() >= tuning.sight_band {
            return;
        }
        let center = body.center();
        if body.flip && distance.x < 0.0 {
            let muzzle = Vec2::new(center.x - tuning.muzzle_offset, center.y);
            events.projectile(muzzle, -tuning.projectile_speed);
            for _ in 0..4 {
                events.spark(muzzle, rng.gen::<f32>() - 0.5 + PI, 2.0 + rng.gen::<f32>());
            }
            events.sound(Sound::Shoot);
        } else if !body.flip && distance.x > 0.0 {
            let muzzle = Vec2::new(center.x + tuning.muzzle_offset, center.y);
            events.projectile(muzzle, tuning.projectile_speed);
            for _ in 0..4 {
                events.spark(muzzle, rng.gen::<f32>() - 0.5, 2.0 - rng.gen::<f32>());
            }
            events.sound(Sound::Shoot);
        }
    }

    /// Top-left of the gun sprite, mirrored to the facing side.
    pub(crate) fn gun_origin(&self, gun_width: u32) -> Vec2 {
        let center = self.actor.body.center();
        let x = if self.actor.body.flip {
            center.x - 4.0 - gun_width as f32
        } else {
            center.x + 4.0
        };
        Vec2::new(x.floor(), center.y.floor())
    }
}
