use std::f32::consts::TAU;

use engine::{TileMap, Vec2};
use rand::Rng;

use super::actor::{ActionState, Actor, ActorKind};
use super::effects::{hit_burst, PlayerProbe, DASH_ATTACK_THRESHOLD, HIT_SHAKE};
use super::events::{EventSink, Sound};
use crate::app::assets::{ActorAnimations, ParticleKind};

const DASH_TICKS: i32 = 60;
const DASH_SPEED: f32 = 10.0;
const DASH_END_DAMPING: f32 = 0.1;
const JUMP_VELOCITY: f32 = -8.0;
const WALL_JUMP_VELOCITY: Vec2 = Vec2::new(6.0, -6.0);
const WALL_SLIDE_MAX_FALL: f32 = 0.5;
const AIR_DRAG: f32 = 0.5;
const MAX_JUMPS: u32 = 2;
/// Ticks airborne before a fall counts as fatal.
const FATAL_AIR_TIME: u32 = 120;
const COYOTE_TICKS: u32 = 4;

#[derive(Debug, Clone)]
pub(crate) struct Player {
    pub(crate) actor: Actor,
    pub(crate) air_time: u32,
    pub(crate) jumps: u32,
    pub(crate) wall_slide: bool,
    /// Signed dash countdown; the sign is the dash direction.
    pub(crate) dashing: i32,
}

impl Player {
    pub(crate) fn new(position: Vec2, animations: &ActorAnimations) -> Self {
        Self {
            actor: Actor::new(ActorKind::Player, position, animations),
            air_time: 0,
            jumps: MAX_JUMPS,
            wall_slide: false,
            dashing: 0,
        }
    }

    /// Hidden during the fast phase of a dash.
    pub(crate) fn is_visible(&self) -> bool {
        self.dashing.abs() <= DASH_ATTACK_THRESHOLD
    }

    pub(crate) fn probe(&self, alive: bool) -> PlayerProbe {
        PlayerProbe {
            position: self.actor.body.position,
            rect: self.actor.body.rect(),
            dashing: self.dashing,
            alive,
        }
    }

    pub(crate) fn update(
        &mut self,
        tiles: &TileMap,
        movement: Vec2,
        animations: &ActorAnimations,
        events: &mut EventSink,
        rng: &mut impl Rng,
    ) {
        self.actor.step(tiles, movement);
        let collisions = self.actor.body.collisions;

        if self.air_time > FATAL_AIR_TIME {
            events.player_killed();
            events.sound(Sound::Hit);
            events.shake(HIT_SHAKE);
            hit_burst(events, rng, self.actor.body.center());
        }

        self.air_time += 1;
        if collisions.down {
            self.air_time = 0;
            self.jumps = MAX_JUMPS;
        }
        if self.air_time > COYOTE_TICKS && self.jumps == MAX_JUMPS {
            self.jumps -= 1;
        }

        self.wall_slide = false;
        if collisions.horizontal() && self.air_time > COYOTE_TICKS {
            self.wall_slide = true;
            self.air_time = COYOTE_TICKS + 1;
            let body = &mut self.actor.body;
            body.velocity.y = body.velocity.y.min(WALL_SLIDE_MAX_FALL);
            body.flip = !collisions.right;
            self.actor.set_action(ActionState::WallSlide, animations);
        }

        if !self.wall_slide {
            let action = if self.air_time > 1 {
                ActionState::Jump
            } else if movement.x != 0.0 && !collisions.horizontal() {
                ActionState::Run
            } else {
                ActionState::Idle
            };
            self.actor.set_action(action, animations);
        }

        if matches!(self.dashing.abs(), 60 | 50) {
            let center = self.actor.body.center();
            for _ in 0..20 {
                let angle = rng.gen::<f32>() * TAU;
                let speed = rng.gen::<f32>() * 0.5 + 0.5;
                events.particle(
                    ParticleKind::Dust,
                    center,
                    Vec2::from_angle(angle, speed),
                    rng.gen_range(0..=7),
                );
            }
        }
        self.dashing -= self.dashing.signum();

        if self.dashing.abs() > DASH_ATTACK_THRESHOLD {
            let direction = self.dashing.signum() as f32;
            let body = &mut self.actor.body;
            body.velocity.x = direction * DASH_SPEED;
            if self.dashing.abs() == DASH_ATTACK_THRESHOLD + 1 {
                body.velocity.x *= DASH_END_DAMPING;
            }
            events.particle(
                ParticleKind::Dust,
                body.center(),
                Vec2::new(direction * rng.gen::<f32>() * 3.0, 0.0),
                rng.gen_range(0..=7),
            );
        }

        let velocity = &mut self.actor.body.velocity;
        velocity.x = if velocity.x > 0.0 {
            (velocity.x - AIR_DRAG).max(0.0)
        } else {
            (velocity.x + AIR_DRAG).min(0.0)
        };
    }

    /// Wall jump while sliding, otherwise a regular or double jump.
    /// Returns whether a jump happened.
    pub(crate) fn jump(&mut self, events: &mut EventSink) -> bool {
        let body = &mut self.actor.body;
        let jumped = if self.wall_slide {
            let away = if body.flip && body.last_movement.x < 0.0 {
                Some(1.0)
            } else if !body.flip && body.last_movement.x > 0.0 {
                Some(-1.0)
            } else {
                None
            };
            match away {
                Some(direction) => {
                    body.velocity = Vec2::new(direction * WALL_JUMP_VELOCITY.x, WALL_JUMP_VELOCITY.y);
                    self.air_time = COYOTE_TICKS + 1;
                    self.jumps = self.jumps.saturating_sub(1);
                    true
                }
                None => false,
            }
        } else if self.jumps > 0 {
            body.velocity.y = JUMP_VELOCITY;
            self.jumps -= 1;
            self.air_time = COYOTE_TICKS + 1;
            true
        } else {
            false
        };
        if jumped {
            events.sound(Sound::Jump);
        }
        jumped
    }

    /// Starts a dash in the facing direction unless one is running.
    pub(crate) fn dash(&mut self, events: &mut EventSink) -> bool {
        if self.dashing != 0 {
            return false;
        }
        self.dashing = if self.actor.body.flip {
            -DASH_TICKS
        } else {
            DASH_TICKS
        };
        events.sound(Sound::Dash);
        true
    }
}
