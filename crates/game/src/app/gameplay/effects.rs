//! Short-lived visual effects and enemy projectiles.
//!
//! Each kind lives in an [`EffectPool`]; an update returns `true` once the
//! item has expired and the pool drops it in the same pass.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use engine::{Animation, Rect, TileMap, Vec2};
use rand::Rng;

use super::events::{EventSink, Sound};
use crate::app::assets::ParticleKind;

const PROJECTILE_MAX_AGE: u32 = 360;
const SPARK_DECAY: f32 = 0.1;
const LEAF_SWAY_RATE: f32 = 0.035;
const LEAF_SWAY_AMPLITUDE: f32 = 0.3;
const LEAF_SPAWN_SCALE: f32 = 49_999.0;
const LEAF_VELOCITY: Vec2 = Vec2::new(-0.1, 0.3);
pub(crate) const HIT_SHAKE: u32 = 25;
pub(crate) const DASH_ATTACK_THRESHOLD: i32 = 50;

#[derive(Debug, Clone)]
pub(crate) struct EffectPool<T> {
    items: Vec<T>,
}

impl<T> Default for EffectPool<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> EffectPool<T> {
    pub(crate) fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }

    /// Updates every item in insertion order, removing the expired ones.
    /// Returns how many were removed.
    pub(crate) fn update(&mut self, mut update: impl FnMut(&mut T) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain_mut(|item| !update(item));
        before - self.items.len()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Particle {
    pub(crate) kind: ParticleKind,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) animation: Animation,
}

impl Particle {
    pub(crate) fn update(&mut self) -> bool {
        let expired = self.animation.is_done();
        self.position += self.velocity;
        self.animation.update();
        if self.kind == ParticleKind::Leaf {
            self.position.x +=
                (self.animation.frame() as f32 * LEAF_SWAY_RATE).sin() * LEAF_SWAY_AMPLITUDE;
        }
        expired
    }

    /// Top-left draw position; particles are centered on their position.
    pub(crate) fn sprite_origin(&self) -> Vec2 {
        let image = self.animation.image();
        self.position - Vec2::new(image.width() as f32 / 2.0, image.height() as f32 / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Spark {
    pub(crate) position: Vec2,
    pub(crate) angle: f32,
    pub(crate) speed: f32,
}

impl Spark {
    pub(crate) fn update(&mut self) -> bool {
        self.position += Vec2::from_angle(self.angle, self.speed);
        self.speed = (self.speed - SPARK_DECAY).max(0.0);
        self.speed <= 0.0
    }

    /// Diamond stretched along the direction of travel, in world space.
    pub(crate) fn polygon(&self) -> [Vec2; 4] {
        [
            self.position + Vec2::from_angle(self.angle, self.speed * 3.0),
            self.position + Vec2::from_angle(self.angle + FRAC_PI_2, self.speed * 0.5),
            self.position + Vec2::from_angle(self.angle + PI, self.speed * 3.0),
            self.position + Vec2::from_angle(self.angle - FRAC_PI_2, self.speed * 0.5),
        ]
    }
}

/// What a projectile needs to know about the player this tick.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlayerProbe {
    pub(crate) position: Vec2,
    pub(crate) rect: Rect,
    pub(crate) dashing: i32,
    pub(crate) alive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Projectile {
    pub(crate) position: Vec2,
    pub(crate) velocity_x: f32,
    pub(crate) age: u32,
}

impl Projectile {
    pub(crate) fn new(position: Vec2, velocity_x: f32) -> Self {
        Self {
            position,
            velocity_x,
            age: 0,
        }
    }

    pub(crate) fn update(
        &mut self,
        tiles: &TileMap,
        player: &PlayerProbe,
        events: &mut EventSink,
        rng: &mut impl Rng,
    ) -> bool {
        self.position.x += self.velocity_x;
        self.age += 1;

        if tiles.solid_at(self.position).is_some() {
            let back = if self.velocity_x > 0.0 { PI } else { 0.0 };
            for _ in 0..4 {
                let angle = rng.gen::<f32>() - 0.5 + back;
                events.spark(self.position, angle, 2.0 + rng.gen::<f32>());
            }
            return true;
        }
        if self.age > PROJECTILE_MAX_AGE {
            return true;
        }
        let dodging = player.dashing.abs() >= DASH_ATTACK_THRESHOLD;
        if !dodging && player.alive && player.rect.contains_point(self.position) {
            events.player_killed();
            events.shake(HIT_SHAKE);
            events.sound(Sound::Hit);
            hit_burst(events, rng, player.rect.center());
            return true;
        }
        false
    }
}

/// Spawns falling leaves inside the canopy of a tree decoration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LeafEmitter {
    pub(crate) area: Rect,
}

impl LeafEmitter {
    pub(crate) fn around_tree(tree_position: Vec2) -> Self {
        Self {
            area: Rect::new(tree_position.x + 4.0, tree_position.y + 4.0, 23.0, 13.0),
        }
    }

    pub(crate) fn maybe_spawn(&self, events: &mut EventSink, rng: &mut impl Rng) {
        if rng.gen::<f32>() * LEAF_SPAWN_SCALE >= self.area.area() {
            return;
        }
        let position = Vec2::new(
            self.area.x + rng.gen::<f32>() * self.area.w,
            self.area.y + rng.gen::<f32>() * self.area.h,
        );
        events.particle(
            ParticleKind::Leaf,
            position,
            LEAF_VELOCITY,
            rng.gen_range(0..=20),
        );
    }
}

const BURST_PIECES: usize = 30;

/// Sparks plus dust thrown out in every direction.
pub(crate) fn hit_burst(events: &mut EventSink, rng: &mut impl Rng, center: Vec2) {
    for _ in 0..BURST_PIECES {
        burst_piece(events, rng, center);
    }
}

/// [`hit_burst`] with a pair of fast horizontal sparks per piece.
pub(crate) fn kill_burst(events: &mut EventSink, rng: &mut impl Rng, center: Vec2) {
    for _ in 0..BURST_PIECES {
        burst_piece(events, rng, center);
        events.spark(center, 0.0, 5.0 + rng.gen::<f32>());
        events.spark(center, PI, 5.0 + rng.gen::<f32>());
    }
}

fn burst_piece(events: &mut EventSink, rng: &mut impl Rng, center: Vec2) {
    let angle = rng.gen::<f32>() * TAU;
    let speed = rng.gen::<f32>() * 5.0;
    events.spark(center, angle, 2.0 + rng.gen::<f32>());
    events.particle(
        ParticleKind::Dust,
        center,
        Vec2::from_angle(angle + PI, speed * 0.5),
        rng.gen_range(0..=7),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::assets::Assets;
    use crate::app::gameplay::events::SimEvent;
    use engine::{Cell, TileKind};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn probe_at(position: Vec2) -> PlayerProbe {
        PlayerProbe {
            position,
            rect: Rect::from_position_size(position, Vec2::new(8.0, 15.0)),
            dashing: 0,
            alive: true,
        }
    }

    #[test]
    fn pool_removes_expired_items_in_one_pass() {
        let mut pool = EffectPool::default();
        for value in 0..5 {
            pool.push(value);
        }
        let removed = pool.update(|value| *value % 2 == 0);
        assert_eq!(removed, 3);
        assert_eq!(pool.iter().copied().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn spark_expires_once_speed_reaches_zero() {
        let mut spark = Spark {
            position: Vec2::ZERO,
            angle: 0.0,
            speed: 0.25,
        };
        assert!(!spark.update());
        assert!(!spark.update());
        assert!(spark.update());
        assert!(spark.position.x > 0.0);
    }

    #[test]
    fn particle_reports_expiry_the_tick_after_its_last_frame() {
        let assets = Assets::placeholder();
        let def = assets.particle(ParticleKind::Dust);
        let mut particle = Particle {
            kind: ParticleKind::Dust,
            position: Vec2::ZERO,
            velocity: Vec2::new(1.0, 0.0),
            animation: def.instantiate(),
        };
        let mut ticks = 0;
        while !particle.update() {
            ticks += 1;
            assert!(ticks < 100);
        }
        assert_eq!(ticks, def.total_ticks() - 1);
        assert_eq!(particle.position.x, def.total_ticks() as f32);
    }

    #[test]
    fn projectile_hits_wall_and_sprays_sparks() {
        let mut tiles = TileMap::new(16);
        tiles.set(Cell::new(1, 0), TileKind::Stone, 0);
        let mut projectile = Projectile::new(Vec2::new(14.0, 8.0), 5.0);
        let mut events = EventSink::default();
        let mut rng = StdRng::seed_from_u64(3);

        let expired = projectile.update(&tiles, &probe_at(Vec2::new(200.0, 0.0)), &mut events, &mut rng);
        assert!(expired);
        let sparks = events
            .events()
            .iter()
            .filter(|event| matches!(event, SimEvent::Spark { .. }))
            .count();
        assert_eq!(sparks, 4);
    }

    #[test]
    fn projectile_expires_after_max_age() {
        let tiles = TileMap::new(16);
        let mut projectile = Projectile::new(Vec2::ZERO, 0.0);
        let mut events = EventSink::default();
        let mut rng = StdRng::seed_from_u64(3);
        let far = probe_at(Vec2::new(500.0, 500.0));

        for _ in 0..PROJECTILE_MAX_AGE {
            assert!(!projectile.update(&tiles, &far, &mut events, &mut rng));
        }
        assert!(projectile.update(&tiles, &far, &mut events, &mut rng));
        assert!(events.is_empty());
    }

    #[test]
    fn projectile_kills_player_unless_dashing() {
        let tiles = TileMap::new(16);
        let mut rng = StdRng::seed_from_u64(9);

        let mut dashing = probe_at(Vec2::new(10.0, 0.0));
        dashing.dashing = 55;
        let mut events = EventSink::default();
        let mut projectile = Projectile::new(Vec2::new(8.0, 5.0), 5.0);
        assert!(!projectile.update(&tiles, &dashing, &mut events, &mut rng));
        assert!(events.is_empty());

        let mut events = EventSink::default();
        let mut projectile = Projectile::new(Vec2::new(8.0, 5.0), 5.0);
        assert!(projectile.update(&tiles, &probe_at(Vec2::new(10.0, 0.0)), &mut events, &mut rng));
        assert!(events.events().contains(&SimEvent::PlayerKilled));
        assert!(events.events().contains(&SimEvent::Shake(HIT_SHAKE)));
        assert!(events.events().contains(&SimEvent::Sound(Sound::Hit)));
    }

    #[test]
    fn kill_burst_adds_horizontal_sparks_to_the_hit_burst() {
        let center = Vec2::new(40.0, 20.0);
        let mut hit = EventSink::default();
        hit_burst(&mut hit, &mut StdRng::seed_from_u64(4), center);
        let mut kill = EventSink::default();
        kill_burst(&mut kill, &mut StdRng::seed_from_u64(4), center);

        let count = |sink: &EventSink, wanted: fn(&SimEvent) -> bool| {
            sink.events().iter().filter(|event| wanted(event)).count()
        };
        let is_dust = |event: &SimEvent| matches!(event, SimEvent::Particle { .. });
        let is_spark = |event: &SimEvent| matches!(event, SimEvent::Spark { .. });
        let is_flank = |event: &SimEvent| {
            matches!(event, SimEvent::Spark { angle, speed, .. }
                if (*angle == 0.0 || *angle == PI) && *speed >= 5.0)
        };

        assert_eq!(count(&hit, is_dust), BURST_PIECES);
        assert_eq!(count(&hit, is_spark), BURST_PIECES);
        assert_eq!(count(&hit, is_flank), 0);
        assert_eq!(count(&kill, is_dust), BURST_PIECES);
        assert_eq!(count(&kill, is_spark), BURST_PIECES * 3);
        assert_eq!(count(&kill, is_flank), BURST_PIECES * 2);
    }

    #[test]
    fn leaf_emitter_covers_tree_canopy() {
        let emitter = LeafEmitter::around_tree(Vec2::new(32.0, 64.0));
        assert_eq!(emitter.area, Rect::new(36.0, 68.0, 23.0, 13.0));

        let mut events = EventSink::default();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20_000 {
            emitter.maybe_spawn(&mut events, &mut rng);
        }
        let spawned: Vec<_> = events.drain().collect();
        assert!(!spawned.is_empty());
        for event in spawned {
            let SimEvent::Particle { kind, position, .. } = event else {
                panic!("unexpected event {event:?}");
            };
            assert_eq!(kind, ParticleKind::Leaf);
            assert!(position.x >= emitter.area.left() && position.x <= emitter.area.right());
            assert!(position.y >= emitter.area.top() && position.y <= emitter.area.bottom());
        }
    }
}
