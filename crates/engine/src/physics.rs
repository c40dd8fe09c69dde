//! Gravity plus axis-separated box collision against the tile store.

use crate::geometry::{Rect, Vec2};
use crate::tilemap::TileMap;

pub const GRAVITY: f32 = 0.4;
pub const TERMINAL_VELOCITY: f32 = 12.0;

/// Sides contacted during the most recent [`KinematicBody::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionFlags {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl CollisionFlags {
    pub fn horizontal(&self) -> bool {
        self.left || self.right
    }

    pub fn vertical(&self) -> bool {
        self.up || self.down
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KinematicBody {
    /// Top-left corner of the collision box.
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: Vec2,
    pub collisions: CollisionFlags,
    /// Facing left.
    pub flip: bool,
    pub last_movement: Vec2,
}

impl KinematicBody {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            size,
            collisions: CollisionFlags::default(),
            flip: false,
            last_movement: Vec2::ZERO,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_position_size(self.position, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }

    /// Advances one tick with `movement` as this tick's input displacement.
    pub fn step(&mut self, tiles: &TileMap, movement: Vec2) {
        self.collisions = CollisionFlags::default();
        self.velocity.y = (self.velocity.y + GRAVITY).min(TERMINAL_VELOCITY);

        let displacement = movement + self.velocity;

        self.position.x += displacement.x;
        let mut body = self.rect();
        for tile in tiles.physics_rects(self.position) {
            if !body.overlaps(&tile) {
                continue;
            }
            if displacement.x > 0.0 {
                body.x = tile.left() - body.w;
                self.collisions.right = true;
            }
            if displacement.x < 0.0 {
                body.x = tile.right();
                self.collisions.left = true;
            }
            self.position.x = body.x;
        }

        self.position.y += displacement.y;
        let mut body = self.rect();
        for tile in tiles.physics_rects(self.position) {
            if !body.overlaps(&tile) {
                continue;
            }
            if displacement.y > 0.0 {
                body.y = tile.top() - body.h;
                self.collisions.down = true;
            }
            if displacement.y < 0.0 {
                body.y = tile.bottom();
                self.collisions.up = true;
            }
            self.position.y = body.y;
        }

        if movement.x > 0.0 {
            self.flip = false;
        }
        if movement.x < 0.0 {
            self.flip = true;
        }
        self.last_movement = movement;

        if self.collisions.vertical() {
            self.velocity.y = 0.0;
        }
        if self.collisions.horizontal() {
            self.velocity.x = 0.0;
        }
    }
}
