use engine::{Animation, KinematicBody, TileMap, Vec2};

use crate::app::assets::ActorAnimations;

/// Sprite origin relative to the collision box.
pub(crate) const ANIMATION_OFFSET: Vec2 = Vec2::new(-3.0, -3.0);

pub(crate) const ACTOR_SIZE: Vec2 = Vec2::new(8.0, 15.0);

pub(crate) const ACTOR_KIND_COUNT: usize = 2;
pub(crate) const ACTION_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ActorKind {
    Player,
    Enemy,
}

impl ActorKind {
    pub(crate) const ALL: [ActorKind; ACTOR_KIND_COUNT] = [ActorKind::Player, ActorKind::Enemy];

    pub(crate) const fn index(self) -> usize {
        match self {
            ActorKind::Player => 0,
            ActorKind::Enemy => 1,
        }
    }

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            ActorKind::Player => "player",
            ActorKind::Enemy => "enemy",
        }
    }

    /// States this kind actually enters; each needs an animation.
    pub(crate) const fn required_actions(self) -> &'static [ActionState] {
        match self {
            ActorKind::Player => &ActionState::ALL,
            ActorKind::Enemy => &[ActionState::Idle, ActionState::Run],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ActionState {
    Idle,
    Run,
    Jump,
    Slide,
    WallSlide,
}

impl ActionState {
    pub(crate) const ALL: [ActionState; ACTION_COUNT] = [
        ActionState::Idle,
        ActionState::Run,
        ActionState::Jump,
        ActionState::Slide,
        ActionState::WallSlide,
    ];

    pub(crate) const fn index(self) -> usize {
        match self {
            ActionState::Idle => 0,
            ActionState::Run => 1,
            ActionState::Jump => 2,
            ActionState::Slide => 3,
            ActionState::WallSlide => 4,
        }
    }

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            ActionState::Idle => "idle",
            ActionState::Run => "run",
            ActionState::Jump => "jump",
            ActionState::Slide => "slide",
            ActionState::WallSlide => "wall_slide",
        }
    }
}

/// Kinematic body plus the animation state shared by players and enemies.
#[derive(Debug, Clone)]
pub(crate) struct Actor {
    pub(crate) kind: ActorKind,
    pub(crate) body: KinematicBody,
    action: ActionState,
    animation: Animation,
}

impl Actor {
    pub(crate) fn new(kind: ActorKind, position: Vec2, animations: &ActorAnimations) -> Self {
        Self {
            kind,
            body: KinematicBody::new(position, ACTOR_SIZE),
            action: ActionState::Idle,
            animation: animations.get(kind, ActionState::Idle).instantiate(),
        }
    }

    pub(crate) fn action(&self) -> ActionState {
        self.action
    }

    pub(crate) fn animation(&self) -> &Animation {
        &self.animation
    }

    /// Switches to a fresh cursor only when the state actually changes.
    pub(crate) fn set_action(&mut self, action: ActionState, animations: &ActorAnimations) {
        if action == self.action {
            return;
        }
        self.action = action;
        self.animation = animations.get(self.kind, action).instantiate();
    }

    /// Physics step followed by one animation tick.
    pub(crate) fn step(&mut self, tiles: &TileMap, movement: Vec2) {
        self.body.step(tiles, movement);
        self.animation.update();
    }

    /// Top-left pixel where the current frame is drawn.
    pub(crate) fn sprite_origin(&self) -> Vec2 {
        self.body.position + ANIMATION_OFFSET
    }
}
