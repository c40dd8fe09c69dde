use engine::Vec2;

use crate::app::assets::ParticleKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Sound {
    Jump,
    Dash,
    Hit,
    Shoot,
}

impl Sound {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Sound::Jump => "jump",
            Sound::Dash => "dash",
            Sound::Hit => "hit",
            Sound::Shoot => "shoot",
        }
    }
}

/// Side effects requested by actors and effects during one update.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SimEvent {
    Sound(Sound),
    /// Raise the screen shake to at least this many ticks.
    Shake(u32),
    PlayerKilled,
    Particle {
        kind: ParticleKind,
        position: Vec2,
        velocity: Vec2,
        start_frame: u32,
    },
    Spark {
        position: Vec2,
        angle: f32,
        speed: f32,
    },
    Projectile {
        position: Vec2,
        velocity_x: f32,
    },
}

/// Queue the simulation drains after each behavior runs.
#[derive(Debug, Default)]
pub(crate) struct EventSink {
    events: Vec<SimEvent>,
}

impl EventSink {
    pub(crate) fn sound(&mut self, sound: Sound) {
        self.events.push(SimEvent::Sound(sound));
    }

    pub(crate) fn shake(&mut self, ticks: u32) {
        self.events.push(SimEvent::Shake(ticks));
    }

    pub(crate) fn player_killed(&mut self) {
        self.events.push(SimEvent::PlayerKilled);
    }

    pub(crate) fn particle(
        &mut self,
        kind: ParticleKind,
        position: Vec2,
        velocity: Vec2,
        start_frame: u32,
    ) {
        self.events.push(SimEvent::Particle {
            kind,
            position,
            velocity,
            start_frame,
        });
    }

    pub(crate) fn spark(&mut self, position: Vec2, angle: f32, speed: f32) {
        self.events.push(SimEvent::Spark {
            position,
            angle,
            speed,
        });
    }

    pub(crate) fn projectile(&mut self, position: Vec2, velocity_x: f32) {
        self.events.push(SimEvent::Projectile {
            position,
            velocity_x,
        });
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = SimEvent> + '_ {
        self.events.drain(..)
    }

    #[cfg(test)]
    pub(crate) fn events(&self) -> &[SimEvent] {
        &self.events
    }
}
