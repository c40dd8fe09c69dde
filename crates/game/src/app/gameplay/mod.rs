mod actor;
mod camera;
mod clouds;
mod compositor;
mod effects;
mod enemy;
mod events;
mod level;
mod player;
mod simulation;


use std::cell::Cell;
use std::rc::Rc;

use engine::{Canvas, InputAction, InputSnapshot, Scene, SceneCommand, SceneError, SceneKey, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

pub(crate) use actor::{ActionState, ActorKind, ACTION_COUNT, ACTOR_KIND_COUNT};
pub(crate) use compositor::{draw_tile_layer, shake_scale};
pub(crate) use events::Sound;
pub(crate) use level::{level_path, DirectoryLevels, LevelSource};

use self::compositor::Compositor;
use self::simulation::{FlowPhase, Simulation};
use super::assets::Assets;
use super::audio::AudioSink;

/// Level index shared by the play and edit scenes.
pub(crate) type CurrentLevel = Rc<Cell<usize>>;

pub(crate) struct GameplayScene {
    assets: Rc<Assets>,
    levels: Box<dyn LevelSource>,
    audio: Box<dyn AudioSink>,
    current_level: CurrentLevel,
    view_size: Vec2,
    seed: Option<u64>,
    simulation: Option<Simulation>,
    compositor: Compositor,
}

impl GameplayScene {
    pub(crate) fn new(
        assets: Rc<Assets>,
        levels: Box<dyn LevelSource>,
        audio: Box<dyn AudioSink>,
        current_level: CurrentLevel,
        display_size: (u32, u32),
        shake_scale: f32,
    ) -> Self {
        Self {
            assets,
            levels,
            audio,
            current_level,
            view_size: Vec2::new(display_size.0 as f32, display_size.1 as f32),
            seed: None,
            simulation: None,
            compositor: Compositor::new(display_size.0, display_size.1, shake_scale),
        }
    }

    /// Fixes the random stream so runs are reproducible.
    #[cfg(test)]
    pub(crate) fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl Scene for GameplayScene {
    fn load(&mut self) -> Result<(), SceneError> {
        let last = self.levels.level_count().saturating_sub(1);
        let level_index = self.current_level.get().min(last);
        let simulation = Simulation::new(
            Rc::clone(&self.assets),
            self.levels.as_ref(),
            level_index,
            self.view_size,
            self.rng(),
        )?;
        info!(level = level_index, "gameplay_loaded");
        self.simulation = Some(simulation);
        Ok(())
    }

    fn update(&mut self, input: &InputSnapshot) -> Result<SceneCommand, SceneError> {
        if input.was_pressed(InputAction::SwitchScene) {
            return Ok(SceneCommand::HardResetTo(SceneKey::Edit));
        }
        let Some(simulation) = self.simulation.as_mut() else {
            return Ok(SceneCommand::None);
        };
        simulation.tick(input, self.levels.as_ref())?;
        for sound in simulation.take_sounds() {
            self.audio.play(sound);
        }
        self.current_level.set(simulation.level_index);
        Ok(SceneCommand::None)
    }

    fn render(&mut self, canvas: &mut Canvas) -> (i32, i32) {
        match self.simulation.as_mut() {
            Some(simulation) => self.compositor.render(simulation, &self.assets, canvas),
            None => (0, 0),
        }
    }

    fn unload(&mut self) {
        if self.simulation.take().is_some() {
            info!(level = self.current_level.get(), "gameplay_unloaded");
        }
    }

    fn debug_title(&self) -> Option<String> {
        let simulation = self.simulation.as_ref()?;
        let phase = match simulation.flow.phase() {
            FlowPhase::Playing => "playing",
            FlowPhase::PlayerDead { .. } => "dead",
            FlowPhase::LevelTransition { .. } => "cleared",
        };
        Some(format!(
            "Ninja Game | level {} | enemies {} | fx {} | {phase}",
            simulation.level_index,
            simulation.enemies.len(),
            simulation.particles.len() + simulation.sparks.len() + simulation.projectiles.len()
        ))
    }
}
