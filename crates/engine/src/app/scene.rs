use thiserror::Error;

use super::input::{ActionStates, InputAction};
use super::rendering::Canvas;
use crate::geometry::Vec2;
use crate::tilemap::LevelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneKey {
    Play,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    /// Unload and reload the target scene, then make it active.
    HardResetTo(SceneKey),
}

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Level(#[from] LevelError),
}

/// Per-tick view of the input devices.
///
/// Press edges are set for exactly one tick; held state persists until the
/// release arrives. The cursor is already mapped to display pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    actions: ActionStates,
    cursor_position: Option<Vec2>,
    left_mouse_down: bool,
    left_click_pressed: bool,
    right_mouse_down: bool,
    wheel_steps: i32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        actions: ActionStates,
        cursor_position: Option<Vec2>,
        left_mouse_down: bool,
        left_click_pressed: bool,
        right_mouse_down: bool,
        wheel_steps: i32,
    ) -> Self {
        Self {
            actions,
            cursor_position,
            left_mouse_down,
            left_click_pressed,
            right_mouse_down,
            wheel_steps,
        }
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// True only on the tick the action went from released to pressed.
    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.actions.was_pressed(action)
    }

    /// -1, 0 or 1 from the held left/right actions.
    pub fn horizontal_axis(&self) -> f32 {
        let right = self.is_down(InputAction::MoveRight) as i32;
        let left = self.is_down(InputAction::MoveLeft) as i32;
        (right - left) as f32
    }

    pub fn vertical_axis(&self) -> f32 {
        let down = self.is_down(InputAction::MoveDown) as i32;
        let up = self.is_down(InputAction::MoveUp) as i32;
        (down - up) as f32
    }

    pub fn cursor_position(&self) -> Option<Vec2> {
        self.cursor_position
    }

    pub fn left_mouse_down(&self) -> bool {
        self.left_mouse_down
    }

    pub fn left_click_pressed(&self) -> bool {
        self.left_click_pressed
    }

    pub fn right_mouse_down(&self) -> bool {
        self.right_mouse_down
    }

    /// Wheel notches since the previous tick, positive away from the user.
    pub fn wheel_steps(&self) -> i32 {
        self.wheel_steps
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set_held(action, is_down);
        self
    }

    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.actions.set_held(action, true);
        self.actions.mark_pressed(action);
        self
    }

    pub fn with_cursor_position(mut self, cursor_position: Option<Vec2>) -> Self {
        self.cursor_position = cursor_position;
        self
    }

    pub fn with_left_mouse(mut self, down: bool, pressed: bool) -> Self {
        self.left_mouse_down = down;
        self.left_click_pressed = pressed;
        self
    }

    pub fn with_right_mouse(mut self, down: bool) -> Self {
        self.right_mouse_down = down;
        self
    }

    pub fn with_wheel_steps(mut self, wheel_steps: i32) -> Self {
        self.wheel_steps = wheel_steps;
        self
    }
}

/// A screen the loop can run: gameplay or the level editor.
///
/// `render` draws at display resolution and returns the offset, in display
/// pixels, at which the finished frame should be presented (screen shake).
pub trait Scene {
    fn load(&mut self) -> Result<(), SceneError>;
    fn update(&mut self, input: &InputSnapshot) -> Result<SceneCommand, SceneError>;
    fn render(&mut self, canvas: &mut Canvas) -> (i32, i32);
    fn unload(&mut self);
    fn debug_title(&self) -> Option<String> {
        None
    }
}

struct SceneRuntime {
    scene: Box<dyn Scene>,
    is_loaded: bool,
}

impl SceneRuntime {
    fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            is_loaded: false,
        }
    }
}

pub(crate) struct SceneMachine {
    play: SceneRuntime,
    edit: SceneRuntime,
    active_scene: SceneKey,
}

impl SceneMachine {
    pub(crate) fn new(play: Box<dyn Scene>, edit: Box<dyn Scene>, active_scene: SceneKey) -> Self {
        Self {
            play: SceneRuntime::new(play),
            edit: SceneRuntime::new(edit),
            active_scene,
        }
    }

    pub(crate) fn active_scene(&self) -> SceneKey {
        self.active_scene
    }

    pub(crate) fn load_active(&mut self) -> Result<(), SceneError> {
        let runtime = self.active_runtime_mut();
        if runtime.is_loaded {
            return Ok(());
        }
        runtime.scene.load()?;
        runtime.is_loaded = true;
        Ok(())
    }

    pub(crate) fn update_active(&mut self, input: &InputSnapshot) -> Result<SceneCommand, SceneError> {
        self.active_runtime_mut().scene.update(input)
    }

    pub(crate) fn render_active(&mut self, canvas: &mut Canvas) -> (i32, i32) {
        self.active_runtime_mut().scene.render(canvas)
    }

    pub(crate) fn debug_title_active(&self) -> Option<String> {
        self.runtime_ref(self.active_scene).scene.debug_title()
    }

    /// Unloads `next_scene` if loaded, loads it fresh, and activates it.
    ///
    /// The previously active scene is unloaded too, so returning to it later
    /// always starts from disk. Returns whether the active key changed.
    pub(crate) fn hard_reset_to(&mut self, next_scene: SceneKey) -> Result<bool, SceneError> {
        let previous = self.active_scene;
        if previous != next_scene {
            let runtime = self.runtime_mut(previous);
            if runtime.is_loaded {
                runtime.scene.unload();
                runtime.is_loaded = false;
            }
        }

        let runtime = self.runtime_mut(next_scene);
        if runtime.is_loaded {
            runtime.scene.unload();
            runtime.is_loaded = false;
        }
        runtime.scene.load()?;
        runtime.is_loaded = true;
        self.active_scene = next_scene;
        Ok(previous != next_scene)
    }

    pub(crate) fn shutdown_all(&mut self) {
        for runtime in [&mut self.play, &mut self.edit] {
            if runtime.is_loaded {
                runtime.scene.unload();
                runtime.is_loaded = false;
            }
        }
    }

    fn active_runtime_mut(&mut self) -> &mut SceneRuntime {
        self.runtime_mut(self.active_scene)
    }

    fn runtime_mut(&mut self, key: SceneKey) -> &mut SceneRuntime {
        match key {
            SceneKey::Play => &mut self.play,
            SceneKey::Edit => &mut self.edit,
        }
    }

    fn runtime_ref(&self, key: SceneKey) -> &SceneRuntime {
        match key {
            SceneKey::Play => &self.play,
            SceneKey::Edit => &self.edit,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Default)]
    struct Counters {
        loads: u32,
        unloads: u32,
        updates: u32,
    }

    struct CountingScene {
        name: &'static str,
        counters: Rc<RefCell<Counters>>,
        ticks_since_load: u32,
    }

    impl CountingScene {
        fn boxed(name: &'static str) -> (Box<dyn Scene>, Rc<RefCell<Counters>>) {
            let counters = Rc::new(RefCell::new(Counters::default()));
            let scene = CountingScene {
                name,
                counters: Rc::clone(&counters),
                ticks_since_load: 0,
            };
            (Box::new(scene), counters)
        }
    }

    impl Scene for CountingScene {
        fn load(&mut self) -> Result<(), SceneError> {
            self.counters.borrow_mut().loads += 1;
            self.ticks_since_load = 0;
            Ok(())
        }

        fn update(&mut self, input: &InputSnapshot) -> Result<SceneCommand, SceneError> {
            self.counters.borrow_mut().updates += 1;
            self.ticks_since_load += 1;
            if input.was_pressed(InputAction::SwitchScene) {
                return Ok(SceneCommand::HardResetTo(SceneKey::Edit));
            }
            Ok(SceneCommand::None)
        }

        fn render(&mut self, canvas: &mut Canvas) -> (i32, i32) {
            canvas.clear([1, 2, 3, 255]);
            (self.ticks_since_load as i32, 0)
        }

        fn unload(&mut self) {
            self.counters.borrow_mut().unloads += 1;
        }

        fn debug_title(&self) -> Option<String> {
            Some(self.name.to_string())
        }
    }

    #[test]
    fn load_active_is_idempotent() {
        let (play, play_counts) = CountingScene::boxed("play");
        let (edit, edit_counts) = CountingScene::boxed("edit");
        let mut machine = SceneMachine::new(play, edit, SceneKey::Play);

        machine.load_active().expect("load");
        machine.load_active().expect("load");

        assert_eq!(play_counts.borrow().loads, 1);
        assert_eq!(edit_counts.borrow().loads, 0);
    }

    #[test]
    fn only_active_scene_updates() {
        let (play, play_counts) = CountingScene::boxed("play");
        let (edit, edit_counts) = CountingScene::boxed("edit");
        let mut machine = SceneMachine::new(play, edit, SceneKey::Play);
        machine.load_active().expect("load");

        for _ in 0..3 {
            machine.update_active(&InputSnapshot::empty()).expect("update");
        }

        assert_eq!(play_counts.borrow().updates, 3);
        assert_eq!(edit_counts.borrow().updates, 0);
        assert_eq!(machine.debug_title_active().as_deref(), Some("play"));
    }

    #[test]
    fn hard_reset_reloads_target_and_unloads_previous() {
        let (play, play_counts) = CountingScene::boxed("play");
        let (edit, edit_counts) = CountingScene::boxed("edit");
        let mut machine = SceneMachine::new(play, edit, SceneKey::Play);
        machine.load_active().expect("load");

        let input = InputSnapshot::empty().with_action_pressed(InputAction::SwitchScene);
        let command = machine.update_active(&input).expect("update");
        assert_eq!(command, SceneCommand::HardResetTo(SceneKey::Edit));
        assert!(machine.hard_reset_to(SceneKey::Edit).expect("reset"));

        assert_eq!(machine.active_scene(), SceneKey::Edit);
        assert_eq!(play_counts.borrow().unloads, 1);
        assert_eq!(edit_counts.borrow().loads, 1);

        assert!(machine.hard_reset_to(SceneKey::Play).expect("reset"));
        assert_eq!(play_counts.borrow().loads, 2);
        assert_eq!(edit_counts.borrow().unloads, 1);
    }

    #[test]
    fn hard_reset_to_active_scene_restarts_it() {
        let (play, play_counts) = CountingScene::boxed("play");
        let (edit, _) = CountingScene::boxed("edit");
        let mut machine = SceneMachine::new(play, edit, SceneKey::Play);
        machine.load_active().expect("load");
        machine.update_active(&InputSnapshot::empty()).expect("update");

        assert!(!machine.hard_reset_to(SceneKey::Play).expect("reset"));

        let mut canvas = Canvas::new(2, 2);
        assert_eq!(machine.render_active(&mut canvas), (0, 0));
        assert_eq!(play_counts.borrow().loads, 2);
        assert_eq!(play_counts.borrow().unloads, 1);
    }

    #[test]
    fn shutdown_unloads_loaded_scenes_once() {
        let (play, play_counts) = CountingScene::boxed("play");
        let (edit, edit_counts) = CountingScene::boxed("edit");
        let mut machine = SceneMachine::new(play, edit, SceneKey::Play);
        machine.load_active().expect("load");

        machine.shutdown_all();
        machine.shutdown_all();

        assert_eq!(play_counts.borrow().unloads, 1);
        assert_eq!(edit_counts.borrow().unloads, 0);
    }

    #[test]
    fn snapshot_axes_combine_held_actions() {
        let input = InputSnapshot::empty()
            .with_action_down(InputAction::MoveLeft, true)
            .with_action_down(InputAction::MoveRight, true)
            .with_action_down(InputAction::MoveUp, true);
        assert_eq!(input.horizontal_axis(), 0.0);
        assert_eq!(input.vertical_axis(), -1.0);
        assert!(!input.was_pressed(InputAction::MoveUp));

        let pressed = InputSnapshot::empty().with_action_pressed(InputAction::Dash);
        assert!(pressed.was_pressed(InputAction::Dash));
        assert!(pressed.is_down(InputAction::Dash));
    }
}
