#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Dash,
    ToggleGrid,
    Save,
    Autotile,
    Modifier,
    SwitchScene,
    Quit,
}

const ACTION_COUNT: usize = 11;

/// Held state plus press edges for every action.
///
/// An edge is raised only on a released-to-pressed transition, so key
/// repeat while held never produces a second edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
    pressed: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        let index = action.index();
        if is_down && !self.down[index] {
            self.pressed[index] = true;
        }
        self.down[index] = is_down;
    }

    /// Sets held state without raising an edge.
    pub(crate) fn set_held(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub(crate) fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed[action.index()]
    }

    pub(crate) fn mark_pressed(&mut self, action: InputAction) {
        self.pressed[action.index()] = true;
    }

    pub(crate) fn clear_edges(&mut self) {
        self.pressed = [false; ACTION_COUNT];
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Dash => 4,
            InputAction::ToggleGrid => 5,
            InputAction::Save => 6,
            InputAction::Autotile => 7,
            InputAction::Modifier => 8,
            InputAction::SwitchScene => 9,
            InputAction::Quit => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_raises_edge_once_until_release() {
        let mut states = ActionStates::default();
        states.set(InputAction::Dash, true);
        assert!(states.was_pressed(InputAction::Dash));
        states.clear_edges();

        states.set(InputAction::Dash, true);
        assert!(!states.was_pressed(InputAction::Dash));
        assert!(states.is_down(InputAction::Dash));

        states.set(InputAction::Dash, false);
        states.set(InputAction::Dash, true);
        assert!(states.was_pressed(InputAction::Dash));
    }

    #[test]
    fn edge_survives_release_within_same_tick() {
        let mut states = ActionStates::default();
        states.set(InputAction::MoveUp, true);
        states.set(InputAction::MoveUp, false);
        assert!(states.was_pressed(InputAction::MoveUp));
        assert!(!states.is_down(InputAction::MoveUp));
    }
}
