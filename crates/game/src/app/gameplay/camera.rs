use engine::Vec2;
use rand::Rng;

/// Eased follow camera. `scroll` is the world position of the view's
/// top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Camera {
    pub(crate) scroll: Vec2,
}

impl Camera {
    /// Closes half the gap to centering `target` each tick.
    pub(crate) fn follow(&mut self, target: Vec2, view_size: Vec2) {
        let goal = target - Vec2::new(view_size.x / 2.0, view_size.y / 2.0);
        self.scroll += (goal - self.scroll) * 0.5;
    }

    /// Whole-pixel scroll used for drawing; truncates toward zero.
    pub(crate) fn render_scroll(&self) -> (i32, i32) {
        (self.scroll.x as i32, self.scroll.y as i32)
    }
}

/// Countdown that jitters the presented frame while positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ScreenShake {
    remaining: u32,
}

impl ScreenShake {
    #[cfg(test)]
    pub(crate) fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Never shortens a shake already in progress.
    pub(crate) fn raise_to(&mut self, ticks: u32) {
        self.remaining = self.remaining.max(ticks);
    }

    pub(crate) fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// Uniform offset in `[-m/2, m/2)` per axis, `m = remaining * scale`.
    pub(crate) fn offset(&self, rng: &mut impl Rng, scale: f32) -> (i32, i32) {
        if self.remaining == 0 {
            return (0, 0);
        }
        let magnitude = self.remaining as f32;
        let mut axis = || ((rng.gen::<f32>() * magnitude - magnitude / 2.0) * scale) as i32;
        (axis(), axis())
    }
}
