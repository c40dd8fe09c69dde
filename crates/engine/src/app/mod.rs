mod input;
mod loop_runner;
mod rendering;
mod scene;

pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use rendering::{Canvas, Renderer, Rgba, TRANSPARENT};
pub use scene::{InputSnapshot, Scene, SceneCommand, SceneError, SceneKey};
