mod canvas;
mod renderer;

pub use canvas::{Canvas, Rgba, TRANSPARENT};
pub use renderer::Renderer;
