use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture, TextureError};
use winit::window::Window;

use super::canvas::{Canvas, Rgba};
use crate::geometry::Vec2;

const BORDER_COLOR: Rgba = [0, 0, 0, 255];

/// Owns the window framebuffer.
///
/// The pixel buffer has the fixed display resolution; `pixels` scales it to
/// the window surface, so scenes only ever draw at display size.
pub struct Renderer {
    pixels: Pixels<'static>,
    display_width: u32,
    display_height: u32,
}

impl Renderer {
    pub fn new(window: Arc<Window>, display_width: u32, display_height: u32) -> Result<Self, Error> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, window);
        let pixels = Pixels::new(display_width, display_height, surface)?;
        Ok(Self {
            pixels,
            display_width,
            display_height,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), TextureError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)
    }

    /// Maps a physical window position to display pixels, clamping positions
    /// that fall in the letterbox border.
    pub fn window_to_display(&self, x: f32, y: f32) -> Vec2 {
        let (px, py) = self
            .pixels
            .window_pos_to_pixel((x, y))
            .unwrap_or_else(|pos| self.pixels.clamp_pixel_pos(pos));
        Vec2::new(px as f32, py as f32)
    }

    /// Copies `canvas` into the framebuffer shifted by `offset` display
    /// pixels, then presents it.
    pub fn present(&mut self, canvas: &Canvas, offset: (i32, i32)) -> Result<(), Error> {
        let frame = self.pixels.frame_mut();
        copy_shifted(
            frame,
            self.display_width,
            self.display_height,
            canvas,
            offset,
        );
        self.pixels.render()
    }
}

fn copy_shifted(frame: &mut [u8], width: u32, height: u32, canvas: &Canvas, offset: (i32, i32)) {
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let color = canvas
                .pixel(x - offset.0, y - offset.1)
                .map(|mut color| {
                    color[3] = 255;
                    color
                })
                .unwrap_or(BORDER_COLOR);
            let index = (y as usize * width as usize + x as usize) * 4;
            if let Some(slot) = frame.get_mut(index..index + 4) {
                slot.copy_from_slice(&color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifted_copy_fills_uncovered_border_black() {
        let mut canvas = Canvas::new(3, 2);
        canvas.clear([10, 20, 30, 255]);
        let mut frame = vec![0u8; 3 * 2 * 4];

        copy_shifted(&mut frame, 3, 2, &canvas, (1, 0));

        assert_eq!(&frame[0..4], &BORDER_COLOR);
        assert_eq!(&frame[4..8], &[10, 20, 30, 255]);
        assert_eq!(&frame[12..16], &BORDER_COLOR);
    }

    #[test]
    fn copy_forces_opaque_output() {
        let canvas = Canvas::new(1, 1);
        let mut frame = vec![7u8; 4];
        copy_shifted(&mut frame, 1, 1, &canvas, (0, 0));
        assert_eq!(frame, vec![0, 0, 0, 255]);
    }
}
