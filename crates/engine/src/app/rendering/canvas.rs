use crate::geometry::Vec2;
use crate::sprite::SpriteImage;

pub type Rgba = [u8; 4];

pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

/// Software RGBA8 surface with source-over blending.
///
/// All drawing clips against the canvas bounds; positions outside are
/// silently skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Canvas {
    /// Fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        let offset = self.offset_of(x, y)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.rgba[offset..offset + 4]);
        Some(out)
    }

    pub fn clear(&mut self, color: Rgba) {
        for chunk in self.rgba.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    /// Overwrites without blending.
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if let Some(offset) = self.offset_of(x, y) {
            self.rgba[offset..offset + 4].copy_from_slice(&color);
        }
    }

    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if color[3] == 0 {
            return;
        }
        if let Some(offset) = self.offset_of(x, y) {
            let dst = &mut self.rgba[offset..offset + 4];
            blend_over(dst, color);
        }
    }

    pub fn blit(&mut self, sprite: &SpriteImage, x: i32, y: i32, flip_x: bool) {
        self.blit_with_alpha(sprite, x, y, flip_x, 255);
    }

    /// Blits with source alpha scaled by `alpha / 255`.
    pub fn blit_with_alpha(&mut self, sprite: &SpriteImage, x: i32, y: i32, flip_x: bool, alpha: u8) {
        let width = sprite.width();
        for sy in 0..sprite.height() {
            for sx in 0..width {
                let Some(mut color) = sprite.pixel(sx, sy) else {
                    continue;
                };
                color[3] = ((color[3] as u16 * alpha as u16) / 255) as u8;
                let dx = if flip_x { width - 1 - sx } else { sx };
                self.blend_pixel(x + dx as i32, y + sy as i32, color);
            }
        }
    }

    /// Nearest-neighbour scale of `sprite` into the rectangle at (x, y).
    pub fn blit_scaled(&mut self, sprite: &SpriteImage, x: i32, y: i32, w: u32, h: u32) {
        if sprite.width() == 0 || sprite.height() == 0 || w == 0 || h == 0 {
            return;
        }
        for dy in 0..h {
            let sy = (dy as u64 * sprite.height() as u64 / h as u64) as u32;
            for dx in 0..w {
                let sx = (dx as u64 * sprite.width() as u64 / w as u64) as u32;
                if let Some(color) = sprite.pixel(sx, sy) {
                    self.blend_pixel(x + dx as i32, y + dy as i32, color);
                }
            }
        }
    }

    /// Composites another canvas on top of this one at (x, y).
    pub fn draw_canvas(&mut self, other: &Canvas, x: i32, y: i32) {
        for sy in 0..other.height as i32 {
            for sx in 0..other.width as i32 {
                if let Some(color) = other.pixel(sx, sy) {
                    self.blend_pixel(x + sx, y + sy, color);
                }
            }
        }
    }

    /// Mask of every mostly-opaque pixel, painted as `color` with `alpha`.
    pub fn silhouette(&self, color: [u8; 3], alpha: u8) -> Canvas {
        let mut out = Canvas::new(self.width, self.height);
        let fill = [color[0], color[1], color[2], alpha];
        for (src, dst) in self
            .rgba
            .chunks_exact(4)
            .zip(out.rgba.chunks_exact_mut(4))
        {
            if src[3] > 127 {
                dst.copy_from_slice(&fill);
            }
        }
        out
    }

    /// Paints `color` over every pixel whose center lies outside the circle.
    pub fn mask_outside_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        let radius_sq = radius.max(0.0) * radius.max(0.0);
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let dx = x as f32 + 0.5 - center.x;
                let dy = y as f32 + 0.5 - center.y;
                if dx * dx + dy * dy > radius_sq {
                    self.put_pixel(x, y, color);
                }
            }
        }
    }

    /// Even-odd fill of a closed polygon, sampling pixel centers.
    pub fn fill_polygon(&mut self, points: &[Vec2], color: Rgba) {
        if points.len() < 3 {
            return;
        }
        let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        for point in points {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }
        let x_start = (min_x.floor() as i32).max(0);
        let x_end = (max_x.ceil() as i32).min(self.width as i32 - 1);
        let y_start = (min_y.floor() as i32).max(0);
        let y_end = (max_y.ceil() as i32).min(self.height as i32 - 1);
        for y in y_start..=y_end {
            for x in x_start..=x_end {
                if polygon_contains(points, Vec2::new(x as f32 + 0.5, y as f32 + 0.5)) {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    fn offset_of(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }
}

fn blend_over(dst: &mut [u8], src: Rgba) {
    let src_a = src[3] as u32;
    if src_a == 255 {
        dst.copy_from_slice(&src);
        return;
    }
    let dst_a = dst[3] as u32;
    let inv = 255 - src_a;
    let out_a = src_a + dst_a * inv / 255;
    if out_a == 0 {
        dst.copy_from_slice(&TRANSPARENT);
        return;
    }
    for channel in 0..3 {
        let blended = (src[channel] as u32 * src_a + dst[channel] as u32 * dst_a * inv / 255) / out_a;
        dst[channel] = blended.min(255) as u8;
    }
    dst[3] = out_a.min(255) as u8;
}

fn polygon_contains(points: &[Vec2], sample: Vec2) -> bool {
    let mut inside = false;
    let mut previous = points[points.len() - 1];
    for &current in points {
        if (current.y > sample.y) != (previous.y > sample.y) {
            let t = (sample.y - current.y) / (previous.y - current.y);
            let crossing_x = current.x + t * (previous.x - current.x);
            if sample.x < crossing_x {
                inside = !inside;
            }
        }
        previous = current;
    }
    inside
}
