use engine::Vec2;
use rand::Rng;

pub(crate) const CLOUD_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Cloud {
    pub(crate) position: Vec2,
    pub(crate) image: usize,
    pub(crate) speed: f32,
    /// Parallax factor in `[0.2, 0.8)`; smaller is farther away.
    pub(crate) depth: f32,
}

impl Cloud {
    /// Screen position after parallax, wrapped so the cloud re-enters on
    /// the opposite edge.
    pub(crate) fn screen_position(&self, scroll: Vec2, view_size: Vec2, image_size: Vec2) -> Vec2 {
        let x = self.position.x - scroll.x * self.depth;
        let y = self.position.y - scroll.y * self.depth;
        Vec2::new(
            (x.rem_euclid(view_size.x + image_size.x) - image_size.x).floor(),
            (y.rem_euclid(view_size.y + image_size.y) - image_size.y).floor(),
        )
    }
}

/// Parallax cloud layer, kept sorted far to near.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Clouds {
    clouds: Vec<Cloud>,
}

impl Clouds {
    pub(crate) fn generate(rng: &mut impl Rng, image_count: usize, count: usize) -> Self {
        let image_count = image_count.max(1);
        let mut clouds: Vec<Cloud> = (0..count)
            .map(|_| Cloud {
                position: Vec2::new(rng.gen::<f32>() * 99_999.0, rng.gen::<f32>() * 99_999.0),
                image: rng.gen_range(0..image_count),
                speed: rng.gen::<f32>() * 0.05 + 0.05,
                depth: rng.gen::<f32>() * 0.6 + 0.2,
            })
            .collect();
        clouds.sort_by(|a, b| a.depth.total_cmp(&b.depth));
        Self { clouds }
    }

    pub(crate) fn update(&mut self) {
        for cloud in &mut self.clouds {
            cloud.position.x += cloud.speed;
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Cloud> {
        self.clouds.iter()
    }
}
