//! Frame sequences shared between many playback cursors.

use std::sync::Arc;

use crate::sprite::Sprite;

/// Immutable frame list plus timing. Held behind an `Arc` so every running
/// [`Animation`] points at the same images.
#[derive(Debug, Clone)]
pub struct AnimationDef {
    frames: Vec<Sprite>,
    frame_duration: u32,
    looping: bool,
}

impl AnimationDef {
    /// Returns `None` for an empty frame list.
    pub fn new(frames: Vec<Sprite>, frame_duration: u32, looping: bool) -> Option<Self> {
        if frames.is_empty() {
            return None;
        }
        Some(Self {
            frames,
            frame_duration: frame_duration.max(1),
            looping,
        })
    }

    pub fn frame_duration(&self) -> u32 {
        self.frame_duration
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Ticks covered by one pass over the frames.
    pub fn total_ticks(&self) -> u32 {
        self.frame_duration * self.frames.len() as u32
    }

    /// Fresh cursor at frame 0 bound to this definition.
    pub fn instantiate(self: &Arc<Self>) -> Animation {
        self.instantiate_at(0)
    }

    pub fn instantiate_at(self: &Arc<Self>, frame: u32) -> Animation {
        Animation {
            def: Arc::clone(self),
            frame: frame.min(self.total_ticks() - 1),
            done: false,
        }
    }
}

/// Per-instance playback position over a shared [`AnimationDef`].
#[derive(Debug, Clone)]
pub struct Animation {
    def: Arc<AnimationDef>,
    frame: u32,
    done: bool,
}

impl Animation {
    pub fn update(&mut self) {
        let total = self.def.total_ticks();
        if self.def.looping {
            self.frame = (self.frame + 1) % total;
        } else {
            self.frame = (self.frame + 1).min(total - 1);
            if self.frame >= total - 1 {
                self.done = true;
            }
        }
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn image(&self) -> &Sprite {
        let index = (self.frame / self.def.frame_duration) as usize;
        &self.def.frames[index.min(self.def.frames.len() - 1)]
    }

    /// True when both cursors play the same shared definition.
    pub fn shares_def(&self, other: &Arc<AnimationDef>) -> bool {
        Arc::ptr_eq(&self.def, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::SpriteImage;

    fn frames(count: u8) -> Vec<Sprite> {
        (0..count)
            .map(|index| Arc::new(SpriteImage::solid(1, 1, [index, 0, 0, 255])))
            .collect()
    }

    fn shade(animation: &Animation) -> u8 {
        animation.image().rgba()[0]
    }

    #[test]
    fn empty_frame_list_is_rejected() {
        assert!(AnimationDef::new(Vec::new(), 5, true).is_none());
    }

    #[test]
    fn looping_returns_to_first_frame_after_full_cycle() {
        let def = Arc::new(AnimationDef::new(frames(3), 4, true).expect("def"));
        let mut animation = def.instantiate();
        for _ in 0..4 {
            animation.update();
        }
        assert_eq!(shade(&animation), 1);
        for _ in 0..8 {
            animation.update();
        }
        assert_eq!(animation.frame(), 0);
        assert_eq!(shade(&animation), 0);
        assert!(!animation.is_done());
    }

    #[test]
    fn one_shot_finishes_and_holds_last_image() {
        let def = Arc::new(AnimationDef::new(frames(4), 5, false).expect("def"));
        let mut animation = def.instantiate();
        for _ in 0..18 {
            animation.update();
        }
        assert!(!animation.is_done());
        animation.update();
        assert!(animation.is_done());
        assert_eq!(shade(&animation), 3);
        for _ in 0..10 {
            animation.update();
        }
        assert_eq!(animation.frame(), 19);
        assert_eq!(shade(&animation), 3);
    }

    #[test]
    fn cursors_share_frames_but_not_position() {
        let def = Arc::new(AnimationDef::new(frames(2), 1, true).expect("def"));
        let mut first = def.instantiate();
        let second = def.instantiate();
        first.update();
        assert_eq!(first.frame(), 1);
        assert_eq!(second.frame(), 0);
        assert!(first.shares_def(&def) && second.shares_def(&def));
        assert!(Arc::ptr_eq(first.image(), &def.frames[1]));
    }

    #[test]
    fn instantiate_at_clamps_start_frame() {
        let def = Arc::new(AnimationDef::new(frames(2), 3, false).expect("def"));
        assert_eq!(def.instantiate_at(4).frame(), 4);
        assert_eq!(def.instantiate_at(99).frame(), 5);
    }
}
