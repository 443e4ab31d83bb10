//! Target factory
//!
//! Produces randomized targets with their full bounding box inside the canvas.
//! Position, size, velocity, and sprite slot are all drawn from one seeded
//! `Pcg32`, so a run is reproducible from its seed.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use thiserror::Error;

use super::state::{Bounds, Target, TargetId};
use crate::assets::SpriteId;
use crate::consts::*;

/// The one fallible condition in the core: a canvas with no area.
#[derive(Debug, Error, PartialEq)]
pub enum SpawnError {
    #[error("canvas bounds must be positive, got {width}x{height}")]
    InvalidBounds { width: f32, height: f32 },
}

/// Randomized target producer. Owns the RNG and the id counter.
#[derive(Debug)]
pub struct TargetFactory {
    rng: Pcg32,
    next_id: u32,
}

impl TargetFactory {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Validate bounds and produce one target. No side effects beyond the
    /// factory's own RNG/id state.
    pub fn create(&mut self, width: f32, height: f32) -> Result<Target, SpawnError> {
        let bounds = Bounds::new(width, height)?;
        Ok(self.spawn_within(bounds))
    }

    /// Infallible path for callers holding already-validated bounds.
    pub fn spawn_within(&mut self, bounds: Bounds) -> Target {
        let id = TargetId(self.next_id);
        self.next_id += 1;

        let size = self.rng.random_range(MIN_TARGET_SIZE..MAX_TARGET_SIZE);
        let max = bounds.max_pos(size);
        let pos = Vec2::new(self.random_coord(max.x), self.random_coord(max.y));
        let vel = Vec2::new(self.random_axis_speed(), self.random_axis_speed());
        let sprite = SpriteId(self.rng.random_range(0..SPRITE_POOL_SIZE) as u8);

        Target {
            id,
            pos,
            size,
            vel,
            sprite,
            exploding: false,
        }
    }

    /// Uniform in [0, max); 0 when the box barely fits (range would be empty)
    fn random_coord(&mut self, max: f32) -> f32 {
        if max > 0.0 {
            self.rng.random_range(0.0..max)
        } else {
            0.0
        }
    }

    /// Uniform in [-MAX_AXIS_SPEED, MAX_AXIS_SPEED); zero is valid and means
    /// a stationary axis
    fn random_axis_speed(&mut self) -> f32 {
        self.rng.random_range(-MAX_AXIS_SPEED..MAX_AXIS_SPEED)
    }
}
