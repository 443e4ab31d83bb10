//! Opaque asset handles
//!
//! The core never touches image or sound data. It hands out `SpriteId`s and
//! the platform layer resolves them against a `SpritePool` built once at
//! startup. In the reference configuration all five slots point at the same
//! underlying image, but nothing here assumes that.

use serde::{Deserialize, Serialize};

use crate::consts::SPRITE_POOL_SIZE;

/// Index into the target sprite pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteId(pub u8);

impl SpriteId {
    /// Slot index, guaranteed `< SPRITE_POOL_SIZE` for ids produced by the factory
    pub fn slot(self) -> usize {
        self.0 as usize
    }
}

/// Fixed pool of resolved sprite assets, one entry per logical slot
pub struct SpritePool<T> {
    slots: Vec<T>,
}

impl<T> SpritePool<T> {
    /// Build a pool by resolving each slot. `resolve` is called once per slot index.
    pub fn resolve(mut resolve: impl FnMut(usize) -> T) -> Self {
        Self {
            slots: (0..SPRITE_POOL_SIZE).map(&mut resolve).collect(),
        }
    }

    /// Look up the asset for a sprite handle.
    ///
    /// Out-of-range ids (possible only for hand-built handles) fall back to slot 0.
    pub fn get(&self, id: SpriteId) -> &T {
        self.slots.get(id.slot()).unwrap_or(&self.slots[0])
    }
}
