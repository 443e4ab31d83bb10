//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (storage order)
//! - No rendering or platform dependencies

pub mod hit;
pub mod spawn;
pub mod state;
pub mod tick;

pub use hit::{PointerKind, PointerSample, Viewport, hits_at};
pub use spawn::{SpawnError, TargetFactory};
pub use state::{Bounds, GamePhase, GameSession, Target, TargetId};
pub use tick::tick;
