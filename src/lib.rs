//! Tap Blitz - a timed target-tapping arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (target motion, hit testing, session state)
//! - `game`: Frame/countdown orchestration and the running/ended state machine
//! - `schedule`: Timer abstraction so the core runs without a real display
//! - `assets`: Opaque sprite/asset handles
//! - `platform`: Browser scheduler (wasm32 only)

pub mod assets;
pub mod game;
pub mod schedule;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod audio;
#[cfg(target_arch = "wasm32")]
pub mod platform;

pub use game::{GameLoop, GameOutput};
pub use sim::{GamePhase, GameSession, Target, TargetId};

/// Game configuration constants
pub mod consts {
    /// Live targets maintained on the canvas
    pub const TARGET_COUNT: usize = 5;
    /// Round length in seconds
    pub const GAME_SECONDS: u32 = 30;
    /// Countdown cadence
    pub const COUNTDOWN_MS: u32 = 1_000;

    /// Target edge length range: [MIN_TARGET_SIZE, MAX_TARGET_SIZE)
    pub const MIN_TARGET_SIZE: f32 = 30.0;
    pub const MAX_TARGET_SIZE: f32 = 50.0;
    /// Per-axis speed range: [-MAX_AXIS_SPEED, MAX_AXIS_SPEED) pixels per frame
    pub const MAX_AXIS_SPEED: f32 = 4.0;

    /// How long a hit target stays in its explosion pose before being replaced
    pub const EXPLOSION_MS: u32 = 200;

    /// Logical sprite slots for target art
    pub const SPRITE_POOL_SIZE: usize = 5;
}
