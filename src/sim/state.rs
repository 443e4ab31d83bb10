//! Session state and core simulation types

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::spawn::{SpawnError, TargetFactory};
use crate::assets::SpriteId;
use crate::consts::*;

/// Identity handle for a target.
///
/// Ids are monotonic and never reused, so a deferred removal keyed by id can
/// only ever remove the target it was scheduled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub u32);

/// A single interactive target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    /// Top-left corner in canvas space
    pub pos: Vec2,
    /// Edge length of the square bounding box (immutable after creation)
    pub size: f32,
    /// Displacement per frame, per axis
    pub vel: Vec2,
    pub sprite: SpriteId,
    /// True while the target shows its post-hit explosion pose.
    /// Affects rendering only - the target keeps moving.
    pub exploding: bool,
}

impl Target {
    /// Inclusive containment test against the bounding box
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.pos.x
            && point.x <= self.pos.x + self.size
            && point.y >= self.pos.y
            && point.y <= self.pos.y + self.size
    }
}

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Idle,
    Running,
    Ended,
}

/// Validated canvas dimensions.
///
/// Construction is the single place bounds are checked; spawning inside an
/// existing `Bounds` is infallible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    width: f32,
    height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Result<Self, SpawnError> {
        if width <= 0.0 || height <= 0.0 {
            return Err(SpawnError::InvalidBounds { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Largest valid top-left position for a box of the given size, per axis
    pub fn max_pos(&self, size: f32) -> Vec2 {
        Vec2::new((self.width - size).max(0.0), (self.height - size).max(0.0))
    }
}

/// One round of the game: score, countdown, and the live target collection
#[derive(Debug)]
pub struct GameSession {
    pub score: u32,
    /// Seconds remaining, counts down from `GAME_SECONDS` to 0
    pub time_left: u32,
    pub phase: GamePhase,
    pub targets: Vec<Target>,
    bounds: Bounds,
    factory: TargetFactory,
}

impl GameSession {
    pub fn new(width: f32, height: f32, seed: u64) -> Result<Self, SpawnError> {
        Ok(Self {
            score: 0,
            time_left: GAME_SECONDS,
            phase: GamePhase::Idle,
            targets: Vec::with_capacity(TARGET_COUNT),
            bounds: Bounds::new(width, height)?,
            factory: TargetFactory::new(seed),
        })
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Reset and enter `Running`: fresh score and timer, full target population.
    pub fn begin(&mut self) {
        self.score = 0;
        self.time_left = GAME_SECONDS;
        self.targets.clear();
        self.top_up();
        self.phase = GamePhase::Running;
    }

    /// Enter `Ended` and discard the target collection.
    pub fn finish(&mut self) {
        self.phase = GamePhase::Ended;
        self.targets.clear();
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    /// Append fresh targets until the population is back at `TARGET_COUNT`.
    /// Count-only: does not care why the count dropped.
    pub fn top_up(&mut self) {
        while self.targets.len() < TARGET_COUNT {
            let target = self.factory.spawn_within(self.bounds);
            self.targets.push(target);
        }
    }

    /// Remove a target by identity. Returns false if it is already gone,
    /// which makes a double-fired deferred removal a harmless no-op.
    pub fn remove_target(&mut self, id: TargetId) -> bool {
        let before = self.targets.len();
        self.targets.retain(|t| t.id != id);
        self.targets.len() < before
    }

    /// Spawn one replacement target at the end of the collection.
    pub fn spawn_replacement(&mut self) {
        let target = self.factory.spawn_within(self.bounds);
        self.targets.push(target);
    }

    /// Adopt new canvas dimensions mid-session, clamping every live target
    /// back into range. Positions clamp, velocities are left alone.
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), SpawnError> {
        self.bounds = Bounds::new(width, height)?;
        for target in &mut self.targets {
            let max = self.bounds.max_pos(target.size);
            target.pos = target.pos.clamp(Vec2::ZERO, max);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_populates_and_runs() {
        let mut session = GameSession::new(400.0, 300.0, 7).unwrap();
        assert_eq!(session.phase, GamePhase::Idle);
        session.begin();
        assert_eq!(session.targets.len(), TARGET_COUNT);
        assert_eq!(session.score, 0);
        assert_eq!(session.time_left, GAME_SECONDS);
        assert!(session.is_running());
    }

    #[test]
    fn finish_discards_targets() {
        let mut session = GameSession::new(400.0, 300.0, 7).unwrap();
        session.begin();
        session.finish();
        assert_eq!(session.phase, GamePhase::Ended);
        assert!(session.targets.is_empty());
    }

    #[test]
    fn remove_target_is_identity_based() {
        let mut session = GameSession::new(400.0, 300.0, 7).unwrap();
        session.begin();
        let id = session.targets[2].id;
        assert!(session.remove_target(id));
        assert_eq!(session.targets.len(), TARGET_COUNT - 1);
        // Second removal of the same identity is a no-op
        assert!(!session.remove_target(id));
        assert_eq!(session.targets.len(), TARGET_COUNT - 1);
    }

    #[test]
    fn ids_stay_unique_across_restarts() {
        let mut session = GameSession::new(400.0, 300.0, 7).unwrap();
        session.begin();
        let first_run: Vec<TargetId> = session.targets.iter().map(|t| t.id).collect();
        session.finish();
        session.begin();
        for target in &session.targets {
            assert!(!first_run.contains(&target.id));
        }
    }

    #[test]
    fn resize_clamps_targets_into_new_bounds() {
        let mut session = GameSession::new(800.0, 600.0, 7).unwrap();
        session.begin();
        session.resize(100.0, 100.0).unwrap();
        for target in &session.targets {
            let max = session.bounds().max_pos(target.size);
            assert!(target.pos.x >= 0.0 && target.pos.x <= max.x);
            assert!(target.pos.y >= 0.0 && target.pos.y <= max.y);
        }
    }

    #[test]
    fn resize_rejects_degenerate_dimensions() {
        let mut session = GameSession::new(400.0, 300.0, 7).unwrap();
        assert!(session.resize(0.0, 300.0).is_err());
    }
}
