//! Per-frame simulation tick
//!
//! Advances every target by its velocity, resolves wall bounces, and restores
//! the target population.

use super::state::{Bounds, GameSession, Target};

/// Advance the session by one frame: motion, bounce, repopulate.
pub fn tick(session: &mut GameSession) {
    let bounds = session.bounds();
    for target in &mut session.targets {
        advance(target, bounds);
    }
    session.top_up();
}

/// Discrete wall reflection: at most one reflection per axis per tick,
/// applied independently per axis, with the position clamped back in range.
fn advance(target: &mut Target, bounds: Bounds) {
    target.pos += target.vel;
    let max = bounds.max_pos(target.size);

    if target.pos.x <= 0.0 || target.pos.x + target.size >= bounds.width() {
        target.vel.x = -target.vel.x;
        target.pos.x = target.pos.x.clamp(0.0, max.x);
    }
    if target.pos.y <= 0.0 || target.pos.y + target.size >= bounds.height() {
        target.vel.y = -target.vel.y;
        target.pos.y = target.pos.y.clamp(0.0, max.y);
    }
}
