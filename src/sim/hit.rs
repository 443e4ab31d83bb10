//! Pointer-to-canvas mapping and hit resolution
//!
//! Raw events arrive in client/viewport coordinates. The canvas may be CSS
//! scaled, so the transform subtracts the canvas' on-screen offset and then
//! rescales each axis by backing-store / displayed size.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Target, TargetId};

/// Where a pointer-down came from. Gameplay treats both the same; the flag
/// exists for logging and because touch events need `preventDefault` upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// One discrete pointer-down event in client space
#[derive(Debug, Clone, Copy)]
pub struct PointerSample {
    pub client: Vec2,
    pub kind: PointerKind,
}

/// Snapshot of how the canvas is laid out on screen
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    /// Backing-store dimensions (canvas pixels)
    pub canvas: Vec2,
    /// Top-left of the canvas in client space
    pub offset: Vec2,
    /// Displayed (CSS) dimensions
    pub display: Vec2,
}

impl Viewport {
    /// Canvas displayed 1:1 at the client-space origin
    pub fn unscaled(width: f32, height: f32) -> Self {
        let canvas = Vec2::new(width, height);
        Self {
            canvas,
            offset: Vec2::ZERO,
            display: canvas,
        }
    }

    /// Map a client-space point into canvas pixel space.
    pub fn to_canvas(&self, client: Vec2) -> Vec2 {
        let local = client - self.offset;
        Vec2::new(
            local.x * scale(self.canvas.x, self.display.x),
            local.y * scale(self.canvas.y, self.display.y),
        )
    }
}

/// Per-axis scale factor; a degenerate displayed dimension maps 1:1 rather
/// than producing inf/NaN coordinates
fn scale(canvas: f32, display: f32) -> f32 {
    if display > 0.0 { canvas / display } else { 1.0 }
}

/// All targets whose box contains the point, in storage order.
///
/// Every overlapping target is reported, not just the topmost - one tap on a
/// pile of targets hits the whole pile.
pub fn hits_at(targets: &[Target], point: Vec2) -> Vec<TargetId> {
    targets
        .iter()
        .filter(|t| t.contains(point))
        .map(|t| t.id)
        .collect()
}
