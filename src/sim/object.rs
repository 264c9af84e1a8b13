//! Moving object entities (fruits and bombs)
//!
//! An object is an axis-aligned box at `pos` (top-left corner) with a
//! per-tick velocity. Slicing is a one-way state transition; sliced halves
//! keep falling but are decorative.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Rectangle extent in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// What slicing an object does: fruits score, bombs end the session.
///
/// Set explicitly at construction, never inferred from the sprite path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Fruit,
    Bomb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceState {
    Unsliced,
    Sliced,
}

/// Cut axis, derived from the dominant component of the pointer's recent
/// displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceAxis {
    Horizontal,
    Vertical,
}

impl SliceAxis {
    /// `|Δx| > |Δy|` reads as a horizontal swipe, everything else vertical.
    pub fn from_segment(delta: Vec2) -> Self {
        if delta.x.abs() > delta.y.abs() {
            SliceAxis::Horizontal
        } else {
            SliceAxis::Vertical
        }
    }
}

/// A fruit or bomb in flight
#[derive(Debug, Clone)]
pub struct MovingObject {
    pub id: u32,
    pub kind: ObjectKind,
    /// Top-left corner in canvas coordinates (y grows downward)
    pub pos: Vec2,
    /// Per-tick displacement
    pub vel: Vec2,
    pub size: Size,
    pub slice_state: SliceState,
    /// Resource path the render layer resolves to an image
    pub sprite: String,
}

impl MovingObject {
    pub fn new(
        id: u32,
        kind: ObjectKind,
        sprite: impl Into<String>,
        pos: Vec2,
        vel: Vec2,
        size: Size,
    ) -> Self {
        Self {
            id,
            kind,
            pos,
            vel,
            size,
            slice_state: SliceState::Unsliced,
            sprite: sprite.into(),
        }
    }

    /// One Euler step. Gravity accumulates into the vertical velocity every
    /// tick, before the vertical move, and is never reset.
    pub fn integrate(&mut self, gravity: f32) {
        self.pos.x += self.vel.x;
        self.vel.y += gravity;
        self.pos.y += self.vel.y;
    }

    /// Mark the object sliced. Idempotent.
    pub fn slice(&mut self) {
        self.slice_state = SliceState::Sliced;
    }

    pub fn is_sliced(&self) -> bool {
        self.slice_state == SliceState::Sliced
    }

    pub fn is_hazard(&self) -> bool {
        self.kind == ObjectKind::Bomb
    }

    /// Inclusive bounding-box test: points exactly on the edge count as
    /// inside.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.pos.x
            && point.x <= self.pos.x + self.size.width
            && point.y >= self.pos.y
            && point.y <= self.pos.y + self.size.height
    }

    /// True once the object has left the visible canvas: below the floor,
    /// past the right edge, or fully past the left edge.
    pub fn off_bounds(&self, width: f32, height: f32) -> bool {
        self.pos.y > height || self.pos.x > width || self.pos.x < -self.size.width
    }
}
