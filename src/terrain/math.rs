use bevy::math::{DVec2, IVec2};
use fixed::types::I48F16;
use serde::{Deserialize, Serialize};

/// Fixed-point number used wherever an agent radius has to act as a map key.
///
/// `f64` is neither `Ord` nor `Hash`; quantizing radii to I48F16 gives a total
/// order and makes "same radius" exact (two radii closer than ~0.000015 share
/// one compiled view).
pub type FixedNum = I48F16;

/// Quantize an agent radius into a cache key.
///
/// Panics on negative or non-finite radii; those can only come from a caller
/// bug and would otherwise silently alias radius 0.
pub fn radius_key(agent_radius: f64) -> FixedNum {
    assert!(
        agent_radius.is_finite() && agent_radius >= 0.0,
        "agent radius must be finite and non-negative, got {agent_radius}"
    );
    FixedNum::from_num(agent_radius)
}

/// Axis-aligned integer rectangle. `top` is the minimum y, `bottom` the maximum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntRect2 {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl IntRect2 {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.left as f64
            && p.y >= self.top as f64
            && p.x <= self.right as f64
            && p.y <= self.bottom as f64
    }

    pub fn intersects(&self, other: &IntRect2) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &IntRect2) -> IntRect2 {
        IntRect2 {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Bounds of `points` grown by one unit after flooring/ceiling, so that
    /// later float queries landing a hair outside the exact box still hit it.
    pub fn padded_bounds_of(points: &[DVec2]) -> IntRect2 {
        let mut rect = IntRect2 {
            left: i32::MAX,
            top: i32::MAX,
            right: i32::MIN,
            bottom: i32::MIN,
        };
        for p in points {
            rect.left = rect.left.min(p.x.floor() as i32 - 1);
            rect.right = rect.right.max(p.x.ceil() as i32 + 1);
            rect.top = rect.top.min(p.y.floor() as i32 - 1);
            rect.bottom = rect.bottom.max(p.y.ceil() as i32 + 1);
        }
        rect
    }

    pub fn corners(&self) -> [IVec2; 4] {
        [
            IVec2::new(self.left, self.top),
            IVec2::new(self.right, self.top),
            IVec2::new(self.right, self.bottom),
            IVec2::new(self.left, self.bottom),
        ]
    }
}
