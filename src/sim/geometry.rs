//! Table geometry for colliders and chip footprints
//!
//! Bet zones, bags and the tip jar are axis-aligned rectangles on the table.
//! Chips are circles. Wheel pockets sit on a ring around the wheel centre.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{normalize_angle, polar_to_cartesian};

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Rectangle of the given size centred on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() / 2.0;
        Self::new(center - half, center + half)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Closest point of the rectangle to `point`
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }

    pub fn intersects_circle(&self, circle: &Circle) -> bool {
        let closest = self.closest_point(circle.center);
        closest.distance_squared(circle.center) <= circle.radius * circle.radius
    }
}

/// Circle footprint (chips)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            radius: radius.abs(),
        }
    }
}

/// Angle (radians) of pocket `index` on a wheel with `count` pockets.
///
/// Pocket 0 sits at 12 o'clock and numbering runs clockwise, so the
/// angle decreases with the index. `wheel_angle_deg` is the wheel's current
/// rotation in degrees (counter-clockwise positive).
pub fn pocket_angle(index: u8, count: u8, wheel_angle_deg: f32) -> f32 {
    let step = std::f32::consts::TAU / count.max(1) as f32;
    let base = std::f32::consts::FRAC_PI_2 - index as f32 * step;
    normalize_angle(base + wheel_angle_deg.to_radians())
}

/// World-space centre of a pocket on a wheel
pub fn pocket_center(center: Vec2, radius: f32, index: u8, count: u8, wheel_angle_deg: f32) -> Vec2 {
    center + polar_to_cartesian(radius, pocket_angle(index, count, wheel_angle_deg))
}
