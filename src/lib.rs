//! Reef Roulette - an underwater casino roulette minigame
//!
//! Core modules:
//! - `sim`: Deterministic simulation (wheel, ball settling, chips, payouts, round lifecycle)
//! - `settings`: Data-driven table tuning loaded from JSON
//! - `history`: Per-round result history
//! - `persistence`: Session-only state that outlives a table reset

pub mod history;
pub mod persistence;
pub mod settings;
pub mod sim;

pub use history::BetHistory;
pub use persistence::SessionState;
pub use settings::{ConfigError, TableSettings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Collider name prefix used by wheel pockets
    pub const SLOT_PREFIX: &str = "Slot_";

    /// European wheel: 0 plus 1..=36
    pub const EUROPEAN_SLOT_COUNT: u8 = 37;
    /// Straight-up payout, split across every covered number
    pub const STRAIGHT_PAYOUT: f32 = 36.0;

    /// Wheel geometry (world units)
    pub const WHEEL_RADIUS: f32 = 5.0;
    pub const WHEEL_CENTER: (f32, f32) = (-9.0, 0.0);
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Move `current` toward `target` by at most `max_delta`, never overshooting
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}
