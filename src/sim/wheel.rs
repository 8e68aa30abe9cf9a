//! Wheel spin state
//!
//! Speed is tracked here rather than read back from the physics body, so the
//! visual rotation, the bet cutoff and the ball lock all see one value that
//! only ever decays toward zero.

use serde::{Deserialize, Serialize};

use crate::move_towards;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelState {
    /// Signed speed in degrees per second
    current_spin_speed: f32,
    /// Accumulated rotation in degrees (counter-clockwise positive)
    angle: f32,
    initial_angle: f32,
    /// Deceleration in degrees per second squared
    pub friction: f32,
    /// |speed| above which the wheel counts as spinning
    pub spin_threshold: f32,
}

impl WheelState {
    pub fn new(friction: f32, spin_threshold: f32) -> Self {
        Self {
            current_spin_speed: 0.0,
            angle: 0.0,
            initial_angle: 0.0,
            friction,
            spin_threshold,
        }
    }

    pub fn start_spin(&mut self, speed: f32) {
        self.current_spin_speed = speed;
        log::info!("Wheel spinning at {speed:.1} deg/s");
    }

    /// Rotate by the current speed, then apply friction
    pub fn update(&mut self, dt: f32) {
        if self.current_spin_speed == 0.0 {
            return;
        }
        self.angle -= self.current_spin_speed * dt;
        self.current_spin_speed = move_towards(self.current_spin_speed, 0.0, self.friction * dt);
    }

    pub fn is_spinning(&self) -> bool {
        self.current_spin_speed.abs() > self.spin_threshold
    }

    pub fn current_spin_speed(&self) -> f32 {
        self.current_spin_speed
    }

    /// Current rotation in degrees
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Stop and restore the starting orientation
    pub fn reset_spin(&mut self) {
        self.current_spin_speed = 0.0;
        self.angle = self.initial_angle;
    }

    /// Stop without touching the orientation
    pub fn stop(&mut self) {
        self.current_spin_speed = 0.0;
    }
}
