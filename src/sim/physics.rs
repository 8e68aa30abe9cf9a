//! Physics boundary
//!
//! The rigid-body simulation is an external service. The table only issues
//! the handful of commands it needs and asks overlap questions.
//! `SimplePhysics` is a minimal world for headless runs and tests: point
//! bodies with linear damping and static rectangle colliders.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Circle, Rect};

/// Identifier of a rigid body
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Identifier of a static collider (zones, bags, tip jar)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColliderId(pub u32);

/// Commands and queries the table issues to the physics engine
pub trait PhysicsWorld {
    fn set_kinematic(&mut self, body: BodyId, kinematic: bool);
    fn set_velocity(&mut self, body: BodyId, velocity: Vec2);
    fn set_angular_velocity(&mut self, body: BodyId, angular_velocity: f32);
    fn apply_impulse(&mut self, body: BodyId, impulse: Vec2);
    fn set_position(&mut self, body: BodyId, position: Vec2);
    fn velocity(&self, body: BodyId) -> Vec2;
    fn position(&self, body: BodyId) -> Vec2;
    /// Static colliders overlapping the footprint, in stable order
    fn query_overlap(&self, footprint: &Circle) -> Vec<ColliderId>;
    /// Advance the simulation
    fn step(&mut self, dt: f32);
}

/// Body simulated by `SimplePhysics`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub angular_vel: f32,
    pub mass: f32,
    /// Linear damping (1/s)
    pub damping: f32,
    pub kinematic: bool,
}

/// Minimal deterministic physics world
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimplePhysics {
    bodies: BTreeMap<BodyId, Body>,
    colliders: BTreeMap<ColliderId, Rect>,
    next_body: u32,
    next_collider: u32,
}

impl SimplePhysics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body (starts kinematic, at rest)
    pub fn add_body(&mut self, pos: Vec2, mass: f32, damping: f32) -> BodyId {
        let id = BodyId(self.next_body);
        self.next_body += 1;
        self.bodies.insert(
            id,
            Body {
                pos,
                vel: Vec2::ZERO,
                angular_vel: 0.0,
                mass: mass.max(f32::EPSILON),
                damping,
                kinematic: true,
            },
        );
        id
    }

    pub fn add_collider(&mut self, rect: Rect) -> ColliderId {
        let id = ColliderId(self.next_collider);
        self.next_collider += 1;
        self.colliders.insert(id, rect);
        id
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn collider(&self, id: ColliderId) -> Option<&Rect> {
        self.colliders.get(&id)
    }
}

impl PhysicsWorld for SimplePhysics {
    fn set_kinematic(&mut self, body: BodyId, kinematic: bool) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.kinematic = kinematic;
        }
    }

    fn set_velocity(&mut self, body: BodyId, velocity: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.vel = velocity;
        }
    }

    fn set_angular_velocity(&mut self, body: BodyId, angular_velocity: f32) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.angular_vel = angular_velocity;
        }
    }

    fn apply_impulse(&mut self, body: BodyId, impulse: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            if !b.kinematic {
                b.vel += impulse / b.mass;
            }
        }
    }

    fn set_position(&mut self, body: BodyId, position: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.pos = position;
        }
    }

    fn velocity(&self, body: BodyId) -> Vec2 {
        self.bodies.get(&body).map(|b| b.vel).unwrap_or(Vec2::ZERO)
    }

    fn position(&self, body: BodyId) -> Vec2 {
        self.bodies.get(&body).map(|b| b.pos).unwrap_or(Vec2::ZERO)
    }

    fn query_overlap(&self, footprint: &Circle) -> Vec<ColliderId> {
        self.colliders
            .iter()
            .filter(|(_, rect)| rect.intersects_circle(footprint))
            .map(|(id, _)| *id)
            .collect()
    }

    fn step(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            if body.kinematic {
                continue;
            }
            body.pos += body.vel * dt;
            body.vel *= (-body.damping * dt).exp();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_ignored_while_kinematic() {
        let mut world = SimplePhysics::new();
        let ball = world.add_body(Vec2::ZERO, 2.0, 0.0);
        world.apply_impulse(ball, Vec2::new(0.0, 10.0));
        assert_eq!(world.velocity(ball), Vec2::ZERO);

        world.set_kinematic(ball, false);
        world.apply_impulse(ball, Vec2::new(0.0, 10.0));
        assert_eq!(world.velocity(ball), Vec2::new(0.0, 5.0));
    }

    #[test]
    fn test_step_integrates_and_damps() {
        let mut world = SimplePhysics::new();
        let body = world.add_body(Vec2::ZERO, 1.0, 1.0);
        world.set_kinematic(body, false);
        world.set_velocity(body, Vec2::new(1.0, 0.0));
        world.step(0.5);
        assert!((world.position(body).x - 0.5).abs() < 1e-6);
        assert!(world.velocity(body).x < 1.0);
    }

    #[test]
    fn test_query_overlap_stable_order() {
        let mut world = SimplePhysics::new();
        let a = world.add_collider(Rect::from_center(Vec2::ZERO, Vec2::splat(2.0)));
        let b = world.add_collider(Rect::from_center(Vec2::new(1.5, 0.0), Vec2::splat(2.0)));
        let _far = world.add_collider(Rect::from_center(Vec2::new(10.0, 0.0), Vec2::splat(2.0)));
        let hits = world.query_overlap(&Circle::new(Vec2::new(0.75, 0.0), 0.1));
        assert_eq!(hits, vec![a, b]);
    }
}
