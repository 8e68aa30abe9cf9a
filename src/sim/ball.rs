//! Ball settling state machine
//!
//! Phases move forward only: `Free -> ContactTracking -> Settling -> Locked`.
//! `reset_ball` is the only way back to `Free`.
//!
//! - Slot contacts arrive as trigger enter/exit callbacks
//! - A lock needs exactly one touched pocket, held for `time_to_confirm`
//!   seconds while the wheel is slow enough
//! - Zero or several touched pockets is a wait state, never a guess

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::layout::WheelLayout;
use super::physics::{BodyId, PhysicsWorld};
use super::state::parse_slot_name;
use super::wheel::WheelState;

/// Where the ball is in its settle sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BallPhase {
    /// Not yet launched
    Free,
    /// Moving; watching pocket contacts
    ContactTracking,
    /// Resting against a single pocket
    Settling { slot: u8, time: f32 },
    /// Terminal: pocket confirmed
    Locked { slot: u8 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallState {
    pub body: BodyId,
    phase: BallPhase,
    /// Pockets currently in contact
    touching: BTreeSet<u8>,
    /// Set while the contact count is 0 or >= 2 (log once per episode)
    ambiguous: bool,
    /// Following the wheel after a lock
    attached: bool,
    pub time_to_confirm: f32,
    pub movement_start_threshold: f32,
    pub spin_lock_threshold: f32,
}

impl BallState {
    pub fn new(
        body: BodyId,
        time_to_confirm: f32,
        movement_start_threshold: f32,
        spin_lock_threshold: f32,
    ) -> Self {
        Self {
            body,
            phase: BallPhase::Free,
            touching: BTreeSet::new(),
            ambiguous: false,
            attached: false,
            time_to_confirm,
            movement_start_threshold,
            spin_lock_threshold,
        }
    }

    pub fn phase(&self) -> BallPhase {
        self.phase
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.phase, BallPhase::Locked { .. })
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Locked pocket, if any
    pub fn winning_slot(&self) -> Option<u8> {
        match self.phase {
            BallPhase::Locked { slot } => Some(slot),
            _ => None,
        }
    }

    /// Pockets the ball is touching right now
    pub fn touching(&self) -> impl Iterator<Item = u8> + '_ {
        self.touching.iter().copied()
    }

    /// Seconds spent on the current single pocket
    pub fn time_in_current_slot(&self) -> f32 {
        match self.phase {
            BallPhase::Settling { time, .. } => time,
            _ => 0.0,
        }
    }

    pub fn on_slot_enter(&mut self, slot: u8) {
        if !self.is_locked() {
            self.touching.insert(slot);
        }
    }

    pub fn on_slot_exit(&mut self, slot: u8) {
        if !self.is_locked() {
            self.touching.remove(&slot);
        }
    }

    /// Trigger callback keyed by collider name; non-pocket colliders are ignored
    pub fn on_trigger_enter(&mut self, collider_name: &str) {
        if let Some(slot) = parse_slot_name(collider_name) {
            self.on_slot_enter(slot);
        }
    }

    pub fn on_trigger_exit(&mut self, collider_name: &str) {
        if let Some(slot) = parse_slot_name(collider_name) {
            self.on_slot_exit(slot);
        }
    }

    /// Advance one tick. Returns the pocket on the tick the ball locks.
    pub fn update(
        &mut self,
        dt: f32,
        wheel: Option<&WheelState>,
        layout: &WheelLayout,
        physics: &mut impl PhysicsWorld,
    ) -> Option<u8> {
        match self.phase {
            BallPhase::Locked { slot } => {
                self.follow_wheel(slot, wheel, layout, physics);
                return None;
            }
            BallPhase::Free => {
                let speed = physics.velocity(self.body).length();
                if speed <= self.movement_start_threshold {
                    return None;
                }
                log::debug!("Ball moving at {speed:.2}, tracking pocket contacts");
                self.phase = BallPhase::ContactTracking;
            }
            BallPhase::ContactTracking | BallPhase::Settling { .. } => {}
        }

        let wheel_slow = wheel.is_none_or(|w| {
            !w.is_spinning() || w.current_spin_speed().abs() <= self.spin_lock_threshold
        });
        let single = if self.touching.len() == 1 {
            self.touching.first().copied()
        } else {
            None
        };

        match single {
            Some(_) => self.ambiguous = false,
            None => {
                if !self.ambiguous {
                    log::debug!(
                        "Ball touching {} pockets, waiting for a single contact",
                        self.touching.len()
                    );
                    self.ambiguous = true;
                }
            }
        }

        let Some(slot) = single.filter(|_| wheel_slow) else {
            self.phase = BallPhase::ContactTracking;
            return None;
        };

        let time = match self.phase {
            BallPhase::Settling { slot: current, time } if current == slot => time + dt,
            _ => dt,
        };
        self.phase = BallPhase::Settling { slot, time };

        if time >= self.time_to_confirm {
            let angle = wheel.map_or(0.0, |w| w.angle());
            self.lock_into_slot(slot, angle, layout, physics);
            return Some(slot);
        }
        None
    }

    /// Freeze the ball in a pocket and stop contact tracking
    pub fn lock_into_slot(
        &mut self,
        slot: u8,
        wheel_angle: f32,
        layout: &WheelLayout,
        physics: &mut impl PhysicsWorld,
    ) {
        physics.set_velocity(self.body, Vec2::ZERO);
        physics.set_angular_velocity(self.body, 0.0);
        physics.set_kinematic(self.body, true);

        match layout.rest_position(slot, wheel_angle) {
            Some((pos, anchored)) => {
                if !anchored {
                    log::warn!("Pocket {slot} has no anchor, resting the ball at its centre");
                }
                physics.set_position(self.body, pos);
                self.attached = true;
            }
            None => log::warn!("Pocket {slot} is not on this wheel, ball left in place"),
        }

        self.touching.clear();
        self.ambiguous = false;
        self.phase = BallPhase::Locked { slot };
        log::info!("Ball locked into pocket {slot}");
    }

    fn follow_wheel(
        &self,
        slot: u8,
        wheel: Option<&WheelState>,
        layout: &WheelLayout,
        physics: &mut impl PhysicsWorld,
    ) {
        if !self.attached {
            return;
        }
        let angle = wheel.map_or(0.0, |w| w.angle());
        if let Some((pos, _)) = layout.rest_position(slot, angle) {
            physics.set_position(self.body, pos);
        }
    }

    /// Back to `Free` and detached
    pub fn reset_ball(&mut self) {
        self.phase = BallPhase::Free;
        self.touching.clear();
        self.ambiguous = false;
        self.attached = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::physics::SimplePhysics;
    use proptest::prelude::*;

    fn launched() -> (SimplePhysics, BallState, WheelLayout) {
        let mut physics = SimplePhysics::new();
        let body = physics.add_body(Vec2::ZERO, 1.0, 0.0);
        physics.set_kinematic(body, false);
        physics.set_velocity(body, Vec2::new(0.0, 2.0));
        let ball = BallState::new(body, 3.0, 0.5, 30.0);
        (physics, ball, WheelLayout::european())
    }

    fn run(
        ball: &mut BallState,
        seconds: f32,
        wheel: Option<&WheelState>,
        layout: &WheelLayout,
        physics: &mut SimplePhysics,
    ) -> Option<u8> {
        let ticks = (seconds / SIM_DT).ceil() as usize;
        for _ in 0..ticks {
            if let Some(slot) = ball.update(SIM_DT, wheel, layout, physics) {
                return Some(slot);
            }
        }
        None
    }

    #[test]
    fn test_no_lock_before_launch() {
        let mut physics = SimplePhysics::new();
        let body = physics.add_body(Vec2::ZERO, 1.0, 0.0);
        let mut ball = BallState::new(body, 0.5, 0.5, 30.0);
        let layout = WheelLayout::european();
        ball.on_slot_enter(7);
        assert_eq!(run(&mut ball, 2.0, None, &layout, &mut physics), None);
        assert_eq!(ball.phase(), BallPhase::Free);
    }

    #[test]
    fn test_locks_after_confirm_window() {
        let (mut physics, mut ball, layout) = launched();
        ball.on_trigger_enter("Slot_14");
        assert_eq!(run(&mut ball, 2.9, None, &layout, &mut physics), None);
        assert_eq!(run(&mut ball, 0.2, None, &layout, &mut physics), Some(14));
        assert_eq!(ball.winning_slot(), Some(14));
        assert!(ball.is_attached());
        assert_eq!(physics.velocity(ball.body), Vec2::ZERO);
        assert!(physics.body(ball.body).unwrap().kinematic);

        // Contacts after lock are ignored
        ball.on_slot_enter(3);
        assert_eq!(ball.touching().count(), 0);
    }

    #[test]
    fn test_two_contacts_never_lock() {
        let (mut physics, mut ball, layout) = launched();
        ball.on_slot_enter(14);
        ball.on_slot_enter(31);
        assert_eq!(run(&mut ball, 10.0, None, &layout, &mut physics), None);
        assert_eq!(ball.phase(), BallPhase::ContactTracking);

        ball.on_slot_exit(31);
        assert_eq!(run(&mut ball, 3.1, None, &layout, &mut physics), Some(14));
    }

    #[test]
    fn test_slot_change_restarts_timer() {
        let (mut physics, mut ball, layout) = launched();
        ball.on_slot_enter(5);
        run(&mut ball, 2.0, None, &layout, &mut physics);
        ball.on_slot_exit(5);
        ball.on_slot_enter(24);
        run(&mut ball, 0.5, None, &layout, &mut physics);
        assert!(ball.time_in_current_slot() < 1.0);
        assert_eq!(run(&mut ball, 2.6, None, &layout, &mut physics), Some(24));
    }

    #[test]
    fn test_fast_wheel_blocks_lock() {
        let (mut physics, mut ball, layout) = launched();
        let mut wheel = WheelState::new(0.0, 0.01);
        wheel.start_spin(300.0);
        ball.on_slot_enter(9);
        assert_eq!(run(&mut ball, 5.0, Some(&wheel), &layout, &mut physics), None);

        wheel.start_spin(25.0);
        assert_eq!(run(&mut ball, 3.1, Some(&wheel), &layout, &mut physics), Some(9));
    }

    #[test]
    fn test_locked_ball_follows_wheel() {
        let (mut physics, mut ball, layout) = launched();
        let mut wheel = WheelState::new(0.0, 0.01);
        wheel.start_spin(20.0);
        ball.on_slot_enter(0);
        assert_eq!(run(&mut ball, 3.1, Some(&wheel), &layout, &mut physics), Some(0));
        let before = physics.position(ball.body);
        for _ in 0..60 {
            wheel.update(SIM_DT);
            ball.update(SIM_DT, Some(&wheel), &layout, &mut physics);
        }
        assert!(physics.position(ball.body).distance(before) > 1e-3);
    }

    #[test]
    fn test_reset_returns_to_free() {
        let (mut physics, mut ball, layout) = launched();
        ball.on_slot_enter(2);
        run(&mut ball, 3.1, None, &layout, &mut physics);
        assert!(ball.is_locked());
        ball.reset_ball();
        assert_eq!(ball.phase(), BallPhase::Free);
        assert_eq!(ball.winning_slot(), None);
        assert!(!ball.is_attached());
    }

    proptest! {
        /// Lock fires exactly when one pocket has been held for the confirm window
        #[test]
        fn prop_lock_iff_continuous_single_contact(
            steps in prop::collection::vec((prop::option::of(0u8..3), 1usize..90), 1..20),
        ) {
            let (mut physics, mut ball, layout) = launched();
            let confirm = ball.time_to_confirm;
            let mut current: Option<u8> = None;
            let mut held = 0.0f32;
            let mut expected = None;

            'outer: for (slot, ticks) in steps {
                if let Some(prev) = current {
                    ball.on_slot_exit(prev);
                }
                if let Some(s) = slot {
                    ball.on_slot_enter(s);
                }
                if slot != current {
                    held = 0.0;
                }
                current = slot;
                for _ in 0..ticks {
                    let locked = ball.update(SIM_DT, None, &layout, &mut physics);
                    match current {
                        Some(s) => {
                            held += SIM_DT;
                            if held >= confirm {
                                expected = Some(s);
                            }
                        }
                        None => held = 0.0,
                    }
                    prop_assert_eq!(locked, expected);
                    if locked.is_some() {
                        break 'outer;
                    }
                }
            }
        }
    }
}
