//! "No more bets" cutoff
//!
//! Watches the wheel after launch and closes betting once it slows to the
//! cutoff speed. Fires at most once per round.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::wheel::WheelState;

/// Shared betting gate.
///
/// Every chip and bag holds a clone and reads it; only the cutoff controller
/// and the round controller flip it.
#[derive(Debug, Clone, Default)]
pub struct BetGate(Rc<Cell<bool>>);

impl BetGate {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.0.get()
    }

    pub(super) fn set_locked(&self, locked: bool) {
        self.0.set(locked);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutoffPhase {
    /// Not armed (before launch)
    Idle,
    /// Armed, polling wheel speed
    Monitoring,
    /// Bets closed this round
    Locked,
}

#[derive(Debug, Clone)]
pub struct BetCutoffController {
    phase: CutoffPhase,
    cutoff_triggered: bool,
    /// |wheel speed| at or below which betting closes
    pub cutoff_speed: f32,
    gate: BetGate,
    warned_missing_wheel: bool,
}

impl BetCutoffController {
    pub fn new(cutoff_speed: f32, gate: BetGate) -> Self {
        Self {
            phase: CutoffPhase::Idle,
            cutoff_triggered: false,
            cutoff_speed,
            gate,
            warned_missing_wheel: false,
        }
    }

    pub fn phase(&self) -> CutoffPhase {
        self.phase
    }

    pub fn is_triggered(&self) -> bool {
        self.cutoff_triggered
    }

    pub fn bets_locked(&self) -> bool {
        self.gate.is_locked()
    }

    /// Arm the cutoff (called on ball launch). No-op once bets closed this round.
    pub fn begin_monitoring(&mut self) {
        if self.phase == CutoffPhase::Idle && !self.cutoff_triggered {
            self.phase = CutoffPhase::Monitoring;
            log::debug!("Bet cutoff armed at {:.1} deg/s", self.cutoff_speed);
        }
    }

    /// Poll the wheel; true on the tick betting closes
    pub fn update(&mut self, wheel: Option<&WheelState>) -> bool {
        if self.phase != CutoffPhase::Monitoring {
            return false;
        }
        let Some(wheel) = wheel else {
            if !self.warned_missing_wheel {
                log::warn!("No wheel attached, bet cutoff disabled");
                self.warned_missing_wheel = true;
            }
            return false;
        };
        if wheel.is_spinning() && wheel.current_spin_speed().abs() <= self.cutoff_speed {
            return self.lock_bets();
        }
        false
    }

    /// Close betting; true only the first time this round
    pub fn lock_bets(&mut self) -> bool {
        if self.cutoff_triggered {
            return false;
        }
        self.cutoff_triggered = true;
        self.phase = CutoffPhase::Locked;
        self.gate.set_locked(true);
        log::info!("No more bets");
        true
    }

    /// Reopen betting. Leaves the trigger set; see `reset_cutoff`.
    pub fn unlock_bets(&mut self) {
        self.gate.set_locked(false);
    }

    /// Clear the trigger and disarm until the next launch
    pub fn reset_cutoff(&mut self) {
        self.cutoff_triggered = false;
        self.phase = CutoffPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn controller() -> (BetGate, BetCutoffController) {
        let gate = BetGate::new();
        let cutoff = BetCutoffController::new(200.0, gate.clone());
        (gate, cutoff)
    }

    #[test]
    fn test_fires_once_when_wheel_slows() {
        let (gate, mut cutoff) = controller();
        let mut wheel = WheelState::new(50.0, 0.01);
        wheel.start_spin(720.0);

        // Not armed yet
        assert!(!cutoff.update(Some(&wheel)));
        cutoff.begin_monitoring();

        let mut fired = 0;
        let mut fired_at = 0.0;
        for _ in 0..(20 * 120) {
            wheel.update(SIM_DT);
            if cutoff.update(Some(&wheel)) {
                fired += 1;
                fired_at = wheel.current_spin_speed();
            }
        }
        assert_eq!(fired, 1);
        assert!(fired_at <= 200.0 && fired_at > 199.0);
        assert!(gate.is_locked());
        assert_eq!(cutoff.phase(), CutoffPhase::Locked);
    }

    #[test]
    fn test_stopped_wheel_never_fires() {
        let (gate, mut cutoff) = controller();
        let wheel = WheelState::new(50.0, 0.01);
        cutoff.begin_monitoring();
        assert!(!cutoff.update(Some(&wheel)));
        assert!(!gate.is_locked());
    }

    #[test]
    fn test_missing_wheel_degrades() {
        let (gate, mut cutoff) = controller();
        cutoff.begin_monitoring();
        for _ in 0..10 {
            assert!(!cutoff.update(None));
        }
        assert!(!gate.is_locked());
        assert_eq!(cutoff.phase(), CutoffPhase::Monitoring);
    }

    #[test]
    fn test_launch_after_manual_lock_stays_locked() {
        let (_gate, mut cutoff) = controller();
        assert!(cutoff.lock_bets());
        cutoff.begin_monitoring();
        assert_eq!(cutoff.phase(), CutoffPhase::Locked);

        let mut wheel = WheelState::new(0.0, 1.0);
        wheel.start_spin(100.0);
        assert!(!cutoff.update(Some(&wheel)));
        assert!(cutoff.is_triggered());
    }

    #[test]
    fn test_unlock_and_reset_are_separate() {
        let (gate, mut cutoff) = controller();
        assert!(cutoff.lock_bets());
        assert!(!cutoff.lock_bets());

        cutoff.unlock_bets();
        assert!(!gate.is_locked());
        assert!(cutoff.is_triggered());
        // Still triggered, so no second lock this round
        assert!(!cutoff.lock_bets());
        assert!(!gate.is_locked());

        cutoff.reset_cutoff();
        assert!(!cutoff.is_triggered());
        assert_eq!(cutoff.phase(), CutoffPhase::Idle);
        assert!(cutoff.lock_bets());
        assert!(gate.is_locked());
    }
}
