//! Delayed actions on the simulation clock
//!
//! A min-heap of `(deadline, seq)` pairs. Tasks due at the same time run in
//! the order they were scheduled. Every task has an owner so a chip's pending
//! work can be cancelled when the chip goes away.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::ChipId;

/// Continuation run by the round controller when its deadline passes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScheduledAction {
    LaunchBall,
    Evaluate { slot: u8 },
    ShowResult { slot: u8 },
    CollectWinners,
    ArriveWinner { chip: ChipId, reward: u64 },
    CollectLosers,
    ArriveLoser { chip: ChipId },
    ResetTable { reset_wheel: bool },
    CrabMoveComplete { chip: ChipId, offset: Vec2 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskOwner {
    Round,
    Chip(ChipId),
}

#[derive(Debug, Clone)]
struct Task {
    deadline: f64,
    seq: u64,
    owner: TaskOwner,
    action: ScheduledAction,
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Task {}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Task {
    // Reversed so the heap pops the earliest deadline first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .total_cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now: f64,
    next_seq: u64,
    queue: BinaryHeap<Task>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock (seconds)
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Run `action` once `delay` seconds have passed
    pub fn schedule(&mut self, delay: f32, owner: TaskOwner, action: ScheduledAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Task {
            deadline: self.now + delay.max(0.0) as f64,
            seq,
            owner,
            action,
        });
    }

    pub fn advance(&mut self, dt: f32) {
        self.now += dt as f64;
    }

    /// Next due action, if any
    pub fn pop_due(&mut self) -> Option<ScheduledAction> {
        if self.queue.peek()?.deadline > self.now {
            return None;
        }
        self.queue.pop().map(|task| task.action)
    }

    /// Drop every pending task of `owner`
    pub fn cancel_owner(&mut self, owner: TaskOwner) {
        self.queue.retain(|task| task.owner != owner);
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut Scheduler) -> Vec<ScheduledAction> {
        std::iter::from_fn(|| scheduler.pop_due()).collect()
    }

    #[test]
    fn test_runs_in_deadline_order() {
        let mut s = Scheduler::new();
        s.schedule(2.0, TaskOwner::Round, ScheduledAction::CollectLosers);
        s.schedule(1.0, TaskOwner::Round, ScheduledAction::CollectWinners);
        s.schedule(3.0, TaskOwner::Round, ScheduledAction::ResetTable { reset_wheel: true });

        s.advance(0.5);
        assert!(drain(&mut s).is_empty());
        s.advance(2.0);
        assert_eq!(
            drain(&mut s),
            vec![ScheduledAction::CollectWinners, ScheduledAction::CollectLosers]
        );
        s.advance(1.0);
        assert_eq!(drain(&mut s), vec![ScheduledAction::ResetTable { reset_wheel: true }]);
        assert!(s.is_empty());
    }

    #[test]
    fn test_ties_keep_schedule_order() {
        let mut s = Scheduler::new();
        for slot in 0..5 {
            s.schedule(0.0, TaskOwner::Round, ScheduledAction::Evaluate { slot });
        }
        let slots: Vec<u8> = drain(&mut s)
            .into_iter()
            .map(|a| match a {
                ScheduledAction::Evaluate { slot } => slot,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(slots, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_cancel_by_owner() {
        let mut s = Scheduler::new();
        let chip = ChipId(3);
        s.schedule(1.0, TaskOwner::Chip(chip), ScheduledAction::ArriveLoser { chip });
        s.schedule(1.0, TaskOwner::Chip(ChipId(4)), ScheduledAction::ArriveLoser { chip: ChipId(4) });
        s.schedule(1.0, TaskOwner::Round, ScheduledAction::CollectWinners);
        s.cancel_owner(TaskOwner::Chip(chip));
        s.advance(1.0);
        assert_eq!(
            drain(&mut s),
            vec![
                ScheduledAction::ArriveLoser { chip: ChipId(4) },
                ScheduledAction::CollectWinners
            ]
        );
    }
}
