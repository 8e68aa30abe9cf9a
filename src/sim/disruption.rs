//! Table disruptions
//!
//! A crab wanders across the felt and nudges one bet. It may show up when
//! the ball is launched and again at "no more bets".

use std::collections::BTreeSet;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::ChipId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisruptionTrigger {
    SpinStart,
    NoMoreBets,
}

/// Picked chip and how to move it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrabMove {
    pub chip: ChipId,
    pub offset: Vec2,
    pub duration: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisruptionScheduler {
    pub spin_start_chance: f32,
    pub no_more_bets_chance: f32,
    /// Chance added per chip on the table
    pub chance_per_chip: f32,
    pub offset: Vec2,
    pub duration: f32,
    /// Chips already nudged this round
    moved: BTreeSet<ChipId>,
}

impl DisruptionScheduler {
    pub fn new(
        spin_start_chance: f32,
        no_more_bets_chance: f32,
        chance_per_chip: f32,
        offset: Vec2,
        duration: f32,
    ) -> Self {
        Self {
            spin_start_chance,
            no_more_bets_chance,
            chance_per_chip,
            offset,
            duration,
            moved: BTreeSet::new(),
        }
    }

    /// Roll probability for a trigger, clamped to [0, 1]
    pub fn chance(&self, trigger: DisruptionTrigger, chips_on_table: usize) -> f32 {
        let base = match trigger {
            DisruptionTrigger::SpinStart => self.spin_start_chance,
            DisruptionTrigger::NoMoreBets => self.no_more_bets_chance,
        };
        (base + self.chance_per_chip * chips_on_table as f32).clamp(0.0, 1.0)
    }

    /// Roll for a crab. `candidates` are the chips resting on the table.
    pub fn roll(
        &mut self,
        trigger: DisruptionTrigger,
        candidates: &[ChipId],
        rng: &mut impl Rng,
    ) -> Option<CrabMove> {
        let chance = self.chance(trigger, candidates.len());
        let open: Vec<ChipId> = candidates
            .iter()
            .copied()
            .filter(|id| !self.moved.contains(id))
            .collect();
        if open.is_empty() || rng.random::<f32>() >= chance {
            return None;
        }
        let chip = open[rng.random_range(0..open.len())];
        self.moved.insert(chip);
        log::info!("A crab goes for chip {chip:?} ({trigger:?})");
        Some(CrabMove {
            chip,
            offset: self.offset,
            duration: self.duration,
        })
    }

    pub fn reset_round(&mut self) {
        self.moved.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn crabs(spin: f32, per_chip: f32) -> DisruptionScheduler {
        DisruptionScheduler::new(spin, 0.0, per_chip, Vec2::new(0.5, 0.0), 1.0)
    }

    #[test]
    fn test_chance_scales_and_clamps() {
        let d = crabs(0.3, 0.25);
        assert_eq!(d.chance(DisruptionTrigger::SpinStart, 0), 0.3);
        assert!((d.chance(DisruptionTrigger::SpinStart, 2) - 0.8).abs() < 1e-6);
        assert_eq!(d.chance(DisruptionTrigger::SpinStart, 10), 1.0);
        assert_eq!(d.chance(DisruptionTrigger::NoMoreBets, 0), 0.0);
    }

    #[test]
    fn test_each_chip_moved_once_per_round() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut d = crabs(1.0, 0.0);
        let chips = [ChipId(0), ChipId(1)];
        let first = d.roll(DisruptionTrigger::SpinStart, &chips, &mut rng).unwrap();
        let second = d.roll(DisruptionTrigger::SpinStart, &chips, &mut rng).unwrap();
        assert_ne!(first.chip, second.chip);
        assert!(d.roll(DisruptionTrigger::SpinStart, &chips, &mut rng).is_none());

        d.reset_round();
        assert!(d.roll(DisruptionTrigger::SpinStart, &chips, &mut rng).is_some());
    }

    #[test]
    fn test_zero_chance_or_empty_table() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut d = crabs(0.0, 0.0);
        for _ in 0..100 {
            assert!(d.roll(DisruptionTrigger::SpinStart, &[ChipId(0)], &mut rng).is_none());
        }
        let mut d = crabs(1.0, 0.0);
        assert!(d.roll(DisruptionTrigger::SpinStart, &[], &mut rng).is_none());
    }
}
