//! Bet resolution
//!
//! Each chip is resolved on its own against the winning pocket:
//! 1. More than one exclusive group zone under the chip rejects it
//! 2. Any straight zones make it a number bet paying `round(36 / n)`
//! 3. Otherwise the first matching group zone pays its fixed multiplier
//!
//! Collection timing is left to the round controller; the evaluator only
//! classifies and keeps the tallies.

use serde::{Deserialize, Serialize};

use super::chips::ChipRegistry;
use super::layout::TableLayout;
use super::state::{ChipId, Slot, ZoneId};
use crate::consts::STRAIGHT_PAYOUT;

/// Outcome for one chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChipVerdict {
    /// Covers conflicting exclusive zones; not paid, not collected
    Rejected,
    Win { multiplier: u32, reward: u64 },
    Loss,
}

/// Number of exclusive group zones among `zones`
pub fn exclusive_zone_count(zones: &[ZoneId], layout: &TableLayout) -> usize {
    zones
        .iter()
        .filter_map(|id| layout.zone(*id))
        .filter(|z| z.is_exclusive())
        .count()
}

/// A placement is valid while it covers at most one exclusive zone
pub fn is_valid_placement(zones: &[ZoneId], layout: &TableLayout) -> bool {
    exclusive_zone_count(zones, layout) <= 1
}

/// Straight-up multiplier shared across `covered` numbers
pub fn number_multiplier(covered: usize) -> u32 {
    if covered == 0 {
        return 0;
    }
    (STRAIGHT_PAYOUT / covered as f32).round() as u32
}

/// Resolve one chip of `value` covering `zones`
pub fn resolve_chip(value: u64, zones: &[ZoneId], layout: &TableLayout, winning: &Slot) -> ChipVerdict {
    if !is_valid_placement(zones, layout) {
        return ChipVerdict::Rejected;
    }

    let covered = zones.iter().filter_map(|id| layout.zone(*id));

    let mut numbers: Vec<u8> = covered.clone().filter_map(|z| z.linked_slot).collect();
    numbers.sort_unstable();
    numbers.dedup();

    let (won, multiplier) = if !numbers.is_empty() {
        (numbers.contains(&winning.number), number_multiplier(numbers.len()))
    } else {
        match covered
            .filter_map(|z| z.group)
            .find(|group| group.matches(winning))
        {
            Some(group) => (true, group.payout()),
            None => (false, 0),
        }
    };

    if won && multiplier > 0 {
        ChipVerdict::Win {
            multiplier,
            reward: value.saturating_mul(multiplier as u64),
        }
    } else {
        ChipVerdict::Loss
    }
}

/// Running tallies across rounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetStats {
    pub successful: u32,
    pub unsuccessful: u32,
    pub rejected: u32,
    pub total: u32,
}

impl BetStats {
    pub fn record(&mut self, verdict: ChipVerdict) {
        self.total += 1;
        match verdict {
            ChipVerdict::Win { .. } => self.successful += 1,
            ChipVerdict::Loss => self.unsuccessful += 1,
            ChipVerdict::Rejected => self.rejected += 1,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} bets: {} won, {} lost, {} rejected",
            self.total, self.successful, self.unsuccessful, self.rejected
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BetEvaluator {
    stats: BetStats,
    /// Winning chips awaiting collection, with their reward
    winners: Vec<(ChipId, u64)>,
    losers: Vec<ChipId>,
    rejected: Vec<ChipId>,
}

impl BetEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &BetStats {
        &self.stats
    }

    pub fn winners(&self) -> &[(ChipId, u64)] {
        &self.winners
    }

    pub fn losers(&self) -> &[ChipId] {
        &self.losers
    }

    pub fn rejected(&self) -> &[ChipId] {
        &self.rejected
    }

    /// Classify every chip on the table against the winning pocket
    pub fn evaluate(
        &mut self,
        winning: &Slot,
        chips: &ChipRegistry,
        layout: &TableLayout,
    ) -> Vec<(ChipId, ChipVerdict)> {
        self.clear();
        let mut verdicts = Vec::new();
        for chip in chips.on_table() {
            let verdict = resolve_chip(chip.value, chip.zones(), layout, winning);
            self.stats.record(verdict);
            match verdict {
                ChipVerdict::Win { multiplier, reward } => {
                    log::debug!("Chip {:?} wins x{multiplier} ({reward})", chip.id);
                    self.winners.push((chip.id, reward));
                }
                ChipVerdict::Loss => self.losers.push(chip.id),
                ChipVerdict::Rejected => {
                    log::debug!("Chip {:?} rejected: overlapping exclusive zones", chip.id);
                    self.rejected.push(chip.id);
                }
            }
            verdicts.push((chip.id, verdict));
        }
        log::info!(
            "Pocket {}: {} winners, {} losers, {} rejected ({})",
            winning.number,
            self.winners.len(),
            self.losers.len(),
            self.rejected.len(),
            self.stats.summary()
        );
        verdicts
    }

    /// Drop this round's collections (tallies are kept)
    pub fn clear(&mut self) {
        self.winners.clear();
        self.losers.clear();
        self.rejected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::SimplePhysics;
    use crate::sim::state::BetGroup;
    use proptest::prelude::*;

    fn layout() -> TableLayout {
        let mut physics = SimplePhysics::new();
        TableLayout::standard(|rect| physics.add_collider(rect))
    }

    fn numbers(layout: &TableLayout, ns: &[u8]) -> Vec<ZoneId> {
        ns.iter().map(|n| layout.number_zone(*n).unwrap()).collect()
    }

    #[test]
    fn test_straight_bet_with_group_zone() {
        let layout = layout();
        let mut zones = numbers(&layout, &[14]);
        zones.push(layout.group_zone(BetGroup::Red).unwrap());

        assert_eq!(
            resolve_chip(10, &zones, &layout, &Slot::standard(14)),
            ChipVerdict::Win { multiplier: 36, reward: 360 }
        );
        // Number branch wins over the red zone even on another red pocket
        assert_eq!(resolve_chip(10, &zones, &layout, &Slot::standard(16)), ChipVerdict::Loss);
    }

    #[test]
    fn test_even_bet() {
        let layout = layout();
        let zones = vec![layout.group_zone(BetGroup::Even).unwrap()];
        assert_eq!(
            resolve_chip(25, &zones, &layout, &Slot::standard(22)),
            ChipVerdict::Win { multiplier: 2, reward: 50 }
        );
        assert_eq!(resolve_chip(25, &zones, &layout, &Slot::standard(23)), ChipVerdict::Loss);
        assert_eq!(resolve_chip(25, &zones, &layout, &Slot::standard(0)), ChipVerdict::Loss);
    }

    #[test]
    fn test_split_bets_round_multiplier() {
        assert_eq!(number_multiplier(1), 36);
        assert_eq!(number_multiplier(2), 18);
        assert_eq!(number_multiplier(4), 9);
        assert_eq!(number_multiplier(5), 7);
        assert_eq!(number_multiplier(7), 5);
        assert_eq!(number_multiplier(0), 0);

        let layout = layout();
        let zones = numbers(&layout, &[13, 14, 16, 17]);
        assert_eq!(
            resolve_chip(3, &zones, &layout, &Slot::standard(17)),
            ChipVerdict::Win { multiplier: 9, reward: 27 }
        );
    }

    #[test]
    fn test_dozen_and_row_pay_three() {
        let layout = layout();
        let dozen = vec![layout.group_zone(BetGroup::Third12).unwrap()];
        assert_eq!(
            resolve_chip(4, &dozen, &layout, &Slot::standard(30)),
            ChipVerdict::Win { multiplier: 3, reward: 12 }
        );
        let row = vec![layout.group_zone(BetGroup::Top).unwrap()];
        assert_eq!(
            resolve_chip(4, &row, &layout, &Slot::standard(30)),
            ChipVerdict::Win { multiplier: 3, reward: 12 }
        );
    }

    #[test]
    fn test_no_zones_is_a_loss() {
        let layout = layout();
        assert_eq!(resolve_chip(5, &[], &layout, &Slot::standard(1)), ChipVerdict::Loss);
    }

    #[test]
    fn test_stats_summary() {
        let mut stats = BetStats::default();
        stats.record(ChipVerdict::Win { multiplier: 2, reward: 4 });
        stats.record(ChipVerdict::Loss);
        stats.record(ChipVerdict::Rejected);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.summary(), "3 bets: 1 won, 1 lost, 1 rejected");
    }

    proptest! {
        /// Two exclusive zones reject the chip whatever else it covers
        #[test]
        fn prop_two_exclusive_zones_always_rejected(
            a in 0usize..12,
            b in 0usize..12,
            extra in prop::collection::vec(0u8..37, 0..4),
            winning in 0u8..37,
            value in 1u64..1000,
        ) {
            prop_assume!(a != b);
            let layout = layout();
            let mut zones = numbers(&layout, &extra);
            zones.push(layout.group_zone(BetGroup::ALL[a]).unwrap());
            zones.push(layout.group_zone(BetGroup::ALL[b]).unwrap());
            prop_assert_eq!(
                resolve_chip(value, &zones, &layout, &Slot::standard(winning)),
                ChipVerdict::Rejected
            );
        }

        /// A number bet wins exactly when the pocket is covered
        #[test]
        fn prop_number_bet_wins_iff_covered(
            covered in prop::collection::btree_set(0u8..37, 1..8),
            winning in 0u8..37,
            value in 1u64..1000,
        ) {
            let layout = layout();
            let ns: Vec<u8> = covered.iter().copied().collect();
            let zones = numbers(&layout, &ns);
            let verdict = resolve_chip(value, &zones, &layout, &Slot::standard(winning));
            if covered.contains(&winning) {
                let multiplier = number_multiplier(ns.len());
                prop_assert_eq!(verdict, ChipVerdict::Win { multiplier, reward: value * multiplier as u64 });
            } else {
                prop_assert_eq!(verdict, ChipVerdict::Loss);
            }
        }

        /// A single group zone wins exactly when its predicate matches
        #[test]
        fn prop_group_bet_matches_predicate(g in 0usize..12, winning in 0u8..37) {
            let layout = layout();
            let group = BetGroup::ALL[g];
            let zones = vec![layout.group_zone(group).unwrap()];
            let slot = Slot::standard(winning);
            let verdict = resolve_chip(10, &zones, &layout, &slot);
            prop_assert_eq!(matches!(verdict, ChipVerdict::Win { .. }), group.matches(&slot));
        }
    }
}
