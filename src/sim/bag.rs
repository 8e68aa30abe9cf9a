//! Chip bags and the bag dispenser
//!
//! A bag turns currency into a chip the player immediately starts dragging.
//! Fixed bags spend their face value; the all-in bag spends everything.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::currency::CurrencyLedger;
use super::geometry::Rect;
use super::physics::ColliderId;
use super::state::{BagId, ChipId};

/// What taking a chip from the bag costs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BagKind {
    Fixed { value: u64 },
    AllIn,
}

/// A bag sitting on the table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChipBag {
    pub id: BagId,
    pub kind: BagKind,
    pub collider: ColliderId,
    pub bounds: Rect,
    /// Chip taken from this bag that is still being dragged
    pub current_chip: Option<ChipId>,
}

impl ChipBag {
    pub fn new(id: BagId, kind: BagKind, collider: ColliderId, bounds: Rect) -> Self {
        Self {
            id,
            kind,
            collider,
            bounds,
            current_chip: None,
        }
    }

    /// Charge the ledger for one chip; returns the chip value on success
    pub fn try_purchase(&self, ledger: &mut CurrencyLedger) -> Option<u64> {
        let amount = match self.kind {
            BagKind::Fixed { value } => value,
            BagKind::AllIn => {
                let amount = ledger.current();
                if amount == 0 {
                    log::debug!("No currency available for an all-in chip");
                    return None;
                }
                amount
            }
        };
        if ledger.try_spend(amount) {
            Some(amount)
        } else {
            log::debug!("Not enough currency to take a {amount} chip");
            None
        }
    }

    /// Re-roll a fixed bag's value within `[min, max]`
    pub fn randomize_value(&mut self, rng: &mut impl Rng, min: u64, max: u64) {
        if let BagKind::Fixed { value } = &mut self.kind {
            *value = rng.random_range(min..=max.max(min));
        }
    }
}

/// Sells extra bags from a price list, one purchase per round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BagDispenser {
    costs: Vec<u64>,
    next_cost_index: usize,
    used_this_round: bool,
}

impl BagDispenser {
    pub fn new(costs: Vec<u64>) -> Self {
        Self {
            costs,
            next_cost_index: 0,
            used_this_round: false,
        }
    }

    /// Price of the next bag, if any remain
    pub fn next_cost(&self) -> Option<u64> {
        self.costs.get(self.next_cost_index).copied()
    }

    /// Can a bag be bought right now?
    pub fn available(&self) -> bool {
        !self.used_this_round && self.next_cost().is_some()
    }

    /// Pay for the next bag; true if the purchase went through
    pub fn try_buy(&mut self, ledger: &mut CurrencyLedger) -> bool {
        if self.used_this_round {
            return false;
        }
        let Some(cost) = self.next_cost() else {
            return false;
        };
        if !ledger.try_spend(cost) {
            return false;
        }
        self.next_cost_index += 1;
        self.used_this_round = true;
        true
    }

    /// Allow one purchase in the new round
    pub fn reset_round(&mut self) {
        self.used_this_round = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn bag(kind: BagKind) -> ChipBag {
        ChipBag::new(
            BagId(0),
            kind,
            ColliderId(0),
            Rect::from_center(Vec2::ZERO, Vec2::ONE),
        )
    }

    #[test]
    fn test_fixed_bag_spends_face_value() {
        let mut ledger = CurrencyLedger::new(30);
        let bag = bag(BagKind::Fixed { value: 25 });
        assert_eq!(bag.try_purchase(&mut ledger), Some(25));
        assert_eq!(ledger.current(), 5);
        assert_eq!(bag.try_purchase(&mut ledger), None);
        assert_eq!(ledger.current(), 5);
    }

    #[test]
    fn test_all_in_spends_everything() {
        let mut ledger = CurrencyLedger::new(130);
        let bag = bag(BagKind::AllIn);
        assert_eq!(bag.try_purchase(&mut ledger), Some(130));
        assert_eq!(ledger.current(), 0);
        assert_eq!(bag.try_purchase(&mut ledger), None);
    }

    #[test]
    fn test_randomized_value_in_range() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut bag = bag(BagKind::Fixed { value: 1 });
        for _ in 0..50 {
            bag.randomize_value(&mut rng, 2, 6);
            let BagKind::Fixed { value } = bag.kind else {
                panic!("bag kind changed");
            };
            assert!((2..=6).contains(&value));
        }
    }

    #[test]
    fn test_dispenser_once_per_round() {
        let mut ledger = CurrencyLedger::new(500);
        let mut dispenser = BagDispenser::new(vec![50, 100]);
        assert!(dispenser.try_buy(&mut ledger));
        assert_eq!(ledger.current(), 450);
        assert!(!dispenser.available());
        assert!(!dispenser.try_buy(&mut ledger));

        dispenser.reset_round();
        assert_eq!(dispenser.next_cost(), Some(100));
        assert!(dispenser.try_buy(&mut ledger));
        assert_eq!(ledger.current(), 350);

        dispenser.reset_round();
        assert!(!dispenser.available());
        assert!(!dispenser.try_buy(&mut ledger));
    }
}
