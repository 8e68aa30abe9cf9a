//! Player currency ledger

use serde::{Deserialize, Serialize};

/// The player's balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyLedger {
    current: u64,
}

impl CurrencyLedger {
    pub fn new(starting: u64) -> Self {
        Self { current: starting }
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    /// Deduct `amount` if affordable; never goes negative
    pub fn try_spend(&mut self, amount: u64) -> bool {
        if self.current < amount {
            return false;
        }
        self.current -= amount;
        true
    }

    pub fn add(&mut self, amount: u64) {
        self.current = self.current.saturating_add(amount);
    }

    /// Overwrite the balance (session restart)
    pub fn reset(&mut self, amount: u64) {
        self.current = amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_and_add() {
        let mut ledger = CurrencyLedger::new(500);
        assert!(ledger.try_spend(50));
        assert_eq!(ledger.current(), 450);
        assert!(!ledger.try_spend(451));
        assert_eq!(ledger.current(), 450);
        ledger.add(100);
        assert_eq!(ledger.current(), 550);
    }
}
