//! Round result history
//!
//! Records the winning number of each round together with how the player's
//! balance moved since betting opened. Newest entry first.

use serde::{Deserialize, Serialize};

use crate::sim::SlotColor;

/// Default number of rounds to keep
pub const DEFAULT_HISTORY_LEN: usize = 10;

/// A single finished round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Winning pocket
    pub number: u8,
    /// Colour of the winning pocket (None = green zero)
    pub color: SlotColor,
    /// Balance change since the round opened
    pub delta: i64,
}

impl HistoryEntry {
    /// Short label such as `"14 +50"` or `"0 -20"`
    pub fn label(&self) -> String {
        if self.delta > 0 {
            format!("{} +{}", self.number, self.delta)
        } else {
            format!("{} {}", self.number, self.delta)
        }
    }
}

/// Rolling result history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetHistory {
    pub entries: Vec<HistoryEntry>,
    max_entries: usize,
    /// Balance captured when the current round opened
    start_currency: u64,
}

impl Default for BetHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

impl BetHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
            start_currency: 0,
        }
    }

    /// Capture the balance at the start of a betting round
    pub fn start_round(&mut self, currency: u64) {
        self.start_currency = currency;
    }

    /// Record the finished round; returns the stored entry
    pub fn end_round(&mut self, number: u8, color: SlotColor, currency: u64) -> &HistoryEntry {
        let delta = currency as i64 - self.start_currency as i64;
        self.entries.insert(0, HistoryEntry { number, color, delta });
        self.entries.truncate(self.max_entries.max(1));
        &self.entries[0]
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent round (if any)
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    /// One label per line, newest first
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(HistoryEntry::label)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
