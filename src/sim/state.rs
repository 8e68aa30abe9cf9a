//! Table data model and presentation events
//!
//! Slots and zones are immutable scene data built once per table.
//! Everything the renderer/animator/audio needs is emitted as a `TableEvent`.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::physics::ColliderId;
use crate::consts::SLOT_PREFIX;

/// Pocket colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlotColor {
    #[default]
    None,
    Red,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Half {
    #[default]
    None,
    /// 1-18
    Low,
    /// 19-36
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Dozen {
    #[default]
    None,
    /// 1-12
    First,
    /// 13-24
    Second,
    /// 25-36
    Third,
}

/// Row of the betting grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Line {
    #[default]
    None,
    Top,
    Middle,
    Bottom,
}

/// Red numbers of a standard wheel
const RED_NUMBERS: [u8; 18] = [1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36];

/// One pocket of the wheel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub number: u8,
    pub color: SlotColor,
    pub parity: Parity,
    pub half: Half,
    pub dozen: Dozen,
    pub line: Line,
    /// Local offset where a locked ball rests (None = pocket centre)
    pub anchor: Option<Vec2>,
}

impl Slot {
    /// Pocket with the attributes of a standard roulette number.
    /// Zero and numbers above 36 carry no group attributes.
    pub fn standard(number: u8) -> Self {
        if number == 0 || number > 36 {
            return Self {
                number,
                color: SlotColor::None,
                parity: Parity::None,
                half: Half::None,
                dozen: Dozen::None,
                line: Line::None,
                anchor: None,
            };
        }

        let color = if RED_NUMBERS.contains(&number) {
            SlotColor::Red
        } else {
            SlotColor::Black
        };
        let parity = if number % 2 == 0 { Parity::Even } else { Parity::Odd };
        let half = if number <= 18 { Half::Low } else { Half::High };
        let dozen = match number {
            1..=12 => Dozen::First,
            13..=24 => Dozen::Second,
            _ => Dozen::Third,
        };
        let line = match number % 3 {
            0 => Line::Top,
            2 => Line::Middle,
            _ => Line::Bottom,
        };

        Self {
            number,
            color,
            parity,
            half,
            dozen,
            line,
            anchor: None,
        }
    }

    /// Collider name, e.g. `Slot_14`
    pub fn name(&self) -> String {
        format!("{SLOT_PREFIX}{}", self.number)
    }
}

/// Parse a collider name following the `Slot_<n>` convention
pub fn parse_slot_name(name: &str) -> Option<u8> {
    name.strip_prefix(SLOT_PREFIX)?.parse().ok()
}

/// Group wager types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BetGroup {
    Red,
    Black,
    Even,
    Odd,
    First12,
    Second12,
    Third12,
    Low,
    High,
    Top,
    Middle,
    Bottom,
}

impl BetGroup {
    pub const ALL: [BetGroup; 12] = [
        BetGroup::Red,
        BetGroup::Black,
        BetGroup::Even,
        BetGroup::Odd,
        BetGroup::First12,
        BetGroup::Second12,
        BetGroup::Third12,
        BetGroup::Low,
        BetGroup::High,
        BetGroup::Top,
        BetGroup::Middle,
        BetGroup::Bottom,
    ];

    /// Does the winning pocket satisfy this group?
    pub fn matches(&self, slot: &Slot) -> bool {
        match self {
            BetGroup::Red => slot.color == SlotColor::Red,
            BetGroup::Black => slot.color == SlotColor::Black,
            BetGroup::Even => slot.parity == Parity::Even,
            BetGroup::Odd => slot.parity == Parity::Odd,
            BetGroup::First12 => slot.dozen == Dozen::First,
            BetGroup::Second12 => slot.dozen == Dozen::Second,
            BetGroup::Third12 => slot.dozen == Dozen::Third,
            BetGroup::Low => slot.half == Half::Low,
            BetGroup::High => slot.half == Half::High,
            BetGroup::Top => slot.line == Line::Top,
            BetGroup::Middle => slot.line == Line::Middle,
            BetGroup::Bottom => slot.line == Line::Bottom,
        }
    }

    /// Payout multiplier (stake included)
    pub fn payout(&self) -> u32 {
        match self {
            BetGroup::Red
            | BetGroup::Black
            | BetGroup::Even
            | BetGroup::Odd
            | BetGroup::Low
            | BetGroup::High => 2,
            BetGroup::First12
            | BetGroup::Second12
            | BetGroup::Third12
            | BetGroup::Top
            | BetGroup::Middle
            | BetGroup::Bottom => 3,
        }
    }
}

/// Identifier of a bet zone (index into the table layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

/// A placement region on the table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetZone {
    pub id: ZoneId,
    /// Physics collider backing this zone
    pub collider: ColliderId,
    /// Exact pocket this zone pays on (straight/split bets)
    pub linked_slot: Option<u8>,
    /// Group wager (ignored when `linked_slot` is set)
    pub group: Option<BetGroup>,
    /// If false, a chip may not also cover another exclusive zone
    pub allow_overlap: bool,
}

impl BetZone {
    /// Counts toward the "at most one exclusive zone" rule
    pub fn is_exclusive(&self) -> bool {
        self.linked_slot.is_none() && !self.allow_overlap
    }
}

/// Identifier of a chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChipId(pub u32);

/// Identifier of a chip bag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BagId(pub u32);

/// Audio cues for the host's sound system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    WheelSpin,
    BallLaunch,
    NoMoreBets,
    BallDrop,
    Win,
    Loss,
    ChipCredit,
}

/// Presentation feedback emitted by the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableEvent {
    SpinStarted { speed: f32 },
    BallLaunched { spawn: Vec2, force: f32 },
    BetsLocked,
    BetsUnlocked,
    BallLocked { slot: u8 },
    ShowWinningNumber { slot: u8, color: SlotColor },
    Sound(SoundCue),
    /// Move a chip toward `to` over `duration` seconds
    AnimateChip { chip: ChipId, to: Vec2, duration: f32 },
    ChipCredited { chip: ChipId, amount: u64 },
    ChipDestroyed { chip: ChipId },
    ChipRejected { chip: ChipId },
    ChipTipped { chip: ChipId, amount: u64 },
    CrabMove { chip: ChipId, offset: Vec2, duration: f32 },
    BagDispensed { bag: BagId, value: u64 },
    RoundReset { wheel_reset: bool },
    GameEnded { player_won: bool },
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_slot_attributes() {
        let s14 = Slot::standard(14);
        assert_eq!(s14.color, SlotColor::Red);
        assert_eq!(s14.parity, Parity::Even);
        assert_eq!(s14.half, Half::Low);
        assert_eq!(s14.dozen, Dozen::Second);
        assert_eq!(s14.line, Line::Middle);

        let s36 = Slot::standard(36);
        assert_eq!(s36.color, SlotColor::Red);
        assert_eq!(s36.line, Line::Top);
        assert_eq!(s36.dozen, Dozen::Third);
        assert_eq!(s36.half, Half::High);

        let zero = Slot::standard(0);
        assert_eq!(zero.color, SlotColor::None);
        assert_eq!(zero.parity, Parity::None);
        assert!(BetGroup::ALL.iter().all(|g| !g.matches(&zero)));
    }

    #[test]
    fn test_eighteen_reds_and_blacks() {
        let slots: Vec<_> = (0..37).map(Slot::standard).collect();
        let reds = slots.iter().filter(|s| BetGroup::Red.matches(s)).count();
        let blacks = slots.iter().filter(|s| BetGroup::Black.matches(s)).count();
        assert_eq!(reds, 18);
        assert_eq!(blacks, 18);
        for group in [BetGroup::First12, BetGroup::Top, BetGroup::Bottom] {
            assert_eq!(slots.iter().filter(|s| group.matches(s)).count(), 12);
        }
    }

    #[test]
    fn test_group_payouts() {
        assert_eq!(BetGroup::Red.payout(), 2);
        assert_eq!(BetGroup::Even.payout(), 2);
        assert_eq!(BetGroup::High.payout(), 2);
        assert_eq!(BetGroup::Second12.payout(), 3);
        assert_eq!(BetGroup::Bottom.payout(), 3);
    }

    #[test]
    fn test_slot_names() {
        assert_eq!(Slot::standard(7).name(), "Slot_7");
        assert_eq!(parse_slot_name("Slot_14"), Some(14));
        assert_eq!(parse_slot_name("Slot_x"), None);
        assert_eq!(parse_slot_name("Barrier_3"), None);
    }
}
