//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies; presentation is driven
//!   through `TableEvent`s

pub mod bag;
pub mod ball;
pub mod chips;
pub mod currency;
pub mod cutoff;
pub mod disruption;
pub mod evaluator;
pub mod geometry;
pub mod layout;
pub mod physics;
pub mod round;
pub mod scheduler;
pub mod state;
pub mod tick;
pub mod wheel;

pub use bag::{BagDispenser, BagKind, ChipBag};
pub use ball::{BallPhase, BallState};
pub use chips::{Chip, ChipOwnership, ChipRegistry, DropOutcome};
pub use currency::CurrencyLedger;
pub use cutoff::{BetCutoffController, BetGate, CutoffPhase};
pub use disruption::{DisruptionScheduler, DisruptionTrigger};
pub use evaluator::{BetEvaluator, BetStats, ChipVerdict, resolve_chip};
pub use geometry::{Circle, Rect};
pub use layout::{TableLayout, WheelLayout};
pub use physics::{BodyId, ColliderId, PhysicsWorld, SimplePhysics};
pub use round::{RoundController, RoundPhase};
pub use scheduler::{ScheduledAction, Scheduler, TaskOwner};
pub use state::{
    BagId, BetGroup, BetZone, ChipId, Dozen, Half, Line, Parity, RngState, Slot, SlotColor,
    SoundCue, TableEvent, ZoneId,
};
pub use tick::{TickInput, tick};
pub use wheel::WheelState;
