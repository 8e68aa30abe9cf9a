//! Round lifecycle
//!
//! `RoundController` owns one table: wheel, ball, chips, cutoff, evaluator,
//! currency and the delayed-action queue. Phases:
//!
//! `Idle -> Spinning -> AwaitingLock -> Evaluating -> Resetting -> Idle`
//!
//! - The ball locking is what starts evaluation, not a timer
//! - Winners are credited only when their chip arrives at the collection point
//! - Losers are collected after winners, then the table resets
//! - A reset cancels every pending continuation

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ball::BallState;
use super::bag::{BagDispenser, BagKind};
use super::chips::{ChipOwnership, ChipRegistry, DropOutcome};
use super::currency::CurrencyLedger;
use super::cutoff::{BetCutoffController, BetGate};
use super::disruption::{DisruptionScheduler, DisruptionTrigger};
use super::evaluator::{BetEvaluator, ChipVerdict};
use super::layout::TableLayout;
use super::physics::{BodyId, PhysicsWorld, SimplePhysics};
use super::scheduler::{ScheduledAction, Scheduler, TaskOwner};
use super::state::{BagId, ChipId, RngState, SoundCue, TableEvent};
use super::wheel::WheelState;
use crate::history::BetHistory;
use crate::persistence::SessionState;
use crate::settings::TableSettings;

/// Ball mass for the reference physics world
const BALL_MASS: f32 = 10.0;
/// Ball linear damping for the reference physics world
const BALL_DAMPING: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Betting open, wheel at rest
    Idle,
    /// Wheel spinning, ball not yet launched
    Spinning,
    /// Ball in play
    AwaitingLock,
    /// Pocket known; payouts in progress
    Evaluating,
    /// Table cleared; back to `Idle` next tick
    Resetting,
}

pub struct RoundController<P: PhysicsWorld> {
    pub settings: TableSettings,
    pub layout: TableLayout,
    pub physics: P,
    wheel: Option<WheelState>,
    ball: BallState,
    ball_home: Vec2,
    chips: ChipRegistry,
    gate: BetGate,
    cutoff: BetCutoffController,
    evaluator: BetEvaluator,
    scheduler: Scheduler,
    ledger: CurrencyLedger,
    dispenser: BagDispenser,
    next_bag_site: usize,
    disruption: DisruptionScheduler,
    session: SessionState,
    history: BetHistory,
    rng: Pcg32,
    phase: RoundPhase,
    is_resetting: bool,
    /// Spin speed and launch force for the next round (restored on reset)
    spin_speed: f32,
    launch_force: f32,
    winning_slot: Option<u8>,
    events: Vec<TableEvent>,
}

impl RoundController<SimplePhysics> {
    /// Standard table on the reference physics world
    pub fn standard(settings: TableSettings) -> Self {
        let mut physics = SimplePhysics::new();
        let layout = TableLayout::standard(|rect| physics.add_collider(rect));
        let home = settings
            .ball_spawn_points
            .first()
            .copied()
            .unwrap_or(layout.wheel.center);
        let ball = physics.add_body(home, BALL_MASS, BALL_DAMPING);
        Self::new(settings, layout, physics, ball)
    }
}

impl<P: PhysicsWorld> RoundController<P> {
    pub fn new(settings: TableSettings, layout: TableLayout, physics: P, ball_body: BodyId) -> Self {
        let gate = BetGate::new();

        let mut chips = ChipRegistry::new(gate.clone(), settings.chip_radius);
        chips.held_scale_multiplier = settings.held_scale_multiplier;
        chips.release_velocity_multiplier = settings.release_velocity_multiplier;
        chips.chip_drag = settings.chip_drag;

        let ledger = CurrencyLedger::new(settings.starting_currency);
        let mut history = BetHistory::new(settings.history_len);
        history.start_round(ledger.current());

        let ball_home = physics.position(ball_body);

        Self {
            wheel: Some(WheelState::new(settings.friction, settings.spin_threshold)),
            ball: BallState::new(
                ball_body,
                settings.time_to_confirm,
                settings.movement_start_threshold,
                settings.spin_lock_threshold,
            ),
            ball_home,
            chips,
            cutoff: BetCutoffController::new(settings.cutoff_speed, gate.clone()),
            gate,
            evaluator: BetEvaluator::new(),
            scheduler: Scheduler::new(),
            ledger,
            dispenser: BagDispenser::new(settings.bag_costs.clone()),
            next_bag_site: 0,
            disruption: DisruptionScheduler::new(
                settings.spin_start_crab_chance,
                settings.no_more_bets_crab_chance,
                settings.crab_chance_per_chip,
                settings.crab_offset,
                settings.crab_move_duration,
            ),
            session: SessionState::new(),
            history,
            rng: RngState::new(settings.seed).to_rng(),
            phase: RoundPhase::Idle,
            is_resetting: false,
            spin_speed: settings.initial_spin_speed,
            launch_force: settings.launch_force,
            winning_slot: None,
            events: Vec::new(),
            settings,
            layout,
            physics,
        }
    }

    // === Accessors ===

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn wheel(&self) -> Option<&WheelState> {
        self.wheel.as_ref()
    }

    /// Attach or detach the wheel (a missing wheel degrades the round)
    pub fn set_wheel(&mut self, wheel: Option<WheelState>) {
        self.wheel = wheel;
    }

    pub fn ball(&self) -> &BallState {
        &self.ball
    }

    pub fn chips(&self) -> &ChipRegistry {
        &self.chips
    }

    pub fn cutoff(&self) -> &BetCutoffController {
        &self.cutoff
    }

    pub fn evaluator(&self) -> &BetEvaluator {
        &self.evaluator
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn currency(&self) -> u64 {
        self.ledger.current()
    }

    pub fn history(&self) -> &BetHistory {
        &self.history
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn dispenser(&self) -> &BagDispenser {
        &self.dispenser
    }

    /// Handle on the shared betting gate
    pub fn gate(&self) -> BetGate {
        self.gate.clone()
    }

    pub fn bets_locked(&self) -> bool {
        self.gate.is_locked()
    }

    pub fn is_resetting(&self) -> bool {
        self.is_resetting
    }

    /// Pocket of the round being paid out
    pub fn winning_slot(&self) -> Option<u8> {
        self.winning_slot
    }

    /// Override the next round's spin speed (restored to base on reset)
    pub fn set_spin_speed(&mut self, speed: f32) {
        self.spin_speed = speed;
    }

    /// Override the next round's launch force (restored to base on reset)
    pub fn set_launch_force(&mut self, force: f32) {
        self.launch_force = force;
    }

    pub fn events(&self) -> &[TableEvent] {
        &self.events
    }

    /// Take the pending presentation events
    pub fn drain_events(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.events)
    }

    // === Round flow ===

    /// Spin the wheel and queue the ball launch. Only from `Idle`.
    pub fn spin_and_launch(&mut self) -> bool {
        if self.phase != RoundPhase::Idle {
            log::debug!("Spin ignored in {:?}", self.phase);
            return false;
        }
        let speed = self.spin_speed + jitter(&mut self.rng, self.settings.spin_speed_variance);
        match self.wheel.as_mut() {
            Some(wheel) => {
                wheel.start_spin(speed);
                self.events.push(TableEvent::SpinStarted { speed });
                self.events.push(TableEvent::Sound(SoundCue::WheelSpin));
            }
            None => log::warn!("No wheel attached, launching without a spin"),
        }
        self.phase = RoundPhase::Spinning;
        self.scheduler.schedule(
            self.settings.launch_delay,
            TaskOwner::Round,
            ScheduledAction::LaunchBall,
        );
        true
    }

    fn launch_ball(&mut self) {
        let spawn = if self.settings.ball_spawn_points.is_empty() {
            log::warn!("No ball spawn points configured, launching from home");
            self.ball_home
        } else {
            let i = self.rng.random_range(0..self.settings.ball_spawn_points.len());
            self.settings.ball_spawn_points[i]
        };
        let force = self.launch_force + jitter(&mut self.rng, self.settings.launch_force_variance);

        let body = self.ball.body;
        self.physics.set_position(body, spawn);
        self.physics.set_velocity(body, Vec2::ZERO);
        self.physics.set_kinematic(body, false);
        self.physics.apply_impulse(body, Vec2::Y * force);

        self.cutoff.begin_monitoring();
        self.phase = RoundPhase::AwaitingLock;

        log::info!("Ball launched from ({:.1}, {:.1}) with force {force:.1}", spawn.x, spawn.y);
        self.events.push(TableEvent::BallLaunched { spawn, force });
        self.events.push(TableEvent::Sound(SoundCue::BallLaunch));
        self.roll_crab(DisruptionTrigger::SpinStart);
    }

    /// Close betting (cutoff). Ends any drag and gives the crab a chance.
    pub fn lock_bets(&mut self) {
        if self.cutoff.lock_bets() {
            self.after_bets_locked(true);
        }
    }

    fn after_bets_locked(&mut self, roll_disruption: bool) {
        if self.chips.dragging().is_some() {
            log::debug!("Bets locked mid-drag, dropping the held chip");
            self.finish_drag();
        }
        self.events.push(TableEvent::BetsLocked);
        self.events.push(TableEvent::Sound(SoundCue::NoMoreBets));
        if roll_disruption {
            self.roll_crab(DisruptionTrigger::NoMoreBets);
        }
    }

    /// Advance one fixed step
    pub fn update(&mut self, dt: f32) {
        if self.phase == RoundPhase::Resetting {
            self.phase = RoundPhase::Idle;
            self.is_resetting = false;
            self.history.start_round(self.ledger.current());
        }

        if let Some(wheel) = self.wheel.as_mut() {
            wheel.update(dt);
        }
        self.physics.step(dt);

        for id in self.chips.update(dt) {
            self.chips.recompute_zones(id, &self.physics, &self.layout);
        }

        if self.cutoff.update(self.wheel.as_ref()) {
            self.after_bets_locked(true);
        }

        if let Some(slot) =
            self.ball
                .update(dt, self.wheel.as_ref(), &self.layout.wheel, &mut self.physics)
        {
            self.on_ball_locked(slot);
        }

        self.scheduler.advance(dt);
        while let Some(action) = self.scheduler.pop_due() {
            self.run_action(action);
        }
    }

    fn on_ball_locked(&mut self, slot: u8) {
        self.events.push(TableEvent::BallLocked { slot });
        self.events.push(TableEvent::Sound(SoundCue::BallDrop));

        // Betting is always closed before payouts, even without a cutoff
        if self.cutoff.lock_bets() {
            self.after_bets_locked(false);
        }

        self.phase = RoundPhase::Evaluating;
        self.winning_slot = Some(slot);
        self.scheduler.schedule(
            self.settings.evaluation_delay,
            TaskOwner::Round,
            ScheduledAction::Evaluate { slot },
        );
    }

    fn run_action(&mut self, action: ScheduledAction) {
        match action {
            ScheduledAction::LaunchBall => self.launch_ball(),
            ScheduledAction::Evaluate { slot } => self.evaluate(slot),
            ScheduledAction::ShowResult { slot } => {
                let color = self
                    .layout
                    .wheel
                    .slot(slot)
                    .map(|s| s.color)
                    .unwrap_or_default();
                self.events.push(TableEvent::ShowWinningNumber { slot, color });
                let cue = if self.evaluator.winners().is_empty() {
                    SoundCue::Loss
                } else {
                    SoundCue::Win
                };
                self.events.push(TableEvent::Sound(cue));
            }
            ScheduledAction::CollectWinners => {
                let winners = self.evaluator.winners().to_vec();
                for (chip, reward) in winners {
                    self.send_chip(chip, self.settings.winner_destination);
                    self.scheduler.schedule(
                        self.settings.chip_move_duration,
                        TaskOwner::Chip(chip),
                        ScheduledAction::ArriveWinner { chip, reward },
                    );
                }
            }
            ScheduledAction::ArriveWinner { chip, reward } => {
                if self.chips.destroy(chip).is_some() {
                    self.ledger.add(reward);
                    self.events.push(TableEvent::ChipCredited { chip, amount: reward });
                    self.events.push(TableEvent::ChipDestroyed { chip });
                    self.events.push(TableEvent::Sound(SoundCue::ChipCredit));
                } else {
                    log::debug!("Winning chip {chip:?} gone before arrival, no credit");
                }
            }
            ScheduledAction::CollectLosers => {
                let losers = self.evaluator.losers().to_vec();
                for chip in losers {
                    self.send_chip(chip, self.settings.loser_destination);
                    self.scheduler.schedule(
                        self.settings.chip_move_duration,
                        TaskOwner::Chip(chip),
                        ScheduledAction::ArriveLoser { chip },
                    );
                }
                // Queued after every arrival, so ties still pop the arrivals first
                self.scheduler.schedule(
                    self.settings.chip_move_duration + self.settings.table_reset_delay,
                    TaskOwner::Round,
                    ScheduledAction::ResetTable {
                        reset_wheel: !self.settings.skip_wheel_reset,
                    },
                );
            }
            ScheduledAction::ArriveLoser { chip } => {
                if self.chips.destroy(chip).is_some() {
                    self.events.push(TableEvent::ChipDestroyed { chip });
                }
            }
            ScheduledAction::ResetTable { reset_wheel } => {
                if let Some(slot) = self.winning_slot {
                    let color = self
                        .layout
                        .wheel
                        .slot(slot)
                        .map(|s| s.color)
                        .unwrap_or_default();
                    let entry = self.history.end_round(slot, color, self.ledger.current());
                    log::info!("Round over: {}", entry.label());
                }
                self.reset_game(reset_wheel);
            }
            ScheduledAction::CrabMoveComplete { chip, offset } => self.complete_crab_move(chip, offset),
        }
    }

    fn send_chip(&mut self, chip: ChipId, to: Vec2) {
        if self.chips.get(chip).is_none() {
            return;
        }
        self.chips.set_position(chip, to);
        self.events.push(TableEvent::AnimateChip {
            chip,
            to,
            duration: self.settings.chip_move_duration,
        });
    }

    fn evaluate(&mut self, slot: u8) {
        let Some(winning) = self.layout.wheel.slot(slot).cloned() else {
            log::warn!("Pocket {slot} is not on the wheel, skipping evaluation");
            self.scheduler.schedule(
                self.settings.table_reset_delay,
                TaskOwner::Round,
                ScheduledAction::ResetTable {
                    reset_wheel: !self.settings.skip_wheel_reset,
                },
            );
            return;
        };

        let verdicts = self.evaluator.evaluate(&winning, &self.chips, &self.layout);
        for (chip, verdict) in verdicts {
            if verdict == ChipVerdict::Rejected {
                self.events.push(TableEvent::ChipRejected { chip });
            }
        }

        let s = &self.settings;
        let winners_at = s.chip_collect_delay;
        let losers_at = winners_at + s.loser_collect_delay;
        let display_delay = s.display_delay;

        self.scheduler
            .schedule(display_delay, TaskOwner::Round, ScheduledAction::ShowResult { slot });
        self.scheduler
            .schedule(winners_at, TaskOwner::Round, ScheduledAction::CollectWinners);
        self.scheduler
            .schedule(losers_at, TaskOwner::Round, ScheduledAction::CollectLosers);
    }

    /// Clear the table for the next round. Ignored while a reset is still
    /// settling; returns whether this call reset anything.
    pub fn reset_game(&mut self, reset_wheel: bool) -> bool {
        if self.is_resetting {
            log::debug!("Reset already in progress");
            return false;
        }
        self.is_resetting = true;

        for chip in self.chips.destroy_all() {
            self.events.push(TableEvent::ChipDestroyed { chip });
        }
        for bag in &mut self.layout.bags {
            bag.current_chip = None;
        }
        self.scheduler.clear();
        self.evaluator.clear();

        self.cutoff.unlock_bets();
        self.cutoff.reset_cutoff();
        self.events.push(TableEvent::BetsUnlocked);

        self.ball.reset_ball();
        let body = self.ball.body;
        self.physics.set_kinematic(body, true);
        self.physics.set_velocity(body, Vec2::ZERO);
        self.physics.set_angular_velocity(body, 0.0);
        self.physics.set_position(body, self.ball_home);

        if let Some(wheel) = self.wheel.as_mut() {
            if reset_wheel {
                wheel.reset_spin();
            } else {
                wheel.stop();
            }
        }

        self.spin_speed = self.settings.initial_spin_speed;
        self.launch_force = self.settings.launch_force;
        self.dispenser.reset_round();
        self.disruption.reset_round();
        self.winning_slot = None;
        self.phase = RoundPhase::Resetting;

        log::info!("Table reset (wheel reset: {reset_wheel})");
        self.events.push(TableEvent::RoundReset { wheel_reset: reset_wheel });
        true
    }

    /// Close the table for good and record the result
    pub fn end_game(&mut self, player_won: bool) {
        if self.cutoff.lock_bets() {
            self.after_bets_locked(false);
        }
        if player_won {
            self.session.record_win();
        }
        log::info!("Game ended (player won: {player_won})");
        self.events.push(TableEvent::GameEnded { player_won });
    }

    /// Start over with the starting balance; the session win flag survives
    pub fn restart_session(&mut self) {
        self.ledger.reset(self.settings.starting_currency);
        self.is_resetting = false;
        self.reset_game(true);
    }

    // === Chips and bags ===

    /// Pay for a chip from `bag` and start dragging it from `pointer`
    pub fn take_chip_from_bag(&mut self, bag_id: BagId, pointer: Vec2) -> Option<ChipId> {
        if self.gate.is_locked() {
            log::debug!("Bets are locked, bag {bag_id:?} closed");
            return None;
        }
        if self.chips.dragging().is_some() {
            return None;
        }
        let Some(bag) = self.layout.bag(bag_id) else {
            log::warn!("Bag {bag_id:?} missing");
            return None;
        };
        if let Some(held) = bag.current_chip {
            if self.chips.ownership(held) == ChipOwnership::Dragging {
                return None;
            }
        }
        let value = bag.try_purchase(&mut self.ledger)?;

        let chip = self.chips.spawn(value, pointer, Some(bag_id));
        if !self.chips.begin_drag(chip, pointer) {
            // Refund: the chip never left the bag
            self.chips.destroy(chip);
            self.ledger.add(value);
            return None;
        }
        if let Some(bag) = self.layout.bag_mut(bag_id) {
            bag.current_chip = Some(chip);
        }
        log::debug!("Took a {value} chip from bag {bag_id:?}");
        Some(chip)
    }

    /// Bag under the pointer, if any
    pub fn bag_at(&self, point: Vec2) -> Option<BagId> {
        self.layout
            .bags
            .iter()
            .find(|bag| bag.bounds.contains_point(point))
            .map(|bag| bag.id)
    }

    /// Buy the next bag from the dispenser and place it on a free site
    pub fn buy_bag(&mut self) -> Option<BagId> {
        if self.gate.is_locked() || !self.dispenser.available() {
            return None;
        }
        let Some(&(collider, bounds)) = self.layout.bag_sites.get(self.next_bag_site) else {
            log::warn!("No free bag site left");
            return None;
        };
        if !self.dispenser.try_buy(&mut self.ledger) {
            return None;
        }
        self.next_bag_site += 1;

        let id = self.layout.add_bag(BagKind::Fixed { value: 1 }, collider, bounds);
        let (min, max) = (self.settings.bag_value_min, self.settings.bag_value_max);
        let mut value = min;
        if let Some(bag) = self.layout.bag_mut(id) {
            bag.randomize_value(&mut self.rng, min, max);
            if let BagKind::Fixed { value: v } = bag.kind {
                value = v;
            }
        }
        log::info!("Dispensed bag {id:?} worth {value}");
        self.events.push(TableEvent::BagDispensed { bag: id, value });
        Some(id)
    }

    pub fn begin_drag(&mut self, chip: ChipId, pointer: Vec2) -> bool {
        self.chips.begin_drag(chip, pointer)
    }

    pub fn drag_update(&mut self, pointer: Vec2, dt: f32) {
        if !self.chips.drag_update(pointer, dt) && self.chips.dragging().is_some() {
            self.finish_drag();
        }
    }

    pub fn end_drag(&mut self) -> Option<(ChipId, DropOutcome)> {
        self.finish_drag()
    }

    fn finish_drag(&mut self) -> Option<(ChipId, DropOutcome)> {
        let (chip, outcome) = self
            .chips
            .end_drag(&self.physics, &self.layout, &mut self.ledger)?;

        for bag in &mut self.layout.bags {
            if bag.current_chip == Some(chip) {
                bag.current_chip = None;
            }
        }

        match outcome {
            DropOutcome::Returned { amount } => {
                self.scheduler.cancel_owner(TaskOwner::Chip(chip));
                self.events.push(TableEvent::ChipCredited { chip, amount });
                self.events.push(TableEvent::ChipDestroyed { chip });
                self.events.push(TableEvent::Sound(SoundCue::ChipCredit));
            }
            DropOutcome::Tipped { amount } => {
                self.scheduler.cancel_owner(TaskOwner::Chip(chip));
                self.events.push(TableEvent::ChipTipped { chip, amount });
                self.events.push(TableEvent::ChipDestroyed { chip });
            }
            DropOutcome::Placed => {}
        }
        Some((chip, outcome))
    }

    /// Ball trigger callback by collider name
    pub fn on_slot_enter(&mut self, collider_name: &str) {
        self.ball.on_trigger_enter(collider_name);
    }

    pub fn on_slot_exit(&mut self, collider_name: &str) {
        self.ball.on_trigger_exit(collider_name);
    }

    // === Disruptions ===

    fn roll_crab(&mut self, trigger: DisruptionTrigger) {
        if self.ball.is_locked() {
            return;
        }
        let candidates: Vec<ChipId> = self.chips.on_table().map(|c| c.id).collect();
        let Some(crab) = self.disruption.roll(trigger, &candidates, &mut self.rng) else {
            return;
        };
        self.events.push(TableEvent::CrabMove {
            chip: crab.chip,
            offset: crab.offset,
            duration: crab.duration,
        });
        self.scheduler.schedule(
            crab.duration,
            TaskOwner::Chip(crab.chip),
            ScheduledAction::CrabMoveComplete {
                chip: crab.chip,
                offset: crab.offset,
            },
        );
    }

    fn complete_crab_move(&mut self, chip: ChipId, offset: Vec2) {
        if self.ball.is_locked() {
            log::debug!("Ball already locked, crab leaves chip {chip:?} alone");
            return;
        }
        if self.chips.translate(chip, offset) {
            self.chips.recompute_zones(chip, &self.physics, &self.layout);
        }
    }
}

/// Uniform offset in `[-variance, variance]`
fn jitter(rng: &mut impl Rng, variance: f32) -> f32 {
    if variance > 0.0 {
        rng.random_range(-variance..=variance)
    } else {
        0.0
    }
}
