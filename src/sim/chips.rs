//! Chip registry and drag handling
//!
//! Chips are owned by the registry, keyed by id so iteration is stable.
//! A chip's covered zones are recomputed only when it comes to rest, never
//! continuously.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::currency::CurrencyLedger;
use super::cutoff::BetGate;
use super::geometry::Circle;
use super::layout::TableLayout;
use super::physics::PhysicsWorld;
use super::state::{BagId, ChipId, ZoneId};

/// Released chips below this speed stop sliding
const SETTLE_SPEED: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChipOwnership {
    InBag,
    OnTable,
    Dragging,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DragState {
    Idle,
    Dragging {
        /// Chip position minus pointer position at pickup
        offset: Vec2,
        last_pos: Vec2,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chip {
    pub id: ChipId,
    pub value: u64,
    pub ownership: ChipOwnership,
    pub pos: Vec2,
    pub vel: Vec2,
    pub scale: f32,
    /// Zones under the chip when it last came to rest
    pub zones: Option<Vec<ZoneId>>,
    pub drag: DragState,
    /// Bag the chip was taken from; dropping it back refunds it
    pub home_bag: Option<BagId>,
}

impl Chip {
    pub fn zones(&self) -> &[ZoneId] {
        self.zones.as_deref().unwrap_or(&[])
    }
}

/// What happened when a dragged chip was released
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DropOutcome {
    /// Dropped on its own bag: value refunded, chip destroyed
    Returned { amount: u64 },
    /// Dropped in the tip jar: chip destroyed, no refund
    Tipped { amount: u64 },
    /// On the table
    Placed,
}

#[derive(Debug, Clone)]
pub struct ChipRegistry {
    chips: BTreeMap<ChipId, Chip>,
    next_id: u32,
    gate: BetGate,
    dragging: Option<ChipId>,
    tip_total: u64,
    pub chip_radius: f32,
    pub held_scale_multiplier: f32,
    pub release_velocity_multiplier: f32,
    /// Linear damping for sliding chips (1/s)
    pub chip_drag: f32,
}

impl ChipRegistry {
    pub fn new(gate: BetGate, chip_radius: f32) -> Self {
        Self {
            chips: BTreeMap::new(),
            next_id: 0,
            gate,
            dragging: None,
            tip_total: 0,
            chip_radius,
            held_scale_multiplier: 1.2,
            release_velocity_multiplier: 1.0,
            chip_drag: 5.0,
        }
    }

    pub fn get(&self, id: ChipId) -> Option<&Chip> {
        self.chips.get(&id)
    }

    /// Ownership of a chip; chips no longer in the registry are `Destroyed`
    pub fn ownership(&self, id: ChipId) -> ChipOwnership {
        self.chips
            .get(&id)
            .map_or(ChipOwnership::Destroyed, |c| c.ownership)
    }

    pub fn len(&self) -> usize {
        self.chips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chip> {
        self.chips.values()
    }

    pub fn on_table(&self) -> impl Iterator<Item = &Chip> {
        self.chips
            .values()
            .filter(|c| c.ownership == ChipOwnership::OnTable)
    }

    pub fn dragging(&self) -> Option<ChipId> {
        self.dragging
    }

    /// Total value dropped in the tip jar
    pub fn tip_total(&self) -> u64 {
        self.tip_total
    }

    /// Create a chip sitting in a bag
    pub fn spawn(&mut self, value: u64, pos: Vec2, home_bag: Option<BagId>) -> ChipId {
        let id = ChipId(self.next_id);
        self.next_id += 1;
        self.chips.insert(
            id,
            Chip {
                id,
                value,
                ownership: ChipOwnership::InBag,
                pos,
                vel: Vec2::ZERO,
                scale: 1.0,
                zones: None,
                drag: DragState::Idle,
                home_bag,
            },
        );
        id
    }

    /// Topmost table chip under the pointer
    pub fn chip_at(&self, point: Vec2) -> Option<ChipId> {
        self.chips
            .values()
            .rev()
            .find(|c| {
                c.ownership == ChipOwnership::OnTable
                    && c.pos.distance(point) <= self.chip_radius * c.scale
            })
            .map(|c| c.id)
    }

    /// Pick a chip up. Refused while bets are locked or another chip is held.
    pub fn begin_drag(&mut self, id: ChipId, pointer: Vec2) -> bool {
        if self.gate.is_locked() {
            log::debug!("Bets are locked, chip {id:?} stays put");
            return false;
        }
        if self.dragging.is_some() {
            return false;
        }
        let held_scale = self.held_scale_multiplier;
        let Some(chip) = self.chips.get_mut(&id) else {
            return false;
        };
        if !matches!(chip.ownership, ChipOwnership::InBag | ChipOwnership::OnTable) {
            return false;
        }
        chip.ownership = ChipOwnership::Dragging;
        chip.drag = DragState::Dragging {
            offset: chip.pos - pointer,
            last_pos: chip.pos,
        };
        chip.vel = Vec2::ZERO;
        chip.scale = held_scale;
        chip.zones = None;
        self.dragging = Some(id);
        true
    }

    /// Follow the pointer. Returns false when the drag must end instead.
    pub fn drag_update(&mut self, pointer: Vec2, dt: f32) -> bool {
        let Some(id) = self.dragging else {
            return false;
        };
        if self.gate.is_locked() {
            return false;
        }
        let Some(chip) = self.chips.get_mut(&id) else {
            self.dragging = None;
            return false;
        };
        if let DragState::Dragging { offset, last_pos } = chip.drag {
            chip.pos = pointer + offset;
            chip.vel = if dt > 0.0 {
                (chip.pos - last_pos) / dt
            } else {
                Vec2::ZERO
            };
            chip.drag = DragState::Dragging {
                offset,
                last_pos: chip.pos,
            };
        }
        true
    }

    /// Release the held chip and resolve where it landed
    pub fn end_drag(
        &mut self,
        physics: &impl PhysicsWorld,
        layout: &TableLayout,
        ledger: &mut CurrencyLedger,
    ) -> Option<(ChipId, DropOutcome)> {
        let id = self.dragging.take()?;
        let release_multiplier = self.release_velocity_multiplier;
        let chip = self.chips.get_mut(&id)?;
        chip.scale = 1.0;
        chip.drag = DragState::Idle;

        let footprint = Circle::new(chip.pos, self.chip_radius);
        let hits = physics.query_overlap(&footprint);

        if let Some(bag_id) = chip.home_bag {
            match layout.bag(bag_id) {
                Some(bag) if hits.contains(&bag.collider) => {
                    let amount = chip.value;
                    ledger.add(amount);
                    self.chips.remove(&id);
                    log::debug!("Chip {id:?} returned to its bag, refunded {amount}");
                    return Some((id, DropOutcome::Returned { amount }));
                }
                Some(_) => {}
                None => log::warn!("Bag {bag_id:?} missing, return-to-bag skipped"),
            }
        }

        if layout.tip_jar.is_some_and(|jar| hits.contains(&jar)) {
            let amount = chip.value;
            self.tip_total = self.tip_total.saturating_add(amount);
            self.chips.remove(&id);
            log::info!("Chip {id:?} tipped to the dealer ({amount})");
            return Some((id, DropOutcome::Tipped { amount }));
        }

        chip.ownership = ChipOwnership::OnTable;
        chip.vel *= release_multiplier;
        if chip.vel.length() < SETTLE_SPEED {
            chip.vel = Vec2::ZERO;
        }
        chip.zones = Some(layout.zones_for_colliders(&hits));
        Some((id, DropOutcome::Placed))
    }

    /// Slide released chips. Returns chips that came to rest this tick.
    pub fn update(&mut self, dt: f32) -> Vec<ChipId> {
        let damping = (-self.chip_drag * dt).exp();
        let mut settled = Vec::new();
        for chip in self.chips.values_mut() {
            if chip.ownership != ChipOwnership::OnTable || chip.vel == Vec2::ZERO {
                continue;
            }
            chip.pos += chip.vel * dt;
            chip.vel *= damping;
            if chip.vel.length() < SETTLE_SPEED {
                chip.vel = Vec2::ZERO;
                settled.push(chip.id);
            }
        }
        settled
    }

    /// Re-query the zones under a chip
    pub fn recompute_zones(
        &mut self,
        id: ChipId,
        physics: &impl PhysicsWorld,
        layout: &TableLayout,
    ) -> Option<&[ZoneId]> {
        let radius = self.chip_radius;
        let chip = self.chips.get_mut(&id)?;
        let hits = physics.query_overlap(&Circle::new(chip.pos, radius * chip.scale));
        chip.zones = Some(layout.zones_for_colliders(&hits));
        chip.zones.as_deref()
    }

    /// Shift a resting chip (disruptions)
    pub fn translate(&mut self, id: ChipId, offset: Vec2) -> bool {
        match self.chips.get_mut(&id) {
            Some(chip) if chip.ownership == ChipOwnership::OnTable => {
                chip.pos += offset;
                true
            }
            _ => false,
        }
    }

    /// Snap a chip to a point (end of a collection move)
    pub fn set_position(&mut self, id: ChipId, pos: Vec2) {
        if let Some(chip) = self.chips.get_mut(&id) {
            chip.pos = pos;
            chip.vel = Vec2::ZERO;
        }
    }

    pub fn destroy(&mut self, id: ChipId) -> Option<Chip> {
        if self.dragging == Some(id) {
            self.dragging = None;
        }
        self.chips.remove(&id).map(|mut chip| {
            chip.ownership = ChipOwnership::Destroyed;
            chip
        })
    }

    /// Remove every chip; returns the removed ids in order
    pub fn destroy_all(&mut self) -> Vec<ChipId> {
        self.dragging = None;
        let ids = self.chips.keys().copied().collect();
        self.chips.clear();
        ids
    }
}
