//! Wheel and table layout
//!
//! Built once when the table is set up. The wheel owns its pockets; the table
//! owns the bet zones, bag sites and the tip jar, each backed by a collider.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bag::{BagKind, ChipBag};
use super::geometry::{Rect, pocket_angle, pocket_center};
use super::physics::ColliderId;
use super::state::{BagId, BetGroup, BetZone, Slot, ZoneId};
use crate::consts::{EUROPEAN_SLOT_COUNT, WHEEL_CENTER, WHEEL_RADIUS};

/// Pockets of one wheel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelLayout {
    pub slots: Vec<Slot>,
    pub center: Vec2,
    pub radius: f32,
}

impl WheelLayout {
    /// Single-zero wheel, pockets 0..=36
    pub fn european() -> Self {
        Self::with_slot_count(EUROPEAN_SLOT_COUNT)
    }

    /// Wheel with pockets 0..count
    pub fn with_slot_count(count: u8) -> Self {
        Self {
            slots: (0..count.max(1)).map(Slot::standard).collect(),
            center: Vec2::new(WHEEL_CENTER.0, WHEEL_CENTER.1),
            radius: WHEEL_RADIUS,
        }
    }

    pub fn count(&self) -> u8 {
        self.slots.len() as u8
    }

    pub fn slot(&self, number: u8) -> Option<&Slot> {
        self.slots.get(number as usize)
    }

    /// Give a pocket an explicit resting point for the ball
    pub fn set_anchor(&mut self, number: u8, anchor: Vec2) {
        if let Some(slot) = self.slots.get_mut(number as usize) {
            slot.anchor = Some(anchor);
        }
    }

    /// World-space pocket centre for the given wheel rotation
    pub fn pocket_position(&self, number: u8, wheel_angle_deg: f32) -> Option<Vec2> {
        self.slot(number)?;
        Some(pocket_center(self.center, self.radius, number, self.count(), wheel_angle_deg))
    }

    /// Where a locked ball rests in a pocket, and whether an anchor was used.
    /// The anchor offset is expressed in the pocket's local frame.
    pub fn rest_position(&self, number: u8, wheel_angle_deg: f32) -> Option<(Vec2, bool)> {
        let slot = self.slot(number)?;
        let center = self.pocket_position(number, wheel_angle_deg)?;
        match slot.anchor {
            Some(anchor) => {
                let rotation = Vec2::from_angle(pocket_angle(number, self.count(), wheel_angle_deg));
                Some((center + rotation.rotate(anchor), true))
            }
            None => Some((center, false)),
        }
    }
}

/// Side length of one number cell on the betting grid
pub const CELL: f32 = 1.0;

/// Static table scene: zones, bags, tip jar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableLayout {
    pub wheel: WheelLayout,
    pub zones: Vec<BetZone>,
    /// Bags present from the start
    pub bags: Vec<ChipBag>,
    /// Empty sites the dispenser fills with purchased bags
    pub bag_sites: Vec<(ColliderId, Rect)>,
    pub tip_jar: Option<ColliderId>,
}

impl TableLayout {
    /// Empty table around a wheel
    pub fn new(wheel: WheelLayout) -> Self {
        Self {
            wheel,
            zones: Vec::new(),
            bags: Vec::new(),
            bag_sites: Vec::new(),
            tip_jar: None,
        }
    }

    /// Add a zone backed by an already registered collider
    pub fn add_zone(
        &mut self,
        collider: ColliderId,
        linked_slot: Option<u8>,
        group: Option<BetGroup>,
        allow_overlap: bool,
    ) -> ZoneId {
        let id = ZoneId(self.zones.len() as u32);
        self.zones.push(BetZone {
            id,
            collider,
            linked_slot,
            group,
            allow_overlap,
        });
        id
    }

    pub fn add_bag(&mut self, kind: BagKind, collider: ColliderId, bounds: Rect) -> BagId {
        let id = BagId(self.bags.len() as u32);
        self.bags.push(ChipBag::new(id, kind, collider, bounds));
        id
    }

    /// Standard single-zero table. `register` creates a collider for each rect.
    ///
    /// Number cells form a 12 x 3 grid (top row = multiples of 3) with zero
    /// to the left. Straight zones allow overlap so a chip on a border
    /// becomes a split bet; every group zone is exclusive.
    pub fn standard(mut register: impl FnMut(Rect) -> ColliderId) -> Self {
        let mut table = Self::new(WheelLayout::european());

        let zero = register(Rect::from_center(
            Vec2::new(-CELL / 2.0, 0.0),
            Vec2::new(CELL, 3.0 * CELL),
        ));
        table.add_zone(zero, Some(0), None, true);

        for n in 1..=36u8 {
            let collider = register(Rect::from_center(number_cell_center(n), Vec2::splat(CELL)));
            table.add_zone(collider, Some(n), None, true);
        }

        // Dozens under the grid
        for (i, group) in [BetGroup::First12, BetGroup::Second12, BetGroup::Third12]
            .into_iter()
            .enumerate()
        {
            let center = Vec2::new((i as f32 * 4.0 + 2.0) * CELL, -2.0 * CELL);
            let collider = register(Rect::from_center(center, Vec2::new(4.0 * CELL, CELL)));
            table.add_zone(collider, None, Some(group), false);
        }

        // Even-money bets below the dozens
        let even_money = [
            BetGroup::Low,
            BetGroup::Even,
            BetGroup::Red,
            BetGroup::Black,
            BetGroup::Odd,
            BetGroup::High,
        ];
        for (i, group) in even_money.into_iter().enumerate() {
            let center = Vec2::new((i as f32 * 2.0 + 1.0) * CELL, -3.0 * CELL);
            let collider = register(Rect::from_center(center, Vec2::new(2.0 * CELL, CELL)));
            table.add_zone(collider, None, Some(group), false);
        }

        // "2 to 1" row bets at the end of each row
        for (group, y) in [(BetGroup::Top, 1.0), (BetGroup::Middle, 0.0), (BetGroup::Bottom, -1.0)] {
            let center = Vec2::new(12.5 * CELL, y * CELL);
            let collider = register(Rect::from_center(center, Vec2::splat(CELL)));
            table.add_zone(collider, None, Some(group), false);
        }

        // Starting bags, the all-in bag, dispenser sites and the tip jar
        let bag_size = Vec2::new(1.5, 1.5);
        for (i, kind) in [BagKind::Fixed { value: 5 }, BagKind::Fixed { value: 25 }, BagKind::AllIn]
            .into_iter()
            .enumerate()
        {
            let bounds = Rect::from_center(Vec2::new(1.0 + i as f32 * 2.5, -6.0), bag_size);
            let collider = register(bounds);
            table.add_bag(kind, collider, bounds);
        }
        for i in 0..3 {
            let bounds = Rect::from_center(Vec2::new(9.0 + i as f32 * 2.0, -6.0), bag_size);
            table.bag_sites.push((register(bounds), bounds));
        }
        table.tip_jar = Some(register(Rect::from_center(Vec2::new(15.0, -6.0), bag_size)));

        table
    }

    pub fn zone(&self, id: ZoneId) -> Option<&BetZone> {
        self.zones.get(id.0 as usize)
    }

    /// Zones backed by any of the given colliders, in zone order
    pub fn zones_for_colliders(&self, colliders: &[ColliderId]) -> Vec<ZoneId> {
        self.zones
            .iter()
            .filter(|z| colliders.contains(&z.collider))
            .map(|z| z.id)
            .collect()
    }

    /// Straight zone of a number
    pub fn number_zone(&self, number: u8) -> Option<ZoneId> {
        self.zones
            .iter()
            .find(|z| z.linked_slot == Some(number))
            .map(|z| z.id)
    }

    /// Group zone of a bet type
    pub fn group_zone(&self, group: BetGroup) -> Option<ZoneId> {
        self.zones
            .iter()
            .find(|z| z.linked_slot.is_none() && z.group == Some(group))
            .map(|z| z.id)
    }

    pub fn bag(&self, id: BagId) -> Option<&ChipBag> {
        self.bags.get(id.0 as usize)
    }

    pub fn bag_mut(&mut self, id: BagId) -> Option<&mut ChipBag> {
        self.bags.get_mut(id.0 as usize)
    }
}

/// Centre of a number's cell on the standard grid
pub fn number_cell_center(number: u8) -> Vec2 {
    let column = (number.max(1) - 1) / 3;
    let y = match number % 3 {
        0 => 1.0,
        2 => 0.0,
        _ => -1.0,
    };
    Vec2::new((column as f32 + 0.5) * CELL, y * CELL)
}

/// Centre of a group zone on the standard grid
pub fn group_cell_center(group: BetGroup) -> Vec2 {
    let cell = match group {
        BetGroup::First12 => Vec2::new(2.0, -2.0),
        BetGroup::Second12 => Vec2::new(6.0, -2.0),
        BetGroup::Third12 => Vec2::new(10.0, -2.0),
        BetGroup::Low => Vec2::new(1.0, -3.0),
        BetGroup::Even => Vec2::new(3.0, -3.0),
        BetGroup::Red => Vec2::new(5.0, -3.0),
        BetGroup::Black => Vec2::new(7.0, -3.0),
        BetGroup::Odd => Vec2::new(9.0, -3.0),
        BetGroup::High => Vec2::new(11.0, -3.0),
        BetGroup::Top => Vec2::new(12.5, 1.0),
        BetGroup::Middle => Vec2::new(12.5, 0.0),
        BetGroup::Bottom => Vec2::new(12.5, -1.0),
    };
    cell * CELL
}
