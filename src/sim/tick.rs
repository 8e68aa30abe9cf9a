//! Fixed timestep simulation tick
//!
//! Applies one frame of host input to the table, then advances it.

use glam::Vec2;

use super::physics::PhysicsWorld;
use super::round::RoundController;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Spin the wheel and launch the ball
    pub spin: bool,
    /// Pointer pressed at this position (picks a chip or opens a bag)
    pub pointer_down: Option<Vec2>,
    /// Pointer position while held
    pub pointer_move: Option<Vec2>,
    /// Pointer released
    pub pointer_up: bool,
    /// Buy the next bag from the dispenser
    pub buy_bag: bool,
    /// Ball trigger enters, by collider name (`Slot_<n>`)
    pub slot_enter: Vec<String>,
    /// Ball trigger exits, by collider name
    pub slot_exit: Vec<String>,
    /// Clear the table (debug/testing)
    pub reset: bool,
}

/// Advance the table by one fixed timestep
pub fn tick<P: PhysicsWorld>(controller: &mut RoundController<P>, input: &TickInput, dt: f32) {
    if input.reset {
        let reset_wheel = !controller.settings.skip_wheel_reset;
        controller.reset_game(reset_wheel);
    }

    if input.buy_bag {
        controller.buy_bag();
    }

    if let Some(pointer) = input.pointer_down {
        match controller.chips().chip_at(pointer) {
            Some(chip) => {
                controller.begin_drag(chip, pointer);
            }
            None => {
                if let Some(bag) = controller.bag_at(pointer) {
                    controller.take_chip_from_bag(bag, pointer);
                }
            }
        }
    }
    if let Some(pointer) = input.pointer_move {
        controller.drag_update(pointer, dt);
    }
    if input.pointer_up {
        controller.end_drag();
    }

    for name in &input.slot_exit {
        controller.on_slot_exit(name);
    }
    for name in &input.slot_enter {
        controller.on_slot_enter(name);
    }

    if input.spin {
        controller.spin_and_launch();
    }

    controller.update(dt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::settings::TableSettings;
    use crate::sim::chips::ChipOwnership;
    use crate::sim::layout::group_cell_center;
    use crate::sim::round::RoundPhase;
    use crate::sim::state::{BetGroup, ChipId};

    #[test]
    fn test_pointer_flow_places_chip() {
        let mut c = RoundController::standard(TableSettings::default());
        let bag = c.layout.bags[1].bounds.center();
        let target = group_cell_center(BetGroup::Black);

        tick(&mut c, &TickInput { pointer_down: Some(bag), ..Default::default() }, SIM_DT);
        assert_eq!(c.currency(), 475);
        tick(&mut c, &TickInput { pointer_move: Some(target), ..Default::default() }, SIM_DT);
        tick(&mut c, &TickInput { pointer_move: Some(target), ..Default::default() }, SIM_DT);
        tick(&mut c, &TickInput { pointer_up: true, ..Default::default() }, SIM_DT);

        let chip = ChipId(0);
        assert_eq!(c.chips().ownership(chip), ChipOwnership::OnTable);
        let black = c.layout.group_zone(BetGroup::Black).unwrap();
        assert_eq!(c.chips().get(chip).unwrap().zones(), &[black]);

        // Pick it back up from the table
        tick(&mut c, &TickInput { pointer_down: Some(target), ..Default::default() }, SIM_DT);
        assert_eq!(c.chips().ownership(chip), ChipOwnership::Dragging);
    }

    #[test]
    fn test_spin_input_starts_round() {
        let mut c = RoundController::standard(TableSettings::default());
        tick(&mut c, &TickInput { spin: true, ..Default::default() }, SIM_DT);
        assert_eq!(c.phase(), RoundPhase::Spinning);
        assert!(c.wheel().unwrap().is_spinning());

        for _ in 0..120 {
            tick(&mut c, &TickInput::default(), SIM_DT);
        }
        assert_eq!(c.phase(), RoundPhase::AwaitingLock);

        // Input is applied before the step, so the reset settles this tick
        tick(&mut c, &TickInput { reset: true, ..Default::default() }, SIM_DT);
        assert_eq!(c.phase(), RoundPhase::Idle);
        assert!(!c.is_resetting());
        assert!(!c.wheel().unwrap().is_spinning());
    }
}
