//! Reef Roulette entry point
//!
//! Runs one scripted headless round on the reference physics world and
//! prints the outcome. An optional first argument names a JSON settings file.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use std::process::ExitCode;

    use reef_roulette::TableSettings;

    env_logger::init();
    log::info!("Reef Roulette (headless) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => match TableSettings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => TableSettings::default(),
    };

    headless::run(settings);
    ExitCode::SUCCESS
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page; nothing to run here
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use reef_roulette::TableSettings;
    use reef_roulette::consts::{MAX_SUBSTEPS, SIM_DT};
    use reef_roulette::sim::layout::{group_cell_center, number_cell_center};
    use reef_roulette::sim::{
        BetGroup, RoundController, RoundPhase, SimplePhysics, TableEvent, TickInput, tick,
    };

    /// Simulated host frame time (60 fps)
    const FRAME_DT: f32 = 1.0 / 60.0;
    /// Give up after this many seconds
    const MAX_SECONDS: f32 = 120.0;

    /// Scripted pointer actions, one per frame
    fn bet_script(controller: &RoundController<SimplePhysics>) -> Vec<TickInput> {
        let mut script = Vec::new();
        let bets = [
            (1, group_cell_center(BetGroup::Red)),
            (0, number_cell_center(17)),
            (0, (number_cell_center(17) + number_cell_center(20)) / 2.0),
        ];
        for (bag, target) in bets {
            let Some(bag) = controller.layout.bags.get(bag) else {
                continue;
            };
            script.push(TickInput {
                pointer_down: Some(bag.bounds.center()),
                ..Default::default()
            });
            for _ in 0..2 {
                script.push(TickInput {
                    pointer_move: Some(target),
                    ..Default::default()
                });
            }
            script.push(TickInput {
                pointer_up: true,
                ..Default::default()
            });
        }
        script.push(TickInput {
            spin: true,
            ..Default::default()
        });
        script
    }

    /// Pocket passing under the drop point at 12 o'clock
    fn pocket_under_drop(controller: &RoundController<SimplePhysics>) -> Option<u8> {
        let wheel = controller.wheel()?;
        let layout = &controller.layout.wheel;
        let drop = layout.center + Vec2::new(0.0, layout.radius);
        (0..layout.count()).min_by(|a, b| {
            let da = layout
                .pocket_position(*a, wheel.angle())
                .map_or(f32::MAX, |p| p.distance_squared(drop));
            let db = layout
                .pocket_position(*b, wheel.angle())
                .map_or(f32::MAX, |p| p.distance_squared(drop));
            da.total_cmp(&db)
        })
    }

    pub fn run(settings: TableSettings) {
        log::info!("Table seed: {}", settings.seed);
        let drop_speed = settings.spin_lock_threshold;
        let mut controller = RoundController::standard(settings);
        let mut script = bet_script(&controller).into_iter();

        let mut accumulator = 0.0f32;
        let mut elapsed = 0.0f32;
        let mut dropped = false;
        let mut evaluated = false;
        let mut events = Vec::new();

        while elapsed < MAX_SECONDS {
            elapsed += FRAME_DT;
            accumulator += FRAME_DT;

            let mut input = script.next().unwrap_or_default();

            // Stand-in for the physics engine's pocket trigger
            let slow = controller
                .wheel()
                .is_some_and(|w| w.current_spin_speed().abs() <= drop_speed);
            if !dropped && slow && controller.phase() == RoundPhase::AwaitingLock {
                if let Some(slot) = pocket_under_drop(&controller) {
                    input.slot_enter.push(format!("{}{slot}", reef_roulette::consts::SLOT_PREFIX));
                    dropped = true;
                }
            }

            // Fixed timestep with substep cap; input applies on the first substep
            let mut substeps = 0;
            while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                tick(&mut controller, &input, SIM_DT);
                input = TickInput::default();
                accumulator -= SIM_DT;
                substeps += 1;
            }

            events.extend(controller.drain_events());
            evaluated |= controller.phase() == RoundPhase::Evaluating;
            if evaluated && controller.phase() == RoundPhase::Idle {
                break;
            }
        }

        for event in &events {
            match event {
                TableEvent::ShowWinningNumber { slot, color } => {
                    println!("Winning number: {slot} ({color:?})");
                }
                TableEvent::ChipCredited { chip, amount } => {
                    println!("Chip {} credited {amount}", chip.0);
                }
                TableEvent::ChipRejected { chip } => println!("Chip {} rejected", chip.0),
                TableEvent::CrabMove { chip, .. } => println!("A crab nudged chip {}", chip.0),
                _ => {}
            }
        }
        println!("{}", controller.evaluator().stats().summary());
        println!("History: {}", controller.history().render());
        println!("Balance: {}", controller.currency());
    }
}
