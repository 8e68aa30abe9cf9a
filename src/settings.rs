//! Table tuning
//!
//! Every gameplay constant a designer may want to tweak lives here and can be
//! loaded from a JSON file. Missing fields fall back to the defaults.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunable table parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    /// Seed for every random roll at the table
    pub seed: u64,

    // === Wheel ===
    /// Base spin speed (degrees per second)
    pub initial_spin_speed: f32,
    /// Random ± added to the spin speed each round
    pub spin_speed_variance: f32,
    /// Speed decay (degrees per second squared)
    pub friction: f32,
    /// Below this |speed| the wheel counts as stopped
    pub spin_threshold: f32,

    // === Ball ===
    /// Seconds the ball must sit in a single pocket before locking
    pub time_to_confirm: f32,
    /// Ball speed that marks the ball as launched
    pub movement_start_threshold: f32,
    /// Wheel speed at or below which the ball may lock
    pub spin_lock_threshold: f32,
    /// Base launch impulse
    pub launch_force: f32,
    /// Random ± added to the launch impulse each round
    pub launch_force_variance: f32,
    /// Seconds between wheel spin and ball launch
    pub launch_delay: f32,
    /// Ball spawn points (one is picked at random per launch)
    pub ball_spawn_points: Vec<Vec2>,

    // === Cutoff ===
    /// Wheel speed at or below which bets lock
    pub cutoff_speed: f32,

    // === Chips ===
    pub chip_radius: f32,
    pub held_scale_multiplier: f32,
    pub release_velocity_multiplier: f32,
    /// Linear damping applied to released chips
    pub chip_drag: f32,

    // === Payout sequencing ===
    pub evaluation_delay: f32,
    pub display_delay: f32,
    /// Delay before winning chips start moving
    pub chip_collect_delay: f32,
    /// Extra delay before losing chips start moving (after winners)
    pub loser_collect_delay: f32,
    pub chip_move_duration: f32,
    /// Delay after the last collection before the table resets
    pub table_reset_delay: f32,
    /// Keep wheel orientation between rounds
    pub skip_wheel_reset: bool,
    pub winner_destination: Vec2,
    pub loser_destination: Vec2,

    // === Disruptions ===
    pub spin_start_crab_chance: f32,
    pub no_more_bets_crab_chance: f32,
    /// Chance added per chip on the table
    pub crab_chance_per_chip: f32,
    pub crab_offset: Vec2,
    pub crab_move_duration: f32,

    // === Economy ===
    pub starting_currency: u64,
    /// Price of each successive extra bag
    pub bag_costs: Vec<u64>,
    pub bag_value_min: u64,
    pub bag_value_max: u64,

    // === History ===
    pub history_len: usize,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            seed: 0x5EA_5EED,

            initial_spin_speed: 720.0,
            spin_speed_variance: 60.0,
            friction: 50.0,
            spin_threshold: 0.01,

            time_to_confirm: 3.0,
            movement_start_threshold: 0.5,
            spin_lock_threshold: 30.0,
            launch_force: 500.0,
            launch_force_variance: 50.0,
            launch_delay: 0.5,
            ball_spawn_points: vec![Vec2::new(-9.0, -4.5), Vec2::new(-9.0, 4.5)],

            cutoff_speed: 200.0,

            chip_radius: 0.35,
            held_scale_multiplier: 1.2,
            release_velocity_multiplier: 1.0,
            chip_drag: 5.0,

            evaluation_delay: 0.0,
            display_delay: 0.0,
            chip_collect_delay: 1.0,
            loser_collect_delay: 1.0,
            chip_move_duration: 0.75,
            table_reset_delay: 1.0,
            skip_wheel_reset: false,
            winner_destination: Vec2::new(0.0, -8.0),
            loser_destination: Vec2::new(0.0, 8.0),

            spin_start_crab_chance: 0.3,
            no_more_bets_crab_chance: 0.2,
            crab_chance_per_chip: 0.0,
            crab_offset: Vec2::new(0.5, 0.0),
            crab_move_duration: 1.0,

            starting_currency: 500,
            bag_costs: vec![50, 100, 200],
            bag_value_min: 1,
            bag_value_max: 10,

            history_len: 10,
        }
    }
}

impl TableSettings {
    /// Parse settings from a JSON document and validate them
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded table settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a finite non-negative number, got {value}"),
                })
            }
        }
        fn chance(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be within [0, 1], got {value}"),
                })
            }
        }

        non_negative("spin_speed_variance", self.spin_speed_variance)?;
        non_negative("friction", self.friction)?;
        non_negative("spin_threshold", self.spin_threshold)?;
        non_negative("movement_start_threshold", self.movement_start_threshold)?;
        non_negative("spin_lock_threshold", self.spin_lock_threshold)?;
        non_negative("launch_force_variance", self.launch_force_variance)?;
        non_negative("launch_delay", self.launch_delay)?;
        non_negative("cutoff_speed", self.cutoff_speed)?;
        non_negative("chip_drag", self.chip_drag)?;
        non_negative("evaluation_delay", self.evaluation_delay)?;
        non_negative("display_delay", self.display_delay)?;
        non_negative("chip_collect_delay", self.chip_collect_delay)?;
        non_negative("loser_collect_delay", self.loser_collect_delay)?;
        non_negative("chip_move_duration", self.chip_move_duration)?;
        non_negative("table_reset_delay", self.table_reset_delay)?;
        non_negative("crab_move_duration", self.crab_move_duration)?;
        chance("spin_start_crab_chance", self.spin_start_crab_chance)?;
        chance("no_more_bets_crab_chance", self.no_more_bets_crab_chance)?;
        non_negative("crab_chance_per_chip", self.crab_chance_per_chip)?;

        if !(self.time_to_confirm > 0.0) {
            return Err(ConfigError::Invalid {
                field: "time_to_confirm",
                reason: "must be positive".to_string(),
            });
        }
        if !(self.chip_radius > 0.0) {
            return Err(ConfigError::Invalid {
                field: "chip_radius",
                reason: "must be positive".to_string(),
            });
        }
        if self.bag_value_min == 0 || self.bag_value_min > self.bag_value_max {
            return Err(ConfigError::Invalid {
                field: "bag_value_min",
                reason: format!(
                    "range {}..={} must be non-empty and start above zero",
                    self.bag_value_min, self.bag_value_max
                ),
            });
        }
        Ok(())
    }
}
