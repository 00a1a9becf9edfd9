//! Simulation configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{Result, WardenError};

/// Configuration for the AI simulation systems
///
/// These values have been tuned to produce good stealth pacing.
/// Changing them will affect how forgiving the night feels.
///
/// There is deliberately no process-wide config instance; the `World` owns
/// one and every system receives it from there.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === SPATIAL SYSTEM ===
    /// Size of each cell in the spatial hash grid (world units)
    ///
    /// Should be well under the smallest query radius so radius scans touch
    /// few cells. Smaller = more cells, higher memory, fewer entities per
    /// cell.
    pub grid_cell_size: f32,

    // === DETECTION SYSTEM ===
    /// Direct field-of-view cone, full angle in degrees
    ///
    /// A target inside this cone (and within view distance, unobstructed)
    /// is detected at full speed.
    pub fov_angle_deg: f32,

    /// Peripheral vision cone, full angle in degrees
    ///
    /// A superset of the direct cone. Targets seen only peripherally still
    /// accumulate detection, but slower (see `peripheral_time_multiplier`).
    pub peripheral_angle_deg: f32,

    /// Whether peripheral vision is enabled at all
    ///
    /// Citizens in particular may be configured without it.
    pub peripheral_enabled: bool,

    /// Maximum distance at which a target can be seen (world units)
    pub view_distance: f32,

    /// Base time to fully detect a target at the edge of view distance
    /// (seconds)
    ///
    /// At half view distance the effective time is 75% of this; the scale
    /// runs linearly from half the base (point blank, outside the
    /// close-range band) to the full base (at the view-distance edge).
    pub base_detection_time: f32,

    /// Distance below which detection uses the fixed close-range duration
    ///
    /// Inside this band the target is essentially in the observer's face:
    /// the close-range duration overrides every other factor, including
    /// lighting and target speed.
    pub close_range_distance: f32,

    /// Fixed detection duration inside the close-range band (seconds)
    pub close_range_detection_time: f32,

    /// Multiplier applied to the effective detection time for targets seen
    /// only in peripheral vision (> 1.0, slower detection)
    pub peripheral_time_multiplier: f32,

    /// Target speed at or above which the target counts as walking
    /// (world units per second)
    pub walk_speed_threshold: f32,

    /// Target speed at or above which the target counts as sprinting
    pub sprint_speed_threshold: f32,

    /// Detection-time multiplier for a walking target (< 1.0, faster
    /// detection than a stationary one)
    pub walking_time_multiplier: f32,

    /// Detection-time multiplier for a sprinting target (lowest tier,
    /// fastest detection)
    pub sprinting_time_multiplier: f32,

    /// Floor for the lighting modifier the effective time is divided by
    ///
    /// Ambient light in [0,1] is clamped to [floor, 1] before the division,
    /// so full darkness makes detection at most 1/floor times slower
    /// (3x at the default of 1/3) instead of never completing.
    pub dark_light_floor: f32,

    /// Absolute floor for the effective detection time (seconds)
    ///
    /// Keeps the progress division well-defined for any combination of
    /// distance, lighting, and speed inputs.
    pub min_detection_time: f32,

    // === SUSPICION SYSTEM ===
    /// Suspicion ceiling; reaching it triggers max-suspicion behavior
    pub max_suspicion: f32,

    /// Seconds without a suspicious event before suspicion starts decaying
    pub suspicion_cooldown: f32,

    /// Linear decay rate once the cooldown has elapsed (suspicion/second)
    pub suspicion_decay_rate: f32,

    /// Radius within which the target counts as lurking near an entity
    pub lurk_radius: f32,

    /// Continuous seconds inside the lurk radius before lurking suspicion
    /// starts accumulating
    pub lurk_grace_period: f32,

    /// Lurking accumulation rate (suspicion/second)
    pub lurk_rate: f32,

    /// Multiplier applied to lurking accumulation while the target is
    /// disguised (< 1.0 suppresses)
    pub disguise_suspicion_modifier: f32,

    /// Radius within which a sprinting target alarms entities
    pub sprint_notice_radius: f32,

    /// Suspicion per second added by a target sprinting nearby
    pub sprint_suspicion_rate: f32,

    /// Suspicion added when an entity witnesses a hostile act
    pub witnessed_act_suspicion: f32,

    /// Suspicion added by a loud noise stimulus at full loudness
    pub loud_noise_suspicion: f32,

    /// Distance a noise at full loudness carries; quieter noises carry
    /// proportionally less
    pub noise_radius: f32,

    // === ALERT PROPAGATION ===
    /// Radius of the one-shot suspicion contagion when an entity maxes out
    pub contagion_radius: f32,

    /// Flat suspicion bump applied to every entity inside the contagion
    /// radius (not distance-scaled)
    pub contagion_bump: f32,

    /// Radius an entity searches for a bell when maxing out
    pub bell_search_radius: f32,

    /// Distance at which a bell-seeker counts as having arrived
    pub bell_arrival_radius: f32,

    /// Radius a ringing bell reaches
    pub bell_radius: f32,

    /// Maximum tolls per bell per night
    pub bell_max_tolls: u32,

    /// Minimum seconds between tolls of the same bell
    pub bell_toll_cooldown: f32,

    /// Global alert level at or above which citizens hearing a bell flee
    pub citizen_flee_level: crate::alert::AlertLevel,

    /// Noise loudness citizens are handed when a bell rings nearby
    pub bell_noise_intensity: f32,

    // === NIGHT CLOCK ===
    /// Length of one full night in simulation seconds
    ///
    /// Phase boundaries scale with this; the demo binary runs ten-minute
    /// nights by default.
    pub night_length: f32,

    // === PARALLELIZATION ===
    /// Minimum entity count before the detection pass runs in parallel
    ///
    /// Below this threshold, thread overhead exceeds benefits. Mutation is
    /// always applied sequentially regardless.
    pub parallel_threshold: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            // Spatial
            grid_cell_size: 8.0,

            // Detection (direct cone inside a wider peripheral cone)
            fov_angle_deg: 90.0,
            peripheral_angle_deg: 160.0,
            peripheral_enabled: true,
            view_distance: 15.0,
            base_detection_time: 0.5,
            close_range_distance: 6.0,
            close_range_detection_time: 0.1,
            peripheral_time_multiplier: 2.0,
            walk_speed_threshold: 0.5,
            sprint_speed_threshold: 4.0,
            walking_time_multiplier: 0.75,
            sprinting_time_multiplier: 0.5,
            dark_light_floor: 1.0 / 3.0,
            min_detection_time: 0.01,

            // Suspicion
            max_suspicion: 100.0,
            suspicion_cooldown: 4.0,
            suspicion_decay_rate: 10.0,
            lurk_radius: 5.0,
            lurk_grace_period: 2.5,
            lurk_rate: 15.0,
            disguise_suspicion_modifier: 0.35,
            sprint_notice_radius: 8.0,
            sprint_suspicion_rate: 20.0,
            witnessed_act_suspicion: 60.0,
            loud_noise_suspicion: 25.0,
            noise_radius: 20.0,

            // Alert propagation
            contagion_radius: 12.0,
            contagion_bump: 30.0,
            bell_search_radius: 40.0,
            bell_arrival_radius: 1.5,
            bell_radius: 30.0,
            bell_max_tolls: 3,
            bell_toll_cooldown: 10.0,
            citizen_flee_level: crate::alert::AlertLevel::Elevated,
            bell_noise_intensity: 1.0,

            // Night clock (ten-minute nights)
            night_length: 600.0,

            // Parallelization
            parallel_threshold: 1024,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a TOML file, falling back to defaults for any
    /// field the file omits
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.grid_cell_size <= 0.0 {
            return Err(WardenError::InvalidConfig(
                "grid_cell_size must be positive".into(),
            ));
        }

        // The peripheral cone is a superset of the direct cone
        if self.peripheral_angle_deg < self.fov_angle_deg {
            return Err(WardenError::InvalidConfig(format!(
                "peripheral_angle_deg ({}) must be >= fov_angle_deg ({})",
                self.peripheral_angle_deg, self.fov_angle_deg
            )));
        }

        if self.close_range_distance >= self.view_distance {
            return Err(WardenError::InvalidConfig(format!(
                "close_range_distance ({}) must be < view_distance ({})",
                self.close_range_distance, self.view_distance
            )));
        }

        // Duration divisors must stay strictly positive
        if self.base_detection_time <= 0.0
            || self.close_range_detection_time <= 0.0
            || self.min_detection_time <= 0.0
        {
            return Err(WardenError::InvalidConfig(
                "detection durations must be positive".into(),
            ));
        }

        if self.dark_light_floor <= 0.0 || self.dark_light_floor > 1.0 {
            return Err(WardenError::InvalidConfig(format!(
                "dark_light_floor ({}) must be in (0, 1]",
                self.dark_light_floor
            )));
        }

        if self.walk_speed_threshold > self.sprint_speed_threshold {
            return Err(WardenError::InvalidConfig(format!(
                "walk_speed_threshold ({}) must be <= sprint_speed_threshold ({})",
                self.walk_speed_threshold, self.sprint_speed_threshold
            )));
        }

        if self.max_suspicion <= 0.0 {
            return Err(WardenError::InvalidConfig(
                "max_suspicion must be positive".into(),
            ));
        }

        if self.suspicion_decay_rate <= 0.0 || self.lurk_rate <= 0.0 {
            return Err(WardenError::InvalidConfig(
                "suspicion rates must be positive".into(),
            ));
        }

        if self.bell_arrival_radius >= self.bell_search_radius {
            return Err(WardenError::InvalidConfig(format!(
                "bell_arrival_radius ({}) must be < bell_search_radius ({})",
                self.bell_arrival_radius, self.bell_search_radius
            )));
        }

        if self.night_length <= 0.0 {
            return Err(WardenError::InvalidConfig(
                "night_length must be positive".into(),
            ));
        }

        Ok(())
    }
}
