//! Per-entity vision sensor
//!
//! Each guard or citizen owns one [`DetectionSystem`]. Every tick it is
//! evaluated against the current target pose and produces an accumulating
//! detection timer gated by cone membership, distance, target speed, and
//! ambient light. There is deliberately no partial memory across visibility
//! gaps: the instant the target leaves both cones or is obstructed, the
//! timer and progress drop to zero.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::types::Pose;
use crate::services::geometry::{GeometryOracle, ObstacleMask};

/// Which vision cone the target currently occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewZone {
    #[default]
    None,
    /// Inside the direct field-of-view cone
    Direct,
    /// Inside the peripheral cone but outside the direct one
    Peripheral,
}

/// Snapshot of the target handed to one evaluation
#[derive(Debug, Clone, Copy)]
pub struct TargetSample {
    pub position: Vec2,
    pub speed: f32,
}

/// Static vision tuning for one entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionProfile {
    /// Direct field-of-view cone, full angle in degrees
    pub fov_angle_deg: f32,
    /// Peripheral cone (superset of direct), full angle in degrees
    pub peripheral_angle_deg: f32,
    pub peripheral_enabled: bool,
    pub view_distance: f32,
    pub base_detection_time: f32,
    pub close_range_distance: f32,
    pub close_range_detection_time: f32,
    pub peripheral_time_multiplier: f32,
    pub walk_speed_threshold: f32,
    pub sprint_speed_threshold: f32,
    pub walking_time_multiplier: f32,
    pub sprinting_time_multiplier: f32,
    pub dark_light_floor: f32,
    pub min_detection_time: f32,
}

impl VisionProfile {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            fov_angle_deg: config.fov_angle_deg,
            peripheral_angle_deg: config.peripheral_angle_deg,
            peripheral_enabled: config.peripheral_enabled,
            view_distance: config.view_distance,
            base_detection_time: config.base_detection_time,
            close_range_distance: config.close_range_distance,
            close_range_detection_time: config.close_range_detection_time,
            peripheral_time_multiplier: config.peripheral_time_multiplier,
            walk_speed_threshold: config.walk_speed_threshold,
            sprint_speed_threshold: config.sprint_speed_threshold,
            walking_time_multiplier: config.walking_time_multiplier,
            sprinting_time_multiplier: config.sprinting_time_multiplier,
            dark_light_floor: config.dark_light_floor,
            min_detection_time: config.min_detection_time,
        }
    }
}

/// What one evaluation tick produced
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectionOutcome {
    pub zone: ViewZone,
    /// Target in a cone and unobstructed this tick
    pub visible: bool,
    /// Progress after this tick (1.0 on the acquisition tick)
    pub progress: f32,
    /// Timer accumulated this tick
    pub progressed: bool,
    /// Target position recorded on full acquisition
    pub acquired: Option<Vec2>,
    /// Visibility failed this tick after accumulating previously
    pub lost: bool,
}

/// Per-entity detection sensor state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSystem {
    pub profile: VisionProfile,
    timer: f32,
    progress: f32,
    detecting: bool,
    /// Sticky: survives target loss, cleared only by `reset`
    last_known_target: Option<Vec2>,
}

impl DetectionSystem {
    pub fn new(profile: VisionProfile) -> Self {
        Self {
            profile,
            timer: 0.0,
            progress: 0.0,
            detecting: false,
            last_known_target: None,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(VisionProfile::from_config(config))
    }

    /// Detection progress in [0, 1]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_detecting(&self) -> bool {
        self.detecting
    }

    pub fn last_known_target(&self) -> Option<Vec2> {
        self.last_known_target
    }

    /// Hard reset: timer, progress, and the sticky last-known position
    pub fn reset(&mut self) {
        self.timer = 0.0;
        self.progress = 0.0;
        self.detecting = false;
        self.last_known_target = None;
    }

    /// Classify which cone the target occupies, ignoring obstruction
    pub fn classify_zone(&self, observer: Pose, target_pos: Vec2, oracle: &dyn GeometryOracle) -> ViewZone {
        let distance = oracle.distance(observer.position, target_pos);
        if distance >= self.profile.view_distance {
            return ViewZone::None;
        }

        let to_target = target_pos - observer.position;
        let angle = oracle.angle_between(observer.facing, to_target).to_degrees();

        if angle < self.profile.fov_angle_deg / 2.0 {
            ViewZone::Direct
        } else if self.profile.peripheral_enabled && angle < self.profile.peripheral_angle_deg / 2.0 {
            ViewZone::Peripheral
        } else {
            ViewZone::None
        }
    }

    /// Effective time-to-detect for the given conditions (always > 0)
    ///
    /// Inside the close-range band the fixed close-range duration overrides
    /// every other factor. Otherwise the base duration scales linearly from
    /// half (point blank) to full (view-distance edge), peripheral-only
    /// sightings are slowed by a multiplier, faster targets are detected in
    /// tiered shorter times, and the result is divided by the floored
    /// lighting modifier so darkness slows detection by a bounded factor.
    pub fn effective_detection_time(
        &self,
        distance: f32,
        zone: ViewZone,
        target_speed: f32,
        ambient_light: f32,
    ) -> f32 {
        let p = &self.profile;

        if distance < p.close_range_distance {
            return p.close_range_detection_time.max(p.min_detection_time);
        }

        let ratio = (distance / p.view_distance.max(p.min_detection_time)).clamp(0.0, 1.0);
        let mut time = p.base_detection_time * 0.5 + p.base_detection_time * 0.5 * ratio;

        if zone == ViewZone::Peripheral {
            time *= p.peripheral_time_multiplier;
        }

        time *= if target_speed >= p.sprint_speed_threshold {
            p.sprinting_time_multiplier
        } else if target_speed >= p.walk_speed_threshold {
            p.walking_time_multiplier
        } else {
            1.0
        };

        let light = ambient_light.clamp(p.dark_light_floor, 1.0);
        time /= light;

        time.max(p.min_detection_time)
    }

    /// Run one detection tick for this observer against the target
    ///
    /// A missing target is a normal condition: the sensor reports nothing
    /// detected and, if it had been accumulating, drops its timer the same
    /// way any other visibility failure does.
    pub fn evaluate(
        &mut self,
        observer: Pose,
        target: Option<TargetSample>,
        ambient_light: f32,
        oracle: &dyn GeometryOracle,
        dt: f32,
    ) -> DetectionOutcome {
        let Some(target) = target else {
            return self.fail_visibility(ViewZone::None);
        };

        let zone = self.classify_zone(observer, target.position, oracle);
        if zone == ViewZone::None {
            return self.fail_visibility(zone);
        }

        if oracle.raycast_blocked(observer.position, target.position, ObstacleMask::VISION) {
            return self.fail_visibility(ViewZone::None);
        }

        // Visible: accumulate toward the effective time for these conditions
        let distance = oracle.distance(observer.position, target.position);
        let effective = self.effective_detection_time(distance, zone, target.speed, ambient_light);

        self.timer += dt;
        self.detecting = true;
        self.last_known_target = Some(target.position);

        let progress = (self.timer / effective).clamp(0.0, 1.0);
        if progress >= 1.0 {
            // Acquired: signal, then restart the timer for re-acquisition
            self.timer = 0.0;
            self.progress = 0.0;
            return DetectionOutcome {
                zone,
                visible: true,
                progress: 1.0,
                progressed: true,
                acquired: Some(target.position),
                lost: false,
            };
        }

        self.progress = progress;
        DetectionOutcome {
            zone,
            visible: true,
            progress,
            progressed: true,
            acquired: None,
            lost: false,
        }
    }

    fn fail_visibility(&mut self, zone: ViewZone) -> DetectionOutcome {
        let was_detecting = self.detecting;
        self.timer = 0.0;
        self.progress = 0.0;
        self.detecting = false;
        DetectionOutcome {
            zone,
            visible: false,
            progress: 0.0,
            progressed: false,
            acquired: None,
            lost: was_detecting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::geometry::{OpenGround, WallMap};

    fn profile() -> VisionProfile {
        VisionProfile::from_config(&SimulationConfig::default())
    }

    fn facing_x_at_origin() -> Pose {
        Pose::new(Vec2::ZERO, Vec2::X)
    }

    fn still_target(x: f32, y: f32) -> Option<TargetSample> {
        Some(TargetSample {
            position: Vec2::new(x, y),
            speed: 0.0,
        })
    }

    #[test]
    fn test_close_range_overrides_base_time() {
        // Distance 3 is inside the close-range band (6), so the 0.1s
        // close-range duration wins over the 0.5s base time.
        let mut system = DetectionSystem::new(profile());
        let oracle = OpenGround;

        let first = system.evaluate(facing_x_at_origin(), still_target(3.0, 0.0), 1.0, &oracle, 0.05);
        assert!(first.acquired.is_none());
        let second = system.evaluate(facing_x_at_origin(), still_target(3.0, 0.0), 1.0, &oracle, 0.05);
        assert!(second.acquired.is_some());
    }

    #[test]
    fn test_close_range_ignores_lighting_and_speed() {
        let system = DetectionSystem::new(profile());
        let dark_sprinting = system.effective_detection_time(3.0, ViewZone::Direct, 10.0, 0.0);
        let lit_still = system.effective_detection_time(3.0, ViewZone::Direct, 0.0, 1.0);
        assert_eq!(dark_sprinting, lit_still);
        assert_eq!(lit_still, profile().close_range_detection_time);
    }

    #[test]
    fn test_outside_cone_zeroes_progress_same_tick() {
        let mut system = DetectionSystem::new(profile());
        let oracle = OpenGround;

        system.evaluate(facing_x_at_origin(), still_target(8.0, 0.0), 1.0, &oracle, 0.05);
        assert!(system.is_detecting());
        assert!(system.progress() > 0.0);

        // Target steps directly behind the observer
        let outcome =
            system.evaluate(facing_x_at_origin(), still_target(-8.0, 0.0), 1.0, &oracle, 0.05);
        assert!(outcome.lost);
        assert_eq!(outcome.progress, 0.0);
        assert_eq!(system.progress(), 0.0);
        assert!(!system.is_detecting());
    }

    #[test]
    fn test_obstruction_blocks_detection() {
        let mut system = DetectionSystem::new(profile());
        let mut map = WallMap::new();
        map.add_wall(Vec2::new(4.0, -2.0), Vec2::new(4.0, 2.0));

        let outcome = system.evaluate(facing_x_at_origin(), still_target(8.0, 0.0), 1.0, &map, 0.1);
        assert!(!outcome.visible);
        assert_eq!(system.progress(), 0.0);
    }

    #[test]
    fn test_peripheral_detects_slower_than_direct() {
        let system = DetectionSystem::new(profile());
        let direct = system.effective_detection_time(10.0, ViewZone::Direct, 0.0, 1.0);
        let peripheral = system.effective_detection_time(10.0, ViewZone::Peripheral, 0.0, 1.0);
        assert!(peripheral > direct);
    }

    #[test]
    fn test_peripheral_zone_classification() {
        let system = DetectionSystem::new(profile());
        let oracle = OpenGround;
        // 60 degrees off axis: outside the 90-degree direct cone's 45-degree
        // half angle, inside the 160-degree peripheral cone's 80-degree half
        let off_axis = Vec2::new(10.0 * 0.5, 10.0 * 0.866);
        assert_eq!(
            system.classify_zone(facing_x_at_origin(), off_axis, &oracle),
            ViewZone::Peripheral
        );
        assert_eq!(
            system.classify_zone(facing_x_at_origin(), Vec2::new(10.0, 0.0), &oracle),
            ViewZone::Direct
        );
        assert_eq!(
            system.classify_zone(facing_x_at_origin(), Vec2::new(-10.0, 0.0), &oracle),
            ViewZone::None
        );
    }

    #[test]
    fn test_darkness_slows_by_bounded_factor() {
        let system = DetectionSystem::new(profile());
        let lit = system.effective_detection_time(10.0, ViewZone::Direct, 0.0, 1.0);
        let dark = system.effective_detection_time(10.0, ViewZone::Direct, 0.0, 0.0);
        assert!((dark / lit - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_sprinting_detected_fastest() {
        let system = DetectionSystem::new(profile());
        let still = system.effective_detection_time(10.0, ViewZone::Direct, 0.0, 1.0);
        let walking = system.effective_detection_time(10.0, ViewZone::Direct, 1.0, 1.0);
        let sprinting = system.effective_detection_time(10.0, ViewZone::Direct, 6.0, 1.0);
        assert!(sprinting < walking);
        assert!(walking < still);
    }

    #[test]
    fn test_missing_target_is_not_detected() {
        let mut system = DetectionSystem::new(profile());
        let oracle = OpenGround;

        let outcome = system.evaluate(facing_x_at_origin(), None, 1.0, &oracle, 0.1);
        assert!(!outcome.visible);
        assert!(!outcome.lost);

        // Accumulate, then lose the target entirely
        system.evaluate(facing_x_at_origin(), still_target(8.0, 0.0), 1.0, &oracle, 0.05);
        let outcome = system.evaluate(facing_x_at_origin(), None, 1.0, &oracle, 0.1);
        assert!(outcome.lost);
        assert_eq!(system.progress(), 0.0);
    }

    #[test]
    fn test_last_known_sticky_until_reset() {
        let mut system = DetectionSystem::new(profile());
        let oracle = OpenGround;

        system.evaluate(facing_x_at_origin(), still_target(8.0, 0.0), 1.0, &oracle, 0.05);
        assert_eq!(system.last_known_target(), Some(Vec2::new(8.0, 0.0)));

        system.evaluate(facing_x_at_origin(), None, 1.0, &oracle, 0.1);
        assert_eq!(system.last_known_target(), Some(Vec2::new(8.0, 0.0)));

        system.reset();
        assert_eq!(system.last_known_target(), None);
    }

    #[test]
    fn test_zero_dt_is_harmless() {
        let mut system = DetectionSystem::new(profile());
        let oracle = OpenGround;
        let outcome = system.evaluate(facing_x_at_origin(), still_target(8.0, 0.0), 1.0, &oracle, 0.0);
        assert!(outcome.progress.is_finite());
        assert_eq!(outcome.progress, 0.0);
    }

    #[test]
    fn test_acquisition_resets_timer_for_reacquisition() {
        let mut system = DetectionSystem::new(profile());
        let oracle = OpenGround;

        let outcome = system.evaluate(facing_x_at_origin(), still_target(3.0, 0.0), 1.0, &oracle, 0.5);
        assert!(outcome.acquired.is_some());
        assert_eq!(system.progress(), 0.0);

        // Still visible next tick: accumulating again from zero
        let outcome = system.evaluate(facing_x_at_origin(), still_target(3.0, 0.0), 1.0, &oracle, 0.05);
        assert!(outcome.acquired.is_none());
        assert!(outcome.progress > 0.0);
    }
}
