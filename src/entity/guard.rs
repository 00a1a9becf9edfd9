//! Guard archetype with SoA layout

use glam::Vec2;

use crate::core::config::SimulationConfig;
use crate::core::types::EntityId;
use crate::entity::activity::Activity;
use crate::entity::detection::DetectionSystem;
use crate::entity::suspicion::SuspicionMeter;

/// Structure of Arrays for guard entities
///
/// Guards converge on trouble: a bell in earshot sends them toward the
/// last-known target position when one exists.
pub struct GuardArchetype {
    pub ids: Vec<EntityId>,
    pub names: Vec<String>,
    pub positions: Vec<Vec2>,
    pub facings: Vec<Vec2>,
    /// Patrol anchor the guard drifts back to when idle
    pub posts: Vec<Vec2>,
    pub detection: Vec<DetectionSystem>,
    pub suspicion: Vec<SuspicionMeter>,
    pub activities: Vec<Activity>,
    /// Whether this entity runs for a bell when maxing out
    pub rings_bells: Vec<bool>,
    pub alive: Vec<bool>,
}

impl GuardArchetype {
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            names: Vec::new(),
            positions: Vec::new(),
            facings: Vec::new(),
            posts: Vec::new(),
            detection: Vec::new(),
            suspicion: Vec::new(),
            activities: Vec::new(),
            rings_bells: Vec::new(),
            alive: Vec::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn spawn(&mut self, id: EntityId, name: String, position: Vec2, facing: Vec2, config: &SimulationConfig) {
        self.ids.push(id);
        self.names.push(name);
        self.positions.push(position);
        self.facings.push(facing.normalize_or_zero());
        self.posts.push(position);
        self.detection.push(DetectionSystem::from_config(config));
        self.suspicion.push(SuspicionMeter::from_config(config));
        self.activities.push(Activity::Idle);
        // Guards act on trouble themselves rather than raising bells
        self.rings_bells.push(false);
        self.alive.push(true);
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.ids.iter().position(|&e| e == id)
    }

    pub fn iter_living(&self) -> impl Iterator<Item = usize> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, &alive)| alive)
            .map(|(i, _)| i)
    }
}

impl Default for GuardArchetype {
    fn default() -> Self {
        Self::new()
    }
}
