//! Citizen archetype with SoA layout

use glam::Vec2;

use crate::core::config::SimulationConfig;
use crate::core::types::EntityId;
use crate::entity::activity::Activity;
use crate::entity::detection::DetectionSystem;
use crate::entity::suspicion::SuspicionMeter;

/// Structure of Arrays for citizen entities
///
/// Citizens raise alarms rather than fight: maxed-out suspicion sends them
/// running for the nearest bell, and a tolling bell at high alert sends
/// them fleeing home.
pub struct CitizenArchetype {
    pub ids: Vec<EntityId>,
    pub names: Vec<String>,
    pub positions: Vec<Vec2>,
    pub facings: Vec<Vec2>,
    /// Where this citizen flees to
    pub homes: Vec<Vec2>,
    pub detection: Vec<DetectionSystem>,
    pub suspicion: Vec<SuspicionMeter>,
    pub activities: Vec<Activity>,
    /// Whether this entity runs for a bell when maxing out
    pub rings_bells: Vec<bool>,
    pub alive: Vec<bool>,
}

impl CitizenArchetype {
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            names: Vec::new(),
            positions: Vec::new(),
            facings: Vec::new(),
            homes: Vec::new(),
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
        self.homes.push(position);
        self.detection.push(DetectionSystem::from_config(config));
        self.suspicion.push(SuspicionMeter::from_config(config));
        self.activities.push(Activity::Idle);
        self.rings_bells.push(true);
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

impl Default for CitizenArchetype {
    fn default() -> Self {
        Self::new()
    }
}
