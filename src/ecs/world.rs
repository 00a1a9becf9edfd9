//! ECS World - owns all entities, bells, and shared alert state

use ahash::AHashMap;
use glam::Vec2;

use crate::alert::bell::{Bell, BellRegistry};
use crate::alert::global::GlobalAlertState;
use crate::core::config::SimulationConfig;
use crate::core::night::NightClock;
use crate::core::types::{EntityId, NpcKind, TargetState};
use crate::entity::activity::Activity;
use crate::entity::citizen::CitizenArchetype;
use crate::entity::guard::GuardArchetype;
use crate::simulation::stimulus::Stimulus;

/// The game world containing all entities and the shared services they read
///
/// Shared state is owned here and passed down explicitly rather than
/// reached through globals: the config, the global alert level, the night
/// clock, and the bell registry.
pub struct World {
    pub current_tick: u64,
    pub config: SimulationConfig,
    entity_registry: AHashMap<EntityId, (NpcKind, usize)>,
    pub guards: GuardArchetype,
    pub citizens: CitizenArchetype,
    pub bells: BellRegistry,
    pub alert: GlobalAlertState,
    pub night: NightClock,
    /// The hunted intruder; `None` is a normal, quiet state of affairs
    pub target: Option<TargetState>,
    /// Stimuli reported since the last tick, drained once per tick
    pub(crate) stimuli: Vec<Stimulus>,
}

impl World {
    pub fn new(config: SimulationConfig) -> Self {
        let night = NightClock::new(config.night_length);
        Self {
            current_tick: 0,
            config,
            entity_registry: AHashMap::new(),
            guards: GuardArchetype::new(),
            citizens: CitizenArchetype::new(),
            bells: BellRegistry::new(),
            alert: GlobalAlertState::new(),
            night,
            target: None,
            stimuli: Vec::new(),
        }
    }

    // === SPAWNING ===

    pub fn spawn_guard(&mut self, name: String, position: Vec2, facing: Vec2) -> EntityId {
        let id = EntityId::new();
        let index = self.guards.count();
        self.guards.spawn(id, name, position, facing, &self.config);
        self.entity_registry.insert(id, (NpcKind::Guard, index));
        id
    }

    pub fn spawn_citizen(&mut self, name: String, position: Vec2, facing: Vec2) -> EntityId {
        let id = EntityId::new();
        let index = self.citizens.count();
        self.citizens.spawn(id, name, position, facing, &self.config);
        self.entity_registry.insert(id, (NpcKind::Citizen, index));
        id
    }

    /// Place a bell using the configured toll budget and cooldown
    pub fn add_bell(&mut self, position: Vec2) -> crate::core::types::BellId {
        self.bells.add(Bell::new(
            position,
            self.config.bell_max_tolls,
            self.config.bell_toll_cooldown,
        ))
    }

    /// Mark an entity dead; its slot stays allocated, its id stops resolving
    pub fn despawn(&mut self, id: EntityId) {
        if let Some((kind, index)) = self.entity_registry.remove(&id) {
            match kind {
                NpcKind::Guard => self.guards.alive[index] = false,
                NpcKind::Citizen => self.citizens.alive[index] = false,
            }
        }
    }

    // === LOOKUPS ===

    pub fn get_entity_info(&self, id: EntityId) -> Option<(NpcKind, usize)> {
        self.entity_registry.get(&id).copied()
    }

    pub fn entity_count(&self) -> usize {
        self.entity_registry.len()
    }

    pub fn position_of(&self, id: EntityId) -> Option<Vec2> {
        self.get_entity_info(id).map(|(kind, i)| match kind {
            NpcKind::Guard => self.guards.positions[i],
            NpcKind::Citizen => self.citizens.positions[i],
        })
    }

    pub fn facing_of(&self, id: EntityId) -> Option<Vec2> {
        self.get_entity_info(id).map(|(kind, i)| match kind {
            NpcKind::Guard => self.guards.facings[i],
            NpcKind::Citizen => self.citizens.facings[i],
        })
    }

    /// Written by the external movement system, never by the AI core
    pub fn set_position(&mut self, id: EntityId, position: Vec2) {
        if let Some((kind, i)) = self.get_entity_info(id) {
            match kind {
                NpcKind::Guard => self.guards.positions[i] = position,
                NpcKind::Citizen => self.citizens.positions[i] = position,
            }
        }
    }

    pub fn set_facing(&mut self, id: EntityId, facing: Vec2) {
        let facing = facing.normalize_or_zero();
        if let Some((kind, i)) = self.get_entity_info(id) {
            match kind {
                NpcKind::Guard => self.guards.facings[i] = facing,
                NpcKind::Citizen => self.citizens.facings[i] = facing,
            }
        }
    }

    // === TARGET ===

    pub fn set_target(&mut self, target: TargetState) {
        self.target = Some(target);
    }

    pub fn update_target(&mut self, position: Vec2, velocity: Vec2) {
        match &mut self.target {
            Some(target) => {
                target.position = position;
                target.velocity = velocity;
            }
            None => {
                self.target = Some(TargetState {
                    position,
                    velocity,
                    disguised: false,
                });
            }
        }
    }

    pub fn set_target_disguised(&mut self, disguised: bool) {
        if let Some(target) = &mut self.target {
            target.disguised = disguised;
        }
    }

    pub fn clear_target(&mut self) {
        self.target = None;
    }

    // === STIMULI ===

    /// Report a loud noise; consumed at the start of the next tick
    pub fn report_noise(&mut self, position: Vec2, loudness: f32) {
        self.stimuli.push(Stimulus::Noise {
            position,
            loudness: loudness.clamp(0.0, 1.0),
        });
    }

    /// Report a hostile act for nearby witnesses with line of sight
    pub fn report_witnessed_act(&mut self, position: Vec2) {
        self.stimuli.push(Stimulus::WitnessedAct { position });
    }

    // === LIFECYCLE ===

    pub fn tick(&mut self) {
        self.current_tick += 1;
    }

    /// External dawn trigger: reset the night and everything scoped to it
    ///
    /// Global alert drops to calm, bells recover their toll budget, and
    /// every entity forgets the previous night's suspicions and sightings.
    pub fn begin_new_night(&mut self) {
        self.night.begin_new_night();
        self.alert.reset();
        self.bells.reset_for_new_night();
        self.stimuli.clear();

        for i in 0..self.guards.count() {
            self.guards.detection[i].reset();
            self.guards.suspicion[i].reset();
            self.guards.activities[i] = Activity::Idle;
        }
        for i in 0..self.citizens.count() {
            self.citizens.detection[i].reset();
            self.citizens.suspicion[i].reset();
            self.citizens.activities[i] = Activity::Idle;
        }

        tracing::info!(night = self.night.nights_elapsed, "new night begins");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::suspicion::SuspicionReason;

    #[test]
    fn test_world_creation() {
        let world = World::new(SimulationConfig::default());
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.current_tick, 0);
        assert!(world.target.is_none());
    }

    #[test]
    fn test_spawn_and_lookup() {
        let mut world = World::new(SimulationConfig::default());
        let guard = world.spawn_guard("Aldric".into(), Vec2::new(1.0, 2.0), Vec2::X);
        let citizen = world.spawn_citizen("Mira".into(), Vec2::new(3.0, 4.0), Vec2::Y);

        assert_eq!(world.entity_count(), 2);
        assert_eq!(world.get_entity_info(guard), Some((NpcKind::Guard, 0)));
        assert_eq!(world.get_entity_info(citizen), Some((NpcKind::Citizen, 0)));
        assert_eq!(world.position_of(guard), Some(Vec2::new(1.0, 2.0)));
        assert_eq!(world.position_of(citizen), Some(Vec2::new(3.0, 4.0)));
    }

    #[test]
    fn test_despawn_stops_resolving() {
        let mut world = World::new(SimulationConfig::default());
        let guard = world.spawn_guard("Aldric".into(), Vec2::ZERO, Vec2::X);
        world.despawn(guard);

        assert_eq!(world.get_entity_info(guard), None);
        assert_eq!(world.position_of(guard), None);
        assert!(!world.guards.alive[0]);
    }

    #[test]
    fn test_begin_new_night_resets_entities() {
        let mut world = World::new(SimulationConfig::default());
        let guard = world.spawn_guard("Aldric".into(), Vec2::ZERO, Vec2::X);
        let (_, i) = world.get_entity_info(guard).unwrap();

        world.guards.suspicion[i].add_suspicion(1000.0, SuspicionReason::WitnessedAct);
        world.alert.advance_level();
        let bell = world.add_bell(Vec2::new(5.0, 0.0));
        world.bells.get_mut(bell).unwrap().ring(0.0);

        world.begin_new_night();
        assert_eq!(world.guards.suspicion[i].current(), 0.0);
        assert_eq!(world.alert.current_level(), crate::alert::AlertLevel::Calm);
        assert_eq!(world.bells.get(bell).unwrap().toll_count(), 0);
    }
}
