//! Navigation service boundary
//!
//! Pathfinding is an external collaborator. The AI core issues
//! fire-and-forget destination directives and polls for arrival on later
//! ticks; it never waits on a callback. [`DirectNavigator`] is the shipped
//! stand-in that moves entities in a straight line, which is all the tests
//! and the demo need.

use ahash::AHashMap;
use glam::Vec2;

use crate::core::types::EntityId;
use crate::ecs::world::World;

/// Outward navigation surface the core issues directives against
pub trait Navigator {
    /// Fire-and-forget move directive
    fn set_destination(&mut self, entity: EntityId, goal: Vec2);

    /// Drop any outstanding directive for the entity
    fn clear_destination(&mut self, entity: EntityId);

    /// Distance left on the current path
    ///
    /// `f32::INFINITY` when the entity has no destination, so pollers never
    /// mistake "not moving" for "arrived".
    fn remaining_distance(&self, entity: EntityId) -> f32;

    /// Whether a path is still being computed
    fn path_pending(&self, entity: EntityId) -> bool;
}

/// Straight-line mover standing in for the external navmesh agent
pub struct DirectNavigator {
    move_speed: f32,
    destinations: AHashMap<EntityId, Vec2>,
    remaining: AHashMap<EntityId, f32>,
}

impl DirectNavigator {
    pub fn new(move_speed: f32) -> Self {
        Self {
            move_speed: move_speed.max(0.01),
            destinations: AHashMap::new(),
            remaining: AHashMap::new(),
        }
    }

    /// Advance every moving entity one step
    ///
    /// This is the "external movement system" half of the stand-in: it is
    /// the only code that writes entity positions and facings.
    pub fn advance(&mut self, world: &mut World, dt: f32) {
        let step = self.move_speed * dt;
        let mut arrived = Vec::new();

        for (&entity, &goal) in &self.destinations {
            let Some(pos) = world.position_of(entity) else {
                arrived.push(entity);
                continue;
            };

            let offset = goal - pos;
            let dist = offset.length();
            if dist <= step {
                world.set_position(entity, goal);
                self.remaining.insert(entity, 0.0);
                arrived.push(entity);
            } else {
                let dir = offset / dist;
                world.set_position(entity, pos + dir * step);
                world.set_facing(entity, dir);
                self.remaining.insert(entity, dist - step);
            }
        }

        for entity in arrived {
            self.destinations.remove(&entity);
        }
    }

    pub fn is_moving(&self, entity: EntityId) -> bool {
        self.destinations.contains_key(&entity)
    }
}

impl Navigator for DirectNavigator {
    fn set_destination(&mut self, entity: EntityId, goal: Vec2) {
        self.destinations.insert(entity, goal);
        self.remaining.insert(entity, f32::INFINITY);
    }

    fn clear_destination(&mut self, entity: EntityId) {
        self.destinations.remove(&entity);
        self.remaining.remove(&entity);
    }

    fn remaining_distance(&self, entity: EntityId) -> f32 {
        self.remaining.get(&entity).copied().unwrap_or(f32::INFINITY)
    }

    fn path_pending(&self, _entity: EntityId) -> bool {
        // Straight-line paths are available immediately
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;

    #[test]
    fn test_direct_navigator_reaches_goal() {
        let mut world = World::new(SimulationConfig::default());
        let id = world.spawn_guard("Watch".into(), Vec2::ZERO, Vec2::X);

        let mut nav = DirectNavigator::new(2.0);
        nav.set_destination(id, Vec2::new(10.0, 0.0));

        for _ in 0..100 {
            nav.advance(&mut world, 0.1);
        }

        assert_eq!(world.position_of(id), Some(Vec2::new(10.0, 0.0)));
        assert!(!nav.is_moving(id));
        assert_eq!(nav.remaining_distance(id), f32::INFINITY);
    }

    #[test]
    fn test_remaining_distance_shrinks() {
        let mut world = World::new(SimulationConfig::default());
        let id = world.spawn_guard("Watch".into(), Vec2::ZERO, Vec2::X);

        let mut nav = DirectNavigator::new(1.0);
        nav.set_destination(id, Vec2::new(10.0, 0.0));
        assert_eq!(nav.remaining_distance(id), f32::INFINITY);

        nav.advance(&mut world, 1.0);
        let first = nav.remaining_distance(id);
        nav.advance(&mut world, 1.0);
        let second = nav.remaining_distance(id);
        assert!(first < f32::INFINITY);
        assert!(second < first);
    }

    #[test]
    fn test_facing_follows_movement() {
        let mut world = World::new(SimulationConfig::default());
        let id = world.spawn_guard("Watch".into(), Vec2::ZERO, Vec2::X);

        let mut nav = DirectNavigator::new(1.0);
        nav.set_destination(id, Vec2::new(0.0, 10.0));
        nav.advance(&mut world, 1.0);

        let facing = world.facing_of(id).unwrap();
        assert!((facing - Vec2::Y).length() < 1e-4);
    }

    #[test]
    fn test_unknown_entity_is_dropped() {
        let mut world = World::new(SimulationConfig::default());
        let mut nav = DirectNavigator::new(1.0);
        let ghost = EntityId::new();
        nav.set_destination(ghost, Vec2::new(5.0, 5.0));
        nav.advance(&mut world, 1.0);
        assert!(!nav.is_moving(ghost));
    }
}
