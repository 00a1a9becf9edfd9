//! Cross-entity alert propagation
//!
//! Everything that happens when suspicion boils over: the one-shot
//! suspicion contagion to nearby entities, bell seeking, and the
//! type-specific reactions a tolling bell dispatches to everyone in
//! earshot. All scans here run against the tick's position snapshot and
//! apply their mutations within the same tick; chained max-outs are queued
//! on a worklist rather than recursed, so each scan stays atomic and the
//! at-max latch guarantees termination.

use glam::Vec2;

use crate::alert::bell::RingOutcome;
use crate::core::types::{BellId, EntityId, NpcKind};
use crate::ecs::world::World;
use crate::entity::activity::Activity;
use crate::entity::suspicion::SuspicionReason;
use crate::services::nav::Navigator;
use crate::simulation::events::{AiEvent, MovePurpose};
use crate::spatial::SparseHashGrid;

/// Entity slot: kind plus archetype index
pub type Slot = (NpcKind, usize);

fn entity_id(world: &World, (kind, i): Slot) -> EntityId {
    match kind {
        NpcKind::Guard => world.guards.ids[i],
        NpcKind::Citizen => world.citizens.ids[i],
    }
}

fn entity_position(world: &World, (kind, i): Slot) -> Vec2 {
    match kind {
        NpcKind::Guard => world.guards.positions[i],
        NpcKind::Citizen => world.citizens.positions[i],
    }
}

/// Drain a worklist of entities that crossed into max suspicion
///
/// Each entry fires max-suspicion behavior exactly once: bell seeking for
/// entities configured to ring, then the contagion bump, which may push
/// further entities onto the worklist.
pub fn process_max_suspicion(
    world: &mut World,
    nav: &mut dyn Navigator,
    grid: &SparseHashGrid,
    mut worklist: Vec<Slot>,
    events: &mut Vec<AiEvent>,
) {
    while let Some(slot) = worklist.pop() {
        handle_reach_max(world, nav, grid, slot, events, &mut worklist);
    }
}

fn handle_reach_max(
    world: &mut World,
    nav: &mut dyn Navigator,
    grid: &SparseHashGrid,
    slot: Slot,
    events: &mut Vec<AiEvent>,
    worklist: &mut Vec<Slot>,
) {
    let (kind, i) = slot;
    let entity = entity_id(world, slot);
    let position = entity_position(world, slot);

    tracing::info!(?entity, ?kind, "max suspicion reached");
    events.push(AiEvent::MaxSuspicionReached { entity });

    let rings_bells = match kind {
        NpcKind::Guard => world.guards.rings_bells[i],
        NpcKind::Citizen => world.citizens.rings_bells[i],
    };

    if rings_bells {
        match world
            .bells
            .nearest_available(position, world.config.bell_search_radius)
        {
            Some(bell_id) => {
                if let Some(bell) = world.bells.get(bell_id) {
                    let goal = bell.position;
                    match kind {
                        NpcKind::Guard => {
                            world.guards.suspicion[i].begin_bell_seek(bell_id);
                            world.guards.activities[i] = Activity::SeekingBell;
                        }
                        NpcKind::Citizen => {
                            world.citizens.suspicion[i].begin_bell_seek(bell_id);
                            world.citizens.activities[i] = Activity::SeekingBell;
                        }
                    }
                    nav.set_destination(entity, goal);
                    events.push(AiEvent::MoveRequested {
                        entity,
                        goal,
                        purpose: MovePurpose::SeekBell,
                    });
                }
            }
            None => {
                tracing::debug!(?entity, "no reachable bell in search radius");
            }
        }
    }

    alert_nearby_npcs(world, slot, position, grid, events, worklist);
}

/// One-shot flat suspicion bump to every other entity in the alert radius
fn alert_nearby_npcs(
    world: &mut World,
    source: Slot,
    position: Vec2,
    grid: &SparseHashGrid,
    events: &mut Vec<AiEvent>,
    worklist: &mut Vec<Slot>,
) {
    let bump = world.config.contagion_bump;
    for other in grid.query_radius(position, world.config.contagion_radius) {
        let Some(slot) = world.get_entity_info(other) else {
            continue;
        };
        if slot == source {
            continue;
        }

        let (kind, i) = slot;
        let delta = match kind {
            NpcKind::Guard => {
                world.guards.suspicion[i].add_suspicion(bump, SuspicionReason::Contagion)
            }
            NpcKind::Citizen => {
                world.citizens.suspicion[i].add_suspicion(bump, SuspicionReason::Contagion)
            }
        };

        if delta.changed {
            events.push(AiEvent::SuspicionChanged {
                entity: other,
                fraction: delta.fraction,
                reason: SuspicionReason::Contagion,
            });
        }
        if delta.crossed_max {
            worklist.push(slot);
        }
    }
}

/// Toll a bell and dispatch reactions to everyone in its radius
///
/// Returns whether the bell actually rang. Sabotaged, exhausted, or
/// cooling-down bells are quiet no-ops.
pub fn ring_bell(
    world: &mut World,
    nav: &mut dyn Navigator,
    grid: &SparseHashGrid,
    bell_id: BellId,
    ringer: Option<EntityId>,
    events: &mut Vec<AiEvent>,
) -> bool {
    let now = world.night.elapsed();
    let (bell_pos, outcome) = {
        let Some(bell) = world.bells.get_mut(bell_id) else {
            tracing::debug!(?bell_id, "ring on missing bell ignored");
            return false;
        };
        (bell.position, bell.ring(now))
    };

    let RingOutcome::Rung { toll_count } = outcome else {
        tracing::debug!(?bell_id, ?outcome, "bell did not ring");
        return false;
    };

    tracing::info!(?bell_id, toll_count, "bell tolls");
    events.push(AiEvent::BellRung {
        bell: bell_id,
        toll_count,
        by: ringer,
    });

    if let Some((from, to)) = world.alert.advance_level() {
        events.push(AiEvent::AlertLevelChanged { from, to });
    }

    let citizens_flee = world.alert.current_level() >= world.config.citizen_flee_level;
    let last_known = world.alert.last_known_target_position();
    let mut worklist = Vec::new();

    for other in grid.query_radius(bell_pos, world.config.bell_radius) {
        if Some(other) == ringer {
            continue;
        }
        let Some((kind, i)) = world.get_entity_info(other) else {
            continue;
        };

        match kind {
            NpcKind::Citizen => {
                // React-to-noise at full intensity
                let amount = world.config.loud_noise_suspicion * world.config.bell_noise_intensity;
                let delta =
                    world.citizens.suspicion[i].add_suspicion(amount, SuspicionReason::BellAlarm);
                if delta.changed {
                    events.push(AiEvent::SuspicionChanged {
                        entity: other,
                        fraction: delta.fraction,
                        reason: SuspicionReason::BellAlarm,
                    });
                }
                if delta.crossed_max {
                    worklist.push((kind, i));
                }

                if citizens_flee {
                    let home = world.citizens.homes[i];
                    world.citizens.activities[i] = Activity::Fleeing { from: bell_pos };
                    nav.set_destination(other, home);
                    events.push(AiEvent::CitizenFleeing {
                        entity: other,
                        from: bell_pos,
                    });
                    events.push(AiEvent::MoveRequested {
                        entity: other,
                        goal: home,
                        purpose: MovePurpose::Flee,
                    });
                }
            }
            NpcKind::Guard => {
                // Investigate the noise; a known sighting overrides the
                // bell itself as the destination
                let goal = last_known.unwrap_or(bell_pos);
                world.guards.activities[i] = Activity::Investigating { position: goal };
                nav.set_destination(other, goal);
                events.push(AiEvent::GuardInvestigating {
                    entity: other,
                    position: goal,
                });
                events.push(AiEvent::MoveRequested {
                    entity: other,
                    goal,
                    purpose: MovePurpose::Investigate,
                });
            }
        }
    }

    process_max_suspicion(world, nav, grid, worklist, events);
    true
}

/// Poll every bell-seeking entity for arrival
///
/// Arrival at an intact bell rings it and settles the seeker to half
/// suspicion; a bell that is gone, sabotaged, or unable to toll makes the
/// seeker give up and stand down.
pub fn poll_bell_seekers(
    world: &mut World,
    nav: &mut dyn Navigator,
    grid: &SparseHashGrid,
    events: &mut Vec<AiEvent>,
) {
    enum Resolution {
        Ring(Slot, BellId),
        Abandon(Slot),
    }

    let now = world.night.elapsed();
    let arrival = world.config.bell_arrival_radius;
    let mut resolutions = Vec::new();

    let seekers = world
        .guards
        .iter_living()
        .map(|i| (NpcKind::Guard, i))
        .chain(world.citizens.iter_living().map(|i| (NpcKind::Citizen, i)));

    for slot in seekers {
        let (kind, i) = slot;
        let meter = match kind {
            NpcKind::Guard => &world.guards.suspicion[i],
            NpcKind::Citizen => &world.citizens.suspicion[i],
        };
        if !meter.is_seeking_bell() {
            continue;
        }

        let Some(bell_id) = meter.bell_target() else {
            resolutions.push(Resolution::Abandon(slot));
            continue;
        };
        let Some(bell) = world.bells.get(bell_id) else {
            // Bell destroyed while en route
            resolutions.push(Resolution::Abandon(slot));
            continue;
        };

        if entity_position(world, slot).distance(bell.position) > arrival {
            continue;
        }

        if bell.is_sabotaged() || !bell.can_ring(now) {
            resolutions.push(Resolution::Abandon(slot));
        } else {
            resolutions.push(Resolution::Ring(slot, bell_id));
        }
    }

    for resolution in resolutions {
        match resolution {
            Resolution::Abandon(slot) => {
                let (kind, i) = slot;
                let entity = entity_id(world, slot);
                tracing::debug!(?entity, "bell unavailable, abandoning seek");
                match kind {
                    NpcKind::Guard => {
                        world.guards.suspicion[i].abandon_bell_seek();
                        world.guards.activities[i] = Activity::Idle;
                    }
                    NpcKind::Citizen => {
                        world.citizens.suspicion[i].abandon_bell_seek();
                        world.citizens.activities[i] = Activity::Idle;
                    }
                }
                nav.clear_destination(entity);
            }
            Resolution::Ring(slot, bell_id) => {
                let (kind, i) = slot;
                let entity = entity_id(world, slot);
                let rang = ring_bell(world, nav, grid, bell_id, Some(entity), events);

                let meter = match kind {
                    NpcKind::Guard => &mut world.guards.suspicion[i],
                    NpcKind::Citizen => &mut world.citizens.suspicion[i],
                };
                if rang {
                    meter.settle_after_ringing();
                    events.push(AiEvent::SuspicionChanged {
                        entity,
                        fraction: meter.fraction(),
                        reason: SuspicionReason::BellAlarm,
                    });
                } else {
                    meter.abandon_bell_seek();
                }
                match kind {
                    NpcKind::Guard => world.guards.activities[i] = Activity::Idle,
                    NpcKind::Citizen => world.citizens.activities[i] = Activity::Idle,
                }
                nav.clear_destination(entity);
            }
        }
    }
}
