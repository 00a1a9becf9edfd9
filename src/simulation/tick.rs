//! Tick system - orchestrates AI updates
//!
//! This is the core loop that ties together:
//! stimuli -> detection -> suspicion -> alert propagation -> movement directives
//!
//! Each tick advances every living entity one step. All cross-entity
//! scans run against a position snapshot taken at the start of the tick and
//! their mutations are applied within the same tick, so no entity observes
//! another's suspicion mid-scan.
//!
//! Uses rayon for the read-only detection evaluation when the population is
//! large; mutations are always applied sequentially.

use glam::Vec2;
use rayon::prelude::*;

use crate::alert::propagation::{poll_bell_seekers, process_max_suspicion, Slot};
use crate::core::types::{NpcKind, Pose};
use crate::ecs::world::World;
use crate::entity::activity::Activity;
use crate::entity::detection::{DetectionOutcome, DetectionSystem, TargetSample};
use crate::entity::suspicion::SuspicionReason;
use crate::services::geometry::{GeometryOracle, ObstacleMask};
use crate::services::nav::Navigator;
use crate::simulation::events::{AiEvent, MovePurpose};
use crate::simulation::stimulus::Stimulus;
use crate::spatial::SparseHashGrid;

/// Run a single AI tick
///
/// The pipeline, in order:
/// 1. Advance the night clock (dawn is reported, not auto-reset)
/// 2. Rebuild the spatial grid from current positions
/// 3. Drain queued stimuli (noises, witnessed acts)
/// 4. Evaluate every detection sensor against the target
/// 5. Update every suspicion meter (lurking, sprint proximity, decay)
/// 6. Process entities that crossed into max suspicion (bells, contagion)
/// 7. Poll bell-seekers for arrival and toll reached bells
/// 8. Poll investigation/flee arrivals
///
/// Returns the events that occurred, for the embedding game to consume.
pub fn run_simulation_tick(
    world: &mut World,
    oracle: &dyn GeometryOracle,
    nav: &mut dyn Navigator,
    dt: f32,
) -> Vec<AiEvent> {
    let mut events = Vec::new();

    if world.night.advance(dt) {
        tracing::info!(night = world.night.nights_elapsed, "dawn breaks");
        events.push(AiEvent::DawnBroke {
            nights_elapsed: world.night.nights_elapsed,
        });
    }
    let ambient = world.night.ambient_light();

    let grid = build_grid(world);

    let mut crossed_max = apply_stimuli(world, oracle, &grid, &mut events);
    run_detection(world, oracle, ambient, dt, &mut events);
    crossed_max.extend(run_suspicion(world, dt, &mut events));

    process_max_suspicion(world, nav, &grid, crossed_max, &mut events);
    poll_bell_seekers(world, nav, &grid, &mut events);
    poll_arrivals(world, nav, &mut events);

    world.tick();
    events
}

/// Snapshot all living entity positions into the spatial grid
fn build_grid(world: &World) -> SparseHashGrid {
    let mut grid = SparseHashGrid::new(world.config.grid_cell_size);
    grid.rebuild(
        world
            .guards
            .iter_living()
            .map(|i| (world.guards.ids[i], world.guards.positions[i]))
            .chain(
                world
                    .citizens
                    .iter_living()
                    .map(|i| (world.citizens.ids[i], world.citizens.positions[i])),
            ),
    );
    grid
}

/// Drain the stimulus queue and apply suspicion to affected entities
///
/// Noises carry by radius; witnessed acts require line of sight within the
/// witness's own view distance. Returns the slots that crossed into max.
fn apply_stimuli(
    world: &mut World,
    oracle: &dyn GeometryOracle,
    grid: &SparseHashGrid,
    events: &mut Vec<AiEvent>,
) -> Vec<Slot> {
    let stimuli = std::mem::take(&mut world.stimuli);
    let mut crossed = Vec::new();

    for stimulus in stimuli {
        match stimulus {
            Stimulus::Noise { position, loudness } => {
                let radius = world.config.noise_radius * loudness;
                let amount = world.config.loud_noise_suspicion * loudness;
                for other in grid.query_radius(position, radius) {
                    let Some((kind, i)) = world.get_entity_info(other) else {
                        continue;
                    };
                    let delta = match kind {
                        NpcKind::Guard => {
                            world.guards.suspicion[i].add_suspicion(amount, SuspicionReason::LoudNoise)
                        }
                        NpcKind::Citizen => world.citizens.suspicion[i]
                            .add_suspicion(amount, SuspicionReason::LoudNoise),
                    };
                    if delta.changed {
                        events.push(AiEvent::SuspicionChanged {
                            entity: other,
                            fraction: delta.fraction,
                            reason: SuspicionReason::LoudNoise,
                        });
                    }
                    if delta.crossed_max {
                        crossed.push((kind, i));
                    }
                }
            }
            Stimulus::WitnessedAct { position } => {
                let amount = world.config.witnessed_act_suspicion;

                let guard_witnesses: Vec<usize> = world
                    .guards
                    .iter_living()
                    .filter(|&i| {
                        let pos = world.guards.positions[i];
                        pos.distance(position) <= world.guards.detection[i].profile.view_distance
                            && !oracle.raycast_blocked(pos, position, ObstacleMask::VISION)
                    })
                    .collect();
                for i in guard_witnesses {
                    let delta =
                        world.guards.suspicion[i].add_suspicion(amount, SuspicionReason::WitnessedAct);
                    if delta.changed {
                        events.push(AiEvent::SuspicionChanged {
                            entity: world.guards.ids[i],
                            fraction: delta.fraction,
                            reason: SuspicionReason::WitnessedAct,
                        });
                    }
                    if delta.crossed_max {
                        crossed.push((NpcKind::Guard, i));
                    }
                }

                let citizen_witnesses: Vec<usize> = world
                    .citizens
                    .iter_living()
                    .filter(|&i| {
                        let pos = world.citizens.positions[i];
                        pos.distance(position) <= world.citizens.detection[i].profile.view_distance
                            && !oracle.raycast_blocked(pos, position, ObstacleMask::VISION)
                    })
                    .collect();
                for i in citizen_witnesses {
                    let delta = world.citizens.suspicion[i]
                        .add_suspicion(amount, SuspicionReason::WitnessedAct);
                    if delta.changed {
                        events.push(AiEvent::SuspicionChanged {
                            entity: world.citizens.ids[i],
                            fraction: delta.fraction,
                            reason: SuspicionReason::WitnessedAct,
                        });
                    }
                    if delta.crossed_max {
                        crossed.push((NpcKind::Citizen, i));
                    }
                }
            }
        }
    }

    crossed
}

/// Evaluate every detection sensor, then apply the outcomes sequentially
///
/// The evaluation itself only reads world state besides each sensor's own
/// timer, so it fans out with rayon above the parallel threshold. The
/// single-writer update of the global last-known position happens in the
/// sequential apply loop.
fn run_detection(
    world: &mut World,
    oracle: &dyn GeometryOracle,
    ambient: f32,
    dt: f32,
    events: &mut Vec<AiEvent>,
) {
    let target = world.target.map(|t| TargetSample {
        position: t.position,
        speed: t.speed(),
    });
    let parallel =
        world.guards.count() + world.citizens.count() >= world.config.parallel_threshold;

    let guard_outcomes = evaluate_sensors(
        &mut world.guards.detection,
        &world.guards.positions,
        &world.guards.facings,
        &world.guards.alive,
        target,
        ambient,
        oracle,
        dt,
        parallel,
    );
    for (i, outcome) in guard_outcomes {
        let entity = world.guards.ids[i];
        apply_detection_outcome(world, entity, outcome, events);
    }

    let citizen_outcomes = evaluate_sensors(
        &mut world.citizens.detection,
        &world.citizens.positions,
        &world.citizens.facings,
        &world.citizens.alive,
        target,
        ambient,
        oracle,
        dt,
        parallel,
    );
    for (i, outcome) in citizen_outcomes {
        let entity = world.citizens.ids[i];
        apply_detection_outcome(world, entity, outcome, events);
    }
}

#[allow(clippy::too_many_arguments)]
fn evaluate_sensors(
    sensors: &mut [DetectionSystem],
    positions: &[Vec2],
    facings: &[Vec2],
    alive: &[bool],
    target: Option<TargetSample>,
    ambient: f32,
    oracle: &dyn GeometryOracle,
    dt: f32,
    parallel: bool,
) -> Vec<(usize, DetectionOutcome)> {
    if parallel {
        sensors
            .par_iter_mut()
            .enumerate()
            .filter(|(i, _)| alive[*i])
            .map(|(i, sensor)| {
                let pose = Pose {
                    position: positions[i],
                    facing: facings[i],
                };
                (i, sensor.evaluate(pose, target, ambient, oracle, dt))
            })
            .collect()
    } else {
        sensors
            .iter_mut()
            .enumerate()
            .filter(|(i, _)| alive[*i])
            .map(|(i, sensor)| {
                let pose = Pose {
                    position: positions[i],
                    facing: facings[i],
                };
                (i, sensor.evaluate(pose, target, ambient, oracle, dt))
            })
            .collect()
    }
}

fn apply_detection_outcome(
    world: &mut World,
    entity: crate::core::types::EntityId,
    outcome: DetectionOutcome,
    events: &mut Vec<AiEvent>,
) {
    if outcome.progressed {
        events.push(AiEvent::DetectionProgress {
            entity,
            progress: outcome.progress,
        });
    }
    if let Some(position) = outcome.acquired {
        tracing::info!(?entity, ?position, "target acquired");
        events.push(AiEvent::TargetAcquired { entity, position });
        // Single writer path for the shared sighting
        world.alert.record_sighting(position);
    }
    if outcome.lost {
        tracing::debug!(?entity, "target lost");
        events.push(AiEvent::TargetLost { entity });
    }
}

/// Per-tick suspicion update for every living entity
///
/// Feeds the meters their continuous conditions (lurking, nearby
/// sprinting) and runs cooldown/decay. Returns the slots that crossed into
/// max this tick. Decay itself is silent except for the cleared event; only
/// accumulation emits changed events.
fn run_suspicion(world: &mut World, dt: f32, events: &mut Vec<AiEvent>) -> Vec<Slot> {
    let target = world.target;
    let config = world.config.clone();
    let mut crossed = Vec::new();

    let disguise_modifier = target
        .filter(|t| t.disguised)
        .map(|_| config.disguise_suspicion_modifier);
    let sprinting_target = target.filter(|t| t.speed() >= config.sprint_speed_threshold);

    let guard_indices: Vec<usize> = world.guards.iter_living().collect();
    for i in guard_indices {
        let pos = world.guards.positions[i];
        let entity = world.guards.ids[i];

        if let Some(t) = sprinting_target {
            if pos.distance(t.position) <= config.sprint_notice_radius {
                let delta = world.guards.suspicion[i]
                    .add_suspicion(config.sprint_suspicion_rate * dt, SuspicionReason::NearbySprinting);
                if delta.changed {
                    events.push(AiEvent::SuspicionChanged {
                        entity,
                        fraction: delta.fraction,
                        reason: SuspicionReason::NearbySprinting,
                    });
                }
                if delta.crossed_max {
                    crossed.push((NpcKind::Guard, i));
                }
            }
        }

        let lurking = target
            .map(|t| pos.distance(t.position) <= config.lurk_radius)
            .unwrap_or(false);
        let outcome = world.guards.suspicion[i].update(dt, lurking, disguise_modifier);
        if lurking {
            if let Some(fraction) = outcome.changed {
                events.push(AiEvent::SuspicionChanged {
                    entity,
                    fraction,
                    reason: SuspicionReason::Lurking,
                });
            }
        }
        if outcome.crossed_max {
            crossed.push((NpcKind::Guard, i));
        }
        if outcome.cleared {
            events.push(AiEvent::SuspicionCleared { entity });
        }
    }

    let citizen_indices: Vec<usize> = world.citizens.iter_living().collect();
    for i in citizen_indices {
        let pos = world.citizens.positions[i];
        let entity = world.citizens.ids[i];

        if let Some(t) = sprinting_target {
            if pos.distance(t.position) <= config.sprint_notice_radius {
                let delta = world.citizens.suspicion[i]
                    .add_suspicion(config.sprint_suspicion_rate * dt, SuspicionReason::NearbySprinting);
                if delta.changed {
                    events.push(AiEvent::SuspicionChanged {
                        entity,
                        fraction: delta.fraction,
                        reason: SuspicionReason::NearbySprinting,
                    });
                }
                if delta.crossed_max {
                    crossed.push((NpcKind::Citizen, i));
                }
            }
        }

        let lurking = target
            .map(|t| pos.distance(t.position) <= config.lurk_radius)
            .unwrap_or(false);
        let outcome = world.citizens.suspicion[i].update(dt, lurking, disguise_modifier);
        if lurking {
            if let Some(fraction) = outcome.changed {
                events.push(AiEvent::SuspicionChanged {
                    entity,
                    fraction,
                    reason: SuspicionReason::Lurking,
                });
            }
        }
        if outcome.crossed_max {
            crossed.push((NpcKind::Citizen, i));
        }
        if outcome.cleared {
            events.push(AiEvent::SuspicionCleared { entity });
        }
    }

    crossed
}

/// Poll investigation and flee arrivals
///
/// Guards that finish investigating drift back to their posts; citizens
/// that reach home stand down.
fn poll_arrivals(world: &mut World, nav: &mut dyn Navigator, events: &mut Vec<AiEvent>) {
    let arrival = world.config.bell_arrival_radius;

    let guard_indices: Vec<usize> = world.guards.iter_living().collect();
    for i in guard_indices {
        if let Activity::Investigating { .. } = world.guards.activities[i] {
            let entity = world.guards.ids[i];
            if !nav.path_pending(entity) && nav.remaining_distance(entity) <= arrival {
                world.guards.activities[i] = Activity::Idle;
                let post = world.guards.posts[i];
                nav.set_destination(entity, post);
                events.push(AiEvent::MoveRequested {
                    entity,
                    goal: post,
                    purpose: MovePurpose::ReturnToPost,
                });
            }
        }
    }

    let citizen_indices: Vec<usize> = world.citizens.iter_living().collect();
    for i in citizen_indices {
        if let Activity::Fleeing { .. } = world.citizens.activities[i] {
            let entity = world.citizens.ids[i];
            if !nav.path_pending(entity) && nav.remaining_distance(entity) <= arrival {
                world.citizens.activities[i] = Activity::Idle;
            }
        }
    }
}
