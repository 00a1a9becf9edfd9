//! Integration tests for suspicion accumulation, decay, and contagion
//!
//! Stimuli enter through the world's report queue and the scripted target;
//! assertions read the event stream and the meters themselves.

use glam::Vec2;
use proptest::prelude::*;

use nightwarden::core::config::SimulationConfig;
use nightwarden::core::types::TargetState;
use nightwarden::ecs::world::World;
use nightwarden::entity::suspicion::{SuspicionMeter, SuspicionReason, SuspicionState};
use nightwarden::services::{DirectNavigator, OpenGround};
use nightwarden::simulation::events::AiEvent;
use nightwarden::simulation::tick::run_simulation_tick;

fn run_ticks(world: &mut World, ticks: usize, dt: f32) -> Vec<AiEvent> {
    let mut nav = DirectNavigator::new(2.0);
    let oracle = OpenGround;
    let mut all = Vec::new();
    for _ in 0..ticks {
        all.extend(run_simulation_tick(world, &oracle, &mut nav, dt));
    }
    all
}

/// Config where one witnessed act is enough to max a meter out
fn hair_trigger_config() -> SimulationConfig {
    SimulationConfig {
        witnessed_act_suspicion: 100.0,
        ..Default::default()
    }
}

// ============================================================================
// Discrete stimuli
// ============================================================================

#[test]
fn test_witnessed_act_raises_suspicion() {
    let mut world = World::new(SimulationConfig::default());
    let guard = world.spawn_guard("Watch".into(), Vec2::ZERO, Vec2::X);

    world.report_witnessed_act(Vec2::new(5.0, 0.0));
    let events = run_ticks(&mut world, 1, 0.1);

    assert!(events.iter().any(|e| matches!(
        e,
        AiEvent::SuspicionChanged { entity, reason: SuspicionReason::WitnessedAct, .. }
            if *entity == guard
    )));
    let (_, i) = world.get_entity_info(guard).unwrap();
    assert_eq!(world.guards.suspicion[i].current(), 60.0);
}

#[test]
fn test_act_outside_view_distance_unseen() {
    let mut world = World::new(SimulationConfig::default());
    let guard = world.spawn_guard("Watch".into(), Vec2::ZERO, Vec2::X);

    // Default view distance is 15
    world.report_witnessed_act(Vec2::new(30.0, 0.0));
    run_ticks(&mut world, 1, 0.1);

    let (_, i) = world.get_entity_info(guard).unwrap();
    assert_eq!(world.guards.suspicion[i].current(), 0.0);
}

#[test]
fn test_noise_carries_by_loudness() {
    let mut world = World::new(SimulationConfig::default());
    let near = world.spawn_citizen("Near".into(), Vec2::new(5.0, 0.0), Vec2::X);
    let far = world.spawn_citizen("Far".into(), Vec2::new(15.0, 0.0), Vec2::X);

    // Half loudness carries 10 units with the default 20-unit radius
    world.report_noise(Vec2::ZERO, 0.5);
    run_ticks(&mut world, 1, 0.1);

    let (_, i) = world.get_entity_info(near).unwrap();
    let (_, j) = world.get_entity_info(far).unwrap();
    assert!(world.citizens.suspicion[i].current() > 0.0);
    assert_eq!(world.citizens.suspicion[j].current(), 0.0);
}

#[test]
fn test_sprinting_past_alarms_bystanders() {
    let mut world = World::new(SimulationConfig::default());
    let citizen = world.spawn_citizen("Mira".into(), Vec2::ZERO, Vec2::X);

    // Sprinting through the notice radius, but too far to lurk
    world.set_target(TargetState {
        position: Vec2::new(6.0, 0.0),
        velocity: Vec2::new(5.0, 0.0),
        disguised: false,
    });
    let events = run_ticks(&mut world, 10, 0.1);

    assert!(events.iter().any(|e| matches!(
        e,
        AiEvent::SuspicionChanged { reason: SuspicionReason::NearbySprinting, .. }
    )));
    let (_, i) = world.get_entity_info(citizen).unwrap();
    // 1s inside the radius at 20 suspicion/s
    let current = world.citizens.suspicion[i].current();
    assert!(current > 15.0 && current < 25.0);
}

// ============================================================================
// Lurking
// ============================================================================

#[test]
fn test_lurking_maxes_out_a_citizen() {
    let mut world = World::new(SimulationConfig::default());
    let citizen = world.spawn_citizen("Mira".into(), Vec2::ZERO, Vec2::X);
    // Standing just outside arm's reach, inside the 5-unit lurk radius
    world.set_target(TargetState::new(Vec2::new(4.0, 0.0)));

    // Grace period 2.5s, then 100 suspicion at 15/s: under 10s total
    let events = run_ticks(&mut world, 120, 0.1);

    assert!(events
        .iter()
        .any(|e| matches!(e, AiEvent::MaxSuspicionReached { entity } if *entity == citizen)));
    let (_, i) = world.get_entity_info(citizen).unwrap();
    assert_eq!(world.citizens.suspicion[i].state(), SuspicionState::MaxSuspicion);
}

#[test]
fn test_disguise_slows_lurk_accumulation() {
    let mut plain = World::new(SimulationConfig::default());
    let a = plain.spawn_citizen("Mira".into(), Vec2::ZERO, Vec2::X);
    plain.set_target(TargetState::new(Vec2::new(4.0, 0.0)));

    let mut disguised = World::new(SimulationConfig::default());
    let b = disguised.spawn_citizen("Mira".into(), Vec2::ZERO, Vec2::X);
    disguised.set_target(TargetState {
        position: Vec2::new(4.0, 0.0),
        velocity: Vec2::ZERO,
        disguised: true,
    });

    run_ticks(&mut plain, 50, 0.1);
    run_ticks(&mut disguised, 50, 0.1);

    let (_, i) = plain.get_entity_info(a).unwrap();
    let (_, j) = disguised.get_entity_info(b).unwrap();
    let open = plain.citizens.suspicion[i].current();
    let covered = disguised.citizens.suspicion[j].current();
    assert!(covered > 0.0);
    assert!(covered < open);
}

// ============================================================================
// Max suspicion, contagion, and the full cycle
// ============================================================================

#[test]
fn test_max_fires_once_and_contagion_bumps_neighbors() {
    let mut world = World::new(hair_trigger_config());
    let witness = world.spawn_citizen("Witness".into(), Vec2::ZERO, Vec2::X);
    // Inside the 12-unit contagion radius, outside view of the act
    let neighbor = world.spawn_citizen("Neighbor".into(), Vec2::new(11.0, 0.0), Vec2::X);

    world.report_witnessed_act(Vec2::new(-5.0, 0.0));
    let events = run_ticks(&mut world, 1, 0.1);

    let max_events = events
        .iter()
        .filter(|e| matches!(e, AiEvent::MaxSuspicionReached { .. }))
        .count();
    assert_eq!(max_events, 1);

    let (_, j) = world.get_entity_info(neighbor).unwrap();
    assert_eq!(world.citizens.suspicion[j].current(), 30.0);

    // Contagion is one-shot: the bump does not repeat on later ticks
    run_ticks(&mut world, 10, 0.1);
    assert_eq!(world.citizens.suspicion[j].current(), 30.0);

    // Further acts on an already-maxed witness do not re-fire
    world.report_witnessed_act(Vec2::new(-5.0, 0.0));
    let events = run_ticks(&mut world, 1, 0.1);
    assert!(!events
        .iter()
        .any(|e| matches!(e, AiEvent::MaxSuspicionReached { entity } if *entity == witness)));
}

#[test]
fn test_contagion_chains_through_primed_neighbor() {
    let mut world = World::new(hair_trigger_config());
    world.spawn_citizen("Witness".into(), Vec2::ZERO, Vec2::X);
    let primed = world.spawn_citizen("Primed".into(), Vec2::new(11.0, 0.0), Vec2::X);
    let outer = world.spawn_citizen("Outer".into(), Vec2::new(22.0, 0.0), Vec2::X);

    // Primed sits at 80: the 30-point contagion bump will max it out too
    let (_, j) = world.get_entity_info(primed).unwrap();
    world.citizens.suspicion[j].add_suspicion(80.0, SuspicionReason::LoudNoise);

    world.report_witnessed_act(Vec2::new(-5.0, 0.0));
    let events = run_ticks(&mut world, 1, 0.1);

    // Both the witness and the primed neighbor maxed out this tick
    let max_events = events
        .iter()
        .filter(|e| matches!(e, AiEvent::MaxSuspicionReached { .. }))
        .count();
    assert_eq!(max_events, 2);

    // The chain reached the outer citizen through the primed one
    let (_, k) = world.get_entity_info(outer).unwrap();
    assert_eq!(world.citizens.suspicion[k].current(), 30.0);
}

#[test]
fn test_full_decay_clears_and_allows_remax() {
    let mut world = World::new(hair_trigger_config());
    let witness = world.spawn_citizen("Witness".into(), Vec2::ZERO, Vec2::X);

    world.report_witnessed_act(Vec2::new(-5.0, 0.0));
    run_ticks(&mut world, 1, 0.1);

    // 4s cooldown then 10s of decay at 10/s
    let events = run_ticks(&mut world, 200, 0.1);
    let cleared = events
        .iter()
        .filter(|e| matches!(e, AiEvent::SuspicionCleared { entity } if *entity == witness))
        .count();
    assert_eq!(cleared, 1);

    let (_, i) = world.get_entity_info(witness).unwrap();
    assert_eq!(world.citizens.suspicion[i].state(), SuspicionState::Idle);

    // A fresh act goes through the whole cycle again
    world.report_witnessed_act(Vec2::new(-5.0, 0.0));
    let events = run_ticks(&mut world, 1, 0.1);
    assert!(events
        .iter()
        .any(|e| matches!(e, AiEvent::MaxSuspicionReached { entity } if *entity == witness)));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Any interleaving of adds and decay ticks keeps the meter in bounds.
    #[test]
    fn prop_suspicion_stays_bounded(
        ops in proptest::collection::vec((0.0f32..250.0, proptest::bool::ANY), 1..100)
    ) {
        let mut meter = SuspicionMeter::new(100.0, 1.0, 25.0, 1.0, 10.0);
        for (amount, tick_instead) in ops {
            if tick_instead {
                meter.update(0.5, false, None);
            } else {
                meter.add_suspicion(amount, SuspicionReason::LoudNoise);
            }
            prop_assert!(meter.current() >= 0.0);
            prop_assert!(meter.current() <= 100.0);
        }
    }

    /// Zero-amount events never move the value.
    #[test]
    fn prop_zero_amount_is_idempotent(initial in 0.0f32..100.0) {
        let mut meter = SuspicionMeter::new(100.0, 4.0, 10.0, 1.0, 10.0);
        meter.add_suspicion(initial, SuspicionReason::LoudNoise);
        let before = meter.current();
        let delta = meter.add_suspicion(0.0, SuspicionReason::LoudNoise);
        prop_assert!(!delta.changed);
        prop_assert_eq!(meter.current(), before);
    }
}
