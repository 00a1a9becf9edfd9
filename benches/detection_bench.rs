//! Detection hot-path micro-benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec2;

use nightwarden::core::config::SimulationConfig;
use nightwarden::core::types::{Pose, TargetState};
use nightwarden::ecs::world::World;
use nightwarden::entity::detection::{DetectionSystem, TargetSample};
use nightwarden::services::{DirectNavigator, OpenGround, WallMap};
use nightwarden::simulation::tick::run_simulation_tick;

fn bench_sensor_evaluate(c: &mut Criterion) {
    let oracle = OpenGround;
    let pose = Pose::new(Vec2::ZERO, Vec2::X);
    let sample = TargetSample {
        position: Vec2::new(10.0, 2.0),
        speed: 1.5,
    };

    c.bench_function("sensor_evaluate_open_ground", |b| {
        let mut sensor = DetectionSystem::from_config(&SimulationConfig::default());
        b.iter(|| black_box(sensor.evaluate(pose, Some(sample), 0.35, &oracle, 0.016)))
    });

    let mut map = WallMap::new();
    for i in 0..32 {
        let x = i as f32 * 3.0;
        map.add_wall(Vec2::new(x, 20.0), Vec2::new(x + 2.0, 20.0));
    }
    c.bench_function("sensor_evaluate_wall_map", |b| {
        let mut sensor = DetectionSystem::from_config(&SimulationConfig::default());
        b.iter(|| black_box(sensor.evaluate(pose, Some(sample), 0.35, &map, 0.016)))
    });
}

fn bench_full_tick(c: &mut Criterion) {
    c.bench_function("tick_300_entities", |b| {
        let mut world = World::new(SimulationConfig::default());
        for i in 0..100 {
            let pos = Vec2::new((i % 10) as f32 * 12.0, (i / 10) as f32 * 12.0);
            world.spawn_guard(format!("Guard_{}", i), pos, Vec2::X);
        }
        for i in 0..200 {
            let pos = Vec2::new((i % 20) as f32 * 6.0, (i / 20) as f32 * 12.0);
            world.spawn_citizen(format!("Citizen_{}", i), pos, Vec2::Y);
        }
        world.set_target(TargetState::new(Vec2::new(30.0, 30.0)));

        let oracle = OpenGround;
        let mut nav = DirectNavigator::new(2.0);
        b.iter(|| black_box(run_simulation_tick(&mut world, &oracle, &mut nav, 0.016)))
    });
}

criterion_group!(benches, bench_sensor_evaluate, bench_full_tick);
criterion_main!(benches);
