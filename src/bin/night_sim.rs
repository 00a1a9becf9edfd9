//! Night simulation runner
//!
//! Spawns a district of guards and citizens, scripts an intruder wandering
//! through it, and runs whole nights of the AI core, reporting detections,
//! alarms, and alert escalation as they happen.

use clap::Parser;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use nightwarden::core::config::SimulationConfig;
use nightwarden::core::types::TargetState;
use nightwarden::ecs::world::World;
use nightwarden::services::{DirectNavigator, WallMap};
use nightwarden::simulation::events::AiEvent;
use nightwarden::simulation::tick::run_simulation_tick;

/// Night simulation - an intruder loose in a watched district
#[derive(Parser, Debug)]
#[command(name = "night_sim")]
#[command(about = "Run nights of the guard/citizen AI against a scripted intruder")]
struct Args {
    /// Random seed for reproducible runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of nights to simulate
    #[arg(long, default_value_t = 1)]
    nights: u32,

    /// Guards on patrol
    #[arg(long, default_value_t = 12)]
    guards: usize,

    /// Citizens about at night
    #[arg(long, default_value_t = 30)]
    citizens: usize,

    /// Alarm bells in the district
    #[arg(long, default_value_t = 4)]
    bells: usize,

    /// Simulation step in seconds
    #[arg(long, default_value_t = 0.1)]
    dt: f32,

    /// Optional TOML config path
    #[arg(long)]
    config: Option<String>,

    /// Write every event as JSON lines to this path
    #[arg(long)]
    events_out: Option<String>,
}

const DISTRICT_SIZE: f32 = 120.0;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match SimulationConfig::from_toml_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => SimulationConfig::default(),
    };

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║                 NIGHTWARDEN: NIGHT SIMULATION            ║");
    println!(
        "║   {} guards, {} citizens, {} bells, seed {}",
        args.guards, args.citizens, args.bells, args.seed
    );
    println!("╚══════════════════════════════════════════════════════════╝\n");

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut world = World::new(config);
    let mut nav = DirectNavigator::new(2.5);

    // A few building walls to hide behind
    let mut map = WallMap::new();
    for _ in 0..8 {
        let x = rng.gen_range(10.0..DISTRICT_SIZE - 10.0);
        let y = rng.gen_range(10.0..DISTRICT_SIZE - 10.0);
        let len = rng.gen_range(5.0..15.0);
        if rng.gen_bool(0.5) {
            map.add_wall(Vec2::new(x, y), Vec2::new(x + len, y));
        } else {
            map.add_wall(Vec2::new(x, y), Vec2::new(x, y + len));
        }
    }

    for i in 0..args.guards {
        let pos = random_point(&mut rng);
        let facing = random_direction(&mut rng);
        world.spawn_guard(format!("Guard_{}", i), pos, facing);
    }
    for i in 0..args.citizens {
        let pos = random_point(&mut rng);
        let facing = random_direction(&mut rng);
        world.spawn_citizen(format!("Citizen_{}", i), pos, facing);
    }
    for _ in 0..args.bells {
        world.add_bell(random_point(&mut rng));
    }

    // The intruder starts at the district edge
    let mut intruder_pos = Vec2::new(2.0, 2.0);
    let mut waypoint = random_point(&mut rng);
    world.set_target(TargetState::new(intruder_pos));

    let mut all_events: Vec<(u64, AiEvent)> = Vec::new();
    let mut acquisitions = 0u64;
    let mut bells_rung = 0u64;
    let mut max_outs = 0u64;
    let mut nights_done = 0u32;

    println!("Night | Tick    | Phase      | Alert    | Events this report");
    println!("------|---------|------------|----------|--------------------");

    let mut report_events = 0usize;
    while nights_done < args.nights {
        // External movement: NPCs first, then the scripted intruder
        nav.advance(&mut world, args.dt);

        let sprinting = world.alert.current_level() > nightwarden::alert::AlertLevel::Calm;
        let speed = if sprinting { 5.0 } else { 1.2 };
        let to_waypoint = waypoint - intruder_pos;
        if to_waypoint.length() < 1.0 {
            waypoint = random_point(&mut rng);
            // Disguise on roughly every third waypoint
            world.set_target_disguised(rng.gen_bool(0.3));
            // The occasional clumsy noise
            if rng.gen_bool(0.15) {
                world.report_noise(intruder_pos, rng.gen_range(0.4..1.0));
            }
        } else {
            let velocity = to_waypoint.normalize_or_zero() * speed;
            intruder_pos += velocity * args.dt;
            world.update_target(intruder_pos, velocity);
        }

        let events = run_simulation_tick(&mut world, &map, &mut nav, args.dt);
        report_events += events.len();

        let mut dawn = false;
        for event in &events {
            match event {
                AiEvent::TargetAcquired { .. } => acquisitions += 1,
                AiEvent::BellRung { .. } => bells_rung += 1,
                AiEvent::MaxSuspicionReached { .. } => max_outs += 1,
                AiEvent::DawnBroke { .. } => dawn = true,
                _ => {}
            }
        }
        if args.events_out.is_some() {
            let tick = world.current_tick;
            all_events.extend(events.into_iter().map(|e| (tick, e)));
        }

        if world.current_tick % 500 == 0 {
            println!(
                "{:5} | {:7} | {:10} | {:8} | {}",
                nights_done + 1,
                world.current_tick,
                format!("{:?}", world.night.phase()),
                format!("{:?}", world.alert.current_level()),
                report_events
            );
            report_events = 0;
        }

        if dawn {
            nights_done += 1;
            println!(
                "--- dawn after night {} (acquisitions {}, bells {}, max-outs {})",
                nights_done, acquisitions, bells_rung, max_outs
            );
            if nights_done < args.nights {
                world.begin_new_night();
            }
        }
    }

    println!("\n=== SUMMARY ===");
    println!("nights:        {}", nights_done);
    println!("ticks:         {}", world.current_tick);
    println!("acquisitions:  {}", acquisitions);
    println!("bells rung:    {}", bells_rung);
    println!("max suspicion: {}", max_outs);
    println!("alert level:   {:?}", world.alert.current_level());

    if let Some(path) = args.events_out {
        match write_events(&path, &all_events) {
            Ok(()) => println!("events written to {}", path),
            Err(e) => eprintln!("failed to write events: {}", e),
        }
    }
}

fn random_point(rng: &mut ChaCha8Rng) -> Vec2 {
    Vec2::new(
        rng.gen_range(0.0..DISTRICT_SIZE),
        rng.gen_range(0.0..DISTRICT_SIZE),
    )
}

fn random_direction(rng: &mut ChaCha8Rng) -> Vec2 {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    Vec2::new(angle.cos(), angle.sin())
}

fn write_events(path: &str, events: &[(u64, AiEvent)]) -> nightwarden::core::error::Result<()> {
    use std::io::Write;
    let mut file = std::fs::File::create(path)?;
    for (tick, event) in events {
        let line = serde_json::to_string(&(tick, event))?;
        writeln!(file, "{}", line)?;
    }
    Ok(())
}
