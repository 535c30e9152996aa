//! Headless demo: a wave of agents hunting a strafing target in a walled arena

use std::process::ExitCode;

use horde::prelude::*;

/// Simulated seconds to run
const DURATION_SECONDS: f64 = 60.0;

/// Seconds between shots at the nearest pursuer
const SECONDS_BETWEEN_SHOTS: f64 = 0.75;

/// Knockback applied by each shot
const SHOT_IMPULSE: f32 = 3.0;

fn build_arena(physics: &mut Physics) {
    let half = 20.0;
    let thickness = 0.5;
    physics.add_wall(Vec2::new(0.0, half), Vec2::new(half, thickness));
    physics.add_wall(Vec2::new(0.0, -half), Vec2::new(half, thickness));
    physics.add_wall(Vec2::new(half, 0.0), Vec2::new(thickness, half));
    physics.add_wall(Vec2::new(-half, 0.0), Vec2::new(thickness, half));
    // A pillar to hide behind.
    physics.add_wall(Vec2::new(4.0, 0.0), Vec2::new(1.0, 3.0));
}

fn target_at(t: f64) -> Vec2 {
    let t = t as f32;
    Vec2::new(12.0 + 3.0 * (t * 0.4).sin(), 10.0 * (t * 0.25).sin())
}

fn nearest_pursuer(horde: &Horde<Physics, WavePacer>, target: Vec2) -> Option<AgentId> {
    horde
        .live_agents()
        .into_iter()
        .filter(|&id| horde.state(id).is_some_and(AgentState::is_pursuing))
        .filter_map(|id| horde.pose(id).map(|pose| (id, pose.position.distance(target))))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

fn log_events(horde: &mut Horde<Physics, WavePacer>) {
    let events = horde.events_mut();
    events.swap();
    for event in events.drain() {
        match event {
            GameEvent::StateChanged { agent, from, to } => {
                log::debug!("{:?}: {} -> {}", agent, from, to);
            }
            GameEvent::AgentKilled { agent, position } => {
                log::info!("{:?} went down at {}", agent, position);
            }
            GameEvent::ObstacleDestroyed { obstacle, position } => {
                log::info!("{:?} torn down at {}", obstacle, position);
            }
            GameEvent::ScoreChanged { score } => log::info!("Score: {}", score),
            _ => {}
        }
    }
}

fn run(config: HordeConfig) {
    let mut physics = Physics::new();
    build_arena(&mut physics);
    physics.set_target(target_at(0.0));

    let pacer = WavePacer::new(30, 12, 0.5);
    let mut horde = Horde::new(config, physics, pacer);

    for y in [-2.0, -1.0, 0.0, 1.0, 2.0] {
        horde.add_obstacle(Vec2::new(8.0, y), Vec2::splat(0.5));
    }
    let mut points = vec![
        SpawnPoint::new(Vec2::new(-16.0, 12.0)),
        SpawnPoint::new(Vec2::new(-16.0, -12.0)),
        SpawnPoint::new(Vec2::new(0.0, 16.0)),
    ];

    let dt = horde.config().fixed_timestep as f32;
    let mut next_shot_at = SECONDS_BETWEEN_SHOTS;
    while horde.now() < DURATION_SECONDS {
        let now = horde.now();
        let target = target_at(now);

        if let Some(index) = horde.pacing_mut().poll(now, points.len()) {
            points[index].spawn(&mut horde);
        }

        if now >= next_shot_at {
            next_shot_at = now + SECONDS_BETWEEN_SHOTS;
            if let Some(victim) = nearest_pursuer(&horde, target) {
                let push = horde
                    .pose(victim)
                    .map_or(Vec2::ZERO, |pose| (pose.position - target).normalize_or_zero());
                horde.apply_impulse(victim, push * SHOT_IMPULSE);
                horde.apply_hit(victim);
            }
        }

        // Queries must see this tick's bodies before the agents think.
        let physics = horde.spatial_mut();
        physics.set_target(target);
        physics.step(dt);
        horde.step(target);

        log_events(&mut horde);
    }

    log::info!(
        "Finished at t={:.1}s, round {}, score {}",
        horde.now(),
        horde.pacing().round,
        horde.score()
    );
    for (state, count) in horde.state_counts() {
        log::info!("{:>16}: {}", state.name(), count);
    }
    let spawned: u32 = points.iter().map(|point| point.spawned).sum();
    log::info!("Spawned {} agents", spawned);
}

fn main() -> ExitCode {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match HordeConfig::load_ron(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => HordeConfig::default(),
    };

    run(config);
    ExitCode::SUCCESS
}
