use approx::assert_relative_eq;
use disc_sandbox::{ResolutionMode, SimConfig, Simulation, Vec2};

const DT: f32 = 1.0 / 60.0;

fn continuous_config(elasticity: f32) -> SimConfig {
    SimConfig {
        mode: ResolutionMode::Continuous,
        gravity: [0.0, 0.0],
        emitter_count: 0,
        elasticity,
        ..SimConfig::default()
    }
}

#[test]
fn approaching_pair_exchanges_velocities_without_overlap() {
    let mut sim = Simulation::with_config(800, 700, continuous_config(1.0)).unwrap();
    let a = sim.add_body(Vec2::new(100.0, 100.0), 4.0, Vec2::new(50.0, 0.0));
    let b = sim.add_body(Vec2::new(130.0, 100.0), 4.0, Vec2::new(-50.0, 0.0));

    let mut events_total = 0;
    for _ in 0..30 {
        sim.update(DT);
        events_total += sim.stats().events_processed;
        let pa = sim.body(a).unwrap().position;
        let pb = sim.body(b).unwrap().position;
        assert!(
            (pa - pb).length() >= 8.0 - 1e-2,
            "interpenetration at {:?} / {:?}",
            pa,
            pb
        );
    }

    assert!(events_total > 0);
    assert_relative_eq!(sim.body(a).unwrap().velocity.x, -50.0, epsilon = 1e-2);
    assert_relative_eq!(sim.body(b).unwrap().velocity.x, 50.0, epsilon = 1e-2);
}

#[test]
fn fast_body_reflects_off_walls_instead_of_tunneling() {
    let config = SimConfig {
        max_speed_factor: 100.0,
        ..continuous_config(1.0)
    };
    let mut sim = Simulation::with_config(800, 700, config).unwrap();
    // ~50 units of travel per frame, several cell widths.
    let id = sim.add_body(Vec2::new(100.0, 350.0), 4.0, Vec2::new(3000.0, 0.0));

    let bounds = *sim.bounds();
    let mut flipped = false;
    for _ in 0..60 {
        sim.update(DT);
        let body = sim.body(id).unwrap();
        assert!(
            bounds.contains(body.position, body.radius),
            "tunneled to {:?}",
            body.position
        );
        if body.velocity.x < 0.0 {
            flipped = true;
        }
    }

    assert!(flipped, "never reached the far wall");
    let body = sim.body(id).unwrap();
    assert_relative_eq!(body.velocity.x.abs(), 3000.0, epsilon = 1.0);
}

#[test]
fn continuous_mode_keeps_spawned_population_contained() {
    let config = SimConfig {
        mode: ResolutionMode::Continuous,
        emitter_count: 2,
        ..SimConfig::default()
    };
    let mut sim = Simulation::with_config(800, 700, config).unwrap();

    for _ in 0..240 {
        sim.update(DT);
    }

    assert!(sim.body_count() > 0);
    let bounds = *sim.bounds();
    for body in sim.bodies() {
        assert!(
            bounds.contains(body.position, body.radius),
            "escaped to {:?}",
            body.position
        );
    }
}

#[test]
fn switching_modes_mid_run_stays_consistent() {
    let mut sim = Simulation::new(800, 700).unwrap();
    for _ in 0..60 {
        sim.update(DT);
    }

    sim.set_resolution_mode(ResolutionMode::Continuous);
    for _ in 0..60 {
        sim.update(DT);
    }

    sim.set_resolution_mode(ResolutionMode::Discrete);
    for _ in 0..60 {
        sim.update(DT);
    }

    assert!(sim.body_count() > 0);
    let bounds = *sim.bounds();
    for body in sim.bodies() {
        assert!(bounds.contains(body.position, body.radius));
    }
}
