use approx::assert_relative_eq;
use disc_sandbox::{SimConfig, Simulation, Vec2};

const DT: f32 = 1.0 / 60.0;

/// No gravity, no emitters; collisions are the only influence.
fn quiet_config(elasticity: f32) -> SimConfig {
    SimConfig {
        gravity: [0.0, 0.0],
        emitter_count: 0,
        elasticity,
        ..SimConfig::default()
    }
}

#[test]
fn equal_mass_head_on_collision_swaps_velocities() {
    let mut sim = Simulation::with_config(800, 700, quiet_config(1.0)).unwrap();
    let a = sim.add_body(Vec2::new(100.0, 100.0), 4.0, Vec2::new(10.0, 0.0));
    let b = sim.add_body(Vec2::new(108.01, 100.0), 4.0, Vec2::new(-10.0, 0.0));

    sim.update(DT);

    let body_a = sim.body(a).unwrap();
    let body_b = sim.body(b).unwrap();
    assert_relative_eq!(body_a.velocity.x, -10.0, epsilon = 1e-2);
    assert_relative_eq!(body_b.velocity.x, 10.0, epsilon = 1e-2);
    let separation = (body_a.position - body_b.position).length();
    assert!(separation >= 8.0 - 1e-3, "separation {separation}");
}

#[test]
fn overlapping_cluster_relaxes_to_no_interpenetration() {
    let mut sim = Simulation::with_config(800, 700, quiet_config(0.0)).unwrap();
    // 3x3 cluster with one unit of initial overlap per neighbor.
    let mut ids = Vec::new();
    for row in 0..3 {
        for col in 0..3 {
            ids.push(sim.add_body(
                Vec2::new(300.0 + col as f32 * 7.0, 300.0 + row as f32 * 7.0),
                4.0,
                Vec2::ZERO,
            ));
        }
    }

    for _ in 0..30 {
        sim.update(DT);
    }

    for (i, &a) in ids.iter().enumerate() {
        for &b in &ids[i + 1..] {
            let pa = sim.body(a).unwrap().position;
            let pb = sim.body(b).unwrap().position;
            let dist = (pa - pb).length();
            assert!(dist >= 8.0 - 0.05, "bodies {a:?} and {b:?} at {dist}");
        }
    }
}

#[test]
fn elastic_impulses_do_not_inject_energy() {
    let mut sim = Simulation::with_config(800, 700, quiet_config(1.0)).unwrap();
    for row in 0..3 {
        for col in 0..3 {
            sim.add_body(
                Vec2::new(300.0 + col as f32 * 7.5, 300.0 + row as f32 * 7.5),
                4.0,
                Vec2::new((col as f32 - 1.0) * 20.0, (row as f32 - 1.0) * 15.0),
            );
        }
    }

    let before = sim.kinetic_energy();
    for _ in 0..20 {
        sim.update(DT);
        let now = sim.kinetic_energy();
        assert!(now <= before * 1.01, "energy grew: {before} -> {now}");
    }
}

#[test]
fn top_boundary_reflects_and_damps_vertical_velocity() {
    let mut sim = Simulation::with_config(800, 700, quiet_config(0.6)).unwrap();
    // Just inside the top band, heading up.
    let id = sim.add_body(Vec2::new(100.0, 7.0), 4.0, Vec2::new(0.0, -5.0));

    sim.update(DT);

    let body = sim.body(id).unwrap();
    assert_eq!(body.position.y, 8.0);
    assert_relative_eq!(body.velocity.y, 5.0 * 0.6, epsilon = 1e-4);
}

#[test]
fn bodies_stay_inside_the_bounds_under_gravity() {
    let mut sim = Simulation::new(800, 700).unwrap();

    for _ in 0..300 {
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
        assert!(body.velocity.is_finite());
    }
}
