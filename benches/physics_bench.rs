use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use disc_sandbox::{ResolutionMode, SimConfig, Simulation, Vec2};
use std::hint::black_box;

const DT: f32 = 1.0 / 60.0;

fn prepare_sim(body_count: usize, mode: ResolutionMode) -> Simulation {
    let config = SimConfig {
        emitter_count: 0,
        mode,
        ..SimConfig::default()
    };
    let mut sim = Simulation::with_config(1600, 900, config).unwrap();
    // Lay the population out on a loose lattice with varied velocities.
    let per_row = 90;
    for i in 0..body_count {
        let col = (i % per_row) as f32;
        let row = (i / per_row) as f32;
        sim.add_body(
            Vec2::new(20.0 + col * 17.0, 20.0 + row * 17.0),
            4.0,
            Vec2::new((i % 7) as f32 * 9.0 - 27.0, (i % 5) as f32 * 11.0 - 22.0),
        );
    }
    sim
}

fn bench_discrete_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("discrete_step");
    for &count in &[256usize, 1024, 2048] {
        group.bench_with_input(
            BenchmarkId::new("sequential", count),
            &count,
            |b, &count| {
                let mut sim = prepare_sim(count, ResolutionMode::Discrete);
                sim.set_parallel_enabled(false);
                b.iter(|| sim.update(black_box(DT)));
            },
        );
        group.bench_with_input(BenchmarkId::new("parallel", count), &count, |b, &count| {
            let mut sim = prepare_sim(count, ResolutionMode::Discrete);
            sim.set_parallel_enabled(true);
            b.iter(|| sim.update(black_box(DT)));
        });
    }
    group.finish();
}

fn bench_continuous_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("continuous_step");
    for &count in &[256usize, 1024] {
        group.bench_with_input(BenchmarkId::new("events", count), &count, |b, &count| {
            let mut sim = prepare_sim(count, ResolutionMode::Continuous);
            b.iter(|| sim.update(black_box(DT)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_discrete_step, bench_continuous_step);
criterion_main!(benches);
