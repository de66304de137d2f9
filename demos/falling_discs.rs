use disc_sandbox::SandboxEngine;

fn main() {
    let mut engine = SandboxEngine::new(800, 700).expect("valid default configuration");
    engine.set_parallel_enabled(true);

    // Ten simulated seconds, reporting once per second.
    for frame in 0..600u32 {
        engine.step(1.0 / 60.0);
        if frame % 60 == 59 {
            let sim = engine.simulation();
            let stats = sim.stats();
            println!(
                "t = {:>2}s  bodies = {:<4}  pairs checked = {:<6}  overlaps = {:<5}  ke = {:.1}",
                (frame + 1) / 60,
                stats.bodies,
                stats.pairs_checked,
                stats.overlaps_resolved,
                sim.kinetic_energy()
            );
        }
    }
}
