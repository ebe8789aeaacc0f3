use criterion::{criterion_group, criterion_main, Criterion};
use glam::Vec2;
use sph_fluid::config::SimConfig;
use sph_fluid::particles;
use sph_fluid::solver::SphSimulation;

fn bench_step(c: &mut Criterion) {
    let spacing = 0.08; // spacing < smoothing radius for overlap
    let config = SimConfig {
        num_particles: 4900,
        half_bounds: Vec2::new(7.0, 7.0),
        ..Default::default()
    };

    let positions = particles::lattice(4900, spacing);
    let mut sim = SphSimulation::new(config, &positions).unwrap();

    c.bench_function("step_4.9k", |b| b.iter(|| sim.step(0.001)));
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
