//! The SPH step driver: predict, rebuild grid, density, pressure, integrate.

use glam::Vec2;
use log::debug;
use rayon::prelude::*;

use crate::boundary::BoundaryPolicy;
use crate::config::{ConfigError, SimConfig};
use crate::kernels::{spiky_pow2, spiky_pow2_derivative};
use crate::particles::ParticleSet;
use crate::spatial::SpatialHashGrid;

// unit mass, so density is a kernel-weighted neighbor count
const MASS: f32 = 1.0;

/// Signed pressure from density deviation. Negative below the target density,
/// which pulls a sparse region back toward its rest state.
#[inline]
pub fn density_to_pressure(density: f32, target_density: f32, pressure_multiplier: f32) -> f32 {
    (density - target_density) * pressure_multiplier
}

/// Symmetric average of a pair's pressures, keeping force pairs equal and
/// opposite.
#[inline]
pub fn shared_pressure(
    density_a: f32,
    density_b: f32,
    target_density: f32,
    pressure_multiplier: f32,
) -> f32 {
    let pressure_a = density_to_pressure(density_a, target_density, pressure_multiplier);
    let pressure_b = density_to_pressure(density_b, target_density, pressure_multiplier);
    (pressure_a + pressure_b) / 2.0
}

fn density_at_point(grid: &SpatialHashGrid, positions: &[Vec2], sample: Vec2, radius: f32) -> f32 {
    let mut density = 0.0;
    for j in grid.query_neighbors(sample, radius, positions) {
        let dst = positions[j].distance(sample);
        density += MASS * spiky_pow2(dst, radius);
    }
    density
}

#[derive(Debug)]
pub struct SphSimulation {
    config: SimConfig,
    particles: ParticleSet,
    grid: SpatialHashGrid,
    boundary: BoundaryPolicy,
}

impl SphSimulation {
    /// Allocate the particle arrays and build the initial grid. Velocities
    /// start at zero. Rejects an invalid configuration before allocating.
    pub fn new(config: SimConfig, initial_positions: &[Vec2]) -> Result<Self, ConfigError> {
        config.validate()?;
        if initial_positions.len() != config.num_particles {
            return Err(ConfigError::PositionCount {
                expected: config.num_particles,
                got: initial_positions.len(),
            });
        }

        let particles = ParticleSet::new(initial_positions.to_vec());
        let mut grid = SpatialHashGrid::new(
            config.num_particles,
            config.domain_min(),
            config.smoothing_radius,
        );
        grid.build(particles.predicted_positions(), config.smoothing_radius);
        let boundary = BoundaryPolicy::new(
            config.half_bounds,
            config.particle_radius,
            config.collision_damping,
        );

        debug!(
            "sph simulation ready: {} particles, smoothing radius {}",
            config.num_particles, config.smoothing_radius
        );

        Ok(Self { config, particles, grid, boundary })
    }

    /// Advance the simulation by `dt`.
    ///
    /// Five stages, each a data-parallel loop over particles. Every stage
    /// reads arrays the previous stage finished writing, so the join at the
    /// end of each loop is a hard barrier; within a stage each array slot is
    /// written only by its own particle's task, so no locking is needed.
    pub fn step(&mut self, dt: f32) {
        let gravity = self.config.gravity_dir * self.config.gravity;
        let radius = self.config.smoothing_radius;
        let lookahead = self.config.lookahead_dt;

        // 1. gravity, then predict where each particle is about to be
        {
            let ParticleSet { positions, predicted, velocities, .. } = &mut self.particles;
            positions
                .par_iter()
                .zip(velocities.par_iter_mut())
                .zip(predicted.par_iter_mut())
                .for_each(|((&position, velocity), predicted)| {
                    *velocity += gravity * dt;
                    *predicted = position + *velocity * lookahead;
                });
        }

        // 2. rebuild the grid on the predicted positions
        self.grid.build(&self.particles.predicted, radius);

        // 3. density from the fresh grid (self-inclusive, so never zero)
        {
            let grid = &self.grid;
            let ParticleSet { predicted, densities, .. } = &mut self.particles;
            let predicted: &[Vec2] = predicted;
            densities.par_iter_mut().enumerate().for_each(|(i, density)| {
                *density = density_at_point(grid, predicted, predicted[i], radius);
            });
        }

        // 4. pressure force, applied to velocity as acceleration
        {
            let forces: Vec<Vec2> = (0..self.particles.len())
                .into_par_iter()
                .map(|i| self.pressure_force(i))
                .collect();

            let ParticleSet { velocities, densities, .. } = &mut self.particles;
            let densities: &[f32] = densities;
            velocities.par_iter_mut().enumerate().for_each(|(i, velocity)| {
                *velocity += forces[i] / densities[i] * dt;
            });
        }

        // 5. integrate and bounce off the walls
        {
            let boundary = self.boundary;
            let ParticleSet { positions, velocities, .. } = &mut self.particles;
            positions
                .par_iter_mut()
                .zip(velocities.par_iter_mut())
                .for_each(|(position, velocity)| {
                    *position += *velocity * dt;
                    boundary.resolve(position, velocity);
                });
        }
    }

    /// Cover `dt` with `iterations` equal sub-steps.
    pub fn step_substeps(&mut self, dt: f32, iterations: u32) {
        if iterations == 0 {
            return;
        }
        let sub_dt = dt / iterations as f32;
        for _ in 0..iterations {
            self.step(sub_dt);
        }
    }

    fn pressure_force(&self, i: usize) -> Vec2 {
        let radius = self.config.smoothing_radius;
        let target = self.config.target_density;
        let multiplier = self.config.pressure_multiplier;
        let predicted = &self.particles.predicted;
        let densities = &self.particles.densities;

        let mut force = Vec2::ZERO;
        for j in self.grid.query_neighbors(predicted[i], radius, predicted) {
            if j == i {
                continue;
            }
            let offset = predicted[j] - predicted[i];
            let dst = offset.length();
            // a coincident pair has no usable direction; the fixed denominator
            // keeps the contribution finite and deterministic
            let dir = if dst == 0.0 { offset / 0.01 } else { offset / dst };
            let slope = spiky_pow2_derivative(dst, radius);
            let pressure = shared_pressure(densities[i], densities[j], target, multiplier);
            force += pressure * dir * slope * MASS / densities[j];
        }
        force
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn positions(&self) -> &[Vec2] {
        self.particles.positions()
    }

    pub fn velocities(&self) -> &[Vec2] {
        self.particles.velocities()
    }

    pub fn densities(&self) -> &[f32] {
        self.particles.densities()
    }

    /// Particle indices within `radius` of `point`, as seen by the most
    /// recent grid build (predicted positions). Exposed for inspection
    /// tooling; `radius` larger than the smoothing radius falls outside the
    /// 3x3 cell scan and will miss points.
    pub fn query_neighbors(&self, point: Vec2, radius: f32) -> Vec<usize> {
        self.grid.query_neighbors(point, radius, &self.particles.predicted)
    }

    /// Density estimate at an arbitrary sample point.
    pub fn density_at(&self, point: Vec2) -> f32 {
        density_at_point(
            &self.grid,
            &self.particles.predicted,
            point,
            self.config.smoothing_radius,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressure_sign_follows_density_deviation() {
        assert!(density_to_pressure(60.0, 55.0, 500.0) > 0.0);
        assert!(density_to_pressure(50.0, 55.0, 500.0) < 0.0);
        assert_eq!(density_to_pressure(55.0, 55.0, 500.0), 0.0);
    }

    #[test]
    fn shared_pressure_is_symmetric() {
        let a = shared_pressure(60.0, 40.0, 55.0, 500.0);
        let b = shared_pressure(40.0, 60.0, 55.0, 500.0);
        assert_eq!(a, b);
    }

    #[test]
    fn isolated_particle_density_is_self_contribution() {
        let config = SimConfig { num_particles: 1, ..Default::default() };
        let radius = config.smoothing_radius;
        let position = Vec2::new(0.3, -0.2);
        let sim = SphSimulation::new(config, &[position]).unwrap();

        let density = sim.density_at(position);
        assert!(density > 0.0);
        assert!((density - MASS * spiky_pow2(0.0, radius)).abs() < 1e-6);
    }

    #[test]
    fn neighbor_probe_matches_initial_positions() {
        let config = SimConfig { num_particles: 3, ..Default::default() };
        let positions = [Vec2::ZERO, Vec2::new(0.1, 0.0), Vec2::new(3.0, 0.0)];
        let sim = SphSimulation::new(config.clone(), &positions).unwrap();

        let mut near = sim.query_neighbors(Vec2::ZERO, config.smoothing_radius);
        near.sort_unstable();
        assert_eq!(near, vec![0, 1]);
    }
}
