use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A configuration the solver refuses to run with.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("particle count must be at least 1")]
    NoParticles,
    #[error("smoothing radius must be positive and finite, got {0}")]
    SmoothingRadius(f32),
    #[error("domain half-extent must be positive and finite, got ({0}, {1})")]
    DomainExtent(f32, f32),
    #[error("collision damping must lie in [0, 1], got {0}")]
    CollisionDamping(f32),
    #[error("timestep must be positive and finite, got {0}")]
    Timestep(f32),
    #[error("expected {expected} initial positions, got {got}")]
    PositionCount { expected: usize, got: usize },
}

/// Simulation parameters, owned by the caller and read-only to the solver.
///
/// All fields are read at construction or between steps; nothing mutates them
/// mid-step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimConfig {
    pub num_particles: usize,
    /// Half-extent of the box domain, per axis. The domain is centered on the
    /// origin, spanning `[-half_bounds, half_bounds]`.
    pub half_bounds: Vec2,
    /// Drawn radius of a particle; shrinks the collidable region of the box.
    pub particle_radius: f32,
    pub smoothing_radius: f32,
    pub gravity: f32,
    pub gravity_dir: Vec2,
    pub collision_damping: f32,
    pub target_density: f32,
    pub pressure_multiplier: f32,
    /// Nominal timestep a host should drive `step` with.
    pub dt: f32,
    /// Fixed look-ahead used for predicted positions. Independent of the
    /// integration timestep; a tunable, not a physical constant.
    pub lookahead_dt: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_particles: 1024,
            half_bounds: Vec2::new(7.0, 4.0),
            particle_radius: 0.08,
            smoothing_radius: 0.35,
            gravity: 5.0,
            gravity_dir: Vec2::NEG_Y,
            collision_damping: 0.8,
            target_density: 55.0,
            pressure_multiplier: 500.0,
            dt: 1.0 / 60.0,
            lookahead_dt: 1.0 / 120.0,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_particles == 0 {
            return Err(ConfigError::NoParticles);
        }
        if !(self.smoothing_radius > 0.0 && self.smoothing_radius.is_finite()) {
            return Err(ConfigError::SmoothingRadius(self.smoothing_radius));
        }
        if !(self.half_bounds.x > 0.0 && self.half_bounds.y > 0.0 && self.half_bounds.is_finite()) {
            return Err(ConfigError::DomainExtent(self.half_bounds.x, self.half_bounds.y));
        }
        if !(0.0..=1.0).contains(&self.collision_damping) {
            return Err(ConfigError::CollisionDamping(self.collision_damping));
        }
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(ConfigError::Timestep(self.dt));
        }
        Ok(())
    }

    /// Minimum corner of the domain, the origin of the spatial grid.
    pub fn domain_min(&self) -> Vec2 {
        -self.half_bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_particles() {
        let config = SimConfig { num_particles: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::NoParticles));
    }

    #[test]
    fn rejects_bad_radius() {
        let config = SimConfig { smoothing_radius: 0.0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::SmoothingRadius(0.0)));

        let config = SimConfig { smoothing_radius: f32::NAN, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::SmoothingRadius(_))));
    }

    #[test]
    fn rejects_bad_domain() {
        let config = SimConfig { half_bounds: Vec2::new(3.0, -1.0), ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::DomainExtent(3.0, -1.0)));
    }

    #[test]
    fn rejects_out_of_range_damping() {
        let config = SimConfig { collision_damping: 1.5, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::CollisionDamping(1.5)));
    }
}
