// smoothed particle hydrodynamics in 2D on a uniform spatial hash grid

pub mod boundary;
pub mod config;
pub mod kernels;
pub mod particles;
pub mod solver;
pub mod spatial;

pub use config::{ConfigError, SimConfig};
pub use solver::SphSimulation;
