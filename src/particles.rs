//! Per-particle state as parallel arrays, plus initial placement layouts.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Particle state in structure-of-arrays form. All arrays share one length,
/// fixed for the lifetime of a simulation.
#[derive(Debug)]
pub struct ParticleSet {
    pub(crate) positions: Vec<Vec2>,
    pub(crate) predicted: Vec<Vec2>,
    pub(crate) velocities: Vec<Vec2>,
    pub(crate) densities: Vec<f32>,
}

impl ParticleSet {
    pub fn new(positions: Vec<Vec2>) -> Self {
        let n = positions.len();
        Self {
            predicted: positions.clone(),
            positions,
            velocities: vec![Vec2::ZERO; n],
            densities: vec![0.0; n],
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn predicted_positions(&self) -> &[Vec2] {
        &self.predicted
    }

    pub fn velocities(&self) -> &[Vec2] {
        &self.velocities
    }

    pub fn densities(&self) -> &[f32] {
        &self.densities
    }
}

/// Place `count` particles on a centered square lattice with the given
/// spacing, row-major from the bottom-left.
pub fn lattice(count: usize, spacing: f32) -> Vec<Vec2> {
    if count == 0 {
        return Vec::new();
    }
    let per_row = (count as f32).sqrt() as usize;
    let per_row = per_row.max(1);
    let per_col = (count - 1) / per_row + 1;

    (0..count)
        .map(|i| {
            let x = (i % per_row) as f32 - per_row as f32 / 2.0 + 0.5;
            let y = (i / per_row) as f32 - per_col as f32 / 2.0 + 0.5;
            Vec2::new(x, y) * spacing
        })
        .collect()
}

/// Place `count` particles filling a centered rectangle, with the row/column
/// split chosen to match the rectangle's aspect ratio.
pub fn lattice_in_region(count: usize, region: Vec2) -> Vec<Vec2> {
    let num_x = (region.x / region.y * count as f32).sqrt().ceil() as usize;
    let num_x = num_x.max(1);
    let num_y = (count as f32 / num_x as f32).ceil() as usize;

    let mut particles = Vec::with_capacity(count);
    'fill: for y in 0..num_y {
        for x in 0..num_x {
            if particles.len() >= count {
                break 'fill;
            }
            let tx = if num_x <= 1 { 0.5 } else { x as f32 / (num_x - 1) as f32 };
            let ty = if num_y <= 1 { 0.5 } else { y as f32 / (num_y - 1) as f32 };
            particles.push(Vec2::new((tx - 0.5) * region.x, (ty - 0.5) * region.y));
        }
    }
    particles
}

/// Scatter `count` particles uniformly inside the box `[-half_bounds,
/// half_bounds]`, reproducibly from a seed.
pub fn random_in_bounds(count: usize, half_bounds: Vec2, seed: u64) -> Vec<Vec2> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let x = (rng.random::<f32>() - 0.5) * 2.0 * half_bounds.x;
            let y = (rng.random::<f32>() - 0.5) * 2.0 * half_bounds.y;
            Vec2::new(x, y)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_share_length() {
        let set = ParticleSet::new(lattice(50, 0.1));
        assert_eq!(set.len(), 50);
        assert_eq!(set.positions().len(), 50);
        assert_eq!(set.predicted_positions().len(), 50);
        assert_eq!(set.velocities().len(), 50);
        assert_eq!(set.densities().len(), 50);
    }

    #[test]
    fn lattice_is_centered_and_row_major() {
        let positions = lattice(4, 1.0);
        assert_eq!(positions.len(), 4);
        assert_eq!(positions[0], Vec2::new(-0.5, -0.5));
        assert_eq!(positions[1], Vec2::new(0.5, -0.5));
        assert_eq!(positions[2], Vec2::new(-0.5, 0.5));
        assert_eq!(positions[3], Vec2::new(0.5, 0.5));
    }

    #[test]
    fn region_lattice_stays_inside_region() {
        let region = Vec2::new(7.0, 3.0);
        let positions = lattice_in_region(100, region);
        assert_eq!(positions.len(), 100);
        for p in &positions {
            assert!(p.x.abs() <= region.x / 2.0 + 1e-5);
            assert!(p.y.abs() <= region.y / 2.0 + 1e-5);
        }
    }

    #[test]
    fn random_spawn_is_reproducible_and_in_domain() {
        let half = Vec2::new(4.0, 2.0);
        let a = random_in_bounds(64, half, 1024);
        let b = random_in_bounds(64, half, 1024);
        assert_eq!(a, b);
        for p in &a {
            assert!(p.x.abs() <= half.x);
            assert!(p.y.abs() <= half.y);
        }
    }
}
