//! Uniform spatial hash grid for near-constant-time neighbor lookup.
//!
//! Every particle is hashed into a square cell of side `radius`. The lookup
//! structure is a flat array of `(particle index, cell key)` entries sorted by
//! key, plus a start-index table giving, for each key, where its contiguous
//! run begins in the sorted array. Keys are wrapped modulo the particle count,
//! so unrelated cells can share a key; the exact distance check during a query
//! filters those false positives out.

use bytemuck::{Pod, Zeroable};
use glam::{IVec2, Vec2};
use rayon::prelude::*;

// Odd constants chosen to spread adjacent cells apart in hash space.
// Overflow wraps; that is part of the hash, not an error.
const HASH_K1: u32 = 15823;
const HASH_K2: u32 = 9737333;

/// Start-index sentinel for a key with no entries.
pub const EMPTY: u32 = u32::MAX;

/// The 3x3 block of cells that can contain points within one cell side of a
/// sample point.
pub const CELL_OFFSETS: [IVec2; 9] = [
    IVec2::new(0, 0),
    IVec2::new(1, 0),
    IVec2::new(-1, 0),
    IVec2::new(0, 1),
    IVec2::new(0, -1),
    IVec2::new(1, 1),
    IVec2::new(1, -1),
    IVec2::new(-1, 1),
    IVec2::new(-1, -1),
];

/// One particle's slot in the key-sorted lookup array. Rebuilt every step.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Entry {
    pub index: u32,
    pub cell_key: u32,
}

#[inline]
fn hash_cell(cell: IVec2) -> u32 {
    let a = (cell.x as u32).wrapping_mul(HASH_K1);
    let b = (cell.y as u32).wrapping_mul(HASH_K2);
    a.wrapping_add(b)
}

#[derive(Debug)]
pub struct SpatialHashGrid {
    entries: Vec<Entry>,
    start_indices: Vec<u32>,
    origin: Vec2,
    cell_size: f32,
}

impl SpatialHashGrid {
    /// Both the entry array and the start-index table are sized to the
    /// particle count; the key space is exactly `[0, num_particles)`.
    pub fn new(num_particles: usize, origin: Vec2, cell_size: f32) -> Self {
        Self {
            entries: vec![Entry::default(); num_particles],
            start_indices: vec![EMPTY; num_particles],
            origin,
            cell_size,
        }
    }

    /// Coordinate of the cell containing `point`.
    #[inline]
    pub fn cell_coord(&self, point: Vec2) -> IVec2 {
        ((point - self.origin) / self.cell_size).floor().as_ivec2()
    }

    #[inline]
    fn key_from_hash(&self, hash: u32) -> u32 {
        hash % self.entries.len() as u32
    }

    /// Key of the cell containing `point`.
    #[inline]
    pub fn key_of(&self, point: Vec2) -> u32 {
        self.key_from_hash(hash_cell(self.cell_coord(point)))
    }

    /// Rebuild the lookup from scratch for the given points.
    ///
    /// `points` must have the same length the grid was created with.
    pub fn build(&mut self, points: &[Vec2], radius: f32) {
        debug_assert_eq!(points.len(), self.entries.len());
        self.cell_size = radius;

        let origin = self.origin;
        let n = self.entries.len() as u32;
        self.entries
            .par_iter_mut()
            .zip(points.par_iter())
            .enumerate()
            .for_each(|(i, (entry, &point))| {
                let cell = ((point - origin) / radius).floor().as_ivec2();
                *entry = Entry {
                    index: i as u32,
                    cell_key: hash_cell(cell) % n,
                };
            });
        self.start_indices.par_iter_mut().for_each(|s| *s = EMPTY);

        // Group equal keys into contiguous runs. The index tie-break pins the
        // order within a run, which keeps force summation order reproducible.
        self.entries.par_sort_unstable_by_key(|e| (e.cell_key, e.index));

        for i in 0..self.entries.len() {
            let key = self.entries[i].cell_key;
            let prev = if i == 0 { EMPTY } else { self.entries[i - 1].cell_key };
            if key != prev {
                self.start_indices[key as usize] = i as u32;
            }
        }
    }

    /// Indices of all points within `radius` of `sample`.
    ///
    /// The grid is a broad-phase filter; candidates from the 3x3 cell block
    /// are rechecked by exact squared distance against `positions`, which must
    /// be the same array the grid was last built from for the result to be
    /// exact.
    pub fn query_neighbors(&self, sample: Vec2, radius: f32, positions: &[Vec2]) -> Vec<usize> {
        let mut found = Vec::new();
        let centre = self.cell_coord(sample);
        let sqr_radius = radius * radius;

        // With few particles the wrapped key space is small enough for two
        // offsets to land on the same key; scan each key's run once.
        let mut seen = [EMPTY; CELL_OFFSETS.len()];
        let mut num_seen = 0;

        for offset in CELL_OFFSETS {
            let key = self.key_from_hash(hash_cell(centre + offset));
            if seen[..num_seen].contains(&key) {
                continue;
            }
            seen[num_seen] = key;
            num_seen += 1;

            let start = self.start_indices[key as usize];
            if start == EMPTY {
                continue;
            }
            for entry in &self.entries[start as usize..] {
                if entry.cell_key != key {
                    break;
                }
                let index = entry.index as usize;
                if positions[index].distance_squared(sample) <= sqr_radius {
                    found.push(index);
                }
            }
        }

        found
    }

    /// The key-sorted lookup array, for inspection tooling.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Start of each key's run in the sorted array, `EMPTY` where a key has
    /// no entries.
    pub fn start_indices(&self) -> &[u32] {
        &self.start_indices
    }
}
