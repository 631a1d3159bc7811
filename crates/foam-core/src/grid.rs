use std::collections::HashMap;

use glam::{IVec3, IVec4, Vec3, Vec4};

use crate::config::SimulationMode;

/// Edge length of a cell at `level`: `2^level`.
#[inline]
pub fn cell_size_of_level(level: i32) -> f32 {
    2.0_f32.powi(level)
}

/// Finest and coarsest levels a simplex can be binned into.
pub const MIN_LEVEL: i32 = -16;
pub const MAX_LEVEL: i32 = 16;

/// Smallest level whose cells are at least `size` wide: `ceil(log2(size))`,
/// clamped to `[MIN_LEVEL, MAX_LEVEL]`.
#[inline]
pub fn level_for_size(size: f32) -> i32 {
    let level = size.max(f32::MIN_POSITIVE).log2().ceil() as i32;
    level.clamp(MIN_LEVEL, MAX_LEVEL)
}

/// Read-only multi-level cell lookup.
///
/// Each level is a uniform grid of `cell_size_of_level(level)` cells. An
/// occupied cell holds the indices of the surface elements (simplices)
/// binned into it.
pub trait MultilevelLookup: Sync {
    /// Levels that hold at least one cell, ascending.
    fn levels(&self) -> &[i32];

    /// Contents of the cell at `coords` on `level`, or `None` if empty.
    fn cell(&self, coords: IVec3, level: i32) -> Option<&[u32]>;
}

/// Fluid surface elements as a flat particle-index table.
///
/// Points come first (one index each), then edges (two), then triangles
/// (three). A simplex id selects its run of particle indices.
#[derive(Clone, Debug, Default)]
pub struct Simplices {
    pub indices: Vec<u32>,
    pub point_count: usize,
    pub edge_count: usize,
    pub triangle_count: usize,
}

impl Simplices {
    /// One point simplex per listed particle.
    pub fn from_points(particles: &[u32]) -> Self {
        Self {
            indices: particles.to_vec(),
            point_count: particles.len(),
            edge_count: 0,
            triangle_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.point_count + self.edge_count + self.triangle_count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start offset into `indices` and size of `simplex`.
    #[inline]
    pub fn start_and_size(&self, simplex: usize) -> (usize, usize) {
        if simplex < self.point_count {
            (simplex, 1)
        } else if simplex < self.point_count + self.edge_count {
            (self.point_count + (simplex - self.point_count) * 2, 2)
        } else {
            let tri = simplex - self.point_count - self.edge_count;
            (self.point_count + self.edge_count * 2 + tri * 3, 3)
        }
    }

    /// Particle indices of `simplex`, or an empty slice if it is out of range.
    #[inline]
    pub fn particles(&self, simplex: usize) -> &[u32] {
        let (start, size) = self.start_and_size(simplex);
        self.indices.get(start..start + size).unwrap_or(&[])
    }
}

/// Concrete multi-level grid.
///
/// Each simplex goes to the level whose cell size fits its bounding size,
/// in the cell containing its centroid. Construction sorts `(cell, simplex)`
/// pairs and records one contiguous run per cell, so storage is reused
/// across rebuilds.
#[derive(Default)]
pub struct MultilevelGrid {
    /// `(x, y, z, level)` key per binned simplex, sorted during build.
    entries: Vec<(IVec4, u32)>,
    /// Simplex indices grouped by cell.
    contents: Vec<u32>,
    /// Cell key -> `(start, len)` in `contents`.
    cells: HashMap<IVec4, (u32, u32)>,
    levels: Vec<i32>,
}

impl MultilevelGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the current fluid state.
    ///
    /// A simplex's size is the extent of its particles plus twice the largest
    /// principal radius among them. Simplices referencing particles outside
    /// `positions` are skipped.
    pub fn build(
        &mut self,
        simplices: &Simplices,
        positions: &[Vec4],
        principal_radii: &[Vec4],
        mode: SimulationMode,
    ) {
        self.entries.clear();
        self.contents.clear();
        self.cells.clear();
        self.levels.clear();

        for s in 0..simplices.len() {
            let particles = simplices.particles(s);
            if particles.is_empty() {
                continue;
            }

            let mut min = Vec3::splat(f32::MAX);
            let mut max = Vec3::splat(f32::MIN);
            let mut max_radius = 0.0_f32;
            let mut valid = true;
            for &p in particles {
                let p = p as usize;
                let Some(pos) = positions.get(p) else {
                    valid = false;
                    break;
                };
                let pos = pos.truncate();
                min = min.min(pos);
                max = max.max(pos);
                let radius = principal_radii.get(p).map_or(0.0, |r| r.x);
                max_radius = max_radius.max(radius);
            }
            if !valid || !min.is_finite() || !max.is_finite() {
                continue;
            }

            let size = (max - min).max_element() + max_radius * 2.0;
            let level = level_for_size(size);
            let cell_size = cell_size_of_level(level);
            let center = mode.flatten((min + max) * 0.5);
            let coords = (center / cell_size).floor().as_ivec3();

            self.entries.push((coords.extend(level), s as u32));
        }

        self.entries
            .sort_unstable_by_key(|(key, s)| (key.w, key.x, key.y, key.z, *s));

        let mut run_start = 0usize;
        for i in 0..self.entries.len() {
            let (key, simplex) = self.entries[i];
            self.contents.push(simplex);

            let last_of_run = i + 1 == self.entries.len() || self.entries[i + 1].0 != key;
            if last_of_run {
                let len = i + 1 - run_start;
                self.cells.insert(key, (run_start as u32, len as u32));
                if self.levels.last() != Some(&key.w) {
                    self.levels.push(key.w);
                }
                run_start = i + 1;
            }
        }
    }

    /// Number of occupied cells across all levels.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

impl MultilevelLookup for MultilevelGrid {
    fn levels(&self) -> &[i32] {
        &self.levels
    }

    fn cell(&self, coords: IVec3, level: i32) -> Option<&[u32]> {
        let &(start, len) = self.cells.get(&coords.extend(level))?;
        let start = start as usize;
        self.contents.get(start..start + len as usize)
    }
}
