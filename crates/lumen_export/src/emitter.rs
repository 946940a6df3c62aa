//! Emitter grid export.
//!
//! Mirrors the host's emitter grid into four word arrays:
//!
//! | buffer   | contents                                               | min len |
//! |----------|--------------------------------------------------------|---------|
//! | meta     | `cell_size, off_x, size_x, off_y, size_y, off_z, size_z` | 7     |
//! | cells    | per-cell `(start, count)` pairs                        | 2       |
//! | indexes  | emitter indices grouped by cell                        | 1       |
//! | emitters | `x, y, z, packed_block_reference` per emitter          | 4       |
//!
//! Buffers are never empty: a missing grid, or a grid with nothing in it,
//! exports placeholder arrays of the minimum length.

use crate::scene::EmitterGridSource;

/// Number of words in the meta buffer.
pub const META_LEN: usize = 7;

/// Words per emitter record.
pub const EMITTER_RECORD_LEN: usize = 4;

/// The four emitter grid arrays, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterGridExport {
    /// Grid geometry.
    pub meta: [i32; META_LEN],
    /// Per-cell `(start, count)` pairs.
    pub cells: Vec<i32>,
    /// Emitter indices grouped by cell.
    pub indexes: Vec<i32>,
    /// Emitter records.
    pub emitters: Vec<i32>,
}

impl EmitterGridExport {
    /// Minimal arrays for a scene without an emitter grid.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            meta: [0; META_LEN],
            cells: vec![0, 0],
            indexes: vec![0],
            emitters: vec![0; EMITTER_RECORD_LEN],
        }
    }

    /// Exports a grid, resolving each emitter's block through `mapping`.
    ///
    /// Falls back to [`Self::placeholder`] when either input is missing.
    #[must_use]
    pub fn from_scene(grid: Option<&dyn EmitterGridSource>, mapping: Option<&[i32]>) -> Self {
        match (grid, mapping) {
            (Some(grid), Some(mapping)) => Self::from_grid(grid, mapping),
            _ => Self::placeholder(),
        }
    }

    /// Exports a grid, resolving each emitter's block through `mapping`.
    ///
    /// An emitter whose native block index is not in `mapping` gets block
    /// reference 0 (air).
    #[must_use]
    pub fn from_grid(grid: &dyn EmitterGridSource, mapping: &[i32]) -> Self {
        let [off_x, off_y, off_z] = grid.offset();
        let [size_x, size_y, size_z] = grid.size();
        let positions = grid.emitter_positions();

        let mut emitters = vec![0; positions.len().max(1) * EMITTER_RECORD_LEN];
        let mut unresolved = 0usize;
        for (record, pos) in emitters.chunks_exact_mut(EMITTER_RECORD_LEN).zip(positions) {
            let block = mapping.get(pos.block as usize).copied().unwrap_or_else(|| {
                unresolved += 1;
                0
            });
            record.copy_from_slice(&[pos.x, pos.y, pos.z, block]);
        }
        if unresolved > 0 {
            tracing::warn!(unresolved, "emitters reference blocks missing from the block mapping");
        }

        Self {
            meta: [grid.cell_size(), off_x, size_x, off_y, size_y, off_z, size_z],
            cells: non_empty(grid.constructed_grid(), &[0, 0]),
            indexes: non_empty(grid.position_indexes(), &[0]),
            emitters,
        }
    }
}

fn non_empty(data: &[i32], fallback: &[i32]) -> Vec<i32> {
    if data.is_empty() { fallback } else { data }.to_vec()
}
