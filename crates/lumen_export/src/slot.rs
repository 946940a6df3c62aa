//! Owned slots for published buffers.
//!
//! Each buffer the loader exposes lives in one [`BufferSlot`]. Publishing a
//! new buffer releases the one it replaces, and dropping the slot releases
//! whatever it still holds.

use std::fmt;

use lumen_pack::PaletteKind;

use crate::backend::Release;

/// A slot holding at most one published resource.
pub struct BufferSlot<R: Release> {
    current: Option<R>,
}

impl<R: Release> BufferSlot<R> {
    /// Creates an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Publishes `resource`, releasing the previous one.
    pub fn publish(&mut self, resource: R) {
        if let Some(old) = self.current.replace(resource) {
            old.release();
        }
    }

    /// The published resource, if any.
    #[must_use]
    pub fn get(&self) -> Option<&R> {
        self.current.as_ref()
    }

    /// Returns true once something was published.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.current.is_some()
    }

    /// The published resource.
    ///
    /// # Panics
    ///
    /// Panics if nothing was published yet. Reading a buffer before the
    /// first successful load is a programming error.
    #[must_use]
    pub fn expect_published(&self, name: &str) -> &R {
        match &self.current {
            Some(resource) => resource,
            None => panic!("{name} requested before the first successful scene load"),
        }
    }

    /// Releases the published resource, leaving the slot empty.
    pub fn clear(&mut self) {
        if let Some(old) = self.current.take() {
            old.release();
        }
    }
}

impl<R: Release> Default for BufferSlot<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Release> Drop for BufferSlot<R> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<R: Release> fmt::Debug for BufferSlot<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferSlot")
            .field("published", &self.is_published())
            .finish()
    }
}

/// Every slot-backed buffer the loader publishes.
///
/// The BVH and sun buffers are memoized instead and are not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferId {
    /// Texture atlas pixels.
    Textures,
    /// Packed blocks.
    Blocks,
    /// Packed materials.
    Materials,
    /// AABB models.
    AabbModels,
    /// Quad models.
    QuadModels,
    /// Water models.
    WaterModels,
    /// Triangle models.
    TriangleModels,
    /// Remapped world octree.
    OctreeData,
    /// World octree depth, one word.
    OctreeDepth,
    /// Remapped water octree.
    WaterOctreeData,
    /// Water octree depth, one word.
    WaterOctreeDepth,
    /// Packed sky.
    Sky,
    /// Emitter grid meta, seven words.
    EmitterGridMeta,
    /// Emitter grid cells.
    EmitterGridCells,
    /// Emitter grid position indexes.
    EmitterGridIndexes,
    /// Emitter records, four words each.
    EmitterGridEmitters,
}

impl BufferId {
    /// Number of slot-backed buffers.
    pub const COUNT: usize = 16;

    /// All ids, in slot order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Textures,
        Self::Blocks,
        Self::Materials,
        Self::AabbModels,
        Self::QuadModels,
        Self::WaterModels,
        Self::TriangleModels,
        Self::OctreeData,
        Self::OctreeDepth,
        Self::WaterOctreeData,
        Self::WaterOctreeDepth,
        Self::Sky,
        Self::EmitterGridMeta,
        Self::EmitterGridCells,
        Self::EmitterGridIndexes,
        Self::EmitterGridEmitters,
    ];

    /// Slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The slot holding a palette of `kind`.
    #[must_use]
    pub const fn for_palette(kind: PaletteKind) -> Self {
        match kind {
            PaletteKind::Texture => Self::Textures,
            PaletteKind::Block => Self::Blocks,
            PaletteKind::Material => Self::Materials,
            PaletteKind::AabbModel => Self::AabbModels,
            PaletteKind::QuadModel => Self::QuadModels,
            PaletteKind::WaterModel => Self::WaterModels,
            PaletteKind::TriangleModel => Self::TriangleModels,
        }
    }

    /// Buffer label for the backend and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Textures => PaletteKind::Texture.label(),
            Self::Blocks => PaletteKind::Block.label(),
            Self::Materials => PaletteKind::Material.label(),
            Self::AabbModels => PaletteKind::AabbModel.label(),
            Self::QuadModels => PaletteKind::QuadModel.label(),
            Self::WaterModels => PaletteKind::WaterModel.label(),
            Self::TriangleModels => PaletteKind::TriangleModel.label(),
            Self::OctreeData => "octree_data",
            Self::OctreeDepth => "octree_depth",
            Self::WaterOctreeData => "water_octree_data",
            Self::WaterOctreeDepth => "water_octree_depth",
            Self::Sky => "sky",
            Self::EmitterGridMeta => "emitter_grid_meta",
            Self::EmitterGridCells => "emitter_grid_cells",
            Self::EmitterGridIndexes => "emitter_grid_indexes",
            Self::EmitterGridEmitters => "emitter_grid_emitters",
        }
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
