//! Interfaces the host scene exposes to the exporter.
//!
//! The octree, the BVH builder and the emitter grid are owned by the host.
//! The exporter only reads them through these traits, once per load pass.

use lumen_pack::{
    SkySettings, SunState, SurfaceProperties, Texture, TexturedAabb, TexturedQuad, TexturedTriangle, Tint, WaterState,
};

/// Why the host is asking for a reload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResetReason {
    /// No particular reason; only a counter change matters.
    #[default]
    None,
    /// Render settings changed.
    SettingsChanged,
    /// Render mode changed (preview, render, pause).
    ModeChange,
    /// Block materials changed; palettes must be rebuilt.
    MaterialsChanged,
    /// A new scene was loaded; everything must be rebuilt.
    SceneLoaded,
}

impl ResetReason {
    /// Whether this reason forces palettes, octrees and BVHs to be rebuilt.
    #[must_use]
    pub const fn forces_full_reload(self) -> bool {
        matches!(self, Self::MaterialsChanged | Self::SceneLoaded)
    }
}

/// Geometry of one block type.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockModel {
    /// Empty space.
    Air,
    /// A full cube with one texture on every face.
    Cube {
        /// Face texture.
        texture: Texture,
        /// Optional tint.
        tint: Option<Tint>,
    },
    /// A list of textured boxes.
    Aabbs(Vec<TexturedAabb>),
    /// A list of textured quads.
    Quads(Vec<TexturedQuad>),
    /// Emits light but is never hit (light blocks).
    InvisibleLight {
        /// Emission texture.
        texture: Texture,
        /// Optional tint.
        tint: Option<Tint>,
    },
    /// A water block.
    Water {
        /// Water state.
        state: WaterState,
        /// Water texture.
        texture: Texture,
    },
}

/// One entry of the host's native block palette.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneBlock {
    /// Host block name, for diagnostics.
    pub name: String,
    /// Geometry.
    pub model: BlockModel,
    /// Optical parameters shared by every face.
    pub surface: SurfaceProperties,
}

impl SceneBlock {
    /// The air block.
    #[must_use]
    pub fn air() -> Self {
        Self {
            name: "air".to_string(),
            model: BlockModel::Air,
            surface: SurfaceProperties::TRANSLUCENT,
        }
    }
}

/// A flattened octree borrowed from the host.
///
/// Positive entries are branch pointers. Non-positive entries are leaves
/// holding `-native_block_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OctreeView<'a> {
    /// Node array.
    pub data: &'a [i32],
    /// Tree depth.
    pub depth: i32,
}

/// One emissive block position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmitterPosition {
    /// Block x.
    pub x: i32,
    /// Block y.
    pub y: i32,
    /// Block z.
    pub z: i32,
    /// Index into the native block palette.
    pub block: u32,
}

/// Spatial index over emissive blocks, built by the host.
pub trait EmitterGridSource {
    /// Cell edge length in blocks.
    fn cell_size(&self) -> i32;
    /// Grid origin in cells, `x y z`.
    fn offset(&self) -> [i32; 3];
    /// Grid extent in cells, `x y z`.
    fn size(&self) -> [i32; 3];
    /// Per-cell `(start, count)` pairs into [`Self::position_indexes`].
    fn constructed_grid(&self) -> &[i32];
    /// Emitter indices grouped by cell.
    fn position_indexes(&self) -> &[i32];
    /// Every emitter, addressed by the position indexes.
    fn emitter_positions(&self) -> &[EmitterPosition];
}

/// A bounding volume hierarchy over triangles, built by the host.
pub trait BvhSource {
    /// Triangles in the order the hierarchy references them.
    fn triangles(&self) -> &[TexturedTriangle];

    /// Emits the node array. `triangle_offsets[i]` is the word offset of
    /// triangle `i` in the exported triangle buffer.
    fn pack_nodes(&self, triangle_offsets: &[u32]) -> Vec<i32>;
}

/// Read-only view of the host scene for one load pass.
pub trait SceneSnapshot {
    /// Sky settings.
    fn sky(&self) -> &SkySettings;
    /// Sun settings.
    fn sun(&self) -> &SunState;
    /// Native block palette. Octree leaves index into it.
    fn block_palette(&self) -> &[SceneBlock];
    /// World octree.
    fn world_octree(&self) -> OctreeView<'_>;
    /// Water octree, if the scene keeps water separately.
    fn water_octree(&self) -> Option<OctreeView<'_>> {
        None
    }
    /// Emitter grid, if one was built.
    fn emitter_grid(&self) -> Option<&dyn EmitterGridSource> {
        None
    }
    /// Hierarchy over entity geometry.
    fn world_bvh(&self) -> Option<&dyn BvhSource> {
        None
    }
    /// Hierarchy over actor geometry.
    fn actor_bvh(&self) -> Option<&dyn BvhSource> {
        None
    }
}
