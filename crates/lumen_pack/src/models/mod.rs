//! Packed geometric models.
//!
//! Models never embed material data. Each face resolves its (texture, tint,
//! surface) tuple through a [`MaterialSink`] and stores the resulting
//! material palette index.

mod aabb;
mod quad;
mod triangle;
mod water;

pub use aabb::{AabbFace, PackedAabb, PackedAabbModel, TexturedAabb, AABB_DWORD_SIZE, FACE_ABSENT};
pub use quad::{PackedQuad, PackedQuadModel, TexturedQuad, QUAD_DWORD_SIZE};
pub use triangle::{PackedTriangleModel, TexturedTriangle, TRIANGLE_DWORD_SIZE};
pub use water::{PackedWaterModel, WaterState, WATER_DWORD_SIZE};

use crate::material::{MaterialOptions, PackedMaterial, SurfaceProperties};
use crate::palette::ResourcePalette;
use crate::texture::{Texture, TextureLoader};
use crate::tint::{pack_tint, Tint};

/// Flag bit shared by quads and triangles: visible from both sides.
pub const FLAG_DOUBLE_SIDED: u32 = 1;

/// Everything a model needs to turn a face description into a material index.
pub struct MaterialSink<'a> {
    /// Texture handle source.
    pub textures: &'a mut dyn TextureLoader,
    /// Destination material palette.
    pub materials: &'a mut ResourcePalette<PackedMaterial>,
    /// Export-wide material settings.
    pub options: MaterialOptions,
}

impl MaterialSink<'_> {
    /// Packs and deduplicates one material, returning its palette index.
    pub fn put(&mut self, texture: &Texture, tint: Option<&Tint>, surface: &SurfaceProperties) -> u32 {
        let material = PackedMaterial::new(texture, pack_tint(tint), surface, self.options, self.textures);
        self.materials.put(material)
    }
}
