//! Quad models.
//!
//! ## Layout
//!
//! Model: `[quad_count, quad * quad_count]`. Quad (15 words): origin xyz,
//! x-vector xyz, y-vector xyz, uv `u0 u1 v0 v1` (all float bits), material
//! index, flags (bit 0 double-sided).

use super::{MaterialSink, FLAG_DOUBLE_SIDED};
use crate::material::SurfaceProperties;
use crate::packer::{push_bits, vec3_bits, Packer};
use crate::texture::Texture;
use crate::tint::Tint;

/// Size of one packed quad in 32-bit words.
pub const QUAD_DWORD_SIZE: usize = 15;

/// A textured parallelogram in block-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TexturedQuad {
    /// Corner the two edge vectors start from.
    pub origin: [f32; 3],
    /// First edge.
    pub xv: [f32; 3],
    /// Second edge.
    pub yv: [f32; 3],
    /// Texture window `u0, u1, v0, v1`.
    pub uv: [f32; 4],
    /// Texture.
    pub texture: Texture,
    /// Optional tint.
    pub tint: Option<Tint>,
    /// Visible from both sides.
    pub double_sided: bool,
}

/// A packed quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedQuad {
    origin: [u32; 3],
    xv: [u32; 3],
    yv: [u32; 3],
    uv: [u32; 4],
    material: u32,
    flags: u32,
}

impl PackedQuad {
    /// Packs one quad, registering its material.
    pub fn new(quad: &TexturedQuad, surface: &SurfaceProperties, sink: &mut MaterialSink<'_>) -> Self {
        Self {
            origin: vec3_bits(quad.origin),
            xv: vec3_bits(quad.xv),
            yv: vec3_bits(quad.yv),
            uv: quad.uv.map(f32::to_bits),
            material: sink.put(&quad.texture, quad.tint.as_ref(), surface),
            flags: if quad.double_sided { FLAG_DOUBLE_SIDED } else { 0 },
        }
    }

    /// Material palette index.
    #[must_use]
    pub const fn material(&self) -> u32 {
        self.material
    }
}

impl Packer for PackedQuad {
    fn word_len(&self) -> usize {
        QUAD_DWORD_SIZE
    }

    fn pack_into(&self, out: &mut Vec<i32>) {
        push_bits(out, &self.origin);
        push_bits(out, &self.xv);
        push_bits(out, &self.yv);
        push_bits(out, &self.uv);
        out.push(self.material as i32);
        out.push(self.flags as i32);
    }
}

/// A list of packed quads forming one block model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackedQuadModel {
    quads: Vec<PackedQuad>,
}

impl PackedQuadModel {
    /// Packs every quad of a model.
    pub fn new(quads: &[TexturedQuad], surface: &SurfaceProperties, sink: &mut MaterialSink<'_>) -> Self {
        Self {
            quads: quads.iter().map(|q| PackedQuad::new(q, surface, sink)).collect(),
        }
    }

    /// The packed quads.
    #[must_use]
    pub fn quads(&self) -> &[PackedQuad] {
        &self.quads
    }
}

impl Packer for PackedQuadModel {
    fn word_len(&self) -> usize {
        1 + self.quads.len() * QUAD_DWORD_SIZE
    }

    fn pack_into(&self, out: &mut Vec<i32>) {
        out.push(self.quads.len() as i32);
        for q in &self.quads {
            q.pack_into(out);
        }
    }
}
