//! Triangle models for the entity and actor BVHs.
//!
//! Triangle (17 words): vertices `a b c` (xyz float bits each), texture
//! coordinates for `a b c` (uv float bits each), material index, flags
//! (bit 0 double-sided).

use super::{MaterialSink, FLAG_DOUBLE_SIDED};
use crate::material::SurfaceProperties;
use crate::packer::{push_bits, vec3_bits, Packer};
use crate::texture::Texture;
use crate::tint::Tint;

/// Size of one packed triangle in 32-bit words.
pub const TRIANGLE_DWORD_SIZE: usize = 17;

/// A textured triangle in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TexturedTriangle {
    /// Vertices.
    pub vertices: [[f32; 3]; 3],
    /// Texture coordinates per vertex.
    pub uv: [[f32; 2]; 3],
    /// Texture.
    pub texture: Texture,
    /// Optional tint.
    pub tint: Option<Tint>,
    /// Optical parameters.
    pub surface: SurfaceProperties,
    /// Visible from both sides.
    pub double_sided: bool,
}

/// A packed triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedTriangleModel {
    vertices: [[u32; 3]; 3],
    uv: [[u32; 2]; 3],
    material: u32,
    flags: u32,
}

impl PackedTriangleModel {
    /// Packs one triangle, registering its material.
    pub fn new(triangle: &TexturedTriangle, sink: &mut MaterialSink<'_>) -> Self {
        Self {
            vertices: triangle.vertices.map(vec3_bits),
            uv: triangle.uv.map(|[u, v]| [u.to_bits(), v.to_bits()]),
            material: sink.put(&triangle.texture, triangle.tint.as_ref(), &triangle.surface),
            flags: if triangle.double_sided { FLAG_DOUBLE_SIDED } else { 0 },
        }
    }

    /// Material palette index.
    #[must_use]
    pub const fn material(&self) -> u32 {
        self.material
    }
}

impl Packer for PackedTriangleModel {
    fn word_len(&self) -> usize {
        TRIANGLE_DWORD_SIZE
    }

    fn pack_into(&self, out: &mut Vec<i32>) {
        for v in &self.vertices {
            push_bits(out, v);
        }
        for uv in &self.uv {
            push_bits(out, uv);
        }
        out.push(self.material as i32);
        out.push(self.flags as i32);
    }
}
