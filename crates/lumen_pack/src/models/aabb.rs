//! Textured axis-aligned box models.
//!
//! ## Layout
//!
//! Model: `[box_count, box * box_count]`. Box (13 words): bounds
//! `xmin xmax ymin ymax zmin zmax` as float bits, one flag word holding a
//! nibble per face (north, east, south, west, top, bottom; nibble bit 3 =
//! face absent), then the six face material indices in the same order.

use super::MaterialSink;
use crate::material::SurfaceProperties;
use crate::packer::{push_bits, Packer};
use crate::texture::Texture;
use crate::tint::Tint;

/// Size of one packed box in 32-bit words.
pub const AABB_DWORD_SIZE: usize = 13;

/// Nibble bit marking a face that is not rendered.
pub const FACE_ABSENT: u32 = 0b1000;

/// One face of a textured box.
#[derive(Debug, Clone, PartialEq)]
pub struct AabbFace {
    /// Face texture.
    pub texture: Texture,
    /// Optional tint.
    pub tint: Option<Tint>,
}

/// A box with up to six textured faces, in block-local `[0, 1]` coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TexturedAabb {
    /// `xmin, xmax, ymin, ymax, zmin, zmax`.
    pub bounds: [f32; 6],
    /// Faces in north, east, south, west, top, bottom order.
    pub faces: [Option<AabbFace>; 6],
}

/// A packed box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedAabb {
    bounds: [u32; 6],
    flags: u32,
    materials: [u32; 6],
}

impl PackedAabb {
    /// Packs one box, registering its face materials.
    pub fn new(aabb: &TexturedAabb, surface: &SurfaceProperties, sink: &mut MaterialSink<'_>) -> Self {
        let mut flags = 0;
        let mut materials = [0; 6];
        for (i, face) in aabb.faces.iter().enumerate() {
            match face {
                Some(face) => materials[i] = sink.put(&face.texture, face.tint.as_ref(), surface),
                None => flags |= FACE_ABSENT << (i * 4),
            }
        }
        Self {
            bounds: aabb.bounds.map(f32::to_bits),
            flags,
            materials,
        }
    }

    /// Number of faces that are rendered.
    #[must_use]
    pub fn face_count(&self) -> usize {
        (0..6u32).filter(|&i| (self.flags >> (i * 4)) & FACE_ABSENT == 0).count()
    }
}

impl Packer for PackedAabb {
    fn word_len(&self) -> usize {
        AABB_DWORD_SIZE
    }

    fn pack_into(&self, out: &mut Vec<i32>) {
        push_bits(out, &self.bounds);
        out.push(self.flags as i32);
        push_bits(out, &self.materials);
    }
}

/// A list of packed boxes forming one block model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackedAabbModel {
    boxes: Vec<PackedAabb>,
}

impl PackedAabbModel {
    /// Packs every box of a model.
    pub fn new(boxes: &[TexturedAabb], surface: &SurfaceProperties, sink: &mut MaterialSink<'_>) -> Self {
        Self {
            boxes: boxes.iter().map(|b| PackedAabb::new(b, surface, sink)).collect(),
        }
    }

    /// The packed boxes.
    #[must_use]
    pub fn boxes(&self) -> &[PackedAabb] {
        &self.boxes
    }
}

impl Packer for PackedAabbModel {
    fn word_len(&self) -> usize {
        1 + self.boxes.len() * AABB_DWORD_SIZE
    }

    fn pack_into(&self, out: &mut Vec<i32>) {
        out.push(self.boxes.len() as i32);
        for b in &self.boxes {
            b.pack_into(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{MaterialOptions, PackedMaterial};
    use crate::palette::{PaletteKind, ResourcePalette};
    use crate::texture::AtlasTextureLoader;

    fn slab() -> TexturedAabb {
        let face = |argb| Some(AabbFace {
            texture: Texture::solid(argb),
            tint: None,
        });
        TexturedAabb {
            bounds: [0.0, 1.0, 0.0, 0.5, 0.0, 1.0],
            faces: [face(1), face(1), face(1), face(1), face(2), None],
        }
    }

    #[test]
    fn test_box_layout() {
        let mut textures = AtlasTextureLoader::new();
        let mut materials: ResourcePalette<PackedMaterial> = ResourcePalette::new(PaletteKind::Material);
        let mut sink = MaterialSink {
            textures: &mut textures,
            materials: &mut materials,
            options: MaterialOptions::default(),
        };

        let model = PackedAabbModel::new(&[slab()], &SurfaceProperties::OPAQUE, &mut sink);
        let words = model.pack();

        assert_eq!(words.len(), model.word_len());
        assert_eq!(words[0], 1);
        assert_eq!(words[4] as u32, 0.5f32.to_bits());
        // bottom face absent: nibble 5, bit 3
        assert_eq!(words[7] as u32, FACE_ABSENT << 20);
        assert_eq!(&words[8..14], &[0, 0, 0, 0, 1, 0]);
        assert_eq!(model.boxes()[0].face_count(), 5);
        assert_eq!(materials.len(), 2);
    }
}
