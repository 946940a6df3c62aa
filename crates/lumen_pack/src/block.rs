//! Packed blocks.
//!
//! Octree leaves reference a packed block by its word offset in the flattened
//! block palette. A packed block names a model type and a pointer whose
//! meaning depends on the type.

use bytemuck::{Pod, Zeroable};

use crate::packer::Packer;

/// Size of a packed block in 32-bit words.
pub const BLOCK_DWORD_SIZE: usize = 2;

/// Reserved block reference meaning "any block type". Never intersected.
pub const ANY_TYPE: i32 = 0x7FFF_FFFE;

/// How the kernel interprets a block's model pointer.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelType {
    /// Nothing to intersect (air).
    Invisible = 0,
    /// Unit cube; pointer is a material palette index.
    Cube = 1,
    /// Textured boxes; pointer is a word offset in the AABB palette.
    Aabb = 2,
    /// Quads; pointer is a word offset in the quad palette.
    Quads = 3,
    /// Emits light but is never intersected; pointer is a material index.
    InvisibleLight = 4,
    /// Water surface; pointer is a word offset in the water palette.
    Water = 5,
}

/// Two-word block entry: `[model_type, model_pointer]`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct PackedBlock {
    /// Raw [`ModelType`].
    pub model_type: i32,
    /// Type-dependent pointer.
    pub model_pointer: i32,
}

impl PackedBlock {
    /// Empty space. Always entry 0 of an exported block palette.
    pub const AIR: Self = Self {
        model_type: ModelType::Invisible as i32,
        model_pointer: 0,
    };

    /// Creates a packed block.
    #[must_use]
    pub const fn new(model_type: ModelType, model_pointer: u32) -> Self {
        Self {
            model_type: model_type as i32,
            model_pointer: model_pointer as i32,
        }
    }
}

impl Packer for PackedBlock {
    fn word_len(&self) -> usize {
        BLOCK_DWORD_SIZE
    }

    fn pack_into(&self, out: &mut Vec<i32>) {
        out.extend_from_slice(bytemuck::cast_slice(std::slice::from_ref(self)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_layout() {
        let packed = PackedBlock::new(ModelType::Water, 14).pack();
        assert_eq!(packed, vec![5, 14]);
    }

    #[test]
    fn test_air_is_zeroed() {
        assert_eq!(PackedBlock::AIR, PackedBlock::zeroed());
        assert_eq!(PackedBlock::AIR.pack(), vec![0, 0]);
    }
}
