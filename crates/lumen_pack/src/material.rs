//! Packed surface materials.
//!
//! Every distinct (texture, tint, optical parameters) tuple met during export
//! becomes one `PackedMaterial` in the material palette. Models store the
//! palette index, never a copy.
//!
//! ## Layout (7 words)
//!
//! | word | content |
//! |------|---------|
//! | 0 | flags: bit0 color texture, bit1 normal/emittance texture, bit2 specular/metalness/roughness texture, bit3 refractive, bit4 opaque |
//! | 1 | block tint (see [`crate::tint`]) |
//! | 2 | color texture handle, high 32 bits |
//! | 3 | color texture handle, low 32 bits (or averaged ARGB) |
//! | 4 | emittance in bits 0..8 |
//! | 5 | specular bits 0..8, metalness 8..16, roughness 16..24 |
//! | 6 | index of refraction, float bits |

use crate::packer::{unit_byte, Packer};
use crate::texture::{Texture, TextureLoader};

/// Index of refraction of air.
pub const AIR_IOR: f32 = 1.000_293;

/// Tolerance when comparing an IoR against air.
const IOR_EPSILON: f32 = 1.0e-4;

/// Size of a packed material in 32-bit words.
pub const MATERIAL_DWORD_SIZE: usize = 7;

/// Flag: word 2..4 hold a texture handle.
pub const FLAG_HAS_COLOR_TEXTURE: u32 = 0b00001;
/// Flag: normal/emittance texture present.
pub const FLAG_HAS_NORMAL_EMITTANCE_TEXTURE: u32 = 0b00010;
/// Flag: specular/metalness/roughness texture present.
pub const FLAG_HAS_SPECULAR_METALNESS_ROUGHNESS_TEXTURE: u32 = 0b00100;
/// Flag: refractive surface.
pub const FLAG_REFRACTIVE: u32 = 0b01000;
/// Flag: opaque surface.
pub const FLAG_OPAQUE: u32 = 0b10000;

/// Optical parameters of a host material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceProperties {
    /// Light emitted, `[0, 1]`.
    pub emittance: f32,
    /// Specular reflection factor, `[0, 1]`.
    pub specular: f32,
    /// Metalness, `[0, 1]`.
    pub metalness: f32,
    /// Roughness, `[0, 1]`.
    pub roughness: f32,
    /// Declared refractive.
    pub refractive: bool,
    /// Declared opaque.
    pub opaque: bool,
    /// Index of refraction.
    pub ior: f32,
}

impl SurfaceProperties {
    /// A plain opaque diffuse surface.
    pub const OPAQUE: Self = Self {
        emittance: 0.0,
        specular: 0.0,
        metalness: 0.0,
        roughness: 0.0,
        refractive: false,
        opaque: true,
        ior: AIR_IOR,
    };

    /// A non-opaque, non-refractive surface (foliage, water overlays).
    pub const TRANSLUCENT: Self = Self {
        opaque: false,
        ..Self::OPAQUE
    };

    /// Whether light bends through this surface.
    ///
    /// True if declared refractive, or if it is see-through with an IoR
    /// that differs from air.
    #[must_use]
    pub fn is_effectively_refractive(&self) -> bool {
        self.refractive || (!self.opaque && (self.ior - AIR_IOR).abs() > IOR_EPSILON)
    }
}

impl Default for SurfaceProperties {
    fn default() -> Self {
        Self::OPAQUE
    }
}

/// Export-wide material settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterialOptions {
    /// Replace opaque textures with their averaged color.
    pub single_color_textures: bool,
}

/// Canonical packed material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedMaterial {
    /// Word 2..4 hold a texture handle rather than an averaged color.
    pub has_color_texture: bool,
    /// Reserved, always false for now.
    pub has_normal_emittance_texture: bool,
    /// Reserved, always false for now.
    pub has_specular_metalness_roughness_texture: bool,
    /// Effective refractivity.
    pub refractive: bool,
    /// Opaque surface.
    pub opaque: bool,
    /// Packed tint word.
    pub block_tint: u32,
    /// Texture handle or averaged ARGB.
    pub color_texture: u64,
    /// Emittance byte.
    pub normal_emittance: u32,
    /// Specular, metalness and roughness bytes.
    pub specular_metalness_roughness: u32,
    /// IoR float bits.
    pub ior: u32,
}

impl PackedMaterial {
    /// The material of empty space.
    #[must_use]
    pub fn air() -> Self {
        Self {
            has_color_texture: false,
            has_normal_emittance_texture: false,
            has_specular_metalness_roughness_texture: false,
            refractive: false,
            opaque: false,
            block_tint: 0,
            color_texture: 0,
            normal_emittance: 0,
            specular_metalness_roughness: 0,
            ior: AIR_IOR.to_bits(),
        }
    }

    /// Packs a textured surface.
    ///
    /// Refractive materials always keep their full texture: averaging the
    /// texture would collapse per-pixel alpha and make glass opaque.
    pub fn new(
        texture: &Texture,
        block_tint: u32,
        surface: &SurfaceProperties,
        options: MaterialOptions,
        textures: &mut dyn TextureLoader,
    ) -> Self {
        let refractive = surface.is_effectively_refractive();
        let has_color_texture = refractive || !surface.opaque || !options.single_color_textures;
        let color_texture = if has_color_texture {
            textures.reference(texture).0
        } else {
            u64::from(texture.average_color())
        };

        Self {
            has_color_texture,
            has_normal_emittance_texture: false,
            has_specular_metalness_roughness_texture: false,
            refractive,
            opaque: surface.opaque,
            block_tint,
            color_texture,
            normal_emittance: unit_byte(surface.emittance),
            specular_metalness_roughness: unit_byte(surface.specular)
                | (unit_byte(surface.metalness) << 8)
                | (unit_byte(surface.roughness) << 16),
            ior: surface.ior.to_bits(),
        }
    }

    /// Flag word (word 0).
    #[must_use]
    pub fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.has_color_texture {
            flags |= FLAG_HAS_COLOR_TEXTURE;
        }
        if self.has_normal_emittance_texture {
            flags |= FLAG_HAS_NORMAL_EMITTANCE_TEXTURE;
        }
        if self.has_specular_metalness_roughness_texture {
            flags |= FLAG_HAS_SPECULAR_METALNESS_ROUGHNESS_TEXTURE;
        }
        if self.refractive {
            flags |= FLAG_REFRACTIVE;
        }
        if self.opaque {
            flags |= FLAG_OPAQUE;
        }
        flags
    }
}

impl Packer for PackedMaterial {
    fn word_len(&self) -> usize {
        MATERIAL_DWORD_SIZE
    }

    fn pack_into(&self, out: &mut Vec<i32>) {
        out.push(self.flags() as i32);
        out.push(self.block_tint as i32);
        out.push((self.color_texture >> 32) as i32);
        out.push(self.color_texture as i32);
        out.push(self.normal_emittance as i32);
        out.push(self.specular_metalness_roughness as i32);
        out.push(self.ior as i32);
    }
}
