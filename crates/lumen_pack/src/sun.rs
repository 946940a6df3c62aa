//! Packed sun.
//!
//! ## Layout (11 words)
//!
//! `flags, texture_hi, texture_lo, altitude, azimuth, radius, intensity,
//! luminosity, r, g, b`. Flag bit 0 means the sun disc is drawn with its
//! texture. Floats are stored as bit patterns.

use crate::packer::{push_bits, vec3_bits, Packer};
use crate::texture::{Texture, TextureHandle, TextureLoader};

/// Size of the packed sun in 32-bit words.
pub const SUN_DWORD_SIZE: usize = 11;

/// Flag: draw the sun texture.
pub const SUN_FLAG_DRAW_TEXTURE: u32 = 1;

/// Sun parameters as the host scene holds them.
#[derive(Debug, Clone, PartialEq)]
pub struct SunState {
    /// Altitude in radians.
    pub altitude: f32,
    /// Azimuth in radians.
    pub azimuth: f32,
    /// Angular radius in radians.
    pub radius: f32,
    /// Emitted intensity.
    pub intensity: f32,
    /// Luminosity used for direct sampling.
    pub luminosity: f32,
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Draw the disc with `texture`.
    pub draw_texture: bool,
    /// Sun texture.
    pub texture: Texture,
}

impl Default for SunState {
    fn default() -> Self {
        Self {
            altitude: std::f32::consts::FRAC_PI_3,
            azimuth: 1.2,
            radius: 0.03,
            intensity: 1.25,
            luminosity: 100.0,
            color: [1.0, 1.0, 1.0],
            draw_texture: true,
            texture: Texture::solid(0xFFFF_FFFF),
        }
    }
}

/// Packed sun, hashable so derived buffers can be memoized on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedSun {
    flags: u32,
    texture: u64,
    params: [u32; 5],
    color: [u32; 3],
}

impl PackedSun {
    /// Packs the sun, registering its texture.
    pub fn new(sun: &SunState, textures: &mut dyn TextureLoader) -> Self {
        Self::with_texture(sun, textures.reference(&sun.texture))
    }

    /// Packs the sun with an already resolved texture handle.
    #[must_use]
    pub fn with_texture(sun: &SunState, texture: TextureHandle) -> Self {
        Self {
            flags: if sun.draw_texture { SUN_FLAG_DRAW_TEXTURE } else { 0 },
            texture: texture.0,
            params: [sun.altitude, sun.azimuth, sun.radius, sun.intensity, sun.luminosity].map(f32::to_bits),
            color: vec3_bits(sun.color),
        }
    }
}

impl Packer for PackedSun {
    fn word_len(&self) -> usize {
        SUN_DWORD_SIZE
    }

    fn pack_into(&self, out: &mut Vec<i32>) {
        out.push(self.flags as i32);
        out.push((self.texture >> 32) as i32);
        out.push(self.texture as i32);
        push_bits(out, &self.params);
        push_bits(out, &self.color);
    }
}
