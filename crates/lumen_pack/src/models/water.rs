//! Water models: `[material_index, water_data]`.

use super::MaterialSink;
use crate::material::{SurfaceProperties, AIR_IOR};
use crate::packer::Packer;
use crate::texture::Texture;
use crate::tint::Tint;

/// Size of a packed water model in 32-bit words.
pub const WATER_DWORD_SIZE: usize = 2;

/// A water block as the host describes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterState {
    /// Host-encoded level and corner heights, passed through untouched.
    pub data: i32,
    /// Specular reflection factor.
    pub specular: f32,
    /// Metalness.
    pub metalness: f32,
    /// Roughness.
    pub roughness: f32,
}

/// A packed water model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedWaterModel {
    material: u32,
    data: i32,
}

impl PackedWaterModel {
    /// Packs a water block. The material always uses the biome water tint,
    /// never emits light and is neither opaque nor refractive, with the IoR
    /// of air.
    pub fn new(water: &WaterState, texture: &Texture, sink: &mut MaterialSink<'_>) -> Self {
        let surface = SurfaceProperties {
            emittance: 0.0,
            specular: water.specular,
            metalness: water.metalness,
            roughness: water.roughness,
            refractive: false,
            opaque: false,
            ior: AIR_IOR,
        };
        Self {
            material: sink.put(texture, Some(&Tint::WATER), &surface),
            data: water.data,
        }
    }

    /// Material palette index.
    #[must_use]
    pub const fn material(&self) -> u32 {
        self.material
    }
}

impl Packer for PackedWaterModel {
    fn word_len(&self) -> usize {
        WATER_DWORD_SIZE
    }

    fn pack_into(&self, out: &mut Vec<i32>) {
        out.push(self.material as i32);
        out.push(self.data);
    }
}
