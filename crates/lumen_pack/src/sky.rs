//! Sky state and its packed form.
//!
//! [`SkyState`] is compared by value between loads: the sky is only rebuilt
//! when the sky model or the sun direction actually changed.
//!
//! ## Layout (9 words)
//!
//! `model, horizon_offset, intensity, r, g, b, sun_altitude, sun_azimuth,
//! flags` with flag bit 0 = mirrored. Floats are stored as bit patterns.

use crate::packer::{float_word, Packer};
use crate::sun::SunState;

/// Size of the packed sky in 32-bit words.
pub const SKY_DWORD_SIZE: usize = 9;

/// Flag: mirror the sky below the horizon.
pub const SKY_FLAG_MIRRORED: u32 = 1;

/// Sky rendering model.
#[repr(i32)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SkyModel {
    /// Physically simulated sky driven by the sun direction.
    #[default]
    Simulated = 0,
    /// Vertical color gradient.
    Gradient = 1,
    /// Single solid color.
    SolidColor = 2,
    /// Black sky.
    Black = 3,
}

/// Host sky settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SkySettings {
    /// Rendering model.
    pub model: SkyModel,
    /// Horizon offset.
    pub horizon_offset: f32,
    /// Sky light intensity.
    pub intensity: f32,
    /// Linear RGB color for the solid and gradient models.
    pub color: [f32; 3],
    /// Mirror below the horizon.
    pub mirrored: bool,
}

impl Default for SkySettings {
    fn default() -> Self {
        Self {
            model: SkyModel::Simulated,
            horizon_offset: 0.1,
            intensity: 1.0,
            color: [1.0, 1.0, 1.0],
            mirrored: true,
        }
    }
}

/// Everything the sky depends on: its settings and the sun direction.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyState {
    /// Sky settings.
    pub settings: SkySettings,
    /// Sun altitude in radians.
    pub sun_altitude: f32,
    /// Sun azimuth in radians.
    pub sun_azimuth: f32,
}

impl SkyState {
    /// Captures the sky-relevant parts of a scene.
    #[must_use]
    pub fn new(settings: &SkySettings, sun: &SunState) -> Self {
        Self {
            settings: settings.clone(),
            sun_altitude: sun.altitude,
            sun_azimuth: sun.azimuth,
        }
    }
}

/// Packed sky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedSky {
    words: [i32; SKY_DWORD_SIZE],
}

impl PackedSky {
    /// Packs a sky state.
    #[must_use]
    pub fn new(state: &SkyState) -> Self {
        let s = &state.settings;
        Self {
            words: [
                s.model as i32,
                float_word(s.horizon_offset),
                float_word(s.intensity),
                float_word(s.color[0]),
                float_word(s.color[1]),
                float_word(s.color[2]),
                float_word(state.sun_altitude),
                float_word(state.sun_azimuth),
                if s.mirrored { SKY_FLAG_MIRRORED as i32 } else { 0 },
            ],
        }
    }
}

impl Packer for PackedSky {
    fn word_len(&self) -> usize {
        SKY_DWORD_SIZE
    }

    fn pack_into(&self, out: &mut Vec<i32>) {
        out.extend_from_slice(&self.words);
    }
}
