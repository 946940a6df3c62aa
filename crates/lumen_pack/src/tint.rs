//! Block tint resolution.
//!
//! The packed tint word selects its source with the top byte:
//!
//! | top byte | meaning                         |
//! |----------|---------------------------------|
//! | `0x00`   | no tint                         |
//! | `0xFF`   | literal RGB in the low 24 bits  |
//! | `0x01`   | biome foliage color             |
//! | `0x02`   | biome grass color               |
//! | `0x03`   | biome water color               |

/// Packed tint word for "no tint".
pub const TINT_NONE: u32 = 0;
/// Top byte marking a literal RGB tint.
pub const TINT_CONSTANT: u32 = 0xFF << 24;
/// Biome foliage tint.
pub const TINT_FOLIAGE: u32 = 1 << 24;
/// Biome grass tint.
pub const TINT_GRASS: u32 = 2 << 24;
/// Biome water tint.
pub const TINT_WATER: u32 = 3 << 24;

/// Where a tint color comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TintKind {
    /// No modulation.
    None,
    /// A fixed linear RGB color.
    Constant([f32; 3]),
    /// Foliage color of the biome at the hit point.
    BiomeFoliage,
    /// Grass color of the biome at the hit point.
    BiomeGrass,
    /// Water color of the biome at the hit point.
    BiomeWater,
    /// A host tint kind this exporter cannot express (raw host code).
    Unsupported(u8),
}

/// A tint specification attached to a texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tint {
    /// Tint source.
    pub kind: TintKind,
}

impl Tint {
    /// No tint.
    pub const NONE: Self = Self { kind: TintKind::None };
    /// Biome foliage tint.
    pub const FOLIAGE: Self = Self { kind: TintKind::BiomeFoliage };
    /// Biome grass tint.
    pub const GRASS: Self = Self { kind: TintKind::BiomeGrass };
    /// Biome water tint.
    pub const WATER: Self = Self { kind: TintKind::BiomeWater };

    /// Constant RGB tint.
    #[must_use]
    pub const fn constant(rgb: [f32; 3]) -> Self {
        Self { kind: TintKind::Constant(rgb) }
    }
}

/// Converts linear `[0, 1]` RGB to `0x00RRGGBB`.
#[must_use]
pub fn rgb_word(rgb: [f32; 3]) -> u32 {
    let channel = |c: f32| ((c.clamp(0.0, 1.0) * 255.0 + 0.5) as u32) & 0xFF;
    (channel(rgb[0]) << 16) | (channel(rgb[1]) << 8) | channel(rgb[2])
}

/// Resolves a tint to its packed word.
///
/// Never fails: a missing tint or an unsupported kind packs as
/// [`TINT_NONE`], the latter with a warning.
#[must_use]
pub fn pack_tint(tint: Option<&Tint>) -> u32 {
    let Some(tint) = tint else {
        return TINT_NONE;
    };
    match tint.kind {
        TintKind::None => TINT_NONE,
        TintKind::Constant(rgb) => rgb_word(rgb) | TINT_CONSTANT,
        TintKind::BiomeFoliage => TINT_FOLIAGE,
        TintKind::BiomeGrass => TINT_GRASS,
        TintKind::BiomeWater => TINT_WATER,
        TintKind::Unsupported(code) => {
            tracing::warn!(code, "unsupported tint type, exporting without tint");
            TINT_NONE
        }
    }
}
