//! Texture references.
//!
//! Decoding images is the host's job. This module only deduplicates
//! already-decoded pixel data and hands out 64-bit handles the kernel uses
//! to find a texture inside the flattened texture buffer.

use std::sync::Arc;

use crate::packer::Packer;
use crate::palette::{PaletteKind, ResourcePalette};

/// Decoded texture, ARGB8888 per pixel.
///
/// Equality and hashing compare pixel content, so two loads of the same
/// image deduplicate even when they are separate allocations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Texture {
    width: u16,
    height: u16,
    pixels: Arc<[u32]>,
}

impl Texture {
    /// Creates a texture from row-major ARGB pixels.
    ///
    /// # Panics
    ///
    /// Panics if `pixels.len() != width * height`.
    #[must_use]
    pub fn new(width: u16, height: u16, pixels: impl Into<Arc<[u32]>>) -> Self {
        let pixels = pixels.into();
        assert_eq!(
            pixels.len(),
            usize::from(width) * usize::from(height),
            "texture pixel count does not match {width}x{height}"
        );
        Self { width, height, pixels }
    }

    /// Creates a 1x1 texture.
    #[must_use]
    pub fn solid(argb: u32) -> Self {
        Self::new(1, 1, vec![argb])
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Raw ARGB pixels.
    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Average ARGB color of all pixels, per channel.
    #[must_use]
    pub fn average_color(&self) -> u32 {
        if self.pixels.is_empty() {
            return 0;
        }
        let mut sums = [0u64; 4];
        for &p in self.pixels.iter() {
            sums[0] += u64::from(p >> 24);
            sums[1] += u64::from((p >> 16) & 0xFF);
            sums[2] += u64::from((p >> 8) & 0xFF);
            sums[3] += u64::from(p & 0xFF);
        }
        let n = self.pixels.len() as u64;
        let [a, r, g, b] = sums.map(|s| (s / n) as u32);
        (a << 24) | (r << 16) | (g << 8) | b
    }
}

impl Packer for Texture {
    fn word_len(&self) -> usize {
        self.pixels.len()
    }

    fn pack_into(&self, out: &mut Vec<i32>) {
        out.extend_from_slice(bytemuck::cast_slice::<u32, i32>(&self.pixels));
    }
}

/// Opaque 64-bit texture reference stored in packed materials.
///
/// Layout: high 32 bits = word offset of the first pixel in the texture
/// buffer, bits 16..32 = width, bits 0..16 = height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

impl TextureHandle {
    /// Builds a handle from its parts.
    #[must_use]
    pub const fn new(word_offset: u32, width: u16, height: u16) -> Self {
        Self(((word_offset as u64) << 32) | ((width as u64) << 16) | height as u64)
    }

    /// Word offset into the texture buffer.
    #[must_use]
    pub const fn word_offset(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Texture width.
    #[must_use]
    pub const fn width(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Texture height.
    #[must_use]
    pub const fn height(self) -> u16 {
        self.0 as u16
    }
}

/// Resolves textures to handles the kernel understands.
pub trait TextureLoader {
    /// Registers `texture` (if new) and returns its handle.
    fn reference(&mut self, texture: &Texture) -> TextureHandle;
}

/// Texture loader that packs every distinct texture into one flat buffer.
#[derive(Debug, Clone)]
pub struct AtlasTextureLoader {
    palette: ResourcePalette<Texture>,
}

impl AtlasTextureLoader {
    /// Creates an empty atlas.
    #[must_use]
    pub fn new() -> Self {
        Self {
            palette: ResourcePalette::new(PaletteKind::Texture),
        }
    }

    /// Handle of an already registered texture.
    #[must_use]
    pub fn lookup(&self, texture: &Texture) -> Option<TextureHandle> {
        let index = self.palette.index_of(texture)?;
        let offset = self.palette.word_offset(index)?;
        Some(TextureHandle::new(offset, texture.width(), texture.height()))
    }

    /// The underlying palette, flattened for upload.
    #[must_use]
    pub fn palette(&self) -> &ResourcePalette<Texture> {
        &self.palette
    }
}

impl Default for AtlasTextureLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureLoader for AtlasTextureLoader {
    fn reference(&mut self, texture: &Texture) -> TextureHandle {
        let index = self.palette.put(texture.clone());
        let offset = self.palette.word_offset(index).unwrap_or_default();
        TextureHandle::new(offset, texture.width(), texture.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_color() {
        let tex = Texture::new(2, 1, vec![0xFF00_0000, 0xFFFF_FFFF]);
        assert_eq!(tex.average_color(), 0xFF7F_7F7F);
    }

    #[test]
    fn test_handle_round_trip_fields() {
        let handle = TextureHandle::new(1234, 16, 32);
        assert_eq!(handle.word_offset(), 1234);
        assert_eq!(handle.width(), 16);
        assert_eq!(handle.height(), 32);
    }

    #[test]
    fn test_atlas_deduplicates_by_content() {
        let mut atlas = AtlasTextureLoader::new();
        let stone = Texture::new(2, 2, vec![1, 2, 3, 4]);
        let dirt = Texture::new(1, 1, vec![9]);

        let h1 = atlas.reference(&stone);
        let h2 = atlas.reference(&dirt);
        let h3 = atlas.reference(&Texture::new(2, 2, vec![1, 2, 3, 4]));

        assert_eq!(h1, h3);
        assert_eq!(atlas.lookup(&dirt), Some(h2));
        assert_eq!(atlas.lookup(&Texture::solid(0)), None);
        assert_eq!(h2.word_offset(), 4);
        assert_eq!(atlas.palette().len(), 2);
        assert_eq!(atlas.palette().flatten(), vec![1, 2, 3, 4, 9]);
    }

    #[test]
    #[should_panic(expected = "texture pixel count")]
    fn test_size_mismatch_panics() {
        let _ = Texture::new(2, 2, vec![0]);
    }
}
