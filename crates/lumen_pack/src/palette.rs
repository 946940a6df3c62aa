//! Content-addressed resource palette.
//!
//! Repeated resources (materials, models, textures, blocks) are stored once
//! and referred to by a small dense index. The index is assigned in insertion
//! order, so walking the source scene in a stable order gives byte-identical
//! output across exports, which keeps downstream buffer caches warm.
//!
//! ```text
//! put(stone)  -> 0        entries: [stone]
//! put(glass)  -> 1        entries: [stone, glass]
//! put(stone)  -> 0        entries: [stone, glass]   (no growth)
//!
//! flatten()   -> [stone words..., glass words...]
//!                 ^ offset 0      ^ offset word_offset(1)
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::packer::Packer;

/// Which resource family a palette holds.
///
/// Used for buffer labels and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaletteKind {
    /// Packed blocks referenced by the octrees.
    Block,
    /// Packed materials.
    Material,
    /// Textured AABB models.
    AabbModel,
    /// Quad models.
    QuadModel,
    /// Water models.
    WaterModel,
    /// Triangle models referenced by the BVHs.
    TriangleModel,
    /// Texture atlas pixels.
    Texture,
}

impl PaletteKind {
    /// Stable label for buffers and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Block => "block_palette",
            Self::Material => "material_palette",
            Self::AabbModel => "aabb_model_palette",
            Self::QuadModel => "quad_model_palette",
            Self::WaterModel => "water_model_palette",
            Self::TriangleModel => "triangle_model_palette",
            Self::Texture => "texture_palette",
        }
    }
}

impl fmt::Display for PaletteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Deduplicating, insertion-ordered palette.
///
/// Equal values (by `Eq`, never identity) share one slot. There is no
/// removal: a palette lives for one export pass.
#[derive(Clone)]
pub struct ResourcePalette<T> {
    kind: PaletteKind,
    /// Entries in index order.
    entries: Vec<T>,
    /// Word offset of each entry in the flattened buffer.
    offsets: Vec<u32>,
    /// Reverse mapping for deduplication.
    lookup: HashMap<T, u32>,
    /// Total flattened length in words.
    words: usize,
}

impl<T> ResourcePalette<T>
where
    T: Packer + Eq + Hash + Clone,
{
    /// Creates an empty palette.
    #[must_use]
    pub fn new(kind: PaletteKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            offsets: Vec::new(),
            lookup: HashMap::new(),
            words: 0,
        }
    }

    /// Inserts `value` unless an equal value is already present.
    ///
    /// Returns the index of the stored value. A new value receives the
    /// current length as its index.
    ///
    /// # Panics
    ///
    /// Panics if the palette outgrows the 32-bit word space the kernel can address.
    pub fn put(&mut self, value: T) -> u32 {
        if let Some(&index) = self.lookup.get(&value) {
            return index;
        }

        let index = u32::try_from(self.entries.len()).expect("palette index overflow");
        let offset = u32::try_from(self.words).expect("palette word offset overflow");
        self.words += value.word_len();
        self.offsets.push(offset);
        self.lookup.insert(value.clone(), index);
        self.entries.push(value);
        index
    }

    /// Returns the index of an equal value, if stored.
    #[must_use]
    pub fn index_of(&self, value: &T) -> Option<u32> {
        self.lookup.get(value).copied()
    }

    /// Gets the entry at `index`.
    #[must_use]
    pub fn get(&self, index: u32) -> Option<&T> {
        self.entries.get(index as usize)
    }

    /// Word offset of entry `index` in the flattened buffer.
    #[must_use]
    pub fn word_offset(&self, index: u32) -> Option<u32> {
        self.offsets.get(index as usize).copied()
    }

    /// Number of distinct entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was inserted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total flattened length in words.
    #[must_use]
    pub fn word_len(&self) -> usize {
        self.words
    }

    /// Resource family of this palette.
    #[must_use]
    pub const fn kind(&self) -> PaletteKind {
        self.kind
    }

    /// Iterates entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// Flattens every entry in index order into one word buffer.
    ///
    /// An empty palette flattens to `[0]`: device buffers are never
    /// zero-length.
    #[must_use]
    pub fn flatten(&self) -> Vec<i32> {
        if self.words == 0 {
            return vec![0];
        }
        let mut out = Vec::with_capacity(self.words);
        for entry in &self.entries {
            entry.pack_into(&mut out);
        }
        debug_assert_eq!(out.len(), self.words, "{} packer lied about word_len", self.kind);
        out
    }
}

impl<T> fmt::Debug for ResourcePalette<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePalette")
            .field("kind", &self.kind)
            .field("entries", &self.entries.len())
            .field("words", &self.words)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Run(Vec<i32>);

    impl Packer for Run {
        fn word_len(&self) -> usize {
            self.0.len()
        }

        fn pack_into(&self, out: &mut Vec<i32>) {
            out.extend_from_slice(&self.0);
        }
    }

    #[test]
    fn test_palette_deduplication() {
        let mut palette = ResourcePalette::new(PaletteKind::Material);

        let a = palette.put(Run(vec![1, 2]));
        let b = palette.put(Run(vec![1, 2]));

        assert_eq!(a, b);
        assert_eq!(palette.len(), 1);
        assert_eq!(palette.word_len(), 2);
    }

    #[test]
    fn test_index_stability() {
        let mut palette = ResourcePalette::new(PaletteKind::QuadModel);
        let first = palette.put(Run(vec![7]));

        for i in 0..100 {
            palette.put(Run(vec![i, i + 1]));
        }

        assert_eq!(first, 0);
        assert_eq!(palette.get(first), Some(&Run(vec![7])));
        assert_eq!(palette.index_of(&Run(vec![7])), Some(0));
        assert_eq!(palette.put(Run(vec![7])), 0);
    }

    #[test]
    fn test_variable_length_offsets() {
        let mut palette = ResourcePalette::new(PaletteKind::AabbModel);
        palette.put(Run(vec![1]));
        let second = palette.put(Run(vec![2, 2, 2]));
        let third = palette.put(Run(vec![3, 3]));

        assert_eq!(palette.word_offset(second), Some(1));
        assert_eq!(palette.word_offset(third), Some(4));
        assert_eq!(palette.word_offset(3), None);

        let flat = palette.flatten();
        assert_eq!(flat, vec![1, 2, 2, 2, 3, 3]);
        assert_eq!(flat[palette.word_offset(third).unwrap() as usize], 3);
    }

    #[test]
    fn test_empty_palette_flattens_to_placeholder() {
        let palette: ResourcePalette<Run> = ResourcePalette::new(PaletteKind::WaterModel);
        assert!(palette.is_empty());
        assert_eq!(palette.flatten(), vec![0]);
    }

    #[test]
    fn test_kind_labels_are_distinct() {
        let kinds = [
            PaletteKind::Block,
            PaletteKind::Material,
            PaletteKind::AabbModel,
            PaletteKind::QuadModel,
            PaletteKind::WaterModel,
            PaletteKind::TriangleModel,
            PaletteKind::Texture,
        ];
        let labels: std::collections::HashSet<_> = kinds.iter().map(|k| k.label()).collect();
        assert_eq!(labels.len(), kinds.len());
    }
}
