//! The capability set a compute backend provides to the scene loader.
//!
//! The loader is generic over [`ComputeBackend`]. A backend turns packed
//! word arrays into device buffers and may customize how palettes and the
//! texture loader are created. Nothing else about the device leaks into the
//! export pipeline.

use std::hash::Hash;

use lumen_pack::{AtlasTextureLoader, Packer, PaletteKind, ResourcePalette};

use crate::error::BackendError;

/// A device resource that must be handed back explicitly.
///
/// `release` consumes the value, so a resource cannot be released twice.
pub trait Release {
    /// Frees the resource.
    fn release(self);
}

/// Buffer and palette factory for one compute backend.
pub trait ComputeBackend {
    /// Device-resident integer buffer.
    type Buffer: Release;

    /// Creates a read-only integer buffer holding `data`.
    ///
    /// `data` is never empty.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] if the device refuses the allocation. No
    /// resource is held on failure.
    fn create_int_buffer(&mut self, label: &str, data: &[i32]) -> Result<Self::Buffer, BackendError>;

    /// Creates an empty palette for one resource family.
    fn create_palette<T>(&mut self, kind: PaletteKind) -> ResourcePalette<T>
    where
        T: Packer + Eq + Hash + Clone,
    {
        ResourcePalette::new(kind)
    }

    /// Creates the texture loader materials register their textures with.
    fn create_texture_loader(&mut self) -> AtlasTextureLoader {
        AtlasTextureLoader::new()
    }

    /// Flattens a palette and uploads it under the palette's label.
    ///
    /// # Errors
    ///
    /// See [`ComputeBackend::create_int_buffer`].
    fn upload_palette<T>(&mut self, palette: &ResourcePalette<T>) -> Result<Self::Buffer, BackendError>
    where
        T: Packer + Eq + Hash + Clone,
    {
        self.create_int_buffer(palette.kind().label(), &palette.flatten())
    }
}
