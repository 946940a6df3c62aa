//! # Lumen Pack
//!
//! Binary encodings and content-addressed palettes for exporting a voxel
//! scene to a compute kernel.
//!
//! ## Design Principles
//!
//! 1. **Fixed layouts** - every packed type documents its word layout; new fields are appended
//! 2. **Store once** - repeated resources go through a [`ResourcePalette`] and are referenced by index
//! 3. **Bit-exact floats** - floats are stored with `f32::to_bits`, never formatted
//! 4. **No GPU code** - this crate only produces `i32` words
//!
//! ## Example
//!
//! ```rust,ignore
//! use lumen_pack::{AtlasTextureLoader, MaterialOptions, PackedMaterial, PaletteKind,
//!     ResourcePalette, SurfaceProperties, Texture};
//!
//! let mut textures = AtlasTextureLoader::new();
//! let mut materials = ResourcePalette::new(PaletteKind::Material);
//!
//! let stone = PackedMaterial::new(&texture, 0, &SurfaceProperties::OPAQUE,
//!     MaterialOptions::default(), &mut textures);
//! let index = materials.put(stone);
//! let words = materials.flatten();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod block;
pub mod material;
pub mod models;
pub mod packer;
pub mod palette;
pub mod sky;
pub mod sun;
pub mod texture;
pub mod tint;

pub use block::{ModelType, PackedBlock, ANY_TYPE, BLOCK_DWORD_SIZE};
pub use material::{MaterialOptions, PackedMaterial, SurfaceProperties, AIR_IOR, MATERIAL_DWORD_SIZE};
pub use models::{
    AabbFace, MaterialSink, PackedAabbModel, PackedQuadModel, PackedTriangleModel, PackedWaterModel,
    TexturedAabb, TexturedQuad, TexturedTriangle, WaterState, AABB_DWORD_SIZE, QUAD_DWORD_SIZE, TRIANGLE_DWORD_SIZE,
    WATER_DWORD_SIZE,
};
pub use packer::Packer;
pub use palette::{PaletteKind, ResourcePalette};
pub use sky::{PackedSky, SkyModel, SkySettings, SkyState};
pub use sun::{PackedSun, SunState};
pub use texture::{AtlasTextureLoader, Texture, TextureHandle, TextureLoader};
pub use tint::{pack_tint, Tint, TintKind};
