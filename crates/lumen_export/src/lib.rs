//! # Lumen Export
//!
//! Incremental export of a host voxel scene into device buffers.
//!
//! ## Design Principles
//!
//! 1. **Rebuild only what changed** - palettes and octrees on full reloads, sky only when it moved, BVHs and sun memoized
//! 2. **All or nothing** - a load pass stages every buffer before publishing any
//! 3. **Release exactly once** - every published buffer lives in an owned slot or cache
//! 4. **Backend agnostic** - the loader is generic over [`ComputeBackend`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use lumen_export::{ExportConfig, HostBackend, ResetReason, SceneLoader};
//!
//! let config = ExportConfig::from_path("lumen.toml")?;
//! let mut loader = SceneLoader::with_config(HostBackend::new(), config);
//!
//! // Once per frame; cheap when nothing changed.
//! if loader.load(scene.mod_count(), ResetReason::None, &scene)? {
//!     kernel.bind_octree(loader.octree_data(), loader.octree_depth());
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod backend;
pub mod cache;
pub mod config;
pub mod emitter;
pub mod error;
pub mod host;
pub mod loader;
pub mod packing;
pub mod remap;
pub mod scene;
pub mod slot;

pub use backend::{ComputeBackend, Release};
pub use cache::FunctionCache;
pub use config::ExportConfig;
pub use emitter::EmitterGridExport;
pub use error::{BackendError, ExportError, ExportResult};
pub use host::{HostBackend, HostBuffer, HostStats};
pub use loader::SceneLoader;
pub use packing::ScenePalettes;
pub use remap::remap_octree;
pub use scene::{
    BlockModel, BvhSource, EmitterGridSource, EmitterPosition, OctreeView, ResetReason, SceneBlock, SceneSnapshot,
};
pub use slot::{BufferId, BufferSlot};
