//! # Scene Loader
//!
//! Turns a host scene into published device buffers, once per detected
//! change.
//!
//! ## Load pass
//!
//! ```text
//! load(mod_count, reason, scene)
//!   |
//!   |- nothing changed?            -> Ok(false)
//!   |
//!   |- plan (CPU only)
//!   |    full reload: palettes, block mapping, BVH node arrays, octree remap
//!   |    always:      sky state, packed sun, emitter grid
//!   |
//!   |- stage (backend)              every new buffer, into a staging area
//!   |    failure                    -> staged buffers released, Err, old state kept
//!   |
//!   '- commit                       publish into slots / caches, each
//!                                   replacing (and releasing) its predecessor
//! ```
//!
//! A full reload happens on the first load, after [`SceneLoader::set_config`],
//! and whenever the reset reason demands it. Otherwise a changed modification
//! counter only refreshes the sky, the sun and the emitter grid.

use lumen_pack::{AtlasTextureLoader, Packer, PackedSky, PackedSun, SkyState};

use crate::backend::{ComputeBackend, Release};
use crate::cache::FunctionCache;
use crate::config::ExportConfig;
use crate::emitter::EmitterGridExport;
use crate::error::{BackendError, ExportResult};
use crate::packing::ScenePalettes;
use crate::remap::remap_octree;
use crate::scene::{ResetReason, SceneSnapshot};
use crate::slot::{BufferId, BufferSlot};

const WORLD_BVH_LABEL: &str = "world_bvh";
const ACTOR_BVH_LABEL: &str = "actor_bvh";
const SUN_LABEL: &str = "sun";

/// CPU-side results of the last full reload.
#[derive(Debug)]
struct CpuState {
    palettes: ScenePalettes,
    block_mapping: Vec<i32>,
}

/// Data computed by a full reload.
struct FullReload {
    palettes: ScenePalettes,
    block_mapping: Vec<i32>,
    world_bvh: Vec<i32>,
    actor_bvh: Vec<i32>,
}

/// Everything a load pass computed before touching the backend.
struct LoadPlan {
    full: Option<FullReload>,
    /// Atlas grown by a new sun texture during an incremental load.
    grown_textures: Option<AtlasTextureLoader>,
    /// Plain buffers to (re)create.
    uploads: Vec<(BufferId, Vec<i32>)>,
    /// New sky state, if the sky changed.
    sky_state: Option<SkyState>,
    sun: PackedSun,
}

/// Buffers created by a load pass but not yet published.
///
/// Whatever is still staged when this is dropped gets released.
struct Staging<R: Release> {
    slots: Vec<(BufferId, R)>,
    world_bvh: Option<(Vec<i32>, R)>,
    actor_bvh: Option<(Vec<i32>, R)>,
    sun: Option<(PackedSun, R)>,
}

impl<R: Release> Staging<R> {
    const fn new() -> Self {
        Self {
            slots: Vec::new(),
            world_bvh: None,
            actor_bvh: None,
            sun: None,
        }
    }
}

impl<R: Release> Drop for Staging<R> {
    fn drop(&mut self) {
        let mut released = 0usize;
        for (_, buffer) in self.slots.drain(..) {
            buffer.release();
            released += 1;
        }
        for (_, buffer) in [self.world_bvh.take(), self.actor_bvh.take()].into_iter().flatten() {
            buffer.release();
            released += 1;
        }
        if let Some((_, buffer)) = self.sun.take() {
            buffer.release();
            released += 1;
        }
        if released > 0 {
            tracing::debug!(released, "discarded staged buffers");
        }
    }
}

/// Exports a host scene and owns every buffer it publishes.
///
/// One instance lives for a whole render session. Buffer accessors panic
/// until the first successful [`SceneLoader::load`].
pub struct SceneLoader<B: ComputeBackend> {
    backend: B,
    config: ExportConfig,
    force_full: bool,
    mod_count: Option<u64>,
    cpu: Option<CpuState>,
    sky_state: Option<SkyState>,
    slots: [BufferSlot<B::Buffer>; BufferId::COUNT],
    world_bvh: FunctionCache<Vec<i32>, B::Buffer>,
    actor_bvh: FunctionCache<Vec<i32>, B::Buffer>,
    sun: FunctionCache<PackedSun, B::Buffer>,
}

impl<B: ComputeBackend> SceneLoader<B> {
    /// Creates a loader with the default configuration.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, ExportConfig::default())
    }

    /// Creates a loader.
    #[must_use]
    pub fn with_config(backend: B, config: ExportConfig) -> Self {
        Self {
            backend,
            config,
            force_full: false,
            mod_count: None,
            cpu: None,
            sky_state: None,
            slots: std::array::from_fn(|_| BufferSlot::new()),
            world_bvh: FunctionCache::new(),
            actor_bvh: FunctionCache::new(),
            sun: FunctionCache::new(),
        }
    }

    /// Loads the scene unless something was already loaded.
    ///
    /// Returns whether a load happened.
    ///
    /// # Errors
    ///
    /// See [`SceneLoader::load`].
    pub fn ensure_load(&mut self, scene: &dyn SceneSnapshot) -> ExportResult<bool> {
        if self.is_loaded() {
            return Ok(false);
        }
        self.load(self.mod_count.unwrap_or_default(), ResetReason::SceneLoaded, scene)
    }

    /// Runs one load pass if `mod_count` or `reset_reason` call for it.
    ///
    /// Returns `Ok(false)` when nothing changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to create a buffer. In that
    /// case every buffer created during this pass is released and all
    /// previously published buffers stay as they were. A failed full reload
    /// is repeated by the next load, whatever its reset reason.
    pub fn load(&mut self, mod_count: u64, reset_reason: ResetReason, scene: &dyn SceneSnapshot) -> ExportResult<bool> {
        let span = tracing::info_span!("scene_load", mod_count);
        let _guard = span.enter();

        let previous = match &self.cpu {
            Some(cpu) if !self.force_full && !reset_reason.forces_full_reload() => Some(cpu),
            _ => None,
        };
        if previous.is_some() && self.mod_count == Some(mod_count) {
            tracing::debug!(?reset_reason, "scene unchanged");
            return Ok(false);
        }

        let mut plan = plan_load(
            &mut self.backend,
            &self.config,
            previous,
            self.sky_state.as_ref(),
            scene,
        );
        let staging = match self.stage(&mut plan) {
            Ok(staging) => staging,
            Err(e) => {
                // The host sends a forcing reason once; the rebuild stays owed until it succeeds.
                if plan.full.is_some() {
                    self.force_full = true;
                }
                tracing::warn!(error = %e, "scene load failed, keeping published buffers");
                return Err(e.into());
            }
        };
        self.commit(plan, staging, mod_count);
        Ok(true)
    }

    /// Creates every buffer the plan needs without publishing any of them.
    fn stage(&mut self, plan: &mut LoadPlan) -> Result<Staging<B::Buffer>, BackendError> {
        let mut staging = Staging::new();
        let backend = &mut self.backend;

        if let Some(full) = &mut plan.full {
            let p = &full.palettes;
            staging.slots.push((BufferId::Textures, backend.upload_palette(p.textures.palette())?));
            staging.slots.push((BufferId::Blocks, backend.upload_palette(&p.blocks)?));
            staging.slots.push((BufferId::Materials, backend.upload_palette(&p.materials)?));
            staging.slots.push((BufferId::AabbModels, backend.upload_palette(&p.aabbs)?));
            staging.slots.push((BufferId::QuadModels, backend.upload_palette(&p.quads)?));
            staging.slots.push((BufferId::WaterModels, backend.upload_palette(&p.waters)?));
            staging.slots.push((BufferId::TriangleModels, backend.upload_palette(&p.triangles)?));

            if self.world_bvh.is_current(&full.world_bvh) {
                tracing::debug!("world BVH unchanged");
            } else {
                let buffer = backend.create_int_buffer(WORLD_BVH_LABEL, &full.world_bvh)?;
                staging.world_bvh = Some((std::mem::take(&mut full.world_bvh), buffer));
            }
            if self.actor_bvh.is_current(&full.actor_bvh) {
                tracing::debug!("actor BVH unchanged");
            } else {
                let buffer = backend.create_int_buffer(ACTOR_BVH_LABEL, &full.actor_bvh)?;
                staging.actor_bvh = Some((std::mem::take(&mut full.actor_bvh), buffer));
            }
        } else if let Some(textures) = &plan.grown_textures {
            staging.slots.push((BufferId::Textures, backend.upload_palette(textures.palette())?));
        }

        for (id, data) in &plan.uploads {
            staging.slots.push((*id, backend.create_int_buffer(id.label(), data)?));
        }

        if !self.sun.is_current(&plan.sun) {
            let buffer = backend.create_int_buffer(SUN_LABEL, &plan.sun.pack())?;
            staging.sun = Some((plan.sun, buffer));
        }
        Ok(staging)
    }

    /// Publishes staged buffers and adopts the plan's CPU state.
    fn commit(&mut self, plan: LoadPlan, mut staging: Staging<B::Buffer>, mod_count: u64) {
        for (id, buffer) in staging.slots.drain(..) {
            self.slots[id.index()].publish(buffer);
        }
        if let Some((key, buffer)) = staging.world_bvh.take() {
            self.world_bvh.install(key, buffer);
        }
        if let Some((key, buffer)) = staging.actor_bvh.take() {
            self.actor_bvh.install(key, buffer);
        }
        if let Some((key, buffer)) = staging.sun.take() {
            self.sun.install(key, buffer);
        }

        if let Some(full) = plan.full {
            full.palettes.log_sizes();
            self.cpu = Some(CpuState {
                palettes: full.palettes,
                block_mapping: full.block_mapping,
            });
            self.force_full = false;
        } else if let (Some(textures), Some(cpu)) = (plan.grown_textures, &mut self.cpu) {
            cpu.palettes.textures = textures;
        }
        if let Some(sky_state) = plan.sky_state {
            self.sky_state = Some(sky_state);
        }
        self.mod_count = Some(mod_count);
    }

    /// Releases every published buffer and forgets the loaded scene.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
        self.world_bvh.clear();
        self.actor_bvh.clear();
        self.sun.clear();
        self.cpu = None;
        self.sky_state = None;
        self.mod_count = None;
    }

    /// Returns true once a load pass succeeded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cpu.is_some()
    }

    /// Modification counter of the last successful load.
    #[must_use]
    pub const fn mod_count(&self) -> Option<u64> {
        self.mod_count
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Replaces the configuration. The next load is a full reload.
    pub fn set_config(&mut self, config: ExportConfig) {
        self.config = config;
        self.force_full = true;
    }

    /// The backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Native block index to packed block reference, from the last full reload.
    #[must_use]
    pub fn block_mapping(&self) -> Option<&[i32]> {
        self.cpu.as_ref().map(|cpu| cpu.block_mapping.as_slice())
    }

    /// Palettes of the last full reload.
    #[must_use]
    pub fn palettes(&self) -> Option<&ScenePalettes> {
        self.cpu.as_ref().map(|cpu| &cpu.palettes)
    }

    /// Sky state the published sky was built from.
    #[must_use]
    pub fn sky_state(&self) -> Option<&SkyState> {
        self.sky_state.as_ref()
    }

    /// A published slot buffer.
    ///
    /// # Panics
    ///
    /// Panics before the first successful load.
    #[must_use]
    pub fn buffer(&self, id: BufferId) -> &B::Buffer {
        self.slots[id.index()].expect_published(id.label())
    }

    /// Texture atlas.
    #[must_use]
    pub fn texture_palette(&self) -> &B::Buffer {
        self.buffer(BufferId::Textures)
    }

    /// Packed blocks.
    #[must_use]
    pub fn block_palette(&self) -> &B::Buffer {
        self.buffer(BufferId::Blocks)
    }

    /// Packed materials.
    #[must_use]
    pub fn material_palette(&self) -> &B::Buffer {
        self.buffer(BufferId::Materials)
    }

    /// AABB models.
    #[must_use]
    pub fn aabb_palette(&self) -> &B::Buffer {
        self.buffer(BufferId::AabbModels)
    }

    /// Quad models.
    #[must_use]
    pub fn quad_palette(&self) -> &B::Buffer {
        self.buffer(BufferId::QuadModels)
    }

    /// Water models.
    #[must_use]
    pub fn water_palette(&self) -> &B::Buffer {
        self.buffer(BufferId::WaterModels)
    }

    /// Triangle models.
    #[must_use]
    pub fn triangle_palette(&self) -> &B::Buffer {
        self.buffer(BufferId::TriangleModels)
    }

    /// Remapped world octree.
    #[must_use]
    pub fn octree_data(&self) -> &B::Buffer {
        self.buffer(BufferId::OctreeData)
    }

    /// World octree depth.
    #[must_use]
    pub fn octree_depth(&self) -> &B::Buffer {
        self.buffer(BufferId::OctreeDepth)
    }

    /// Remapped water octree.
    #[must_use]
    pub fn water_octree_data(&self) -> &B::Buffer {
        self.buffer(BufferId::WaterOctreeData)
    }

    /// Water octree depth.
    #[must_use]
    pub fn water_octree_depth(&self) -> &B::Buffer {
        self.buffer(BufferId::WaterOctreeDepth)
    }

    /// Packed sky.
    #[must_use]
    pub fn sky(&self) -> &B::Buffer {
        self.buffer(BufferId::Sky)
    }

    /// Emitter grid geometry.
    #[must_use]
    pub fn emitter_grid_meta(&self) -> &B::Buffer {
        self.buffer(BufferId::EmitterGridMeta)
    }

    /// Emitter grid cells.
    #[must_use]
    pub fn emitter_grid_cells(&self) -> &B::Buffer {
        self.buffer(BufferId::EmitterGridCells)
    }

    /// Emitter grid position indexes.
    #[must_use]
    pub fn emitter_grid_indexes(&self) -> &B::Buffer {
        self.buffer(BufferId::EmitterGridIndexes)
    }

    /// Emitter records.
    #[must_use]
    pub fn emitter_grid_emitters(&self) -> &B::Buffer {
        self.buffer(BufferId::EmitterGridEmitters)
    }

    /// World BVH nodes.
    ///
    /// # Panics
    ///
    /// Panics before the first successful load.
    #[must_use]
    pub fn world_bvh(&self) -> &B::Buffer {
        expect_cached(&self.world_bvh, WORLD_BVH_LABEL)
    }

    /// Actor BVH nodes.
    ///
    /// # Panics
    ///
    /// Panics before the first successful load.
    #[must_use]
    pub fn actor_bvh(&self) -> &B::Buffer {
        expect_cached(&self.actor_bvh, ACTOR_BVH_LABEL)
    }

    /// Packed sun.
    ///
    /// # Panics
    ///
    /// Panics before the first successful load.
    #[must_use]
    pub fn sun(&self) -> &B::Buffer {
        expect_cached(&self.sun, SUN_LABEL)
    }
}

impl<B: ComputeBackend + std::fmt::Debug> std::fmt::Debug for SceneLoader<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneLoader")
            .field("backend", &self.backend)
            .field("config", &self.config)
            .field("mod_count", &self.mod_count)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

fn expect_cached<'a, K: PartialEq, R: Release>(cache: &'a FunctionCache<K, R>, name: &str) -> &'a R {
    match cache.get() {
        Some(resource) => resource,
        None => panic!("{name} requested before the first successful scene load"),
    }
}

fn non_empty(data: Vec<i32>) -> Vec<i32> {
    if data.is_empty() {
        vec![0]
    } else {
        data
    }
}

/// CPU phase of a load pass. `previous` is `None` for a full reload.
fn plan_load<B: ComputeBackend>(
    backend: &mut B,
    config: &ExportConfig,
    previous: Option<&CpuState>,
    published_sky: Option<&SkyState>,
    scene: &dyn SceneSnapshot,
) -> LoadPlan {
    let mut uploads = Vec::new();

    let mut full = match previous {
        Some(_) => None,
        None => {
            let mut palettes = ScenePalettes::create(backend, config.material_options());
            let block_mapping = palettes.pack_blocks(scene.block_palette());
            let world_bvh = scene.world_bvh().map_or_else(|| vec![0], |bvh| palettes.pack_bvh(bvh));
            let actor_bvh = scene.actor_bvh().map_or_else(|| vec![0], |bvh| palettes.pack_bvh(bvh));
            tracing::debug!(blocks = block_mapping.len(), "palettes rebuilt");

            let world = scene.world_octree();
            uploads.push((BufferId::OctreeData, non_empty(remap_octree(world.data, &block_mapping))));
            uploads.push((BufferId::OctreeDepth, vec![world.depth]));

            let water = scene.water_octree().filter(|_| config.export_water_octree);
            let (water_data, water_depth) = match water {
                Some(water) => (non_empty(remap_octree(water.data, &block_mapping)), water.depth),
                None => (vec![0], 0),
            };
            uploads.push((BufferId::WaterOctreeData, water_data));
            uploads.push((BufferId::WaterOctreeDepth, vec![water_depth]));
            tracing::debug!(world_nodes = world.data.len(), "octrees remapped");

            Some(FullReload {
                palettes,
                block_mapping,
                world_bvh,
                actor_bvh,
            })
        }
    };

    // Sky and sun come before the emitter grid and before the atlas is uploaded.
    let sky_state = SkyState::new(scene.sky(), scene.sun());
    let sky_changed = published_sky != Some(&sky_state);
    if sky_changed {
        tracing::debug!("sky rebuilt");
        uploads.push((BufferId::Sky, PackedSky::new(&sky_state).pack()));
    } else {
        tracing::debug!("sky unchanged");
    }

    let mut grown_textures = None;
    let sun = match (&mut full, previous) {
        (Some(full), _) => PackedSun::new(scene.sun(), &mut full.palettes.textures),
        (None, Some(cpu)) => match cpu.palettes.textures.lookup(&scene.sun().texture) {
            Some(handle) => PackedSun::with_texture(scene.sun(), handle),
            None => {
                let mut textures = cpu.palettes.textures.clone();
                let sun = PackedSun::new(scene.sun(), &mut textures);
                grown_textures = Some(textures);
                sun
            }
        },
        (None, None) => PackedSun::new(scene.sun(), &mut AtlasTextureLoader::new()),
    };

    let mapping = match (&full, previous) {
        (Some(full), _) => Some(full.block_mapping.as_slice()),
        (None, Some(cpu)) => Some(cpu.block_mapping.as_slice()),
        (None, None) => None,
    };
    let grid = scene.emitter_grid().filter(|_| config.emitter_grid);
    let emitters = EmitterGridExport::from_scene(grid, mapping);
    tracing::debug!(
        emitter_words = emitters.emitters.len(),
        has_grid = grid.is_some(),
        "emitter grid rebuilt"
    );
    uploads.push((BufferId::EmitterGridMeta, emitters.meta.to_vec()));
    uploads.push((BufferId::EmitterGridCells, emitters.cells));
    uploads.push((BufferId::EmitterGridIndexes, emitters.indexes));
    uploads.push((BufferId::EmitterGridEmitters, emitters.emitters));

    LoadPlan {
        full,
        grown_textures,
        uploads,
        sky_state: sky_changed.then_some(sky_state),
        sun,
    }
}
