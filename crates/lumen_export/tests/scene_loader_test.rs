//! Integration tests for the scene loader against the host backend.

use lumen_export::{
    BackendError, BlockModel, BufferId, BvhSource, EmitterGridSource, EmitterPosition, ExportConfig, ExportError,
    HostBackend, OctreeView, ResetReason, SceneBlock, SceneLoader, SceneSnapshot,
};
use lumen_pack::{
    SkySettings, SunState, SurfaceProperties, Texture, TexturedTriangle, WaterState, AIR_IOR, MATERIAL_DWORD_SIZE,
    TRIANGLE_DWORD_SIZE,
};

// ============================================================================
// TEST SCENE
// ============================================================================

struct TestGrid {
    positions: Vec<EmitterPosition>,
}

impl EmitterGridSource for TestGrid {
    fn cell_size(&self) -> i32 {
        16
    }

    fn offset(&self) -> [i32; 3] {
        [0, -4, 0]
    }

    fn size(&self) -> [i32; 3] {
        [2, 2, 2]
    }

    fn constructed_grid(&self) -> &[i32] {
        &[0, 2]
    }

    fn position_indexes(&self) -> &[i32] {
        &[0, 1]
    }

    fn emitter_positions(&self) -> &[EmitterPosition] {
        &self.positions
    }
}

struct TestBvh {
    triangles: Vec<TexturedTriangle>,
}

impl BvhSource for TestBvh {
    fn triangles(&self) -> &[TexturedTriangle] {
        &self.triangles
    }

    fn pack_nodes(&self, triangle_offsets: &[u32]) -> Vec<i32> {
        let mut nodes = vec![-(triangle_offsets.len() as i32)];
        nodes.extend(triangle_offsets.iter().map(|&o| o as i32));
        nodes
    }
}

struct TestScene {
    sky: SkySettings,
    sun: SunState,
    blocks: Vec<SceneBlock>,
    octree: Vec<i32>,
    water: Option<Vec<i32>>,
    grid: Option<TestGrid>,
    world_bvh: Option<TestBvh>,
}

impl SceneSnapshot for TestScene {
    fn sky(&self) -> &SkySettings {
        &self.sky
    }

    fn sun(&self) -> &SunState {
        &self.sun
    }

    fn block_palette(&self) -> &[SceneBlock] {
        &self.blocks
    }

    fn world_octree(&self) -> OctreeView<'_> {
        OctreeView {
            data: &self.octree,
            depth: 4,
        }
    }

    fn water_octree(&self) -> Option<OctreeView<'_>> {
        self.water.as_deref().map(|data| OctreeView { data, depth: 2 })
    }

    fn emitter_grid(&self) -> Option<&dyn EmitterGridSource> {
        self.grid.as_ref().map(|g| g as &dyn EmitterGridSource)
    }

    fn world_bvh(&self) -> Option<&dyn BvhSource> {
        self.world_bvh.as_ref().map(|b| b as &dyn BvhSource)
    }
}

fn cube(name: &str, argb: u32, surface: SurfaceProperties) -> SceneBlock {
    SceneBlock {
        name: name.to_string(),
        model: BlockModel::Cube {
            texture: Texture::solid(argb),
            tint: None,
        },
        surface,
    }
}

fn stone_surface() -> SurfaceProperties {
    SurfaceProperties {
        emittance: 0.5,
        specular: 0.2,
        metalness: 0.0,
        roughness: 1.0,
        refractive: false,
        opaque: true,
        ior: 1.0,
    }
}

fn scene() -> TestScene {
    let lamp = SurfaceProperties {
        emittance: 1.0,
        ..SurfaceProperties::OPAQUE
    };
    let water = SceneBlock {
        name: "water".to_string(),
        model: BlockModel::Water {
            state: WaterState {
                data: 0x10,
                specular: 0.12,
                metalness: 0.0,
                roughness: 0.0,
            },
            texture: Texture::solid(0x8020_40FF),
        },
        surface: SurfaceProperties::TRANSLUCENT,
    };

    TestScene {
        sky: SkySettings::default(),
        sun: SunState::default(),
        blocks: vec![
            SceneBlock::air(),
            cube("stone", 0xFF80_8080, stone_surface()),
            cube("lamp", 0xFFFF_EE88, lamp),
            water,
        ],
        octree: vec![1, 0, -1, -2, -3, 0, -1, -9],
        water: Some(vec![0, -3]),
        grid: Some(TestGrid {
            positions: vec![
                EmitterPosition { x: 1, y: 2, z: 3, block: 2 },
                EmitterPosition { x: 4, y: 5, z: 6, block: 99 },
            ],
        }),
        world_bvh: None,
    }
}

fn loaded() -> (SceneLoader<HostBackend>, TestScene) {
    let scene = scene();
    let mut loader = SceneLoader::new(HostBackend::new());
    assert!(loader.load(1, ResetReason::None, &scene).unwrap());
    (loader, scene)
}

// ============================================================================
// FIRST LOAD
// ============================================================================

#[test]
fn test_first_load_publishes_every_buffer() {
    let (loader, _) = loaded();

    for id in BufferId::ALL {
        assert!(!loader.buffer(id).data().is_empty(), "{id} is empty");
    }
    assert_eq!(loader.world_bvh().data(), &[0]);
    assert_eq!(loader.actor_bvh().data(), &[0]);
    assert_eq!(loader.sun().data().len(), 11);
    assert_eq!(loader.sky().data().len(), 9);
    assert_eq!(loader.backend().stats().created, 19);
}

#[test]
fn test_octree_is_remapped_to_packed_references() {
    let (loader, _) = loaded();

    assert_eq!(loader.block_mapping(), Some(&[0, 2, 4, 6][..]));
    assert_eq!(loader.octree_data().data(), &[1, 0, -2, -4, -6, 0, -2, -9]);
    assert_eq!(loader.octree_depth().data(), &[4]);
    assert_eq!(loader.water_octree_data().data(), &[0, -6]);
    assert_eq!(loader.water_octree_depth().data(), &[2]);

    let blocks = loader.block_palette().data();
    assert_eq!(&blocks[0..2], &[0, 0]);
    assert_eq!(&blocks[6..8], &[5, 0]);
}

#[test]
fn test_material_words_end_to_end() {
    let (loader, _) = loaded();

    let materials = loader.material_palette().data();
    let stone = &materials[MATERIAL_DWORD_SIZE..2 * MATERIAL_DWORD_SIZE];

    assert_eq!(stone[0] & 0b1_0000, 0b1_0000, "opaque");
    assert_eq!(stone[0] & 0b0_1000, 0, "not refractive");
    assert_eq!(stone[4], 127);
    assert_eq!(stone[5] & 0xFF, 51);
    assert_eq!((stone[5] >> 8) & 0xFF, 0);
    assert_eq!((stone[5] >> 16) & 0xFF, 255);
    assert_eq!(stone[6], 1.0f32.to_bits() as i32);
}

#[test]
fn test_water_material_keeps_air_ior() {
    let (loader, _) = loaded();

    let materials = loader.material_palette().data();
    let water = &materials[3 * MATERIAL_DWORD_SIZE..4 * MATERIAL_DWORD_SIZE];

    assert_eq!(water[0] & 0b1_1000, 0, "neither opaque nor refractive");
    assert_eq!(water[1] as u32 >> 24, 0x03, "biome water tint");
    assert_eq!(water[4], 0);
    assert_eq!(water[6] as u32, AIR_IOR.to_bits());
    assert_eq!(&loader.water_palette().data()[..2], &[3, 0x10]);
}

#[test]
fn test_emitters_resolve_through_block_mapping() {
    let (loader, _) = loaded();

    assert_eq!(loader.emitter_grid_meta().data(), &[16, 0, 2, -4, 2, 0, 2]);
    assert_eq!(loader.emitter_grid_cells().data(), &[0, 2]);
    assert_eq!(loader.emitter_grid_indexes().data(), &[0, 1]);
    assert_eq!(loader.emitter_grid_emitters().data(), &[1, 2, 3, 4, 4, 5, 6, 0]);
}

#[test]
fn test_missing_grid_publishes_placeholders() {
    let mut scene = scene();
    scene.grid = None;
    let mut loader = SceneLoader::new(HostBackend::new());
    loader.load(1, ResetReason::None, &scene).unwrap();

    assert_eq!(loader.emitter_grid_meta().data().len(), 7);
    assert_eq!(loader.emitter_grid_cells().data().len(), 2);
    assert_eq!(loader.emitter_grid_indexes().data().len(), 1);
    assert_eq!(loader.emitter_grid_emitters().data().len(), 4);
}

#[test]
fn test_config_disables_water_and_grid() {
    let config = ExportConfig {
        export_water_octree: false,
        emitter_grid: false,
        ..ExportConfig::default()
    };
    let mut loader = SceneLoader::with_config(HostBackend::new(), config);
    loader.load(1, ResetReason::None, &scene()).unwrap();

    assert_eq!(loader.water_octree_data().data(), &[0]);
    assert_eq!(loader.water_octree_depth().data(), &[0]);
    assert_eq!(loader.emitter_grid_emitters().data(), &[0, 0, 0, 0]);
}

#[test]
fn test_bvh_nodes_reference_triangle_offsets() {
    let triangle = |x: f32| TexturedTriangle {
        vertices: [[x, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        uv: [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
        texture: Texture::solid(0xFF00_FF00),
        tint: None,
        surface: SurfaceProperties::OPAQUE,
        double_sided: true,
    };
    let mut scene = scene();
    scene.world_bvh = Some(TestBvh {
        triangles: vec![triangle(0.0), triangle(2.0)],
    });
    let mut loader = SceneLoader::new(HostBackend::new());
    loader.load(1, ResetReason::None, &scene).unwrap();

    assert_eq!(loader.world_bvh().data(), &[-2, 0, TRIANGLE_DWORD_SIZE as i32]);
    assert_eq!(loader.triangle_palette().data().len(), 2 * TRIANGLE_DWORD_SIZE);
}

#[test]
#[should_panic(expected = "octree_data requested before the first successful scene load")]
fn test_accessor_before_load_panics() {
    let loader = SceneLoader::new(HostBackend::new());
    let _ = loader.octree_data();
}

#[test]
#[should_panic(expected = "sun requested before")]
fn test_cached_accessor_before_load_panics() {
    let loader = SceneLoader::new(HostBackend::new());
    let _ = loader.sun();
}

// ============================================================================
// INCREMENTAL LOADS
// ============================================================================

#[test]
fn test_unchanged_counter_does_nothing() {
    let (mut loader, scene) = loaded();
    let before = loader.backend().stats();

    assert!(!loader.load(1, ResetReason::None, &scene).unwrap());
    assert!(!loader.load(1, ResetReason::SettingsChanged, &scene).unwrap());
    assert!(!loader.ensure_load(&scene).unwrap());
    assert_eq!(loader.backend().stats(), before);
}

#[test]
fn test_counter_change_only_rebuilds_emitter_grid() {
    let (mut loader, scene) = loaded();
    let octree_id = loader.octree_data().id();
    let sky_id = loader.sky().id();
    let sun_id = loader.sun().id();
    let before = loader.backend().stats();

    assert!(loader.load(2, ResetReason::None, &scene).unwrap());

    let after = loader.backend().stats();
    assert_eq!(after.created - before.created, 4);
    assert_eq!(after.released - before.released, 4);
    assert_eq!(after.live, before.live);
    assert_eq!(loader.octree_data().id(), octree_id);
    assert_eq!(loader.sky().id(), sky_id);
    assert_eq!(loader.sun().id(), sun_id);
    assert_eq!(loader.mod_count(), Some(2));
}

#[test]
fn test_sun_move_rebuilds_sky_and_sun() {
    let (mut loader, mut scene) = loaded();
    let before = loader.backend().stats();

    scene.sun.azimuth += 0.5;
    loader.load(2, ResetReason::None, &scene).unwrap();

    let after = loader.backend().stats();
    assert_eq!(after.created - before.created, 6);
    assert_eq!(after.released - before.released, 6);
    assert_eq!(loader.sky_state().map(|s| s.sun_azimuth), Some(scene.sun.azimuth));
}

#[test]
fn test_sun_intensity_rebuilds_sun_but_not_sky() {
    let (mut loader, mut scene) = loaded();
    let sky_id = loader.sky().id();
    let sun_id = loader.sun().id();

    scene.sun.intensity = 3.0;
    loader.load(2, ResetReason::None, &scene).unwrap();

    assert_eq!(loader.sky().id(), sky_id);
    assert_ne!(loader.sun().id(), sun_id);
}

#[test]
fn test_new_sun_texture_grows_atlas() {
    let (mut loader, mut scene) = loaded();
    let atlas_words = loader.texture_palette().data().len();

    scene.sun.texture = Texture::new(2, 2, vec![7, 7, 7, 7]);
    loader.load(2, ResetReason::None, &scene).unwrap();

    assert_eq!(loader.texture_palette().data().len(), atlas_words + 4);
    let sun = loader.sun().data();
    assert_eq!(sun[1] as usize, atlas_words);
    assert_eq!(sun[2], (2 << 16) | 2);
    assert_eq!(loader.palettes().map(|p| p.textures.palette().word_len()), Some(atlas_words + 4));
}

#[test]
fn test_materials_changed_forces_full_reload() {
    let (mut loader, mut scene) = loaded();
    let before = loader.backend().stats();

    scene.blocks[1] = cube("granite", 0xFF99_6655, SurfaceProperties::OPAQUE);
    assert!(loader.load(1, ResetReason::MaterialsChanged, &scene).unwrap());

    let after = loader.backend().stats();
    // 7 palettes, 4 octree buffers, 4 emitter buffers; BVHs, sky and sun unchanged
    assert_eq!(after.created - before.created, 15);
    assert_eq!(after.released - before.released, 15);
    assert_eq!(after.live, before.live);
}

#[test]
fn test_set_config_forces_full_reload() {
    let (mut loader, scene) = loaded();
    let materials_id = loader.material_palette().id();

    loader.set_config(ExportConfig {
        single_color_textures: true,
        ..ExportConfig::default()
    });
    assert!(loader.load(1, ResetReason::None, &scene).unwrap());

    assert_ne!(loader.material_palette().id(), materials_id);
    let stone = &loader.material_palette().data()[MATERIAL_DWORD_SIZE..2 * MATERIAL_DWORD_SIZE];
    assert_eq!(stone[0] & 1, 0, "opaque texture averaged");
    assert_eq!(stone[3] as u32, 0xFF80_8080);
}

// ============================================================================
// FAILURES AND TEARDOWN
// ============================================================================

#[test]
fn test_failed_load_keeps_published_state() {
    let (mut loader, mut scene) = loaded();
    let before = loader.backend().stats();
    let octree_before = loader.octree_data().data().to_vec();

    scene.octree = vec![-3, -3];
    loader.backend_mut().fail_on("octree_data");
    let err = loader.load(2, ResetReason::SceneLoaded, &scene).unwrap_err();

    assert!(matches!(err, ExportError::Backend(BackendError::Allocation { .. })));
    let after = loader.backend().stats();
    assert_eq!(after.created - before.created, 7, "palettes were staged");
    assert_eq!(after.released - before.released, 7, "staged palettes were discarded");
    assert_eq!(after.live, before.live);
    assert_eq!(loader.octree_data().data(), octree_before.as_slice());
    assert_eq!(loader.mod_count(), Some(1));

    loader.backend_mut().clear_failures();
    assert!(loader.load(2, ResetReason::SceneLoaded, &scene).unwrap());
    assert_eq!(loader.octree_data().data(), &[-6, -6]);
}

#[test]
fn test_failed_forced_reload_is_owed_to_next_load() {
    let (mut loader, mut scene) = loaded();
    let materials_before = loader.material_palette().data().to_vec();

    scene.blocks[1] = cube("granite", 0xFF99_6655, SurfaceProperties::OPAQUE);
    loader.backend_mut().fail_on("octree_data");
    assert!(loader.load(2, ResetReason::MaterialsChanged, &scene).is_err());
    assert_eq!(loader.material_palette().data(), materials_before.as_slice());

    // The host does not repeat the reason on the following frame.
    loader.backend_mut().clear_failures();
    let before = loader.backend().stats();
    assert!(loader.load(3, ResetReason::None, &scene).unwrap());

    let after = loader.backend().stats();
    assert_eq!(after.created - before.created, 15, "full reload");
    assert_ne!(loader.material_palette().data(), materials_before.as_slice());
    assert_eq!(loader.mod_count(), Some(3));

    // Once the rebuild succeeded, an unchanged counter is a no-op again.
    assert!(!loader.load(3, ResetReason::None, &scene).unwrap());
}

#[test]
fn test_failed_first_load_leaves_loader_unloaded() {
    let mut backend = HostBackend::new();
    backend.fail_on("emitter_grid_cells");
    let mut loader = SceneLoader::new(backend);

    assert!(loader.load(1, ResetReason::None, &scene()).is_err());
    assert!(!loader.is_loaded());
    assert_eq!(loader.backend().stats().live, 0);
}

#[test]
fn test_size_limit_surfaces_as_error() {
    let mut loader = SceneLoader::new(HostBackend::new().with_max_words(4));
    let err = loader.load(1, ResetReason::None, &scene()).unwrap_err();

    assert!(matches!(err, ExportError::Backend(BackendError::TooLarge { .. })));
    assert_eq!(loader.backend().stats().live, 0);
}

#[test]
fn test_clear_and_drop_release_everything() {
    let (mut loader, scene) = loaded();
    loader.clear();
    assert_eq!(loader.backend().stats().live, 0);
    assert!(!loader.is_loaded());

    assert!(loader.ensure_load(&scene).unwrap());
    let stats = loader.backend().stats_handle();
    assert!(stats.lock().live > 0);

    drop(loader);
    let stats = stats.lock();
    assert_eq!(stats.live, 0);
    assert_eq!(stats.live_words, 0);
    assert_eq!(stats.created, stats.released);
}
