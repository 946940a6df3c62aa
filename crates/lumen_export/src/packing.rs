//! Palette population.
//!
//! One walk over the host's native block palette fills every resource
//! palette and yields the block mapping used to remap octrees and emitter
//! records. The walk visits blocks in native order, so identical scenes
//! always produce identical buffers.

use lumen_pack::{
    AtlasTextureLoader, MaterialOptions, MaterialSink, ModelType, PackedAabbModel, PackedBlock, PackedMaterial,
    PackedQuadModel, PackedTriangleModel, PackedWaterModel, PaletteKind, ResourcePalette, BLOCK_DWORD_SIZE,
};

use crate::backend::ComputeBackend;
use crate::scene::{BlockModel, BvhSource, SceneBlock};

/// Every palette one full export fills.
#[derive(Debug, Clone)]
pub struct ScenePalettes {
    /// Texture atlas.
    pub textures: AtlasTextureLoader,
    /// Packed blocks. Entry 0 is air.
    pub blocks: ResourcePalette<PackedBlock>,
    /// Packed materials. Entry 0 is air.
    pub materials: ResourcePalette<PackedMaterial>,
    /// AABB models.
    pub aabbs: ResourcePalette<PackedAabbModel>,
    /// Quad models.
    pub quads: ResourcePalette<PackedQuadModel>,
    /// Water models.
    pub waters: ResourcePalette<PackedWaterModel>,
    /// Triangles referenced by the BVHs.
    pub triangles: ResourcePalette<PackedTriangleModel>,
    options: MaterialOptions,
}

impl ScenePalettes {
    /// Creates empty palettes through the backend's factory hooks and seeds
    /// air at index 0 of the block and material palettes.
    pub fn create<B: ComputeBackend>(backend: &mut B, options: MaterialOptions) -> Self {
        let mut palettes = Self {
            textures: backend.create_texture_loader(),
            blocks: backend.create_palette(PaletteKind::Block),
            materials: backend.create_palette(PaletteKind::Material),
            aabbs: backend.create_palette(PaletteKind::AabbModel),
            quads: backend.create_palette(PaletteKind::QuadModel),
            waters: backend.create_palette(PaletteKind::WaterModel),
            triangles: backend.create_palette(PaletteKind::TriangleModel),
            options,
        };
        palettes.blocks.put(PackedBlock::AIR);
        palettes.materials.put(PackedMaterial::air());
        palettes
    }

    fn sink(&mut self) -> MaterialSink<'_> {
        MaterialSink {
            textures: &mut self.textures,
            materials: &mut self.materials,
            options: self.options,
        }
    }

    /// Packs one block and returns its packed block reference (the word
    /// offset of its entry in the flattened block palette).
    pub fn pack_block(&mut self, block: &SceneBlock) -> i32 {
        let surface = &block.surface;
        let packed = match &block.model {
            BlockModel::Air => PackedBlock::AIR,
            BlockModel::Cube { texture, tint } => {
                let material = self.sink().put(texture, tint.as_ref(), surface);
                PackedBlock::new(ModelType::Cube, material)
            }
            BlockModel::InvisibleLight { texture, tint } => {
                let material = self.sink().put(texture, tint.as_ref(), surface);
                PackedBlock::new(ModelType::InvisibleLight, material)
            }
            BlockModel::Aabbs(boxes) => {
                let model = PackedAabbModel::new(boxes, surface, &mut self.sink());
                let index = self.aabbs.put(model);
                PackedBlock::new(ModelType::Aabb, self.aabbs.word_offset(index).unwrap_or_default())
            }
            BlockModel::Quads(quads) => {
                let model = PackedQuadModel::new(quads, surface, &mut self.sink());
                let index = self.quads.put(model);
                PackedBlock::new(ModelType::Quads, self.quads.word_offset(index).unwrap_or_default())
            }
            BlockModel::Water { state, texture } => {
                let model = PackedWaterModel::new(state, texture, &mut self.sink());
                let index = self.waters.put(model);
                PackedBlock::new(ModelType::Water, self.waters.word_offset(index).unwrap_or_default())
            }
        };
        let index = self.blocks.put(packed);
        (index as usize * BLOCK_DWORD_SIZE) as i32
    }

    /// Packs the whole native palette in order.
    ///
    /// Returns the block mapping: `mapping[native_index]` is the packed
    /// block reference of that block.
    pub fn pack_blocks(&mut self, blocks: &[SceneBlock]) -> Vec<i32> {
        blocks.iter().map(|block| self.pack_block(block)).collect()
    }

    /// Packs a hierarchy's triangles and lets the host emit its node array
    /// against their word offsets.
    pub fn pack_bvh(&mut self, bvh: &dyn BvhSource) -> Vec<i32> {
        let offsets: Vec<u32> = bvh
            .triangles()
            .iter()
            .map(|triangle| {
                let packed = PackedTriangleModel::new(triangle, &mut self.sink());
                let index = self.triangles.put(packed);
                self.triangles.word_offset(index).unwrap_or_default()
            })
            .collect();
        let nodes = bvh.pack_nodes(&offsets);
        if nodes.is_empty() {
            vec![0]
        } else {
            nodes
        }
    }

    /// Logs palette sizes.
    pub(crate) fn log_sizes(&self) {
        tracing::info!(
            blocks = self.blocks.len(),
            materials = self.materials.len(),
            textures = self.textures.palette().len(),
            aabb_models = self.aabbs.len(),
            quad_models = self.quads.len(),
            water_models = self.waters.len(),
            triangles = self.triangles.len(),
            "scene palettes rebuilt"
        );
    }
}
