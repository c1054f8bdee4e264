//! The recorded command log an encoder accumulates between creation and
//! submission. Test code matches on these variants directly instead of
//! re-deriving what a real backend would have done with the same encoder
//! calls (spec §8 property 5, vertex-buffer slot mapping; property 6,
//! bind-group flush ordering).
use nyxgfx_base::*;

#[derive(Debug, Clone, PartialEq)]
pub enum NullCommand {
    BeginRenderPass { color_count: usize, has_depth_stencil: bool },
    EndRenderPass,
    BeginComputePass,
    EndComputePass,
    BeginCopyPass,
    EndCopyPass,
    BindGraphicsPipeline(u64),
    BindComputePipeline(u64),
    SetViewport { min: [u32; 2], max: [u32; 2], min_depth: f32, max_depth: f32 },
    SetScissor { min: [u32; 2], max: [u32; 2] },
    BindVertexBuffers { first_slot: u32, buffer_ids: Vec<u64>, offsets: Vec<u64> },
    BindIndexBuffer { buffer_id: u64, offset: u64, format: IndexFormat },
    BindSamplers { stage: ShaderStageFlags, first_slot: u32, ids: Vec<u64> },
    BindStorageTextures { stage: ShaderStageFlags, first_slot: u32, ids: Vec<u64> },
    BindStorageBuffers { stage: ShaderStageFlags, first_slot: u32, ids: Vec<(u64, u64)> },
    BindUniformBuffer { stage: ShaderStageFlags, slot: u32, buffer_id: u64, offset: u64 },
    Draw { vertex_start: u32, primitive_count: u32, primitive_type: PrimitiveType, instance_count: u32 },
    DrawIndexed { base_vertex: i32, start_index: u32, primitive_count: u32, primitive_type: PrimitiveType, instance_count: u32 },
    DrawIndirect { buffer_id: u64, offset: u64, draw_count: u32, stride: u32, primitive_type: PrimitiveType },
    DrawIndexedIndirect { buffer_id: u64, offset: u64, draw_count: u32, stride: u32, primitive_type: PrimitiveType },
    Dispatch([u32; 3]),
    UploadToTexture { src_id: u64, src_offset: u64, dst_id: u64, region: String },
    UploadToBuffer { src_id: u64, src_offset: u64, dst_id: u64, dst_offset: u64, size: u64 },
    CopyTextureToTexture { src_id: u64, src_region: String, dst_id: u64, dst_region: String },
    CopyBufferToBuffer { src_id: u64, src_offset: u64, dst_id: u64, dst_offset: u64, size: u64 },
    GenerateMipmaps { texture_id: u64 },
    DownloadFromTexture { src_id: u64, region: String, dst_id: u64, dst_offset: u64 },
    DownloadFromBuffer { src_id: u64, src_offset: u64, dst_id: u64, dst_offset: u64, size: u64 },
    Blit { pipeline_id: u64, sampler_id: u64, src_id: u64, src_region: String, dst_id: u64, dst_region: String },
    DebugLabel(String),
    PushDebugGroup(String),
    PopDebugGroup,
}
