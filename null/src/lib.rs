//! A deterministic, host-only [`Backend`] implementation with no real GPU.
//!
//! There is no hardware to translate to, so every native object is an opaque
//! heap allocation tagged with an id, and every command is appended to the
//! encoder's command log instead of being translated to a native call. This
//! gives `nyxgfx-core`'s test suite something to assert against directly —
//! vertex-buffer slot mapping, bind-group ordering, pass nesting — the same
//! invariants a real backend enforces, just observed through a log instead
//! of a graphics debugger.
//!
//! Fences do not complete on their own: a submission stays pending until
//! something calls [`Backend::wait_fence`] (or, for real time-slicing tests,
//! [`NullBackend::complete_fence`]). This keeps in-flight reference counting
//! (cycling, deferred destruction) exercisable deterministically instead of
//! racing a background thread.
use nyxgfx_base::*;
use nyxgfx_common::Rect2D;
use nyxgfx_core::backend::{Backend, RenderPassDescriptor, TextureRegion, VertexBufferBinding};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

mod commands;
pub use commands::NullCommand;

fn next_id(counter: &AtomicU64) -> u64 {
    counter.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug)]
pub struct NullTexture {
    pub id: u64,
    pub desc: TextureDescriptor,
}

#[derive(Debug)]
pub struct NullBuffer {
    pub id: u64,
    pub size: u64,
    data: Mutex<Vec<u8>>,
}

#[derive(Debug)]
pub struct NullSampler {
    pub id: u64,
    pub desc: SamplerDescriptor,
}

#[derive(Debug)]
pub struct NullShader {
    pub id: u64,
    pub stage: ShaderStageFlags,
}

#[derive(Debug)]
pub struct NullGraphicsPipeline {
    pub id: u64,
    pub color_targets: Vec<ColorTargetDescriptor>,
}

#[derive(Debug)]
pub struct NullComputePipeline {
    pub id: u64,
    pub threadgroup_size: [u32; 3],
}

/// A native fence for the null backend: an `Arc`'d flag. Cloning (per the
/// `Backend::Fence: Clone` bound) shares the same flag, so completing one
/// clone completes every handle to that submission.
#[derive(Debug, Clone)]
pub struct NullFence(Arc<AtomicBool>);

impl NullFence {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }
}

#[derive(Debug)]
pub struct NullSurface {
    pub id: u64,
    pub composition: SwapchainComposition,
    pub present_mode: PresentMode,
    pub format: TextureFormat,
    width: u32,
    height: u32,
}

#[derive(Debug)]
pub struct NullDrawable {
    pub id: u64,
}

/// The null backend has no real windowing system to hand it a handle, so
/// every window is addressed by an opaque client-chosen tag.
pub type NullWindowHandle = u64;

/// Records every command issued between `new_encoder` and `submit` so tests
/// can assert on ordering and slot mapping (spec §8 property 5).
#[derive(Debug, Default)]
pub struct NullEncoder {
    pub commands: Vec<NullCommand>,
}

/// Backend implementation with no real device: every resource is a plain
/// heap object, every submitted command is recorded rather than executed.
pub struct NullBackend {
    limits: DeviceLimits,
    next_id: AtomicU64,
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NullBackend {
    pub fn new() -> Self {
        Self {
            limits: DeviceLimits {
                max_compute_workgroup_count: [65535, 65535, 65535],
                min_uniform_buffer_offset_alignment: 256,
                max_sample_count: 4,
            },
            next_id: AtomicU64::new(1),
        }
    }

    /// Marks `fence` complete. Equivalent to what a real backend's driver
    /// thread would eventually do on its own; exposed here so deterministic
    /// tests control exactly when a submission is observed to finish.
    pub fn complete_fence(fence: &NullFence) {
        fence.0.store(true, Ordering::Release);
    }
}

impl Backend for NullBackend {
    type Texture = NullTexture;
    type Buffer = NullBuffer;
    type Sampler = NullSampler;
    type Shader = NullShader;
    type GraphicsPipeline = NullGraphicsPipeline;
    type ComputePipeline = NullComputePipeline;
    type Encoder = NullEncoder;
    type Fence = NullFence;
    type Surface = NullSurface;
    type Drawable = NullDrawable;
    type WindowHandle = NullWindowHandle;

    fn name(&self) -> &'static str {
        "null"
    }

    fn kind(&self) -> BackendBits {
        // Not a real native API: no bit in the enumerated domain applies.
        BackendBits::empty()
    }

    fn limits(&self) -> DeviceLimits {
        self.limits
    }

    fn create_texture(&self, desc: &TextureDescriptor) -> Result<Self::Texture> {
        Ok(NullTexture {
            id: next_id(&self.next_id),
            desc: desc.clone(),
        })
    }

    fn create_buffer(&self, desc: &BufferDescriptor) -> Result<Self::Buffer> {
        Ok(NullBuffer {
            id: next_id(&self.next_id),
            size: desc.size,
            data: Mutex::new(vec![0u8; desc.size as usize]),
        })
    }

    fn create_transfer_buffer(&self, desc: &TransferBufferDescriptor) -> Result<Self::Buffer> {
        Ok(NullBuffer {
            id: next_id(&self.next_id),
            size: desc.size,
            data: Mutex::new(vec![0u8; desc.size as usize]),
        })
    }

    fn create_sampler(&self, desc: &SamplerDescriptor) -> Result<Self::Sampler> {
        Ok(NullSampler {
            id: next_id(&self.next_id),
            desc: *desc,
        })
    }

    fn create_shader(&self, desc: &ShaderDescriptor<'_>) -> Result<Self::Shader> {
        if desc.code.is_empty() {
            return Err(Error::new(ErrorKind::CompilationFailed));
        }
        Ok(NullShader {
            id: next_id(&self.next_id),
            stage: desc.stage,
        })
    }

    fn create_graphics_pipeline(
        &self,
        desc: &GraphicsPipelineDescriptor<'_>,
        _shaders: (&Self::Shader, Option<&Self::Shader>),
    ) -> Result<Self::GraphicsPipeline> {
        Ok(NullGraphicsPipeline {
            id: next_id(&self.next_id),
            color_targets: desc.color_targets.clone(),
        })
    }

    fn create_compute_pipeline(&self, desc: &ComputePipelineDescriptor<'_>, _shader: &Self::Shader) -> Result<Self::ComputePipeline> {
        Ok(NullComputePipeline {
            id: next_id(&self.next_id),
            threadgroup_size: desc.threadgroup_size,
        })
    }

    fn map_buffer(&self, buffer: &Self::Buffer) -> Result<*mut u8> {
        let mut guard = buffer.data.lock();
        Ok(guard.as_mut_ptr())
    }

    fn unmap_buffer(&self, _buffer: &Self::Buffer) {}

    fn new_encoder(&self) -> Result<Self::Encoder> {
        Ok(NullEncoder::default())
    }

    fn new_fence(&self) -> Result<Self::Fence> {
        Ok(NullFence::new())
    }

    fn begin_render_pass(&self, enc: &mut Self::Encoder, desc: &RenderPassDescriptor<'_, Self>) {
        enc.commands.push(NullCommand::BeginRenderPass {
            color_count: desc.colors.len(),
            has_depth_stencil: desc.depth_stencil.is_some(),
        });
    }

    fn end_render_pass(&self, enc: &mut Self::Encoder) {
        enc.commands.push(NullCommand::EndRenderPass);
    }

    fn begin_compute_pass(&self, enc: &mut Self::Encoder) {
        enc.commands.push(NullCommand::BeginComputePass);
    }

    fn end_compute_pass(&self, enc: &mut Self::Encoder) {
        enc.commands.push(NullCommand::EndComputePass);
    }

    fn begin_copy_pass(&self, enc: &mut Self::Encoder) {
        enc.commands.push(NullCommand::BeginCopyPass);
    }

    fn end_copy_pass(&self, enc: &mut Self::Encoder) {
        enc.commands.push(NullCommand::EndCopyPass);
    }

    fn bind_graphics_pipeline(&self, enc: &mut Self::Encoder, pipeline: &Self::GraphicsPipeline) {
        enc.commands.push(NullCommand::BindGraphicsPipeline(pipeline.id));
    }

    fn bind_compute_pipeline(&self, enc: &mut Self::Encoder, pipeline: &Self::ComputePipeline) {
        enc.commands.push(NullCommand::BindComputePipeline(pipeline.id));
    }

    fn set_viewport(&self, enc: &mut Self::Encoder, rect: Rect2D<u32>, depth: (f32, f32)) {
        enc.commands.push(NullCommand::SetViewport {
            min: rect.min,
            max: rect.max,
            min_depth: depth.0,
            max_depth: depth.1,
        });
    }

    fn set_scissor(&self, enc: &mut Self::Encoder, rect: Rect2D<u32>) {
        enc.commands.push(NullCommand::SetScissor { min: rect.min, max: rect.max });
    }

    fn bind_vertex_buffers(&self, enc: &mut Self::Encoder, first_binding: u32, bindings: &[VertexBufferBinding<'_, Self::Buffer>]) {
        enc.commands.push(NullCommand::BindVertexBuffers {
            first_slot: first_binding,
            buffer_ids: bindings.iter().map(|b| b.buffer.id).collect(),
            offsets: bindings.iter().map(|b| b.offset).collect(),
        });
    }

    fn bind_index_buffer(&self, enc: &mut Self::Encoder, buffer: &Self::Buffer, offset: u64, format: IndexFormat) {
        enc.commands.push(NullCommand::BindIndexBuffer {
            buffer_id: buffer.id,
            offset,
            format,
        });
    }

    fn bind_samplers(&self, enc: &mut Self::Encoder, stage: ShaderStageFlags, first_slot: u32, samplers: &[&Self::Sampler]) {
        enc.commands.push(NullCommand::BindSamplers {
            stage,
            first_slot,
            ids: samplers.iter().map(|s| s.id).collect(),
        });
    }

    fn bind_storage_textures(&self, enc: &mut Self::Encoder, stage: ShaderStageFlags, first_slot: u32, textures: &[&Self::Texture]) {
        enc.commands.push(NullCommand::BindStorageTextures {
            stage,
            first_slot,
            ids: textures.iter().map(|t| t.id).collect(),
        });
    }

    fn bind_storage_buffers(&self, enc: &mut Self::Encoder, stage: ShaderStageFlags, first_slot: u32, buffers: &[(&Self::Buffer, u64)]) {
        enc.commands.push(NullCommand::BindStorageBuffers {
            stage,
            first_slot,
            ids: buffers.iter().map(|(b, off)| (b.id, *off)).collect(),
        });
    }

    fn bind_uniform_buffer(&self, enc: &mut Self::Encoder, stage: ShaderStageFlags, slot: u32, buffer: &Self::Buffer, offset: u64) {
        enc.commands.push(NullCommand::BindUniformBuffer {
            stage,
            slot,
            buffer_id: buffer.id,
            offset,
        });
    }

    fn draw(&self, enc: &mut Self::Encoder, vertex_start: u32, primitive_count: u32, primitive_type: PrimitiveType, instance_count: u32) {
        enc.commands.push(NullCommand::Draw {
            vertex_start,
            primitive_count,
            primitive_type,
            instance_count,
        });
    }

    fn draw_indexed(&self, enc: &mut Self::Encoder, base_vertex: i32, start_index: u32, primitive_count: u32, primitive_type: PrimitiveType, instance_count: u32) {
        enc.commands.push(NullCommand::DrawIndexed {
            base_vertex,
            start_index,
            primitive_count,
            primitive_type,
            instance_count,
        });
    }

    fn draw_indirect(&self, enc: &mut Self::Encoder, buffer: &Self::Buffer, offset: u64, draw_count: u32, stride: u32, primitive_type: PrimitiveType) {
        enc.commands.push(NullCommand::DrawIndirect {
            buffer_id: buffer.id,
            offset,
            draw_count,
            stride,
            primitive_type,
        });
    }

    fn draw_indexed_indirect(&self, enc: &mut Self::Encoder, buffer: &Self::Buffer, offset: u64, draw_count: u32, stride: u32, primitive_type: PrimitiveType) {
        enc.commands.push(NullCommand::DrawIndexedIndirect {
            buffer_id: buffer.id,
            offset,
            draw_count,
            stride,
            primitive_type,
        });
    }

    fn dispatch(&self, enc: &mut Self::Encoder, groups: [u32; 3]) {
        enc.commands.push(NullCommand::Dispatch(groups));
    }

    fn upload_to_texture(&self, enc: &mut Self::Encoder, src: &Self::Buffer, src_offset: u64, dst: &Self::Texture, region: TextureRegion) {
        enc.commands.push(NullCommand::UploadToTexture {
            src_id: src.id,
            src_offset,
            dst_id: dst.id,
            region: format!("{region:?}"),
        });
    }

    fn upload_to_buffer(&self, enc: &mut Self::Encoder, src: &Self::Buffer, src_offset: u64, dst: &Self::Buffer, dst_offset: u64, size: u64) {
        enc.commands.push(NullCommand::UploadToBuffer {
            src_id: src.id,
            src_offset,
            dst_id: dst.id,
            dst_offset,
            size,
        });
    }

    fn copy_texture_to_texture(&self, enc: &mut Self::Encoder, src: &Self::Texture, src_region: TextureRegion, dst: &Self::Texture, dst_region: TextureRegion) {
        enc.commands.push(NullCommand::CopyTextureToTexture {
            src_id: src.id,
            src_region: format!("{src_region:?}"),
            dst_id: dst.id,
            dst_region: format!("{dst_region:?}"),
        });
    }

    fn copy_buffer_to_buffer(&self, enc: &mut Self::Encoder, src: &Self::Buffer, src_offset: u64, dst: &Self::Buffer, dst_offset: u64, size: u64) {
        enc.commands.push(NullCommand::CopyBufferToBuffer {
            src_id: src.id,
            src_offset,
            dst_id: dst.id,
            dst_offset,
            size,
        });
    }

    fn generate_mipmaps(&self, enc: &mut Self::Encoder, texture: &Self::Texture) {
        enc.commands.push(NullCommand::GenerateMipmaps { texture_id: texture.id });
    }

    fn download_from_texture(&self, enc: &mut Self::Encoder, src: &Self::Texture, region: TextureRegion, dst: &Self::Buffer, dst_offset: u64) {
        enc.commands.push(NullCommand::DownloadFromTexture {
            src_id: src.id,
            region: format!("{region:?}"),
            dst_id: dst.id,
            dst_offset,
        });
    }

    fn download_from_buffer(&self, enc: &mut Self::Encoder, src: &Self::Buffer, src_offset: u64, dst: &Self::Buffer, dst_offset: u64, size: u64) {
        enc.commands.push(NullCommand::DownloadFromBuffer {
            src_id: src.id,
            src_offset,
            dst_id: dst.id,
            dst_offset,
            size,
        });
    }

    fn blit(&self, enc: &mut Self::Encoder, pipeline: &Self::GraphicsPipeline, sampler: &Self::Sampler, src: &Self::Texture, src_region: TextureRegion, dst: &Self::Texture, dst_region: TextureRegion) {
        enc.commands.push(NullCommand::Blit {
            pipeline_id: pipeline.id,
            sampler_id: sampler.id,
            src_id: src.id,
            src_region: format!("{src_region:?}"),
            dst_id: dst.id,
            dst_region: format!("{dst_region:?}"),
        });
    }

    fn insert_debug_label(&self, enc: &mut Self::Encoder, label: &str) {
        enc.commands.push(NullCommand::DebugLabel(label.to_string()));
    }

    fn push_debug_group(&self, enc: &mut Self::Encoder, label: &str) {
        enc.commands.push(NullCommand::PushDebugGroup(label.to_string()));
    }

    fn pop_debug_group(&self, enc: &mut Self::Encoder) {
        enc.commands.push(NullCommand::PopDebugGroup);
    }

    fn submit(&self, enc: Self::Encoder, fence: &Self::Fence, present: &[(&mut Self::Surface, Self::Drawable)]) -> Result<()> {
        log::debug!("null backend: submitting {} recorded commands, {} presents", enc.commands.len(), present.len());
        let _ = fence;
        Ok(())
    }

    fn wait_fence(&self, fence: &Self::Fence) {
        Self::complete_fence(fence);
    }

    fn query_fence(&self, fence: &Self::Fence) -> bool {
        fence.0.load(Ordering::Acquire)
    }

    fn wait_idle(&self) {}

    fn is_format_supported(&self, _format: TextureFormat, _usage: TextureUsage) -> bool {
        true
    }

    fn best_sample_count(&self, _format: TextureFormat, desired: u32) -> u32 {
        desired.clamp(1, self.limits.max_sample_count)
    }

    fn supports_present_mode(&self, mode: PresentMode) -> bool {
        // Simulates a device without a true "no tearing, no extra latency"
        // mode, to exercise the present-mode fallback path deterministically.
        !matches!(mode, PresentMode::Mailbox)
    }

    fn supports_composition(&self, composition: SwapchainComposition) -> bool {
        matches!(composition, SwapchainComposition::Sdr)
    }

    fn claim_window(&self, window: Self::WindowHandle, composition: SwapchainComposition, present_mode: PresentMode) -> Result<Self::Surface> {
        Ok(NullSurface {
            id: window,
            composition: if self.supports_composition(composition) { composition } else { SwapchainComposition::Sdr },
            present_mode: if self.supports_present_mode(present_mode) { present_mode } else { PresentMode::Vsync },
            format: TextureFormat::B8G8R8A8Unorm,
            width: 1,
            height: 1,
        })
    }

    fn unclaim_window(&self, _surface: Self::Surface) {}

    fn set_swapchain_parameters(&self, surface: &mut Self::Surface, composition: SwapchainComposition, present_mode: PresentMode) -> bool {
        let composition_ok = self.supports_composition(composition);
        let present_mode_ok = self.supports_present_mode(present_mode);
        surface.composition = if composition_ok { composition } else { SwapchainComposition::Sdr };
        surface.present_mode = if present_mode_ok { present_mode } else { PresentMode::Vsync };
        composition_ok && present_mode_ok
    }

    fn swapchain_texture_format(&self, surface: &Self::Surface) -> TextureFormat {
        surface.format
    }

    fn acquire_drawable(&self, surface: &mut Self::Surface) -> Result<(Self::Drawable, Self::Texture, u32, u32)> {
        let texture = NullTexture {
            id: next_id(&self.next_id),
            desc: TextureDescriptor::texture_2d(surface.format, TextureUsage::COLOR_TARGET, surface.width, surface.height),
        };
        let drawable = NullDrawable { id: next_id(&self.next_id) };
        Ok((drawable, texture, surface.width, surface.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_stays_pending_until_waited() {
        let backend = NullBackend::new();
        let fence = backend.new_fence().unwrap();
        assert!(!backend.query_fence(&fence));
        backend.wait_fence(&fence);
        assert!(backend.query_fence(&fence));
    }

    #[test]
    fn cloned_fence_shares_completion() {
        let backend = NullBackend::new();
        let fence = backend.new_fence().unwrap();
        let clone = fence.clone();
        assert!(!backend.query_fence(&clone));
        backend.wait_fence(&fence);
        assert!(backend.query_fence(&clone));
    }

    #[test]
    fn complete_fence_is_independent_of_wait_idle() {
        let backend = NullBackend::new();
        let fence = backend.new_fence().unwrap();
        NullBackend::complete_fence(&fence);
        assert!(backend.query_fence(&fence));
    }

    #[test]
    fn encoder_records_pass_and_draw_commands_in_order() {
        let backend = NullBackend::new();
        let mut enc = backend.new_encoder().unwrap();
        let pipeline = backend
            .create_graphics_pipeline(
                &GraphicsPipelineDescriptor {
                    vertex_shader: &ShaderId::from_raw_parts(0, 0),
                    vertex_entry_point: "main".into(),
                    fragment_shader: None,
                    fragment_entry_point: "main".into(),
                    vertex_buffers: Vec::new(),
                    color_targets: Vec::new(),
                    depth_stencil_format: None,
                    depth_stencil: DepthStencilState::default(),
                    primitive_type: PrimitiveType::TriangleList,
                    fill_mode: FillMode::Fill,
                    cull_mode: CullMode::None,
                    front_face: FrontFace::CounterClockwise,
                    depth_bias: None,
                    sample_count: 1,
                    sample_mask: 0xFFFF_FFFF,
                    blend_constants: [0.0; 4],
                    stencil_reference: 0,
                    label: None,
                },
                (&backend.create_shader(&ShaderDescriptor {
                    stage: ShaderStageFlags::VERTEX,
                    format: ShaderFormat::Spirv,
                    code: &[0u8, 1, 2, 3],
                    entry_point: "main",
                    label: None,
                })
                .unwrap(), None),
            )
            .unwrap();

        backend.begin_render_pass(&mut enc, &RenderPassDescriptor { colors: &[], depth_stencil: None });
        backend.bind_graphics_pipeline(&mut enc, &pipeline);
        backend.draw(&mut enc, 0, 1, PrimitiveType::TriangleList, 1);
        backend.end_render_pass(&mut enc);

        assert_eq!(enc.commands.len(), 4);
        assert!(matches!(enc.commands[0], NullCommand::BeginRenderPass { color_count: 0, has_depth_stencil: false }));
        assert!(matches!(enc.commands[1], NullCommand::BindGraphicsPipeline(id) if id == pipeline.id));
        assert!(matches!(enc.commands[2], NullCommand::Draw { vertex_start: 0, primitive_count: 1, .. }));
        assert!(matches!(enc.commands[3], NullCommand::EndRenderPass));
    }

    #[test]
    fn mapped_buffer_roundtrips_bytes() {
        let backend = NullBackend::new();
        let buffer = backend
            .create_buffer(&BufferDescriptor {
                usage: BufferUsage::VERTEX,
                size: 4,
                label: None,
            })
            .unwrap();
        unsafe {
            let ptr = backend.map_buffer(&buffer).unwrap();
            std::ptr::write(ptr, 0xAB);
            backend.unmap_buffer(&buffer);
            let ptr = backend.map_buffer(&buffer).unwrap();
            assert_eq!(std::ptr::read(ptr), 0xAB);
        }
    }

    #[test]
    fn present_mode_and_composition_fall_back_on_claim() {
        let backend = NullBackend::new();
        let surface = backend.claim_window(1, SwapchainComposition::Hdr10St2048, PresentMode::Mailbox).unwrap();
        assert_eq!(surface.composition, SwapchainComposition::Sdr);
        assert_eq!(surface.present_mode, PresentMode::Vsync);
    }
}
