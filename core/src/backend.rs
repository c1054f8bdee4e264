//! The per-backend translation contract (spec §4.7).
//!
//! A concrete backend (`nyxgfx-vulkan`, `nyxgfx-null`, ...) is a type that
//! implements [`Backend`]. Per the "Polymorphism over backends" design note,
//! dispatch is static: [`crate::device::Device`] is generic over `B: Backend`
//! rather than boxing a `dyn Backend`, so there is no vtable indirection on
//! the hot path and each backend is a monomorphization target, not a runtime
//! plugin: boxing a trait object at the backend-selection layer is
//! deliberately avoided, because the whole point of the split is to pick
//! one backend per process and never pay for dispatch between them again.
use nyxgfx_base::*;
use nyxgfx_common::Rect2D;
use std::fmt::Debug;

/// Backend-native resources are opaque to `nyxgfx-core`; it only requires
/// that they can be sent across threads (a container may outlive the thread
/// that created it) and printed for diagnostics.
pub trait NativeObject: Debug + Send + Sync + 'static {}
impl<T: Debug + Send + Sync + 'static> NativeObject for T {}

/// One color attachment within a render pass (spec §6 `begin_render_pass`).
pub struct ColorAttachment<'a, B: Backend> {
    pub texture: &'a B::Texture,
    pub slice: TextureSlice,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub clear_color: ClearColor,
}

/// The depth/stencil attachment within a render pass.
pub struct DepthStencilAttachment<'a, B: Backend> {
    pub texture: &'a B::Texture,
    pub slice: TextureSlice,
    pub depth_load_op: LoadOp,
    pub depth_store_op: StoreOp,
    pub clear_depth: f32,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub clear_stencil: u32,
}

/// Describes a render pass (spec §6 `begin_render_pass`).
pub struct RenderPassDescriptor<'a, B: Backend> {
    pub colors: &'a [ColorAttachment<'a, B>],
    pub depth_stencil: Option<DepthStencilAttachment<'a, B>>,
}

/// One vertex buffer binding (spec §4.7 "Vertex buffer binding slot
/// mapping").
#[derive(Debug, Clone, Copy)]
pub struct VertexBufferBinding<'a, Buf> {
    pub buffer: &'a Buf,
    pub offset: u64,
}

/// `IndirectDrawCommand` (spec §4.4): 4 packed `u32`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct IndirectDrawCommand {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

/// `IndexedIndirectDrawCommand` (spec §4.4): 5 packed `u32`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct IndexedIndirectDrawCommand {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    pub first_instance: u32,
}

/// A region copied or sampled during a copy pass or blit, in texel units.
#[derive(Debug, Clone, Copy)]
pub struct TextureRegion {
    pub slice: TextureSlice,
    pub origin: [u32; 3],
    pub extent: [u32; 3],
}

/// The pluggable translation layer a backend crate implements once.
///
/// Methods never log or swallow errors themselves: `nyxgfx-core` is the
/// single place the "log and no-op" propagation policy (spec §7) is
/// enforced, so a backend method simply returns `Result`/`bool` honestly.
pub trait Backend: Sized + 'static {
    type Texture: NativeObject;
    type Buffer: NativeObject;
    type Sampler: NativeObject;
    type Shader: NativeObject;
    type GraphicsPipeline: NativeObject;
    type ComputePipeline: NativeObject;
    /// A live command recording context. Not required to be `Send`: command
    /// buffers are thread-affine (spec §5).
    type Encoder: Debug;
    /// A one-shot GPU completion signal. Cloning shares the same underlying
    /// signal (used when a fence handle is returned to the application).
    type Fence: NativeObject + Clone;
    /// Per-window native surface state (spec §3 "Swapchain / Window Data").
    type Surface: NativeObject;
    /// An acquired presentable image, valid between acquire and submit.
    type Drawable: Debug;
    /// An opaque native window reference supplied by the host windowing
    /// library (out of scope per spec §1; the backend only needs enough of
    /// it to create a surface).
    type WindowHandle: Copy;

    fn name(&self) -> &'static str;
    /// Which native API this backend targets (spec §6 `get_backend`).
    fn kind(&self) -> BackendBits;
    fn limits(&self) -> DeviceLimits;

    fn create_texture(&self, desc: &TextureDescriptor) -> Result<Self::Texture>;
    fn create_buffer(&self, desc: &BufferDescriptor) -> Result<Self::Buffer>;
    fn create_transfer_buffer(&self, desc: &TransferBufferDescriptor) -> Result<Self::Buffer>;
    fn create_sampler(&self, desc: &SamplerDescriptor) -> Result<Self::Sampler>;
    fn create_shader(&self, desc: &ShaderDescriptor<'_>) -> Result<Self::Shader>;
    fn create_graphics_pipeline(
        &self,
        desc: &GraphicsPipelineDescriptor<'_>,
        shaders: (&Self::Shader, Option<&Self::Shader>),
    ) -> Result<Self::GraphicsPipeline>;
    fn create_compute_pipeline(
        &self,
        desc: &ComputePipelineDescriptor<'_>,
        shader: &Self::Shader,
    ) -> Result<Self::ComputePipeline>;

    fn map_buffer(&self, buffer: &Self::Buffer) -> Result<*mut u8>;
    fn unmap_buffer(&self, buffer: &Self::Buffer);

    fn new_encoder(&self) -> Result<Self::Encoder>;
    /// Creates a fresh, unsignaled native fence for the fence pool to hand
    /// out (spec §4.5 step 4: "Take a fence from the fence pool (allocating
    /// if empty)").
    fn new_fence(&self) -> Result<Self::Fence>;

    fn begin_render_pass(&self, enc: &mut Self::Encoder, desc: &RenderPassDescriptor<'_, Self>);
    fn end_render_pass(&self, enc: &mut Self::Encoder);
    fn begin_compute_pass(&self, enc: &mut Self::Encoder);
    fn end_compute_pass(&self, enc: &mut Self::Encoder);
    fn begin_copy_pass(&self, enc: &mut Self::Encoder);
    fn end_copy_pass(&self, enc: &mut Self::Encoder);

    fn bind_graphics_pipeline(&self, enc: &mut Self::Encoder, pipeline: &Self::GraphicsPipeline);
    fn bind_compute_pipeline(&self, enc: &mut Self::Encoder, pipeline: &Self::ComputePipeline);
    fn set_viewport(&self, enc: &mut Self::Encoder, rect: Rect2D<u32>, depth: (f32, f32));
    fn set_scissor(&self, enc: &mut Self::Encoder, rect: Rect2D<u32>);

    /// `first_native_slot` is already translated per "Vertex buffer binding
    /// slot mapping" (spec §4.7); the backend just writes contiguous native
    /// slots starting there, descending as `bindings` is walked in caller
    /// order.
    fn bind_vertex_buffers(
        &self,
        enc: &mut Self::Encoder,
        first_binding: u32,
        bindings: &[VertexBufferBinding<'_, Self::Buffer>],
    );
    fn bind_index_buffer(
        &self,
        enc: &mut Self::Encoder,
        buffer: &Self::Buffer,
        offset: u64,
        format: IndexFormat,
    );
    fn bind_samplers(&self, enc: &mut Self::Encoder, stage: ShaderStageFlags, first_slot: u32, samplers: &[&Self::Sampler]);
    fn bind_storage_textures(&self, enc: &mut Self::Encoder, stage: ShaderStageFlags, first_slot: u32, textures: &[&Self::Texture]);
    fn bind_storage_buffers(&self, enc: &mut Self::Encoder, stage: ShaderStageFlags, first_slot: u32, buffers: &[(&Self::Buffer, u64)]);
    fn bind_uniform_buffer(&self, enc: &mut Self::Encoder, stage: ShaderStageFlags, slot: u32, buffer: &Self::Buffer, offset: u64);

    fn draw(&self, enc: &mut Self::Encoder, vertex_start: u32, primitive_count: u32, primitive_type: PrimitiveType, instance_count: u32);
    fn draw_indexed(&self, enc: &mut Self::Encoder, base_vertex: i32, start_index: u32, primitive_count: u32, primitive_type: PrimitiveType, instance_count: u32);
    fn draw_indirect(&self, enc: &mut Self::Encoder, buffer: &Self::Buffer, offset: u64, draw_count: u32, stride: u32, primitive_type: PrimitiveType);
    fn draw_indexed_indirect(&self, enc: &mut Self::Encoder, buffer: &Self::Buffer, offset: u64, draw_count: u32, stride: u32, primitive_type: PrimitiveType);

    fn dispatch(&self, enc: &mut Self::Encoder, groups: [u32; 3]);

    fn upload_to_texture(&self, enc: &mut Self::Encoder, src: &Self::Buffer, src_offset: u64, dst: &Self::Texture, region: TextureRegion);
    fn upload_to_buffer(&self, enc: &mut Self::Encoder, src: &Self::Buffer, src_offset: u64, dst: &Self::Buffer, dst_offset: u64, size: u64);
    fn copy_texture_to_texture(&self, enc: &mut Self::Encoder, src: &Self::Texture, src_region: TextureRegion, dst: &Self::Texture, dst_region: TextureRegion);
    fn copy_buffer_to_buffer(&self, enc: &mut Self::Encoder, src: &Self::Buffer, src_offset: u64, dst: &Self::Buffer, dst_offset: u64, size: u64);
    fn generate_mipmaps(&self, enc: &mut Self::Encoder, texture: &Self::Texture);
    fn download_from_texture(&self, enc: &mut Self::Encoder, src: &Self::Texture, region: TextureRegion, dst: &Self::Buffer, dst_offset: u64);
    fn download_from_buffer(&self, enc: &mut Self::Encoder, src: &Self::Buffer, src_offset: u64, dst: &Self::Buffer, dst_offset: u64, size: u64);

    fn blit(&self, enc: &mut Self::Encoder, pipeline: &Self::GraphicsPipeline, sampler: &Self::Sampler, src: &Self::Texture, src_region: TextureRegion, dst: &Self::Texture, dst_region: TextureRegion);

    fn insert_debug_label(&self, enc: &mut Self::Encoder, label: &str);
    fn push_debug_group(&self, enc: &mut Self::Encoder, label: &str);
    fn pop_debug_group(&self, enc: &mut Self::Encoder);

    /// Commits `enc` to the backend queue, requesting a present for every
    /// acquired drawable in `present` *before* the commit (spec §4.7
    /// "Present"). `fence` is signaled asynchronously by the backend; the
    /// submission engine observes completion by polling
    /// [`query_fence`](Self::query_fence), matching spec §4.5 step 5
    /// ("Sweep `submitted` for any whose fence is already complete").
    fn submit(&self, enc: Self::Encoder, fence: &Self::Fence, present: &[(&mut Self::Surface, Self::Drawable)]) -> Result<()>;
    fn wait_fence(&self, fence: &Self::Fence);
    fn query_fence(&self, fence: &Self::Fence) -> bool;
    fn wait_idle(&self);

    fn is_format_supported(&self, format: TextureFormat, usage: TextureUsage) -> bool;
    fn best_sample_count(&self, format: TextureFormat, desired: u32) -> u32;
    fn supports_present_mode(&self, mode: PresentMode) -> bool;
    fn supports_composition(&self, composition: SwapchainComposition) -> bool;

    fn claim_window(&self, window: Self::WindowHandle, composition: SwapchainComposition, present_mode: PresentMode) -> Result<Self::Surface>;
    fn unclaim_window(&self, surface: Self::Surface);
    fn set_swapchain_parameters(&self, surface: &mut Self::Surface, composition: SwapchainComposition, present_mode: PresentMode) -> bool;
    fn swapchain_texture_format(&self, surface: &Self::Surface) -> TextureFormat;
    fn acquire_drawable(&self, surface: &mut Self::Surface) -> Result<(Self::Drawable, Self::Texture, u32, u32)>;
}
