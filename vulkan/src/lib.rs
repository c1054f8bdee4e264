//! The one fully-covered reference [`Backend`] implementation, built on
//! `ash` (spec §4.7: "one fully-covered reference backend"). Binding slots
//! are flushed with
//! `VK_KHR_push_descriptor` rather than a descriptor-pool/descriptor-set
//! lifecycle: `nyxgfx-core`'s binding model already re-issues every bound
//! resource just before a draw or dispatch (spec §4.2's shadow tables), so
//! a push-descriptor write matches that call shape directly instead of
//! requiring a set to be allocated, written, and retired per draw.
mod encoder;
mod format;
mod renderpass;
mod resources;

pub use encoder::VulkanEncoder;
pub use resources::{
    VulkanBuffer, VulkanComputePipeline, VulkanDrawable, VulkanGraphicsPipeline, VulkanSampler, VulkanShader, VulkanSurface, VulkanTexture,
};

use ash::vk;
use nyxgfx_base::*;
use nyxgfx_core::backend::{Backend, RenderPassDescriptor, TextureRegion, VertexBufferBinding};
use parking_lot::Mutex;
use std::ffi::CString;
use std::sync::Arc;

/// A one-shot GPU completion signal. `vk::Fence` is itself a `Copy` handle,
/// so cloning a [`VulkanFence`] just duplicates the handle the same way the
/// null backend's `Arc<AtomicBool>` duplicates a shared flag: both clones
/// observe the same underlying submission completing.
#[derive(Debug, Clone, Copy)]
pub struct VulkanFence(pub(crate) vk::Fence);

/// Shared Vulkan instance/device state, reference-counted so a backend
/// clone (not part of the public API, but used internally by the surface
/// acquire path) never outlives the objects it wraps.
pub(crate) struct VulkanShared {
    pub(crate) entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,
    pub(crate) queue: vk::Queue,
    pub(crate) queue_family: u32,
    pub(crate) command_pool: Mutex<vk::CommandPool>,
    pub(crate) allocator: vk_mem::Allocator,
    pub(crate) surface_loader: ash::extensions::khr::Surface,
    pub(crate) swapchain_loader: ash::extensions::khr::Swapchain,
    pub(crate) push_descriptor_loader: ash::extensions::khr::PushDescriptor,
    pub(crate) properties: vk::PhysicalDeviceProperties,
    /// Render pass/framebuffer pairs built per `begin_render_pass` call
    /// (spec has no render-pass concept; Vulkan needs one). Drained and
    /// destroyed on [`VulkanBackend::wait_idle`], by which point no command
    /// buffer referencing them can still be executing.
    pub(crate) pending_passes: Mutex<Vec<(vk::RenderPass, vk::Framebuffer)>>,
}

impl Drop for VulkanShared {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_command_pool(*self.command_pool.lock(), None);
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

/// Backend for real Vulkan hardware (spec §4.7). Construction talks to the
/// driver directly; everything after that routes through the `Backend`
/// trait `nyxgfx-core` drives.
pub struct VulkanBackend {
    shared: Arc<VulkanShared>,
    limits: DeviceLimits,
    debug: bool,
}

unsafe impl Send for VulkanBackend {}
unsafe impl Sync for VulkanBackend {}

impl VulkanBackend {
    /// Creates a backend against the first suitable physical device,
    /// enabling the swapchain and push-descriptor device extensions (spec
    /// §6 `create_device`'s backend-probing step instantiates one of these
    /// per compiled-in backend until one succeeds).
    ///
    /// # Safety
    /// The caller must ensure the Vulkan loader is available on this
    /// platform and that no other code destroys the instance/device this
    /// creates out from under it.
    pub unsafe fn new(debug: bool) -> Result<Self> {
        let entry = ash::Entry::linked();
        let app_info = vk::ApplicationInfo::builder().api_version(vk::API_VERSION_1_2);
        let layer_names: Vec<CString> = if debug {
            vec![CString::new("VK_LAYER_KHRONOS_validation").unwrap()]
        } else {
            Vec::new()
        };
        let layer_ptrs: Vec<*const i8> = layer_names.iter().map(|s| s.as_ptr()).collect();
        let extension_names = [ash::extensions::khr::Surface::name().as_ptr(), ash::extensions::khr::GetPhysicalDeviceProperties2::name().as_ptr()];
        let instance_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_layer_names(&layer_ptrs)
            .enabled_extension_names(&extension_names);
        let instance = entry
            .create_instance(&instance_info, None)
            .map_err(|e| Error::with_cause(ErrorKind::BackendUnavailable, e))?;

        let physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| Error::with_cause(ErrorKind::BackendUnavailable, e))?;
        let physical_device = *physical_devices.first().ok_or_else(|| Error::new(ErrorKind::BackendUnavailable))?;
        let properties = instance.get_physical_device_properties(physical_device);

        let queue_families = instance.get_physical_device_queue_family_properties(physical_device);
        let queue_family = queue_families
            .iter()
            .position(|q| q.queue_flags.contains(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE))
            .ok_or_else(|| Error::new(ErrorKind::BackendUnavailable))? as u32;

        let queue_priorities = [1.0f32];
        let queue_info = vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(queue_family)
            .queue_priorities(&queue_priorities)
            .build();
        let device_extensions = [ash::extensions::khr::Swapchain::name().as_ptr(), ash::extensions::khr::PushDescriptor::name().as_ptr()];
        let features = vk::PhysicalDeviceFeatures::builder().sampler_anisotropy(true);
        let device_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(std::slice::from_ref(&queue_info))
            .enabled_extension_names(&device_extensions)
            .enabled_features(&features);
        let device = instance
            .create_device(physical_device, &device_info, None)
            .map_err(|e| Error::with_cause(ErrorKind::BackendUnavailable, e))?;
        let queue = device.get_device_queue(queue_family, 0);

        let pool_info = vk::CommandPoolCreateInfo::builder()
            .queue_family_index(queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        let command_pool = device
            .create_command_pool(&pool_info, None)
            .map_err(|e| Error::with_cause(ErrorKind::AllocationFailed, e))?;

        let allocator = vk_mem::Allocator::new(&vk_mem::AllocatorCreateInfo {
            physical_device,
            device: device.clone(),
            instance: instance.clone(),
            flags: vk_mem::AllocatorCreateFlags::NONE,
            preferred_large_heap_block_size: 0,
            frame_in_use_count: 2,
            heap_size_limits: None,
        })
        .map_err(|e| Error::with_cause(ErrorKind::AllocationFailed, e))?;

        let surface_loader = ash::extensions::khr::Surface::new(&entry, &instance);
        let swapchain_loader = ash::extensions::khr::Swapchain::new(&instance, &device);
        let push_descriptor_loader = ash::extensions::khr::PushDescriptor::new(&instance, &device);

        let mem_props = instance.get_physical_device_memory_properties(physical_device);

        let limits = DeviceLimits {
            max_compute_workgroup_count: properties.limits.max_compute_work_group_count,
            min_uniform_buffer_offset_alignment: properties.limits.min_uniform_buffer_offset_alignment as u32,
            max_sample_count: sample_count_flags_to_max(properties.limits.framebuffer_color_sample_counts),
        };
        let _ = mem_props;

        Ok(Self {
            shared: Arc::new(VulkanShared {
                entry,
                instance,
                physical_device,
                device,
                queue,
                queue_family,
                command_pool: Mutex::new(command_pool),
                allocator,
                surface_loader,
                swapchain_loader,
                push_descriptor_loader,
                properties,
                pending_passes: Mutex::new(Vec::new()),
            }),
            limits,
            debug,
        })
    }

    fn allocate_command_buffer(&self) -> Result<vk::CommandBuffer> {
        let info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(*self.shared.command_pool.lock())
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let bufs = unsafe {
            self.shared
                .device
                .allocate_command_buffers(&info)
                .map_err(|e| Error::with_cause(ErrorKind::AllocationFailed, e))?
        };
        Ok(bufs[0])
    }
}

fn sample_count_flags_to_max(flags: vk::SampleCountFlags) -> u32 {
    for count in [64, 32, 16, 8, 4, 2, 1] {
        if flags.as_raw() & count != 0 {
            return count;
        }
    }
    1
}

impl Backend for VulkanBackend {
    type Texture = VulkanTexture;
    type Buffer = VulkanBuffer;
    type Sampler = VulkanSampler;
    type Shader = VulkanShader;
    type GraphicsPipeline = VulkanGraphicsPipeline;
    type ComputePipeline = VulkanComputePipeline;
    type Encoder = VulkanEncoder;
    type Fence = VulkanFence;
    type Surface = VulkanSurface;
    type Drawable = VulkanDrawable;
    type WindowHandle = raw_window_handle::RawWindowHandle;

    fn name(&self) -> &'static str {
        "vulkan"
    }

    fn kind(&self) -> BackendBits {
        BackendBits::VULKAN
    }

    fn limits(&self) -> DeviceLimits {
        self.limits
    }

    fn create_texture(&self, desc: &TextureDescriptor) -> Result<Self::Texture> {
        resources::create_texture(&self.shared, desc)
    }

    fn create_buffer(&self, desc: &BufferDescriptor) -> Result<Self::Buffer> {
        resources::create_buffer(&self.shared, desc.size, buffer_usage_to_vk(desc.usage))
    }

    fn create_transfer_buffer(&self, desc: &TransferBufferDescriptor) -> Result<Self::Buffer> {
        let usage = match desc.direction {
            TransferDirection::Upload => vk::BufferUsageFlags::TRANSFER_SRC,
            TransferDirection::Download => vk::BufferUsageFlags::TRANSFER_DST,
        };
        resources::create_buffer(&self.shared, desc.size, usage)
    }

    fn create_sampler(&self, desc: &SamplerDescriptor) -> Result<Self::Sampler> {
        resources::create_sampler(&self.shared, desc)
    }

    fn create_shader(&self, desc: &ShaderDescriptor<'_>) -> Result<Self::Shader> {
        resources::create_shader(&self.shared, desc)
    }

    fn create_graphics_pipeline(&self, desc: &GraphicsPipelineDescriptor<'_>, shaders: (&Self::Shader, Option<&Self::Shader>)) -> Result<Self::GraphicsPipeline> {
        resources::create_graphics_pipeline(&self.shared, desc, shaders)
    }

    fn create_compute_pipeline(&self, desc: &ComputePipelineDescriptor<'_>, shader: &Self::Shader) -> Result<Self::ComputePipeline> {
        resources::create_compute_pipeline(&self.shared, desc, shader)
    }

    fn map_buffer(&self, buffer: &Self::Buffer) -> Result<*mut u8> {
        self.shared
            .allocator
            .map_memory(&buffer.allocation)
            .map_err(|e| Error::with_cause(ErrorKind::AllocationFailed, e))
    }

    fn unmap_buffer(&self, buffer: &Self::Buffer) {
        let _ = self.shared.allocator.unmap_memory(&buffer.allocation);
    }

    fn new_encoder(&self) -> Result<Self::Encoder> {
        let cb = self.allocate_command_buffer()?;
        let begin_info = vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe {
            self.shared
                .device
                .begin_command_buffer(cb, &begin_info)
                .map_err(|e| Error::with_cause(ErrorKind::AllocationFailed, e))?;
        }
        Ok(VulkanEncoder::new(cb))
    }

    fn new_fence(&self) -> Result<Self::Fence> {
        let info = vk::FenceCreateInfo::builder();
        let fence = unsafe {
            self.shared
                .device
                .create_fence(&info, None)
                .map_err(|e| Error::with_cause(ErrorKind::AllocationFailed, e))?
        };
        Ok(VulkanFence(fence))
    }

    fn begin_render_pass(&self, enc: &mut Self::Encoder, desc: &RenderPassDescriptor<'_, Self>) {
        enc.begin_render_pass(&self.shared, desc);
    }

    fn end_render_pass(&self, enc: &mut Self::Encoder) {
        enc.end_render_pass(&self.shared);
    }

    fn begin_compute_pass(&self, enc: &mut Self::Encoder) {
        enc.begin_compute_pass();
    }

    fn end_compute_pass(&self, enc: &mut Self::Encoder) {
        enc.end_compute_pass();
    }

    fn begin_copy_pass(&self, enc: &mut Self::Encoder) {
        enc.begin_copy_pass();
    }

    fn end_copy_pass(&self, enc: &mut Self::Encoder) {
        enc.end_copy_pass();
    }

    fn bind_graphics_pipeline(&self, enc: &mut Self::Encoder, pipeline: &Self::GraphicsPipeline) {
        enc.bind_graphics_pipeline(&self.shared, pipeline);
    }

    fn bind_compute_pipeline(&self, enc: &mut Self::Encoder, pipeline: &Self::ComputePipeline) {
        enc.bind_compute_pipeline(&self.shared, pipeline);
    }

    fn set_viewport(&self, enc: &mut Self::Encoder, rect: nyxgfx_common::Rect2D<u32>, depth: (f32, f32)) {
        enc.set_viewport(&self.shared, rect, depth);
    }

    fn set_scissor(&self, enc: &mut Self::Encoder, rect: nyxgfx_common::Rect2D<u32>) {
        enc.set_scissor(&self.shared, rect);
    }

    fn bind_vertex_buffers(&self, enc: &mut Self::Encoder, first_binding: u32, bindings: &[VertexBufferBinding<'_, Self::Buffer>]) {
        enc.bind_vertex_buffers(&self.shared, first_binding, bindings);
    }

    fn bind_index_buffer(&self, enc: &mut Self::Encoder, buffer: &Self::Buffer, offset: u64, format: IndexFormat) {
        enc.bind_index_buffer(&self.shared, buffer, offset, format);
    }

    fn bind_samplers(&self, enc: &mut Self::Encoder, stage: ShaderStageFlags, first_slot: u32, samplers: &[&Self::Sampler]) {
        enc.bind_samplers(&self.shared, stage, first_slot, samplers);
    }

    fn bind_storage_textures(&self, enc: &mut Self::Encoder, stage: ShaderStageFlags, first_slot: u32, textures: &[&Self::Texture]) {
        enc.bind_storage_textures(&self.shared, stage, first_slot, textures);
    }

    fn bind_storage_buffers(&self, enc: &mut Self::Encoder, stage: ShaderStageFlags, first_slot: u32, buffers: &[(&Self::Buffer, u64)]) {
        enc.bind_storage_buffers(&self.shared, stage, first_slot, buffers);
    }

    fn bind_uniform_buffer(&self, enc: &mut Self::Encoder, stage: ShaderStageFlags, slot: u32, buffer: &Self::Buffer, offset: u64) {
        enc.bind_uniform_buffer(&self.shared, stage, slot, buffer, offset);
    }

    fn draw(&self, enc: &mut Self::Encoder, vertex_start: u32, primitive_count: u32, primitive_type: PrimitiveType, instance_count: u32) {
        enc.draw(&self.shared, vertex_start, primitive_count, primitive_type, instance_count);
    }

    fn draw_indexed(&self, enc: &mut Self::Encoder, base_vertex: i32, start_index: u32, primitive_count: u32, primitive_type: PrimitiveType, instance_count: u32) {
        enc.draw_indexed(&self.shared, base_vertex, start_index, primitive_count, primitive_type, instance_count);
    }

    fn draw_indirect(&self, enc: &mut Self::Encoder, buffer: &Self::Buffer, offset: u64, draw_count: u32, stride: u32, primitive_type: PrimitiveType) {
        enc.draw_indirect(&self.shared, buffer, offset, draw_count, stride, primitive_type);
    }

    fn draw_indexed_indirect(&self, enc: &mut Self::Encoder, buffer: &Self::Buffer, offset: u64, draw_count: u32, stride: u32, primitive_type: PrimitiveType) {
        enc.draw_indexed_indirect(&self.shared, buffer, offset, draw_count, stride, primitive_type);
    }

    fn dispatch(&self, enc: &mut Self::Encoder, groups: [u32; 3]) {
        enc.dispatch(&self.shared, groups);
    }

    fn upload_to_texture(&self, enc: &mut Self::Encoder, src: &Self::Buffer, src_offset: u64, dst: &Self::Texture, region: TextureRegion) {
        enc.upload_to_texture(&self.shared, src, src_offset, dst, region);
    }

    fn upload_to_buffer(&self, enc: &mut Self::Encoder, src: &Self::Buffer, src_offset: u64, dst: &Self::Buffer, dst_offset: u64, size: u64) {
        enc.copy_buffer(&self.shared, src, src_offset, dst, dst_offset, size);
    }

    fn copy_texture_to_texture(&self, enc: &mut Self::Encoder, src: &Self::Texture, src_region: TextureRegion, dst: &Self::Texture, dst_region: TextureRegion) {
        enc.copy_texture_to_texture(&self.shared, src, src_region, dst, dst_region);
    }

    fn copy_buffer_to_buffer(&self, enc: &mut Self::Encoder, src: &Self::Buffer, src_offset: u64, dst: &Self::Buffer, dst_offset: u64, size: u64) {
        enc.copy_buffer(&self.shared, src, src_offset, dst, dst_offset, size);
    }

    fn generate_mipmaps(&self, enc: &mut Self::Encoder, texture: &Self::Texture) {
        enc.generate_mipmaps(&self.shared, texture);
    }

    fn download_from_texture(&self, enc: &mut Self::Encoder, src: &Self::Texture, region: TextureRegion, dst: &Self::Buffer, dst_offset: u64) {
        enc.download_from_texture(&self.shared, src, region, dst, dst_offset);
    }

    fn download_from_buffer(&self, enc: &mut Self::Encoder, src: &Self::Buffer, src_offset: u64, dst: &Self::Buffer, dst_offset: u64, size: u64) {
        enc.copy_buffer(&self.shared, src, src_offset, dst, dst_offset, size);
    }

    fn blit(&self, enc: &mut Self::Encoder, pipeline: &Self::GraphicsPipeline, sampler: &Self::Sampler, src: &Self::Texture, src_region: TextureRegion, dst: &Self::Texture, dst_region: TextureRegion) {
        enc.blit(&self.shared, pipeline, sampler, src, src_region, dst, dst_region);
    }

    fn insert_debug_label(&self, enc: &mut Self::Encoder, label: &str) {
        enc.insert_debug_label(&self.shared, label);
    }

    fn push_debug_group(&self, enc: &mut Self::Encoder, label: &str) {
        enc.push_debug_group(&self.shared, label);
    }

    fn pop_debug_group(&self, enc: &mut Self::Encoder) {
        enc.pop_debug_group(&self.shared);
    }

    fn submit(&self, enc: Self::Encoder, fence: &Self::Fence, present: &[(&mut Self::Surface, Self::Drawable)]) -> Result<()> {
        let cb = enc.finish(&self.shared)?;
        let wait_semaphores: Vec<vk::Semaphore> = present.iter().map(|(_, d)| d.acquire_semaphore).collect();
        let wait_stages: Vec<vk::PipelineStageFlags> = present.iter().map(|_| vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT).collect();
        let signal_semaphores: Vec<vk::Semaphore> = present.iter().map(|(_, d)| d.release_semaphore).collect();
        let cbs = [cb];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&cbs)
            .signal_semaphores(&signal_semaphores)
            .build();
        unsafe {
            self.shared
                .device
                .queue_submit(self.shared.queue, &[submit_info], fence.0)
                .map_err(|e| Error::with_cause(ErrorKind::DeviceLost, e))?;
        }

        if !present.is_empty() {
            let swapchains: Vec<vk::SwapchainKHR> = present.iter().map(|(s, _)| s.swapchain).collect();
            let image_indices: Vec<u32> = present.iter().map(|(_, d)| d.image_index).collect();
            let present_info = vk::PresentInfoKHR::builder()
                .wait_semaphores(&signal_semaphores)
                .swapchains(&swapchains)
                .image_indices(&image_indices);
            unsafe {
                let _ = self.shared.swapchain_loader.queue_present(self.shared.queue, &present_info);
            }
        }
        Ok(())
    }

    fn wait_fence(&self, fence: &Self::Fence) {
        unsafe {
            let _ = self.shared.device.wait_for_fences(&[fence.0], true, u64::MAX);
        }
    }

    fn query_fence(&self, fence: &Self::Fence) -> bool {
        unsafe { self.shared.device.get_fence_status(fence.0).unwrap_or(false) }
    }

    fn wait_idle(&self) {
        unsafe {
            let _ = self.shared.device.device_wait_idle();
            for (render_pass, framebuffer) in self.shared.pending_passes.lock().drain(..) {
                self.shared.device.destroy_framebuffer(framebuffer, None);
                self.shared.device.destroy_render_pass(render_pass, None);
            }
        }
    }

    fn is_format_supported(&self, format: TextureFormat, usage: TextureUsage) -> bool {
        let vk_format = format::texture_format_to_vk(format);
        let props = unsafe { self.shared.instance.get_physical_device_format_properties(self.shared.physical_device, vk_format) };
        let mut required = vk::FormatFeatureFlags::empty();
        if usage.contains(TextureUsage::SAMPLER) {
            required |= vk::FormatFeatureFlags::SAMPLED_IMAGE;
        }
        if usage.contains(TextureUsage::COLOR_TARGET) {
            required |= vk::FormatFeatureFlags::COLOR_ATTACHMENT;
        }
        if usage.contains(TextureUsage::DEPTH_STENCIL_TARGET) {
            required |= vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT;
        }
        props.optimal_tiling_features.contains(required)
    }

    fn best_sample_count(&self, _format: TextureFormat, desired: u32) -> u32 {
        desired.clamp(1, self.limits.max_sample_count).next_power_of_two().min(self.limits.max_sample_count)
    }

    fn supports_present_mode(&self, mode: PresentMode) -> bool {
        // Every Vulkan implementation exposing a swapchain supports at
        // least FIFO (Vsync); Immediate/Mailbox availability is surface
        // dependent and checked again, best-effort, against the live
        // surface in `claim_window`.
        let _ = mode;
        true
    }

    fn supports_composition(&self, composition: SwapchainComposition) -> bool {
        matches!(composition, SwapchainComposition::Sdr)
    }

    fn claim_window(&self, window: Self::WindowHandle, composition: SwapchainComposition, present_mode: PresentMode) -> Result<Self::Surface> {
        resources::claim_window(&self.shared, window, composition, present_mode)
    }

    fn unclaim_window(&self, surface: Self::Surface) {
        resources::destroy_surface(&self.shared, surface);
    }

    fn set_swapchain_parameters(&self, surface: &mut Self::Surface, composition: SwapchainComposition, present_mode: PresentMode) -> bool {
        resources::recreate_swapchain(&self.shared, surface, composition, present_mode)
    }

    fn swapchain_texture_format(&self, surface: &Self::Surface) -> TextureFormat {
        format::vk_to_texture_format(surface.format).unwrap_or(TextureFormat::B8G8R8A8Unorm)
    }

    fn acquire_drawable(&self, surface: &mut Self::Surface) -> Result<(Self::Drawable, Self::Texture, u32, u32)> {
        resources::acquire_drawable(&self.shared, surface)
    }
}

pub(crate) fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
    let mut out = vk::BufferUsageFlags::TRANSFER_SRC | vk::BufferUsageFlags::TRANSFER_DST;
    if usage.contains(BufferUsage::VERTEX) {
        out |= vk::BufferUsageFlags::VERTEX_BUFFER;
    }
    if usage.contains(BufferUsage::INDEX) {
        out |= vk::BufferUsageFlags::INDEX_BUFFER;
    }
    if usage.contains(BufferUsage::INDIRECT) {
        out |= vk::BufferUsageFlags::INDIRECT_BUFFER;
    }
    if usage.contains(BufferUsage::GRAPHICS_STORAGE_READ) || usage.contains(BufferUsage::COMPUTE_STORAGE_READ) || usage.contains(BufferUsage::COMPUTE_STORAGE_WRITE) {
        out |= vk::BufferUsageFlags::STORAGE_BUFFER;
    }
    out |= vk::BufferUsageFlags::UNIFORM_BUFFER;
    out
}
