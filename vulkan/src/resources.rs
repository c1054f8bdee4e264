//! Native resource construction: translating descriptor structs into the
//! `vk::*CreateInfo` calls made once per resource (spec §4.7).
use crate::format::{texture_format_to_vk, vertex_format_to_vk};
use crate::VulkanShared;
use ash::vk;
use nyxgfx_base::*;
use std::ffi::CString;
use std::sync::Arc;

/// A swapchain-acquired image has no allocation to free and is owned by the
/// swapchain, not this texture; everything else is backend-owned and torn
/// down on drop, each resource struct holding its owning shared state and
/// destroying its native handle in `Drop`.
#[derive(Debug)]
pub struct VulkanTexture {
    pub image: vk::Image,
    pub view: vk::ImageView,
    pub format: vk::Format,
    pub extent: vk::Extent3D,
    allocation: Option<vk_mem::Allocation>,
    shared: Option<Arc<VulkanShared>>,
}

impl Drop for VulkanTexture {
    fn drop(&mut self) {
        if let Some(shared) = &self.shared {
            unsafe {
                shared.device.destroy_image_view(self.view, None);
            }
            if let Some(allocation) = &self.allocation {
                let _ = shared.allocator.destroy_image(self.image, allocation);
            }
        }
    }
}

#[derive(Debug)]
pub struct VulkanBuffer {
    pub buffer: vk::Buffer,
    pub(crate) allocation: vk_mem::Allocation,
    pub size: u64,
    shared: Arc<VulkanShared>,
}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        let _ = self.shared.allocator.destroy_buffer(self.buffer, &self.allocation);
    }
}

#[derive(Debug)]
pub struct VulkanSampler {
    pub sampler: vk::Sampler,
    shared: Arc<VulkanShared>,
}

impl Drop for VulkanSampler {
    fn drop(&mut self) {
        unsafe { self.shared.device.destroy_sampler(self.sampler, None) };
    }
}

#[derive(Debug)]
pub struct VulkanShader {
    pub module: vk::ShaderModule,
    pub stage: vk::ShaderStageFlags,
    pub entry_point: CString,
    shared: Arc<VulkanShared>,
}

impl Drop for VulkanShader {
    fn drop(&mut self) {
        unsafe { self.shared.device.destroy_shader_module(self.module, None) };
    }
}

#[derive(Debug)]
pub struct VulkanGraphicsPipeline {
    pub pipeline: vk::Pipeline,
    pub layout: vk::PipelineLayout,
    pub render_pass: vk::RenderPass,
    shared: Arc<VulkanShared>,
}

impl Drop for VulkanGraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.shared.device.destroy_pipeline(self.pipeline, None);
            self.shared.device.destroy_pipeline_layout(self.layout, None);
            self.shared.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

#[derive(Debug)]
pub struct VulkanComputePipeline {
    pub pipeline: vk::Pipeline,
    pub layout: vk::PipelineLayout,
    shared: Arc<VulkanShared>,
}

impl Drop for VulkanComputePipeline {
    fn drop(&mut self) {
        unsafe {
            self.shared.device.destroy_pipeline(self.pipeline, None);
            self.shared.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

#[derive(Debug)]
pub struct VulkanSurface {
    pub surface: vk::SurfaceKHR,
    pub swapchain: vk::SwapchainKHR,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
    pub present_mode: vk::PresentModeKHR,
    pub images: Vec<vk::Image>,
    pub views: Vec<vk::ImageView>,
    pub acquire_semaphore: vk::Semaphore,
}

#[derive(Debug)]
pub struct VulkanDrawable {
    pub image_index: u32,
    pub acquire_semaphore: vk::Semaphore,
    pub release_semaphore: vk::Semaphore,
}

fn texture_usage_to_vk(usage: TextureUsage) -> vk::ImageUsageFlags {
    let mut out = vk::ImageUsageFlags::TRANSFER_SRC | vk::ImageUsageFlags::TRANSFER_DST;
    if usage.contains(TextureUsage::SAMPLER) {
        out |= vk::ImageUsageFlags::SAMPLED;
    }
    if usage.contains(TextureUsage::COLOR_TARGET) {
        out |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
    }
    if usage.contains(TextureUsage::DEPTH_STENCIL_TARGET) {
        out |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT;
    }
    if usage.contains(TextureUsage::GRAPHICS_STORAGE_READ) || usage.contains(TextureUsage::COMPUTE_STORAGE_READ) || usage.contains(TextureUsage::COMPUTE_STORAGE_WRITE) {
        out |= vk::ImageUsageFlags::STORAGE;
    }
    out
}

pub fn create_texture(shared: &Arc<VulkanShared>, desc: &TextureDescriptor) -> Result<VulkanTexture> {
    let format = texture_format_to_vk(desc.format);
    let extent = vk::Extent3D {
        width: desc.width,
        height: desc.height,
        depth: if desc.is_cube { 1 } else { desc.depth_or_layers.max(1) },
    };
    let array_layers = if desc.is_cube { desc.depth_or_layers.max(6) } else { 1 };
    let image_info = vk::ImageCreateInfo::builder()
        .image_type(vk::ImageType::TYPE_2D)
        .format(format)
        .extent(extent)
        .mip_levels(desc.mip_levels.max(1))
        .array_layers(array_layers)
        .samples(sample_count_to_vk(desc.sample_count))
        .tiling(vk::ImageTiling::OPTIMAL)
        .usage(texture_usage_to_vk(desc.usage))
        .sharing_mode(vk::SharingMode::EXCLUSIVE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .flags(if desc.is_cube { vk::ImageCreateFlags::CUBE_COMPATIBLE } else { vk::ImageCreateFlags::empty() });

    let allocation_info = vk_mem::AllocationCreateInfo {
        usage: vk_mem::MemoryUsage::GpuOnly,
        ..Default::default()
    };
    let (image, allocation, _) = shared
        .allocator
        .create_image(&image_info, &allocation_info)
        .map_err(|e| Error::with_cause(ErrorKind::AllocationFailed, e))?;

    let view = create_image_view(shared, image, format, desc.has_depth_or_stencil())?;

    Ok(VulkanTexture {
        image,
        view,
        format,
        extent,
        allocation: Some(allocation),
        shared: Some(shared.clone()),
    })
}

fn create_image_view(shared: &VulkanShared, image: vk::Image, format: vk::Format, depth_stencil: bool) -> Result<vk::ImageView> {
    let aspect = if depth_stencil { vk::ImageAspectFlags::DEPTH } else { vk::ImageAspectFlags::COLOR };
    let view_info = vk::ImageViewCreateInfo::builder()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: aspect,
            base_mip_level: 0,
            level_count: vk::REMAINING_MIP_LEVELS,
            base_array_layer: 0,
            layer_count: vk::REMAINING_ARRAY_LAYERS,
        });
    unsafe { shared.device.create_image_view(&view_info, None) }.map_err(|e| Error::with_cause(ErrorKind::AllocationFailed, e))
}

trait TextureDescriptorExt {
    fn has_depth_or_stencil(&self) -> bool;
}

impl TextureDescriptorExt for TextureDescriptor {
    fn has_depth_or_stencil(&self) -> bool {
        self.format.has_depth() || self.format.has_stencil()
    }
}

fn sample_count_to_vk(count: u32) -> vk::SampleCountFlags {
    match count {
        1 => vk::SampleCountFlags::TYPE_1,
        2 => vk::SampleCountFlags::TYPE_2,
        4 => vk::SampleCountFlags::TYPE_4,
        8 => vk::SampleCountFlags::TYPE_8,
        16 => vk::SampleCountFlags::TYPE_16,
        _ => vk::SampleCountFlags::TYPE_1,
    }
}

pub fn create_buffer(shared: &Arc<VulkanShared>, size: u64, usage: vk::BufferUsageFlags) -> Result<VulkanBuffer> {
    let buffer_info = vk::BufferCreateInfo::builder().size(size.max(1)).usage(usage).sharing_mode(vk::SharingMode::EXCLUSIVE);
    let allocation_info = vk_mem::AllocationCreateInfo {
        usage: vk_mem::MemoryUsage::CpuToGpu,
        flags: vk_mem::AllocationCreateFlags::MAPPED,
        ..Default::default()
    };
    let (buffer, allocation, _) = shared
        .allocator
        .create_buffer(&buffer_info, &allocation_info)
        .map_err(|e| Error::with_cause(ErrorKind::AllocationFailed, e))?;
    Ok(VulkanBuffer {
        buffer,
        allocation,
        size,
        shared: shared.clone(),
    })
}

fn filter_to_vk(filter: Filter) -> vk::Filter {
    match filter {
        Filter::Nearest => vk::Filter::NEAREST,
        Filter::Linear => vk::Filter::LINEAR,
    }
}

fn mipmap_mode_to_vk(mode: MipmapMode) -> vk::SamplerMipmapMode {
    match mode {
        MipmapMode::Nearest => vk::SamplerMipmapMode::NEAREST,
        MipmapMode::Linear => vk::SamplerMipmapMode::LINEAR,
    }
}

fn address_mode_to_vk(mode: AddressMode) -> vk::SamplerAddressMode {
    match mode {
        AddressMode::Repeat => vk::SamplerAddressMode::REPEAT,
        AddressMode::MirroredRepeat => vk::SamplerAddressMode::MIRRORED_REPEAT,
        AddressMode::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        AddressMode::ClampToBorder => vk::SamplerAddressMode::CLAMP_TO_BORDER,
    }
}

pub fn create_sampler(shared: &Arc<VulkanShared>, desc: &SamplerDescriptor) -> Result<VulkanSampler> {
    let info = vk::SamplerCreateInfo::builder()
        .min_filter(filter_to_vk(desc.min_filter))
        .mag_filter(filter_to_vk(desc.mag_filter))
        .mipmap_mode(mipmap_mode_to_vk(desc.mipmap_mode))
        .address_mode_u(address_mode_to_vk(desc.address_u))
        .address_mode_v(address_mode_to_vk(desc.address_v))
        .address_mode_w(address_mode_to_vk(desc.address_w))
        .anisotropy_enable(desc.max_anisotropy > 1)
        .max_anisotropy(desc.max_anisotropy as f32)
        .max_lod(vk::LOD_CLAMP_NONE);
    let sampler = unsafe { shared.device.create_sampler(&info, None) }.map_err(|e| Error::with_cause(ErrorKind::AllocationFailed, e))?;
    Ok(VulkanSampler { sampler, shared: shared.clone() })
}

fn shader_stage_to_vk(stage: ShaderStageFlags) -> vk::ShaderStageFlags {
    let mut out = vk::ShaderStageFlags::empty();
    if stage.contains(ShaderStageFlags::VERTEX) {
        out |= vk::ShaderStageFlags::VERTEX;
    }
    if stage.contains(ShaderStageFlags::FRAGMENT) {
        out |= vk::ShaderStageFlags::FRAGMENT;
    }
    if stage.contains(ShaderStageFlags::COMPUTE) {
        out |= vk::ShaderStageFlags::COMPUTE;
    }
    out
}

pub fn create_shader(shared: &Arc<VulkanShared>, desc: &ShaderDescriptor<'_>) -> Result<VulkanShader> {
    if desc.format != ShaderFormat::Spirv {
        return Err(Error::new(ErrorKind::IncompatibleShaderFormat));
    }
    if desc.code.len() % 4 != 0 {
        return Err(Error::new(ErrorKind::CompilationFailed));
    }
    let words: Vec<u32> = desc.code.chunks_exact(4).map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]])).collect();
    let info = vk::ShaderModuleCreateInfo::builder().code(&words);
    let module = unsafe { shared.device.create_shader_module(&info, None) }.map_err(|e| Error::with_cause(ErrorKind::CompilationFailed, e))?;
    let entry_point = CString::new(desc.entry_point).map_err(|e| Error::with_cause(ErrorKind::CompilationFailed, e))?;
    Ok(VulkanShader {
        module,
        stage: shader_stage_to_vk(desc.stage),
        entry_point,
        shared: shared.clone(),
    })
}

/// A single push-descriptor-compatible layout shared by every pipeline:
/// one binding per uniform slot, sampler slot, and storage slot the
/// neutral binding model defines (spec §4.2). Generous but fixed, the same
/// tradeoff the shadow tables in `nyxgfx-core` make to avoid a
/// per-pipeline reflection step.
fn push_descriptor_set_layout(shared: &VulkanShared) -> Result<vk::DescriptorSetLayout> {
    let mut bindings = Vec::new();
    for slot in 0..(MAX_UNIFORM_SLOTS as u32) {
        bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(slot)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::ALL)
                .build(),
        );
    }
    for slot in 0..(MAX_BINDING_SLOTS as u32) {
        bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(MAX_UNIFORM_SLOTS as u32 + slot)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::ALL)
                .build(),
        );
    }
    let info = vk::DescriptorSetLayoutCreateInfo::builder()
        .flags(vk::DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR_KHR)
        .bindings(&bindings);
    unsafe { shared.device.create_descriptor_set_layout(&info, None) }.map_err(|e| Error::with_cause(ErrorKind::AllocationFailed, e))
}

fn pipeline_layout(shared: &VulkanShared) -> Result<(vk::PipelineLayout, vk::DescriptorSetLayout)> {
    let set_layout = push_descriptor_set_layout(shared)?;
    let set_layouts = [set_layout];
    let info = vk::PipelineLayoutCreateInfo::builder().set_layouts(&set_layouts);
    let layout = unsafe { shared.device.create_pipeline_layout(&info, None) }.map_err(|e| Error::with_cause(ErrorKind::AllocationFailed, e))?;
    Ok((layout, set_layout))
}

fn compare_op_to_vk(op: CompareOp) -> vk::CompareOp {
    match op {
        CompareOp::Never => vk::CompareOp::NEVER,
        CompareOp::Less => vk::CompareOp::LESS,
        CompareOp::Equal => vk::CompareOp::EQUAL,
        CompareOp::LessEqual => vk::CompareOp::LESS_OR_EQUAL,
        CompareOp::Greater => vk::CompareOp::GREATER,
        CompareOp::NotEqual => vk::CompareOp::NOT_EQUAL,
        CompareOp::GreaterEqual => vk::CompareOp::GREATER_OR_EQUAL,
        CompareOp::Always => vk::CompareOp::ALWAYS,
    }
}

fn primitive_type_to_vk(ty: PrimitiveType) -> vk::PrimitiveTopology {
    match ty {
        PrimitiveType::PointList => vk::PrimitiveTopology::POINT_LIST,
        PrimitiveType::LineList => vk::PrimitiveTopology::LINE_LIST,
        PrimitiveType::LineStrip => vk::PrimitiveTopology::LINE_STRIP,
        PrimitiveType::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveType::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
    }
}

pub fn create_graphics_pipeline(shared: &Arc<VulkanShared>, desc: &GraphicsPipelineDescriptor<'_>, shaders: (&VulkanShader, Option<&VulkanShader>)) -> Result<VulkanGraphicsPipeline> {
    let (layout, _set_layout) = pipeline_layout(shared)?;
    let render_pass = crate::renderpass::create_simple_render_pass(
        shared,
        &desc.color_targets.iter().map(|c| texture_format_to_vk(c.format)).collect::<Vec<_>>(),
        desc.depth_stencil_format.map(texture_format_to_vk),
        desc.sample_count,
    )?;

    let (vs, fs) = shaders;
    let mut stages = vec![vk::PipelineShaderStageCreateInfo::builder()
        .stage(vk::ShaderStageFlags::VERTEX)
        .module(vs.module)
        .name(&vs.entry_point)
        .build()];
    if let Some(fs) = fs {
        stages.push(vk::PipelineShaderStageCreateInfo::builder().stage(vk::ShaderStageFlags::FRAGMENT).module(fs.module).name(&fs.entry_point).build());
    }

    let mut bindings = Vec::new();
    let mut attributes = Vec::new();
    for (binding_index, layout_desc) in desc.vertex_buffers.iter().enumerate() {
        bindings.push(
            vk::VertexInputBindingDescription::builder()
                .binding(binding_index as u32)
                .stride(layout_desc.stride)
                .input_rate(if layout_desc.instanced { vk::VertexInputRate::INSTANCE } else { vk::VertexInputRate::VERTEX })
                .build(),
        );
        for attr in &layout_desc.attributes {
            attributes.push(
                vk::VertexInputAttributeDescription::builder()
                    .location(attr.location)
                    .binding(binding_index as u32)
                    .format(vertex_format_to_vk(attr.format))
                    .offset(attr.offset)
                    .build(),
            );
        }
    }
    let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder().vertex_binding_descriptions(&bindings).vertex_attribute_descriptions(&attributes);
    let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder().topology(primitive_type_to_vk(desc.primitive_type));
    let viewport_state = vk::PipelineViewportStateCreateInfo::builder().viewport_count(1).scissor_count(1);
    let rasterization = vk::PipelineRasterizationStateCreateInfo::builder()
        .polygon_mode(if desc.fill_mode == FillMode::Line { vk::PolygonMode::LINE } else { vk::PolygonMode::FILL })
        .cull_mode(match desc.cull_mode {
            CullMode::None => vk::CullModeFlags::NONE,
            CullMode::Front => vk::CullModeFlags::FRONT,
            CullMode::Back => vk::CullModeFlags::BACK,
        })
        .front_face(if desc.front_face == FrontFace::Clockwise { vk::FrontFace::CLOCKWISE } else { vk::FrontFace::COUNTER_CLOCKWISE })
        .depth_bias_enable(desc.depth_bias.is_some())
        .depth_bias_constant_factor(desc.depth_bias.map(|b| b.constant_factor).unwrap_or(0.0))
        .depth_bias_clamp(desc.depth_bias.map(|b| b.clamp).unwrap_or(0.0))
        .depth_bias_slope_factor(desc.depth_bias.map(|b| b.slope_factor).unwrap_or(0.0))
        .line_width(1.0);
    let multisample = vk::PipelineMultisampleStateCreateInfo::builder().rasterization_samples(sample_count_to_vk(desc.sample_count)).sample_mask(&[desc.sample_mask]);
    let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
        .depth_test_enable(desc.depth_stencil.depth_test_enable)
        .depth_write_enable(desc.depth_stencil.depth_write_enable)
        .depth_compare_op(compare_op_to_vk(desc.depth_stencil.depth_compare))
        .stencil_test_enable(desc.depth_stencil.stencil_test_enable);
    let attachments: Vec<vk::PipelineColorBlendAttachmentState> = desc
        .color_targets
        .iter()
        .map(|t| {
            vk::PipelineColorBlendAttachmentState::builder()
                .blend_enable(t.blend.enabled)
                .color_write_mask(vk::ColorComponentFlags::from_raw(t.blend.write_mask.bits() as u32))
                .build()
        })
        .collect();
    let color_blend = vk::PipelineColorBlendStateCreateInfo::builder().attachments(&attachments).blend_constants(desc.blend_constants);
    let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
    let dynamic_state = vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dynamic_states);

    let info = vk::GraphicsPipelineCreateInfo::builder()
        .stages(&stages)
        .vertex_input_state(&vertex_input)
        .input_assembly_state(&input_assembly)
        .viewport_state(&viewport_state)
        .rasterization_state(&rasterization)
        .multisample_state(&multisample)
        .depth_stencil_state(&depth_stencil)
        .color_blend_state(&color_blend)
        .dynamic_state(&dynamic_state)
        .layout(layout)
        .render_pass(render_pass)
        .subpass(0)
        .build();

    let pipelines = unsafe { shared.device.create_graphics_pipelines(vk::PipelineCache::null(), &[info], None) }.map_err(|(_, e)| Error::with_cause(ErrorKind::CompilationFailed, e))?;
    Ok(VulkanGraphicsPipeline {
        pipeline: pipelines[0],
        layout,
        render_pass,
        shared: shared.clone(),
    })
}

pub fn create_compute_pipeline(shared: &Arc<VulkanShared>, desc: &ComputePipelineDescriptor<'_>, shader: &VulkanShader) -> Result<VulkanComputePipeline> {
    let (layout, _set_layout) = pipeline_layout(shared)?;
    let stage = vk::PipelineShaderStageCreateInfo::builder().stage(vk::ShaderStageFlags::COMPUTE).module(shader.module).name(&shader.entry_point).build();
    let info = vk::ComputePipelineCreateInfo::builder().stage(stage).layout(layout).build();
    let pipelines = unsafe { shared.device.create_compute_pipelines(vk::PipelineCache::null(), &[info], None) }.map_err(|(_, e)| Error::with_cause(ErrorKind::CompilationFailed, e))?;
    let _ = desc.threadgroup_size;
    Ok(VulkanComputePipeline {
        pipeline: pipelines[0],
        layout,
        shared: shared.clone(),
    })
}

fn present_mode_to_vk(mode: PresentMode) -> vk::PresentModeKHR {
    match mode {
        PresentMode::Vsync => vk::PresentModeKHR::FIFO,
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
    }
}

/// `ash-window` wants types implementing `HasRawWindowHandle` /
/// `HasRawDisplayHandle`; the neutral API only carries the already-raw
/// handles (windowing is out of scope), so this wraps them back up.
struct RawHandlePair {
    window: raw_window_handle::RawWindowHandle,
    display: raw_window_handle::RawDisplayHandle,
}

unsafe impl raw_window_handle::HasRawWindowHandle for RawHandlePair {
    fn raw_window_handle(&self) -> raw_window_handle::RawWindowHandle {
        self.window
    }
}

unsafe impl raw_window_handle::HasRawDisplayHandle for RawHandlePair {
    fn raw_display_handle(&self) -> raw_window_handle::RawDisplayHandle {
        self.display
    }
}

pub fn claim_window(shared: &VulkanShared, window: raw_window_handle::RawWindowHandle, composition: SwapchainComposition, present_mode: PresentMode) -> Result<VulkanSurface> {
    let _ = composition;
    let display = raw_window_handle::RawDisplayHandle::Windows(raw_window_handle::WindowsDisplayHandle::empty());
    let handles = RawHandlePair { window, display };
    let surface = unsafe { ash_window::create_surface(&shared.entry, &shared.instance, &handles, None) }.map_err(|e| Error::with_cause(ErrorKind::BackendUnavailable, e))?;

    let surface_caps = unsafe { shared.surface_loader.get_physical_device_surface_capabilities(shared.physical_device, surface) }.map_err(|e| Error::with_cause(ErrorKind::BackendUnavailable, e))?;
    let surface_formats = unsafe { shared.surface_loader.get_physical_device_surface_formats(shared.physical_device, surface) }.map_err(|e| Error::with_cause(ErrorKind::BackendUnavailable, e))?;
    let format = surface_formats.first().map(|f| f.format).unwrap_or(vk::Format::B8G8R8A8_UNORM);
    let color_space = surface_formats.first().map(|f| f.color_space).unwrap_or(vk::ColorSpaceKHR::SRGB_NONLINEAR);
    let extent = surface_caps.current_extent;

    let mut vk_surface = VulkanSurface {
        surface,
        swapchain: vk::SwapchainKHR::null(),
        format,
        extent,
        present_mode: present_mode_to_vk(present_mode),
        images: Vec::new(),
        views: Vec::new(),
        acquire_semaphore: unsafe { shared.device.create_semaphore(&vk::SemaphoreCreateInfo::builder(), None) }.map_err(|e| Error::with_cause(ErrorKind::AllocationFailed, e))?,
    };
    build_swapchain(shared, &mut vk_surface, surface_caps, color_space)?;
    Ok(vk_surface)
}

fn build_swapchain(shared: &VulkanShared, surface: &mut VulkanSurface, caps: vk::SurfaceCapabilitiesKHR, color_space: vk::ColorSpaceKHR) -> Result<()> {
    let image_count = (caps.min_image_count + 1).min(if caps.max_image_count == 0 { u32::MAX } else { caps.max_image_count });
    let info = vk::SwapchainCreateInfoKHR::builder()
        .surface(surface.surface)
        .min_image_count(image_count)
        .image_format(surface.format)
        .image_color_space(color_space)
        .image_extent(surface.extent)
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST)
        .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        .pre_transform(caps.current_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(surface.present_mode)
        .clipped(true)
        .old_swapchain(surface.swapchain);
    let swapchain = unsafe { shared.swapchain_loader.create_swapchain(&info, None) }.map_err(|e| Error::with_cause(ErrorKind::AllocationFailed, e))?;
    let images = unsafe { shared.swapchain_loader.get_swapchain_images(swapchain) }.map_err(|e| Error::with_cause(ErrorKind::AllocationFailed, e))?;
    let mut views = Vec::with_capacity(images.len());
    for image in &images {
        views.push(create_image_view(shared, *image, surface.format, false)?);
    }
    surface.swapchain = swapchain;
    surface.images = images;
    surface.views = views;
    Ok(())
}

pub fn recreate_swapchain(shared: &VulkanShared, surface: &mut VulkanSurface, composition: SwapchainComposition, present_mode: PresentMode) -> bool {
    let _ = composition;
    surface.present_mode = present_mode_to_vk(present_mode);
    let caps = match unsafe { shared.surface_loader.get_physical_device_surface_capabilities(shared.physical_device, surface.surface) } {
        Ok(c) => c,
        Err(_) => return false,
    };
    surface.extent = caps.current_extent;
    build_swapchain(shared, surface, caps, vk::ColorSpaceKHR::SRGB_NONLINEAR).is_ok()
}

pub fn destroy_surface(shared: &VulkanShared, surface: VulkanSurface) {
    unsafe {
        for view in &surface.views {
            shared.device.destroy_image_view(*view, None);
        }
        shared.swapchain_loader.destroy_swapchain(surface.swapchain, None);
        shared.surface_loader.destroy_surface(surface.surface, None);
        shared.device.destroy_semaphore(surface.acquire_semaphore, None);
    }
}

pub fn acquire_drawable(shared: &VulkanShared, surface: &mut VulkanSurface) -> Result<(VulkanDrawable, VulkanTexture, u32, u32)> {
    let (image_index, _suboptimal) = unsafe { shared.swapchain_loader.acquire_next_image(surface.swapchain, u64::MAX, surface.acquire_semaphore, vk::Fence::null()) }
        .map_err(|e| Error::with_cause(ErrorKind::DeviceLost, e))?;
    let release_semaphore = unsafe { shared.device.create_semaphore(&vk::SemaphoreCreateInfo::builder(), None) }.map_err(|e| Error::with_cause(ErrorKind::AllocationFailed, e))?;
    let texture = VulkanTexture {
        image: surface.images[image_index as usize],
        view: surface.views[image_index as usize],
        format: surface.format,
        extent: vk::Extent3D {
            width: surface.extent.width,
            height: surface.extent.height,
            depth: 1,
        },
        allocation: None,
        shared: None,
    };
    let drawable = VulkanDrawable {
        image_index,
        acquire_semaphore: surface.acquire_semaphore,
        release_semaphore,
    };
    Ok((drawable, texture, surface.extent.width, surface.extent.height))
}
