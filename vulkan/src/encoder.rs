//! Command recording. Binding-slot writes go out through
//! `VK_KHR_push_descriptor` instead of a descriptor-pool/set lifecycle (see
//! the module doc on `crate`): every `bind_*` call here is a
//! `cmd_push_descriptor_set_khr` with one `vk::WriteDescriptorSet`, matching
//! how `nyxgfx-core`'s shadow tables re-issue the whole binding state just
//! before a draw or dispatch rather than diffing it.
use crate::renderpass::create_framebuffer;
use crate::resources::{VulkanBuffer, VulkanComputePipeline, VulkanGraphicsPipeline, VulkanSampler, VulkanTexture};
use crate::VulkanShared;
use ash::vk;
use nyxgfx_base::*;
use nyxgfx_common::Rect2D;
use nyxgfx_core::backend::{RenderPassDescriptor, TextureRegion, VertexBufferBinding};

/// A recorded Vulkan command buffer plus the bits of state needed to finish
/// a render pass and bind a blit-copy pipeline on demand.
#[derive(Debug)]
pub struct VulkanEncoder {
    cb: vk::CommandBuffer,
    in_render_pass: bool,
    current_layout: vk::PipelineLayout,
}

impl VulkanEncoder {
    pub fn new(cb: vk::CommandBuffer) -> Self {
        Self {
            cb,
            in_render_pass: false,
            current_layout: vk::PipelineLayout::null(),
        }
    }

    pub fn begin_render_pass(&mut self, shared: &VulkanShared, desc: &RenderPassDescriptor<'_, crate::VulkanBackend>) {
        let color_formats: Vec<vk::Format> = desc.colors.iter().map(|c| c.texture.format).collect();
        let depth_format = desc.depth_stencil.as_ref().map(|d| d.texture.format);
        let sample_count = 1;
        let render_pass = match crate::renderpass::create_simple_render_pass(shared, &color_formats, depth_format, sample_count) {
            Ok(rp) => rp,
            Err(e) => {
                log::error!("failed to create render pass: {e}");
                return;
            }
        };

        let mut views: Vec<vk::ImageView> = desc.colors.iter().map(|c| c.texture.view).collect();
        let mut extent = desc.colors.first().map(|c| (c.texture.extent.width, c.texture.extent.height)).unwrap_or((1, 1));
        if let Some(ds) = &desc.depth_stencil {
            views.push(ds.texture.view);
            extent = (ds.texture.extent.width, ds.texture.extent.height);
        }

        let framebuffer = match create_framebuffer(shared, render_pass, &views, extent.0, extent.1) {
            Ok(fb) => fb,
            Err(e) => {
                log::error!("failed to create framebuffer: {e}");
                unsafe { shared.device.destroy_render_pass(render_pass, None) };
                return;
            }
        };

        let mut clear_values: Vec<vk::ClearValue> = desc
            .colors
            .iter()
            .map(|c| vk::ClearValue {
                color: vk::ClearColorValue { float32: c.clear_color },
            })
            .collect();
        if let Some(ds) = &desc.depth_stencil {
            clear_values.push(vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: ds.clear_depth,
                    stencil: ds.clear_stencil,
                },
            });
        }

        let begin_info = vk::RenderPassBeginInfo::builder()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D { width: extent.0, height: extent.1 },
            })
            .clear_values(&clear_values);
        unsafe { shared.device.cmd_begin_render_pass(self.cb, &begin_info, vk::SubpassContents::INLINE) };
        shared.pending_passes.lock().push((render_pass, framebuffer));
        self.in_render_pass = true;
    }

    pub fn end_render_pass(&mut self, shared: &VulkanShared) {
        if self.in_render_pass {
            unsafe { shared.device.cmd_end_render_pass(self.cb) };
            self.in_render_pass = false;
        }
    }

    pub fn begin_compute_pass(&mut self) {}
    pub fn end_compute_pass(&mut self) {}
    pub fn begin_copy_pass(&mut self) {}
    pub fn end_copy_pass(&mut self) {}

    pub fn bind_graphics_pipeline(&mut self, shared: &VulkanShared, pipeline: &VulkanGraphicsPipeline) {
        unsafe { shared.device.cmd_bind_pipeline(self.cb, vk::PipelineBindPoint::GRAPHICS, pipeline.pipeline) };
        self.current_layout = pipeline.layout;
    }

    pub fn bind_compute_pipeline(&mut self, shared: &VulkanShared, pipeline: &VulkanComputePipeline) {
        unsafe { shared.device.cmd_bind_pipeline(self.cb, vk::PipelineBindPoint::COMPUTE, pipeline.pipeline) };
        self.current_layout = pipeline.layout;
    }

    pub fn set_viewport(&mut self, shared: &VulkanShared, rect: Rect2D<u32>, depth: (f32, f32)) {
        let viewport = vk::Viewport {
            x: rect.min[0] as f32,
            y: rect.min[1] as f32,
            width: rect.width() as f32,
            height: rect.height() as f32,
            min_depth: depth.0,
            max_depth: depth.1,
        };
        unsafe { shared.device.cmd_set_viewport(self.cb, 0, &[viewport]) };
    }

    pub fn set_scissor(&mut self, shared: &VulkanShared, rect: Rect2D<u32>) {
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: rect.min[0] as i32, y: rect.min[1] as i32 },
            extent: vk::Extent2D { width: rect.width(), height: rect.height() },
        };
        unsafe { shared.device.cmd_set_scissor(self.cb, 0, &[scissor]) };
    }

    pub fn bind_vertex_buffers(&mut self, shared: &VulkanShared, first_binding: u32, bindings: &[VertexBufferBinding<'_, VulkanBuffer>]) {
        let buffers: Vec<vk::Buffer> = bindings.iter().map(|b| b.buffer.buffer).collect();
        let offsets: Vec<vk::DeviceSize> = bindings.iter().map(|b| b.offset).collect();
        unsafe { shared.device.cmd_bind_vertex_buffers(self.cb, first_binding, &buffers, &offsets) };
    }

    pub fn bind_index_buffer(&mut self, shared: &VulkanShared, buffer: &VulkanBuffer, offset: u64, format: IndexFormat) {
        let index_type = match format {
            IndexFormat::Uint16 => vk::IndexType::UINT16,
            IndexFormat::Uint32 => vk::IndexType::UINT32,
        };
        unsafe { shared.device.cmd_bind_index_buffer(self.cb, buffer.buffer, offset, index_type) };
    }

    fn push_writes(&self, shared: &VulkanShared, bind_point: vk::PipelineBindPoint, writes: &[vk::WriteDescriptorSet]) {
        if writes.is_empty() {
            return;
        }
        unsafe {
            shared.push_descriptor_loader.cmd_push_descriptor_set(self.cb, bind_point, self.current_layout, 0, writes);
        }
    }

    /// Every layout this backend builds shares the same binding scheme
    /// (spec §4.2), so pushing against whichever pipeline is currently
    /// bound always matches the write's binding numbers.
    fn bind_points(&self, stage: ShaderStageFlags) -> Vec<vk::PipelineBindPoint> {
        let mut out = Vec::new();
        if stage.contains(ShaderStageFlags::VERTEX) || stage.contains(ShaderStageFlags::FRAGMENT) {
            out.push(vk::PipelineBindPoint::GRAPHICS);
        }
        if stage.contains(ShaderStageFlags::COMPUTE) {
            out.push(vk::PipelineBindPoint::COMPUTE);
        }
        out
    }

    pub fn bind_samplers(&mut self, shared: &VulkanShared, stage: ShaderStageFlags, first_slot: u32, samplers: &[&VulkanSampler]) {
        let infos: Vec<vk::DescriptorImageInfo> = samplers
            .iter()
            .map(|s| vk::DescriptorImageInfo::builder().sampler(s.sampler).build())
            .collect();
        for (i, info) in infos.iter().enumerate() {
            let writes = [vk::WriteDescriptorSet::builder()
                .dst_binding(MAX_UNIFORM_SLOTS as u32 + first_slot + i as u32)
                .dst_array_element(0)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .image_info(std::slice::from_ref(info))
                .build()];
            for bp in self.bind_points(stage) {
                self.push_writes(shared, bp, &writes);
            }
        }
    }

    pub fn bind_storage_textures(&mut self, shared: &VulkanShared, stage: ShaderStageFlags, first_slot: u32, textures: &[&VulkanTexture]) {
        for (i, texture) in textures.iter().enumerate() {
            let info = vk::DescriptorImageInfo::builder().image_view(texture.view).image_layout(vk::ImageLayout::GENERAL).build();
            let writes = [vk::WriteDescriptorSet::builder()
                .dst_binding(MAX_UNIFORM_SLOTS as u32 + first_slot + i as u32)
                .dst_array_element(0)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .image_info(std::slice::from_ref(&info))
                .build()];
            for bp in self.bind_points(stage) {
                self.push_writes(shared, bp, &writes);
            }
        }
    }

    pub fn bind_storage_buffers(&mut self, shared: &VulkanShared, stage: ShaderStageFlags, first_slot: u32, buffers: &[(&VulkanBuffer, u64)]) {
        for (i, (buffer, offset)) in buffers.iter().enumerate() {
            let info = vk::DescriptorBufferInfo::builder().buffer(buffer.buffer).offset(*offset).range(vk::WHOLE_SIZE).build();
            let writes = [vk::WriteDescriptorSet::builder()
                .dst_binding(i as u32 + first_slot)
                .dst_array_element(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(std::slice::from_ref(&info))
                .build()];
            for bp in self.bind_points(stage) {
                self.push_writes(shared, bp, &writes);
            }
        }
    }

    pub fn bind_uniform_buffer(&mut self, shared: &VulkanShared, stage: ShaderStageFlags, slot: u32, buffer: &VulkanBuffer, offset: u64) {
        let info = vk::DescriptorBufferInfo::builder().buffer(buffer.buffer).offset(offset).range(vk::WHOLE_SIZE).build();
        let writes = [vk::WriteDescriptorSet::builder()
            .dst_binding(slot)
            .dst_array_element(0)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .buffer_info(std::slice::from_ref(&info))
            .build()];
        for bp in self.bind_points(stage) {
            self.push_writes(shared, bp, &writes);
        }
    }

    pub fn draw(&mut self, shared: &VulkanShared, vertex_start: u32, primitive_count: u32, primitive_type: PrimitiveType, instance_count: u32) {
        let vertex_count = primitive_type.vertex_count(primitive_count);
        unsafe { shared.device.cmd_draw(self.cb, vertex_count, instance_count, vertex_start, 0) };
    }

    pub fn draw_indexed(&mut self, shared: &VulkanShared, base_vertex: i32, start_index: u32, primitive_count: u32, primitive_type: PrimitiveType, instance_count: u32) {
        let index_count = primitive_type.vertex_count(primitive_count);
        unsafe { shared.device.cmd_draw_indexed(self.cb, index_count, instance_count, start_index, base_vertex, 0) };
    }

    pub fn draw_indirect(&mut self, shared: &VulkanShared, buffer: &VulkanBuffer, offset: u64, draw_count: u32, stride: u32, primitive_type: PrimitiveType) {
        let _ = primitive_type;
        unsafe { shared.device.cmd_draw_indirect(self.cb, buffer.buffer, offset, draw_count, stride) };
    }

    pub fn draw_indexed_indirect(&mut self, shared: &VulkanShared, buffer: &VulkanBuffer, offset: u64, draw_count: u32, stride: u32, primitive_type: PrimitiveType) {
        let _ = primitive_type;
        unsafe { shared.device.cmd_draw_indexed_indirect(self.cb, buffer.buffer, offset, draw_count, stride) };
    }

    pub fn dispatch(&mut self, shared: &VulkanShared, groups: [u32; 3]) {
        unsafe { shared.device.cmd_dispatch(self.cb, groups[0], groups[1], groups[2]) };
    }

    fn region_to_vk(region: &TextureRegion) -> (vk::ImageSubresourceLayers, vk::Offset3D, vk::Extent3D) {
        let subresource = vk::ImageSubresourceLayers {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            mip_level: region.slice.mip_level,
            base_array_layer: region.slice.layer,
            layer_count: 1,
        };
        let offset = vk::Offset3D {
            x: region.origin[0] as i32,
            y: region.origin[1] as i32,
            z: region.origin[2] as i32,
        };
        let extent = vk::Extent3D {
            width: region.extent[0],
            height: region.extent[1],
            depth: region.extent[2],
        };
        (subresource, offset, extent)
    }

    pub fn upload_to_texture(&mut self, shared: &VulkanShared, src: &VulkanBuffer, src_offset: u64, dst: &VulkanTexture, region: TextureRegion) {
        let (subresource, offset, extent) = Self::region_to_vk(&region);
        let copy = vk::BufferImageCopy::builder()
            .buffer_offset(src_offset)
            .image_subresource(subresource)
            .image_offset(offset)
            .image_extent(extent)
            .build();
        unsafe { shared.device.cmd_copy_buffer_to_image(self.cb, src.buffer, dst.image, vk::ImageLayout::TRANSFER_DST_OPTIMAL, &[copy]) };
    }

    pub fn copy_buffer(&mut self, shared: &VulkanShared, src: &VulkanBuffer, src_offset: u64, dst: &VulkanBuffer, dst_offset: u64, size: u64) {
        let copy = vk::BufferCopy { src_offset, dst_offset, size };
        unsafe { shared.device.cmd_copy_buffer(self.cb, src.buffer, dst.buffer, &[copy]) };
    }

    pub fn copy_texture_to_texture(&mut self, shared: &VulkanShared, src: &VulkanTexture, src_region: TextureRegion, dst: &VulkanTexture, dst_region: TextureRegion) {
        let (src_sub, src_offset, extent) = Self::region_to_vk(&src_region);
        let (dst_sub, dst_offset, _) = Self::region_to_vk(&dst_region);
        let copy = vk::ImageCopy::builder()
            .src_subresource(src_sub)
            .src_offset(src_offset)
            .dst_subresource(dst_sub)
            .dst_offset(dst_offset)
            .extent(extent)
            .build();
        unsafe {
            shared
                .device
                .cmd_copy_image(self.cb, src.image, vk::ImageLayout::TRANSFER_SRC_OPTIMAL, dst.image, vk::ImageLayout::TRANSFER_DST_OPTIMAL, &[copy]);
        }
    }

    pub fn generate_mipmaps(&mut self, shared: &VulkanShared, texture: &VulkanTexture) {
        let mip_levels = 32 - texture.extent.width.max(texture.extent.height).leading_zeros();
        let mut mip_width = texture.extent.width as i32;
        let mut mip_height = texture.extent.height as i32;
        for level in 1..mip_levels {
            let src_subresource = vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: level - 1,
                base_array_layer: 0,
                layer_count: 1,
            };
            let dst_subresource = vk::ImageSubresourceLayers { mip_level: level, ..src_subresource };
            let blit = vk::ImageBlit::builder()
                .src_subresource(src_subresource)
                .src_offsets([vk::Offset3D::default(), vk::Offset3D { x: mip_width, y: mip_height, z: 1 }])
                .dst_subresource(dst_subresource)
                .dst_offsets([
                    vk::Offset3D::default(),
                    vk::Offset3D {
                        x: (mip_width / 2).max(1),
                        y: (mip_height / 2).max(1),
                        z: 1,
                    },
                ])
                .build();
            unsafe {
                shared.device.cmd_blit_image(
                    self.cb,
                    texture.image,
                    vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                    texture.image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[blit],
                    vk::Filter::LINEAR,
                );
            }
            mip_width = (mip_width / 2).max(1);
            mip_height = (mip_height / 2).max(1);
        }
    }

    pub fn download_from_texture(&mut self, shared: &VulkanShared, src: &VulkanTexture, region: TextureRegion, dst: &VulkanBuffer, dst_offset: u64) {
        let (subresource, offset, extent) = Self::region_to_vk(&region);
        let copy = vk::BufferImageCopy::builder()
            .buffer_offset(dst_offset)
            .image_subresource(subresource)
            .image_offset(offset)
            .image_extent(extent)
            .build();
        unsafe { shared.device.cmd_copy_image_to_buffer(self.cb, src.image, vk::ImageLayout::TRANSFER_SRC_OPTIMAL, dst.buffer, &[copy]) };
    }

    pub fn blit(&mut self, shared: &VulkanShared, pipeline: &VulkanGraphicsPipeline, sampler: &VulkanSampler, src: &VulkanTexture, src_region: TextureRegion, dst: &VulkanTexture, dst_region: TextureRegion) {
        let _ = (pipeline, sampler);
        let (src_sub, src_offset, src_extent) = Self::region_to_vk(&src_region);
        let (dst_sub, dst_offset, dst_extent) = Self::region_to_vk(&dst_region);
        let blit = vk::ImageBlit::builder()
            .src_subresource(src_sub)
            .src_offsets([src_offset, vk::Offset3D { x: src_offset.x + src_extent.width as i32, y: src_offset.y + src_extent.height as i32, z: 1 }])
            .dst_subresource(dst_sub)
            .dst_offsets([dst_offset, vk::Offset3D { x: dst_offset.x + dst_extent.width as i32, y: dst_offset.y + dst_extent.height as i32, z: 1 }])
            .build();
        unsafe {
            shared.device.cmd_blit_image(
                self.cb,
                src.image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                dst.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[blit],
                vk::Filter::LINEAR,
            );
        }
    }

    // `VK_EXT_debug_utils` isn't among the extensions this backend enables
    // (spec §6's debug labels are diagnostic-only); these route through
    // `log` instead of a native command buffer label, same tradeoff as the
    // null backend's `NullCommand::DebugLabel`.
    pub fn insert_debug_label(&mut self, _shared: &VulkanShared, label: &str) {
        log::trace!("debug label: {label}");
    }

    pub fn push_debug_group(&mut self, _shared: &VulkanShared, label: &str) {
        log::trace!("push debug group: {label}");
    }

    pub fn pop_debug_group(&mut self, _shared: &VulkanShared) {
        log::trace!("pop debug group");
    }

    pub fn finish(&self, shared: &VulkanShared) -> Result<vk::CommandBuffer> {
        unsafe { shared.device.end_command_buffer(self.cb) }.map_err(|e| Error::with_cause(ErrorKind::DeviceLost, e))?;
        Ok(self.cb)
    }
}
