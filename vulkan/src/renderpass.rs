//! Render pass and framebuffer construction for [`crate::encoder::VulkanEncoder::begin_render_pass`].
//!
//! `nyxgfx-core` has no render-pass concept of its own: a pass is just
//! "the attachments bound for this span of draw calls" (spec §4 pass state
//! machine). Vulkan needs a `vk::RenderPass`/`vk::Framebuffer` object pair
//! for that, so the encoder builds one per `begin_render_pass` call rather
//! than caching across calls, trading a little allocation for never having
//! to invalidate a cache when attachments change.
use ash::vk;
use nyxgfx_base::Result;

pub fn create_simple_render_pass(shared: &crate::VulkanShared, color_formats: &[vk::Format], depth_stencil_format: Option<vk::Format>, sample_count: u32) -> Result<vk::RenderPass> {
    let samples = match sample_count {
        1 => vk::SampleCountFlags::TYPE_1,
        2 => vk::SampleCountFlags::TYPE_2,
        4 => vk::SampleCountFlags::TYPE_4,
        8 => vk::SampleCountFlags::TYPE_8,
        16 => vk::SampleCountFlags::TYPE_16,
        _ => vk::SampleCountFlags::TYPE_1,
    };

    let mut attachments = Vec::new();
    let mut color_refs = Vec::new();
    for format in color_formats {
        color_refs.push(vk::AttachmentReference {
            attachment: attachments.len() as u32,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        });
        attachments.push(
            vk::AttachmentDescription::builder()
                .format(*format)
                .samples(samples)
                .load_op(vk::AttachmentLoadOp::LOAD)
                .store_op(vk::AttachmentStoreOp::STORE)
                .initial_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                .final_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                .build(),
        );
    }

    let depth_ref = depth_stencil_format.map(|format| {
        let index = attachments.len() as u32;
        attachments.push(
            vk::AttachmentDescription::builder()
                .format(format)
                .samples(samples)
                .load_op(vk::AttachmentLoadOp::LOAD)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::LOAD)
                .stencil_store_op(vk::AttachmentStoreOp::STORE)
                .initial_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                .build(),
        );
        vk::AttachmentReference {
            attachment: index,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        }
    });

    let mut subpass = vk::SubpassDescription::builder().pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS).color_attachments(&color_refs);
    if let Some(depth_ref) = depth_ref.as_ref() {
        subpass = subpass.depth_stencil_attachment(depth_ref);
    }
    let subpasses = [subpass.build()];

    let info = vk::RenderPassCreateInfo::builder().attachments(&attachments).subpasses(&subpasses);
    unsafe { shared.device.create_render_pass(&info, None) }.map_err(|e| nyxgfx_base::Error::with_cause(nyxgfx_base::ErrorKind::AllocationFailed, e))
}

pub fn create_framebuffer(shared: &crate::VulkanShared, render_pass: vk::RenderPass, views: &[vk::ImageView], width: u32, height: u32) -> Result<vk::Framebuffer> {
    let info = vk::FramebufferCreateInfo::builder()
        .render_pass(render_pass)
        .attachments(views)
        .width(width)
        .height(height)
        .layers(1);
    unsafe { shared.device.create_framebuffer(&info, None) }.map_err(|e| nyxgfx_base::Error::with_cause(nyxgfx_base::ErrorKind::AllocationFailed, e))
}
