//! Black-box tests of `Device`/`CommandBuffer` against `nyxgfx-null`,
//! exercising the neutral-runtime properties and scenarios that do not
//! require a real backend (spec §8 S3, S4, properties 1, 3, 4, 5, 6, 7, 8).
use nyxgfx_base::*;
use nyxgfx_core::Device;
use nyxgfx_null::NullBackend;
use std::sync::Arc;

fn device() -> Arc<Device<NullBackend>> {
    Device::new(NullBackend::new(), false)
}

fn vertex_shader(device: &Arc<Device<NullBackend>>) -> ShaderId {
    device
        .create_shader(&ShaderDescriptor {
            stage: ShaderStageFlags::VERTEX,
            format: ShaderFormat::Spirv,
            code: &[0u8; 4],
            entry_point: "main",
            label: None,
        })
        .unwrap()
}

fn pipeline(device: &Arc<Device<NullBackend>>) -> GraphicsPipelineId {
    let vs = vertex_shader(device);
    device
        .create_graphics_pipeline(&GraphicsPipelineDescriptor {
            vertex_shader: &vs,
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
        })
        .unwrap()
}

/// Property 1: a freshly created device reports the limits its backend
/// advertises, untouched.
#[test]
fn device_reports_backend_limits() {
    let device = device();
    assert_eq!(device.limits().min_uniform_buffer_offset_alignment, 256);
}

/// Property 3 / spec §4.6: releasing a resource that is still referenced by
/// an in-flight command buffer must not free it until the command buffer's
/// fence completes and `wait`/`sweep_deferred_destroy` runs.
#[test]
fn release_defers_destruction_until_submission_completes() {
    let device = device();
    let texture = device
        .create_texture(&TextureDescriptor::texture_2d(TextureFormat::R8G8B8A8Unorm, TextureUsage::COLOR_TARGET, 4, 4))
        .unwrap();

    let mut cb = device.acquire_command_buffer().unwrap();
    assert!(cb.begin_render_pass(&[(texture, TextureSlice::default(), LoadOp::Clear, StoreOp::Store, [0.0; 4])], None));
    cb.end_render_pass();
    cb.submit().unwrap();

    // The command buffer tracked the texture; releasing it now must not
    // free the backing instance while that tracked reference is still live.
    device.release_texture(texture);
    device.wait();
}

/// S3 — Cycling: a cycleable container hands out a fresh backing instance
/// only when the active one is still referenced, and never otherwise.
#[test]
fn cycling_container_unit_semantics() {
    use nyxgfx_core::container::Container;
    let mut c = Container::new(0u32, true);
    c.active().track();
    let mut next = 1;
    c.cycle(true, true, || {
        let v = next;
        next += 1;
        v
    });
    assert_eq!(*c.active_native(), 1, "referenced instance forced a fresh backing instance");

    // Once the old instance's tracked reference is released, it is free to
    // be reused on the *next* cycle instead of allocating again.
    c.instances()[0].untrack();
    c.cycle(true, true, || {
        let v = next;
        next += 1;
        v
    });
    assert_eq!(*c.active_native(), 0, "freed instance is reused before allocating a third one");
}

/// S4 — 4097 consecutive 64-byte uniform pushes within one render pass must
/// roll over to additional allocators instead of overflowing or panicking
/// (`4097 * 256 > 1 MiB`, the default allocator size).
#[test]
fn uniform_pushes_roll_over_across_allocators() {
    let device = device();
    let mut cb = device.acquire_command_buffer().unwrap();
    assert!(cb.begin_render_pass(&[], None));
    let bytes = [0u8; 64];
    for _ in 0..4097 {
        cb.push_vertex_uniform_data(0, &bytes);
    }
    cb.end_render_pass();
    cb.submit().unwrap();
    device.wait();
}

/// Property 4: a command buffer that never enters a render/compute pass
/// silently ignores draws and pushes instead of panicking (spec §4.3
/// "commands outside their required phase are no-ops, logged once").
#[test]
fn draw_outside_pass_is_a_logged_no_op() {
    let device = device();
    let mut cb = device.acquire_command_buffer().unwrap();
    cb.push_vertex_uniform_data(0, &[0u8; 4]);
    cb.draw_primitives(0, 3, PrimitiveType::TriangleList);
    cb.submit().unwrap();
    device.wait();
}

/// Property 5: re-entering a pass while already inside one is rejected
/// rather than silently nesting.
#[test]
fn nested_render_pass_is_rejected() {
    let device = device();
    let mut cb = device.acquire_command_buffer().unwrap();
    assert!(cb.begin_render_pass(&[], None));
    assert!(!cb.begin_render_pass(&[], None), "a second begin_render_pass before end_render_pass must fail");
    cb.end_render_pass();
    cb.submit().unwrap();
}

/// Property 6: ending a pass clears bound pipeline/binding state, so a draw
/// issued in a later pass without rebinding is a no-op rather than reusing
/// stale state.
#[test]
fn pass_end_clears_bound_pipeline() {
    let device = device();
    let p = pipeline(&device);
    let mut cb = device.acquire_command_buffer().unwrap();
    assert!(cb.begin_render_pass(&[], None));
    cb.bind_graphics_pipeline(p);
    cb.end_render_pass();

    assert!(cb.begin_render_pass(&[], None));
    // No pipeline bound in this second pass; draw is a no-op, not a crash.
    cb.draw_primitives(0, 3, PrimitiveType::TriangleList);
    cb.end_render_pass();
    cb.submit().unwrap();
}

/// Property 8 — swapchain-texture scope: the handle returned by
/// `acquire_swapchain_texture` is only valid for the command buffer that
/// acquired it; submission clears the window's aliasing container so a
/// later acquisition is required.
#[test]
fn swapchain_texture_scope_ends_at_submission() {
    let device = device();
    let (window_index, window_generation) = device.claim_window(1, SwapchainComposition::Sdr, PresentMode::Vsync).unwrap();

    let mut cb = device.acquire_command_buffer().unwrap();
    let (texture, width, height) = cb.acquire_swapchain_texture(window_index, window_generation).unwrap();
    assert!(width > 0 && height > 0);
    assert!(cb.begin_render_pass(&[(texture, TextureSlice::default(), LoadOp::Clear, StoreOp::Store, [0.0; 4])], None));
    cb.end_render_pass();
    cb.submit().unwrap();

    device.unclaim_window(window_index, window_generation);
    device.wait();
}

/// Resource creation/release round-trips without a backend error for every
/// kind `Device` exposes (spec §6 create/release surface).
#[test]
fn every_resource_kind_creates_and_releases() {
    let device = device();

    let buffer = device
        .create_buffer(&BufferDescriptor {
            usage: BufferUsage::VERTEX,
            size: 256,
            label: None,
        })
        .unwrap();
    let transfer = device
        .create_transfer_buffer(&TransferBufferDescriptor {
            direction: TransferDirection::Upload,
            size: 64,
            label: None,
        })
        .unwrap();
    let texture = device
        .create_texture(&TextureDescriptor::texture_2d(TextureFormat::R8G8B8A8Unorm, TextureUsage::SAMPLER, 4, 4))
        .unwrap();
    let sampler = device.create_sampler(&SamplerDescriptor::nearest()).unwrap();
    let shader = vertex_shader(&device);
    let gfx_pipeline = pipeline(&device);

    device.release_buffer(buffer);
    device.release_transfer_buffer(transfer);
    device.release_texture(texture);
    device.release_sampler(sampler);
    device.release_shader(shader);
    device.release_graphics_pipeline(gfx_pipeline);
    device.wait();
}

/// `destroy` should not panic even with a claimed window and pending
/// deferred destruction still outstanding right up to the call.
#[test]
fn device_destroy_drains_everything() {
    let device = device();
    let (window_index, window_generation) = device.claim_window(7, SwapchainComposition::Sdr, PresentMode::Vsync).unwrap();
    let texture = device
        .create_texture(&TextureDescriptor::texture_2d(TextureFormat::R8G8B8A8Unorm, TextureUsage::COLOR_TARGET, 4, 4))
        .unwrap();
    device.release_texture(texture);
    let _ = window_index;
    let _ = window_generation;
    device.destroy();
}
