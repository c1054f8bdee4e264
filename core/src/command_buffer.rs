//! The thread-affine command buffer (spec §3 "Command Buffer", §4.4, §4.5).
use crate::backend::{
    Backend, ColorAttachment, DepthStencilAttachment, IndexedIndirectDrawCommand, IndirectDrawCommand,
    RenderPassDescriptor, TextureRegion, VertexBufferBinding,
};
use crate::device::Device;
use crate::pass::{Phase, PhaseGate};
use crate::uniform::UniformAllocator;
use log::{error, warn};
use nyxgfx_base::*;
use nyxgfx_common::PoolIndex;
use std::marker::PhantomData;
use std::sync::Arc;

/// Placeholder type stored in the device's command-buffer pool. Spec §4.5
/// treats "acquire a command buffer" as drawing a slot from a pool; the
/// actual per-recording state below is cheap enough to rebuild from scratch
/// on every acquisition (it is fully reset before use regardless), so the
/// pool here only recycles slot identities, while the fence and uniform
/// allocators still come from their own real pools.
pub type CommandBufferSlot<B> = PhantomData<B>;

bitflags::bitflags! {
    /// Per-group "need rebind" flags (spec §4.4, §9 "Shadow-table rebind
    /// flags").
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Rebind: u16 {
        const VERTEX_SAMPLERS          = 1 << 0;
        const VERTEX_STORAGE_TEXTURES  = 1 << 1;
        const VERTEX_STORAGE_BUFFERS   = 1 << 2;
        const FRAGMENT_SAMPLERS        = 1 << 3;
        const FRAGMENT_STORAGE_TEXTURES= 1 << 4;
        const FRAGMENT_STORAGE_BUFFERS = 1 << 5;
        const COMPUTE_TEXTURES         = 1 << 6;
        const COMPUTE_BUFFERS          = 1 << 7;
        const VERTEX_UNIFORMS          = 1 << 8;
        const FRAGMENT_UNIFORMS        = 1 << 9;
        const COMPUTE_UNIFORMS         = 1 << 10;
    }
}

/// Which of the three uniform-bearing stages a push targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
    Compute,
}

impl Stage {
    fn uniform_rebind_bit(self) -> Rebind {
        match self {
            Stage::Vertex => Rebind::VERTEX_UNIFORMS,
            Stage::Fragment => Rebind::FRAGMENT_UNIFORMS,
            Stage::Compute => Rebind::COMPUTE_UNIFORMS,
        }
    }
}

/// A shadow slot: which uniform allocator (if any) is bound, plus its
/// stashed `drawOffset` snapshot at last flush.
#[derive(Default)]
struct UniformSlot<B: Backend> {
    allocator: Option<UniformAllocator<B>>,
}

/// Tracks a single resource reference this command buffer has acquired, so
/// cleanup can decrement the matching backing instance's refcount exactly
/// once (spec §4.5 "Cleanup": "decrement refcounts on every tracked backing
/// instance").
#[derive(Clone, Copy)]
pub(crate) enum Tracked {
    Texture(TextureId),
    Buffer(BufferId),
    TransferBuffer(TransferBufferId),
}

/// A [`Tracked`] reference paired with the ring index of the specific
/// backing instance that was incremented, so retirement can decrement that
/// exact instance even if the container has cycled since (spec §9 "Cyclic
/// ownership is absent by design").
#[derive(Clone, Copy)]
pub(crate) struct TrackedInstance {
    pub(crate) kind: Tracked,
    pub(crate) instance: usize,
}

/// Decrements the refcount of every instance a retiring command buffer
/// tracked (spec §4.5 "Cleanup").
pub(crate) fn untrack_all<B: Backend>(device: &Device<B>, tracked: &[TrackedInstance]) {
    for t in tracked {
        match t.kind {
            Tracked::Texture(id) => {
                let textures = device.textures().lock();
                let windows = device.windows().lock();
                crate::device::untrack_texture::<B>(&textures, &windows, id, t.instance);
            }
            Tracked::Buffer(id) => {
                if let Some(c) = device.buffers().lock().get(id.index(), id.generation()) {
                    if let Some(inst) = c.instances().get(t.instance) {
                        inst.untrack();
                    }
                }
            }
            Tracked::TransferBuffer(id) => {
                if let Some(c) = device.transfer_buffers().lock().get(id.index(), id.generation()) {
                    if let Some(inst) = c.instances().get(t.instance) {
                        inst.untrack();
                    }
                }
            }
        }
    }
}

/// A thread-affine recording context, acquired from and returned to a
/// [`Device`]'s pools. Deliberately not `Send`: a command buffer must be
/// acquired, recorded, and submitted on a single thread,
/// and the unconstrained `B::Encoder` type already keeps this type `!Send`
/// in practice, but the explicit marker documents the intent (spec §9
/// "Thread-affine command buffers").
pub struct CommandBuffer<B: Backend> {
    device: Arc<Device<B>>,
    slot: PoolIndex,
    encoder: Option<B::Encoder>,
    phase: PhaseGate,
    fence_index: PoolIndex,
    fence_generation: u32,
    pub(crate) auto_release_fence: bool,

    bound_graphics_pipeline: Option<GraphicsPipelineId>,
    bound_compute_pipeline: Option<ComputePipelineId>,
    index_buffer: Option<(BufferId, u64, IndexFormat)>,

    rebind: Rebind,
    vertex_samplers: Vec<Option<SamplerId>>,
    vertex_storage_textures: Vec<Option<TextureId>>,
    vertex_storage_buffers: Vec<Option<(BufferId, u64)>>,
    fragment_samplers: Vec<Option<SamplerId>>,
    fragment_storage_textures: Vec<Option<TextureId>>,
    fragment_storage_buffers: Vec<Option<(BufferId, u64)>>,
    compute_storage_textures: Vec<Option<TextureId>>,
    compute_storage_buffers: Vec<Option<(BufferId, u64)>>,
    uniforms: [Vec<UniformSlot<B>>; 3],

    /// Allocators displaced by an overflowing push (spec §4.2: "the old
    /// one remains referenced by the current command buffer until
    /// retirement"); returned to the pool alongside the current slot's
    /// allocators on cleanup.
    spill_uniform_allocators: Vec<UniformAllocator<B>>,

    pub(crate) tracked: Vec<TrackedInstance>,
    pub(crate) present_windows: Vec<(u32, u32)>,

    _not_send: PhantomData<*const ()>,
}

impl<B: Backend> CommandBuffer<B> {
    /// Acquiring a command buffer (spec §4.5 "Acquiring a command buffer").
    pub(crate) fn acquire(device: Arc<Device<B>>) -> Result<Self> {
        let (slot, _) = device.cmd_buffer_pool().lock().take_or_else(PhantomData::default);
        let encoder = device.backend().new_encoder()?;
        let (fence_index, fence_generation) = device.fence_pool().lock().acquire(device.backend())?;

        Ok(Self {
            device,
            slot,
            encoder: Some(encoder),
            phase: PhaseGate::default(),
            fence_index,
            fence_generation,
            auto_release_fence: true,
            bound_graphics_pipeline: None,
            bound_compute_pipeline: None,
            index_buffer: None,
            rebind: Rebind::empty(),
            vertex_samplers: vec![None; MAX_BINDING_SLOTS],
            vertex_storage_textures: vec![None; MAX_BINDING_SLOTS],
            vertex_storage_buffers: vec![None; MAX_BINDING_SLOTS],
            fragment_samplers: vec![None; MAX_BINDING_SLOTS],
            fragment_storage_textures: vec![None; MAX_BINDING_SLOTS],
            fragment_storage_buffers: vec![None; MAX_BINDING_SLOTS],
            compute_storage_textures: vec![None; MAX_BINDING_SLOTS],
            compute_storage_buffers: vec![None; MAX_BINDING_SLOTS],
            uniforms: [
                (0..MAX_UNIFORM_SLOTS).map(|_| UniformSlot::default()).collect(),
                (0..MAX_UNIFORM_SLOTS).map(|_| UniformSlot::default()).collect(),
                (0..MAX_UNIFORM_SLOTS).map(|_| UniformSlot::default()).collect(),
            ],
            spill_uniform_allocators: Vec::new(),
            tracked: Vec::new(),
            present_windows: Vec::new(),
            _not_send: PhantomData,
        })
    }

    /// All allocators this command buffer has checked out — both the ones
    /// still bound per-slot and any spilled by an overflow — consumed on
    /// cleanup (spec §4.5 "Cleanup": "return uniform-allocators to the pool
    /// with their offsets reset").
    pub(crate) fn drain_uniform_allocators(&mut self) -> Vec<UniformAllocator<B>> {
        let mut out = std::mem::take(&mut self.spill_uniform_allocators);
        for stage in self.uniforms.iter_mut() {
            for slot in stage.iter_mut() {
                if let Some(alloc) = slot.allocator.take() {
                    out.push(alloc);
                }
            }
        }
        out
    }

    pub(crate) fn slot(&self) -> PoolIndex {
        self.slot
    }
    pub(crate) fn fence_index(&self) -> PoolIndex {
        self.fence_index
    }
    pub(crate) fn fence_generation(&self) -> u32 {
        self.fence_generation
    }
    pub(crate) fn take_encoder(&mut self) -> B::Encoder {
        self.encoder.take().expect("encoder already taken")
    }
    pub(crate) fn device(&self) -> &Arc<Device<B>> {
        &self.device
    }

    pub fn phase(&self) -> Phase {
        self.phase.phase()
    }

    fn track(&mut self, t: Tracked) {
        let instance = match t {
            Tracked::Texture(id) => {
                let textures = self.device.textures().lock();
                let windows = self.device.windows().lock();
                crate::device::track_texture::<B>(&textures, &windows, id)
            }
            Tracked::Buffer(id) => self.device.buffers().lock().get(id.index(), id.generation()).map(|c| {
                c.active().track();
                c.active_index()
            }),
            Tracked::TransferBuffer(id) => self.device.transfer_buffers().lock().get(id.index(), id.generation()).map(|c| {
                c.active().track();
                c.active_index()
            }),
        };
        if let Some(instance) = instance {
            self.tracked.push(TrackedInstance { kind: t, instance });
        }
    }

    // ---- Passes (spec §4.3) ----

    pub fn begin_render_pass(
        &mut self,
        colors: &[(TextureId, TextureSlice, LoadOp, StoreOp, ClearColor)],
        depth_stencil: Option<(TextureId, TextureSlice, LoadOp, StoreOp, f32, LoadOp, StoreOp, u32)>,
    ) -> bool {
        if !self.phase.begin(Phase::Render, "begin_render_pass") {
            return false;
        }
        let textures = self.device.textures().lock();
        let windows = self.device.windows().lock();
        let color_natives: Vec<_> = colors
            .iter()
            .filter_map(|(id, slice, load, store, clear)| {
                crate::device::resolve_texture::<B>(&textures, &windows, *id).map(|native| ColorAttachment {
                    texture: native,
                    slice: *slice,
                    load_op: *load,
                    store_op: *store,
                    clear_color: *clear,
                })
            })
            .collect();
        let ds_native = depth_stencil.as_ref().and_then(|(id, slice, dl, ds, cd, sl, ss, cs)| {
            crate::device::resolve_texture::<B>(&textures, &windows, *id).map(|native| DepthStencilAttachment {
                texture: native,
                slice: *slice,
                depth_load_op: *dl,
                depth_store_op: *ds,
                clear_depth: *cd,
                stencil_load_op: *sl,
                stencil_store_op: *ss,
                clear_stencil: *cs,
            })
        });
        let desc = RenderPassDescriptor {
            colors: &color_natives,
            depth_stencil: ds_native,
        };
        self.device.backend().begin_render_pass(self.encoder.as_mut().unwrap(), &desc);
        drop(textures);
        drop(windows);
        for (id, _, _, _, _) in colors {
            self.track(Tracked::Texture(*id));
        }
        if let Some((id, ..)) = &depth_stencil {
            self.track(Tracked::Texture(*id));
        }
        true
    }

    pub fn end_render_pass(&mut self) {
        self.phase.end(Phase::Render, "end_render_pass");
        self.device.backend().end_render_pass(self.encoder.as_mut().unwrap());
        self.clear_bound_state();
    }

    pub fn begin_compute_pass(&mut self, rw_textures: &[TextureId], rw_buffers: &[BufferId]) -> bool {
        if !self.phase.begin(Phase::Compute, "begin_compute_pass") {
            return false;
        }
        self.device.backend().begin_compute_pass(self.encoder.as_mut().unwrap());
        for id in rw_textures {
            self.track(Tracked::Texture(*id));
        }
        for id in rw_buffers {
            self.track(Tracked::Buffer(*id));
        }
        true
    }

    pub fn end_compute_pass(&mut self) {
        self.phase.end(Phase::Compute, "end_compute_pass");
        self.device.backend().end_compute_pass(self.encoder.as_mut().unwrap());
        self.clear_bound_state();
    }

    pub fn begin_copy_pass(&mut self) -> bool {
        if !self.phase.begin(Phase::Copy, "begin_copy_pass") {
            return false;
        }
        self.device.backend().begin_copy_pass(self.encoder.as_mut().unwrap());
        true
    }

    pub fn end_copy_pass(&mut self) {
        self.phase.end(Phase::Copy, "end_copy_pass");
        self.device.backend().end_copy_pass(self.encoder.as_mut().unwrap());
    }

    /// "After end-of-pass, all bound graphics/compute state is considered
    /// unset" (spec §4.4).
    fn clear_bound_state(&mut self) {
        self.bound_graphics_pipeline = None;
        self.bound_compute_pipeline = None;
        self.index_buffer = None;
        self.rebind = Rebind::empty();
        for slot in self.vertex_samplers.iter_mut() {
            *slot = None;
        }
        for slot in self.vertex_storage_textures.iter_mut() {
            *slot = None;
        }
        for slot in self.vertex_storage_buffers.iter_mut() {
            *slot = None;
        }
        for slot in self.fragment_samplers.iter_mut() {
            *slot = None;
        }
        for slot in self.fragment_storage_textures.iter_mut() {
            *slot = None;
        }
        for slot in self.fragment_storage_buffers.iter_mut() {
            *slot = None;
        }
        for slot in self.compute_storage_textures.iter_mut() {
            *slot = None;
        }
        for slot in self.compute_storage_buffers.iter_mut() {
            *slot = None;
        }
    }

    // ---- Bindings (spec §4.4) ----

    pub fn bind_graphics_pipeline(&mut self, pipeline: GraphicsPipelineId) {
        if !self.phase.require(Phase::Render, "bind_graphics_pipeline") {
            return;
        }
        if let Some(native) = self
            .device
            .graphics_pipelines()
            .lock()
            .get(pipeline.index(), pipeline.generation())
        {
            self.device.backend().bind_graphics_pipeline(self.encoder.as_mut().unwrap(), native);
            self.bound_graphics_pipeline = Some(pipeline);
        } else {
            error!("bind_graphics_pipeline: unknown handle");
        }
    }

    pub fn bind_compute_pipeline(&mut self, pipeline: ComputePipelineId) {
        if !self.phase.require(Phase::Compute, "bind_compute_pipeline") {
            return;
        }
        if let Some(native) = self
            .device
            .compute_pipelines()
            .lock()
            .get(pipeline.index(), pipeline.generation())
        {
            self.device.backend().bind_compute_pipeline(self.encoder.as_mut().unwrap(), native);
            self.bound_compute_pipeline = Some(pipeline);
        } else {
            error!("bind_compute_pipeline: unknown handle");
        }
    }

    pub fn set_viewport(&mut self, rect: Rect2D<u32>, depth: (f32, f32)) {
        self.device.backend().set_viewport(self.encoder.as_mut().unwrap(), rect, depth);
    }

    pub fn set_scissor(&mut self, rect: Rect2D<u32>) {
        self.device.backend().set_scissor(self.encoder.as_mut().unwrap(), rect);
    }

    /// `native index = MAX_NATIVE_BUFFERS - 1 - binding` (spec §4.7).
    fn native_vertex_slot(binding: u32) -> u32 {
        MAX_NATIVE_BUFFERS as u32 - 1 - binding
    }

    pub fn bind_vertex_buffers(&mut self, first_slot: u32, bindings: &[(BufferId, u64)]) {
        let buffers = self.device.buffers().lock();
        // Binding and native slot run in opposite directions
        // (`native_vertex_slot` is monotonically decreasing), so the
        // contiguous native range starts at the *last* binding's slot and
        // the bindings must be handed over in reverse to land each one at
        // its own `native_vertex_slot(first_slot + i)`.
        let natives: Vec<_> = bindings
            .iter()
            .rev()
            .filter_map(|(id, offset)| {
                buffers.get(id.index(), id.generation()).map(|c| VertexBufferBinding {
                    buffer: c.active_native(),
                    offset: *offset,
                })
            })
            .collect();
        let native_first = Self::native_vertex_slot(first_slot + bindings.len() as u32 - 1);
        self.device
            .backend()
            .bind_vertex_buffers(self.encoder.as_mut().unwrap(), native_first, &natives);
        drop(buffers);
        for (id, _) in bindings {
            self.track(Tracked::Buffer(*id));
        }
    }

    pub fn bind_index_buffer(&mut self, buffer: BufferId, offset: u64, format: IndexFormat) {
        if let Some(c) = self.device.buffers().lock().get(buffer.index(), buffer.generation()) {
            self.device
                .backend()
                .bind_index_buffer(self.encoder.as_mut().unwrap(), c.active_native(), offset, format);
            self.index_buffer = Some((buffer, offset, format));
        }
        self.track(Tracked::Buffer(buffer));
    }

    pub fn bind_vertex_samplers(&mut self, first_slot: u32, items: &[SamplerId]) {
        self.bind_samplers_impl(Stage::Vertex, first_slot, items, Rebind::VERTEX_SAMPLERS);
    }
    pub fn bind_fragment_samplers(&mut self, first_slot: u32, items: &[SamplerId]) {
        self.bind_samplers_impl(Stage::Fragment, first_slot, items, Rebind::FRAGMENT_SAMPLERS);
    }

    fn bind_samplers_impl(&mut self, stage: Stage, first_slot: u32, items: &[SamplerId], bit: Rebind) {
        let table = match stage {
            Stage::Vertex => &mut self.vertex_samplers,
            Stage::Fragment => &mut self.fragment_samplers,
            Stage::Compute => return,
        };
        for (i, id) in items.iter().enumerate() {
            if let Some(slot) = table.get_mut(first_slot as usize + i) {
                *slot = Some(*id);
            }
        }
        self.rebind.insert(bit);
    }

    pub fn bind_vertex_storage_textures(&mut self, first_slot: u32, items: &[TextureId]) {
        Self::fill_slots(&mut self.vertex_storage_textures, first_slot, items);
        self.rebind.insert(Rebind::VERTEX_STORAGE_TEXTURES);
        for id in items {
            self.track(Tracked::Texture(*id));
        }
    }
    pub fn bind_fragment_storage_textures(&mut self, first_slot: u32, items: &[TextureId]) {
        Self::fill_slots(&mut self.fragment_storage_textures, first_slot, items);
        self.rebind.insert(Rebind::FRAGMENT_STORAGE_TEXTURES);
        for id in items {
            self.track(Tracked::Texture(*id));
        }
    }
    pub fn bind_compute_storage_textures(&mut self, first_slot: u32, items: &[TextureId]) {
        Self::fill_slots(&mut self.compute_storage_textures, first_slot, items);
        self.rebind.insert(Rebind::COMPUTE_TEXTURES);
        for id in items {
            self.track(Tracked::Texture(*id));
        }
    }
    pub fn bind_vertex_storage_buffers(&mut self, first_slot: u32, items: &[(BufferId, u64)]) {
        Self::fill_slots(&mut self.vertex_storage_buffers, first_slot, items);
        self.rebind.insert(Rebind::VERTEX_STORAGE_BUFFERS);
        for (id, _) in items {
            self.track(Tracked::Buffer(*id));
        }
    }
    pub fn bind_fragment_storage_buffers(&mut self, first_slot: u32, items: &[(BufferId, u64)]) {
        Self::fill_slots(&mut self.fragment_storage_buffers, first_slot, items);
        self.rebind.insert(Rebind::FRAGMENT_STORAGE_BUFFERS);
        for (id, _) in items {
            self.track(Tracked::Buffer(*id));
        }
    }
    pub fn bind_compute_storage_buffers(&mut self, first_slot: u32, items: &[(BufferId, u64)]) {
        Self::fill_slots(&mut self.compute_storage_buffers, first_slot, items);
        self.rebind.insert(Rebind::COMPUTE_BUFFERS);
        for (id, _) in items {
            self.track(Tracked::Buffer(*id));
        }
    }

    fn fill_slots<T: Copy>(table: &mut [Option<T>], first_slot: u32, items: &[T]) {
        for (i, item) in items.iter().enumerate() {
            if let Some(slot) = table.get_mut(first_slot as usize + i) {
                *slot = Some(*item);
            }
        }
    }

    /// Flushes only the groups whose rebind flag is set, clearing the flag
    /// afterwards (spec §4.7 "Bind-group flushing").
    fn flush_binds(&mut self, stage: Stage) {
        let backend = self.device.backend();
        let enc = self.encoder.as_mut().unwrap();
        let (stage_flags, sampler_bit, storage_textures_bit, storage_buffers_bit) = match stage {
            Stage::Vertex => (
                ShaderStageFlags::VERTEX,
                Some(Rebind::VERTEX_SAMPLERS),
                Rebind::VERTEX_STORAGE_TEXTURES,
                Rebind::VERTEX_STORAGE_BUFFERS,
            ),
            Stage::Fragment => (
                ShaderStageFlags::FRAGMENT,
                Some(Rebind::FRAGMENT_SAMPLERS),
                Rebind::FRAGMENT_STORAGE_TEXTURES,
                Rebind::FRAGMENT_STORAGE_BUFFERS,
            ),
            Stage::Compute => (ShaderStageFlags::COMPUTE, None, Rebind::COMPUTE_TEXTURES, Rebind::COMPUTE_BUFFERS),
        };

        if let Some(sampler_bit) = sampler_bit {
            if self.rebind.contains(sampler_bit) {
                let table = match stage {
                    Stage::Vertex => &self.vertex_samplers,
                    Stage::Fragment => &self.fragment_samplers,
                    Stage::Compute => unreachable!(),
                };
                let samplers = self.device.samplers().lock();
                let natives: Vec<_> = table.iter().flatten().filter_map(|id| samplers.get(id.index(), id.generation())).collect();
                backend.bind_samplers(enc, stage_flags, 0, &natives);
                self.rebind.remove(sampler_bit);
            }
        }

        if self.rebind.contains(storage_textures_bit) {
            let table = match stage {
                Stage::Vertex => &self.vertex_storage_textures,
                Stage::Fragment => &self.fragment_storage_textures,
                Stage::Compute => &self.compute_storage_textures,
            };
            let textures = self.device.textures().lock();
            let windows = self.device.windows().lock();
            let natives: Vec<_> = table
                .iter()
                .flatten()
                .filter_map(|id| crate::device::resolve_texture::<B>(&textures, &windows, *id))
                .collect();
            backend.bind_storage_textures(enc, stage_flags, 0, &natives);
            self.rebind.remove(storage_textures_bit);
        }

        if self.rebind.contains(storage_buffers_bit) {
            let table = match stage {
                Stage::Vertex => &self.vertex_storage_buffers,
                Stage::Fragment => &self.fragment_storage_buffers,
                Stage::Compute => &self.compute_storage_buffers,
            };
            let buffers = self.device.buffers().lock();
            let natives: Vec<_> = table
                .iter()
                .flatten()
                .filter_map(|(id, offset)| buffers.get(id.index(), id.generation()).map(|c| (c.active_native(), *offset)))
                .collect();
            backend.bind_storage_buffers(enc, stage_flags, 0, &natives);
            self.rebind.remove(storage_buffers_bit);
        }
    }

    // ---- Uniforms (spec §4.2) ----

    fn push_uniform(&mut self, stage: Stage, slot: u32, bytes: &[u8]) {
        if !self.phase.require_render_or_compute("push_uniform_data") {
            return;
        }
        if slot as usize >= MAX_UNIFORM_SLOTS {
            error!("push_uniform_data: slot {slot} out of range");
            return;
        }
        let backend = self.device.backend();
        let uniform_slot = &mut self.uniforms[stage as usize][slot as usize];
        if uniform_slot.allocator.is_none() {
            match self.device.acquire_uniform_allocator() {
                Ok(alloc) => uniform_slot.allocator = Some(alloc),
                Err(e) => {
                    error!("push_uniform_data: failed to acquire allocator: {e}");
                    return;
                }
            }
        }
        let allocator = uniform_slot.allocator.as_mut().unwrap();
        if allocator.would_overflow(bytes.len() as u64) {
            let old = uniform_slot.allocator.take().unwrap();
            self.spill_uniform_allocators.push(old);
            match self.device.acquire_uniform_allocator() {
                Ok(alloc) => uniform_slot.allocator = Some(alloc),
                Err(e) => {
                    error!("push_uniform_data: failed to acquire replacement allocator: {e}");
                    return;
                }
            }
        }
        let allocator = self.uniforms[stage as usize][slot as usize].allocator.as_mut().unwrap();
        if let Err(e) = allocator.push(backend, bytes) {
            error!("push_uniform_data: {e}");
            return;
        }
        self.rebind.insert(stage.uniform_rebind_bit());
    }

    pub fn push_vertex_uniform_data(&mut self, slot: u32, bytes: &[u8]) {
        self.push_uniform(Stage::Vertex, slot, bytes);
    }
    pub fn push_fragment_uniform_data(&mut self, slot: u32, bytes: &[u8]) {
        self.push_uniform(Stage::Fragment, slot, bytes);
    }
    pub fn push_compute_uniform_data(&mut self, slot: u32, bytes: &[u8]) {
        self.push_uniform(Stage::Compute, slot, bytes);
    }

    fn flush_uniforms(&mut self, stage: Stage) {
        let bit = stage.uniform_rebind_bit();
        if !self.rebind.contains(bit) {
            return;
        }
        let stage_flags = match stage {
            Stage::Vertex => ShaderStageFlags::VERTEX,
            Stage::Fragment => ShaderStageFlags::FRAGMENT,
            Stage::Compute => ShaderStageFlags::COMPUTE,
        };
        let backend = self.device.backend();
        let enc = self.encoder.as_mut().unwrap();
        for (slot_index, slot) in self.uniforms[stage as usize].iter().enumerate() {
            if let Some(alloc) = &slot.allocator {
                backend.bind_uniform_buffer(enc, stage_flags, slot_index as u32, alloc.buffer(), alloc.draw_offset());
            }
        }
        self.rebind.remove(bit);
    }

    // ---- Draws (spec §4.4) ----

    pub fn draw_primitives(&mut self, vertex_start: u32, primitive_count: u32, primitive_type: PrimitiveType) {
        if !self.phase.require(Phase::Render, "draw_primitives") {
            return;
        }
        self.flush_binds(Stage::Vertex);
        self.flush_binds(Stage::Fragment);
        self.flush_uniforms(Stage::Vertex);
        self.flush_uniforms(Stage::Fragment);
        self.device
            .backend()
            .draw(self.encoder.as_mut().unwrap(), vertex_start, primitive_count, primitive_type, 1);
    }

    pub fn draw_indexed_primitives(
        &mut self,
        base_vertex: i32,
        start_index: u32,
        primitive_count: u32,
        instance_count: u32,
        primitive_type: PrimitiveType,
    ) {
        if !self.phase.require(Phase::Render, "draw_indexed_primitives") {
            return;
        }
        self.flush_binds(Stage::Vertex);
        self.flush_binds(Stage::Fragment);
        self.flush_uniforms(Stage::Vertex);
        self.flush_uniforms(Stage::Fragment);
        self.device.backend().draw_indexed(
            self.encoder.as_mut().unwrap(),
            base_vertex,
            start_index,
            primitive_count,
            primitive_type,
            instance_count,
        );
    }

    pub fn draw_primitives_indirect(&mut self, buffer: BufferId, offset: u64, draw_count: u32, primitive_type: PrimitiveType) {
        if !self.phase.require(Phase::Render, "draw_primitives_indirect") {
            return;
        }
        self.flush_binds(Stage::Vertex);
        self.flush_binds(Stage::Fragment);
        self.flush_uniforms(Stage::Vertex);
        self.flush_uniforms(Stage::Fragment);
        let buffers = self.device.buffers().lock();
        if let Some(c) = buffers.get(buffer.index(), buffer.generation()) {
            self.device.backend().draw_indirect(
                self.encoder.as_mut().unwrap(),
                c.active_native(),
                offset,
                draw_count,
                std::mem::size_of::<IndirectDrawCommand>() as u32,
                primitive_type,
            );
        }
        drop(buffers);
        self.track(Tracked::Buffer(buffer));
    }

    pub fn draw_indexed_primitives_indirect(&mut self, buffer: BufferId, offset: u64, draw_count: u32, primitive_type: PrimitiveType) {
        if !self.phase.require(Phase::Render, "draw_indexed_primitives_indirect") {
            return;
        }
        self.flush_binds(Stage::Vertex);
        self.flush_binds(Stage::Fragment);
        self.flush_uniforms(Stage::Vertex);
        self.flush_uniforms(Stage::Fragment);
        let buffers = self.device.buffers().lock();
        if let Some(c) = buffers.get(buffer.index(), buffer.generation()) {
            self.device.backend().draw_indexed_indirect(
                self.encoder.as_mut().unwrap(),
                c.active_native(),
                offset,
                draw_count,
                std::mem::size_of::<IndexedIndirectDrawCommand>() as u32,
                primitive_type,
            );
        }
        drop(buffers);
        self.track(Tracked::Buffer(buffer));
    }

    /// Index offset on indexed draws: `indexBufferOffset + startIndex ×
    /// indexElementSize` (spec §4.4). Exposed for backends/tests that need
    /// the raw byte offset rather than an element index.
    pub fn indexed_draw_byte_offset(&self, start_index: u32) -> Option<u64> {
        let (_, offset, format) = self.index_buffer?;
        Some(offset + start_index as u64 * format.element_size() as u64)
    }

    pub fn dispatch(&mut self, groups: [u32; 3]) {
        if !self.phase.require(Phase::Compute, "dispatch") {
            return;
        }
        let limits = self.device.limits();
        let clamped = [
            groups[0].min(limits.max_compute_workgroup_count[0]),
            groups[1].min(limits.max_compute_workgroup_count[1]),
            groups[2].min(limits.max_compute_workgroup_count[2]),
        ];
        if clamped != groups {
            warn!("dispatch({:?}) clamped to {:?} by max_compute_workgroup_count", groups, clamped);
        }
        self.flush_binds(Stage::Compute);
        self.flush_uniforms(Stage::Compute);
        self.device.backend().dispatch(self.encoder.as_mut().unwrap(), clamped);
    }

    // ---- Copy pass ops (spec §4.7) ----

    pub fn upload_to_texture(&mut self, src: TransferBufferId, src_offset: u64, dst: TextureId, region: TextureRegion) {
        if !self.phase.require(Phase::Copy, "upload_to_texture") {
            return;
        }
        let buffers = self.device.transfer_buffers().lock();
        let textures = self.device.textures().lock();
        let windows = self.device.windows().lock();
        if let (Some(sc), Some(dst_native)) = (
            buffers.get(src.index(), src.generation()),
            crate::device::resolve_texture::<B>(&textures, &windows, dst),
        ) {
            self.device.backend().upload_to_texture(
                self.encoder.as_mut().unwrap(),
                sc.active_native(),
                src_offset,
                dst_native,
                region,
            );
        }
        drop(buffers);
        drop(textures);
        drop(windows);
        self.track(Tracked::TransferBuffer(src));
        self.track(Tracked::Texture(dst));
    }

    pub fn upload_to_buffer(&mut self, src: TransferBufferId, src_offset: u64, dst: BufferId, dst_offset: u64, size: u64) {
        if !self.phase.require(Phase::Copy, "upload_to_buffer") {
            return;
        }
        let src_buffers = self.device.transfer_buffers().lock();
        let dst_buffers = self.device.buffers().lock();
        if let (Some(sc), Some(dc)) = (
            src_buffers.get(src.index(), src.generation()),
            dst_buffers.get(dst.index(), dst.generation()),
        ) {
            self.device.backend().upload_to_buffer(
                self.encoder.as_mut().unwrap(),
                sc.active_native(),
                src_offset,
                dc.active_native(),
                dst_offset,
                size,
            );
        }
        drop(src_buffers);
        drop(dst_buffers);
        self.track(Tracked::TransferBuffer(src));
        self.track(Tracked::Buffer(dst));
    }

    pub fn copy_texture_to_texture(&mut self, src: TextureId, src_region: TextureRegion, dst: TextureId, dst_region: TextureRegion) {
        if !self.phase.require(Phase::Copy, "copy_texture_to_texture") {
            return;
        }
        let textures = self.device.textures().lock();
        let windows = self.device.windows().lock();
        if let (Some(src_native), Some(dst_native)) = (
            crate::device::resolve_texture::<B>(&textures, &windows, src),
            crate::device::resolve_texture::<B>(&textures, &windows, dst),
        ) {
            self.device.backend().copy_texture_to_texture(
                self.encoder.as_mut().unwrap(),
                src_native,
                src_region,
                dst_native,
                dst_region,
            );
        }
        drop(textures);
        drop(windows);
        self.track(Tracked::Texture(src));
        self.track(Tracked::Texture(dst));
    }

    pub fn copy_buffer_to_buffer(&mut self, src: BufferId, src_offset: u64, dst: BufferId, dst_offset: u64, size: u64) {
        if !self.phase.require(Phase::Copy, "copy_buffer_to_buffer") {
            return;
        }
        let buffers = self.device.buffers().lock();
        if let (Some(sc), Some(dc)) = (
            buffers.get(src.index(), src.generation()),
            buffers.get(dst.index(), dst.generation()),
        ) {
            self.device.backend().copy_buffer_to_buffer(
                self.encoder.as_mut().unwrap(),
                sc.active_native(),
                src_offset,
                dc.active_native(),
                dst_offset,
                size,
            );
        }
        drop(buffers);
        self.track(Tracked::Buffer(src));
        self.track(Tracked::Buffer(dst));
    }

    pub fn generate_mipmaps(&mut self, texture: TextureId) {
        if !self.phase.require(Phase::Copy, "generate_mipmaps") {
            return;
        }
        let textures = self.device.textures().lock();
        let windows = self.device.windows().lock();
        if let Some(native) = crate::device::resolve_texture::<B>(&textures, &windows, texture) {
            self.device.backend().generate_mipmaps(self.encoder.as_mut().unwrap(), native);
        }
        drop(textures);
        drop(windows);
        self.track(Tracked::Texture(texture));
    }

    pub fn download_from_texture(&mut self, src: TextureId, region: TextureRegion, dst: TransferBufferId, dst_offset: u64) {
        if !self.phase.require(Phase::Copy, "download_from_texture") {
            return;
        }
        let textures = self.device.textures().lock();
        let windows = self.device.windows().lock();
        let buffers = self.device.transfer_buffers().lock();
        if let (Some(src_native), Some(dc)) = (
            crate::device::resolve_texture::<B>(&textures, &windows, src),
            buffers.get(dst.index(), dst.generation()),
        ) {
            self.device.backend().download_from_texture(
                self.encoder.as_mut().unwrap(),
                src_native,
                region,
                dc.active_native(),
                dst_offset,
            );
        }
        drop(textures);
        drop(windows);
        drop(buffers);
        self.track(Tracked::Texture(src));
        self.track(Tracked::TransferBuffer(dst));
    }

    pub fn download_from_buffer(&mut self, src: BufferId, src_offset: u64, dst: TransferBufferId, dst_offset: u64, size: u64) {
        if !self.phase.require(Phase::Copy, "download_from_buffer") {
            return;
        }
        let src_buffers = self.device.buffers().lock();
        let dst_buffers = self.device.transfer_buffers().lock();
        if let (Some(sc), Some(dc)) = (
            src_buffers.get(src.index(), src.generation()),
            dst_buffers.get(dst.index(), dst.generation()),
        ) {
            self.device.backend().download_from_buffer(
                self.encoder.as_mut().unwrap(),
                sc.active_native(),
                src_offset,
                dc.active_native(),
                dst_offset,
                size,
            );
        }
        drop(src_buffers);
        drop(dst_buffers);
        self.track(Tracked::Buffer(src));
        self.track(Tracked::TransferBuffer(dst));
    }

    // ---- Blit (spec §4.7, §6 `blit`) ----

    /// Scaled texture-to-texture copy. Requires OUTSIDE phase; internally
    /// opens and closes a one-triangle full-viewport render pass using a
    /// pipeline cached by the destination's format and a sampler cached by
    /// `filter` (spec §4.3: "OUTSIDE -> blit -> OUTSIDE (internally opens a
    /// RENDER)").
    pub fn blit(&mut self, src: TextureId, src_region: TextureRegion, dst: TextureId, dst_region: TextureRegion, filter: BlitFilter) {
        if !self.phase.require(Phase::Outside, "blit") {
            return;
        }
        let textures = self.device.textures().lock();
        let windows = self.device.windows().lock();
        let src_native = crate::device::resolve_texture::<B>(&textures, &windows, src);
        let dst_native = crate::device::resolve_texture::<B>(&textures, &windows, dst);
        let dst_format = crate::device::resolve_texture_format::<B>(self.device.backend(), &textures, &windows, dst);

        if let (Some(src_native), Some(dst_native), Some(dst_format)) = (src_native, dst_native, dst_format) {
            let mut blit = self.device.blit().lock();
            let pipeline_result = blit.pipeline_for(&self.device, dst_format).and_then(|pipeline_id| {
                let sampler_id = blit.sampler_for(&self.device, filter)?;
                Ok((pipeline_id, sampler_id))
            });
            match pipeline_result {
                Ok((pipeline_id, sampler_id)) => {
                    let pipelines = self.device.graphics_pipelines().lock();
                    let samplers = self.device.samplers().lock();
                    if let (Some(pipeline), Some(sampler)) = (
                        pipelines.get(pipeline_id.index(), pipeline_id.generation()),
                        samplers.get(sampler_id.index(), sampler_id.generation()),
                    ) {
                        self.device.backend().blit(
                            self.encoder.as_mut().unwrap(),
                            pipeline,
                            sampler,
                            src_native,
                            src_region,
                            dst_native,
                            dst_region,
                        );
                    }
                }
                Err(e) => error!("blit: failed to prepare cached pipeline/sampler: {e}"),
            }
        }
        drop(textures);
        drop(windows);
        self.track(Tracked::Texture(src));
        self.track(Tracked::Texture(dst));
    }

    // ---- Debug (spec §4.3: legal in every phase) ----

    pub fn insert_debug_label(&mut self, label: &str) {
        if self.device.is_debug() {
            self.device.backend().insert_debug_label(self.encoder.as_mut().unwrap(), label);
        }
    }
    pub fn push_debug_group(&mut self, label: &str) {
        if self.device.is_debug() {
            self.device.backend().push_debug_group(self.encoder.as_mut().unwrap(), label);
        }
    }
    pub fn pop_debug_group(&mut self) {
        if self.device.is_debug() {
            self.device.backend().pop_debug_group(self.encoder.as_mut().unwrap());
        }
    }

    // ---- Swapchain acquisition ----

    /// `acquire_swapchain_texture` (spec §6). Tracks the window so
    /// `submit` knows to request a present for it.
    pub fn acquire_swapchain_texture(&mut self, window_index: u32, window_generation: u32) -> Option<(TextureId, u32, u32)> {
        let mut windows = self.device.windows().lock();
        let entry = windows.get_mut(window_index, window_generation)?;
        let (drawable, native, width, height) = self.device.backend().acquire_drawable(&mut entry.surface).ok()?;
        entry.drawable = Some(drawable);
        entry.texture = Some(crate::container::Container::new(native, false));
        drop(windows);
        self.present_windows.push((window_index, window_generation));
        // Swapchain textures alias the window's own container (spec §3:
        // "a non-cycleable texture container that aliases the drawable's
        // texture on acquire"); the handle is tagged so `resolve_texture`
        // routes it to the window pool instead of the texture pool, which
        // also keeps it out of any other command buffer's reach (spec §8
        // property 8, "Swapchain-texture scope").
        Some((
            TextureId::from_raw_parts(window_index | crate::device::SWAPCHAIN_TAG, window_generation),
            width,
            height,
        ))
    }

    // ---- Submission (spec §4.5) ----

    /// Commits the recording to the backend queue; the device manages the
    /// attached fence's lifetime (`autoReleaseFence = true`).
    pub fn submit(mut self) -> Result<()> {
        self.submit_inner()
    }

    /// Identical to [`submit`](Self::submit) but sets `autoReleaseFence =
    /// false` and returns the fence; the application must later pass it to
    /// [`Device::release_fence`].
    pub fn submit_and_acquire_fence(mut self) -> Result<FenceId> {
        self.auto_release_fence = false;
        let fence_id = FenceId::from_raw_parts(self.fence_index.raw() as u32, self.fence_generation);
        self.submit_inner()?;
        Ok(fence_id)
    }

    fn submit_inner(&mut self) -> Result<()> {
        let device = Arc::clone(&self.device);
        let mut present_windows = std::mem::take(&mut self.present_windows);
        present_windows.sort_unstable();
        present_windows.dedup();
        let tracked = std::mem::take(&mut self.tracked);
        let allocators = self.drain_uniform_allocators();
        let encoder = self.take_encoder();
        let fence_index = self.fence_index;
        let slot = self.slot;
        let auto_release_fence = self.auto_release_fence;

        // Submission is enqueued entirely under submitLock (spec §4.5 step
        // 1: "Under submitLock, enqueue any presentation requests ...").
        let mut submission = device.submission().lock();
        let mut windows = device.windows().lock();
        let mut present: Vec<(&mut B::Surface, B::Drawable)> = Vec::with_capacity(present_windows.len());
        for entry_opt in windows.get_disjoint_mut(&present_windows) {
            if let Some(entry) = entry_opt {
                if let Some(drawable) = entry.drawable.take() {
                    present.push((&mut entry.surface, drawable));
                }
                // The swapchain-aliasing container's scope ends at
                // submission (spec §8 property 8, "Swapchain-texture
                // scope"); a later command buffer must re-acquire.
                entry.texture = None;
            }
        }

        let result = {
            let fence_pool = device.fence_pool().lock();
            let fence = fence_pool.get(fence_index);
            device.backend().submit(encoder, fence.native(), &present)
        };
        drop(present);
        drop(windows);

        match result {
            Ok(()) => {
                submission.push(slot, fence_index, auto_release_fence, allocators, tracked);
                submission.sweep(&device);
                drop(submission);
                device.sweep_deferred_destroy();
                Ok(())
            }
            Err(e) => {
                drop(submission);
                error!("submit failed: {e}");
                // Best-effort rollback: return the slot and fence rather
                // than leaking them, and undo the tracking increments this
                // recording made. Any drawables already taken above are
                // dropped with `present` and cannot be un-acquired.
                device.cmd_buffer_pool().lock().give(slot);
                device.fence_pool().lock().release(fence_index);
                for alloc in allocators {
                    device.release_uniform_allocator(alloc);
                }
                untrack_all(&device, &tracked);
                Err(e)
            }
        }
    }
}

impl<B: Backend> Drop for CommandBuffer<B> {
    fn drop(&mut self) {
        if self.encoder.is_some() {
            error!("command buffer dropped without being submitted; its fence and slot leak");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nyxgfx_null::{NullBackend, NullCommand};

    fn device() -> Arc<Device<NullBackend>> {
        Device::new(NullBackend::new(), false)
    }

    fn vertex_buffer(device: &Arc<Device<NullBackend>>) -> BufferId {
        device
            .create_buffer(&BufferDescriptor {
                usage: BufferUsage::VERTEX,
                size: 64,
                label: None,
            })
            .unwrap()
    }

    #[test]
    fn bind_vertex_buffers_maps_each_binding_to_its_own_native_slot() {
        let device = device();
        let a = vertex_buffer(&device);
        let b = vertex_buffer(&device);
        let native_id = |id: BufferId| device.buffers().lock().get(id.index(), id.generation()).unwrap().active_native().id;
        let (a_native, b_native) = (native_id(a), native_id(b));

        let mut cb = device.acquire_command_buffer().unwrap();
        cb.bind_vertex_buffers(0, &[(a, 0), (b, 0)]);
        let enc = cb.take_encoder();

        match &enc.commands[0] {
            NullCommand::BindVertexBuffers { first_slot, buffer_ids, .. } => {
                assert_eq!(*first_slot, CommandBuffer::<NullBackend>::native_vertex_slot(1));
                // binding 0 must land on native_vertex_slot(0), the highest
                // slot in the contiguous range, i.e. the last entry here;
                // binding 1 on native_vertex_slot(1), the first entry.
                assert_eq!(*buffer_ids, vec![b_native, a_native]);
            }
            other => panic!("expected BindVertexBuffers, got {other:?}"),
        }
    }
}
