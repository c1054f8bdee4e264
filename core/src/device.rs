//! The device: top-level owner of pools, mutexes, and backend selection
//! (spec §3 "Device").
use crate::backend::Backend;
use crate::blit::BlitResources;
use crate::command_buffer::{CommandBuffer, CommandBufferSlot};
use crate::container::Container;
use crate::fence::FencePool;
use crate::submission::SubmissionEngine;
use crate::uniform::{UniformAllocator, DEFAULT_ALLOCATOR_SIZE};
use log::{error, warn};
use nyxgfx_base::*;
use nyxgfx_common::{GenPool, Pool, PoolIndex};
use parking_lot::Mutex;
use std::sync::Arc;

/// A swapchain entry: native surface state plus the non-cycleable texture
/// container that aliases the current drawable (spec §3 "Swapchain /
/// Window Data").
pub struct SwapchainEntry<B: Backend> {
    pub surface: B::Surface,
    pub drawable: Option<B::Drawable>,
    pub texture: Option<Container<B::Texture>>,
}

/// Set on a [`TextureId`]'s index to mark it as aliasing a window's
/// swapchain drawable rather than an entry in [`Device`]'s own texture
/// pool; the index's low bits then address the window pool instead (spec
/// §3: swapchain textures and regular textures are distinct container
/// kinds sharing the one public handle type).
pub(crate) const SWAPCHAIN_TAG: u32 = 0x8000_0000;

/// Resolves a [`TextureId`] to its native object, routing swapchain-tagged
/// handles to the window pool and everything else to the texture pool.
pub(crate) fn resolve_texture<'a, B: Backend>(
    textures: &'a GenPool<Container<B::Texture>>,
    windows: &'a GenPool<SwapchainEntry<B>>,
    id: TextureId,
) -> Option<&'a B::Texture> {
    if id.index() & SWAPCHAIN_TAG != 0 {
        windows
            .get(id.index() & !SWAPCHAIN_TAG, id.generation())?
            .texture
            .as_ref()
            .map(Container::active_native)
    } else {
        textures.get(id.index(), id.generation()).map(Container::active_native)
    }
}

/// Resolves a [`TextureId`] to its format, routing swapchain-tagged handles
/// to the window pool's surface query (spec §6 `get_swapchain_texture_format`)
/// so the blit helper can key its pipeline cache without a separate lookup
/// path per texture kind.
pub(crate) fn resolve_texture_format<B: Backend>(
    backend: &B,
    textures: &GenPool<Container<B::Texture>>,
    windows: &GenPool<SwapchainEntry<B>>,
    id: TextureId,
) -> Option<TextureFormat> {
    if id.index() & SWAPCHAIN_TAG != 0 {
        let entry = windows.get(id.index() & !SWAPCHAIN_TAG, id.generation())?;
        Some(backend.swapchain_texture_format(&entry.surface))
    } else {
        textures.get(id.index(), id.generation())?.format()
    }
}

/// Increments the tracked-reference count backing a [`TextureId`], again
/// routing swapchain-tagged handles to the window pool. Returns the ring
/// index of the instance that was tracked, so the caller can release the
/// *same* instance later even if the container has since cycled.
pub(crate) fn track_texture<B: Backend>(
    textures: &GenPool<Container<B::Texture>>,
    windows: &GenPool<SwapchainEntry<B>>,
    id: TextureId,
) -> Option<usize> {
    if id.index() & SWAPCHAIN_TAG != 0 {
        let tex = windows.get(id.index() & !SWAPCHAIN_TAG, id.generation())?.texture.as_ref()?;
        tex.active().track();
        Some(tex.active_index())
    } else {
        let c = textures.get(id.index(), id.generation())?;
        c.active().track();
        Some(c.active_index())
    }
}

/// Decrements the tracked-reference count of the specific ring instance
/// `instance`, as returned by [`track_texture`] at tracking time.
pub(crate) fn untrack_texture<B: Backend>(
    textures: &GenPool<Container<B::Texture>>,
    windows: &GenPool<SwapchainEntry<B>>,
    id: TextureId,
    instance: usize,
) {
    let container_instances = if id.index() & SWAPCHAIN_TAG != 0 {
        windows.get(id.index() & !SWAPCHAIN_TAG, id.generation()).and_then(|e| e.texture.as_ref())
    } else {
        textures.get(id.index(), id.generation())
    };
    if let Some(inst) = container_instances.and_then(|c| c.instances().get(instance)) {
        inst.untrack();
    }
}

/// Immutable pipeline/sampler/shader object storage: these have no ring and
/// no cycling, just create-once/release-once semantics (spec §3 "Graphics
/// Pipeline": "Immutable after creation").
pub struct ImmutablePool<T> {
    pool: GenPool<T>,
}

impl<T> Default for ImmutablePool<T> {
    fn default() -> Self {
        Self { pool: GenPool::new() }
    }
}

impl<T> ImmutablePool<T> {
    pub fn insert(&mut self, value: T) -> (u32, u32) {
        self.pool.insert(value)
    }
    pub fn get(&self, index: u32, generation: u32) -> Option<&T> {
        self.pool.get(index, generation)
    }
    pub fn remove(&mut self, index: u32, generation: u32) -> Option<T> {
        self.pool.remove(index, generation)
    }
}

/// Everything the submission engine and command buffers need to reach back
/// into, held behind the five concern-based mutexes named in spec §5.
pub struct Device<B: Backend> {
    backend: B,
    debug: bool,
    limits: DeviceLimits,

    // acquireCommandBufferLock
    cmd_buffer_pool: Mutex<Pool<CommandBufferSlot<B>>>,
    uniform_allocator_pool: Mutex<Vec<UniformAllocator<B>>>,

    // fenceLock
    fence_pool: Mutex<FencePool<B>>,

    // submitLock (submission + deferred destroy sweep)
    submission: Mutex<SubmissionEngine<B>>,

    // disposeLock
    to_destroy_textures: Mutex<Vec<Container<B::Texture>>>,
    to_destroy_buffers: Mutex<Vec<Container<B::Buffer>>>,

    // windowLock
    windows: Mutex<GenPool<SwapchainEntry<B>>>,

    textures: Mutex<GenPool<Container<B::Texture>>>,
    buffers: Mutex<GenPool<Container<B::Buffer>>>,
    transfer_buffers: Mutex<GenPool<Container<B::Buffer>>>,
    samplers: Mutex<ImmutablePool<B::Sampler>>,
    shaders: Mutex<ImmutablePool<B::Shader>>,
    graphics_pipelines: Mutex<ImmutablePool<B::GraphicsPipeline>>,
    compute_pipelines: Mutex<ImmutablePool<B::ComputePipeline>>,

    blit: Mutex<BlitResources<B>>,
}

impl<B: Backend> Device<B> {
    /// Creates a device around an already-selected backend (spec §6
    /// `create_device`; backend selection/probing across `preferred_backends`
    /// is the facade crate's job, not the core runtime's — see
    /// `nyxgfx::create_device`).
    pub fn new(backend: B, debug: bool) -> Arc<Self> {
        let limits = backend.limits();
        Arc::new(Self {
            backend,
            debug,
            limits,
            cmd_buffer_pool: Mutex::new(Pool::new()),
            uniform_allocator_pool: Mutex::new(Vec::new()),
            fence_pool: Mutex::new(FencePool::new()),
            submission: Mutex::new(SubmissionEngine::new()),
            to_destroy_textures: Mutex::new(Vec::new()),
            to_destroy_buffers: Mutex::new(Vec::new()),
            windows: Mutex::new(GenPool::new()),
            textures: Mutex::new(GenPool::new()),
            buffers: Mutex::new(GenPool::new()),
            transfer_buffers: Mutex::new(GenPool::new()),
            samplers: Mutex::new(ImmutablePool::default()),
            shaders: Mutex::new(ImmutablePool::default()),
            graphics_pipelines: Mutex::new(ImmutablePool::default()),
            compute_pipelines: Mutex::new(ImmutablePool::default()),
            blit: Mutex::new(BlitResources::new()),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Which native API this device's backend targets (spec §6 `get_backend`).
    pub fn backend_kind(&self) -> BackendBits {
        self.backend.kind()
    }

    pub fn limits(&self) -> &DeviceLimits {
        &self.limits
    }

    pub(crate) fn textures(&self) -> &Mutex<GenPool<Container<B::Texture>>> {
        &self.textures
    }
    pub(crate) fn buffers(&self) -> &Mutex<GenPool<Container<B::Buffer>>> {
        &self.buffers
    }
    pub(crate) fn transfer_buffers(&self) -> &Mutex<GenPool<Container<B::Buffer>>> {
        &self.transfer_buffers
    }
    pub(crate) fn samplers(&self) -> &Mutex<ImmutablePool<B::Sampler>> {
        &self.samplers
    }
    pub(crate) fn shaders(&self) -> &Mutex<ImmutablePool<B::Shader>> {
        &self.shaders
    }
    pub(crate) fn graphics_pipelines(&self) -> &Mutex<ImmutablePool<B::GraphicsPipeline>> {
        &self.graphics_pipelines
    }
    pub(crate) fn compute_pipelines(&self) -> &Mutex<ImmutablePool<B::ComputePipeline>> {
        &self.compute_pipelines
    }
    pub(crate) fn windows(&self) -> &Mutex<GenPool<SwapchainEntry<B>>> {
        &self.windows
    }
    pub(crate) fn cmd_buffer_pool(&self) -> &Mutex<Pool<CommandBufferSlot<B>>> {
        &self.cmd_buffer_pool
    }
    pub(crate) fn fence_pool(&self) -> &Mutex<FencePool<B>> {
        &self.fence_pool
    }
    pub(crate) fn uniform_allocator_pool(&self) -> &Mutex<Vec<UniformAllocator<B>>> {
        &self.uniform_allocator_pool
    }
    pub(crate) fn submission(&self) -> &Mutex<SubmissionEngine<B>> {
        &self.submission
    }
    pub(crate) fn blit(&self) -> &Mutex<BlitResources<B>> {
        &self.blit
    }

    /// Draws a uniform allocator from the pool, creating one if empty (spec
    /// §9 "Uniform allocator lifecycle").
    pub(crate) fn acquire_uniform_allocator(&self) -> Result<UniformAllocator<B>> {
        let mut pool = self.uniform_allocator_pool.lock();
        if let Some(alloc) = pool.pop() {
            return Ok(alloc);
        }
        drop(pool);
        let buffer = self.backend.create_buffer(&BufferDescriptor {
            usage: BufferUsage::empty(),
            size: DEFAULT_ALLOCATOR_SIZE,
            label: Some("uniform allocator".into()),
        })?;
        Ok(UniformAllocator::new(buffer, DEFAULT_ALLOCATOR_SIZE))
    }

    /// Returns an allocator to the pool with its offsets reset (spec §4.5
    /// "Cleanup").
    pub(crate) fn release_uniform_allocator(&self, mut alloc: UniformAllocator<B>) {
        alloc.reset();
        self.uniform_allocator_pool.lock().push(alloc);
    }

    pub fn create_buffer(&self, desc: &BufferDescriptor) -> Result<BufferId> {
        let native = self.backend.create_buffer(desc)?;
        let container = Container::new(native, true);
        let (index, generation) = self.buffers.lock().insert(container);
        Ok(BufferId::from_raw_parts(index, generation))
    }

    pub fn create_transfer_buffer(&self, desc: &TransferBufferDescriptor) -> Result<TransferBufferId> {
        let native = self.backend.create_transfer_buffer(desc)?;
        let mut container = Container::new(native, true);
        container.set_transfer_desc(desc.clone());
        let (index, generation) = self.transfer_buffers.lock().insert(container);
        Ok(TransferBufferId::from_raw_parts(index, generation))
    }

    pub fn create_texture(&self, desc: &TextureDescriptor) -> Result<TextureId> {
        let native = self.backend.create_texture(desc)?;
        let mut container = Container::new(native, true);
        container.set_format(desc.format);
        let (index, generation) = self.textures.lock().insert(container);
        Ok(TextureId::from_raw_parts(index, generation))
    }

    pub fn create_sampler(&self, desc: &SamplerDescriptor) -> Result<SamplerId> {
        let native = self.backend.create_sampler(desc)?;
        let (index, generation) = self.samplers.lock().insert(native);
        Ok(SamplerId::from_raw_parts(index, generation))
    }

    pub fn create_shader(&self, desc: &ShaderDescriptor<'_>) -> Result<ShaderId> {
        let native = self.backend.create_shader(desc)?;
        let (index, generation) = self.shaders.lock().insert(native);
        Ok(ShaderId::from_raw_parts(index, generation))
    }

    pub fn create_graphics_pipeline(
        &self,
        desc: &GraphicsPipelineDescriptor<'_>,
    ) -> Result<GraphicsPipelineId> {
        let shaders = self.shaders.lock();
        let vs = shaders
            .get(desc.vertex_shader.index(), desc.vertex_shader.generation())
            .ok_or_else(|| Error::new(ErrorKind::InvalidUsage))?;
        let fs = match desc.fragment_shader {
            Some(id) => Some(
                shaders
                    .get(id.index(), id.generation())
                    .ok_or_else(|| Error::new(ErrorKind::InvalidUsage))?,
            ),
            None => None,
        };
        let native = self.backend.create_graphics_pipeline(desc, (vs, fs))?;
        drop(shaders);
        let (index, generation) = self.graphics_pipelines.lock().insert(native);
        Ok(GraphicsPipelineId::from_raw_parts(index, generation))
    }

    pub fn create_compute_pipeline(&self, desc: &ComputePipelineDescriptor<'_>) -> Result<ComputePipelineId> {
        let shaders = self.shaders.lock();
        let shader = shaders
            .get(desc.shader.index(), desc.shader.generation())
            .ok_or_else(|| Error::new(ErrorKind::InvalidUsage))?;
        let native = self.backend.create_compute_pipeline(desc, shader)?;
        drop(shaders);
        let (index, generation) = self.compute_pipelines.lock().insert(native);
        Ok(ComputePipelineId::from_raw_parts(index, generation))
    }

    /// Moves a container onto the to-destroy list instead of freeing it
    /// immediately (spec §4.6 "Deferred Destruction").
    pub fn release_buffer(&self, id: BufferId) {
        if let Some(container) = self.buffers.lock().remove(id.index(), id.generation()) {
            self.to_destroy_buffers.lock().push(container);
        } else {
            error!("release_buffer: unknown or already-released handle");
        }
    }

    pub fn release_texture(&self, id: TextureId) {
        if let Some(container) = self.textures.lock().remove(id.index(), id.generation()) {
            self.to_destroy_textures.lock().push(container);
        } else {
            error!("release_texture: unknown or already-released handle");
        }
    }

    pub fn release_transfer_buffer(&self, id: TransferBufferId) {
        if let Some(container) = self.transfer_buffers.lock().remove(id.index(), id.generation()) {
            self.to_destroy_buffers.lock().push(container);
        } else {
            error!("release_transfer_buffer: unknown or already-released handle");
        }
    }

    /// Maps a transfer buffer for host access (spec §6 "Map" — S2's
    /// "Map, write a 4×4 checkerboard, unmap" upload step). Returns `None`
    /// for an unknown or already-released handle rather than panicking,
    /// matching the rest of this type's handle-resolution methods.
    pub fn map_transfer_buffer(&self, id: TransferBufferId) -> Option<*mut u8> {
        let transfer_buffers = self.transfer_buffers.lock();
        let native = transfer_buffers.get(id.index(), id.generation())?.active_native();
        match self.backend.map_buffer(native) {
            Ok(ptr) => Some(ptr),
            Err(e) => {
                error!("map_transfer_buffer failed: {e}");
                None
            }
        }
    }

    /// Unmaps a transfer buffer previously mapped with
    /// [`map_transfer_buffer`](Self::map_transfer_buffer).
    pub fn unmap_transfer_buffer(&self, id: TransferBufferId) {
        let transfer_buffers = self.transfer_buffers.lock();
        match transfer_buffers.get(id.index(), id.generation()) {
            Some(container) => self.backend.unmap_buffer(container.active_native()),
            None => error!("unmap_transfer_buffer: unknown or already-released handle"),
        }
    }

    /// Cycles a transfer buffer's backing instance ahead of a write if
    /// requested and due (spec §4.1), reusing a free ring slot before
    /// allocating a new native buffer. The allocation this may need is done
    /// up front, outside `Container::cycle`'s infallible `make` closure, by
    /// checking the same "every instance still referenced" predicate the
    /// closure would otherwise gate on.
    fn cycle_transfer_buffer(&self, container: &mut Container<B::Buffer>, cycle: bool) -> Result<()> {
        if !cycle || !container.cycleable() {
            return Ok(());
        }
        let needs_fresh_instance = container.instances().iter().all(|inst| inst.refcount() > 0);
        let mut fresh = None;
        if needs_fresh_instance {
            let desc = container
                .transfer_desc()
                .cloned()
                .ok_or_else(|| Error::new(ErrorKind::InvalidUsage))?;
            fresh = Some(self.backend.create_transfer_buffer(&desc)?);
        }
        container.cycle(true, true, || fresh.expect("cycle needed a fresh instance but none was pre-allocated"));
        Ok(())
    }

    /// Writes `src` into a transfer buffer at `{offset, size}`, optionally
    /// cycling the buffer's backing instance first (spec §6 "Transfer"
    /// `set_transfer_data`). Returns `false` (logging the cause) instead of
    /// panicking on an unknown handle, an out-of-range region, or a backend
    /// failure, matching this type's other fallible accessors.
    pub fn set_transfer_data(&self, src: &[u8], tb: TransferBufferId, offset: u64, size: u64, cycle: bool) -> bool {
        let mut transfer_buffers = self.transfer_buffers.lock();
        let container = match transfer_buffers.get_mut(tb.index(), tb.generation()) {
            Some(container) => container,
            None => {
                error!("set_transfer_data: unknown or already-released handle");
                return false;
            }
        };
        let region_len = size as usize;
        if src.len() < region_len {
            error!("set_transfer_data: src is shorter than size");
            return false;
        }
        if let Some(desc) = container.transfer_desc() {
            if offset.saturating_add(size) > desc.size {
                error!("set_transfer_data: {{offset, size}} exceeds the buffer's bounds");
                return false;
            }
        }
        if let Err(e) = self.cycle_transfer_buffer(container, cycle) {
            error!("set_transfer_data: cycle failed: {e}");
            return false;
        }
        let native = container.active_native();
        let ptr = match self.backend.map_buffer(native) {
            Ok(ptr) => ptr,
            Err(e) => {
                error!("set_transfer_data: map failed: {e}");
                return false;
            }
        };
        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), ptr.add(offset as usize), region_len);
        }
        self.backend.unmap_buffer(native);
        true
    }

    /// Reads a transfer buffer's `{offset, size}` region back into `dst`
    /// (spec §6 "Transfer" `get_transfer_data`). No cycling: a readback
    /// always targets the instance the caller just downloaded into.
    pub fn get_transfer_data(&self, tb: TransferBufferId, offset: u64, size: u64, dst: &mut [u8]) -> bool {
        let transfer_buffers = self.transfer_buffers.lock();
        let container = match transfer_buffers.get(tb.index(), tb.generation()) {
            Some(container) => container,
            None => {
                error!("get_transfer_data: unknown or already-released handle");
                return false;
            }
        };
        let region_len = size as usize;
        if dst.len() < region_len {
            error!("get_transfer_data: dst is shorter than size");
            return false;
        }
        if let Some(desc) = container.transfer_desc() {
            if offset.saturating_add(size) > desc.size {
                error!("get_transfer_data: {{offset, size}} exceeds the buffer's bounds");
                return false;
            }
        }
        let native = container.active_native();
        let ptr = match self.backend.map_buffer(native) {
            Ok(ptr) => ptr,
            Err(e) => {
                error!("get_transfer_data: map failed: {e}");
                return false;
            }
        };
        unsafe {
            std::ptr::copy_nonoverlapping(ptr.add(offset as usize), dst.as_mut_ptr(), region_len);
        }
        self.backend.unmap_buffer(native);
        true
    }

    pub fn release_sampler(&self, id: SamplerId) {
        self.samplers.lock().remove(id.index(), id.generation());
    }
    pub fn release_shader(&self, id: ShaderId) {
        self.shaders.lock().remove(id.index(), id.generation());
    }
    pub fn release_graphics_pipeline(&self, id: GraphicsPipelineId) {
        self.graphics_pipelines.lock().remove(id.index(), id.generation());
    }
    pub fn release_compute_pipeline(&self, id: ComputePipelineId) {
        self.compute_pipelines.lock().remove(id.index(), id.generation());
    }

    pub fn set_buffer_name(&self, id: BufferId, label: &str) {
        if let Some(c) = self.buffers.lock().get_mut(id.index(), id.generation()) {
            c.set_label(label.to_owned());
        }
    }

    pub fn set_texture_name(&self, id: TextureId, label: &str) {
        if let Some(c) = self.textures.lock().get_mut(id.index(), id.generation()) {
            c.set_label(label.to_owned());
        }
    }

    pub fn is_texture_format_supported(&self, format: TextureFormat, usage: TextureUsage) -> bool {
        self.backend.is_format_supported(format, usage)
    }

    pub fn get_best_sample_count(&self, format: TextureFormat, desired: u32) -> u32 {
        self.backend.best_sample_count(format, desired)
    }

    pub fn supports_present_mode(&self, mode: PresentMode) -> bool {
        self.backend.supports_present_mode(mode)
    }

    pub fn supports_swapchain_composition(&self, composition: SwapchainComposition) -> bool {
        self.backend.supports_composition(composition)
    }

    /// Claims a window for presentation, returning the generational handle
    /// pair to pass to [`unclaim_window`](Self::unclaim_window) and
    /// [`CommandBuffer::acquire_swapchain_texture`] — a window claim is
    /// tracked the same way every other resource is, rather than being
    /// addressed by the backend's raw `WindowHandle` after the fact.
    pub fn claim_window(
        self: &Arc<Self>,
        window: B::WindowHandle,
        composition: SwapchainComposition,
        present_mode: PresentMode,
    ) -> Option<(u32, u32)> {
        match self.backend.claim_window(window, composition, present_mode) {
            Ok(surface) => Some(self.windows.lock().insert(SwapchainEntry {
                surface,
                drawable: None,
                texture: None,
            })),
            Err(e) => {
                error!("claim_window failed: {e}");
                None
            }
        }
    }

    pub fn unclaim_window(&self, window_index: u32, window_generation: u32) {
        if let Some(entry) = self.windows.lock().remove(window_index, window_generation) {
            self.backend.unclaim_window(entry.surface);
        }
    }

    /// Requests a new composition/present mode for an already-claimed
    /// window (spec §6 "Window/swapchain"). Returns `true` only if the
    /// backend actually honored both requested values; a `false` return
    /// means the surface fell back to something else (same "best-effort,
    /// report whether it stuck" shape as [`Backend::set_swapchain_parameters`]).
    pub fn set_swapchain_parameters(&self, window_index: u32, window_generation: u32, composition: SwapchainComposition, present_mode: PresentMode) -> bool {
        match self.windows.lock().get_mut(window_index, window_generation) {
            Some(entry) => self.backend.set_swapchain_parameters(&mut entry.surface, composition, present_mode),
            None => {
                error!("set_swapchain_parameters: unknown or already-released window handle");
                false
            }
        }
    }

    /// Returns the pixel format a window's swapchain presents, so a
    /// graphics pipeline's color target can be created to match it (spec §6
    /// `get_swapchain_texture_format`).
    pub fn get_swapchain_texture_format(&self, window_index: u32, window_generation: u32) -> Option<TextureFormat> {
        let entry = self.windows.lock();
        let entry = entry.get(window_index, window_generation)?;
        Some(self.backend.swapchain_texture_format(&entry.surface))
    }

    /// Acquires a command buffer from the pool (spec §4.5).
    pub fn acquire_command_buffer(self: &Arc<Self>) -> Result<CommandBuffer<B>> {
        CommandBuffer::acquire(Arc::clone(self))
    }

    /// Drains all submitted work: spins on every fence, cleans in order,
    /// then runs the deferred-destroy sweep to completion (spec §4.6).
    pub fn wait(&self) {
        let mut submission = self.submission.lock();
        submission.drain(self);
        drop(submission);
        self.sweep_deferred_destroy();
    }

    pub(crate) fn sweep_deferred_destroy(&self) {
        self.to_destroy_textures.lock().retain(|c| !c.can_be_freed());
        self.to_destroy_buffers.lock().retain(|c| !c.can_be_freed());
    }

    /// Resolves a [`FenceId`] to its live native fence, `None` if the handle
    /// is stale (its slot has since been released and possibly recycled).
    fn resolve_fence(&self, id: FenceId) -> Option<B::Fence> {
        let fence_pool = self.fence_pool.lock();
        let index = PoolIndex::from_raw(id.index() as usize);
        if fence_pool.generation_of(index) != id.generation() {
            return None;
        }
        Some(fence_pool.get(index).native().clone())
    }

    /// `query_fence(d, fence) -> bool` (spec §6). A stale handle reports
    /// complete, matching the "log and no-op" error policy (spec §7): the
    /// thing it would have waited on is already gone.
    pub fn query_fence(&self, id: FenceId) -> bool {
        match self.resolve_fence(id) {
            Some(native) => self.backend.query_fence(&native),
            None => {
                error!("query_fence: unknown or already-released fence handle");
                true
            }
        }
    }

    /// `release_fence(d, fence)` (spec §6): returns a fence the caller
    /// retained via `submit_and_acquire_fence` back to the pool.
    pub fn release_fence(&self, id: FenceId) {
        let mut fence_pool = self.fence_pool.lock();
        let index = PoolIndex::from_raw(id.index() as usize);
        if fence_pool.generation_of(index) == id.generation() {
            fence_pool.release(index);
        } else {
            error!("release_fence: unknown or already-released fence handle");
        }
    }

    /// `wait_for_fences(d, waitAll, fences)` (spec §6). Stale handles are
    /// dropped from the wait set: they are already known-complete.
    pub fn wait_for_fences(&self, wait_all: bool, fences: &[FenceId]) {
        let natives: Vec<B::Fence> = fences.iter().filter_map(|id| self.resolve_fence(*id)).collect();
        if wait_all {
            for f in &natives {
                self.backend.wait_fence(f);
            }
        } else {
            if natives.is_empty() {
                return;
            }
            // No native "wait any" primitive is assumed; spin-poll until one
            // completes rather than assuming a bounded timeout (spec §5).
            loop {
                if natives.iter().any(|f| self.backend.query_fence(f)) {
                    return;
                }
                std::thread::yield_now();
            }
        }
    }

    /// Destroys the device: waits for GPU idle, releases every claimed
    /// window, drains deferred destruction (spec §3 "Device" lifecycle).
    pub fn destroy(&self) {
        self.wait();
        let entries = self.windows.lock().drain_values();
        for entry in entries {
            self.backend.unclaim_window(entry.surface);
        }
        self.backend.wait_idle();
        let textures_clean = self.to_destroy_textures.lock().iter().all(Container::can_be_freed);
        let buffers_clean = self.to_destroy_buffers.lock().iter().all(Container::can_be_freed);
        if !textures_clean || !buffers_clean {
            warn!("device destroyed with undestroyable containers still referenced");
        }
    }
}
