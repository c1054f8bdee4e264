//! Fence pool (spec §3 "Fence", §4.5).
use crate::backend::Backend;
use nyxgfx_base::Result;
use nyxgfx_common::{Pool, PoolIndex};
use std::sync::atomic::{AtomicBool, Ordering};

/// A single-bit atomic completion flag attached to one command buffer at a
/// time. The `complete` flag is set by the submission engine's completion
/// callback, never by the application.
#[derive(Debug)]
pub struct Fence<B: Backend> {
    native: B::Fence,
    complete: AtomicBool,
}

impl<B: Backend> Fence<B> {
    fn new(native: B::Fence) -> Self {
        Self {
            native,
            complete: AtomicBool::new(false),
        }
    }

    pub fn native(&self) -> &B::Fence {
        &self.native
    }

    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    pub fn mark_complete(&self) {
        self.complete.store(true, Ordering::Release);
    }
}

/// Recyclable pool of [`Fence`]s, guarded by the device's `fenceLock` (spec
/// §5). Grounded in the same freelist shape as [`nyxgfx_common::Pool`];
/// reuse replaces a fence's native handle rather than reallocating the
/// `Fence<B>` wrapper.
#[derive(Debug)]
pub struct FencePool<B: Backend> {
    pool: Pool<Fence<B>>,
    /// Per-slot generation, bumped on release so a `FenceId` handed to the
    /// application by `submit_and_acquire_fence` goes stale once the slot is
    /// recycled, rather than silently aliasing an unrelated later fence.
    generation: Vec<u32>,
}

impl<B: Backend> Default for FencePool<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> FencePool<B> {
    pub fn new() -> Self {
        Self {
            pool: Pool::new(),
            generation: Vec::new(),
        }
    }

    /// Takes or allocates a fence, resetting its complete flag to 0 (spec
    /// §4.5 step 4). `take_or_else` always re-runs its closure, on reuse as
    /// much as on growth, so every acquisition gets a fresh `Fence::new`
    /// with `complete` cleared regardless of whether the slot is recycled.
    /// Returns the slot's current generation alongside its index.
    pub fn acquire(&mut self, backend: &B) -> Result<(PoolIndex, u32)> {
        let native = backend.new_fence()?;
        let (index, _) = self.pool.take_or_else(|| Fence::new(native));
        let raw = index.raw();
        if self.generation.len() <= raw {
            self.generation.resize(raw + 1, 0);
        }
        Ok((index, self.generation[raw]))
    }

    pub fn get(&self, index: PoolIndex) -> &Fence<B> {
        self.pool.get(index)
    }

    pub fn generation_of(&self, index: PoolIndex) -> u32 {
        self.generation.get(index.raw()).copied().unwrap_or(0)
    }

    pub fn release(&mut self, index: PoolIndex) {
        self.pool.give(index);
        if let Some(g) = self.generation.get_mut(index.raw()) {
            *g = g.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nyxgfx_null::NullBackend;

    #[test]
    fn released_slot_is_reused_with_bumped_generation() {
        let backend = NullBackend::new();
        let mut pool = FencePool::<NullBackend>::new();
        let (index, generation) = pool.acquire(&backend).unwrap();
        assert_eq!(generation, 0);
        assert!(!pool.get(index).is_complete());

        pool.get(index).mark_complete();
        pool.release(index);

        let (index2, generation2) = pool.acquire(&backend).unwrap();
        assert_eq!(index2, index, "the only freed slot must be reused rather than growing the pool");
        assert_eq!(generation2, 1, "generation must bump on release so a stale FenceId cannot alias the new fence");
        assert!(!pool.get(index2).is_complete(), "a reacquired slot must start with a cleared complete flag");
    }
}
