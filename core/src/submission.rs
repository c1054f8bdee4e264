//! Submission engine: the `submitted` list and its sweep (spec §4.5
//! "Submission", §4.6 "Deferred Destruction"), guarded by the device's
//! `submitLock`.
use crate::backend::Backend;
use crate::command_buffer::{untrack_all, TrackedInstance};
use crate::device::Device;
use crate::uniform::UniformAllocator;
use nyxgfx_common::PoolIndex;

struct SubmittedEntry<B: Backend> {
    cmd_slot: PoolIndex,
    fence_index: PoolIndex,
    auto_release_fence: bool,
    uniform_allocators: Vec<UniformAllocator<B>>,
    tracked: Vec<TrackedInstance>,
}

/// The list of command buffers the backend queue has accepted but whose
/// fence hasn't yet reported complete.
pub struct SubmissionEngine<B: Backend> {
    submitted: Vec<SubmittedEntry<B>>,
}

impl<B: Backend> Default for SubmissionEngine<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> SubmissionEngine<B> {
    pub fn new() -> Self {
        Self { submitted: Vec::new() }
    }

    /// Appends a just-submitted command buffer (spec §4.5 step 4).
    pub(crate) fn push(
        &mut self,
        cmd_slot: PoolIndex,
        fence_index: PoolIndex,
        auto_release_fence: bool,
        uniform_allocators: Vec<UniformAllocator<B>>,
        tracked: Vec<TrackedInstance>,
    ) {
        self.submitted.push(SubmittedEntry {
            cmd_slot,
            fence_index,
            auto_release_fence,
            uniform_allocators,
            tracked,
        });
    }

    /// Retires every submission whose fence already reports complete: runs
    /// the cleanup steps from spec §4.5 ("decrement refcounts ... return
    /// uniform-allocators ... release the fence if auto ... return the
    /// command buffer to the pool") and drops it from the list. Submissions
    /// still in flight are left untouched.
    pub(crate) fn sweep(&mut self, device: &Device<B>) {
        let mut i = 0;
        while i < self.submitted.len() {
            let complete = {
                let fence_pool = device.fence_pool().lock();
                let fence = fence_pool.get(self.submitted[i].fence_index);
                fence.is_complete() || device.backend().query_fence(fence.native())
            };
            if !complete {
                i += 1;
                continue;
            }
            let entry = self.submitted.remove(i);
            {
                let fence_pool = device.fence_pool().lock();
                fence_pool.get(entry.fence_index).mark_complete();
            }
            untrack_all(device, &entry.tracked);
            for alloc in entry.uniform_allocators {
                device.release_uniform_allocator(alloc);
            }
            if entry.auto_release_fence {
                device.fence_pool().lock().release(entry.fence_index);
            }
            device.cmd_buffer_pool().lock().give(entry.cmd_slot);
        }
    }

    /// Spins on every in-flight fence until it completes, then sweeps the
    /// list to completion (spec §4.6: `Device::wait`/`Device::destroy`
    /// "guarantee a full drain").
    pub(crate) fn drain(&mut self, device: &Device<B>) {
        while !self.submitted.is_empty() {
            {
                let fence_pool = device.fence_pool().lock();
                for entry in &self.submitted {
                    device.backend().wait_fence(fence_pool.get(entry.fence_index).native());
                }
            }
            self.sweep(device);
        }
    }
}
