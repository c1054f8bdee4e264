//! Resource containers and the cycling protocol (spec §3, §4.1).
//!
//! A container owns a *ring* of backing instances and an *active* index.
//! Command buffers never own a backing instance; they only track it,
//! incrementing a refcount on acquire and decrementing it on cleanup (spec
//! §9 "Cyclic ownership is absent by design"): a plain `Vec`-backed ring
//! with a separate owning/non-owning split, rather than an `Arc`-based
//! handle graph, since a single device owns every container outright here.
use std::sync::atomic::{AtomicUsize, Ordering};

/// One concrete native GPU object inside a container's ring, plus the
/// atomic count of command buffers currently tracking it.
#[derive(Debug)]
pub struct BackingInstance<T> {
    pub native: T,
    refcount: AtomicUsize,
}

impl<T> BackingInstance<T> {
    fn new(native: T) -> Self {
        Self {
            native,
            refcount: AtomicUsize::new(0),
        }
    }

    pub fn refcount(&self) -> usize {
        self.refcount.load(Ordering::Acquire)
    }

    /// Called when a command buffer starts tracking this instance.
    pub fn track(&self) {
        self.refcount.fetch_add(1, Ordering::AcqRel);
    }

    /// Called when a command buffer retires and stops tracking this
    /// instance.
    pub fn untrack(&self) {
        let prev = self.refcount.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "backing instance refcount underflow");
    }
}

/// A polymorphic wrapper over a ring of backing instances of a concrete GPU
/// resource (spec §3 "Resource Container").
#[derive(Debug)]
pub struct Container<T> {
    ring: Vec<BackingInstance<T>>,
    active: usize,
    cycleable: bool,
    label: Option<String>,
    /// Set only for texture containers, so the blit helper can key its
    /// pipeline cache by destination format without a backend round-trip.
    format: Option<nyxgfx_base::TextureFormat>,
    /// Set only for transfer buffer containers, so a cycled backing instance
    /// can be recreated with the same direction/size without the caller
    /// having to re-supply the original descriptor.
    transfer_desc: Option<nyxgfx_base::TransferBufferDescriptor>,
}

impl<T> Container<T> {
    /// Wraps a single freshly-created backing instance. `cycleable` is
    /// `false` only for swapchain textures (spec §3).
    pub fn new(native: T, cycleable: bool) -> Self {
        Self {
            ring: vec![BackingInstance::new(native)],
            active: 0,
            cycleable,
            label: None,
            format: None,
            transfer_desc: None,
        }
    }

    pub fn format(&self) -> Option<nyxgfx_base::TextureFormat> {
        self.format
    }

    pub fn set_format(&mut self, format: nyxgfx_base::TextureFormat) {
        self.format = Some(format);
    }

    pub fn transfer_desc(&self) -> Option<&nyxgfx_base::TransferBufferDescriptor> {
        self.transfer_desc.as_ref()
    }

    pub fn set_transfer_desc(&mut self, desc: nyxgfx_base::TransferBufferDescriptor) {
        self.transfer_desc = Some(desc);
    }

    pub fn active(&self) -> &BackingInstance<T> {
        &self.ring[self.active]
    }

    pub fn active_native(&self) -> &T {
        &self.ring[self.active].native
    }

    /// The ring index of the currently-active instance, for callers that
    /// need to remember *which* instance they tracked rather than just
    /// "whatever is active now" (cycling may advance `active` before the
    /// tracking command buffer retires).
    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    pub fn cycleable(&self) -> bool {
        self.cycleable
    }

    /// Every ring instance, for sweeping at destroy/wait time (spec §4.6).
    pub fn instances(&self) -> &[BackingInstance<T>] {
        &self.ring
    }

    /// `true` once every backing instance has refcount zero (spec §4.6:
    /// "frees any container whose *every* backing instance has refcount
    /// zero").
    pub fn can_be_freed(&self) -> bool {
        self.ring.iter().all(|inst| inst.refcount() == 0)
    }

    /// Applies the cycling protocol (spec §4.1) ahead of a write-style
    /// operation. `gate_on_refcount` selects between the buffer-style gated
    /// predicate (`cycle && cycleable && refcount(active) > 0`, the
    /// specification's preferred reading) and the unconditional texture-style
    /// predicate (`cycle && cycleable`) the source's texture path actually
    /// uses (spec §9, open question: "texture cycling predicate"). `make`
    /// allocates a fresh native instance if the ring has no free slot to
    /// reuse.
    pub fn cycle(&mut self, cycle: bool, gate_on_refcount: bool, make: impl FnOnce() -> T) {
        if !cycle || !self.cycleable {
            return;
        }
        let should_cycle = if gate_on_refcount {
            self.ring[self.active].refcount() > 0
        } else {
            true
        };
        if !should_cycle {
            return;
        }
        if let Some(free) = self.ring.iter().position(|inst| inst.refcount() == 0) {
            self.active = free;
        } else {
            self.ring.push(BackingInstance::new(make()));
            self.active = self.ring.len() - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_reuses_free_instance_before_allocating() {
        let mut c = Container::new(0u32, true);
        c.active().track(); // simulate an in-flight command buffer
        let mut next_value = 1;
        c.cycle(true, true, || {
            let v = next_value;
            next_value += 1;
            v
        });
        assert_eq!(*c.active_native(), 1);
        assert_eq!(c.instances().len(), 2);

        // Untrack the old instance and free the new one; cycling again
        // should now reuse instance 0 instead of growing the ring.
        c.instances()[0].untrack();
        c.active().track();
        c.cycle(true, true, || {
            let v = next_value;
            next_value += 1;
            v
        });
        assert_eq!(c.instances().len(), 2, "a freed instance must be reused, not reallocated");
        assert_eq!(*c.active_native(), 0);
    }

    #[test]
    fn gated_cycle_is_noop_when_not_referenced() {
        let mut c = Container::new(0u32, true);
        c.cycle(true, true, || 1);
        assert_eq!(*c.active_native(), 0, "no in-flight reference means no cycle is needed");
        assert_eq!(c.instances().len(), 1);
    }

    #[test]
    fn ungated_cycle_always_advances() {
        let mut c = Container::new(0u32, false);
        // not cycleable: no-op regardless of gating
        c.cycle(true, false, || 1);
        assert_eq!(*c.active_native(), 0);
    }

    #[test]
    fn can_be_freed_requires_every_instance_idle() {
        let mut c = Container::new(0u32, true);
        c.active().track();
        c.cycle(true, true, || 1);
        assert!(!c.can_be_freed(), "instance 0 is still tracked");
        c.instances()[0].untrack();
        assert!(c.can_be_freed());
    }
}
