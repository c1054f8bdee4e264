//! A small freelist-backed object pool.
//!
//! A plain freelist-over-`Vec`, written against stable Rust, used by
//! `nyxgfx-core`'s fence pool and uniform sub-allocator pool (spec §4.2,
//! §4.5).

/// An opaque index into a [`Pool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolIndex(usize);

impl PoolIndex {
    /// Exposes the raw slot index, for callers (e.g. the fence pool) that
    /// need to key a side table by slot identity.
    pub fn raw(&self) -> usize {
        self.0
    }

    pub fn from_raw(raw: usize) -> Self {
        PoolIndex(raw)
    }
}

/// A pool of reusable `T`s. `take` draws (or creates) a free entry; `give`
/// returns it to the free list without dropping it, so a caller can reuse
/// the same backing allocation across many checkouts (e.g. a 1 MiB uniform
/// staging buffer that is cleared and rebound rather than freed).
#[derive(Debug)]
pub struct Pool<T> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Take a free entry, calling `make` to create one if the pool is
    /// empty.
    pub fn take_or_else(&mut self, make: impl FnOnce() -> T) -> (PoolIndex, &mut T) {
        let index = match self.free.pop() {
            Some(i) => i,
            None => {
                self.slots.push(None);
                self.slots.len() - 1
            }
        };
        self.slots[index] = Some(make());
        (PoolIndex(index), self.slots[index].as_mut().unwrap())
    }

    /// Return an entry to the free list. The value is kept (not dropped) so
    /// a future `take_or_else` can be served without reallocating.
    pub fn give(&mut self, index: PoolIndex) {
        debug_assert!(self.slots[index.0].is_some(), "double free of pool entry");
        self.free.push(index.0);
    }

    pub fn get(&self, index: PoolIndex) -> &T {
        self.slots[index.0].as_ref().expect("stale pool index")
    }

    pub fn get_mut(&mut self, index: PoolIndex) -> &mut T {
        self.slots[index.0].as_mut().expect("stale pool index")
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuses_freed_entries() {
        let mut pool: Pool<u32> = Pool::new();
        let (a, _) = pool.take_or_else(|| 1);
        pool.give(a);
        let (b, v) = pool.take_or_else(|| 2);
        assert_eq!(a, b, "a freed slot should be reused rather than growing the pool");
        assert_eq!(*v, 2, "take_or_else always re-initializes the slot");
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn grows_when_empty() {
        let mut pool: Pool<u32> = Pool::new();
        let (a, _) = pool.take_or_else(|| 1);
        let (b, _) = pool.take_or_else(|| 2);
        assert_ne!(a, b);
        assert_eq!(pool.len(), 2);
    }
}
