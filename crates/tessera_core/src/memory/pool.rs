//! # Slot Pool
//!
//! Fixed-capacity store with O(1) allocation, deferred removal and two views
//! of its contents:
//!
//! - the **live list**: allocated slots only, densely packed, reordered by
//!   every [`SlotPool::apply_free`]
//! - the **backing array**: every slot in storage order, addressed by
//!   [`SlotId`]. An id never changes while its instance is alive.
//!
//! ```text
//!  backing array   [ A ][ - ][ C ][ D ][ - ]      ids 0..N, never move
//!  live list       [ 0 ][ 3 ][ 2 ]                 order changes on commit
//!  live position   [ 0 ][ - ][ 2 ][ 1 ][ - ]      id -> index in live list
//!  free list       [ 4 ][ 1 ]                      top is handed out next
//!  pending         [ 3 ]                           removed at commit
//! ```
//!
//! Anything that has to stay valid across a commit (collision map entries,
//! sprite owners) stores a [`SlotId`], never a live-list position.

use std::fmt;
use std::mem;

/// Marker stored in the live-position table for slots that are not live.
const NOT_LIVE: u32 = u32::MAX;

/// Index of a slot in a pool's backing array.
///
/// Stable for the whole lifetime of the instance stored in the slot. After
/// the slot is reclaimed the same id is handed out again to a new instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SlotId(u32);

impl SlotId {
    /// Creates an id from a raw backing-array index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the backing-array index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw index.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A fixed-capacity pool with deferred, two-phase removal.
///
/// All memory is reserved in [`SlotPool::new`]; allocation, `free` and
/// `apply_free` never touch the heap.
///
/// # Removal
///
/// [`SlotPool::free`] only queues the slot. The instance stays readable and
/// stays in the live list until [`SlotPool::apply_free`] runs, which makes it
/// safe to free from inside a pass over the live list.
///
/// # Example
///
/// ```rust
/// use tessera_core::SlotPool;
///
/// let mut pool: SlotPool<u32> = SlotPool::new("bullets", 4);
///
/// let id = pool.alloc(7).expect("pool has room");
/// pool.free(id);
/// assert_eq!(pool.get(id), Some(&7)); // still there until commit
///
/// pool.apply_free();
/// assert_eq!(pool.get(id), None);
/// ```
pub struct SlotPool<T> {
    /// The backing array. `None` marks a reclaimed slot.
    storage: Box<[Option<T>]>,
    /// Free slot ids, used as a stack.
    free: Vec<SlotId>,
    /// Live slot ids, densely packed.
    live: Vec<SlotId>,
    /// Position of each slot in `live`, or `NOT_LIVE`.
    live_pos: Box<[u32]>,
    /// Slots freed this frame, reclaimed at `apply_free`.
    pending: Vec<SlotId>,
    /// Name used in diagnostics.
    name: &'static str,
}

impl<T> SlotPool<T> {
    /// Creates a pool with `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or does not fit a `u32`.
    #[must_use]
    pub fn new(name: &'static str, capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(
            capacity < NOT_LIVE as usize,
            "Capacity must be smaller than {NOT_LIVE}"
        );

        let storage: Vec<Option<T>> = (0..capacity).map(|_| None).collect();

        // Reversed so that slot 0 is handed out first.
        let free: Vec<SlotId> = (0..capacity as u32).rev().map(SlotId).collect();

        Self {
            storage: storage.into_boxed_slice(),
            free,
            live: Vec::with_capacity(capacity),
            live_pos: vec![NOT_LIVE; capacity].into_boxed_slice(),
            pending: Vec::with_capacity(capacity),
            name,
        }
    }

    /// Returns the pool name used in diagnostics.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the total number of slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Returns the number of live slots, including ones pending removal.
    #[inline]
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.live.len()
    }

    /// Returns the number of free slots.
    #[inline]
    #[must_use]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Returns the number of slots queued for removal.
    #[inline]
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if the next allocation would fail.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Returns the id the next allocation will use.
    #[inline]
    #[must_use]
    pub fn next_free(&self) -> Option<SlotId> {
        self.free.last().copied()
    }

    /// Stores `value` in a free slot.
    ///
    /// Returns `None` when the pool is exhausted. That is an expected outcome,
    /// callers usually just skip whatever they were about to create.
    pub fn alloc(&mut self, value: T) -> Option<SlotId> {
        self.try_alloc_with(|_| Some(value))
    }

    /// Allocates a slot, building the instance from its own id.
    pub fn alloc_with(&mut self, init: impl FnOnce(SlotId) -> T) -> Option<SlotId> {
        self.try_alloc_with(|id| Some(init(id)))
    }

    /// Allocates a slot if `init` produces an instance for it.
    ///
    /// The slot is only taken when `init` returns `Some`.
    pub fn try_alloc_with(&mut self, init: impl FnOnce(SlotId) -> Option<T>) -> Option<SlotId> {
        let id = self.next_free()?;
        let value = init(id)?;

        self.free.pop();
        self.live_pos[id.index()] = self.live.len() as u32;
        self.live.push(id);
        self.storage[id.index()] = Some(value);

        Some(id)
    }

    /// Queues a live slot for removal at the next [`SlotPool::apply_free`].
    ///
    /// Freeing the same slot twice before the commit, or freeing a slot that
    /// is not live, is a caller bug.
    ///
    /// # Panics
    ///
    /// Panics when more removals are queued than the pool has slots. That can
    /// only happen through a double free, and continuing would corrupt the
    /// free and live lists.
    pub fn free(&mut self, id: SlotId) {
        if self.pending.len() >= self.capacity() {
            tracing::error!(
                pool = self.name,
                slot = %id,
                pending = self.pending.len(),
                "free overrun, pool invariant violated"
            );
            panic!("slot pool '{}': free overrun", self.name);
        }
        self.pending.push(id);
    }

    /// Reclaims every slot queued by [`SlotPool::free`].
    ///
    /// Each removal moves the last live entry into the removed entry's
    /// position, so the live list stays dense but loses its order. The
    /// removed instances are dropped.
    ///
    /// Returns the number of reclaimed slots.
    ///
    /// # Panics
    ///
    /// Panics if a queued slot is not live.
    pub fn apply_free(&mut self) -> usize {
        let count = self.pending.len();

        for id in self.pending.drain(..) {
            let pos = self.live_pos[id.index()];
            assert!(
                pos != NOT_LIVE,
                "slot pool '{}': slot {id} freed but not live",
                self.name
            );

            let Some(last) = self.live.pop() else {
                panic!("slot pool '{}': live list empty during commit", self.name);
            };
            if last != id {
                self.live[pos as usize] = last;
                self.live_pos[last.index()] = pos;
            }

            self.live_pos[id.index()] = NOT_LIVE;
            self.storage[id.index()] = None;
            self.free.push(id);
        }

        count
    }

    /// Gets a reference to a live instance.
    #[inline]
    #[must_use]
    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.storage.get(id.index())?.as_ref()
    }

    /// Gets a mutable reference to a live instance.
    #[inline]
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.storage.get_mut(id.index())?.as_mut()
    }

    /// Returns the whole backing array in storage order.
    ///
    /// Reclaimed slots show up as `None`. Positions in this slice are the
    /// dense indices the compositor writes into the collision map.
    #[inline]
    #[must_use]
    pub fn all(&self) -> &[Option<T>] {
        &self.storage
    }

    /// Returns the length of the backing array.
    #[inline]
    #[must_use]
    pub fn all_len(&self) -> usize {
        self.storage.len()
    }

    /// Gets the instance at a dense backing-array index.
    #[inline]
    #[must_use]
    pub fn instance_at(&self, dense: usize) -> Option<&T> {
        self.storage.get(dense)?.as_ref()
    }

    /// Gets the instance at a dense backing-array index, mutably.
    #[inline]
    pub fn instance_at_mut(&mut self, dense: usize) -> Option<&mut T> {
        self.storage.get_mut(dense)?.as_mut()
    }

    /// Returns the live list.
    #[inline]
    #[must_use]
    pub fn live(&self) -> &[SlotId] {
        &self.live
    }

    /// Returns one past the last live position.
    ///
    /// A pass that may allocate must read this once before it starts, so that
    /// instances created during the pass are not visited by it.
    #[inline]
    #[must_use]
    pub fn live_end(&self) -> usize {
        self.live.len()
    }

    /// Returns the slot at a live-list position.
    #[inline]
    #[must_use]
    pub fn live_at(&self, pos: usize) -> Option<SlotId> {
        self.live.get(pos).copied()
    }

    /// Returns the current live-list position of a slot.
    #[inline]
    #[must_use]
    pub fn live_position(&self, id: SlotId) -> Option<usize> {
        match self.live_pos.get(id.index()) {
            Some(&pos) if pos != NOT_LIVE => Some(pos as usize),
            _ => None,
        }
    }

    /// Iterates over live instances in live-list order.
    pub fn iter_live(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.live
            .iter()
            .filter_map(|&id| self.storage[id.index()].as_ref().map(|v| (id, v)))
    }

    /// Moves an instance out of its slot without releasing the slot.
    ///
    /// The slot stays live and keeps its id. It reads as empty until
    /// [`SlotPool::checkin`] puts an instance back. Used to run an instance's
    /// own logic while it holds a mutable borrow of the pool.
    #[inline]
    pub fn checkout(&mut self, id: SlotId) -> Option<T> {
        self.storage.get_mut(id.index())?.take()
    }

    /// Puts a checked-out instance back into its slot.
    #[inline]
    pub fn checkin(&mut self, id: SlotId, value: T) {
        let slot = &mut self.storage[id.index()];
        debug_assert!(slot.is_none(), "checkin into an occupied slot {id}");
        *slot = Some(value);
    }

    /// Returns the heap memory reserved by the pool in bytes.
    #[must_use]
    pub fn footprint_bytes(&self) -> usize {
        let n = self.capacity();
        n * mem::size_of::<Option<T>>()
            + 3 * n * mem::size_of::<SlotId>()
            + n * mem::size_of::<u32>()
    }
}

impl<T> fmt::Debug for SlotPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotPool")
            .field("name", &self.name)
            .field("capacity", &self.capacity())
            .field("live", &self.live.len())
            .field("free", &self.free.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn assert_consistent<T>(pool: &SlotPool<T>) {
        assert_eq!(pool.free_len() + pool.live_len(), pool.capacity());
        for (pos, &id) in pool.live().iter().enumerate() {
            assert_eq!(pool.live_position(id), Some(pos), "stale position for {id}");
            assert!(pool.get(id).is_some());
        }
        let unique: HashSet<_> = pool.live().iter().collect();
        assert_eq!(unique.len(), pool.live_len());
    }

    #[test]
    fn test_capacity_four_scenario() {
        let mut pool: SlotPool<u32> = SlotPool::new("test", 4);

        let ids: Vec<_> = (0..4).map(|i| pool.alloc(i).unwrap()).collect();
        let distinct: HashSet<_> = ids.iter().collect();
        assert_eq!(distinct.len(), 4);
        assert!(pool.alloc(99).is_none());

        pool.free(ids[2]);
        assert_eq!(pool.apply_free(), 1);

        let reused = pool.alloc(42).unwrap();
        assert_eq!(reused, ids[2]);
        assert_eq!(pool.get(reused), Some(&42));
    }

    #[test]
    fn test_alloc_fails_only_when_full() {
        let mut pool: SlotPool<u8> = SlotPool::new("test", 3);
        for i in 0..3 {
            assert!(!pool.is_full());
            assert!(pool.alloc(i).is_some());
        }
        assert!(pool.is_full());
        assert!(pool.alloc(3).is_none());
    }

    #[test]
    fn test_free_is_deferred() {
        let mut pool: SlotPool<&str> = SlotPool::new("test", 2);
        let id = pool.alloc("ship").unwrap();

        pool.free(id);
        assert_eq!(pool.get(id), Some(&"ship"));
        assert_eq!(pool.live_len(), 1);
        assert_eq!(pool.pending_len(), 1);

        pool.apply_free();
        assert_eq!(pool.get(id), None);
        assert_eq!(pool.live_len(), 0);
        assert_eq!(pool.pending_len(), 0);
    }

    #[test]
    fn test_swap_remove_updates_positions() {
        let mut pool: SlotPool<u32> = SlotPool::new("test", 5);
        let ids: Vec<_> = (0..5).map(|i| pool.alloc(i).unwrap()).collect();

        pool.free(ids[0]);
        pool.free(ids[3]);
        pool.apply_free();

        assert_eq!(pool.live_len(), 3);
        assert_eq!(pool.live_position(ids[0]), None);
        assert_eq!(pool.live_position(ids[3]), None);
        assert_consistent(&pool);
    }

    #[test]
    fn test_free_last_live_entry() {
        let mut pool: SlotPool<u32> = SlotPool::new("test", 3);
        let a = pool.alloc(1).unwrap();
        let b = pool.alloc(2).unwrap();

        pool.free(b);
        pool.apply_free();

        assert_eq!(pool.live(), &[a]);
        assert_consistent(&pool);
    }

    #[test]
    fn test_alloc_with_sees_own_id() {
        let mut pool: SlotPool<SlotId> = SlotPool::new("test", 2);
        let id = pool.alloc_with(|id| id).unwrap();
        assert_eq!(pool.get(id), Some(&id));
    }

    #[test]
    fn test_try_alloc_with_keeps_slot_on_refusal() {
        let mut pool: SlotPool<u32> = SlotPool::new("test", 1);
        assert!(pool.try_alloc_with(|_| None).is_none());
        assert_eq!(pool.free_len(), 1);
        assert!(pool.alloc(1).is_some());
    }

    #[test]
    fn test_all_keeps_dense_indices() {
        let mut pool: SlotPool<u32> = SlotPool::new("test", 4);
        let ids: Vec<_> = (10..14).map(|v| pool.alloc(v).unwrap()).collect();

        pool.free(ids[1]);
        pool.apply_free();

        assert_eq!(pool.all_len(), 4);
        assert_eq!(pool.instance_at(ids[3].index()), Some(&13));
        assert_eq!(pool.instance_at(ids[1].index()), None);
        assert!(pool.all()[ids[1].index()].is_none());
    }

    #[test]
    fn test_checkout_keeps_slot_live() {
        let mut pool: SlotPool<u32> = SlotPool::new("test", 2);
        let id = pool.alloc(5).unwrap();

        let value = pool.checkout(id).unwrap();
        assert_eq!(pool.live_len(), 1);
        assert!(pool.get(id).is_none());

        pool.checkin(id, value + 1);
        assert_eq!(pool.get(id), Some(&6));
    }

    #[test]
    #[should_panic(expected = "free overrun")]
    fn test_free_overrun_panics() {
        let mut pool: SlotPool<u32> = SlotPool::new("test", 2);
        let id = pool.alloc(1).unwrap();
        pool.free(id);
        pool.free(id);
        pool.free(id);
    }

    #[test]
    fn test_random_interleavings_hold_invariants() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut pool: SlotPool<u64> = SlotPool::new("test", 32);
        let mut allocs = 0usize;
        let mut committed = 0usize;
        let mut pending: Vec<SlotId> = Vec::new();

        for step in 0..5_000u64 {
            match rng.gen_range(0..10) {
                0..=4 => {
                    let full = pool.live_len() == pool.capacity();
                    match pool.alloc(step) {
                        Some(id) => {
                            assert!(!full);
                            assert_eq!(pool.get(id), Some(&step));
                            allocs += 1;
                        }
                        None => assert!(full),
                    }
                }
                5..=7 => {
                    let candidates: Vec<SlotId> = pool
                        .live()
                        .iter()
                        .copied()
                        .filter(|id| !pending.contains(id))
                        .collect();
                    if !candidates.is_empty() {
                        let id = candidates[rng.gen_range(0..candidates.len())];
                        let before = *pool.get(id).unwrap();
                        pool.free(id);
                        assert_eq!(pool.get(id), Some(&before));
                        pending.push(id);
                    }
                }
                _ => {
                    committed += pool.apply_free();
                    pending.clear();
                }
            }
            assert_eq!(pool.live_len(), allocs - committed);
            assert_consistent(&pool);
        }
    }

    #[test]
    fn test_footprint_counts_index_arrays() {
        let pool: SlotPool<u64> = SlotPool::new("test", 10);
        assert!(pool.footprint_bytes() >= 10 * std::mem::size_of::<Option<u64>>() + 4 * 10 * 4);
    }
}
