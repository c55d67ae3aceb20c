//! # Entities
//!
//! Game objects live in an [`EntityStore`]: a slot pool of one closed enum
//! type chosen by the application. Every variant must fit the configured
//! slot size, checked with [`fits_slot`]:
//!
//! ```rust
//! use tessera::fits_slot;
//!
//! struct Enemy {
//!     x: f32,
//!     y: f32,
//! }
//!
//! const _: () = assert!(fits_slot::<Enemy>(128));
//! ```

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tessera_core::{Collidable, EntityId, SlotPool, SpriteStore};
use tessera_render::DisplayConfig;

use crate::clock::Clock;
use crate::world::Scroll;

/// Returns true if a `T` fits in a slot of `bytes` bytes.
#[must_use]
pub const fn fits_slot<T>(bytes: usize) -> bool {
    std::mem::size_of::<T>() <= bytes
}

/// Result of an entity update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Keep the entity.
    Alive,
    /// Release the entity's sprites and free it at the end of the frame.
    Dead,
}

/// A game object driven by the frame driver.
pub trait Entity: Collidable + Sized {
    /// Called before rasterization, typically to copy the simulated
    /// position into the entity's sprites.
    fn pre_render(&mut self, sprites: &mut SpriteStore) {
        let _ = sprites;
    }

    /// Advances the entity by one frame.
    ///
    /// Collisions found during this frame's rasterization are in
    /// [`Collidable::interest`]. Whatever is left there afterwards is
    /// cleared by the driver.
    fn update(&mut self, id: EntityId, ctx: &mut UpdateContext<'_, Self>) -> Lifecycle;

    /// Gives back the entity's sprites. Called once, when it dies.
    fn release(&mut self, sprites: &mut SpriteStore);
}

/// Pool of entities.
#[derive(Debug)]
pub struct EntityStore<E> {
    pool: SlotPool<E>,
}

impl<E: Entity> EntityStore<E> {
    /// Creates a store for `capacity` entities.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            pool: SlotPool::new("entities", capacity),
        }
    }

    /// Stores an entity. Returns `None` when the store is full.
    pub fn alloc(&mut self, entity: E) -> Option<EntityId> {
        self.pool.alloc(entity)
    }

    /// Creates an entity that knows its own id.
    ///
    /// `init` may allocate sprites. If it returns `None`, nothing is stored
    /// and `init` must have released whatever it allocated.
    pub fn spawn(
        &mut self,
        sprites: &mut SpriteStore,
        init: impl FnOnce(EntityId, &mut SpriteStore) -> Option<E>,
    ) -> Option<EntityId> {
        self.pool.try_alloc_with(|id| init(id, sprites))
    }

    /// Releases an entity's sprites and queues it for removal.
    ///
    /// The entity stays readable until the end of the frame. Calling this
    /// twice for the same entity in one frame is a bug.
    pub fn free(&mut self, id: EntityId, sprites: &mut SpriteStore) {
        if let Some(entity) = self.pool.get_mut(id) {
            entity.release(sprites);
        }
        self.pool.free(id);
    }

    /// Reclaims every entity queued this frame.
    pub fn apply_free(&mut self) -> usize {
        self.pool.apply_free()
    }

    /// Returns an entity.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&E> {
        self.pool.get(id)
    }

    /// Returns an entity mutably.
    #[inline]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut E> {
        self.pool.get_mut(id)
    }

    /// Iterates live entities.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &E)> {
        self.pool.iter_live()
    }

    /// Number of live entities, including ones queued for removal.
    #[inline]
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.pool.live_len()
    }

    /// Maximum number of entities.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Returns the underlying pool.
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &SlotPool<E> {
        &self.pool
    }

    #[inline]
    pub(crate) fn pool_mut(&mut self) -> &mut SlotPool<E> {
        &mut self.pool
    }

    pub(crate) fn pre_render(&mut self, sprites: &mut SpriteStore) {
        let end = self.pool.live_end();
        for pos in 0..end {
            let Some(id) = self.pool.live_at(pos) else { break };
            if let Some(entity) = self.pool.get_mut(id) {
                entity.pre_render(sprites);
            }
        }
    }
}

/// What an entity can reach during its update.
pub struct UpdateContext<'w, E> {
    /// All entities except the one being updated.
    pub entities: &'w mut EntityStore<E>,
    /// All sprites.
    pub sprites: &'w mut SpriteStore,
    /// Frame timing.
    pub clock: &'w Clock,
    /// Background scroll.
    pub scroll: &'w Scroll,
    /// Screen geometry.
    pub display: &'w DisplayConfig,
    pub(crate) rng: &'w mut ChaCha8Rng,
    /// The entity being updated. It is checked out of `entities`.
    pub(crate) current: EntityId,
    pub(crate) despawn_current: bool,
}

impl<E: Entity> UpdateContext<'_, E> {
    /// Seconds since the previous frame.
    #[inline]
    #[must_use]
    pub fn dt(&self) -> f32 {
        self.clock.dt()
    }

    /// Creates an entity. It is first updated next frame.
    pub fn spawn(
        &mut self,
        init: impl FnOnce(EntityId, &mut SpriteStore) -> Option<E>,
    ) -> Option<EntityId> {
        self.entities.spawn(self.sprites, init)
    }

    /// Kills an entity.
    ///
    /// Despawning the entity being updated has the same effect as returning
    /// [`Lifecycle::Dead`].
    pub fn despawn(&mut self, id: EntityId) {
        if id == self.current {
            self.despawn_current = true;
        } else {
            self.entities.free(id, self.sprites);
        }
    }

    /// Uniform random value in `min..max`. Returns `min` for an empty range.
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        random_range(self.rng, min, max)
    }

    /// The game logic random generator.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut *self.rng
    }
}

pub(crate) fn random_range(rng: &mut ChaCha8Rng, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}
