//! # World
//!
//! The engine context: every piece of mutable game state in one value,
//! owned by the [`crate::Engine`] and lent to each phase of the frame.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tessera_core::{EntityId, SpriteStore};
use tessera_render::{DisplayConfig, TileMap, Viewport};

use crate::clock::Clock;
use crate::entity::{random_range, Entity, EntityStore, Lifecycle, UpdateContext};

/// Background scroll position and velocity, in tile map pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Scroll {
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
    /// Horizontal velocity per second.
    pub dx: f32,
    /// Vertical velocity per second.
    pub dy: f32,
}

impl Scroll {
    /// Moves by the velocity over `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.x += self.dx * dt;
        self.y += self.dy * dt;
    }

    /// The integer part of the position.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.x as i32, self.y as i32)
    }
}

/// All mutable game state.
pub struct World<E> {
    /// Game objects.
    pub entities: EntityStore<E>,
    /// Sprites owned by the game objects.
    pub sprites: SpriteStore,
    /// Background.
    pub tile_map: TileMap,
    /// Background scroll.
    pub scroll: Scroll,
    clock: Clock,
    rng: ChaCha8Rng,
    display: DisplayConfig,
}

impl<E: Entity> World<E> {
    pub(crate) fn new(
        entities: EntityStore<E>,
        sprites: SpriteStore,
        tile_map: TileMap,
        clock: Clock,
        seed: u64,
        display: DisplayConfig,
    ) -> Self {
        Self {
            entities,
            sprites,
            tile_map,
            scroll: Scroll::default(),
            clock,
            rng: ChaCha8Rng::seed_from_u64(seed),
            display,
        }
    }

    /// Frame timing.
    #[inline]
    #[must_use]
    pub const fn clock(&self) -> &Clock {
        &self.clock
    }

    pub(crate) fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// Screen geometry.
    #[inline]
    #[must_use]
    pub const fn display(&self) -> &DisplayConfig {
        &self.display
    }

    /// The game logic random generator.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Uniform random value in `min..max`. Returns `min` for an empty range.
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        random_range(&mut self.rng, min, max)
    }

    /// Creates an entity, see [`EntityStore::spawn`].
    pub fn spawn(
        &mut self,
        init: impl FnOnce(EntityId, &mut SpriteStore) -> Option<E>,
    ) -> Option<EntityId> {
        self.entities.spawn(&mut self.sprites, init)
    }

    /// Kills an entity, see [`EntityStore::free`].
    pub fn despawn(&mut self, id: EntityId) {
        self.entities.free(id, &mut self.sprites);
    }

    /// Largest scroll position that keeps the screen on the tile map.
    #[must_use]
    pub fn max_scroll(&self) -> (f32, f32) {
        let map_width = self.tile_map.columns() * self.display.tile_width;
        let map_height = self.tile_map.rows() * self.display.tile_height;
        (
            map_width.saturating_sub(self.display.width) as f32,
            map_height.saturating_sub(self.display.height) as f32,
        )
    }

    /// Pulls the scroll position back onto the tile map.
    pub fn clamp_scroll(&mut self) {
        let (max_x, max_y) = self.max_scroll();
        self.scroll.x = self.scroll.x.clamp(0.0, max_x);
        self.scroll.y = self.scroll.y.clamp(0.0, max_y);
    }

    pub(crate) fn pre_render(&mut self) {
        self.entities.pre_render(&mut self.sprites);
    }

    /// Updates every entity alive at the start of the pass.
    ///
    /// Entities spawned during the pass sit past `end` in the live list and
    /// are first updated next frame. Nothing is removed from the live list
    /// until commit, so positions below `end` stay valid throughout.
    pub(crate) fn update_entities(&mut self) -> usize {
        let end = self.entities.pool().live_end();
        let mut died = 0;

        for pos in 0..end {
            let Some(id) = self.entities.pool().live_at(pos) else {
                break;
            };
            // checked out so the entity can borrow the rest of the store
            // only the entity being updated is ever out of its slot, so a
            // live id always holds a value here
            let Some(mut entity) = self.entities.pool_mut().checkout(id) else {
                continue;
            };

            let mut ctx = UpdateContext {
                entities: &mut self.entities,
                sprites: &mut self.sprites,
                clock: &self.clock,
                scroll: &self.scroll,
                display: &self.display,
                rng: &mut self.rng,
                current: id,
                despawn_current: false,
            };
            let state = entity.update(id, &mut ctx);
            let dead = state == Lifecycle::Dead || ctx.despawn_current;
            entity.interest_mut().collided_with = None;

            if dead {
                entity.release(&mut self.sprites);
                self.entities.pool_mut().checkin(id, entity);
                self.entities.pool_mut().free(id);
                died += 1;
            } else {
                self.entities.pool_mut().checkin(id, entity);
            }
        }
        died
    }

    /// Reclaims everything freed this frame. Returns (entities, sprites).
    pub(crate) fn commit(&mut self) -> (usize, usize) {
        let entities = self.entities.apply_free();
        let sprites = self.sprites.apply_free();
        (entities, sprites)
    }
}

impl<E: Entity> std::fmt::Debug for World<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.pool())
            .field("sprites", &self.sprites)
            .field("scroll", &self.scroll)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
