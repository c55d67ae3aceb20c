//! # Frame Driver
//!
//! ```text
//! Frame N:
//! ┌────────────────────────────────────────────────────────────────┐
//! │ 1. CLOCK         advance time, maybe finish an FPS interval    │
//! │ 2. PRE-RENDER    entities copy positions into their sprites    │
//! │ 3. RASTERIZE     tiles + sprites -> device, collisions noted   │
//! │ 4. UPDATE        entities alive at the start of the pass       │
//! │                  (reads this frame's collisions)               │
//! │ 5. COMMIT        reclaim freed entities, then freed sprites    │
//! │ 6. APPLICATION   cross-frame game logic                        │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The phases never overlap. The only concurrency is the device sending
//! one batch of scanlines while the compositor draws the next.

use std::time::Instant;

use tessera_core::SpriteStore;
use tessera_render::{Compositor, Device, RenderError, Resources, Scene, TileMap};

use crate::clock::{Clock, Millis};
use crate::config::EngineConfig;
use crate::entity::{Entity, EntityStore};
use crate::error::{EngineError, EngineResult};
use crate::stats::FrameStats;
use crate::world::World;

/// Game logic run once per frame after the commit.
pub trait Application<E: Entity> {
    /// Called at the end of every frame.
    fn on_frame_completed(&mut self, world: &mut World<E>);
}

impl<E: Entity, F: FnMut(&mut World<E>)> Application<E> for F {
    fn on_frame_completed(&mut self, world: &mut World<E>) {
        self(world);
    }
}

/// Owns the world, the compositor and the device, and runs frames.
pub struct Engine<E: Entity, D: Device> {
    world: World<E>,
    compositor: Compositor,
    resources: Resources,
    device: D,
    frame: u64,
    started: Instant,
}

impl<E: Entity, D: Device> Engine<E, D> {
    /// Builds the engine and brings up the device.
    ///
    /// Every pool and buffer is allocated here.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid, `E` does not fit
    /// `entity_slot_bytes`, the resources do not match the display or the
    /// tile map, a buffer cannot be allocated, or the device fails to
    /// initialize.
    pub fn new(
        config: &EngineConfig,
        resources: Resources,
        tile_map: TileMap,
        mut device: D,
    ) -> EngineResult<Self> {
        config.validate()?;
        let entity_bytes = std::mem::size_of::<E>();
        if entity_bytes > config.entity_slot_bytes {
            return Err(EngineError::InvalidConfig(format!(
                "entity type is {entity_bytes} bytes, slots hold {}",
                config.entity_slot_bytes
            )));
        }
        resources.validate(&config.display)?;
        if usize::from(tile_map.max_tile()) >= resources.tiles.len() {
            return Err(RenderError::ResourceMismatch(format!(
                "tile map uses tile {}, only {} tiles loaded",
                tile_map.max_tile(),
                resources.tiles.len()
            ))
            .into());
        }

        let compositor = Compositor::new(config.display.clone(), config.sprite_capacity)?;
        let entities = EntityStore::new(config.entity_capacity);
        let sprites = SpriteStore::new(config.sprite_capacity);

        tracing::info!(
            dma_buffers = compositor.footprint_bytes() - compositor.collision_map().footprint_bytes(),
            collision_map = compositor.collision_map().footprint_bytes(),
            sprites = sprites.pool().footprint_bytes(),
            entities = entities.pool().footprint_bytes(),
            entity_bytes,
            resources = resources.footprint_bytes(),
            "memory footprint (bytes)"
        );

        device.init().map_err(RenderError::from)?;

        let started = Instant::now();
        let clock = Clock::new(0, &config.clock);
        let world = World::new(
            entities,
            sprites,
            tile_map,
            clock,
            config.random_seed,
            config.display.clone(),
        );

        Ok(Self {
            world,
            compositor,
            resources,
            device,
            frame: 0,
            started,
        })
    }

    /// The game state.
    #[inline]
    #[must_use]
    pub const fn world(&self) -> &World<E> {
        &self.world
    }

    /// The game state, mutably. Use between frames.
    #[inline]
    pub fn world_mut(&mut self) -> &mut World<E> {
        &mut self.world
    }

    /// The device.
    #[inline]
    #[must_use]
    pub const fn device(&self) -> &D {
        &self.device
    }

    /// The compositor, for inspecting the last collision map.
    #[inline]
    #[must_use]
    pub const fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Number of frames completed.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Runs one frame at the current wall-clock time.
    ///
    /// # Errors
    ///
    /// See [`Engine::tick_at`].
    pub fn tick(&mut self, app: &mut impl Application<E>) -> EngineResult<FrameStats> {
        let now = self.started.elapsed().as_millis() as Millis;
        self.tick_at(now, app)
    }

    /// Runs one frame with `now_ms` as the current time.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ViewportOutOfBounds`] if the scroll position
    /// leaves the tile map. The frame stops before the update phase and
    /// nothing is sent to the device.
    pub fn tick_at(
        &mut self,
        now_ms: Millis,
        app: &mut impl Application<E>,
    ) -> EngineResult<FrameStats> {
        let frame_start = Instant::now();
        let fps_ready = self.world.clock_mut().on_frame(now_ms);

        self.world.pre_render();

        let render_start = Instant::now();
        let world = &mut self.world;
        let report = self.compositor.render_frame(
            world.scroll.viewport(),
            Scene {
                tile_map: &world.tile_map,
                resources: &self.resources,
                sprites: &world.sprites,
                entities: world.entities.pool_mut(),
            },
            &mut self.device,
        )?;
        let render_us = render_start.elapsed().as_micros() as u64;

        let entities_died = self.world.update_entities();
        let (entities_freed, sprites_freed) = self.world.commit();

        app.on_frame_completed(&mut self.world);

        let stats = FrameStats {
            frame: self.frame,
            dt: self.world.clock().dt(),
            render: report,
            entities: self.world.entities.live_len(),
            sprites: self.world.sprites.live_len(),
            entities_died,
            entities_freed,
            sprites_freed,
            render_us,
            total_us: frame_start.elapsed().as_micros() as u64,
        };
        self.frame += 1;

        if fps_ready {
            tracing::info!(
                fps = self.world.clock().fps(),
                dma_busy = report.dma.busy_percent(),
                objs = stats.entities,
                sprs = stats.sprites,
                "t={}",
                self.world.clock().ms()
            );
        }

        Ok(stats)
    }

    /// Waits for the last transfer and returns the device.
    pub fn into_device(mut self) -> D {
        self.device.wait_for_completion();
        self.device
    }
}

impl<E: Entity, D: Device> std::fmt::Debug for Engine<E, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("frame", &self.frame)
            .field("world", &self.world)
            .field("compositor", &self.compositor)
            .finish_non_exhaustive()
    }
}
