//! # Frame Driver Tests
//!
//! Full frames through a [`MemoryDevice`]: phase order, collision hand-off,
//! commit timing and spawning during update.

use tessera::core::{Collidable, CollisionBits, EntityId, Interest, Sprite, SpriteId, SpriteStore};
use tessera::render::{
    DisplayConfig, ImageTable, MemoryDevice, Palette, RenderError, Resources, TileMap,
};
use tessera::{
    ClockConfig, Engine, EngineConfig, EngineError, Entity, Lifecycle, UpdateContext, World,
};

const THING: CollisionBits = 1;

struct Probe {
    interest: Interest,
    sprite: SpriteId,
    x: i16,
    y: i16,
    updates: u32,
    hits: u32,
    last_hit: Option<EntityId>,
    ignore_hits: bool,
    die_on_hit: bool,
    spawn_child: bool,
    last_child: Option<EntityId>,
    despawn_self: bool,
}

impl Probe {
    fn new(sprite: SpriteId, x: i16, y: i16) -> Self {
        Self {
            interest: Interest::new(THING, THING),
            sprite,
            x,
            y,
            updates: 0,
            hits: 0,
            last_hit: None,
            ignore_hits: false,
            die_on_hit: false,
            spawn_child: false,
            last_child: None,
            despawn_self: false,
        }
    }

    fn spawn(id: EntityId, sprites: &mut SpriteStore, x: i16, y: i16) -> Option<Self> {
        let sprite = sprites.alloc(Sprite::new(id).with_image(0))?;
        Some(Self::new(sprite, x, y))
    }
}

impl Collidable for Probe {
    fn interest(&self) -> &Interest {
        &self.interest
    }

    fn interest_mut(&mut self) -> &mut Interest {
        &mut self.interest
    }
}

impl Entity for Probe {
    fn pre_render(&mut self, sprites: &mut SpriteStore) {
        if let Some(sprite) = sprites.get_mut(self.sprite) {
            sprite.set_position(self.x, self.y);
        }
    }

    fn update(&mut self, id: EntityId, ctx: &mut UpdateContext<'_, Self>) -> Lifecycle {
        self.updates += 1;
        if self.despawn_self {
            ctx.despawn(id);
            return Lifecycle::Alive;
        }
        if self.spawn_child {
            self.last_child = ctx.spawn(|id, sprites| Self::spawn(id, sprites, 100, 100));
        }
        if self.ignore_hits {
            return Lifecycle::Alive;
        }
        if let Some(other) = self.interest.take_collision() {
            self.hits += 1;
            self.last_hit = Some(other);
            if self.die_on_hit {
                return Lifecycle::Dead;
            }
        }
        Lifecycle::Alive
    }

    fn release(&mut self, sprites: &mut SpriteStore) {
        sprites.release(self.sprite);
    }
}

fn config() -> EngineConfig {
    EngineConfig {
        display: DisplayConfig {
            width: 32,
            height: 24,
            dma_scanlines: 8,
            tile_width: 8,
            tile_height: 8,
            sprite_width: 8,
            sprite_height: 8,
            layer_count: 2,
        },
        entity_capacity: 8,
        sprite_capacity: 8,
        clock: ClockConfig {
            locked_dt_ms: 16,
            fps_interval_ms: 0,
        },
        ..Default::default()
    }
}

fn resources() -> Resources {
    Resources {
        tile_palette: Palette::from_fn(|_| 0x0101),
        sprite_palette: Palette::from_fn(|ix| 0xF000 | u16::from(ix)),
        tiles: ImageTable::from_fn(8, 8, 1, |_, _, _| 1),
        sprites: ImageTable::from_fn(8, 8, 1, |_, _, _| 1),
    }
}

fn engine() -> Engine<Probe, MemoryDevice> {
    let config = config();
    let device = MemoryDevice::for_display(&config.display);
    Engine::new(&config, resources(), TileMap::filled(4, 3, 0), device).unwrap()
}

fn spawn(engine: &mut Engine<Probe, MemoryDevice>, x: i16, y: i16) -> EntityId {
    engine
        .world_mut()
        .spawn(|id, sprites| Probe::spawn(id, sprites, x, y))
        .unwrap()
}

fn probe(engine: &Engine<Probe, MemoryDevice>, id: EntityId) -> &Probe {
    engine.world().entities.get(id).unwrap()
}

fn probe_mut(engine: &mut Engine<Probe, MemoryDevice>, id: EntityId) -> &mut Probe {
    engine.world_mut().entities.get_mut(id).unwrap()
}

fn noop(_: &mut World<Probe>) {}

#[test]
fn test_frame_streams_whole_screen() {
    let mut engine = engine();
    let stats = engine.tick_at(0, &mut noop).unwrap();

    assert_eq!(stats.frame, 0);
    assert_eq!(stats.render.dma.writes, 3);
    assert_eq!(stats.render.dma.bytes, 32 * 24 * 2);
    assert_eq!(engine.device().frames_presented(), 1);
    assert_eq!(engine.device().pixel(31, 23), Some(0x0101));
    assert_eq!(engine.frame(), 1);
}

#[test]
fn test_collision_seen_in_same_frame() {
    let mut engine = engine();
    let a = spawn(&mut engine, 0, 0);
    let b = spawn(&mut engine, 20, 0);

    engine.tick_at(0, &mut noop).unwrap();
    assert_eq!(probe(&engine, a).hits, 0);

    // pre-render moves the sprite before rasterization, so the overlap is
    // found and handed to update within this one frame
    probe_mut(&mut engine, a).x = 18;
    engine.tick_at(16, &mut noop).unwrap();

    assert_eq!(probe(&engine, a).last_hit, Some(b));
    assert_eq!(probe(&engine, b).last_hit, Some(a));
    assert_eq!(probe(&engine, a).hits, 1);
}

#[test]
fn test_collision_consumed_once() {
    let mut engine = engine();
    let a = spawn(&mut engine, 0, 0);
    let _b = spawn(&mut engine, 4, 4);

    engine.tick_at(0, &mut noop).unwrap();
    assert_eq!(probe(&engine, a).hits, 1);

    probe_mut(&mut engine, a).y = 16;
    engine.tick_at(16, &mut noop).unwrap();
    assert_eq!(probe(&engine, a).hits, 1);
}

#[test]
fn test_unread_collision_is_cleared() {
    let mut engine = engine();
    let a = spawn(&mut engine, 0, 0);
    spawn(&mut engine, 0, 0);
    probe_mut(&mut engine, a).ignore_hits = true;

    engine.tick_at(0, &mut noop).unwrap();
    assert_eq!(probe(&engine, a).interest.collided_with, None);
}

#[test]
fn test_dead_entities_committed_before_hook() {
    let mut engine = engine();
    let a = spawn(&mut engine, 0, 0);
    spawn(&mut engine, 2, 2);
    probe_mut(&mut engine, a).die_on_hit = true;

    let mut seen = None;
    let mut hook = |world: &mut World<Probe>| {
        seen = Some((world.entities.live_len(), world.sprites.live_len()));
    };
    let stats = engine.tick_at(0, &mut hook).unwrap();

    assert_eq!(seen, Some((1, 1)));
    assert_eq!(stats.entities_died, 1);
    assert_eq!(stats.entities_freed, 1);
    assert_eq!(stats.sprites_freed, 1);
    assert_eq!(stats.entities, 1);
    assert!(engine.world().entities.get(a).is_none());
}

#[test]
fn test_despawning_self_releases_sprites() {
    let mut engine = engine();
    let a = spawn(&mut engine, 0, 0);
    probe_mut(&mut engine, a).despawn_self = true;

    let stats = engine.tick_at(0, &mut noop).unwrap();

    assert_eq!(stats.entities, 0);
    assert_eq!(stats.sprites, 0);
    assert_eq!(stats.entities_died, 1);
    assert_eq!(stats.sprites_freed, 1);

    // the freed slots are reused without a stale sprite pointing at them
    let b = spawn(&mut engine, 0, 0);
    assert_eq!(b, a);
    assert_eq!(engine.world().sprites.live_len(), 1);
}

#[test]
fn test_despawning_another_entity() {
    let mut engine = engine();
    let a = spawn(&mut engine, 0, 0);
    let b = spawn(&mut engine, 20, 0);

    let mut hook = |world: &mut World<Probe>| world.despawn(b);
    let stats = engine.tick_at(0, &mut hook).unwrap();
    assert_eq!(stats.entities, 2);

    let stats = engine.tick_at(16, &mut noop).unwrap();
    assert_eq!(stats.entities_freed, 1);
    assert_eq!(stats.sprites_freed, 1);
    assert_eq!(stats.entities_died, 0);
    assert_eq!(engine.world().sprites.live_len(), 1);
    assert!(engine.world().entities.get(a).is_some());
}

#[test]
fn test_spawned_entities_wait_a_frame() {
    let mut engine = engine();
    let parent = spawn(&mut engine, 0, 0);
    probe_mut(&mut engine, parent).spawn_child = true;

    engine.tick_at(0, &mut noop).unwrap();
    let child = probe(&engine, parent).last_child.unwrap();
    assert_eq!(probe(&engine, child).updates, 0);
    assert_eq!(probe(&engine, parent).updates, 1);

    probe_mut(&mut engine, parent).spawn_child = false;
    engine.tick_at(16, &mut noop).unwrap();
    assert_eq!(probe(&engine, child).updates, 1);
}

#[test]
fn test_spawn_fails_quietly_when_full() {
    let mut engine = engine();
    let parent = spawn(&mut engine, 0, 0);
    probe_mut(&mut engine, parent).spawn_child = true;

    // 8 entity slots: the parent plus 7 children, then spawning is refused
    for frame in 0..10 {
        engine.tick_at(frame * 16, &mut noop).unwrap();
    }
    assert_eq!(engine.world().entities.live_len(), 8);
    assert_eq!(probe(&engine, parent).last_child, None);
}

#[test]
fn test_hook_runs_after_update() {
    let mut engine = engine();
    let a = spawn(&mut engine, 0, 0);

    let mut updates_seen = 0;
    let mut hook = |world: &mut World<Probe>| {
        updates_seen = world.entities.get(a).map_or(0, |p| p.updates);
    };
    engine.tick_at(0, &mut hook).unwrap();
    assert_eq!(updates_seen, 1);
}

#[test]
fn test_scroll_outside_map_is_an_error() {
    let mut engine = engine();
    let a = spawn(&mut engine, 0, 0);
    engine.world_mut().scroll.x = 1.0;

    let err = engine.tick_at(0, &mut noop).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Render(RenderError::ViewportOutOfBounds { .. })
    ));
    // the frame stopped before update
    assert_eq!(probe(&engine, a).updates, 0);
    assert_eq!(engine.device().frames_presented(), 0);
}

#[test]
fn test_same_seed_same_numbers() {
    let mut first = engine();
    let mut second = engine();
    for _ in 0..5 {
        let a = first.world_mut().random_range(0.0, 100.0);
        let b = second.world_mut().random_range(0.0, 100.0);
        assert!((a - b).abs() < f32::EPSILON);
        assert!((0.0..100.0).contains(&a));
    }
}

#[test]
fn test_device_init_failure() {
    let config = config();
    let device = MemoryDevice::for_display(&config.display).failing_init("no panel");
    let result: Result<Engine<Probe, _>, _> =
        Engine::new(&config, resources(), TileMap::filled(4, 3, 0), device);
    assert!(matches!(
        result,
        Err(EngineError::Render(RenderError::Device(_)))
    ));
}

#[test]
fn test_tile_map_must_match_resources() {
    let config = config();
    let device = MemoryDevice::for_display(&config.display);
    let result: Result<Engine<Probe, _>, _> =
        Engine::new(&config, resources(), TileMap::filled(4, 3, 5), device);
    assert!(matches!(
        result,
        Err(EngineError::Render(RenderError::ResourceMismatch(_)))
    ));
}

struct Bulky {
    interest: Interest,
    _payload: [u8; 256],
}

impl Collidable for Bulky {
    fn interest(&self) -> &Interest {
        &self.interest
    }

    fn interest_mut(&mut self) -> &mut Interest {
        &mut self.interest
    }
}

impl Entity for Bulky {
    fn update(&mut self, _id: EntityId, _ctx: &mut UpdateContext<'_, Self>) -> Lifecycle {
        Lifecycle::Alive
    }

    fn release(&mut self, _sprites: &mut SpriteStore) {}
}

#[test]
fn test_entity_must_fit_slot() {
    let config = config();
    let device = MemoryDevice::for_display(&config.display);
    let result: Result<Engine<Bulky, _>, _> =
        Engine::new(&config, resources(), TileMap::filled(4, 3, 0), device);
    assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
}

#[test]
fn test_engine_from_toml() {
    let config = EngineConfig::from_toml_str(
        r"
        entity_capacity = 4
        sprite_capacity = 4
        random_seed = 9

        [display]
        width = 32
        height = 24
        dma_scanlines = 16
        tile_width = 8
        tile_height = 8
        sprite_width = 8
        sprite_height = 8
        layer_count = 2

        [clock]
        locked_dt_ms = 20
        ",
    )
    .unwrap();
    let device = MemoryDevice::for_display(&config.display);
    let mut engine: Engine<Probe, _> =
        Engine::new(&config, resources(), TileMap::filled(4, 3, 0), device).unwrap();

    let stats = engine.tick_at(0, &mut noop).unwrap();
    assert_eq!(stats.render.dma.writes, 2);
    assert_eq!(engine.device().last_transfer_sizes(), &[32 * 16 * 2, 32 * 8 * 2]);
    assert!((stats.dt - 0.02).abs() < 1e-6);
    assert_eq!(engine.world().entities.capacity(), 4);
}
