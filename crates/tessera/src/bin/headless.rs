//! # TESSERA Headless Demo
//!
//! A vertical scroller with no window: a hero sweeps along the bottom of
//! the screen firing bullets at falling enemies, and frames go to a host
//! device instead of a panel.
//!
//! ## Usage
//!
//! ```bash
//! tessera-headless --frames 600
//! tessera-headless --config tessera.toml --threaded --transfer-us 400
//! RUST_LOG=debug tessera-headless
//! ```

use std::time::Duration;

use tessera::core::{
    Collidable, CollisionBits, EntityId, ImageId, Interest, Sprite, SpriteId, SpriteStore,
};
use tessera::render::{
    rgb565, Device, ImageTable, MemoryDevice, Palette, Resources, ThreadedDevice, TileMap,
};
use tessera::{
    fits_slot, Application, Engine, EngineConfig, EngineResult, Entity, FrameStatsAccumulator,
    Lifecycle, UpdateContext, World,
};

const HERO: CollisionBits = 1;
const ENEMY: CollisionBits = 2;
const BULLET: CollisionBits = 4;

const IMG_HERO: ImageId = 0;
const IMG_ENEMY: ImageId = 1;
const IMG_BULLET: ImageId = 2;

/// Seconds between hero shots.
const FIRE_INTERVAL: f32 = 0.25;
/// Seconds between enemy waves.
const SPAWN_INTERVAL: f32 = 0.6;
/// Background scroll speed in pixels per second.
const SCROLL_SPEED: f32 = 16.0;

/// Tile map height in screens.
const MAP_SCREENS: usize = 6;

/// Position, velocity and the one sprite every actor draws with.
struct Body {
    interest: Interest,
    sprite: SpriteId,
    x: f32,
    y: f32,
    dx: f32,
    dy: f32,
}

impl Body {
    fn step(&mut self, dt: f32) {
        self.x += self.dx * dt;
        self.y += self.dy * dt;
    }
}

enum Actor {
    Hero { body: Body, cooldown: f32 },
    Enemy { body: Body, health: u8 },
    Bullet { body: Body },
}

const _: () = assert!(fits_slot::<Actor>(128));

impl Actor {
    fn body(&self) -> &Body {
        match self {
            Self::Hero { body, .. } | Self::Enemy { body, .. } | Self::Bullet { body } => body,
        }
    }

    fn body_mut(&mut self) -> &mut Body {
        match self {
            Self::Hero { body, .. } | Self::Enemy { body, .. } | Self::Bullet { body } => body,
        }
    }

    fn make_body(
        id: EntityId,
        sprites: &mut SpriteStore,
        image: ImageId,
        interest: Interest,
        (x, y): (f32, f32),
    ) -> Option<Body> {
        let sprite = sprites.alloc(Sprite::new(id).with_image(image).on_layer(1))?;
        Some(Body {
            interest,
            sprite,
            x,
            y,
            dx: 0.0,
            dy: 0.0,
        })
    }

    fn hero(id: EntityId, sprites: &mut SpriteStore, x: f32, y: f32) -> Option<Self> {
        let mut body = Self::make_body(id, sprites, IMG_HERO, Interest::new(HERO, ENEMY), (x, y))?;
        body.dx = 60.0;
        Some(Self::Hero {
            body,
            cooldown: FIRE_INTERVAL,
        })
    }

    fn enemy(id: EntityId, sprites: &mut SpriteStore, x: f32, speed: f32) -> Option<Self> {
        let interest = Interest::new(ENEMY, BULLET | HERO);
        let mut body = Self::make_body(id, sprites, IMG_ENEMY, interest, (x, -16.0))?;
        body.dy = speed;
        Some(Self::Enemy { body, health: 2 })
    }

    fn bullet(id: EntityId, sprites: &mut SpriteStore, x: f32, y: f32) -> Option<Self> {
        let interest = Interest::new(BULLET, ENEMY);
        let mut body = Self::make_body(id, sprites, IMG_BULLET, interest, (x, y))?;
        body.dy = -180.0;
        Some(Self::Bullet { body })
    }
}

impl Collidable for Actor {
    fn interest(&self) -> &Interest {
        &self.body().interest
    }

    fn interest_mut(&mut self) -> &mut Interest {
        &mut self.body_mut().interest
    }
}

impl Entity for Actor {
    fn pre_render(&mut self, sprites: &mut SpriteStore) {
        let body = self.body();
        if let Some(sprite) = sprites.get_mut(body.sprite) {
            sprite.set_position(body.x as i16, body.y as i16);
        }
    }

    fn update(&mut self, id: EntityId, ctx: &mut UpdateContext<'_, Self>) -> Lifecycle {
        let dt = ctx.dt();
        let right_edge = (ctx.display.width - ctx.display.sprite_width) as f32;
        let bottom = ctx.display.height as f32;

        match self {
            Self::Hero { body, cooldown } => {
                if let Some(other) = body.interest.take_collision() {
                    tracing::debug!(hero = %id, enemy = %other, "hero hit");
                }
                body.step(dt);
                if body.x < 0.0 || body.x > right_edge {
                    body.dx = -body.dx;
                    body.x = body.x.clamp(0.0, right_edge);
                }
                *cooldown -= dt;
                if *cooldown <= 0.0 {
                    *cooldown = FIRE_INTERVAL;
                    let (x, y) = (body.x, body.y - 12.0);
                    // out of slots: the shot is dropped
                    ctx.spawn(|id, sprites| Self::bullet(id, sprites, x, y));
                }
                Lifecycle::Alive
            }
            Self::Enemy { body, health } => {
                if body.interest.take_collision().is_some() {
                    *health = health.saturating_sub(1);
                    if *health == 0 {
                        tracing::debug!(enemy = %id, "enemy destroyed");
                        return Lifecycle::Dead;
                    }
                }
                body.step(dt);
                if body.y >= bottom {
                    Lifecycle::Dead
                } else {
                    Lifecycle::Alive
                }
            }
            Self::Bullet { body } => {
                if body.interest.take_collision().is_some() {
                    return Lifecycle::Dead;
                }
                body.step(dt);
                if body.y <= -16.0 {
                    Lifecycle::Dead
                } else {
                    Lifecycle::Alive
                }
            }
        }
    }

    fn release(&mut self, sprites: &mut SpriteStore) {
        sprites.release(self.body().sprite);
    }
}

/// Scrolls the background and sends in enemies.
struct Demo {
    spawn_timer: f32,
}

impl Application<Actor> for Demo {
    fn on_frame_completed(&mut self, world: &mut World<Actor>) {
        let dt = world.clock().dt();
        world.scroll.advance(dt);
        if world.scroll.y <= 0.0 {
            world.scroll.y = world.max_scroll().1;
        }
        world.clamp_scroll();

        self.spawn_timer -= dt;
        if self.spawn_timer <= 0.0 {
            self.spawn_timer = SPAWN_INTERVAL;
            let right_edge = (world.display().width - world.display().sprite_width) as f32;
            let x = world.random_range(0.0, right_edge);
            let speed = world.random_range(30.0, 90.0);
            world.spawn(|id, sprites| Actor::enemy(id, sprites, x, speed));
        }
    }
}

fn resources(config: &EngineConfig) -> Resources {
    let display = &config.display;
    let (tw, th) = (display.tile_width, display.tile_height);
    let (sw, sh) = (display.sprite_width, display.sprite_height);

    Resources {
        tile_palette: Palette::from_fn(|ix| {
            let shade = ix.saturating_mul(16);
            rgb565(shade / 4, shade / 3, shade).swap_bytes()
        }),
        sprite_palette: Palette::from_rgb(
            &[[0, 0, 0], [80, 220, 255], [255, 70, 70], [255, 255, 140]],
            true,
        ),
        tiles: ImageTable::from_fn(tw, th, 4, |tile, x, y| {
            let star = (x * 7 + y * 13 + tile * 5) % 37 == 0;
            if star {
                15
            } else {
                (1 + tile + (x ^ y) % 2) as u8
            }
        }),
        sprites: ImageTable::from_fn(sw, sh, 3, |image, x, y| {
            let (cx, cy) = (x as i32 - sw as i32 / 2, y as i32 - sh as i32 / 2);
            match image {
                // arrow pointing up
                0 => u8::from(cx.abs() * 2 <= y as i32),
                // disc
                1 => u8::from(cx * cx + cy * cy < (sw * sw / 5) as i32) * 2,
                // narrow bolt
                _ => u8::from(cx.abs() <= 1 && cy.abs() <= 3) * 3,
            }
        }),
    }
}

fn tile_map(config: &EngineConfig) -> TileMap {
    let display = &config.display;
    let columns = display.width.div_ceil(display.tile_width);
    let rows = (display.height * MAP_SCREENS).div_ceil(display.tile_height);
    let mut map = TileMap::filled(columns, rows, 0);
    for row in 0..rows {
        for column in 0..columns {
            map.set(column, row, ((column * 7 + row * 13) % 4) as u16);
        }
    }
    map
}

fn run<D: Device>(config: &EngineConfig, device: D, frames: u64) -> EngineResult<(FrameStatsAccumulator, D)> {
    let mut engine: Engine<Actor, D> = Engine::new(config, resources(config), tile_map(config), device)?;

    let display = config.display.clone();
    let world = engine.world_mut();
    world.scroll.y = world.max_scroll().1;
    world.scroll.dy = -SCROLL_SPEED;
    let hero_y = (display.height - display.sprite_height * 2) as f32;
    world.spawn(|id, sprites| Actor::hero(id, sprites, 0.0, hero_y));

    let mut demo = Demo {
        spawn_timer: SPAWN_INTERVAL,
    };
    let mut acc = FrameStatsAccumulator::new();
    for _ in 0..frames {
        let stats = engine.tick(&mut demo)?;
        acc.record(&stats);
    }
    Ok((acc, engine.into_device()))
}

fn print_summary(acc: &FrameStatsAccumulator, presented: u64) {
    println!();
    println!("┌─ TESSERA HEADLESS ──────────────────────────────────────────────┐");
    println!("│ Frames:           {}", acc.frames_recorded);
    println!("│ Presented:        {presented}");
    println!("│ Average frame:    {:.3} ms ({:.1} FPS)", acc.avg_frame_ms(), acc.avg_fps());
    println!("│ Average render:   {:.3} ms", acc.avg_render_ms());
    println!(
        "│ Min / max frame:  {:.3} / {:.3} ms",
        acc.min_frame_us as f64 / 1000.0,
        acc.max_frame_us as f64 / 1000.0
    );
    println!("│ DMA writes:       {} ({}% busy)", acc.dma.writes, acc.dma.busy_percent());
    println!("│ Bytes sent:       {}", acc.dma.bytes);
    println!("│ Peak objs / sprs: {} / {}", acc.peak_entities, acc.peak_sprites);
    println!("└──────────────────────────────────────────────────────────────────┘");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut frames: u64 = 600;
    let mut config_path: Option<String> = None;
    let mut threaded = false;
    let mut transfer_us: u64 = 0;
    let mut seed: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--frames" | "-f" => {
                if i + 1 < args.len() {
                    frames = args[i + 1].parse().unwrap_or(600);
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--seed" | "-s" => {
                if i + 1 < args.len() {
                    seed = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--threaded" | "-t" => threaded = true,
            "--transfer-us" => {
                if i + 1 < args.len() {
                    transfer_us = args[i + 1].parse().unwrap_or(0);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("TESSERA headless demo");
                println!();
                println!("Usage: tessera-headless [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -f, --frames <N>         Frames to run (default: 600)");
                println!("  -c, --config <PATH>      Engine config TOML");
                println!("  -s, --seed <N>           Random seed override");
                println!("  -t, --threaded           Send scanlines on a worker thread");
                println!("      --transfer-us <US>   Simulated time per transfer (threaded)");
                println!("  -h, --help               Show this help");
                return;
            }
            other => tracing::warn!(arg = other, "ignoring unknown argument"),
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("{e}");
                std::process::exit(1);
            }
        },
        None => EngineConfig {
            clock: tessera::ClockConfig {
                locked_dt_ms: 33,
                ..Default::default()
            },
            ..Default::default()
        },
    };
    if let Some(seed) = seed {
        config.random_seed = seed;
    }

    tracing::info!(
        width = config.display.width,
        height = config.display.height,
        frames,
        threaded,
        "starting"
    );

    let result = if threaded {
        let device = ThreadedDevice::for_display(&config.display)
            .with_transfer_time(Duration::from_micros(transfer_us));
        let presented = device.presented();
        run(&config, device, frames).map(|(acc, _)| (acc, presented.frames()))
    } else {
        let device = MemoryDevice::for_display(&config.display);
        run(&config, device, frames).map(|(acc, device)| (acc, device.frames_presented()))
    };

    match result {
        Ok((acc, presented)) => print_summary(&acc, presented),
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    }
}
