//! # TESSERA
//!
//! Sprite and tile engine for small embedded displays.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         Engine                           │
//! │  ┌──────────────────────────────┐  ┌─────────────────┐   │
//! │  │ World                        │  │ Compositor      │   │
//! │  │  EntityStore   SpriteStore   │─►│  CollisionMap   │   │
//! │  │  TileMap  Scroll  Clock  Rng │  │  DmaBuffers     │──►│── Device
//! │  └──────────────────────────────┘  └─────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The application supplies one entity enum, the resources and the tile
//! map, then calls [`Engine::tick`] once per frame.
//!
//! ## Example
//!
//! ```rust,ignore
//! let config = EngineConfig::load("tessera.toml")?;
//! let mut engine: Engine<Actor, _> =
//!     Engine::new(&config, resources, tile_map, MemoryDevice::for_display(&config.display))?;
//! engine.world_mut().spawn(|id, sprites| Actor::hero(id, sprites));
//! loop {
//!     engine.tick(&mut app)?;
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod clock;
pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod stats;
pub mod world;

pub use clock::{Clock, Millis, MAX_DT};
pub use config::{ClockConfig, EngineConfig};
pub use engine::{Application, Engine};
pub use entity::{fits_slot, Entity, EntityStore, Lifecycle, UpdateContext};
pub use error::{EngineError, EngineResult};
pub use stats::{FrameStats, FrameStatsAccumulator};
pub use world::{Scroll, World};

/// Re-export of the storage crate.
pub use tessera_core as core;
/// Re-export of the compositor crate.
pub use tessera_render as render;
