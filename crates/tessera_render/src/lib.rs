//! # TESSERA Render
//!
//! Scanline compositor for small SPI displays.
//!
//! ## Pipeline
//!
//! ```text
//! TileMap ─┐
//!          ├─► Compositor ─► DmaBuffers ─► Device
//! Sprites ─┘        │
//!                   └─► CollisionMap ─► Entity interest
//! ```
//!
//! Pixels are produced one scanline at a time into a small double buffer
//! that streams to the [`Device`] while the next batch is drawn. Collisions
//! fall out of the same pass: every opaque sprite pixel claims its cell in
//! the [`CollisionMap`], and claiming a cell already held by a same-layer
//! sprite reports the overlap to both owners.
//!
//! ## Memory
//!
//! Everything is reserved in [`Compositor::new`]. Rendering a frame does
//! not allocate.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod collision;
pub mod compositor;
pub mod config;
pub mod device;
pub mod dma;
pub mod error;
pub mod resources;
pub mod tile_map;

pub use collision::{CollisionMap, NO_SPRITE};
pub use compositor::{Compositor, FrameReport, Scene, Viewport};
pub use config::{DisplayConfig, BYTES_PER_PIXEL};
pub use device::{Device, MemoryDevice, PresentedFrame, ThreadedDevice};
pub use dma::{DmaBuffers, DmaStats};
pub use error::{DeviceError, RenderError, RenderResult};
pub use resources::{rgb565, ImageTable, Palette, Resources, PALETTE_LEN};
pub use tile_map::{TileFlags, TileId, TileMap};
