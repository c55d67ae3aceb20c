//! # TESSERA Core
//!
//! Fixed-capacity storage for a sprite/tile engine running on small
//! displays:
//! - Slot pools with O(1) alloc and deferred, two-phase free
//! - Sprite records and the sprite store
//! - Collision interest shared by every entity
//!
//! ## Architecture Rules
//!
//! 1. **No heap allocations after startup** - every pool is sized once
//! 2. **Ids, not references** - slots are addressed by [`SlotId`]
//! 3. **Removal is a commit** - `free` queues, `apply_free` reclaims
//!
//! ## Example
//!
//! ```rust
//! use tessera_core::{Sprite, SpriteStore, SlotId};
//!
//! let mut sprites = SpriteStore::new(255);
//! let owner = SlotId::new(0);
//! let id = sprites.alloc(Sprite::new(owner).with_image(1).at(8, 8)).unwrap();
//! sprites.release(id);
//! sprites.apply_free();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod memory;
pub mod scene;

pub use memory::{SlotId, SlotPool};
pub use scene::{
    record_overlap, Collidable, CollisionBits, EntityId, Flip, ImageId, Interest, Sprite,
    SpriteId, SpriteStore,
};
