//! # Scene Records
//!
//! Sprites and the collision interest every entity carries. Concrete
//! entities live in the application; this crate only knows them through
//! [`Collidable`].

mod interest;
mod sprite;

pub use interest::{record_overlap, Collidable, CollisionBits, Interest};
pub use sprite::{EntityId, Flip, ImageId, Sprite, SpriteId, SpriteStore};
