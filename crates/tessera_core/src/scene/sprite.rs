//! # Sprites
//!
//! A sprite is one fixed-size image placed on screen. Sprites are owned by
//! entities: the entity allocates them when it is created and releases them
//! when it dies. The compositor only ever reads them.

use crate::memory::{SlotId, SlotPool};

/// Id of an entity slot.
pub type EntityId = SlotId;

/// Id of a sprite slot. Its index is the dense index used by the collision map.
pub type SpriteId = SlotId;

/// Index into the sprite image table.
pub type ImageId = u16;

/// Independent horizontal and vertical mirroring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Flip {
    /// Mirror left to right.
    pub horizontal: bool,
    /// Mirror top to bottom.
    pub vertical: bool,
}

impl Flip {
    /// No mirroring.
    pub const NONE: Self = Self::new(false, false);
    /// Mirror left to right.
    pub const HORIZONTAL: Self = Self::new(true, false);
    /// Mirror top to bottom.
    pub const VERTICAL: Self = Self::new(false, true);
    /// Mirror both ways.
    pub const BOTH: Self = Self::new(true, true);

    /// Creates a flip setting.
    #[inline]
    #[must_use]
    pub const fn new(horizontal: bool, vertical: bool) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Decodes packed flags: bit 0 horizontal, bit 1 vertical.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self::new(bits & 0b01 != 0, bits & 0b10 != 0)
    }
}

/// A sprite record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sprite {
    /// Entity that owns this sprite.
    pub owner: EntityId,
    /// Image to draw. `None` hides the sprite and keeps it out of collisions.
    pub image: Option<ImageId>,
    /// Screen x of the left edge.
    pub x: i16,
    /// Screen y of the top edge.
    pub y: i16,
    /// Draw order and collision group, lower layers are drawn first.
    pub layer: u8,
    /// Mirroring.
    pub flip: Flip,
}

impl Sprite {
    /// Creates a hidden sprite at the origin on layer 0.
    #[inline]
    #[must_use]
    pub const fn new(owner: EntityId) -> Self {
        Self {
            owner,
            image: None,
            x: 0,
            y: 0,
            layer: 0,
            flip: Flip::NONE,
        }
    }

    /// Sets the image.
    #[inline]
    #[must_use]
    pub const fn with_image(mut self, image: ImageId) -> Self {
        self.image = Some(image);
        self
    }

    /// Sets the layer.
    #[inline]
    #[must_use]
    pub const fn on_layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }

    /// Sets the mirroring.
    #[inline]
    #[must_use]
    pub const fn flipped(mut self, flip: Flip) -> Self {
        self.flip = flip;
        self
    }

    /// Sets the screen position.
    #[inline]
    #[must_use]
    pub const fn at(mut self, x: i16, y: i16) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Moves the sprite.
    #[inline]
    pub fn set_position(&mut self, x: i16, y: i16) {
        self.x = x;
        self.y = y;
    }
}

/// The pool of all sprites.
#[derive(Debug)]
pub struct SpriteStore {
    pool: SlotPool<Sprite>,
}

impl SpriteStore {
    /// Creates a store with room for `capacity` sprites.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            pool: SlotPool::new("sprites", capacity),
        }
    }

    /// Allocates `sprite`. Returns `None` when the store is full.
    #[inline]
    pub fn alloc(&mut self, sprite: Sprite) -> Option<SpriteId> {
        self.pool.alloc(sprite)
    }

    /// Hides a sprite and queues it for removal.
    ///
    /// Hiding first keeps a released sprite out of any rendering that happens
    /// before the commit.
    pub fn release(&mut self, id: SpriteId) {
        if let Some(sprite) = self.pool.get_mut(id) {
            sprite.image = None;
        }
        self.pool.free(id);
    }

    /// Reclaims released sprites. Returns the number reclaimed.
    #[inline]
    pub fn apply_free(&mut self) -> usize {
        self.pool.apply_free()
    }

    /// Gets a sprite.
    #[inline]
    #[must_use]
    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        self.pool.get(id)
    }

    /// Gets a sprite mutably.
    #[inline]
    pub fn get_mut(&mut self, id: SpriteId) -> Option<&mut Sprite> {
        self.pool.get_mut(id)
    }

    /// Returns the number of live sprites.
    #[inline]
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.pool.live_len()
    }

    /// Returns the sprite capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Returns the underlying pool.
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &SlotPool<Sprite> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_bits() {
        assert_eq!(Flip::from_bits(0), Flip::NONE);
        assert_eq!(Flip::from_bits(1), Flip::HORIZONTAL);
        assert_eq!(Flip::from_bits(2), Flip::VERTICAL);
        assert_eq!(Flip::from_bits(3), Flip::BOTH);
    }

    #[test]
    fn test_release_hides_before_commit() {
        let owner = SlotId::new(0);
        let mut store = SpriteStore::new(2);
        let id = store
            .alloc(Sprite::new(owner).with_image(4).at(10, 20))
            .unwrap();

        store.release(id);
        assert_eq!(store.get(id).unwrap().image, None);
        assert_eq!(store.live_len(), 1);

        assert_eq!(store.apply_free(), 1);
        assert!(store.get(id).is_none());
        assert_eq!(store.live_len(), 0);
    }

    #[test]
    fn test_builder() {
        let sprite = Sprite::new(SlotId::new(1))
            .with_image(2)
            .on_layer(1)
            .flipped(Flip::HORIZONTAL)
            .at(-5, 7);
        assert_eq!(sprite.image, Some(2));
        assert_eq!(sprite.layer, 1);
        assert!(sprite.flip.horizontal);
        assert_eq!((sprite.x, sprite.y), (-5, 7));
    }
}
