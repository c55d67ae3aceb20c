//! # Collision Map
//!
//! One cell per screen pixel holding the dense index of the topmost opaque
//! sprite drawn there this frame.

use tessera_core::SpriteId;

use crate::error::{alloc_filled, RenderResult};

/// Cell value meaning no sprite.
pub const NO_SPRITE: u16 = u16::MAX;

/// Per-pixel sprite ownership, rebuilt every frame.
pub struct CollisionMap {
    width: usize,
    height: usize,
    cells: Box<[u16]>,
}

impl CollisionMap {
    /// Allocates a map for a `width` x `height` screen.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RenderError::OutOfMemory`] if the cells cannot be
    /// reserved.
    pub fn new(width: usize, height: usize) -> RenderResult<Self> {
        Ok(Self {
            width,
            height,
            cells: alloc_filled("collision map", width * height, NO_SPRITE)?,
        })
    }

    /// Marks every cell empty.
    #[inline]
    pub fn clear(&mut self) {
        self.cells.fill(NO_SPRITE);
    }

    /// Returns the sprite drawn at a pixel, if any.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<SpriteId> {
        if x >= self.width || y >= self.height {
            return None;
        }
        match self.cells[y * self.width + x] {
            NO_SPRITE => None,
            dense => Some(SpriteId::new(u32::from(dense))),
        }
    }

    /// Returns one screen row of cells.
    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> &[u16] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    #[inline]
    pub(crate) fn row_mut(&mut self, y: usize) -> &mut [u16] {
        &mut self.cells[y * self.width..(y + 1) * self.width]
    }

    /// Returns the bytes held by the map.
    #[must_use]
    pub fn footprint_bytes(&self) -> usize {
        std::mem::size_of_val(&*self.cells)
    }
}

impl std::fmt::Debug for CollisionMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionMap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
