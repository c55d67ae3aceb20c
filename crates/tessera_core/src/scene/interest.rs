//! # Collision Interest
//!
//! Every entity declares what it *is* (`bits`) and what it *cares about*
//! (`mask`). Entity A is told about a collision with B only when
//! `A.mask & B.bits != 0`, so the relation is usually one-sided: a bullet
//! cares about ships, the ship does not care about the bullet.

use crate::memory::{SlotId, SlotPool};

/// Collision bit set.
pub type CollisionBits = u16;

/// Collision state carried by every entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Interest {
    /// What this entity is.
    pub bits: CollisionBits,
    /// What this entity wants to be told about.
    pub mask: CollisionBits,
    /// Entity this one overlapped with during the last rasterization.
    ///
    /// Written by the compositor, last write wins. The owning entity reads
    /// and clears it during its own update.
    pub collided_with: Option<SlotId>,
}

impl Interest {
    /// Creates an interest with no pending collision.
    #[inline]
    #[must_use]
    pub const fn new(bits: CollisionBits, mask: CollisionBits) -> Self {
        Self {
            bits,
            mask,
            collided_with: None,
        }
    }

    /// Returns true if this entity wants to hear about `other`.
    #[inline]
    #[must_use]
    pub const fn cares_about(&self, other: &Interest) -> bool {
        self.mask & other.bits != 0
    }

    /// Takes the pending collision, leaving none.
    #[inline]
    pub fn take_collision(&mut self) -> Option<SlotId> {
        self.collided_with.take()
    }
}

/// Anything the compositor can report collisions to.
pub trait Collidable {
    /// Returns the collision interest.
    fn interest(&self) -> &Interest;

    /// Returns the collision interest mutably.
    fn interest_mut(&mut self) -> &mut Interest;
}

/// Records an opaque-pixel overlap between the owners `a` and `b`.
///
/// Each side is updated independently according to its own mask. An entity
/// never collides with itself, so two sprites of the same owner touching is
/// not an event. Owners that are no longer stored are ignored.
pub fn record_overlap<E: Collidable>(entities: &mut SlotPool<E>, a: SlotId, b: SlotId) {
    if a == b {
        return;
    }
    let (Some(ea), Some(eb)) = (entities.get(a), entities.get(b)) else {
        return;
    };
    let ia = *ea.interest();
    let ib = *eb.interest();

    if ia.cares_about(&ib) {
        if let Some(e) = entities.get_mut(a) {
            e.interest_mut().collided_with = Some(b);
        }
    }
    if ib.cares_about(&ia) {
        if let Some(e) = entities.get_mut(b) {
            e.interest_mut().collided_with = Some(a);
        }
    }
}
