//! # Memory Management
//!
//! Fixed-capacity storage for everything that lives across frames.
//!
//! ## Design Philosophy
//!
//! All memory is reserved once at startup. During a frame:
//! - No heap allocations
//! - Removal is deferred to an explicit commit
//! - Slot ids stay valid while their instance lives

mod pool;

pub use pool::{SlotId, SlotPool};
