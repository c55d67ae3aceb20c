//! # Display Devices
//!
//! The compositor only talks to hardware through [`Device`]. Two host
//! implementations ship with the crate:
//!
//! - [`MemoryDevice`]: synchronous, assembles frames in memory for tests
//!   and headless runs
//! - [`ThreadedDevice`]: hands every transfer to a worker thread, the way
//!   a real DMA engine overlaps with rendering

mod memory;
mod threaded;

pub use memory::MemoryDevice;
pub use threaded::{PresentedFrame, ThreadedDevice};

use crate::error::DeviceError;

/// A display that accepts pixel bytes.
///
/// Transfers are asynchronous from the compositor's point of view:
/// `write_bytes` may return before the data reaches the panel. An
/// implementation must either copy `data` or finish with it before
/// returning, because the caller reuses the memory two submissions later.
pub trait Device {
    /// Brings the device up. Called once before the first frame.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Init`] if the device is unavailable.
    fn init(&mut self) -> Result<(), DeviceError>;

    /// Starts a transfer. Blocks while a previous transfer is in flight.
    fn write_bytes(&mut self, data: &[u8]);

    /// Returns true while a transfer is in flight.
    fn is_busy(&mut self) -> bool;

    /// Blocks until no transfer is in flight.
    fn wait_for_completion(&mut self);
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn init(&mut self) -> Result<(), DeviceError> {
        (**self).init()
    }

    fn write_bytes(&mut self, data: &[u8]) {
        (**self).write_bytes(data);
    }

    fn is_busy(&mut self) -> bool {
        (**self).is_busy()
    }

    fn wait_for_completion(&mut self) {
        (**self).wait_for_completion();
    }
}
