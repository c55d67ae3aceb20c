//! In-memory device.

use super::Device;
use crate::config::{DisplayConfig, BYTES_PER_PIXEL};
use crate::error::DeviceError;

/// Synchronous device that reassembles transfers into whole frames.
///
/// Every transfer completes inside `write_bytes`. Busy reporting can be
/// simulated with [`MemoryDevice::with_busy_every`].
#[derive(Debug, Clone)]
pub struct MemoryDevice {
    width: usize,
    frame_bytes: usize,
    assembling: Vec<u8>,
    transfers: Vec<usize>,
    last_frame: Vec<u8>,
    last_transfers: Vec<usize>,
    frames: u64,
    busy_every: u32,
    busy_polls: u32,
    init_error: Option<String>,
    initialized: bool,
}

impl MemoryDevice {
    /// Creates a device for a `width` x `height` RGB565 screen.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let frame_bytes = width * height * BYTES_PER_PIXEL;
        Self {
            width,
            frame_bytes,
            assembling: Vec::with_capacity(frame_bytes),
            transfers: Vec::new(),
            last_frame: Vec::with_capacity(frame_bytes),
            last_transfers: Vec::new(),
            frames: 0,
            busy_every: 0,
            busy_polls: 0,
            init_error: None,
            initialized: false,
        }
    }

    /// Creates a device matching a display configuration.
    #[must_use]
    pub fn for_display(config: &DisplayConfig) -> Self {
        Self::new(config.width, config.height)
    }

    /// Reports busy on every `n`th poll. Zero never reports busy.
    #[must_use]
    pub fn with_busy_every(mut self, n: u32) -> Self {
        self.busy_every = n;
        self
    }

    /// Makes `init` fail with `message`.
    #[must_use]
    pub fn failing_init(mut self, message: impl Into<String>) -> Self {
        self.init_error = Some(message.into());
        self
    }

    /// Returns true once `init` succeeded.
    #[inline]
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of complete frames received.
    #[inline]
    #[must_use]
    pub const fn frames_presented(&self) -> u64 {
        self.frames
    }

    /// Bytes of the last complete frame.
    #[inline]
    #[must_use]
    pub fn last_frame(&self) -> &[u8] {
        &self.last_frame
    }

    /// Transfer sizes that made up the last complete frame.
    #[inline]
    #[must_use]
    pub fn last_transfer_sizes(&self) -> &[usize] {
        &self.last_transfers
    }

    /// Reads one pixel of the last complete frame.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<u16> {
        if x >= self.width {
            return None;
        }
        let at = (y * self.width + x) * BYTES_PER_PIXEL;
        let bytes = self.last_frame.get(at..at + BYTES_PER_PIXEL)?;
        Some(u16::from_ne_bytes([bytes[0], bytes[1]]))
    }
}

impl Device for MemoryDevice {
    fn init(&mut self) -> Result<(), DeviceError> {
        if let Some(message) = &self.init_error {
            return Err(DeviceError::Init(message.clone()));
        }
        self.initialized = true;
        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) {
        self.assembling.extend_from_slice(data);
        self.transfers.push(data.len());

        if self.assembling.len() >= self.frame_bytes {
            std::mem::swap(&mut self.last_frame, &mut self.assembling);
            std::mem::swap(&mut self.last_transfers, &mut self.transfers);
            self.assembling.clear();
            self.transfers.clear();
            self.frames += 1;
        }
    }

    fn is_busy(&mut self) -> bool {
        if self.busy_every == 0 {
            return false;
        }
        self.busy_polls += 1;
        self.busy_polls % self.busy_every == 0
    }

    fn wait_for_completion(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembles_frames_from_transfers() {
        let mut device = MemoryDevice::new(2, 2);
        device.write_bytes(&[1, 0, 2, 0]);
        assert_eq!(device.frames_presented(), 0);
        device.write_bytes(&[3, 0, 4, 0]);
        assert_eq!(device.frames_presented(), 1);
        assert_eq!(device.last_transfer_sizes(), &[4, 4]);
        assert_eq!(device.pixel(1, 1), Some(u16::from_ne_bytes([4, 0])));
        assert_eq!(device.pixel(2, 0), None);
    }

    #[test]
    fn test_init_failure() {
        let mut device = MemoryDevice::new(1, 1).failing_init("no panel");
        assert_eq!(device.init(), Err(DeviceError::Init("no panel".into())));
        assert!(!device.is_initialized());
    }
}
