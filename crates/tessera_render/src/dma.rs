//! # DMA Double Buffer
//!
//! Two scanline buffers: the compositor fills one while the device is still
//! sending the other.
//!
//! ## Architecture
//!
//! ```text
//!              ┌──────────────────────────────┐
//!              │          DmaBuffers          │
//!              │                              │
//!              │  ┌──────────┐  ┌──────────┐  │
//!              │  │ Buffer A │  │ Buffer B │  │
//!              │  └────┬─────┘  └────┬─────┘  │
//!              │       └──────┬──────┘        │
//!              │        current (0/1)         │
//!              └──────────────┬───────────────┘
//!                             │ submit: write_bytes, then swap
//!                             ▼
//!                      ┌─────────────┐
//!                      │   Device    │
//!                      └─────────────┘
//! ```
//!
//! The device may still be reading the previous buffer when
//! [`Device::write_bytes`] is called again. Because the compositor always
//! writes into the *other* buffer, the two never overlap: a transfer in
//! flight only ever touches the buffer that was submitted last.

use crate::device::Device;
use crate::error::{alloc_filled, RenderResult};

/// Transfer counters for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DmaStats {
    /// Transfers started.
    pub writes: u32,
    /// Transfers that found the device still busy with the previous one.
    pub busy: u32,
    /// Bytes handed to the device.
    pub bytes: usize,
}

impl DmaStats {
    /// Percentage of transfers that had to wait on the device.
    #[must_use]
    pub fn busy_percent(&self) -> u32 {
        if self.writes == 0 {
            0
        } else {
            self.busy * 100 / self.writes
        }
    }

    /// Adds another frame's counters.
    pub fn accumulate(&mut self, other: &Self) {
        self.writes += other.writes;
        self.busy += other.busy;
        self.bytes += other.bytes;
    }
}

/// Double-buffered scanline memory.
pub struct DmaBuffers {
    /// The two scanline buffers.
    buffers: [Box<[u16]>; 2],
    /// Index of the buffer being filled. The other one may be in flight.
    current: usize,
    /// Pixels per scanline.
    width: usize,
    /// Scanlines per buffer.
    scanlines: usize,
    /// Counters since the last reset.
    stats: DmaStats,
}

impl DmaBuffers {
    /// Allocates two buffers of `scanlines` rows of `width` pixels.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RenderError::OutOfMemory`] if either buffer cannot be
    /// reserved.
    pub fn new(width: usize, scanlines: usize) -> RenderResult<Self> {
        let len = width * scanlines;
        Ok(Self {
            buffers: [
                alloc_filled("dma buffer", len, 0)?,
                alloc_filled("dma buffer", len, 0)?,
            ],
            current: 0,
            width,
            scanlines,
            stats: DmaStats::default(),
        })
    }

    /// Scanlines per buffer.
    #[inline]
    #[must_use]
    pub const fn scanlines(&self) -> usize {
        self.scanlines
    }

    /// Index (0 or 1) of the buffer being filled.
    #[inline]
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    /// Returns the buffer being filled.
    #[inline]
    #[must_use]
    pub fn current(&self) -> &[u16] {
        &self.buffers[self.current]
    }

    /// Returns one scanline of the buffer being filled.
    ///
    /// # Panics
    ///
    /// Panics if `row >= scanlines`.
    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [u16] {
        let start = row * self.width;
        &mut self.buffers[self.current][start..start + self.width]
    }

    /// Sends the first `rows` scanlines of the current buffer and swaps.
    ///
    /// Checks whether the device is still busy before starting, so the
    /// stats show how often rendering outpaces the transfer.
    pub fn submit<D: Device + ?Sized>(&mut self, device: &mut D, rows: usize) {
        let rows = rows.min(self.scanlines);
        self.stats.writes += 1;
        if device.is_busy() {
            self.stats.busy += 1;
        }

        let pixels = &self.buffers[self.current][..rows * self.width];
        let bytes: &[u8] = bytemuck::cast_slice(pixels);
        device.write_bytes(bytes);
        self.stats.bytes += bytes.len();

        self.current ^= 1;
    }

    /// Returns the counters since the last reset.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> DmaStats {
        self.stats
    }

    /// Zeroes the counters.
    #[inline]
    pub fn reset_stats(&mut self) {
        self.stats = DmaStats::default();
    }

    /// Returns the bytes held by both buffers.
    #[must_use]
    pub fn footprint_bytes(&self) -> usize {
        self.buffers.iter().map(|b| std::mem::size_of_val(&**b)).sum()
    }
}

impl std::fmt::Debug for DmaBuffers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DmaBuffers")
            .field("current", &self.current)
            .field("width", &self.width)
            .field("scanlines", &self.scanlines)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
