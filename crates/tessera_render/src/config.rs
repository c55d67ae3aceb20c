//! # Display Configuration
//!
//! Screen size, DMA batch size and the fixed tile and sprite geometry.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};

/// Bytes per output pixel (RGB565).
pub const BYTES_PER_PIXEL: usize = 2;

/// Display and geometry settings.
///
/// Tile and sprite dimensions must be powers of two: the compositor splits
/// scroll positions into tile index and sub-tile fraction with shifts and
/// masks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Screen width in pixels.
    pub width: usize,
    /// Screen height in pixels.
    pub height: usize,
    /// Scanlines rendered per DMA transfer.
    pub dma_scanlines: usize,
    /// Tile width in pixels.
    pub tile_width: usize,
    /// Tile height in pixels.
    pub tile_height: usize,
    /// Sprite width in pixels.
    pub sprite_width: usize,
    /// Sprite height in pixels.
    pub sprite_height: usize,
    /// Number of sprite layers.
    pub layer_count: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 240,
            height: 320,
            // 8 lines: throughput stops improving beyond this on SPI panels
            dma_scanlines: 8,
            tile_width: 16,
            tile_height: 16,
            sprite_width: 16,
            sprite_height: 16,
            layer_count: 3,
        }
    }
}

impl DisplayConfig {
    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> RenderResult<()> {
        let invalid = |msg: String| Err(RenderError::InvalidConfig(msg));

        if self.width == 0 || self.height == 0 {
            return invalid(format!("screen {}x{} is empty", self.width, self.height));
        }
        if self.width > i16::MAX as usize || self.height > i16::MAX as usize {
            return invalid(format!(
                "screen {}x{} exceeds sprite coordinate range",
                self.width, self.height
            ));
        }
        if self.dma_scanlines == 0 || self.dma_scanlines > self.height {
            return invalid(format!(
                "dma_scanlines {} must be within 1..={}",
                self.dma_scanlines, self.height
            ));
        }
        for (name, value) in [
            ("tile_width", self.tile_width),
            ("tile_height", self.tile_height),
            ("sprite_width", self.sprite_width),
            ("sprite_height", self.sprite_height),
        ] {
            if !value.is_power_of_two() {
                return invalid(format!("{name} {value} is not a power of two"));
            }
        }
        if self.sprite_width > i16::MAX as usize || self.sprite_height > i16::MAX as usize {
            return invalid("sprite dimensions exceed coordinate range".to_owned());
        }
        if self.layer_count == 0 || self.layer_count > usize::from(u8::MAX) + 1 {
            return invalid(format!("layer_count {} must be within 1..=256", self.layer_count));
        }
        Ok(())
    }

    /// Returns the bytes sent to the device per frame.
    #[inline]
    #[must_use]
    pub const fn frame_bytes(&self) -> usize {
        self.width * self.height * BYTES_PER_PIXEL
    }

    /// Returns the number of DMA transfers per frame.
    #[inline]
    #[must_use]
    pub const fn batches_per_frame(&self) -> usize {
        self.height.div_ceil(self.dma_scanlines)
    }

    /// Returns the pixel count of one DMA buffer.
    #[inline]
    #[must_use]
    pub const fn dma_buffer_pixels(&self) -> usize {
        self.width * self.dma_scanlines
    }
}
