//! # Image Resources
//!
//! Palettes and image tables shared by every frame.
//!
//! Images are 8-bit palette indices, row-major, all the same size within a
//! table. Sprite index 0 is transparent. Palettes hold the colour words
//! exactly as the display expects them on the wire: whatever byte order the
//! panel wants is baked in when the palette is built.

use crate::config::DisplayConfig;
use crate::error::{RenderError, RenderResult};

/// Entries per palette.
pub const PALETTE_LEN: usize = 256;

/// Packs 8-bit channels into RGB565.
#[inline]
#[must_use]
pub const fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

/// Index to colour lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Box<[u16; PALETTE_LEN]>,
}

impl Palette {
    /// Creates a palette from colour words.
    #[must_use]
    pub fn new(colors: [u16; PALETTE_LEN]) -> Self {
        Self {
            colors: Box::new(colors),
        }
    }

    /// Builds a palette by calling `f` for each index.
    #[must_use]
    pub fn from_fn(mut f: impl FnMut(u8) -> u16) -> Self {
        let mut colors = Box::new([0u16; PALETTE_LEN]);
        for (ix, color) in colors.iter_mut().enumerate() {
            *color = f(ix as u8);
        }
        Self { colors }
    }

    /// Builds a palette from RGB triples, byte-swapping every word for
    /// displays that expect big-endian pixels. Missing entries are black.
    #[must_use]
    pub fn from_rgb(rgb: &[[u8; 3]], swap_bytes: bool) -> Self {
        Self::from_fn(|ix| {
            let [r, g, b] = rgb.get(usize::from(ix)).copied().unwrap_or_default();
            let color = rgb565(r, g, b);
            if swap_bytes {
                color.swap_bytes()
            } else {
                color
            }
        })
    }

    /// Looks up one colour.
    #[inline(always)]
    #[must_use]
    pub fn color(&self, ix: u8) -> u16 {
        self.colors[usize::from(ix)]
    }

    /// Returns all colours.
    #[inline]
    #[must_use]
    pub fn colors(&self) -> &[u16; PALETTE_LEN] {
        &self.colors
    }
}

/// A table of equally sized palette-indexed images.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageTable {
    width: usize,
    height: usize,
    pixels: Box<[u8]>,
}

impl ImageTable {
    /// Creates a table from concatenated images.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ResourceMismatch`] if `pixels` is not a whole
    /// number of `width * height` images.
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> RenderResult<Self> {
        let image_len = width * height;
        if image_len == 0 || pixels.len() % image_len != 0 {
            return Err(RenderError::ResourceMismatch(format!(
                "{} bytes is not a whole number of {width}x{height} images",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels: pixels.into_boxed_slice(),
        })
    }

    /// Builds a table of `count` images, calling `f(image, x, y)` per pixel.
    #[must_use]
    pub fn from_fn(
        width: usize,
        height: usize,
        count: usize,
        mut f: impl FnMut(usize, usize, usize) -> u8,
    ) -> Self {
        let mut pixels = Vec::with_capacity(width * height * count);
        for image in 0..count {
            for y in 0..height {
                for x in 0..width {
                    pixels.push(f(image, x, y));
                }
            }
        }
        Self {
            width,
            height,
            pixels: pixels.into_boxed_slice(),
        }
    }

    /// Image width in pixels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of images.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len() / (self.width * self.height).max(1)
    }

    /// Returns true if the table holds no images.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Returns the pixels of one image.
    #[inline]
    #[must_use]
    pub fn image(&self, ix: usize) -> Option<&[u8]> {
        let len = self.width * self.height;
        self.pixels.get(ix * len..(ix + 1) * len)
    }
}

/// Everything the compositor draws with.
#[derive(Clone, Debug)]
pub struct Resources {
    /// Palette for background tiles.
    pub tile_palette: Palette,
    /// Palette for sprites. Index 0 is never drawn.
    pub sprite_palette: Palette,
    /// Tile images.
    pub tiles: ImageTable,
    /// Sprite images.
    pub sprites: ImageTable,
}

impl Resources {
    /// Checks image sizes against the display geometry.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ResourceMismatch`] on any size difference.
    pub fn validate(&self, config: &DisplayConfig) -> RenderResult<()> {
        let check = |what: &str, table: &ImageTable, w: usize, h: usize| {
            if table.width() == w && table.height() == h {
                Ok(())
            } else {
                Err(RenderError::ResourceMismatch(format!(
                    "{what} images are {}x{}, display expects {w}x{h}",
                    table.width(),
                    table.height()
                )))
            }
        };
        check("tile", &self.tiles, config.tile_width, config.tile_height)?;
        check("sprite", &self.sprites, config.sprite_width, config.sprite_height)
    }

    /// Returns the bytes held by palettes and images.
    #[must_use]
    pub fn footprint_bytes(&self) -> usize {
        2 * PALETTE_LEN * std::mem::size_of::<u16>() + self.tiles.pixels.len() + self.sprites.pixels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb565_packing() {
        assert_eq!(rgb565(0xFF, 0xFF, 0xFF), 0xFFFF);
        assert_eq!(rgb565(0xFF, 0, 0), 0xF800);
        assert_eq!(rgb565(0, 0xFF, 0), 0x07E0);
        assert_eq!(rgb565(0, 0, 0xFF), 0x001F);
    }

    #[test]
    fn test_palette_swaps_bytes() {
        let palette = Palette::from_rgb(&[[0, 0, 0], [0xFF, 0, 0]], true);
        assert_eq!(palette.color(1), 0x00F8);
        // past the supplied entries everything is black
        assert_eq!(palette.color(200), 0);
    }

    #[test]
    fn test_image_table_rejects_partial_image() {
        assert!(ImageTable::new(4, 4, vec![0; 20]).is_err());
        let table = ImageTable::new(4, 4, vec![0; 32]).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.image(1).is_some());
        assert!(table.image(2).is_none());
    }

    #[test]
    fn test_validate_catches_wrong_sprite_size() {
        let resources = Resources {
            tile_palette: Palette::from_fn(u16::from),
            sprite_palette: Palette::from_fn(u16::from),
            tiles: ImageTable::from_fn(16, 16, 1, |_, _, _| 0),
            sprites: ImageTable::from_fn(8, 8, 1, |_, _, _| 0),
        };
        let err = resources.validate(&DisplayConfig::default()).unwrap_err();
        assert!(err.to_string().contains("sprite"));
    }
}
