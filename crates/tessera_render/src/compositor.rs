//! # Scanline Compositor
//!
//! Draws the tile background and every visible sprite one scanline at a
//! time, and detects pixel-precise collisions as it goes.
//!
//! ## Per frame
//!
//! 1. Clear the collision map.
//! 2. Bucket the visible sprites by layer, once.
//! 3. For each scanline: background, then sprites lowest layer first.
//! 4. Every `dma_scanlines` rows, hand the filled buffer to the device and
//!    continue in the other one. A trailing partial batch is sent last.
//!
//! ## Collision map indices
//!
//! Cells hold the sprite's *dense* index: its position in the sprite pool's
//! backing array. That position never changes while the sprite lives. The
//! live list is compacted on every commit, so its positions are useless as
//! references.

use tessera_core::{record_overlap, Collidable, EntityId, Flip, ImageId, SlotPool, SpriteStore};

use crate::collision::{CollisionMap, NO_SPRITE};
use crate::config::DisplayConfig;
use crate::device::Device;
use crate::dma::{DmaBuffers, DmaStats};
use crate::error::{RenderError, RenderResult};
use crate::resources::{Palette, Resources};
use crate::tile_map::{TileFlags, TileMap};

/// Top-left corner of the screen in tile map pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewport {
    /// Horizontal scroll.
    pub x: i32,
    /// Vertical scroll.
    pub y: i32,
}

impl Viewport {
    /// Creates a viewport.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Everything a frame is drawn from.
pub struct Scene<'a, E> {
    /// Background grid.
    pub tile_map: &'a TileMap,
    /// Palettes and images.
    pub resources: &'a Resources,
    /// All sprites.
    pub sprites: &'a SpriteStore,
    /// Entities that receive collisions.
    pub entities: &'a mut SlotPool<E>,
}

/// What one frame cost.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// DMA counters for this frame.
    pub dma: DmaStats,
    /// Sprites that passed the visibility filter.
    pub visible_sprites: usize,
}

#[derive(Clone, Copy, Debug)]
struct VisibleSprite {
    dense: u16,
    owner: EntityId,
    image: ImageId,
    x: i16,
    y: i16,
    flip: Flip,
}

/// Scanline renderer owning the collision map and the DMA buffers.
pub struct Compositor {
    config: DisplayConfig,
    sprite_capacity: usize,
    collision: CollisionMap,
    dma: DmaBuffers,
    layers: Vec<Vec<VisibleSprite>>,
}

impl Compositor {
    /// Creates a compositor for `sprite_capacity` sprites.
    ///
    /// All per-frame memory is reserved here.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidConfig`] for a bad configuration or a
    /// sprite capacity that does not fit a collision cell, and
    /// [`RenderError::OutOfMemory`] if a buffer cannot be reserved.
    pub fn new(config: DisplayConfig, sprite_capacity: usize) -> RenderResult<Self> {
        config.validate()?;
        if sprite_capacity >= usize::from(NO_SPRITE) {
            return Err(RenderError::InvalidConfig(format!(
                "sprite capacity {sprite_capacity} must be below {NO_SPRITE}"
            )));
        }

        let collision = CollisionMap::new(config.width, config.height)?;
        let dma = DmaBuffers::new(config.width, config.dma_scanlines)?;
        let layers = (0..config.layer_count)
            .map(|_| Vec::with_capacity(sprite_capacity))
            .collect();

        Ok(Self {
            config,
            sprite_capacity,
            collision,
            dma,
            layers,
        })
    }

    /// Returns the display configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Returns the collision map of the last frame.
    #[inline]
    #[must_use]
    pub const fn collision_map(&self) -> &CollisionMap {
        &self.collision
    }

    /// Returns the bytes held by the collision map and DMA buffers.
    #[must_use]
    pub fn footprint_bytes(&self) -> usize {
        self.collision.footprint_bytes() + self.dma.footprint_bytes()
    }

    /// Renders one frame and streams it to `device`.
    ///
    /// Overlapping opaque pixels of same-layer sprites are reported to the
    /// owning entities through [`record_overlap`].
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ViewportOutOfBounds`] if the screen would
    /// leave the tile map, and [`RenderError::InvalidConfig`] if the sprite
    /// store is larger than this compositor was built for. Nothing is sent
    /// to the device in either case.
    pub fn render_frame<E: Collidable, D: Device + ?Sized>(
        &mut self,
        viewport: Viewport,
        scene: Scene<'_, E>,
        device: &mut D,
    ) -> RenderResult<FrameReport> {
        self.check_viewport(viewport, scene.tile_map)?;
        if scene.sprites.capacity() > self.sprite_capacity {
            return Err(RenderError::InvalidConfig(format!(
                "sprite store holds {} sprites, compositor sized for {}",
                scene.sprites.capacity(),
                self.sprite_capacity
            )));
        }

        self.dma.reset_stats();
        self.collision.clear();
        let visible_sprites = self.collect_visible(scene.sprites);

        let Self {
            config,
            collision,
            dma,
            layers,
            ..
        } = self;
        let Scene {
            tile_map,
            resources,
            sprites,
            entities,
        } = scene;

        let mut raster = Raster {
            config,
            resources,
            sprites,
            entities,
            layers,
        };

        let scroll_x = viewport.x as usize;
        let scroll_y = viewport.y as usize;
        let tile_x_shift = config.tile_width.trailing_zeros();
        let tile_y_shift = config.tile_height.trailing_zeros();
        let first_column = scroll_x >> tile_x_shift;
        let first_fract = scroll_x & (config.tile_width - 1);

        let mut batch_row = 0;
        for screen_y in 0..config.height {
            let map_y = scroll_y + screen_y;
            let line = dma.row_mut(batch_row);
            raster.background(
                line,
                tile_map,
                map_y >> tile_y_shift,
                map_y & (config.tile_height - 1),
                first_column,
                first_fract,
            );
            raster.sprites(line, collision.row_mut(screen_y), screen_y as i32);

            batch_row += 1;
            if batch_row == config.dma_scanlines {
                dma.submit(device, batch_row);
                batch_row = 0;
            }
        }
        if batch_row > 0 {
            dma.submit(device, batch_row);
        }

        Ok(FrameReport {
            dma: dma.stats(),
            visible_sprites,
        })
    }

    fn check_viewport(&self, viewport: Viewport, tile_map: &TileMap) -> RenderResult<()> {
        let map_width = tile_map.columns() * self.config.tile_width;
        let map_height = tile_map.rows() * self.config.tile_height;
        let fits = |scroll: i32, screen: usize, map: usize| {
            usize::try_from(scroll).is_ok_and(|s| s + screen <= map)
        };
        if fits(viewport.x, self.config.width, map_width)
            && fits(viewport.y, self.config.height, map_height)
        {
            Ok(())
        } else {
            Err(RenderError::ViewportOutOfBounds {
                x: viewport.x,
                y: viewport.y,
                map_width,
                map_height,
            })
        }
    }

    /// Buckets on-screen sprites with an image by layer, in dense order.
    fn collect_visible(&mut self, sprites: &SpriteStore) -> usize {
        for layer in &mut self.layers {
            layer.clear();
        }

        let width = self.config.width as i32;
        let height = self.config.height as i32;
        let sprite_width = self.config.sprite_width as i32;
        let sprite_height = self.config.sprite_height as i32;

        let mut count = 0;
        for (dense, slot) in sprites.pool().all().iter().enumerate() {
            let Some(sprite) = slot else { continue };
            let Some(image) = sprite.image else { continue };
            let (x, y) = (i32::from(sprite.x), i32::from(sprite.y));
            if x <= -sprite_width || x >= width || y <= -sprite_height || y >= height {
                continue;
            }
            let Some(layer) = self.layers.get_mut(usize::from(sprite.layer)) else {
                tracing::trace!(layer = sprite.layer, "sprite on unknown layer skipped");
                continue;
            };
            layer.push(VisibleSprite {
                dense: dense as u16,
                owner: sprite.owner,
                image,
                x: sprite.x,
                y: sprite.y,
                flip: sprite.flip,
            });
            count += 1;
        }
        count
    }
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("config", &self.config)
            .field("sprite_capacity", &self.sprite_capacity)
            .field("dma", &self.dma)
            .finish_non_exhaustive()
    }
}

/// Borrowed state for drawing one frame.
struct Raster<'f, 'a, E> {
    config: &'f DisplayConfig,
    resources: &'a Resources,
    sprites: &'a SpriteStore,
    entities: &'a mut SlotPool<E>,
    layers: &'f [Vec<VisibleSprite>],
}

impl<E: Collidable> Raster<'_, '_, E> {
    /// Fills `line` from the tile row, starting `fract` pixels into the tile
    /// at `column`.
    fn background(
        &self,
        line: &mut [u16],
        tile_map: &TileMap,
        tile_row: usize,
        tile_line: usize,
        mut column: usize,
        mut fract: usize,
    ) {
        let tile_width = self.config.tile_width;
        let tile_height = self.config.tile_height;
        let palette = &self.resources.tile_palette;
        let tiles = tile_map.row(tile_row);
        let flags = tile_map.flags_row(tile_row);

        let mut x = 0;
        while x < line.len() {
            let n = (tile_width - fract).min(line.len() - x);
            let out = &mut line[x..x + n];
            let tile_flags = flags.map_or(TileFlags::NONE, |f| f[column]);

            match self.resources.tiles.image(usize::from(tiles[column])) {
                Some(image) => {
                    let src_line = if tile_flags.flip_vertical() {
                        tile_height - 1 - tile_line
                    } else {
                        tile_line
                    };
                    let row = &image[src_line * tile_width..(src_line + 1) * tile_width];
                    if tile_flags.flip_horizontal() {
                        copy_mapped(out, row[..tile_width - fract].iter().rev(), palette);
                    } else {
                        copy_mapped(out, row[fract..].iter(), palette);
                    }
                }
                None => out.fill(palette.color(0)),
            }

            x += n;
            column += 1;
            fract = 0;
        }
    }

    /// Draws every sprite crossing `screen_y` over `line`.
    fn sprites(&mut self, line: &mut [u16], cells: &mut [u16], screen_y: i32) {
        let sprite_width = self.config.sprite_width;
        let sprite_height = self.config.sprite_height;
        let layers = self.layers;

        for (layer, visible) in layers.iter().enumerate() {
            for sprite in visible {
                let row = screen_y - i32::from(sprite.y);
                if row < 0 || row >= sprite_height as i32 {
                    continue;
                }
                let Some(image) = self.resources.sprites.image(usize::from(sprite.image)) else {
                    continue;
                };
                let row = row as usize;
                let src_row = if sprite.flip.vertical {
                    sprite_height - 1 - row
                } else {
                    row
                };
                let src = &image[src_row * sprite_width..(src_row + 1) * sprite_width];

                // clip to the screen: `skip` sprite columns hidden on the left
                let x = i32::from(sprite.x);
                let skip = (-x).max(0) as usize;
                let start = x.max(0) as usize;
                let n = (sprite_width - skip).min(line.len() - start);
                let dst = &mut line[start..start + n];
                let dst_cells = &mut cells[start..start + n];

                if sprite.flip.horizontal {
                    let run = &src[sprite_width - skip - n..sprite_width - skip];
                    self.blit(dst, dst_cells, run.iter().rev(), sprite, layer);
                } else {
                    self.blit(dst, dst_cells, src[skip..skip + n].iter(), sprite, layer);
                }
            }
        }
    }

    fn blit<'s>(
        &mut self,
        dst: &mut [u16],
        cells: &mut [u16],
        src: impl Iterator<Item = &'s u8>,
        sprite: &VisibleSprite,
        layer: usize,
    ) {
        let palette = &self.resources.sprite_palette;
        for ((pixel, cell), &ix) in dst.iter_mut().zip(cells.iter_mut()).zip(src) {
            if ix == 0 {
                continue;
            }
            *pixel = palette.color(ix);
            if *cell != NO_SPRITE && *cell != sprite.dense {
                if let Some(other) = self.sprites.pool().instance_at(usize::from(*cell)) {
                    if usize::from(other.layer) == layer {
                        record_overlap(self.entities, sprite.owner, other.owner);
                    }
                }
            }
            *cell = sprite.dense;
        }
    }
}

fn copy_mapped<'s>(out: &mut [u16], src: impl Iterator<Item = &'s u8>, palette: &Palette) {
    for (pixel, &ix) in out.iter_mut().zip(src) {
        *pixel = palette.color(ix);
    }
}
