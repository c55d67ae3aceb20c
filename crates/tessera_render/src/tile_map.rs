//! # Tile Map
//!
//! The scrolling background: a grid of tile image indices with optional
//! per-tile mirroring flags.

use crate::error::{RenderError, RenderResult};

/// Index into the tile image table.
pub type TileId = u16;

/// Per-tile mirroring flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TileFlags(u8);

impl TileFlags {
    /// No mirroring.
    pub const NONE: Self = Self(0);
    /// Mirror the tile top to bottom.
    pub const FLIP_VERTICAL: Self = Self(0x4);
    /// Mirror the tile left to right.
    pub const FLIP_HORIZONTAL: Self = Self(0x8);

    /// Wraps raw flag bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Combines two flag sets.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    #[must_use]
    pub(crate) const fn flip_horizontal(self) -> bool {
        self.0 & Self::FLIP_HORIZONTAL.0 != 0
    }

    #[inline]
    #[must_use]
    pub(crate) const fn flip_vertical(self) -> bool {
        self.0 & Self::FLIP_VERTICAL.0 != 0
    }
}

/// Background grid, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileMap {
    columns: usize,
    rows: usize,
    tiles: Box<[TileId]>,
    flags: Option<Box<[TileFlags]>>,
}

impl TileMap {
    /// Creates a map from row-major tile indices.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ResourceMismatch`] if `tiles` is not exactly
    /// `columns * rows` long or the map is empty.
    pub fn new(columns: usize, rows: usize, tiles: Vec<TileId>) -> RenderResult<Self> {
        if columns == 0 || rows == 0 || tiles.len() != columns * rows {
            return Err(RenderError::ResourceMismatch(format!(
                "{} tiles do not fill a {columns}x{rows} map",
                tiles.len()
            )));
        }
        Ok(Self {
            columns,
            rows,
            tiles: tiles.into_boxed_slice(),
            flags: None,
        })
    }

    /// Creates a map with every cell set to `tile`.
    ///
    /// # Panics
    ///
    /// Panics if `columns` or `rows` is zero.
    #[must_use]
    pub fn filled(columns: usize, rows: usize, tile: TileId) -> Self {
        assert!(columns > 0 && rows > 0, "Tile map must not be empty");
        Self {
            columns,
            rows,
            tiles: vec![tile; columns * rows].into_boxed_slice(),
            flags: None,
        }
    }

    /// Attaches per-tile flags.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ResourceMismatch`] on a length mismatch.
    pub fn with_flags(mut self, flags: Vec<TileFlags>) -> RenderResult<Self> {
        if flags.len() != self.tiles.len() {
            return Err(RenderError::ResourceMismatch(format!(
                "{} flags for {} tiles",
                flags.len(),
                self.tiles.len()
            )));
        }
        self.flags = Some(flags.into_boxed_slice());
        Ok(self)
    }

    /// Number of tile columns.
    #[inline]
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Number of tile rows.
    #[inline]
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Reads one cell.
    #[inline]
    #[must_use]
    pub fn get(&self, column: usize, row: usize) -> Option<TileId> {
        (column < self.columns && row < self.rows).then(|| self.tiles[row * self.columns + column])
    }

    /// Writes one cell. Out of range writes are ignored.
    pub fn set(&mut self, column: usize, row: usize, tile: TileId) {
        if column < self.columns && row < self.rows {
            self.tiles[row * self.columns + column] = tile;
        }
    }

    /// Writes the flags of one cell, creating the flag grid on first use.
    pub fn set_flags(&mut self, column: usize, row: usize, flags: TileFlags) {
        if column >= self.columns || row >= self.rows {
            return;
        }
        let len = self.tiles.len();
        let grid = self
            .flags
            .get_or_insert_with(|| vec![TileFlags::NONE; len].into_boxed_slice());
        grid[row * self.columns + column] = flags;
    }

    /// Returns one row of tile indices.
    #[inline]
    #[must_use]
    pub fn row(&self, row: usize) -> &[TileId] {
        &self.tiles[row * self.columns..(row + 1) * self.columns]
    }

    /// Returns one row of flags, if the map has flags.
    #[inline]
    #[must_use]
    pub fn flags_row(&self, row: usize) -> Option<&[TileFlags]> {
        self.flags
            .as_deref()
            .map(|flags| &flags[row * self.columns..(row + 1) * self.columns])
    }

    /// Returns the largest tile index used.
    #[must_use]
    pub fn max_tile(&self) -> TileId {
        self.tiles.iter().copied().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_length() {
        assert!(TileMap::new(4, 4, vec![0; 15]).is_err());
        assert!(TileMap::new(0, 4, Vec::new()).is_err());
        assert!(TileMap::new(4, 4, vec![0; 16]).is_ok());
    }

    #[test]
    fn test_rows_are_row_major() {
        let map = TileMap::new(3, 2, vec![0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(map.row(1), &[3, 4, 5]);
        assert_eq!(map.get(2, 0), Some(2));
        assert_eq!(map.get(3, 0), None);
        assert_eq!(map.max_tile(), 5);
    }

    #[test]
    fn test_set_flags_creates_grid() {
        let mut map = TileMap::filled(2, 2, 0);
        assert!(map.flags_row(0).is_none());
        map.set_flags(1, 1, TileFlags::FLIP_HORIZONTAL);
        assert_eq!(map.flags_row(1), Some(&[TileFlags::NONE, TileFlags::FLIP_HORIZONTAL][..]));
        assert!(TileFlags::FLIP_HORIZONTAL.flip_horizontal());
        assert!(!TileFlags::FLIP_HORIZONTAL.flip_vertical());
    }
}
