//! Tile grid coordinates and the grid-to-canvas mapping.
//!
//! Tiles are addressed the way web-map tiling schemes address them: `x`
//! increases rightward, `y` increases downward, and `z` names the zoom
//! level. A [`TileBounds`] declares the inclusive rectangle of grid
//! coordinates a tile set covers; its minimum corner lands at canvas pixel
//! `(0, 0)`.
//!
//! ```text
//!        x0      x0+1     x1
//!      ┌───────┬───────┬───────┐
//!   y0 │ (0,0) │ (T,0) │(2T,0) │
//!      ├───────┼───────┼───────┤
//!   y1 │ (0,T) │ (T,T) │(2T,T) │
//!      └───────┴───────┴───────┘
//! ```

use std::fmt;

use crate::error::MergeError;

/// Grid coordinate of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Column, increasing rightward
    pub x: i64,
    /// Row, increasing downward
    pub y: i64,
    /// Zoom level. Informational only; never used in layout math.
    pub z: u8,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    pub fn new(x: i64, y: i64, z: u8) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Inclusive bounding box of grid coordinates, `(x0, y0)`-`(x1, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileBounds {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}

impl TileBounds {
    /// Creates a bounding box from its minimum and maximum corners.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidBounds`] if `x1 < x0` or `y1 < y0`.
    pub fn new(x0: i64, y0: i64, x1: i64, y1: i64) -> Result<Self, MergeError> {
        if x1 < x0 || y1 < y0 {
            return Err(MergeError::InvalidBounds { x0, y0, x1, y1 });
        }
        Ok(Self { x0, y0, x1, y1 })
    }

    /// Minimum column.
    pub fn x0(&self) -> i64 {
        self.x0
    }

    /// Minimum row.
    pub fn y0(&self) -> i64 {
        self.y0
    }

    /// Maximum column (inclusive).
    pub fn x1(&self) -> i64 {
        self.x1
    }

    /// Maximum row (inclusive).
    pub fn y1(&self) -> i64 {
        self.y1
    }

    /// Number of tile columns covered.
    pub fn columns(&self) -> u64 {
        self.x1.abs_diff(self.x0) + 1
    }

    /// Number of tile rows covered.
    pub fn rows(&self) -> u64 {
        self.y1.abs_diff(self.y0) + 1
    }

    /// Returns true if the grid coordinate lies inside the box.
    pub fn contains(&self, coord: &TileCoord) -> bool {
        (self.x0..=self.x1).contains(&coord.x) && (self.y0..=self.y1).contains(&coord.y)
    }

    /// Canvas dimensions in pixels for tiles of `tile_size` pixels.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::CanvasTooLarge`] if either dimension overflows
    /// `u32` or the RGBA pixel buffer would not be addressable.
    pub fn canvas_size(&self, tile_size: u32) -> Result<(u32, u32), MergeError> {
        let too_large = || MergeError::CanvasTooLarge {
            columns: self.columns(),
            rows: self.rows(),
            tile_size,
        };
        let width = self
            .columns()
            .checked_mul(tile_size as u64)
            .and_then(|w| u32::try_from(w).ok())
            .ok_or_else(too_large)?;
        let height = self
            .rows()
            .checked_mul(tile_size as u64)
            .and_then(|h| u32::try_from(h).ok())
            .ok_or_else(too_large)?;
        rgba_buffer_len(width, height).ok_or_else(too_large)?;
        Ok((width, height))
    }

    /// Pixel offset of a tile's top-left corner on the canvas.
    ///
    /// `px = (x - x0) * tile_size`, `py = (y - y0) * tile_size`. Coordinates
    /// outside the box map to offsets outside the canvas.
    #[inline]
    pub fn pixel_offset(&self, coord: &TileCoord, tile_size: u32) -> (i64, i64) {
        let size = tile_size as i64;
        (
            coord.x.saturating_sub(self.x0).saturating_mul(size),
            coord.y.saturating_sub(self.y0).saturating_mul(size),
        )
    }

    /// Iterates every coordinate in the box, row by row from the top-left.
    pub fn coords(&self, zoom: u8) -> impl Iterator<Item = TileCoord> {
        let (x0, x1) = (self.x0, self.x1);
        (self.y0..=self.y1).flat_map(move |y| (x0..=x1).map(move |x| TileCoord::new(x, y, zoom)))
    }
}

/// Byte length of an RGBA8 buffer of the given size, `None` if it overflows `usize`.
pub(crate) fn rgba_buffer_len(width: u32, height: u32) -> Option<usize> {
    (width as u64)
        .checked_mul(height as u64)
        .and_then(|n| n.checked_mul(4))
        .and_then(|n| usize::try_from(n).ok())
}

impl fmt::Display for TileBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})-({}, {})", self.x0, self.y0, self.x1, self.y1)
    }
}
