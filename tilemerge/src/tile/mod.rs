//! Tiles and tile sets.
//!
//! A [`Tile`] pairs a grid coordinate with an optional encoded payload. A
//! missing payload is the normal way to say "nothing here": the compositor
//! leaves that region blank without consulting the codec.
//!
//! A [`TileSet`] is an unordered collection of tiles plus the bounding box
//! they are declared to cover and the edge length shared by all of them.

use bytes::Bytes;

use crate::coord::{TileBounds, TileCoord};
use crate::error::MergeError;

/// Default tile edge length in pixels, as used by most web-map providers.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// A single tile: grid coordinate plus optional encoded image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub coord: TileCoord,
    /// Encoded image bytes, `None` if there is no content for this coordinate
    pub data: Option<Bytes>,
}

impl Tile {
    /// Creates a tile with an encoded payload.
    pub fn new(coord: TileCoord, data: impl Into<Bytes>) -> Self {
        Self {
            coord,
            data: Some(data.into()),
        }
    }

    /// Creates a tile with no content.
    pub fn empty(coord: TileCoord) -> Self {
        Self { coord, data: None }
    }

    /// Returns true if the tile carries a payload.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

/// Sparse collection of tiles covering a rectangular grid range.
///
/// Every tile is expected to lie within [`bounds`](Self::bounds). This is
/// the caller's contract; the compositor does not check it. Tiles outside
/// the box are clipped away rather than corrupting neighbouring memory, and
/// [`validate`](Self::validate) is available for callers that want a hard
/// check.
#[derive(Debug, Clone)]
pub struct TileSet {
    tiles: Vec<Tile>,
    bounds: TileBounds,
    tile_size: u32,
}

impl TileSet {
    /// Creates an empty tile set with the default tile size.
    pub fn new(bounds: TileBounds) -> Self {
        Self {
            tiles: Vec::new(),
            bounds,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }

    /// Creates a tile set from existing tiles.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidTileSize`] if `tile_size` is zero.
    pub fn from_tiles(
        bounds: TileBounds,
        tile_size: u32,
        tiles: Vec<Tile>,
    ) -> Result<Self, MergeError> {
        let mut set = Self::new(bounds).with_tile_size(tile_size)?;
        set.tiles = tiles;
        Ok(set)
    }

    /// Sets the tile edge length in pixels.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidTileSize`] if `tile_size` is zero.
    pub fn with_tile_size(mut self, tile_size: u32) -> Result<Self, MergeError> {
        if tile_size == 0 {
            return Err(MergeError::InvalidTileSize(tile_size));
        }
        self.tile_size = tile_size;
        Ok(self)
    }

    /// Adds a tile.
    pub fn push(&mut self, tile: Tile) {
        self.tiles.push(tile);
    }

    /// Adds a tile, builder style.
    pub fn with_tile(mut self, tile: Tile) -> Self {
        self.push(tile);
        self
    }

    /// Tiles in insertion order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Mutable access to the tiles, e.g. to clear a payload.
    pub fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    /// Declared bounding box.
    pub fn bounds(&self) -> &TileBounds {
        &self.bounds
    }

    /// Tile edge length in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Number of tiles, including empty ones.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Returns true if the set holds no tiles.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Canvas dimensions in pixels for this set.
    pub fn canvas_size(&self) -> Result<(u32, u32), MergeError> {
        self.bounds.canvas_size(self.tile_size)
    }

    /// Checks that every tile lies within the bounding box.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::TileOutOfBounds`] for the first offending tile.
    pub fn validate(&self) -> Result<(), MergeError> {
        match self.tiles.iter().find(|t| !self.bounds.contains(&t.coord)) {
            Some(tile) => Err(MergeError::TileOutOfBounds {
                coord: tile.coord,
                bounds: self.bounds,
            }),
            None => Ok(()),
        }
    }
}
