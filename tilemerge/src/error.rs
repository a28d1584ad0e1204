//! Error types for tile merging.

use thiserror::Error;

use crate::codec::CodecError;
use crate::coord::{TileBounds, TileCoord};

/// Errors that can occur while compositing or cropping tiles.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A tile's payload could not be decoded. Aborts the whole composite.
    #[error("Failed to decode tile {coord}: {source}")]
    Decode {
        coord: TileCoord,
        #[source]
        source: CodecError,
    },

    /// Crop geometry outside the accepted domain (negative or oversized).
    #[error("Invalid crop window ({x_offset}, {y_offset}) {width}×{height}: {reason}")]
    InvalidWindow {
        x_offset: i64,
        y_offset: i64,
        width: i64,
        height: i64,
        reason: &'static str,
    },

    /// Tile edge length must be non-zero.
    #[error("Invalid tile size: {0}")]
    InvalidTileSize(u32),

    /// Bounding box with a maximum corner before its minimum corner.
    #[error("Invalid tile bounds ({x0}, {y0})-({x1}, {y1})")]
    InvalidBounds { x0: i64, y0: i64, x1: i64, y1: i64 },

    /// Canvas dimensions do not fit in a raster.
    #[error("Canvas too large: {columns}×{rows} tiles of {tile_size}px")]
    CanvasTooLarge {
        columns: u64,
        rows: u64,
        tile_size: u32,
    },

    /// Tile lies outside the declared bounding box.
    #[error("Tile {coord} outside bounds {bounds}")]
    TileOutOfBounds { coord: TileCoord, bounds: TileBounds },

    /// The blocking task running a merge panicked or was cancelled.
    #[error("Merge task failed: {0}")]
    TaskJoin(String),
}
