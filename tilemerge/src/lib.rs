//! tilemerge - assemble web-map tiles into a single raster
//!
//! Takes a sparse grid of equally sized square tiles addressed by
//! column/row coordinates, composites them onto one canvas, and crops an
//! arbitrary pixel window out of the result.
//!
//! ```text
//! TileSet ──► Compositor ──► canvas ──► Extractor ──► RgbaImage
//!              (decode +                (crop/offset,
//!               place)                   zero fill)
//! ```
//!
//! Loading tile bytes is left to the caller. Decoding is delegated to a
//! [`TileDecoder`]; [`ImageDecoder`] handles PNG, JPEG and WebP.
//!
//! # Example
//!
//! ```
//! use tilemerge::{merge, Tile, TileBounds, TileCoord, TileSet};
//!
//! let bounds = TileBounds::new(0, 0, 1, 1)?;
//! let mut tiles = TileSet::new(bounds);
//! tiles.push(Tile::empty(TileCoord::new(0, 0, 1)));
//!
//! let image = merge(&tiles, 100, 0, 412, 512, None)?;
//! assert_eq!(image.dimensions(), (412, 512));
//! # Ok::<(), tilemerge::MergeError>(())
//! ```

pub mod codec;
pub mod compose;
pub mod config;
pub mod coord;
pub mod error;
pub mod extract;
pub mod logging;
pub mod merger;
pub mod tile;

pub use codec::{CodecError, ImageDecoder, TileDecoder};
pub use compose::Compositor;
pub use config::{BackgroundPolicy, Execution, MergeConfig};
pub use coord::{TileBounds, TileCoord};
pub use error::MergeError;
pub use extract::{CropWindow, Extractor};
pub use merger::{merge, merge_async, TileMerger};
pub use tile::{Tile, TileSet, DEFAULT_TILE_SIZE};
