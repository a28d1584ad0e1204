//! Tile decoding abstractions.
//!
//! The compositor never inspects encoded bytes itself. It hands each payload
//! to a [`TileDecoder`] and receives an RGBA raster back, which keeps the
//! choice of image formats out of the layout code.
//!
//! ```text
//! ┌─────────────────────┐
//! │     Compositor      │
//! │                     │
//! │ Arc<dyn TileDecoder>│
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    TileDecoder      │ (trait)
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    ImageDecoder     │ PNG / JPEG / WebP via `image`
//! └─────────────────────┘
//! ```

use std::io::Cursor;

use image::{ImageReader, RgbaImage};
use thiserror::Error;

/// Errors reported by a tile decoder.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The underlying image library rejected the payload.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The payload format could not be determined or is unsupported.
    #[error("Format error: {0}")]
    Format(String),
}

/// Decodes encoded tile bytes into an RGBA raster.
///
/// Implementations must be thread-safe (`Send + Sync`) so tiles can be
/// decoded on a worker pool. The returned raster is not required to match
/// the tile edge length; the compositor clips or leaves gaps as needed.
pub trait TileDecoder: Send + Sync {
    /// Decode a single tile payload.
    fn decode(&self, data: &[u8]) -> Result<RgbaImage, CodecError>;

    /// Short name used in log output.
    fn name(&self) -> &str;
}

/// Decoder backed by the `image` crate.
///
/// The format is guessed from the payload's magic bytes, so PNG, JPEG and
/// WebP tiles can be mixed freely within one tile set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl ImageDecoder {
    /// Creates a decoder.
    pub fn new() -> Self {
        Self
    }
}

impl TileDecoder for ImageDecoder {
    fn decode(&self, data: &[u8]) -> Result<RgbaImage, CodecError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| CodecError::Format(e.to_string()))?;

        if reader.format().is_none() {
            return Err(CodecError::Format("unrecognized image format".to_string()));
        }

        Ok(reader.decode()?.to_rgba8())
    }

    fn name(&self) -> &str {
        "image"
    }
}
