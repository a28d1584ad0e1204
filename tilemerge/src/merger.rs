//! Composite-then-crop in a single call.

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::codec::{ImageDecoder, TileDecoder};
use crate::compose::Compositor;
use crate::config::{BackgroundPolicy, MergeConfig};
use crate::error::MergeError;
use crate::extract::{CropWindow, Extractor};
use crate::tile::TileSet;

/// Merges a tile set into one raster and crops the requested window.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tilemerge::{CropWindow, ImageDecoder, MergeConfig, TileBounds, TileMerger, TileSet};
///
/// let merger = TileMerger::new(Arc::new(ImageDecoder::new()), MergeConfig::default());
/// let tiles = TileSet::new(TileBounds::new(0, 0, 1, 1)?);
/// let window = CropWindow::new(100, 0, 412, 512)?;
///
/// let image = merger.merge(&tiles, &window, None)?;
/// assert_eq!(image.dimensions(), (412, 512));
/// # Ok::<(), tilemerge::MergeError>(())
/// ```
pub struct TileMerger {
    compositor: Compositor,
    extractor: Extractor,
}

impl TileMerger {
    /// Creates a merger with the given decoder and configuration.
    pub fn new(decoder: Arc<dyn TileDecoder>, config: MergeConfig) -> Self {
        Self {
            compositor: Compositor::new(decoder, config),
            extractor: Extractor::new(),
        }
    }

    /// Configuration the merger was built with.
    pub fn config(&self) -> &MergeConfig {
        self.compositor.config()
    }

    /// Composites the tile set without cropping.
    pub fn composite(
        &self,
        tiles: &TileSet,
        background: Option<Rgba<u8>>,
    ) -> Result<RgbaImage, MergeError> {
        self.compositor.composite(tiles, background)
    }

    /// Composites the tile set, then extracts `window` from the result.
    ///
    /// Under [`BackgroundPolicy::Fill`] with a background color, the part of
    /// the window outside the composited canvas is painted too.
    ///
    /// # Errors
    ///
    /// Any error from [`Compositor::composite`]. Cropping itself cannot fail.
    pub fn merge(
        &self,
        tiles: &TileSet,
        window: &CropWindow,
        background: Option<Rgba<u8>>,
    ) -> Result<RgbaImage, MergeError> {
        let canvas = self.compositor.composite(tiles, background)?;

        let cropped = match (self.config().background, background) {
            (BackgroundPolicy::Fill, Some(color)) => {
                self.extractor.extract_filled(&canvas, window, color)
            }
            _ => self.extractor.extract(&canvas, window),
        };

        debug!(
            canvas_width = canvas.width(),
            canvas_height = canvas.height(),
            x_offset = window.x_offset(),
            y_offset = window.y_offset(),
            width = cropped.width(),
            height = cropped.height(),
            "Merged tiles"
        );

        Ok(cropped)
    }
}

impl Default for TileMerger {
    fn default() -> Self {
        Self::new(Arc::new(ImageDecoder::new()), MergeConfig::default())
    }
}

/// Merges tiles with the default configuration and the `image` codec.
///
/// Composites the tile set, then crops `width × height` pixels starting at
/// `(x_offset, y_offset)` from the canvas origin.
///
/// # Errors
///
/// - [`MergeError::InvalidWindow`] for negative or oversized geometry
/// - [`MergeError::Decode`] if any tile fails to decode
pub fn merge(
    tiles: &TileSet,
    x_offset: i64,
    y_offset: i64,
    width: i64,
    height: i64,
    background: Option<Rgba<u8>>,
) -> Result<RgbaImage, MergeError> {
    let window = CropWindow::new(x_offset, y_offset, width, height)?;
    TileMerger::default().merge(tiles, &window, background)
}

/// Runs [`TileMerger::merge`] on tokio's blocking thread pool.
///
/// Compositing is CPU-bound; this keeps it off the async worker threads.
///
/// # Errors
///
/// Any error from the merge, or [`MergeError::TaskJoin`] if the blocking
/// task panicked or was cancelled.
pub async fn merge_async(
    merger: Arc<TileMerger>,
    tiles: TileSet,
    window: CropWindow,
    background: Option<Rgba<u8>>,
) -> Result<RgbaImage, MergeError> {
    tokio::task::spawn_blocking(move || merger.merge(&tiles, &window, background))
        .await
        .map_err(|e| MergeError::TaskJoin(e.to_string()))?
}
