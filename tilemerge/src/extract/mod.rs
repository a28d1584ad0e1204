//! Window extraction (crop with offset).
//!
//! [`Extractor::extract`] always returns a raster of exactly the requested
//! size. Pixels of the window that fall outside the source raster are left
//! at zero (or at the fill color for [`Extractor::extract_filled`]).

use image::{imageops, Rgba, RgbaImage};
use tracing::trace;

use crate::coord::rgba_buffer_len;
use crate::error::MergeError;

/// A validated crop window, relative to the source raster's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropWindow {
    x_offset: u32,
    y_offset: u32,
    width: u32,
    height: u32,
}

impl CropWindow {
    /// Creates a crop window.
    ///
    /// Inputs are signed so that callers working in signed pixel space get a
    /// clear error rather than a wrapped value.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidWindow`] if an offset or size is negative,
    /// does not fit in `u32`, or the output buffer would not be addressable.
    pub fn new(x_offset: i64, y_offset: i64, width: i64, height: i64) -> Result<Self, MergeError> {
        let invalid = |reason| MergeError::InvalidWindow {
            x_offset,
            y_offset,
            width,
            height,
            reason,
        };

        if x_offset < 0 || y_offset < 0 {
            return Err(invalid("offsets must be non-negative"));
        }
        if width < 0 || height < 0 {
            return Err(invalid("size must be non-negative"));
        }

        let to_u32 = |v: i64| u32::try_from(v).map_err(|_| invalid("value exceeds u32 range"));
        let window = Self {
            x_offset: to_u32(x_offset)?,
            y_offset: to_u32(y_offset)?,
            width: to_u32(width)?,
            height: to_u32(height)?,
        };

        if rgba_buffer_len(window.width, window.height).is_none() {
            return Err(invalid("window exceeds addressable buffer size"));
        }
        Ok(window)
    }

    /// Window covering an entire `width × height` raster.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn full(width: u32, height: u32) -> Result<Self, MergeError> {
        Self::new(0, 0, width.into(), height.into())
    }

    /// Horizontal offset from the source origin.
    pub fn x_offset(&self) -> u32 {
        self.x_offset
    }

    /// Vertical offset from the source origin.
    pub fn y_offset(&self) -> u32 {
        self.y_offset
    }

    /// Output width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Output height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns true if the window lies entirely within a raster of the given size.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x_offset as u64 + self.width as u64 <= width as u64
            && self.y_offset as u64 + self.height as u64 <= height as u64
    }
}

/// Extracts windows from a source raster.
#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor;

impl Extractor {
    /// Creates an extractor.
    pub fn new() -> Self {
        Self
    }

    /// Copies the window out of `source` into a new zero-initialized raster.
    pub fn extract(&self, source: &RgbaImage, window: &CropWindow) -> RgbaImage {
        self.copy_into(RgbaImage::new(window.width, window.height), source, window)
    }

    /// Like [`extract`](Self::extract), but the area outside the source is
    /// painted with `fill`.
    pub fn extract_filled(&self, source: &RgbaImage, window: &CropWindow, fill: Rgba<u8>) -> RgbaImage {
        self.copy_into(
            RgbaImage::from_pixel(window.width, window.height, fill),
            source,
            window,
        )
    }

    fn copy_into(&self, mut output: RgbaImage, source: &RgbaImage, window: &CropWindow) -> RgbaImage {
        if !window.fits_within(source.width(), source.height()) {
            trace!(
                x_offset = window.x_offset,
                y_offset = window.y_offset,
                width = window.width,
                height = window.height,
                source_width = source.width(),
                source_height = source.height(),
                "Crop window extends past source raster"
            );
        }

        // Shifting the source by the negated offset lines the window up with
        // the output origin; replace clips everything else.
        imageops::replace(
            &mut output,
            source,
            -(window.x_offset as i64),
            -(window.y_offset as i64),
        );
        output
    }
}
