//! Tile compositing.
//!
//! The [`Compositor`] allocates a canvas sized to the tile set's bounding box
//! and copies every decoded tile into its grid-derived rectangle:
//!
//! ```text
//! px = (tile.x - x0) * tile_size
//! py = (tile.y - y0) * tile_size
//! ```
//!
//! Copies use source-replace semantics and are clipped to the tile's own
//! `tile_size × tile_size` rectangle, so a tile never writes into a
//! neighbour's region even if its decoded image is oversized.
//!
//! # Parallel execution
//!
//! With [`Execution::Parallel`] all payloads are decoded on the rayon pool
//! first. The canvas is then split into horizontal bands one tile row high;
//! each band is handed to exactly one worker, which writes the tiles of that
//! grid row. Bands are disjoint slices of the pixel buffer, so no locking is
//! needed and the parallel iterator's completion is the join barrier.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Instant;

use image::{imageops, ImageBuffer, Rgba, RgbaImage};
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::codec::TileDecoder;
use crate::config::{BackgroundPolicy, Execution, MergeConfig};
use crate::coord::TileBounds;
use crate::error::MergeError;
use crate::tile::{Tile, TileSet};

/// A decoded tile and where it goes on the canvas.
struct Placement {
    x: i64,
    y: i64,
    image: RgbaImage,
}

/// Composites a [`TileSet`] into a single raster.
pub struct Compositor {
    decoder: Arc<dyn TileDecoder>,
    config: MergeConfig,
}

impl Compositor {
    /// Creates a compositor using the given decoder and configuration.
    pub fn new(decoder: Arc<dyn TileDecoder>, config: MergeConfig) -> Self {
        Self { decoder, config }
    }

    /// Configuration the compositor was built with.
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Composites all tiles into a freshly allocated canvas.
    ///
    /// The canvas is `columns * tile_size` by `rows * tile_size` pixels.
    /// Tiles without a payload are skipped without invoking the decoder.
    /// What the uncovered area contains depends on the configured
    /// [`BackgroundPolicy`]: transparent black under `Ignore`, the supplied
    /// color under `Fill`.
    ///
    /// # Errors
    ///
    /// - [`MergeError::CanvasTooLarge`] if the canvas dimensions overflow
    /// - [`MergeError::Decode`] if any tile fails to decode; no partial
    ///   canvas is returned
    pub fn composite(
        &self,
        tiles: &TileSet,
        background: Option<Rgba<u8>>,
    ) -> Result<RgbaImage, MergeError> {
        let start = Instant::now();
        let (width, height) = tiles.canvas_size()?;
        let mut canvas = self.blank_canvas(width, height, background);

        match self.config.execution {
            Execution::Sequential => self.composite_sequential(tiles, &mut canvas)?,
            Execution::Parallel => self.composite_parallel(tiles, &mut canvas)?,
        }

        debug!(
            bounds = %tiles.bounds(),
            tile_size = tiles.tile_size(),
            width,
            height,
            tiles = tiles.len(),
            missing = tiles.tiles().iter().filter(|t| !t.has_data()).count(),
            decoder = self.decoder.name(),
            elapsed = ?start.elapsed(),
            "Composited tile set"
        );

        Ok(canvas)
    }

    fn blank_canvas(&self, width: u32, height: u32, background: Option<Rgba<u8>>) -> RgbaImage {
        match (self.config.background, background) {
            (BackgroundPolicy::Fill, Some(color)) => RgbaImage::from_pixel(width, height, color),
            (BackgroundPolicy::Ignore, Some(_)) => {
                debug!("Background color supplied but policy is ignore; canvas stays transparent");
                RgbaImage::new(width, height)
            }
            (_, None) => RgbaImage::new(width, height),
        }
    }

    fn composite_sequential(&self, tiles: &TileSet, canvas: &mut RgbaImage) -> Result<(), MergeError> {
        let tile_size = tiles.tile_size();
        for tile in tiles.tiles() {
            if let Some(placement) = self.decode(tiles.bounds(), tile_size, tile)? {
                place_tile(canvas, &placement.image, placement.x, placement.y, tile_size);
            }
        }
        Ok(())
    }

    fn composite_parallel(&self, tiles: &TileSet, canvas: &mut RgbaImage) -> Result<(), MergeError> {
        let tile_size = tiles.tile_size();
        let bounds = tiles.bounds();

        let placements: Vec<Option<Placement>> = tiles
            .tiles()
            .par_iter()
            .map(|tile| self.decode(bounds, tile_size, tile))
            .collect::<Result<_, _>>()?;

        // Group placements by tile row; input order is kept within a row so
        // duplicate coordinates resolve the same way as sequential mode.
        let rows = (canvas.height() / tile_size) as usize;
        let mut bands: Vec<Vec<&Placement>> = (0..rows).map(|_| Vec::new()).collect();
        for placement in placements.iter().flatten() {
            let row = placement.y.div_euclid(tile_size as i64);
            match usize::try_from(row).ok().filter(|r| *r < rows) {
                Some(row) => bands[row].push(placement),
                None => trace!(y = placement.y, "Tile row outside canvas, skipping"),
            }
        }

        let width = canvas.width();
        let band_len = width as usize * 4 * tile_size as usize;
        let pixels: &mut [u8] = &mut **canvas;

        pixels
            .par_chunks_mut(band_len)
            .zip(bands.par_iter())
            .filter(|(_, band_tiles)| !band_tiles.is_empty())
            .for_each(|(chunk, band_tiles)| {
                match ImageBuffer::<Rgba<u8>, &mut [u8]>::from_raw(width, tile_size, chunk) {
                    Some(mut band) => {
                        for placement in band_tiles {
                            place_tile(&mut band, &placement.image, placement.x, 0, tile_size);
                        }
                    }
                    None => warn!(width, tile_size, "Canvas band has unexpected length"),
                }
            });

        Ok(())
    }

    /// Decodes a tile and computes its canvas offset. `None` for empty tiles.
    fn decode(
        &self,
        bounds: &TileBounds,
        tile_size: u32,
        tile: &Tile,
    ) -> Result<Option<Placement>, MergeError> {
        let Some(data) = &tile.data else {
            trace!(tile = %tile.coord, "No payload, leaving region blank");
            return Ok(None);
        };

        if !bounds.contains(&tile.coord) {
            warn!(tile = %tile.coord, bounds = %bounds, "Tile outside declared bounds, clipping");
        }

        let image = self
            .decoder
            .decode(data)
            .map_err(|source| MergeError::Decode {
                coord: tile.coord,
                source,
            })?;

        if image.dimensions() != (tile_size, tile_size) {
            trace!(
                tile = %tile.coord,
                width = image.width(),
                height = image.height(),
                tile_size,
                "Decoded tile size differs from tile size"
            );
        }

        let (x, y) = bounds.pixel_offset(&tile.coord, tile_size);
        Ok(Some(Placement { x, y, image }))
    }
}

/// Copies at most a `tile_size` square of `src` onto `dst` at `(x, y)`,
/// replacing destination pixels. Clipped to the destination's extent.
fn place_tile<C>(dst: &mut ImageBuffer<Rgba<u8>, C>, src: &RgbaImage, x: i64, y: i64, tile_size: u32)
where
    C: Deref<Target = [u8]> + DerefMut,
{
    let view = imageops::crop_imm(src, 0, 0, tile_size, tile_size);
    imageops::replace(dst, &*view, x, y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecError, ImageDecoder};
    use crate::coord::TileCoord;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Decoder that produces a solid tile whose color is the first payload byte.
    struct SolidDecoder {
        size: u32,
        calls: AtomicUsize,
    }

    impl SolidDecoder {
        fn new(size: u32) -> Self {
            Self {
                size,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TileDecoder for SolidDecoder {
        fn decode(&self, data: &[u8]) -> Result<RgbaImage, CodecError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match data.first() {
                Some(&v) => Ok(RgbaImage::from_pixel(self.size, self.size, Rgba([v, v, v, 255]))),
                None => Err(CodecError::Format("empty payload".to_string())),
            }
        }

        fn name(&self) -> &str {
            "solid"
        }
    }

    fn grid(size: u32) -> TileSet {
        let bounds = TileBounds::new(0, 0, 1, 1).unwrap();
        let tiles = bounds
            .coords(1)
            .enumerate()
            .map(|(i, c)| Tile::new(c, vec![(i as u8 + 1) * 10]))
            .collect();
        TileSet::from_tiles(bounds, size, tiles).unwrap()
    }

    fn compositor(decoder: Arc<dyn TileDecoder>, execution: Execution) -> Compositor {
        Compositor::new(decoder, MergeConfig::new().with_execution(execution))
    }

    #[test]
    fn test_canvas_dimensions() {
        let bounds = TileBounds::new(2, 5, 4, 6).unwrap();
        let set = TileSet::new(bounds);
        let canvas = compositor(Arc::new(SolidDecoder::new(256)), Execution::Sequential)
            .composite(&set, None)
            .unwrap();
        assert_eq!(canvas.dimensions(), (768, 512));
        assert!(canvas.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_tiles_placed_at_grid_offsets() {
        let canvas = compositor(Arc::new(SolidDecoder::new(4)), Execution::Sequential)
            .composite(&grid(4), None)
            .unwrap();
        assert_eq!(canvas.get_pixel(0, 0).0, [10, 10, 10, 255]);
        assert_eq!(canvas.get_pixel(3, 3).0, [10, 10, 10, 255]);
        assert_eq!(canvas.get_pixel(4, 0).0, [20, 20, 20, 255]);
        assert_eq!(canvas.get_pixel(0, 4).0, [30, 30, 30, 255]);
        assert_eq!(canvas.get_pixel(7, 7).0, [40, 40, 40, 255]);
    }

    #[test]
    fn test_missing_tile_not_decoded() {
        let decoder = Arc::new(SolidDecoder::new(4));
        let mut set = grid(4);
        set.tiles_mut()[0].data = None;

        let canvas = compositor(decoder.clone(), Execution::Sequential)
            .composite(&set, None)
            .unwrap();

        assert_eq!(decoder.calls.load(Ordering::SeqCst), 3);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(canvas.get_pixel(x, y).0, [0, 0, 0, 0]);
            }
        }
        assert_eq!(canvas.get_pixel(4, 4).0, [40, 40, 40, 255]);
    }

    #[test]
    fn test_decode_failure_aborts() {
        let mut set = grid(4);
        set.tiles_mut()[2].data = Some(bytes::Bytes::new());

        for execution in [Execution::Sequential, Execution::Parallel] {
            let result = compositor(Arc::new(SolidDecoder::new(4)), execution).composite(&set, None);
            match result {
                Err(MergeError::Decode { coord, .. }) => assert_eq!(coord, TileCoord::new(0, 1, 1)),
                other => panic!("expected decode error, got {:?}", other.map(|c| c.dimensions())),
            }
        }
    }

    #[test]
    fn test_oversized_tile_clipped_to_own_rect() {
        let canvas = compositor(Arc::new(SolidDecoder::new(6)), Execution::Sequential)
            .composite(&grid(4), None)
            .unwrap();
        // Tile (0,0) decodes to 6×6 but must not bleed into tile (1,0)
        assert_eq!(canvas.get_pixel(4, 0).0, [20, 20, 20, 255]);
        assert_eq!(canvas.dimensions(), (8, 8));
    }

    #[test]
    fn test_undersized_tile_leaves_gap() {
        let canvas = compositor(Arc::new(SolidDecoder::new(2)), Execution::Sequential)
            .composite(&grid(4), None)
            .unwrap();
        assert_eq!(canvas.get_pixel(1, 1).0, [10, 10, 10, 255]);
        assert_eq!(canvas.get_pixel(3, 3).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_duplicate_coordinate_last_wins() {
        let bounds = TileBounds::new(0, 0, 0, 0).unwrap();
        let coord = TileCoord::new(0, 0, 0);
        let set = TileSet::from_tiles(
            bounds,
            4,
            vec![Tile::new(coord, vec![1u8]), Tile::new(coord, vec![2u8])],
        )
        .unwrap();

        for execution in [Execution::Sequential, Execution::Parallel] {
            let canvas = compositor(Arc::new(SolidDecoder::new(4)), execution)
                .composite(&set, None)
                .unwrap();
            assert_eq!(canvas.get_pixel(2, 2).0, [2, 2, 2, 255]);
        }
    }

    #[test]
    fn test_out_of_bounds_tile_is_clipped() {
        let bounds = TileBounds::new(0, 0, 0, 0).unwrap();
        let set = TileSet::from_tiles(
            bounds,
            4,
            vec![
                Tile::new(TileCoord::new(0, 0, 0), vec![5u8]),
                Tile::new(TileCoord::new(1, 0, 0), vec![9u8]),
                Tile::new(TileCoord::new(0, -1, 0), vec![9u8]),
            ],
        )
        .unwrap();

        for execution in [Execution::Sequential, Execution::Parallel] {
            let canvas = compositor(Arc::new(SolidDecoder::new(4)), execution)
                .composite(&set, None)
                .unwrap();
            assert_eq!(canvas.dimensions(), (4, 4));
            assert!(canvas.pixels().all(|p| p.0 == [5, 5, 5, 255]));
        }
    }

    #[test]
    fn test_background_ignored_by_default() {
        let mut set = grid(4);
        set.tiles_mut()[0].data = None;
        let canvas = compositor(Arc::new(SolidDecoder::new(4)), Execution::Sequential)
            .composite(&set, Some(Rgba([255, 0, 0, 255])))
            .unwrap();
        assert_eq!(canvas.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_background_fill_policy() {
        let mut set = grid(4);
        set.tiles_mut()[0].data = None;
        let config = MergeConfig::new().with_background(BackgroundPolicy::Fill);

        let canvas = Compositor::new(Arc::new(SolidDecoder::new(4)), config)
            .composite(&set, Some(Rgba([255, 0, 0, 255])))
            .unwrap();
        assert_eq!(canvas.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(4, 0).0, [20, 20, 20, 255]);

        // No color supplied: nothing to fill with
        let canvas = Compositor::new(Arc::new(SolidDecoder::new(4)), config)
            .composite(&set, None)
            .unwrap();
        assert_eq!(canvas.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let bounds = TileBounds::new(10, 20, 14, 23).unwrap();
        let tiles = bounds
            .coords(5)
            .enumerate()
            .map(|(i, c)| {
                if i % 3 == 0 {
                    Tile::empty(c)
                } else {
                    Tile::new(c, vec![i as u8])
                }
            })
            .collect();
        let set = TileSet::from_tiles(bounds, 8, tiles).unwrap();

        let sequential = compositor(Arc::new(SolidDecoder::new(8)), Execution::Sequential)
            .composite(&set, None)
            .unwrap();
        let parallel = compositor(Arc::new(SolidDecoder::new(8)), Execution::Parallel)
            .composite(&set, None)
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_image_decoder_roundtrip_pixels() {
        let tile = RgbaImage::from_fn(4, 4, |x, y| Rgba([x as u8 * 10, y as u8 * 10, 99, 255]));
        let mut png = std::io::Cursor::new(Vec::new());
        tile.write_to(&mut png, image::ImageFormat::Png).unwrap();

        let bounds = TileBounds::new(3, 3, 4, 3).unwrap();
        let set = TileSet::from_tiles(bounds, 4, vec![Tile::new(TileCoord::new(4, 3, 2), png.into_inner())])
            .unwrap();
        let canvas = compositor(Arc::new(ImageDecoder::new()), Execution::Sequential)
            .composite(&set, None)
            .unwrap();

        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(canvas.get_pixel(x + 4, y), tile.get_pixel(x, y));
                assert_eq!(canvas.get_pixel(x, y).0, [0, 0, 0, 0]);
            }
        }
    }
}
