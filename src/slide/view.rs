//! `SlideView`: one open slide's tile grid and the `FindTile` / `ReadRegion`
//! algorithms that make up the tile-cached affine resampler.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::affine::Affine;
use crate::cache::TileCache;
use crate::error::CoreError;
use crate::interp::Status;
use crate::tile::{Tile, TileRef, OVERHANG, TILESIZE, TILE_BUFFER_SIDE};

use super::reader::SlideReader;

static NEXT_SLIDE_ID: AtomicU64 = AtomicU64::new(1);

/// The state a per-pixel sampling cursor can be in between `FindTile`
/// resolutions: bound to a resident tile, or outside the slide's tile grid
/// for some number of further destination columns (`nskip`).
#[derive(Debug, Clone, Copy)]
enum Lookup {
    Tile {
        tile_ref: TileRef,
        tx: i64,
        ty: i64,
        cix: [f32; 2],
    },
    OutOfGrid {
        tx: i64,
        ty: i64,
        cix: [f32; 2],
        nskip: u32,
    },
}

impl Lookup {
    fn advance(&mut self, step: (f32, f32)) {
        let cix = match self {
            Lookup::Tile { cix, .. } => cix,
            Lookup::OutOfGrid { cix, .. } => cix,
        };
        cix[0] += step.0;
        cix[1] += step.1;
    }
}

/// Walk the sampling cursor one destination column at a time, starting from
/// `cix`, counting how many columns remain inside `[0, TILESIZE)` in x and
/// `[0, TILESIZE]` in y (the upper y bound is inclusive, not exclusive —
/// preserved from the reference implementation per `DESIGN.md`). Capped so
/// a zero (or near-zero) column step can't loop forever.
fn compute_nskip(cix: [f32; 2], step: (f32, f32)) -> u32 {
    let ts = TILESIZE as f32;
    let (mut wx, mut wy) = (cix[0], cix[1]);
    let mut nskip = 0u32;
    let cap = TILESIZE + 2;
    while wx >= 0.0 && wy >= 0.0 && wx < ts && wy <= ts {
        nskip += 1;
        wx += step.0;
        wy += step.1;
        if nskip >= cap {
            break;
        }
    }
    if nskip == 0 {
        nskip = 1;
    }
    nskip
}

/// One open whole-slide image: its per-level dimensions/tile-grid shape,
/// and the cache it shares with sibling views.
pub struct SlideView<R: SlideReader> {
    slide_id: u64,
    reader: R,
    cache: Rc<RefCell<TileCache>>,
    dim_x: Vec<u32>,
    dim_y: Vec<u32>,
    nx: Vec<u32>,
    ny: Vec<u32>,
    canvas: (u64, u64),
}

impl<R: SlideReader> SlideView<R> {
    /// Open `reader` against `cache`. If either `canvas_x` or `canvas_y` is
    /// zero, both are replaced by `level_dimensions(0)`.
    pub fn open(
        cache: Rc<RefCell<TileCache>>,
        reader: R,
        canvas_x: u64,
        canvas_y: u64,
    ) -> Result<Self, CoreError> {
        let level_count = reader.level_count();
        if level_count == 0 {
            return Err(CoreError::SlideOpenFailed {
                path: "<reader>".to_string(),
                source: "slide reader reports zero pyramid levels".into(),
            });
        }

        let mut dim_x = Vec::with_capacity(level_count as usize);
        let mut dim_y = Vec::with_capacity(level_count as usize);
        let mut nx = Vec::with_capacity(level_count as usize);
        let mut ny = Vec::with_capacity(level_count as usize);
        for level in 0..level_count {
            let (w, h) = reader.level_dimensions(level).ok_or(CoreError::LevelOutOfRange {
                level: level as i64,
                level_count,
            })?;
            dim_x.push(w);
            dim_y.push(h);
            nx.push(w.div_ceil(TILESIZE));
            ny.push(h.div_ceil(TILESIZE));
        }

        let (canvas_x, canvas_y) = if canvas_x == 0 || canvas_y == 0 {
            (dim_x[0] as u64, dim_y[0] as u64)
        } else {
            (canvas_x, canvas_y)
        };

        let slide_id = NEXT_SLIDE_ID.fetch_add(1, Ordering::Relaxed);
        debug!(slide_id, level_count, "opened slide view");

        Ok(Self {
            slide_id,
            reader,
            cache,
            dim_x,
            dim_y,
            nx,
            ny,
            canvas: (canvas_x, canvas_y),
        })
    }

    pub fn level_count(&self) -> u32 {
        self.dim_x.len() as u32
    }

    pub fn level_dimensions(&self, level: u32) -> Option<(u32, u32)> {
        let i = level as usize;
        Some((*self.dim_x.get(i)?, *self.dim_y.get(i)?))
    }

    pub fn level_downsample(&self, level: u32) -> Option<f64> {
        self.reader.level_downsample(level)
    }

    pub fn best_level_for_downsample(&self, downsample: f64) -> u32 {
        self.reader.best_level_for_downsample(downsample)
    }

    pub fn canvas_dimensions(&self) -> (u64, u64) {
        self.canvas
    }

    /// Resolve the tile containing destination-canvas point `(x, y)`
    /// (level-0 units) under affine `a`, loading it into the shared cache
    /// on a miss (evicting the LRU tile first if needed).
    fn find_tile(
        &mut self,
        level: u32,
        ds: f64,
        ts: f64,
        x: f64,
        y: f64,
        a: &Affine,
    ) -> Result<Lookup, CoreError> {
        let (sx, sy) = a.apply(x, y);
        let ti_x = (sx / ts).floor();
        let ti_y = (sy / ts).floor();
        let tx = (ti_x * ts - OVERHANG as f64 * ds).floor() as i64;
        let ty = (ti_y * ts - OVERHANG as f64 * ds).floor() as i64;
        let cix = [
            ((sx - tx as f64) / ds) as f32,
            ((sy - ty as f64) / ds) as f32,
        ];

        let nxl = self.nx[level as usize] as f64;
        let nyl = self.ny[level as usize] as f64;
        if ti_x < 0.0 || ti_y < 0.0 || ti_x >= nxl || ti_y >= nyl {
            let (step_x, step_y) = a.column_step();
            let step = (step_x as f32, step_y as f32);
            let nskip = compute_nskip(cix, step);
            return Ok(Lookup::OutOfGrid { tx, ty, cix, nskip });
        }

        let tile_ref = TileRef {
            slide_id: self.slide_id,
            level,
            ti_x: ti_x as u32,
            ti_y: ti_y as u32,
        };

        let mut cache = self.cache.borrow_mut();
        if cache.contains(tile_ref) {
            cache.mark_used(tile_ref);
        } else {
            cache.evict_if_needed();
            let timestamp = cache.touch();
            let mut tile = Tile::new_zeroed(timestamp);
            self.reader
                .read_region(
                    tile.buffer_mut(),
                    tx,
                    ty,
                    level,
                    TILE_BUFFER_SIDE,
                    TILE_BUFFER_SIDE,
                )
                .map_err(CoreError::ReaderIoError)?;
            debug!(
                slide_id = self.slide_id,
                level,
                ti_x = tile_ref.ti_x,
                ti_y = tile_ref.ti_y,
                tx,
                ty,
                "loaded tile"
            );
            cache.insert(tile_ref, tile);
        }
        Ok(Lookup::Tile { tile_ref, tx, ty, cix })
    }

    /// Fill `out` (row-major packed RGBA, at least `4 * rw * rh` bytes) with
    /// the canvas region `[rx, rx + rw*ds) x [ry, ry + rh*ds)` (level-0
    /// units) sampled at `level` under affine `a`.
    pub fn read_region(
        &mut self,
        level: u32,
        rx: i64,
        ry: i64,
        rw: i64,
        rh: i64,
        a: &Affine,
        out: &mut [u8],
    ) -> Result<(), CoreError> {
        let level_count = self.level_count();
        if level >= level_count {
            return Err(CoreError::LevelOutOfRange {
                level: level as i64,
                level_count,
            });
        }
        let required = 4 * rw as usize * rh as usize;
        if out.len() < required {
            return Err(CoreError::BufferTooSmall {
                required,
                actual: out.len(),
            });
        }

        let ds = self.reader.level_downsample(level).expect("level validated above");
        let ts = ds * TILESIZE as f64;
        let (step_x, step_y) = a.column_step();
        let step = (step_x as f32, step_y as f32);

        let mut p = 0usize;
        for py in 0..rh {
            let mut lookup = self.find_tile(level, ds, ts, rx as f64, ry as f64 + ds * py as f64, a)?;
            for px in 0..rw {
                let rgba = self.sample_pixel(level, ds, ts, rx, ry, px, py, a, &mut lookup)?;
                for (c, &v) in rgba.iter().enumerate() {
                    out[p + c] = v as u8;
                }
                lookup.advance(step);
                p += 4;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn sample_pixel(
        &mut self,
        level: u32,
        ds: f64,
        ts: f64,
        rx: i64,
        ry: i64,
        px: i64,
        py: i64,
        a: &Affine,
        lookup: &mut Lookup,
    ) -> Result<[f32; 4], CoreError> {
        if let Lookup::OutOfGrid { nskip, .. } = lookup {
            if *nskip > 0 {
                *nskip -= 1;
                return Ok([0.0; 4]);
            }
        }

        let sample = match &*lookup {
            Lookup::Tile { tile_ref, cix, .. } => {
                let cache = self.cache.borrow();
                cache
                    .get(*tile_ref)
                    .map(|t| t.interpolator().interpolate(cix[0], cix[1]))
            }
            Lookup::OutOfGrid { .. } => None,
        };

        if let Some((rgba, status)) = sample {
            if status != Status::Outside {
                return Ok(rgba);
            }
        }

        // Re-resolve at the current destination pixel.
        let x = rx as f64 + ds * px as f64;
        let y = ry as f64 + ds * py as f64;
        *lookup = self.find_tile(level, ds, ts, x, y, a)?;

        match lookup {
            Lookup::Tile { tile_ref, tx, ty, cix } => {
                let cache = self.cache.borrow();
                let tile = cache.get(*tile_ref).expect("just resolved tile must be resident");
                let (rgba, status) = tile.interpolator().interpolate(cix[0], cix[1]);
                if status == Status::Outside {
                    return Err(CoreError::ResampleOutOfRange {
                        dst_x: rx + px,
                        dst_y: ry + py,
                        level,
                        tile_x: *tx,
                        tile_y: *ty,
                    });
                }
                Ok(rgba)
            }
            Lookup::OutOfGrid { nskip, .. } => {
                // The freshly-computed nskip already counts this pixel.
                *nskip = nskip.saturating_sub(1);
                Ok([0.0; 4])
            }
        }
    }
}

impl<R: SlideReader> Drop for SlideView<R> {
    fn drop(&mut self) {
        self.cache.borrow_mut().evict_slide(self.slide_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slide::mock::{CountingReader, InMemorySlide};

    fn open(
        cache: &Rc<RefCell<TileCache>>,
        slide: InMemorySlide,
        canvas_x: u64,
        canvas_y: u64,
    ) -> SlideView<CountingReader<InMemorySlide>> {
        SlideView::open(Rc::clone(cache), CountingReader::new(slide), canvas_x, canvas_y).unwrap()
    }

    #[test]
    fn identity_read_matches_native_pixels() {
        let cache = Rc::new(RefCell::new(TileCache::new(16)));
        let mut view = open(&cache, InMemorySlide::new(4096, 4096, 4), 0, 0);

        let w = 37i64;
        let h = 29i64;
        let mut out = vec![0u8; 4 * w as usize * h as usize];
        view.read_region(0, 100, 200, w, h, &Affine::IDENTITY, &mut out)
            .unwrap();

        for row in 0..h {
            for col in 0..w {
                let expect = InMemorySlide::pixel_at_level0(100 + col, 200 + row);
                let idx = 4 * (row as usize * w as usize + col as usize);
                assert_eq!(&out[idx..idx + 4], &expect[..], "pixel ({col},{row})");
            }
        }
    }

    #[test]
    fn transpose_affine_swaps_rows_and_columns() {
        let cache = Rc::new(RefCell::new(TileCache::new(16)));
        let mut view = open(&cache, InMemorySlide::new(2048, 2048, 3), 0, 0);

        let ts = crate::tile::TILESIZE as i64;
        let a = Affine::new([[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        let mut out = vec![0u8; 4 * (ts * ts) as usize];
        view.read_region(0, 0, 0, ts, ts, &a, &mut out).unwrap();

        for r in 0..ts {
            for c in 0..ts {
                let expect = InMemorySlide::pixel_at_level0(r, c);
                let idx = 4 * (r as usize * ts as usize + c as usize);
                assert_eq!(&out[idx..idx + 4], &expect[..]);
            }
        }
    }

    #[test]
    fn canvas_defaults_to_level0_dimensions() {
        let cache = Rc::new(RefCell::new(TileCache::new(4)));
        let view = open(&cache, InMemorySlide::new(321, 654, 2), 0, 0);
        assert_eq!(view.canvas_dimensions(), (321, 654));
    }

    #[test]
    fn canvas_respects_explicit_dimensions() {
        let cache = Rc::new(RefCell::new(TileCache::new(4)));
        let view = open(&cache, InMemorySlide::new(321, 654, 2), 10, 20);
        assert_eq!(view.canvas_dimensions(), (10, 20));
    }

    #[test]
    fn out_of_bounds_region_is_transparent() {
        let cache = Rc::new(RefCell::new(TileCache::new(4)));
        let ts = crate::tile::TILESIZE as i64;
        let mut view = open(&cache, InMemorySlide::new(4096, 4096, 3), 0, 0);

        let mut out = vec![0xFFu8; 4 * (ts * ts) as usize];
        view.read_region(0, -ts, 0, ts, ts, &Affine::IDENTITY, &mut out)
            .unwrap();
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn level_out_of_range_is_rejected() {
        let cache = Rc::new(RefCell::new(TileCache::new(4)));
        let mut view = open(&cache, InMemorySlide::new(512, 512, 1), 0, 0);
        let mut out = vec![0u8; 4];
        let err = view
            .read_region(5, 0, 0, 1, 1, &Affine::IDENTITY, &mut out)
            .unwrap_err();
        assert!(matches!(err, CoreError::LevelOutOfRange { .. }));
    }

    #[test]
    fn buffer_too_small_is_rejected() {
        let cache = Rc::new(RefCell::new(TileCache::new(4)));
        let mut view = open(&cache, InMemorySlide::new(512, 512, 1), 0, 0);
        let mut out = vec![0u8; 2];
        let err = view
            .read_region(0, 0, 0, 1, 1, &Affine::IDENTITY, &mut out)
            .unwrap_err();
        assert!(matches!(err, CoreError::BufferTooSmall { .. }));
    }

    #[test]
    fn dropping_view_evicts_its_tiles_from_shared_cache() {
        let cache = Rc::new(RefCell::new(TileCache::new(16)));
        {
            let mut view = open(&cache, InMemorySlide::new(2048, 2048, 3), 0, 0);
            let mut out = vec![0u8; 4 * 16 * 16];
            view.read_region(0, 0, 0, 16, 16, &Affine::IDENTITY, &mut out)
                .unwrap();
            assert!(!cache.borrow().is_empty());
        }
        assert!(cache.borrow().is_empty());
    }
}
