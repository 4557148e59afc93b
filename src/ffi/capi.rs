//! `extern "C"` operation table: the foreign-call surface a host language
//! binds against, one call per core operation, errors reported by sentinel
//! return value since `CoreError` cannot cross the FFI boundary.
//!
//! This mirrors the shape of the original C source's Python-capsule
//! boundary (`os_affine_api.h` in the supplementary material) without
//! reproducing its `PyArg_ParseTuple` marshalling, which is out of scope
//! here. Only [`crate::slide::InMemorySlide`] backs `wsi_slide_open` — this
//! crate implements no real slide-format parser, so `path` is read as a
//! `mock:WxHxL` descriptor rather than a filesystem path.

use std::cell::RefCell;
use std::ffi::CStr;
use std::os::raw::c_char;
use std::rc::Rc;

use tracing::error;

use crate::affine::Affine;
use crate::cache::TileCache;
use crate::slide::{InMemorySlide, SlideReader, SlideView};

use super::handle::{Handle, HandleStore};

/// Status codes returned across the `extern "C"` boundary. `Ok` is always
/// `0`; every other variant mirrors one [`crate::error::CoreError`] case.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsiStatus {
    Ok = 0,
    InvalidHandle = -1,
    SlideOpenFailed = -2,
    LevelOutOfRange = -3,
    BufferTooSmall = -4,
    ResampleOutOfRange = -5,
    ReaderIoError = -6,
}

type BoxedSlide = SlideView<Box<dyn SlideReader>>;

thread_local! {
    static CACHES: HandleStore<Rc<RefCell<TileCache>>> = HandleStore::new();
    static SLIDES: HandleStore<BoxedSlide> = HandleStore::new();
}

/// Parse a `mock:WIDTHxHEIGHTxLEVELS` descriptor into an [`InMemorySlide`].
/// The only "source" this crate can open, since it carries no real slide
/// format reader.
fn parse_mock_uri(s: &str) -> Option<InMemorySlide> {
    InMemorySlide::parse(s.strip_prefix("mock:")?)
}

#[unsafe(no_mangle)]
pub extern "C" fn wsi_cache_new(max_tiles: u32) -> Handle {
    if max_tiles == 0 {
        return 0;
    }
    CACHES.with(|store| store.insert(Rc::new(RefCell::new(TileCache::new(max_tiles)))))
}

#[unsafe(no_mangle)]
pub extern "C" fn wsi_cache_free(cache: Handle) {
    CACHES.with(|store| {
        store.remove(cache);
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn wsi_slide_open(
    cache: Handle,
    path: *const c_char,
    canvas_x: i64,
    canvas_y: i64,
) -> Handle {
    if path.is_null() {
        return 0;
    }
    let path = unsafe { CStr::from_ptr(path) }.to_string_lossy().into_owned();

    let Some(cache_rc) = CACHES.with(|store| store.get_clone(cache)) else {
        error!(cache, "wsi_slide_open: unknown cache handle");
        return 0;
    };

    let Some(slide) = parse_mock_uri(&path) else {
        error!(path = %path, "wsi_slide_open: unsupported source (only mock:WxHxL is implemented)");
        return 0;
    };
    let reader: Box<dyn SlideReader> = Box::new(slide);

    match SlideView::open(cache_rc, reader, canvas_x.max(0) as u64, canvas_y.max(0) as u64) {
        Ok(view) => SLIDES.with(|store| store.insert(view)),
        Err(err) => {
            error!(%err, "wsi_slide_open failed");
            0
        }
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn wsi_slide_close(slide: Handle) {
    SLIDES.with(|store| {
        store.remove(slide);
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn wsi_slide_level_count(slide: Handle) -> i32 {
    SLIDES
        .with(|store| store.with(slide, |view| view.level_count() as i32))
        .unwrap_or(-1)
}

#[unsafe(no_mangle)]
pub extern "C" fn wsi_slide_level_downsample(slide: Handle, level: i32) -> f64 {
    if level < 0 {
        return -1.0;
    }
    SLIDES
        .with(|store| store.with(slide, |view| view.level_downsample(level as u32)))
        .flatten()
        .unwrap_or(-1.0)
}

#[unsafe(no_mangle)]
pub extern "C" fn wsi_slide_level_dimensions(
    slide: Handle,
    level: i32,
    w: *mut i64,
    h: *mut i64,
) -> i32 {
    if level < 0 {
        return WsiStatus::LevelOutOfRange as i32;
    }
    let dims = SLIDES.with(|store| store.with(slide, |view| view.level_dimensions(level as u32)));
    match dims.flatten() {
        Some((width, height)) => {
            if !w.is_null() {
                unsafe { *w = width as i64 };
            }
            if !h.is_null() {
                unsafe { *h = height as i64 };
            }
            WsiStatus::Ok as i32
        }
        None => WsiStatus::LevelOutOfRange as i32,
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn wsi_slide_best_level(slide: Handle, downsample: f64) -> i32 {
    SLIDES
        .with(|store| store.with(slide, |view| view.best_level_for_downsample(downsample) as i32))
        .unwrap_or(-1)
}

/// `a` points to 6 row-major doubles: `[A00, A01, A02, A10, A11, A12]`
/// (row 2 of the affine, `[0, 0, 1]`, is implicit).
#[unsafe(no_mangle)]
pub extern "C" fn wsi_slide_read_region(
    slide: Handle,
    lx: i64,
    ly: i64,
    level: i32,
    w: i64,
    h: i64,
    a: *const f64,
    buf: *mut u8,
    buf_len: usize,
) -> i32 {
    if level < 0 || w <= 0 || h <= 0 || a.is_null() || buf.is_null() {
        return WsiStatus::InvalidHandle as i32;
    }
    let coeffs = unsafe { std::slice::from_raw_parts(a, 6) };
    let affine = Affine::new([
        [coeffs[0], coeffs[1], coeffs[2]],
        [coeffs[3], coeffs[4], coeffs[5]],
        [0.0, 0.0, 1.0],
    ]);
    let out = unsafe { std::slice::from_raw_parts_mut(buf, buf_len) };

    let result = SLIDES.with(|store| {
        store.with(slide, |view| {
            view.read_region(level as u32, lx, ly, w, h, &affine, out)
        })
    });

    match result {
        None => WsiStatus::InvalidHandle as i32,
        Some(Ok(())) => WsiStatus::Ok as i32,
        Some(Err(err)) => status_for(&err) as i32,
    }
}

fn status_for(err: &crate::error::CoreError) -> WsiStatus {
    use crate::error::CoreError::*;
    match err {
        SlideOpenFailed { .. } => WsiStatus::SlideOpenFailed,
        LevelOutOfRange { .. } => WsiStatus::LevelOutOfRange,
        BufferTooSmall { .. } => WsiStatus::BufferTooSmall,
        ResampleOutOfRange { .. } => WsiStatus::ResampleOutOfRange,
        ReaderIoError(_) => WsiStatus::ReaderIoError,
    }
}
