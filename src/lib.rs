//! # wsi-affine
//!
//! A tile-cached affine resampler for whole-slide histology images.
//!
//! Given an open pyramidal whole-slide image and an arbitrary 3x3 affine
//! transform, this crate samples an output raster from the slide at any
//! requested pyramid level, loading only the tiles the requested region
//! actually touches, and caching decoded tiles (bounded, LRU, shared across
//! every open slide) so repeated or adjacent reads amortize their I/O.
//!
//! ## Architecture
//!
//! - [`affine`] - the 3x3 transform mapping destination-canvas points to
//!   source-slide points
//! - [`interp`] - bilinear interpolation over a single tile's pixel buffer
//! - [`tile`] - a decoded tile buffer and its cache coordinate key
//! - [`cache`] - the bounded LRU registry of resident tiles
//! - [`slide`] - `SlideReader` (the external slide-format collaborator this
//!   crate expects) and `SlideView` (the `FindTile`/`ReadRegion` resampler)
//! - [`error`] - the error taxonomy surfaced by the core and its FFI layer
//! - [`ffi`] - the `extern "C"` operation table for non-Rust callers
//! - [`config`] - CLI configuration for the demo binary
//!
//! This crate does not parse any real slide file format (Aperio SVS,
//! pyramidal TIFF, etc.) — that is an explicit non-goal. [`slide::InMemorySlide`]
//! is a deterministic synthetic reader used by the demo binary and test
//! suite in place of a real format backend.

pub mod affine;
pub mod cache;
pub mod config;
pub mod error;
pub mod ffi;
pub mod interp;
pub mod slide;
pub mod tile;

pub use affine::Affine;
pub use cache::TileCache;
pub use config::Config;
pub use error::CoreError;
pub use interp::{Interpolator, Status};
pub use slide::{CountingReader, InMemorySlide, SlideReader, SlideView};
pub use tile::{Tile, TileRef, OVERHANG, TILESIZE, TILE_BUFFER_SIDE};
