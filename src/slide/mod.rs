//! Slide abstraction layer: the format-agnostic [`SlideReader`] trait
//! expected of an external slide-reader collaborator, and [`SlideView`],
//! the tile-cached affine resampler bound to one open slide.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │               SlideView                 │
//! │   FindTile / ReadRegion (this crate)     │
//! └────────────────────┬────────────────────┘
//!                      │ shares
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │               TileCache                 │
//! └────────────────────┬────────────────────┘
//!                      │ loads via
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          SlideReader (external)          │
//! │  level_count / level_dimensions / ...    │
//! │  read_region                             │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The real slide-reader implementation (parsing Aperio SVS, pyramidal
//! TIFF, talking to `libopenslide`, or anything else) is out of scope for
//! this crate, per the specification; [`mock::InMemorySlide`] is a
//! deterministic stand-in used by the demo binary and the test suite.

mod mock;
mod reader;
mod view;

pub use mock::{CallLog, CountingReader, InMemorySlide};
pub use reader::SlideReader;
pub use view::SlideView;
