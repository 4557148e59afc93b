//! Error taxonomy for the tile-cached affine resampler.

use thiserror::Error;

/// Errors surfaced by the core resampler and its external interface.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The slide reader rejected the path given to `SlideView::open`.
    #[error("failed to open slide at {path:?}: {source}")]
    SlideOpenFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// `level` is negative or `>= level_count`.
    #[error("level {level} out of range (slide has {level_count} levels)")]
    LevelOutOfRange { level: i64, level_count: u32 },

    /// The caller's output buffer is shorter than `4 * w * h`.
    #[error("output buffer too small: need {required} bytes, got {actual}")]
    BufferTooSmall { required: usize, actual: usize },

    /// A mid-row re-resolution still reported the destination pixel as
    /// outside the freshly selected tile. Indicates a pyramid inconsistency
    /// or a pathological affine matrix; the output buffer is left partially
    /// written.
    #[error(
        "unable to place destination pixel ({dst_x}, {dst_y}) at level {level} in tile ({tile_x}, {tile_y})"
    )]
    ResampleOutOfRange {
        dst_x: i64,
        dst_y: i64,
        level: u32,
        tile_x: i64,
        tile_y: i64,
    },

    /// The slide reader's `read_region` call failed.
    #[error("slide reader I/O error: {0}")]
    ReaderIoError(#[source] Box<dyn std::error::Error + Send + Sync>),
}
