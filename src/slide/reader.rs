//! `SlideReader`: the interface this crate expects of an external
//! whole-slide-image reading collaborator (e.g. a binding over
//! `libopenslide`). This crate does not implement it for any real format —
//! only [`super::mock::InMemorySlide`] exists, for tests and the demo CLI.

/// Format-agnostic, opaque handle to an open whole-slide image.
///
/// Mirrors the external interface described by the specification: level
/// metadata queries plus a single pixel-region read. Implementations are
/// expected to be synchronous and may block on I/O; the core treats every
/// call as run-to-completion.
pub trait SlideReader {
    /// Number of pyramid levels, `L`. Level 0 is full resolution.
    fn level_count(&self) -> u32;

    /// Dimensions of `level` in level-`level` pixels, or `None` if
    /// `level >= level_count()`.
    fn level_dimensions(&self, level: u32) -> Option<(u32, u32)>;

    /// Downsample factor for `level` relative to level 0. `ds(0) == 1.0`;
    /// monotonically non-decreasing in `level`. `None` if out of range.
    fn level_downsample(&self, level: u32) -> Option<f64>;

    /// Index of the lowest-resolution level whose downsample does not
    /// exceed `downsample`, i.e. the best level to sample from without
    /// upsampling past what was requested.
    fn best_level_for_downsample(&self, downsample: f64) -> u32;

    /// Fill `dst` (row-major packed RGBA, `w * h * 4` bytes) with the pixels
    /// of `level` covering `[x, x + w*ds) x [y, y + h*ds)` in level-0 units,
    /// where `ds = level_downsample(level)`. `(x, y)` are level-0
    /// coordinates; `(w, h)` are level-`level` pixel counts.
    ///
    /// `dst.len()` is guaranteed to be exactly `4 * w * h` by the caller.
    fn read_region(
        &self,
        dst: &mut [u8],
        x: i64,
        y: i64,
        level: u32,
        w: u32,
        h: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: SlideReader + ?Sized> SlideReader for Box<T> {
    fn level_count(&self) -> u32 {
        (**self).level_count()
    }

    fn level_dimensions(&self, level: u32) -> Option<(u32, u32)> {
        (**self).level_dimensions(level)
    }

    fn level_downsample(&self, level: u32) -> Option<f64> {
        (**self).level_downsample(level)
    }

    fn best_level_for_downsample(&self, downsample: f64) -> u32 {
        (**self).best_level_for_downsample(downsample)
    }

    fn read_region(
        &self,
        dst: &mut [u8],
        x: i64,
        y: i64,
        level: u32,
        w: u32,
        h: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_region(dst, x, y, level, w, h)
    }
}
