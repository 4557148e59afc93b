//! A single decoded tile buffer and its cache coordinate key.

use crate::interp::Interpolator;

/// Fixed grid-cell side length, in pixels at the owning level, before the
/// overhang halo is added.
pub const TILESIZE: u32 = 512;

/// Halo width, in pixels, added on every side of a tile so bilinear sampling
/// near a tile seam never needs data from a neighboring tile.
pub const OVERHANG: u32 = 2;

/// The side length, in pixels, of a tile's backing buffer:
/// `TILESIZE + 2 * OVERHANG`.
pub const TILE_BUFFER_SIDE: u32 = TILESIZE + 2 * OVERHANG;

/// Coordinate identifying one resident tile: which slide, which pyramid
/// level, which grid cell.
///
/// This is a plain value key rather than a pointer, so the cache can refer
/// to a tile without holding a back-reference into the `SlideView` that
/// owns it (see `DESIGN.md` on breaking the cache/slide ownership cycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileRef {
    pub slide_id: u64,
    pub level: u32,
    pub ti_x: u32,
    pub ti_y: u32,
}

/// A decoded `(TILESIZE + 2*OVERHANG)^2` RGBA tile buffer plus its LRU
/// timestamp.
///
/// The tile does not hold a bound interpolator — instead,
/// [`Tile::interpolator`] constructs one transiently, borrowing the buffer
/// for the duration of a single sampling call. This avoids the
/// self-referential pointer the reference implementation uses, at the cost
/// of a cheap re-construction per tile lookup rather than per pixel.
#[derive(Debug)]
pub struct Tile {
    pub(crate) buffer: Vec<u8>,
    pub(crate) side: u32,
    pub timestamp: u64,
}

impl Tile {
    /// Allocate a zeroed tile of side `TILE_BUFFER_SIDE`.
    pub fn new_zeroed(timestamp: u64) -> Self {
        let side = TILE_BUFFER_SIDE;
        Self {
            buffer: vec![0u8; side as usize * side as usize * 4],
            side,
            timestamp,
        }
    }

    /// Raw mutable buffer for the slide reader to fill via `read_region`.
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Bind a transient interpolator over this tile's buffer.
    pub fn interpolator(&self) -> Interpolator<'_> {
        Interpolator::new(&self.buffer, self.side, self.side)
    }
}
