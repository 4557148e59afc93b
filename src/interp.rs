//! Bilinear interpolation over a packed RGBA buffer.
//!
//! Bound to a single image buffer of size `width * height` (4 bytes per
//! pixel). [`interpolate`] samples at a fractional `(u, v)` index and
//! classifies the sample as [`Status::Inside`], [`Status::Border`], or
//! [`Status::Outside`]; only `Outside` should trigger re-resolution by a
//! caller that walks across tiles.

/// Classification of a bilinear sample relative to the bound image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// All four taps fall inside the image.
    Inside,
    /// At least one tap falls outside the image, but the sample point
    /// itself is still adjacent to valid data (missing taps read as zero).
    Border,
    /// The sample point is too far outside the image to interpolate at all.
    Outside,
}

/// A borrowed view over a packed RGBA buffer that can be bilinearly sampled.
///
/// This is constructed fresh for each sampling burst rather than stored
/// alongside the buffer it borrows, sidestepping the self-referential
/// pointer the reference implementation uses (see `DESIGN.md`).
#[derive(Debug, Clone, Copy)]
pub struct Interpolator<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> Interpolator<'a> {
    /// Bind an interpolator to an RGBA buffer of the given dimensions.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() < width * height * 4`.
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Self {
        assert!(
            data.len() >= width as usize * height as usize * 4,
            "interpolator buffer too small for stated dimensions"
        );
        Self {
            data,
            width,
            height,
        }
    }

    fn texel(&self, i: i64, j: i64) -> [f32; 4] {
        if i < 0 || j < 0 || i >= self.width as i64 || j >= self.height as i64 {
            return [0.0; 4];
        }
        let idx = 4 * (j as usize * self.width as usize + i as usize);
        [
            self.data[idx] as f32,
            self.data[idx + 1] as f32,
            self.data[idx + 2] as f32,
            self.data[idx + 3] as f32,
        ]
    }

    /// Sample the bound image at fractional index `(u, v)`.
    pub fn interpolate(&self, u: f32, v: f32) -> ([f32; 4], Status) {
        let i = u.floor() as i64;
        let j = v.floor() as i64;
        let fu = u - i as f32;
        let fv = v - j as f32;

        let w = self.width as i64;
        let h = self.height as i64;

        if i + 1 < 0 || j + 1 < 0 || i >= w || j >= h {
            return ([0.0; 4], Status::Outside);
        }

        let status = if i >= 0 && j >= 0 && i + 1 < w && j + 1 < h {
            Status::Inside
        } else {
            Status::Border
        };

        let p00 = self.texel(i, j);
        let p10 = self.texel(i + 1, j);
        let p01 = self.texel(i, j + 1);
        let p11 = self.texel(i + 1, j + 1);

        let mut out = [0.0f32; 4];
        for c in 0..4 {
            let top = p00[c] * (1.0 - fu) + p10[c] * fu;
            let bottom = p01[c] * (1.0 - fu) + p11[c] * fu;
            out[c] = top * (1.0 - fv) + bottom * fv;
        }
        (out, status)
    }
}
