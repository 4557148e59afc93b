//! Configuration for the `wsi-affine` demo binary.
//!
//! This module provides a small configuration layer in the same shape as
//! the teacher crate's: command-line arguments via `clap`, environment
//! variable overrides with a `WSI_` prefix, sensible defaults.
//!
//! # Environment Variables
//!
//! - `WSI_SLIDE` - source slide descriptor (default: `mock:4096x4096x6`)
//! - `WSI_LEVEL` - pyramid level to sample (default: 0)
//! - `WSI_CACHE_TILES` - max tiles kept resident (default: 64)
//! - `WSI_REGION_X` / `WSI_REGION_Y` - region top-left, level-0 units

use clap::Parser;

/// Default number of tiles kept resident in the shared cache.
pub const DEFAULT_CACHE_TILES: u32 = 64;

/// Default region width/height, in level pixels.
pub const DEFAULT_REGION_SIDE: i64 = 512;

/// `wsi-affine` - sample a region of a whole-slide image through an affine
/// transform, using a tile-cached bilinear resampler.
#[derive(Parser, Debug, Clone)]
#[command(name = "wsi-affine")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Source slide, as `mock:WIDTHxHEIGHTxLEVELS`.
    ///
    /// This crate carries no real slide-format parser; `InMemorySlide` is a
    /// deterministic synthetic stand-in.
    #[arg(long, default_value = "mock:4096x4096x6", env = "WSI_SLIDE")]
    pub slide: String,

    /// Pyramid level to sample from.
    #[arg(long, default_value_t = 0, env = "WSI_LEVEL")]
    pub level: u32,

    /// Maximum number of tiles kept resident in the shared cache.
    #[arg(long, default_value_t = DEFAULT_CACHE_TILES, env = "WSI_CACHE_TILES")]
    pub cache_tiles: u32,

    /// Destination-canvas X of the region's top-left corner (level-0 units).
    #[arg(long, default_value_t = 0, env = "WSI_REGION_X")]
    pub region_x: i64,

    /// Destination-canvas Y of the region's top-left corner (level-0 units).
    #[arg(long, default_value_t = 0, env = "WSI_REGION_Y")]
    pub region_y: i64,

    /// Region width, in `level` pixels.
    #[arg(long, default_value_t = DEFAULT_REGION_SIDE)]
    pub width: i64,

    /// Region height, in `level` pixels.
    #[arg(long, default_value_t = DEFAULT_REGION_SIDE)]
    pub height: i64,

    /// Row-major affine coefficients `a00,a01,a02,a10,a11,a12`.
    ///
    /// Defaults to the identity transform when omitted.
    #[arg(long, value_delimiter = ',', num_args = 6)]
    pub affine: Option<Vec<f64>>,

    /// Path to write the sampled region to, as a binary PPM (P6) file.
    #[arg(long, default_value = "region.ppm")]
    pub output: std::path::PathBuf,

    /// Enable verbose (debug level) logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_tiles == 0 {
            return Err("cache_tiles must be greater than 0".to_string());
        }
        if self.width <= 0 || self.height <= 0 {
            return Err("width and height must be positive".to_string());
        }
        if let Some(ref coeffs) = self.affine {
            if coeffs.len() != 6 {
                return Err(format!(
                    "affine must have exactly 6 coefficients, got {}",
                    coeffs.len()
                ));
            }
        }
        Ok(())
    }

    /// Build the affine transform this configuration describes, or the
    /// identity transform if none was given.
    pub fn affine_matrix(&self) -> crate::affine::Affine {
        match &self.affine {
            Some(c) => crate::affine::Affine::new([
                [c[0], c[1], c[2]],
                [c[3], c[4], c[5]],
                [0.0, 0.0, 1.0],
            ]),
            None => crate::affine::Affine::IDENTITY,
        }
    }
}
