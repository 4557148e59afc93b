//! wsi-affine - sample a region of a whole-slide image through an affine
//! transform, using a tile-cached bilinear resampler, and write it out as a
//! PPM image.

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsi_affine::{
    config::Config,
    slide::{CountingReader, InMemorySlide, SlideView},
    TileCache,
};

fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("configuration error: {e}");
        return ExitCode::FAILURE;
    }

    print_banner();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), String> {
    let descriptor = config
        .slide
        .strip_prefix("mock:")
        .ok_or_else(|| format!("unsupported slide source {:?} (only mock:WxHxL is implemented)", config.slide))?;
    let slide = InMemorySlide::parse(descriptor)
        .ok_or_else(|| format!("malformed slide descriptor {:?}", config.slide))?;

    info!(slide = %config.slide, level = config.level, cache_tiles = config.cache_tiles, "opening slide");

    let cache = Rc::new(RefCell::new(TileCache::new(config.cache_tiles)));
    let reader = CountingReader::new(slide);
    let mut view = SlideView::open(Rc::clone(&cache), reader, 0, 0).map_err(|e| e.to_string())?;

    let (width, height) = (config.width, config.height);
    let mut buf = vec![0u8; 4 * width as usize * height as usize];
    view.read_region(
        config.level,
        config.region_x,
        config.region_y,
        width,
        height,
        &config.affine_matrix(),
        &mut buf,
    )
    .map_err(|e| e.to_string())?;

    write_ppm(&config.output, width as u32, height as u32, &buf).map_err(|e| e.to_string())?;

    info!(
        path = %config.output.display(),
        tiles_loaded = view_call_count(&cache),
        "wrote region"
    );

    Ok(())
}

/// Tiles resident in the shared cache after the read, a rough proxy for how
/// much work the resampler actually did.
fn view_call_count(cache: &Rc<RefCell<TileCache>>) -> usize {
    cache.borrow().len()
}

/// Write `rgba` (packed, `width * height * 4` bytes) as a binary PPM (P6),
/// dropping the alpha channel.
fn write_ppm(path: &std::path::Path, width: u32, height: u32, rgba: &[u8]) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    write!(out, "P6\n{width} {height}\n255\n")?;
    for px in rgba.chunks_exact(4) {
        out.write_all(&px[0..3])?;
    }
    out.flush()
}

fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("wsi-affine v{version} - tile-cached affine resampler");
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "wsi_affine=debug"
    } else {
        "wsi_affine=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
