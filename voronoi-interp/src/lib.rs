//! Image interpolation from sparse sites.
//!
//! Every pixel takes the average color of the Voronoi cell it falls in. Cells
//! are found through a Delaunay triangulation of the sites instead of a scan
//! over all sites, and pixel sweeps run in parallel bands (Rayon) with
//! per-band statistics merged once.

mod accumulate;
mod backend;
mod locate;
mod predicates;
mod reconstruct;
mod site;
mod triangulation;
mod voronoi;

pub use accumulate::{accumulate, tally, CellStats, BAND_ROWS};
pub use backend::{BruteForceBackend, DelaunayBackend};
pub use locate::SiteLocator;
pub use predicates::{in_circle, orientation, CirclePosition, Orientation};
pub use reconstruct::{render_barycentric, render_flat, Shading};
pub use site::{random_sites, Position, MAX_DIMENSION};
pub use triangulation::{Shape, Triangulation};
pub use voronoi::{ComputeBackend, VoronoiResult};

/// RGB color tuple
pub type Rgb = [u8; 3];

/// Error type for Voronoi operations
#[derive(Debug, thiserror::Error)]
pub enum VoronoiError {
    #[error("No sites provided")]
    NoSites,

    #[error("Site {index} at ({x}, {y}) is outside the {width}x{height} image")]
    SiteOutOfBounds {
        index: usize,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("Expected 3 color channels, got {0}")]
    ChannelCount(usize),

    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Image size {width}x{height} exceeds the {max} pixel limit per side")]
    ImageTooLarge { width: u32, height: u32, max: u32 },

    #[cfg(feature = "parallel")]
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, VoronoiError>;

/// Replace every pixel of `image` with the average color of its site's cell.
///
/// Ties between equidistant sites go to the lowest site index. Fails before
/// allocating anything if `sites` is empty or a site lies outside the image.
pub fn interpolate(image: &image::RgbImage, sites: &[Position]) -> Result<image::RgbImage> {
    DelaunayBackend::new().interpolate(image, sites)
}

/// [`interpolate`] over a raw row-major pixel buffer.
pub fn interpolate_raw(
    pixels: &[u8],
    width: u32,
    height: u32,
    channels: usize,
    sites: &[Position],
) -> Result<Vec<u8>> {
    if channels != 3 {
        return Err(VoronoiError::ChannelCount(channels));
    }
    let expected = width as usize * height as usize * 3;
    if pixels.len() != expected {
        return Err(VoronoiError::BufferSize {
            expected,
            actual: pixels.len(),
        });
    }
    site::validate(width, height, sites)?;
    let image = image::RgbImage::from_raw(width, height, pixels.to_vec()).ok_or(
        VoronoiError::BufferSize {
            expected,
            actual: pixels.len(),
        },
    )?;
    interpolate(&image, sites).map(image::RgbImage::into_raw)
}
