//! Backend trait and result types.

use crate::reconstruct::render_flat;
use crate::{Position, Result, Rgb};

/// Result of assigning an image's pixels to Voronoi cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoronoiResult {
    /// Owning site for each pixel (row-major order)
    pub cell_of: Vec<u32>,
    /// Rounded average color for each site
    pub cell_colors: Vec<Rgb>,
    /// Area (pixel count) for each site
    pub cell_areas: Vec<u32>,
    /// Image dimensions
    pub width: u32,
    pub height: u32,
}

impl VoronoiResult {
    /// Render the flat-shaded reconstruction to an RGB buffer
    pub fn render(&self) -> Vec<u8> {
        self.to_image().into_raw()
    }

    /// Render the flat-shaded reconstruction to an image::RgbImage
    pub fn to_image(&self) -> image::RgbImage {
        render_flat(&self.cell_of, &self.cell_colors, self.width, self.height)
    }

    /// Pixel indices owned by `site`.
    pub fn cell(&self, site: u32) -> impl Iterator<Item = usize> + '_ {
        self.cell_of
            .iter()
            .enumerate()
            .filter(move |(_, &owner)| owner == site)
            .map(|(i, _)| i)
    }
}

/// Trait for Voronoi computation backends
pub trait ComputeBackend {
    /// Assign every pixel of `image` to its nearest site and average the cells
    fn compute(
        &mut self,
        image: &image::RgbImage,
        sites: &[Position],
    ) -> Result<VoronoiResult>;
}
