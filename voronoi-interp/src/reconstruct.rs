//! Writing cell averages back into an output raster.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::accumulate::BAND_ROWS;
use crate::locate::SiteLocator;
use crate::predicates::cross;
use crate::triangulation::Triangulation;
use crate::{Position, Rgb};

/// How a pixel's color is derived from the cell averages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Shading {
    /// The average color of the pixel's own cell.
    #[default]
    Flat,
    /// Barycentric blend of the averages of the three sites of the Delaunay
    /// triangle containing the pixel. Pixels outside the hull stay flat.
    Barycentric,
}

/// Paint every pixel with the color of the site that owns it.
pub fn render_flat(cell_of: &[u32], colors: &[Rgb], width: u32, height: u32) -> image::RgbImage {
    let mut out = image::RgbImage::new(width, height);

    #[cfg(feature = "parallel")]
    out.par_chunks_mut(3)
        .zip(cell_of.par_iter())
        .for_each(|(pixel, &site)| pixel.copy_from_slice(&colors[site as usize]));

    #[cfg(not(feature = "parallel"))]
    out.chunks_mut(3)
        .zip(cell_of)
        .for_each(|(pixel, &site)| pixel.copy_from_slice(&colors[site as usize]));

    out
}

/// Paint every pixel with the barycentric blend of its triangle's averages.
pub fn render_barycentric(
    mesh: &Triangulation,
    cell_of: &[u32],
    colors: &[Rgb],
    width: u32,
    height: u32,
) -> image::RgbImage {
    let mut out = image::RgbImage::new(width, height);
    let band_len = (BAND_ROWS * width as usize * 3).max(3);

    let shade_band = |(band, pixels): (usize, &mut [u8])| {
        let mut locator = SiteLocator::new(mesh);
        let first_pixel = band * band_len / 3;
        for (offset, pixel) in pixels.chunks_exact_mut(3).enumerate() {
            let index = first_pixel + offset;
            let p = Position::new(index as u32 % width, index as u32 / width);
            let color = match locator.locate_triangle(p) {
                Some(triangle) => blend(mesh, triangle, &p, colors),
                None => colors[cell_of[index] as usize],
            };
            pixel.copy_from_slice(&color);
        }
    };

    #[cfg(feature = "parallel")]
    out.par_chunks_mut(band_len).enumerate().for_each(shade_band);

    #[cfg(not(feature = "parallel"))]
    out.chunks_mut(band_len).enumerate().for_each(shade_band);

    out
}

fn blend(mesh: &Triangulation, [a, b, c]: [u32; 3], p: &Position, colors: &[Rgb]) -> Rgb {
    let (pa, pb, pc) = (mesh.position(a), mesh.position(b), mesh.position(c));
    let area = cross(&pa, &pb, &pc) as f64;
    let weights = [
        cross(p, &pb, &pc) as f64 / area,
        cross(&pa, p, &pc) as f64 / area,
        cross(&pa, &pb, p) as f64 / area,
    ];
    let (ca, cb, cc) = (colors[a as usize], colors[b as usize], colors[c as usize]);
    let channel = |i: usize| {
        let value = weights[0] * ca[i] as f64 + weights[1] * cb[i] as f64 + weights[2] * cc[i] as f64;
        value.round().clamp(0.0, 255.0) as u8
    };
    [channel(0), channel(1), channel(2)]
}
