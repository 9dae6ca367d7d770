//! WASM bindings for voronoi-interp.
//!
//! Pixel data crosses the boundary as flat RGBA arrays (the `ImageData`
//! layout); sites as flat `[x0, y0, x1, y1, ...]` arrays.

use wasm_bindgen::prelude::*;
use voronoi_interp::{DelaunayBackend, Position, Shading};

#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Convert RGBA pixel data to an `image::RgbImage`, dropping alpha.
fn rgba_to_rgb_image(rgba: &[u8], width: u32, height: u32) -> Result<image::RgbImage, JsError> {
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(JsError::new(&format!(
            "RGBA buffer holds {} bytes, expected {}",
            rgba.len(),
            expected
        )));
    }
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for pixel in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&pixel[..3]);
    }
    image::RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| JsError::new("buffer size mismatch"))
}

/// Expand RGB back to opaque RGBA.
fn rgb_to_rgba(rgb: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(rgb.len() / 3 * 4);
    for pixel in rgb.chunks_exact(3) {
        rgba.extend_from_slice(pixel);
        rgba.push(255);
    }
    rgba
}

fn parse_sites(sites_xy: &[u32]) -> Result<Vec<Position>, JsError> {
    if sites_xy.len() % 2 != 0 {
        return Err(JsError::new("site coordinates must come in x, y pairs"));
    }
    Ok(sites_xy.chunks_exact(2)
        .map(|xy| Position::new(xy[0], xy[1]))
        .collect())
}

/// Rebuild an RGBA image from the Voronoi cell averages of `sites_xy`.
/// The returned buffer is opaque RGBA with the input's dimensions.
#[wasm_bindgen]
pub fn interpolate_rgba(
    rgba: &[u8],
    width: u32,
    height: u32,
    sites_xy: &[u32],
    barycentric: bool,
) -> Result<Vec<u8>, JsError> {
    let image = rgba_to_rgb_image(rgba, width, height)?;
    let sites = parse_sites(sites_xy)?;
    let shading = if barycentric { Shading::Barycentric } else { Shading::Flat };
    let out = DelaunayBackend::new()
        .with_shading(shading)
        .interpolate(&image, &sites)?;
    Ok(rgb_to_rgba(out.as_raw()))
}

/// Seeded random sites as flat `[x0, y0, x1, y1, ...]`.
#[wasm_bindgen]
pub fn random_sites(count: usize, width: u32, height: u32, seed: u32) -> Vec<u32> {
    voronoi_interp::random_sites(count, width, height, seed as u64)
        .iter()
        .flat_map(|p| [p.x, p.y])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_round_trip_drops_alpha() {
        let rgba = [10, 20, 30, 0, 40, 50, 60, 128];
        let Ok(image) = rgba_to_rgb_image(&rgba, 2, 1) else {
            panic!("conversion failed");
        };
        assert_eq!(image.as_raw(), &vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(rgb_to_rgba(image.as_raw()), vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn test_random_sites_are_flat_pairs() {
        let flat = random_sites(25, 30, 20, 3);
        assert_eq!(flat.len(), 50);
        for xy in flat.chunks_exact(2) {
            assert!(xy[0] < 30 && xy[1] < 20);
        }
    }
}
