//! CPU backends: the triangulation-driven engine and a brute-force reference.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::accumulate::{accumulate, tally};
use crate::reconstruct::{render_barycentric, Shading};
use crate::site::validate;
use crate::triangulation::Triangulation;
use crate::voronoi::ComputeBackend;
use crate::{Position, Result, VoronoiResult};

/// Backend locating pixels through a Delaunay triangulation of the sites
#[derive(Debug, Clone, Default)]
pub struct DelaunayBackend {
    /// Number of threads to use (0 = Rayon default)
    pub num_threads: usize,
    /// Output shading used by [`DelaunayBackend::interpolate`]
    pub shading: Shading,
}

impl DelaunayBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Self::default()
        }
    }

    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }

    /// Reconstruct `image` from the cell averages of `sites`.
    ///
    /// The output has the dimensions of the input. Inputs are validated
    /// before any work is done.
    pub fn interpolate(
        &mut self,
        image: &image::RgbImage,
        sites: &[Position],
    ) -> Result<image::RgbImage> {
        validate(image.width(), image.height(), sites)?;
        let shading = self.shading;
        self.run(|| {
            let mesh = Triangulation::new(sites)?;
            let result = Self::assign(image, &mesh);
            Ok(match shading {
                Shading::Flat => result.to_image(),
                Shading::Barycentric => render_barycentric(
                    &mesh,
                    &result.cell_of,
                    &result.cell_colors,
                    result.width,
                    result.height,
                ),
            })
        })
    }

    fn assign(image: &image::RgbImage, mesh: &Triangulation) -> VoronoiResult {
        let (cell_of, stats) = accumulate(image, mesh);
        VoronoiResult {
            cell_of,
            cell_colors: stats.colors(),
            cell_areas: stats.counts,
            width: image.width(),
            height: image.height(),
        }
    }

    #[cfg(feature = "parallel")]
    fn run<T: Send>(&self, job: impl FnOnce() -> Result<T> + Send) -> Result<T> {
        if self.num_threads == 0 {
            return job();
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()?
            .install(job)
    }

    #[cfg(not(feature = "parallel"))]
    fn run<T>(&self, job: impl FnOnce() -> Result<T>) -> Result<T> {
        job()
    }
}

impl ComputeBackend for DelaunayBackend {
    fn compute(
        &mut self,
        image: &image::RgbImage,
        sites: &[Position],
    ) -> Result<VoronoiResult> {
        validate(image.width(), image.height(), sites)?;
        self.run(|| {
            let mesh = Triangulation::new(sites)?;
            Ok(Self::assign(image, &mesh))
        })
    }
}

/// Backend scanning every site for every pixel.
///
/// O(pixels x sites); the reference the triangulation is checked against.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceBackend;

impl BruteForceBackend {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn nearest_site(sites: &[Position], p: &Position) -> u32 {
        let mut nearest = 0u32;
        let mut min_dist = u64::MAX;
        for (i, site) in sites.iter().enumerate() {
            let dist = site.dist_sq(p);
            if dist < min_dist {
                min_dist = dist;
                nearest = i as u32;
            }
        }
        nearest
    }

    fn assign_row(sites: &[Position], width: u32, y: u32) -> Vec<u32> {
        (0..width)
            .map(|x| Self::nearest_site(sites, &Position::new(x, y)))
            .collect()
    }
}

impl ComputeBackend for BruteForceBackend {
    fn compute(
        &mut self,
        image: &image::RgbImage,
        sites: &[Position],
    ) -> Result<VoronoiResult> {
        validate(image.width(), image.height(), sites)?;
        let (width, height) = image.dimensions();

        #[cfg(feature = "parallel")]
        let cell_of: Vec<u32> = (0..height)
            .into_par_iter()
            .flat_map_iter(|y| Self::assign_row(sites, width, y))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let cell_of: Vec<u32> = (0..height)
            .flat_map(|y| Self::assign_row(sites, width, y))
            .collect();

        let stats = tally(image, &cell_of, sites.len());
        Ok(VoronoiResult {
            cell_of,
            cell_colors: stats.colors(),
            cell_areas: stats.counts,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{random_sites, VoronoiError};

    fn gradient(w: u32, h: u32) -> image::RgbImage {
        image::RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([(x * 255 / w) as u8, (y * 255 / h) as u8, 128])
        })
    }

    #[test]
    fn test_basic_voronoi() {
        let mut backend = DelaunayBackend::new();
        let image = image::RgbImage::from_pixel(100, 100, image::Rgb([255, 0, 0]));
        let sites = vec![Position::new(25, 25), Position::new(75, 75)];

        let result = backend.compute(&image, &sites).unwrap();

        assert_eq!(result.width, 100);
        assert_eq!(result.height, 100);
        assert_eq!(result.cell_colors, vec![[255, 0, 0], [255, 0, 0]]);

        let total_area: u32 = result.cell_areas.iter().sum();
        assert_eq!(total_area, 10000);
        // The diagonal x + y = 100 is tied and goes to site 0.
        assert_eq!(result.cell_areas[0], 5149);
    }

    /// Verify the triangulation and the full scan produce identical results
    #[test]
    fn test_delaunay_vs_brute_force() {
        let w = 160u32;
        let h = 120u32;
        let img = gradient(w, h);

        for (count, seed) in [(1, 0), (2, 1), (50, 2), (500, 3), (2000, 4)] {
            let sites = random_sites(count, w, h, seed);
            let fast = DelaunayBackend::new().compute(&img, &sites).unwrap();
            let slow = BruteForceBackend::new().compute(&img, &sites).unwrap();
            assert_eq!(fast, slow, "{} sites, seed {}", count, seed);
        }
    }

    #[test]
    fn test_thread_count_does_not_change_output() {
        let img = gradient(200, 90);
        let sites = random_sites(300, 200, 90, 17);
        let a = DelaunayBackend::with_threads(1).interpolate(&img, &sites).unwrap();
        let b = DelaunayBackend::with_threads(3).interpolate(&img, &sites).unwrap();
        let c = DelaunayBackend::new().interpolate(&img, &sites).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_invalid_input_rejected() {
        let img = gradient(10, 10);
        let mut backend = DelaunayBackend::new();
        assert!(matches!(backend.compute(&img, &[]), Err(VoronoiError::NoSites)));
        assert!(matches!(
            backend.interpolate(&img, &[Position::new(10, 0)]),
            Err(VoronoiError::SiteOutOfBounds { index: 0, .. })
        ));
        assert!(matches!(
            BruteForceBackend::new().compute(&img, &[Position::new(0, 10)]),
            Err(VoronoiError::SiteOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_barycentric_shading_keeps_dimensions() {
        let img = gradient(64, 48);
        let sites = random_sites(40, 64, 48, 5);
        let out = DelaunayBackend::new()
            .with_shading(Shading::Barycentric)
            .interpolate(&img, &sites)
            .unwrap();
        assert_eq!(out.dimensions(), (64, 48));
    }
}
