//! Per-site color statistics gathered by sweeping the image.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::locate::SiteLocator;
use crate::triangulation::Triangulation;
use crate::{Position, Rgb};

/// Rows per work unit of a sweep.
pub const BAND_ROWS: usize = 16;

/// Running channel sums and pixel counts, indexed by site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellStats {
    pub sums: Vec<[u64; 3]>,
    pub counts: Vec<u32>,
}

impl CellStats {
    pub fn new(num_sites: usize) -> Self {
        Self {
            sums: vec![[0; 3]; num_sites],
            counts: vec![0; num_sites],
        }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[inline]
    pub fn add(&mut self, site: u32, pixel: &[u8]) {
        let sum = &mut self.sums[site as usize];
        sum[0] += pixel[0] as u64;
        sum[1] += pixel[1] as u64;
        sum[2] += pixel[2] as u64;
        self.counts[site as usize] += 1;
    }

    pub fn merge(mut self, other: Self) -> Self {
        for (sum, add) in self.sums.iter_mut().zip(&other.sums) {
            sum[0] += add[0];
            sum[1] += add[1];
            sum[2] += add[2];
        }
        for (count, add) in self.counts.iter_mut().zip(&other.counts) {
            *count += add;
        }
        self
    }

    /// Rounded mean color of a site's cell, `None` if it owns no pixels.
    pub fn average(&self, site: u32) -> Option<Rgb> {
        let count = self.counts[site as usize] as u64;
        if count == 0 {
            return None;
        }
        let sum = &self.sums[site as usize];
        let channel = |s: u64| ((s + count / 2) / count).min(255) as u8;
        Some([channel(sum[0]), channel(sum[1]), channel(sum[2])])
    }

    /// Average color of every site; sites without pixels get black, which
    /// no pixel ever reads.
    pub fn colors(&self) -> Vec<Rgb> {
        (0..self.len() as u32)
            .map(|site| self.average(site).unwrap_or([0, 0, 0]))
            .collect()
    }
}

/// Assign every pixel to its site and gather per-site statistics.
///
/// Returns the owner of each pixel in row-major order along with the merged
/// statistics. Bands of [`BAND_ROWS`] rows are swept independently, each
/// with its own locator and statistics; the statistics are merged once at
/// the end.
pub fn accumulate(image: &image::RgbImage, mesh: &Triangulation) -> (Vec<u32>, CellStats) {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let num_sites = mesh.site_count();
    let band_len = (BAND_ROWS * width).max(1);
    let mut cell_of = vec![0u32; width * height];

    #[cfg(feature = "parallel")]
    let stats = cell_of
        .par_chunks_mut(band_len)
        .enumerate()
        .fold(
            || CellStats::new(num_sites),
            |mut stats, (band, cells)| {
                sweep_band(image, mesh, band * band_len, cells, &mut stats);
                stats
            },
        )
        .reduce(|| CellStats::new(num_sites), CellStats::merge);

    #[cfg(not(feature = "parallel"))]
    let stats = {
        let mut stats = CellStats::new(num_sites);
        for (band, cells) in cell_of.chunks_mut(band_len).enumerate() {
            sweep_band(image, mesh, band * band_len, cells, &mut stats);
        }
        stats
    };

    tracing::debug!(
        pixels = cell_of.len(),
        sites = num_sites,
        empty_cells = stats.counts.iter().filter(|&&c| c == 0).count(),
        "accumulated cell statistics"
    );
    (cell_of, stats)
}

fn sweep_band(
    image: &image::RgbImage,
    mesh: &Triangulation,
    first_pixel: usize,
    cells: &mut [u32],
    stats: &mut CellStats,
) {
    let width = image.width() as usize;
    let raw = image.as_raw();
    let mut locator = SiteLocator::new(mesh);

    for (offset, cell) in cells.iter_mut().enumerate() {
        let index = first_pixel + offset;
        let p = Position::new((index % width) as u32, (index / width) as u32);
        let site = locator.locate(p);
        *cell = site;
        stats.add(site, &raw[index * 3..index * 3 + 3]);
    }
}

/// Statistics for an existing pixel assignment.
pub fn tally(image: &image::RgbImage, cell_of: &[u32], num_sites: usize) -> CellStats {
    let raw = image.as_raw();
    let mut stats = CellStats::new(num_sites);
    for (pixel, &site) in raw.chunks_exact(3).zip(cell_of) {
        stats.add(site, pixel);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random_sites;

    fn gradient(width: u32, height: u32) -> image::RgbImage {
        image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn test_average_rounds_to_nearest() {
        let mut stats = CellStats::new(2);
        stats.add(0, &[10, 0, 255]);
        stats.add(0, &[11, 1, 255]);
        assert_eq!(stats.average(0), Some([11, 1, 255]));
        assert_eq!(stats.average(1), None);
        assert_eq!(stats.colors()[1], [0, 0, 0]);
    }

    #[test]
    fn test_merge() {
        let mut a = CellStats::new(2);
        let mut b = CellStats::new(2);
        a.add(0, &[1, 2, 3]);
        b.add(0, &[1, 2, 3]);
        b.add(1, &[9, 9, 9]);
        let merged = a.merge(b);
        assert_eq!(merged.sums, vec![[2, 4, 6], [9, 9, 9]]);
        assert_eq!(merged.counts, vec![2, 1]);
    }

    #[test]
    fn test_counts_cover_image() {
        // Taller than one band so several bands are merged.
        let image = gradient(37, 3 * BAND_ROWS as u32 + 5);
        let sites = random_sites(40, image.width(), image.height(), 9);
        let mesh = Triangulation::new(&sites).unwrap();
        let (cell_of, stats) = accumulate(&image, &mesh);

        let total: u64 = stats.counts.iter().map(|&c| c as u64).sum();
        assert_eq!(total, (image.width() * image.height()) as u64);
        assert_eq!(cell_of.len(), (image.width() * image.height()) as usize);
        assert_eq!(stats, tally(&image, &cell_of, sites.len()));
    }

    #[test]
    fn test_every_distinct_site_owns_its_pixel() {
        let image = gradient(30, 20);
        let sites = random_sites(50, 30, 20, 4);
        let mesh = Triangulation::new(&sites).unwrap();
        let (cell_of, stats) = accumulate(&image, &mesh);
        for (i, site) in sites.iter().enumerate() {
            let owner = cell_of[(site.y * 30 + site.x) as usize];
            assert_eq!(owner, mesh.canonical(i as u32));
            assert_eq!(stats.counts[i] > 0, owner == i as u32);
        }
    }
}
