//! Site positions, input validation and random site sampling.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{Result, VoronoiError};

/// Exclusive upper bound on image dimensions (and so on any coordinate).
///
/// Keeps the orientation determinant inside `i64` and the in-circle
/// determinant inside `i128`.
pub const MAX_DIMENSION: u32 = 1 << 30;

/// Integer 2D position of a site or pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Squared distance to another position
    #[inline]
    pub fn dist_sq(&self, other: &Position) -> u64 {
        let dx = self.x.abs_diff(other.x) as u64;
        let dy = self.y.abs_diff(other.y) as u64;
        dx * dx + dy * dy
    }
}

impl From<(u32, u32)> for Position {
    fn from((x, y): (u32, u32)) -> Self {
        Self::new(x, y)
    }
}

/// Sample `count` sites uniformly over a `width` x `height` image.
///
/// Sampling is with replacement, so coincident sites are possible. The same
/// seed always yields the same sites.
pub fn random_sites(count: usize, width: u32, height: u32, seed: u64) -> Vec<Position> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| Position::new(rng.gen_range(0..width), rng.gen_range(0..height)))
        .collect()
}

/// Reject inputs the engine cannot process, before anything is allocated.
pub(crate) fn validate(width: u32, height: u32, sites: &[Position]) -> Result<()> {
    if sites.is_empty() {
        return Err(VoronoiError::NoSites);
    }
    if width >= MAX_DIMENSION || height >= MAX_DIMENSION {
        return Err(VoronoiError::ImageTooLarge {
            width,
            height,
            max: MAX_DIMENSION,
        });
    }
    if let Some((index, site)) = sites
        .iter()
        .enumerate()
        .find(|(_, s)| s.x >= width || s.y >= height)
    {
        return Err(VoronoiError::SiteOutOfBounds {
            index,
            x: site.x,
            y: site.y,
            width,
            height,
        });
    }
    Ok(())
}
