//! Nearest-site queries over a triangulation.

use crate::triangulation::{Shape, Triangulation, GHOST};
use crate::Position;

/// Answers "which site owns this pixel" for one sweep.
///
/// Each worker owns its locator: the cached triangle and site make
/// consecutive queries on neighboring pixels cost a handful of predicate
/// evaluations. The triangulation itself is only read.
pub struct SiteLocator<'a> {
    mesh: &'a Triangulation,
    last_triangle: u32,
    last_site: u32,
}

impl<'a> SiteLocator<'a> {
    pub fn new(mesh: &'a Triangulation) -> Self {
        Self {
            mesh,
            last_triangle: 0,
            last_site: 0,
        }
    }

    /// Index of the site nearest to `p`, lowest index among equals.
    pub fn locate(&mut self, p: Position) -> u32 {
        let start = match self.mesh.shape() {
            Shape::Planar => {
                let t = self.mesh.walk(self.last_triangle, &p);
                self.last_triangle = t;
                self.nearest_vertex(t, &p)
            }
            Shape::Path | Shape::Point => self.last_site,
        };
        let site = self.descend(start, &p);
        self.last_site = site;
        site
    }

    /// Vertices of the real triangle containing `p`, if any.
    pub fn locate_triangle(&mut self, p: Position) -> Option<[u32; 3]> {
        if self.mesh.shape() != Shape::Planar {
            return None;
        }
        let t = self.mesh.walk(self.last_triangle, &p);
        self.last_triangle = t;
        let tri = self.mesh.triangle(t);
        (!tri.is_ghost()).then_some(tri.v)
    }

    fn nearest_vertex(&self, t: u32, p: &Position) -> u32 {
        self.mesh
            .triangle(t)
            .v
            .iter()
            .copied()
            .filter(|&v| v != GHOST)
            .min_by_key(|&v| (self.dist_sq(v, p), v))
            .unwrap_or(self.last_site)
    }

    #[inline]
    fn dist_sq(&self, site: u32, p: &Position) -> u64 {
        self.mesh.position(site).dist_sq(p)
    }

    /// Greedy descent on the Delaunay graph.
    ///
    /// A site is nearest to `p` exactly when none of its Delaunay neighbors
    /// is strictly closer, so the descent ends at a nearest site.
    fn descend(&self, start: u32, p: &Position) -> u32 {
        let mut site = start;
        let mut best = self.dist_sq(site, p);
        loop {
            let closer = self
                .mesh
                .neighbors(site)
                .iter()
                .map(|&v| (self.dist_sq(v, p), v))
                .min();
            match closer {
                Some((dist, v)) if dist < best => {
                    site = v;
                    best = dist;
                }
                _ => break,
            }
        }
        self.lowest_tied(site, best, p)
    }

    /// Lowest index among the sites at distance `dist` from `p`.
    ///
    /// Equidistant nearest sites lie on an empty circle around `p`, and the
    /// edges of their convex polygon are Delaunay edges, so a flood over
    /// equidistant neighbors reaches all of them.
    fn lowest_tied(&self, site: u32, dist: u64, p: &Position) -> u32 {
        let is_tied = |v: &u32| self.dist_sq(*v, p) == dist;
        if !self.mesh.neighbors(site).iter().any(is_tied) {
            return site;
        }

        let mut tied = vec![site];
        let mut next = 0;
        while let Some(&current) = tied.get(next) {
            for &v in self.mesh.neighbors(current) {
                if is_tied(&v) && !tied.contains(&v) {
                    tied.push(v);
                }
            }
            next += 1;
        }
        tied.into_iter().min().unwrap_or(site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random_sites;

    fn brute_force(sites: &[Position], p: &Position) -> u32 {
        sites
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| s.dist_sq(p))
            .map(|(i, _)| i as u32)
            .unwrap()
    }

    fn assert_matches_brute_force(sites: &[Position], width: u32, height: u32) {
        let mesh = Triangulation::new(sites).unwrap();
        let mut locator = SiteLocator::new(&mesh);
        for y in 0..height {
            for x in 0..width {
                let p = Position::new(x, y);
                assert_eq!(locator.locate(p), brute_force(sites, &p), "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_random_sites() {
        let sites = random_sites(60, 80, 60, 5);
        assert_matches_brute_force(&sites, 80, 60);
    }

    #[test]
    fn test_clustered_sites_leave_pixels_outside_hull() {
        let sites: Vec<Position> = random_sites(25, 10, 10, 1)
            .into_iter()
            .map(|s| Position::new(s.x + 30, s.y + 20))
            .collect();
        assert_matches_brute_force(&sites, 64, 48);
    }

    #[test]
    fn test_grid_ties_go_to_lowest_index() {
        // Reverse order so the lowest index is never the first one inserted.
        let sites: Vec<Position> = (0..6)
            .flat_map(|y| (0..6).map(move |x| Position::new(x * 4, y * 4)))
            .rev()
            .collect();
        assert_matches_brute_force(&sites, 24, 24);
    }

    #[test]
    fn test_degenerate_shapes() {
        assert_matches_brute_force(&[Position::new(2, 3)], 8, 8);
        assert_matches_brute_force(&[Position::new(0, 0), Position::new(7, 7)], 8, 8);
        let line: Vec<Position> = [6, 1, 4, 1, 0].iter().map(|&x| Position::new(x, 2)).collect();
        assert_matches_brute_force(&line, 8, 6);
    }

    #[test]
    fn test_duplicates_never_win() {
        let sites = vec![
            Position::new(2, 2),
            Position::new(6, 5),
            Position::new(2, 2),
            Position::new(1, 7),
            Position::new(6, 5),
        ];
        let mesh = Triangulation::new(&sites).unwrap();
        let mut locator = SiteLocator::new(&mesh);
        for y in 0..8 {
            for x in 0..8 {
                let site = locator.locate(Position::new(x, y));
                assert!(site != 2 && site != 4);
            }
        }
    }

    #[test]
    fn test_locate_triangle() {
        let sites = vec![Position::new(0, 0), Position::new(8, 0), Position::new(0, 8)];
        let mesh = Triangulation::new(&sites).unwrap();
        let mut locator = SiteLocator::new(&mesh);
        assert!(locator.locate_triangle(Position::new(2, 2)).is_some());
        assert!(locator.locate_triangle(Position::new(4, 4)).is_some());
        assert!(locator.locate_triangle(Position::new(7, 7)).is_none());
    }
}
