//! Property-based tests comparing the triangulation backend with the full scan.
//!
//! Any site set, including duplicates and collinear runs, must produce the
//! same pixel ownership and cell averages as checking every site.

use proptest::prelude::*;
use voronoi_interp::{
    interpolate, BruteForceBackend, ComputeBackend, DelaunayBackend, Position, Triangulation,
};

// =============================================================================
// TEST CONFIGURATION
// =============================================================================

/// Strategy for image dimensions together with a site list inside them
fn image_and_sites() -> impl Strategy<Value = (u32, u32, Vec<Position>)> {
    (1u32..40, 1u32..40).prop_flat_map(|(w, h)| {
        let site = (0..w, 0..h).prop_map(|(x, y)| Position::new(x, y));
        (Just(w), Just(h), prop::collection::vec(site, 1..60))
    })
}

/// Sites snapped to a coarse lattice, which makes ties and cocircular
/// quadruples common
fn lattice_sites() -> impl Strategy<Value = Vec<Position>> {
    prop::collection::vec((0u32..8, 0u32..8).prop_map(|(x, y)| Position::new(x * 4, y * 4)), 1..40)
}

fn stripes(width: u32, height: u32) -> image::RgbImage {
    image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 7) as u8, (y * 13) as u8, ((x + y) * 3) as u8])
    })
}

// =============================================================================
// BACKEND EQUIVALENCE
// =============================================================================

proptest! {
    /// Property: the triangulation backend assigns every pixel exactly as the
    /// full scan does.
    #[test]
    fn prop_delaunay_matches_brute_force((w, h, sites) in image_and_sites()) {
        let image = stripes(w, h);
        let fast = DelaunayBackend::new().compute(&image, &sites).unwrap();
        let slow = BruteForceBackend::new().compute(&image, &sites).unwrap();
        prop_assert_eq!(fast, slow);
    }

    /// Property: the same holds on lattice sites full of ties.
    #[test]
    fn prop_lattice_ties_match_brute_force(sites in lattice_sites()) {
        let image = stripes(32, 32);
        let fast = DelaunayBackend::new().compute(&image, &sites).unwrap();
        let slow = BruteForceBackend::new().compute(&image, &sites).unwrap();
        prop_assert_eq!(fast, slow);
    }

    /// Property: every site with distinct coordinates owns its own pixel.
    #[test]
    fn prop_sites_own_their_pixel((w, h, sites) in image_and_sites()) {
        let image = stripes(w, h);
        let result = DelaunayBackend::new().compute(&image, &sites).unwrap();
        for (i, site) in sites.iter().enumerate() {
            let owner = result.cell_of[(site.y * w + site.x) as usize];
            let first = sites.iter().position(|s| s == site).unwrap();
            prop_assert_eq!(owner as usize, first, "site {}", i);
        }
    }

    /// Property: output dimensions always match the input.
    #[test]
    fn prop_output_dimensions((w, h, sites) in image_and_sites()) {
        let out = interpolate(&stripes(w, h), &sites).unwrap();
        prop_assert_eq!(out.dimensions(), (w, h));
    }
}

// =============================================================================
// TRIANGULATION STRUCTURE
// =============================================================================

proptest! {
    /// Property: the Delaunay graph is symmetric.
    #[test]
    fn prop_adjacency_is_symmetric(sites in lattice_sites()) {
        let mesh = Triangulation::new(&sites).unwrap();
        for a in 0..sites.len() as u32 {
            for &b in mesh.neighbors(a) {
                prop_assert!(mesh.neighbors(b).contains(&a), "{} -> {} not mirrored", a, b);
            }
        }
    }

    /// Property: no site lies strictly inside the circumcircle of a triangle.
    #[test]
    fn prop_empty_circumcircles((_, _, sites) in image_and_sites()) {
        use voronoi_interp::{in_circle, CirclePosition};
        let mesh = Triangulation::new(&sites).unwrap();
        for [a, b, c] in mesh.triangles() {
            let (pa, pb, pc) = (mesh.position(a), mesh.position(b), mesh.position(c));
            for p in &sites {
                prop_assert_ne!(in_circle(&pa, &pb, &pc, p), CirclePosition::Inside);
            }
        }
    }
}
