//! Incremental Delaunay triangulation of integer sites.
//!
//! Triangles live in an arena and refer to each other by index. Every hull
//! edge is closed by a *ghost* triangle whose third vertex is [`GHOST`], so
//! each triangle always has three valid neighbors and walks never fall off
//! the mesh. A ghost triangle `(a, b, GHOST)` covers the open half-plane to
//! the left of `a -> b`.
//!
//! Sites are inserted one at a time: walk to the triangle containing the new
//! site, split it into three, then flip edges opposite the new site until all
//! of them pass the in-circle test.

use std::collections::HashMap;

use crate::predicates::{in_circle, orientation, strictly_between, CirclePosition, Orientation};
use crate::{Position, Result, VoronoiError};

/// Sentinel vertex of ghost triangles.
pub(crate) const GHOST: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Triangle {
    /// Site indices, counterclockwise for real triangles.
    pub(crate) v: [u32; 3],
    /// `n[i]` is the triangle across the edge opposite `v[i]`.
    pub(crate) n: [u32; 3],
}

impl Triangle {
    fn new(v: [u32; 3], n: [u32; 3]) -> Self {
        Self { v, n }
    }

    #[inline]
    pub(crate) fn is_ghost(&self) -> bool {
        self.v.contains(&GHOST)
    }

    /// Slot of the vertex that is neither `a` nor `b`.
    #[inline]
    fn apex(&self, a: u32, b: u32) -> usize {
        if self.v[0] != a && self.v[0] != b {
            0
        } else if self.v[1] != a && self.v[1] != b {
            1
        } else {
            2
        }
    }
}

/// Dimension of the distinct site set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A single distinct position; no edges.
    Point,
    /// All distinct positions are collinear; edges form a path along the line.
    Path,
    /// At least one triangle of positive area.
    Planar,
}

/// Delaunay triangulation of a site list, with its vertex adjacency graph.
#[derive(Debug, Clone)]
pub struct Triangulation {
    sites: Vec<Position>,
    canonical: Vec<u32>,
    triangles: Vec<Triangle>,
    shape: Shape,
    offsets: Vec<u32>,
    adjacency: Vec<u32>,
    hint: u32,
}

impl Triangulation {
    /// Triangulate `sites`.
    ///
    /// Coincident sites collapse onto the lowest index sharing their
    /// position; only those representatives become vertices. Fails only on
    /// an empty slice.
    pub fn new(sites: &[Position]) -> Result<Self> {
        if sites.is_empty() {
            return Err(VoronoiError::NoSites);
        }

        let mut first_at: HashMap<Position, u32> = HashMap::with_capacity(sites.len());
        let canonical: Vec<u32> = sites
            .iter()
            .enumerate()
            .map(|(i, &site)| *first_at.entry(site).or_insert(i as u32))
            .collect();
        let unique: Vec<u32> = (0..sites.len() as u32)
            .filter(|&i| canonical[i as usize] == i)
            .collect();

        let mut mesh = Self {
            sites: sites.to_vec(),
            canonical,
            triangles: Vec::new(),
            shape: Shape::Point,
            offsets: Vec::new(),
            adjacency: Vec::new(),
            hint: 0,
        };

        let edges = match mesh.find_seed(&unique) {
            Some(seed) => {
                mesh.shape = Shape::Planar;
                mesh.build(seed, &unique);
                mesh.triangle_edges()
            }
            None if unique.len() == 1 => Vec::new(),
            None => {
                mesh.shape = Shape::Path;
                mesh.path_edges(&unique)
            }
        };
        mesh.index_adjacency(edges);

        tracing::debug!(
            sites = sites.len(),
            distinct = unique.len(),
            shape = ?mesh.shape,
            triangles = mesh.triangles().count(),
            "triangulated sites"
        );
        Ok(mesh)
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Number of input sites, duplicates included.
    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    pub fn position(&self, site: u32) -> Position {
        self.sites[site as usize]
    }

    /// Lowest site index sharing the position of `site`.
    pub fn canonical(&self, site: u32) -> u32 {
        self.canonical[site as usize]
    }

    /// Real triangles as counterclockwise site triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.triangles.iter().filter(|t| !t.is_ghost()).map(|t| t.v)
    }

    /// Delaunay neighbors of `site`; empty for non-canonical duplicates.
    #[inline]
    pub fn neighbors(&self, site: u32) -> &[u32] {
        let start = self.offsets[site as usize] as usize;
        let end = self.offsets[site as usize + 1] as usize;
        &self.adjacency[start..end]
    }

    #[inline]
    pub(crate) fn triangle(&self, t: u32) -> &Triangle {
        &self.triangles[t as usize]
    }

    #[inline]
    fn point(&self, site: u32) -> &Position {
        &self.sites[site as usize]
    }

    /// First two distinct sites plus the first one not collinear with them,
    /// ordered counterclockwise.
    fn find_seed(&self, unique: &[u32]) -> Option<[u32; 3]> {
        let (&a, &b) = (unique.first()?, unique.get(1)?);
        let (pa, pb) = (self.point(a), self.point(b));
        unique[2..].iter().find_map(|&c| match orientation(pa, pb, self.point(c)) {
            Orientation::CounterClockwise => Some([a, b, c]),
            Orientation::Clockwise => Some([a, c, b]),
            Orientation::Collinear => None,
        })
    }

    fn build(&mut self, [a, b, c]: [u32; 3], unique: &[u32]) {
        // Slot 0 is the seed; slots 1..=3 are the ghosts of its edges.
        self.triangles = vec![
            Triangle::new([a, b, c], [1, 2, 3]),
            Triangle::new([c, b, GHOST], [3, 2, 0]),
            Triangle::new([a, c, GHOST], [1, 3, 0]),
            Triangle::new([b, a, GHOST], [2, 1, 0]),
        ];
        self.triangles.reserve(unique.len() * 2);

        for &site in unique {
            if site != a && site != b && site != c {
                self.insert(site);
            }
        }
    }

    fn insert(&mut self, site: u32) {
        let p = *self.point(site);
        let t = self.walk(self.hint, &p);
        let Triangle { v: [v0, v1, v2], n: [n0, n1, n2] } = self.triangles[t as usize];

        let ta = t;
        let tb = self.triangles.len() as u32;
        let tc = tb + 1;
        self.triangles[ta as usize] = Triangle::new([site, v1, v2], [n0, tb, tc]);
        self.triangles.push(Triangle::new([site, v2, v0], [n1, tc, ta]));
        self.triangles.push(Triangle::new([site, v0, v1], [n2, ta, tb]));
        self.relink(n1, v2, v0, tb);
        self.relink(n2, v0, v1, tc);

        // Every triangle on the stack has the new site in slot 0.
        let mut stack = vec![ta, tb, tc];
        while let Some(t) = stack.pop() {
            if let Some(t2) = self.flip_if_illegal(t) {
                stack.push(t);
                stack.push(t2);
            }
        }
        self.hint = ta;
    }

    /// Point the link of `t` across edge `a-b` at `to`.
    #[inline]
    fn relink(&mut self, t: u32, a: u32, b: u32, to: u32) {
        let tri = &mut self.triangles[t as usize];
        let slot = tri.apex(a, b);
        tri.n[slot] = to;
    }

    /// Flip the edge opposite slot 0 of `t` if it fails the in-circle test.
    ///
    /// Returns the other triangle of the flipped pair; both keep the inserted
    /// site in slot 0.
    fn flip_if_illegal(&mut self, t: u32) -> Option<u32> {
        let tri = self.triangles[t as usize];
        let [p, u, w] = tri.v;
        let t2 = tri.n[0];
        let other = self.triangles[t2 as usize];
        let k = other.apex(u, w);
        let q = other.v[k];

        if !self.is_illegal(p, u, w, q) {
            return None;
        }

        let n_wp = tri.n[1];
        let n_pu = tri.n[2];
        let n_uq = other.n[(k + 1) % 3];
        let n_qw = other.n[(k + 2) % 3];

        self.triangles[t as usize] = Triangle::new([p, u, q], [n_uq, t2, n_pu]);
        self.triangles[t2 as usize] = Triangle::new([p, q, w], [n_qw, n_wp, t]);
        self.relink(n_uq, u, q, t);
        self.relink(n_wp, w, p, t2);
        Some(t2)
    }

    /// Whether edge `u-w` shared by `(p, u, w)` and `(q, w, u)` must flip.
    fn is_illegal(&self, p: u32, u: u32, w: u32, q: u32) -> bool {
        if q == GHOST {
            self.in_ghost_circle(w, u, p)
        } else if u == GHOST {
            self.in_ghost_circle(q, w, p)
        } else if w == GHOST {
            self.in_ghost_circle(u, q, p)
        } else {
            in_circle(self.point(q), self.point(w), self.point(u), self.point(p))
                == CirclePosition::Inside
        }
    }

    /// Circumcircle test for the ghost triangle on hull edge `a -> b`: the
    /// open half-plane left of the edge plus the open edge itself.
    fn in_ghost_circle(&self, a: u32, b: u32, p: u32) -> bool {
        let (pa, pb, pp) = (self.point(a), self.point(b), self.point(p));
        match orientation(pa, pb, pp) {
            Orientation::CounterClockwise => true,
            Orientation::Clockwise => false,
            Orientation::Collinear => strictly_between(pa, pb, pp),
        }
    }

    /// Visibility walk from `start` to the triangle containing `p`.
    ///
    /// Returns a real triangle whose closure contains `p`, or the ghost
    /// triangle of a hull edge that `p` lies strictly outside of.
    pub(crate) fn walk(&self, start: u32, p: &Position) -> u32 {
        let mut t = self.real_neighbor(start).unwrap_or(start);
        let mut previous = GHOST;
        for _ in 0..self.triangles.len() {
            let tri = self.triangle(t);
            if tri.is_ghost() {
                return t;
            }
            let exit = (0..3).find(|&i| {
                tri.n[i] != previous
                    && orientation(
                        self.point(tri.v[(i + 1) % 3]),
                        self.point(tri.v[(i + 2) % 3]),
                        p,
                    ) == Orientation::Clockwise
            });
            match exit {
                Some(i) => {
                    previous = t;
                    t = tri.n[i];
                }
                None => return t,
            }
        }

        tracing::warn!(x = p.x, y = p.y, "walk did not converge, scanning triangles");
        self.scan(p).unwrap_or(t)
    }

    /// The real triangle across the hull edge of a ghost.
    fn real_neighbor(&self, ghost: u32) -> Option<u32> {
        let tri = self.triangle(ghost);
        tri.v.iter().position(|&v| v == GHOST).map(|slot| tri.n[slot])
    }

    fn scan(&self, p: &Position) -> Option<u32> {
        let contains = |tri: &Triangle| {
            (0..3).all(|i| {
                orientation(self.point(tri.v[i]), self.point(tri.v[(i + 1) % 3]), p)
                    != Orientation::Clockwise
            })
        };
        let outside = |tri: &Triangle| {
            let slot = tri.v.iter().position(|&v| v == GHOST).unwrap_or(2);
            let a = tri.v[(slot + 1) % 3];
            let b = tri.v[(slot + 2) % 3];
            orientation(self.point(a), self.point(b), p) == Orientation::CounterClockwise
        };
        (0..self.triangles.len() as u32).find(|&t| {
            let tri = self.triangle(t);
            if tri.is_ghost() { outside(tri) } else { contains(tri) }
        })
    }

    fn triangle_edges(&self) -> Vec<(u32, u32)> {
        let mut edges = Vec::with_capacity(self.triangles.len() * 3);
        for v in self.triangles() {
            for i in 0..3 {
                let (a, b) = (v[i], v[(i + 1) % 3]);
                edges.push((a, b));
                edges.push((b, a));
            }
        }
        edges
    }

    fn path_edges(&self, unique: &[u32]) -> Vec<(u32, u32)> {
        let mut ordered = unique.to_vec();
        ordered.sort_unstable_by_key(|&s| *self.point(s));
        ordered
            .windows(2)
            .flat_map(|pair| [(pair[0], pair[1]), (pair[1], pair[0])])
            .collect()
    }

    /// Compress directed edges into per-site neighbor lists.
    fn index_adjacency(&mut self, mut edges: Vec<(u32, u32)>) {
        edges.sort_unstable();
        edges.dedup();

        let mut offsets = vec![0u32; self.sites.len() + 1];
        for &(from, _) in &edges {
            offsets[from as usize + 1] += 1;
        }
        for i in 0..self.sites.len() {
            offsets[i + 1] += offsets[i];
        }
        self.offsets = offsets;
        self.adjacency = edges.into_iter().map(|(_, to)| to).collect();
    }
}
