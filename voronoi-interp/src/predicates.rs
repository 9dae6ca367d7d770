//! Exact geometric predicates on integer coordinates.
//!
//! Coordinates are bounded by [`MAX_DIMENSION`](crate::MAX_DIMENSION), so the
//! orientation determinant fits in `i64` and the in-circle determinant fits in
//! `i128`. Neither predicate ever rounds.

use std::cmp::Ordering;

use crate::Position;

/// Turn direction of three points, measured with x to the right and y up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    CounterClockwise,
    Clockwise,
    Collinear,
}

/// Where a point lies relative to the circle through three others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CirclePosition {
    Inside,
    On,
    Outside,
}

/// Twice the signed area of triangle `abc`.
#[inline]
pub(crate) fn cross(a: &Position, b: &Position, c: &Position) -> i64 {
    let (ax, ay) = (a.x as i64, a.y as i64);
    let (bx, by) = (b.x as i64, b.y as i64);
    let (cx, cy) = (c.x as i64, c.y as i64);
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

/// Orientation of the triple `a, b, c`.
#[inline]
pub fn orientation(a: &Position, b: &Position, c: &Position) -> Orientation {
    match cross(a, b, c).cmp(&0) {
        Ordering::Greater => Orientation::CounterClockwise,
        Ordering::Less => Orientation::Clockwise,
        Ordering::Equal => Orientation::Collinear,
    }
}

/// Position of `d` relative to the circle through `a, b, c`.
///
/// The winding of `a, b, c` does not matter. When they are collinear the
/// circle degenerates to their line, and `d` is either [`CirclePosition::On`]
/// that line or [`CirclePosition::Outside`].
pub fn in_circle(a: &Position, b: &Position, c: &Position, d: &Position) -> CirclePosition {
    let det = in_circle_det(a, b, c, d);
    let det = match orientation(a, b, c) {
        Orientation::CounterClockwise => det,
        Orientation::Clockwise => -det,
        Orientation::Collinear => {
            return if det == 0 { CirclePosition::On } else { CirclePosition::Outside };
        }
    };
    match det.cmp(&0) {
        Ordering::Greater => CirclePosition::Inside,
        Ordering::Less => CirclePosition::Outside,
        Ordering::Equal => CirclePosition::On,
    }
}

/// Lifted determinant, positive when `d` is inside the circle of a
/// counterclockwise `a, b, c`.
#[inline]
fn in_circle_det(a: &Position, b: &Position, c: &Position, d: &Position) -> i128 {
    let (dx, dy) = (d.x as i128, d.y as i128);
    let (adx, ady) = (a.x as i128 - dx, a.y as i128 - dy);
    let (bdx, bdy) = (b.x as i128 - dx, b.y as i128 - dy);
    let (cdx, cdy) = (c.x as i128 - dx, c.y as i128 - dy);

    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;

    alift * (bdx * cdy - cdx * bdy)
        + blift * (cdx * ady - adx * cdy)
        + clift * (adx * bdy - bdx * ady)
}

/// True when `p` lies on the open segment `ab`, assuming the three are collinear.
#[inline]
pub(crate) fn strictly_between(a: &Position, b: &Position, p: &Position) -> bool {
    let (ax, ay) = (a.x as i64, a.y as i64);
    let (bx, by) = (b.x as i64, b.y as i64);
    let (px, py) = (p.x as i64, p.y as i64);
    let toward_b = (px - ax) * (bx - ax) + (py - ay) * (by - ay);
    let toward_a = (px - bx) * (ax - bx) + (py - by) * (ay - by);
    toward_b > 0 && toward_a > 0
}
