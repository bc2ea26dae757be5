//! Outward offset of a footprint ring with mitred corners.
//!
//! Each edge is shifted outward by the offset distance and consecutive
//! shifted edges are joined at their intersection. Convex corners whose
//! mitre would reach further than `mitre_limit * distance` are clipped by a
//! line across the corner bisector at that distance from the vertex.

use crate::geom::EPS;
use crate::geom::footprint::open_ring;
use geo::{Area, Coord, LineString, Polygon};

/// Returns the footprint grown outward by `distance`.
///
/// Works for either winding. Polygons with fewer than 3 vertices are
/// returned unchanged.
pub fn buffer_mitred(polygon: &Polygon<f64>, distance: f64, mitre_limit: f64) -> Polygon<f64> {
    let ring = open_ring(&polygon.exterior().0);
    let n = ring.len();
    if n < 3 || distance <= 0.0 {
        return polygon.clone();
    }
    // +1 for counter-clockwise, -1 for clockwise
    let orientation = polygon.signed_area().signum();

    let mut out: Vec<Coord<f64>> = Vec::with_capacity(n + 4);
    for i in 0..n {
        let prev = ring[(i + n - 1) % n];
        let cur = ring[i];
        let next = ring[(i + 1) % n];

        let (Some(n1), Some(n2)) = (
            outward_normal(prev, cur, orientation),
            outward_normal(cur, next, orientation),
        ) else {
            continue; // zero-length edge
        };

        let cos = n1.x * n2.x + n1.y * n2.y;
        let turn = (cur.x - prev.x) * (next.y - cur.y) - (cur.y - prev.y) * (next.x - cur.x);
        let convex = turn * orientation > 0.0;

        if 1.0 + cos < EPS {
            // Edge doubles back on itself
            out.push(offset(cur, n1, distance));
            out.push(offset(cur, n2, distance));
            continue;
        }

        let scale = distance / (1.0 + cos);
        let mitre = Coord {
            x: cur.x + (n1.x + n2.x) * scale,
            y: cur.y + (n1.y + n2.y) * scale,
        };
        let mitre_ratio = (2.0 / (1.0 + cos)).sqrt();

        if convex && mitre_ratio > mitre_limit {
            let reach = mitre_limit.max(1.0) * distance;
            let bisector = unit(Coord { x: n1.x + n2.x, y: n1.y + n2.y });
            match (
                bisector.and_then(|b| clip(cur, prev, cur, n1, b, distance, reach)),
                bisector.and_then(|b| clip(cur, cur, next, n2, b, distance, reach)),
            ) {
                (Some(a), Some(b)) => {
                    out.push(a);
                    out.push(b);
                }
                _ => {
                    out.push(offset(cur, n1, distance));
                    out.push(offset(cur, n2, distance));
                }
            }
        } else {
            out.push(mitre);
        }
    }

    Polygon::new(LineString::from(out), vec![])
}

fn outward_normal(a: Coord<f64>, b: Coord<f64>, orientation: f64) -> Option<Coord<f64>> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < EPS {
        return None;
    }
    Some(Coord {
        x: orientation * dy / len,
        y: -orientation * dx / len,
    })
}

fn unit(v: Coord<f64>) -> Option<Coord<f64>> {
    let len = (v.x * v.x + v.y * v.y).sqrt();
    if len < EPS {
        return None;
    }
    Some(Coord { x: v.x / len, y: v.y / len })
}

/// Point of the edge `a -> b` shifted by `normal * distance` that lies
/// `reach` ahead of `corner` along `bisector`.
fn clip(
    corner: Coord<f64>,
    a: Coord<f64>,
    b: Coord<f64>,
    normal: Coord<f64>,
    bisector: Coord<f64>,
    distance: f64,
    reach: f64,
) -> Option<Coord<f64>> {
    let dir = unit(Coord { x: b.x - a.x, y: b.y - a.y })?;
    let along = dir.x * bisector.x + dir.y * bisector.y;
    if along.abs() < EPS {
        return None;
    }
    let base = offset(corner, normal, distance);
    let t = (reach - distance * (normal.x * bisector.x + normal.y * bisector.y)) / along;
    Some(Coord {
        x: base.x + dir.x * t,
        y: base.y + dir.y * t,
    })
}

fn offset(c: Coord<f64>, normal: Coord<f64>, distance: f64) -> Coord<f64> {
    Coord {
        x: c.x + normal.x * distance,
        y: c.y + normal.y * distance,
    }
}
