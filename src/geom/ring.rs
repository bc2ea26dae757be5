//! Ring normalization.
//!
//! Canonicalizes a footprint ring so that edge traversal always starts at the
//! lowest vertex. Winding is kept as given; the dataset convention is
//! counter-clockwise.

use crate::config::RingConfig;
use crate::error::{Result, UbemError};
use crate::geom::EPS;
use crate::geom::footprint::open_ring;
use geo::{Area, Coord, EuclideanLength, Intersects, Line, LineString, Polygon, Simplify};
use tracing::warn;

/// Footprint ring anchored at its minimum-Y vertex, simplified, open
/// (the closing vertex is implicit).
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRing {
    vertices: Vec<Coord<f64>>,
}

impl NormalizedRing {
    pub fn vertices(&self) -> &[Coord<f64>] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Edge `i` runs from vertex `i` to vertex `i + 1` (wrapping).
    pub fn edge(&self, i: usize) -> Line<f64> {
        let n = self.vertices.len();
        Line::new(self.vertices[i % n], self.vertices[(i + 1) % n])
    }

    pub fn edges(&self) -> impl Iterator<Item = Line<f64>> + '_ {
        (0..self.vertices.len()).map(|i| self.edge(i))
    }

    pub fn edge_length(&self, i: usize) -> f64 {
        self.edge(i).euclidean_length()
    }

    /// Vertices in reverse traversal order.
    pub fn reversed(&self) -> Vec<Coord<f64>> {
        self.vertices.iter().rev().copied().collect()
    }

    pub fn signed_area(&self) -> f64 {
        self.to_polygon().signed_area()
    }

    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(LineString::from(self.vertices.clone()), vec![])
    }
}

/// Normalizes a footprint ring.
///
/// 1. drops the closing vertex and consecutive duplicates,
/// 2. rotates the ring to start at the first vertex with minimum Y,
/// 3. simplifies with `cfg.simplify_tolerance`, keeping the start vertex.
///
/// If simplification would cross the ring over itself or leave fewer
/// than 3 vertices, only exactly collinear vertices are removed instead.
pub fn normalize_ring(coords: &[Coord<f64>], cfg: &RingConfig) -> Result<NormalizedRing> {
    let ring = dedup_consecutive(&open_ring(coords));
    if ring.len() < 3 {
        return Err(UbemError::Geometry(format!(
            "ring has {} distinct vertices, at least 3 are required",
            ring.len()
        )));
    }

    let start = min_y_index(&ring);
    let n = ring.len();
    let rotated: Vec<Coord<f64>> = ring.iter().chain(ring.iter()).skip(start).take(n).copied().collect();

    let simplified = simplify_ring(&rotated, cfg.simplify_tolerance);
    let vertices = if simplified.len() >= 3 && is_simple(&simplified) {
        simplified
    } else {
        remove_collinear(&rotated)
    };

    if vertices.len() < 3 {
        return Err(UbemError::Geometry(format!(
            "ring has {} vertices after simplification, at least 3 are required",
            vertices.len()
        )));
    }

    let normalized = NormalizedRing { vertices };
    let area = normalized.signed_area();
    if area.abs() < EPS {
        return Err(UbemError::Geometry("ring encloses no area".to_string()));
    }
    if area < 0.0 {
        warn!("Footprint ring is clockwise; keeping input winding");
    }
    Ok(normalized)
}

/// Index of the first vertex with the smallest Y coordinate.
fn min_y_index(ring: &[Coord<f64>]) -> usize {
    let mut best = 0;
    for (i, c) in ring.iter().enumerate().skip(1) {
        if c.y < ring[best].y {
            best = i;
        }
    }
    best
}

fn dedup_consecutive(ring: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let mut out: Vec<Coord<f64>> = Vec::with_capacity(ring.len());
    for &c in ring {
        if out.last().is_none_or(|p| !coords_close(*p, c)) {
            out.push(c);
        }
    }
    while out.len() > 1 && coords_close(out[0], out[out.len() - 1]) {
        out.pop();
    }
    out
}

fn simplify_ring(rotated: &[Coord<f64>], tolerance: f64) -> Vec<Coord<f64>> {
    let mut closed = rotated.to_vec();
    closed.push(rotated[0]);
    let simplified = LineString::from(closed).simplify(&tolerance);
    dedup_consecutive(&open_ring(&simplified.0))
}

/// Removes vertices lying exactly on the line through their neighbors.
/// The start vertex is always kept.
fn remove_collinear(ring: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let n = ring.len();
    let mut out = vec![ring[0]];
    for i in 1..n {
        let prev = out[out.len() - 1];
        let cur = ring[i];
        let next = ring[(i + 1) % n];
        let cross = (cur.x - prev.x) * (next.y - prev.y) - (cur.y - prev.y) * (next.x - prev.x);
        if cross.abs() > EPS {
            out.push(cur);
        }
    }
    out
}

/// Checks that no two non-adjacent edges of the ring touch.
pub fn is_simple(ring: &[Coord<f64>]) -> bool {
    let n = ring.len();
    if n < 4 {
        return true; // Triangle can't self-intersect
    }
    let edges: Vec<Line<f64>> = (0..n).map(|i| Line::new(ring[i], ring[(i + 1) % n])).collect();
    for i in 0..n {
        for j in (i + 2)..n {
            // Skip adjacent edges
            if i == 0 && j == n - 1 {
                continue;
            }
            if edges[i].intersects(&edges[j]) {
                return false;
            }
        }
    }
    true
}

fn coords_close(a: Coord<f64>, b: Coord<f64>) -> bool {
    (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
}
