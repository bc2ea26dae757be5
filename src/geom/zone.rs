use crate::geom::point::Point;
use crate::geom::surface::{Surface, SurfaceKind, Window, ZoneKind};
use std::collections::HashMap;

/// Surfaces bounding one thermal zone.
///
/// Floor area and volume are derived from the surfaces on demand.
#[derive(Debug, Clone)]
pub struct Zone {
    pub kind: ZoneKind,
    pub surfaces: Vec<Surface>,
    pub windows: Vec<Window>,
}

impl Zone {
    pub fn new(kind: ZoneKind) -> Self {
        Self {
            kind,
            surfaces: Vec::new(),
            windows: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn walls(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.iter().filter(|s| s.kind.is_wall())
    }

    pub fn surfaces_of(&self, kind: SurfaceKind) -> impl Iterator<Item = &Surface> {
        self.surfaces.iter().filter(move |s| s.kind == kind)
    }

    pub fn get_surface(&self, name: &str) -> Option<&Surface> {
        self.surfaces.iter().find(|s| s.name == name)
    }

    /// Area of the zone's floor surface(s).
    pub fn floor_area(&self) -> f64 {
        self.surfaces
            .iter()
            .filter(|s| matches!(s.kind, SurfaceKind::Floor | SurfaceKind::BasementFloor))
            .map(|s| s.area())
            .sum()
    }

    /// Floor area times the vertical extent of the walls.
    pub fn volume(&self) -> f64 {
        let (lo, hi) = self
            .walls()
            .map(|w| w.z_range())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (a, b)| {
                (lo.min(a), hi.max(b))
            });
        if hi > lo {
            self.floor_area() * (hi - lo)
        } else {
            0.0
        }
    }

    /// Mean of all surface vertices, inside the zone for convex footprints.
    pub fn center(&self) -> Point {
        let pts: Vec<Point> = self.surfaces.iter().flat_map(|s| s.vertices().iter().copied()).collect();
        let n = pts.len().max(1) as f64;
        let (x, y, z) = pts
            .iter()
            .fold((0.0, 0.0, 0.0), |(x, y, z), p| (x + p.x, y + p.y, z + p.z));
        Point::new(x / n, y / n, z / n)
    }

    /// Checks that the surfaces bound a closed solid.
    ///
    /// Every undirected edge must be shared by exactly two surfaces.
    /// Windows lie inside their host walls and are not considered.
    pub fn is_closed(&self) -> bool {
        let mut edges: HashMap<(Key, Key), usize> = HashMap::new();
        for s in &self.surfaces {
            let pts = s.vertices();
            let n = pts.len();
            for i in 0..n {
                let a = key(&pts[i]);
                let b = key(&pts[(i + 1) % n]);
                if a == b {
                    continue;
                }
                let edge = if a < b { (a, b) } else { (b, a) };
                *edges.entry(edge).or_insert(0) += 1;
            }
        }
        !edges.is_empty() && edges.values().all(|&count| count == 2)
    }
}

type Key = (i64, i64, i64);

// Micrometer grid
fn key(p: &Point) -> Key {
    let q = |v: f64| (v * 1e6).round() as i64;
    (q(p.x), q(p.y), q(p.z))
}
