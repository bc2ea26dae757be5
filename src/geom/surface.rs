//! Planar envelope faces and their classification.

use crate::error::{Result, UbemError};
use crate::geom::EPS;
use crate::geom::point::Point;
use serde::Serialize;
use std::fmt;

/// Thermal zone a surface belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ZoneKind {
    Main,
    Basement,
}

impl ZoneKind {
    /// Zone name as written to the engine model.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Main => "ZONE",
            Self::Basement => "BASEMENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SurfaceKind {
    ExteriorWall,
    AdiabaticWall,
    Floor,
    Roof,
    InteriorCeiling,
    BasementAdiabaticWall,
    BasementExteriorWall,
    BasementFloor,
}

impl SurfaceKind {
    pub fn is_wall(&self) -> bool {
        matches!(
            self,
            Self::ExteriorWall
                | Self::AdiabaticWall
                | Self::BasementAdiabaticWall
                | Self::BasementExteriorWall
        )
    }

    /// Surface type keyword of the engine format.
    pub fn surface_type(&self) -> &'static str {
        match self {
            Self::ExteriorWall
            | Self::AdiabaticWall
            | Self::BasementAdiabaticWall
            | Self::BasementExteriorWall => "Wall",
            Self::Floor | Self::BasementFloor => "Floor",
            Self::Roof => "Roof",
            Self::InteriorCeiling => "Ceiling",
        }
    }
}

/// What lies on the outside of a surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum BoundaryCondition {
    Outdoors,
    Adiabatic,
    Ground,
    /// Paired with the named surface of another zone.
    Surface(String),
}

impl BoundaryCondition {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Outdoors => "Outdoors",
            Self::Adiabatic => "Adiabatic",
            Self::Ground => "Ground",
            Self::Surface(_) => "Surface",
        }
    }

    /// Name of the linked surface, empty unless `Surface`.
    pub fn object(&self) -> &str {
        match self {
            Self::Surface(name) => name,
            _ => "",
        }
    }

    pub fn is_exposed(&self) -> bool {
        matches!(self, Self::Outdoors)
    }
}

impl fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surface(name) => write!(f, "Surface({})", name),
            other => f.write_str(other.keyword()),
        }
    }
}

/// One planar face of a zone envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Surface {
    pub name: String,
    pub kind: SurfaceKind,
    pub zone: ZoneKind,
    pub boundary: BoundaryCondition,
    vertices: Vec<Point>,
}

impl Surface {
    /// Fails if fewer than 3 vertices are given.
    pub fn new(
        name: impl Into<String>,
        kind: SurfaceKind,
        zone: ZoneKind,
        boundary: BoundaryCondition,
        vertices: Vec<Point>,
    ) -> Result<Self> {
        let name = name.into();
        if vertices.len() < 3 {
            return Err(UbemError::Geometry(format!(
                "surface {} has {} vertices",
                name,
                vertices.len()
            )));
        }
        Ok(Self {
            name,
            kind,
            zone,
            boundary,
            vertices,
        })
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn sun_exposed(&self) -> bool {
        self.boundary.is_exposed()
    }

    pub fn wind_exposed(&self) -> bool {
        self.boundary.is_exposed()
    }

    pub fn construction_name(&self) -> &'static str {
        match self.kind {
            SurfaceKind::ExteriorWall | SurfaceKind::AdiabaticWall => "Exterior Wall",
            SurfaceKind::Roof => "Exterior Roof",
            SurfaceKind::Floor => match self.boundary {
                BoundaryCondition::Surface(_) => "Interior Floor",
                _ => "Exterior Floor",
            },
            SurfaceKind::InteriorCeiling => "Interior Ceiling",
            SurfaceKind::BasementAdiabaticWall | SurfaceKind::BasementExteriorWall => {
                "Exterior Wall Basement"
            }
            SurfaceKind::BasementFloor => "Exterior Floor Basement",
        }
    }

    /// Newell normal, not normalized. Its length is twice the area.
    fn newell(&self) -> (f64, f64, f64) {
        newell(&self.vertices)
    }

    pub fn area(&self) -> f64 {
        let (x, y, z) = self.newell();
        0.5 * (x * x + y * y + z * z).sqrt()
    }

    /// Unit normal following the right-hand rule over the vertex order.
    pub fn normal(&self) -> Option<Point> {
        unit(self.newell())
    }

    pub fn z_range(&self) -> (f64, f64) {
        z_range(&self.vertices)
    }

    pub fn center(&self) -> Point {
        center(&self.vertices)
    }

    /// True if the normal points away from `inside`.
    pub fn faces_away_from(&self, inside: &Point) -> bool {
        faces_away(&self.vertices, inside)
    }
}

/// Rectangular glazing hosted by a wall.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Window {
    pub name: String,
    /// Name of the hosting wall surface.
    pub host: String,
    pub zone: ZoneKind,
    vertices: [Point; 4],
}

impl Window {
    pub fn new(name: impl Into<String>, host: impl Into<String>, zone: ZoneKind, vertices: [Point; 4]) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            zone,
            vertices,
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn construction_name(&self) -> &'static str {
        "Exterior Window"
    }

    pub fn area(&self) -> f64 {
        let (x, y, z) = newell(&self.vertices);
        0.5 * (x * x + y * y + z * z).sqrt()
    }

    pub fn normal(&self) -> Option<Point> {
        unit(newell(&self.vertices))
    }

    pub fn z_range(&self) -> (f64, f64) {
        z_range(&self.vertices)
    }

    pub fn faces_away_from(&self, inside: &Point) -> bool {
        faces_away(&self.vertices, inside)
    }
}

fn newell(pts: &[Point]) -> (f64, f64, f64) {
    let n = pts.len();
    let (mut x, mut y, mut z) = (0.0, 0.0, 0.0);
    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        x += (a.y - b.y) * (a.z + b.z);
        y += (a.z - b.z) * (a.x + b.x);
        z += (a.x - b.x) * (a.y + b.y);
    }
    (x, y, z)
}

fn unit((x, y, z): (f64, f64, f64)) -> Option<Point> {
    let len = (x * x + y * y + z * z).sqrt();
    if len < EPS {
        return None;
    }
    Some(Point::new(x / len, y / len, z / len))
}

fn center(pts: &[Point]) -> Point {
    let n = pts.len().max(1) as f64;
    let (x, y, z) = pts
        .iter()
        .fold((0.0, 0.0, 0.0), |(x, y, z), p| (x + p.x, y + p.y, z + p.z));
    Point::new(x / n, y / n, z / n)
}

fn faces_away(pts: &[Point], inside: &Point) -> bool {
    let (nx, ny, nz) = newell(pts);
    let c = center(pts);
    nx * (c.x - inside.x) + ny * (c.y - inside.y) + nz * (c.z - inside.z) > 0.0
}

fn z_range(pts: &[Point]) -> (f64, f64) {
    pts.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.z), hi.max(p.z))
    })
}
