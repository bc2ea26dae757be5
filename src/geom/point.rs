use crate::geom::EPS;
use geo::Coord;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Lifts a planar coordinate to elevation `z`.
    pub fn at_elevation(c: Coord<f64>, z: f64) -> Self {
        Self { x: c.x, y: c.y, z }
    }

    /// Returns true if both points are very close to each other.
    pub fn is_close(&self, other: &Self) -> bool {
        (self.x - other.x).abs() < EPS
            && (self.y - other.y).abs() < EPS
            && (self.z - other.z).abs() < EPS
    }

    /// Drops the elevation.
    pub fn planar(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }

    // Creates a new point along the edge pt1->pt2 with some relative distance from pt1.
    pub fn new_between_2_points(pt1: Self, pt2: Self, rel_d: f64) -> Self {
        Self::new(
            pt1.x * (1. - rel_d) + pt2.x * rel_d,
            pt1.y * (1. - rel_d) + pt2.y * rel_d,
            pt1.z * (1. - rel_d) + pt2.z * rel_d,
        )
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(2); // Default 2 decimals
        write!(
            f,
            "Point({:.prec$}, {:.prec$}, {:.prec$})",
            self.x,
            self.y,
            self.z,
            prec = prec
        )
    }
}
