//! Building footprints as read from the geographic dataset.

use crate::BuildingId;
use crate::error::{Result, UbemError};
use geo::{Area, BoundingRect, Centroid, Coord, LineString, Polygon, Rect};
use serde::{Deserialize, Serialize};

/// Land parcel (property) a building stands on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelInfo {
    /// Parcel identity; buildings sharing it share the parcel.
    pub code: String,
    /// Parcel area in m^2.
    pub area: f64,
}

/// Immutable planar footprint of one building plus the metadata the
/// neighbor queries need.
#[derive(Debug, Clone)]
pub struct Footprint {
    pub id: BuildingId,
    pub polygon: Polygon<f64>,
    /// Building height in m.
    pub height: f64,
    pub parcel: Option<ParcelInfo>,
}

impl Footprint {
    /// Creates a footprint from an ordered list of (x, y) vertices.
    ///
    /// The ring may be given open or closed. Fails if fewer than
    /// 3 distinct vertices remain or if the enclosed area is zero.
    pub fn new(
        id: BuildingId,
        vertices: &[[f64; 2]],
        height: f64,
        parcel: Option<ParcelInfo>,
    ) -> Result<Self> {
        let coords: Vec<Coord<f64>> = vertices.iter().map(|&[x, y]| Coord { x, y }).collect();
        let ring = open_ring(&coords);
        if ring.len() < 3 {
            return Err(UbemError::Geometry(format!(
                "footprint of {} has {} vertices, at least 3 are required",
                id,
                ring.len()
            )));
        }
        let polygon = Polygon::new(LineString::from(ring), vec![]);
        if polygon.unsigned_area() <= 0.0 {
            return Err(UbemError::Geometry(format!(
                "footprint of {} encloses no area",
                id
            )));
        }
        Ok(Self {
            id,
            polygon,
            height,
            parcel,
        })
    }

    pub fn area(&self) -> f64 {
        self.polygon.unsigned_area()
    }

    pub fn centroid(&self) -> Option<geo::Point<f64>> {
        self.polygon.centroid()
    }

    pub fn bbox(&self) -> Option<Rect<f64>> {
        self.polygon.bounding_rect()
    }

    /// Exterior ring vertices without the closing duplicate.
    pub fn ring(&self) -> Vec<Coord<f64>> {
        open_ring(&self.polygon.exterior().0)
    }
}

/// Removes the closing vertex of a ring if it repeats the first one.
pub fn open_ring(coords: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let mut ring = coords.to_vec();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_closed_input() -> Result<()> {
        let open = Footprint::new(
            "a".into(),
            &[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
            6.0,
            None,
        )?;
        let closed = Footprint::new(
            "b".into(),
            &[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
            6.0,
            None,
        )?;
        assert_eq!(open.ring().len(), 4);
        assert_eq!(closed.ring().len(), 4);
        assert!((open.area() - 100.0).abs() < 1e-10);
        Ok(())
    }

    #[test]
    fn test_degenerate_footprints() {
        let too_few = Footprint::new("a".into(), &[[0.0, 0.0], [1.0, 0.0]], 3.0, None);
        assert!(matches!(too_few, Err(UbemError::Geometry(_))));

        let flat = Footprint::new(
            "b".into(),
            &[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]],
            3.0,
            None,
        );
        assert!(matches!(flat, Err(UbemError::Geometry(_))));
    }

    #[test]
    fn test_centroid() -> Result<()> {
        let fp = Footprint::new(
            "a".into(),
            &[[0.0, 0.0], [4.0, 0.0], [4.0, 2.0], [0.0, 2.0]],
            3.0,
            None,
        )?;
        let c = fp.centroid().ok_or(UbemError::Geometry("no centroid".into()))?;
        assert!((c.x() - 2.0).abs() < 1e-10);
        assert!((c.y() - 1.0).abs() < 1e-10);
        Ok(())
    }
}
