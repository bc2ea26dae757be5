//! Shading obstruction search.
//!
//! On dense parcels, rays are swept around the footprint centroid and the
//! nearest neighbor crossing each ray becomes an opaque obstacle prism.

use crate::BuildingId;
use crate::config::ShadingConfig;
use crate::error::{Result, UbemError};
use crate::geom::footprint::{Footprint, open_ring};
use crate::geom::index::{FootprintIndex, expand_rect};
use crate::geom::point::Point;
use geo::{Area, Coord, EuclideanDistance, Intersects, Line, Polygon, Rect};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Neighbor building casting shade on the subject.
#[derive(Debug, Clone)]
pub struct ShadingObstacle {
    pub id: BuildingId,
    pub polygon: Polygon<f64>,
    pub height: f64,
    /// Planar distance between the two footprints.
    pub distance: f64,
}

/// One opaque face of an obstacle prism.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShadingSurface {
    pub name: String,
    pub vertices: Vec<Point>,
}

/// Coverage and floor-area ratios of a parcel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParcelDensity {
    pub bcr: f64,
    pub far: f64,
}

/// Computes the density of the parcel `subject` stands on.
///
/// Returns `None` when the subject has no parcel or the parcel area is not
/// positive.
pub fn parcel_density(subject: &Footprint, index: &FootprintIndex, cfg: &ShadingConfig) -> Option<ParcelDensity> {
    let parcel = subject.parcel.as_ref()?;
    if parcel.area <= 0.0 {
        return None;
    }
    let mut members = index.parcel_members(&parcel.code);
    if members.iter().all(|fp| fp.id != subject.id) {
        members.push(subject);
    }
    let built: f64 = members.iter().map(|fp| fp.area()).sum();
    let floor_area: f64 = members
        .iter()
        .map(|fp| fp.area() * (fp.height / cfg.far_floor_height).round())
        .sum();
    Some(ParcelDensity {
        bcr: built / parcel.area,
        far: floor_area / parcel.area,
    })
}

/// Densification check: FAR and BCR both above their thresholds.
pub fn is_densified(subject: &Footprint, index: &FootprintIndex, cfg: &ShadingConfig) -> bool {
    parcel_density(subject, index, cfg)
        .is_some_and(|d| d.far > cfg.far_threshold && d.bcr > cfg.bcr_threshold)
}

/// Finds the obstacles around `subject`.
///
/// One ray per angular step is cast from the centroid, counter-clockwise
/// from +x. Each ray keeps its nearest crossing neighbor, skipping the
/// subject itself and party-wall neighbors. Obstacles are returned once each,
/// in the order of the first ray that hit them.
pub fn find_obstacles(
    subject: &Footprint,
    index: &FootprintIndex,
    cfg: &ShadingConfig,
) -> Result<Vec<ShadingObstacle>> {
    let center = subject
        .centroid()
        .ok_or_else(|| UbemError::Geometry(format!("footprint of {} has no centroid", subject.id)))?;
    let center = Coord {
        x: center.x(),
        y: center.y(),
    };

    let sweep = Rect::new(center, center);
    let candidates: Vec<(&Footprint, f64)> = index
        .candidates(expand_rect(sweep, cfg.ray_length))
        .into_iter()
        .filter(|fp| fp.id != subject.id)
        .map(|fp| (fp, subject.polygon.euclidean_distance(&fp.polygon)))
        .filter(|&(_, d)| d >= cfg.party_wall_distance)
        .collect();

    let n = cfg.ray_count();
    let step = cfg.angle_step_deg.to_radians();
    let hits: Vec<Option<usize>> = (0..n)
        .into_par_iter()
        .map(|k| {
            let angle = k as f64 * step;
            let ray = Line::new(
                center,
                Coord {
                    x: center.x + cfg.ray_length * angle.cos(),
                    y: center.y + cfg.ray_length * angle.sin(),
                },
            );
            nearest_hit(&ray, &candidates)
        })
        .collect();

    let mut seen: HashSet<usize> = HashSet::new();
    let mut obstacles = Vec::new();
    for hit in hits.into_iter().flatten() {
        if seen.insert(hit) {
            let (fp, distance) = candidates[hit];
            obstacles.push(ShadingObstacle {
                id: fp.id.clone(),
                polygon: fp.polygon.clone(),
                height: fp.height,
                distance,
            });
        }
    }
    debug!("{} shading obstacles around {}", obstacles.len(), subject.id);
    Ok(obstacles)
}

// Candidates are sorted by id, so a strict comparison keeps the smallest id on ties
fn nearest_hit(ray: &Line<f64>, candidates: &[(&Footprint, f64)]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, (fp, d)) in candidates.iter().enumerate() {
        if ray.intersects(&fp.polygon) && best.is_none_or(|(_, bd)| *d < bd) {
            best = Some((i, *d));
        }
    }
    best.map(|(i, _)| i)
}

/// Extrudes each obstacle from the ground to its height.
///
/// Every footprint edge becomes a vertical quad `Shading{k}_{j}` and the
/// footprint itself, lifted to the top, becomes `Shading{k}_Top`.
pub fn obstacle_prisms(obstacles: &[ShadingObstacle]) -> Vec<ShadingSurface> {
    let mut out = Vec::new();
    for (k, obstacle) in obstacles.iter().enumerate() {
        let mut ring = open_ring(&obstacle.polygon.exterior().0);
        if obstacle.polygon.signed_area() < 0.0 {
            ring.reverse();
        }
        let h = obstacle.height;
        let n = ring.len();
        for j in 0..n {
            let a = ring[j];
            let b = ring[(j + 1) % n];
            out.push(ShadingSurface {
                name: format!("Shading{}_{}", k, j),
                vertices: vec![
                    Point::at_elevation(a, 0.0),
                    Point::at_elevation(b, 0.0),
                    Point::at_elevation(b, h),
                    Point::at_elevation(a, h),
                ],
            });
        }
        out.push(ShadingSurface {
            name: format!("Shading{}_Top", k),
            vertices: ring.iter().map(|&c| Point::at_elevation(c, h)).collect(),
        });
    }
    out
}
