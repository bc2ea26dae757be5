//! Party-wall detection.
//!
//! The reference footprint of a building is grown by a small buffer and
//! intersected with the neighbor dataset. Edges of the normalized ring whose
//! midpoint lies within the adiabatic distance of one of those neighbors are
//! shared walls.

use crate::BuildingId;
use crate::config::AdjacencyConfig;
use crate::error::{Result, UbemError};
use crate::geom::buffer::buffer_mitred;
use crate::geom::footprint::Footprint;
use crate::geom::index::FootprintIndex;
use crate::geom::ring::NormalizedRing;
use geo::{BoundingRect, EuclideanDistance, Intersects};
use serde::Serialize;
use tracing::{debug, warn};

/// Classification of one ring edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjacencyRecord {
    pub edge_index: usize,
    pub is_adiabatic: bool,
    /// Nearest neighbor, set only for adiabatic edges.
    pub neighbor: Option<BuildingId>,
}

impl AdjacencyRecord {
    pub fn exterior(edge_index: usize) -> Self {
        Self {
            edge_index,
            is_adiabatic: false,
            neighbor: None,
        }
    }
}

/// Neighbors whose footprint intersects the buffered reference footprint of `id`.
///
/// Fails with a classification error if `reference` has no footprint for `id`.
pub fn adjacent_footprints<'a>(
    id: &BuildingId,
    neighbors: &'a FootprintIndex,
    reference: &FootprintIndex,
    cfg: &AdjacencyConfig,
) -> Result<Vec<&'a Footprint>> {
    let own = reference
        .get(id)
        .ok_or_else(|| UbemError::Classification(id.to_string()))?;
    let buffered = buffer_mitred(&own.polygon, cfg.buffer_distance, cfg.mitre_limit);
    let Some(area) = buffered.bounding_rect() else {
        return Ok(Vec::new());
    };
    Ok(neighbors
        .candidates(area)
        .into_iter()
        .filter(|fp| fp.id != *id && fp.polygon.intersects(&buffered))
        .collect())
}

/// Classifies every edge of `ring` as exterior or adiabatic.
///
/// Returns one record per edge, in edge order. The result does not depend
/// on the order of the neighbor dataset: distance ties go to the smallest id.
pub fn classify_edges(
    ring: &NormalizedRing,
    id: &BuildingId,
    neighbors: &FootprintIndex,
    reference: &FootprintIndex,
    cfg: &AdjacencyConfig,
) -> Result<Vec<AdjacencyRecord>> {
    let adjacent = adjacent_footprints(id, neighbors, reference, cfg)?;
    if adjacent.is_empty() {
        return Ok((0..ring.len()).map(AdjacencyRecord::exterior).collect());
    }

    let mut records = Vec::with_capacity(ring.len());
    for (i, edge) in ring.edges().enumerate() {
        let mid = geo::Point::new(
            (edge.start.x + edge.end.x) / 2.0,
            (edge.start.y + edge.end.y) / 2.0,
        );

        // `adjacent` is sorted by id, so a strict comparison keeps the smallest id on ties
        let mut nearest: Option<(f64, &BuildingId)> = None;
        for fp in &adjacent {
            let d = mid.euclidean_distance(&fp.polygon);
            if nearest.is_none_or(|(best, _)| d < best) {
                nearest = Some((d, &fp.id));
            }
        }

        match nearest {
            Some((d, neighbor)) if d < cfg.adiabatic_distance => {
                debug!("Edge {} of {} adjoins {} (d = {:.3})", i, id, neighbor, d);
                records.push(AdjacencyRecord {
                    edge_index: i,
                    is_adiabatic: true,
                    neighbor: Some(neighbor.clone()),
                });
            }
            _ => records.push(AdjacencyRecord::exterior(i)),
        }
    }
    Ok(records)
}

/// Like [`classify_edges`], but a missing reference footprint degrades to
/// all edges exterior.
pub fn classify_edges_or_exterior(
    ring: &NormalizedRing,
    id: &BuildingId,
    neighbors: &FootprintIndex,
    reference: &FootprintIndex,
    cfg: &AdjacencyConfig,
) -> Vec<AdjacencyRecord> {
    match classify_edges(ring, id, neighbors, reference, cfg) {
        Ok(records) => records,
        Err(e) => {
            warn!("{}; treating all walls as exterior", e);
            (0..ring.len()).map(AdjacencyRecord::exterior).collect()
        }
    }
}
