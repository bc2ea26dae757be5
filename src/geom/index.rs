use crate::BuildingId;
use crate::geom::footprint::Footprint;
use geo::{Coord, Rect};
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// Read-only uniform grid over a neighbor dataset.
///
/// Each footprint is registered in every cell its bounding box overlaps.
/// The index is built once per batch and shared by reference between workers.
pub struct FootprintIndex {
    footprints: Vec<Footprint>,
    by_id: HashMap<BuildingId, usize>,
    by_parcel: HashMap<String, Vec<usize>>,
    grid: HashMap<(i64, i64), Vec<usize>>,
    cell_size: f64,
}

impl FootprintIndex {
    /// Builds the index. When two footprints share an identity the first one wins.
    pub fn new(footprints: Vec<Footprint>, cell_size: f64) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { 50.0 };
        let mut kept: Vec<Footprint> = Vec::with_capacity(footprints.len());
        let mut by_id: HashMap<BuildingId, usize> = HashMap::new();
        let mut by_parcel: HashMap<String, Vec<usize>> = HashMap::new();
        let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();

        for fp in footprints {
            if by_id.contains_key(&fp.id) {
                warn!("Duplicate footprint id {} ignored", fp.id);
                continue;
            }
            let Some(bbox) = fp.bbox() else {
                continue;
            };
            let idx = kept.len();
            by_id.insert(fp.id.clone(), idx);
            if let Some(parcel) = &fp.parcel {
                by_parcel.entry(parcel.code.clone()).or_default().push(idx);
            }
            let (imin, jmin) = cell_of(bbox.min(), cell_size);
            let (imax, jmax) = cell_of(bbox.max(), cell_size);
            for i in imin..=imax {
                for j in jmin..=jmax {
                    grid.entry((i, j)).or_default().push(idx);
                }
            }
            kept.push(fp);
        }

        Self {
            footprints: kept,
            by_id,
            by_parcel,
            grid,
            cell_size,
        }
    }

    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    pub fn footprints(&self) -> &[Footprint] {
        &self.footprints
    }

    pub fn get(&self, id: &BuildingId) -> Option<&Footprint> {
        self.by_id.get(id).map(|&i| &self.footprints[i])
    }

    /// Footprints whose bounding box overlaps `area`, ordered by identity.
    ///
    /// The order does not depend on the order the dataset was loaded in.
    pub fn candidates(&self, area: Rect<f64>) -> Vec<&Footprint> {
        let (imin, jmin) = cell_of(area.min(), self.cell_size);
        let (imax, jmax) = cell_of(area.max(), self.cell_size);

        let mut hits: BTreeSet<usize> = BTreeSet::new();
        for i in imin..=imax {
            for j in jmin..=jmax {
                if let Some(indices) = self.grid.get(&(i, j)) {
                    hits.extend(indices);
                }
            }
        }

        let mut out: Vec<&Footprint> = hits
            .into_iter()
            .map(|i| &self.footprints[i])
            .filter(|fp| fp.bbox().is_some_and(|b| rects_overlap(&b, &area)))
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// All footprints registered on the given parcel, ordered by identity.
    pub fn parcel_members(&self, code: &str) -> Vec<&Footprint> {
        let mut out: Vec<&Footprint> = self
            .by_parcel
            .get(code)
            .map(|v| v.iter().map(|&i| &self.footprints[i]).collect())
            .unwrap_or_default();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}

fn cell_of(c: Coord<f64>, step: f64) -> (i64, i64) {
    ((c.x / step).floor() as i64, (c.y / step).floor() as i64)
}

fn rects_overlap(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x <= b.max().x && a.max().x >= b.min().x && a.min().y <= b.max().y && a.max().y >= b.min().y
}

/// Rectangle grown by `margin` on every side.
pub fn expand_rect(r: Rect<f64>, margin: f64) -> Rect<f64> {
    Rect::new(
        Coord {
            x: r.min().x - margin,
            y: r.min().y - margin,
        },
        Coord {
            x: r.max().x + margin,
            y: r.max().y + margin,
        },
    )
}
