//! Envelope surface generation.
//!
//! Turns a normalized footprint ring into the walls, windows, floor and roof
//! of the main zone and, if the building has underground levels, the
//! surfaces of a basement zone below it.
//!
//! Walls are emitted per ring edge `i -> i+1` with vertices
//! `(p_i, z0), (p_i+1, z0), (p_i+1, z1), (p_i, z1)`, so on a counter-clockwise
//! ring every wall and window faces away from the zone. Horizontal faces use
//! the reversed ring, except the basement floor which follows the ring order.
//! The ground floor then faces down and out of the main zone, while the roof,
//! the interior ceiling and the basement floor face into theirs.

use crate::config::EnvelopeConfig;
use crate::error::{Result, UbemError};
use crate::geom::point::Point;
use crate::geom::ring::NormalizedRing;
use crate::geom::surface::{BoundaryCondition, Surface, SurfaceKind, Window, ZoneKind};
use crate::geom::zone::Zone;
use crate::sim::adjacency::AdjacencyRecord;
use geo::{Coord, Line};
use tracing::{debug, warn};

pub const FLOOR: &str = "Floor";
pub const INTERIOR_FLOOR: &str = "Interior Floor";
pub const ROOF: &str = "Roof";
pub const INTERIOR_CEILING: &str = "Interior Ceiling";
pub const BASEMENT_FLOOR: &str = "Basement Floor";

/// Complete envelope of one building.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub main: Zone,
    pub basement: Option<Zone>,
}

impl Envelope {
    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        std::iter::once(&self.main).chain(self.basement.iter())
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.zones().flat_map(|z| z.surfaces.iter())
    }

    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.zones().flat_map(|z| z.windows.iter())
    }

    pub fn has_basement(&self) -> bool {
        self.basement.is_some()
    }

    /// Conditioned floor area of all zones.
    pub fn floor_area(&self) -> f64 {
        self.zones().map(|z| z.floor_area()).sum()
    }

    /// Total glazed area of all windows.
    pub fn window_area(&self) -> f64 {
        self.windows().map(|w| w.area()).sum()
    }
}

/// Generates the envelope surfaces of a building.
///
/// * `ring` - normalized footprint
/// * `height` - height of the main zone above grade
/// * `basement_levels` - number of underground levels, 0 means no basement
/// * `wwr` - window-to-wall ratio in (0, 1)
/// * `adjacency` - per-edge records, edges without a record are exterior
pub fn generate_envelope(
    ring: &NormalizedRing,
    height: f64,
    basement_levels: u32,
    wwr: f64,
    adjacency: &[AdjacencyRecord],
    cfg: &EnvelopeConfig,
) -> Result<Envelope> {
    if ring.len() < 3 {
        return Err(UbemError::Geometry(format!(
            "ring has {} edges, at least 3 are required",
            ring.len()
        )));
    }
    if !(height.is_finite() && height > 0.0) {
        return Err(UbemError::Geometry(format!(
            "building height must be positive, got {}",
            height
        )));
    }
    if !(wwr > 0.0 && wwr < 1.0) {
        return Err(UbemError::Geometry(format!(
            "window-to-wall ratio must be in (0, 1), got {}",
            wwr
        )));
    }
    if wwr >= 0.5 {
        warn!("WWR {} leaves no horizontal window band, walls stay unglazed", wwr);
    }

    let has_basement = basement_levels > 0;
    let mut main = Zone::new(ZoneKind::Main);

    for (i, edge) in ring.edges().enumerate() {
        let adiabatic = adjacency.iter().any(|r| r.edge_index == i && r.is_adiabatic);
        let name = format!("Wall{}", i);
        if adiabatic {
            debug!("Edge {} is a party wall", i);
            main.surfaces.push(wall(
                &name,
                SurfaceKind::AdiabaticWall,
                ZoneKind::Main,
                BoundaryCondition::Adiabatic,
                edge,
                0.0,
                height,
            )?);
        } else {
            main.surfaces.push(wall(
                &name,
                SurfaceKind::ExteriorWall,
                ZoneKind::Main,
                BoundaryCondition::Outdoors,
                edge,
                0.0,
                height,
            )?);
            if let Some(w) = window(&format!("Window{}", i), &name, ZoneKind::Main, edge, 0.0, height, wwr, cfg) {
                main.windows.push(w);
            }
        }
    }

    let reversed = ring.reversed();
    let (floor_name, floor_boundary) = if has_basement {
        (INTERIOR_FLOOR, BoundaryCondition::Surface(INTERIOR_CEILING.to_string()))
    } else {
        (FLOOR, BoundaryCondition::Ground)
    };
    main.surfaces.push(Surface::new(
        floor_name,
        SurfaceKind::Floor,
        ZoneKind::Main,
        floor_boundary,
        horizontal(&reversed, 0.0),
    )?);
    main.surfaces.push(Surface::new(
        ROOF,
        SurfaceKind::Roof,
        ZoneKind::Main,
        BoundaryCondition::Outdoors,
        horizontal(&reversed, height),
    )?);

    let basement = if has_basement {
        Some(basement_zone(ring, &reversed, wwr, cfg)?)
    } else {
        None
    };

    debug!(
        "Envelope: {} surfaces, {} windows, basement: {}",
        main.surfaces.len() + basement.as_ref().map_or(0, |b| b.surfaces.len()),
        main.windows.len() + basement.as_ref().map_or(0, |b| b.windows.len()),
        has_basement
    );

    Ok(Envelope { main, basement })
}

fn basement_zone(
    ring: &NormalizedRing,
    reversed: &[Coord<f64>],
    wwr: f64,
    cfg: &EnvelopeConfig,
) -> Result<Zone> {
    let depth = cfg.basement_depth;
    let exposed = cfg.basement_exposed_height;
    let mut zone = Zone::new(ZoneKind::Basement);

    for (i, edge) in ring.edges().enumerate() {
        zone.surfaces.push(wall(
            &format!("WallBasementAdiabatic{}", i),
            SurfaceKind::BasementAdiabaticWall,
            ZoneKind::Basement,
            BoundaryCondition::Adiabatic,
            edge,
            depth,
            0.0,
        )?);

        let host = format!("WallBasement{}", i);
        zone.surfaces.push(wall(
            &host,
            SurfaceKind::BasementExteriorWall,
            ZoneKind::Basement,
            BoundaryCondition::Outdoors,
            edge,
            0.0,
            exposed,
        )?);
        if let Some(w) = window(&format!("WindowBasement{}", i), &host, ZoneKind::Basement, edge, 0.0, exposed, wwr, cfg) {
            zone.windows.push(w);
        }
    }

    zone.surfaces.push(Surface::new(
        INTERIOR_CEILING,
        SurfaceKind::InteriorCeiling,
        ZoneKind::Basement,
        BoundaryCondition::Surface(INTERIOR_FLOOR.to_string()),
        horizontal(reversed, exposed),
    )?);
    zone.surfaces.push(Surface::new(
        BASEMENT_FLOOR,
        SurfaceKind::BasementFloor,
        ZoneKind::Basement,
        BoundaryCondition::Adiabatic,
        horizontal(ring.vertices(), depth),
    )?);
    Ok(zone)
}

fn wall(
    name: &str,
    kind: SurfaceKind,
    zone: ZoneKind,
    boundary: BoundaryCondition,
    edge: Line<f64>,
    z0: f64,
    z1: f64,
) -> Result<Surface> {
    Surface::new(
        name,
        kind,
        zone,
        boundary,
        vec![
            Point::at_elevation(edge.start, z0),
            Point::at_elevation(edge.end, z0),
            Point::at_elevation(edge.end, z1),
            Point::at_elevation(edge.start, z1),
        ],
    )
}

/// Window centered on the wall spanning `[z0, z1]` over `edge`.
///
/// Horizontally the window runs between the edge parameters `wwr` and
/// `1 - wwr`; vertically it is inset by `(H - H * sqrt(wwr)) / 2` at both
/// ends. Returns `None` for short walls and when the band is empty.
#[allow(clippy::too_many_arguments)]
fn window(
    name: &str,
    host: &str,
    zone: ZoneKind,
    edge: Line<f64>,
    z0: f64,
    z1: f64,
    wwr: f64,
    cfg: &EnvelopeConfig,
) -> Option<Window> {
    let length = (edge.dx() * edge.dx() + edge.dy() * edge.dy()).sqrt();
    if length <= cfg.min_window_wall_length || wwr >= 0.5 {
        return None;
    }
    let (start, end) = (Point::at_elevation(edge.start, z0), Point::at_elevation(edge.end, z0));
    let a = Point::new_between_2_points(start, end, wwr).planar();
    let b = Point::new_between_2_points(start, end, 1.0 - wwr).planar();
    let h = z1 - z0;
    let r = (h - h * wwr.sqrt()) / 2.0;
    let (lo, hi) = (z0 + r, z1 - r);
    Some(Window::new(
        name,
        host,
        zone,
        [
            Point::at_elevation(a, lo),
            Point::at_elevation(b, lo),
            Point::at_elevation(b, hi),
            Point::at_elevation(a, hi),
        ],
    ))
}

fn horizontal(coords: &[Coord<f64>], z: f64) -> Vec<Point> {
    coords.iter().map(|&c| Point::at_elevation(c, z)).collect()
}
