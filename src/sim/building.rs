//! Per-building inputs derived from the dataset record.

use crate::BuildingId;
use crate::config::{BuildingConfig, EnvelopeConfig};
use crate::error::{Result, UbemError};
use crate::geom::footprint::{Footprint, ParcelInfo};
use crate::geom::ring::NormalizedRing;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One building of the source dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    pub id: BuildingId,
    /// Footprint ring as (x, y) pairs, open or closed.
    pub footprint: Vec<[f64; 2]>,
    #[serde(default)]
    pub height: Option<f64>,
    /// Above-ground storeys.
    #[serde(default)]
    pub floors: Option<u32>,
    #[serde(default)]
    pub construction_year: Option<i32>,
    #[serde(default)]
    pub building_type: String,
    /// Underground storeys.
    #[serde(default)]
    pub basement_levels: u32,
    #[serde(default)]
    pub parcel: Option<ParcelInfo>,
    #[serde(default)]
    pub wwr: Option<f64>,
    /// Ventilation with heat recovery from exhaust air.
    #[serde(default)]
    pub heat_recovery: bool,
    /// Overrides the configured infiltration rate, in air changes per hour.
    #[serde(default)]
    pub infiltration_ach: Option<f64>,
}

impl BuildingRecord {
    pub fn has_basement(&self) -> bool {
        self.basement_levels > 0
    }

    pub fn category(&self) -> BuildingCategory {
        BuildingCategory::from_type_label(&self.building_type)
    }

    /// Footprint with the derived height.
    pub fn to_footprint(&self, cfg: &BuildingConfig) -> Result<Footprint> {
        let height = record_height(self, cfg)?;
        Footprint::new(self.id.clone(), &self.footprint, height, self.parcel.clone())
    }
}

/// Main building category, selects the occupant profile set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingCategory {
    Apartment,
    House,
}

impl BuildingCategory {
    /// Multi-family residential labels are apartments, everything else houses.
    pub fn from_type_label(label: &str) -> Self {
        match label.trim() {
            "Bostad; Flerfamiljshus" | "Residential;MultifamilyBuilding" => Self::Apartment,
            _ => Self::House,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Apartment => "Apartment",
            Self::House => "House",
        }
    }
}

impl fmt::Display for BuildingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuildingCategory {
    type Err = UbemError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apartment" => Ok(Self::Apartment),
            "house" => Ok(Self::House),
            _ => Err(UbemError::input(s, "unknown building category")),
        }
    }
}

/// Height of the main zone.
///
/// An explicit height wins. Otherwise storeys times the floor height, plus a
/// fixed bonus when the building has a basement.
pub fn record_height(record: &BuildingRecord, cfg: &BuildingConfig) -> Result<f64> {
    let height = match (record.height, record.floors) {
        (Some(h), _) => h,
        (None, Some(floors)) => {
            let bonus = if record.has_basement() {
                cfg.basement_height_bonus
            } else {
                0.0
            };
            f64::from(floors) * cfg.floor_height + bonus
        }
        (None, None) => {
            return Err(UbemError::input(record.id.as_str(), "neither height nor floor count given"));
        }
    };
    if !(height.is_finite() && height > 0.0) {
        return Err(UbemError::input(
            record.id.as_str(),
            format!("height must be positive, got {}", height),
        ));
    }
    Ok(height)
}

/// Window-to-wall ratio of a building.
///
/// An explicit ratio wins. Otherwise the glazed area is a fixed fraction of
/// the gross floor area, spread over the walls long enough to hold windows.
pub fn derive_wwr(
    record: &BuildingRecord,
    ring: &NormalizedRing,
    building: &BuildingConfig,
    envelope: &EnvelopeConfig,
) -> Result<f64> {
    let wwr = match record.wwr {
        Some(w) => w,
        None => {
            let floors = match (record.floors, record.height) {
                (Some(f), _) => f64::from(f),
                (None, Some(h)) => (h / building.floor_height).round(),
                (None, None) => 0.0,
            };
            let area = ring.signed_area().abs();
            let window_area = (area * floors * building.glazing_fraction).round();
            let perimeter: f64 = (0..ring.len())
                .map(|i| ring.edge_length(i))
                .filter(|&l| l > envelope.min_window_wall_length)
                .sum();
            window_area / (perimeter * floors * building.floor_height)
        }
    };
    if !(wwr.is_finite() && wwr > 0.0 && wwr < 1.0) {
        return Err(UbemError::input(
            record.id.as_str(),
            format!("window-to-wall ratio must be in (0, 1), got {}", wwr),
        ));
    }
    Ok(wwr)
}
