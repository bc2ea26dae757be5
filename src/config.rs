//! Tunable constants of the envelope pipeline.
//!
//! Every algorithm takes its own section by reference. All fields have
//! defaults, so a TOML file only needs to list what it overrides.

use crate::sim::schedule::Weekday;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ring normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Douglas-Peucker tolerance used to drop near-collinear vertices.
    pub simplify_tolerance: f64,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            simplify_tolerance: 0.5,
        }
    }
}

/// Party-wall detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjacencyConfig {
    /// Outward offset of the reference footprint before intersecting neighbors.
    pub buffer_distance: f64,
    /// Mitre length (in multiples of the offset) at which a convex corner is clipped.
    pub mitre_limit: f64,
    /// Edge midpoints closer than this to a neighbor are adiabatic.
    pub adiabatic_distance: f64,
}

impl Default for AdjacencyConfig {
    fn default() -> Self {
        Self {
            buffer_distance: 0.2,
            mitre_limit: 2.0,
            adiabatic_distance: 0.2,
        }
    }
}

/// Envelope surface generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Walls must be strictly longer than this to receive a window.
    pub min_window_wall_length: f64,
    /// Elevation of the basement floor (negative, below grade).
    pub basement_depth: f64,
    /// Top of the above-grade, exposed part of the basement.
    pub basement_exposed_height: f64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            min_window_wall_length: 2.0,
            basement_depth: -1.3,
            basement_exposed_height: 1.0,
        }
    }
}

/// Shading obstruction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingConfig {
    /// Length of each sweep ray from the subject centroid.
    pub ray_length: f64,
    /// Angular step of the sweep in degrees. 5° gives 72 rays.
    pub angle_step_deg: f64,
    /// Parcel floor-area ratio must be strictly above this.
    pub far_threshold: f64,
    /// Parcel building-coverage ratio must be strictly above this.
    pub bcr_threshold: f64,
    /// Storey height used to turn building heights into floor counts for FAR.
    pub far_floor_height: f64,
    /// Neighbors closer than this are party walls, not obstacles.
    pub party_wall_distance: f64,
}

impl ShadingConfig {
    /// Number of rays in a full sweep.
    pub fn ray_count(&self) -> usize {
        (360.0 / self.angle_step_deg).round() as usize
    }
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            ray_length: 100.0,
            angle_step_deg: 5.0,
            far_threshold: 1.0,
            bcr_threshold: 0.3,
            far_floor_height: 2.8,
            party_wall_distance: 0.2,
        }
    }
}

/// Derivation of height and glazing from building metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingConfig {
    /// Floor-to-floor height in m.
    pub floor_height: f64,
    /// Height added to the above-ground height when a basement exists.
    pub basement_height_bonus: f64,
    /// Window area as a fraction of gross floor area.
    pub glazing_fraction: f64,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        Self {
            floor_height: 2.5,
            basement_height_bonus: 1.0,
            glazing_fraction: 0.1,
        }
    }
}

/// Internal gains and domestic hot water.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GainsConfig {
    /// Heated floor area per occupant in m^2.
    pub floor_area_per_person: f64,
    /// Lighting design level per occupant in W.
    pub lighting_w_per_person: f64,
    /// Electric equipment design level per occupant in W.
    pub equipment_w_per_person: f64,
    /// Hot water supply temperature in °C.
    pub hot_water_temperature: f64,
    /// Cold (mains) water temperature in °C.
    pub cold_water_temperature: f64,
}

impl Default for GainsConfig {
    fn default() -> Self {
        Self {
            floor_area_per_person: 42.0,
            lighting_w_per_person: 1.0,
            equipment_w_per_person: 1.0,
            hot_water_temperature: 55.0,
            cold_water_temperature: 10.0,
        }
    }
}

/// Annual profile synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Scaling of the lighting profile relative to the source survey.
    pub lighting_factor: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            lighting_factor: 0.75,
        }
    }
}

/// Ventilation, infiltration and ideal loads heating.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HvacConfig {
    /// Thermostat heating setpoint in °C.
    pub heating_setpoint: f64,
    /// Cooling setpoint in °C, high enough to keep cooling off.
    pub cooling_setpoint: f64,
    /// Mechanical ventilation in air changes per hour.
    pub ventilation_ach: f64,
    /// Exhaust, Intake, Natural or Balanced.
    pub ventilation_type: String,
    /// Infiltration in air changes per hour, unless the record gives one.
    pub infiltration_ach: f64,
    /// Sensible effectiveness of buildings with heat recovery.
    pub heat_recovery_effectiveness: f64,
}

impl Default for HvacConfig {
    fn default() -> Self {
        Self {
            heating_setpoint: 21.0,
            cooling_setpoint: 45.0,
            ventilation_ach: 0.5,
            ventilation_type: "Exhaust".to_string(),
            infiltration_ach: 0.1,
            heat_recovery_effectiveness: 0.5,
        }
    }
}

/// Engine run setup written into every model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Engine version identifier.
    pub version: String,
    pub timesteps_per_hour: u32,
    /// Weekday of January 1st of the simulated year.
    pub first_day: Weekday,
    pub terrain: String,
    pub solar_distribution: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            version: "9.2".to_string(),
            timesteps_per_hour: 6,
            first_day: Weekday::Monday,
            terrain: "City".to_string(),
            solar_distribution: "FullExterior".to_string(),
        }
    }
}

/// Spatial index over the neighbor dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Grid cell edge length in m.
    pub cell_size: f64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { cell_size: 50.0 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UbemConfig {
    pub ring: RingConfig,
    pub adjacency: AdjacencyConfig,
    pub envelope: EnvelopeConfig,
    pub shading: ShadingConfig,
    pub building: BuildingConfig,
    pub gains: GainsConfig,
    pub profiles: ProfileConfig,
    pub hvac: HvacConfig,
    pub run: RunConfig,
    pub index: IndexConfig,
}

impl UbemConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }
}
