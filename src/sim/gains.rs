use crate::config::{BuildingConfig, GainsConfig};
use serde::Serialize;

/// Number of occupants of a building.
///
/// Floors are whole storeys of `floor_height`; every `floor_area_per_person`
/// m^2 of gross floor area houses one person.
pub fn estimate_occupants(area: f64, height: f64, building: &BuildingConfig, gains: &GainsConfig) -> u32 {
    let floors = (height / building.floor_height).floor().max(0.0);
    let occupants = (area * floors / gains.floor_area_per_person).floor();
    if occupants.is_finite() { occupants.max(0.0) as u32 } else { 0 }
}

/// Internal gains design levels of one building.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InternalGains {
    pub occupants: u32,
    /// Lighting design level in W.
    pub lighting_w: f64,
    /// Electric equipment design level in W.
    pub equipment_w: f64,
    /// Peak hot water flow in m^3/s.
    pub hot_water_peak_m3_s: f64,
    pub hot_water_temperature: f64,
    pub cold_water_temperature: f64,
}

impl InternalGains {
    /// `hot_water_peak_per_person` is the peak of the annual hot water profile.
    pub fn new(occupants: u32, hot_water_peak_per_person: f64, cfg: &GainsConfig) -> Self {
        let n = f64::from(occupants);
        Self {
            occupants,
            lighting_w: n * cfg.lighting_w_per_person,
            equipment_w: n * cfg.equipment_w_per_person,
            hot_water_peak_m3_s: n * hot_water_peak_per_person,
            hot_water_temperature: cfg.hot_water_temperature,
            cold_water_temperature: cfg.cold_water_temperature,
        }
    }
}
