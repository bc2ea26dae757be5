use crate::config::HvacConfig;
use crate::sim::building::BuildingRecord;
use serde::Serialize;

/// Ventilation, infiltration and ideal-loads settings of one building.
///
/// Every conditioned zone gets the same system.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HvacSystem {
    /// Heating setpoint in °C.
    pub heating_setpoint: f64,
    /// Cooling setpoint in °C.
    pub cooling_setpoint: f64,
    /// Mechanical ventilation in air changes per hour.
    pub ventilation_ach: f64,
    pub ventilation_type: String,
    /// Infiltration in air changes per hour.
    pub infiltration_ach: f64,
    pub heat_recovery: bool,
    /// Sensible effectiveness, 0 without heat recovery.
    pub heat_recovery_effectiveness: f64,
}

impl HvacSystem {
    pub fn for_record(record: &BuildingRecord, cfg: &HvacConfig) -> Self {
        Self {
            heating_setpoint: cfg.heating_setpoint,
            cooling_setpoint: cfg.cooling_setpoint,
            ventilation_ach: cfg.ventilation_ach,
            ventilation_type: cfg.ventilation_type.clone(),
            infiltration_ach: record.infiltration_ach.unwrap_or(cfg.infiltration_ach),
            heat_recovery: record.heat_recovery,
            heat_recovery_effectiveness: if record.heat_recovery {
                cfg.heat_recovery_effectiveness
            } else {
                0.0
            },
        }
    }

    /// Heat recovery keyword of the ideal loads system.
    pub fn heat_recovery_type(&self) -> &'static str {
        if self.heat_recovery { "Sensible" } else { "None" }
    }
}
