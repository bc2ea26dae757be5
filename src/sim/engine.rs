//! Boundary to the external whole-building simulation engine.

use crate::error::{Result, UbemError};
use crate::io::idf::IdfModel;
use serde::Serialize;

/// Runs a whole-building model and returns hourly results.
///
/// Implementations wrap an external solver. They are shared between batch
/// workers and must not keep per-building state.
pub trait SimulationEngine: Send + Sync {
    fn simulate(&self, model: &IdfModel) -> Result<HourlyResults>;
}

/// Hourly engine outputs. Energies are in kWh per hour.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HourlyResults {
    /// Outdoor dry-bulb temperature in °C.
    pub ambient_temperature: Vec<f64>,
    /// Main zone mean air temperature in °C.
    pub room_temperature: Vec<f64>,
    pub electricity: Vec<f64>,
    pub space_heating: Vec<f64>,
    pub hot_water: Vec<f64>,
}

impl HourlyResults {
    pub fn len(&self) -> usize {
        self.ambient_temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fails if the series have different lengths.
    pub fn validate(&self) -> Result<()> {
        let n = self.len();
        let lengths = [
            ("room_temperature", self.room_temperature.len()),
            ("electricity", self.electricity.len()),
            ("space_heating", self.space_heating.len()),
            ("hot_water", self.hot_water.len()),
        ];
        for (name, len) in lengths {
            if len != n {
                return Err(UbemError::Engine(format!(
                    "series {} has {} values, expected {}",
                    name, len, n
                )));
            }
        }
        Ok(())
    }
}

/// Annual energy use in kWh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AnnualSummary {
    pub space_heating: f64,
    pub hot_water: f64,
    pub electricity: f64,
    /// Space heating plus hot water.
    pub total_heat: f64,
}

impl AnnualSummary {
    pub fn from_hourly(results: &HourlyResults) -> Result<Self> {
        results.validate()?;
        let space_heating: f64 = results.space_heating.iter().sum();
        let hot_water: f64 = results.hot_water.iter().sum();
        let electricity: f64 = results.electricity.iter().sum();
        Ok(Self {
            space_heating,
            hot_water,
            electricity,
            total_heat: space_heating + hot_water,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() -> Result<()> {
        let r = HourlyResults {
            ambient_temperature: vec![-5.0, -4.0, -3.0],
            room_temperature: vec![21.0; 3],
            electricity: vec![0.5; 3],
            space_heating: vec![2.0, 1.5, 1.0],
            hot_water: vec![0.25; 3],
        };
        let s = AnnualSummary::from_hourly(&r)?;
        assert_eq!(s.space_heating, 4.5);
        assert_eq!(s.hot_water, 0.75);
        assert_eq!(s.electricity, 1.5);
        assert_eq!(s.total_heat, 5.25);
        Ok(())
    }

    #[test]
    fn test_mismatched_lengths() {
        let r = HourlyResults {
            ambient_temperature: vec![0.0; 3],
            room_temperature: vec![0.0; 3],
            electricity: vec![0.0; 2],
            space_heating: vec![0.0; 3],
            hot_water: vec![0.0; 3],
        };
        assert!(matches!(AnnualSummary::from_hourly(&r), Err(UbemError::Engine(_))));
    }
}
