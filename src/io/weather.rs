//! Site location from the header of an EnergyPlus weather file.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Hours from GMT.
    pub time_zone: f64,
    /// Elevation in m.
    pub elevation: f64,
}

/// Parses the `LOCATION` record that opens every weather file.
///
/// Fields: keyword, city, state, country, source, WMO station, latitude,
/// longitude, time zone, elevation.
pub fn parse_location(line: &str) -> Result<SiteLocation> {
    let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
    if !fields[0].eq_ignore_ascii_case("LOCATION") {
        bail!("Weather file does not start with a LOCATION record");
    }
    if fields.len() < 10 {
        bail!("LOCATION record has {} fields, expected 10", fields.len());
    }
    let number = |i: usize, what: &str| -> Result<f64> {
        fields[i]
            .parse::<f64>()
            .with_context(|| format!("Invalid {} in LOCATION record: '{}'", what, fields[i]))
    };
    Ok(SiteLocation {
        name: fields[1].to_string(),
        latitude: number(6, "latitude")?,
        longitude: number(7, "longitude")?,
        time_zone: number(8, "time zone")?,
        elevation: number(9, "elevation")?,
    })
}

pub fn read_site_location(path: &Path) -> Result<SiteLocation> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open weather file: {}", path.display()))?;
    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .with_context(|| format!("Failed to read weather file: {}", path.display()))?;
    parse_location(&line).with_context(|| format!("Invalid weather file: {}", path.display()))
}
