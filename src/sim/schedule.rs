//! Annual hourly user profiles.
//!
//! Daily 24-hour patterns (weekday / weekend, and per month for lighting) are
//! expanded over a calendar year that starts on a given weekday.

use crate::config::ProfileConfig;
use crate::error::{Result, UbemError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const HOURS_PER_DAY: usize = 24;

/// Liters per hour to cubic meters per second.
const LITERS_PER_HOUR_TO_M3_PER_S: f64 = 1.0 / 3_600_000.0;

/// Cumulative day count at the end of each month of a common year.
const MONTH_ENDS: [usize; 12] = [31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334, 365];

/// A time-varying hourly schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub name: String,
    /// Hourly values. Shorter series repeat.
    values: Vec<f64>,
}

impl Schedule {
    pub fn new(name: &str, values: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }

    pub fn constant(name: &str, value: f64) -> Self {
        Self::new(name, vec![value])
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn peak(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Gets the value for a given hour of the year.
    pub fn value_at(&self, hour_of_year: usize) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values[hour_of_year % self.values.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn is_weekend(&self) -> bool {
        matches!(self, Self::Saturday | Self::Sunday)
    }

    /// Position in the week, Monday being 0.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }
}

impl FromStr for Weekday {
    type Err = UbemError;

    /// Parses a case-insensitive English day name.
    fn from_str(s: &str) -> Result<Self> {
        let label = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(label))
            .ok_or_else(|| UbemError::profile("calendar", format!("unknown first day of year '{}'", s)))
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Gregorian leap year rule.
pub fn leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Day-of-week of every day of the year, starting at `first`.
pub fn days_of_year(first: Weekday, leap: bool) -> Vec<Weekday> {
    let n = 365 + usize::from(leap);
    Weekday::ALL
        .iter()
        .cycle()
        .skip(first.index())
        .take(n)
        .copied()
        .collect()
}

/// Zero-based month of the zero-based `day` of the year.
pub fn month_of_day(day: usize, leap: bool) -> usize {
    MONTH_ENDS
        .iter()
        .enumerate()
        .map(|(m, &end)| if m >= 1 && leap { end + 1 } else { end })
        .position(|end| day < end)
        .unwrap_or(11)
}

/// Daily profile table: every column holds 24 hourly values.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTable {
    pub name: String,
    columns: Vec<Vec<f64>>,
}

impl ProfileTable {
    /// Fails if any column does not have exactly 24 values or if a value is
    /// not finite.
    pub fn new(name: &str, columns: Vec<Vec<f64>>) -> Result<Self> {
        for (i, col) in columns.iter().enumerate() {
            if col.len() != HOURS_PER_DAY {
                return Err(UbemError::profile(
                    name,
                    format!("column {} has {} rows, expected {}", i, col.len(), HOURS_PER_DAY),
                ));
            }
            if col.iter().any(|v| !v.is_finite()) {
                return Err(UbemError::profile(name, format!("column {} has a non-finite value", i)));
            }
        }
        Ok(Self {
            name: name.to_string(),
            columns,
        })
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, i: usize) -> &[f64] {
        &self.columns[i]
    }

    fn expect_columns(&self, n: usize) -> Result<()> {
        if self.columns.len() != n {
            return Err(UbemError::profile(
                &self.name,
                format!("expected {} columns, got {}", n, self.columns.len()),
            ));
        }
        Ok(())
    }
}

/// The five daily tables of one building category.
///
/// Occupancy, person heat, appliances and hot water have a weekday and a
/// weekend column. Lighting has 12 monthly weekday columns followed by 12
/// monthly weekend columns.
#[derive(Debug, Clone)]
pub struct ProfileSet {
    pub occupancy: ProfileTable,
    pub person_heat: ProfileTable,
    pub appliances: ProfileTable,
    /// l/h per person.
    pub hot_water: ProfileTable,
    pub lighting: ProfileTable,
}

impl ProfileSet {
    pub fn new(
        occupancy: ProfileTable,
        person_heat: ProfileTable,
        appliances: ProfileTable,
        hot_water: ProfileTable,
        lighting: ProfileTable,
    ) -> Result<Self> {
        for t in [&occupancy, &person_heat, &appliances, &hot_water] {
            t.expect_columns(2)?;
        }
        lighting.expect_columns(24)?;
        Ok(Self {
            occupancy,
            person_heat,
            appliances,
            hot_water,
            lighting,
        })
    }
}

/// Full-year hourly series of one building category.
#[derive(Debug, Clone)]
pub struct AnnualProfiles {
    pub occupancy: Schedule,
    /// W per person.
    pub person_heat: Schedule,
    /// W per person.
    pub appliances: Schedule,
    /// Fraction of `hot_water_peak`.
    pub hot_water: Schedule,
    /// W per person.
    pub lighting: Schedule,
    /// Peak hot water flow in m^3/s per person.
    pub hot_water_peak: f64,
}

impl AnnualProfiles {
    pub fn series(&self) -> [&Schedule; 5] {
        [
            &self.occupancy,
            &self.person_heat,
            &self.appliances,
            &self.hot_water,
            &self.lighting,
        ]
    }
}

/// Expands the daily tables over one year starting on `first_day`.
///
/// Each series has `24 * (365 + leap)` values.
pub fn synthesize_profiles(
    set: &ProfileSet,
    first_day: Weekday,
    leap: bool,
    cfg: &ProfileConfig,
) -> Result<AnnualProfiles> {
    let days = days_of_year(first_day, leap);
    let hours = days.len() * HOURS_PER_DAY;

    let mut occupancy = Vec::with_capacity(hours);
    let mut person_heat = Vec::with_capacity(hours);
    let mut appliances = Vec::with_capacity(hours);
    let mut hot_water = Vec::with_capacity(hours);
    let mut lighting = Vec::with_capacity(hours);

    for (d, day) in days.iter().enumerate() {
        let col = usize::from(day.is_weekend());
        occupancy.extend_from_slice(set.occupancy.column(col));
        person_heat.extend_from_slice(set.person_heat.column(col));
        appliances.extend_from_slice(set.appliances.column(col));
        hot_water.extend(set.hot_water.column(col).iter().map(|v| v * LITERS_PER_HOUR_TO_M3_PER_S));

        let month = month_of_day(d, leap);
        let light_col = if day.is_weekend() { month + 12 } else { month };
        lighting.extend(set.lighting.column(light_col).iter().map(|v| v * cfg.lighting_factor));
    }

    let hot_water_peak = hot_water.iter().copied().fold(0.0, f64::max);
    if hot_water_peak <= 0.0 {
        return Err(UbemError::profile(&set.hot_water.name, "hot water use is zero all year"));
    }
    for v in hot_water.iter_mut() {
        *v /= hot_water_peak;
    }

    Ok(AnnualProfiles {
        occupancy: Schedule::new("OccupancyProfile", occupancy),
        person_heat: Schedule::new("PersonHeatProfile", person_heat),
        appliances: Schedule::new("AppliancesProfile", appliances),
        hot_water: Schedule::new("HotWaterUse", hot_water),
        lighting: Schedule::new("LightingProfile", lighting),
        hot_water_peak,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat(name: &str, weekday: f64, weekend: f64) -> Result<ProfileTable> {
        ProfileTable::new(name, vec![vec![weekday; 24], vec![weekend; 24]])
    }

    /// Lighting value encodes the column: month + 1, negated on weekends.
    fn lighting() -> Result<ProfileTable> {
        let mut cols = Vec::new();
        for m in 0..12 {
            cols.push(vec![(m + 1) as f64; 24]);
        }
        for m in 0..12 {
            cols.push(vec![-((m + 1) as f64); 24]);
        }
        ProfileTable::new("lighting", cols)
    }

    fn profile_set() -> Result<ProfileSet> {
        ProfileSet::new(
            flat("occupancy", 0.5, 0.8)?,
            flat("person_heat", 100.0, 110.0)?,
            flat("appliances", 3.0, 4.0)?,
            ProfileTable::new("hot_water", vec![(0..24).map(|h| h as f64).collect(), vec![36.0; 24]])?,
            lighting()?,
        )
    }

    #[test]
    fn test_constant_schedule() {
        let s = Schedule::constant("test", 42.0);
        assert!((s.value_at(0) - 42.0).abs() < 1e-10);
        assert!((s.value_at(5000) - 42.0).abs() < 1e-10);
    }

    #[test]
    fn test_leap_year() {
        assert!(leap_year(2024));
        assert!(leap_year(2000));
        assert!(!leap_year(1900));
        assert!(!leap_year(2023));
    }

    #[test]
    fn test_weekday_parse() -> Result<()> {
        assert_eq!("Monday".parse::<Weekday>()?, Weekday::Monday);
        assert_eq!(" sunday ".parse::<Weekday>()?, Weekday::Sunday);
        assert!(matches!("Funday".parse::<Weekday>(), Err(UbemError::Profile { .. })));
        Ok(())
    }

    #[test]
    fn test_days_of_year_rotation() {
        let days = days_of_year(Weekday::Thursday, false);
        assert_eq!(days.len(), 365);
        assert_eq!(days[0], Weekday::Thursday);
        assert_eq!(days[2], Weekday::Saturday);
        assert_eq!(days[4], Weekday::Monday);
        assert_eq!(days[364], Weekday::Thursday);
        assert_eq!(days_of_year(Weekday::Sunday, true).len(), 366);
    }

    #[test]
    fn test_month_of_day() {
        assert_eq!(month_of_day(0, false), 0);
        assert_eq!(month_of_day(30, false), 0);
        assert_eq!(month_of_day(31, false), 1);
        assert_eq!(month_of_day(58, false), 1);
        assert_eq!(month_of_day(59, false), 2);
        assert_eq!(month_of_day(59, true), 1);
        assert_eq!(month_of_day(60, true), 2);
        assert_eq!(month_of_day(364, false), 11);
        assert_eq!(month_of_day(365, true), 11);
    }

    #[test]
    fn test_profile_lengths() -> Result<()> {
        let set = profile_set()?;
        let cfg = ProfileConfig::default();
        for first in Weekday::ALL {
            let common = synthesize_profiles(&set, first, false, &cfg)?;
            let leap = synthesize_profiles(&set, first, true, &cfg)?;
            for s in common.series() {
                assert_eq!(s.len(), 8760);
            }
            for s in leap.series() {
                assert_eq!(s.len(), 8784);
            }
        }
        Ok(())
    }

    #[test]
    fn test_weekday_weekend_selection() -> Result<()> {
        // Year starting on Friday: day 1 is Saturday
        let p = synthesize_profiles(&profile_set()?, Weekday::Friday, false, &ProfileConfig::default())?;
        assert_eq!(p.occupancy.value_at(0), 0.5);
        assert_eq!(p.occupancy.value_at(24), 0.8);
        assert_eq!(p.occupancy.value_at(48), 0.8);
        assert_eq!(p.occupancy.value_at(72), 0.5);
        assert_eq!(p.appliances.value_at(30), 4.0);
        Ok(())
    }

    #[test]
    fn test_lighting_month_and_factor() -> Result<()> {
        let p = synthesize_profiles(&profile_set()?, Weekday::Monday, false, &ProfileConfig::default())?;
        // Jan 1 (Monday)
        assert_relative_eq!(p.lighting.value_at(0), 0.75);
        // Jan 6 (Saturday)
        assert_relative_eq!(p.lighting.value_at(5 * 24), -0.75);
        // Feb 1 is day 31, a Thursday
        assert_relative_eq!(p.lighting.value_at(31 * 24), 2.0 * 0.75);
        // Dec 31 is day 364, a Monday
        assert_relative_eq!(p.lighting.value_at(364 * 24 + 23), 12.0 * 0.75);
        Ok(())
    }

    #[test]
    fn test_hot_water_normalized() -> Result<()> {
        let p = synthesize_profiles(&profile_set()?, Weekday::Monday, false, &ProfileConfig::default())?;
        assert_relative_eq!(p.hot_water_peak, 36.0 / 3_600_000.0);
        assert_relative_eq!(p.hot_water.peak(), 1.0);
        // Monday 18:00 is 18 l/h
        assert_relative_eq!(p.hot_water.value_at(18), 0.5);
        Ok(())
    }

    #[test]
    fn test_malformed_tables() -> Result<()> {
        assert!(matches!(
            ProfileTable::new("occupancy", vec![vec![0.0; 23], vec![0.0; 24]]),
            Err(UbemError::Profile { .. })
        ));
        let three = ProfileTable::new("occupancy", vec![vec![0.0; 24]; 3])?;
        let result = ProfileSet::new(
            three,
            flat("person_heat", 1.0, 1.0)?,
            flat("appliances", 1.0, 1.0)?,
            flat("hot_water", 1.0, 1.0)?,
            lighting()?,
        );
        assert!(matches!(result, Err(UbemError::Profile { .. })));

        let dry = ProfileSet::new(
            flat("occupancy", 1.0, 1.0)?,
            flat("person_heat", 1.0, 1.0)?,
            flat("appliances", 1.0, 1.0)?,
            flat("hot_water", 0.0, 0.0)?,
            lighting()?,
        )?;
        assert!(synthesize_profiles(&dry, Weekday::Monday, false, &ProfileConfig::default()).is_err());
        Ok(())
    }
}
