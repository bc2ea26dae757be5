//! Daily profile tables in, annual single-column series out.

use crate::error::UbemError;
use crate::sim::building::BuildingCategory;
use crate::sim::schedule::{AnnualProfiles, HOURS_PER_DAY, ProfileSet, ProfileTable, Schedule};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// The five annual user profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Occupancy,
    PersonHeat,
    Appliances,
    HotWater,
    Lighting,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 5] = [
        ProfileKind::Occupancy,
        ProfileKind::PersonHeat,
        ProfileKind::Appliances,
        ProfileKind::HotWater,
        ProfileKind::Lighting,
    ];

    /// Name of the engine schedule reading this profile.
    pub fn schedule_name(&self) -> &'static str {
        match self {
            Self::Occupancy => "OccupancyProfile",
            Self::PersonHeat => "PersonHeatProfile",
            Self::Appliances => "AppliancesProfile",
            Self::HotWater => "HotWaterUse",
            Self::Lighting => "LightingProfile",
        }
    }

    /// Daily input table, e.g. `occupancy.csv`.
    pub fn table_file(&self) -> &'static str {
        match self {
            Self::Occupancy => "occupancy.csv",
            Self::PersonHeat => "person_heat.csv",
            Self::Appliances => "appliances.csv",
            Self::HotWater => "hot_water.csv",
            Self::Lighting => "lighting.csv",
        }
    }

    /// Annual series file, e.g. `occupancyProfileApartment.txt`.
    pub fn file_name(&self, category: BuildingCategory) -> String {
        let stem = match self {
            Self::Occupancy => "occupancyProfile",
            Self::PersonHeat => "personHeatProfile",
            Self::Appliances => "appliancesProfile",
            Self::HotWater => "hotWaterProfile",
            Self::Lighting => "lightingProfile",
        };
        format!("{}{}.txt", stem, category)
    }

    pub fn series<'a>(&self, profiles: &'a AnnualProfiles) -> &'a Schedule {
        match self {
            Self::Occupancy => &profiles.occupancy,
            Self::PersonHeat => &profiles.person_heat,
            Self::Appliances => &profiles.appliances,
            Self::HotWater => &profiles.hot_water,
            Self::Lighting => &profiles.lighting,
        }
    }
}

/// Name of the file holding the hot water peak flow of a category.
pub fn hot_water_peak_file(category: BuildingCategory) -> String {
    format!("hotWaterPeak{}.txt", category)
}

/// Parses a `;`- or `,`-delimited daily table.
///
/// Rows are hours, columns are profiles. A leading row that is not numeric
/// is taken as a header. With `;` as delimiter a decimal comma is accepted.
pub fn parse_profile_table(name: &str, text: &str) -> crate::Result<ProfileTable> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let delimiter = if lines.first().is_some_and(|l| l.contains(';')) { ';' } else { ',' };

    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(HOURS_PER_DAY);
    for (i, line) in lines.iter().enumerate() {
        let parsed: std::result::Result<Vec<f64>, _> = line
            .split(delimiter)
            .map(|cell| {
                let cell = cell.trim();
                if delimiter == ';' {
                    cell.replace(',', ".").parse::<f64>()
                } else {
                    cell.parse::<f64>()
                }
            })
            .collect();
        match parsed {
            Ok(row) => rows.push(row),
            Err(_) if i == 0 => continue, // header
            Err(_) => {
                return Err(UbemError::profile(name, format!("row {} is not numeric", i + 1)));
            }
        }
    }

    if rows.len() != HOURS_PER_DAY {
        return Err(UbemError::profile(
            name,
            format!("expected {} hourly rows, got {}", HOURS_PER_DAY, rows.len()),
        ));
    }
    let width = rows[0].len();
    if let Some(i) = rows.iter().position(|r| r.len() != width) {
        return Err(UbemError::profile(
            name,
            format!("row {} has {} columns, expected {}", i + 1, rows[i].len(), width),
        ));
    }

    let columns: Vec<Vec<f64>> = (0..width).map(|c| rows.iter().map(|r| r[c]).collect()).collect();
    ProfileTable::new(name, columns)
}

pub fn read_profile_table(path: &Path, name: &str) -> Result<ProfileTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile table: {}", path.display()))?;
    let table = parse_profile_table(name, &text)
        .with_context(|| format!("Invalid profile table: {}", path.display()))?;
    Ok(table)
}

/// Reads the five daily tables of a category from `dir`.
pub fn read_profile_set(dir: &Path) -> Result<ProfileSet> {
    let read = |kind: ProfileKind| read_profile_table(&dir.join(kind.table_file()), kind.schedule_name());
    let set = ProfileSet::new(
        read(ProfileKind::Occupancy)?,
        read(ProfileKind::PersonHeat)?,
        read(ProfileKind::Appliances)?,
        read(ProfileKind::HotWater)?,
        read(ProfileKind::Lighting)?,
    )?;
    Ok(set)
}

/// Writes a series as one value per line.
pub fn write_series(path: &Path, series: &Schedule) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for v in series.values() {
        writeln!(writer, "{}", v)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_series(path: &Path) -> Result<Vec<f64>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let mut values = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let v: f64 = line
            .parse()
            .with_context(|| format!("{}:{}: not a number", path.display(), i + 1))?;
        values.push(v);
    }
    Ok(values)
}

/// Writes the five series and the hot water peak of a category into `dir`.
///
/// Returns the written paths in [`ProfileKind::ALL`] order, followed by the
/// peak file.
pub fn write_annual_profiles(
    dir: &Path,
    profiles: &AnnualProfiles,
    category: BuildingCategory,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    let mut paths = Vec::with_capacity(6);
    for kind in ProfileKind::ALL {
        let path = dir.join(kind.file_name(category));
        write_series(&path, kind.series(profiles))?;
        paths.push(path);
    }
    let peak = dir.join(hot_water_peak_file(category));
    std::fs::write(&peak, format!("{:e}\n", profiles.hot_water_peak))
        .with_context(|| format!("Failed to write file: {}", peak.display()))?;
    paths.push(peak);
    Ok(paths)
}

/// Reads back the series and peak written by [`write_annual_profiles`].
pub fn read_annual_profiles(dir: &Path, category: BuildingCategory) -> Result<AnnualProfiles> {
    let read = |kind: ProfileKind| -> Result<Schedule> {
        let values = read_series(&dir.join(kind.file_name(category)))?;
        Ok(Schedule::new(kind.schedule_name(), values))
    };
    let peak_path = dir.join(hot_water_peak_file(category));
    let peak_text = std::fs::read_to_string(&peak_path)
        .with_context(|| format!("Failed to read file: {}", peak_path.display()))?;
    let hot_water_peak: f64 = peak_text
        .trim()
        .parse()
        .with_context(|| format!("{}: not a number", peak_path.display()))?;
    Ok(AnnualProfiles {
        occupancy: read(ProfileKind::Occupancy)?,
        person_heat: read(ProfileKind::PersonHeat)?,
        appliances: read(ProfileKind::Appliances)?,
        hot_water: read(ProfileKind::HotWater)?,
        lighting: read(ProfileKind::Lighting)?,
        hot_water_peak,
    })
}
