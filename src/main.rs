use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use ubem3d::UbemConfig;
use ubem3d::io::{dataset, profile, weather};
use ubem3d::sim::batch::{BatchContext, ProfileLibrary, build_index, run_batch};
use ubem3d::sim::building::BuildingCategory;
use ubem3d::sim::schedule::{Weekday, leap_year, synthesize_profiles};

/// Generates whole-building engine models from building footprints.
#[derive(Parser, Debug)]
#[command(name = "ubem3d", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Builds one engine model per building.
    Model {
        /// JSON array of building records
        #[arg(long)]
        buildings: PathBuf,

        /// Dataset holding the subject footprints (defaults to --buildings)
        #[arg(long)]
        reference: Option<PathBuf>,

        /// TOML file overriding the default constants
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory with annual profiles written by the `profiles` command
        #[arg(long)]
        profiles: Option<PathBuf>,

        /// Archetype constructions appended to every model
        #[arg(long)]
        constructions: Option<PathBuf>,

        /// Weather file whose LOCATION header becomes the model site
        #[arg(long)]
        weather: Option<PathBuf>,

        /// Output directory
        #[arg(long)]
        out: PathBuf,
    },

    /// Expands daily profile tables into annual hourly series.
    Profiles {
        /// Directory with the five daily tables
        #[arg(long)]
        tables: PathBuf,

        /// Apartment or House
        #[arg(long)]
        category: BuildingCategory,

        /// Weekday of January 1st
        #[arg(long)]
        first_day: Weekday,

        #[arg(long)]
        year: i32,

        /// TOML file overriding the default constants
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ubem3d=info")),
        )
        .init();

    match Cli::parse().command {
        Command::Model {
            buildings,
            reference,
            config,
            profiles,
            constructions,
            weather,
            out,
        } => model(
            &buildings,
            reference.as_deref(),
            config.as_deref(),
            profiles.as_deref(),
            constructions.as_deref(),
            weather.as_deref(),
            &out,
        ),
        Command::Profiles {
            tables,
            category,
            first_day,
            year,
            config,
            out,
        } => profiles(&tables, category, first_day, year, config.as_deref(), &out),
    }
}

fn load_config(path: Option<&Path>) -> Result<UbemConfig> {
    match path {
        Some(path) => UbemConfig::load(path),
        None => Ok(UbemConfig::default()),
    }
}

fn model(
    buildings: &Path,
    reference: Option<&Path>,
    config: Option<&Path>,
    profiles: Option<&Path>,
    constructions: Option<&Path>,
    weather_file: Option<&Path>,
    out: &Path,
) -> Result<()> {
    let cfg = load_config(config)?;
    let records = dataset::read_records(buildings)?;
    info!("Read {} buildings from {}", records.len(), buildings.display());

    let neighbors = build_index(&records, &cfg.building, cfg.index.cell_size);
    let reference = match reference {
        Some(path) => {
            let reference_records = dataset::read_records(path)?;
            Some(build_index(&reference_records, &cfg.building, cfg.index.cell_size))
        }
        None => None,
    };

    let mut library = ProfileLibrary::new();
    if let Some(dir) = profiles {
        for category in [BuildingCategory::Apartment, BuildingCategory::House] {
            if !dir.join(profile::hot_water_peak_file(category)).exists() {
                warn!("No {} profiles in {}", category, dir.display());
                continue;
            }
            library.insert(category, profile::read_annual_profiles(dir, category)?);
        }
    }

    let constructions = match constructions {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read constructions: {}", path.display()))?,
        ),
        None => None,
    };

    let site = weather_file.map(weather::read_site_location).transpose()?;
    if let Some(site) = &site {
        info!("Site: {} ({}, {})", site.name, site.latitude, site.longitude);
    }

    let mut ctx = BatchContext::new(&neighbors, reference.as_ref().unwrap_or(&neighbors), &cfg)
        .with_profiles(&library);
    if let Some(text) = constructions.as_deref() {
        ctx = ctx.with_constructions(text);
    }
    if let Some(site) = &site {
        ctx = ctx.with_site(site);
    }

    let run = run_batch(&records, &ctx, None);

    std::fs::create_dir_all(out)
        .with_context(|| format!("Failed to create directory: {}", out.display()))?;
    for model in run.models() {
        model.idf.write(&out.join(format!("{}.idf", model.id)))?;
    }

    let report = run.report();
    let report_path = out.join("report.json");
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&report_path, json)
        .with_context(|| format!("Failed to write report: {}", report_path.display()))?;

    println!("Processed: {}, failed: {}", report.processed, report.failed);
    Ok(())
}

fn profiles(
    tables: &Path,
    category: BuildingCategory,
    first_day: Weekday,
    year: i32,
    config: Option<&Path>,
    out: &Path,
) -> Result<()> {
    let cfg = load_config(config)?;
    let set = profile::read_profile_set(tables)?;
    let annual = synthesize_profiles(&set, first_day, leap_year(year), &cfg.profiles)?;
    let paths = profile::write_annual_profiles(out, &annual, category)?;
    for path in &paths {
        info!("Wrote {}", path.display());
    }
    println!("{} profiles for {}: {} hours", category, year, annual.occupancy.len());
    Ok(())
}
