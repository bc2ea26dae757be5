//! Parallel batch driver.
//!
//! Every building is processed end-to-end by one worker against the same
//! read-only context. A failing building becomes a [`FailureRecord`] in its
//! own result slot and never stops its siblings.

use crate::BuildingId;
use crate::config::{BuildingConfig, UbemConfig};
use crate::error::{ErrorClass, Result, UbemError};
use crate::geom::envelope::{Envelope, generate_envelope};
use crate::geom::footprint::Footprint;
use crate::geom::index::FootprintIndex;
use crate::geom::ring::normalize_ring;
use crate::io::idf::IdfModel;
use crate::io::weather::SiteLocation;
use crate::sim::adjacency::{AdjacencyRecord, classify_edges_or_exterior};
use crate::sim::building::{BuildingCategory, BuildingRecord, derive_wwr};
use crate::sim::engine::{AnnualSummary, SimulationEngine};
use crate::sim::gains::{InternalGains, estimate_occupants};
use crate::sim::hvac::HvacSystem;
use crate::sim::schedule::AnnualProfiles;
use crate::sim::shading::{ShadingObstacle, find_obstacles, is_densified, obstacle_prisms};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Annual profiles per building category, synthesized before a batch.
#[derive(Debug, Clone, Default)]
pub struct ProfileLibrary {
    by_category: HashMap<BuildingCategory, AnnualProfiles>,
}

impl ProfileLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: BuildingCategory, profiles: AnnualProfiles) {
        self.by_category.insert(category, profiles);
    }

    pub fn get(&self, category: BuildingCategory) -> Option<&AnnualProfiles> {
        self.by_category.get(&category)
    }
}

/// Shared read-only inputs of a batch.
pub struct BatchContext<'a> {
    /// Footprints searched for party walls and shading obstacles.
    pub neighbors: &'a FootprintIndex,
    /// Footprints of the subject buildings themselves, used for buffering.
    pub reference: &'a FootprintIndex,
    pub profiles: Option<&'a ProfileLibrary>,
    /// Archetype constructions appended verbatim to every model.
    pub constructions: Option<&'a str>,
    /// Location of the weather file, written as the model site.
    pub site: Option<&'a SiteLocation>,
    pub config: &'a UbemConfig,
}

impl<'a> BatchContext<'a> {
    pub fn new(neighbors: &'a FootprintIndex, reference: &'a FootprintIndex, config: &'a UbemConfig) -> Self {
        Self {
            neighbors,
            reference,
            profiles: None,
            constructions: None,
            site: None,
            config,
        }
    }

    pub fn with_profiles(mut self, profiles: &'a ProfileLibrary) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn with_constructions(mut self, constructions: &'a str) -> Self {
        self.constructions = Some(constructions);
        self
    }

    pub fn with_site(mut self, site: &'a SiteLocation) -> Self {
        self.site = Some(site);
        self
    }
}

/// Everything generated for one building.
#[derive(Debug, Clone)]
pub struct BuildingModel {
    pub id: BuildingId,
    pub category: BuildingCategory,
    pub height: f64,
    pub wwr: f64,
    pub adjacency: Vec<AdjacencyRecord>,
    pub obstacles: Vec<ShadingObstacle>,
    pub envelope: Envelope,
    pub gains: InternalGains,
    pub hvac: HvacSystem,
    pub idf: IdfModel,
    /// Present only when an engine was run.
    pub summary: Option<AnnualSummary>,
}

/// Why a building produced no model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub id: BuildingId,
    pub class: ErrorClass,
    pub message: String,
}

impl FailureRecord {
    pub fn new(id: BuildingId, error: &UbemError) -> Self {
        Self {
            id,
            class: error.class(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildingOutcome {
    pub id: BuildingId,
    pub result: std::result::Result<BuildingModel, FailureRecord>,
}

impl BuildingOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Processed, succeeded and failed counts of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures_by_class: BTreeMap<ErrorClass, usize>,
    /// Fraction of processed buildings with a model, 0 for an empty batch.
    pub success_rate: f64,
    pub failures: Vec<FailureRecord>,
}

impl BatchReport {
    pub fn from_outcomes(outcomes: &[BuildingOutcome]) -> Self {
        let mut report = Self {
            processed: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match &outcome.result {
                Ok(_) => report.succeeded += 1,
                Err(failure) => {
                    report.failed += 1;
                    *report.failures_by_class.entry(failure.class).or_insert(0) += 1;
                    report.failures.push(failure.clone());
                }
            }
        }
        if report.processed > 0 {
            report.success_rate = report.succeeded as f64 / report.processed as f64;
        }
        report
    }
}

/// Outcomes of a batch in input order.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub outcomes: Vec<BuildingOutcome>,
}

impl BatchRun {
    pub fn report(&self) -> BatchReport {
        BatchReport::from_outcomes(&self.outcomes)
    }

    pub fn models(&self) -> impl Iterator<Item = &BuildingModel> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FailureRecord> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }
}

/// Builds a spatial index from dataset records.
///
/// Records without a usable footprint are left out of the index.
pub fn build_index(records: &[BuildingRecord], building: &BuildingConfig, cell_size: f64) -> FootprintIndex {
    let footprints: Vec<Footprint> = records
        .iter()
        .filter_map(|r| match r.to_footprint(building) {
            Ok(fp) => Some(fp),
            Err(e) => {
                warn!("Skipping {} in index: {}", r.id, e);
                None
            }
        })
        .collect();
    FootprintIndex::new(footprints, cell_size)
}

/// Runs the whole per-building pipeline.
///
/// Missing neighbor data and failed obstacle searches degrade to exterior
/// walls and no shading. Geometry, input and engine failures are returned.
pub fn process_building(
    record: &BuildingRecord,
    ctx: &BatchContext,
    engine: Option<&dyn SimulationEngine>,
) -> Result<BuildingModel> {
    let cfg = ctx.config;
    let footprint = record.to_footprint(&cfg.building)?;
    let ring = normalize_ring(&footprint.ring(), &cfg.ring)?;
    let height = footprint.height;
    let wwr = derive_wwr(record, &ring, &cfg.building, &cfg.envelope)?;
    let category = record.category();

    let adjacency =
        classify_edges_or_exterior(&ring, &record.id, ctx.neighbors, ctx.reference, &cfg.adjacency);
    let obstacles = shading_obstacles(&footprint, ctx);

    let envelope = generate_envelope(
        &ring,
        height,
        record.basement_levels,
        wwr,
        &adjacency,
        &cfg.envelope,
    )?;

    let occupants = estimate_occupants(footprint.area(), height, &cfg.building, &cfg.gains);
    let peak = match ctx.profiles.and_then(|p| p.get(category)) {
        Some(profiles) => profiles.hot_water_peak,
        None => {
            debug!("No {} profiles loaded, hot water peak of {} is zero", category, record.id);
            0.0
        }
    };
    let gains = InternalGains::new(occupants, peak, &cfg.gains);
    let hvac = HvacSystem::for_record(record, &cfg.hvac);

    let mut idf = IdfModel::new(record.id.clone());
    idf.add_run_setup(&cfg.run, ctx.site);
    idf.add_outputs();
    idf.add_envelope(&envelope);
    idf.add_shading(&obstacle_prisms(&obstacles));
    idf.add_gains(&gains, category);
    idf.add_hvac(&hvac, &envelope);
    if let Some(constructions) = ctx.constructions {
        idf.set_constructions(constructions);
    }
    idf.validate()?;

    let summary = match engine {
        Some(engine) => {
            let results = engine.simulate(&idf)?;
            Some(AnnualSummary::from_hourly(&results)?)
        }
        None => None,
    };

    debug!(
        "Building {}: {} surfaces, {} windows, {} obstacles, {} occupants",
        record.id,
        envelope.surfaces().count(),
        envelope.windows().count(),
        obstacles.len(),
        occupants
    );

    Ok(BuildingModel {
        id: record.id.clone(),
        category,
        height,
        wwr,
        adjacency,
        obstacles,
        envelope,
        gains,
        hvac,
        idf,
        summary,
    })
}

fn shading_obstacles(footprint: &Footprint, ctx: &BatchContext) -> Vec<ShadingObstacle> {
    let cfg = &ctx.config.shading;
    if !is_densified(footprint, ctx.neighbors, cfg) {
        return Vec::new();
    }
    match find_obstacles(footprint, ctx.neighbors, cfg) {
        Ok(obstacles) => obstacles,
        Err(e) => {
            warn!("{}; building {} gets no shading", e, footprint.id);
            Vec::new()
        }
    }
}

/// Processes all records in parallel, keeping input order.
pub fn run_batch(
    records: &[BuildingRecord],
    ctx: &BatchContext,
    engine: Option<&dyn SimulationEngine>,
) -> BatchRun {
    info!("Processing {} buildings", records.len());
    let outcomes: Vec<BuildingOutcome> = records
        .par_iter()
        .map(|record| {
            let result = process_building(record, ctx, engine).map_err(|e| {
                warn!("Building {} failed: {}", record.id, e);
                FailureRecord::new(record.id.clone(), &e)
            });
            BuildingOutcome {
                id: record.id.clone(),
                result,
            }
        })
        .collect();

    let run = BatchRun { outcomes };
    let report = run.report();
    info!(
        "Batch done: {} processed, {} succeeded, {} failed ({:.1}% success)",
        report.processed,
        report.succeeded,
        report.failed,
        report.success_rate * 100.0
    );
    for (class, count) in &report.failures_by_class {
        info!("  {:?}: {}", class, count);
    }
    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoundaryCondition;
    use crate::sim::engine::HourlyResults;

    fn record(id: &str, footprint: &[[f64; 2]], floors: Option<u32>) -> BuildingRecord {
        BuildingRecord {
            id: id.into(),
            footprint: footprint.to_vec(),
            height: None,
            floors,
            construction_year: None,
            building_type: String::new(),
            basement_levels: 0,
            parcel: None,
            wwr: None,
            heat_recovery: false,
            infiltration_ach: None,
        }
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<[f64; 2]> {
        vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
    }

    fn records() -> Vec<BuildingRecord> {
        vec![
            record("a", &rect(0.0, 0.0, 10.0, 20.0), Some(3)),
            record("b", &rect(10.0, 0.0, 20.0, 20.0), Some(3)),
            record("c", &[[0.0, 0.0], [5.0, 5.0]], Some(3)),
            record("d", &rect(40.0, 0.0, 50.0, 10.0), None),
        ]
    }

    struct ConstantEngine;

    impl SimulationEngine for ConstantEngine {
        fn simulate(&self, _model: &IdfModel) -> Result<HourlyResults> {
            Ok(HourlyResults {
                ambient_temperature: vec![0.0; 4],
                room_temperature: vec![21.0; 4],
                electricity: vec![0.5; 4],
                space_heating: vec![2.0; 4],
                hot_water: vec![1.0; 4],
            })
        }
    }

    struct FailsFor(&'static str);

    impl SimulationEngine for FailsFor {
        fn simulate(&self, model: &IdfModel) -> Result<HourlyResults> {
            if model.building.as_str() == self.0 {
                return Err(UbemError::Engine("solver diverged".into()));
            }
            ConstantEngine.simulate(model)
        }
    }

    #[test]
    fn test_failures_are_isolated() {
        let cfg = UbemConfig::default();
        let records = records();
        let index = build_index(&records, &cfg.building, cfg.index.cell_size);
        // c and d cannot be indexed
        assert_eq!(index.len(), 2);

        let ctx = BatchContext::new(&index, &index, &cfg);
        let run = run_batch(&records, &ctx, None);
        let ids: Vec<&str> = run.outcomes.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert!(run.outcomes[0].is_ok());
        assert!(run.outcomes[1].is_ok());

        let report = run.report();
        assert_eq!(report.processed, 4);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.failures_by_class.get(&ErrorClass::Geometry), Some(&1));
        assert_eq!(report.failures_by_class.get(&ErrorClass::InvalidInput), Some(&1));
        assert_eq!(report.success_rate, 0.5);
    }

    #[test]
    fn test_party_wall_between_neighbors() -> Result<()> {
        let cfg = UbemConfig::default();
        let records = records();
        let index = build_index(&records, &cfg.building, cfg.index.cell_size);
        let ctx = BatchContext::new(&index, &index, &cfg);

        let a = process_building(&records[0], &ctx, None)?;
        assert_eq!(a.adjacency.iter().filter(|r| r.is_adiabatic).count(), 1);
        let wall = a.envelope.main.get_surface("Wall1").ok_or_else(|| UbemError::Geometry("no Wall1".into()))?;
        assert_eq!(wall.boundary, BoundaryCondition::Adiabatic);
        assert!(a.envelope.windows().all(|w| w.host != "Wall1"));
        assert_eq!(a.envelope.windows().count(), 3);
        // 3 floors of 200 m^2
        assert_eq!(a.gains.occupants, 14);
        assert!(a.summary.is_none());
        Ok(())
    }

    #[test]
    fn test_missing_reference_degrades_to_exterior() -> Result<()> {
        let cfg = UbemConfig::default();
        let records = records();
        let neighbors = build_index(&records, &cfg.building, cfg.index.cell_size);
        let reference = FootprintIndex::new(Vec::new(), cfg.index.cell_size);
        let ctx = BatchContext::new(&neighbors, &reference, &cfg);

        let a = process_building(&records[0], &ctx, None)?;
        assert!(a.adjacency.iter().all(|r| !r.is_adiabatic));
        assert_eq!(a.envelope.windows().count(), 4);
        Ok(())
    }

    #[test]
    fn test_engine_failure_is_isolated() {
        let cfg = UbemConfig::default();
        let records: Vec<BuildingRecord> = records().into_iter().take(2).collect();
        let index = build_index(&records, &cfg.building, cfg.index.cell_size);
        let ctx = BatchContext::new(&index, &index, &cfg);
        let engine = FailsFor("b");

        let run = run_batch(&records, &ctx, Some(&engine));
        let a = run.models().next().map(|m| m.summary);
        assert_eq!(
            a,
            Some(Some(AnnualSummary {
                space_heating: 8.0,
                hot_water: 4.0,
                electricity: 2.0,
                total_heat: 12.0,
            }))
        );
        let failures: Vec<&FailureRecord> = run.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].class, ErrorClass::Engine);
        assert_eq!(failures[0].id.as_str(), "b");
    }

    #[test]
    fn test_empty_batch() {
        let cfg = UbemConfig::default();
        let index = FootprintIndex::new(Vec::new(), cfg.index.cell_size);
        let ctx = BatchContext::new(&index, &index, &cfg);
        let report = run_batch(&[], &ctx, None).report();
        assert_eq!(report.processed, 0);
        assert_eq!(report.success_rate, 0.0);
    }

    #[test]
    fn test_constructions_are_appended() -> Result<()> {
        let cfg = UbemConfig::default();
        let records = records();
        let index = build_index(&records, &cfg.building, cfg.index.cell_size);
        let block = "CONSTRUCTION,\n    Exterior Wall,\n    Concrete;\n";
        let ctx = BatchContext::new(&index, &index, &cfg).with_constructions(block);
        let a = process_building(&records[0], &ctx, None)?;
        assert!(a.idf.to_idf_string().ends_with(block));
        Ok(())
    }

    #[test]
    fn test_model_is_runnable() -> Result<()> {
        let cfg = UbemConfig::default();
        let mut records = records();
        records[0].basement_levels = 1;
        records[0].heat_recovery = true;
        let index = build_index(&records, &cfg.building, cfg.index.cell_size);
        let site = SiteLocation {
            name: "Falun".into(),
            latitude: 60.6,
            longitude: 15.6,
            time_zone: 1.0,
            elevation: 120.0,
        };
        let ctx = BatchContext::new(&index, &index, &cfg).with_site(&site);

        let a = process_building(&records[0], &ctx, None)?;
        assert!(a.hvac.heat_recovery);
        for class in ["VERSION", "RUNPERIOD", "TIMESTEP", "SITE:LOCATION", "THERMOSTATSETPOINT:DUALSETPOINT"] {
            assert_eq!(a.idf.objects_of(class).count(), 1, "{}", class);
        }
        // One ideal loads system per zone
        assert_eq!(a.idf.objects_of("ZONEHVAC:IDEALLOADSAIRSYSTEM").count(), 2);
        assert_eq!(a.idf.objects_of("OUTPUT:METER").count(), 3);

        let b = process_building(&records[1], &ctx, None)?;
        assert_eq!(b.hvac.heat_recovery_type(), "None");
        assert_eq!(b.idf.objects_of("ZONEHVAC:IDEALLOADSAIRSYSTEM").count(), 1);
        Ok(())
    }
}
