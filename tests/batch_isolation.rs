use std::sync::atomic::{AtomicUsize, Ordering};
use ubem3d::config::UbemConfig;
use ubem3d::io::{dataset, idf::BUILDING_SURFACE};
use ubem3d::sim::batch::{BatchContext, ProfileLibrary, build_index, process_building, run_batch};
use ubem3d::sim::building::{BuildingCategory, BuildingRecord};
use ubem3d::sim::engine::{HourlyResults, SimulationEngine};
use ubem3d::sim::schedule::{AnnualProfiles, Schedule};
use ubem3d::{ErrorClass, IdfModel, ParcelInfo, Result, UbemError};

fn record(id: &str, footprint: Vec<[f64; 2]>, height: Option<f64>) -> BuildingRecord {
    BuildingRecord {
        id: id.into(),
        footprint,
        height,
        floors: None,
        construction_year: Some(1975),
        building_type: "Bostad; Flerfamiljshus".into(),
        basement_levels: 0,
        parcel: Some(ParcelInfo {
            code: "block".into(),
            area: 1000.0,
        }),
        wwr: Some(0.2),
        heat_recovery: id.starts_with("row"),
        infiltration_ach: None,
    }
}

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<[f64; 2]> {
    vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
}

/// A dense block: a row of three terraced houses, a tower across the
/// street and two broken records.
fn block() -> Vec<BuildingRecord> {
    vec![
        record("row-1", rect(0.0, 0.0, 10.0, 12.0), Some(9.0)),
        record("row-2", rect(10.0, 0.0, 20.0, 12.0), Some(9.0)),
        record("row-3", rect(20.0, 0.0, 30.0, 12.0), Some(9.0)),
        record("tower", rect(5.0, 25.0, 25.0, 40.0), Some(30.0)),
        record("sliver", vec![[0.0, 50.0], [10.0, 50.0], [20.0, 50.0]], Some(6.0)),
        record("no-height", rect(40.0, 0.0, 50.0, 10.0), None),
    ]
}

struct CountingEngine {
    calls: AtomicUsize,
    fail_for: &'static str,
}

impl SimulationEngine for CountingEngine {
    fn simulate(&self, model: &IdfModel) -> Result<HourlyResults> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if model.building.as_str() == self.fail_for {
            return Err(UbemError::Engine("license server unreachable".into()));
        }
        let n = 24;
        Ok(HourlyResults {
            ambient_temperature: vec![-2.0; n],
            room_temperature: vec![21.0; n],
            electricity: vec![0.2; n],
            space_heating: vec![1.0; n],
            hot_water: vec![0.1; n],
        })
    }
}

fn apartment_profiles() -> AnnualProfiles {
    AnnualProfiles {
        occupancy: Schedule::constant("OccupancyProfile", 1.0),
        person_heat: Schedule::constant("PersonHeatProfile", 80.0),
        appliances: Schedule::constant("AppliancesProfile", 3.0),
        hot_water: Schedule::constant("HotWaterUse", 1.0),
        lighting: Schedule::constant("LightingProfile", 2.0),
        hot_water_peak: 2.5e-6,
    }
}

#[test]
fn test_failures_do_not_touch_siblings() -> Result<()> {
    let cfg = UbemConfig::default();
    let records = block();
    let index = build_index(&records, &cfg.building, cfg.index.cell_size);
    let mut library = ProfileLibrary::new();
    library.insert(BuildingCategory::Apartment, apartment_profiles());
    let ctx = BatchContext::new(&index, &index, &cfg).with_profiles(&library);

    let engine = CountingEngine {
        calls: AtomicUsize::new(0),
        fail_for: "tower",
    };
    let run = run_batch(&records, &ctx, Some(&engine));

    let report = run.report();
    assert_eq!(report.processed, 6);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 3);
    assert_eq!(report.failures_by_class.get(&ErrorClass::Engine), Some(&1));
    assert_eq!(report.failures_by_class.get(&ErrorClass::Geometry), Some(&1));
    assert_eq!(report.failures_by_class.get(&ErrorClass::InvalidInput), Some(&1));
    // Only buildings with a valid model reach the engine
    assert_eq!(engine.calls.load(Ordering::SeqCst), 4);

    // Each surviving model equals the one built alone
    for model in run.models() {
        let alone = records.iter().find(|r| r.id == model.id).expect("record");
        let single = process_building(alone, &ctx, Some(&engine))?;
        assert_eq!(single.idf.to_idf_string(), model.idf.to_idf_string());
        assert_eq!(single.summary, model.summary);
    }
    Ok(())
}

#[test]
fn test_terraced_row_has_party_walls() -> Result<()> {
    let cfg = UbemConfig::default();
    let records = block();
    let index = build_index(&records, &cfg.building, cfg.index.cell_size);
    let ctx = BatchContext::new(&index, &index, &cfg);
    let run = run_batch(&records, &ctx, None);

    let adiabatic = |id: &str| -> usize {
        run.models()
            .find(|m| m.id.as_str() == id)
            .map(|m| m.adjacency.iter().filter(|r| r.is_adiabatic).count())
            .unwrap_or(usize::MAX)
    };
    assert_eq!(adiabatic("row-1"), 1);
    assert_eq!(adiabatic("row-2"), 2);
    assert_eq!(adiabatic("row-3"), 1);
    assert_eq!(adiabatic("tower"), 0);
    Ok(())
}

#[test]
fn test_dense_parcel_gets_shading() -> Result<()> {
    let cfg = UbemConfig::default();
    let records = block();
    let index = build_index(&records, &cfg.building, cfg.index.cell_size);
    let ctx = BatchContext::new(&index, &index, &cfg);

    // Built area 660 of 1000 m^2; FAR well above 1
    let row2 = process_building(&records[1], &ctx, None)?;
    let ids: Vec<&str> = row2.obstacles.iter().map(|o| o.id.as_str()).collect();
    assert!(ids.contains(&"tower"));
    // Party-wall neighbors are not obstacles
    assert!(!ids.contains(&"row-1"));
    assert!(!ids.contains(&"row-3"));
    assert!(row2.idf.objects_of("SHADING:BUILDING:DETAILED").count() >= 5);
    Ok(())
}

#[test]
fn test_models_survive_the_filesystem() -> anyhow::Result<()> {
    let cfg = UbemConfig::default();
    let dir = tempfile::tempdir()?;
    let dataset_path = dir.path().join("buildings.json");
    dataset::write_records(&dataset_path, &block())?;

    let records = dataset::read_records(&dataset_path)?;
    let index = build_index(&records, &cfg.building, cfg.index.cell_size);
    let ctx = BatchContext::new(&index, &index, &cfg);
    let run = run_batch(&records, &ctx, None);

    for model in run.models() {
        let path = dir.path().join(format!("{}.idf", model.id));
        model.idf.write(&path)?;
        let text = std::fs::read_to_string(&path)?;
        assert!(text.starts_with(&format!("! Building {}", model.id)));
        assert_eq!(
            text.matches(BUILDING_SURFACE).count(),
            model.idf.objects_of(BUILDING_SURFACE).count()
        );
        assert!(text.contains("RUNPERIOD,"));
        assert!(text.contains("ZONEHVAC:IDEALLOADSAIRSYSTEM,"));
        // Terraced houses ventilate with heat recovery
        assert_eq!(text.contains("    Sensible,"), model.id.as_str().starts_with("row"));
    }
    Ok(())
}
