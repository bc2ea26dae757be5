//! Whole-building model in the EnergyPlus IDF text format.
//!
//! Only the objects this pipeline produces are modelled: run setup and
//! report requests, geometry rules, zones, detailed surfaces, fenestration,
//! detailed shading, internal gains, the ideal loads system of every zone and
//! the schedules they reference. Archetype constructions are appended
//! verbatim.

use crate::BuildingId;
use crate::config::RunConfig;
use crate::error::{Result, UbemError};
use crate::geom::envelope::Envelope;
use crate::geom::point::Point;
use crate::geom::surface::{Surface, Window, ZoneKind};
use crate::io::profile::ProfileKind;
use crate::io::weather::SiteLocation;
use crate::sim::building::BuildingCategory;
use crate::sim::gains::InternalGains;
use crate::sim::hvac::HvacSystem;
use crate::sim::shading::ShadingSurface;
use anyhow::Context;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

pub const BUILDING_SURFACE: &str = "BUILDINGSURFACE:DETAILED";
pub const FENESTRATION_SURFACE: &str = "FENESTRATIONSURFACE:DETAILED";
pub const SHADING_SURFACE: &str = "SHADING:BUILDING:DETAILED";

pub const EQUIPMENT_CONNECTIONS: &str = "ZONEHVAC:EQUIPMENTCONNECTIONS";

const SCHEDULE_LIMITS: &str = "Any Number";
const ALWAYS_ON: &str = "Always 1";
const DUAL_SETPOINT: &str = "DualSetpoint";

/// Hourly meters read back from the engine results.
pub const METERS: [&str; 3] = [
    "Heating:DistrictHeating",
    "WaterSystems:DistrictHeating",
    "Electricity:Building",
];

/// Hourly report variables read back from the engine results.
pub const VARIABLES: [&str; 2] = ["Zone Mean Air Temperature", "Site Outdoor Air Drybulb Temperature"];

/// One IDF object: a class keyword and its fields with their comments.
#[derive(Debug, Clone, PartialEq)]
pub struct IdfObject {
    pub class: String,
    fields: Vec<(String, String)>,
}

impl IdfObject {
    pub fn new(class: &str) -> Self {
        Self {
            class: class.to_string(),
            fields: Vec::new(),
        }
    }

    fn field(mut self, value: impl Into<String>, comment: &str) -> Self {
        self.fields.push((value.into(), comment.to_string()));
        self
    }

    fn vertices(mut self, pts: &[Point]) -> Self {
        for (i, p) in pts.iter().enumerate() {
            let n = i + 1;
            self.fields.push((coord(p.x), format!("Vertex {} X-coordinate {{m}}", n)));
            self.fields.push((coord(p.y), format!("Vertex {} Y-coordinate {{m}}", n)));
            self.fields.push((coord(p.z), format!("Vertex {} Z-coordinate {{m}}", n)));
        }
        self
    }

    /// Value of field `i`, empty if absent.
    pub fn get(&self, i: usize) -> &str {
        self.fields.get(i).map_or("", |(v, _)| v.as_str())
    }

    pub fn name(&self) -> &str {
        self.get(0)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn render(&self, out: &mut String) {
        let _ = writeln!(out, "{},", self.class);
        let last = self.fields.len().saturating_sub(1);
        for (i, (value, comment)) in self.fields.iter().enumerate() {
            let sep = if i == last { ';' } else { ',' };
            let cell = format!("{}{}", value, sep);
            let _ = writeln!(out, "    {:<28}!- {}", cell, comment);
        }
        if self.fields.is_empty() {
            // Object without fields still needs its terminator
            out.pop();
            out.pop();
            out.push_str(";\n");
        }
        out.push('\n');
    }
}

/// Engine input model of one building.
#[derive(Debug, Clone)]
pub struct IdfModel {
    pub building: BuildingId,
    objects: Vec<IdfObject>,
    constructions: Option<String>,
}

impl IdfModel {
    /// Empty model with the global geometry rules.
    pub fn new(building: BuildingId) -> Self {
        let rules = IdfObject::new("GLOBALGEOMETRYRULES")
            .field("LowerRightCorner", "Starting Vertex Position")
            .field("Counterclockwise", "Vertex Entry Direction")
            .field("Relative", "Coordinate System");
        Self {
            building,
            objects: vec![rules],
            constructions: None,
        }
    }

    /// Model holding the zones, surfaces and windows of `envelope`.
    pub fn from_envelope(building: BuildingId, envelope: &Envelope) -> Self {
        let mut model = Self::new(building);
        model.add_envelope(envelope);
        model
    }

    pub fn objects(&self) -> &[IdfObject] {
        &self.objects
    }

    pub fn objects_of<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a IdfObject> + 'a {
        self.objects.iter().filter(move |o| o.class == class)
    }

    pub fn add_envelope(&mut self, envelope: &Envelope) {
        for zone in envelope.zones() {
            self.objects.push(
                IdfObject::new("ZONE")
                    .field(zone.name(), "Name")
                    .field("0", "Direction of Relative North {deg}")
                    .field("0", "X Origin {m}")
                    .field("0", "Y Origin {m}")
                    .field("0", "Z Origin {m}")
                    .field("1", "Type")
                    .field("1", "Multiplier")
                    .field("autocalculate", "Ceiling Height {m}")
                    .field("autocalculate", "Volume {m3}")
                    .field("autocalculate", "Floor Area {m2}")
                    .field("", "Zone Inside Convection Algorithm")
                    .field("", "Zone Outside Convection Algorithm")
                    .field("Yes", "Part of Total Floor Area"),
            );
        }
        for zone in envelope.zones() {
            for surface in &zone.surfaces {
                self.objects.push(surface_object(surface));
            }
        }
        for window in envelope.windows() {
            self.objects.push(window_object(window));
        }
    }

    pub fn add_shading(&mut self, faces: &[ShadingSurface]) {
        for face in faces {
            self.objects.push(
                IdfObject::new(SHADING_SURFACE)
                    .field(face.name.as_str(), "Name")
                    .field("", "Transmittance Schedule Name")
                    .field(face.vertices.len().to_string(), "Number of Vertices")
                    .vertices(&face.vertices),
            );
        }
    }

    /// Occupants, lighting, equipment and hot water use of the main zone,
    /// driven by the profile files of `category`.
    pub fn add_gains(&mut self, gains: &InternalGains, category: BuildingCategory) {
        let zone = ZoneKind::Main.name();
        self.ensure_schedule_limits();

        for kind in ProfileKind::ALL {
            self.objects.push(
                IdfObject::new("SCHEDULE:FILE")
                    .field(kind.schedule_name(), "Name")
                    .field(SCHEDULE_LIMITS, "Schedule Type Limits Name")
                    .field(kind.file_name(category), "File Name")
                    .field("1", "Column Number")
                    .field("0", "Rows to Skip at Top"),
            );
        }

        self.objects.push(
            IdfObject::new("PEOPLE")
                .field("People", "Name")
                .field(zone, "Zone or ZoneList Name")
                .field(ProfileKind::Occupancy.schedule_name(), "Number of People Schedule Name")
                .field("People", "Number of People Calculation Method")
                .field(gains.occupants.to_string(), "Number of People")
                .field("", "People per Zone Floor Area {person/m2}")
                .field("", "Zone Floor Area per Person {m2/person}")
                .field("0.3", "Fraction Radiant")
                .field("autocalculate", "Sensible Heat Fraction")
                .field(ProfileKind::PersonHeat.schedule_name(), "Activity Level Schedule Name"),
        );
        self.objects.push(
            IdfObject::new("LIGHTS")
                .field("Lights", "Name")
                .field(zone, "Zone or ZoneList Name")
                .field(ProfileKind::Lighting.schedule_name(), "Schedule Name")
                .field("LightingLevel", "Design Level Calculation Method")
                .field(number(gains.lighting_w), "Lighting Level {W}"),
        );
        self.objects.push(
            IdfObject::new("ELECTRICEQUIPMENT")
                .field("ElectricEquipment", "Name")
                .field(zone, "Zone or ZoneList Name")
                .field(ProfileKind::Appliances.schedule_name(), "Schedule Name")
                .field("EquipmentLevel", "Design Level Calculation Method")
                .field(number(gains.equipment_w), "Design Level {W}"),
        );
        self.objects.push(
            IdfObject::new("WATERUSE:EQUIPMENT")
                .field("HotWaterUse", "Name")
                .field("", "End-Use Subcategory")
                .field(format!("{:e}", gains.hot_water_peak_m3_s), "Peak Flow Rate {m3/s}")
                .field(ProfileKind::HotWater.schedule_name(), "Flow Rate Fraction Schedule Name")
                .field("", "Target Temperature Schedule Name")
                .field("HotWaterTemp", "Hot Water Supply Temperature Schedule Name")
                .field("ColdWaterTemp", "Cold Water Supply Temperature Schedule Name")
                .field(zone, "Zone Name"),
        );
        self.objects.push(constant_schedule("HotWaterTemp", gains.hot_water_temperature));
        self.objects.push(constant_schedule("ColdWaterTemp", gains.cold_water_temperature));
    }

    /// Engine version, simulation control, building, run period, time step
    /// and, when known, the site location.
    pub fn add_run_setup(&mut self, run: &RunConfig, site: Option<&SiteLocation>) {
        self.objects.push(IdfObject::new("VERSION").field(run.version.as_str(), "Version Identifier"));
        self.objects.push(
            IdfObject::new("SIMULATIONCONTROL")
                .field("No", "Do Zone Sizing Calculation")
                .field("No", "Do System Sizing Calculation")
                .field("No", "Do Plant Sizing Calculation")
                .field("No", "Run Simulation for Sizing Periods")
                .field("Yes", "Run Simulation for Weather File Run Periods"),
        );
        self.objects.push(
            IdfObject::new("BUILDING")
                .field(self.building.as_str(), "Name")
                .field("0", "North Axis {deg}")
                .field(run.terrain.as_str(), "Terrain")
                .field("", "Loads Convergence Tolerance Value")
                .field("", "Temperature Convergence Tolerance Value {deltaC}")
                .field(run.solar_distribution.as_str(), "Solar Distribution"),
        );
        self.objects.push(
            IdfObject::new("RUNPERIOD")
                .field("RUNPERIOD", "Name")
                .field("1", "Begin Month")
                .field("1", "Begin Day of Month")
                .field("", "Begin Year")
                .field("12", "End Month")
                .field("31", "End Day of Month")
                .field("", "End Year")
                .field(run.first_day.name(), "Day of Week for Start Day"),
        );
        self.objects.push(
            IdfObject::new("TIMESTEP").field(run.timesteps_per_hour.to_string(), "Number of Timesteps per Hour"),
        );
        if let Some(site) = site {
            self.objects.push(
                IdfObject::new("SITE:LOCATION")
                    .field(site.name.as_str(), "Name")
                    .field(number(site.latitude), "Latitude {deg}")
                    .field(number(site.longitude), "Longitude {deg}")
                    .field(number(site.time_zone), "Time Zone {hr}")
                    .field(number(site.elevation), "Elevation {m}"),
            );
        }
    }

    /// Summary tables plus the hourly meters and variables of the results.
    pub fn add_outputs(&mut self) {
        self.objects.push(IdfObject::new("OUTPUT:VARIABLEDICTIONARY").field("Regular", "Key Field"));
        self.objects.push(IdfObject::new("OUTPUT:TABLE:SUMMARYREPORTS").field("AllSummary", "Report 1 Name"));
        self.objects.push(IdfObject::new("OUTPUTCONTROL:TABLE:STYLE").field("Comma", "Column Separator"));
        for meter in METERS {
            self.objects.push(
                IdfObject::new("OUTPUT:METER")
                    .field(meter, "Key Name")
                    .field("Hourly", "Reporting Frequency"),
            );
        }
        for variable in VARIABLES {
            self.objects.push(
                IdfObject::new("OUTPUT:VARIABLE")
                    .field("*", "Key Value")
                    .field(variable, "Variable Name")
                    .field("Hourly", "Reporting Frequency"),
            );
        }
    }

    /// Ventilation, infiltration, thermostat and an ideal loads air system
    /// for every zone of `envelope`, plus the schedules they share.
    pub fn add_hvac(&mut self, hvac: &HvacSystem, envelope: &Envelope) {
        self.ensure_schedule_limits();
        self.objects.push(constant_schedule(ALWAYS_ON, 1.0));
        self.objects.push(constant_schedule("Always 4", 4.0));
        self.objects.push(constant_schedule("HeatingON", hvac.heating_setpoint));
        self.objects.push(constant_schedule("CoolingON", hvac.cooling_setpoint));
        self.objects.push(
            IdfObject::new("THERMOSTATSETPOINT:DUALSETPOINT")
                .field(DUAL_SETPOINT, "Name")
                .field("HeatingON", "Heating Setpoint Temperature Schedule Name")
                .field("CoolingON", "Cooling Setpoint Temperature Schedule Name"),
        );

        for zone in envelope.zones() {
            let zone = zone.name();
            self.objects.push(
                IdfObject::new("ZONEVENTILATION:DESIGNFLOWRATE")
                    .field(format!("Ventilation{}", zone), "Name")
                    .field(zone, "Zone or ZoneList Name")
                    .field(ALWAYS_ON, "Schedule Name")
                    .field("AirChanges/Hour", "Design Flow Rate Calculation Method")
                    .field("", "Design Flow Rate {m3/s}")
                    .field("", "Flow Rate per Zone Floor Area {m3/s-m2}")
                    .field("", "Flow Rate per Person {m3/s-person}")
                    .field(number(hvac.ventilation_ach), "Air Changes per Hour {1/hr}")
                    .field(hvac.ventilation_type.as_str(), "Ventilation Type"),
            );
            self.objects.push(
                IdfObject::new("ZONEINFILTRATION:DESIGNFLOWRATE")
                    .field(format!("Infiltration{}", zone), "Name")
                    .field(zone, "Zone or ZoneList Name")
                    .field(ALWAYS_ON, "Schedule Name")
                    .field("AirChanges/Hour", "Design Flow Rate Calculation Method")
                    .field("", "Design Flow Rate {m3/s}")
                    .field("", "Flow per Zone Floor Area {m3/s-m2}")
                    .field("", "Flow per Exterior Surface Area {m3/s-m2}")
                    .field(number(hvac.infiltration_ach), "Air Changes per Hour {1/hr}"),
            );
            self.objects.push(
                IdfObject::new("ZONECONTROL:THERMOSTAT")
                    .field(format!("Thermostat{}", zone), "Name")
                    .field(zone, "Zone or ZoneList Name")
                    .field("Always 4", "Control Type Schedule Name")
                    .field("ThermostatSetpoint:DualSetpoint", "Control 1 Object Type")
                    .field(DUAL_SETPOINT, "Control 1 Name"),
            );
            self.objects.push(ideal_loads(hvac, zone));
            self.objects.push(
                IdfObject::new("ZONEHVAC:EQUIPMENTLIST")
                    .field(format!("Equipment{}", zone), "Name")
                    .field("SequentialLoad", "Load Distribution Scheme")
                    .field("ZoneHVAC:IdealLoadsAirSystem", "Zone Equipment 1 Object Type")
                    .field(format!("PurchasedAir{}", zone), "Zone Equipment 1 Name")
                    .field("1", "Zone Equipment 1 Cooling Sequence")
                    .field("1", "Zone Equipment 1 Heating or No-Load Sequence"),
            );
            self.objects.push(
                IdfObject::new(EQUIPMENT_CONNECTIONS)
                    .field(zone, "Zone Name")
                    .field(format!("Equipment{}", zone), "Zone Conditioning Equipment List Name")
                    .field(format!("SupplyInlet{}", zone), "Zone Air Inlet Node or NodeList Name")
                    .field("", "Zone Air Exhaust Node or NodeList Name")
                    .field(format!("ZoneAirNode{}", zone), "Zone Air Node Name")
                    .field(format!("ReturnOutlet{}", zone), "Zone Return Air Node or NodeList Name"),
            );
        }
    }

    fn ensure_schedule_limits(&mut self) {
        if self.objects_of("SCHEDULETYPELIMITS").next().is_none() {
            self.objects.push(IdfObject::new("SCHEDULETYPELIMITS").field(SCHEDULE_LIMITS, "Name"));
        }
    }

    /// Archetype construction and material objects, written as given.
    pub fn set_constructions(&mut self, idf_text: impl Into<String>) {
        self.constructions = Some(idf_text.into());
    }

    pub fn surface_names(&self) -> impl Iterator<Item = &str> {
        self.objects_of(BUILDING_SURFACE).map(|o| o.name())
    }

    /// Checks referential integrity.
    ///
    /// Surface, window and shading names must be unique, `Surface` boundary
    /// conditions and window hosts must name an existing surface, zones must
    /// exist and every face needs at least 3 vertices.
    pub fn validate(&self) -> Result<()> {
        let geometry_err = |msg: String| UbemError::Geometry(format!("{}: {}", self.building, msg));

        let mut names: HashSet<&str> = HashSet::new();
        for class in [BUILDING_SURFACE, FENESTRATION_SURFACE, SHADING_SURFACE] {
            for o in self.objects_of(class) {
                if !names.insert(o.name()) {
                    return Err(geometry_err(format!("duplicate surface name {}", o.name())));
                }
            }
        }

        let zones: HashSet<&str> = self.objects_of("ZONE").map(|o| o.name()).collect();
        let surfaces: HashSet<&str> = self.surface_names().collect();

        for o in self.objects_of(BUILDING_SURFACE) {
            if !zones.contains(o.get(3)) {
                return Err(geometry_err(format!("{} refers to unknown zone {}", o.name(), o.get(3))));
            }
            if o.get(4) == "Surface" && !surfaces.contains(o.get(5)) {
                return Err(geometry_err(format!(
                    "{} is paired with missing surface {}",
                    o.name(),
                    o.get(5)
                )));
            }
            check_vertex_count(o, 9, &geometry_err)?;
        }
        for o in self.objects_of(FENESTRATION_SURFACE) {
            if !surfaces.contains(o.get(3)) {
                return Err(geometry_err(format!("{} hosted by missing wall {}", o.name(), o.get(3))));
            }
            check_vertex_count(o, 8, &geometry_err)?;
        }
        for o in self.objects_of(SHADING_SURFACE) {
            check_vertex_count(o, 2, &geometry_err)?;
        }
        for o in self.objects_of(EQUIPMENT_CONNECTIONS) {
            if !zones.contains(o.name()) {
                return Err(geometry_err(format!("equipment connected to unknown zone {}", o.name())));
            }
        }
        Ok(())
    }

    pub fn to_idf_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "! Building {}\n", self.building);
        for o in &self.objects {
            o.render(&mut out);
        }
        if let Some(constructions) = &self.constructions {
            out.push_str(constructions);
            if !constructions.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, self.to_idf_string())
            .with_context(|| format!("Failed to write IDF file: {}", path.display()))
    }
}

fn check_vertex_count(o: &IdfObject, count_field: usize, err: &dyn Fn(String) -> UbemError) -> Result<()> {
    let n: usize = o.get(count_field).parse().unwrap_or(0);
    if n < 3 || o.field_count() != count_field + 1 + 3 * n {
        return Err(err(format!("{} has a malformed vertex list", o.name())));
    }
    Ok(())
}

fn surface_object(s: &Surface) -> IdfObject {
    let exposure = |exposed: bool, yes: &str, no: &str| if exposed { yes.to_string() } else { no.to_string() };
    IdfObject::new(BUILDING_SURFACE)
        .field(s.name.as_str(), "Name")
        .field(s.kind.surface_type(), "Surface Type")
        .field(s.construction_name(), "Construction Name")
        .field(s.zone.name(), "Zone Name")
        .field(s.boundary.keyword(), "Outside Boundary Condition")
        .field(s.boundary.object(), "Outside Boundary Condition Object")
        .field(exposure(s.sun_exposed(), "SunExposed", "NoSun"), "Sun Exposure")
        .field(exposure(s.wind_exposed(), "WindExposed", "NoWind"), "Wind Exposure")
        .field("autocalculate", "View Factor to Ground")
        .field(s.vertices().len().to_string(), "Number of Vertices")
        .vertices(s.vertices())
}

fn window_object(w: &Window) -> IdfObject {
    IdfObject::new(FENESTRATION_SURFACE)
        .field(w.name.as_str(), "Name")
        .field("Window", "Surface Type")
        .field(w.construction_name(), "Construction Name")
        .field(w.host.as_str(), "Building Surface Name")
        .field("", "Outside Boundary Condition Object")
        .field("autocalculate", "View Factor to Ground")
        .field("", "Frame and Divider Name")
        .field("1", "Multiplier")
        .field(w.vertices().len().to_string(), "Number of Vertices")
        .vertices(w.vertices())
}

fn constant_schedule(name: &str, value: f64) -> IdfObject {
    IdfObject::new("SCHEDULE:COMPACT")
        .field(name, "Name")
        .field(SCHEDULE_LIMITS, "Schedule Type Limits Name")
        .field("Through: 12/31", "Field 1")
        .field("For: AllDays", "Field 2")
        .field("Until: 24:00", "Field 3")
        .field(number(value), "Field 4")
}

// Unlisted fields keep the engine defaults
fn ideal_loads(hvac: &HvacSystem, zone: &str) -> IdfObject {
    let blank = [
        "Zone Exhaust Air Node Name",
        "System Inlet Air Node Name",
        "Maximum Heating Supply Air Temperature {C}",
        "Minimum Cooling Supply Air Temperature {C}",
        "Maximum Heating Supply Air Humidity Ratio {kgWater/kgDryAir}",
        "Minimum Cooling Supply Air Humidity Ratio {kgWater/kgDryAir}",
        "Heating Limit",
        "Maximum Heating Air Flow Rate {m3/s}",
        "Maximum Sensible Heating Capacity {W}",
        "Cooling Limit",
        "Maximum Cooling Air Flow Rate {m3/s}",
        "Maximum Total Cooling Capacity {W}",
        "Heating Availability Schedule Name",
        "Cooling Availability Schedule Name",
        "Dehumidification Control Type",
        "Cooling Sensible Heat Ratio {dimensionless}",
        "Humidification Control Type",
        "Design Specification Outdoor Air Object Name",
        "Outdoor Air Inlet Node Name",
        "Demand Controlled Ventilation Type",
        "Outdoor Air Economizer Type",
    ];
    let mut object = IdfObject::new("ZONEHVAC:IDEALLOADSAIRSYSTEM")
        .field(format!("PurchasedAir{}", zone), "Name")
        .field("", "Availability Schedule Name")
        .field(format!("SupplyInlet{}", zone), "Zone Supply Air Node Name");
    for comment in blank {
        object = object.field("", comment);
    }
    object
        .field(hvac.heat_recovery_type(), "Heat Recovery Type")
        .field(number(hvac.heat_recovery_effectiveness), "Sensible Heat Recovery Effectiveness {dimensionless}")
}

fn coord(v: f64) -> String {
    let s = format!("{:.3}", v);
    if s == "-0.000" { "0.000".to_string() } else { s }
}

fn number(v: f64) -> String {
    format!("{}", v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvelopeConfig, GainsConfig, HvacConfig, RingConfig};
    use crate::sim::building::BuildingRecord;
    use crate::geom::envelope::generate_envelope;
    use crate::geom::ring::normalize_ring;
    use geo::Coord;

    fn envelope(basement: u32) -> Result<Envelope> {
        let coords: Vec<Coord<f64>> = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]
            .iter()
            .map(|&(x, y)| Coord { x, y })
            .collect();
        let ring = normalize_ring(&coords, &RingConfig::default())?;
        generate_envelope(&ring, 6.0, basement, 0.2, &[], &EnvelopeConfig::default())
    }

    #[test]
    fn test_model_objects() -> Result<()> {
        let model = IdfModel::from_envelope("b1".into(), &envelope(1)?);
        model.validate()?;
        assert_eq!(model.objects_of("GLOBALGEOMETRYRULES").count(), 1);
        assert_eq!(model.objects_of("ZONE").count(), 2);
        // 4 walls + floor + roof, 8 basement walls + ceiling + floor
        assert_eq!(model.objects_of(BUILDING_SURFACE).count(), 16);
        assert_eq!(model.objects_of(FENESTRATION_SURFACE).count(), 8);
        Ok(())
    }

    #[test]
    fn test_surface_fields() -> Result<()> {
        let model = IdfModel::from_envelope("b1".into(), &envelope(0)?);
        let wall = model
            .objects_of(BUILDING_SURFACE)
            .find(|o| o.name() == "Wall0")
            .ok_or(UbemError::Geometry("missing".into()))?;
        assert_eq!(wall.get(1), "Wall");
        assert_eq!(wall.get(2), "Exterior Wall");
        assert_eq!(wall.get(3), "ZONE");
        assert_eq!(wall.get(4), "Outdoors");
        assert_eq!(wall.get(6), "SunExposed");
        assert_eq!(wall.get(9), "4");
        assert_eq!(wall.get(10), "0.000");
        assert_eq!(wall.get(15), "6.000");
        Ok(())
    }

    #[test]
    fn test_rendering() -> Result<()> {
        let text = IdfModel::from_envelope("b1".into(), &envelope(0)?).to_idf_string();
        assert!(text.contains("GLOBALGEOMETRYRULES,\n    LowerRightCorner,"));
        assert!(text.contains("    Counterclockwise,"));
        assert!(text.contains("FENESTRATIONSURFACE:DETAILED,\n    Window0,"));
        // Last field of every object ends with a semicolon
        assert!(text.contains("    Relative;"));
        Ok(())
    }

    #[test]
    fn test_dangling_pair_detected() -> Result<()> {
        let mut model = IdfModel::from_envelope("b1".into(), &envelope(1)?);
        model.objects.retain(|o| o.name() != "Interior Ceiling");
        assert!(matches!(model.validate(), Err(UbemError::Geometry(_))));
        Ok(())
    }

    #[test]
    fn test_duplicate_names_detected() -> Result<()> {
        let mut model = IdfModel::from_envelope("b1".into(), &envelope(0)?);
        let dup = model.objects[2].clone();
        model.objects.push(dup);
        assert!(model.validate().is_err());
        Ok(())
    }

    #[test]
    fn test_gains_and_shading() -> Result<()> {
        let mut model = IdfModel::from_envelope("b1".into(), &envelope(0)?);
        let gains = InternalGains::new(5, 1e-5, &GainsConfig::default());
        model.add_gains(&gains, BuildingCategory::Apartment);
        model.add_shading(&[ShadingSurface {
            name: "Shading0_Top".into(),
            vertices: vec![
                Point::new(20.0, 0.0, 9.0),
                Point::new(24.0, 0.0, 9.0),
                Point::new(24.0, 4.0, 9.0),
            ],
        }]);
        model.set_constructions("Construction,\n    Exterior Wall,\n    Brick;\n");
        model.validate()?;

        let people = model.objects_of("PEOPLE").next().ok_or(UbemError::Geometry("no people".into()))?;
        assert_eq!(people.get(4), "5");
        assert_eq!(model.objects_of("SCHEDULE:FILE").count(), 5);
        let text = model.to_idf_string();
        assert!(text.contains("occupancyProfileApartment.txt"));
        assert!(text.contains("Shading0_Top,"));
        assert!(text.ends_with("Brick;\n"));
        Ok(())
    }

    fn hvac(heat_recovery: bool) -> HvacSystem {
        let record = BuildingRecord {
            id: "b1".into(),
            footprint: Vec::new(),
            height: None,
            floors: None,
            construction_year: None,
            building_type: String::new(),
            basement_levels: 0,
            parcel: None,
            wwr: None,
            heat_recovery,
            infiltration_ach: Some(0.25),
        };
        HvacSystem::for_record(&record, &HvacConfig::default())
    }

    #[test]
    fn test_run_setup_and_outputs() -> Result<()> {
        let mut model = IdfModel::from_envelope("b1".into(), &envelope(0)?);
        let site = SiteLocation {
            name: "Falun".into(),
            latitude: 60.6,
            longitude: 15.6,
            time_zone: 1.0,
            elevation: 120.0,
        };
        model.add_run_setup(&RunConfig::default(), Some(&site));
        model.add_outputs();
        model.validate()?;

        for class in ["VERSION", "SIMULATIONCONTROL", "BUILDING", "RUNPERIOD", "TIMESTEP", "SITE:LOCATION"] {
            assert_eq!(model.objects_of(class).count(), 1, "{}", class);
        }
        let version = model.objects_of("VERSION").next().ok_or(UbemError::Geometry("no version".into()))?;
        assert_eq!(version.get(0), "9.2");
        let run = model.objects_of("RUNPERIOD").next().ok_or(UbemError::Geometry("no run period".into()))?;
        assert_eq!(run.get(7), "Monday");
        let building = model.objects_of("BUILDING").next().ok_or(UbemError::Geometry("no building".into()))?;
        assert_eq!(building.name(), "b1");
        assert_eq!(building.get(5), "FullExterior");

        let meters: Vec<&str> = model.objects_of("OUTPUT:METER").map(|o| o.name()).collect();
        assert_eq!(meters, METERS.to_vec());
        let variables: Vec<&str> = model.objects_of("OUTPUT:VARIABLE").map(|o| o.get(1)).collect();
        assert_eq!(variables, VARIABLES.to_vec());

        let mut bare = IdfModel::new("b2".into());
        bare.add_run_setup(&RunConfig::default(), None);
        assert_eq!(bare.objects_of("SITE:LOCATION").count(), 0);
        Ok(())
    }

    #[test]
    fn test_hvac_per_zone() -> Result<()> {
        let env = envelope(1)?;
        let mut model = IdfModel::from_envelope("b1".into(), &env);
        model.add_gains(&InternalGains::new(5, 1e-5, &GainsConfig::default()), BuildingCategory::House);
        model.add_hvac(&hvac(true), &env);
        model.validate()?;

        assert_eq!(model.objects_of("SCHEDULETYPELIMITS").count(), 1);
        for class in [
            "ZONEVENTILATION:DESIGNFLOWRATE",
            "ZONEINFILTRATION:DESIGNFLOWRATE",
            "ZONECONTROL:THERMOSTAT",
            "ZONEHVAC:IDEALLOADSAIRSYSTEM",
            "ZONEHVAC:EQUIPMENTLIST",
            EQUIPMENT_CONNECTIONS,
        ] {
            assert_eq!(model.objects_of(class).count(), 2, "{}", class);
        }
        assert_eq!(model.objects_of("THERMOSTATSETPOINT:DUALSETPOINT").count(), 1);

        let vent = model
            .objects_of("ZONEVENTILATION:DESIGNFLOWRATE")
            .find(|o| o.name() == "VentilationBASEMENT")
            .ok_or(UbemError::Geometry("no ventilation".into()))?;
        assert_eq!(vent.get(1), "BASEMENT");
        assert_eq!(vent.get(7), "0.5");
        assert_eq!(vent.get(8), "Exhaust");
        let infiltration = model
            .objects_of("ZONEINFILTRATION:DESIGNFLOWRATE")
            .next()
            .ok_or(UbemError::Geometry("no infiltration".into()))?;
        assert_eq!(infiltration.get(7), "0.25");

        let ideal = model
            .objects_of("ZONEHVAC:IDEALLOADSAIRSYSTEM")
            .next()
            .ok_or(UbemError::Geometry("no ideal loads".into()))?;
        assert_eq!(ideal.name(), "PurchasedAirZONE");
        assert_eq!(ideal.get(2), "SupplyInletZONE");
        assert_eq!(ideal.get(24), "Sensible");
        assert_eq!(ideal.get(25), "0.5");

        let text = model.to_idf_string();
        assert!(text.contains("HeatingON,"));
        assert!(text.contains("    21;"));
        assert!(text.contains("    45;"));
        Ok(())
    }

    #[test]
    fn test_hvac_without_heat_recovery() -> Result<()> {
        let env = envelope(0)?;
        let mut model = IdfModel::from_envelope("b1".into(), &env);
        model.add_hvac(&hvac(false), &env);
        let ideal = model
            .objects_of("ZONEHVAC:IDEALLOADSAIRSYSTEM")
            .next()
            .ok_or(UbemError::Geometry("no ideal loads".into()))?;
        assert_eq!(ideal.get(24), "None");
        assert_eq!(ideal.get(25), "0");
        assert_eq!(model.objects_of(EQUIPMENT_CONNECTIONS).count(), 1);
        Ok(())
    }

    #[test]
    fn test_equipment_on_missing_zone_detected() -> Result<()> {
        let env = envelope(1)?;
        let mut model = IdfModel::from_envelope("b1".into(), &env);
        model.add_hvac(&hvac(false), &env);
        model.validate()?;
        model.objects.push(IdfObject::new(EQUIPMENT_CONNECTIONS).field("ATTIC", "Zone Name"));
        assert!(matches!(model.validate(), Err(UbemError::Geometry(_))));
        Ok(())
    }

    #[test]
    fn test_write_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("b1.idf");
        IdfModel::from_envelope("b1".into(), &envelope(0)?).write(&path)?;
        let text = std::fs::read_to_string(&path)?;
        assert!(text.starts_with("! Building b1"));
        Ok(())
    }
}
