//! Text formats at the boundary of the pipeline.
//!
//! Building datasets are read from JSON, daily profile tables from delimited
//! text, the site location from the weather file header, and engine models
//! and annual profiles are written as text.

pub mod dataset;
pub mod idf;
pub mod profile;
pub mod weather;

pub use dataset::{read_records, write_records};
pub use idf::IdfModel;
pub use profile::{read_annual_profiles, read_profile_set, write_annual_profiles};
pub use weather::{SiteLocation, read_site_location};
