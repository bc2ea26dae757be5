//! Building datasets as JSON arrays of records.

use crate::sim::building::BuildingRecord;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub fn read_records(path: &Path) -> Result<Vec<BuildingRecord>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open dataset: {}", path.display()))?;
    let records: Vec<BuildingRecord> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse dataset: {}", path.display()))?;
    Ok(records)
}

pub fn write_records(path: &Path, records: &[BuildingRecord]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), records)
        .with_context(|| format!("Failed to write dataset: {}", path.display()))?;
    Ok(())
}
