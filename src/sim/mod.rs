//! Per-building analyses and the batch driver.

pub mod adjacency;
pub mod batch;
pub mod building;
pub mod engine;
pub mod gains;
pub mod hvac;
pub mod schedule;
pub mod shading;
