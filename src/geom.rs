pub mod buffer;
pub mod envelope;
pub mod footprint;
pub mod index;
pub mod point;
pub mod ring;
pub mod surface;
pub mod zone;

/// Geometric precision
pub(crate) const EPS: f64 = 1e-9;
