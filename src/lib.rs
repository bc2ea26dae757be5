pub mod config;
pub mod error;
pub mod geom;
mod id;
pub mod io;
pub mod sim;

// Prelude
pub use config::UbemConfig;
pub use error::{ErrorClass, Result, UbemError};
pub use geom::envelope::{Envelope, generate_envelope};
pub use geom::footprint::{Footprint, ParcelInfo};
pub use geom::index::FootprintIndex;
pub use geom::point::Point;
pub use geom::ring::{NormalizedRing, normalize_ring};
pub use geom::surface::{BoundaryCondition, Surface, SurfaceKind, Window, ZoneKind};
pub use geom::zone::Zone;
pub use id::BuildingId;
pub use io::idf::IdfModel;
