use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a building in the source dataset.
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingId(String);

impl From<&str> for BuildingId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BuildingId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl BuildingId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
