//! Branch assignment table.
//!
//! Branches are not known to the provider; they come from local
//! configuration as an ordered list of `{ id, name, troops }` records,
//! loaded once at startup.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchConfig {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub troops: Vec<i64>,
}

impl BranchConfig {
    pub fn new(id: i64, name: impl Into<String>, troops: Vec<i64>) -> Self {
        Self {
            id,
            name: name.into(),
            troops,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchTable {
    branches: Vec<BranchConfig>,
}

impl BranchTable {
    pub fn new(branches: Vec<BranchConfig>) -> Self {
        Self { branches }
    }

    /// Load the table from a JSON array of branch records
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read branch table {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse branch table {}", path.display()))
    }

    pub fn branches(&self) -> &[BranchConfig] {
        &self.branches
    }

}
