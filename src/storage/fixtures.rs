//! Seed data for the mock backend.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::activity::Activity;
use crate::contact::Contact;
use crate::deal::Deal;
use crate::storage::traits::StoreError;

const BUNDLED: &str = include_str!("../../fixtures/seed.json");

/// Static records used to seed the in-memory stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub deals: Vec<Deal>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl Fixtures {
    /// The demo data set compiled into the crate.
    pub fn bundled() -> Result<Self, StoreError> {
        Self::parse(BUNDLED)
    }

    /// Load fixtures from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| StoreError::Fixture(format!("failed to read {}: {e}", path.display())))?;
        Self::parse(&raw)
    }

    /// Parse fixtures from a JSON string.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        serde_json::from_str(raw).map_err(|e| StoreError::Fixture(format!("invalid fixture JSON: {e}")))
    }
}
