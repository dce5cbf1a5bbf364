//! Subdomain code to region name table.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const SURFSHARK_REGIONS: &str = include_str!("../../data/surfshark_regions.json");

/// Maps provider subdomain codes (`de-fra`, `us-nyc-st001`) to region names.
///
/// The table is plain data. It is loaded once per run and the reconciler
/// works on a clone, so a shared table is never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionTable {
    entries: BTreeMap<String, String>,
}

impl RegionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table shipped with the crate for Surfshark.
    pub fn builtin_surfshark() -> Result<Self, NetError> {
        Self::from_json(SURFSHARK_REGIONS)
            .map_err(|e| NetError::InvalidConfig(format!("builtin region table: {e}")))
    }

    /// Parse a JSON object of `"code": "Region name"` pairs.
    pub fn from_json(json: &str) -> Result<Self, NetError> {
        serde_json::from_str(json).map_err(|e| NetError::invalid_json("<region table>", e))
    }

    /// Load a JSON table from disk.
    pub async fn load(path: &Path) -> Result<Self, NetError> {
        let json = tokio::fs::read_to_string(path).await.path_context(path)?;
        serde_json::from_str(&json)
            .map_err(|e| NetError::invalid_json(path.display().to_string(), e))
    }

    pub fn insert(&mut self, code: impl Into<String>, region: impl Into<String>) -> Option<String> {
        self.entries.insert(code.into(), region.into())
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    /// Remove a code, returning its region name.
    pub fn remove(&mut self, code: &str) -> Option<String> {
        self.entries.remove(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Codes in ascending order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(code, region)| (code.as_str(), region.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RegionTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(code, region)| (code.into(), region.into()))
                .collect(),
        }
    }
}
