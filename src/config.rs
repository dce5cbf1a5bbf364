//! Run configuration.
//!
//! Everything provider specific lives here so the pipeline itself holds no
//! provider constants. Defaults describe Surfshark.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::dns::RetryConfig;
use crate::servers::RegionTable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: ProviderSettings,
    /// Retry policy for hosts named in the archive.
    pub archive_resolve: ResolveSettings,
    /// Retry policy for table codes missing from the archive.
    pub remaining_resolve: ResolveSettings,
}

/// Provider constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub name: String,
    pub archive_url: String,
    /// Appended to a subdomain code to form a hostname.
    pub domain_suffix: String,
    /// Files ending with this are skipped.
    pub tcp_file_suffix: String,
    /// JSON region table; the builtin table is used when unset.
    pub region_table: Option<PathBuf>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            name: "Surfshark".to_string(),
            archive_url: "https://my.surfshark.com/vpn/api/v1/server/configurations".to_string(),
            domain_suffix: ".prod.surfshark.com".to_string(),
            tcp_file_suffix: "_tcp.ovpn".to_string(),
            region_table: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveSettings {
    pub repetition: usize,
    pub time_between_ms: u64,
}

impl Default for ResolveSettings {
    fn default() -> Self {
        Self {
            repetition: 20,
            time_between_ms: 1000,
        }
    }
}

impl ResolveSettings {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.repetition, Duration::from_millis(self.time_between_ms))
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from a JSON file. Missing fields take their default.
    pub async fn load(path: &Path) -> Result<Self, NetError> {
        let json = tokio::fs::read_to_string(path).await.path_context(path)?;
        let settings: Settings = serde_json::from_str(&json)
            .map_err(|e| NetError::invalid_json(path.display().to_string(), e))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), NetError> {
        if self.provider.archive_url.is_empty() {
            return Err(NetError::InvalidConfig("archive_url is empty".into()));
        }
        if self.provider.domain_suffix.is_empty() {
            return Err(NetError::InvalidConfig("domain_suffix is empty".into()));
        }
        for (name, resolve) in [
            ("archive_resolve", &self.archive_resolve),
            ("remaining_resolve", &self.remaining_resolve),
        ] {
            if resolve.repetition == 0 {
                return Err(NetError::InvalidConfig(format!(
                    "{name}.repetition must be at least 1"
                )));
            }
        }
        Ok(())
    }

    /// The configured region table, or the builtin one.
    pub async fn region_table(&self) -> Result<RegionTable, NetError> {
        match &self.provider.region_table {
            Some(path) => RegionTable::load(path).await,
            None => RegionTable::builtin_surfshark(),
        }
    }

    /// Set the archive URL.
    pub fn archive_url(mut self, url: impl Into<String>) -> Self {
        self.provider.archive_url = url.into();
        self
    }

    /// Set the domain suffix.
    pub fn domain_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.provider.domain_suffix = suffix.into();
        self
    }

    /// Set the region table file.
    pub fn region_table_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.provider.region_table = Some(path.into());
        self
    }

    /// Set the retry policy of both passes.
    pub fn retry(mut self, repetition: usize, time_between: Duration) -> Self {
        let resolve = ResolveSettings {
            repetition,
            time_between_ms: time_between.as_millis() as u64,
        };
        self.archive_resolve = resolve.clone();
        self.remaining_resolve = resolve;
        self
    }
}
