//! Persisted result of the last successful update.

use super::Server;
use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use time::OffsetDateTime;

/// Server list with the time it was produced.
///
/// Serialized as JSON with the timestamp in Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStore {
    #[serde(with = "time::serde::timestamp")]
    pub timestamp: OffsetDateTime,
    pub servers: Vec<Server>,
}

impl Default for ServerStore {
    fn default() -> Self {
        Self {
            timestamp: OffsetDateTime::UNIX_EPOCH,
            servers: Vec::new(),
        }
    }
}

impl ServerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new list, stamped with `at` truncated to whole seconds.
    pub fn replace(&mut self, servers: Vec<Server>, at: OffsetDateTime) {
        self.timestamp = at.replace_nanosecond(0).unwrap_or(at);
        self.servers = servers;
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Load a store, or an empty one when `path` does not exist.
    pub async fn load(path: &Path) -> Result<Self, NetError> {
        let json = match tokio::fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(NetError::io(path.display().to_string(), e)),
        };
        serde_json::from_str(&json)
            .map_err(|e| NetError::invalid_json(path.display().to_string(), e))
    }

    pub async fn save(&self, path: &Path) -> Result<(), NetError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| NetError::invalid_json(path.display().to_string(), e))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.path_context(parent)?;
        }
        tokio::fs::write(path, json).await.path_context(path)?;
        tracing::debug!(path = %path.display(), servers = self.servers.len(), "saved server store");
        Ok(())
    }
}
