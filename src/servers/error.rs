//! Fatal update errors.

use crate::base::neterror::NetError;
use std::fmt;
use thiserror::Error;

/// Step of an update run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Retrieving the provider archive.
    Fetch,
    /// Strict resolution of the hosts named in the archive.
    ArchiveHosts,
    /// Best-effort resolution of table codes missing from the archive.
    RemainingHosts,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Fetch => "fetching archive",
            Phase::ArchiveHosts => "resolving archive hosts",
            Phase::RemainingHosts => "resolving remaining table hosts",
        })
    }
}

/// An update run that could not complete.
///
/// `warnings` holds what was collected before the failure.
#[derive(Debug, Error)]
#[error("{phase}: {source}")]
pub struct UpdateError {
    pub phase: Phase,
    #[source]
    pub source: NetError,
    pub warnings: Vec<String>,
}

impl UpdateError {
    pub fn new(phase: Phase, source: NetError) -> Self {
        Self {
            phase,
            source,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.source.is_cancelled()
    }
}
