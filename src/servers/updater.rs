//! One complete update run for a provider.

use super::error::{Phase, UpdateError};
use super::reconcile::Reconciler;
use super::store::ServerStore;
use crate::archive::ArchiveSource;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

/// Identifies the provider in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    pub name: String,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Fetches the archive, reconciles it and replaces the store contents.
pub struct Updater<S> {
    provider: ProviderInfo,
    source: S,
    reconciler: Reconciler,
}

impl<S: ArchiveSource> Updater<S> {
    pub fn new(provider: ProviderInfo, source: S, reconciler: Reconciler) -> Self {
        Self {
            provider,
            source,
            reconciler,
        }
    }

    pub fn provider(&self) -> &ProviderInfo {
        &self.provider
    }

    /// Run one update. On success `store` holds the new list stamped with the
    /// current time and the run's warnings are returned. On failure `store`
    /// is left untouched.
    pub async fn update(
        &self,
        store: &mut ServerStore,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, UpdateError> {
        tracing::info!(
            provider = %self.provider.name,
            source = %self.source.location(),
            "updating servers"
        );

        let contents = self
            .source
            .fetch(cancel)
            .await
            .map_err(|e| UpdateError::new(Phase::Fetch, e))?;

        let reconciled = self.reconciler.reconcile(&contents, cancel).await?;

        store.replace(reconciled.servers, OffsetDateTime::now_utc());
        tracing::info!(
            provider = %self.provider.name,
            servers = store.len(),
            warnings = reconciled.warnings.len(),
            "servers updated"
        );
        Ok(reconciled.warnings)
    }
}
