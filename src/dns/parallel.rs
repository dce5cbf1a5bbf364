//! Batch resolution with retries, one worker per hostname.
//!
//! [`ParallelResolver`] knows nothing about regions or providers: it takes a
//! list of hostnames and returns the addresses each one resolved to. Every
//! host runs in its own task and owns its result until the join barrier
//! hands it back to the caller, so no map is shared between workers.

use super::retry::{delay_before, should_retry, RetryConfig};
use super::{Name, Resolve};
use crate::base::neterror::NetError;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// What to do when a host exhausts its retry budget without an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Any unresolved host fails the whole batch.
    Strict,
    /// Unresolved hosts are kept with an empty set and reported as warnings.
    BestEffort,
}

/// Output of one batch: hostname to addresses, plus warnings.
///
/// Addresses are unique and sorted. An empty set only appears under
/// [`FailurePolicy::BestEffort`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub host_to_ips: HashMap<String, Vec<IpAddr>>,
    pub warnings: Vec<String>,
}

/// Resolves many hostnames concurrently on top of a single-shot [`Resolve`].
#[derive(Clone)]
pub struct ParallelResolver {
    inner: Arc<dyn Resolve>,
}

impl ParallelResolver {
    pub fn new(inner: Arc<dyn Resolve>) -> Self {
        Self { inner }
    }

    /// Resolve every host in `hosts`.
    ///
    /// Each host gets up to `retry.repetition` attempts, `retry.time_between`
    /// apart, and stops at the first non-empty answer. Lookup errors and empty
    /// answers both count as a failed attempt.
    ///
    /// # Errors
    ///
    /// - [`NetError::Cancelled`] once `cancel` fires; no partial mapping.
    /// - [`NetError::ResolutionExhausted`] under [`FailurePolicy::Strict`] for
    ///   the first host that ran out of attempts. Remaining workers are
    ///   cancelled.
    pub async fn resolve_all(
        &self,
        hosts: &[String],
        retry: &RetryConfig,
        policy: FailurePolicy,
        cancel: &CancellationToken,
    ) -> Result<Resolution, NetError> {
        let batch = cancel.child_token();
        let mut workers = JoinSet::new();
        let mut seen = HashSet::with_capacity(hosts.len());

        for host in hosts {
            if !seen.insert(host.as_str()) {
                continue;
            }
            let resolver = self.inner.clone();
            let retry = retry.clone();
            let token = batch.clone();
            let host = host.clone();
            workers.spawn(async move {
                let ips = resolve_repeat(resolver.as_ref(), &host, &retry, &token).await;
                (host, ips)
            });
        }

        tracing::debug!(
            hosts = seen.len(),
            attempts = retry.repetition,
            ?policy,
            "resolving host batch"
        );

        let mut resolution = Resolution {
            host_to_ips: HashMap::with_capacity(seen.len()),
            warnings: Vec::new(),
        };
        let mut failure = None;

        while let Some(joined) = workers.join_next().await {
            let (host, outcome) = match joined {
                Ok(done) => done,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(_) => continue,
            };

            // None means the worker saw cancellation and has nothing to report
            let Some(ips) = outcome else {
                continue;
            };

            if !ips.is_empty() {
                resolution.host_to_ips.insert(host, ips);
                continue;
            }

            match policy {
                FailurePolicy::Strict => {
                    if failure.is_none() {
                        tracing::warn!(host = %host, attempts = retry.repetition, "host never resolved, aborting batch");
                        failure = Some(NetError::ResolutionExhausted {
                            host,
                            attempts: retry.repetition,
                        });
                        batch.cancel();
                    }
                }
                FailurePolicy::BestEffort => {
                    tracing::debug!(host = %host, "host never resolved");
                    resolution
                        .warnings
                        .push(format!("no IP address found for host {host:?}"));
                    resolution.host_to_ips.insert(host, ips);
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(NetError::Cancelled);
        }
        if let Some(err) = failure {
            return Err(err);
        }

        tracing::debug!(
            resolved = resolution.host_to_ips.len(),
            warnings = resolution.warnings.len(),
            "host batch complete"
        );
        Ok(resolution)
    }
}

impl std::fmt::Debug for ParallelResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelResolver").finish_non_exhaustive()
    }
}

/// Returns `None` when cancelled, otherwise the addresses found (possibly none).
async fn resolve_repeat(
    resolver: &dyn Resolve,
    host: &str,
    retry: &RetryConfig,
    cancel: &CancellationToken,
) -> Option<Vec<IpAddr>> {
    let mut attempt = 0;
    while should_retry(attempt, retry) {
        let delay = delay_before(attempt, retry);
        if !delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        attempt += 1;

        let lookup = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            result = resolver.resolve(Name::new(host)) => result,
        };

        match lookup {
            Ok(addrs) => {
                let ips = unique_sorted_ips(addrs);
                if !ips.is_empty() {
                    tracing::debug!(host = %host, attempt, count = ips.len(), "host resolved");
                    return Some(ips);
                }
                tracing::debug!(host = %host, attempt, "empty answer");
            }
            Err(e) if e.is_resolution_failure() => {
                tracing::debug!(host = %host, attempt, error = %e, "lookup failed");
            }
            Err(e) => {
                tracing::warn!(host = %host, attempt, error = %e, "resolver error");
            }
        }
    }
    Some(Vec::new())
}

/// Deduplicates and sorts addresses.
pub fn unique_sorted_ips<I>(ips: I) -> Vec<IpAddr>
where
    I: IntoIterator<Item = IpAddr>,
{
    ips.into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
