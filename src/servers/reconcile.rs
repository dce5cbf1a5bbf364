//! Two-pass reconciliation of archive hosts against the region table.
//!
//! Pass one resolves the hosts named in the archive, strictly. Every resolved
//! host is matched to a region and its code removed from a working copy of
//! the table. Pass two resolves whatever codes are left, best-effort, so a
//! server missing from one archive snapshot is still found if it answers.

use super::error::{Phase, UpdateError};
use super::table::RegionTable;
use super::{merge_by_region, Server};
use crate::archive::{extract_hosts, parse_host, ArchiveContents, ParsedHost};
use crate::base::neterror::NetError;
use crate::dns::{FailurePolicy, ParallelResolver, RetryConfig};
use std::collections::HashMap;
use std::net::IpAddr;
use tokio_util::sync::CancellationToken;

/// Single-file parser used to pull a host out of one archive member.
pub type ParseFn = fn(&[u8]) -> Result<ParsedHost, NetError>;

/// Final list of one run with every warning collected on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciled {
    pub servers: Vec<Server>,
    pub warnings: Vec<String>,
}

/// Servers built from the first pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matched {
    pub servers: Vec<Server>,
    pub warnings: Vec<String>,
}

pub struct Reconciler {
    resolver: ParallelResolver,
    table: RegionTable,
    domain_suffix: String,
    tcp_file_suffix: String,
    archive_retry: RetryConfig,
    remaining_retry: RetryConfig,
    parse: ParseFn,
}

impl Reconciler {
    /// `domain_suffix` includes its leading dot, e.g. `.prod.surfshark.com`.
    pub fn new(
        resolver: ParallelResolver,
        table: RegionTable,
        domain_suffix: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            table,
            domain_suffix: domain_suffix.into(),
            tcp_file_suffix: "_tcp.ovpn".to_string(),
            archive_retry: RetryConfig::default(),
            remaining_retry: RetryConfig::default(),
            parse: parse_host,
        }
    }

    pub fn tcp_file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.tcp_file_suffix = suffix.into();
        self
    }

    pub fn archive_retry(mut self, retry: RetryConfig) -> Self {
        self.archive_retry = retry;
        self
    }

    pub fn remaining_retry(mut self, retry: RetryConfig) -> Self {
        self.remaining_retry = retry;
        self
    }

    pub fn parser(mut self, parse: ParseFn) -> Self {
        self.parse = parse;
        self
    }

    pub fn table(&self) -> &RegionTable {
        &self.table
    }

    pub fn domain_suffix(&self) -> &str {
        &self.domain_suffix
    }

    /// Run both passes over `contents`.
    ///
    /// # Errors
    ///
    /// Fails when an archive host never resolves, or when `cancel` fires.
    /// The error carries the warnings gathered so far.
    pub async fn reconcile(
        &self,
        contents: &ArchiveContents,
        cancel: &CancellationToken,
    ) -> Result<Reconciled, UpdateError> {
        let extracted = extract_hosts(contents, &self.tcp_file_suffix, self.parse);
        let mut warnings = extracted.warnings;

        tracing::info!(hosts = extracted.hosts.len(), "resolving archive hosts");
        let archive = match self
            .resolver
            .resolve_all(
                &extracted.hosts,
                &self.archive_retry,
                FailurePolicy::Strict,
                cancel,
            )
            .await
        {
            Ok(resolution) => resolution,
            Err(e) => {
                return Err(UpdateError::new(Phase::ArchiveHosts, e).with_warnings(warnings))
            }
        };
        warnings.extend(archive.warnings);

        let mut remaining = self.table.clone();
        let matched = match_resolved(&archive.host_to_ips, &mut remaining, &self.domain_suffix);
        warnings.extend(matched.warnings);

        let hosts = remaining_hosts(&remaining, &self.domain_suffix);
        tracing::info!(hosts = hosts.len(), "resolving remaining table hosts");
        let fallback = match self
            .resolver
            .resolve_all(
                &hosts,
                &self.remaining_retry,
                FailurePolicy::BestEffort,
                cancel,
            )
            .await
        {
            Ok(resolution) => resolution,
            Err(e) => {
                return Err(UpdateError::new(Phase::RemainingHosts, e).with_warnings(warnings))
            }
        };
        warnings.extend(fallback.warnings);

        let mut servers = matched.servers;
        servers.extend(remaining_servers(
            &fallback.host_to_ips,
            &remaining,
            &self.domain_suffix,
        ));

        let (servers, merge_warnings) = merge_by_region(servers);
        warnings.extend(merge_warnings);

        tracing::info!(
            servers = servers.len(),
            warnings = warnings.len(),
            "reconciliation complete"
        );
        Ok(Reconciled { servers, warnings })
    }
}

/// Subdomain code of `host`, or `host` itself when the suffix is absent.
pub fn subdomain_code<'a>(host: &'a str, domain_suffix: &str) -> &'a str {
    host.strip_suffix(domain_suffix).unwrap_or(host)
}

pub fn host_for_code(code: &str, domain_suffix: &str) -> String {
    format!("{code}{domain_suffix}")
}

/// Turn first-pass results into servers, consuming matched codes from `table`.
///
/// Hosts are visited in name order. A host with no address is skipped. A code
/// missing from the table keeps the bare code as its region, with a warning.
pub fn match_resolved(
    host_to_ips: &HashMap<String, Vec<IpAddr>>,
    table: &mut RegionTable,
    domain_suffix: &str,
) -> Matched {
    let mut hosts: Vec<&String> = host_to_ips.keys().collect();
    hosts.sort();

    let mut matched = Matched::default();
    for host in hosts {
        let ips = &host_to_ips[host];
        if ips.is_empty() {
            continue;
        }

        let code = subdomain_code(host, domain_suffix);
        let region = match table.remove(code) {
            Some(region) => region,
            None => {
                matched
                    .warnings
                    .push(format!("subdomain {code:?} not found in region table"));
                code.to_string()
            }
        };
        matched.servers.push(Server::new(region, ips.iter().copied()));
    }
    matched
}

/// Hostnames for every code left in `table`, in code order.
pub fn remaining_hosts(table: &RegionTable, domain_suffix: &str) -> Vec<String> {
    table
        .codes()
        .map(|code| host_for_code(code, domain_suffix))
        .collect()
}

/// Servers for the table codes whose host resolved in the second pass.
pub fn remaining_servers(
    host_to_ips: &HashMap<String, Vec<IpAddr>>,
    table: &RegionTable,
    domain_suffix: &str,
) -> Vec<Server> {
    table
        .iter()
        .filter_map(|(code, region)| {
            let ips = host_to_ips.get(&host_for_code(code, domain_suffix))?;
            if ips.is_empty() {
                return None;
            }
            Some(Server::new(region, ips.iter().copied()))
        })
        .collect()
}
