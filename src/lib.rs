//! # vpnservers
//!
//! Builds the server list of a VPN provider that publishes its servers as an
//! archive of OpenVPN configuration files.
//!
//! A run fetches the archive, pulls one hostname out of every UDP
//! configuration file and resolves all of them concurrently with retries.
//! Resolved hosts are matched against a table of subdomain codes to region
//! names. Table codes the archive did not mention get a second, best-effort
//! resolution pass. The result is one list with at most one server per
//! region, sorted by region, plus the warnings met along the way.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use vpnservers::archive::HttpArchiveFetcher;
//! use vpnservers::dns::{HickoryResolver, ParallelResolver};
//! use vpnservers::servers::{ProviderInfo, Reconciler, RegionTable, ServerStore, Updater};
//!
//! let resolver = Arc::new(HickoryResolver::new());
//! let source = HttpArchiveFetcher::parse(url, resolver.clone())?;
//! let reconciler = Reconciler::new(
//!     ParallelResolver::new(resolver),
//!     RegionTable::builtin_surfshark()?,
//!     ".prod.surfshark.com",
//! );
//! let updater = Updater::new(ProviderInfo::new("Surfshark"), source, reconciler);
//!
//! let mut store = ServerStore::new();
//! let warnings = updater.update(&mut store, &CancellationToken::new()).await?;
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error types
//! - [`dns`] - Single-shot resolvers and the parallel retrying resolver
//! - [`archive`] - Archive retrieval and hostname extraction
//! - [`servers`] - Region table, reconciliation, updater and store
//! - [`config`] - Provider and retry settings
//! - [`output`] - Server list rendered as Rust source

pub mod archive;
pub mod base;
pub mod config;
pub mod dns;
pub mod output;
pub mod servers;
