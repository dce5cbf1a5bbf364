//! DNS Resolution Module
//!
//! Provides pluggable single-shot resolution and the batch resolver built on it:
//! - System resolver (getaddrinfo via thread pool)
//! - Async hickory-dns resolver
//! - Hostname-to-IP override mechanism
//! - [`ParallelResolver`]: retrying fan-out over a batch of hostnames
//!
//! # Example
//!
//! ```rust,ignore
//! use vpnservers::dns::{FailurePolicy, HickoryResolver, ParallelResolver, RetryConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let resolver = ParallelResolver::new(Arc::new(HickoryResolver::new()));
//! let resolution = resolver
//!     .resolve_all(&hosts, &RetryConfig::default(), FailurePolicy::Strict, &CancellationToken::new())
//!     .await?;
//! ```

mod gai;
mod hickory;
mod parallel;
mod resolve;
pub mod retry;

pub use gai::{parse_ip_literal, GaiResolver};
pub use hickory::HickoryResolver;
pub use parallel::{unique_sorted_ips, FailurePolicy, ParallelResolver, Resolution};
pub use resolve::{Addrs, DnsResolverWithOverrides, Name, Resolve, Resolving};
pub use retry::RetryConfig;
