//! Server list model and the reconciliation pipeline.
//!
//! - [`RegionTable`]: subdomain code to region name
//! - [`Reconciler`]: archive hosts and table entries merged into one list
//! - [`Updater`]: fetch, reconcile and store in one run
//! - [`ServerStore`]: the last list produced, with its timestamp

mod error;
mod reconcile;
mod store;
mod table;
mod updater;

pub use error::{Phase, UpdateError};
pub use reconcile::{
    host_for_code, match_resolved, remaining_hosts, remaining_servers, subdomain_code, Matched,
    ParseFn, Reconciled, Reconciler,
};
pub use store::ServerStore;
pub use table::RegionTable;
pub use updater::{ProviderInfo, Updater};

use crate::dns::unique_sorted_ips;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// One VPN endpoint: a region and the addresses it currently resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub region: String,
    pub ips: Vec<IpAddr>,
}

impl Server {
    /// Build a server; `ips` are deduplicated and sorted.
    pub fn new(region: impl Into<String>, ips: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            region: region.into(),
            ips: unique_sorted_ips(ips),
        }
    }
}

/// Renders the server as a Rust struct literal.
impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Server {{ region: {:?}.into(), ips: vec![", self.region)?;
        for (i, ip) in self.ips.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match ip {
                IpAddr::V4(v4) => {
                    let [a, b, c, d] = v4.octets();
                    write!(f, "IpAddr::V4(Ipv4Addr::new({a}, {b}, {c}, {d}))")?;
                }
                IpAddr::V6(v6) => {
                    let s = v6.segments();
                    write!(
                        f,
                        "IpAddr::V6(Ipv6Addr::new({:#x}, {:#x}, {:#x}, {:#x}, {:#x}, {:#x}, {:#x}, {:#x}))",
                        s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7]
                    )?;
                }
            }
        }
        f.write_str("] }")
    }
}

/// Sort by region and keep at most one server per region.
///
/// Servers sharing a region are merged into one with the union of their
/// addresses, and a warning is returned for each merge.
pub fn merge_by_region(mut servers: Vec<Server>) -> (Vec<Server>, Vec<String>) {
    servers.sort_by(|a, b| a.region.cmp(&b.region));

    let mut merged: Vec<Server> = Vec::with_capacity(servers.len());
    let mut warnings = Vec::new();

    for server in servers {
        match merged.last_mut() {
            Some(last) if last.region == server.region => {
                warnings.push(format!(
                    "region {:?} produced by more than one host, merging addresses",
                    server.region
                ));
                let ips = std::mem::take(&mut last.ips).into_iter().chain(server.ips);
                last.ips = unique_sorted_ips(ips);
            }
            _ => merged.push(server),
        }
    }

    (merged, warnings)
}
