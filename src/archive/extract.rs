//! Candidate hostnames from archive contents.

use super::ovpn::ParsedHost;
use super::ArchiveContents;
use crate::base::neterror::NetError;
use std::collections::HashSet;

/// Hostnames found in an archive and the anomalies met on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedHosts {
    pub hosts: Vec<String>,
    pub warnings: Vec<String>,
}

/// Runs `parse` over every eligible file of `contents`.
///
/// Files whose name ends with `skip_suffix` are the TCP twin of a UDP file and
/// are skipped silently. A parse failure becomes a warning naming the file and
/// never stops the batch. Files are visited in name order; a host named by
/// several files is listed once.
pub fn extract_hosts<F>(contents: &ArchiveContents, skip_suffix: &str, parse: F) -> ExtractedHosts
where
    F: Fn(&[u8]) -> Result<ParsedHost, NetError>,
{
    let mut file_names: Vec<&String> = contents.keys().collect();
    file_names.sort();

    let mut extracted = ExtractedHosts::default();
    let mut seen = HashSet::new();

    for file_name in file_names {
        if !skip_suffix.is_empty() && file_name.ends_with(skip_suffix) {
            continue;
        }

        match parse(&contents[file_name]) {
            Ok(ParsedHost { host, warning }) => {
                if let Some(warning) = warning {
                    extracted.warnings.push(warning);
                }
                if seen.insert(host.clone()) {
                    extracted.hosts.push(host);
                }
            }
            Err(e) => {
                tracing::debug!(file = %file_name, error = %e, "skipping unparseable file");
                extracted.warnings.push(format!("{e} in {file_name}"));
            }
        }
    }

    tracing::debug!(
        files = contents.len(),
        hosts = extracted.hosts.len(),
        "extracted hosts from archive"
    );
    extracted
}
