//! Host extraction from a single OpenVPN configuration file.

use crate::base::neterror::NetError;
use crate::dns::parse_ip_literal;

/// Host recovered from one configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHost {
    pub host: String,
    /// Set when the host was recovered but the file looked unusual.
    pub warning: Option<String>,
}

/// Extracts the server hostname from the `remote` directives of an OpenVPN
/// configuration.
///
/// Remotes given as IP literals are ignored. When several hosts are listed
/// the first one wins and a warning says how many were dropped.
///
/// # Errors
///
/// [`NetError::RemoteHostNotFound`] when no `remote <host>` line names a host.
pub fn parse_host(content: &[u8]) -> Result<ParsedHost, NetError> {
    let text = String::from_utf8_lossy(content);
    let hosts = remote_hosts(&text);

    let Some(first) = hosts.first() else {
        return Err(NetError::RemoteHostNotFound);
    };

    let warning = (hosts.len() > 1).then(|| {
        format!(
            "only using the first host {:?} and discarding {} other hosts",
            first,
            hosts.len() - 1
        )
    });

    Ok(ParsedHost {
        host: first.to_string(),
        warning,
    })
}

fn remote_hosts(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            if fields.next() != Some("remote") {
                return None;
            }
            fields.next()
        })
        .filter(|host| parse_ip_literal(host).is_none())
        .collect()
}
