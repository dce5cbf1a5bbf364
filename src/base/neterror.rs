use std::{io, sync::Arc};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Resolution Errors
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Name not resolved: {domain}")]
    NameNotResolvedFor {
        domain: String,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("no IP address found for host {host:?} after {attempts} attempts")]
    ResolutionExhausted { host: String, attempts: usize },
    #[error("Operation cancelled")]
    Cancelled,

    // Transport Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Connection to {host}:{port} failed")]
    ConnectionFailedTo {
        host: String,
        port: u16,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("HTTP body error")]
    HttpBodyError,
    #[error("Too many redirects")]
    TooManyRedirects,

    // Archive Errors
    #[error("Archive decode failed: {reason}")]
    ArchiveDecode { reason: String },
    #[error("Cannot read archive entry {name}: {reason}")]
    ArchiveEntry { name: String, reason: String },
    #[error("remote host not found")]
    RemoteHostNotFound,

    // Local Errors
    #[error("I/O error on {path}")]
    Io {
        path: String,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Invalid JSON in {path}: {reason}")]
    InvalidJson { path: String, reason: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NetError {
    pub fn dns_failed(domain: impl Into<String>, source: io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.into(),
            source: Arc::new(source),
        }
    }

    /// Resolution error for a lookup that succeeded but returned nothing.
    pub fn no_addresses(domain: impl Into<String>, detail: &str) -> Self {
        Self::dns_failed(domain, io::Error::new(io::ErrorKind::NotFound, detail.to_string()))
    }

    pub fn connection_failed_to(host: impl Into<String>, port: u16, source: io::Error) -> Self {
        NetError::ConnectionFailedTo {
            host: host.into(),
            port,
            source: Arc::new(source),
        }
    }

    pub fn archive_decode(reason: impl ToString) -> Self {
        NetError::ArchiveDecode {
            reason: reason.to_string(),
        }
    }

    pub fn archive_entry(name: impl Into<String>, reason: impl ToString) -> Self {
        NetError::ArchiveEntry {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        NetError::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub fn invalid_json(path: impl Into<String>, source: serde_json::Error) -> Self {
        NetError::InvalidJson {
            path: path.into(),
            reason: source.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, NetError::Cancelled)
    }

    /// True for errors that mean a hostname could not be turned into addresses.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            NetError::NameNotResolved
                | NetError::NameNotResolvedFor { .. }
                | NetError::ResolutionExhausted { .. }
        )
    }
}
