//! Provider archive handling.
//!
//! - [`ArchiveSource`]: where the per-server configuration files come from
//! - [`HttpArchiveFetcher`]: zip archive downloaded from the provider
//! - [`LocalArchive`]: zip file or extracted directory on disk
//! - [`extract_hosts`]: candidate hostnames out of the files
//! - [`parse_host`]: the OpenVPN `remote` parser used by default

mod extract;
mod fetch;
mod local;
mod ovpn;

pub use extract::{extract_hosts, ExtractedHosts};
pub use fetch::{extract_zip, HttpArchiveFetcher};
pub use local::LocalArchive;
pub use ovpn::{parse_host, ParsedHost};

use crate::base::neterror::NetError;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// File name (without directories) to raw file content.
pub type ArchiveContents = HashMap<String, Vec<u8>>;

/// Alias for the `Future` returned by an [`ArchiveSource`].
pub type Fetching<'a> = Pin<Box<dyn Future<Output = Result<ArchiveContents, NetError>> + Send + 'a>>;

/// Somewhere the provider's configuration files can be read from.
pub trait ArchiveSource: Send + Sync {
    /// Retrieve all files. Any failure here is fatal for the run.
    fn fetch<'a>(&'a self, cancel: &'a CancellationToken) -> Fetching<'a>;

    /// Human readable origin, for logs.
    fn location(&self) -> String;
}

impl<T: ArchiveSource + ?Sized> ArchiveSource for Box<T> {
    fn fetch<'a>(&'a self, cancel: &'a CancellationToken) -> Fetching<'a> {
        (**self).fetch(cancel)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}
