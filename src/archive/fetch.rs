//! Archive download over HTTP(S) and zip decoding.
//!
//! The connection path is DNS -> TCP -> TLS (BoringSSL, `https` only) ->
//! HTTP/1.1. One GET per fetch; the response must be `200 OK`.

use super::{ArchiveContents, ArchiveSource, Fetching};
use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::dns::{parse_ip_literal, Name, Resolve};
use boring::ssl::{SslConnector, SslMethod};
use bytes::Bytes;
use http::{header, Request, StatusCode};
use http_body_util::{BodyExt, Empty};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use std::fmt;
use std::io::{Cursor, Read};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use url::Url;

const USER_AGENT: &str = concat!("vpnservers/", env!("CARGO_PKG_VERSION"));

/// Upper bound on the buffer reserved from a zip entry's declared size.
const MAX_ENTRY_PREALLOC: u64 = 1024 * 1024;

/// Redirects followed before giving up.
const MAX_REDIRECTS: usize = 20;

/// Outcome of a single GET.
enum Fetched {
    Body(Bytes),
    Redirect(Url),
}

/// Downloads a zip archive of configuration files.
pub struct HttpArchiveFetcher {
    url: Url,
    resolver: Arc<dyn Resolve>,
}

impl HttpArchiveFetcher {
    /// The archive host is resolved through `resolver`, like every other name.
    pub fn new(url: Url, resolver: Arc<dyn Resolve>) -> Self {
        Self { url, resolver }
    }

    pub fn parse(url: &str, resolver: Arc<dyn Resolve>) -> Result<Self, NetError> {
        let url = Url::parse(url).map_err(|_| NetError::InvalidUrl)?;
        Ok(Self::new(url, resolver))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Download the archive and return its files keyed by base name.
    ///
    /// # Errors
    ///
    /// Any transport failure, a status other than 200, or an undecodable
    /// archive. [`NetError::Cancelled`] when `cancel` fires first.
    pub async fn fetch_archive(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ArchiveContents, NetError> {
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(NetError::Cancelled),
            body = self.download() => body?,
        };

        let contents = extract_zip(&body)?;
        tracing::info!(url = %self.url, bytes = body.len(), files = contents.len(), "archive fetched");
        Ok(contents)
    }

    async fn download(&self) -> Result<Bytes, NetError> {
        let mut url = self.url.clone();
        let mut redirects_left = MAX_REDIRECTS;

        loop {
            match self.download_once(&url).await? {
                Fetched::Body(body) => return Ok(body),
                Fetched::Redirect(next) => {
                    if redirects_left == 0 {
                        return Err(NetError::TooManyRedirects);
                    }
                    redirects_left -= 1;
                    tracing::debug!(from = %url, to = %next, "following redirect");
                    url = next;
                }
            }
        }
    }

    async fn download_once(&self, url: &Url) -> Result<Fetched, NetError> {
        let host = url.host_str().ok_or(NetError::InvalidUrl)?;
        let port = url.port_or_known_default().ok_or(NetError::InvalidUrl)?;

        match url.scheme() {
            "https" => {
                let stream = self.connect(host, port).await?;
                let tls = tls_handshake(host, stream).await?;
                get(tls, url).await
            }
            "http" => {
                let stream = self.connect(host, port).await?;
                get(stream, url).await
            }
            _ => Err(NetError::InvalidUrl),
        }
    }

    async fn connect(&self, host: &str, port: u16) -> Result<TcpStream, NetError> {
        let ips: Vec<IpAddr> = match parse_ip_literal(host) {
            Some(ip) => vec![ip],
            None => self.resolver.resolve(Name::new(host)).await?.collect(),
        };

        let mut last_error = None;
        for ip in ips {
            match TcpStream::connect(SocketAddr::new(ip, port)).await {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    tracing::debug!(%ip, port, error = %e, "connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err::<TcpStream, _>(e).connection_context(host, port),
            None => Err(NetError::ConnectionFailed),
        }
    }
}

impl ArchiveSource for HttpArchiveFetcher {
    fn fetch<'a>(&'a self, cancel: &'a CancellationToken) -> Fetching<'a> {
        Box::pin(self.fetch_archive(cancel))
    }

    fn location(&self) -> String {
        self.url.to_string()
    }
}

impl fmt::Debug for HttpArchiveFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpArchiveFetcher")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

async fn tls_handshake(
    host: &str,
    stream: TcpStream,
) -> Result<tokio_boring::SslStream<TcpStream>, NetError> {
    let mut builder =
        SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::SslProtocolError)?;

    // Only HTTP/1.1 is spoken on this connection
    builder
        .set_alpn_protos(b"\x08http/1.1")
        .map_err(|_| NetError::SslProtocolError)?;

    let connector = builder.build();
    let config = connector.configure().map_err(|_| NetError::SslProtocolError)?;

    tokio_boring::connect(config, host, stream).await.map_err(|e| {
        tracing::debug!(host = %host, error = ?e, "TLS handshake failed");
        NetError::SslProtocolError
    })
}

/// One GET on an established connection. A 3xx with a usable `Location`
/// comes back as [`Fetched::Redirect`]; any other status but 200 is an error.
async fn get<S>(io: S, url: &Url) -> Result<Fetched, NetError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, conn) = http1::handshake(TokioIo::new(io))
        .await
        .map_err(|_| NetError::ConnectionFailed)?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!(error = %e, "archive connection closed with error");
        }
    });

    let request = Request::builder()
        .uri(&url[url::Position::BeforePath..])
        .header(header::HOST, host_header(url))
        .header(header::USER_AGENT, USER_AGENT)
        .body(Empty::<Bytes>::new())
        .map_err(|_| NetError::InvalidUrl)?;

    let response = sender.send_request(request).await.map_err(|e| {
        tracing::debug!(url = %url, error = %e, "archive request failed");
        NetError::ConnectionFailed
    })?;

    let status = response.status();
    if status.is_redirection() {
        let next = response
            .headers()
            .get(header::LOCATION)
            .and_then(|location| location.to_str().ok())
            .and_then(|location| url.join(location).ok());
        if let Some(next) = next {
            return Ok(Fetched::Redirect(next));
        }
    }

    if status != StatusCode::OK {
        return Err(NetError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|_| NetError::HttpBodyError)?;
    Ok(Fetched::Body(body.to_bytes()))
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// Decode a zip archive into base file name -> content.
///
/// Directory entries are skipped; entries in subdirectories are keyed by
/// their base name. Two entries sharing a base name make the archive
/// ambiguous and are rejected.
pub fn extract_zip(bytes: &[u8]) -> Result<ArchiveContents, NetError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(NetError::archive_decode)?;
    let mut contents = ArchiveContents::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(NetError::archive_decode)?;
        if entry.is_dir() {
            continue;
        }

        let entry_name = entry.name().to_string();
        let Some(file_name) = Path::new(&entry_name)
            .file_name()
            .and_then(|name| name.to_str())
        else {
            continue;
        };

        if contents.contains_key(file_name) {
            return Err(NetError::archive_entry(
                entry_name.as_str(),
                format!("another entry is already named {file_name:?}"),
            ));
        }

        // the declared size is untrusted, so it only bounds the initial reservation
        let capacity = entry.size().min(MAX_ENTRY_PREALLOC) as usize;
        let mut data = Vec::with_capacity(capacity);
        entry
            .read_to_end(&mut data)
            .map_err(|e| NetError::archive_entry(entry_name.as_str(), e))?;
        contents.insert(file_name.to_string(), data);
    }

    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn zip_of(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in files {
            if name.ends_with('/') {
                writer
                    .add_directory(*name, SimpleFileOptions::default())
                    .unwrap();
                continue;
            }
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extract_zip_uses_base_names() {
        let bytes = zip_of(&[
            ("configs/", ""),
            ("configs/al-tia.prod.surfshark.com_udp.ovpn", "remote al-tia.prod.surfshark.com 1194\n"),
            ("top_tcp.ovpn", "remote top.example 1443\n"),
        ]);

        let contents = extract_zip(&bytes).unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(
            contents["al-tia.prod.surfshark.com_udp.ovpn"],
            b"remote al-tia.prod.surfshark.com 1194\n".to_vec()
        );
        assert!(contents.contains_key("top_tcp.ovpn"));
    }

    #[test]
    fn test_extract_zip_rejects_garbage() {
        let err = extract_zip(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, NetError::ArchiveDecode { .. }));
    }

    #[test]
    fn test_extract_zip_rejects_repeated_base_name() {
        let bytes = zip_of(&[
            ("udp/de-fra.ovpn", "remote de-fra.prod.surfshark.com 1194\n"),
            ("tcp/de-fra.ovpn", "remote de-fra.prod.surfshark.com 1443\n"),
        ]);

        match extract_zip(&bytes).unwrap_err() {
            NetError::ArchiveEntry { name, reason } => {
                assert_eq!(name, "tcp/de-fra.ovpn");
                assert!(reason.contains("de-fra.ovpn"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_extract_zip_oversized_declared_length() {
        let body = "remote at-vie.prod.surfshark.com 1194\n";
        let mut bytes = {
            let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
            let stored =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
            writer.start_file("at-vie.ovpn", stored).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
            writer.finish().unwrap().into_inner()
        };

        // claim a ~4 GiB uncompressed size in the central directory
        let central = bytes
            .windows(4)
            .position(|w| w == [0x50, 0x4b, 0x01, 0x02])
            .unwrap();
        bytes[central + 24..central + 28].copy_from_slice(&0xFFFF_FFF0u32.to_le_bytes());

        // either outcome is fine as long as the call returns
        if let Ok(contents) = extract_zip(&bytes) {
            assert_eq!(contents["at-vie.ovpn"], body.as_bytes());
        }
    }

    #[test]
    fn test_host_header_keeps_explicit_port() {
        let url = Url::parse("http://127.0.0.1:8080/configs.zip").unwrap();
        assert_eq!(host_header(&url), "127.0.0.1:8080");

        let url = Url::parse("https://my.surfshark.com/vpn/api/v1/server/configurations").unwrap();
        assert_eq!(host_header(&url), "my.surfshark.com");
    }
}
