//! Archive Tests
//!
//! Covers:
//! - `HttpArchiveFetcher` against a local HTTP server
//! - `LocalArchive` over a directory and a zip file
//! - Host extraction from fetched contents

use vpnservers::archive::{
    extract_hosts, parse_host, ArchiveSource, HttpArchiveFetcher, LocalArchive,
};
use vpnservers::base::neterror::NetError;
use vpnservers::dns::{DnsResolverWithOverrides, GaiResolver, Resolve};

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use zip::write::SimpleFileOptions;

fn zip_of(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in files {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn sample_zip() -> Vec<u8> {
    zip_of(&[
        ("al-tia.prod.surfshark.com_udp.ovpn", "client\nremote al-tia.prod.surfshark.com 1194\n"),
        ("al-tia.prod.surfshark.com_tcp.ovpn", "client\nremote al-tia.prod.surfshark.com 1443\n"),
        ("at-vie.prod.surfshark.com_udp.ovpn", "client\nremote at-vie.prod.surfshark.com 1194\n"),
    ])
}

/// Serves `status` with `body` to every connection; returns the base URL.
async fn serve(status: &'static str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            if let Ok((mut socket, _)) = listener.accept().await {
                let body = body.clone();
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let head = format!(
                        "HTTP/1.1 {status}\r\nContent-Type: application/zip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        body.len()
                    );
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(&body).await;
                });
            }
        }
    });

    format!("http://{addr}")
}

/// Answers `GET /start` with a redirect to `location`, anything else with
/// `body`; returns the base URL.
async fn serve_redirect(location: &'static str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            if let Ok((mut socket, _)) = listener.accept().await {
                let body = body.clone();
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]);

                    if request.starts_with("GET /start ") || request.starts_with("GET /loop ") {
                        let response = format!(
                            "HTTP/1.1 302 Found\r\nLocation: {location}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                    } else {
                        let head = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            body.len()
                        );
                        let _ = socket.write_all(head.as_bytes()).await;
                        let _ = socket.write_all(&body).await;
                    }
                });
            }
        }
    });

    format!("http://{addr}")
}

fn system_resolver() -> Arc<dyn Resolve> {
    Arc::new(GaiResolver::new())
}

#[tokio::test]
async fn test_http_fetch_and_extract() {
    let base = serve("200 OK", sample_zip()).await;
    let fetcher =
        HttpArchiveFetcher::parse(&format!("{base}/configurations"), system_resolver()).unwrap();

    let contents = fetcher.fetch_archive(&CancellationToken::new()).await.unwrap();
    assert_eq!(contents.len(), 3);

    let extracted = extract_hosts(&contents, "_tcp.ovpn", parse_host);
    assert_eq!(
        extracted.hosts,
        vec!["al-tia.prod.surfshark.com", "at-vie.prod.surfshark.com"]
    );
    assert!(extracted.warnings.is_empty());
}

#[tokio::test]
async fn test_http_fetch_resolves_archive_host() {
    let base = serve("200 OK", sample_zip()).await;
    let port = base.rsplit(':').next().unwrap();

    let mut overrides = HashMap::new();
    overrides.insert(
        Cow::Borrowed("archive.test"),
        vec![IpAddr::V4(Ipv4Addr::LOCALHOST)],
    );
    let resolver = Arc::new(DnsResolverWithOverrides::new(system_resolver(), overrides));

    let fetcher =
        HttpArchiveFetcher::parse(&format!("http://archive.test:{port}/configs.zip"), resolver)
            .unwrap();
    let contents = fetcher.fetch(&CancellationToken::new()).await.unwrap();
    assert_eq!(contents.len(), 3);
}

#[tokio::test]
async fn test_http_follows_redirect() {
    let base = serve_redirect("/real.zip", sample_zip()).await;
    let fetcher = HttpArchiveFetcher::parse(&format!("{base}/start"), system_resolver()).unwrap();

    let contents = fetcher.fetch_archive(&CancellationToken::new()).await.unwrap();
    assert_eq!(contents.len(), 3);
}

#[tokio::test]
async fn test_http_redirect_loop_is_fatal() {
    let base = serve_redirect("/loop", sample_zip()).await;
    let fetcher = HttpArchiveFetcher::parse(&format!("{base}/start"), system_resolver()).unwrap();

    let err = fetcher.fetch_archive(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, NetError::TooManyRedirects));
}

#[tokio::test]
async fn test_http_status_is_fatal() {
    let base = serve("404 Not Found", Vec::new()).await;
    let fetcher = HttpArchiveFetcher::parse(&format!("{base}/missing"), system_resolver()).unwrap();

    let err = fetcher.fetch_archive(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, NetError::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_http_garbage_body_is_fatal() {
    let base = serve("200 OK", b"<html>maintenance</html>".to_vec()).await;
    let fetcher = HttpArchiveFetcher::parse(&base, system_resolver()).unwrap();

    let err = fetcher.fetch_archive(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, NetError::ArchiveDecode { .. }));
}

#[tokio::test]
async fn test_unsupported_scheme() {
    let fetcher = HttpArchiveFetcher::parse("ftp://127.0.0.1/x.zip", system_resolver()).unwrap();
    let err = fetcher.fetch_archive(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, NetError::InvalidUrl));
}

#[tokio::test]
async fn test_fetch_cancelled() {
    let fetcher = HttpArchiveFetcher::parse("http://127.0.0.1:9/x.zip", system_resolver()).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = fetcher.fetch(&cancel).await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_local_directory() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(
        dir.path().join("de-fra.prod.surfshark.com_udp.ovpn"),
        "remote de-fra.prod.surfshark.com 1194\n",
    )
    .await
    .unwrap();
    tokio::fs::create_dir(dir.path().join("nested")).await.unwrap();

    let archive = LocalArchive::new(dir.path());
    let contents = archive.fetch(&CancellationToken::new()).await.unwrap();

    assert_eq!(contents.len(), 1);
    assert!(contents.contains_key("de-fra.prod.surfshark.com_udp.ovpn"));
    assert_eq!(archive.location(), dir.path().display().to_string());
}

#[tokio::test]
async fn test_local_zip_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("configurations.zip");
    tokio::fs::write(&path, sample_zip()).await.unwrap();

    let contents = LocalArchive::new(&path)
        .fetch(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(contents.len(), 3);
}

#[tokio::test]
async fn test_local_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = LocalArchive::new(dir.path().join("absent"))
        .read_all()
        .await
        .unwrap_err();
    assert!(matches!(err, NetError::Io { .. }));
}
