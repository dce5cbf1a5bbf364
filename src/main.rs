//! Command line entry point: update a provider's server list.

use clap::{Parser, ValueEnum};
use std::borrow::Cow;
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use vpnservers::archive::{ArchiveSource, HttpArchiveFetcher, LocalArchive};
use vpnservers::base::neterror::NetError;
use vpnservers::config::Settings;
use vpnservers::dns::{
    DnsResolverWithOverrides, GaiResolver, HickoryResolver, ParallelResolver, Resolve,
};
use vpnservers::output::stringify_servers;
use vpnservers::servers::{ProviderInfo, Reconciler, ServerStore, Updater};

#[derive(Parser)]
#[command(name = "vpnservers")]
#[command(version)]
#[command(about = "Resolve and reconcile a VPN provider's server list", long_about = None)]
struct Cli {
    /// JSON settings file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the archive URL
    #[arg(long, value_name = "URL")]
    archive_url: Option<String>,

    /// Read the archive from a zip file or extracted directory instead
    #[arg(long, value_name = "PATH", conflicts_with = "archive_url")]
    from_path: Option<PathBuf>,

    /// DNS resolver used for every lookup
    #[arg(long, value_enum, default_value = "hickory")]
    resolver: ResolverKind,

    /// Pin a host to fixed addresses (host=ip[,ip...]), repeatable
    #[arg(long = "override", value_name = "HOST=IPS")]
    overrides: Vec<String>,

    /// Print the server list as Rust source
    #[arg(long)]
    stdout: bool,

    /// Save the server list as JSON
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Abort the whole run after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ResolverKind {
    /// getaddrinfo on the blocking pool
    System,
    /// hickory-dns with the system configuration
    Hickory,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path).await?,
        None => Settings::new(),
    };
    if let Some(url) = &cli.archive_url {
        settings = settings.archive_url(url.clone());
    }
    settings.validate()?;

    let resolver = build_resolver(cli.resolver, &cli.overrides)?;
    let table = settings.region_table().await?;
    tracing::debug!(codes = table.len(), "region table loaded");

    let source: Box<dyn ArchiveSource> = match &cli.from_path {
        Some(path) => Box::new(LocalArchive::new(path)),
        None => Box::new(HttpArchiveFetcher::parse(
            &settings.provider.archive_url,
            resolver.clone(),
        )?),
    };

    let reconciler = Reconciler::new(
        ParallelResolver::new(resolver),
        table,
        settings.provider.domain_suffix.clone(),
    )
    .tcp_file_suffix(settings.provider.tcp_file_suffix.clone())
    .archive_retry(settings.archive_resolve.retry_config())
    .remaining_retry(settings.remaining_resolve.retry_config());

    let provider = ProviderInfo::new(settings.provider.name.clone());
    let updater = Updater::new(provider.clone(), source, reconciler);

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(&cancel, cli.timeout.map(Duration::from_secs));

    // replaced wholesale on success, so an existing output file is never read
    let mut store = ServerStore::new();

    let result = updater.update(&mut store, &cancel).await;
    cancel.cancel();

    let warnings = match &result {
        Ok(warnings) => warnings.as_slice(),
        Err(e) => e.warnings.as_slice(),
    };
    for warning in warnings {
        tracing::warn!("{}: {warning}", provider.name);
    }

    if let Err(e) = result {
        return Err(format!("cannot update {} servers: {e}", provider.name).into());
    }

    if cli.stdout {
        let fn_name = format!("{}_servers", provider.name.to_lowercase());
        println!("{}", stringify_servers(&fn_name, &store.servers));
    }
    if let Some(path) = &cli.output {
        store.save(path).await?;
        tracing::info!(path = %path.display(), "server list saved");
    }
    Ok(())
}

fn build_resolver(
    kind: ResolverKind,
    overrides: &[String],
) -> Result<Arc<dyn Resolve>, NetError> {
    let base: Arc<dyn Resolve> = match kind {
        ResolverKind::System => Arc::new(GaiResolver::new()),
        ResolverKind::Hickory => Arc::new(HickoryResolver::new()),
    };
    if overrides.is_empty() {
        return Ok(base);
    }

    let overrides = parse_overrides(overrides)?;
    Ok(Arc::new(DnsResolverWithOverrides::new(base, overrides)))
}

fn parse_overrides(
    raw: &[String],
) -> Result<HashMap<Cow<'static, str>, Vec<IpAddr>>, NetError> {
    let mut overrides: HashMap<Cow<'static, str>, Vec<IpAddr>> = HashMap::new();
    for entry in raw {
        let (host, ips) = entry
            .split_once('=')
            .ok_or_else(|| NetError::InvalidConfig(format!("override {entry:?} is not host=ip")))?;
        let ips = ips
            .split(',')
            .map(|ip| ip.trim().parse::<IpAddr>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| NetError::InvalidConfig(format!("override {entry:?}: {e}")))?;
        overrides
            .entry(Cow::Owned(host.trim().to_string()))
            .or_default()
            .extend(ips);
    }
    Ok(overrides)
}

/// Cancel the run on Ctrl-C or when the deadline passes.
fn spawn_cancel_triggers(cancel: &CancellationToken, timeout: Option<Duration>) {
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            res = tokio::signal::ctrl_c() => {
                if res.is_ok() {
                    tracing::warn!("interrupted, cancelling");
                    token.cancel();
                }
            }
        }
    });

    if let Some(timeout) = timeout {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    tracing::warn!(?timeout, "deadline reached, cancelling");
                    token.cancel();
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overrides() {
        let raw = vec![
            "a.example=1.1.1.1,2.2.2.2".to_string(),
            "a.example=::1".to_string(),
        ];
        let overrides = parse_overrides(&raw).unwrap();
        assert_eq!(overrides["a.example"].len(), 3);
    }

    #[test]
    fn test_parse_overrides_rejects_bad_ip() {
        let raw = vec!["a.example=nope".to_string()];
        assert!(matches!(
            parse_overrides(&raw),
            Err(NetError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "vpnservers",
            "--from-path",
            "configs.zip",
            "--resolver",
            "system",
            "--override",
            "h=1.2.3.4",
            "--stdout",
        ])
        .unwrap();
        assert!(cli.stdout);
        assert_eq!(cli.overrides.len(), 1);
    }
}
