//! Settings Tests

use vpnservers::base::neterror::NetError;
use vpnservers::config::Settings;
use vpnservers::dns::RetryConfig;

use std::time::Duration;

#[tokio::test]
async fn test_load_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("regions.json");
    tokio::fs::write(&table, r#"{"xx-abc": "Example"}"#).await.unwrap();

    let path = dir.path().join("settings.json");
    let json = format!(
        r#"{{
            "provider": {{
                "name": "Example",
                "domain_suffix": ".vpn.example.net",
                "region_table": {table:?}
            }},
            "archive_resolve": {{ "repetition": 5, "time_between_ms": 250 }}
        }}"#
    );
    tokio::fs::write(&path, json).await.unwrap();

    let settings = Settings::load(&path).await.unwrap();
    assert_eq!(settings.provider.name, "Example");
    assert_eq!(settings.provider.tcp_file_suffix, "_tcp.ovpn");
    assert_eq!(
        settings.archive_resolve.retry_config(),
        RetryConfig::new(5, Duration::from_millis(250))
    );
    assert_eq!(settings.remaining_resolve.retry_config(), RetryConfig::default());

    let regions = settings.region_table().await.unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions.get("xx-abc"), Some("Example"));
}

#[tokio::test]
async fn test_builtin_table_when_unset() {
    let regions = Settings::new().region_table().await.unwrap();
    assert_eq!(regions.get("de-fra"), Some("Germany Frankfurt am Main"));
}

#[tokio::test]
async fn test_load_rejects_invalid_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    tokio::fs::write(&path, r#"{"archive_resolve": {"repetition": 0}}"#)
        .await
        .unwrap();

    let err = Settings::load(&path).await.unwrap_err();
    assert!(matches!(err, NetError::InvalidConfig(_)));
}

#[tokio::test]
async fn test_load_rejects_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    tokio::fs::write(&path, "{ not json").await.unwrap();

    let err = Settings::load(&path).await.unwrap_err();
    assert!(matches!(err, NetError::InvalidJson { .. }));
}
