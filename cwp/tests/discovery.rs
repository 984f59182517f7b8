mod common;

use common::{info, ProviderDir};
use cwp::config::WalletConfig;
use cwp::registry::Registry;
use cwp::scanner::Scanner;
use pretty_assertions::assert_eq;
use serde_json::json;
use serial_test::serial;
use std::time::{Duration, Instant};

fn names(providers: &[cwp::ProviderInfo]) -> Vec<&str> {
    providers.iter().map(|p| p.short_name.as_str()).collect()
}

#[tokio::test]
#[serial]
async fn hung_provider_is_reported_without_blocking_others() {
    let dir = ProviderDir::new();
    dir.provider("alpha", &info("Alpha", &["accounts"], &["eip155"]), &[]);
    dir.script("wallet-hung", "exec sleep 10");
    dir.provider("beta", &info("Beta", &["accounts"], &["solana"]), &[]);

    let registry = Registry::new(dir.scanner(), WalletConfig::default())
        .with_probe_timeout(Duration::from_millis(300));
    let started = Instant::now();
    let providers = registry.discover().await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(names(&providers), vec!["alpha", "beta", "hung"]);
    assert!(providers[0].is_available());
    assert!(providers[1].is_available());

    let hung = &providers[2];
    assert!(hung.info.is_none());
    let error = hung.error.as_deref().unwrap();
    assert!(error.ends_with("timed out after 300ms"), "{}", error);
}

#[tokio::test]
#[serial]
async fn disabled_providers_are_not_probed() {
    let dir = ProviderDir::new();
    dir.provider("alpha", &info("Alpha", &["accounts"], &["eip155"]), &[]);
    dir.provider("beta", &info("Beta", &["accounts"], &["eip155"]), &[]);

    let config = WalletConfig {
        disabled: vec!["alpha".into()],
        ..WalletConfig::default()
    };
    let providers = dir.registry(config).discover().await;

    assert_eq!(names(&providers), vec!["beta"]);
}

#[tokio::test]
#[serial]
async fn priority_then_name_ordering_and_default() {
    let dir = ProviderDir::new();
    for short in ["alpha", "beta", "gamma"] {
        dir.provider(short, &info(short, &["accounts"], &["eip155"]), &[]);
    }

    let config = WalletConfig {
        priority: vec!["gamma".into()],
        ..WalletConfig::default()
    };
    let registry = dir.registry(config);
    assert_eq!(names(&registry.discover().await), vec!["gamma", "alpha", "beta"]);
    assert_eq!(registry.get_default().await.unwrap().short_name, "gamma");

    let config = WalletConfig {
        default: Some("beta".into()),
        priority: vec!["gamma".into()],
        ..WalletConfig::default()
    };
    assert_eq!(dir.registry(config).get_default().await.unwrap().short_name, "beta");
}

#[tokio::test]
#[serial]
async fn unresponsive_configured_default_falls_back() {
    let dir = ProviderDir::new();
    dir.provider("alpha", &info("Alpha", &["accounts"], &["eip155"]), &[]);
    dir.script("wallet-broken", "echo nope");

    let config = WalletConfig {
        default: Some("broken".into()),
        ..WalletConfig::default()
    };
    let registry = dir.registry(config);

    assert_eq!(registry.get_default().await.unwrap().short_name, "alpha");
    let broken = registry.get_by_name("broken").await.unwrap();
    assert!(!broken.is_available());
}

#[tokio::test]
#[serial]
async fn incompatible_protocol_version_is_a_probe_error() {
    let dir = ProviderDir::new();
    let mut advertised = info("Future", &["accounts"], &["eip155"]);
    advertised["protocolVersion"] = json!("2");
    dir.provider("future", &advertised, &[]);

    let providers = dir.registry(WalletConfig::default()).discover().await;

    assert_eq!(providers.len(), 1);
    assert_eq!(
        providers[0].error.as_deref(),
        Some("unsupported protocol version 2")
    );
}

#[tokio::test]
#[serial]
async fn first_directory_on_search_path_wins() {
    let first = ProviderDir::new();
    let second = ProviderDir::new();
    first.provider("dup", &info("First", &["accounts"], &["eip155"]), &[]);
    second.provider("dup", &info("Second", &["accounts"], &["eip155"]), &[]);

    let scanner = Scanner::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]);
    let providers = Registry::new(scanner, WalletConfig::default()).discover().await;

    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].display_name(), "First");
}

#[tokio::test]
#[serial]
async fn empty_search_path_discovers_nothing() {
    let registry = Registry::new(Scanner::new(Vec::new()), WalletConfig::default());
    assert!(registry.discover().await.is_empty());
    assert!(registry.get_default().await.is_none());
}
