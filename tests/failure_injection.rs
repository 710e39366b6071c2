//! Failure injection: transient outages, timeouts and rejected credentials.

use std::time::Duration;

use infisical_config::repository::RepositoryError;
use infisical_config::{ConfigurationProvider, ProviderError, ProviderState, ValidationError};

mod common;
use common::ScriptedBackend;

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried() {
    let backend = ScriptedBackend::with_secrets(&[("A", "1")]);
    backend.fail_next(3);

    let provider = ConfigurationProvider::from_options(&common::options(), backend.clone()).unwrap();
    provider.load().await.unwrap();

    assert_eq!(provider.try_get("A").as_deref(), Some("1"));
    assert_eq!(backend.listings(), 4);
    assert_eq!(backend.logins(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_gives_up_after_ten_attempts() {
    let backend = ScriptedBackend::with_secrets(&[("A", "1")]);
    let options = common::options().with_load_timeout(-1);
    let provider = ConfigurationProvider::from_options(&options, backend.clone()).unwrap();
    provider.load().await.unwrap();

    backend.fail_always(true);
    let token = provider.reload_token();
    let started = tokio::time::Instant::now();

    assert!(!provider.refresh().await);

    assert_eq!(backend.listings(), 1 + 10);
    // Nine backoff delays of 50 + 5 * 2^n ms.
    assert!(started.elapsed() >= Duration::from_millis(5_560));
    assert_eq!(provider.state(), ProviderState::Degraded);
    assert_eq!(provider.try_get("A").as_deref(), Some("1"));
    assert!(!token.has_changed());
}

#[tokio::test(start_paused = true)]
async fn test_refresh_timeout_keeps_previous_snapshot() {
    let backend = ScriptedBackend::with_secrets(&[("A", "1")]);
    let options = common::options().with_load_timeout(1_000);
    let provider = ConfigurationProvider::from_options(&options, backend.clone()).unwrap();
    provider.load().await.unwrap();

    backend.hang(true);
    assert!(!provider.refresh().await);
    assert_eq!(provider.state(), ProviderState::Degraded);
    assert_eq!(provider.try_get("A").as_deref(), Some("1"));

    // Recovery publishes again.
    backend.hang(false);
    backend.set("A", "2");
    assert!(provider.refresh().await);
    assert_eq!(provider.state(), ProviderState::Loaded);
    assert_eq!(provider.try_get("A").as_deref(), Some("2"));
}

#[tokio::test(start_paused = true)]
async fn test_initial_load_timeout_is_reported() {
    let backend = ScriptedBackend::with_secrets(&[("A", "1")]);
    backend.hang(true);

    let options = common::options().with_load_timeout(2_000);
    let provider = ConfigurationProvider::from_options(&options, backend.clone()).unwrap();

    let err = provider.load().await.unwrap_err();
    assert!(matches!(err, ProviderError::LoadTimeout(d) if d == Duration::from_secs(2)));
    assert_eq!(provider.state(), ProviderState::Uninitialized);
    assert_eq!(provider.try_get("A"), None);
    assert!(provider.get_children("").is_empty());

    // Refresh does nothing before a successful load.
    assert!(!provider.refresh().await);
}

#[tokio::test(start_paused = true)]
async fn test_default_timeout_cuts_retries_short() {
    let backend = ScriptedBackend::with_secrets(&[("A", "1")]);
    backend.fail_always(true);

    let provider = ConfigurationProvider::from_options(&common::options(), backend.clone()).unwrap();
    let started = tokio::time::Instant::now();

    let err = provider.load().await.unwrap_err();
    assert!(matches!(err, ProviderError::LoadTimeout(d) if d == Duration::from_secs(5)));
    assert!(started.elapsed() < Duration::from_millis(5_560));
    assert!(backend.listings() < 10);
}

#[tokio::test]
async fn test_rejected_credentials_are_not_retried() {
    let backend = ScriptedBackend::with_secrets(&[("A", "1")]);
    backend.reject_login(true);

    let provider = ConfigurationProvider::from_options(&common::options(), backend.clone()).unwrap();
    let err = provider.load().await.unwrap_err();

    assert!(matches!(
        err,
        ProviderError::Fetch(RepositoryError::Authentication(_))
    ));
    assert_eq!(backend.logins(), 1);
    assert_eq!(backend.listings(), 0);

    // Fixed credentials are picked up on the next attempt.
    backend.reject_login(false);
    provider.load().await.unwrap();
    assert_eq!(provider.try_get("A").as_deref(), Some("1"));
    assert_eq!(backend.logins(), 2);
}

#[tokio::test]
async fn test_invalid_options_fail_construction() {
    let backend = ScriptedBackend::new();

    let mut options = common::options();
    options.project_id = None;
    let err = ConfigurationProvider::from_options(&options, backend.clone()).unwrap_err();
    assert!(matches!(err, ProviderError::Validation(ValidationError::MissingProjectId)));

    let options = common::options().with_site_url("http://secrets.example.com");
    let err = ConfigurationProvider::from_options(&options, backend.clone()).unwrap_err();
    assert_eq!(err.to_string(), "SiteUrl must use HTTPS scheme");

    assert_eq!(backend.logins(), 0);
}

#[tokio::test]
async fn test_load_after_shutdown() {
    let backend = ScriptedBackend::with_secrets(&[("A", "1")]);
    let provider = ConfigurationProvider::from_options(&common::options(), backend.clone()).unwrap();
    provider.load().await.unwrap();

    provider.shutdown().await;
    assert!(matches!(provider.load().await, Err(ProviderError::ShutDown)));
    assert!(matches!(provider.set("A", Some("2")), Err(ProviderError::Unsupported)));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_does_not_wait_for_hung_refresh() {
    let backend = ScriptedBackend::with_secrets(&[("A", "1")]);
    let options = common::options()
        .with_load_timeout(-1)
        .with_polling_interval(100);
    let provider = ConfigurationProvider::from_options(&options, backend.clone()).unwrap();
    provider.load().await.unwrap();

    // The next tick starts a listing that never answers.
    backend.hang(true);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(backend.listings(), 2);

    tokio::time::timeout(Duration::from_secs(1), provider.shutdown())
        .await
        .expect("shutdown blocked on the in-flight refresh");

    assert_eq!(provider.state(), ProviderState::ShutDown);
    assert_eq!(provider.try_get("A").as_deref(), Some("1"));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cuts_retry_loop_short() {
    let backend = ScriptedBackend::with_secrets(&[("A", "1")]);
    let options = common::options().with_polling_interval(100);
    let provider = ConfigurationProvider::from_options(&options, backend.clone()).unwrap();
    provider.load().await.unwrap();

    backend.fail_always(true);
    tokio::time::sleep(Duration::from_millis(150)).await;

    let started = tokio::time::Instant::now();
    provider.shutdown().await;
    assert!(started.elapsed() < Duration::from_millis(100));

    // No retries continue in the background.
    let listings = backend.listings();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.listings(), listings);
    assert!(listings < 1 + 10);
}
