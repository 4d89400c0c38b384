mod common;

use common::*;
use flowcheck::utils::check::{probe_client, probe_url, run_check, ProbeOutcome};

fn ui_url(api_base: &str) -> String {
    format!("{}/ui", api_base.trim_end_matches("/api/v1"))
}

#[tokio::test]
async fn test_check_keeps_token_away_from_ui_host() {
    let (base, api) = spawn_mock_api(MockBehavior::default()).await;
    let mut config = test_config(&base);
    config.ui_base_url = ui_url(&base);

    run_check(&config, Some("test-token")).await;

    assert_eq!(api.ui_seen_auth.lock().unwrap().as_slice(), &[None]);
    // The token still reaches the API through the authenticated list call
    assert!(api
        .seen_auth
        .lock()
        .unwrap()
        .iter()
        .any(|h| h.as_deref() == Some("Bearer test-token")));
}

#[tokio::test]
async fn test_probe_reports_accessible_host() {
    let (base, api) = spawn_mock_api(MockBehavior::default()).await;
    let client = probe_client(1000).unwrap();

    let outcome = probe_url(&client, &ui_url(&base)).await;
    assert_eq!(outcome, ProbeOutcome::Accessible(200));
    assert_eq!(api.ui_seen_auth.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_probe_reports_unreachable_host() {
    let client = probe_client(1000).unwrap();
    let outcome = probe_url(&client, "http://127.0.0.1:9/").await;
    assert!(!matches!(outcome, ProbeOutcome::Accessible(_)));
}
