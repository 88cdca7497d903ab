//! Integration tests for erp-browser.
//!
//! Tests marked `#[ignore]` drive a real Chrome; run them with
//! `cargo test -p erp-browser -- --ignored` on a machine that has one.

use std::path::PathBuf;
use std::time::Duration;

use erp_browser::{
    with_browser, BrowserError, CaptureFilter, ResponseCapture, SessionConfig, StorageState,
};

const SESSION_FILE: &str = r#"{
  "cookies": [
    {"name": "sid", "value": "abc", "domain": ".lixinger.com", "path": "/",
     "expires": 1893456000, "httpOnly": true, "secure": true, "sameSite": "Lax"},
    {"name": "theme", "value": "dark", "domain": "www.lixinger.com", "expires": -1}
  ],
  "origins": [
    {"origin": "https://www.lixinger.com",
     "localStorage": [{"name": "token", "value": "t-1"}]}
  ]
}"#;

fn missing_browser() -> SessionConfig {
    SessionConfig {
        executable: Some(PathBuf::from("/nonexistent/chrome-for-tests")),
        ..Default::default()
    }
}

#[test]
fn test_session_file_roundtrip_to_cdp_params() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage_state.json");
    std::fs::write(&path, SESSION_FILE).unwrap();

    let state = StorageState::load(&path).unwrap();
    let cookies = state.cookie_params();
    assert_eq!(cookies.len(), 2);
    assert_eq!(cookies[0].name, "sid");
    assert_eq!(cookies[0].domain.as_deref(), Some(".lixinger.com"));
    // Session cookies carry no expiry.
    assert!(cookies[1].expires.is_none());

    let script = state.local_storage_script().unwrap();
    assert!(script.contains("https://www.lixinger.com"));
    assert!(script.contains("t-1"));
}

#[test]
fn test_corrupt_session_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage_state.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = StorageState::load(&path).unwrap_err();
    assert!(matches!(err, BrowserError::SessionState { .. }));
}

#[tokio::test]
async fn test_launch_failure_skips_closure() {
    let mut ran = false;
    let result = with_browser(&missing_browser(), |_page| {
        ran = true;
        async {}
    })
    .await;

    assert!(matches!(result, Err(BrowserError::LaunchFailed(_))));
    assert!(!ran);
}

#[tokio::test]
#[ignore = "requires a local Chrome"]
async fn test_page_text_from_data_url() {
    let text = with_browser(&SessionConfig::default(), |page| async move {
        page.goto("data:text/html,<p>市盈率(TTM) 12.34</p>")
            .await
            .unwrap();
        page.evaluate("document.body.innerText")
            .await
            .unwrap()
            .into_value::<String>()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(text.contains("12.34"));
}

#[tokio::test]
#[ignore = "requires a local Chrome"]
async fn test_capture_times_out_without_match() {
    let captured = with_browser(&SessionConfig::default(), |page| async move {
        let mut capture = ResponseCapture::register(&page, CaptureFilter::new("/api/never"))
            .await
            .unwrap();
        let (_, captured) = tokio::join!(
            page.goto("data:text/html,<p>idle</p>"),
            capture.next_match(&page, Duration::from_secs(2))
        );
        captured
    })
    .await
    .unwrap();

    assert!(captured.is_none());
}
