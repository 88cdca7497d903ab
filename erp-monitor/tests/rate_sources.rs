//! Integration tests for the risk-free rate fallback chain.
//!
//! Both pages are served by a local mock server; transport failures and
//! missing matches must degrade to the next source and finally to `None`.

use erp_common::config::RateConfig;
use erp_monitor::data::{DataSource, RateFetcher, RateProvider};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRIMARY_HTML: &str = r#"<html><head><script>var w = "99.9%";</script></head>
<body><h1>China 10-Year Bond Yield</h1><span class="price">1.781</span><span>%</span></body></html>"#;

const SECONDARY_HTML: &str = r#"<html><body><table>
<tr><td>China 10 Years</td><td>1.795%</td><td>+0.02%</td></tr>
</table></body></html>"#;

const TEST_AGENT: &str = "Mozilla/5.0 erp-monitor-test";

fn config(primary: String, secondary: String) -> RateConfig {
    RateConfig {
        primary_url: primary,
        secondary_url: secondary,
        user_agent: TEST_AGENT.into(),
        timeout_secs: 5,
        ..Default::default()
    }
}

fn mock_config(server: &MockServer) -> RateConfig {
    config(
        format!("{}/primary", server.uri()),
        format!("{}/secondary", server.uri()),
    )
}

#[tokio::test]
async fn test_primary_match_sends_browser_headers() {
    let server = MockServer::start().await;
    let referer = RateConfig::default().referer;

    Mock::given(method("GET"))
        .and(path("/primary"))
        .and(header("user-agent", TEST_AGENT))
        .and(header("referer", referer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(PRIMARY_HTML))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/secondary"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SECONDARY_HTML))
        .expect(0)
        .mount(&server)
        .await;

    let fetcher = RateFetcher::new(&mock_config(&server));
    let result = fetcher.fetch_rate().await;

    let rate = result.value.expect("primary should match");
    assert!((rate - 0.01781).abs() < 1e-12);
    assert_eq!(result.source, DataSource::Live("127.0.0.1".into()));
}

#[tokio::test]
async fn test_primary_error_status_falls_back() {
    let server = MockServer::start().await;

    Mock::given(path("/primary"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/secondary"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SECONDARY_HTML))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = RateFetcher::new(&mock_config(&server));
    let rate = fetcher.fetch_risk_free_rate().await.unwrap();
    assert!((rate - 0.01795).abs() < 1e-12);
}

#[tokio::test]
async fn test_primary_without_match_falls_back() {
    let server = MockServer::start().await;

    Mock::given(path("/primary"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<p>United States 10-Year 4.10%</p>"),
        )
        .mount(&server)
        .await;
    Mock::given(path("/secondary"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SECONDARY_HTML))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = RateFetcher::new(&mock_config(&server));
    let rate = fetcher.fetch_risk_free_rate().await.unwrap();
    assert!((rate - 0.01795).abs() < 1e-12);
}

#[tokio::test]
async fn test_both_sources_fail() {
    let server = MockServer::start().await;

    Mock::given(path("/primary"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(path("/secondary"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>maintenance</p>"))
        .mount(&server)
        .await;

    let fetcher = RateFetcher::new(&mock_config(&server));
    let result = fetcher.fetch_rate().await;
    assert_eq!(result.value, None);
    assert_eq!(result.source, DataSource::Unavailable);
}

#[tokio::test]
async fn test_connection_refused_never_propagates() {
    // Port 1 is reserved and nothing listens there.
    let fetcher = RateFetcher::new(&config(
        "http://127.0.0.1:1/primary".into(),
        "http://127.0.0.1:1/secondary".into(),
    ));
    assert_eq!(fetcher.fetch_risk_free_rate().await, None);
}

#[tokio::test]
async fn test_refused_primary_uses_secondary() {
    let server = MockServer::start().await;
    Mock::given(path("/secondary"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SECONDARY_HTML))
        .mount(&server)
        .await;

    let fetcher = RateFetcher::new(&config(
        "http://127.0.0.1:1/primary".into(),
        format!("{}/secondary", server.uri()),
    ));
    let rate = fetcher.fetch_risk_free_rate().await.unwrap();
    assert!((rate - 0.01795).abs() < 1e-12);
}
