//! Integration tests for the fetch → compute → publish flow.
//!
//! Providers and publisher are replaced with in-memory mocks so the tests
//! exercise degradation and override handling without network access.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use erp_common::config::OverrideConfig;
use erp_monitor::data::{DataSource, RateProvider, RatioProvider, Sourced};
use erp_monitor::sheets::{ReportPublisher, SheetHandle, SheetsError};
use erp_monitor::valuation::{Classification, Icon, ValuationCalculator, ValuationReport};
use erp_monitor::Pipeline;

// ============================================================================
// Mocks
// ============================================================================

struct FixedRate(Option<f64>);

#[async_trait]
impl RateProvider for FixedRate {
    async fn fetch_rate(&self) -> Sourced {
        match self.0 {
            Some(v) => Sourced::live(v, "mock-rate"),
            None => Sourced::missing(),
        }
    }
}

struct FixedRatio(Option<f64>);

#[async_trait]
impl RatioProvider for FixedRatio {
    async fn fetch_ratio_sourced(&self) -> Sourced {
        match self.0 {
            Some(v) => Sourced::live(v, "mock-ratio"),
            None => Sourced::missing(),
        }
    }
}

/// Records every published report; optionally fails.
#[derive(Clone, Default)]
struct RecordingPublisher {
    fail: bool,
    calls: Arc<AtomicU32>,
    last: Arc<Mutex<Option<ValuationReport>>>,
}

#[async_trait]
impl ReportPublisher for RecordingPublisher {
    async fn publish_report(&self, report: &ValuationReport) -> Result<SheetHandle, SheetsError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.fail {
            return Err(SheetsError::Api {
                operation: "create spreadsheet",
                status: 500,
                body: "backend error".into(),
            });
        }
        *self.last.lock().unwrap() = Some(report.clone());
        Ok(SheetHandle {
            spreadsheet_id: "mock-id".into(),
            url: "https://docs.google.com/spreadsheets/d/mock-id/edit".into(),
        })
    }
}

fn pipeline(rate: Option<f64>, ratio: Option<f64>, publisher: &RecordingPublisher) -> Pipeline {
    Pipeline::new(
        Box::new(FixedRate(rate)),
        Box::new(FixedRatio(ratio)),
        ValuationCalculator::new(),
        Some(Box::new(publisher.clone())),
    )
    .with_index_name("沪深300")
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_complete_inputs_publish_signal() {
    let publisher = RecordingPublisher::default();
    let outcome = pipeline(Some(0.03), Some(15.0), &publisher)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.report.classification, Classification::Sell);
    assert_eq!(outcome.report.icon, Icon::Red);
    assert_eq!(outcome.handle.unwrap().spreadsheet_id, "mock-id");
    assert_eq!(publisher.calls.load(Ordering::Relaxed), 1);

    let published = publisher.last.lock().unwrap().clone().unwrap();
    assert_eq!(published.provenance.index_name, "沪深300");
    assert_eq!(
        published.provenance.ratio_source,
        DataSource::Live("mock-ratio".into())
    );
}

#[tokio::test]
async fn test_missing_ratio_still_publishes() {
    let publisher = RecordingPublisher::default();
    let outcome = pipeline(Some(0.018), None, &publisher)
        .run()
        .await
        .unwrap();

    assert_eq!(
        outcome.report.classification,
        Classification::NeedsManualUpdate
    );
    assert!(outcome.report.ratio_ceiling.is_some());
    assert_eq!(publisher.calls.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_overrides_fill_missing_inputs() {
    let publisher = RecordingPublisher::default();
    let outcome = pipeline(None, None, &publisher)
        .with_overrides(OverrideConfig {
            rate: Some(0.02),
            ratio: Some(10.0),
        })
        .run()
        .await
        .unwrap();

    let report = outcome.report;
    assert_eq!(report.rate, Some(0.02));
    assert_eq!(report.ratio, Some(10.0));
    assert_eq!(report.classification, Classification::Buy);
    assert_eq!(report.provenance.rate_source, DataSource::ManualOverride);
    assert_eq!(report.provenance.ratio_source, DataSource::ManualOverride);
}

#[tokio::test]
async fn test_overrides_never_replace_live_values() {
    let publisher = RecordingPublisher::default();
    let outcome = pipeline(Some(0.03), Some(15.0), &publisher)
        .with_overrides(OverrideConfig {
            rate: Some(0.01),
            ratio: Some(8.0),
        })
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.report.rate, Some(0.03));
    assert_eq!(outcome.report.ratio, Some(15.0));
}

#[tokio::test]
async fn test_out_of_bounds_ratio_override_rejected() {
    let publisher = RecordingPublisher::default();
    let outcome = pipeline(Some(0.02), None, &publisher)
        .with_overrides(OverrideConfig {
            rate: None,
            ratio: Some(1500.0),
        })
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.report.ratio, None);
    assert_eq!(outcome.report.provenance.ratio_source, DataSource::Unavailable);
    assert_eq!(
        outcome.report.classification,
        Classification::NeedsManualUpdate
    );
}

#[tokio::test]
async fn test_publish_failure_propagates() {
    let publisher = RecordingPublisher {
        fail: true,
        ..Default::default()
    };
    let err = pipeline(Some(0.03), Some(15.0), &publisher)
        .run()
        .await
        .unwrap_err();

    assert!(err.to_string().contains("create spreadsheet failed with status 500"));
    assert!(err.downcast_ref::<SheetsError>().is_some());
}

#[tokio::test]
async fn test_dry_run_skips_publisher() {
    let pipeline = Pipeline::new(
        Box::new(FixedRate(Some(0.02))),
        Box::new(FixedRatio(Some(14.0))),
        ValuationCalculator::new(),
        None,
    );
    let outcome = pipeline.run().await.unwrap();

    assert!(outcome.handle.is_none());
    assert_eq!(outcome.report.classification, Classification::Hold);
}
