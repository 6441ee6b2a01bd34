//! Unit tests for monthly demand aggregation

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use ecommerce_analytics::analysis::demand::{aggregate_demand, summarize, MonthBucket, MonthKey};
use ecommerce_analytics::analysis::{get_product_demand, DateWindow, DemandAggregator};
use ecommerce_analytics::error::AnalysisError;
use ecommerce_analytics::logging::RecordingObserver;
use ecommerce_analytics::models::{parse_timestamp, DemandResult, ProductRecord, Transaction};
use rust_decimal::Decimal;
use tracing::Level;

use crate::fixtures::{dec, product, sample_catalog, store_with, tx, FailingStore};

fn window(start: &str, end: &str) -> DateWindow {
    DateWindow::new(parse_timestamp(start).unwrap(), parse_timestamp(end).unwrap()).unwrap()
}

fn months(result: &DemandResult) -> Vec<&str> {
    result.time_series.iter().map(|m| m.month.as_str()).collect()
}

#[tokio::test]
async fn test_single_transaction_month() {
    let store = store_with(vec![product("p1", vec![tx("2024-03-15", 2, "10.00", 0)])]);
    let result = DemandAggregator::new(store)
        .compute("p1", "2024-03-01", "2024-03-31")
        .await
        .unwrap();

    assert_eq!(result.time_series.len(), 1);
    let march = &result.time_series[0];
    assert_eq!(march.month, "2024-03");
    assert_eq!(march.total_sales, 2);
    assert_eq!(march.total_revenue, dec("20.00"));
    assert_eq!(march.total_returns, 0);
    assert_eq!(march.average_price, dec("10.00"));
    assert_eq!(march.return_rate, Decimal::ZERO);
    assert_eq!(result.summary.total_months, 1);
    assert_eq!(result.summary.total_sales, 2);
    assert_eq!(result.summary.total_revenue, dec("20.00"));
    assert_eq!(result.summary.average_monthly_sales, dec("2.00"));
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let observer = Arc::new(RecordingObserver::new());
    let aggregator = DemandAggregator::new(store_with(sample_catalog())).with_observer(observer.clone());

    let err = aggregator
        .compute("does-not-exist", "2024-01-01", "2024-12-31")
        .await
        .unwrap_err();
    assert_eq!(err, AnalysisError::not_found("does-not-exist"));

    let errors = observer.entries_at(Level::ERROR);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].context.product_id.as_deref(), Some("does-not-exist"));
    assert_eq!(errors[0].context.start_date.as_deref(), Some("2024-01-01"));
    assert_eq!(errors[0].context.end_date.as_deref(), Some("2024-12-31"));
}

#[tokio::test]
async fn test_product_without_history_is_not_found() {
    let aggregator = DemandAggregator::new(store_with(sample_catalog()));
    let err = aggregator
        .compute("legacy-002", "2024-01-01", "2024-12-31")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::NotFound { .. }));
}

#[tokio::test]
async fn test_get_product_demand_returns_none_when_missing() {
    let missing = get_product_demand(store_with(sample_catalog()), "nope", "2024-01-01", "2024-02-01")
        .await
        .unwrap();
    assert!(missing.is_none());

    let found = get_product_demand(store_with(sample_catalog()), "earbuds-001", "2024-01-01", "2024-02-01")
        .await
        .unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn test_window_excluding_everything() {
    let result = DemandAggregator::new(store_with(sample_catalog()))
        .compute("earbuds-001", "2023-01-01", "2023-12-31")
        .await
        .unwrap();

    assert!(result.time_series.is_empty());
    assert_eq!(result.summary.total_months, 0);
    assert_eq!(result.summary.total_sales, 0);
    assert_eq!(result.summary.total_revenue, Decimal::ZERO);
    assert_eq!(result.summary.average_monthly_sales, Decimal::ZERO);
}

#[tokio::test]
async fn test_inverted_window_is_invalid_input() {
    let observer = Arc::new(RecordingObserver::new());
    let err = DemandAggregator::new(store_with(sample_catalog()))
        .with_observer(observer.clone())
        .compute("earbuds-001", "2024-03-31", "2024-03-01")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput(_)));
    assert!(observer.entries_at(Level::ERROR).is_empty());
}

#[tokio::test]
async fn test_unparseable_dates_are_invalid_input() {
    let aggregator = DemandAggregator::new(store_with(sample_catalog()));

    let err = aggregator
        .compute("earbuds-001", "March 1st", "2024-03-31")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput(ref msg) if msg.contains("start date")));

    let err = aggregator
        .compute("earbuds-001", "2024-03-01", "2024-02-30")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput(ref msg) if msg.contains("end date")));
}

#[tokio::test]
async fn test_invalid_input_is_reported_before_lookup() {
    // unknown product and bad dates: the date problem wins
    let err = DemandAggregator::new(store_with(Vec::new()))
        .compute("missing", "2024-05-01", "2024-01-01")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput(_)));
}

#[tokio::test]
async fn test_blank_product_id_is_invalid_input() {
    let err = DemandAggregator::new(store_with(sample_catalog()))
        .compute("   ", "2024-01-01", "2024-01-31")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput(_)));
}

#[tokio::test]
async fn test_store_failure_is_processing_error() {
    let observer = Arc::new(RecordingObserver::new());
    let err = DemandAggregator::new(Arc::new(FailingStore))
        .with_observer(observer.clone())
        .compute("p1", "2024-01-01", "2024-01-31")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Processing(_)));

    let errors = observer.entries_at(Level::ERROR);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].context.product_id.as_deref(), Some("p1"));
    assert!(errors[0].context.detail.as_deref().unwrap_or("").contains("not an array"));
}

#[tokio::test]
async fn test_revenue_overflow_is_processing_error() {
    let huge = Transaction::new(parse_timestamp("2024-01-10").unwrap(), 2, Decimal::MAX);
    let observer = Arc::new(RecordingObserver::new());
    let err = DemandAggregator::new(store_with(vec![product("p1", vec![huge])]))
        .with_observer(observer.clone())
        .compute("p1", "2024-01-01", "2024-01-31")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Processing(_)));
    assert_eq!(observer.entries_at(Level::ERROR).len(), 1);
}

#[tokio::test]
async fn test_multi_month_series_and_summary() {
    let result = DemandAggregator::new(store_with(sample_catalog()))
        .compute("earbuds-001", "2024-01-01", "2024-03-31")
        .await
        .unwrap();

    assert_eq!(months(&result), vec!["2024-01", "2024-02", "2024-03"]);

    let jan = &result.time_series[0];
    assert_eq!(jan.total_sales, 6);
    assert_eq!(jan.total_revenue, dec("149.00"));
    assert_eq!(jan.total_returns, 1);
    assert_eq!(jan.average_price, dec("24.83"));
    assert_eq!(jan.return_rate, dec("0.1667"));

    let feb = &result.time_series[1];
    assert_eq!(feb.average_price, dec("23.00"));
    assert_eq!(feb.return_rate, dec("0.3333"));

    assert_eq!(result.summary.total_months, 3);
    assert_eq!(result.summary.total_sales, 14);
    assert_eq!(result.summary.total_revenue, dec("307.00"));
    assert_eq!(result.summary.average_monthly_sales, dec("4.67"));

    let summed: u64 = result.time_series.iter().map(|m| m.total_sales).sum();
    assert_eq!(summed, result.summary.total_sales);
}

#[tokio::test]
async fn test_window_bounds_are_inclusive() {
    let history = vec![
        tx("2024-02-29T23:59:59", 1, "1.00", 0),
        tx("2024-03-01", 2, "1.00", 0),
        tx("2024-03-31", 3, "1.00", 0),
        tx("2024-03-31T00:00:01", 100, "1.00", 0),
    ];
    let result = DemandAggregator::new(store_with(vec![product("p1", history)]))
        .compute("p1", "2024-03-01", "2024-03-31")
        .await
        .unwrap();

    assert_eq!(months(&result), vec!["2024-03"]);
    assert_eq!(result.summary.total_sales, 5);
}

#[tokio::test]
async fn test_offset_dates_are_bucketed_by_utc_month() {
    // 01:00 on April 1st at +02:00 is still March in UTC
    let history = vec![tx("2024-04-01T01:00:00+02:00", 3, "5.00", 0)];
    let result = DemandAggregator::new(store_with(vec![product("p1", history)]))
        .compute("p1", "2024-03-01T00:00:00Z", "2024-04-30T23:59:59Z")
        .await
        .unwrap();

    assert_eq!(months(&result), vec!["2024-03"]);
}

#[tokio::test]
async fn test_offset_bounds_are_converted_to_utc() {
    let history = vec![tx("2024-03-01T22:30:00Z", 1, "5.00", 0)];
    let store = store_with(vec![product("p1", history)]);

    // 2024-03-02T00:00+02:00 is 22:00 UTC on the 1st: the sale falls after it
    let result = DemandAggregator::new(store.clone())
        .compute("p1", "2024-03-02T00:00:00+02:00", "2024-03-05T00:00:00Z")
        .await
        .unwrap();
    assert_eq!(result.summary.total_sales, 1);

    let result = DemandAggregator::new(store)
        .compute("p1", "2024-03-02T00:00:00-02:00", "2024-03-05T00:00:00Z")
        .await
        .unwrap();
    assert_eq!(result.summary.total_sales, 0);
}

#[tokio::test]
async fn test_mixed_zone_inputs_are_flagged() {
    let observer = Arc::new(RecordingObserver::new());
    let history = vec![tx("2024-03-10T12:00:00Z", 1, "5.00", 0)];
    DemandAggregator::new(store_with(vec![product("p1", history)]))
        .with_observer(observer.clone())
        .compute("p1", "2024-03-01", "2024-03-31")
        .await
        .unwrap();

    let warnings = observer.entries_at(Level::WARN);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("Mixed"));
}

#[tokio::test]
async fn test_uniform_zone_inputs_are_not_flagged() {
    let observer = Arc::new(RecordingObserver::new());
    DemandAggregator::new(store_with(sample_catalog()))
        .with_observer(observer.clone())
        .compute("earbuds-001", "2024-01-01", "2024-12-31")
        .await
        .unwrap();
    assert!(observer.entries_at(Level::WARN).is_empty());
}

#[tokio::test]
async fn test_typed_date_arguments() {
    let start = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 7, 31, 23, 59, 59).unwrap();
    let result = DemandAggregator::new(store_with(sample_catalog()))
        .compute("earbuds-001", start, end)
        .await
        .unwrap();
    assert_eq!(months(&result), vec!["2024-07"]);
    assert_eq!(result.time_series[0].total_revenue, dec("200.00"));
}

#[tokio::test]
async fn test_lookup_by_name_fragment() {
    let result = DemandAggregator::new(store_with(sample_catalog()))
        .compute("wireless earbuds", "2024-07-01", "2024-07-31")
        .await
        .unwrap();
    assert_eq!(result.summary.total_sales, 10);
}

#[test]
fn test_compute_is_idempotent() {
    let aggregator = DemandAggregator::new(store_with(sample_catalog()));
    let first = tokio_test::block_on(aggregator.compute("earbuds-001", "2024-01-01", "2024-12-31")).unwrap();
    let second = tokio_test::block_on(aggregator.compute("earbuds-001", "2024-01-01", "2024-12-31")).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_zero_sales_month_has_zero_ratios() {
    let history = vec![tx("2024-05-02", 0, "12.00", 0), tx("2024-05-09", 0, "11.00", 0)];
    let result = aggregate_demand(&history, &window("2024-05-01", "2024-05-31")).unwrap();

    let may = &result.time_series[0];
    assert_eq!(may.total_sales, 0);
    assert_eq!(may.average_price, Decimal::ZERO);
    assert_eq!(may.return_rate, Decimal::ZERO);
    assert_eq!(result.summary.average_monthly_sales, Decimal::ZERO);
}

#[test]
fn test_month_keys_strictly_ascending_across_years() {
    let history = vec![
        tx("2025-01-03", 1, "1.00", 0),
        tx("2023-12-30", 1, "1.00", 0),
        tx("2024-10-01", 1, "1.00", 0),
        tx("2024-02-01", 1, "1.00", 0),
        tx("2024-10-15", 1, "1.00", 0),
    ];
    let result = aggregate_demand(&history, &window("2020-01-01", "2030-01-01")).unwrap();
    assert_eq!(months(&result), vec!["2023-12", "2024-02", "2024-10", "2025-01"]);

    let keys = months(&result);
    assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_rounding_happens_only_on_output() {
    // three sales at 3.333: revenue 9.999 is kept at full precision until output
    let history = vec![
        tx("2024-06-01", 1, "3.333", 1),
        tx("2024-06-02", 1, "3.333", 0),
        tx("2024-06-03", 1, "3.333", 0),
    ];
    let result = aggregate_demand(&history, &window("2024-06-01", "2024-06-30")).unwrap();
    let june = &result.time_series[0];
    assert_eq!(june.total_revenue, dec("10.00"));
    assert_eq!(june.average_price, dec("3.33"));
    assert_eq!(june.return_rate, dec("0.3333"));
}

#[test]
fn test_half_values_round_to_even() {
    let history = vec![tx("2024-06-01", 1, "0.125", 0)];
    let result = aggregate_demand(&history, &window("2024-06-01", "2024-06-30")).unwrap();
    assert_eq!(result.time_series[0].total_revenue, dec("0.12"));
}

#[test]
fn test_bucket_counts_transactions() {
    let mut bucket = MonthBucket::default();
    bucket.add(&tx("2024-01-01", 2, "1.50", 1)).unwrap();
    bucket.add(&tx("2024-01-02", 0, "9.99", 0)).unwrap();
    assert_eq!(bucket.transaction_count, 2);
    assert_eq!(bucket.total_units, 2);
    assert_eq!(bucket.total_revenue, dec("3.00"));
    assert_eq!(bucket.average_price().unwrap(), dec("1.5"));
}

#[test]
fn test_month_key_format() {
    let key = MonthKey::of(&Utc.with_ymd_and_hms(987, 4, 9, 0, 0, 0).unwrap());
    assert_eq!(key.to_string(), "0987-04");
}

#[test]
fn test_summarize_empty_series() {
    let result = summarize(Vec::new()).unwrap();
    assert_eq!(result.summary.total_months, 0);
    assert_eq!(result.summary.average_monthly_sales, Decimal::ZERO);
}

#[test]
fn test_result_serializes_with_numeric_money() {
    let history = vec![tx("2024-03-15", 2, "10.00", 0)];
    let result = aggregate_demand(&history, &window("2024-03-01", "2024-03-31")).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["time_series"][0]["month"], "2024-03");
    assert_eq!(json["time_series"][0]["total_revenue"].as_f64(), Some(20.0));
    assert_eq!(json["time_series"][0]["return_rate"].as_f64(), Some(0.0));
    assert_eq!(json["summary"]["total_months"], 1);
}

#[test]
fn test_record_without_history_field_deserializes_to_none() {
    let record: ProductRecord = serde_json::from_str(r#"{"id": "p1", "name": "Thing"}"#).unwrap();
    assert!(record.history.is_none());
}
