//! Product lifecycle stage estimation from sales history

use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use tracing::Level;

use crate::analysis::{fetch_history, validate_product_id};
use crate::db::ProductStore;
use crate::error::{AnalysisError, Result};
use crate::logging::{AnalysisObserver, LogContext, TracingObserver};
use crate::models::analysis::{LifecycleAssessment, LifecycleMetrics, LifecycleReport, LifecycleStage};
use crate::models::product::Transaction;
use crate::models::timestamp::{DateInput, NormalizedTimestamp};

/// History entries per "quarter" bucket
pub const QUARTER_LEN: usize = 90;

/// Total sales per consecutive block of [`QUARTER_LEN`] entries
pub fn quarterly_sales(history: &[Transaction]) -> Vec<u64> {
    history
        .chunks(QUARTER_LEN)
        .map(|chunk| chunk.iter().fold(0u64, |acc, tx| acc.saturating_add(tx.units)))
        .collect()
}

/// Growth between consecutive quarters; quarters following an empty one are skipped
pub fn growth_rates(quarters: &[u64]) -> Vec<f64> {
    quarters
        .windows(2)
        .filter(|pair| pair[0] > 0)
        .map(|pair| (pair[1] as f64 - pair[0] as f64) / pair[0] as f64)
        .collect()
}

/// Population standard deviation, capped at 1
pub fn volatility(rates: &[f64]) -> f64 {
    if rates.is_empty() {
        return 0.0;
    }
    let mean = rates.iter().sum::<f64>() / rates.len() as f64;
    let variance = rates.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / rates.len() as f64;
    variance.sqrt().min(1.0)
}

/// Blend of relative price movement (70%) and return rate (30%), capped at 1
pub fn competitive_pressure(history: &[Transaction]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }

    let prices: Vec<f64> = history
        .iter()
        .map(|tx| tx.price.to_f64().unwrap_or(0.0))
        .collect();
    let changes: Vec<f64> = prices
        .windows(2)
        .filter(|pair| pair[0] != 0.0)
        .map(|pair| (pair[1] - pair[0]).abs() / pair[0])
        .collect();
    let price_volatility = if changes.is_empty() {
        0.0
    } else {
        changes.iter().sum::<f64>() / changes.len() as f64
    };

    let total_sales: u64 = history.iter().fold(0, |acc, tx| acc.saturating_add(tx.units));
    let total_returns: u64 = history
        .iter()
        .fold(0, |acc, tx| acc.saturating_add(tx.returned_units));
    let return_rate = if total_sales > 0 {
        total_returns as f64 / total_sales as f64
    } else {
        0.0
    };

    (0.7 * price_volatility + 0.3 * return_rate).min(1.0)
}

pub fn calculate_metrics(history: &[Transaction]) -> LifecycleMetrics {
    let quarters = quarterly_sales(history);
    let rates = growth_rates(&quarters);

    let growth_rate = if rates.is_empty() {
        0.0
    } else {
        rates.iter().sum::<f64>() / rates.len() as f64
    };

    let recent = quarters.last().copied().unwrap_or(0);
    let peak = quarters.iter().copied().max().unwrap_or(0);
    let market_saturation = if peak > 0 {
        recent as f64 / peak as f64
    } else {
        0.0
    };

    LifecycleMetrics {
        growth_rate,
        growth_volatility: volatility(&rates),
        market_saturation,
        competitive_pressure: competitive_pressure(history),
        market_share: 0.0,
    }
}

pub fn classify_stage(metrics: &LifecycleMetrics) -> LifecycleStage {
    let growth = metrics.growth_rate;
    let share = metrics.market_share;

    if growth < 0.0 && share < 0.1 {
        LifecycleStage::Decline
    } else if growth < 0.05 && share >= 0.1 {
        LifecycleStage::Maturity
    } else if growth >= 0.05 && share >= 0.05 {
        LifecycleStage::Growth
    } else {
        LifecycleStage::Introduction
    }
}

pub fn transition_risk(metrics: &LifecycleMetrics) -> f64 {
    let risk = 0.4 * metrics.growth_volatility
        + 0.3 * metrics.market_saturation
        + 0.3 * metrics.competitive_pressure;
    risk.clamp(0.0, 1.0)
}

/// Lifecycle report for a history snapshot as seen on `as_of`
pub fn analyze_history(history: &[Transaction], as_of: &NormalizedTimestamp) -> LifecycleReport {
    let mut sorted = history.to_vec();
    sorted.sort_by_key(|tx| tx.date.utc);

    let metrics = calculate_metrics(&sorted);
    let stage_start_date = sorted.first().map(|tx| tx.date.utc);
    let days_in_stage = stage_start_date
        .map(|start| (as_of.utc - start).num_days().max(0))
        .unwrap_or(0);

    let computed = LifecycleAssessment {
        current_stage: classify_stage(&metrics),
        days_in_stage,
        stage_transition_risk: transition_risk(&metrics),
    };

    LifecycleReport {
        metrics,
        stage_start_date,
        computed,
    }
}

pub struct LifecycleAnalyzer {
    store: Arc<dyn ProductStore>,
    observer: Arc<dyn AnalysisObserver>,
}

impl LifecycleAnalyzer {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self {
            store,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn AnalysisObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub async fn analyze(&self, product_id: &str, as_of: impl Into<DateInput>) -> Result<LifecycleReport> {
        let as_of = as_of.into();
        let context = LogContext::for_product(product_id).with_detail(format!("as_of={}", as_of));
        self.observer
            .log(Level::INFO, "Getting lifecycle data for product", &context);

        validate_product_id(product_id)?;
        let as_of = as_of
            .normalize()
            .map_err(|e| AnalysisError::InvalidInput(format!("current date: {}", e)))?;

        let history =
            fetch_history(self.store.as_ref(), self.observer.as_ref(), product_id, &context).await?;
        Ok(analyze_history(&history, &as_of))
    }
}
