//! Month-of-year seasonality over a product's full history

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Datelike;
use tracing::Level;

use crate::analysis::{fetch_history, validate_product_id};
use crate::db::ProductStore;
use crate::error::Result;
use crate::logging::{AnalysisObserver, LogContext, TracingObserver};
use crate::models::analysis::{
    SeasonalityInterpretation, SeasonalityMetrics, SeasonalityPatterns, SeasonalityReport,
    SeasonalityType,
};
use crate::models::product::Transaction;

/// Index above which a month counts as peak season
pub const PEAK_THRESHOLD: f64 = 1.1;
/// Index below which a month counts as low season
pub const LOW_THRESHOLD: f64 = 0.9;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_NAMES.get(idx as usize))
        .copied()
        .unwrap_or("Unknown")
}

/// Mean squared deviation of the indices from 1.0, doubled and capped at 1
pub fn seasonality_strength(indices: &BTreeMap<u32, f64>) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    let variance: f64 =
        indices.values().map(|index| (index - 1.0).powi(2)).sum::<f64>() / indices.len() as f64;
    (variance * 2.0).min(1.0)
}

pub fn calculate_seasonality(history: &[Transaction]) -> (SeasonalityPatterns, SeasonalityMetrics) {
    let mut by_month: BTreeMap<u32, (u64, usize)> = BTreeMap::new();
    let mut total_sales: u64 = 0;
    for tx in history {
        let entry = by_month.entry(tx.date.utc.month()).or_insert((0, 0));
        entry.0 = entry.0.saturating_add(tx.units);
        entry.1 += 1;
        total_sales = total_sales.saturating_add(tx.units);
    }

    let monthly_averages: BTreeMap<u32, f64> = by_month
        .iter()
        .map(|(&month, &(sales, count))| (month, sales as f64 / count as f64))
        .collect();

    let overall_average = if history.is_empty() {
        0.0
    } else {
        total_sales as f64 / history.len() as f64
    };

    let monthly_indices: BTreeMap<u32, f64> = monthly_averages
        .iter()
        .map(|(&month, &avg)| {
            let index = if overall_average > 0.0 { avg / overall_average } else { 0.0 };
            (month, index)
        })
        .collect();

    let peak_months = monthly_indices
        .iter()
        .filter(|(_, index)| **index > PEAK_THRESHOLD)
        .map(|(&month, _)| month)
        .collect();
    let low_months = monthly_indices
        .iter()
        .filter(|(_, index)| **index < LOW_THRESHOLD)
        .map(|(&month, _)| month)
        .collect();
    let strength = seasonality_strength(&monthly_indices);

    (
        SeasonalityPatterns {
            monthly_indices,
            peak_months,
            low_months,
            seasonality_strength: strength,
        },
        SeasonalityMetrics {
            overall_average_sales: overall_average,
            monthly_averages,
        },
    )
}

pub fn interpret(patterns: &SeasonalityPatterns) -> SeasonalityInterpretation {
    let strength = patterns.seasonality_strength;
    let seasonality_type = if strength > 0.5 {
        SeasonalityType::Strong
    } else if strength > 0.2 {
        SeasonalityType::Moderate
    } else {
        SeasonalityType::Weak
    };

    SeasonalityInterpretation {
        seasonality_type,
        peak_seasons: patterns.peak_months.iter().map(|&m| month_name(m).to_string()).collect(),
        low_seasons: patterns.low_months.iter().map(|&m| month_name(m).to_string()).collect(),
        confidence_score: (strength * 1.5).min(1.0),
    }
}

pub fn analyze_history(history: &[Transaction]) -> SeasonalityReport {
    let (patterns, metrics) = calculate_seasonality(history);
    let interpretation = interpret(&patterns);
    SeasonalityReport {
        seasonality_patterns: patterns,
        metrics,
        interpretation,
    }
}

pub struct SeasonalityAnalyzer {
    store: Arc<dyn ProductStore>,
    observer: Arc<dyn AnalysisObserver>,
}

impl SeasonalityAnalyzer {
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

    pub async fn analyze(&self, product_id: &str) -> Result<SeasonalityReport> {
        let context = LogContext::for_product(product_id);
        self.observer
            .log(Level::INFO, "Getting seasonality data for product", &context);
        validate_product_id(product_id)?;

        let history =
            fetch_history(self.store.as_ref(), self.observer.as_ref(), product_id, &context).await?;
        Ok(analyze_history(&history))
    }
}
