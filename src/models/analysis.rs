//! Seasonality and lifecycle report models

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityPatterns {
    /// Calendar month (1-12) -> average sales relative to the overall average
    pub monthly_indices: BTreeMap<u32, f64>,
    pub peak_months: Vec<u32>,
    pub low_months: Vec<u32>,
    pub seasonality_strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityMetrics {
    pub overall_average_sales: f64,
    pub monthly_averages: BTreeMap<u32, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityType {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityInterpretation {
    pub seasonality_type: SeasonalityType,
    pub peak_seasons: Vec<String>,
    pub low_seasons: Vec<String>,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityReport {
    pub seasonality_patterns: SeasonalityPatterns,
    pub metrics: SeasonalityMetrics,
    pub interpretation: SeasonalityInterpretation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStage {
    Introduction,
    Growth,
    Maturity,
    Decline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleMetrics {
    pub growth_rate: f64,
    pub growth_volatility: f64,
    pub market_saturation: f64,
    pub competitive_pressure: f64,
    /// No data source feeds this yet; always 0
    pub market_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleAssessment {
    pub current_stage: LifecycleStage,
    pub days_in_stage: i64,
    pub stage_transition_risk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleReport {
    pub metrics: LifecycleMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_start_date: Option<DateTime<Utc>>,
    pub computed: LifecycleAssessment,
}
