use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Demand statistics for one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSummaryRecord {
    /// `YYYY-MM`
    pub month: String,
    pub total_sales: u64,
    pub total_revenue: Decimal,
    pub total_returns: u64,
    pub average_price: Decimal,
    pub return_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandSummary {
    pub total_months: usize,
    pub total_sales: u64,
    pub total_revenue: Decimal,
    pub average_monthly_sales: Decimal,
}

/// Monthly demand series for a product over a date window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandResult {
    /// Ascending by month, one entry per month with in-window transactions
    pub time_series: Vec<MonthSummaryRecord>,
    pub summary: DemandSummary,
}
