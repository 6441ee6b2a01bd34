//! Monthly demand aggregation
//!
//! Filters a product's history into an inclusive UTC window, buckets the
//! surviving transactions by calendar month and derives per-month and
//! window-level statistics. Sums are kept at full precision; rounding
//! (banker's, 2 places for money, 4 for return rates) happens only when
//! output records are built.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use tracing::Level;

use crate::analysis::window::DateWindow;
use crate::analysis::{fetch_history, report_processing_error, validate_product_id};
use crate::db::ProductStore;
use crate::error::{AnalysisError, Result};
use crate::logging::{AnalysisObserver, LogContext, TracingObserver};
use crate::models::demand::{DemandResult, DemandSummary, MonthSummaryRecord};
use crate::models::product::Transaction;
use crate::models::timestamp::DateInput;

const MONEY_DP: u32 = 2;
const RATE_DP: u32 = 4;

/// Calendar month grouping key; orders year-major
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(ts: &DateTime<Utc>) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Running totals for one month
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthBucket {
    pub total_units: u64,
    pub total_revenue: Decimal,
    pub total_returns: u64,
    pub transaction_count: u64,
}

impl MonthBucket {
    pub fn add(&mut self, tx: &Transaction) -> Result<()> {
        let revenue = tx
            .price
            .checked_mul(Decimal::from(tx.units))
            .ok_or_else(|| overflow("transaction revenue"))?;

        self.total_units = self
            .total_units
            .checked_add(tx.units)
            .ok_or_else(|| overflow("monthly sales"))?;
        self.total_revenue = self
            .total_revenue
            .checked_add(revenue)
            .ok_or_else(|| overflow("monthly revenue"))?;
        self.total_returns = self
            .total_returns
            .checked_add(tx.returned_units)
            .ok_or_else(|| overflow("monthly returns"))?;
        self.transaction_count += 1;
        Ok(())
    }

    /// Revenue per unit sold, 0 for a month without sales
    pub fn average_price(&self) -> Result<Decimal> {
        ratio(self.total_revenue, self.total_units, "average price")
    }

    /// Returned units per unit sold, 0 for a month without sales
    pub fn return_rate(&self) -> Result<Decimal> {
        ratio(Decimal::from(self.total_returns), self.total_units, "return rate")
    }

    pub fn to_record(&self, key: MonthKey) -> Result<MonthSummaryRecord> {
        Ok(MonthSummaryRecord {
            month: key.to_string(),
            total_sales: self.total_units,
            total_revenue: self.total_revenue.round_dp(MONEY_DP),
            total_returns: self.total_returns,
            average_price: self.average_price()?.round_dp(MONEY_DP),
            return_rate: self.return_rate()?.round_dp(RATE_DP),
        })
    }
}

fn ratio(numerator: Decimal, units: u64, what: &str) -> Result<Decimal> {
    if units == 0 {
        return Ok(Decimal::ZERO);
    }
    numerator
        .checked_div(Decimal::from(units))
        .ok_or_else(|| overflow(what))
}

fn overflow(what: &str) -> AnalysisError {
    AnalysisError::Processing(format!("arithmetic overflow computing {}", what))
}

/// Group in-window transactions by calendar month of their UTC date
pub fn bucket_by_month<'a, I>(history: I, window: &DateWindow) -> Result<BTreeMap<MonthKey, MonthBucket>>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut buckets: BTreeMap<MonthKey, MonthBucket> = BTreeMap::new();
    for tx in history.into_iter().filter(|tx| window.contains(&tx.date)) {
        buckets.entry(MonthKey::of(&tx.date.utc)).or_default().add(tx)?;
    }
    Ok(buckets)
}

/// Build the window-level summary from finished month records
pub fn summarize(time_series: Vec<MonthSummaryRecord>) -> Result<DemandResult> {
    let mut total_sales: u64 = 0;
    let mut total_revenue = Decimal::ZERO;
    for record in &time_series {
        total_sales = total_sales
            .checked_add(record.total_sales)
            .ok_or_else(|| overflow("total sales"))?;
        total_revenue = total_revenue
            .checked_add(record.total_revenue)
            .ok_or_else(|| overflow("total revenue"))?;
    }

    let total_months = time_series.len();
    let average_monthly_sales = if total_months > 0 {
        Decimal::from(total_sales)
            .checked_div(Decimal::from(total_months as u64))
            .ok_or_else(|| overflow("average monthly sales"))?
    } else {
        Decimal::ZERO
    };

    Ok(DemandResult {
        time_series,
        summary: DemandSummary {
            total_months,
            total_sales,
            total_revenue: total_revenue.round_dp(MONEY_DP),
            average_monthly_sales: average_monthly_sales.round_dp(MONEY_DP),
        },
    })
}

/// Pure aggregation of a history snapshot over a window
pub fn aggregate_demand(history: &[Transaction], window: &DateWindow) -> Result<DemandResult> {
    let buckets = bucket_by_month(history, window)?;
    let time_series = buckets
        .iter()
        .map(|(key, bucket)| bucket.to_record(*key))
        .collect::<Result<Vec<_>>>()?;
    summarize(time_series)
}

/// Count (naive, offset-carrying) timestamps among the bounds and history
fn zone_mix(window: &DateWindow, history: &[Transaction]) -> (usize, usize) {
    let stamps = [window.start, window.end]
        .into_iter()
        .chain(history.iter().map(|tx| tx.date));
    stamps.fold((0, 0), |(naive, offset), ts| {
        if ts.is_naive() {
            (naive + 1, offset)
        } else {
            (naive, offset + 1)
        }
    })
}

/// Computes monthly demand series for products held in a [`ProductStore`]
pub struct DemandAggregator {
    store: Arc<dyn ProductStore>,
    observer: Arc<dyn AnalysisObserver>,
}

impl DemandAggregator {
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

    /// Monthly demand for `product_id` between `start_date` and `end_date`, both inclusive.
    pub async fn compute(
        &self,
        product_id: &str,
        start_date: impl Into<DateInput>,
        end_date: impl Into<DateInput>,
    ) -> Result<DemandResult> {
        let start_date = start_date.into();
        let end_date = end_date.into();
        let context = LogContext::for_product(product_id)
            .with_window(start_date.to_string(), end_date.to_string());

        self.observer
            .log(Level::INFO, "Getting demand data for product", &context);

        let window = match validate_product_id(product_id)
            .and_then(|_| DateWindow::parse(&start_date, &end_date))
        {
            Ok(window) => window,
            Err(e) => {
                self.observer.log(
                    Level::WARN,
                    "Rejected demand request",
                    &context.clone().with_detail(e.to_string()),
                );
                return Err(e);
            }
        };

        let history =
            fetch_history(self.store.as_ref(), self.observer.as_ref(), product_id, &context).await?;

        let (naive, offset) = zone_mix(&window, &history);
        if naive > 0 && offset > 0 {
            self.observer.log(
                Level::WARN,
                "Mixed naive and offset timestamps; naive values read as UTC",
                &context
                    .clone()
                    .with_detail(format!("naive={} offset={}", naive, offset)),
            );
        }

        self.observer.log(
            Level::DEBUG,
            "Filtering demand history",
            &context
                .clone()
                .with_detail(format!("window={}..={} entries={}", window.start, window.end, history.len())),
        );

        aggregate_demand(&history, &window).map_err(|e| {
            report_processing_error(self.observer.as_ref(), "Error processing demand data", &context, e)
        })
    }

    /// Like [`compute`](Self::compute), but a missing product yields `Ok(None)`
    pub async fn get_product_demand(
        &self,
        product_id: &str,
        start_date: impl Into<DateInput>,
        end_date: impl Into<DateInput>,
    ) -> Result<Option<DemandResult>> {
        match self.compute(product_id, start_date, end_date).await {
            Ok(result) => Ok(Some(result)),
            Err(AnalysisError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Demand lookup against `store` with logging through `tracing`
pub async fn get_product_demand(
    store: Arc<dyn ProductStore>,
    product_id: &str,
    start_date: impl Into<DateInput>,
    end_date: impl Into<DateInput>,
) -> Result<Option<DemandResult>> {
    DemandAggregator::new(store)
        .get_product_demand(product_id, start_date, end_date)
        .await
}
