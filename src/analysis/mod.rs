//! Product analyses over transaction history
//!
//! Each analyzer fetches one snapshot of a product's history from a
//! [`ProductStore`] and computes its report synchronously. Not-found and
//! processing failures are logged through the injected observer and returned
//! as [`AnalysisError`] values.

pub mod demand;
pub mod lifecycle;
pub mod seasonality;
pub mod window;

pub use demand::{aggregate_demand, get_product_demand, DemandAggregator, MonthBucket, MonthKey};
pub use lifecycle::LifecycleAnalyzer;
pub use seasonality::SeasonalityAnalyzer;
pub use window::DateWindow;

use tracing::Level;

use crate::db::ProductStore;
use crate::error::{AnalysisError, Result};
use crate::logging::{AnalysisObserver, LogContext};
use crate::models::product::Transaction;

pub(crate) fn validate_product_id(product_id: &str) -> Result<()> {
    if product_id.trim().is_empty() {
        return Err(AnalysisError::InvalidInput(
            "product id must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Fetch a product's history, mapping absence and store failures to errors
pub(crate) async fn fetch_history(
    store: &dyn ProductStore,
    observer: &dyn AnalysisObserver,
    product_id: &str,
    context: &LogContext,
) -> Result<Vec<Transaction>> {
    let product = match store.get(product_id).await {
        Ok(product) => product,
        Err(e) => {
            observer.log(
                Level::ERROR,
                "Error loading product data",
                &context.clone().with_detail(e.to_string()),
            );
            return Err(e.into());
        }
    };

    match product.and_then(|p| p.history) {
        Some(history) => Ok(history),
        None => {
            observer.log(Level::ERROR, "Product not found or missing history", context);
            Err(AnalysisError::not_found(product_id))
        }
    }
}

/// Log and pass through a processing failure
pub(crate) fn report_processing_error(
    observer: &dyn AnalysisObserver,
    message: &str,
    context: &LogContext,
    err: AnalysisError,
) -> AnalysisError {
    if let AnalysisError::Processing(detail) = &err {
        observer.log(Level::ERROR, message, &context.clone().with_detail(detail.clone()));
    }
    err
}
