//! Product sales analytics.
//!
//! Turns a catalog product's transaction history into monthly demand series,
//! month-of-year seasonality and lifecycle estimates. Product records come
//! from a [`db::ProductStore`] (PostgreSQL, a JSON dump, or memory).
//!
//! ```no_run
//! use std::sync::Arc;
//! use ecommerce_analytics::analysis::DemandAggregator;
//! use ecommerce_analytics::db::JsonFileProductStore;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(JsonFileProductStore::load("generated_products.json")?);
//! let demand = DemandAggregator::new(store)
//!     .compute("wireless earbuds", "2024-01-01", "2024-06-30")
//!     .await?;
//! println!("{} months", demand.summary.total_months);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;

pub use analysis::{get_product_demand, DemandAggregator, LifecycleAnalyzer, SeasonalityAnalyzer};
pub use db::ProductStore;
pub use error::{AnalysisError, DemandError, Result, StoreError};
