//! Product records and their transaction history

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::timestamp::{parse_timestamp, NormalizedTimestamp};

/// A single sales entry from a product's history.
///
/// Built from the persisted JSON form (`date`, `sales`, `price`, optional
/// `returns`); the date is normalized to UTC and a missing `returns` count
/// becomes 0 here, so analysis code never deals with raw fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTransaction", into = "RawTransaction")]
pub struct Transaction {
    pub date: NormalizedTimestamp,
    pub units: u64,
    pub price: Decimal,
    pub returned_units: u64,
}

impl Transaction {
    pub fn new(date: NormalizedTimestamp, units: u64, price: Decimal) -> Self {
        Self {
            date,
            units,
            price,
            returned_units: 0,
        }
    }

    pub fn with_returns(mut self, returned_units: u64) -> Self {
        self.returned_units = returned_units;
        self
    }
}

/// Persisted shape of a history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTransaction {
    date: String,
    sales: u64,
    price: Decimal,
    #[serde(default)]
    returns: u64,
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = String;

    fn try_from(raw: RawTransaction) -> Result<Self, Self::Error> {
        let date = parse_timestamp(&raw.date).map_err(|e| e.to_string())?;
        if raw.price.is_sign_negative() && !raw.price.is_zero() {
            return Err(format!("negative price {} on {}", raw.price, raw.date));
        }
        Ok(Self {
            date,
            units: raw.sales,
            price: raw.price,
            returned_units: raw.returns,
        })
    }
}

impl From<Transaction> for RawTransaction {
    fn from(tx: Transaction) -> Self {
        Self {
            date: tx.date.to_iso_string(),
            sales: tx.units,
            price: tx.price,
            returns: tx.returned_units,
        }
    }
}

/// Catalog product as returned by a [`ProductStore`](crate::db::ProductStore)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(alias = "product_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
    /// `None` when the record has no usable history field
    #[serde(default)]
    pub history: Option<Vec<Transaction>>,
}

impl ProductRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            category: None,
            price: None,
            attributes: None,
            history: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_history(mut self, history: Vec<Transaction>) -> Self {
        self.history = Some(history);
        self
    }
}
