//! Product lookup backends

pub mod json_file;
pub mod postgres;

pub use json_file::JsonFileProductStore;
pub use postgres::PostgresProductStore;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::product::ProductRecord;

/// Source of product records for the analyses.
///
/// Lookups match the product id exactly first, then fall back to a
/// case-insensitive substring match on the product name.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get(&self, product_id: &str) -> Result<Option<ProductRecord>, StoreError>;
}

/// Products held in memory, keyed by id
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductStore {
    products: BTreeMap<String, ProductRecord>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_products(products: impl IntoIterator<Item = ProductRecord>) -> Self {
        let mut store = Self::new();
        for product in products {
            store.insert(product);
        }
        store
    }

    /// Insert or replace a product; returns the previous record with that id
    pub fn insert(&mut self, product: ProductRecord) -> Option<ProductRecord> {
        self.products.insert(product.id.clone(), product)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn products(&self) -> impl Iterator<Item = &ProductRecord> {
        self.products.values()
    }

    pub fn lookup(&self, product_id: &str) -> Option<&ProductRecord> {
        if let Some(product) = self.products.get(product_id) {
            return Some(product);
        }

        let needle = product_id.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.products.values().find(|product| {
            product
                .name
                .as_deref()
                .map(|name| name.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn get(&self, product_id: &str) -> Result<Option<ProductRecord>, StoreError> {
        Ok(self.lookup(product_id).cloned())
    }
}
