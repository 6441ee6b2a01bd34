//! Product store backed by a JSON dump (`generated_products.json` layout)

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::db::{InMemoryProductStore, ProductStore};
use crate::error::StoreError;
use crate::models::product::ProductRecord;

/// Loads every product from a JSON array file once and serves lookups from memory.
pub struct JsonFileProductStore {
    path: PathBuf,
    inner: InMemoryProductStore,
}

impl JsonFileProductStore {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let contents = fs::read_to_string(&path)?;
        let products = parse_products(&contents)?;

        tracing::info!(
            path = %path.display(),
            products = products.len(),
            "Loaded product catalog from file"
        );

        Ok(Self {
            path,
            inner: InMemoryProductStore::from_products(products),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn products(&self) -> impl Iterator<Item = &ProductRecord> {
        self.inner.products()
    }
}

/// Parse a JSON array of product records
pub fn parse_products(contents: &str) -> Result<Vec<ProductRecord>, StoreError> {
    Ok(serde_json::from_str(contents)?)
}

#[async_trait]
impl ProductStore for JsonFileProductStore {
    async fn get(&self, product_id: &str) -> Result<Option<ProductRecord>, StoreError> {
        self.inner.get(product_id).await
    }
}
