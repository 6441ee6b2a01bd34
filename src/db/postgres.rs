//! PostgreSQL product store (`products` table with JSONB history)

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use tokio_postgres::{Client, GenericClient, NoTls, Row};

use crate::db::ProductStore;
use crate::error::StoreError;
use crate::models::product::{ProductRecord, Transaction};

const SELECT_PRODUCT: &str = "SELECT product_id::text, name, category, price, attributes, history
     FROM products
     WHERE product_id::text = $1
        OR name ILIKE $2 ESCAPE '\\'
     ORDER BY (product_id::text = $1) DESC
     LIMIT 1";

pub struct PostgresProductStore {
    client: Client,
}

impl PostgresProductStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let (client, connection) = tokio_postgres::connect(database_url, NoTls).await?;

        // Spawn connection task
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "PostgreSQL connection error");
            }
        });

        Ok(Self { client })
    }

    /// Replace the whole `products` table with `products` in one transaction.
    ///
    /// Ids are checked before anything is dropped. Any failing row rolls the
    /// batch back, leaving the previous table in place.
    pub async fn replace_all(&mut self, products: &[ProductRecord]) -> Result<usize, StoreError> {
        check_product_ids(products)?;

        let transaction = self.client.transaction().await?;
        transaction.batch_execute(SCHEMA).await?;
        for product in products {
            insert_product(&transaction, product).await?;
        }
        transaction.commit().await?;

        tracing::info!(products = products.len(), "Replaced products table");
        Ok(products.len())
    }
}

const SCHEMA: &str = "DROP TABLE IF EXISTS products;
     CREATE TABLE products (
        product_id UUID PRIMARY KEY,
        name VARCHAR(255),
        category VARCHAR(100),
        price DECIMAL(10,2),
        attributes JSONB,
        history JSONB
     );";

async fn insert_product<C: GenericClient>(client: &C, product: &ProductRecord) -> Result<(), StoreError> {
    let history = match &product.history {
        Some(history) => Some(serde_json::to_value(history)?),
        None => None,
    };

    client
        .execute(
            "INSERT INTO products (product_id, name, category, price, attributes, history)
             VALUES ($1::text::uuid, $2, $3, $4, $5, $6)",
            &[
                &product.id,
                &product.name,
                &product.category,
                &product.price,
                &product.attributes,
                &history,
            ],
        )
        .await?;
    Ok(())
}

/// Reject a batch containing any id PostgreSQL would not accept as a UUID
pub fn check_product_ids(products: &[ProductRecord]) -> Result<(), StoreError> {
    match products.iter().find(|product| !is_uuid(&product.id)) {
        Some(product) => Err(StoreError::MalformedRecord {
            product_id: product.id.clone(),
            reason: "product id is not a UUID".to_string(),
        }),
        None => Ok(()),
    }
}

/// Hyphenated `8-4-4-4-12` or bare 32-digit hex, optionally in braces
fn is_uuid(id: &str) -> bool {
    let id = id
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(id);
    let hex_digits = id.chars().filter(|c| c.is_ascii_hexdigit()).count();
    match id.len() {
        32 => hex_digits == 32,
        36 => {
            hex_digits == 32
                && id
                    .char_indices()
                    .all(|(i, c)| matches!(i, 8 | 13 | 18 | 23) == (c == '-'))
        }
        _ => false,
    }
}

/// `ILIKE` substring pattern matching `needle` literally
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn row_to_product(row: &Row) -> Result<ProductRecord, StoreError> {
    let id: String = row.try_get(0)?;
    let name: Option<String> = row.try_get(1)?;
    let category: Option<String> = row.try_get(2)?;
    let price: Option<Decimal> = row.try_get(3)?;
    let attributes: Option<Value> = row.try_get(4)?;
    let history: Option<Value> = row.try_get(5)?;

    let history = match history {
        Some(Value::Null) | None => None,
        Some(value) => Some(
            serde_json::from_value::<Vec<Transaction>>(value).map_err(|e| {
                StoreError::MalformedRecord {
                    product_id: id.clone(),
                    reason: e.to_string(),
                }
            })?,
        ),
    };

    Ok(ProductRecord {
        id,
        name,
        category,
        price,
        attributes,
        history,
    })
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    async fn get(&self, product_id: &str) -> Result<Option<ProductRecord>, StoreError> {
        let name_pattern = like_pattern(product_id);
        let row = self
            .client
            .query_opt(SELECT_PRODUCT, &[&product_id, &name_pattern])
            .await?;

        match row {
            Some(row) => Ok(Some(row_to_product(&row)?)),
            None => {
                tracing::warn!(product_id = %product_id, "Product not found");
                Ok(None)
            }
        }
    }
}
