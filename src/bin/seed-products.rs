//! Product table seeder
//!
//! Recreates the `products` table and fills it from a JSON dump. The whole
//! load is one transaction: any bad row leaves the previous table untouched.
//! Usage: `seed-products [path]` (defaults to `PRODUCTS_FILE`, then
//! `./generated_products.json`).

use dotenvy::dotenv;
use ecommerce_analytics::config::Config;
use ecommerce_analytics::db::json_file::parse_products;
use ecommerce_analytics::db::postgres::check_product_ids;
use ecommerce_analytics::db::PostgresProductStore;
use ecommerce_analytics::logging;
use std::env;
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging();

    let config = Config::from_env();
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .or(config.products_file.clone())
        .unwrap_or_else(|| PathBuf::from("./generated_products.json"));

    let database_url = config
        .database_url
        .as_deref()
        .ok_or("DATABASE_URL must be set to seed products")?;

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let products = parse_products(&contents)?;
    info!(path = %path.display(), products = products.len(), "Loaded products");
    check_product_ids(&products)?;

    let mut store = PostgresProductStore::connect(database_url).await?;
    let inserted = store.replace_all(&products).await?;

    info!(inserted = inserted, "Seeded products table");
    Ok(())
}
