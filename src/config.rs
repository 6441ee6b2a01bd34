//! Environment-driven configuration

use std::env;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ENVIRONMENT: &str = "sandbox";

/// Deployment environment (`production`, `prod`, `sandbox`, ...)
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string())
}

/// PostgreSQL connection string for the products table
pub fn get_database_url() -> Option<String> {
    env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty())
}

/// JSON product dump used when no database is configured
pub fn get_products_file() -> Option<PathBuf> {
    env::var("PRODUCTS_FILE")
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
}

pub fn is_production(environment: &str) -> bool {
    matches!(environment, "production" | "prod")
}

pub fn get_port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Snapshot of every setting the binaries read at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub database_url: Option<String>,
    pub products_file: Option<PathBuf>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            environment: get_environment(),
            database_url: get_database_url(),
            products_file: get_products_file(),
            port: get_port(),
        }
    }

    pub fn is_production(&self) -> bool {
        is_production(&self.environment)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            database_url: None,
            products_file: None,
            port: DEFAULT_PORT,
        }
    }
}
