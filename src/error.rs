//! Error types for product lookups and analyses

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed product record {product_id}: {reason}")]
    MalformedRecord { product_id: String, reason: String },
}

/// Non-success outcomes of an analysis call.
///
/// Every variant is produced and logged inside the analysis layer; callers
/// only ever see one of these as a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Product not found or missing history: {product_id}")]
    NotFound { product_id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

impl AnalysisError {
    pub fn not_found(product_id: &str) -> Self {
        Self::NotFound {
            product_id: product_id.to_string(),
        }
    }

    /// Short label used for metrics and HTTP responses
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Processing(_) => "processing_error",
        }
    }
}

impl From<StoreError> for AnalysisError {
    fn from(err: StoreError) -> Self {
        Self::Processing(err.to_string())
    }
}

pub type DemandError = AnalysisError;

pub type Result<T> = std::result::Result<T, AnalysisError>;
