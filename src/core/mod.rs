//! Service surface (HTTP API)

pub mod http;

pub use http::*;
