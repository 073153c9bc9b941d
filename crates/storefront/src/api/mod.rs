//! Delivery API client.
//!
//! # Architecture
//!
//! - The delivery API is the source of truth for clients, orders, billing,
//!   and the product catalog - NO local sync, direct JSON-over-HTTPS calls
//! - In-memory caching via `moka` for the product catalog (5 minute TTL)
//! - Domain rejections can arrive inside a 2xx envelope (`success: false`);
//!   they map to [`ApiError::Rejected`], not a transport error
//!
//! # Example
//!
//! ```rust,ignore
//! use vale_acai_storefront::api::DeliveryClient;
//!
//! let client = DeliveryClient::new(&config.api)?;
//!
//! // Resolve a client by phone
//! let record = client.find_client(&phone).await?;
//!
//! // Generate a PIX code for the order total
//! let qr = client
//!     .create_pix_charge(&PixChargeRequest::for_total("Pedido Vale Açaí", total, 300))
//!     .await?;
//! ```

mod client;
pub mod types;

pub use client::DeliveryClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the delivery API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// API rejected the request inside a 2xx envelope (`success: false`).
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Response body could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}
