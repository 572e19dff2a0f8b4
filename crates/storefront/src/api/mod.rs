//! Brightique backend API: collaborator traits and the REST client.
//!
//! # Architecture
//!
//! - The backend is the source of truth for catalog, cart, and wishlist
//! - [`CartApi`], [`WishlistApi`], and [`CatalogApi`] describe what the
//!   [`ShopStore`](crate::shop::ShopStore) needs, independent of transport
//! - [`BrightiqueClient`] implements all three over HTTP with `reqwest`
//! - Unfiltered catalog listings are cached in memory via `moka`
//!
//! # Example
//!
//! ```rust,ignore
//! use brightique_storefront::api::{BrightiqueClient, CartApi};
//!
//! let client = BrightiqueClient::new(&config.api)?;
//! let cart = client.load_cart(&session).await?;
//! let line = client.cart_add(&session, product.id).await?;
//! ```

mod cache;
mod client;
mod conversions;

pub use client::BrightiqueClient;

use async_trait::async_trait;
use thiserror::Error;

use brightique_core::{
    CartLine, LineId, Product, ProductFilter, ProductId, QuantityChange, ValidationError,
    WishlistEntry, WishlistToggle,
};

use crate::models::Session;

/// Errors that can occur when talking to the Brightique backend.
///
/// From the store's point of view every variant is a remote sync failure.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Bearer token missing, expired, or rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response parsed but violated a domain invariant.
    #[error("Invalid payload: {0}")]
    Validation(#[from] ValidationError),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Remote cart persistence.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Fetch the session user's cart.
    async fn load_cart(&self, session: &Session) -> Result<Vec<CartLine>, ApiError>;

    /// Add one unit of a product. The backend increments an existing line.
    async fn cart_add(&self, session: &Session, product_id: ProductId)
    -> Result<CartLine, ApiError>;

    /// Change a line's quantity.
    async fn cart_update_quantity(
        &self,
        session: &Session,
        line_id: LineId,
        change: QuantityChange,
    ) -> Result<(), ApiError>;

    /// Delete a line.
    async fn cart_remove(&self, session: &Session, line_id: LineId) -> Result<(), ApiError>;
}

/// Remote wishlist persistence.
#[async_trait]
pub trait WishlistApi: Send + Sync {
    /// Fetch the session user's wishlist.
    async fn load_wishlist(&self, session: &Session) -> Result<Vec<WishlistEntry>, ApiError>;

    /// Flip a product's membership; the answer says which way it went.
    async fn wishlist_toggle(
        &self,
        session: &Session,
        product_id: ProductId,
    ) -> Result<WishlistToggle, ApiError>;
}

/// Read-only product catalog.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// List products matching `filter`.
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ApiError>;

    /// Fetch a single product.
    async fn get_product(&self, product_id: ProductId) -> Result<Product, ApiError>;

    /// Drop any cached catalog data so the next listing hits the backend.
    async fn invalidate_catalog(&self) {}
}

/// Everything the store needs from the backend.
pub trait ShopApi: CartApi + WishlistApi + CatalogApi {}

impl<T: CartApi + WishlistApi + CatalogApi> ShopApi for T {}
