//! Cache types for catalog responses.

use brightique_core::{Product, ProductId};

/// Cache key for catalog data.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    /// The unfiltered product listing.
    Catalog,
    Product(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Catalog(Vec<Product>),
    Product(Box<Product>),
}
