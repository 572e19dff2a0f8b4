//! Wishlist entries.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::{Product, ProductPayload};
use super::validation::{ValidationError, require};

const RECORD: &str = "wishlist entry";

/// A saved product.
///
/// The backend may return either the full product or only its id, and an
/// optimistic toggle only knows the id, so the snapshot is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub product_id: ProductId,
    pub product: Option<Product>,
}

impl WishlistEntry {
    /// An entry known only by product id.
    #[must_use]
    pub const fn minimal(product_id: ProductId) -> Self {
        Self {
            product_id,
            product: None,
        }
    }
}

impl From<Product> for WishlistEntry {
    fn from(product: Product) -> Self {
        Self {
            product_id: product.id,
            product: Some(product),
        }
    }
}

/// Product reference inside a wishlist payload: a bare id or a full record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductRefPayload {
    Id(i64),
    Full(ProductPayload),
}

/// Wishlist entry as it arrives on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WishlistPayload {
    pub product: Option<ProductRefPayload>,
}

impl TryFrom<WishlistPayload> for WishlistEntry {
    type Error = ValidationError;

    fn try_from(payload: WishlistPayload) -> Result<Self, Self::Error> {
        match require(payload.product, RECORD, "product")? {
            ProductRefPayload::Id(id) => Ok(Self::minimal(ProductId::new(id))),
            ProductRefPayload::Full(product) => Product::try_from(product).map(Self::from),
        }
    }
}

/// The backend's answer to a wishlist toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistToggle {
    /// `true` when the toggle removed the product, `false` when it added it.
    pub removed: bool,
}

impl WishlistToggle {
    /// Whether the product is in the wishlist after the toggle.
    #[must_use]
    pub const fn is_member(&self) -> bool {
        !self.removed
    }
}
