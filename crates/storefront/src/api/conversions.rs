//! Wire payload conversion functions.
//!
//! Lists are converted leniently: a record that fails validation is logged
//! and skipped so one bad row cannot blank the whole cart. Single-record
//! responses are converted strictly.

use serde::Deserialize;
use tracing::warn;

use brightique_core::{
    CartLine, CartLinePayload, Product, ProductPayload, ValidationError, WishlistEntry,
    WishlistPayload,
};

/// Product listing body: either paginated or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProductListPayload {
    Paged {
        products: Vec<ProductPayload>,
        #[serde(default)]
        pagination: Option<PaginationPayload>,
    },
    Bare(Vec<ProductPayload>),
}

/// Pagination block of a product listing.
#[derive(Debug, Deserialize)]
pub struct PaginationPayload {
    pub next: Option<String>,
    pub current_page: Option<u32>,
    pub total_pages: Option<u32>,
}

impl ProductListPayload {
    fn into_products(self) -> Vec<ProductPayload> {
        match self {
            Self::Paged {
                products,
                pagination,
            } => {
                if let Some(p) = pagination
                    && p.next.is_some()
                {
                    warn!(
                        current_page = ?p.current_page,
                        total_pages = ?p.total_pages,
                        "Product listing is paginated; only the first page was read"
                    );
                }
                products
            }
            Self::Bare(products) => products,
        }
    }
}

/// Convert each item, skipping (and logging) the ones that fail validation.
fn convert_all<P, T>(items: Vec<P>, kind: &'static str) -> Vec<T>
where
    T: TryFrom<P, Error = ValidationError>,
{
    items
        .into_iter()
        .filter_map(|item| match T::try_from(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(kind, error = %e, "Skipping invalid record from backend");
                None
            }
        })
        .collect()
}

pub fn convert_cart(lines: Vec<CartLinePayload>) -> Vec<CartLine> {
    convert_all(lines, "cart line")
}

pub fn convert_wishlist(entries: Vec<WishlistPayload>) -> Vec<WishlistEntry> {
    convert_all(entries, "wishlist entry")
}

pub fn convert_products(listing: ProductListPayload) -> Vec<Product> {
    convert_all(listing.into_products(), "product")
}
