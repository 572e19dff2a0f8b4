//! Catalog product records.
//!
//! The backend owns products; clients only ever hold read-only snapshots.
//! `ProductPayload` mirrors the loosely-typed JSON the backend emits and is
//! converted into a [`Product`] at the boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;
use super::validation::{ValidationError, require};

const RECORD: &str = "product";

/// A snapshot of a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    /// Units available for sale.
    pub stock: u32,
    pub category: Option<String>,
    /// Image URL.
    pub image: Option<String>,
    pub description: Option<String>,
    pub size: Option<String>,
    pub warranty: Option<String>,
    pub material: Option<String>,
}

impl Product {
    /// Category label for display, falling back to the house collection.
    #[must_use]
    pub fn category_label(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or("Exclusive Collection")
    }
}

/// Product as it arrives on the wire.
///
/// Every field is optional so that a malformed record surfaces as a
/// [`ValidationError`] instead of a serde failure for the whole response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPayload {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
    /// Legacy name for `stock` on older product records.
    pub quantity: Option<i64>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub size: Option<String>,
    pub warranty: Option<String>,
    #[serde(alias = "meterial")]
    pub material: Option<String>,
}

impl TryFrom<ProductPayload> for Product {
    type Error = ValidationError;

    fn try_from(payload: ProductPayload) -> Result<Self, Self::Error> {
        let id = require(payload.id, RECORD, "id")?;
        let name = require(payload.name, RECORD, "name")?;
        if name.trim().is_empty() {
            return Err(ValidationError::invalid(RECORD, "name", "must not be blank"));
        }

        let amount = require(payload.price, RECORD, "price")?;
        if amount.is_sign_negative() {
            return Err(ValidationError::invalid(
                RECORD,
                "price",
                format!("must not be negative (got {amount})"),
            ));
        }

        // Records without any stock figure are treated as sold out.
        let raw_stock = payload.stock.or(payload.quantity).unwrap_or(0);
        let stock = u32::try_from(raw_stock).map_err(|_| {
            ValidationError::invalid(RECORD, "stock", format!("out of range (got {raw_stock})"))
        })?;

        Ok(Self {
            id: ProductId::new(id),
            name,
            price: Price::inr(amount),
            stock,
            category: payload.category,
            image: payload.image,
            description: payload.description,
            size: payload.size,
            warranty: payload.warranty,
            material: payload.material,
        })
    }
}

impl From<&Product> for ProductPayload {
    fn from(product: &Product) -> Self {
        Self {
            id: Some(product.id.as_i64()),
            name: Some(product.name.clone()),
            price: Some(product.price.amount),
            stock: Some(i64::from(product.stock)),
            quantity: None,
            category: product.category.clone(),
            image: product.image.clone(),
            description: product.description.clone(),
            size: product.size.clone(),
            warranty: product.warranty.clone(),
            material: product.material.clone(),
        }
    }
}

/// Search, category, and ordering options for catalog listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub ordering: Option<ProductOrdering>,
}

impl ProductFilter {
    /// Whether this is the plain, unfiltered catalog listing.
    #[must_use]
    pub const fn is_unfiltered(&self) -> bool {
        self.search.is_none() && self.category.is_none() && self.ordering.is_none()
    }
}

/// Catalog sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductOrdering {
    PriceLowToHigh,
    PriceHighToLow,
}

impl ProductOrdering {
    /// The backend's `ordering` query value.
    #[must_use]
    pub const fn as_query(&self) -> &'static str {
        match self {
            Self::PriceLowToHigh => "price",
            Self::PriceHighToLow => "-price",
        }
    }
}
