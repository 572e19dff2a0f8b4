//! Core types for Brightique.
//!
//! This module provides type-safe records for the storefront's domain.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;
pub mod validation;
pub mod wishlist;

pub use cart::{CartLine, CartLinePayload, QuantityChange};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use product::{Product, ProductFilter, ProductOrdering, ProductPayload};
pub use validation::ValidationError;
pub use wishlist::{ProductRefPayload, WishlistEntry, WishlistPayload, WishlistToggle};
