//! Brightique storefront client library.
//!
//! Talks to the Brightique REST backend and keeps a client-side mirror of the
//! signed-in user's cart and wishlist in [`shop::ShopStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod models;
pub mod shop;
pub mod telemetry;
