//! Brightique Core - Shared types library.
//!
//! This crate provides the domain records used across Brightique components:
//! - `storefront` - API client and the cart/wishlist store
//! - `cli` - Command-line smoke tool for the store
//!
//! # Architecture
//!
//! The core crate contains only types and their invariants - no I/O, no HTTP
//! clients. Wire payloads are converted into typed records here so that a
//! malformed backend response is rejected once, at the boundary.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, prices, products, cart lines, and wishlist entries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
