//! CLI command implementations.

pub mod cart;
pub mod products;
mod render;
pub mod wishlist;

use std::sync::Arc;

use thiserror::Error;

use brightique_core::{CartLineId, LineId, Product, ProductId};
use brightique_storefront::api::{ApiError, BrightiqueClient, CatalogApi};
use brightique_storefront::config::{ConfigError, StorefrontConfig};
use brightique_storefront::shop::{MutationOutcome, ShopStore};

/// Store type every session command works with.
pub type Store = ShopStore<BrightiqueClient>;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A session command was run without session credentials.
    #[error(
        "No session configured; set BRIGHTIQUE_ACCESS_TOKEN, BRIGHTIQUE_USER_ID and BRIGHTIQUE_USER_EMAIL"
    )]
    NoSession,

    /// Backend request failed.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// Cart or wishlist could not be loaded at sign-in.
    #[error("Could not load the cart and wishlist ({0})")]
    SignIn(MutationOutcome),

    /// A store operation did not go through.
    #[error("{op} was not applied: {outcome}")]
    NotApplied {
        op: &'static str,
        outcome: MutationOutcome,
    },

    /// Writing to the terminal failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::NoSession => 2,
            _ => 1,
        }
    }
}

fn client(config: &StorefrontConfig) -> Result<BrightiqueClient, CliError> {
    Ok(BrightiqueClient::new(&config.api)?)
}

/// Build a store, load the catalog, and sign in with the configured session.
pub async fn signed_in_store(config: &StorefrontConfig) -> Result<Store, CliError> {
    let session = config.session.as_ref().ok_or(CliError::NoSession)?;
    let store = ShopStore::new(Arc::new(client(config)?));

    // Stock figures only; cart commands still work without them
    store.refresh_products().await;

    let outcome = store.sign_in(session.to_session()).await;
    if !outcome.is_confirmed() {
        return Err(CliError::SignIn(outcome));
    }
    Ok(store)
}

/// Look a product up in the store's catalog, falling back to the backend.
async fn find_product(store: &Store, product_id: ProductId) -> Result<Product, CliError> {
    if let Some(product) = store.snapshot().catalog_product(product_id) {
        return Ok(product.clone());
    }
    Ok(store.api().get_product(product_id).await?)
}

/// Turn a store outcome into a command result.
///
/// Skips are not errors: the store decided there was nothing to do.
const fn check(op: &'static str, outcome: MutationOutcome) -> Result<(), CliError> {
    match outcome {
        MutationOutcome::Confirmed | MutationOutcome::Skipped(_) => Ok(()),
        _ => Err(CliError::NotApplied { op, outcome }),
    }
}

const fn line(line_id: LineId) -> CartLineId {
    CartLineId::Remote(line_id)
}
