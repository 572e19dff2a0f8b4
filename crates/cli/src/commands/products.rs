//! Catalog commands.
//!
//! # Usage
//!
//! ```bash
//! bq-cli products list --category Pendants --sort price-desc
//! bq-cli products show 42
//! ```
//!
//! These commands do not need a session.

use std::io::Write;

use brightique_core::{ProductFilter, ProductId, ProductOrdering};
use brightique_storefront::api::CatalogApi;
use brightique_storefront::config::StorefrontConfig;

use super::{CliError, client, render};

/// List products matching the given filter.
pub async fn list(
    config: &StorefrontConfig,
    search: Option<String>,
    category: Option<String>,
    ordering: Option<ProductOrdering>,
) -> Result<(), CliError> {
    let filter = ProductFilter {
        search,
        category,
        ordering,
    };
    let products = client(config)?.list_products(&filter).await?;
    tracing::debug!(count = products.len(), "Fetched products");

    let mut out = std::io::stdout().lock();
    render::products(&mut out, &products)?;
    out.flush()?;
    Ok(())
}

/// Show one product.
pub async fn show(config: &StorefrontConfig, product_id: ProductId) -> Result<(), CliError> {
    let product = client(config)?.get_product(product_id).await?;

    let mut out = std::io::stdout().lock();
    render::product(&mut out, &product)?;
    Ok(())
}
