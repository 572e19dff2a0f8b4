//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! bq-cli cart show
//! bq-cli cart add 42
//! bq-cli cart increase 1187
//! bq-cli cart decrease 1187
//! bq-cli cart remove 1187
//! ```
//!
//! Line IDs are the server-assigned IDs shown by `cart show`.

use brightique_core::{LineId, ProductId};
use brightique_storefront::shop::MutationOutcome;

use super::{CliError, Store, check, find_product, line, render};

/// Print the cart.
pub fn show(store: &Store) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    render::cart(&mut out, &store.snapshot())?;
    Ok(())
}

pub async fn add(store: &Store, product_id: ProductId) -> Result<(), CliError> {
    let product = find_product(store, product_id).await?;
    let outcome = store.add_to_cart(&product).await;
    finish(store, "add", outcome)
}

pub async fn increase(store: &Store, line_id: LineId) -> Result<(), CliError> {
    let outcome = store.increase_quantity(line(line_id)).await;
    finish(store, "increase", outcome)
}

pub async fn decrease(store: &Store, line_id: LineId) -> Result<(), CliError> {
    let outcome = store.decrease_quantity(line(line_id)).await;
    finish(store, "decrease", outcome)
}

pub async fn remove(store: &Store, line_id: LineId) -> Result<(), CliError> {
    let outcome = store.remove_from_cart(line(line_id)).await;
    finish(store, "remove", outcome)
}

fn finish(store: &Store, op: &'static str, outcome: MutationOutcome) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    render::outcome(&mut out, op, outcome)?;
    render::cart(&mut out, &store.snapshot())?;
    check(op, outcome)
}
