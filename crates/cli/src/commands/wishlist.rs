//! Wishlist commands.
//!
//! # Usage
//!
//! ```bash
//! bq-cli wishlist show
//! bq-cli wishlist toggle 42
//! bq-cli wishlist remove 42
//! bq-cli wishlist move-to-cart 42
//! ```

use brightique_core::ProductId;
use brightique_storefront::shop::MutationOutcome;

use super::{CliError, Store, check, render};

/// Print the wishlist.
pub fn show(store: &Store) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    render::wishlist(&mut out, &store.snapshot())?;
    Ok(())
}

pub async fn toggle(store: &Store, product_id: ProductId) -> Result<(), CliError> {
    let outcome = store.toggle_wishlist(product_id).await;
    finish(store, "toggle", outcome, false)
}

pub async fn remove(store: &Store, product_id: ProductId) -> Result<(), CliError> {
    let outcome = store.remove_from_wishlist(product_id).await;
    finish(store, "remove", outcome, false)
}

/// Move a product into the cart and print both lists.
pub async fn move_to_cart(store: &Store, product_id: ProductId) -> Result<(), CliError> {
    let outcome = store.add_to_cart_from_wishlist(product_id).await;
    finish(store, "move-to-cart", outcome, true)
}

fn finish(
    store: &Store,
    op: &'static str,
    outcome: MutationOutcome,
    with_cart: bool,
) -> Result<(), CliError> {
    let state = store.snapshot();
    let mut out = std::io::stdout().lock();
    render::outcome(&mut out, op, outcome)?;
    render::wishlist(&mut out, &state)?;
    if with_cart {
        render::cart(&mut out, &state)?;
    }
    check(op, outcome)
}
