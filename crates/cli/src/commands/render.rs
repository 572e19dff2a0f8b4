//! Plain-text rendering of catalog, cart, and wishlist.

use std::io::{self, Write};

use brightique_core::Product;
use brightique_storefront::shop::{MutationOutcome, ShopState};

pub fn products(out: &mut impl Write, products: &[Product]) -> io::Result<()> {
    if products.is_empty() {
        return writeln!(out, "No products found.");
    }
    for product in products {
        writeln!(
            out,
            "{:>6}  {:<36}  {:>12}  stock {:<4}  {}",
            product.id.to_string(),
            product.name,
            product.price.display(),
            product.stock,
            product.category_label()
        )?;
    }
    Ok(())
}

pub fn product(out: &mut impl Write, product: &Product) -> io::Result<()> {
    writeln!(out, "{} (#{})", product.name, product.id)?;
    writeln!(out, "  Price:    {}", product.price.display())?;
    writeln!(out, "  Stock:    {}", product.stock)?;
    writeln!(out, "  Category: {}", product.category_label())?;
    for (label, value) in [
        ("Size", &product.size),
        ("Material", &product.material),
        ("Warranty", &product.warranty),
        ("Image", &product.image),
    ] {
        if let Some(value) = value {
            writeln!(out, "  {label:<9} {value}")?;
        }
    }
    if let Some(description) = &product.description {
        writeln!(out)?;
        writeln!(out, "{description}")?;
    }
    Ok(())
}

pub fn cart(out: &mut impl Write, state: &ShopState) -> io::Result<()> {
    if state.cart().is_empty() {
        return writeln!(out, "Your cart is empty.");
    }
    for line in state.cart() {
        let limit = if state.is_out_of_stock(line.product_id()) {
            "  (max)"
        } else {
            ""
        };
        writeln!(
            out,
            "{:>8}  {:<36}  x{:<3}  {:>12}{limit}",
            line.id.to_string(),
            line.product.name,
            line.quantity,
            line.line_price().display()
        )?;
    }
    writeln!(
        out,
        "Items: {}  Subtotal: {}",
        state.cart_item_count(),
        state.cart_subtotal().display()
    )
}

pub fn wishlist(out: &mut impl Write, state: &ShopState) -> io::Result<()> {
    if state.wishlist().is_empty() {
        return writeln!(out, "Your wishlist is empty.");
    }
    for entry in state.wishlist() {
        let product = entry
            .product
            .as_ref()
            .or_else(|| state.catalog_product(entry.product_id));
        let in_cart = if state.is_in_cart(entry.product_id) {
            "  [in cart]"
        } else {
            ""
        };
        match product {
            Some(product) => writeln!(
                out,
                "{:>6}  {:<36}  {:>12}{in_cart}",
                entry.product_id.to_string(),
                product.name,
                product.price.display()
            )?,
            None => writeln!(
                out,
                "{:>6}  (product #{}){in_cart}",
                entry.product_id.to_string(),
                entry.product_id
            )?,
        }
    }
    Ok(())
}

pub fn outcome(out: &mut impl Write, op: &str, outcome: MutationOutcome) -> io::Result<()> {
    writeln!(out, "{op}: {outcome}")
}
