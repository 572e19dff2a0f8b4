//! The cart/wishlist mirror and its derived queries.
//!
//! Everything here is synchronous. [`ShopStore`](super::ShopStore) applies
//! these methods inside `watch::Sender::send_modify`, so a change is never
//! split across an await point.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use brightique_core::{CartLine, CartLineId, LineId, Price, Product, ProductId, WishlistEntry};

use super::outcome::SkipReason;
use crate::models::Session;

/// Client-side mirror of the signed-in user's cart and wishlist.
///
/// `version` increases on every change to the mirror; `epoch` increases on
/// every sign-in and sign-out. In-flight operations compare both to decide
/// whether their result still applies.
#[derive(Debug, Clone, Default)]
pub struct ShopState {
    cart: Vec<CartLine>,
    wishlist: Vec<WishlistEntry>,
    catalog: HashMap<ProductId, Product>,
    session: Option<Arc<Session>>,
    epoch: u64,
    version: u64,
    loading: bool,
}

/// Cart and wishlist as they were before an optimistic change.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    cart: Vec<CartLine>,
    wishlist: Vec<WishlistEntry>,
}

/// Inverse of a single optimistic change.
///
/// Used instead of a [`Snapshot`] when other changes landed after it.
/// Cart entries are keyed by product because a pending line may have been
/// given its server id in the meantime.
#[derive(Debug, Clone)]
pub(crate) enum Undo {
    UnitAdded { product_id: ProductId, new_line: bool },
    UnitRemoved { product_id: ProductId },
    LineRemoved { index: usize, line: CartLine },
    WishlistInserted { product_id: ProductId },
    WishlistRemoved { index: usize, entry: WishlistEntry },
}

impl ShopState {
    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn cart(&self) -> &[CartLine] {
        &self.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &[WishlistEntry] {
        &self.wishlist
    }

    #[must_use]
    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Incremented on every sign-in and sign-out.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Incremented on every change to the mirror.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Whether the cart and wishlist are being fetched for a new session.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Products known to the catalog cache, in no particular order.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.catalog.values()
    }

    #[must_use]
    pub fn catalog_product(&self, product_id: ProductId) -> Option<&Product> {
        self.catalog.get(&product_id)
    }

    #[must_use]
    pub fn line(&self, line_id: CartLineId) -> Option<&CartLine> {
        self.cart.iter().find(|line| line.id == line_id)
    }

    #[must_use]
    pub fn line_for_product(&self, product_id: ProductId) -> Option<&CartLine> {
        self.cart.iter().find(|line| line.product_id() == product_id)
    }

    // =========================================================================
    // Derived queries
    // =========================================================================

    /// Stock for a product from the catalog cache; 0 when unknown.
    #[must_use]
    pub fn get_product_stock(&self, product_id: ProductId) -> u32 {
        self.catalog.get(&product_id).map_or(0, |p| p.stock)
    }

    /// Units of a product in the cart; 0 when absent.
    #[must_use]
    pub fn get_cart_quantity(&self, product_id: ProductId) -> u32 {
        self.line_for_product(product_id).map_or(0, |line| line.quantity)
    }

    /// Whether the cart already holds every known unit of a product.
    ///
    /// Unknown products have stock 0 and so always count as out of stock.
    #[must_use]
    pub fn is_out_of_stock(&self, product_id: ProductId) -> bool {
        self.get_cart_quantity(product_id) >= self.get_product_stock(product_id)
    }

    /// Units that can still be added before reaching the known stock.
    #[must_use]
    pub fn headroom(&self, product_id: ProductId) -> u32 {
        self.get_product_stock(product_id)
            .saturating_sub(self.get_cart_quantity(product_id))
    }

    #[must_use]
    pub fn is_in_wishlist(&self, product_id: ProductId) -> bool {
        self.wishlist.iter().any(|e| e.product_id == product_id)
    }

    #[must_use]
    pub fn is_in_cart(&self, product_id: ProductId) -> bool {
        self.line_for_product(product_id).is_some()
    }

    /// Sum of price times quantity over all lines.
    #[must_use]
    pub fn cart_subtotal(&self) -> Price {
        self.cart.iter().map(CartLine::line_price).sum()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn cart_item_count(&self) -> u32 {
        self.cart.iter().map(|line| line.quantity).sum()
    }

    // =========================================================================
    // Session and bulk replacement
    // =========================================================================

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Start a new session (or none): empties the mirror and bumps the epoch.
    pub(crate) fn begin_session(&mut self, session: Option<Arc<Session>>) {
        self.epoch = self.epoch.wrapping_add(1);
        self.cart.clear();
        self.wishlist.clear();
        self.loading = session.is_some();
        self.session = session;
        self.touch();
    }

    pub(crate) fn finish_loading(&mut self) {
        if self.loading {
            self.loading = false;
            self.touch();
        }
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            cart: self.cart.clone(),
            wishlist: self.wishlist.clone(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: Snapshot) {
        self.cart = snapshot.cart;
        self.wishlist = snapshot.wishlist;
        self.touch();
    }

    /// Replace the cart with what the backend returned.
    ///
    /// A second line for the same product is folded into the first.
    pub(crate) fn replace_cart(&mut self, lines: Vec<CartLine>) {
        let mut cart: Vec<CartLine> = Vec::with_capacity(lines.len());
        for line in lines {
            if let Some(existing) = cart
                .iter_mut()
                .find(|l| l.product_id() == line.product_id())
            {
                warn!(
                    product_id = %line.product_id(),
                    line_id = %line.id,
                    "Backend returned duplicate cart line; merging"
                );
                existing.quantity = existing.quantity.saturating_add(line.quantity);
                continue;
            }
            cart.push(line);
        }
        self.cart = cart;
        self.touch();
    }

    pub(crate) fn replace_wishlist(&mut self, entries: Vec<WishlistEntry>) {
        let mut wishlist: Vec<WishlistEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !wishlist.iter().any(|e| e.product_id == entry.product_id) {
                wishlist.push(entry);
            }
        }
        self.wishlist = wishlist;
        self.touch();
    }

    pub(crate) fn replace_catalog(&mut self, products: Vec<Product>) {
        self.catalog = products.into_iter().map(|p| (p.id, p)).collect();
        self.touch();
    }

    // =========================================================================
    // Optimistic cart changes
    // =========================================================================

    /// Add one unit of `product`, creating a pending line if needed.
    pub(crate) fn add_unit(&mut self, product: &Product) -> Undo {
        let new_line = match self
            .cart
            .iter_mut()
            .find(|line| line.product_id() == product.id)
        {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(1);
                false
            }
            None => {
                self.cart.push(CartLine::pending(product.clone()));
                true
            }
        };
        self.touch();
        Undo::UnitAdded {
            product_id: product.id,
            new_line,
        }
    }

    /// Add one unit to an existing line, bounded by the known stock.
    ///
    /// Returns the line as it is after the change.
    pub(crate) fn raise_quantity(
        &mut self,
        line_id: CartLineId,
    ) -> Result<(Undo, CartLine), SkipReason> {
        let stock = {
            let line = self.line(line_id).ok_or(SkipReason::NotInCart)?;
            self.get_product_stock(line.product_id())
        };
        let line = self
            .cart
            .iter_mut()
            .find(|line| line.id == line_id)
            .ok_or(SkipReason::NotInCart)?;
        if line.quantity >= stock {
            return Err(SkipReason::AtStockLimit);
        }
        line.quantity += 1;
        let raised = line.clone();
        self.touch();

        Ok((
            Undo::UnitAdded {
                product_id: raised.product_id(),
                new_line: false,
            },
            raised,
        ))
    }

    /// Take one unit off a line without ever removing it.
    pub(crate) fn lower_quantity(
        &mut self,
        line_id: CartLineId,
    ) -> Result<(Undo, LineId), SkipReason> {
        let line = self
            .cart
            .iter_mut()
            .find(|line| line.id == line_id)
            .ok_or(SkipReason::NotInCart)?;
        if line.quantity <= 1 {
            return Err(SkipReason::AtMinimum);
        }
        let remote = line.id.remote().ok_or(SkipReason::AwaitingConfirmation)?;
        line.quantity -= 1;
        let product_id = line.product_id();
        self.touch();

        Ok((Undo::UnitRemoved { product_id }, remote))
    }

    pub(crate) fn remove_line(&mut self, line_id: CartLineId) -> Result<(Undo, LineId), SkipReason> {
        let index = self
            .cart
            .iter()
            .position(|line| line.id == line_id)
            .ok_or(SkipReason::NotInCart)?;
        let remote = line_id.remote().ok_or(SkipReason::AwaitingConfirmation)?;
        let line = self.cart.remove(index);
        self.touch();

        Ok((Undo::LineRemoved { index, line }, remote))
    }

    // =========================================================================
    // Server confirmations
    // =========================================================================

    /// Give the local line for a product the server's id.
    ///
    /// The server's quantity is only taken when `take_quantity` is set, i.e.
    /// when no other change has touched the mirror since the request went out.
    /// A lower server quantity is ignored: an earlier add for the same product
    /// may still be on its way to the backend.
    pub(crate) fn adopt_server_line(&mut self, server: CartLine, take_quantity: bool) {
        self.catalog
            .insert(server.product_id(), server.product.clone());
        if let Some(line) = self
            .cart
            .iter_mut()
            .find(|line| line.product_id() == server.product_id())
        {
            line.id = server.id;
            line.product = server.product;
            if take_quantity {
                line.quantity = line.quantity.max(server.quantity);
            }
        }
        self.touch();
    }

    /// Insert or overwrite the line for the server line's product.
    pub(crate) fn upsert_server_line(&mut self, server: CartLine) {
        self.catalog
            .insert(server.product_id(), server.product.clone());
        match self
            .cart
            .iter_mut()
            .find(|line| line.product_id() == server.product_id())
        {
            Some(line) => *line = server,
            None => self.cart.push(server),
        }
        self.touch();
    }

    // =========================================================================
    // Wishlist changes
    // =========================================================================

    /// Flip membership. Returns the undo and whether the product is now a member.
    pub(crate) fn toggle_wishlist(&mut self, product_id: ProductId) -> (Undo, bool) {
        let result = match self
            .wishlist
            .iter()
            .position(|e| e.product_id == product_id)
        {
            Some(index) => {
                let entry = self.wishlist.remove(index);
                (Undo::WishlistRemoved { index, entry }, false)
            }
            None => {
                self.wishlist.push(self.wishlist_entry(product_id));
                (Undo::WishlistInserted { product_id }, true)
            }
        };
        self.touch();
        result
    }

    /// Make membership match what the backend reports.
    pub(crate) fn set_wishlisted(&mut self, product_id: ProductId, member: bool) {
        match (self.is_in_wishlist(product_id), member) {
            (false, true) => {
                self.wishlist.push(self.wishlist_entry(product_id));
                self.touch();
            }
            (true, false) => {
                self.wishlist.retain(|e| e.product_id != product_id);
                self.touch();
            }
            _ => {}
        }
    }

    fn wishlist_entry(&self, product_id: ProductId) -> WishlistEntry {
        self.catalog
            .get(&product_id)
            .cloned()
            .map_or_else(|| WishlistEntry::minimal(product_id), WishlistEntry::from)
    }

    // =========================================================================
    // Rollback
    // =========================================================================

    /// Apply the inverse of one change.
    pub(crate) fn undo(&mut self, undo: Undo) {
        match undo {
            Undo::UnitAdded {
                product_id,
                new_line,
            } => {
                if let Some(index) = self
                    .cart
                    .iter()
                    .position(|line| line.product_id() == product_id)
                {
                    let (quantity, pending) = self
                        .cart
                        .get(index)
                        .map_or((0, false), |line| (line.quantity, line.id.is_pending()));
                    if quantity > 1 {
                        if let Some(line) = self.cart.get_mut(index) {
                            line.quantity -= 1;
                        }
                    } else if new_line || pending {
                        // A pending line only holds unconfirmed adds
                        self.cart.remove(index);
                    }
                }
            }
            Undo::UnitRemoved { product_id } => {
                if let Some(line) = self
                    .cart
                    .iter_mut()
                    .find(|line| line.product_id() == product_id)
                {
                    line.quantity = line.quantity.saturating_add(1);
                }
            }
            Undo::LineRemoved { index, line } => {
                match self
                    .cart
                    .iter_mut()
                    .find(|l| l.product_id() == line.product_id())
                {
                    // Re-added while the removal was in flight
                    Some(existing) => {
                        existing.quantity = existing.quantity.saturating_add(line.quantity);
                        if existing.id.is_pending() {
                            existing.id = line.id;
                        }
                    }
                    None => {
                        let index = index.min(self.cart.len());
                        self.cart.insert(index, line);
                    }
                }
            }
            Undo::WishlistInserted { product_id } => {
                self.wishlist.retain(|e| e.product_id != product_id);
            }
            Undo::WishlistRemoved { index, entry } => {
                if !self.is_in_wishlist(entry.product_id) {
                    let index = index.min(self.wishlist.len());
                    self.wishlist.insert(index, entry);
                }
            }
        }
        self.touch();
    }
}
