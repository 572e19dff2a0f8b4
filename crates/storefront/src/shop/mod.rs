//! Client-side cart and wishlist store.
//!
//! # Architecture
//!
//! - [`ShopStore`] mirrors the signed-in user's cart and wishlist
//! - Mutations are applied to the mirror first, then sent to the backend
//! - A failed call rolls the mirror back (full snapshot if nothing else
//!   changed in the meantime, otherwise only the inverse of its own change)
//! - Results that arrive after a sign-in or sign-out are dropped
//! - The mirror is published on a `tokio::sync::watch` channel and only ever
//!   modified between await points, so no lock is held across a request
//!
//! # Example
//!
//! ```rust,ignore
//! use brightique_storefront::shop::{MutationOutcome, ShopStore};
//!
//! let store = ShopStore::new(Arc::new(client));
//! store.refresh_products().await;
//! store.sign_in(session).await;
//!
//! if store.add_to_cart(&product).await == MutationOutcome::RolledBack {
//!     // show "Failed to add to cart"
//! }
//! ```

mod outcome;
mod state;

pub use outcome::{MutationOutcome, SkipReason};
pub use state::ShopState;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use brightique_core::{
    CartLine, CartLineId, Price, Product, ProductFilter, ProductId, QuantityChange, WishlistEntry,
};

use crate::api::{ApiError, ShopApi};
use crate::models::Session;
use crate::telemetry;
use state::{Snapshot, Undo};

/// An optimistic change waiting for the backend.
struct InFlight {
    session: Arc<Session>,
    epoch: u64,
    /// Mirror version right after the optimistic change.
    version: u64,
    before: Snapshot,
    undo: Undo,
}

/// Cart and wishlist store for one storefront client.
///
/// Share it between tasks with an `Arc`; every method takes `&self`.
pub struct ShopStore<A: ?Sized> {
    api: Arc<A>,
    state: watch::Sender<ShopState>,
}

impl<A: ShopApi + ?Sized> ShopStore<A> {
    /// Create a signed-out store with an empty catalog.
    #[must_use]
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            state: watch::Sender::new(ShopState::default()),
        }
    }

    /// The backend this store syncs with.
    #[must_use]
    pub const fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Watch the mirror for changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ShopState> {
        self.state.subscribe()
    }

    /// A copy of the current mirror.
    #[must_use]
    pub fn snapshot(&self) -> ShopState {
        self.state.borrow().clone()
    }

    fn read<R>(&self, f: impl FnOnce(&ShopState) -> R) -> R {
        f(&self.state.borrow())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[must_use]
    pub fn cart(&self) -> Vec<CartLine> {
        self.read(|s| s.cart().to_vec())
    }

    #[must_use]
    pub fn wishlist(&self) -> Vec<WishlistEntry> {
        self.read(|s| s.wishlist().to_vec())
    }

    #[must_use]
    pub fn session(&self) -> Option<Arc<Session>> {
        self.read(|s| s.session().cloned())
    }

    #[must_use]
    pub fn get_product_stock(&self, product_id: ProductId) -> u32 {
        self.read(|s| s.get_product_stock(product_id))
    }

    #[must_use]
    pub fn get_cart_quantity(&self, product_id: ProductId) -> u32 {
        self.read(|s| s.get_cart_quantity(product_id))
    }

    #[must_use]
    pub fn is_out_of_stock(&self, product_id: ProductId) -> bool {
        self.read(|s| s.is_out_of_stock(product_id))
    }

    #[must_use]
    pub fn headroom(&self, product_id: ProductId) -> u32 {
        self.read(|s| s.headroom(product_id))
    }

    #[must_use]
    pub fn is_in_wishlist(&self, product_id: ProductId) -> bool {
        self.read(|s| s.is_in_wishlist(product_id))
    }

    #[must_use]
    pub fn is_in_cart(&self, product_id: ProductId) -> bool {
        self.read(|s| s.is_in_cart(product_id))
    }

    #[must_use]
    pub fn cart_subtotal(&self) -> Price {
        self.read(ShopState::cart_subtotal)
    }

    #[must_use]
    pub fn cart_item_count(&self) -> u32 {
        self.read(ShopState::cart_item_count)
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Start a session: empty the mirror, then load cart and wishlist.
    ///
    /// Load failures are logged and leave the mirror empty.
    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    pub async fn sign_in(&self, session: Session) -> MutationOutcome {
        let session = Arc::new(session);
        telemetry::set_sentry_user(&session);
        self.state
            .send_modify(|state| state.begin_session(Some(Arc::clone(&session))));
        info!("Signed in; loading cart and wishlist");
        self.reload().await
    }

    /// End the session. The mirror is empty when this returns, and any
    /// request still in flight will have its result discarded.
    pub fn sign_out(&self) {
        self.state.send_modify(|state| state.begin_session(None));
        telemetry::clear_sentry_user();
        info!("Signed out; cart and wishlist cleared");
    }

    /// Reload cart and wishlist from the backend.
    #[instrument(skip(self))]
    pub async fn reload(&self) -> MutationOutcome {
        let Some((session, epoch)) = self.current_session() else {
            return skipped("reload", SkipReason::NotSignedIn);
        };

        let (cart, wishlist) = tokio::join!(
            self.api.load_cart(&session),
            self.api.load_wishlist(&session)
        );

        let mut failed = false;
        let outcome = self.commit(epoch, |state| {
            state.finish_loading();
            match cart {
                Ok(lines) => state.replace_cart(lines),
                Err(e) => {
                    error!(error = %e, "Failed to load cart");
                    failed = true;
                }
            }
            match wishlist {
                Ok(entries) => state.replace_wishlist(entries),
                Err(e) => {
                    error!(error = %e, "Failed to load wishlist");
                    failed = true;
                }
            }
        });

        if failed && outcome.is_confirmed() {
            MutationOutcome::Failed
        } else {
            outcome
        }
    }

    /// Load the unfiltered catalog into the stock cache.
    #[instrument(skip(self))]
    pub async fn refresh_products(&self) -> MutationOutcome {
        match self.api.list_products(&ProductFilter::default()).await {
            Ok(products) => {
                debug!(count = products.len(), "Catalog refreshed");
                self.state.send_modify(|state| state.replace_catalog(products));
                MutationOutcome::Confirmed
            }
            Err(e) => {
                error!(error = %e, "Failed to load product catalog");
                MutationOutcome::Failed
            }
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add one unit of `product` to the cart.
    ///
    /// Stock is not checked here; the backend has the final say.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_cart(&self, product: &Product) -> MutationOutcome {
        const OP: &str = "add_to_cart";
        let (flight, ()) = match self.begin(|state| Ok((state.add_unit(product), ()))) {
            Ok(begun) => begun,
            Err(reason) => return skipped(OP, reason),
        };

        let result = self.api.cart_add(&flight.session, product.id).await;
        let outcome = self.settle(OP, flight, result, |state, line, interleaved| {
            state.adopt_server_line(line, !interleaved);
        });
        telemetry::shop_breadcrumb("cart", OP, outcome, &[("product_id", product.id.to_string())]);
        outcome
    }

    /// Add one unit to a line, unless the cart already holds all known stock.
    #[instrument(skip(self))]
    pub async fn increase_quantity(&self, line_id: CartLineId) -> MutationOutcome {
        const OP: &str = "increase_quantity";
        let (flight, line) = match self.begin(|state| state.raise_quantity(line_id)) {
            Ok(begun) => begun,
            Err(reason) => return skipped(OP, reason),
        };

        // An unconfirmed line has no server id; the backend's add increments
        let result = match line.id.remote() {
            Some(remote) => self
                .api
                .cart_update_quantity(&flight.session, remote, QuantityChange::SetTo(line.quantity))
                .await
                .map(|()| None),
            None => self
                .api
                .cart_add(&flight.session, line.product_id())
                .await
                .map(Some),
        };
        let outcome = self.settle(OP, flight, result, |state, server_line, interleaved| {
            if let Some(server_line) = server_line {
                state.adopt_server_line(server_line, !interleaved);
            }
        });
        telemetry::shop_breadcrumb("cart", OP, outcome, &[("line_id", line_id.to_string())]);
        outcome
    }

    /// Take one unit off a line. A line at quantity 1 is left as is.
    #[instrument(skip(self))]
    pub async fn decrease_quantity(&self, line_id: CartLineId) -> MutationOutcome {
        const OP: &str = "decrease_quantity";
        let (flight, remote) = match self.begin(|state| state.lower_quantity(line_id)) {
            Ok(begun) => begun,
            Err(reason) => return skipped(OP, reason),
        };

        let result = self
            .api
            .cart_update_quantity(&flight.session, remote, QuantityChange::Decrease)
            .await;
        let outcome = self.settle(OP, flight, result, |_, (), _| {});
        telemetry::shop_breadcrumb("cart", OP, outcome, &[("line_id", line_id.to_string())]);
        outcome
    }

    /// Remove a line from the cart.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, line_id: CartLineId) -> MutationOutcome {
        const OP: &str = "remove_from_cart";
        let (flight, remote) = match self.begin(|state| state.remove_line(line_id)) {
            Ok(begun) => begun,
            Err(reason) => return skipped(OP, reason),
        };

        let result = self.api.cart_remove(&flight.session, remote).await;
        let outcome = self.settle(OP, flight, result, |_, (), _| {});
        telemetry::shop_breadcrumb("cart", OP, outcome, &[("line_id", line_id.to_string())]);
        outcome
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Flip wishlist membership for a product.
    #[instrument(skip(self))]
    pub async fn toggle_wishlist(&self, product_id: ProductId) -> MutationOutcome {
        const OP: &str = "toggle_wishlist";
        let (flight, member) = match self.begin(|state| Ok(state.toggle_wishlist(product_id))) {
            Ok(begun) => begun,
            Err(reason) => return skipped(OP, reason),
        };

        let result = self.api.wishlist_toggle(&flight.session, product_id).await;
        let outcome = self.settle(OP, flight, result, |state, toggle, interleaved| {
            if toggle.is_member() != member {
                warn!(
                    %product_id,
                    member = toggle.is_member(),
                    "Backend wishlist membership differs from local state"
                );
            }
            if !interleaved {
                state.set_wishlisted(product_id, toggle.is_member());
            }
        });
        telemetry::shop_breadcrumb(
            "wishlist",
            OP,
            outcome,
            &[("product_id", product_id.to_string())],
        );
        outcome
    }

    /// Remove a product from the wishlist once the backend confirms it.
    ///
    /// The mirror is not changed until the backend answers.
    #[instrument(skip(self))]
    pub async fn remove_from_wishlist(&self, product_id: ProductId) -> MutationOutcome {
        const OP: &str = "remove_from_wishlist";
        let Some((session, epoch)) = self.current_session() else {
            return skipped(OP, SkipReason::NotSignedIn);
        };

        let outcome = self.remove_confirmed(&session, epoch, product_id).await;
        telemetry::shop_breadcrumb(
            "wishlist",
            OP,
            outcome,
            &[("product_id", product_id.to_string())],
        );
        outcome
    }

    /// Move a wishlisted product into the cart.
    ///
    /// Runs add, wishlist removal, cart reload, and catalog refresh in order.
    /// Stops at the first failure; steps already done stay done.
    #[instrument(skip(self))]
    pub async fn add_to_cart_from_wishlist(&self, product_id: ProductId) -> MutationOutcome {
        const OP: &str = "add_to_cart_from_wishlist";
        let Some((session, epoch)) = self.current_session() else {
            return skipped(OP, SkipReason::NotSignedIn);
        };

        let outcome = self.move_to_cart(&session, epoch, product_id).await;
        telemetry::shop_breadcrumb(
            "wishlist",
            OP,
            outcome,
            &[("product_id", product_id.to_string())],
        );
        outcome
    }

    async fn move_to_cart(
        &self,
        session: &Session,
        epoch: u64,
        product_id: ProductId,
    ) -> MutationOutcome {
        let line = match self.api.cart_add(session, product_id).await {
            Ok(line) => line,
            Err(e) => {
                warn!(step = "cart_add", error = %e, "Move to cart failed");
                return MutationOutcome::Failed;
            }
        };
        if self.commit(epoch, |state| state.upsert_server_line(line)) == MutationOutcome::Discarded {
            return MutationOutcome::Discarded;
        }

        match self.remove_confirmed(session, epoch, product_id).await {
            MutationOutcome::Confirmed | MutationOutcome::Skipped(_) => {}
            outcome => return outcome,
        }

        match self.api.load_cart(session).await {
            Ok(lines) => {
                if self.commit(epoch, |state| state.replace_cart(lines))
                    == MutationOutcome::Discarded
                {
                    return MutationOutcome::Discarded;
                }
            }
            Err(e) => {
                warn!(step = "load_cart", error = %e, "Move to cart failed");
                return MutationOutcome::Failed;
            }
        }

        // Stock changed on the backend; skip the catalog cache
        self.api.invalidate_catalog().await;
        self.refresh_products().await
    }

    async fn remove_confirmed(
        &self,
        session: &Session,
        epoch: u64,
        product_id: ProductId,
    ) -> MutationOutcome {
        // Toggling an absent product would add it
        if !self.read(|s| s.is_in_wishlist(product_id)) {
            return skipped("remove_from_wishlist", SkipReason::NotInWishlist);
        }

        match self.api.wishlist_toggle(session, product_id).await {
            Ok(toggle) => {
                if toggle.is_member() {
                    warn!(%product_id, "Backend kept product wishlisted after removal");
                }
                self.commit(epoch, |state| {
                    state.set_wishlisted(product_id, toggle.is_member());
                })
            }
            Err(e) => {
                warn!(op = "remove_from_wishlist", error = %e, "Remote sync failed");
                MutationOutcome::Failed
            }
        }
    }

    // =========================================================================
    // Mutation machinery
    // =========================================================================

    fn current_session(&self) -> Option<(Arc<Session>, u64)> {
        self.read(|s| s.session().map(|session| (Arc::clone(session), s.epoch())))
    }

    /// Apply an optimistic change and capture what is needed to undo it.
    fn begin<T>(
        &self,
        apply: impl FnOnce(&mut ShopState) -> Result<(Undo, T), SkipReason>,
    ) -> Result<(InFlight, T), SkipReason> {
        let mut begun = Err(SkipReason::NotSignedIn);
        self.state.send_if_modified(|state| {
            let Some(session) = state.session().cloned() else {
                return false;
            };
            let before = state.snapshot();
            match apply(state) {
                Ok((undo, value)) => {
                    let flight = InFlight {
                        session,
                        epoch: state.epoch(),
                        version: state.version(),
                        before,
                        undo,
                    };
                    begun = Ok((flight, value));
                    true
                }
                Err(reason) => {
                    begun = Err(reason);
                    false
                }
            }
        });
        begun
    }

    /// Confirm or roll back an optimistic change once the backend answers.
    ///
    /// `confirm` is told whether other changes landed while the call was out.
    fn settle<T>(
        &self,
        op: &'static str,
        flight: InFlight,
        result: Result<T, ApiError>,
        confirm: impl FnOnce(&mut ShopState, T, bool),
    ) -> MutationOutcome {
        match result {
            Ok(value) => {
                let version = flight.version;
                self.commit(flight.epoch, |state| {
                    let interleaved = state.version() != version;
                    confirm(state, value, interleaved);
                })
            }
            Err(e) => {
                warn!(op, error = %e, "Remote sync failed; rolling back");
                self.rollback(flight)
            }
        }
    }

    /// Apply a change if the session that requested it is still current.
    fn commit(&self, epoch: u64, apply: impl FnOnce(&mut ShopState)) -> MutationOutcome {
        let mut outcome = MutationOutcome::Confirmed;
        self.state.send_if_modified(|state| {
            if state.epoch() != epoch {
                outcome = MutationOutcome::Discarded;
                return false;
            }
            let version = state.version();
            apply(state);
            state.version() != version
        });
        if outcome == MutationOutcome::Discarded {
            debug!("Session changed while request was in flight; result discarded");
        }
        outcome
    }

    fn rollback(&self, flight: InFlight) -> MutationOutcome {
        let InFlight {
            epoch,
            version,
            before,
            undo,
            ..
        } = flight;

        let mut outcome = MutationOutcome::RolledBack;
        self.state.send_if_modified(|state| {
            if state.epoch() != epoch {
                outcome = MutationOutcome::Discarded;
                return false;
            }
            if state.version() == version {
                state.restore(before);
            } else {
                state.undo(undo);
            }
            true
        });
        outcome
    }
}

fn skipped(op: &'static str, reason: SkipReason) -> MutationOutcome {
    match reason {
        SkipReason::NotSignedIn | SkipReason::AwaitingConfirmation => {
            warn!(op, %reason, "Operation skipped");
        }
        _ => debug!(op, %reason, "Operation skipped"),
    }
    MutationOutcome::Skipped(reason)
}
