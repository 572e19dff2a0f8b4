//! Integration test support for the Brightique storefront client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p brightique-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `shop_store` - `ShopStore` against an in-memory [`FakeBackend`]
//! - `api_client` - `BrightiqueClient` against a local axum stub server
//!
//! The fake backend keeps its own cart and wishlist, so tests can compare the
//! store's mirror with what the "server" holds. Individual operations can be
//! made to fail, and [`FakeBackend::hold`] parks every call until
//! [`FakeBackend::release`] so tests can act while requests are in flight.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;
use tokio::sync::watch;

use brightique_core::{
    CartLine, CartLineId, LineId, Price, Product, ProductFilter, ProductId, ProductOrdering,
    QuantityChange, UserId, WishlistEntry, WishlistToggle,
};
use brightique_storefront::api::{ApiError, CartApi, CatalogApi, WishlistApi};
use brightique_storefront::models::{Session, User};

/// Backend operations, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    LoadCart,
    LoadWishlist,
    CartAdd,
    CartUpdate,
    CartRemove,
    WishlistToggle,
    ListProducts,
    GetProduct,
    InvalidateCatalog,
}

#[derive(Debug, Default)]
struct ServerState {
    products: Vec<Product>,
    /// (line id, product, quantity) in insertion order
    cart: Vec<(LineId, ProductId, u32)>,
    wishlist: Vec<ProductId>,
    next_line: i64,
    failing: HashSet<Op>,
    calls: HashMap<Op, usize>,
    updates: Vec<(LineId, QuantityChange)>,
    /// Latency applied to calls entering from now on
    latency: Duration,
}

/// In-memory stand-in for the Brightique backend.
pub struct FakeBackend {
    state: Mutex<ServerState>,
    gate: watch::Sender<bool>,
}

impl FakeBackend {
    /// A backend selling `products` with an empty cart and wishlist.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            state: Mutex::new(ServerState {
                products,
                next_line: 100,
                ..ServerState::default()
            }),
            gate: watch::Sender::new(true),
        }
    }

    /// Seed the server cart.
    #[must_use]
    pub fn with_cart(self, lines: &[(i64, u32)]) -> Self {
        {
            let mut state = self.lock();
            for &(product_id, quantity) in lines {
                let line_id = LineId::new(state.next_line);
                state.next_line += 1;
                state.cart.push((line_id, ProductId::new(product_id), quantity));
            }
        }
        self
    }

    /// Seed the server wishlist.
    #[must_use]
    pub fn with_wishlist(self, product_ids: &[i64]) -> Self {
        self.lock()
            .wishlist
            .extend(product_ids.iter().copied().map(ProductId::new));
        self
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every call to `op` fail with a 500.
    pub fn fail(&self, op: Op) {
        self.lock().failing.insert(op);
    }

    /// Undo [`FakeBackend::fail`].
    pub fn recover(&self, op: Op) {
        self.lock().failing.remove(&op);
    }

    /// Delay every call that starts after this by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Park every call after it has been counted.
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    /// Let parked and future calls through.
    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Number of calls made to `op`, including held and failed ones.
    #[must_use]
    pub fn calls(&self, op: Op) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Wait until `op` has been called at least `count` times.
    ///
    /// Returns `false` if that does not happen within a second.
    pub async fn wait_for_calls(&self, op: Op, count: usize) -> bool {
        tokio::time::timeout(Duration::from_secs(1), async {
            while self.calls(op) < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .is_ok()
    }

    /// Server cart as (line id, product id, quantity).
    #[must_use]
    pub fn server_cart(&self) -> Vec<(LineId, ProductId, u32)> {
        self.lock().cart.clone()
    }

    #[must_use]
    pub fn server_wishlist(&self) -> Vec<ProductId> {
        self.lock().wishlist.clone()
    }

    /// Every quantity update received, oldest first.
    #[must_use]
    pub fn quantity_updates(&self) -> Vec<(LineId, QuantityChange)> {
        self.lock().updates.clone()
    }

    /// Change a product's stock on the server.
    pub fn set_stock(&self, product_id: i64, stock: u32) {
        let mut state = self.lock();
        if let Some(product) = state
            .products
            .iter_mut()
            .find(|p| p.id == ProductId::new(product_id))
        {
            product.stock = stock;
        }
    }

    /// Count the call, wait out latency and the gate, then check for
    /// injected failure.
    async fn enter(&self, op: Op) -> Result<(), ApiError> {
        let latency = {
            let mut state = self.lock();
            *state.calls.entry(op).or_insert(0) += 1;
            state.latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut gate = self.gate.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = gate.wait_for(|open| *open).await;

        if self.lock().failing.contains(&op) {
            return Err(ApiError::Status {
                status: 500,
                message: format!("injected failure for {op:?}"),
            });
        }
        Ok(())
    }
}

impl ServerState {
    fn product(&self, product_id: ProductId) -> Result<Product, ApiError> {
        self.products
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("product {product_id}")))
    }

    fn line(&self, line_id: LineId, product_id: ProductId, quantity: u32) -> Result<CartLine, ApiError> {
        Ok(CartLine {
            id: CartLineId::Remote(line_id),
            product: self.product(product_id)?,
            quantity,
        })
    }
}

#[async_trait]
impl CartApi for FakeBackend {
    async fn load_cart(&self, _session: &Session) -> Result<Vec<CartLine>, ApiError> {
        self.enter(Op::LoadCart).await?;
        let state = self.lock();
        state
            .cart
            .iter()
            .map(|&(line_id, product_id, quantity)| state.line(line_id, product_id, quantity))
            .collect()
    }

    async fn cart_add(&self, _session: &Session, product_id: ProductId) -> Result<CartLine, ApiError> {
        self.enter(Op::CartAdd).await?;
        let mut state = self.lock();
        let product = state.product(product_id)?;

        let existing = state.cart.iter().position(|(_, id, _)| *id == product_id);
        let quantity = existing
            .and_then(|index| state.cart.get(index))
            .map_or(0, |(_, _, quantity)| *quantity)
            + 1;
        if quantity > product.stock {
            return Err(ApiError::Status {
                status: 400,
                message: "Not enough stock".to_string(),
            });
        }

        let line_id = match existing.and_then(|index| state.cart.get_mut(index)) {
            Some(line) => {
                line.2 = quantity;
                line.0
            }
            None => {
                let line_id = LineId::new(state.next_line);
                state.next_line += 1;
                state.cart.push((line_id, product_id, quantity));
                line_id
            }
        };
        state.line(line_id, product_id, quantity)
    }

    async fn cart_update_quantity(
        &self,
        _session: &Session,
        line_id: LineId,
        change: QuantityChange,
    ) -> Result<(), ApiError> {
        self.enter(Op::CartUpdate).await?;
        let mut state = self.lock();
        let line = state
            .cart
            .iter_mut()
            .find(|(id, _, _)| *id == line_id)
            .ok_or_else(|| ApiError::NotFound(format!("cart line {line_id}")))?;
        line.2 = change.apply(line.2);
        state.updates.push((line_id, change));
        Ok(())
    }

    async fn cart_remove(&self, _session: &Session, line_id: LineId) -> Result<(), ApiError> {
        self.enter(Op::CartRemove).await?;
        let mut state = self.lock();
        let before = state.cart.len();
        state.cart.retain(|(id, _, _)| *id != line_id);
        if state.cart.len() == before {
            return Err(ApiError::NotFound(format!("cart line {line_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl WishlistApi for FakeBackend {
    async fn load_wishlist(&self, _session: &Session) -> Result<Vec<WishlistEntry>, ApiError> {
        self.enter(Op::LoadWishlist).await?;
        let state = self.lock();
        state
            .wishlist
            .iter()
            .map(|&product_id| state.product(product_id).map(WishlistEntry::from))
            .collect()
    }

    async fn wishlist_toggle(
        &self,
        _session: &Session,
        product_id: ProductId,
    ) -> Result<WishlistToggle, ApiError> {
        self.enter(Op::WishlistToggle).await?;
        let mut state = self.lock();
        state.product(product_id)?;

        let removed = state.wishlist.contains(&product_id);
        if removed {
            state.wishlist.retain(|id| *id != product_id);
        } else {
            state.wishlist.push(product_id);
        }
        Ok(WishlistToggle { removed })
    }
}

#[async_trait]
impl CatalogApi for FakeBackend {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ApiError> {
        self.enter(Op::ListProducts).await?;
        let state = self.lock();

        let search = filter.search.as_deref().map(str::to_lowercase);
        let mut products: Vec<Product> = state
            .products
            .iter()
            .filter(|p| {
                search
                    .as_deref()
                    .is_none_or(|s| p.name.to_lowercase().contains(s))
            })
            .filter(|p| {
                filter
                    .category
                    .as_deref()
                    .is_none_or(|c| p.category.as_deref() == Some(c))
            })
            .cloned()
            .collect();

        match filter.ordering {
            Some(ProductOrdering::PriceLowToHigh) => {
                products.sort_by(|a, b| a.price.amount.cmp(&b.price.amount));
            }
            Some(ProductOrdering::PriceHighToLow) => {
                products.sort_by(|a, b| b.price.amount.cmp(&a.price.amount));
            }
            None => {}
        }
        Ok(products)
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Product, ApiError> {
        self.enter(Op::GetProduct).await?;
        self.lock().product(product_id)
    }

    async fn invalidate_catalog(&self) {
        *self.lock().calls.entry(Op::InvalidateCatalog).or_insert(0) += 1;
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A catalog product priced in whole rupees.
#[must_use]
pub fn product(id: i64, name: &str, rupees: i64, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        price: Price::inr(Decimal::new(rupees, 0)),
        stock,
        category: Some("Pendants".to_string()),
        image: Some(format!("https://cdn.brightique.in/products/{id}.jpg")),
        description: None,
        size: None,
        warranty: None,
        material: None,
    }
}

/// A small catalog: a plentiful lamp, a scarce lamp, and a sold-out one.
#[must_use]
pub fn catalog() -> Vec<Product> {
    vec![
        product(1, "Aurora Pendant", 4_500, 10),
        product(2, "Halo Sconce", 3_200, 2),
        product(3, "Orbit Floor Lamp", 12_999, 0),
    ]
}

/// A signed-in session for `user_id`.
#[must_use]
pub fn session(user_id: i64) -> Session {
    Session::new(
        User {
            id: UserId::new(user_id),
            name: format!("Shopper {user_id}"),
            email: format!("shopper{user_id}@brightique.in"),
            is_admin: false,
        },
        SecretString::from(format!("bq_live_7Hn2Xq9LmP4vRt8K{user_id}")),
    )
}
