//! Integration tests for the cart and wishlist store.
//!
//! These run `ShopStore` against the in-memory `FakeBackend` and compare the
//! client mirror with the server state after each operation.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use brightique_core::{CartLineId, LineId, ProductId, QuantityChange};
use brightique_integration_tests::{FakeBackend, Op, catalog, product, session};
use brightique_storefront::shop::{MutationOutcome, ShopStore, SkipReason};

type Store = ShopStore<FakeBackend>;

fn pid(id: i64) -> ProductId {
    ProductId::new(id)
}

fn line(id: i64) -> CartLineId {
    CartLineId::Remote(LineId::new(id))
}

/// Store with the catalog loaded and user 1 signed in.
async fn signed_in(backend: FakeBackend) -> (Arc<FakeBackend>, Arc<Store>) {
    let backend = Arc::new(backend);
    let store = Arc::new(ShopStore::new(Arc::clone(&backend)));
    assert_eq!(store.refresh_products().await, MutationOutcome::Confirmed);
    assert_eq!(store.sign_in(session(1)).await, MutationOutcome::Confirmed);
    (backend, store)
}

fn catalog_product(store: &Store, id: i64) -> brightique_core::Product {
    store.snapshot().catalog_product(pid(id)).cloned().unwrap()
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[tokio::test]
async fn test_sign_in_loads_cart_and_wishlist() {
    let (_, store) = signed_in(
        FakeBackend::new(catalog())
            .with_cart(&[(1, 2)])
            .with_wishlist(&[2]),
    )
    .await;

    assert_eq!(store.get_cart_quantity(pid(1)), 2);
    assert!(store.is_in_wishlist(pid(2)));
    assert!(!store.snapshot().is_loading());
}

#[tokio::test]
async fn test_load_failure_leaves_cart_empty() {
    let backend = Arc::new(FakeBackend::new(catalog()).with_cart(&[(1, 2)]).with_wishlist(&[2]));
    backend.fail(Op::LoadCart);
    let store = ShopStore::new(Arc::clone(&backend));

    assert_eq!(store.sign_in(session(1)).await, MutationOutcome::Failed);

    assert!(store.cart().is_empty());
    assert!(store.is_in_wishlist(pid(2)));
    assert!(!store.snapshot().is_loading());
}

#[tokio::test]
async fn test_not_signed_in_skips_without_remote_call() {
    let backend = Arc::new(FakeBackend::new(catalog()));
    let store = ShopStore::new(Arc::clone(&backend));
    store.refresh_products().await;

    let outcome = store.add_to_cart(&catalog_product(&store, 1)).await;

    assert_eq!(outcome, MutationOutcome::Skipped(SkipReason::NotSignedIn));
    assert_eq!(backend.calls(Op::CartAdd), 0);
    assert!(store.cart().is_empty());
}

#[tokio::test]
async fn test_sign_out_clears_mirror_with_request_in_flight() {
    let (backend, store) = signed_in(
        FakeBackend::new(catalog())
            .with_cart(&[(1, 1)])
            .with_wishlist(&[2]),
    )
    .await;
    let lamp = catalog_product(&store, 1);

    backend.hold();
    let task = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.add_to_cart(&lamp).await }
    });
    assert!(backend.wait_for_calls(Op::CartAdd, 1).await);
    assert_eq!(store.get_cart_quantity(pid(1)), 2);

    store.sign_out();

    // Empty before the in-flight request resolves
    assert!(store.cart().is_empty());
    assert!(store.wishlist().is_empty());
    assert!(store.session().is_none());

    backend.release();
    assert_eq!(task.await.unwrap(), MutationOutcome::Discarded);
    assert!(store.cart().is_empty());
}

#[tokio::test]
async fn test_stale_load_after_sign_out_is_discarded() {
    let backend = Arc::new(FakeBackend::new(catalog()).with_cart(&[(1, 1)]));
    let store = Arc::new(ShopStore::new(Arc::clone(&backend)));

    backend.hold();
    let task = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.sign_in(session(1)).await }
    });
    assert!(backend.wait_for_calls(Op::LoadCart, 1).await);
    assert!(store.snapshot().is_loading());

    store.sign_out();
    backend.release();

    assert_eq!(task.await.unwrap(), MutationOutcome::Discarded);
    assert!(store.cart().is_empty());
    assert!(!store.snapshot().is_loading());
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_repeated_add_yields_one_line() {
    let (backend, store) = signed_in(FakeBackend::new(catalog())).await;
    let lamp = catalog_product(&store, 1);

    for _ in 0..3 {
        assert_eq!(store.add_to_cart(&lamp).await, MutationOutcome::Confirmed);
    }

    let cart = store.cart();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].quantity, 3);
    assert!(!cart[0].id.is_pending());
    assert_eq!(backend.server_cart(), vec![(LineId::new(100), pid(1), 3)]);
}

#[tokio::test]
async fn test_add_does_not_check_stock_locally() {
    let (backend, store) = signed_in(FakeBackend::new(catalog())).await;

    // Sold out: the backend refuses and the store rolls back
    let outcome = store.add_to_cart(&catalog_product(&store, 3)).await;

    assert_eq!(outcome, MutationOutcome::RolledBack);
    assert_eq!(backend.calls(Op::CartAdd), 1);
    assert!(store.cart().is_empty());
}

#[tokio::test]
async fn test_failed_add_rolls_back() {
    let (backend, store) = signed_in(FakeBackend::new(catalog()).with_cart(&[(1, 2)])).await;
    backend.fail(Op::CartAdd);

    let lamp = catalog_product(&store, 1);
    assert_eq!(store.add_to_cart(&lamp).await, MutationOutcome::RolledBack);
    assert_eq!(store.get_cart_quantity(pid(1)), 2);

    let sconce = catalog_product(&store, 2);
    assert_eq!(store.add_to_cart(&sconce).await, MutationOutcome::RolledBack);
    assert!(!store.is_in_cart(pid(2)));

    backend.recover(Op::CartAdd);
    assert_eq!(store.add_to_cart(&sconce).await, MutationOutcome::Confirmed);
    assert_eq!(store.get_cart_quantity(pid(2)), 1);
}

/// Two adds of a product not yet in the cart, failing in the given order.
async fn fail_two_adds(first_latency: u64, second_latency: u64) -> Arc<Store> {
    let (backend, store) = signed_in(FakeBackend::new(catalog())).await;
    let lamp = catalog_product(&store, 1);
    backend.fail(Op::CartAdd);

    backend.set_latency(Duration::from_millis(first_latency));
    let first = tokio::spawn({
        let store = Arc::clone(&store);
        let lamp = lamp.clone();
        async move { store.add_to_cart(&lamp).await }
    });
    assert!(backend.wait_for_calls(Op::CartAdd, 1).await);

    backend.set_latency(Duration::from_millis(second_latency));
    let second = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.add_to_cart(&lamp).await }
    });
    assert!(backend.wait_for_calls(Op::CartAdd, 2).await);
    assert_eq!(store.get_cart_quantity(pid(1)), 2);

    assert_eq!(first.await.unwrap(), MutationOutcome::RolledBack);
    assert_eq!(second.await.unwrap(), MutationOutcome::RolledBack);
    store
}

#[tokio::test]
async fn test_failed_concurrent_adds_leave_no_line_when_first_fails_first() {
    let store = fail_two_adds(50, 250).await;
    assert!(store.cart().is_empty());
}

#[tokio::test]
async fn test_failed_concurrent_adds_leave_no_line_when_second_fails_first() {
    let store = fail_two_adds(250, 50).await;
    assert!(store.cart().is_empty());
}

#[tokio::test]
async fn test_increase_sends_absolute_quantity() {
    let (backend, store) = signed_in(FakeBackend::new(catalog()).with_cart(&[(1, 1)])).await;

    assert_eq!(
        store.increase_quantity(line(100)).await,
        MutationOutcome::Confirmed
    );

    assert_eq!(store.get_cart_quantity(pid(1)), 2);
    assert_eq!(
        backend.quantity_updates(),
        vec![(LineId::new(100), QuantityChange::SetTo(2))]
    );
    assert_eq!(backend.server_cart()[0].2, 2);
}

#[tokio::test]
async fn test_increase_at_stock_ceiling_is_noop() {
    // Halo Sconce has stock 2
    let (backend, store) = signed_in(FakeBackend::new(catalog()).with_cart(&[(2, 2)])).await;

    assert_eq!(
        store.increase_quantity(line(100)).await,
        MutationOutcome::Skipped(SkipReason::AtStockLimit)
    );
    assert_eq!(store.get_cart_quantity(pid(2)), 2);
    assert_eq!(backend.calls(Op::CartUpdate), 0);
}

#[tokio::test]
async fn test_decrease_never_goes_below_one() {
    let (backend, store) = signed_in(FakeBackend::new(catalog()).with_cart(&[(1, 2)])).await;

    assert_eq!(
        store.decrease_quantity(line(100)).await,
        MutationOutcome::Confirmed
    );
    assert_eq!(
        store.decrease_quantity(line(100)).await,
        MutationOutcome::Skipped(SkipReason::AtMinimum)
    );

    assert_eq!(store.get_cart_quantity(pid(1)), 1);
    assert!(store.is_in_cart(pid(1)));
    assert_eq!(
        backend.quantity_updates(),
        vec![(LineId::new(100), QuantityChange::Decrease)]
    );
}

#[tokio::test]
async fn test_failed_quantity_changes_roll_back() {
    let (backend, store) = signed_in(FakeBackend::new(catalog()).with_cart(&[(1, 2)])).await;
    backend.fail(Op::CartUpdate);

    assert_eq!(
        store.increase_quantity(line(100)).await,
        MutationOutcome::RolledBack
    );
    assert_eq!(store.get_cart_quantity(pid(1)), 2);

    assert_eq!(
        store.decrease_quantity(line(100)).await,
        MutationOutcome::RolledBack
    );
    assert_eq!(store.get_cart_quantity(pid(1)), 2);
}

#[tokio::test]
async fn test_remove_from_cart() {
    let (backend, store) = signed_in(FakeBackend::new(catalog()).with_cart(&[(1, 1), (2, 1)])).await;

    assert_eq!(
        store.remove_from_cart(line(100)).await,
        MutationOutcome::Confirmed
    );

    assert!(!store.is_in_cart(pid(1)));
    assert_eq!(backend.server_cart(), vec![(LineId::new(101), pid(2), 1)]);
}

#[tokio::test]
async fn test_failed_remove_restores_prior_cart() {
    let (backend, store) = signed_in(
        FakeBackend::new(catalog()).with_cart(&[(1, 1), (2, 2), (3, 1)]),
    )
    .await;
    backend.fail(Op::CartRemove);
    let before = store.cart();

    assert_eq!(
        store.remove_from_cart(line(101)).await,
        MutationOutcome::RolledBack
    );

    assert_eq!(store.cart(), before);
}

#[tokio::test]
async fn test_unknown_line_is_skipped() {
    let (backend, store) = signed_in(FakeBackend::new(catalog())).await;

    assert_eq!(
        store.remove_from_cart(line(999)).await,
        MutationOutcome::Skipped(SkipReason::NotInCart)
    );
    assert_eq!(backend.calls(Op::CartRemove), 0);
}

#[tokio::test]
async fn test_interleaved_rollback_keeps_other_changes() {
    let (backend, store) = signed_in(FakeBackend::new(catalog()).with_cart(&[(1, 1), (2, 1)])).await;
    let sconce = catalog_product(&store, 2);
    backend.fail(Op::CartRemove);
    backend.hold();

    let remove = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.remove_from_cart(line(100)).await }
    });
    assert!(backend.wait_for_calls(Op::CartRemove, 1).await);

    let add = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.add_to_cart(&sconce).await }
    });
    assert!(backend.wait_for_calls(Op::CartAdd, 1).await);

    backend.release();
    assert_eq!(remove.await.unwrap(), MutationOutcome::RolledBack);
    assert_eq!(add.await.unwrap(), MutationOutcome::Confirmed);

    // The removed line is back in place and the add survived
    let cart = store.cart();
    assert_eq!(cart.len(), 2);
    assert_eq!(cart[0].id, line(100));
    assert_eq!(cart[0].quantity, 1);
    assert_eq!(cart[1].id, line(101));
    assert_eq!(cart[1].quantity, 2);
}

#[tokio::test]
async fn test_pending_line_increase_is_sent_as_add() {
    let (backend, store) = signed_in(FakeBackend::new(catalog())).await;
    let lamp = catalog_product(&store, 1);
    backend.hold();

    let add = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.add_to_cart(&lamp).await }
    });
    assert!(backend.wait_for_calls(Op::CartAdd, 1).await);

    let pending = store.cart()[0].id;
    assert!(pending.is_pending());

    // No server id yet: decrease and remove have nothing to address
    assert_eq!(
        store.remove_from_cart(pending).await,
        MutationOutcome::Skipped(SkipReason::AwaitingConfirmation)
    );

    let increase = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.increase_quantity(pending).await }
    });
    assert!(backend.wait_for_calls(Op::CartAdd, 2).await);

    backend.release();
    assert_eq!(add.await.unwrap(), MutationOutcome::Confirmed);
    assert_eq!(increase.await.unwrap(), MutationOutcome::Confirmed);

    let cart = store.cart();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].id, line(100));
    assert_eq!(cart[0].quantity, 2);
    assert_eq!(backend.calls(Op::CartUpdate), 0);
    assert_eq!(backend.server_cart(), vec![(LineId::new(100), pid(1), 2)]);
}

#[tokio::test]
async fn test_pending_line_decrease_is_skipped() {
    let (backend, store) = signed_in(FakeBackend::new(catalog())).await;
    let lamp = catalog_product(&store, 1);
    backend.hold();

    let first = tokio::spawn({
        let store = Arc::clone(&store);
        let lamp = lamp.clone();
        async move { store.add_to_cart(&lamp).await }
    });
    let second = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.add_to_cart(&lamp).await }
    });
    assert!(backend.wait_for_calls(Op::CartAdd, 2).await);

    let pending = store.cart()[0].id;
    assert_eq!(store.get_cart_quantity(pid(1)), 2);
    assert_eq!(
        store.decrease_quantity(pending).await,
        MutationOutcome::Skipped(SkipReason::AwaitingConfirmation)
    );

    backend.release();
    assert_eq!(first.await.unwrap(), MutationOutcome::Confirmed);
    assert_eq!(second.await.unwrap(), MutationOutcome::Confirmed);
    assert_eq!(store.get_cart_quantity(pid(1)), 2);
    assert_eq!(backend.calls(Op::CartUpdate), 0);
}

// =============================================================================
// Derived queries
// =============================================================================

#[tokio::test]
async fn test_out_of_stock_uses_cart_quantity_against_stock() {
    let (_, store) = signed_in(FakeBackend::new(catalog())).await;
    let sconce = catalog_product(&store, 2);

    assert!(!store.is_out_of_stock(pid(2)));
    store.add_to_cart(&sconce).await;
    assert!(!store.is_out_of_stock(pid(2)));
    assert_eq!(store.headroom(pid(2)), 1);
    store.add_to_cart(&sconce).await;
    assert!(store.is_out_of_stock(pid(2)));

    // Stock 0 with nothing in the cart
    assert!(store.is_out_of_stock(pid(3)));
    // Unknown product
    assert_eq!(store.get_product_stock(pid(42)), 0);
    assert!(store.is_out_of_stock(pid(42)));
}

#[tokio::test]
async fn test_increase_to_stock_makes_product_out_of_stock() {
    let backend =
        FakeBackend::new(vec![product(4, "Lumen Wall Light", 2_800, 3)]).with_cart(&[(4, 2)]);
    let (_, store) = signed_in(backend).await;
    assert!(!store.is_out_of_stock(pid(4)));

    assert_eq!(
        store.increase_quantity(line(100)).await,
        MutationOutcome::Confirmed
    );

    assert_eq!(store.get_cart_quantity(pid(4)), 3);
    assert!(store.is_out_of_stock(pid(4)));
    assert_eq!(
        store.increase_quantity(line(100)).await,
        MutationOutcome::Skipped(SkipReason::AtStockLimit)
    );
}

#[tokio::test]
async fn test_cart_totals() {
    let (_, store) = signed_in(FakeBackend::new(catalog()).with_cart(&[(1, 2), (2, 1)])).await;

    assert_eq!(store.cart_item_count(), 3);
    assert_eq!(store.cart_subtotal().display(), "₹12,200");
}

#[tokio::test]
async fn test_subscribers_observe_changes() {
    let (_, store) = signed_in(FakeBackend::new(catalog())).await;
    let mut rx = store.subscribe();
    rx.mark_unchanged();

    store.add_to_cart(&catalog_product(&store, 1)).await;

    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().get_cart_quantity(pid(1)), 1);
}

// =============================================================================
// Wishlist
// =============================================================================

#[tokio::test]
async fn test_toggle_wishlist() {
    let (backend, store) = signed_in(FakeBackend::new(catalog())).await;

    assert_eq!(store.toggle_wishlist(pid(1)).await, MutationOutcome::Confirmed);
    assert!(store.is_in_wishlist(pid(1)));
    assert_eq!(
        store.wishlist()[0].product.as_ref().map(|p| p.name.as_str()),
        Some("Aurora Pendant")
    );
    assert_eq!(backend.server_wishlist(), vec![pid(1)]);

    assert_eq!(store.toggle_wishlist(pid(1)).await, MutationOutcome::Confirmed);
    assert!(!store.is_in_wishlist(pid(1)));
    assert!(backend.server_wishlist().is_empty());
}

#[tokio::test]
async fn test_failed_toggle_keeps_membership() {
    let (backend, store) = signed_in(FakeBackend::new(catalog()).with_wishlist(&[2])).await;
    backend.fail(Op::WishlistToggle);

    assert_eq!(store.toggle_wishlist(pid(1)).await, MutationOutcome::RolledBack);
    assert!(!store.is_in_wishlist(pid(1)));

    assert_eq!(store.toggle_wishlist(pid(2)).await, MutationOutcome::RolledBack);
    assert!(store.is_in_wishlist(pid(2)));
}

#[tokio::test]
async fn test_remove_from_wishlist_waits_for_confirmation() {
    let (backend, store) = signed_in(FakeBackend::new(catalog()).with_wishlist(&[1])).await;
    backend.hold();

    let task = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.remove_from_wishlist(pid(1)).await }
    });
    assert!(backend.wait_for_calls(Op::WishlistToggle, 1).await);
    assert!(store.is_in_wishlist(pid(1)));

    backend.release();
    assert_eq!(task.await.unwrap(), MutationOutcome::Confirmed);
    assert!(!store.is_in_wishlist(pid(1)));
}

#[tokio::test]
async fn test_failed_remove_from_wishlist_changes_nothing() {
    let (backend, store) = signed_in(FakeBackend::new(catalog()).with_wishlist(&[1])).await;
    backend.fail(Op::WishlistToggle);

    assert_eq!(store.remove_from_wishlist(pid(1)).await, MutationOutcome::Failed);
    assert!(store.is_in_wishlist(pid(1)));
}

#[tokio::test]
async fn test_remove_absent_product_does_not_toggle() {
    let (backend, store) = signed_in(FakeBackend::new(catalog())).await;

    assert_eq!(
        store.remove_from_wishlist(pid(1)).await,
        MutationOutcome::Skipped(SkipReason::NotInWishlist)
    );
    assert_eq!(backend.calls(Op::WishlistToggle), 0);
}

#[tokio::test]
async fn test_move_from_wishlist_to_cart() {
    let (backend, store) = signed_in(FakeBackend::new(catalog()).with_wishlist(&[1])).await;

    assert_eq!(
        store.add_to_cart_from_wishlist(pid(1)).await,
        MutationOutcome::Confirmed
    );

    assert!(store.is_in_cart(pid(1)));
    assert!(!store.is_in_wishlist(pid(1)));
    assert_eq!(backend.server_cart(), vec![(LineId::new(100), pid(1), 1)]);
    assert!(backend.server_wishlist().is_empty());
    assert_eq!(backend.calls(Op::LoadCart), 2);
    assert_eq!(backend.calls(Op::InvalidateCatalog), 1);
    assert_eq!(backend.calls(Op::ListProducts), 2);
}

#[tokio::test]
async fn test_move_to_cart_refreshes_stock() {
    let (backend, store) = signed_in(FakeBackend::new(catalog()).with_wishlist(&[1])).await;
    backend.set_stock(1, 4);

    store.add_to_cart_from_wishlist(pid(1)).await;

    assert_eq!(store.get_product_stock(pid(1)), 4);
}

#[tokio::test]
async fn test_move_to_cart_keeps_completed_steps_on_failure() {
    let (backend, store) = signed_in(FakeBackend::new(catalog()).with_wishlist(&[1])).await;
    backend.fail(Op::WishlistToggle);

    assert_eq!(
        store.add_to_cart_from_wishlist(pid(1)).await,
        MutationOutcome::Failed
    );

    // The add went through; the wishlist removal did not
    assert!(store.is_in_cart(pid(1)));
    assert!(store.is_in_wishlist(pid(1)));
    assert_eq!(backend.calls(Op::LoadCart), 1);
}
