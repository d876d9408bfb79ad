//! Integration tests for the cart sync controller.
//!
//! Single-mutation behavior: optimistic apply, revert on failure, local
//! validation short-circuits, the per-item busy flag, and the selection
//! and cache invariants around every mutation.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use vietmarket_cart::error::CartError;
use vietmarket_cart::sync::{CartSyncController, MutationOutcome};
use vietmarket_core::{LineItemId, UserId};

use vietmarket_integration_tests::{
    MockCartRepository, half, init_tracing, line, qty, with_minimum, with_stock,
};

fn controller(repo: &Arc<MockCartRepository>) -> Arc<CartSyncController> {
    Arc::new(CartSyncController::new(UserId::new(1), repo.clone()))
}

// =============================================================================
// Load & refresh
// =============================================================================

#[tokio::test]
async fn test_refresh_loads_cart_and_caches() {
    init_tracing();
    let repo = MockCartRepository::seeded(vec![
        line(1, "Cô Lan", 10_000, qty(2)),
        line(2, "Cô Lan", 5_000, qty(1)),
    ]);
    let cart = controller(&repo);

    assert!(cart.cached_snapshot().is_none());
    cart.refresh().await.expect("refresh");

    assert_eq!(cart.items().len(), 2);
    let snapshot = cart.cached_snapshot().expect("snapshot");
    assert_eq!(snapshot.version, 1);
    assert_eq!(snapshot.item_count, qty(3));
}

#[tokio::test]
async fn test_unauthorized_surfaces_as_session_error() {
    init_tracing();
    let repo = MockCartRepository::seeded(vec![line(1, "Cô Lan", 10_000, qty(1))]);
    repo.revoke_session();
    let cart = controller(&repo);

    let err = cart.refresh().await.expect_err("should fail");
    assert!(matches!(err, CartError::Unauthorized));
}

// =============================================================================
// Quantity updates
// =============================================================================

#[tokio::test]
async fn test_set_quantity_applies_and_bumps_cache() {
    init_tracing();
    let repo = MockCartRepository::seeded(vec![line(1, "Cô Lan", 10_000, qty(2))]);
    let cart = controller(&repo);
    cart.refresh().await.expect("refresh");

    let outcome = cart
        .set_quantity(LineItemId::new(1), qty(3))
        .await
        .expect("update");
    assert_eq!(
        outcome,
        MutationOutcome::Updated {
            id: LineItemId::new(1),
            quantity: qty(3),
        }
    );

    let items = cart.items();
    assert_eq!(items.first().map(|item| item.quantity), Some(qty(3)));
    // Server store agrees and the snapshot moved past the initial fetch
    assert_eq!(repo.items().first().map(|item| item.quantity), Some(qty(3)));
    assert_eq!(cart.cached_snapshot().map(|s| s.version), Some(2));
}

#[tokio::test]
async fn test_update_failure_reverts_optimistic_change() {
    init_tracing();
    let item = line(1, "Cô Lan", 10_000, qty(2));
    let product = item.product_id;
    let repo = MockCartRepository::seeded(vec![item]);
    let cart = controller(&repo);
    cart.refresh().await.expect("refresh");

    repo.fail_product(product);
    let err = cart
        .set_quantity(LineItemId::new(1), qty(3))
        .await
        .expect_err("should fail");
    assert!(matches!(err, CartError::Repository(_)));

    // Local state is back to the pre-mutation snapshot, busy flag cleared
    assert_eq!(cart.items().first().map(|item| item.quantity), Some(qty(2)));
    assert!(!cart.is_updating(LineItemId::new(1)));
}

#[tokio::test]
async fn test_reconciles_canonical_quantity_from_server() {
    init_tracing();
    let repo = MockCartRepository::seeded(vec![line(1, "Cô Lan", 10_000, qty(2))]);
    // Server clamps whatever we send to 5
    repo.override_canonical(qty(5));
    let cart = controller(&repo);
    cart.refresh().await.expect("refresh");

    let outcome = cart
        .set_quantity(LineItemId::new(1), qty(9))
        .await
        .expect("update");
    assert_eq!(
        outcome,
        MutationOutcome::Updated {
            id: LineItemId::new(1),
            quantity: qty(5),
        }
    );
    assert_eq!(cart.items().first().map(|item| item.quantity), Some(qty(5)));
}

#[tokio::test]
async fn test_below_minimum_rejected_without_network_call() {
    init_tracing();
    // Scenario: minimum 1, quantity 1; stepping down to 0.5 must be
    // rejected locally with the limiting value, leaving quantity as-is.
    let repo = MockCartRepository::seeded(vec![with_minimum(
        line(1, "Cô Lan", 120_000, qty(1)),
        qty(1),
    )]);
    let cart = controller(&repo);
    cart.refresh().await.expect("refresh");

    let err = cart
        .decrement(LineItemId::new(1))
        .await
        .expect_err("should reject");
    assert!(matches!(err, CartError::Constraint(_)));
    assert!(err.to_string().contains("minimum of 1"));

    assert_eq!(cart.items().first().map(|item| item.quantity), Some(qty(1)));
    assert_eq!(repo.calls.updates.load(Ordering::SeqCst), 0);
    assert_eq!(repo.calls.removes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_stock_cap_rejected_without_network_call() {
    init_tracing();
    // 3 kg tracked stock; asking for 3.5 is rejected with the available
    // amount and nothing reaches the repository.
    let repo = MockCartRepository::seeded(vec![with_stock(
        line(1, "Chú Ba", 40_000, qty(3)),
        qty(3),
    )]);
    let cart = controller(&repo);
    cart.refresh().await.expect("refresh");

    let err = cart
        .increment(LineItemId::new(1))
        .await
        .expect_err("should reject");
    assert!(matches!(err, CartError::Constraint(_)));
    assert!(err.to_string().contains("only 3 kg"));

    assert_eq!(cart.items().first().map(|item| item.quantity), Some(qty(3)));
    assert_eq!(repo.calls.updates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_decrement_to_zero_removes_line() {
    init_tracing();
    // Scenario: 0.5 with no minimum; stepping down hits zero and becomes a
    // removal, not a rejected update.
    let repo = MockCartRepository::seeded(vec![
        line(1, "Cô Lan", 40_000, half()),
        line(2, "Cô Lan", 5_000, qty(1)),
    ]);
    let cart = controller(&repo);
    cart.refresh().await.expect("refresh");
    cart.toggle_selected(LineItemId::new(1)).expect("toggle");

    let outcome = cart
        .decrement(LineItemId::new(1))
        .await
        .expect("remove via decrement");
    assert_eq!(
        outcome,
        MutationOutcome::Removed {
            id: LineItemId::new(1),
        }
    );

    // Gone from the cart and from the selection set
    assert!(!cart.items().iter().any(|item| item.id == LineItemId::new(1)));
    assert!(!cart.is_selected(LineItemId::new(1)));
    assert_eq!(repo.calls.removes.load(Ordering::SeqCst), 1);
    assert_eq!(repo.calls.updates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_increment_steps_by_half_unit() {
    init_tracing();
    let repo = MockCartRepository::seeded(vec![line(1, "Cô Lan", 10_000, qty(1))]);
    let cart = controller(&repo);
    cart.refresh().await.expect("refresh");

    cart.increment(LineItemId::new(1)).await.expect("increment");
    assert_eq!(
        cart.items().first().map(|item| item.quantity),
        Some(qty(1) + half())
    );
}

#[tokio::test]
async fn test_mutating_missing_line_is_a_no_op() {
    init_tracing();
    let repo = MockCartRepository::seeded(vec![line(1, "Cô Lan", 10_000, qty(1))]);
    let cart = controller(&repo);
    cart.refresh().await.expect("refresh");

    let err = cart
        .set_quantity(LineItemId::new(99), qty(2))
        .await
        .expect_err("unknown line");
    assert!(matches!(err, CartError::NotFound(_)));
    assert_eq!(repo.calls.updates.load(Ordering::SeqCst), 0);
    assert_eq!(cart.items().len(), 1);
}

// =============================================================================
// Removal
// =============================================================================

#[tokio::test]
async fn test_remove_failure_restores_line_and_selection() {
    init_tracing();
    let middle = line(2, "Cô Lan", 5_000, qty(1));
    let product = middle.product_id;
    let repo = MockCartRepository::seeded(vec![
        line(1, "Cô Lan", 10_000, qty(1)),
        middle,
        line(3, "Chú Ba", 40_000, qty(1)),
    ]);
    let cart = controller(&repo);
    cart.refresh().await.expect("refresh");
    cart.toggle_selected(LineItemId::new(2)).expect("toggle");

    repo.fail_product(product);
    let err = cart
        .remove_item(LineItemId::new(2))
        .await
        .expect_err("should fail");
    assert!(matches!(err, CartError::Repository(_)));

    // The line is back at its old position, selection restored
    let ids: Vec<i64> = cart.items().iter().map(|item| item.id.as_i64()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(cart.is_selected(LineItemId::new(2)));
    assert!(!cart.is_updating(LineItemId::new(2)));
}

#[tokio::test]
async fn test_remove_is_idempotent_against_server_races() {
    init_tracing();
    // The line vanished server-side between our fetch and the removal; the
    // delete still counts as done.
    let item = line(1, "Cô Lan", 10_000, qty(1));
    let product = item.product_id;
    let repo = MockCartRepository::seeded(vec![item]);
    let cart = controller(&repo);
    cart.refresh().await.expect("refresh");

    repo.forget_product(product);
    let outcome = cart
        .remove_item(LineItemId::new(1))
        .await
        .expect("idempotent remove");
    assert_eq!(
        outcome,
        MutationOutcome::Removed {
            id: LineItemId::new(1),
        }
    );
    assert!(cart.is_empty());
}

// =============================================================================
// Busy flag
// =============================================================================

#[tokio::test]
async fn test_same_line_mutation_rejected_while_in_flight() {
    init_tracing();
    let repo = MockCartRepository::seeded(vec![line(1, "Cô Lan", 10_000, qty(1))]);
    let cart = controller(&repo);
    cart.refresh().await.expect("refresh");

    repo.hold_requests();
    let background = {
        let cart = cart.clone();
        tokio::spawn(async move { cart.increment(LineItemId::new(1)).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(cart.is_updating(LineItemId::new(1)));

    // Second mutation on the same line: rejected, not queued
    let err = cart
        .increment(LineItemId::new(1))
        .await
        .expect_err("busy line");
    assert!(matches!(err, CartError::UpdateInFlight(_)));

    repo.release();
    background
        .await
        .expect("join")
        .expect("first update succeeds");
    assert!(!cart.is_updating(LineItemId::new(1)));
    assert_eq!(repo.calls.updates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_different_lines_may_be_in_flight_concurrently() {
    init_tracing();
    let repo = MockCartRepository::seeded(vec![
        line(1, "Cô Lan", 10_000, qty(1)),
        line(2, "Chú Ba", 40_000, qty(1)),
    ]);
    let cart = controller(&repo);
    cart.refresh().await.expect("refresh");

    repo.hold_requests();
    let first = {
        let cart = cart.clone();
        tokio::spawn(async move { cart.increment(LineItemId::new(1)).await })
    };
    let second = {
        let cart = cart.clone();
        tokio::spawn(async move { cart.increment(LineItemId::new(2)).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    // No cross-line serialization: both lines are mid-update
    assert!(cart.is_updating(LineItemId::new(1)));
    assert!(cart.is_updating(LineItemId::new(2)));

    repo.release();
    first.await.expect("join").expect("first ok");
    second.await.expect("join").expect("second ok");
}

// =============================================================================
// Clear & summary
// =============================================================================

#[tokio::test]
async fn test_clear_empties_cart_and_selection() {
    init_tracing();
    let repo = MockCartRepository::seeded(vec![
        line(1, "Cô Lan", 10_000, qty(1)),
        line(2, "Chú Ba", 40_000, qty(1)),
    ]);
    let cart = controller(&repo);
    cart.refresh().await.expect("refresh");
    cart.select_all();

    cart.clear().await.expect("clear");
    assert!(cart.is_empty());
    assert_eq!(cart.selected_count(), 0);
    assert_eq!(repo.calls.clears.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_summary_reflects_server_state() {
    init_tracing();
    let repo = MockCartRepository::seeded(vec![
        line(1, "Cô Lan", 10_000, qty(2)),
        line(2, "Cô Lan", 5_000, qty(1)),
    ]);
    let cart = controller(&repo);

    let summary = cart.summary().await.expect("summary");
    assert_eq!(summary.item_count, qty(3));
    assert_eq!(
        summary.total_price.amount,
        rust_decimal::Decimal::from(25_000)
    );
}

// =============================================================================
// Selection invariant
// =============================================================================

#[tokio::test]
async fn test_selection_never_references_absent_lines() {
    init_tracing();
    let repo = MockCartRepository::seeded(vec![
        line(1, "Cô Lan", 10_000, qty(1)),
        line(2, "Chú Ba", 40_000, qty(1)),
    ]);
    let cart = controller(&repo);
    cart.refresh().await.expect("refresh");
    cart.select_all();
    assert_eq!(cart.selected_count(), 2);

    // The server dropped a line; after refresh the selection follows
    repo.forget_product(vietmarket_core::ProductId::new(200));
    cart.refresh().await.expect("refresh");
    assert_eq!(cart.selected_count(), 1);
    assert!(cart.is_selected(LineItemId::new(1)));
    assert!(!cart.is_selected(LineItemId::new(2)));
}

#[tokio::test]
async fn test_toggle_on_missing_line_errors() {
    init_tracing();
    let repo = MockCartRepository::seeded(vec![line(1, "Cô Lan", 10_000, qty(1))]);
    let cart = controller(&repo);
    cart.refresh().await.expect("refresh");

    let err = cart
        .toggle_selected(LineItemId::new(42))
        .expect_err("unknown line");
    assert!(matches!(err, CartError::NotFound(_)));
}
