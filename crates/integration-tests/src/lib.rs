//! Shared fixtures for Vietmarket cart integration tests.
//!
//! Provides [`MockCartRepository`], an in-memory cart store with per-product
//! failure injection, call counting, and an async gate for holding requests
//! in flight, plus line-item builders used across the test files.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::sync::Notify;

use vietmarket_cart::model::{CartItem, ProductSnapshot};
use vietmarket_cart::repository::{CartRepository, CartSummary, RepositoryError};
use vietmarket_core::{LineItemId, Price, ProductId, Quantity, UserId};

/// Initialize test logging once. Honors `RUST_LOG`.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// =============================================================================
// Fixtures
// =============================================================================

/// A whole-unit quantity.
#[must_use]
pub fn qty(units: u32) -> Quantity {
    Quantity::from_units(units)
}

/// Half a unit - one quantity step.
#[must_use]
pub fn half() -> Quantity {
    Quantity::STEP
}

/// Build a cart line with no minimum and untracked stock.
#[must_use]
pub fn line(id: i64, seller: &str, unit_price: i64, quantity: Quantity) -> CartItem {
    CartItem {
        id: LineItemId::new(id),
        product_id: ProductId::new(id * 100),
        quantity,
        product: ProductSnapshot {
            name: format!("Sản phẩm {id}"),
            unit_price: Price::vnd(Decimal::from(unit_price)),
            unit: "kg".to_string(),
            seller_name: seller.to_string(),
            store_name: format!("Sạp {seller}"),
            is_available: true,
            stock_quantity: Quantity::ZERO,
            minimum_quantity: Quantity::ZERO,
        },
    }
}

/// Same line with a minimum order quantity.
#[must_use]
pub fn with_minimum(mut item: CartItem, minimum: Quantity) -> CartItem {
    item.product.minimum_quantity = minimum;
    item
}

/// Same line with tracked stock.
#[must_use]
pub fn with_stock(mut item: CartItem, stock: Quantity) -> CartItem {
    item.product.stock_quantity = stock;
    item
}

// =============================================================================
// Mock repository
// =============================================================================

/// Per-operation call counters.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub fetches: AtomicUsize,
    pub updates: AtomicUsize,
    pub removes: AtomicUsize,
    pub clears: AtomicUsize,
    pub summaries: AtomicUsize,
}

/// In-memory cart store with failure injection.
///
/// Failures are injected per product for updates and removals; an
/// authorization flag fails everything with `Unauthorized`. When the gate
/// is held, update and remove calls park until [`release`] fires, which
/// lets tests observe the in-flight window.
///
/// [`release`]: MockCartRepository::release
#[derive(Default)]
pub struct MockCartRepository {
    store: Mutex<Vec<CartItem>>,
    fail_products: Mutex<HashSet<ProductId>>,
    canonical_override: Mutex<Option<Quantity>>,
    unauthorized: AtomicBool,
    hold: AtomicBool,
    release: Notify,
    pub calls: CallCounts,
}

impl MockCartRepository {
    /// A repository pre-seeded with line items, ready to share with a
    /// controller.
    #[must_use]
    pub fn seeded(items: Vec<CartItem>) -> Arc<Self> {
        let repo = Self::default();
        *repo.store.lock() = items;
        Arc::new(repo)
    }

    /// Inject a failure for every update/remove touching this product.
    pub fn fail_product(&self, product: ProductId) {
        self.fail_products.lock().insert(product);
    }

    /// Stop failing a product.
    pub fn heal_product(&self, product: ProductId) {
        self.fail_products.lock().remove(&product);
    }

    /// Fail everything with `Unauthorized` from now on.
    pub fn revoke_session(&self) {
        self.unauthorized.store(true, Ordering::SeqCst);
    }

    /// Make `update_item` echo this quantity back as the canonical line,
    /// regardless of what was requested.
    pub fn override_canonical(&self, quantity: Quantity) {
        *self.canonical_override.lock() = Some(quantity);
    }

    /// Park update/remove calls until [`release`](Self::release).
    pub fn hold_requests(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    /// Release parked calls and stop parking new ones.
    pub fn release(&self) {
        self.hold.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
    }

    /// Current server-side line items.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.store.lock().clone()
    }

    /// Drop a product server-side without telling anyone, simulating a
    /// removal that raced this client.
    pub fn forget_product(&self, product: ProductId) {
        self.store
            .lock()
            .retain(|item| item.product_id != product);
    }

    async fn gate(&self) {
        while self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
    }

    fn check_auth(&self) -> Result<(), RepositoryError> {
        if self.unauthorized.load(Ordering::SeqCst) {
            Err(RepositoryError::Unauthorized)
        } else {
            Ok(())
        }
    }

    fn check_failure(&self, product: ProductId) -> Result<(), RepositoryError> {
        if self.fail_products.lock().contains(&product) {
            Err(RepositoryError::Transport(format!(
                "injected failure for product {product}"
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CartRepository for MockCartRepository {
    async fn cart_items(&self, _user: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        self.calls.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_auth()?;
        Ok(self.store.lock().clone())
    }

    async fn update_item(
        &self,
        _user: UserId,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<Option<CartItem>, RepositoryError> {
        self.calls.updates.fetch_add(1, Ordering::SeqCst);
        self.gate().await;
        self.check_auth()?;
        self.check_failure(product)?;

        let canonical = (*self.canonical_override.lock()).unwrap_or(quantity);
        let mut store = self.store.lock();
        let item = store
            .iter_mut()
            .find(|item| item.product_id == product)
            .ok_or_else(|| RepositoryError::NotFound(format!("product {product}")))?;
        item.quantity = canonical;
        Ok(Some(item.clone()))
    }

    async fn remove_item(&self, _user: UserId, product: ProductId) -> Result<(), RepositoryError> {
        self.calls.removes.fetch_add(1, Ordering::SeqCst);
        self.gate().await;
        self.check_auth()?;
        self.check_failure(product)?;

        let mut store = self.store.lock();
        let before = store.len();
        store.retain(|item| item.product_id != product);
        if store.len() == before {
            return Err(RepositoryError::NotFound(format!("product {product}")));
        }
        Ok(())
    }

    async fn clear(&self, _user: UserId) -> Result<(), RepositoryError> {
        self.calls.clears.fetch_add(1, Ordering::SeqCst);
        self.check_auth()?;
        self.store.lock().clear();
        Ok(())
    }

    async fn summary(&self, _user: UserId) -> Result<CartSummary, RepositoryError> {
        self.calls.summaries.fetch_add(1, Ordering::SeqCst);
        self.check_auth()?;
        let store = self.store.lock();
        let item_count = store.iter().map(|item| item.quantity).sum();
        let total_price = store
            .iter()
            .map(|item| item.line_subtotal().amount)
            .sum::<Decimal>();
        Ok(CartSummary {
            item_count,
            total_price: Price::vnd(total_price),
        })
    }
}
