//! Versioned local snapshot cache.
//!
//! A non-authoritative copy of the last known cart, good for instant first
//! paint of the cart page and the header badge before the repository
//! answers. It is overwritten on every successful fetch and never consulted
//! to resolve conflicts - the server is always right.
//!
//! The version is monotonic across overwrites and invalidations, so hosts
//! persisting the snapshot (e.g. to local storage) can discard anything
//! older than what they already hold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vietmarket_core::Quantity;

use crate::model::CartItem;

/// One cached cart state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Monotonic snapshot version.
    pub version: u64,
    /// When this snapshot was taken.
    pub fetched_at: DateTime<Utc>,
    /// Line items as of `fetched_at`.
    pub items: Vec<CartItem>,
    /// Summed quantity across all lines (header badge value).
    pub item_count: Quantity,
}

/// Explicitly owned snapshot cache, driven by the sync controller.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    current: Option<CartSnapshot>,
    last_version: u64,
}

impl SnapshotCache {
    /// Store a fresh snapshot, bumping the version.
    pub fn store(&mut self, items: &[CartItem]) -> u64 {
        self.last_version += 1;
        let item_count = items.iter().map(|item| item.quantity).sum();
        self.current = Some(CartSnapshot {
            version: self.last_version,
            fetched_at: Utc::now(),
            items: items.to_vec(),
            item_count,
        });
        self.last_version
    }

    /// The current snapshot, if any.
    #[must_use]
    pub fn get(&self) -> Option<&CartSnapshot> {
        self.current.as_ref()
    }

    /// Drop the snapshot. The version counter keeps advancing.
    pub fn invalidate(&mut self) {
        self.current = None;
    }

    /// Seed the cache from a persisted snapshot, e.g. on page mount.
    ///
    /// Only takes effect while the cache is empty; once anything has been
    /// fetched this session, a stale persisted copy must not win. The
    /// counter continues above the seeded version.
    pub fn prime(&mut self, snapshot: CartSnapshot) {
        if self.current.is_none() && self.last_version == 0 {
            self.last_version = snapshot.version;
            self.current = Some(snapshot);
        }
    }
}
