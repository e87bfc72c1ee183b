//! Reactive view over the provider's pushed state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::reactive::Cell;

/// Per-product entitlement state plus the provider's event streams, exposed
/// as reactive cells.
///
/// This is both halves of the inbound boundary: the provider integration
/// calls the `*_changed` / `purchase_*` push methods, and the rest of the
/// system observes the cells. The view itself adds no combine logic; each
/// flag cell has exactly one upstream (the provider) and becomes ready with
/// the provider's first snapshot for that product.
///
/// Flag cells are created on first observation or first push, whichever
/// comes earlier, and live for the process lifetime. Handles are cheap
/// clones sharing state.
#[derive(Clone)]
pub struct EntitlementView {
    inner: Arc<Inner>,
}

struct Inner {
    owned: Mutex<HashMap<String, Cell<bool>>>,
    allowed: Mutex<HashMap<String, Cell<bool>>>,
    /// Freshly completed purchases, by product id. Single-shot.
    new_purchases: Cell<String>,
    /// Purchases the provider has consumed (consumables only). Single-shot.
    consumed_purchases: Cell<String>,
    /// Whether a purchase flow is currently on screen.
    flow_in_process: Cell<bool>,
}

impl EntitlementView {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                owned: Mutex::new(HashMap::new()),
                allowed: Mutex::new(HashMap::new()),
                new_purchases: Cell::single_shot(),
                consumed_purchases: Cell::single_shot(),
                flow_in_process: Cell::source(),
            }),
        }
    }

    fn cell(map: &Mutex<HashMap<String, Cell<bool>>>, sku: &str) -> Cell<bool> {
        map.lock()
            .unwrap()
            .entry(sku.to_string())
            .or_insert_with(Cell::source)
            .clone()
    }

    // --- Observation (core side) ---

    /// Ownership flag cell for `sku`. Not ready until the provider's first
    /// snapshot for that product.
    pub fn is_purchased(&self, sku: &str) -> Cell<bool> {
        Self::cell(&self.inner.owned, sku)
    }

    /// The provider's purchase-allowed signal for `sku` (price known, not
    /// already owned, and so on; entirely the provider's judgement).
    pub fn purchase_allowed(&self, sku: &str) -> Cell<bool> {
        Self::cell(&self.inner.allowed, sku)
    }

    /// Completed purchases as a single-shot stream of product ids.
    pub fn new_purchases(&self) -> Cell<String> {
        self.inner.new_purchases.clone()
    }

    /// Consumed consumable purchases as a single-shot stream of product ids.
    pub fn consumed_purchases(&self) -> Cell<String> {
        self.inner.consumed_purchases.clone()
    }

    /// Whether a purchase flow is currently in process.
    pub fn billing_flow_in_process(&self) -> Cell<bool> {
        self.inner.flow_in_process.clone()
    }

    // --- Pushes (provider side) ---

    /// Provider snapshot: `sku` is (or is no longer) owned.
    pub fn ownership_changed(&self, sku: &str, owned: bool) {
        debug!(sku, owned, "Ownership push");
        Self::cell(&self.inner.owned, sku).set(owned);
    }

    /// Provider snapshot: whether `sku` may currently be purchased.
    pub fn can_purchase_changed(&self, sku: &str, allowed: bool) {
        debug!(sku, allowed, "Purchase-allowed push");
        Self::cell(&self.inner.allowed, sku).set(allowed);
    }

    /// Provider event: a purchase of `sku` just completed.
    pub fn purchase_completed(&self, sku: &str) {
        debug!(sku, "Purchase completed push");
        self.inner.new_purchases.emit(sku.to_string());
    }

    /// Provider event: a consumable purchase of `sku` was consumed.
    pub fn purchase_consumed(&self, sku: &str) {
        debug!(sku, "Purchase consumed push");
        self.inner.consumed_purchases.emit(sku.to_string());
    }

    /// Provider event: a purchase flow opened or closed.
    pub fn billing_flow_changed(&self, in_process: bool) {
        self.inner.flow_in_process.set(in_process);
    }
}

impl Default for EntitlementView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_is_not_ready_before_the_first_snapshot() {
        let view = EntitlementView::new();
        assert_eq!(view.is_purchased("premium").get(), None);
        view.ownership_changed("premium", false);
        assert_eq!(view.is_purchased("premium").get(), Some(false));
    }

    #[test]
    fn observation_before_and_after_push_sees_the_same_cell() {
        let view = EntitlementView::new();
        let early = view.is_purchased("premium");
        view.ownership_changed("premium", true);
        assert_eq!(early.get(), Some(true));
        assert_eq!(view.is_purchased("premium").get(), Some(true));
    }

    #[test]
    fn purchase_events_are_single_shot() {
        let view = EntitlementView::new();
        view.purchase_completed("fuel");
        // Attached after the emission: sees nothing from before.
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        view.new_purchases()
            .subscribe(move |sku: &String| log.lock().unwrap().push(sku.clone()));
        view.purchase_completed("premium");
        assert_eq!(*seen.lock().unwrap(), vec!["premium".to_string()]);
    }
}
