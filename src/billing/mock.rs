//! Test double for the external provider.
//!
//! Pushes are simulated by calling the [`EntitlementView`] handle directly;
//! this mock only records the outbound calls the core makes and answers
//! `launch_purchase_flow` with a configured result.
//!
//! [`EntitlementView`]: crate::billing::EntitlementView

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::billing::provider::BillingProvider;

/// A recording [`BillingProvider`] for tests.
#[derive(Default)]
pub struct MockBilling {
    refreshes: AtomicUsize,
    launches: Mutex<Vec<(String, Option<String>)>>,
    refuse_launches: AtomicBool,
}

impl MockBilling {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `launch_purchase_flow` report failure to start.
    pub fn refuse_launches(&self) {
        self.refuse_launches.store(true, Ordering::SeqCst);
    }

    /// How many times the core asked for an ownership refresh.
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    /// Every `(sku, replace_sku)` pair the core tried to launch.
    pub fn launches(&self) -> Vec<(String, Option<String>)> {
        self.launches.lock().unwrap().clone()
    }
}

impl BillingProvider for MockBilling {
    fn refresh_purchases(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }

    fn launch_purchase_flow(&self, sku: &str, replace_sku: Option<&str>) -> bool {
        self.launches
            .lock()
            .unwrap()
            .push((sku.to_string(), replace_sku.map(str::to_string)));
        !self.refuse_launches.load(Ordering::SeqCst)
    }
}
