use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::billing::{BillingProvider, EntitlementView};
use crate::game::{
    compose_fuel_eligibility, compose_pass_through_eligibility, compose_fuel_level,
    message_for_purchase, FuelLevel, MessageCode, AUTO_CONSUME_SKUS, FUEL_TANK_MAX, INAPP_SKUS,
    SKU_FUEL, SKU_UNLIMITED_MONTHLY, SKU_UNLIMITED_YEARLY, SUBSCRIPTION_SKUS,
};
use crate::ledger::{DriveContext, Ledger, LedgerError, LedgerStore};
use crate::reactive::Cell;

/// The composition root: owns the ledger actor, the entitlement view, every
/// composer cell, and the message merge wiring.
///
/// Built once at startup; the cells it creates live for the process
/// lifetime. The presentation layer talks only to this type and to the
/// [`Cell`] handles it returns.
pub struct DriveSystem {
    ledger: Ledger,
    entitlements: EntitlementView,
    provider: Arc<dyn BillingProvider>,
    fuel_level: Cell<FuelLevel>,
    can_purchase: HashMap<&'static str, Cell<bool>>,
    /// Internally raised one-shot messages (drive results, UI notices).
    game_messages: Cell<MessageCode>,
    /// The merge of game messages and translated provider purchase events.
    all_messages: Cell<MessageCode>,
    handle: tokio::task::JoinHandle<()>,
}

impl DriveSystem {
    /// Opens the persisted ledger, builds all cells, wires the merge bus and
    /// the auto-consume path, and spawns the ledger actor.
    ///
    /// An unreadable persisted counter surfaces here as an error; there is
    /// no recovery path for it, so callers propagate it out of startup.
    pub async fn new(
        store: Box<dyn LedgerStore>,
        provider: Arc<dyn BillingProvider>,
    ) -> Result<Self, LedgerError> {
        let (actor, ledger) = Ledger::open(store).await?;
        let entitlements = EntitlementView::new();

        // Effective level: tank units unless either unlimited tier is owned.
        let monthly = entitlements.is_purchased(SKU_UNLIMITED_MONTHLY);
        let yearly = entitlements.is_purchased(SKU_UNLIMITED_YEARLY);
        let fuel_level = compose_fuel_level(&ledger.observe(), &monthly, &yearly);

        // Per-product eligibility. Fuel gets the tank rule; the rest pass
        // the provider's signal through.
        let mut can_purchase = HashMap::new();
        for &sku in INAPP_SKUS.iter().chain(SUBSCRIPTION_SKUS) {
            let allowed = entitlements.purchase_allowed(sku);
            let eligible = if sku == SKU_FUEL {
                compose_fuel_eligibility(&fuel_level, &allowed)
            } else {
                compose_pass_through_eligibility(&allowed)
            };
            can_purchase.insert(sku, eligible);
        }

        let game_messages: Cell<MessageCode> = Cell::single_shot();
        let all_messages: Cell<MessageCode> = Cell::single_shot();

        // Merge bus, upstream (a): internally raised messages.
        {
            let bus = all_messages.clone();
            game_messages.subscribe(move |message| bus.emit(*message));
        }

        // Merge bus, upstream (b): provider purchase events, translated
        // through the fixed product table. Completing either unlimited tier
        // also forces an ownership re-fetch, because switching between the
        // two tiers may not be pushed promptly by the provider.
        {
            let bus = all_messages.clone();
            let refresher = Arc::clone(&provider);
            entitlements.new_purchases().subscribe(move |sku: &String| {
                if SUBSCRIPTION_SKUS.contains(&sku.as_str()) {
                    refresher.refresh_purchases();
                }
                match message_for_purchase(sku) {
                    Some(message) => bus.emit(message),
                    None => warn!(%sku, "Purchase of unknown product"),
                }
            });
        }

        // Auto-consume: a consumed purchase from the auto-consume table
        // refills one unit, bounded at the full tank. Holds a weak ledger
        // handle so this wiring never keeps the actor alive.
        {
            let refill = ledger.downgrade();
            entitlements
                .consumed_purchases()
                .subscribe(move |sku: &String| {
                    if AUTO_CONSUME_SKUS.contains(&sku.as_str()) {
                        refill.submit_increment(FUEL_TANK_MAX);
                    }
                });
        }

        let handle = tokio::spawn(actor.run(DriveContext {
            level: fuel_level.clone(),
            messages: game_messages.clone(),
        }));

        Ok(Self {
            ledger,
            entitlements,
            provider,
            fuel_level,
            can_purchase,
            game_messages,
            all_messages,
            handle,
        })
    }

    /// Drive the car, if we can. Runs on the ledger's serialized queue;
    /// returns once the mutation and message emission have completed.
    pub async fn drive(&self) -> Result<(), LedgerError> {
        self.ledger.drive().await
    }

    /// Start a purchase flow for `sku`. For the two unlimited tiers the
    /// other tier is supplied as the subscription being replaced, so
    /// upgrades and downgrades work automatically.
    ///
    /// Returns whether the flow could be started; a refusal also raises
    /// [`MessageCode::PurchaseFlowUnavailable`] on the bus.
    pub fn initiate_purchase(&self, sku: &str) -> bool {
        let replace_sku = match sku {
            SKU_UNLIMITED_MONTHLY => Some(SKU_UNLIMITED_YEARLY),
            SKU_UNLIMITED_YEARLY => Some(SKU_UNLIMITED_MONTHLY),
            _ => None,
        };
        let started = self.provider.launch_purchase_flow(sku, replace_sku);
        if !started {
            warn!(sku, "Purchase flow could not be started");
            self.send_message(MessageCode::PurchaseFlowUnavailable);
        }
        started
    }

    /// The effective fuel level (hot; replays the last value on attach).
    pub fn fuel_level(&self) -> Cell<FuelLevel> {
        self.fuel_level.clone()
    }

    /// Ownership flag for `sku`.
    pub fn is_purchased(&self, sku: &str) -> Cell<bool> {
        self.entitlements.is_purchased(sku)
    }

    /// Eligibility cell for `sku`; `None` for untracked products.
    pub fn can_purchase(&self, sku: &str) -> Option<Cell<bool>> {
        self.can_purchase.get(sku).cloned()
    }

    /// The ordered one-shot message stream. Late subscribers receive
    /// nothing emitted before they attached.
    pub fn messages(&self) -> Cell<MessageCode> {
        self.all_messages.clone()
    }

    /// Raise an internal one-shot message onto the bus.
    pub fn send_message(&self, message: MessageCode) {
        self.game_messages.emit(message);
    }

    /// Whether a purchase flow is currently in process.
    pub fn billing_flow_in_process(&self) -> Cell<bool> {
        self.entitlements.billing_flow_in_process()
    }

    /// The push surface handed to the provider integration.
    pub fn entitlements(&self) -> EntitlementView {
        self.entitlements.clone()
    }

    /// Ask the provider to re-deliver ownership state.
    pub fn refresh_purchases(&self) {
        self.provider.refresh_purchases();
    }

    /// Graceful shutdown: drops the ledger handle, which closes the actor's
    /// queue, then waits for the actor task to drain and exit.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        let Self {
            ledger,
            entitlements,
            provider,
            fuel_level,
            can_purchase,
            game_messages,
            all_messages,
            handle,
        } = self;
        drop(ledger);
        drop(entitlements);
        drop(provider);
        drop(fuel_level);
        drop(can_purchase);
        drop(game_messages);
        drop(all_messages);

        handle
            .await
            .map_err(|e| format!("Ledger actor task failed: {e:?}"))?;
        info!("System shutdown complete.");
        Ok(())
    }
}
