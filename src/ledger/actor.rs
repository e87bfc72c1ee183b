//! The ledger actor: one task owning the persisted counter, plus the
//! client handle the rest of the system talks to.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use crate::game::drive::drive_outcome;
use crate::game::level::{FuelLevel, FUEL_TANK_MAX, FUEL_TANK_MIN};
use crate::game::messages::MessageCode;
use crate::ledger::error::LedgerError;
use crate::ledger::store::LedgerStore;
use crate::reactive::Cell;

type Response<T> = oneshot::Sender<Result<T, LedgerError>>;

/// Requests processed sequentially by the ledger actor.
enum LedgerRequest {
    Decrement { floor: i32, respond_to: Response<i32> },
    Increment { ceiling: i32, respond_to: Response<i32> },
    Drive { respond_to: Response<()> },
}

/// Dependencies the drive action needs, injected at [`LedgerActor::run`].
///
/// The derived level cell is built from this actor's own observe cell, so it
/// cannot exist before the actor does; late binding at `run()` breaks the
/// chicken-and-egg ordering.
pub struct DriveContext {
    /// The derived fuel level, read at drive invocation time.
    pub level: Cell<FuelLevel>,
    /// Where drive results are announced (the internal game-message stream).
    pub messages: Cell<MessageCode>,
}

/// The server half: owns the counter, its persistence, and the queue.
pub struct LedgerActor {
    receiver: mpsc::UnboundedReceiver<LedgerRequest>,
    store: Box<dyn LedgerStore>,
    value: i32,
    scalar: Arc<AtomicI32>,
    observe: Cell<i32>,
}

/// Client handle for the ledger actor. Cheap to clone.
#[derive(Clone)]
pub struct Ledger {
    sender: mpsc::UnboundedSender<LedgerRequest>,
    scalar: Arc<AtomicI32>,
    observe: Cell<i32>,
}

/// A ledger handle that does not keep the actor's queue open.
///
/// Observer closures wired into long-lived cells hold this instead of a
/// [`Ledger`], so dropping the real handles still shuts the actor down.
#[derive(Clone)]
pub struct WeakLedger {
    sender: mpsc::WeakUnboundedSender<LedgerRequest>,
}

impl Ledger {
    /// Loads (or seeds) the persisted counter and builds the actor pair.
    ///
    /// First creation seeds the counter to [`FUEL_TANK_MAX`]. An unreadable
    /// record is unrecoverable and surfaces as an error here; callers are
    /// expected to propagate it out of startup rather than handle it.
    pub async fn open(store: Box<dyn LedgerStore>) -> Result<(LedgerActor, Ledger), LedgerError> {
        let value = match store.load().await? {
            Some(value) => value,
            None => {
                info!(seed = FUEL_TANK_MAX, "Seeding counter on first creation");
                store.save(FUEL_TANK_MAX).await?;
                FUEL_TANK_MAX
            }
        };

        let scalar = Arc::new(AtomicI32::new(value));
        let observe = Cell::source();
        observe.set(value);

        let (sender, receiver) = mpsc::unbounded_channel();
        let actor = LedgerActor {
            receiver,
            store,
            value,
            scalar: Arc::clone(&scalar),
            observe: observe.clone(),
        };
        let ledger = Ledger {
            sender,
            scalar,
            observe,
        };
        Ok((actor, ledger))
    }

    /// Conditional bounded decrement: `value - 1` iff `value > floor`,
    /// otherwise a no-op. Returns the value after the operation.
    #[instrument(skip(self))]
    pub async fn decrement(&self, floor: i32) -> Result<i32, LedgerError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(LedgerRequest::Decrement { floor, respond_to })
            .map_err(|_| LedgerError::ActorClosed)?;
        response.await.map_err(|_| LedgerError::ActorDropped)?
    }

    /// Conditional bounded increment: `value + 1` iff `value < ceiling`,
    /// otherwise a no-op. Returns the value after the operation.
    #[instrument(skip(self))]
    pub async fn increment(&self, ceiling: i32) -> Result<i32, LedgerError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(LedgerRequest::Increment { ceiling, respond_to })
            .map_err(|_| LedgerError::ActorClosed)?;
        response.await.map_err(|_| LedgerError::ActorDropped)?
    }

    /// Runs one drive on the actor's queue: read the level, apply the drive
    /// table, mutate the counter if the table says so, announce the result.
    #[instrument(skip(self))]
    pub async fn drive(&self) -> Result<(), LedgerError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(LedgerRequest::Drive { respond_to })
            .map_err(|_| LedgerError::ActorClosed)?;
        response.await.map_err(|_| LedgerError::ActorDropped)?
    }

    /// Advisory read of the latest value, outside the queue. Any decision
    /// built on this read must route its write through the queue.
    pub fn current_value(&self) -> i32 {
        self.scalar.load(Ordering::SeqCst)
    }

    /// Hot cell that publishes whenever the persisted value changes.
    pub fn observe(&self) -> Cell<i32> {
        self.observe.clone()
    }

    /// A handle that will not keep the actor alive.
    pub fn downgrade(&self) -> WeakLedger {
        WeakLedger {
            sender: self.sender.downgrade(),
        }
    }
}

impl WeakLedger {
    /// Fire-and-forget bounded increment. Silently does nothing once the
    /// actor has shut down.
    pub fn submit_increment(&self, ceiling: i32) {
        if let Some(sender) = self.sender.upgrade() {
            let (respond_to, _discard) = oneshot::channel();
            let _ = sender.send(LedgerRequest::Increment { ceiling, respond_to });
        }
    }
}

impl LedgerActor {
    /// Processes requests until every client handle is dropped.
    pub async fn run(mut self, context: DriveContext) {
        info!(value = self.value, "Ledger actor started");
        while let Some(request) = self.receiver.recv().await {
            match request {
                LedgerRequest::Decrement { floor, respond_to } => {
                    let result = self.apply_decrement(floor).await;
                    let _ = respond_to.send(result);
                }
                LedgerRequest::Increment { ceiling, respond_to } => {
                    let result = self.apply_increment(ceiling).await;
                    let _ = respond_to.send(result);
                }
                LedgerRequest::Drive { respond_to } => {
                    let result = self.apply_drive(&context).await;
                    let _ = respond_to.send(result);
                }
            }
        }
        info!(value = self.value, "Ledger actor shutdown");
    }

    async fn apply_drive(&mut self, context: &DriveContext) -> Result<(), LedgerError> {
        // The derived level may still be gated if the provider has not
        // pushed its first snapshot; fall back to the raw counter then.
        let level = context
            .level
            .get()
            .unwrap_or(FuelLevel::Units(self.value));
        let outcome = drive_outcome(level);
        debug!(?level, ?outcome, "Drive");
        if outcome.consumes_fuel {
            self.apply_decrement(FUEL_TANK_MIN).await?;
        }
        context.messages.emit(outcome.message);
        Ok(())
    }

    async fn apply_decrement(&mut self, floor: i32) -> Result<i32, LedgerError> {
        if self.value > floor {
            self.persist(self.value - 1).await?;
        } else {
            debug!(value = self.value, floor, "Decrement absorbed at boundary");
        }
        Ok(self.value)
    }

    async fn apply_increment(&mut self, ceiling: i32) -> Result<i32, LedgerError> {
        if self.value < ceiling {
            self.persist(self.value + 1).await?;
        } else {
            debug!(value = self.value, ceiling, "Increment absorbed at boundary");
        }
        Ok(self.value)
    }

    /// Durable-on-return write, then the in-memory value, the advisory
    /// scalar, and the observe cell, in that order.
    async fn persist(&mut self, next: i32) -> Result<(), LedgerError> {
        if let Err(e) = self.store.save(next).await {
            warn!(error = %e, "Persist failed; counter unchanged");
            return Err(e.into());
        }
        self.value = next;
        self.scalar.store(next, Ordering::SeqCst);
        self.observe.set(next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::store::MemoryStore;
    use std::sync::Mutex;

    async fn open_running(store: Box<dyn LedgerStore>) -> Ledger {
        let (actor, ledger) = Ledger::open(store).await.unwrap();
        let context = DriveContext {
            level: Cell::source(),
            messages: Cell::single_shot(),
        };
        tokio::spawn(actor.run(context));
        ledger
    }

    #[tokio::test]
    async fn seeds_to_full_tank_on_first_creation() {
        let ledger = open_running(Box::new(MemoryStore::new())).await;
        assert_eq!(ledger.current_value(), FUEL_TANK_MAX);
        assert_eq!(ledger.observe().get(), Some(FUEL_TANK_MAX));
    }

    #[tokio::test]
    async fn reuses_the_persisted_value_on_reopen() {
        let store = Arc::new(MemoryStore::new());
        {
            let ledger = open_running(Box::new(Arc::clone(&store))).await;
            ledger.decrement(FUEL_TANK_MIN).await.unwrap();
            ledger.decrement(FUEL_TANK_MIN).await.unwrap();
            assert_eq!(ledger.current_value(), 2);
        }
        let reopened = open_running(Box::new(store)).await;
        assert_eq!(reopened.current_value(), 2);
    }

    #[tokio::test]
    async fn stays_within_bounds_for_any_call_sequence() {
        let ledger = open_running(Box::new(MemoryStore::new())).await;
        let observed = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&observed);
        ledger.observe().subscribe(move |v| log.lock().unwrap().push(*v));

        for _ in 0..7 {
            ledger.decrement(FUEL_TANK_MIN).await.unwrap();
        }
        assert_eq!(ledger.current_value(), FUEL_TANK_MIN);

        for _ in 0..9 {
            ledger.increment(FUEL_TANK_MAX).await.unwrap();
        }
        assert_eq!(ledger.current_value(), FUEL_TANK_MAX);

        for value in observed.lock().unwrap().iter() {
            assert!((FUEL_TANK_MIN..=FUEL_TANK_MAX).contains(value));
        }
    }

    #[tokio::test]
    async fn concurrent_mutations_never_leave_the_range() {
        let ledger = open_running(Box::new(MemoryStore::new())).await;
        let observed = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&observed);
        ledger.observe().subscribe(move |v| log.lock().unwrap().push(*v));

        let mut tasks = Vec::new();
        for i in 0..20 {
            let ledger = ledger.clone();
            tasks.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    ledger.decrement(FUEL_TANK_MIN).await.unwrap();
                } else {
                    ledger.increment(FUEL_TANK_MAX).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert!((FUEL_TANK_MIN..=FUEL_TANK_MAX).contains(&ledger.current_value()));
        for value in observed.lock().unwrap().iter() {
            assert!((FUEL_TANK_MIN..=FUEL_TANK_MAX).contains(value));
        }
    }

    #[tokio::test]
    async fn boundary_mutations_are_silent_no_ops() {
        let ledger = open_running(Box::new(MemoryStore::new())).await;
        // Already at MAX: increment is absorbed, not an error.
        let value = ledger.increment(FUEL_TANK_MAX).await.unwrap();
        assert_eq!(value, FUEL_TANK_MAX);
    }
}
