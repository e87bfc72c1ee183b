//! A stateful observable value with change propagation and readiness gating.
//!
//! Cells come in three flavors, all sharing one propagation engine:
//!
//! - [`Cell::source`]: a root value fed by [`Cell::set`]. Hot (replays its
//!   cached value on subscribe) and distinct (equal values are not
//!   republished).
//! - [`Cell::derived`]: recomputes from upstream cells through a combine
//!   function whenever any upstream publishes. The combine function reads the
//!   *latest* value of every upstream, not just the one that changed, and
//!   returns `None` while its inputs are incomplete.
//! - [`Cell::single_shot`]: an event stream fed by [`Cell::emit`]. Every
//!   emission is delivered exactly once to the observers attached at that
//!   moment; nothing is replayed to late subscribers, and identical
//!   back-to-back values are all delivered.
//!
//! # Concurrency
//!
//! A cell serializes its own recompute-and-fan-out internally. Observers run
//! synchronously, in subscription order, on whichever thread caused the
//! publication. If an observer triggers another emission into the same cell
//! (re-entrancy), that emission is queued and handled after the current
//! fan-out completes. Different cells never block each other beyond the
//! moment it takes to read a cached value.
//!
//! # Failure semantics
//!
//! A combine function must not panic. A panic inside combine is a contract
//! violation and takes the process down; there is no partial-publish
//! recovery.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};

/// Handle returned by [`Cell::subscribe`], used to detach the observer later.
pub type ObserverId = u64;

type ObserverFn<T> = Arc<dyn Fn(&T) + Send + Sync>;
type CombineFn<T> = Box<dyn Fn() -> Option<T> + Send + Sync>;

/// What a pending update asks the drain loop to do.
enum Update<T> {
    /// Publish this value directly (source and single-shot cells).
    Value(T),
    /// Re-run the combine function over the latest upstream values.
    Recompute,
    /// Deliver the cached value to one just-attached observer, in queue
    /// order with the publications around it.
    Replay(ObserverId),
}

struct CellState<T> {
    value: Option<T>,
    observers: Vec<(ObserverId, ObserverFn<T>)>,
    next_observer_id: ObserverId,
    pending: VecDeque<Update<T>>,
    /// True while some thread is inside the drain loop for this cell.
    draining: bool,
}

struct CellInner<T> {
    state: Mutex<CellState<T>>,
    combine: Option<CombineFn<T>>,
    /// Replay the cached value to observers on attach.
    replay: bool,
    /// Skip publication when the new value equals the cached one.
    distinct: bool,
}

/// A multi-source observable value. Cheap to clone; clones share state.
pub struct Cell<T> {
    inner: Arc<CellInner<T>>,
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Capability to notify a downstream that this source produced a value.
///
/// Implemented by every `Cell<T>`; lets [`Cell::derived`] attach to upstreams
/// of differing value types. The trigger deliberately carries no value: the
/// downstream's combine function reads the latest value of every upstream
/// itself.
pub trait Upstream {
    fn attach(&self, trigger: Arc<dyn Fn() + Send + Sync>);
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Upstream for Cell<T> {
    fn attach(&self, trigger: Arc<dyn Fn() + Send + Sync>) {
        self.subscribe(move |_| trigger());
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Cell<T> {
    fn with_config(combine: Option<CombineFn<T>>, replay: bool, distinct: bool) -> Self {
        Self {
            inner: Arc::new(CellInner {
                state: Mutex::new(CellState {
                    value: None,
                    observers: Vec::new(),
                    next_observer_id: 0,
                    pending: VecDeque::new(),
                    draining: false,
                }),
                combine,
                replay,
                distinct,
            }),
        }
    }

    /// A root cell with no upstreams, fed through [`Cell::set`].
    pub fn source() -> Self {
        Self::with_config(None, true, true)
    }

    /// A non-replaying event cell, fed through [`Cell::emit`].
    pub fn single_shot() -> Self {
        Self::with_config(None, false, false)
    }

    /// A cell recomputed from `upstreams` through `combine`.
    ///
    /// `combine` returns `None` while not ready; no publication happens in
    /// that case. The cell computes once at construction (its upstreams may
    /// already hold values) and again whenever any upstream publishes.
    ///
    /// Upstreams hold only a weak reference back to the derived cell, so a
    /// dropped derived cell stops recomputing instead of leaking through the
    /// dependency edge.
    pub fn derived(
        upstreams: &[&dyn Upstream],
        combine: impl Fn() -> Option<T> + Send + Sync + 'static,
    ) -> Self {
        let cell = Self::with_config(Some(Box::new(combine)), true, true);
        let weak: Weak<CellInner<T>> = Arc::downgrade(&cell.inner);
        for upstream in upstreams {
            let weak = weak.clone();
            upstream.attach(Arc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    Cell { inner }.push(Update::Recompute);
                }
            }));
        }
        cell.push(Update::Recompute);
        cell
    }

    /// The cached last-published value, if any.
    pub fn get(&self) -> Option<T> {
        self.lock_state().value.clone()
    }

    /// Publish `value` if it differs from the cached value.
    pub fn set(&self, value: T) {
        self.push(Update::Value(value));
    }

    /// Publish `value` unconditionally (single-shot cells).
    pub fn emit(&self, value: T) {
        self.push(Update::Value(value));
    }

    /// Attach an observer, invoked synchronously for every publication.
    ///
    /// On a hot cell that already holds a value, the observer receives that
    /// value before anything published after the attach; the replay runs
    /// through the same queue as publications, so a racing [`Cell::set`]
    /// can never deliver a newer value ahead of the cached one. Single-shot
    /// cells never replay.
    pub fn subscribe(&self, observer: impl Fn(&T) + Send + Sync + 'static) -> ObserverId {
        let observer: ObserverFn<T> = Arc::new(observer);
        let mut state = self.lock_state();
        let id = state.next_observer_id;
        state.next_observer_id += 1;
        state.observers.push((id, observer));
        if self.inner.replay && state.value.is_some() {
            state.pending.push_back(Update::Replay(id));
            self.drain(state);
        }
        id
    }

    /// Detach an observer. Safe to call from inside that observer's own
    /// callback; the in-flight fan-out will not invoke it again.
    pub fn unsubscribe(&self, id: ObserverId) {
        self.lock_state().observers.retain(|(oid, _)| *oid != id);
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, CellState<T>> {
        // A poisoned lock means an observer or combine panicked mid-publish,
        // which is a contract violation; propagating the panic is intended.
        self.inner.state.lock().unwrap()
    }

    fn push(&self, update: Update<T>) {
        let mut state = self.lock_state();
        state.pending.push_back(update);
        self.drain(state);
    }

    /// Drain the pending queue unless another frame of this call stack (or
    /// another thread) is already draining. The single drain loop is what
    /// gives each cell its total order of deliveries, replays included.
    fn drain<'a>(&'a self, mut state: std::sync::MutexGuard<'a, CellState<T>>) {
        if state.draining {
            return;
        }
        state.draining = true;
        while let Some(update) = state.pending.pop_front() {
            let candidate = match update {
                Update::Value(v) => Some(v),
                // Combine reads sibling cells; the dependency graph is
                // acyclic, so locking them under our own lock cannot
                // deadlock.
                Update::Recompute => match &self.inner.combine {
                    Some(combine) => combine(),
                    None => None,
                },
                Update::Replay(id) => {
                    let target = state
                        .observers
                        .iter()
                        .find(|(oid, _)| *oid == id)
                        .map(|(_, observer)| Arc::clone(observer));
                    if let (Some(observer), Some(value)) = (target, state.value.clone()) {
                        drop(state);
                        observer(&value);
                        state = self.lock_state();
                    }
                    continue;
                }
            };
            let Some(value) = candidate else {
                continue; // not ready: suppress publication entirely
            };
            if self.inner.distinct && state.value.as_ref() == Some(&value) {
                continue;
            }
            state.value = Some(value.clone());
            let snapshot: Vec<(ObserverId, ObserverFn<T>)> = state.observers.clone();
            // Everyone in the snapshot receives this value directly; a
            // queued replay for any of them would deliver it a second time.
            state.pending.retain(|update| {
                !matches!(update, Update::Replay(id)
                    if snapshot.iter().any(|(oid, _)| oid == id))
            });
            // Release the lock during fan-out so observers may subscribe,
            // unsubscribe, or re-trigger this cell without deadlocking.
            // `draining` stays true, so re-entrant pushes only enqueue.
            drop(state);
            for (id, observer) in snapshot {
                let attached = self
                    .lock_state()
                    .observers
                    .iter()
                    .any(|(oid, _)| *oid == id);
                if attached {
                    observer(&value);
                }
            }
            state = self.lock_state();
        }
        state.draining = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |v: &T| sink.lock().unwrap().push(v.clone()))
    }

    #[test]
    fn source_cell_replays_on_subscribe() {
        let cell = Cell::source();
        cell.set(7);
        let (seen, rec) = recorder();
        cell.subscribe(rec);
        assert_eq!(*seen.lock().unwrap(), vec![7]);
    }

    #[test]
    fn source_cell_skips_equal_values() {
        let cell = Cell::source();
        let (seen, rec) = recorder();
        cell.subscribe(rec);
        cell.set(1);
        cell.set(1);
        cell.set(2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn single_shot_never_replays_and_never_dedups() {
        let cell = Cell::single_shot();
        cell.emit("before");
        let (seen, rec) = recorder();
        cell.subscribe(rec);
        cell.emit("a");
        cell.emit("a");
        assert_eq!(*seen.lock().unwrap(), vec!["a", "a"]);
    }

    #[test]
    fn derived_gates_until_every_upstream_has_a_value() {
        let left: Cell<i32> = Cell::source();
        let right: Cell<bool> = Cell::source();
        let (l, r) = (left.clone(), right.clone());
        let derived = Cell::derived(&[&left, &right], move || {
            let flag = r.get()?;
            let n = l.get()?;
            Some(if flag { -n } else { n })
        });
        let (seen, rec) = recorder();
        derived.subscribe(rec);

        left.set(3);
        assert!(seen.lock().unwrap().is_empty(), "half-ready must not publish");

        right.set(true);
        assert_eq!(*seen.lock().unwrap(), vec![-3]);

        left.set(5);
        assert_eq!(*seen.lock().unwrap(), vec![-3, -5]);
    }

    #[test]
    fn derived_computes_at_construction_from_live_upstreams() {
        let source = Cell::source();
        source.set(10);
        let s = source.clone();
        let derived = Cell::derived(&[&source], move || s.get().map(|v| v * 2));
        assert_eq!(derived.get(), Some(20));
    }

    #[test]
    fn unsubscribe_during_fanout_skips_the_detached_observer() {
        let cell: Cell<i32> = Cell::source();
        let calls = Arc::new(AtomicUsize::new(0));

        // First observer detaches the second one mid-fan-out.
        let handle: Arc<Mutex<Option<ObserverId>>> = Arc::new(Mutex::new(None));
        let (cell2, handle2) = (cell.clone(), Arc::clone(&handle));
        cell.subscribe(move |_| {
            if let Some(id) = handle2.lock().unwrap().take() {
                cell2.unsubscribe(id);
            }
        });
        let calls2 = Arc::clone(&calls);
        let second = cell.subscribe(move |_| {
            calls2.fetch_add(1, Ordering::SeqCst);
        });
        *handle.lock().unwrap() = Some(second);

        cell.set(1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        cell.set(2);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn self_unsubscribe_inside_callback_does_not_crash() {
        let cell: Cell<i32> = Cell::single_shot();
        let own_id: Arc<Mutex<Option<ObserverId>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(AtomicUsize::new(0));
        let (c, slot, n) = (cell.clone(), Arc::clone(&own_id), Arc::clone(&calls));
        let id = cell.subscribe(move |_| {
            n.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = slot.lock().unwrap().take() {
                c.unsubscribe(id);
            }
        });
        *own_id.lock().unwrap() = Some(id);

        cell.emit(1);
        cell.emit(2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reentrant_emission_is_queued_after_current_fanout() {
        let cell: Cell<i32> = Cell::single_shot();
        let order = Arc::new(Mutex::new(Vec::new()));

        // Observer A re-emits once; observer B records. B must see the
        // original value before the re-entrant one even though A runs first.
        let (c, fired) = (cell.clone(), Arc::new(AtomicUsize::new(0)));
        cell.subscribe(move |v| {
            if *v == 1 && fired.fetch_add(1, Ordering::SeqCst) == 0 {
                c.emit(2);
            }
        });
        let log = Arc::clone(&order);
        cell.subscribe(move |v| log.lock().unwrap().push(*v));

        cell.emit(1);
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn observers_run_in_subscription_order() {
        let cell: Cell<i32> = Cell::single_shot();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let log = Arc::clone(&order);
            cell.subscribe(move |_| log.lock().unwrap().push(tag));
        }
        cell.emit(0);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn replay_is_ordered_with_a_racing_publication() {
        // A subscriber attaching while another thread publishes must never
        // receive the stale cached value after the newer one.
        for _ in 0..2000 {
            let cell: Cell<i32> = Cell::source();
            cell.set(1);
            let writer = {
                let cell = cell.clone();
                std::thread::spawn(move || cell.set(2))
            };
            let (seen, rec) = recorder();
            cell.subscribe(rec);
            writer.join().unwrap();
            let seen = seen.lock().unwrap().clone();
            assert!(
                seen == vec![1, 2] || seen == vec![2],
                "out-of-order or duplicated delivery: {seen:?}"
            );
        }
    }

    #[test]
    fn subscribe_during_fanout_replays_the_value_in_flight_exactly_once() {
        let cell: Cell<i32> = Cell::source();
        cell.set(1);
        let inner_seen = Arc::new(Mutex::new(Vec::new()));
        let (c, log) = (cell.clone(), Arc::clone(&inner_seen));
        cell.subscribe(move |v| {
            if *v == 2 {
                let log = Arc::clone(&log);
                c.subscribe(move |v| log.lock().unwrap().push(*v));
            }
        });
        cell.set(2);
        assert_eq!(*inner_seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn concurrent_publications_keep_cell_totally_ordered() {
        let cell: Cell<usize> = Cell::single_shot();
        let count = Arc::new(AtomicUsize::new(0));
        let n = Arc::clone(&count);
        cell.subscribe(move |_| {
            n.fetch_add(1, Ordering::SeqCst);
        });

        let threads: Vec<_> = (0..8)
            .map(|t| {
                let cell = cell.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        cell.emit(t * 100 + i);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(count.load(Ordering::SeqCst), 800);
    }
}
