//! Synchronous change fan-out.
//!
//! Observers are kept in registration order. A broadcast takes a snapshot of
//! the list, releases the list lock, then calls every observer in turn on the
//! caller's thread. Observers may therefore write to the hub, notify again, or
//! (un)subscribe from inside a handler; list changes apply to the next
//! broadcast.
//!
//! A handler that blocks stalls the thread that called `notify_*`. There is no
//! queue between the notifier and its observers.

use std::cell::Cell;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::error::{HubError, HubResult, ObserverResult};
use crate::event::ChangeEvent;
use crate::guard;
use crate::hub::Hub;
use crate::ids::{ActorId, ObserverId, ScopeId};

/// Receives change events from a hub.
///
/// The hub is passed in so handlers can read or write it without holding their
/// own strong reference, which would keep the hub alive forever.
pub trait ChangeObserver: Send + Sync {
    /// Handle one event. Returning an error stops delivery to observers
    /// registered after this one and surfaces the error to the notifier's caller.
    fn on_change(&self, hub: &Hub, event: &ChangeEvent) -> ObserverResult;
}

impl<F> ChangeObserver for F
where
    F: Fn(&Hub, &ChangeEvent) -> ObserverResult + Send + Sync,
{
    fn on_change(&self, hub: &Hub, event: &ChangeEvent) -> ObserverResult {
        self(hub, event)
    }
}

struct ObserverEntry {
    id: ObserverId,
    observer: Arc<dyn ChangeObserver>,
}

type ObserverList = Mutex<Vec<ObserverEntry>>;

thread_local! {
    static BROADCAST_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Counts nested broadcasts on this thread; decrements on drop so a panicking
/// or failing observer leaves the count balanced.
struct DepthGuard;

impl DepthGuard {
    fn enter() -> Self {
        BROADCAST_DEPTH.with(|d| d.set(d.get() + 1));
        Self
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        BROADCAST_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// True while the current thread is running an observer handler of any hub.
#[must_use]
pub fn is_broadcasting() -> bool {
    BROADCAST_DEPTH.with(Cell::get) > 0
}

/// Ordered observer list with synchronous broadcast.
#[derive(Default)]
pub struct ChangeNotifier {
    observers: Arc<ObserverList>,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.observers.lock().map(|o| o.len()).unwrap_or_default();
        f.debug_struct("ChangeNotifier")
            .field("observers", &count)
            .finish()
    }
}

fn lock_observers<'a>(
    list: &'a ObserverList,
    context: &'static str,
) -> HubResult<MutexGuard<'a, Vec<ObserverEntry>>> {
    list.lock().map_err(|_| HubError::poisoned(context))
}

impl ChangeNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observer. Dropping the returned handle removes it.
    pub fn subscribe(&self, observer: Arc<dyn ChangeObserver>) -> HubResult<Subscription> {
        let id = ObserverId::new();
        lock_observers(&self.observers, "observers.subscribe")?
            .push(ObserverEntry { id, observer });
        tracing::debug!(observer = %id, "observer subscribed");
        Ok(Subscription {
            id,
            observers: Arc::downgrade(&self.observers),
            active: true,
        })
    }

    /// Remove an observer by id. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ObserverId) -> HubResult<bool> {
        remove_observer(&self.observers, id)
    }

    pub fn observer_count(&self) -> HubResult<usize> {
        Ok(lock_observers(&self.observers, "observers.count")?.len())
    }

    /// Call every observer registered at the time of the call, in order.
    ///
    /// Stops at the first observer error. Panics propagate unchanged.
    pub fn broadcast(&self, hub: &Hub, event: &ChangeEvent) -> HubResult<()> {
        let snapshot: Vec<(ObserverId, Arc<dyn ChangeObserver>)> =
            lock_observers(&self.observers, "observers.snapshot")?
                .iter()
                .map(|e| (e.id, Arc::clone(&e.observer)))
                .collect();

        tracing::trace!(
            event = %event.id(),
            scope = %event.scope_id(),
            properties = %event.property_label(),
            setter = %event.setter(),
            reentrant = event.is_reentrant(),
            observers = snapshot.len(),
            "broadcasting change"
        );

        let _depth = DepthGuard::enter();
        for (id, observer) in snapshot {
            observer
                .on_change(hub, event)
                .map_err(|source| HubError::Observer { observer: id, source })?;
        }
        Ok(())
    }
}

fn remove_observer(list: &ObserverList, id: ObserverId) -> HubResult<bool> {
    let mut observers = lock_observers(list, "observers.unsubscribe")?;
    let before = observers.len();
    observers.retain(|e| e.id != id);
    let removed = observers.len() != before;
    if removed {
        tracing::debug!(observer = %id, "observer unsubscribed");
    }
    Ok(removed)
}

/// Registration handle for an observer.
///
/// Dropping it unregisters the observer. Use [`Subscription::detach`] to keep
/// the observer registered for the hub's whole lifetime.
#[must_use = "dropping a Subscription unregisters the observer"]
pub struct Subscription {
    id: ObserverId,
    observers: Weak<ObserverList>,
    active: bool,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}

impl Subscription {
    #[must_use]
    pub const fn id(&self) -> ObserverId {
        self.id
    }

    /// Unregister now. Returns false if the hub is gone or the observer was
    /// already removed.
    pub fn unsubscribe(mut self) -> HubResult<bool> {
        self.active = false;
        match self.observers.upgrade() {
            Some(list) => remove_observer(&list, self.id),
            None => Ok(false),
        }
    }

    /// Keep the observer registered after this handle is dropped.
    pub fn detach(mut self) -> ObserverId {
        self.active = false;
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Some(list) = self.observers.upgrade() {
            let _ = remove_observer(&list, self.id);
        }
    }
}

/// Observer wrapper that only forwards events the loop guard lets through for
/// a fixed `(scope, actor)` identity.
pub struct GuardedObserver<O> {
    scope: ScopeId,
    actor: ActorId,
    inner: O,
}

impl<O> GuardedObserver<O> {
    pub fn new(scope: ScopeId, actor: ActorId, inner: O) -> Self {
        Self { scope, actor, inner }
    }

    #[must_use]
    pub const fn scope(&self) -> &ScopeId {
        &self.scope
    }

    #[must_use]
    pub const fn actor(&self) -> &ActorId {
        &self.actor
    }
}

impl<O: ChangeObserver> ChangeObserver for GuardedObserver<O> {
    fn on_change(&self, hub: &Hub, event: &ChangeEvent) -> ObserverResult {
        let delivery = guard::evaluate(&self.scope, &self.actor, event);
        if !delivery.is_deliver() {
            tracing::trace!(
                event = %event.id(),
                actor = %self.actor,
                reason = delivery.reason(),
                "event suppressed"
            );
            return Ok(());
        }
        self.inner.on_change(hub, event)
    }
}
