//! The shared-state hub: a value store plus its change notifier.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::HubConfig;
use crate::error::HubResult;
use crate::event::ChangeEvent;
use crate::guard;
use crate::ids::{ActorId, HubId, ObserverId, ScopeId, SessionId};
use crate::notifier::{self, ChangeNotifier, ChangeObserver, GuardedObserver, Subscription};
use crate::record::ValueRecord;
use crate::store::ValueStore;
use crate::value::Value;

/// How a hub was obtained, and therefore how it will be disposed of.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum HubOrigin {
    /// Registered by an explicit scope-opened signal; removed on scope close.
    Circuit(ScopeId),
    /// Created lazily for a session; removed by an idle sweep.
    Session(SessionId),
    /// Never registered. Lives only as long as its holders.
    Ephemeral,
}

impl HubOrigin {
    #[must_use]
    pub const fn is_ephemeral(&self) -> bool {
        matches!(self, Self::Ephemeral)
    }
}

impl fmt::Display for HubOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Circuit(id) => write!(f, "circuit:{id}"),
            Self::Session(id) => write!(f, "session:{id}"),
            Self::Ephemeral => write!(f, "ephemeral"),
        }
    }
}

/// Optional parameters of `notify_*`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyOptions {
    /// Actors that declared interest in the change. Advisory only.
    pub getters: BTreeSet<ActorId>,
    /// Mark the event as raised from inside another notification's handler.
    pub reentrant: bool,
}

impl NotifyOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn getter(mut self, actor: impl Into<ActorId>) -> Self {
        self.getters.insert(actor.into());
        self
    }

    #[must_use]
    pub fn getters<I, A>(mut self, actors: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ActorId>,
    {
        self.getters.extend(actors.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub const fn reentrant(mut self, reentrant: bool) -> Self {
        self.reentrant = reentrant;
        self
    }

    /// Set `reentrant` when called from inside an observer handler.
    #[must_use]
    pub fn reentrant_if_broadcasting(self) -> Self {
        self.reentrant(notifier::is_broadcasting())
    }
}

/// Shared, observable property store for one scope or session.
///
/// Write with [`Hub::store`] and announce with [`Hub::notify_one`] /
/// [`Hub::notify_many`]. Observers run synchronously on the notifying thread
/// after the store lock has been released, so a handler may call back into
/// the hub.
pub struct Hub {
    id: HubId,
    origin: HubOrigin,
    created_at: DateTime<Utc>,
    store: ValueStore,
    notifier: ChangeNotifier,
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("id", &self.id)
            .field("origin", &self.origin)
            .field("created_at", &self.created_at)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

impl Hub {
    /// Create a hub with the given origin.
    #[must_use]
    pub fn new(origin: HubOrigin, config: &HubConfig) -> Self {
        Self {
            id: HubId::new(),
            origin,
            created_at: Utc::now(),
            store: ValueStore::new(config),
            notifier: ChangeNotifier::new(),
        }
    }

    /// An unregistered hub with default settings.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self::new(HubOrigin::Ephemeral, &HubConfig::default())
    }

    #[must_use]
    pub const fn id(&self) -> HubId {
        self.id
    }

    #[must_use]
    pub const fn origin(&self) -> &HubOrigin {
        &self.origin
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time of the most recent store or read.
    pub fn last_access(&self) -> HubResult<DateTime<Utc>> {
        self.store.last_access()
    }

    /// Store a value without notifying anyone.
    pub fn store(
        &self,
        scope: &ScopeId,
        property: &str,
        value: impl Into<Value>,
        setter: &ActorId,
    ) -> HubResult<()> {
        self.store.store(scope, property, value.into(), setter)
    }

    pub fn get(&self, scope: &ScopeId, property: &str) -> HubResult<Option<ValueRecord>> {
        self.store.get(scope, property)
    }

    pub fn get_value(&self, scope: &ScopeId, property: &str) -> HubResult<Option<Value>> {
        self.store.get_value(scope, property)
    }

    pub fn properties(&self, scope: &ScopeId) -> HubResult<Vec<String>> {
        self.store.properties(scope)
    }

    /// Direct access to the underlying store.
    #[must_use]
    pub const fn values(&self) -> &ValueStore {
        &self.store
    }

    /// Store `value` and broadcast a single-property change.
    pub fn notify_one(
        &self,
        scope: &ScopeId,
        property: &str,
        value: impl Into<Value>,
        setter: &ActorId,
    ) -> HubResult<()> {
        self.notify_one_with(scope, property, value, setter, NotifyOptions::default())
    }

    /// [`Hub::notify_one`] with getters and reentrancy flag.
    pub fn notify_one_with(
        &self,
        scope: &ScopeId,
        property: &str,
        value: impl Into<Value>,
        setter: &ActorId,
        opts: NotifyOptions,
    ) -> HubResult<()> {
        let value = value.into();
        self.store.store(scope, property, value.clone(), setter)?;
        let event = ChangeEvent::single(
            scope.clone(),
            property.to_string(),
            value,
            setter.clone(),
            opts.getters,
            opts.reentrant,
        );
        self.notifier.broadcast(self, &event)
    }

    /// Broadcast a multi-property change.
    ///
    /// Unlike [`Hub::notify_one`] this stores nothing: callers store each value
    /// first, then announce the batch.
    pub fn notify_many<S: AsRef<str>>(
        &self,
        scope: &ScopeId,
        properties: &[S],
        setter: &ActorId,
    ) -> HubResult<()> {
        self.notify_many_with(scope, properties, setter, NotifyOptions::default())
    }

    /// [`Hub::notify_many`] with getters and reentrancy flag.
    pub fn notify_many_with<S: AsRef<str>>(
        &self,
        scope: &ScopeId,
        properties: &[S],
        setter: &ActorId,
        opts: NotifyOptions,
    ) -> HubResult<()> {
        let event = ChangeEvent::batch(
            scope.clone(),
            properties.iter().map(|p| p.as_ref().to_string()).collect(),
            setter.clone(),
            opts.getters,
            opts.reentrant,
        );
        self.notifier.broadcast(self, &event)
    }

    /// Re-announce the current value of `property` on behalf of `setter`.
    ///
    /// The value (or [`Value::Null`] if nothing is stored) is written back under
    /// `setter` before the broadcast, so the record's writer and history
    /// reflect the re-announcement.
    pub fn renotify(
        &self,
        scope: &ScopeId,
        property: &str,
        setter: &ActorId,
        opts: NotifyOptions,
    ) -> HubResult<()> {
        let value = self.store.get_value(scope, property)?.unwrap_or_default();
        self.notify_one_with(scope, property, value, setter, opts)
    }

    /// Loop guard check for an observer of this hub.
    #[must_use]
    pub fn should_process_event(
        &self,
        observer_scope: &ScopeId,
        observer_actor: &ActorId,
        event: &ChangeEvent,
    ) -> bool {
        guard::should_deliver(observer_scope, observer_actor, event)
    }

    /// Register an observer that receives every event of this hub.
    pub fn subscribe(&self, observer: Arc<dyn ChangeObserver>) -> HubResult<Subscription> {
        self.notifier.subscribe(observer)
    }

    /// Register an observer that only sees events the loop guard delivers to
    /// `(scope, actor)`.
    pub fn subscribe_guarded<O>(
        &self,
        scope: ScopeId,
        actor: ActorId,
        observer: O,
    ) -> HubResult<Subscription>
    where
        O: ChangeObserver + 'static,
    {
        self.notifier
            .subscribe(Arc::new(GuardedObserver::new(scope, actor, observer)))
    }

    pub fn unsubscribe(&self, id: ObserverId) -> HubResult<bool> {
        self.notifier.unsubscribe(id)
    }

    pub fn observer_count(&self) -> HubResult<usize> {
        self.notifier.observer_count()
    }

    #[cfg(test)]
    pub(crate) fn set_last_access(&self, at: DateTime<Utc>) {
        self.store.set_last_access(at);
    }
}
