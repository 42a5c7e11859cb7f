use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::RegistryConfig;
use crate::error::{HubError, HubResult};
use crate::hub::{Hub, HubOrigin};
use crate::ids::{ScopeId, SessionId};

use super::context::AmbientContext;

type Table<K> = RwLock<HashMap<K, Arc<Hub>>>;

fn read<'a, K>(
    table: &'a Table<K>,
    context: &'static str,
) -> HubResult<RwLockReadGuard<'a, HashMap<K, Arc<Hub>>>> {
    table.read().map_err(|_| HubError::poisoned(context))
}

fn write<'a, K>(
    table: &'a Table<K>,
    context: &'static str,
) -> HubResult<RwLockWriteGuard<'a, HashMap<K, Arc<Hub>>>> {
    table.write().map_err(|_| HubError::poisoned(context))
}

/// A poisoned hub can no longer be used, so it counts as idle.
fn is_idle(hub: &Hub, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
    hub.last_access().map_or(true, |at| now - at > timeout)
}

/// Registry of circuit-scoped and session-scoped hubs.
///
/// Construct one per process at the composition root and share it (usually
/// behind an `Arc`). Nothing here runs on its own: sweeps happen when a caller
/// or a [`super::SweepWorker`] asks for them.
#[derive(Debug, Default)]
pub struct ScopeRegistry {
    config: RegistryConfig,
    circuits: Table<ScopeId>,
    sessions: Table<SessionId>,
}

impl ScopeRegistry {
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            circuits: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a hub for a newly opened circuit.
    ///
    /// Opening an already open circuit returns the existing hub.
    pub fn on_scope_opened(&self, scope: &ScopeId) -> HubResult<Arc<Hub>> {
        let mut circuits = write(&self.circuits, "registry.circuits.open")?;
        if let Some(hub) = circuits.get(scope) {
            return Ok(Arc::clone(hub));
        }
        let hub = Arc::new(Hub::new(HubOrigin::Circuit(scope.clone()), &self.config.hub));
        circuits.insert(scope.clone(), Arc::clone(&hub));
        tracing::debug!(scope = %scope, hub = %hub.id(), "circuit opened");
        Ok(hub)
    }

    /// Drop the circuit's hub from the registry. Unknown scopes are ignored.
    ///
    /// Returns true if a hub was removed.
    pub fn on_scope_closed(&self, scope: &ScopeId) -> HubResult<bool> {
        let removed = write(&self.circuits, "registry.circuits.close")?.remove(scope);
        if let Some(hub) = &removed {
            tracing::debug!(scope = %scope, hub = %hub.id(), "circuit closed");
        }
        Ok(removed.is_some())
    }

    /// The open circuit's hub, if any.
    pub fn circuit(&self, scope: &ScopeId) -> HubResult<Option<Arc<Hub>>> {
        Ok(read(&self.circuits, "registry.circuits.get")?.get(scope).cloned())
    }

    /// The session's hub, if it exists and has not been swept.
    pub fn session(&self, session: &SessionId) -> HubResult<Option<Arc<Hub>>> {
        Ok(read(&self.sessions, "registry.sessions.get")?.get(session).cloned())
    }

    /// Resolve the hub for a caller.
    ///
    /// 1. A non-blank `scope` naming an open circuit wins.
    /// 2. Otherwise a non-blank `session` gets its hub, created on first use.
    /// 3. Otherwise the caller gets a fresh hub that is never registered.
    pub fn get_or_create(
        &self,
        scope: Option<&ScopeId>,
        session: Option<&SessionId>,
    ) -> HubResult<Arc<Hub>> {
        if let Some(scope) = scope.filter(|s| !s.is_blank()) {
            if let Some(hub) = self.circuit(scope)? {
                return Ok(hub);
            }
        }

        if let Some(session) = session.filter(|s| !s.is_blank()) {
            return self.session_hub(session);
        }

        tracing::debug!(
            scope = scope.map(ScopeId::as_str),
            "no ambient scope or session; using an ephemeral hub"
        );
        Ok(Arc::new(Hub::new(HubOrigin::Ephemeral, &self.config.hub)))
    }

    /// [`ScopeRegistry::get_or_create`] with ids taken from `ctx`.
    pub fn get_or_create_ambient(&self, ctx: &dyn AmbientContext) -> HubResult<Arc<Hub>> {
        let scope = ctx.scope_id();
        let session = ctx.session_id();
        self.get_or_create(scope.as_ref(), session.as_ref())
    }

    fn session_hub(&self, session: &SessionId) -> HubResult<Arc<Hub>> {
        if let Some(hub) = self.session(session)? {
            return Ok(hub);
        }

        let mut sessions = write(&self.sessions, "registry.sessions.create")?;
        if let Some(hub) = sessions.get(session) {
            return Ok(Arc::clone(hub));
        }
        let hub = Arc::new(Hub::new(HubOrigin::Session(session.clone()), &self.config.hub));
        sessions.insert(session.clone(), Arc::clone(&hub));
        tracing::debug!(session = %session, hub = %hub.id(), "session hub created");
        Ok(hub)
    }

    /// Evict session hubs idle for longer than `idle_timeout`.
    ///
    /// Circuit hubs are never swept. Returns the number of evicted hubs.
    pub fn sweep(&self, idle_timeout: Duration) -> HubResult<usize> {
        self.sweep_as_of(Utc::now(), idle_timeout)
    }

    /// [`ScopeRegistry::sweep`] against an explicit clock reading.
    ///
    /// A hub is idle when `now - last_access > idle_timeout`. Hubs touched
    /// between the scan and the removal are kept.
    pub fn sweep_as_of(&self, now: DateTime<Utc>, idle_timeout: Duration) -> HubResult<usize> {
        let Ok(timeout) = chrono::Duration::from_std(idle_timeout) else {
            return Ok(0);
        };

        let candidates: Vec<SessionId> = read(&self.sessions, "registry.sessions.scan")?
            .iter()
            .filter(|&(_, hub)| is_idle(hub, now, timeout))
            .map(|(id, _)| id.clone())
            .collect();
        if candidates.is_empty() {
            return Ok(0);
        }

        let evicted = self.evict_idle(candidates, now, timeout)?;
        if evicted > 0 {
            tracing::info!(
                evicted,
                idle_timeout_secs = idle_timeout.as_secs(),
                "swept idle session hubs"
            );
        }
        Ok(evicted)
    }

    /// Remove the candidates that are still idle under the write lock.
    fn evict_idle(
        &self,
        candidates: Vec<SessionId>,
        now: DateTime<Utc>,
        timeout: chrono::Duration,
    ) -> HubResult<usize> {
        let mut sessions = write(&self.sessions, "registry.sessions.sweep")?;
        let mut evicted = 0;
        for id in candidates {
            if sessions.get(&id).is_some_and(|hub| is_idle(hub, now, timeout)) {
                sessions.remove(&id);
                evicted += 1;
            }
        }
        Ok(evicted)
    }

    pub fn circuit_count(&self) -> HubResult<usize> {
        Ok(read(&self.circuits, "registry.circuits.len")?.len())
    }

    pub fn session_count(&self) -> HubResult<usize> {
        Ok(read(&self.sessions, "registry.sessions.len")?.len())
    }
}
