//! Mutex-guarded property store.
//!
//! Records are keyed by `(scope, property)`. The store also owns the hub's
//! last-access timestamp so that writes, reads and the timestamp update share a
//! single critical section.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::config::HubConfig;
use crate::error::{HubError, HubResult};
use crate::ids::{ActorId, ScopeId};
use crate::record::ValueRecord;
use crate::value::Value;

type StoreKey = (ScopeId, String);

#[derive(Debug)]
struct StoreState {
    records: HashMap<StoreKey, ValueRecord>,
    last_access: DateTime<Utc>,
}

/// Thread-safe keyed store with modification metadata.
#[derive(Debug)]
pub struct ValueStore {
    state: Mutex<StoreState>,
    history_limit: Option<usize>,
}

impl Default for ValueStore {
    fn default() -> Self {
        Self::new(&HubConfig::default())
    }
}

impl ValueStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(config: &HubConfig) -> Self {
        Self {
            state: Mutex::new(StoreState {
                records: HashMap::new(),
                last_access: Utc::now(),
            }),
            history_limit: config.history_limit,
        }
    }

    fn lock(&self, context: &'static str) -> HubResult<MutexGuard<'_, StoreState>> {
        self.state.lock().map_err(|_| HubError::poisoned(context))
    }

    /// Upsert the record for `(scope, property)`.
    ///
    /// An existing record's value, writer and timestamp move into its history
    /// before being overwritten.
    pub fn store(
        &self,
        scope: &ScopeId,
        property: &str,
        value: Value,
        setter: &ActorId,
    ) -> HubResult<()> {
        let mut state = self.lock("store.store")?;
        let now = Utc::now();
        state.last_access = now;

        match state.records.entry((scope.clone(), property.to_string())) {
            Entry::Occupied(mut slot) => {
                slot.get_mut()
                    .overwrite(value, setter.clone(), now, self.history_limit);
            }
            Entry::Vacant(slot) => {
                slot.insert(ValueRecord::new(value, setter.clone(), now));
            }
        }
        Ok(())
    }

    /// Look up the record for `(scope, property)`.
    pub fn get(&self, scope: &ScopeId, property: &str) -> HubResult<Option<ValueRecord>> {
        let mut state = self.lock("store.get")?;
        state.last_access = Utc::now();
        let key = (scope.clone(), property.to_string());
        Ok(state.records.get(&key).cloned())
    }

    /// Look up only the value for `(scope, property)`.
    pub fn get_value(&self, scope: &ScopeId, property: &str) -> HubResult<Option<Value>> {
        let mut state = self.lock("store.get_value")?;
        state.last_access = Utc::now();
        let key = (scope.clone(), property.to_string());
        Ok(state.records.get(&key).map(|r| r.value.clone()))
    }

    /// Property names stored under `scope`, sorted.
    pub fn properties(&self, scope: &ScopeId) -> HubResult<Vec<String>> {
        let mut state = self.lock("store.properties")?;
        state.last_access = Utc::now();
        let mut out: Vec<String> = state
            .records
            .keys()
            .filter(|(s, _)| s == scope)
            .map(|(_, p)| p.clone())
            .collect();
        out.sort();
        Ok(out)
    }

    /// Time of the most recent read or write.
    pub fn last_access(&self) -> HubResult<DateTime<Utc>> {
        Ok(self.lock("store.last_access")?.last_access)
    }

    /// Number of stored records across all scopes.
    pub fn len(&self) -> HubResult<usize> {
        Ok(self.lock("store.len")?.records.len())
    }

    pub fn is_empty(&self) -> HubResult<bool> {
        Ok(self.len()? == 0)
    }

    #[cfg(test)]
    pub(crate) fn set_last_access(&self, at: DateTime<Utc>) {
        if let Ok(mut state) = self.state.lock() {
            state.last_access = at;
        }
    }
}
