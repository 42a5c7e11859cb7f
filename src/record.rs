//! Stored value records and their modification history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ActorId;
use crate::value::{Value, ValueType};

/// One prior state of a record, captured when it was overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Who wrote the overwritten value.
    pub modified_by: ActorId,
    /// When the overwritten value was written.
    pub modified_at: DateTime<Utc>,
    /// The overwritten value.
    pub previous_value: Value,
}

/// The current value stored under a `(scope, property)` key.
///
/// History is an audit trail, oldest first. It never takes part in deciding
/// which write wins: the latest `store` always does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    pub value: Value,
    pub value_type: ValueType,
    pub last_modified_by: ActorId,
    pub last_modified_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
}

impl ValueRecord {
    /// Creates a record with no history.
    #[must_use]
    pub fn new(value: Value, setter: ActorId, at: DateTime<Utc>) -> Self {
        Self {
            value_type: value.value_type(),
            value,
            last_modified_by: setter,
            last_modified_at: at,
            history: Vec::new(),
        }
    }

    /// Overwrites the record, pushing the current state onto history.
    ///
    /// With `history_limit = Some(n)` only the newest `n` entries are kept.
    pub(crate) fn overwrite(
        &mut self,
        value: Value,
        setter: ActorId,
        at: DateTime<Utc>,
        history_limit: Option<usize>,
    ) {
        let previous_value = std::mem::replace(&mut self.value, value);
        let modified_by = std::mem::replace(&mut self.last_modified_by, setter);
        self.history.push(HistoryEntry {
            modified_by,
            modified_at: self.last_modified_at,
            previous_value,
        });
        self.value_type = self.value.value_type();
        self.last_modified_at = at;

        if let Some(limit) = history_limit {
            if self.history.len() > limit {
                let excess = self.history.len() - limit;
                self.history.drain(..excess);
            }
        }
    }

    /// Number of prior writes retained in history.
    #[must_use]
    pub fn revisions(&self) -> usize {
        self.history.len()
    }
}
