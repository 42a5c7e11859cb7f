//! Change event snapshots.
//!
//! Events are built once at broadcast time and handed to observers by
//! reference. They copy everything they carry and never point back into the
//! store, so a later write cannot change an event an observer is holding.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ActorId, EventId, ScopeId};
use crate::value::{Value, ValueType};

/// A change to one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleChange {
    id: EventId,
    raised_at: DateTime<Utc>,
    scope_id: ScopeId,
    property: String,
    value: Value,
    value_type: ValueType,
    setter: ActorId,
    getters: BTreeSet<ActorId>,
    is_reentrant: bool,
}

/// A change to several properties, announced together.
///
/// Carries names only; observers read current values from the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchChange {
    id: EventId,
    raised_at: DateTime<Utc>,
    scope_id: ScopeId,
    properties: Vec<String>,
    setter: ActorId,
    getters: BTreeSet<ActorId>,
    is_reentrant: bool,
}

/// An immutable change notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    Single(SingleChange),
    Batch(BatchChange),
}

impl ChangeEvent {
    pub(crate) fn single(
        scope_id: ScopeId,
        property: String,
        value: Value,
        setter: ActorId,
        getters: BTreeSet<ActorId>,
        is_reentrant: bool,
    ) -> Self {
        Self::Single(SingleChange {
            id: EventId::new(),
            raised_at: Utc::now(),
            scope_id,
            property,
            value_type: value.value_type(),
            value,
            setter,
            getters,
            is_reentrant,
        })
    }

    pub(crate) fn batch(
        scope_id: ScopeId,
        properties: Vec<String>,
        setter: ActorId,
        getters: BTreeSet<ActorId>,
        is_reentrant: bool,
    ) -> Self {
        Self::Batch(BatchChange {
            id: EventId::new(),
            raised_at: Utc::now(),
            scope_id,
            properties,
            setter,
            getters,
            is_reentrant,
        })
    }

    #[must_use]
    pub const fn id(&self) -> EventId {
        match self {
            Self::Single(e) => e.id,
            Self::Batch(e) => e.id,
        }
    }

    #[must_use]
    pub const fn raised_at(&self) -> DateTime<Utc> {
        match self {
            Self::Single(e) => e.raised_at,
            Self::Batch(e) => e.raised_at,
        }
    }

    #[must_use]
    pub const fn scope_id(&self) -> &ScopeId {
        match self {
            Self::Single(e) => &e.scope_id,
            Self::Batch(e) => &e.scope_id,
        }
    }

    #[must_use]
    pub const fn setter(&self) -> &ActorId {
        match self {
            Self::Single(e) => &e.setter,
            Self::Batch(e) => &e.setter,
        }
    }

    /// Actors that declared interest. Advisory: delivery ignores it.
    #[must_use]
    pub const fn getters(&self) -> &BTreeSet<ActorId> {
        match self {
            Self::Single(e) => &e.getters,
            Self::Batch(e) => &e.getters,
        }
    }

    /// True if raised from inside another notification's handling.
    #[must_use]
    pub const fn is_reentrant(&self) -> bool {
        match self {
            Self::Single(e) => e.is_reentrant,
            Self::Batch(e) => e.is_reentrant,
        }
    }

    /// Property names touched by this event, in caller order.
    #[must_use]
    pub fn property_names(&self) -> Vec<&str> {
        match self {
            Self::Single(e) => vec![e.property.as_str()],
            Self::Batch(e) => e.properties.iter().map(String::as_str).collect(),
        }
    }

    /// True if `property` is among the changed names.
    #[must_use]
    pub fn touches(&self, property: &str) -> bool {
        match self {
            Self::Single(e) => e.property == property,
            Self::Batch(e) => e.properties.iter().any(|p| p == property),
        }
    }

    /// The single property name, or the batch names joined with `,`.
    #[must_use]
    pub fn property_label(&self) -> String {
        match self {
            Self::Single(e) => e.property.clone(),
            Self::Batch(e) => e.properties.join(","),
        }
    }

    #[must_use]
    pub const fn as_single(&self) -> Option<&SingleChange> {
        match self {
            Self::Single(e) => Some(e),
            Self::Batch(_) => None,
        }
    }

    #[must_use]
    pub const fn as_batch(&self) -> Option<&BatchChange> {
        match self {
            Self::Batch(e) => Some(e),
            Self::Single(_) => None,
        }
    }
}

impl SingleChange {
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        self.value_type
    }
}

impl BatchChange {
    #[must_use]
    pub fn properties(&self) -> &[String] {
        &self.properties
    }
}
