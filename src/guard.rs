//! Loop prevention for change observers.
//!
//! Observers receive every event their hub broadcasts and decide for
//! themselves whether to react. The decision is identity-based: an observer
//! ignores events from other scopes, events it wrote itself, and events raised
//! while another notification was being handled.
//!
//! Two writers that share an actor name are indistinguishable here and will
//! suppress each other's notifications.

use crate::event::ChangeEvent;
use crate::ids::{ActorId, ScopeId};

/// Outcome of evaluating an event for one observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// The observer should react.
    Deliver,
    /// The event belongs to another scope.
    CrossScope,
    /// The observer wrote this change itself.
    SelfEcho,
    /// The event was raised while handling another notification.
    Reentrant,
}

impl Delivery {
    #[must_use]
    pub const fn is_deliver(self) -> bool {
        matches!(self, Self::Deliver)
    }

    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Deliver => "deliver",
            Self::CrossScope => "cross_scope",
            Self::SelfEcho => "self_echo",
            Self::Reentrant => "reentrant",
        }
    }
}

/// Evaluate `event` for an observer in `observer_scope` acting as `observer_actor`.
///
/// Checks run in order: scope, setter, reentrancy. Identifiers compare
/// case-insensitively.
#[must_use]
pub fn evaluate(
    observer_scope: &ScopeId,
    observer_actor: &ActorId,
    event: &ChangeEvent,
) -> Delivery {
    if !event.scope_id().matches(observer_scope) {
        return Delivery::CrossScope;
    }
    if event.setter().matches(observer_actor) {
        return Delivery::SelfEcho;
    }
    if event.is_reentrant() {
        return Delivery::Reentrant;
    }
    Delivery::Deliver
}

/// True if an observer in `observer_scope` acting as `observer_actor` should
/// react to `event`.
#[must_use]
pub fn should_deliver(
    observer_scope: &ScopeId,
    observer_actor: &ActorId,
    event: &ChangeEvent,
) -> bool {
    evaluate(observer_scope, observer_actor, event).is_deliver()
}
