//! Error types for scopehub.
//!
//! Lookups that miss are not errors: they return `Ok(None)`. The only failures
//! a caller sees are observer failures propagated out of a broadcast, poisoned
//! hub locks, and sweep worker startup problems.

use thiserror::Error;

use crate::ids::ObserverId;

/// Boxed error returned by an observer handler.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type returned by observer handlers.
pub type ObserverResult = Result<(), ObserverError>;

/// Top-level error type for scopehub.
#[derive(Debug, Error)]
pub enum HubError {
    /// An observer failed during broadcast. Delivery to observers registered
    /// after it was skipped.
    #[error("Observer {observer} failed: {source}")]
    Observer {
        observer: ObserverId,
        #[source]
        source: ObserverError,
    },

    /// A hub or registry lock was poisoned by a panic in another thread.
    #[error("Poisoned lock: {context}")]
    LockPoisoned {
        context: &'static str,
    },

    /// The background sweep worker could not be started or stopped.
    #[error("Sweep worker error: {message}")]
    Worker {
        message: String,
    },
}

impl HubError {
    /// Creates a lock poisoning error for the named critical section.
    #[must_use]
    pub const fn poisoned(context: &'static str) -> Self {
        Self::LockPoisoned { context }
    }

    /// Returns true if this error came out of an observer handler.
    #[must_use]
    pub const fn is_observer(&self) -> bool {
        matches!(self, Self::Observer { .. })
    }

    /// Returns true if this is a lock poisoning error.
    #[must_use]
    pub const fn is_poisoned(&self) -> bool {
        matches!(self, Self::LockPoisoned { .. })
    }

    /// The failing observer, if this is an observer error.
    #[must_use]
    pub const fn observer_id(&self) -> Option<ObserverId> {
        match self {
            Self::Observer { observer, .. } => Some(*observer),
            _ => None,
        }
    }
}

/// Result type alias for scopehub operations.
pub type HubResult<T> = Result<T, HubError>;
