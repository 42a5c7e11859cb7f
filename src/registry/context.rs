use crate::ids::{ScopeId, SessionId};

/// Supplies the identifiers of the current request or interactive session.
///
/// Either may be absent, e.g. when a hub is requested outside any request.
/// With both absent the registry hands out an unregistered hub.
pub trait AmbientContext {
    /// Id of the interactive circuit the caller runs in, if any.
    fn scope_id(&self) -> Option<ScopeId>;

    /// Id of the user session the caller runs in, if any.
    fn session_id(&self) -> Option<SessionId>;
}

/// Plain [`AmbientContext`] built by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub scope: Option<ScopeId>,
    pub session: Option<SessionId>,
}

impl RequestContext {
    /// No ambient context at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            scope: None,
            session: None,
        }
    }

    #[must_use]
    pub fn circuit(scope: impl Into<ScopeId>) -> Self {
        Self {
            scope: Some(scope.into()),
            session: None,
        }
    }

    #[must_use]
    pub fn session(session: impl Into<SessionId>) -> Self {
        Self {
            scope: None,
            session: Some(session.into()),
        }
    }

    #[must_use]
    pub fn with_session(mut self, session: impl Into<SessionId>) -> Self {
        self.session = Some(session.into());
        self
    }
}

impl AmbientContext for RequestContext {
    fn scope_id(&self) -> Option<ScopeId> {
        self.scope.clone()
    }

    fn session_id(&self) -> Option<SessionId> {
        self.session.clone()
    }
}
