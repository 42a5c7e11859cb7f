//! Identifier types.
//!
//! Scope, session and actor identifiers are strings supplied by the hosting
//! runtime. They compare exactly when used as map keys; the loop guard compares
//! scope and actor identifiers case-insensitively via [`eq_ignore_case`].
//! Hub, observer and event identifiers are generated UUIDs.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Case-insensitive ordinal comparison of two identifiers.
///
/// Characters are compared one to one. A character whose uppercase form is
/// more than one character (`ß`, `ﬁ`) only matches itself, so identifiers of
/// different character counts never match.
#[must_use]
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a.len() == b.len() && a.eq_ignore_ascii_case(b) {
        return true;
    }
    if a.is_ascii() && b.is_ascii() {
        return false;
    }
    if a.chars().count() != b.chars().count() {
        return false;
    }
    a.chars()
        .zip(b.chars())
        .all(|(x, y)| x == y || simple_upper(x) == simple_upper(y))
}

fn simple_upper(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an identifier string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True if the identifier is empty or whitespace only.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }

            /// Case-insensitive comparison used by the loop guard.
            #[must_use]
            pub fn matches(&self, other: &Self) -> bool {
                eq_ignore_case(&self.0, &other.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(v: &str) -> Self {
                Self(v.to_string())
            }
        }

        impl From<String> for $name {
            fn from(v: String) -> Self {
                Self(v)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Isolation boundary for stored properties: a circuit id or a session id.
    ScopeId
}

string_id! {
    /// Identity of a participant performing writes or observing changes.
    ActorId
}

string_id! {
    /// Identifier of a long-lived user session (request/response pages).
    SessionId
}

impl SessionId {
    /// Generate a fresh random session id, for callers whose session store is
    /// unavailable.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl From<&SessionId> for ScopeId {
    fn from(v: &SessionId) -> Self {
        Self(v.0.clone())
    }
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Unique identifier of a hub instance.
    HubId
}

uuid_id! {
    /// Unique identifier of a registered observer.
    ObserverId
}

uuid_id! {
    /// Unique identifier of a broadcast change event.
    EventId
}
