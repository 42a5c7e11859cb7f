//! Hub lookup, creation and eviction.
//!
//! Circuit hubs follow explicit open/close signals from the hosting runtime.
//! Session hubs are created on first lookup and evicted by an idle sweep. The
//! registry only holds `Arc`s: eviction makes a hub undiscoverable, while
//! callers already holding it keep using it.

/// Ambient scope/session identifier suppliers.
pub mod context;
/// Circuit and session tables.
pub mod scopes;
/// Background idle sweep.
pub mod sweeper;

pub use context::{AmbientContext, RequestContext};
pub use scopes::ScopeRegistry;
pub use sweeper::SweepWorker;
