//! # scopehub - shared state for server-rendered and interactive UI sessions
//!
//! scopehub lets independently rendered surfaces (request/response pages and
//! long-lived interactive circuits) share named values and hear about each
//! other's changes without echoing their own writes back or looping forever.
//!
//! ## Core Concepts
//!
//! - **Hub**: a per-scope property store plus a synchronous change fan-out
//! - **ChangeEvent**: an immutable snapshot of a single or batch change
//! - **Loop guard**: the per-observer check that drops cross-scope, self-written
//!   and re-entrant events
//! - **ScopeRegistry**: finds or creates the hub for a circuit or session, and
//!   evicts idle session hubs on request
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use scopehub::{ActorId, ChangeEvent, Hub, ObserverResult, ScopeRegistry, ScopeId, SessionId};
//!
//! let registry = ScopeRegistry::default();
//! let session = SessionId::new("sess-1");
//! let scope = ScopeId::from(&session);
//! let hub = registry.get_or_create(None, Some(&session))?;
//!
//! let _sub = hub.subscribe_guarded(
//!     scope.clone(),
//!     ActorId::new("Blazor"),
//!     |hub: &Hub, event: &ChangeEvent| -> ObserverResult {
//!         let counter = hub.get_value(event.scope_id(), "counter")?;
//!         println!("counter is now {counter:?}");
//!         Ok(())
//!     },
//! )?;
//!
//! hub.notify_one(&scope, "counter", 1, &ActorId::new("Razor"))?;
//! # Ok::<(), scopehub::HubError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// Core types
pub mod config;
pub mod error;
pub mod event;
pub mod ids;
pub mod record;
pub mod value;

// Store, fan-out and loop prevention
pub mod fault;
pub mod guard;
pub mod hub;
pub mod notifier;
pub mod store;

// Lifecycle
pub mod registry;

// Re-export primary types at crate root for convenience
pub use config::{HubConfig, RegistryConfig};
pub use error::{HubError, HubResult, ObserverError, ObserverResult};
pub use event::{BatchChange, ChangeEvent, SingleChange};
pub use fault::{ContainedObserver, Fault, FaultReporter};
pub use guard::{should_deliver, Delivery};
pub use hub::{Hub, HubOrigin, NotifyOptions};
pub use ids::{ActorId, EventId, HubId, ObserverId, ScopeId, SessionId};
pub use notifier::{is_broadcasting, ChangeNotifier, ChangeObserver, GuardedObserver, Subscription};
pub use record::{HistoryEntry, ValueRecord};
pub use registry::{AmbientContext, RequestContext, ScopeRegistry, SweepWorker};
pub use store::ValueStore;
pub use value::{Value, ValueType};
