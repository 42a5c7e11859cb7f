//! Opt-in fault containment for observers.
//!
//! By default an observer error aborts the broadcast and reaches whoever
//! called `notify_*`. Wrapping an observer with [`FaultReporter::contain`]
//! turns its errors into reports to the reporter's listeners instead, so later
//! observers still run.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::{HubError, HubResult, ObserverError, ObserverResult};
use crate::event::ChangeEvent;
use crate::hub::Hub;
use crate::ids::EventId;
use crate::notifier::ChangeObserver;

/// A contained observer failure.
#[derive(Debug)]
pub struct Fault {
    /// Name given to the observer when it was contained.
    pub observer: String,
    /// The event being handled when the observer failed.
    pub event: EventId,
    pub error: ObserverError,
}

type FaultListener = Arc<dyn Fn(&Fault) + Send + Sync>;

/// Fan-out point for contained observer failures.
#[derive(Clone, Default)]
pub struct FaultReporter {
    listeners: Arc<Mutex<Vec<FaultListener>>>,
}

impl fmt::Debug for FaultReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.listeners.lock().map(|l| l.len()).unwrap_or_default();
        f.debug_struct("FaultReporter").field("listeners", &count).finish()
    }
}

impl FaultReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for reported faults.
    pub fn on_fault<F>(&self, listener: F) -> HubResult<()>
    where
        F: Fn(&Fault) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .map_err(|_| HubError::poisoned("faults.on_fault"))?
            .push(Arc::new(listener));
        Ok(())
    }

    /// Log `fault` and hand it to every listener.
    pub fn report(&self, fault: &Fault) {
        tracing::warn!(
            observer = %fault.observer,
            event = %fault.event,
            error = %fault.error,
            "observer failed; fault contained"
        );
        let listeners: Vec<FaultListener> = match self.listeners.lock() {
            Ok(l) => l.clone(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(fault);
        }
    }

    /// Wrap `observer` so its errors are reported here instead of aborting the
    /// broadcast.
    pub fn contain<O: ChangeObserver>(
        &self,
        name: impl Into<String>,
        observer: O,
    ) -> ContainedObserver<O> {
        ContainedObserver {
            name: name.into(),
            inner: observer,
            reporter: self.clone(),
        }
    }
}

/// Observer wrapper produced by [`FaultReporter::contain`].
pub struct ContainedObserver<O> {
    name: String,
    inner: O,
    reporter: FaultReporter,
}

impl<O: ChangeObserver> ChangeObserver for ContainedObserver<O> {
    fn on_change(&self, hub: &Hub, event: &ChangeEvent) -> ObserverResult {
        if let Err(error) = self.inner.on_change(hub, event) {
            self.reporter.report(&Fault {
                observer: self.name.clone(),
                event: event.id(),
                error,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ActorId, ScopeId};
    use crate::value::Value;

    #[test]
    fn contained_failure_does_not_stop_broadcast() {
        let hub = Hub::ephemeral();
        let reporter = FaultReporter::new();
        let faults = Arc::new(Mutex::new(Vec::new()));
        let faults_in = Arc::clone(&faults);
        reporter
            .on_fault(move |f: &Fault| {
                faults_in
                    .lock()
                    .unwrap()
                    .push(format!("{}:{}", f.observer, f.error));
            })
            .unwrap();

        let failing = reporter.contain(
            "counter-page",
            |_: &Hub, _: &ChangeEvent| -> ObserverResult { Err("cast failed".into()) },
        );
        let _a = hub.subscribe(Arc::new(failing)).unwrap();

        let reached = Arc::new(Mutex::new(false));
        let reached_in = Arc::clone(&reached);
        let _b = hub
            .subscribe(Arc::new(move |_: &Hub, _: &ChangeEvent| -> ObserverResult {
                *reached_in.lock().unwrap() = true;
                Ok(())
            }))
            .unwrap();

        hub.notify_one(&ScopeId::new("s"), "x", Value::Int(1), &ActorId::new("w"))
            .unwrap();

        assert!(*reached.lock().unwrap());
        assert_eq!(*faults.lock().unwrap(), vec!["counter-page:cast failed"]);
    }

    #[test]
    fn report_without_listeners_is_fine() {
        let reporter = FaultReporter::new();
        reporter.report(&Fault {
            observer: "x".to_string(),
            event: EventId::new(),
            error: "e".into(),
        });
    }
}
