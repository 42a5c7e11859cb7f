use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use scopehub::{
    is_broadcasting, ActorId, ChangeEvent, FaultReporter, Hub, HubError, NotifyOptions,
    ObserverResult, ScopeId, Value,
};

/// Two components mirror each other's writes. Every mirror write is raised
/// from inside a handler, so the guard drops it and the exchange settles.
#[test]
fn mirroring_components_terminate() {
    let hub = Hub::ephemeral();
    let scope = ScopeId::new("s1");
    let calls = Arc::new(AtomicUsize::new(0));

    let mut subs = Vec::new();
    for name in ["Razor", "Blazor"] {
        let me = ActorId::new(name);
        let calls = Arc::clone(&calls);
        let sub = hub
            .subscribe_guarded(
                scope.clone(),
                me.clone(),
                move |hub: &Hub, ev: &ChangeEvent| -> ObserverResult {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let Some(single) = ev.as_single() else {
                        return Ok(());
                    };
                    hub.notify_one_with(
                        ev.scope_id(),
                        single.property(),
                        single.value().clone(),
                        &me,
                        NotifyOptions::new().reentrant_if_broadcasting(),
                    )?;
                    Ok(())
                },
            )
            .unwrap();
        subs.push(sub);
    }

    hub.notify_one(&scope, "x", 1, &ActorId::new("Razor")).unwrap();

    // Only Blazor reacts to Razor's write; its echo is re-entrant.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let rec = hub.get(&scope, "x").unwrap().unwrap();
    assert_eq!(rec.value, Value::Int(1));
    assert_eq!(rec.last_modified_by, ActorId::new("Blazor"));
    assert_eq!(rec.history.len(), 1);
}

#[test]
fn broadcasting_flag_is_set_only_inside_handlers() {
    let hub = Hub::ephemeral();
    let inside = Arc::new(Mutex::new(Vec::new()));
    let inside_in = Arc::clone(&inside);
    let _sub = hub
        .subscribe(Arc::new(move |_: &Hub, _: &ChangeEvent| -> ObserverResult {
            inside_in.lock().unwrap().push(is_broadcasting());
            Ok(())
        }))
        .unwrap();

    assert!(!is_broadcasting());
    hub.notify_one(&ScopeId::new("s1"), "x", 1, &ActorId::new("A")).unwrap();
    assert!(!is_broadcasting());
    assert_eq!(*inside.lock().unwrap(), vec![true]);
}

#[test]
fn failing_observer_surfaces_to_notifier() {
    let hub = Hub::ephemeral();
    let later = Arc::new(AtomicUsize::new(0));
    let later_in = Arc::clone(&later);

    let bad = hub
        .subscribe(Arc::new(|_: &Hub, _: &ChangeEvent| -> ObserverResult {
            Err("boom".into())
        }))
        .unwrap();
    let _good = hub
        .subscribe(Arc::new(move |_: &Hub, _: &ChangeEvent| -> ObserverResult {
            later_in.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
        .unwrap();

    let err = hub
        .notify_one(&ScopeId::new("s1"), "x", 1, &ActorId::new("A"))
        .unwrap_err();
    assert!(matches!(err, HubError::Observer { .. }));
    assert_eq!(err.observer_id(), Some(bad.id()));
    assert_eq!(later.load(Ordering::SeqCst), 0);

    // The value was stored before the fan-out started.
    assert_eq!(
        hub.get_value(&ScopeId::new("s1"), "x").unwrap(),
        Some(Value::Int(1))
    );
}

#[test]
fn contained_observer_lets_fan_out_continue() {
    let hub = Hub::ephemeral();
    let reporter = FaultReporter::new();
    let faults = Arc::new(Mutex::new(Vec::new()));
    let faults_in = Arc::clone(&faults);
    reporter
        .on_fault(move |fault| faults_in.lock().unwrap().push(fault.observer.clone()))
        .unwrap();

    let later = Arc::new(AtomicUsize::new(0));
    let later_in = Arc::clone(&later);
    let _bad = hub
        .subscribe(Arc::new(reporter.contain(
            "flaky-widget",
            |_: &Hub, _: &ChangeEvent| -> ObserverResult { Err("boom".into()) },
        )))
        .unwrap();
    let _good = hub
        .subscribe(Arc::new(move |_: &Hub, _: &ChangeEvent| -> ObserverResult {
            later_in.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
        .unwrap();

    hub.notify_one(&ScopeId::new("s1"), "x", 1, &ActorId::new("A")).unwrap();

    assert_eq!(later.load(Ordering::SeqCst), 1);
    assert_eq!(*faults.lock().unwrap(), vec!["flaky-widget".to_string()]);
}

#[test]
fn one_writer_is_observed_in_order() {
    let hub = Arc::new(Hub::ephemeral());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in = Arc::clone(&seen);
    let _sub = hub
        .subscribe(Arc::new(move |_: &Hub, ev: &ChangeEvent| -> ObserverResult {
            if let Some(n) = ev.as_single().and_then(|s| s.value().as_int()) {
                seen_in.lock().unwrap().push(n);
            }
            Ok(())
        }))
        .unwrap();

    let writer = {
        let hub = Arc::clone(&hub);
        thread::spawn(move || {
            let scope = ScopeId::new("s1");
            let me = ActorId::new("Razor");
            for n in 0..200_i64 {
                hub.notify_one(&scope, "n", n, &me).unwrap();
            }
        })
    };
    writer.join().unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, (0..200).collect::<Vec<i64>>());
}

#[test]
fn concurrent_writers_all_reach_observers() {
    let hub = Arc::new(Hub::ephemeral());
    let count = Arc::new(AtomicUsize::new(0));
    let count_in = Arc::clone(&count);
    let _sub = hub
        .subscribe(Arc::new(move |_: &Hub, _: &ChangeEvent| -> ObserverResult {
            count_in.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let hub = Arc::clone(&hub);
            thread::spawn(move || {
                let scope = ScopeId::new(format!("s{t}"));
                let me = ActorId::new(format!("writer-{t}"));
                for n in 0..50_i64 {
                    hub.notify_one(&scope, "n", n, &me).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(count.load(Ordering::SeqCst), 8 * 50);
    for t in 0..8 {
        let rec = hub.get(&ScopeId::new(format!("s{t}")), "n").unwrap().unwrap();
        assert_eq!(rec.value, Value::Int(49));
        assert_eq!(rec.history.len(), 49);
    }
}
