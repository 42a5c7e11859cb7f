use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use scopehub::{
    should_deliver, ActorId, ChangeEvent, Hub, NotifyOptions, ObserverResult, ScopeId,
};

fn ident() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_-]{0,11}"
}

/// Raise one event through a real hub and hand it back.
fn raise(scope: &str, setter: &str, reentrant: bool) -> ChangeEvent {
    let hub = Hub::ephemeral();
    let slot = Arc::new(Mutex::new(None));
    let slot_in = Arc::clone(&slot);
    let _sub = hub
        .subscribe(Arc::new(move |_: &Hub, ev: &ChangeEvent| -> ObserverResult {
            *slot_in.lock().unwrap() = Some(ev.clone());
            Ok(())
        }))
        .unwrap();
    hub.notify_one_with(
        &ScopeId::new(scope),
        "p",
        1,
        &ActorId::new(setter),
        NotifyOptions::new().reentrant(reentrant),
    )
    .unwrap();
    let taken = slot.lock().unwrap().take();
    taken.unwrap()
}

proptest! {
    #[test]
    fn own_writes_never_come_back(
        scope in ident(),
        actor in ident(),
        reentrant in any::<bool>(),
    ) {
        let ev = raise(&scope, &actor, reentrant);
        prop_assert!(!should_deliver(&ScopeId::new(&scope), &ActorId::new(&actor), &ev));
        prop_assert!(!should_deliver(
            &ScopeId::new(scope.to_uppercase()),
            &ActorId::new(actor.to_lowercase()),
            &ev,
        ));
    }

    #[test]
    fn other_scopes_never_see_the_event(
        scope in ident(),
        other in ident(),
        setter in ident(),
        observer in ident(),
    ) {
        prop_assume!(!scope.eq_ignore_ascii_case(&other));
        let ev = raise(&scope, &setter, false);
        prop_assert!(!should_deliver(&ScopeId::new(&other), &ActorId::new(&observer), &ev));
    }

    #[test]
    fn reentrant_events_are_dropped(scope in ident(), setter in ident(), observer in ident()) {
        let ev = raise(&scope, &setter, true);
        prop_assert!(!should_deliver(&ScopeId::new(&scope), &ActorId::new(&observer), &ev));
    }

    #[test]
    fn plain_foreign_writes_are_delivered(
        scope in ident(),
        setter in ident(),
        observer in ident(),
    ) {
        prop_assume!(!setter.eq_ignore_ascii_case(&observer));
        let ev = raise(&scope, &setter, false);
        let lowered = ScopeId::new(scope.to_lowercase());
        prop_assert!(should_deliver(&lowered, &ActorId::new(&observer), &ev));
    }
}
