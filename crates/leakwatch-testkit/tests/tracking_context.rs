//! TrackingContext delegation and leak detection

use assert_matches::assert_matches;
use leakwatch_testkit::{
    assert_no_leaks, assert_outstanding, init_test_logging, BacktraceMode, HostContext,
    LeakConfig, LeakError, LeakScope, ListenerIdentity, ListenerKind, Tracker, TrackingContext,
};
use std::cell::RefCell;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Receiver {
    _name: String,
}

#[derive(Debug, Default)]
struct Connection {
    _name: String,
}

#[derive(Debug, Default)]
struct Callbacks {
    _name: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    RegisterReceiver(String),
    UnregisterReceiver,
    BindService(String, u32),
    UnbindService,
    RegisterCallbacks,
    UnregisterCallbacks,
}

/// Host that records what reached it and answers with canned results
#[derive(Debug, Default)]
struct RecordingHost {
    calls: RefCell<Vec<Call>>,
}

impl RecordingHost {
    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl HostContext for RecordingHost {
    type Receiver = Receiver;
    type Filter = String;
    type Intent = String;
    type ServiceRequest = String;
    type Connection = Connection;
    type Callbacks = Callbacks;

    fn register_receiver(&self, _receiver: &Arc<Receiver>, filter: &String) -> Option<String> {
        self.calls
            .borrow_mut()
            .push(Call::RegisterReceiver(filter.clone()));
        Some(format!("sticky:{filter}"))
    }

    fn unregister_receiver(&self, _receiver: &Arc<Receiver>) {
        self.calls.borrow_mut().push(Call::UnregisterReceiver);
    }

    fn bind_service(&self, request: &String, _connection: &Arc<Connection>, flags: u32) -> bool {
        self.calls
            .borrow_mut()
            .push(Call::BindService(request.clone(), flags));
        flags != 0
    }

    fn unbind_service(&self, _connection: &Arc<Connection>) {
        self.calls.borrow_mut().push(Call::UnbindService);
    }

    fn register_component_callbacks(&self, _callbacks: &Arc<Callbacks>) {
        self.calls.borrow_mut().push(Call::RegisterCallbacks);
    }

    fn unregister_component_callbacks(&self, _callbacks: &Arc<Callbacks>) {
        self.calls.borrow_mut().push(Call::UnregisterCallbacks);
    }
}

fn scope() -> LeakScope {
    init_test_logging();
    LeakScope::with_config(LeakConfig {
        backtrace: BacktraceMode::Location,
        ..LeakConfig::default()
    })
}

#[test]
fn delegates_every_call_and_returns_host_results() {
    let mut scope = scope();
    let context = TrackingContext::from_scope(RecordingHost::default(), &scope);
    let receiver = Arc::new(Receiver::default());
    let connection = Arc::new(Connection::default());
    let callbacks = Arc::new(Callbacks::default());

    let sticky = context.register_receiver(&receiver, &"BATTERY_CHANGED".to_string());
    assert_eq!(sticky.as_deref(), Some("sticky:BATTERY_CHANGED"));
    assert!(context.bind_service(&"sync".to_string(), &connection, 1));
    assert!(!context.bind_service(&"sync".to_string(), &connection, 0));
    context.register_component_callbacks(&callbacks);

    context.unregister_receiver(&receiver);
    context.unbind_service(&connection);
    context.unregister_component_callbacks(&callbacks);

    assert_eq!(
        context.base().calls(),
        vec![
            Call::RegisterReceiver("BATTERY_CHANGED".to_string()),
            Call::BindService("sync".to_string(), 1),
            Call::BindService("sync".to_string(), 0),
            Call::RegisterCallbacks,
            Call::UnregisterReceiver,
            Call::UnbindService,
            Call::UnregisterCallbacks,
        ]
    );
    assert_no_leaks!(scope);
}

#[test]
fn registrations_land_in_matching_category() {
    let scope = scope();
    let context = TrackingContext::from_scope(RecordingHost::default(), &scope);
    let receiver = Arc::new(Receiver::default());
    let connection = Arc::new(Connection::default());

    context.register_receiver(&receiver, &"a".to_string());
    context.register_receiver(&receiver, &"b".to_string());
    context.bind_service(&"svc".to_string(), &connection, 1);

    let receivers = context.tracker(ListenerKind::Receiver).unwrap();
    let services = context.tracker(ListenerKind::Service).unwrap();
    let components = context.tracker(ListenerKind::Component).unwrap();
    assert_outstanding!(receivers, receiver, 2);
    assert_outstanding!(services, connection, 1);
    assert_eq!(components.outstanding_count(), 0);
    assert!(receivers.ptr_eq(&scope.tracker("receiver")));

    context.unregister_receiver(&receiver);
    context.unbind_service(&connection);
    assert_eq!(scope.outstanding_count(), 0);
}

#[test]
fn leaked_receiver_fails_teardown_with_call_site() {
    let mut scope = scope();
    let context = TrackingContext::from_scope(RecordingHost::default(), &scope);
    let kept = Arc::new(Receiver::default());
    let released = Arc::new(Receiver::default());

    context.register_receiver(&kept, &"TIME_TICK".to_string());
    context.register_receiver(&released, &"TIME_TICK".to_string());
    context.unregister_receiver(&released);

    let err = scope.verify_all().unwrap_err();
    assert_matches!(&err, LeakError::LeakDetected(_));
    let report = err.report();
    assert_eq!(report.leaked_listeners(), 1);
    let leak = report.find(&ListenerIdentity::of_arc(&kept)).unwrap();
    assert_eq!(leak.category, "receiver");
    assert_eq!(leak.events.len(), 1);

    // The recorded location is the test's registration call.
    let location = leak.events[0].location().unwrap();
    assert!(location.file().ends_with("tracking_context.rs"));
    assert!(err.to_string().contains("tracking_context.rs"));
}

#[test]
fn unregistering_unknown_listener_is_tolerated() {
    let mut scope = scope();
    let context = TrackingContext::from_scope(RecordingHost::default(), &scope);
    let never_registered = Arc::new(Connection::default());

    context.unbind_service(&never_registered);

    assert_eq!(context.base().calls(), vec![Call::UnbindService]);
    assert!(scope.verify_all().is_ok());
}

#[test]
fn missing_tracker_disables_category() {
    let receivers = Tracker::new("receiver");
    let context =
        TrackingContext::with_trackers(RecordingHost::default(), Some(receivers.clone()), None, None);
    let connection = Arc::new(Connection::default());
    let callbacks = Arc::new(Callbacks::default());

    assert!(context.bind_service(&"svc".to_string(), &connection, 1));
    context.register_component_callbacks(&callbacks);

    assert!(context.tracker(ListenerKind::Service).is_none());
    assert!(receivers.verify().is_ok());
    assert_eq!(context.base().calls().len(), 2);
}

#[test]
fn structurally_identical_connections_are_tracked_apart() {
    let mut scope = scope();
    let context = TrackingContext::from_scope(RecordingHost::default(), &scope);
    let first = Arc::new(Connection::default());
    let second = Arc::new(Connection::default());

    context.bind_service(&"svc".to_string(), &first, 1);
    context.unbind_service(&second);

    let report = scope.verify_all().unwrap_err().into_report();
    assert!(report.find(&ListenerIdentity::of_arc(&first)).is_some());
}
