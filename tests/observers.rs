use ferrous_inject::{ContainerBuilder, DiError, DiObserver, LoggingObserver, Resolver, ReusePolicy, TypeIdentity};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl DiObserver for Recorder {
    fn resolving(&self, identity: &TypeIdentity) {
        self.push(format!("resolving {}", identity));
    }

    fn resolved(&self, identity: &TypeIdentity, _duration: Duration) {
        self.push(format!("resolved {}", identity));
    }

    fn failed(&self, identity: &TypeIdentity, _error: &DiError) {
        self.push(format!("failed {}", identity));
    }

    fn scope_entered(&self, scope_path: &str) {
        self.push(format!("entered {}", scope_path));
    }

    fn closing(&self, scope_path: &str) {
        self.push(format!("closing {}", scope_path));
    }
}

struct Request;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ferrous_inject=trace")
        .with_test_writer()
        .try_init();
}

#[test]
fn test_observer_sees_resolution_and_scope_events() {
    init_tracing();
    let recorder = Arc::new(Recorder::default());

    let mut builder = ContainerBuilder::new();
    builder.add_observer(recorder.clone());
    builder.add_observer(Arc::new(LoggingObserver::new()));
    builder.with_constant(1u8);
    builder.with_scope::<Request, _>(|scope| {
        scope.with_custom_type::<u16, (u8,), _>(ReusePolicy::Scoped, |(n,)| *n as u16 + 1);
    });

    let container = builder.build().unwrap();
    let scope = container.enter_scope(Request).unwrap();
    assert_eq!(*scope.get_required::<u16>(), 2);
    assert!(scope.get::<u64>().is_err());
    scope.close().unwrap();

    assert_eq!(
        recorder.events(),
        vec![
            "entered /Request",
            "resolving u16",
            "resolving u8",
            "resolved u8",
            "resolved u16",
            "failed u64",
            "closing /Request",
        ]
    );
}

#[test]
fn test_observers_are_silent_without_registration() {
    init_tracing();
    let mut builder = ContainerBuilder::new();
    builder.with_constant(1u8);
    let container = builder.build().unwrap();
    assert_eq!(*container.get_required::<u8>(), 1);
}
