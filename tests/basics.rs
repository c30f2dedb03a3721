use ferrous_inject::{ContainerBuilder, DiError, Instance, Resolver, ReusePolicy, TypeIdentity};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[test]
fn test_constant_is_singleton() {
    let mut builder = ContainerBuilder::new();
    builder.with_constant(42usize);
    builder.with_constant("hello".to_string());

    let container = builder.build().unwrap();

    let num1 = container.get_required::<usize>();
    let num2 = container.get_required::<usize>();
    let str1 = container.get_required::<String>();
    let str2 = container.get_required::<String>();

    assert_eq!(*num1, 42);
    assert_eq!(*str1, "hello");
    assert!(Arc::ptr_eq(&num1, &num2)); // Same instance
    assert!(Arc::ptr_eq(&str1, &str2)); // Same instance
}

#[test]
fn test_factory_with_dependencies() {
    #[derive(Debug)]
    struct Config {
        port: u16,
    }

    #[derive(Debug)]
    struct Server {
        config: Arc<Config>,
        name: String,
    }

    let mut builder = ContainerBuilder::new();
    builder.with_constant(Config { port: 8080 });
    builder.with_custom_type::<Server, (Config,), _>(ReusePolicy::Singleton, |(config,)| Server {
        config,
        name: "MyServer".to_string(),
    });

    let container = builder.build().unwrap();
    let server = container.get_required::<Server>();

    assert_eq!(server.config.port, 8080);
    assert_eq!(server.name, "MyServer");
}

#[test]
fn test_prototype_creates_new_instances() {
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = counter.clone();

    let mut builder = ContainerBuilder::new();
    builder.with_custom_type::<String, (), _>(ReusePolicy::Prototype, move |()| {
        let n = counter_clone.fetch_add(1, Ordering::SeqCst) + 1;
        format!("instance-{}", n)
    });

    let container = builder.build().unwrap();
    let s1 = container.get_required::<String>();
    let s2 = container.get_required::<String>();

    assert_eq!(*s1, "instance-1");
    assert_eq!(*s2, "instance-2");
    assert!(!Arc::ptr_eq(&s1, &s2));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_singleton_factory_called_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    let mut builder = ContainerBuilder::new();
    builder.with_custom_type::<Vec<u32>, (), _>(ReusePolicy::Singleton, move |()| {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        vec![1, 2, 3]
    });

    let container = builder.build().unwrap();
    for _ in 0..10 {
        assert_eq!(container.get_required::<Vec<u32>>().len(), 3);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_dependencies_resolve_left_to_right() {
    struct First;
    struct Second;
    struct Both;

    let order = Arc::new(Mutex::new(Vec::new()));
    let (o1, o2) = (order.clone(), order.clone());

    let mut builder = ContainerBuilder::new();
    builder.with_custom_type::<First, (), _>(ReusePolicy::Prototype, move |()| {
        o1.lock().unwrap().push("first");
        First
    });
    builder.with_custom_type::<Second, (), _>(ReusePolicy::Prototype, move |()| {
        o2.lock().unwrap().push("second");
        Second
    });
    builder.with_custom_type::<Both, (First, Second), _>(ReusePolicy::Prototype, |_| Both);

    let container = builder.build().unwrap();
    container.get_required::<Both>();
    assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
}

#[test]
fn test_generic_types_are_distinct_keys() {
    let mut builder = ContainerBuilder::new();
    builder.with_constant(vec!["a".to_string()]);
    builder.with_constant(vec![1u32, 2]);

    let container = builder.build().unwrap();
    assert_eq!(container.get_required::<Vec<String>>().len(), 1);
    assert_eq!(container.get_required::<Vec<u32>>().len(), 2);
    assert!(container.get::<Vec<u64>>().is_err());
}

#[test]
fn test_missing_binding_is_unresolved() {
    let container = ContainerBuilder::new().build().unwrap();
    match container.get::<String>() {
        Err(DiError::UnresolvedDependency {
            missing,
            required_by,
            scope,
        }) => {
            assert_eq!(missing, TypeIdentity::of::<String>());
            assert!(required_by.is_none());
            assert_eq!(scope, "/");
        }
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
#[should_panic(expected = "Failed to resolve")]
fn test_get_required_panics_when_missing() {
    let container = ContainerBuilder::new().build().unwrap();
    container.get_required::<String>();
}

#[test]
fn test_can_instantiate() {
    let mut builder = ContainerBuilder::new();
    builder.with_default::<String>(ReusePolicy::Singleton);
    let container = builder.build().unwrap();

    assert!(container.can_instantiate_type::<String>());
    assert!(!container.can_instantiate_type::<u64>());
}

#[test]
fn test_register_type_erased_binding() {
    let mut builder = ContainerBuilder::new();
    builder.with_constant(20u32);
    builder.register(
        TypeIdentity::of::<u64>(),
        vec![TypeIdentity::of::<u32>()],
        ReusePolicy::Singleton,
        |deps| {
            let base = deps[0].clone().downcast::<u32>().map_err(|_| DiError::TypeMismatch("u32"))?;
            Ok(Arc::new(*base as u64 * 2) as Instance)
        },
    );

    let container = builder.build().unwrap();
    assert_eq!(*container.get_required::<u64>(), 40);
}

#[test]
fn test_eager_singletons_built_at_build_time() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    let mut builder = ContainerBuilder::new();
    builder.using_default_singleton_type(ferrous_inject::SingletonType::Eager);
    builder.with_custom_type::<String, (), _>(ReusePolicy::Singleton, move |()| {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        "eager".to_string()
    });
    builder.with_custom_type::<u8, (), _>(ReusePolicy::Prototype, |()| 1);

    let container = builder.build().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    container.get_required::<String>();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_eager_failure_fails_build() {
    let mut builder = ContainerBuilder::new();
    builder.using_default_singleton_type(ferrous_inject::SingletonType::Eager);
    builder.with_fallible_custom_type::<String, (), _, _>(ReusePolicy::Singleton, |()| {
        Err::<String, _>("no database")
    });

    assert!(matches!(builder.build(), Err(DiError::Instantiation { .. })));
}

#[test]
fn test_initialize_all_singletons_on_demand() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    let mut builder = ContainerBuilder::new();
    builder.with_custom_type::<String, (), _>(ReusePolicy::Singleton, move |()| {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        String::new()
    });

    let container = builder.build().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    container.initialize_all_singletons().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
