use ferrous_inject::{ContainerBuilder, ContainerSettings, DiError, Resolver, ReusePolicy, SingletonType};
use serial_test::serial;
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const VARS: [&str; 3] = [
    "FERROUS_TEST_LIFECYCLE_MANAGEMENT",
    "FERROUS_TEST_CLOSE_ON_SHUTDOWN",
    "FERROUS_TEST_SINGLETON_TYPE",
];

fn clear_vars() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_settings_from_environment() {
    clear_vars();
    env::set_var("FERROUS_TEST_LIFECYCLE_MANAGEMENT", "true");
    env::set_var("FERROUS_TEST_SINGLETON_TYPE", "Eager");

    let settings = ContainerSettings::from_env("ferrous_test").unwrap();
    clear_vars();

    assert!(settings.lifecycle_management);
    assert!(!settings.close_on_shutdown);
    assert_eq!(settings.singleton_type, SingletonType::Eager);
}

#[test]
#[serial]
fn test_invalid_environment_value() {
    clear_vars();
    env::set_var("FERROUS_TEST_CLOSE_ON_SHUTDOWN", "sometimes");

    let result = ContainerSettings::from_env("FERROUS_TEST");
    clear_vars();

    assert!(matches!(result, Err(DiError::Config(_))));
}

#[test]
#[serial]
fn test_environment_settings_drive_builder() {
    clear_vars();
    env::set_var("FERROUS_TEST_SINGLETON_TYPE", "eager");
    let settings = ContainerSettings::from_env("FERROUS_TEST").unwrap();
    clear_vars();

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    let mut builder = ContainerBuilder::new();
    builder.with_settings(&settings);
    builder.with_custom_type::<String, (), _>(ReusePolicy::Singleton, move |()| {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        "warm".to_string()
    });

    let container = builder.build().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*container.get_required::<String>(), "warm");
}

#[test]
#[serial]
fn test_close_on_shutdown_without_lifecycle_is_rejected() {
    clear_vars();
    env::set_var("FERROUS_TEST_CLOSE_ON_SHUTDOWN", "1");
    let settings = ContainerSettings::from_env("FERROUS_TEST").unwrap();
    clear_vars();

    let mut builder = ContainerBuilder::new();
    builder.with_settings(&settings);
    assert!(matches!(
        builder.build(),
        Err(DiError::ShutdownRequiresLifecycleManagement)
    ));
}
