//! Container settings loaded from code, the environment or JSON.
//!
//! Settings cover the container-wide options of
//! [`ContainerBuilder`](crate::ContainerBuilder) and are applied with
//! [`ContainerBuilder::with_settings`](crate::ContainerBuilder::with_settings).

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};
use crate::lifetime::SingletonType;

/// Container-wide options.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{ContainerBuilder, ContainerSettings, SingletonType};
///
/// let settings = ContainerSettings::from_source("APP", |key| match key {
///     "APP_LIFECYCLE_MANAGEMENT" => Some("true".to_string()),
///     "APP_SINGLETON_TYPE" => Some("eager".to_string()),
///     _ => None,
/// })
/// .unwrap();
/// assert!(settings.lifecycle_management);
/// assert_eq!(settings.singleton_type, SingletonType::Eager);
///
/// let mut builder = ContainerBuilder::new();
/// builder.with_settings(&settings);
/// let container = builder.build().unwrap();
/// assert!(container.debug_information().contains("singleton type: Eager"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerSettings {
    pub lifecycle_management: bool,
    pub close_on_shutdown: bool,
    pub singleton_type: SingletonType,
}

impl ContainerSettings {
    /// Reads `{PREFIX}_LIFECYCLE_MANAGEMENT`, `{PREFIX}_CLOSE_ON_SHUTDOWN` and
    /// `{PREFIX}_SINGLETON_TYPE` from the process environment.
    pub fn from_env(prefix: &str) -> DiResult<Self> {
        Self::from_source(prefix, |key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable lookup.
    pub fn from_source<F>(prefix: &str, lookup: F) -> DiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = prefix.to_uppercase();
        let key = |name: &str| format!("{}_{}", prefix, name);
        let mut settings = Self::default();

        if let Some(value) = lookup(&key("LIFECYCLE_MANAGEMENT")) {
            settings.lifecycle_management = parse_bool(&key("LIFECYCLE_MANAGEMENT"), &value)?;
        }
        if let Some(value) = lookup(&key("CLOSE_ON_SHUTDOWN")) {
            settings.close_on_shutdown = parse_bool(&key("CLOSE_ON_SHUTDOWN"), &value)?;
        }
        if let Some(value) = lookup(&key("SINGLETON_TYPE")) {
            settings.singleton_type = match value.trim().to_ascii_lowercase().as_str() {
                "lazy" => SingletonType::Lazy,
                "eager" => SingletonType::Eager,
                other => {
                    return Err(DiError::Config(format!(
                        "{}: expected 'lazy' or 'eager', got '{}'",
                        key("SINGLETON_TYPE"),
                        other
                    )))
                }
            };
        }
        Ok(settings)
    }

    /// Parses settings from a JSON object. Missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> DiResult<Self> {
        serde_json::from_str(json).map_err(|e| DiError::Config(e.to_string()))
    }
}

fn parse_bool(key: &str, value: &str) -> DiResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(DiError::Config(format!("{}: expected a boolean, got '{}'", key, other))),
    }
}
