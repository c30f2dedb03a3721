//! # ferrous-inject
//!
//! Scoped, namespace-aware dependency injection for Rust.
//!
//! ## Features
//!
//! - **Validated configuration**: unresolved dependencies, dependency cycles
//!   and conflicting scope declarations are rejected by `build()`
//! - **Reuse policies**: Singleton, Prototype and Scoped bindings
//! - **Scopes**: child containers entered with a runtime object, inheriting
//!   the bindings of their ancestors
//! - **Namespaces**: independently written modules can bind the same type
//!   without colliding, and import or export values across the boundary
//! - **Lifecycle management**: tracked instances are closed once, in reverse
//!   creation order, when their owning container closes
//! - **Thread-safe**: containers are `Send + Sync` and create each cached
//!   instance exactly once
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_inject::{ContainerBuilder, Resolver, ReusePolicy};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let mut builder = ContainerBuilder::new();
//! builder.with_constant(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! builder.with_custom_type::<UserService, (Database,), _>(ReusePolicy::Prototype, |(db,)| {
//!     UserService { db }
//! });
//!
//! let container = builder.build().unwrap();
//! let user_service = container.get_required::<UserService>();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Reuse Policies
//!
//! - **Singleton**: created once per owning container
//! - **Prototype**: created fresh on every resolution, never closed
//! - **Scoped**: created once per scope container that declares it
//!
//! ## Namespaces
//!
//! ```rust
//! use ferrous_inject::{ContainerBuilder, Resolver, ReusePolicy};
//! use std::sync::Arc;
//!
//! struct MapMaid { string: Arc<String> }
//! struct Serializer { map_maid: Arc<MapMaid> }
//! struct Q;
//!
//! let mut builder = ContainerBuilder::new();
//! builder.with_constant("an injected string".to_string());
//! builder.namespace::<Q, _>(|ns| {
//!     ns.importing::<String>();
//!     ns.custom_type::<MapMaid, (String,), _>(ReusePolicy::Singleton, |(string,)| MapMaid { string });
//!     ns.custom_type::<Serializer, (MapMaid,), _>(ReusePolicy::Singleton, |(map_maid,)| Serializer { map_maid });
//!     ns.exporting::<Serializer>();
//! });
//!
//! let container = builder.build().unwrap();
//! let serializer = container.get_required::<Serializer>();
//! assert_eq!(*serializer.map_maid.string, "an injected string");
//! assert!(container.get::<MapMaid>().is_err());
//! ```
//!
//! ## Scopes and Closing
//!
//! ```rust
//! use ferrous_inject::{Close, CloseError, ContainerBuilder, Resolver, ReusePolicy};
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! struct Request { path: String }
//! struct Transaction { committed: AtomicBool }
//!
//! impl Close for Transaction {
//!     fn close(&self) -> Result<(), CloseError> {
//!         self.committed.store(true, Ordering::SeqCst);
//!         Ok(())
//!     }
//! }
//!
//! let mut builder = ContainerBuilder::new();
//! builder.with_lifecycle_management().closeable::<Transaction>();
//! builder.with_scope::<Request, _>(|scope| {
//!     scope.with_custom_type::<Transaction, (), _>(ReusePolicy::Scoped, |()| Transaction {
//!         committed: AtomicBool::new(false),
//!     });
//! });
//!
//! let container = builder.build().unwrap();
//! let request = container.enter_scope(Request { path: "/users".to_string() }).unwrap();
//! let transaction = request.get_required::<Transaction>();
//! assert_eq!(request.get_required::<Request>().path, "/users");
//!
//! request.close().unwrap();
//! assert!(transaction.committed.load(Ordering::SeqCst));
//! ```

// Module declarations
pub mod collection;
pub mod config;
pub mod definitions;
pub mod dependencies;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod provider;
pub mod shutdown;
pub mod traits;

// Internal modules
mod internal;
mod registration;
mod validation;

pub use collection::{ContainerBuilder, Module, NamespaceBuilder, ScopeBuilder};
pub use config::ContainerSettings;
pub use definitions::ScopePath;
pub use dependencies::Dependencies;
pub use error::{CloseFailure, DiError, DiResult};
pub use key::{identity_of, TypeIdentity};
pub use lifetime::{ReusePolicy, SingletonType};
pub use observer::{DiObserver, LoggingObserver};
pub use provider::{Container, ScopeHandle};
pub use registration::Instance;
pub use traits::{Close, CloseError, Resolver, ResolverCore};
