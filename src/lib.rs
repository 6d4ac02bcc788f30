//! # LinJector
//!
//! Hierarchical dependency injection containers for Rust.
//!
//! This facade re-exports [`linjector_di`]. Most programs only need the
//! [`prelude`]:
//!
//! ```
//! use linjector::prelude::*;
//!
//! let root = Container::create(|_, builder| {
//! 	builder.bind::<String>().to_value("configured".to_string());
//! })
//! .unwrap();
//! let child = root.create_child(|_, _| {}).unwrap();
//!
//! let value = child.resolve::<String>().unwrap().unwrap();
//! assert_eq!(value.as_str(), "configured");
//! ```

pub use linjector_di as di;

pub use linjector_di::{
	Arguments, BindingId, Container, ContainerEvent, DiError, DiResult, IdFilter, Injectable, InjectorSettings,
	Instance, Lifetime, ObserverId, Param, ScopeBuilder, ScopeState, TypeKey, TypeShape,
};

/// Lifecycle hook traits
pub mod lifecycle {
	pub use linjector_di::lifecycle::{Disposable, FixedTickable, Initialize, Tickable};
}

/// Commonly used types
pub mod prelude {
	pub use crate::lifecycle::{Disposable, FixedTickable, Initialize, Tickable};
	pub use crate::{
		Arguments, BindingId, Container, DiError, DiResult, IdFilter, Injectable, Instance, Lifetime, Param,
		ScopeBuilder, TypeKey, TypeShape,
	};
}
