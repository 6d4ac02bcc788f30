//! # LinJector DI
//!
//! Hierarchical dependency injection containers.
//!
//! ## Features
//!
//! - **Scope tree**: every container is a child of another, rooted at a
//!   per-thread super-empty container
//! - **Lifetimes**: transient, scoped (fresh per child scope) and singleton
//!   (shared with all descendants), optionally activated eagerly
//! - **Identifiers and aliases**: several bindings per contract, told apart by
//!   identifier; aliases forward one contract to another
//! - **Shape-driven injection**: types describe their members, constructors
//!   and injection methods through [`Injectable`]; the container picks a
//!   constructor from supplied arguments and fills the rest from the scope
//! - **Cycle detection**: resolution loops fail with a readable path instead
//!   of overflowing the stack
//! - **Lifecycle hooks**: initialize, tick, fixed-tick and dispose callbacks
//!   driven by the owning scope
//!
//! ## Example
//!
//! ```
//! use std::rc::Rc;
//! use linjector_di::{Container, Injectable, Param, TypeShape};
//!
//! trait Greeter {
//! 	fn greet(&self) -> String;
//! }
//!
//! #[derive(Default)]
//! struct Polite {
//! 	name: String,
//! }
//!
//! impl Greeter for Polite {
//! 	fn greet(&self) -> String {
//! 		format!("Good day, {}", self.name)
//! 	}
//! }
//!
//! impl Injectable for Polite {
//! 	fn describe(shape: &mut TypeShape<Self>) {
//! 		shape
//! 			.blank(Self::default)
//! 			.implements::<dyn Greeter>(|rc| rc as Rc<dyn Greeter>);
//! 		shape.constructor(vec![Param::of::<String>()], |p, args| {
//! 			p.name = args.get::<String>(0)?.to_string();
//! 			Ok(())
//! 		});
//! 	}
//! }
//!
//! let root = Container::create(|_, builder| {
//! 	builder.bind::<String>().to_value("Ada".to_string());
//! 	builder.bind::<dyn Greeter>().to::<Polite>().as_singleton();
//! })
//! .unwrap();
//!
//! let greeter = root.resolve::<dyn Greeter>().unwrap().unwrap();
//! assert_eq!(greeter.greet(), "Good day, Ada");
//! ```
//!
//! Containers are single-threaded (`!Send`); build one tree per thread.

pub mod binding;
pub mod builder;
pub mod container;
pub mod cycle_detection;
pub mod error;
pub mod graph;
pub mod injection;
pub mod instance;
pub mod lifecycle;
pub mod planner;
pub mod reflection;
pub mod resolver;
pub mod settings;

pub use binding::{Activator, AliasBinding, CrossScope, Lifetime, ResolverSpec, SpecId, TypeBinding};
pub use builder::{BindingSource, EagerBinding, LifetimeBinding, ScopeBuilder};
pub use container::{Container, ContainerEvent, ObserverId, ScopeState};
pub use cycle_detection::{CycleError, ResolutionGuard, begin_resolution};
pub use error::{DiError, DiResult};
pub use graph::{Binding, Origin, ResolverTable};
pub use instance::{BindingId, IdFilter, Instance, TypeKey, ViewTable};
pub use lifecycle::{Disposable, FixedTickable, Initialize, Tickable};
pub use planner::{ArgumentProvider, InjectionPlan};
pub use reflection::{
	Arguments, Injectable, InjectMarker, InjectiveMethod, InjectiveParameter, InjectiveValue, MemberDecl,
	MemberKind, MethodDecl, Param, StructureMap, TypeShape,
};
pub use resolver::{CachingResolver, LifetimeResolver, ResolverRef, TransientResolver};
pub use settings::{InjectorSettings, configure, current};
