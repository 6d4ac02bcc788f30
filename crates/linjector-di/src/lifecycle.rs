//! Lifecycle hooks driven by a container
//!
//! Values bound under one of the hook contracts are resolved when their
//! scope initializes. [`Initialize`] hooks run right away, tick hooks run on
//! every [`Container::tick`] / [`Container::fixed_tick`], and [`Disposable`]
//! hooks run when the scope is disposed. Singletons inherited from a parent
//! scope are driven by the parent only.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use linjector_di::{Container, Tickable};
//!
//! struct Counter(Cell<u32>);
//!
//! impl Tickable for Counter {
//! 	fn tick(&self) {
//! 		self.0.set(self.0.get() + 1);
//! 	}
//! }
//!
//! let counter = Rc::new(Counter(Cell::new(0)));
//! let shared = Rc::clone(&counter);
//! let container = Container::create(move |_, builder| {
//! 	builder.bind::<dyn Tickable>().to_shared(shared as Rc<dyn Tickable>);
//! })
//! .unwrap();
//!
//! container.tick();
//! container.tick();
//! assert_eq!(counter.0.get(), 2);
//! ```

use std::rc::Rc;

use crate::binding::Lifetime;
use crate::container::Container;
use crate::error::DiResult;
use crate::graph::ResolverTable;
use crate::instance::{IdFilter, TypeKey};
use crate::resolver::resolve_guarded;

/// Runs once when the owning scope initializes
pub trait Initialize {
	fn initialize(&self);
}

/// Runs on every [`Container::tick`]
pub trait Tickable {
	fn tick(&self);
}

/// Runs on every [`Container::fixed_tick`]
pub trait FixedTickable {
	fn fixed_tick(&self);
}

/// Runs when the owning scope is disposed
pub trait Disposable {
	fn dispose(&self);
}

#[derive(Default)]
pub(crate) struct LifetimeEventRegistry {
	initialize: Vec<Rc<dyn Initialize>>,
	tickable: Vec<Rc<dyn Tickable>>,
	fixed_tickable: Vec<Rc<dyn FixedTickable>>,
	disposable: Vec<Rc<dyn Disposable>>,
}

impl LifetimeEventRegistry {
	pub(crate) fn collect(scope: &Container, table: &ResolverTable) -> DiResult<Self> {
		Ok(Self {
			initialize: collect_hooks::<dyn Initialize>(scope, table)?,
			tickable: collect_hooks::<dyn Tickable>(scope, table)?,
			fixed_tickable: collect_hooks::<dyn FixedTickable>(scope, table)?,
			disposable: collect_hooks::<dyn Disposable>(scope, table)?,
		})
	}

	pub(crate) fn initialize(&self) {
		for hook in &self.initialize {
			hook.initialize();
		}
	}

	pub(crate) fn tickable(&self) -> Vec<Rc<dyn Tickable>> {
		self.tickable.clone()
	}

	pub(crate) fn fixed_tickable(&self) -> Vec<Rc<dyn FixedTickable>> {
		self.fixed_tickable.clone()
	}

	pub(crate) fn dispose(self) {
		for hook in &self.disposable {
			hook.dispose();
		}
	}
}

fn collect_hooks<H: ?Sized + 'static>(scope: &Container, table: &ResolverTable) -> DiResult<Vec<Rc<H>>> {
	let contract = TypeKey::of::<H>();
	table
		.matching(contract, &IdFilter::Any)
		.filter(|binding| !(binding.is_inherited() && binding.resolver().lifetime() == Lifetime::Singleton))
		.map(|binding| resolve_guarded(binding.resolver(), contract, scope)?.try_cast::<H>())
		.collect()
}

impl Container {
	/// Run tick hooks of this scope, then of its children
	pub fn tick(&self) {
		if !self.is_initialized() {
			return;
		}
		let hooks = self.with_events(|events| events.tickable());
		for hook in hooks {
			hook.tick();
		}
		for child in self.children() {
			child.tick();
		}
	}

	/// Run fixed-tick hooks of this scope, then of its children
	pub fn fixed_tick(&self) {
		if !self.is_initialized() {
			return;
		}
		let hooks = self.with_events(|events| events.fixed_tickable());
		for hook in hooks {
			hook.fixed_tick();
		}
		for child in self.children() {
			child.fixed_tick();
		}
	}
}
