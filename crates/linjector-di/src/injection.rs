//! Object activation and member injection
//!
//! Activating a type runs in a fixed order:
//!
//! 1. resolve the constructor arguments
//! 2. allocate a blank value
//! 3. inject members
//! 4. run the constructor body
//! 5. run the injection method, if one was selected

use std::any::Any;
use std::rc::Rc;

use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::instance::Instance;
use crate::planner::{ArgumentProvider, InjectionPlan, reconcile_arguments};
use crate::reflection::{Arguments, Injectable, StructureMap};
use crate::resolver::resolve_guarded;

fn provide_all(providers: &[ArgumentProvider], scope: &Container) -> DiResult<Arguments> {
	let values = providers
		.iter()
		.map(|provider| provider.provide(scope))
		.collect::<DiResult<Vec<_>>>()?;
	Ok(Arguments::new(values))
}

/// Assign every planned member. A supplied value assignable to a member's
/// contract takes precedence over the member's resolver.
fn inject_values(
	target: &mut dyn Any,
	plan: &InjectionPlan,
	scope: &Container,
	overrides: &[Instance],
) -> DiResult<()> {
	for value in plan.structure().values() {
		if let Some(extra) = overrides.iter().find(|i| i.is_assignable_to(value.contract())) {
			value.set(target, extra)?;
			continue;
		}
		if let Some(resolver) = plan.member_resolver(value.name()) {
			let produced = resolve_guarded(resolver, value.contract(), scope)?;
			value.set(target, &produced)?;
		}
	}
	Ok(())
}

fn invoke_injection_method(target: &mut dyn Any, plan: &InjectionPlan, scope: &Container) -> DiResult<()> {
	let Some(method) = plan.injection_method() else {
		return Ok(());
	};
	let owner = plan.structure().captured_type();
	let providers = reconcile_arguments(owner, method, Vec::new(), scope)?;
	let args = provide_all(&providers, scope)?;
	method.invoke(target, &args)
}

/// Build a new object of `structure` in `scope`
pub(crate) fn activate(
	scope: &Container,
	structure: &Rc<StructureMap>,
	supplied: Vec<Instance>,
) -> DiResult<Box<dyn Any>> {
	let plan = scope.injection_plan(structure)?;
	let owner = structure.captured_type();
	let constructor = plan.select_constructor(&supplied);
	let providers = match constructor {
		Some(constructor) => reconcile_arguments(owner, constructor, supplied, scope)?,
		None => supplied.into_iter().map(ArgumentProvider::Existing).collect(),
	};
	let args = provide_all(&providers, scope)?;

	let mut object = structure.allocate()?;
	inject_values(object.as_mut(), &plan, scope, &[])?;
	if let Some(constructor) = constructor {
		constructor.invoke(object.as_mut(), &args)?;
	}
	invoke_injection_method(object.as_mut(), &plan, scope)?;
	Ok(object)
}

impl Container {
	/// Activate a new `T`, passing `args` to the best matching constructor
	pub fn new_object<T: Injectable>(&self, args: Vec<Instance>) -> DiResult<T> {
		self.ensure_available()?;
		let structure = StructureMap::analyse::<T>();
		let object = activate(self, &structure, args)?;
		object
			.downcast::<T>()
			.map(|boxed| *boxed)
			.map_err(|_| DiError::mismatch(std::any::type_name::<T>(), structure.captured_type().name()))
	}

	/// Activate a new object of an already analysed type
	pub fn new_instance(&self, structure: &Rc<StructureMap>, args: Vec<Instance>) -> DiResult<Instance> {
		self.ensure_available()?;
		let object = activate(self, structure, args)?;
		Ok(structure.finish(object))
	}

	/// Inject members and run the injection method on an existing value
	pub fn inject<T: Injectable>(&self, target: &mut T) -> DiResult<()> {
		self.inject_explicit(target, &[])
	}

	/// Like [`inject`](Self::inject), but `extras` take precedence over bound
	/// resolvers for members they are assignable to
	pub fn inject_explicit<T: Injectable>(&self, target: &mut T, extras: &[Instance]) -> DiResult<()> {
		self.ensure_available()?;
		let plan = self.injection_plan(&StructureMap::analyse::<T>())?;
		inject_values(target, &plan, self, extras)?;
		invoke_injection_method(target, &plan, self)
	}
}
