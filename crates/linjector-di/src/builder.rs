//! Scope builder and the fluent binding API
//!
//! A [`ScopeBuilder`] is handed to the build callback of
//! [`Container::create`] and [`Container::create_child`]. Declarations start
//! from [`ScopeBuilder::bind`] and pick a source, a lifetime and optionally
//! eager activation:
//!
//! ```
//! use std::rc::Rc;
//! use linjector_di::Container;
//!
//! let container = Container::create(|_, builder| {
//! 	builder.bind::<String>().to_value("hello".to_string());
//! 	builder
//! 		.bind::<u32>()
//! 		.with_id("answer")
//! 		.to_method(|_| Ok(Rc::new(42)))
//! 		.as_scoped()
//! 		.non_lazy();
//! })
//! .unwrap();
//!
//! assert_eq!(container.resolve::<String>().unwrap().as_deref().map(String::as_str), Some("hello"));
//! assert_eq!(container.resolve_id::<u32>("answer").unwrap().as_deref(), Some(&42));
//! ```
//!
//! Declaration mistakes (missing or duplicate sources, self aliases) are
//! reported when the scope is generated, not while declaring.

use std::marker::PhantomData;
use std::rc::Rc;

use crate::binding::{AliasBinding, Lifetime, ResolverSpec, SpecId, TypeBinding};
use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::instance::{BindingId, Instance, TypeKey};
use crate::reflection::{Injectable, StructureMap};

/// Collects the declarations of one scope
#[derive(Default)]
pub struct ScopeBuilder {
	parent: Option<Container>,
	ready: bool,
	fault: Option<&'static str>,
	specs: Vec<ResolverSpec>,
	types: Vec<TypeBinding>,
	aliases: Vec<AliasBinding>,
}

impl ScopeBuilder {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	pub(crate) fn prepare(&mut self, parent: &Container) -> DiResult<()> {
		if self.ready {
			return Err(DiError::BuilderState("builder prepared twice"));
		}
		self.parent = Some(parent.clone());
		self.ready = true;
		Ok(())
	}

	pub(crate) fn reset(&mut self) {
		self.parent = None;
		self.ready = false;
		self.fault = None;
		self.specs.clear();
		self.types.clear();
		self.aliases.clear();
	}

	/// Scope the new container will be a child of
	pub fn parent(&self) -> Option<&Container> {
		self.parent.as_ref()
	}

	pub fn is_ready(&self) -> bool {
		self.ready
	}

	/// Fail when the builder was used outside prepare/reset
	pub(crate) fn check_state(&self) -> DiResult<()> {
		if !self.ready {
			return Err(DiError::BuilderState("builder used before being prepared"));
		}
		match self.fault {
			Some(fault) => Err(DiError::BuilderState(fault)),
			None => Ok(()),
		}
	}

	pub(crate) fn specs(&self) -> &[ResolverSpec] {
		&self.specs
	}

	pub(crate) fn type_bindings(&self) -> &[TypeBinding] {
		&self.types
	}

	pub(crate) fn alias_bindings(&self) -> &[AliasBinding] {
		&self.aliases
	}

	fn note_unprepared(&mut self) {
		if !self.ready && self.fault.is_none() {
			self.fault = Some("declaration made on an unprepared builder");
		}
	}

	/// Declare a resolver specification and return its handle
	pub fn create_resolver_spec(&mut self, lifetime: Lifetime) -> SpecId {
		self.note_unprepared();
		self.specs.push(ResolverSpec::new(lifetime));
		SpecId(self.specs.len() - 1)
	}

	pub fn spec_mut(&mut self, spec: SpecId) -> Option<&mut ResolverSpec> {
		self.specs.get_mut(spec.0)
	}

	/// Serve `contract` under `id` with the resolver declared by `spec`
	pub fn create_type_binding(&mut self, contract: TypeKey, id: BindingId, spec: SpecId) {
		self.note_unprepared();
		self.types.push(TypeBinding { contract, id, spec });
	}

	/// Serve `from` under `from_id` with whatever serves `to` under `to_id`
	pub fn create_alias_binding(
		&mut self,
		from: TypeKey,
		from_id: BindingId,
		to: TypeKey,
		to_id: BindingId,
	) {
		self.note_unprepared();
		self.aliases.push(AliasBinding {
			from,
			from_id,
			to,
			to_id,
		});
	}

	/// Start a declaration serving contract `T`
	pub fn bind<T: ?Sized + 'static>(&mut self) -> BindingSource<'_, T> {
		BindingSource::new(self, vec![TypeKey::of::<T>()])
	}

	/// Start a declaration serving several contracts at once
	pub fn bind_types(&mut self, contracts: &[TypeKey]) -> BindingSource<'_, dyn std::any::Any> {
		BindingSource::new(self, contracts.to_vec())
	}

	/// Start a declaration serving every contract `T` declares, except `T` itself
	pub fn bind_interfaces<T: Injectable>(&mut self) -> BindingSource<'_, T> {
		let own = TypeKey::of::<T>();
		let contracts = StructureMap::analyse::<T>()
			.views()
			.contracts()
			.iter()
			.copied()
			.filter(|contract| *contract != own)
			.collect();
		BindingSource::new(self, contracts)
	}

	/// Start a declaration serving `T` and every contract it declares
	pub fn bind_interfaces_and_self<T: Injectable>(&mut self) -> BindingSource<'_, T> {
		let contracts = StructureMap::analyse::<T>().views().contracts().to_vec();
		BindingSource::new(self, contracts)
	}
}

/// First stage of a declaration: contracts and identifier, awaiting a source
pub struct BindingSource<'a, T: ?Sized> {
	builder: &'a mut ScopeBuilder,
	contracts: Vec<TypeKey>,
	id: BindingId,
	_contract: PhantomData<fn() -> Rc<T>>,
}

impl<'a, T: ?Sized + 'static> BindingSource<'a, T> {
	fn new(builder: &'a mut ScopeBuilder, contracts: Vec<TypeKey>) -> Self {
		Self {
			builder,
			contracts,
			id: BindingId::Unnamed,
			_contract: PhantomData,
		}
	}

	/// Serve an additional contract with the same resolver
	pub fn also<U: ?Sized + 'static>(mut self) -> Self {
		let contract = TypeKey::of::<U>();
		if !self.contracts.contains(&contract) {
			self.contracts.push(contract);
		}
		self
	}

	pub fn with_id(mut self, id: impl Into<BindingId>) -> Self {
		self.id = id.into();
		self
	}

	fn declare(self, spec: ResolverSpec) -> LifetimeBinding<'a> {
		let Self {
			builder,
			contracts,
			id,
			..
		} = self;
		let spec_id = builder.create_resolver_spec(spec.lifetime());
		if let Some(slot) = builder.spec_mut(spec_id) {
			*slot = spec;
		}
		for contract in contracts {
			builder.create_type_binding(contract, id.clone(), spec_id);
		}
		LifetimeBinding {
			builder,
			spec: spec_id,
		}
	}

	/// Produce values by activating `T` itself
	pub fn to_self(self) -> LifetimeBinding<'a>
	where
		T: Injectable,
	{
		self.to::<T>()
	}

	pub fn to_self_with(self, arguments: Vec<Instance>) -> LifetimeBinding<'a>
	where
		T: Injectable,
	{
		self.to_with::<T>(arguments)
	}

	/// Produce values by activating `U`
	pub fn to<U: Injectable>(self) -> LifetimeBinding<'a> {
		self.to_with::<U>(Vec::new())
	}

	/// Produce values by activating `U` with extra constructor arguments
	pub fn to_with<U: Injectable>(self, arguments: Vec<Instance>) -> LifetimeBinding<'a> {
		self.to_structure(StructureMap::analyse::<U>(), arguments)
	}

	/// Produce values by activating an already analysed structure
	pub fn to_structure(self, structure: Rc<StructureMap>, arguments: Vec<Instance>) -> LifetimeBinding<'a> {
		let mut spec = ResolverSpec::new(Lifetime::Transient);
		spec.set_target(structure, arguments);
		self.declare(spec)
	}

	/// Always serve this exact instance
	pub fn to_instance(self, instance: Instance) -> EagerBinding<'a> {
		let mut spec = ResolverSpec::new(Lifetime::Singleton);
		spec.set_instance(instance);
		self.declare(spec).into_eager()
	}

	pub fn to_value(self, value: T) -> EagerBinding<'a>
	where
		T: Sized,
	{
		self.to_instance(Instance::new(value))
	}

	pub fn to_shared(self, value: Rc<T>) -> EagerBinding<'a> {
		self.to_instance(Instance::from_rc(value))
	}

	/// Produce values with a callback; singleton unless changed
	pub fn to_method<F>(self, activator: F) -> LifetimeBinding<'a>
	where
		F: Fn(&Container) -> DiResult<Rc<T>> + 'static,
	{
		self.to_method_instance(move |scope| activator(scope).map(Instance::from_rc))
	}

	pub fn to_method_instance<F>(self, activator: F) -> LifetimeBinding<'a>
	where
		F: Fn(&Container) -> DiResult<Instance> + 'static,
	{
		let mut spec = ResolverSpec::new(Lifetime::Singleton);
		spec.set_activator(Rc::new(activator));
		self.declare(spec)
	}

	/// Produce a fresh value with a callback on every request
	pub fn to_factory<F>(self, factory: F)
	where
		F: Fn(&Container) -> DiResult<Rc<T>> + 'static,
	{
		self.to_factory_instance(move |scope| factory(scope).map(Instance::from_rc));
	}

	pub fn to_factory_instance<F>(self, factory: F)
	where
		F: Fn(&Container) -> DiResult<Instance> + 'static,
	{
		let mut spec = ResolverSpec::new(Lifetime::Transient);
		spec.set_activator(Rc::new(factory));
		self.declare(spec);
	}

	/// Serve the contracts with whatever serves unnamed `U`
	pub fn alias_of<U: ?Sized + 'static>(self) {
		self.alias_of_id::<U>(BindingId::Unnamed);
	}

	/// Serve the contracts with whatever serves `U` under `id`
	pub fn alias_of_id<U: ?Sized + 'static>(self, id: impl Into<BindingId>) {
		let target = TypeKey::of::<U>();
		let target_id = id.into();
		for contract in self.contracts {
			self.builder
				.create_alias_binding(contract, self.id.clone(), target, target_id.clone());
		}
	}
}

/// Second stage of a declaration: choose a lifetime
pub struct LifetimeBinding<'a> {
	builder: &'a mut ScopeBuilder,
	spec: SpecId,
}

impl<'a> LifetimeBinding<'a> {
	fn set(self, lifetime: Lifetime) -> EagerBinding<'a> {
		if let Some(spec) = self.builder.spec_mut(self.spec) {
			spec.set_lifetime(lifetime);
		}
		self.into_eager()
	}

	fn into_eager(self) -> EagerBinding<'a> {
		EagerBinding {
			builder: self.builder,
			spec: self.spec,
		}
	}

	pub fn as_transient(self) -> EagerBinding<'a> {
		self.set(Lifetime::Transient)
	}

	pub fn as_scoped(self) -> EagerBinding<'a> {
		self.set(Lifetime::Scoped)
	}

	pub fn as_singleton(self) -> EagerBinding<'a> {
		self.set(Lifetime::Singleton)
	}

	/// Keep the default lifetime and activate at scope initialization
	pub fn non_lazy(self) {
		self.into_eager().non_lazy();
	}
}

/// Last stage of a declaration: optional eager activation
pub struct EagerBinding<'a> {
	builder: &'a mut ScopeBuilder,
	spec: SpecId,
}

impl EagerBinding<'_> {
	/// Activate at scope initialization instead of on first request
	pub fn non_lazy(self) {
		if let Some(spec) = self.builder.spec_mut(self.spec) {
			spec.set_eager(true);
		}
	}
}
