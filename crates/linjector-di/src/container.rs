//! Hierarchical containers
//!
//! Every container is a scope in a tree rooted at the thread's super-empty
//! container (id 0). A scope moves from building to initialized to
//! disposed; resolution and injection require an initialized scope.
//!
//! Containers are reference-counted handles: cloning one yields another
//! handle to the same scope.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::builder::ScopeBuilder;
use crate::error::{DiError, DiResult};
use crate::graph::{self, ResolverTable};
use crate::instance::{BindingId, IdFilter, Instance, TypeKey};
use crate::lifecycle::LifetimeEventRegistry;
use crate::planner::InjectionPlan;
use crate::reflection::StructureMap;
use crate::resolver::{ResolverRef, resolve_guarded};

static NEXT_CONTAINER_ID: AtomicU32 = AtomicU32::new(1);

/// Lifecycle state of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
	/// Table generated, not yet initialized
	Building,
	Initialized,
	Disposed,
}

pub(crate) struct ContainerInner {
	id: u32,
	state: Cell<ScopeState>,
	parent: Option<WeakContainer>,
	children: RefCell<Vec<Container>>,
	table: RefCell<Option<Rc<ResolverTable>>>,
	registered: RefCell<Option<Rc<HashSet<TypeKey>>>>,
	plans: RefCell<HashMap<std::any::TypeId, Rc<InjectionPlan>>>,
	events: RefCell<LifetimeEventRegistry>,
}

/// Handle to one scope of the container tree
#[derive(Clone)]
pub struct Container {
	inner: Rc<ContainerInner>,
}

/// Non-owning handle to a container
#[derive(Clone)]
pub(crate) struct WeakContainer {
	id: u32,
	inner: Weak<ContainerInner>,
}

impl WeakContainer {
	pub(crate) fn upgrade(&self) -> DiResult<Container> {
		self.inner
			.upgrade()
			.map(|inner| Container { inner })
			.ok_or(DiError::ScopeDisposed(self.id))
	}
}

/// Scope tree notification delivered to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerEvent {
	/// The scope finished initializing
	Created,
	/// The scope is about to dispose its children and itself
	WillDispose,
}

/// Registration handle returned by [`Container::observe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Rc<dyn Fn(ContainerEvent, &Container)>;

thread_local! {
	static SUPER_EMPTY: Container = Container::new_root();
	static OBSERVERS: RefCell<Vec<(ObserverId, Observer)>> = const { RefCell::new(Vec::new()) };
	static NEXT_OBSERVER_ID: Cell<u64> = const { Cell::new(1) };
}

impl Container {
	fn new_root() -> Self {
		Self {
			inner: Rc::new(ContainerInner {
				id: 0,
				state: Cell::new(ScopeState::Initialized),
				parent: None,
				children: RefCell::new(Vec::new()),
				table: RefCell::new(Some(Rc::new(ResolverTable::default()))),
				registered: RefCell::new(None),
				plans: RefCell::new(HashMap::new()),
				events: RefCell::new(LifetimeEventRegistry::default()),
			}),
		}
	}

	fn with_table(parent: &Container, table: ResolverTable) -> Self {
		Self {
			inner: Rc::new(ContainerInner {
				id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
				state: Cell::new(ScopeState::Building),
				parent: Some(parent.downgrade()),
				children: RefCell::new(Vec::new()),
				table: RefCell::new(Some(Rc::new(table))),
				registered: RefCell::new(None),
				plans: RefCell::new(HashMap::new()),
				events: RefCell::new(LifetimeEventRegistry::default()),
			}),
		}
	}

	/// The thread's root container: no bindings, always initialized, never
	/// disposed
	pub fn super_empty() -> Container {
		SUPER_EMPTY.with(Container::clone)
	}

	/// Create and initialize a top-level container
	pub fn create<F>(build: F) -> DiResult<Container>
	where
		F: FnOnce(&Container, &mut ScopeBuilder),
	{
		Self::super_empty().create_child(build)
	}

	/// Create and initialize a child of this container
	pub fn create_child<F>(&self, build: F) -> DiResult<Container>
	where
		F: FnOnce(&Container, &mut ScopeBuilder),
	{
		self.spawn_child(build, true)
	}

	/// Create a child that stays in the building state until
	/// [`initialize`](Self::initialize) is called
	pub fn create_child_deferred<F>(&self, build: F) -> DiResult<Container>
	where
		F: FnOnce(&Container, &mut ScopeBuilder),
	{
		self.spawn_child(build, false)
	}

	fn spawn_child<F>(&self, build: F, initialize: bool) -> DiResult<Container>
	where
		F: FnOnce(&Container, &mut ScopeBuilder),
	{
		self.ensure_available()?;
		let parent_table = self.table()?;
		let mut builder = ScopeBuilder::new();
		builder.prepare(self)?;
		build(self, &mut builder);
		let generated = graph::build_table(&builder, &parent_table);
		builder.reset();

		let child = Container::with_table(self, generated?);
		self.inner.children.borrow_mut().push(child.clone());
		tracing::debug!(parent = self.id(), child = child.id(), "container created");

		if initialize {
			if let Err(err) = child.initialize() {
				tracing::debug!(child = child.id(), error = %err, "container initialization failed");
				let _ = child.dispose();
				return Err(err);
			}
		}
		Ok(child)
	}

	/// Bind resolvers to this scope, force eager ones and run
	/// initialization hooks. Calling it again is a no-op.
	pub fn initialize(&self) -> DiResult<()> {
		match self.state() {
			ScopeState::Initialized => return Ok(()),
			ScopeState::Disposed => return Err(DiError::ScopeDisposed(self.id())),
			ScopeState::Building => {}
		}
		let table = self.table()?;
		for (_, _, binding) in table.iter() {
			binding.resolver().bind_home(self);
		}
		// Eager activation resolves through this scope, so it must look initialized
		self.inner.state.set(ScopeState::Initialized);
		if let Err(err) = self.activate_eager(&table) {
			self.inner.state.set(ScopeState::Building);
			return Err(err);
		}
		tracing::debug!(container = self.id(), bindings = table.len(), "container initialized");
		self.notify(ContainerEvent::Created);
		Ok(())
	}

	fn activate_eager(&self, table: &ResolverTable) -> DiResult<()> {
		let mut forced: HashSet<usize> = HashSet::new();
		for (contract, _, binding) in table.iter() {
			let resolver = binding.resolver();
			if resolver.is_eager()
				&& !resolver.is_cached()
				&& forced.insert(Rc::as_ptr(resolver) as usize)
			{
				resolve_guarded(resolver, contract, self)?;
			}
		}

		let registry = LifetimeEventRegistry::collect(self, table)?;
		registry.initialize();
		*self.inner.events.borrow_mut() = registry;
		Ok(())
	}

	/// Dispose children first, detach from the parent, run dispose hooks and
	/// release every resolver
	pub fn dispose(&self) -> DiResult<()> {
		if self.is_super_empty() {
			return Err(DiError::SuperEmptyForbidden);
		}
		if self.is_disposed() {
			return Err(DiError::ScopeDisposed(self.id()));
		}
		self.notify(ContainerEvent::WillDispose);
		let children: Vec<Container> = self.inner.children.borrow().clone();
		for child in children {
			if child.is_disposed() {
				continue;
			}
			child.dispose()?;
		}
		if let Some(parent) = self.parent() {
			parent
				.inner
				.children
				.borrow_mut()
				.retain(|sibling| sibling.id() != self.id());
		}

		let registry = std::mem::take(&mut *self.inner.events.borrow_mut());
		registry.dispose();
		self.inner.children.borrow_mut().clear();
		self.inner.plans.borrow_mut().clear();
		self.inner.registered.borrow_mut().take();
		self.inner.table.borrow_mut().take();
		self.inner.state.set(ScopeState::Disposed);
		tracing::debug!(container = self.id(), "container disposed");
		Ok(())
	}

	/// Register a callback for scope creation and disposal on this thread
	pub fn observe<F>(observer: F) -> ObserverId
	where
		F: Fn(ContainerEvent, &Container) + 'static,
	{
		let id = NEXT_OBSERVER_ID.with(|next| {
			let id = next.get();
			next.set(id + 1);
			ObserverId(id)
		});
		let observer: Observer = Rc::new(observer);
		OBSERVERS.with(|observers| observers.borrow_mut().push((id, observer)));
		id
	}

	/// Remove an observer; `false` when it was not registered
	pub fn unobserve(id: ObserverId) -> bool {
		OBSERVERS.with(|observers| {
			let mut observers = observers.borrow_mut();
			let before = observers.len();
			observers.retain(|(registered, _)| *registered != id);
			observers.len() != before
		})
	}

	fn notify(&self, event: ContainerEvent) {
		// Snapshot so observers may register or unregister while notified
		let observers: Vec<Observer> =
			OBSERVERS.with(|observers| observers.borrow().iter().map(|(_, f)| Rc::clone(f)).collect());
		for observer in observers {
			observer(event, self);
		}
	}

	pub fn id(&self) -> u32 {
		self.inner.id
	}

	pub fn state(&self) -> ScopeState {
		self.inner.state.get()
	}

	pub fn is_initialized(&self) -> bool {
		self.state() == ScopeState::Initialized
	}

	pub fn is_disposed(&self) -> bool {
		self.state() == ScopeState::Disposed
	}

	pub fn is_super_empty(&self) -> bool {
		self.inner.id == 0
	}

	pub fn parent(&self) -> Option<Container> {
		self.inner.parent.as_ref().and_then(|parent| parent.upgrade().ok())
	}

	/// Live children, in creation order
	pub fn children(&self) -> Vec<Container> {
		self.inner.children.borrow().clone()
	}

	pub(crate) fn downgrade(&self) -> WeakContainer {
		WeakContainer {
			id: self.inner.id,
			inner: Rc::downgrade(&self.inner),
		}
	}

	pub(crate) fn with_events<R>(&self, f: impl FnOnce(&LifetimeEventRegistry) -> R) -> R {
		f(&self.inner.events.borrow())
	}

	/// Fail unless the container is initialized and not disposed
	pub(crate) fn ensure_available(&self) -> DiResult<()> {
		match self.state() {
			ScopeState::Initialized => Ok(()),
			ScopeState::Building => Err(DiError::ScopeUninitialized(self.id())),
			ScopeState::Disposed => Err(DiError::ScopeDisposed(self.id())),
		}
	}

	pub(crate) fn table(&self) -> DiResult<Rc<ResolverTable>> {
		self.inner
			.table
			.borrow()
			.clone()
			.ok_or(DiError::ScopeDisposed(self.id()))
	}

	/// First resolver serving `contract` under `filter`
	pub(crate) fn take_resolver(&self, contract: TypeKey, filter: &IdFilter) -> DiResult<Option<ResolverRef>> {
		let table = self.table()?;
		Ok(table
			.first(contract, filter)
			.map(|binding| Rc::clone(binding.resolver())))
	}

	pub(crate) fn take_resolvers(&self, contract: TypeKey, filter: &IdFilter) -> DiResult<Vec<ResolverRef>> {
		let table = self.table()?;
		Ok(table
			.matching(contract, filter)
			.map(|binding| Rc::clone(binding.resolver()))
			.collect())
	}

	/// Plan for activating `structure` in this scope, built on first use
	pub(crate) fn injection_plan(&self, structure: &Rc<StructureMap>) -> DiResult<Rc<InjectionPlan>> {
		let key = structure.captured_type().id();
		if let Some(plan) = self.inner.plans.borrow().get(&key).cloned() {
			return Ok(plan);
		}
		let plan = Rc::new(InjectionPlan::build(Rc::clone(structure), self)?);
		self.inner
			.plans
			.borrow_mut()
			.insert(key, Rc::clone(&plan));
		Ok(plan)
	}

	/// Contracts with at least one binding in this scope, inherited ones
	/// included
	pub fn registered_types(&self) -> DiResult<Rc<HashSet<TypeKey>>> {
		if let Some(registered) = self.inner.registered.borrow().clone() {
			return Ok(registered);
		}
		let registered: Rc<HashSet<TypeKey>> = Rc::new(self.table()?.contracts().collect());
		*self.inner.registered.borrow_mut() = Some(Rc::clone(&registered));
		Ok(registered)
	}

	pub fn contains(&self, contract: TypeKey, filter: &IdFilter) -> DiResult<bool> {
		self.ensure_available()?;
		Ok(self.table()?.first(contract, filter).is_some())
	}

	/// Resolve the first binding of `contract` accepted by `filter`.
	/// `Ok(None)` when nothing matches.
	pub fn resolve_instance(&self, contract: TypeKey, filter: &IdFilter) -> DiResult<Option<Instance>> {
		self.ensure_available()?;
		self.take_resolver(contract, filter)?
			.map(|resolver| resolve_guarded(&resolver, contract, self))
			.transpose()
	}

	/// Resolve every binding of `contract` accepted by `filter`, in table order
	pub fn resolve_all_instances(&self, contract: TypeKey, filter: &IdFilter) -> DiResult<Vec<Instance>> {
		self.ensure_available()?;
		self.take_resolvers(contract, filter)?
			.iter()
			.map(|resolver| resolve_guarded(resolver, contract, self))
			.collect()
	}

	/// Resolve `T` from the first binding, whatever its identifier
	pub fn resolve<T: ?Sized + 'static>(&self) -> DiResult<Option<Rc<T>>> {
		self.resolve_filtered::<T>(&IdFilter::Any)
	}

	/// Resolve `T` from the binding with exactly this identifier
	pub fn resolve_id<T: ?Sized + 'static>(&self, id: impl Into<BindingId>) -> DiResult<Option<Rc<T>>> {
		self.resolve_filtered::<T>(&IdFilter::Exact(id.into()))
	}

	pub fn resolve_filtered<T: ?Sized + 'static>(&self, filter: &IdFilter) -> DiResult<Option<Rc<T>>> {
		self.resolve_instance(TypeKey::of::<T>(), filter)?
			.map(|instance| instance.try_cast::<T>())
			.transpose()
	}

	/// Resolve `T` into `out`. Returns whether a binding matched; `out` is
	/// left untouched otherwise.
	pub fn try_resolve<T: ?Sized + 'static>(&self, filter: &IdFilter, out: &mut Option<Rc<T>>) -> DiResult<bool> {
		match self.resolve_filtered::<T>(filter)? {
			Some(value) => {
				*out = Some(value);
				Ok(true)
			}
			None => Ok(false),
		}
	}

	/// Resolve `T`, or return `fallback` when nothing is bound
	pub fn resolve_or<T: Clone + 'static>(&self, fallback: T) -> DiResult<T> {
		Ok(self
			.resolve::<T>()?
			.map_or(fallback, |value| T::clone(&value)))
	}

	pub fn resolve_all<T: ?Sized + 'static>(&self) -> DiResult<Vec<Rc<T>>> {
		let mut out = Vec::new();
		self.resolve_all_into(&IdFilter::Any, &mut out)?;
		Ok(out)
	}

	pub fn resolve_all_id<T: ?Sized + 'static>(&self, id: impl Into<BindingId>) -> DiResult<Vec<Rc<T>>> {
		let mut out = Vec::new();
		self.resolve_all_into(&IdFilter::Exact(id.into()), &mut out)?;
		Ok(out)
	}

	/// Append every match to `out`; returns how many were appended
	pub fn resolve_all_into<T: ?Sized + 'static>(&self, filter: &IdFilter, out: &mut Vec<Rc<T>>) -> DiResult<usize> {
		let instances = self.resolve_all_instances(TypeKey::of::<T>(), filter)?;
		let count = instances.len();
		for instance in instances {
			out.push(instance.try_cast::<T>()?);
		}
		Ok(count)
	}
}

impl PartialEq for Container {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl Eq for Container {}

impl fmt::Debug for Container {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Container")
			.field("id", &self.inner.id)
			.field("state", &self.inner.state.get())
			.field("children", &self.inner.children.borrow().len())
			.finish()
	}
}
