//! Lifetime resolvers
//!
//! A resolver owns one generation source and the caching policy of its
//! lifetime. Scoped and singleton resolvers remember the scope they belong
//! to (their home); values they produce are always planned against that
//! scope, whoever asks for them.

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::binding::{CrossScope, Lifetime, ResolverSpec, Source};
use crate::container::{Container, WeakContainer};
use crate::cycle_detection;
use crate::error::DiResult;
use crate::injection;
use crate::instance::{Instance, TypeKey};
use crate::settings;

/// Shared handle to a resolver
pub type ResolverRef = Rc<LifetimeResolver>;

pub enum LifetimeResolver {
	Transient(TransientResolver),
	Scoped(CachingResolver),
	Singleton(CachingResolver),
}

/// Produces a fresh value on every request
pub struct TransientResolver {
	source: Source,
}

/// Produces one value and serves it until the owning scope goes away
pub struct CachingResolver {
	source: Source,
	eager: bool,
	home: OnceCell<WeakContainer>,
	value: RefCell<Option<Instance>>,
}

impl CachingResolver {
	fn new(source: Source, eager: bool) -> Self {
		let value = match &source {
			Source::Instance(instance) => Some(instance.clone()),
			_ => None,
		};
		Self {
			source,
			eager,
			home: OnceCell::new(),
			value: RefCell::new(value),
		}
	}

	fn resolve(&self, requester: &Container) -> DiResult<Instance> {
		let cached = self.value.borrow().clone();
		if let Some(value) = cached {
			return Ok(value);
		}
		let home = self.home_or(requester)?;
		let produced = self.source.produce(&home)?;
		*self.value.borrow_mut() = Some(produced.clone());
		Ok(produced)
	}

	fn home_or(&self, requester: &Container) -> DiResult<Container> {
		match self.home.get() {
			Some(home) => home.upgrade(),
			None => {
				let _ = self.home.set(requester.downgrade());
				Ok(requester.clone())
			}
		}
	}
}

impl Source {
	fn produce(&self, scope: &Container) -> DiResult<Instance> {
		if settings::with_current(|s| s.trace_resolution) {
			tracing::trace!(scope = scope.id(), source = %self.describe(), "activating");
		}
		match self {
			Source::Typed {
				structure,
				arguments,
			} => {
				let object = injection::activate(scope, structure, arguments.clone())?;
				Ok(structure.finish(object))
			}
			Source::Method(activator) => activator(scope),
			Source::Instance(instance) => Ok(instance.clone()),
		}
	}

	fn describe(&self) -> String {
		match self {
			Source::Typed { structure, .. } => structure.captured_type().name().to_string(),
			Source::Method(_) => "<activator>".to_string(),
			Source::Instance(instance) => instance.concrete_type().name().to_string(),
		}
	}
}

impl LifetimeResolver {
	pub(crate) fn from_spec(spec: &ResolverSpec) -> DiResult<Self> {
		let source = spec.source()?;
		Ok(Self::with_source(spec.lifetime(), source, spec.is_eager()))
	}

	fn with_source(lifetime: Lifetime, source: Source, eager: bool) -> Self {
		match lifetime {
			Lifetime::Transient => Self::Transient(TransientResolver { source }),
			Lifetime::Scoped => Self::Scoped(CachingResolver::new(source, eager)),
			Lifetime::Singleton => Self::Singleton(CachingResolver::new(source, eager)),
		}
	}

	pub fn lifetime(&self) -> Lifetime {
		match self {
			Self::Transient(_) => Lifetime::Transient,
			Self::Scoped(_) => Lifetime::Scoped,
			Self::Singleton(_) => Lifetime::Singleton,
		}
	}

	pub fn cross_scope(&self) -> CrossScope {
		self.lifetime().cross_scope()
	}

	/// Whether the resolver is forced at scope initialization
	pub fn is_eager(&self) -> bool {
		match self {
			Self::Transient(_) => false,
			Self::Scoped(caching) | Self::Singleton(caching) => caching.eager,
		}
	}

	/// Whether a value has already been produced and cached
	pub fn is_cached(&self) -> bool {
		match self {
			Self::Transient(_) => false,
			Self::Scoped(caching) | Self::Singleton(caching) => caching.value.borrow().is_some(),
		}
	}

	/// Fresh resolver with the same recipe for a child scope, if the
	/// lifetime calls for one
	pub fn duplicate(&self) -> Option<ResolverRef> {
		match self {
			Self::Scoped(caching) => Some(Rc::new(Self::Scoped(CachingResolver::new(
				caching.source.clone(),
				caching.eager,
			)))),
			Self::Transient(_) | Self::Singleton(_) => None,
		}
	}

	/// Attach the resolver to the scope owning it. Later calls are ignored.
	pub(crate) fn bind_home(&self, scope: &Container) {
		if let Self::Scoped(caching) | Self::Singleton(caching) = self {
			let _ = caching.home.set(scope.downgrade());
		}
	}

	/// Produce or fetch the value, planning against `requester` when the
	/// resolver has no home of its own
	pub fn resolve(&self, requester: &Container) -> DiResult<Instance> {
		match self {
			Self::Transient(transient) => transient.source.produce(requester),
			Self::Scoped(caching) | Self::Singleton(caching) => caching.resolve(requester),
		}
	}

	/// Resolve and view the value as `T`
	pub fn resolve_as<T: ?Sized + 'static>(&self, requester: &Container) -> DiResult<Rc<T>> {
		self.resolve(requester)?.try_cast::<T>()
	}
}

impl fmt::Debug for LifetimeResolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let source = match self {
			Self::Transient(transient) => transient.source.describe(),
			Self::Scoped(caching) | Self::Singleton(caching) => caching.source.describe(),
		};
		f.debug_struct("LifetimeResolver")
			.field("lifetime", &self.lifetime())
			.field("source", &source)
			.field("eager", &self.is_eager())
			.field("cached", &self.is_cached())
			.finish()
	}
}

/// Resolve `resolver` for `contract` under cycle detection
pub(crate) fn resolve_guarded(
	resolver: &ResolverRef,
	contract: TypeKey,
	scope: &Container,
) -> DiResult<Instance> {
	let key = Rc::as_ptr(resolver) as usize;
	let _guard = cycle_detection::begin_resolution(key, contract.name())?;
	resolver.resolve(scope)
}
