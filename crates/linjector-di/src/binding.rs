//! Binding declarations: resolver specifications, type bindings and aliases

use std::fmt;
use std::rc::Rc;

use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::instance::{BindingId, Instance, TypeKey};
use crate::reflection::StructureMap;

/// Callback producing a value from the scope it is resolved in
pub type Activator = Rc<dyn Fn(&Container) -> DiResult<Instance>>;

/// How long a produced value is reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
	/// A fresh value per request
	#[default]
	Transient,
	/// One value per scope; child scopes get their own
	Scoped,
	/// One value shared by the declaring scope and all its descendants
	Singleton,
}

/// What happens to a resolver when a child scope inherits it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossScope {
	/// The child shares the parent's resolver
	Move,
	/// The child gets a fresh resolver with the same recipe
	Copy,
}

impl Lifetime {
	pub fn cross_scope(self) -> CrossScope {
		match self {
			Self::Scoped => CrossScope::Copy,
			Self::Transient | Self::Singleton => CrossScope::Move,
		}
	}
}

/// Handle to a resolver specification inside a [`ScopeBuilder`](crate::ScopeBuilder)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecId(pub(crate) usize);

/// A resolver declaration: lifetime, eagerness and exactly one source
#[derive(Clone, Default)]
pub struct ResolverSpec {
	lifetime: Lifetime,
	target: Option<Rc<StructureMap>>,
	arguments: Vec<Instance>,
	activator: Option<Activator>,
	instance: Option<Instance>,
	eager: bool,
}

/// Validated generation source of a resolver
#[derive(Clone)]
pub(crate) enum Source {
	Typed {
		structure: Rc<StructureMap>,
		arguments: Vec<Instance>,
	},
	Method(Activator),
	Instance(Instance),
}

impl ResolverSpec {
	pub fn new(lifetime: Lifetime) -> Self {
		Self {
			lifetime,
			..Self::default()
		}
	}

	pub fn lifetime(&self) -> Lifetime {
		self.lifetime
	}

	pub fn is_eager(&self) -> bool {
		self.eager
	}

	pub fn set_lifetime(&mut self, lifetime: Lifetime) -> &mut Self {
		self.lifetime = lifetime;
		self
	}

	/// Produce values by activating `structure` with extra `arguments`
	pub fn set_target(&mut self, structure: Rc<StructureMap>, arguments: Vec<Instance>) -> &mut Self {
		self.target = Some(structure);
		self.arguments = arguments;
		self
	}

	pub fn set_activator(&mut self, activator: Activator) -> &mut Self {
		self.activator = Some(activator);
		self
	}

	pub fn set_instance(&mut self, instance: Instance) -> &mut Self {
		self.instance = Some(instance);
		self
	}

	/// Resolve once at scope initialization instead of on first request
	pub fn set_eager(&mut self, eager: bool) -> &mut Self {
		self.eager = eager;
		self
	}

	pub(crate) fn source(&self) -> DiResult<Source> {
		let declared = usize::from(self.target.is_some())
			+ usize::from(self.activator.is_some())
			+ usize::from(self.instance.is_some());
		if self.instance.is_some() && self.lifetime != Lifetime::Singleton {
			return Err(DiError::InvalidResolverSpec(format!(
				"a fixed instance can only be bound as singleton, not {:?}",
				self.lifetime
			)));
		}
		if declared != 1 {
			return Err(DiError::InvalidResolverSpec(format!(
				"expected exactly one generation source, found {declared}"
			)));
		}
		if let Some(structure) = &self.target {
			return Ok(Source::Typed {
				structure: Rc::clone(structure),
				arguments: self.arguments.clone(),
			});
		}
		if let Some(activator) = &self.activator {
			return Ok(Source::Method(Rc::clone(activator)));
		}
		match &self.instance {
			Some(instance) => Ok(Source::Instance(instance.clone())),
			None => Err(DiError::InvalidResolverSpec("no generation source".to_string())),
		}
	}
}

impl fmt::Debug for ResolverSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResolverSpec")
			.field("lifetime", &self.lifetime)
			.field("target", &self.target.as_ref().map(|s| s.captured_type()))
			.field("arguments", &self.arguments.len())
			.field("activator", &self.activator.is_some())
			.field("instance", &self.instance)
			.field("eager", &self.eager)
			.finish()
	}
}

/// Contract and identifier served by a resolver specification
#[derive(Debug, Clone)]
pub struct TypeBinding {
	pub contract: TypeKey,
	pub id: BindingId,
	pub spec: SpecId,
}

/// Serve `from` with whatever is bound under `to`
#[derive(Debug, Clone)]
pub struct AliasBinding {
	pub from: TypeKey,
	pub from_id: BindingId,
	pub to: TypeKey,
	pub to_id: BindingId,
}

impl AliasBinding {
	pub(crate) fn validate(&self) -> DiResult<()> {
		if self.from == self.to {
			return Err(DiError::SelfAlias {
				type_name: self.from.name().to_string(),
			});
		}
		Ok(())
	}
}

impl fmt::Display for AliasBinding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}[{}] -> {}[{}]",
			self.from, self.from_id, self.to, self.to_id
		)
	}
}
