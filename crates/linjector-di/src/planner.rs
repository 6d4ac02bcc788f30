//! Injection plans: which resolver feeds which injection point
//!
//! A plan is computed once per (type, scope) pair and reused for every
//! activation of that type in that scope.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::instance::{IdFilter, Instance, TypeKey};
use crate::reflection::{InjectiveMethod, InjectiveParameter, StructureMap};
use crate::resolver::{ResolverRef, resolve_guarded};

/// Supplies one argument of a constructor or method call
#[derive(Debug, Clone)]
pub enum ArgumentProvider {
	/// A caller-supplied value
	Existing(Instance),
	/// A value produced by a bound resolver
	Resolver {
		resolver: ResolverRef,
		contract: TypeKey,
	},
	/// Absent; the body applies its own default
	Absent,
}

impl ArgumentProvider {
	pub(crate) fn provide(&self, scope: &Container) -> DiResult<Option<Instance>> {
		match self {
			Self::Existing(instance) => Ok(Some(instance.clone())),
			Self::Resolver { resolver, contract } => resolve_guarded(resolver, *contract, scope).map(Some),
			Self::Absent => Ok(None),
		}
	}
}

/// Resolved injection points of a type within one scope
pub struct InjectionPlan {
	structure: Rc<StructureMap>,
	members: HashMap<&'static str, ResolverRef>,
	method: Option<usize>,
}

impl InjectionPlan {
	pub(crate) fn build(structure: Rc<StructureMap>, scope: &Container) -> DiResult<Self> {
		let target = structure.captured_type();
		let mut members = HashMap::new();
		for value in structure.values() {
			let filter = IdFilter::from(value.id().cloned());
			match scope.take_resolver(value.contract(), &filter)? {
				Some(resolver) => {
					members.insert(value.name(), resolver);
				}
				None if value.is_optional() => {}
				None => {
					return Err(DiError::DependencyUnsatisfied {
						target: target.name().to_string(),
						member: value.name().to_string(),
						contract: value.contract().name().to_string(),
					});
				}
			}
		}

		let registered = scope.registered_types()?;
		let method = structure.search_injection_method(&registered).and_then(|chosen| {
			structure
				.methods()
				.iter()
				.position(|candidate| std::ptr::eq(candidate, chosen))
		});

		tracing::debug!(
			type_name = target.name(),
			scope = scope.id(),
			members = members.len(),
			injection_method = method.map(|i| structure.methods()[i].name()),
			"injection plan built"
		);
		Ok(Self {
			structure,
			members,
			method,
		})
	}

	pub fn structure(&self) -> &Rc<StructureMap> {
		&self.structure
	}

	/// Resolver chosen for the member called `name`
	pub fn member_resolver(&self, name: &str) -> Option<&ResolverRef> {
		self.members.get(name)
	}

	/// Method invoked after construction, if any
	pub fn injection_method(&self) -> Option<&InjectiveMethod> {
		self.method.map(|index| &self.structure.methods()[index])
	}

	/// Constructor matching `args` best, falling back to the parameterless one
	pub fn select_constructor(&self, args: &[Instance]) -> Option<&InjectiveMethod> {
		self.structure
			.search_constructor(false, args)
			.or_else(|| self.structure.search_default_constructor())
	}
}

impl fmt::Debug for InjectionPlan {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InjectionPlan")
			.field("type", &self.structure.captured_type())
			.field("members", &self.members.keys().collect::<Vec<_>>())
			.field("method", &self.injection_method().map(InjectiveMethod::name))
			.finish()
	}
}

/// Line up supplied arguments with `params`, filling gaps from the scope.
///
/// Supplied arguments keep their position while they fit. A parameter with
/// no argument, or whose argument does not fit, gets a resolved value
/// inserted in its place, shifting the remaining arguments right.
pub(crate) fn reconcile_arguments(
	owner: TypeKey,
	method: &InjectiveMethod,
	supplied: Vec<Instance>,
	scope: &Container,
) -> DiResult<Vec<ArgumentProvider>> {
	let mut providers: Vec<ArgumentProvider> = supplied.into_iter().map(ArgumentProvider::Existing).collect();
	for (index, param) in method.parameters().iter().enumerate() {
		let fits = match providers.get(index) {
			None => None,
			Some(ArgumentProvider::Existing(argument)) => Some(argument.is_assignable_to(param.contract())),
			Some(_) => Some(true),
		};
		match fits {
			Some(true) => {}
			Some(false) => {
				let provider = parameter_provider(owner, method, index, param, scope)?;
				providers.insert(index, provider);
			}
			None => {
				let provider = parameter_provider(owner, method, index, param, scope)?;
				providers.push(provider);
			}
		}
	}
	Ok(providers)
}

fn parameter_provider(
	owner: TypeKey,
	method: &InjectiveMethod,
	index: usize,
	param: &InjectiveParameter,
	scope: &Container,
) -> DiResult<ArgumentProvider> {
	let filter = IdFilter::from(param.id().cloned());
	match scope.take_resolver(param.contract(), &filter)? {
		Some(resolver) => Ok(ArgumentProvider::Resolver {
			resolver,
			contract: param.contract(),
		}),
		None if param.is_optional() => Ok(ArgumentProvider::Absent),
		None => Err(DiError::DependencyUnsatisfied {
			target: owner.name().to_string(),
			member: format!("{}#{}", method.name(), index),
			contract: param.contract().name().to_string(),
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::reflection::{Injectable, Param, TypeShape};
	use rstest::rstest;

	#[derive(Default)]
	struct Pair {
		left: String,
		right: u32,
	}

	impl Injectable for Pair {
		fn describe(shape: &mut TypeShape<Self>) {
			shape.blank(Self::default);
			shape.constructor(vec![Param::of::<String>(), Param::of::<u32>()], |p, args| {
				p.left = args.get::<String>(0)?.to_string();
				p.right = *args.get::<u32>(1)?;
				Ok(())
			});
		}
	}

	#[derive(Default)]
	struct Optional {
		seen: Option<u32>,
	}

	impl Injectable for Optional {
		fn describe(shape: &mut TypeShape<Self>) {
			shape.blank(Self::default);
			shape.constructor(vec![Param::of::<u32>().optional()], |o, args| {
				o.seen = args.get_opt::<u32>(0)?.map(|v| *v);
				Ok(())
			});
		}
	}

	fn scope() -> Container {
		Container::create(|_, builder| {
			builder.bind::<String>().to_value("bound".to_string());
			builder.bind::<u32>().to_value(7);
		})
		.unwrap()
	}

	fn kinds(providers: &[ArgumentProvider]) -> Vec<&'static str> {
		providers
			.iter()
			.map(|p| match p {
				ArgumentProvider::Existing(_) => "existing",
				ArgumentProvider::Resolver { .. } => "resolver",
				ArgumentProvider::Absent => "absent",
			})
			.collect()
	}

	#[rstest]
	#[case(vec![], vec!["resolver", "resolver"])]
	#[case(vec![Instance::new(String::from("given"))], vec!["existing", "resolver"])]
	#[case(vec![Instance::new(3_u32)], vec!["resolver", "existing"])]
	#[case(
		vec![Instance::new(String::from("a")), Instance::new(1_u32)],
		vec!["existing", "existing"]
	)]
	fn test_reconcile_arguments(#[case] supplied: Vec<Instance>, #[case] expected: Vec<&str>) {
		// Arrange
		let scope = scope();
		let structure = StructureMap::analyse::<Pair>();
		let ctor = structure.constructors().next().unwrap();

		// Act
		let providers = reconcile_arguments(structure.captured_type(), ctor, supplied, &scope).unwrap();

		// Assert
		assert_eq!(kinds(&providers), expected);
		scope.dispose().unwrap();
	}

	#[rstest]
	fn test_reconcile_missing_required_fails() {
		// Arrange
		let scope = Container::create(|_, _| {}).unwrap();
		let structure = StructureMap::analyse::<Pair>();
		let ctor = structure.constructors().next().unwrap();

		// Act
		let result = reconcile_arguments(structure.captured_type(), ctor, Vec::new(), &scope);

		// Assert
		assert!(matches!(result, Err(DiError::DependencyUnsatisfied { .. })));
	}

	#[rstest]
	fn test_reconcile_optional_is_absent() {
		// Arrange
		let scope = Container::create(|_, _| {}).unwrap();
		let structure = StructureMap::analyse::<Optional>();
		let ctor = structure.constructors().next().unwrap();

		// Act
		let providers = reconcile_arguments(structure.captured_type(), ctor, Vec::new(), &scope).unwrap();

		// Assert
		assert_eq!(kinds(&providers), vec!["absent"]);
	}

	#[rstest]
	fn test_plan_is_cached_per_scope() {
		// Arrange
		let scope = scope();
		let structure = StructureMap::analyse::<Pair>();

		// Act
		let first = scope.injection_plan(&structure).unwrap();
		let second = scope.injection_plan(&structure).unwrap();

		// Assert
		assert!(Rc::ptr_eq(&first, &second));
		assert!(first.injection_method().is_none());
		assert!(first.select_constructor(&[]).is_some());
	}
}
