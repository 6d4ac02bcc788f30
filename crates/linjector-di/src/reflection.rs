//! Type structure descriptions and injection-point analysis
//!
//! Rust has no runtime reflection, so a type opts into injection by
//! implementing [`Injectable`] and describing its shape: how to allocate a
//! blank value, which members and methods exist, and which contracts it can
//! be viewed as. [`StructureMap::analyse`] turns that description into the
//! analysed form the container works with, applying the eligibility rules:
//!
//! - a field is injectable when it is marked, writable and not static
//! - a property is injectable when it is marked and has a setter
//! - constructors are always candidates; other methods only when marked
//! - generic methods are never candidates
//!
//! Analysis results are memoized per type on the current thread.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::error::{DiError, DiResult};
use crate::instance::{BindingId, Instance, TypeKey, ViewTable, upcast_view};

/// A type whose structure can be described for injection
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use linjector_di::{Injectable, Param, TypeShape};
///
/// #[derive(Default)]
/// struct Greeter {
/// 	prefix: Rc<String>,
/// 	name: String,
/// }
///
/// impl Injectable for Greeter {
/// 	fn describe(shape: &mut TypeShape<Self>) {
/// 		shape.blank(Self::default);
/// 		shape.field::<String>("prefix", |g, v| g.prefix = v).inject();
/// 		shape.constructor(vec![Param::of::<String>()], |g, args| {
/// 			g.name = args.get::<String>(0)?.to_string();
/// 			Ok(())
/// 		});
/// 	}
/// }
/// ```
pub trait Injectable: Any + Sized {
	fn describe(shape: &mut TypeShape<Self>);
}

/// Injection marker on a member or parameter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectMarker {
	/// Identifier filter; `None` accepts any identifier
	pub id: Option<BindingId>,
	/// Skip silently when nothing is bound
	pub optional: bool,
}

type Setter = Rc<dyn Fn(&mut dyn Any, &Instance) -> DiResult<()>>;
type Invoker = Rc<dyn Fn(&mut dyn Any, &Arguments) -> DiResult<()>>;
type Allocator = Rc<dyn Fn() -> Box<dyn Any>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
	Field,
	Property,
}

struct DeclaredMember {
	name: &'static str,
	kind: MemberKind,
	contract: TypeKey,
	writable: bool,
	is_static: bool,
	setter: Option<Setter>,
	marker: Option<InjectMarker>,
}

struct DeclaredMethod {
	name: &'static str,
	is_constructor: bool,
	is_generic: bool,
	marker: Option<InjectMarker>,
	params: Vec<Param>,
	invoke: Option<Invoker>,
}

/// Builder-side description of a type, filled in by [`Injectable::describe`]
pub struct TypeShape<T> {
	blank: Option<Allocator>,
	value_type: bool,
	members: Vec<DeclaredMember>,
	methods: Vec<DeclaredMethod>,
	views: ViewTable,
	_marker: PhantomData<fn() -> T>,
}

impl<T: 'static> TypeShape<T> {
	fn new() -> Self {
		Self {
			blank: None,
			value_type: false,
			members: Vec::new(),
			methods: Vec::new(),
			views: ViewTable::for_sized::<T>(),
			_marker: PhantomData,
		}
	}

	/// Allocator producing an unconstructed value
	pub fn blank(&mut self, allocate: impl Fn() -> T + 'static) -> &mut Self {
		self.blank = Some(Rc::new(move || Box::new(allocate()) as Box<dyn Any>));
		self
	}

	/// Mark the type as a plain value type
	pub fn value_type(&mut self) -> &mut Self {
		self.value_type = true;
		self
	}

	/// Declare that `T` can be viewed as contract `I`
	pub fn implements<I: ?Sized + 'static>(
		&mut self,
		upcast: impl Fn(Rc<T>) -> Rc<I> + 'static,
	) -> &mut Self {
		self.views.insert(TypeKey::of::<I>(), upcast_view(upcast));
		self
	}

	pub fn field<D: ?Sized + 'static>(
		&mut self,
		name: &'static str,
		set: impl Fn(&mut T, Rc<D>) + 'static,
	) -> MemberDecl<'_> {
		let setter = setter::<T, D, _>(set);
		self.push_member(name, MemberKind::Field, TypeKey::of::<D>(), Some(setter), false)
	}

	/// Field that can not be assigned after construction
	pub fn readonly_field<D: ?Sized + 'static>(&mut self, name: &'static str) -> MemberDecl<'_> {
		self.push_member(name, MemberKind::Field, TypeKey::of::<D>(), None, false)
	}

	/// Type-level field, shared by all values
	pub fn static_field<D: ?Sized + 'static>(&mut self, name: &'static str) -> MemberDecl<'_> {
		self.push_member(name, MemberKind::Field, TypeKey::of::<D>(), None, true)
	}

	pub fn property<D: ?Sized + 'static>(
		&mut self,
		name: &'static str,
		set: impl Fn(&mut T, Rc<D>) + 'static,
	) -> MemberDecl<'_> {
		let setter = setter::<T, D, _>(set);
		self.push_member(name, MemberKind::Property, TypeKey::of::<D>(), Some(setter), false)
	}

	/// Property without a setter
	pub fn readonly_property<D: ?Sized + 'static>(&mut self, name: &'static str) -> MemberDecl<'_> {
		self.push_member(name, MemberKind::Property, TypeKey::of::<D>(), None, false)
	}

	/// Declare a constructor. Its body runs on the blank value after
	/// member injection.
	pub fn constructor<F>(&mut self, params: Vec<Param>, body: F) -> MethodDecl<'_>
	where
		F: Fn(&mut T, &Arguments) -> DiResult<()> + 'static,
	{
		self.push_method("new", true, false, params, Some(invoker::<T, _>(body)))
	}

	pub fn method<F>(&mut self, name: &'static str, params: Vec<Param>, body: F) -> MethodDecl<'_>
	where
		F: Fn(&mut T, &Arguments) -> DiResult<()> + 'static,
	{
		self.push_method(name, false, false, params, Some(invoker::<T, _>(body)))
	}

	/// Declare a method with type parameters. Such methods are never
	/// invoked by the container.
	pub fn generic_method(&mut self, name: &'static str, params: Vec<Param>) -> MethodDecl<'_> {
		self.push_method(name, false, true, params, None)
	}

	fn push_member(
		&mut self,
		name: &'static str,
		kind: MemberKind,
		contract: TypeKey,
		setter: Option<Setter>,
		is_static: bool,
	) -> MemberDecl<'_> {
		let writable = setter.is_some();
		self.members.push(DeclaredMember {
			name,
			kind,
			contract,
			writable,
			is_static,
			setter,
			marker: None,
		});
		let index = self.members.len() - 1;
		MemberDecl {
			member: &mut self.members[index],
		}
	}

	fn push_method(
		&mut self,
		name: &'static str,
		is_constructor: bool,
		is_generic: bool,
		params: Vec<Param>,
		invoke: Option<Invoker>,
	) -> MethodDecl<'_> {
		self.methods.push(DeclaredMethod {
			name,
			is_constructor,
			is_generic,
			marker: None,
			params,
			invoke,
		});
		let index = self.methods.len() - 1;
		MethodDecl {
			method: &mut self.methods[index],
		}
	}
}

fn setter<T, D, F>(set: F) -> Setter
where
	T: 'static,
	D: ?Sized + 'static,
	F: Fn(&mut T, Rc<D>) + 'static,
{
	Rc::new(move |target: &mut dyn Any, value: &Instance| -> DiResult<()> {
		let target = target
			.downcast_mut::<T>()
			.ok_or_else(|| DiError::mismatch(std::any::type_name::<T>(), "<target>"))?;
		set(target, value.try_cast::<D>()?);
		Ok(())
	})
}

fn invoker<T, F>(body: F) -> Invoker
where
	T: 'static,
	F: Fn(&mut T, &Arguments) -> DiResult<()> + 'static,
{
	Rc::new(move |target: &mut dyn Any, args: &Arguments| -> DiResult<()> {
		let target = target
			.downcast_mut::<T>()
			.ok_or_else(|| DiError::mismatch(std::any::type_name::<T>(), "<target>"))?;
		body(target, args)
	})
}

/// Marker options for a declared member
pub struct MemberDecl<'a> {
	member: &'a mut DeclaredMember,
}

impl MemberDecl<'_> {
	pub fn inject(self) -> Self {
		self.member.marker.get_or_insert_with(InjectMarker::default);
		self
	}

	/// Inject only from bindings with this identifier
	pub fn id(self, id: impl Into<BindingId>) -> Self {
		self.member.marker.get_or_insert_with(InjectMarker::default).id = Some(id.into());
		self
	}

	/// Leave the member untouched when nothing is bound
	pub fn optional(self) -> Self {
		self.member.marker.get_or_insert_with(InjectMarker::default).optional = true;
		self
	}
}

/// Marker options for a declared method or constructor
pub struct MethodDecl<'a> {
	method: &'a mut DeclaredMethod,
}

impl MethodDecl<'_> {
	pub fn inject(self) -> Self {
		self.method.marker.get_or_insert_with(InjectMarker::default);
		self
	}
}

/// Declared parameter of a constructor or method
#[derive(Debug, Clone)]
pub struct Param {
	contract: TypeKey,
	marker: Option<InjectMarker>,
	defaulted: bool,
}

impl Param {
	pub fn of<D: ?Sized + 'static>() -> Self {
		Self {
			contract: TypeKey::of::<D>(),
			marker: None,
			defaulted: false,
		}
	}

	pub fn inject(mut self) -> Self {
		self.marker.get_or_insert_with(InjectMarker::default);
		self
	}

	pub fn id(mut self, id: impl Into<BindingId>) -> Self {
		self.marker.get_or_insert_with(InjectMarker::default).id = Some(id.into());
		self
	}

	/// Injection-optional: a missing binding yields an absent argument
	pub fn optional(mut self) -> Self {
		self.marker.get_or_insert_with(InjectMarker::default).optional = true;
		self
	}

	/// The body supplies its own default when the argument is absent
	pub fn defaulted(mut self) -> Self {
		self.defaulted = true;
		self
	}
}

/// Arguments handed to a constructor or method body
#[derive(Debug, Default)]
pub struct Arguments {
	values: Vec<Option<Instance>>,
}

impl Arguments {
	pub(crate) fn new(values: Vec<Option<Instance>>) -> Self {
		Self { values }
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn instance(&self, index: usize) -> Option<&Instance> {
		self.values.get(index).and_then(Option::as_ref)
	}

	/// Required argument at `index`
	pub fn get<D: ?Sized + 'static>(&self, index: usize) -> DiResult<Rc<D>> {
		self.get_opt::<D>(index)?
			.ok_or_else(|| DiError::Activation(format!("argument #{index} is absent")))
	}

	/// Argument at `index`, `None` when absent
	pub fn get_opt<D: ?Sized + 'static>(&self, index: usize) -> DiResult<Option<Rc<D>>> {
		self.instance(index).map(Instance::try_cast::<D>).transpose()
	}
}

/// An analysed injectable member
pub struct InjectiveValue {
	name: &'static str,
	kind: MemberKind,
	contract: TypeKey,
	marker: InjectMarker,
	setter: Setter,
}

impl InjectiveValue {
	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn kind(&self) -> MemberKind {
		self.kind
	}

	pub fn contract(&self) -> TypeKey {
		self.contract
	}

	pub fn id(&self) -> Option<&BindingId> {
		self.marker.id.as_ref()
	}

	pub fn is_optional(&self) -> bool {
		self.marker.optional
	}

	pub(crate) fn set(&self, target: &mut dyn Any, value: &Instance) -> DiResult<()> {
		(self.setter)(target, value)
	}
}

impl fmt::Debug for InjectiveValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InjectiveValue")
			.field("name", &self.name)
			.field("kind", &self.kind)
			.field("contract", &self.contract)
			.field("marker", &self.marker)
			.finish()
	}
}

/// An analysed parameter
#[derive(Debug, Clone)]
pub struct InjectiveParameter {
	contract: TypeKey,
	marker: Option<InjectMarker>,
	defaulted: bool,
}

impl InjectiveParameter {
	pub fn contract(&self) -> TypeKey {
		self.contract
	}

	pub fn id(&self) -> Option<&BindingId> {
		self.marker.as_ref().and_then(|m| m.id.as_ref())
	}

	pub fn is_marked(&self) -> bool {
		self.marker.is_some()
	}

	pub fn is_injection_optional(&self) -> bool {
		self.marker.as_ref().is_some_and(|m| m.optional)
	}

	pub fn is_defaulted(&self) -> bool {
		self.defaulted
	}

	/// Injection-optional or defaulted
	pub fn is_optional(&self) -> bool {
		self.is_injection_optional() || self.defaulted
	}
}

/// An analysed constructor or injection method
pub struct InjectiveMethod {
	name: &'static str,
	is_constructor: bool,
	marked: bool,
	params: Vec<InjectiveParameter>,
	invoke: Invoker,
}

impl InjectiveMethod {
	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn is_constructor(&self) -> bool {
		self.is_constructor
	}

	pub fn is_marked(&self) -> bool {
		self.marked
	}

	pub fn parameters(&self) -> &[InjectiveParameter] {
		&self.params
	}

	pub(crate) fn invoke(&self, target: &mut dyn Any, args: &Arguments) -> DiResult<()> {
		(self.invoke)(target, args)
	}
}

impl fmt::Debug for InjectiveMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InjectiveMethod")
			.field("name", &self.name)
			.field("is_constructor", &self.is_constructor)
			.field("marked", &self.marked)
			.field("params", &self.params)
			.finish()
	}
}

/// Analysed structure of an injectable type
pub struct StructureMap {
	captured: TypeKey,
	is_value_type: bool,
	values: Vec<InjectiveValue>,
	methods: Vec<InjectiveMethod>,
	blank: Option<Allocator>,
	views: Rc<ViewTable>,
}

thread_local! {
	static STRUCTURES: RefCell<HashMap<TypeId, Rc<StructureMap>>> = RefCell::new(HashMap::new());
}

impl StructureMap {
	/// Analyse `T`, reusing the memoized result when present
	pub fn analyse<T: Injectable>() -> Rc<StructureMap> {
		let key = TypeId::of::<T>();
		if let Some(found) = STRUCTURES.with(|cache| cache.borrow().get(&key).cloned()) {
			return found;
		}
		let mut shape = TypeShape::<T>::new();
		T::describe(&mut shape);
		let analysed = Rc::new(Self::from_shape(TypeKey::of::<T>(), shape));
		tracing::trace!(
			type_name = analysed.captured.name(),
			values = analysed.values.len(),
			methods = analysed.methods.len(),
			"structure analysed"
		);
		STRUCTURES.with(|cache| Rc::clone(cache.borrow_mut().entry(key).or_insert(analysed)))
	}

	/// Previously analysed structure of `contract`, if any
	pub fn cached(contract: TypeKey) -> Option<Rc<StructureMap>> {
		STRUCTURES.with(|cache| cache.borrow().get(&contract.id()).cloned())
	}

	/// Like [`cached`](Self::cached) but reports unknown types as errors
	pub fn require(contract: TypeKey) -> DiResult<Rc<StructureMap>> {
		Self::cached(contract).ok_or_else(|| DiError::UnknownType(contract.name().to_string()))
	}

	fn from_shape<T>(captured: TypeKey, shape: TypeShape<T>) -> Self {
		let values = shape
			.members
			.into_iter()
			.filter_map(|member| {
				let eligible = match member.kind {
					MemberKind::Field => member.writable && !member.is_static,
					MemberKind::Property => member.writable,
				};
				match (eligible, member.marker, member.setter) {
					(true, Some(marker), Some(setter)) => Some(InjectiveValue {
						name: member.name,
						kind: member.kind,
						contract: member.contract,
						marker,
						setter,
					}),
					_ => None,
				}
			})
			.collect();
		let methods = shape
			.methods
			.into_iter()
			.filter(|method| !method.is_generic && (method.is_constructor || method.marker.is_some()))
			.filter_map(|method| {
				let marked = method.marker.is_some();
				let params = method
					.params
					.into_iter()
					.map(|param| InjectiveParameter {
						contract: param.contract,
						marker: param.marker,
						defaulted: param.defaulted,
					})
					.collect();
				method.invoke.map(|invoke| InjectiveMethod {
					name: method.name,
					is_constructor: method.is_constructor,
					marked,
					params,
					invoke,
				})
			})
			.collect();
		Self {
			captured,
			is_value_type: shape.value_type,
			values,
			methods,
			blank: shape.blank,
			views: Rc::new(shape.views),
		}
	}

	pub fn captured_type(&self) -> TypeKey {
		self.captured
	}

	pub fn is_value_type(&self) -> bool {
		self.is_value_type
	}

	/// Injectable members, in declaration order
	pub fn values(&self) -> &[InjectiveValue] {
		&self.values
	}

	/// Candidate constructors and marked methods, in declaration order
	pub fn methods(&self) -> &[InjectiveMethod] {
		&self.methods
	}

	pub fn constructors(&self) -> impl Iterator<Item = &InjectiveMethod> {
		self.methods.iter().filter(|m| m.is_constructor)
	}

	pub fn views(&self) -> &Rc<ViewTable> {
		&self.views
	}

	pub fn is_assignable_to(&self, contract: TypeKey) -> bool {
		self.views.contains(contract)
	}

	/// Constructor with parameters accepting the longest run of `args`.
	///
	/// Parameters are walked in order and each one consumes the next
	/// argument when that argument is assignable to it. The first constructor
	/// reaching the highest count wins. `None` when there is no constructor
	/// with parameters.
	pub fn search_constructor(&self, exclude_marked: bool, args: &[Instance]) -> Option<&InjectiveMethod> {
		let mut best: Option<(usize, &InjectiveMethod)> = None;
		let candidates = self
			.constructors()
			.filter(|c| !c.params.is_empty() && !(exclude_marked && c.marked));
		for candidate in candidates {
			let mut matched = 0;
			for param in &candidate.params {
				if matched >= args.len() {
					break;
				}
				if args[matched].is_assignable_to(param.contract) {
					matched += 1;
				}
			}
			match best {
				Some((count, _)) if matched <= count => {}
				_ => best = Some((matched, candidate)),
			}
		}
		best.map(|(_, method)| method)
	}

	/// First constructor without parameters
	pub fn search_default_constructor(&self) -> Option<&InjectiveMethod> {
		self.constructors().find(|c| c.params.is_empty())
	}

	/// Highest scoring marked method with parameters.
	///
	/// Each parameter scores 0 when optional, +1 when its contract is in
	/// `registered` and -1 otherwise. Ties keep the earlier declaration.
	pub fn search_injection_method(&self, registered: &HashSet<TypeKey>) -> Option<&InjectiveMethod> {
		let mut best: Option<(i64, &InjectiveMethod)> = None;
		let candidates = self
			.methods
			.iter()
			.filter(|m| !m.is_constructor && !m.params.is_empty());
		for candidate in candidates {
			let score: i64 = candidate
				.params
				.iter()
				.map(|param| {
					if param.is_optional() {
						0
					} else if registered.contains(&param.contract) {
						1
					} else {
						-1
					}
				})
				.sum();
			if best.is_none_or(|(top, _)| score > top) {
				best = Some((score, candidate));
			}
		}
		best.map(|(_, method)| method)
	}

	pub(crate) fn allocate(&self) -> DiResult<Box<dyn Any>> {
		self.blank
			.as_ref()
			.map(|allocate| allocate())
			.ok_or_else(|| DiError::ActivationImpossible(self.captured.name().to_string()))
	}

	pub(crate) fn finish(&self, object: Box<dyn Any>) -> Instance {
		Instance::from_parts(Rc::from(object), self.captured, Rc::clone(&self.views))
	}
}

impl fmt::Debug for StructureMap {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StructureMap")
			.field("captured", &self.captured)
			.field("is_value_type", &self.is_value_type)
			.field("values", &self.values)
			.field("methods", &self.methods)
			.field("views", &self.views)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	trait Named {
		fn label(&self) -> String;
	}

	#[derive(Default)]
	struct Sample {
		a: Option<Rc<String>>,
		c: Option<Rc<u32>>,
		d: Option<Rc<String>>,
		built_with: usize,
	}

	impl Named for Sample {
		fn label(&self) -> String {
			format!("sample/{}", self.built_with)
		}
	}

	impl Injectable for Sample {
		fn describe(shape: &mut TypeShape<Self>) {
			shape.blank(Self::default);
			shape.implements::<dyn Named>(|rc| rc as Rc<dyn Named>);
			shape.field::<String>("a", |s, v| s.a = Some(v)).inject();
			shape.readonly_field::<String>("b").inject();
			shape.field::<u32>("c", |s, v| s.c = Some(v)).id("count");
			shape.property::<String>("d", |s, v| s.d = Some(v)).optional();
			shape.readonly_property::<String>("e").inject();
			shape.static_field::<String>("f").inject();
			shape.field::<String>("unmarked", |s, v| s.a = Some(v));
			shape.constructor(vec![], |s, _| {
				s.built_with = 0;
				Ok(())
			});
			shape.constructor(vec![Param::of::<String>()], |s, _| {
				s.built_with = 1;
				Ok(())
			});
			shape.constructor(vec![Param::of::<String>(), Param::of::<u32>()], |s, _| {
				s.built_with = 2;
				Ok(())
			});
			shape.constructor(vec![Param::of::<u32>(), Param::of::<String>()], |s, _| {
				s.built_with = 3;
				Ok(())
			});
			shape.method("plain", vec![Param::of::<String>()], |_, _| Ok(()));
			shape
				.method("setup_registered", vec![Param::of::<String>(), Param::of::<u32>()], |_, _| {
					Ok(())
				})
				.inject();
			shape
				.method("setup_unknown", vec![Param::of::<u32>(), Param::of::<u64>()], |_, _| Ok(()))
				.inject();
			shape.generic_method("generic", vec![Param::of::<String>()]).inject();
		}
	}

	#[rstest]
	fn test_eligible_values() {
		// Act
		let map = StructureMap::analyse::<Sample>();

		// Assert
		let names: Vec<&str> = map.values().iter().map(InjectiveValue::name).collect();
		assert_eq!(names, vec!["a", "c", "d"]);
		assert_eq!(map.values()[1].id(), Some(&BindingId::from("count")));
		assert!(map.values()[2].is_optional());
		assert_eq!(map.values()[2].kind(), MemberKind::Property);
	}

	#[rstest]
	fn test_candidate_methods_exclude_unmarked_and_generic() {
		// Act
		let map = StructureMap::analyse::<Sample>();

		// Assert
		let names: Vec<&str> = map
			.methods()
			.iter()
			.filter(|m| !m.is_constructor())
			.map(InjectiveMethod::name)
			.collect();
		assert_eq!(names, vec!["setup_registered", "setup_unknown"]);
		assert_eq!(map.constructors().count(), 4);
	}

	#[rstest]
	fn test_analyse_is_memoized() {
		// Act
		let first = StructureMap::analyse::<Sample>();
		let second = StructureMap::analyse::<Sample>();

		// Assert
		assert!(Rc::ptr_eq(&first, &second));
		assert!(StructureMap::cached(TypeKey::of::<Sample>()).is_some());
		assert!(matches!(
			StructureMap::require(TypeKey::of::<Named2>()),
			Err(DiError::UnknownType(_))
		));
	}

	struct Named2;

	#[rstest]
	#[case(vec![], 1)]
	#[case(vec![Instance::new(String::from("x"))], 1)]
	#[case(vec![Instance::new(String::from("x")), Instance::new(1_u32)], 2)]
	#[case(vec![Instance::new(1_u32), Instance::new(String::from("x"))], 3)]
	#[case(vec![Instance::new(1_u64)], 1)]
	fn test_search_constructor(#[case] args: Vec<Instance>, #[case] expected: usize) {
		// Arrange
		let map = StructureMap::analyse::<Sample>();
		let mut target = Sample::default();

		// Act
		let ctor = map.search_constructor(false, &args).unwrap();
		ctor.invoke(&mut target, &Arguments::default()).unwrap();

		// Assert
		assert_eq!(target.built_with, expected);
	}

	#[rstest]
	fn test_search_default_constructor() {
		// Arrange
		let map = StructureMap::analyse::<Sample>();
		let mut target = Sample::default();
		target.built_with = 9;

		// Act
		let ctor = map.search_default_constructor().unwrap();
		ctor.invoke(&mut target, &Arguments::default()).unwrap();

		// Assert
		assert!(ctor.parameters().is_empty());
		assert_eq!(target.built_with, 0);
	}

	#[rstest]
	#[case(&[], "setup_registered")]
	#[case(&["string"], "setup_registered")]
	#[case(&["u32", "u64"], "setup_unknown")]
	#[case(&["string", "u32", "u64"], "setup_registered")]
	fn test_search_injection_method(#[case] registered: &[&str], #[case] expected: &str) {
		// Arrange
		let map = StructureMap::analyse::<Sample>();
		let registered: HashSet<TypeKey> = registered
			.iter()
			.map(|name| match *name {
				"string" => TypeKey::of::<String>(),
				"u32" => TypeKey::of::<u32>(),
				_ => TypeKey::of::<u64>(),
			})
			.collect();

		// Act
		let method = map.search_injection_method(&registered).unwrap();

		// Assert
		assert_eq!(method.name(), expected);
	}

	#[rstest]
	fn test_views_include_declared_contracts() {
		// Arrange
		let map = StructureMap::analyse::<Sample>();
		let object = map.allocate().unwrap();

		// Act
		let instance = map.finish(object);

		// Assert
		assert!(map.is_assignable_to(TypeKey::of::<dyn Named>()));
		assert_eq!(instance.cast::<dyn Named>().unwrap().label(), "sample/0");
		assert!(instance.cast::<Sample>().is_some());
	}

	#[rstest]
	fn test_setter_applies_value() {
		// Arrange
		let map = StructureMap::analyse::<Sample>();
		let mut target = Sample::default();

		// Act
		map.values()[0]
			.set(&mut target, &Instance::new(String::from("hello")))
			.unwrap();

		// Assert
		assert_eq!(target.a.as_deref().map(String::as_str), Some("hello"));
	}

	#[rstest]
	fn test_arguments_access() {
		// Arrange
		let args = Arguments::new(vec![Some(Instance::new(5_u32)), None]);

		// Act & Assert
		assert_eq!(*args.get::<u32>(0).unwrap(), 5);
		assert!(args.get_opt::<u32>(1).unwrap().is_none());
		assert!(matches!(args.get::<u32>(1), Err(DiError::Activation(_))));
		assert!(matches!(args.get::<String>(0), Err(DiError::TypeMismatch { .. })));
	}

	#[rstest]
	fn test_allocate_without_blank_fails() {
		// Arrange
		struct NoBlank;
		impl Injectable for NoBlank {
			fn describe(_shape: &mut TypeShape<Self>) {}
		}
		let map = StructureMap::analyse::<NoBlank>();

		// Act
		let result = map.allocate();

		// Assert
		assert!(matches!(result, Err(DiError::ActivationImpossible(_))));
	}
}
