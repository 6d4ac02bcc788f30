//! Contract keys, binding identifiers and type-erased instances

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::error::{DiError, DiResult};
use crate::reflection::{Injectable, StructureMap};

/// Runtime identity of a contract type, sized or not
#[derive(Clone, Copy)]
pub struct TypeKey {
	id: TypeId,
	name: &'static str,
}

impl TypeKey {
	pub fn of<T: ?Sized + 'static>() -> Self {
		Self {
			id: TypeId::of::<T>(),
			name: std::any::type_name::<T>(),
		}
	}

	pub fn id(&self) -> TypeId {
		self.id
	}

	pub fn name(&self) -> &'static str {
		self.name
	}
}

impl PartialEq for TypeKey {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Debug for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TypeKey({})", self.name)
	}
}

impl fmt::Display for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

/// Identifier distinguishing several bindings of the same contract
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum BindingId {
	/// The distinguished "no identifier" slot
	#[default]
	Unnamed,
	Name(Cow<'static, str>),
	Number(i64),
}

impl BindingId {
	pub fn is_unnamed(&self) -> bool {
		matches!(self, Self::Unnamed)
	}
}

impl From<&'static str> for BindingId {
	fn from(name: &'static str) -> Self {
		Self::Name(Cow::Borrowed(name))
	}
}

impl From<String> for BindingId {
	fn from(name: String) -> Self {
		Self::Name(Cow::Owned(name))
	}
}

impl From<i64> for BindingId {
	fn from(number: i64) -> Self {
		Self::Number(number)
	}
}

impl fmt::Display for BindingId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Unnamed => f.write_str("<unnamed>"),
			Self::Name(name) => write!(f, "\"{name}\""),
			Self::Number(number) => write!(f, "#{number}"),
		}
	}
}

/// Identifier filter used by lookups
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdFilter {
	/// Any identifier; the first binding in table order wins
	#[default]
	Any,
	/// Exactly this identifier, `Unnamed` included
	Exact(BindingId),
}

impl IdFilter {
	pub fn matches(&self, id: &BindingId) -> bool {
		match self {
			Self::Any => true,
			Self::Exact(expected) => expected == id,
		}
	}
}

impl From<BindingId> for IdFilter {
	fn from(id: BindingId) -> Self {
		Self::Exact(id)
	}
}

impl From<Option<BindingId>> for IdFilter {
	fn from(id: Option<BindingId>) -> Self {
		id.map_or(Self::Any, Self::Exact)
	}
}

/// Produces a boxed `Rc<C>` for one contract `C` from the erased value
pub(crate) type ViewFn = Rc<dyn Fn(&Rc<dyn Any>) -> Option<Box<dyn Any>>>;

/// Contracts a concrete value can be viewed as
#[derive(Clone, Default)]
pub struct ViewTable {
	views: HashMap<TypeId, ViewFn>,
	contracts: Vec<TypeKey>,
}

impl ViewTable {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	pub(crate) fn for_sized<T: 'static>() -> Self {
		let mut table = Self::new();
		table.insert(TypeKey::of::<T>(), sized_view::<T>());
		table
	}

	pub(crate) fn insert(&mut self, contract: TypeKey, view: ViewFn) {
		if self.views.insert(contract.id(), view).is_none() {
			self.contracts.push(contract);
		}
	}

	pub fn contains(&self, contract: TypeKey) -> bool {
		self.views.contains_key(&contract.id())
	}

	/// Declared contracts, in declaration order
	pub fn contracts(&self) -> &[TypeKey] {
		&self.contracts
	}

	fn get(&self, id: TypeId) -> Option<&ViewFn> {
		self.views.get(&id)
	}
}

impl fmt::Debug for ViewTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(&self.contracts).finish()
	}
}

pub(crate) fn sized_view<T: 'static>() -> ViewFn {
	Rc::new(|value: &Rc<dyn Any>| {
		value
			.clone()
			.downcast::<T>()
			.ok()
			.map(|rc| Box::new(rc) as Box<dyn Any>)
	})
}

pub(crate) fn upcast_view<T, I, F>(upcast: F) -> ViewFn
where
	T: 'static,
	I: ?Sized + 'static,
	F: Fn(Rc<T>) -> Rc<I> + 'static,
{
	Rc::new(move |value: &Rc<dyn Any>| {
		value
			.clone()
			.downcast::<T>()
			.ok()
			.map(|rc| Box::new(upcast(rc)) as Box<dyn Any>)
	})
}

/// A produced object together with the contracts it can be viewed as.
///
/// Clones share the same allocation, so views taken from any clone point at
/// the same object.
#[derive(Clone)]
pub struct Instance {
	value: Rc<dyn Any>,
	concrete: TypeKey,
	views: Rc<ViewTable>,
}

impl Instance {
	/// Wrap a plain value, viewable only as its own type
	pub fn new<T: 'static>(value: T) -> Self {
		Self::from_shared(Rc::new(value))
	}

	/// Wrap an existing allocation, viewable only as its own type
	pub fn from_shared<T: 'static>(value: Rc<T>) -> Self {
		Self {
			value,
			concrete: TypeKey::of::<T>(),
			views: Rc::new(ViewTable::for_sized::<T>()),
		}
	}

	/// Wrap an `Rc` of any type, trait objects included
	pub fn from_rc<T: ?Sized + 'static>(value: Rc<T>) -> Self {
		let mut views = ViewTable::new();
		views.insert(
			TypeKey::of::<T>(),
			Rc::new(|erased: &Rc<dyn Any>| {
				erased
					.downcast_ref::<Rc<T>>()
					.map(|rc| Box::new(Rc::clone(rc)) as Box<dyn Any>)
			}),
		);
		Self {
			value: Rc::new(value),
			concrete: TypeKey::of::<T>(),
			views: Rc::new(views),
		}
	}

	/// Wrap a value with every contract its shape declares
	pub fn injectable<T: Injectable>(value: T) -> Self {
		Self::injectable_shared(Rc::new(value))
	}

	pub fn injectable_shared<T: Injectable>(value: Rc<T>) -> Self {
		let structure = StructureMap::analyse::<T>();
		Self {
			value,
			concrete: TypeKey::of::<T>(),
			views: Rc::clone(structure.views()),
		}
	}

	pub(crate) fn from_parts(value: Rc<dyn Any>, concrete: TypeKey, views: Rc<ViewTable>) -> Self {
		Self {
			value,
			concrete,
			views,
		}
	}

	pub fn concrete_type(&self) -> TypeKey {
		self.concrete
	}

	pub fn contracts(&self) -> &[TypeKey] {
		self.views.contracts()
	}

	pub fn is_assignable_to(&self, contract: TypeKey) -> bool {
		self.views.contains(contract)
	}

	/// View the value as contract `T`
	pub fn cast<T: ?Sized + 'static>(&self) -> Option<Rc<T>> {
		let view = self.views.get(TypeId::of::<T>())?;
		let boxed = view(&self.value)?;
		boxed.downcast::<Rc<T>>().ok().map(|rc| *rc)
	}

	pub fn try_cast<T: ?Sized + 'static>(&self) -> DiResult<Rc<T>> {
		self.cast::<T>().ok_or_else(|| {
			DiError::mismatch(std::any::type_name::<T>(), self.concrete.name())
		})
	}

	/// Whether both instances share one allocation
	pub fn ptr_eq(&self, other: &Instance) -> bool {
		Rc::ptr_eq(&self.value, &other.value)
	}
}

impl fmt::Debug for Instance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Instance")
			.field("concrete", &self.concrete)
			.field("contracts", &self.views)
			.finish()
	}
}
