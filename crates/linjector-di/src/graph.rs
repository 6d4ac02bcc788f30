//! Resolver tables and their construction
//!
//! Building a scope's table runs four steps:
//!
//! 1. collect: validate declarations, group type bindings by contract and
//!    identifier, then resolve aliases in passes until none are pending
//! 2. materialize: one resolver per resolver specification
//! 3. inherit: copy every parent entry, duplicating resolvers whose
//!    lifetime asks for it (once per resolver, so aliases keep sharing)
//! 4. rank: stable sort so that, per contract, unnamed own bindings come
//!    first and named inherited ones last

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::binding::{AliasBinding, CrossScope, SpecId};
use crate::builder::ScopeBuilder;
use crate::error::{DiError, DiResult};
use crate::instance::{BindingId, IdFilter, TypeKey};
use crate::resolver::{LifetimeResolver, ResolverRef};

/// Where a table entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
	/// Declared by the scope itself
	Own,
	/// Copied from the parent scope
	Inherited,
}

/// One table entry
#[derive(Debug, Clone)]
pub struct Binding {
	resolver: ResolverRef,
	origin: Origin,
}

impl Binding {
	pub fn resolver(&self) -> &ResolverRef {
		&self.resolver
	}

	pub fn origin(&self) -> Origin {
		self.origin
	}

	pub fn is_inherited(&self) -> bool {
		self.origin == Origin::Inherited
	}
}

/// Contract -> identifier -> ordered resolvers
#[derive(Debug, Default)]
pub struct ResolverTable {
	entries: IndexMap<TypeKey, IndexMap<BindingId, Vec<Binding>>>,
}

impl ResolverTable {
	/// First binding of `contract` accepted by `filter`
	pub fn first(&self, contract: TypeKey, filter: &IdFilter) -> Option<&Binding> {
		self.matching(contract, filter).next()
	}

	/// Every binding of `contract` accepted by `filter`, in table order
	pub fn matching<'a, 'f>(
		&'a self,
		contract: TypeKey,
		filter: &'f IdFilter,
	) -> impl Iterator<Item = &'a Binding> + use<'a, 'f> {
		self.entries
			.get(&contract)
			.into_iter()
			.flat_map(move |slots| {
				slots
					.iter()
					.filter(move |(id, _)| filter.matches(id))
					.flat_map(|(_, bindings)| bindings.iter())
			})
	}

	/// Every entry as (contract, identifier, binding), in table order
	pub fn iter(&self) -> impl Iterator<Item = (TypeKey, &BindingId, &Binding)> {
		self.entries.iter().flat_map(|(contract, slots)| {
			slots.iter().flat_map(move |(id, bindings)| {
				bindings.iter().map(move |binding| (*contract, id, binding))
			})
		})
	}

	pub fn contracts(&self) -> impl Iterator<Item = TypeKey> + '_ {
		self.entries.keys().copied()
	}

	pub fn contains(&self, contract: TypeKey) -> bool {
		self.entries.contains_key(&contract)
	}

	/// Number of entries
	pub fn len(&self) -> usize {
		self.entries
			.values()
			.flat_map(IndexMap::values)
			.map(Vec::len)
			.sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

struct Ranked {
	contract: TypeKey,
	id: BindingId,
	binding: Binding,
}

impl Ranked {
	fn rank(&self) -> i8 {
		let unnamed = i8::from(self.id.is_unnamed());
		let inherited = i8::from(self.binding.is_inherited());
		inherited - unnamed
	}
}

/// Build the table of a scope declared by `builder` under `parent`
pub(crate) fn build_table(builder: &ScopeBuilder, parent: &ResolverTable) -> DiResult<ResolverTable> {
	builder.check_state()?;
	let keys = collect_bindings(builder)?;
	let mut ranked = materialize(builder, keys)?;
	let own = ranked.len();
	inherit(parent, &mut ranked);
	ranked.sort_by_key(Ranked::rank);

	let mut table = ResolverTable::default();
	for entry in ranked {
		table
			.entries
			.entry(entry.contract)
			.or_default()
			.entry(entry.id)
			.or_default()
			.push(entry.binding);
	}
	tracing::debug!(
		own,
		inherited = parent.len(),
		contracts = table.entries.len(),
		"resolver table built"
	);
	Ok(table)
}

type Grouped = IndexMap<TypeKey, IndexMap<BindingId, Vec<SpecId>>>;

fn collect_bindings(builder: &ScopeBuilder) -> DiResult<Vec<(TypeKey, BindingId, SpecId)>> {
	for spec in builder.specs() {
		spec.source()?;
	}
	for alias in builder.alias_bindings() {
		alias.validate()?;
	}

	let mut grouped: Grouped = IndexMap::new();
	for binding in builder.type_bindings() {
		if builder.specs().get(binding.spec.0).is_none() {
			return Err(DiError::InvalidResolverSpec(format!(
				"binding of `{}` refers to an unknown resolver specification",
				binding.contract
			)));
		}
		grouped
			.entry(binding.contract)
			.or_default()
			.entry(binding.id.clone())
			.or_default()
			.push(binding.spec);
	}

	resolve_aliases(&mut grouped, builder.alias_bindings())?;

	Ok(grouped
		.into_iter()
		.flat_map(|(contract, slots)| {
			slots.into_iter().flat_map(move |(id, specs)| {
				specs.into_iter().map(move |spec| (contract, id.clone(), spec))
			})
		})
		.collect())
}

fn resolve_aliases(grouped: &mut Grouped, aliases: &[AliasBinding]) -> DiResult<()> {
	let mut pending: Vec<&AliasBinding> = aliases.iter().collect();
	while !pending.is_empty() {
		let before = pending.len();
		pending.retain(|alias| {
			let Some(specs) = grouped
				.get(&alias.to)
				.and_then(|slots| slots.get(&alias.to_id))
				.cloned()
			else {
				return true;
			};
			grouped
				.entry(alias.from)
				.or_default()
				.entry(alias.from_id.clone())
				.or_default()
				.extend(specs);
			false
		});
		if pending.len() == before {
			return Err(DiError::UnresolvableAlias {
				pending: pending.iter().map(ToString::to_string).collect(),
			});
		}
	}
	Ok(())
}

fn materialize(builder: &ScopeBuilder, keys: Vec<(TypeKey, BindingId, SpecId)>) -> DiResult<Vec<Ranked>> {
	let mut resolvers: HashMap<SpecId, ResolverRef> = HashMap::new();
	let mut ranked = Vec::with_capacity(keys.len());
	for (contract, id, spec) in keys {
		let resolver = match resolvers.get(&spec) {
			Some(resolver) => Rc::clone(resolver),
			None => {
				let declared = builder.specs().get(spec.0).ok_or_else(|| {
					DiError::InvalidResolverSpec(format!("unknown resolver specification {}", spec.0))
				})?;
				let resolver = Rc::new(LifetimeResolver::from_spec(declared)?);
				resolvers.insert(spec, Rc::clone(&resolver));
				resolver
			}
		};
		ranked.push(Ranked {
			contract,
			id,
			binding: Binding {
				resolver,
				origin: Origin::Own,
			},
		});
	}
	Ok(ranked)
}

fn inherit(parent: &ResolverTable, ranked: &mut Vec<Ranked>) {
	let mut copies: HashMap<usize, ResolverRef> = HashMap::new();
	for (contract, id, binding) in parent.iter() {
		let original = binding.resolver();
		let resolver = match original.cross_scope() {
			CrossScope::Move => Rc::clone(original),
			CrossScope::Copy => Rc::clone(
				copies
					.entry(Rc::as_ptr(original) as usize)
					.or_insert_with(|| original.duplicate().unwrap_or_else(|| Rc::clone(original))),
			),
		};
		ranked.push(Ranked {
			contract,
			id: id.clone(),
			binding: Binding {
				resolver,
				origin: Origin::Inherited,
			},
		});
	}
}
