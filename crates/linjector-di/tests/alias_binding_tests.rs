//! Tests for alias bindings

use linjector_di::{Container, DiError, Injectable, TypeShape};
use rstest::*;
use std::rc::Rc;

trait AliasSource {
	fn tag(&self) -> &'static str;
}

#[derive(Default)]
struct AliasTarget;

impl AliasSource for AliasTarget {
	fn tag(&self) -> &'static str {
		"target"
	}
}

trait Labelled {
	fn label(&self) -> String;
}

impl Labelled for AliasTarget {
	fn label(&self) -> String {
		format!("concrete {}", self.tag())
	}
}

impl Injectable for AliasTarget {
	fn describe(shape: &mut TypeShape<Self>) {
		shape
			.blank(Self::default)
			.implements::<dyn AliasSource>(|rc| rc as Rc<dyn AliasSource>)
			.implements::<dyn Labelled>(|rc| rc as Rc<dyn Labelled>);
	}
}

fn same<A: ?Sized, B: ?Sized>(a: &Rc<A>, b: &Rc<B>) -> bool {
	std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Test an alias of a singleton serves the same object
#[rstest]
fn test_singleton_alias_shares_object() {
	// Arrange
	let container = Container::create(|_, builder| {
		builder.bind::<AliasTarget>().to_self().as_singleton();
		builder.bind::<dyn AliasSource>().alias_of::<AliasTarget>();
	})
	.unwrap();

	// Act
	let target = container.resolve::<AliasTarget>().unwrap().unwrap();
	let source = container.resolve::<dyn AliasSource>().unwrap().unwrap();

	// Assert
	assert!(same(&target, &source));
	assert_eq!(source.tag(), "target");
}

/// Test an alias of a transient produces distinct objects
#[rstest]
fn test_transient_alias_produces_distinct_objects() {
	// Arrange
	let container = Container::create(|_, builder| {
		builder.bind::<AliasTarget>().to_self();
		builder.bind::<dyn AliasSource>().alias_of::<AliasTarget>();
	})
	.unwrap();

	// Act
	let target = container.resolve::<AliasTarget>().unwrap().unwrap();
	let source = container.resolve::<dyn AliasSource>().unwrap().unwrap();

	// Assert
	assert!(!same(&target, &source));
}

/// Test an alias of a scoped binding follows the scope of its target
#[rstest]
fn test_scoped_alias_follows_target_scope() {
	// Arrange
	let parent = Container::create(|_, builder| {
		builder.bind::<AliasTarget>().to_self().as_scoped();
		builder.bind::<dyn AliasSource>().alias_of::<AliasTarget>();
	})
	.unwrap();
	let child = parent.create_child(|_, _| {}).unwrap();

	// Act
	let parent_target = parent.resolve::<AliasTarget>().unwrap().unwrap();
	let parent_source = parent.resolve::<dyn AliasSource>().unwrap().unwrap();
	let child_target = child.resolve::<AliasTarget>().unwrap().unwrap();
	let child_source = child.resolve::<dyn AliasSource>().unwrap().unwrap();

	// Assert
	assert!(same(&parent_target, &parent_source));
	assert!(same(&child_target, &child_source));
	assert!(!same(&parent_target, &child_source));
}

/// Test aliases are resolved through chains declared in any order
#[rstest]
fn test_alias_chain_declared_backwards() {
	// Arrange
	let container = Container::create(|_, builder| {
		builder.bind::<dyn AliasSource>().alias_of::<dyn Labelled>();
		builder
			.bind::<dyn Labelled>()
			.alias_of_id::<AliasTarget>("concrete");
		builder
			.bind::<AliasTarget>()
			.with_id("concrete")
			.to_self()
			.as_singleton();
	})
	.unwrap();

	// Act
	let named = container.resolve_id::<AliasTarget>("concrete").unwrap().unwrap();
	let labelled = container.resolve::<dyn Labelled>().unwrap().unwrap();
	let source = container.resolve::<dyn AliasSource>().unwrap().unwrap();

	// Assert
	assert!(same(&named, &labelled));
	assert!(same(&named, &source));
	assert_eq!(labelled.label(), "concrete target");
}

/// Test aliases only see bindings declared by their own scope
#[rstest]
fn test_alias_of_inherited_binding_fails() {
	// Arrange
	let parent = Container::create(|_, builder| {
		builder.bind::<AliasTarget>().to_self().as_singleton();
	})
	.unwrap();

	// Act
	let result = parent.create_child(|_, builder| {
		builder.bind::<dyn AliasSource>().alias_of::<AliasTarget>();
	});

	// Assert
	assert!(matches!(result, Err(DiError::UnresolvableAlias { .. })));
	assert!(parent.children().is_empty());
}

/// Test aliases pointing at each other fail scope creation
#[rstest]
fn test_alias_cycle_fails() {
	// Act
	let result = Container::create(|_, builder| {
		builder.bind::<dyn AliasSource>().alias_of::<dyn Labelled>();
		builder.bind::<dyn Labelled>().alias_of::<dyn AliasSource>();
	});

	// Assert
	match result {
		Err(DiError::UnresolvableAlias { pending }) => assert_eq!(pending.len(), 2),
		other => panic!("expected unresolvable alias, got {other:?}"),
	}
}

/// Test an alias without a target fails scope creation
#[rstest]
fn test_alias_without_target_fails() {
	// Act
	let result = Container::create(|_, builder| {
		builder.bind::<dyn AliasSource>().alias_of::<AliasTarget>();
	});

	// Assert
	match result {
		Err(DiError::UnresolvableAlias { pending }) => assert_eq!(pending.len(), 1),
		other => panic!("expected unresolvable alias, got {other:?}"),
	}
}

/// Test an alias pointing at itself is rejected
#[rstest]
fn test_self_alias_rejected() {
	// Act
	let result = Container::create(|_, builder| {
		builder.bind::<AliasTarget>().alias_of::<AliasTarget>();
	});

	// Assert
	assert!(matches!(result, Err(DiError::SelfAlias { .. })));
}
