//! Tests for object creation and member injection

use linjector_di::{Container, DiError, Injectable, Instance, Param, TypeShape};
use rstest::*;
use std::cell::Cell;
use std::rc::Rc;

#[fixture]
fn container() -> Container {
	let next_id = Rc::new(Cell::new(0_i64));
	Container::create(move |_, builder| {
		builder
			.bind::<i64>()
			.with_id("id")
			.to_method(move |_| {
				next_id.set(next_id.get() + 1);
				Ok(Rc::new(next_id.get()))
			});
		builder.bind::<String>().to_value("def".to_string());
	})
	.unwrap()
}

#[derive(Default)]
struct Addressed {
	id: i64,
	name: String,
	address: String,
}

impl Injectable for Addressed {
	fn describe(shape: &mut TypeShape<Self>) {
		shape.blank(Self::default);
		shape
			.field::<i64>("id", |a, v| a.id = *v)
			.inject()
			.id("id");
		shape.constructor(vec![Param::of::<String>(), Param::of::<String>()], |a, args| {
			a.name = args.get::<String>(0)?.to_string();
			a.address = args.get::<String>(1)?.to_string();
			Ok(())
		});
	}
}

/// Test supplied arguments fill leading parameters and the scope fills the rest
#[rstest]
fn test_new_object_mixes_supplied_and_resolved(container: Container) {
	// Act
	let object = container
		.new_object::<Addressed>(vec![Instance::new("abc".to_string())])
		.unwrap();

	// Assert
	assert_eq!(object.name, "abc");
	assert_eq!(object.address, "def");
	assert_eq!(object.id, 1);
}

/// Test a misplaced argument is shifted right rather than dropped
#[rstest]
fn test_new_object_shifts_misplaced_argument(container: Container) {
	// Arrange
	#[derive(Default)]
	struct Tagged {
		tag: i64,
		label: String,
	}
	impl Injectable for Tagged {
		fn describe(shape: &mut TypeShape<Self>) {
			shape.blank(Self::default);
			shape.constructor(
				vec![Param::of::<i64>().id("id"), Param::of::<String>()],
				|t, args| {
					t.tag = *args.get::<i64>(0)?;
					t.label = args.get::<String>(1)?.to_string();
					Ok(())
				},
			);
		}
	}

	// Act
	let object = container
		.new_object::<Tagged>(vec![Instance::new("given".to_string())])
		.unwrap();

	// Assert
	assert_eq!(object.tag, 1);
	assert_eq!(object.label, "given");
}

#[derive(Default)]
struct Fields {
	id: i64,
	data: String,
	untouched: i64,
}

impl Injectable for Fields {
	fn describe(shape: &mut TypeShape<Self>) {
		shape.blank(Self::default);
		shape
			.field::<i64>("id", |f, v| f.id = *v)
			.inject()
			.id("id");
		shape
			.field::<String>("data", |f, v| f.data = v.to_string())
			.inject();
		shape.field::<i64>("untouched", |f, v| f.untouched = *v);
	}
}

/// Test marked fields of an existing object are injected
#[rstest]
fn test_inject_fields(container: Container) {
	// Arrange
	let mut object = Fields::default();

	// Act
	container.inject(&mut object).unwrap();

	// Assert
	assert_eq!(object.data, "def");
	assert_ne!(object.id, object.untouched);
	assert_eq!(object.untouched, 0);
}

/// Test explicit values take precedence over bound resolvers
#[rstest]
fn test_inject_explicit_prefers_extras(container: Container) {
	// Arrange
	let mut object = Fields::default();

	// Act
	container
		.inject_explicit(&mut object, &[Instance::new("explicit".to_string())])
		.unwrap();

	// Assert
	assert_eq!(object.data, "explicit");
	assert_eq!(object.id, 1);
}

#[derive(Default)]
struct MethodInjected {
	id: i64,
	data: String,
}

impl Injectable for MethodInjected {
	fn describe(shape: &mut TypeShape<Self>) {
		shape.blank(Self::default);
		shape
			.method(
				"injector",
				vec![Param::of::<String>(), Param::of::<i64>().id("id")],
				|m, args| {
					m.data = args.get::<String>(0)?.to_string();
					m.id = *args.get::<i64>(1)?;
					Ok(())
				},
			)
			.inject();
	}
}

/// Test the injection method runs with resolved arguments
#[rstest]
fn test_inject_with_method(container: Container) {
	// Arrange
	let mut object = MethodInjected::default();

	// Act
	container.inject(&mut object).unwrap();

	// Assert
	assert_eq!(object.data, "def");
	assert_ne!(object.id, 0);
}

#[derive(Default)]
struct ConstructedAndInjected {
	id: i64,
	data: String,
}

impl Injectable for ConstructedAndInjected {
	fn describe(shape: &mut TypeShape<Self>) {
		shape.blank(Self::default);
		shape.constructor(vec![Param::of::<i64>().id("id")], |c, args| {
			c.id = *args.get::<i64>(0)?;
			Ok(())
		});
		shape
			.method("injector", vec![Param::of::<String>()], |c, args| {
				c.data = args.get::<String>(0)?.to_string();
				Ok(())
			})
			.inject();
	}
}

/// Test construction followed by the injection method
#[rstest]
fn test_new_object_with_constructor_and_method(container: Container) {
	// Act
	let object = container.new_object::<ConstructedAndInjected>(Vec::new()).unwrap();

	// Assert
	assert_eq!(object.data, "def");
	assert_ne!(object.id, 0);
}

#[derive(Default)]
struct Chooser {
	chosen: &'static str,
}

impl Injectable for Chooser {
	fn describe(shape: &mut TypeShape<Self>) {
		shape.blank(Self::default);
		shape
			.method("needs_unbound", vec![Param::of::<u8>(), Param::of::<u16>()], |c, _| {
				c.chosen = "needs_unbound";
				Ok(())
			})
			.inject();
		shape
			.method("needs_bound", vec![Param::of::<String>()], |c, _| {
				c.chosen = "needs_bound";
				Ok(())
			})
			.inject();
		shape
			.method("unmarked", vec![Param::of::<String>(), Param::of::<String>()], |c, _| {
				c.chosen = "unmarked";
				Ok(())
			});
	}
}

/// Test the best scoring marked method is the one invoked
#[rstest]
fn test_injection_method_scored_against_registered_types(container: Container) {
	// Arrange
	let mut object = Chooser::default();

	// Act
	container.inject(&mut object).unwrap();

	// Assert
	assert_eq!(object.chosen, "needs_bound");
}

#[derive(Default)]
struct OptionalMembers {
	port: Option<u16>,
	host: String,
}

impl Injectable for OptionalMembers {
	fn describe(shape: &mut TypeShape<Self>) {
		shape.blank(Self::default);
		shape
			.property::<u16>("port", |o, v| o.port = Some(*v))
			.inject()
			.optional();
		shape
			.property::<String>("host", |o, v| o.host = v.to_string())
			.inject();
	}
}

/// Test optional members stay untouched when nothing is bound
#[rstest]
fn test_optional_member_skipped(container: Container) {
	// Act
	let object = container.new_object::<OptionalMembers>(Vec::new()).unwrap();

	// Assert
	assert_eq!(object.port, None);
	assert_eq!(object.host, "def");
}

/// Test a required member without a binding fails activation
#[rstest]
fn test_required_member_unsatisfied() {
	// Arrange
	let container = Container::create(|_, builder| {
		builder.bind::<u16>().to_value(8080);
	})
	.unwrap();

	// Act
	let result = container.new_object::<OptionalMembers>(Vec::new());

	// Assert
	match result {
		Err(DiError::DependencyUnsatisfied { member, .. }) => assert_eq!(member, "host"),
		Err(other) => panic!("expected unsatisfied dependency, got {other}"),
		Ok(_) => panic!("expected unsatisfied dependency"),
	}
}

#[derive(Default)]
struct Defaulted {
	retries: u32,
}

impl Injectable for Defaulted {
	fn describe(shape: &mut TypeShape<Self>) {
		shape.blank(Self::default);
		shape.constructor(vec![Param::of::<u32>().optional()], |d, args| {
			d.retries = args.get_opt::<u32>(0)?.map_or(3, |v| *v);
			Ok(())
		});
	}
}

/// Test an optional parameter without a binding arrives absent
#[rstest]
#[case(None, 3)]
#[case(Some(7), 7)]
fn test_optional_parameter(#[case] bound: Option<u32>, #[case] expected: u32) {
	// Arrange
	let container = Container::create(move |_, builder| {
		if let Some(value) = bound {
			builder.bind::<u32>().to_value(value);
		}
	})
	.unwrap();

	// Act
	let object = container.new_object::<Defaulted>(Vec::new()).unwrap();

	// Assert
	assert_eq!(object.retries, expected);
}

/// Test activation of an analysed structure through the untyped entry point
#[rstest]
fn test_new_instance_from_structure(container: Container) {
	// Arrange
	let structure = linjector_di::StructureMap::analyse::<Addressed>();

	// Act
	let instance = container
		.new_instance(&structure, vec![Instance::new("xyz".to_string())])
		.unwrap();

	// Assert
	let object = instance.cast::<Addressed>().unwrap();
	assert_eq!(object.name, "xyz");
	assert_eq!(object.address, "def");
}
