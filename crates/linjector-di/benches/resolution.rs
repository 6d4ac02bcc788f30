//! Benchmark: resolution cost per lifetime and scope creation

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use linjector_di::{Container, Injectable, Param, TypeShape};
use std::rc::Rc;

// Benchmark fixture: service with one constructor dependency and one injected field
#[derive(Default)]
#[allow(dead_code)]
struct BenchService {
	name: String,
	port: u16,
}

impl Injectable for BenchService {
	fn describe(shape: &mut TypeShape<Self>) {
		shape.blank(Self::default);
		shape.field::<u16>("port", |s, v| s.port = *v).inject();
		shape.constructor(vec![Param::of::<String>()], |s, args| {
			s.name = args.get::<String>(0)?.to_string();
			Ok(())
		});
	}
}

fn container(build: impl FnOnce(&mut linjector_di::ScopeBuilder)) -> Container {
	Container::create(|_, builder| {
		builder.bind::<String>().to_value("bench".to_string());
		builder.bind::<u16>().to_value(8080);
		build(builder);
	})
	.unwrap()
}

fn benchmark_singleton_resolve(c: &mut Criterion) {
	let container = container(|builder| {
		builder.bind::<BenchService>().to_self().as_singleton();
	});
	// Warm the cache so only the lookup is measured
	let _ = container.resolve::<BenchService>().unwrap();

	c.bench_function("singleton_resolve", |b| {
		b.iter(|| black_box(container.resolve::<BenchService>().unwrap()));
	});
}

fn benchmark_transient_activation(c: &mut Criterion) {
	let container = container(|builder| {
		builder.bind::<BenchService>().to_self();
	});

	c.bench_function("transient_activation", |b| {
		b.iter(|| black_box(container.resolve::<BenchService>().unwrap()));
	});
}

fn benchmark_factory_resolve(c: &mut Criterion) {
	let container = container(|builder| {
		builder
			.bind::<BenchService>()
			.with_id("factory")
			.to_factory(|_| {
				Ok(Rc::new(BenchService {
					name: "factory".to_string(),
					port: 1,
				}))
			});
	});

	c.bench_function("factory_resolve", |b| {
		b.iter(|| black_box(container.resolve_id::<BenchService>("factory").unwrap()));
	});
}

fn benchmark_child_scope_creation(c: &mut Criterion) {
	let parent = container(|builder| {
		builder.bind::<BenchService>().to_self().as_scoped();
		builder.bind::<u32>().to_value(1).non_lazy();
	});

	c.bench_function("child_scope_creation", |b| {
		b.iter(|| {
			let child = parent.create_child(|_, _| {}).unwrap();
			let resolved = child.resolve::<BenchService>().unwrap();
			child.dispose().unwrap();
			black_box(resolved)
		});
	});
}

criterion_group!(
	benches,
	benchmark_singleton_resolve,
	benchmark_transient_activation,
	benchmark_factory_resolve,
	benchmark_child_scope_creation
);
criterion_main!(benches);
