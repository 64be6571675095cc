//! Dispatch benchmarks
//!
//! Measures the three call paths against the in-process runtime:
//! class methods (dynamic and typed), builtin methods and utilities.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hostlink::call::dispatch;
use hostlink::{utility, Callable, ClassWrapper, Node, StringName, Variant, Vector3};

fn setup() {
    hostlink::initialize(hostlink_runtime::hostlink_get_proc_address).unwrap();
}

fn bench_class_methods(c: &mut Criterion) {
    setup();
    let parent = Node::new();
    for _ in 0..8 {
        parent.add_child(&Node::new());
    }
    let count = StringName::new("get_child_count");
    let get_child = StringName::new("get_child");
    let index = Variant::from(3i64);

    let mut group = c.benchmark_group("class_method");
    group.bench_function("get_child_count/typed", |b| b.iter(|| black_box(parent.get_child_count())));
    group.bench_function("get_child_count/dynamic", |b| {
        b.iter(|| black_box(dispatch::call(parent.as_object(), &count, &[])))
    });
    group.bench_function("get_child/dynamic", |b| {
        b.iter(|| black_box(dispatch::call(parent.as_object(), &get_child, &[&index])))
    });
    group.bench_function("resolve/warm", |b| {
        b.iter(|| black_box(dispatch::resolve(parent.as_object(), &count)))
    });
    group.finish();
}

fn bench_builtin_methods(c: &mut Criterion) {
    setup();
    let a = Vector3::new(1.0, 2.0, 3.0);
    let b = Vector3::new(-4.0, 0.5, 2.0);

    let mut group = c.benchmark_group("builtin_method");
    group.bench_function("dot", |bench| bench.iter(|| black_box(a.dot(black_box(b)))));
    group.bench_function("lerp", |bench| bench.iter(|| black_box(a.lerp(black_box(b), 0.25))));
    group.bench_function("cubic_interpolate", |bench| {
        bench.iter(|| black_box(a.cubic_interpolate(b, Vector3::ZERO, Vector3::ONE, 0.5)))
    });
    group.finish();
}

fn bench_vararg(c: &mut Criterion) {
    setup();
    let mut group = c.benchmark_group("vararg");

    // Inline lengths against the heap fallback
    for len in [2usize, 5, 9, 16] {
        let args: Vec<Variant> = (0..len as i64).map(Variant::from).collect();
        group.bench_with_input(BenchmarkId::new("max", len), &args, |b, args| {
            b.iter(|| black_box(utility::max(&args[0], &args[1], &args[2..])))
        });
    }

    let closure = Callable::from_fn("add", |args| {
        let a = args.first()?.to_native::<i64>()?;
        let b = args.get(1)?.to_native::<i64>()?;
        Some(Variant::from(a + b))
    });
    let pair = [Variant::from(20i64), Variant::from(22i64)];
    group.bench_function("callable/host", |b| b.iter(|| black_box(closure.call(&pair))));
    group.finish();
}

criterion_group!(benches, bench_class_methods, bench_builtin_methods, bench_vararg);
criterion_main!(benches);
