use hostlink::call::dispatch;
use hostlink::call::pointers::{with_pointers, RawPointersN4, RawPointersN9, MAX_INLINE_ARGS};
use hostlink::{
    utility, Callable, ClassBuilder, ClassWrapper, InitError, Node, Object, StringName, ToVariant, UtilityFunction,
    Variant, VariantStorable, VariantType,
};
use proptest::prelude::*;
use std::ffi::c_void;

fn init() {
    hostlink::initialize(hostlink_runtime::hostlink_get_proc_address).unwrap();
}

fn int(value: Option<Variant>) -> i64 {
    value.and_then(|v| v.to_native::<i64>()).unwrap()
}

fn multiply() -> Callable {
    Callable::from_fn("multiply", |args| {
        let a = args.first()?.to_native::<i64>()?;
        let b = args.get(1)?.to_native::<i64>()?;
        Some(Variant::from(a * b))
    })
}

fn echo() -> Callable {
    Callable::from_fn("echo", |args| args.first().map(|arg| (*arg).clone()))
}

// ============================================================================
// Initialization
// ============================================================================

unsafe extern "C" fn forwarding_loader(name: *const std::ffi::c_char) -> Option<hostlink::ProcAddress> {
    hostlink_runtime::hostlink_get_proc_address(name)
}

#[test]
fn test_initialize_is_idempotent() {
    init();
    init();
    assert!(hostlink::is_initialized());

    let other = hostlink::initialize(forwarding_loader);
    assert!(matches!(other, Err(InitError::AlreadyInitialized)));
}

#[test]
fn test_missing_library() {
    init();
    let err = hostlink::initialize_from_library("/nonexistent/libhostlink_runtime.so", "hostlink_get_proc_address");
    assert!(err.is_err());
}

// ============================================================================
// Scalars and text
// ============================================================================

#[test]
fn test_scalar_roundtrip_through_closure() {
    init();
    let result = multiply().call(&[Variant::from(11i64), Variant::from(6i64)]);
    assert_eq!(int(result), 66);
}

#[test]
fn test_scalar_roundtrip_through_runtime() {
    init();
    let held = multiply().to_variant();
    let mut target = held.clone();
    let args = [Variant::from(11i64), Variant::from(6i64)];
    let result = dispatch::call_variant(&mut target, &StringName::new("call"), &[&args[0], &args[1]]);
    assert_eq!(int(result), 66);
}

#[test]
fn test_text_roundtrip() {
    init();
    let via_runtime = Callable::from_variant(&echo().to_variant()).unwrap();

    let foo = via_runtime.call(&[Variant::from("Foo")]).unwrap();
    assert_eq!(foo.get_type(), VariantType::String);
    assert_eq!(foo.to_native::<String>().as_deref(), Some("Foo"));

    let nil = via_runtime.call(&[Variant::nil()]).unwrap();
    assert!(nil.is_nil());
    assert_eq!(nil.stringify(), "<null>");
    assert_eq!(nil.to_native::<String>(), None);
}

#[test]
fn test_variant_kinds() {
    init();
    let ints: Vec<Variant> = [0i64, -1, i64::MAX, i64::MIN].iter().map(|&v| Variant::from(v)).collect();
    let strings: Vec<Variant> = ["", "a", "hello world", "ünïcödé"].iter().map(|&s| Variant::from(s)).collect();
    let doubles: Vec<Variant> = [0.0f64, -1.5, 1e300, f64::MIN_POSITIVE].iter().map(|&v| Variant::from(v)).collect();
    let bools = vec![Variant::from(true), Variant::from(false)];

    for v in &ints {
        assert_eq!(v.get_type(), VariantType::Int);
    }
    for v in &strings {
        assert_eq!(v.get_type(), VariantType::String);
    }
    for v in &doubles {
        assert_eq!(v.get_type(), VariantType::Float);
    }
    for v in &bools {
        assert_eq!(v.get_type(), VariantType::Bool);
    }

    assert_eq!(ints[2].to_native::<i64>(), Some(i64::MAX));
    assert_eq!(strings[3].to_native::<String>().as_deref(), Some("ünïcödé"));
    assert_eq!(doubles[2].to_native::<f64>(), Some(1e300));
    assert_eq!(bools[1].to_native::<bool>(), Some(false));

    // Kinds never convert implicitly
    assert_eq!(ints[1].to_native::<f64>(), None);
    assert_eq!(doubles[1].to_native::<i64>(), None);
    assert_eq!(bools[0].to_native::<i64>(), None);
    assert_eq!(strings[1].to_native::<bool>(), None);
}

// ============================================================================
// Dispatch
// ============================================================================

#[test]
fn test_typed_and_dynamic_dispatch_agree() {
    init();
    let typed_parent = Node::new();
    let dynamic_parent = Node::new();
    let children: Vec<(Node, Node)> = (0..3).map(|_| (Node::new(), Node::new())).collect();

    let add = StringName::new("add_child");
    let remove = StringName::new("remove_child");
    let count = StringName::new("get_child_count");

    for (typed_child, dynamic_child) in &children {
        typed_parent.add_child(typed_child);
        dynamic_parent.call(&add, &[Variant::from(dynamic_child.clone())]).unwrap();
        assert_eq!(
            typed_parent.get_child_count(),
            int(dynamic_parent.call(&count, &[]))
        );
    }

    let (typed_child, dynamic_child) = &children[1];
    typed_parent.remove_child(typed_child);
    dynamic_parent.call(&remove, &[Variant::from(dynamic_child.clone())]).unwrap();
    assert_eq!(typed_parent.get_child_count(), 2);
    assert_eq!(int(dynamic_parent.call(&count, &[])), 2);
    assert_eq!(typed_child.get_parent(), None);
    assert_eq!(dynamic_child.get_parent(), None);
}

#[test]
fn test_vararg_max_at_every_position() {
    init();
    for len in 2..=12usize {
        for peak in 0..len {
            let args: Vec<Variant> = (0..len)
                .map(|i| Variant::from(if i == peak { 1000 } else { i as i64 }))
                .collect();
            let result = utility::max(&args[0], &args[1], &args[2..]);
            assert_eq!(result.to_native::<i64>(), Some(1000), "len {} peak {}", len, peak);
        }
    }
}

#[test]
fn test_resolution_cold_and_warm() {
    init();
    let class = StringName::new("Node");
    let method = StringName::new("get_name");
    let cold = dispatch::resolve_in(&class, &method).unwrap();
    let warm = dispatch::resolve_in(&class, &method).unwrap();
    assert_eq!(cold, warm);

    let max = StringName::new("max");
    let cold = UtilityFunction::resolve(&max).unwrap();
    let warm = UtilityFunction::resolve(&max).unwrap();
    let (a, b) = (Variant::from(1i64), Variant::from(2i64));
    assert_eq!(cold.call(&[&a, &b]), warm.call(&[&a, &b]));
}

#[test]
fn test_concurrent_cache_fill() {
    init();
    let methods = ["get_child", "get_parent", "set_name", "is_class", "get_class"];
    let binds: Vec<Vec<_>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    let class = StringName::new("Node");
                    methods
                        .iter()
                        .map(|m| dispatch::resolve_in(&class, &StringName::new(m)).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for other in &binds[1..] {
        assert_eq!(other, &binds[0]);
    }
}

#[test]
fn test_concurrent_calls_on_shared_receiver() {
    init();
    let parent = Node::new();
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..25 {
                    parent.add_child(&Node::new());
                }
            });
        }
    });
    assert_eq!(parent.get_child_count(), 100);
}

// ============================================================================
// Pointer arrays
// ============================================================================

#[test]
fn test_pointer_arrays_every_length() {
    let word = std::mem::size_of::<*const c_void>();
    assert_eq!(std::mem::size_of::<RawPointersN4>(), 4 * word);
    assert_eq!(std::mem::size_of::<RawPointersN9>(), MAX_INLINE_ARGS * word);

    for len in 0..=MAX_INLINE_ARGS + 3 {
        let values: Vec<u64> = (0..len as u64).collect();
        let seen = with_pointers(values.iter().map(|v| v as *const u64 as *const c_void), |ptrs, argc| {
            assert_eq!(argc, len);
            if len == 0 {
                assert!(ptrs.is_null());
                return Vec::new();
            }
            let raw = unsafe { std::slice::from_raw_parts(ptrs, argc) };
            raw.iter().map(|&p| unsafe { *(p as *const u64) }).collect::<Vec<_>>()
        });
        assert_eq!(seen, values);
    }
}

// ============================================================================
// Host-defined classes
// ============================================================================

#[test]
fn test_host_class() {
    init();
    ClassBuilder::new("TestNode")
        .inherits("Node")
        .method("scale", 1, |_, args| {
            let x = args.first()?.to_native::<f64>()?;
            Some(Variant::from(x * 2.0))
        })
        .method("child_total", 0, |receiver, _| {
            let node = receiver.clone().cast::<Node>()?;
            Some(Variant::from(node.get_child_count()))
        })
        .register()
        .unwrap();

    let node = Object::new(&StringName::new("TestNode")).unwrap().cast::<Node>().unwrap();
    node.add_child(&Node::new());

    let scaled = node.call(&StringName::new("scale"), &[Variant::from(1.25f64)]);
    assert_eq!(scaled.and_then(|v| v.to_native::<f64>()), Some(2.5));
    assert_eq!(int(node.call(&StringName::new("child_total"), &[])), 1);

    // Inherited native methods keep working on the subclass
    assert_eq!(node.get_name().to_string(), "TestNode");
    assert!(node.as_object().is_class("Node"));
}

fn marshal_node() -> Node {
    static REGISTER: std::sync::Once = std::sync::Once::new();
    init();
    REGISTER.call_once(|| {
        ClassBuilder::new("MarshalNode")
            .inherits("Node")
            .method("foo", 3, |_, args| {
                let callable = args[0].to_native::<Callable>()?;
                callable.call_ref(&[args[1], args[2]])
            })
            .method("bar", 1, |_, args| Some((*args[0]).clone()))
            .register()
            .unwrap();
    });
    Object::new(&StringName::new("MarshalNode")).unwrap().cast::<Node>().unwrap()
}

#[test]
fn test_callable_argument_in_callable() {
    let node = marshal_node();
    let foo = StringName::new("foo");

    let args = [multiply().to_variant(), Variant::from(11i64), Variant::from(6i64)];
    assert_eq!(int(node.call(&foo, &args)), 66);

    // A bound method passed the same way
    let target = marshal_node();
    let add = Callable::from_object_method(target.as_object(), "add_child");
    let child = Node::new();
    let args = [add.to_variant(), Variant::from(child.clone()), Variant::from(false)];
    node.call(&foo, &args);
    assert!(child.get_parent() == Some(target.clone()));
    assert_eq!(target.get_child_count(), 1);
}

#[test]
fn test_method_returning_variant() {
    let node = marshal_node();
    let bar = StringName::new("bar");

    for value in [Variant::from(42i64), Variant::from("Foo"), Variant::nil()] {
        let result = node.call(&bar, &[value.clone()]);
        assert_eq!(result, Some(value));
    }

    let nil = node.call(&bar, &[Variant::nil()]).unwrap();
    assert_eq!(nil.get_type(), VariantType::Nil);
    assert_eq!(int(node.call(&bar, &[Variant::from(42i64)])), 42);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_int_roundtrip(value in any::<i64>()) {
        init();
        prop_assert_eq!(Variant::from(value).to_native::<i64>(), Some(value));
    }

    #[test]
    fn prop_float_roundtrip(value in prop::num::f64::NORMAL | prop::num::f64::ZERO | prop::num::f64::INFINITE) {
        init();
        prop_assert_eq!(Variant::from(value).to_native::<f64>(), Some(value));
    }

    #[test]
    fn prop_string_roundtrip(text in "\\PC{0,200}") {
        init();
        prop_assert_eq!(Variant::from(text.as_str()).to_native::<String>(), Some(text));
    }

    #[test]
    fn prop_bool_roundtrip(value in any::<bool>()) {
        init();
        prop_assert_eq!(Variant::from(value).to_native::<bool>(), Some(value));
    }

    #[test]
    fn prop_narrowing_matches_try_from(value in any::<i64>()) {
        init();
        let variant = Variant::from(value);
        prop_assert_eq!(variant.to_native::<i32>(), i32::try_from(value).ok());
        prop_assert_eq!(variant.to_native::<u8>(), u8::try_from(value).ok());
        prop_assert_eq!(variant.to_native::<u32>(), u32::try_from(value).ok());
    }
}
