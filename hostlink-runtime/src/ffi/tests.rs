//! Tests for the C ABI surface

use super::*;
use crate::callable::CallableCustomInfo;
use crate::error::{CallErrorKind, CallErrorRaw};
use crate::names::{Name, RawStringName};
use crate::variant::{self as values, RawVariant, Value};
use core::ffi::c_void;
use core::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

fn name(text: &str) -> RawStringName {
    Name::intern(text).to_raw()
}

fn nil() -> RawVariant {
    Value::Nil.encode()
}

#[test]
fn test_every_entry_point_resolves() {
    for entry in ENTRY_POINTS {
        let cname = std::ffi::CString::new(*entry).unwrap();
        assert!(unsafe { hostlink_get_proc_address(cname.as_ptr()) }.is_some(), "{}", entry);
    }
    let unknown = std::ffi::CString::new("no_such_entry").unwrap();
    assert!(unsafe { hostlink_get_proc_address(unknown.as_ptr()) }.is_none());
    assert!(unsafe { hostlink_get_proc_address(core::ptr::null()) }.is_none());
}

#[test]
fn test_string_roundtrip() {
    let mut v = MaybeUninit::<RawVariant>::uninit();
    let text = "Foo";
    unsafe {
        variant_new_string(v.as_mut_ptr(), text.as_ptr(), text.len() as i64);
        let mut v = v.assume_init();
        assert_eq!(variant_get_type(&v), 4);

        let mut buf = [0u8; 2];
        // Truncated copy still reports the full length
        assert_eq!(variant_get_string(&v, buf.as_mut_ptr(), 2), 3);
        let mut buf = [0u8; 8];
        assert_eq!(variant_get_string(&v, buf.as_mut_ptr(), 8), 3);
        assert_eq!(&buf[..3], b"Foo");

        variant_destroy(&mut v);
        assert_eq!(variant_get_type(&v), 0);
        assert_eq!(variant_get_string(&v, buf.as_mut_ptr(), 8), -1);
    }
}

#[test]
fn test_native_constructors() {
    unsafe {
        let from_int = get_variant_from_type_constructor(2).unwrap();
        let to_int = get_variant_to_type_constructor(2).unwrap();
        let src: i64 = 66;
        let mut v = MaybeUninit::<RawVariant>::uninit();
        from_int(v.as_mut_ptr(), &src as *const i64 as *const c_void);
        let v = v.assume_init();
        let mut out: i64 = 0;
        to_int(&mut out as *mut i64 as *mut c_void, &v);
        assert_eq!(out, 66);

        assert!(get_variant_from_type_constructor(4).is_none());
        assert!(get_variant_to_type_constructor(99).is_none());
    }
}

#[test]
fn test_equal_and_hash() {
    let a = Value::Int(5).encode();
    let b = Value::Int(5).encode();
    let c = Value::Float(5.0).encode();
    let n = nil();
    unsafe {
        assert_eq!(variant_equal(&a, &b), 1);
        assert_eq!(variant_equal(&a, &c), 0);
        assert_eq!(variant_equal(&n, &n), 1);
        assert_eq!(variant_hash(&a), variant_hash(&b));
    }
}

#[test]
fn test_string_names() {
    let mut raw = MaybeUninit::<RawStringName>::uninit();
    let text = "get_child_count";
    unsafe {
        string_name_new(raw.as_mut_ptr(), text.as_ptr(), text.len() as i64);
        let raw = raw.assume_init();
        assert!(core::ptr::eq(raw.entry, name(text).entry));

        let mut copy = MaybeUninit::<RawStringName>::uninit();
        string_name_new_copy(copy.as_mut_ptr(), &raw);
        let mut copy = copy.assume_init();
        assert!(core::ptr::eq(copy.entry, raw.entry));

        let mut buf = [0u8; 32];
        assert_eq!(string_name_to_utf8(&copy, buf.as_mut_ptr(), 32), text.len() as i64);
        assert_eq!(&buf[..text.len()], text.as_bytes());
        string_name_destroy(&mut copy);
    }
}

#[test]
fn test_object_method_bind_call() {
    unsafe {
        let parent = classdb_construct_object(&name("Node"));
        let child = classdb_construct_object(&name("Node"));
        assert!(!parent.is_null());
        assert!(classdb_construct_object(&name("NoSuchClass")).is_null());

        let add = classdb_get_method_bind(&name("Node"), &name("add_child"));
        let count = classdb_get_method_bind(&name("Node"), &name("get_child_count"));
        assert!(!add.is_null() && !count.is_null());
        assert!(classdb_get_method_bind(&name("Node"), &name("fly")).is_null());

        let child_value = Value::Object(object_arc(child)).encode();
        let args = [&child_value as *const RawVariant];
        let mut ret = nil();
        let mut err = CallErrorRaw::OK;
        object_method_bind_call(add, parent, args.as_ptr(), 1, &mut ret, &mut err);
        assert!(err.is_ok());

        object_method_bind_call(count, parent, core::ptr::null(), 0, &mut ret, &mut err);
        assert!(err.is_ok());
        assert!(values::read(&ret).equals(&Value::Int(1)));

        // Null instance
        object_method_bind_call(count, core::ptr::null_mut(), core::ptr::null(), 0, &mut ret, &mut err);
        assert_eq!(err.error, CallErrorKind::InstanceIsNull as u32);
        assert!(values::read(&ret).equals(&Value::Nil));

        let mut child_value = child_value;
        variant_destroy(&mut child_value);
        object_release(child);
        object_release(parent);
    }
}

unsafe fn object_arc(ptr: *mut c_void) -> std::sync::Arc<crate::objects::ObjectData> {
    crate::objects::ObjectData::from_ptr(ptr).unwrap()
}

#[test]
fn test_ptrcall_returns_object_reference() {
    unsafe {
        let parent = classdb_construct_object(&name("Node"));
        let child = classdb_construct_object(&name("Node"));
        let add = classdb_get_method_bind(&name("Node"), &name("add_child"));
        let get_parent = classdb_get_method_bind(&name("Node"), &name("get_parent"));

        let force: u8 = 0;
        let internal: i64 = 0;
        let args = [
            &child as *const *mut c_void as *const c_void,
            &force as *const u8 as *const c_void,
            &internal as *const i64 as *const c_void,
        ];
        object_method_bind_ptrcall(add, parent, args.as_ptr(), core::ptr::null_mut());

        let mut out: *mut c_void = core::ptr::null_mut();
        object_method_bind_ptrcall(get_parent, child, core::ptr::null(), &mut out as *mut _ as *mut c_void);
        assert_eq!(out, parent);
        assert_eq!(object_get_instance_id(out), object_get_instance_id(parent));

        let mut class = MaybeUninit::<RawStringName>::uninit();
        object_get_class_name(out, class.as_mut_ptr());
        assert_eq!(Name::from_raw(class.as_ptr()).unwrap().as_str(), "Node");

        object_release(out);
        object_release(child);
        object_release(parent);
    }
}

#[test]
fn test_variant_call_on_builtins() {
    unsafe {
        let mut v = Value::Vector3([3.0, 4.0, 0.0]).encode();
        let mut ret = nil();
        let mut err = CallErrorRaw::OK;
        variant_call(&mut v, &name("length"), core::ptr::null(), 0, &mut ret, &mut err);
        assert!(err.is_ok());
        assert!(values::read(&ret).equals(&Value::Float(5.0)));

        variant_call(&mut v, &name("explode"), core::ptr::null(), 0, &mut ret, &mut err);
        assert_eq!(err.error, CallErrorKind::InvalidMethod as u32);
        assert!(values::read(&ret).equals(&Value::Nil));
    }
}

static FREED: AtomicUsize = AtomicUsize::new(0);

unsafe extern "C" fn multiply(
    _userdata: *mut c_void,
    args: *const *const RawVariant,
    argc: i64,
    ret: *mut RawVariant,
    err: *mut CallErrorRaw,
) {
    let argv = values::read_args(args, argc as usize);
    match argv.as_slice() {
        [Value::Int(a), Value::Int(b)] => values::assign(ret, Value::Int(a * b)),
        _ => CallErrorRaw::too_few(2).store(err),
    }
}

unsafe extern "C" fn count_free(_userdata: *mut c_void) {
    FREED.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn test_custom_callable_and_extension_method() {
    let info = CallableCustomInfo {
        userdata: core::ptr::null_mut(),
        call_func: Some(multiply),
        free_func: Some(count_free),
    };
    unsafe {
        let mut callable = MaybeUninit::<RawVariant>::uninit();
        callable_custom_create(callable.as_mut_ptr(), &info);
        let mut callable = callable.assume_init();
        assert_eq!(variant_get_type(&callable), 8);

        let a = Value::Int(11).encode();
        let b = Value::Int(6).encode();
        let args = [&a as *const RawVariant, &b as *const RawVariant];
        let mut ret = nil();
        let mut err = CallErrorRaw::OK;
        variant_call(&mut callable, &name("call"), args.as_ptr(), 2, &mut ret, &mut err);
        assert!(err.is_ok());
        assert!(values::read(&ret).equals(&Value::Int(66)));

        let before = FREED.load(Ordering::SeqCst);
        variant_destroy(&mut callable);
        assert_eq!(FREED.load(Ordering::SeqCst), before + 1);
    }
}

#[test]
fn test_register_class_and_method() {
    let info = CallableCustomInfo {
        userdata: core::ptr::null_mut(),
        call_func: Some(multiply),
        free_func: None,
    };
    unsafe {
        assert_eq!(classdb_register_class(&name("FfiTestNode"), &name("Node")), 1);
        assert_eq!(classdb_register_class(&name("FfiTestNode"), &name("Node")), 0);
        assert_eq!(classdb_register_class(&name("FfiOrphan"), &name("Nope")), 0);

        let mut callable = MaybeUninit::<RawVariant>::uninit();
        callable_custom_create(callable.as_mut_ptr(), &info);
        let mut callable = callable.assume_init();
        assert_eq!(classdb_register_method(&name("FfiTestNode"), &name("mul"), &callable, -1), 1);
        variant_destroy(&mut callable);

        // Inherited methods resolve on the subclass
        assert!(!classdb_get_method_bind(&name("FfiTestNode"), &name("add_child")).is_null());
        let mul = classdb_get_method_bind(&name("FfiTestNode"), &name("mul"));
        assert!(!mul.is_null());

        // The receiver is argument 0, so a one-argument call reaches the
        // callable as (object, int) and fails its own check
        let obj = classdb_construct_object(&name("FfiTestNode"));
        let a = Value::Int(3).encode();
        let args = [&a as *const RawVariant];
        let mut ret = nil();
        let mut err = CallErrorRaw::OK;
        object_method_bind_call(mul, obj, args.as_ptr(), 1, &mut ret, &mut err);
        assert_eq!(err, CallErrorRaw::too_few(2));
        object_release(obj);
    }
}

#[test]
fn test_method_callable() {
    unsafe {
        let obj = classdb_construct_object(&name("Node"));
        let make = |method: &str| {
            let mut callable = MaybeUninit::<RawVariant>::uninit();
            callable_method_create(callable.as_mut_ptr(), obj, &name(method));
            callable.assume_init()
        };

        let mut first = make("get_child_count");
        let mut second = make("get_child_count");
        let mut other = make("get_parent");
        assert_eq!(variant_get_type(&first), 8);
        assert_eq!(variant_equal(&first, &second), 1);
        assert_eq!(variant_hash(&first), variant_hash(&second));
        assert_eq!(variant_equal(&first, &other), 0);

        let mut ret = nil();
        let mut err = CallErrorRaw::OK;
        variant_call(&mut first, &name("call"), core::ptr::null(), 0, &mut ret, &mut err);
        assert!(err.is_ok());
        assert!(values::read(&ret).equals(&Value::Int(0)));

        let mut missing = make("no_such_method");
        variant_call(&mut missing, &name("is_valid"), core::ptr::null(), 0, &mut ret, &mut err);
        assert!(values::read(&ret).equals(&Value::Bool(false)));

        // A null receiver yields Nil
        let mut empty = MaybeUninit::<RawVariant>::uninit();
        callable_method_create(empty.as_mut_ptr(), core::ptr::null(), &name("get_parent"));
        let mut empty = empty.assume_init();
        assert_eq!(variant_get_type(&empty), 0);

        for v in [&mut first, &mut second, &mut other, &mut missing, &mut empty, &mut ret] {
            variant_destroy(v);
        }
        object_release(obj);
    }
}
