//! Class database and object entry points
//!
//! Object pointers handed out here are `Arc::into_raw` pointers; each one
//! owns a strong reference the receiver must give back with
//! `object_release`.

use super::variant::complete_call;
use crate::callable::{self, CallableCustomInfo};
use crate::error::CallErrorRaw;
use crate::logging::{debug, warn};
use crate::names::{Name, RawStringName};
use crate::objects::{classdb, MethodBind, ObjectData};
use crate::variant::{self, RawVariant, Value};
use core::ffi::c_void;

#[inline]
unsafe fn bind_ref<'a>(bind: *const c_void) -> Option<&'a MethodBind> {
    (bind as *const MethodBind).as_ref()
}

// ============================================================================
// Class database
// ============================================================================

/// Resolve a method bind; null when the class or method is unknown
pub unsafe extern "C" fn classdb_get_method_bind(
    class: *const RawStringName,
    method: *const RawStringName,
) -> *const c_void {
    let (Some(class), Some(method)) = (Name::from_raw(class), Name::from_raw(method)) else {
        return core::ptr::null();
    };
    match classdb().get(class).and_then(|info| info.find_method(method)) {
        Some(bind) => bind as *const MethodBind as *const c_void,
        None => {
            debug!(target: "runtime", class = class.as_str(), method = method.as_str(), "method bind not found");
            core::ptr::null()
        }
    }
}

/// Construct an instance; null when the class is unknown
pub unsafe extern "C" fn classdb_construct_object(class: *const RawStringName) -> *mut c_void {
    match Name::from_raw(class).and_then(|name| classdb().get(name)) {
        Some(info) => ObjectData::into_ptr(ObjectData::new(info)),
        None => core::ptr::null_mut(),
    }
}

pub unsafe extern "C" fn classdb_register_class(class: *const RawStringName, parent: *const RawStringName) -> u8 {
    let (Some(class), Some(parent)) = (Name::from_raw(class), Name::from_raw(parent)) else {
        return 0;
    };
    match classdb().register(class, parent) {
        Ok(_) => 1,
        Err(e) => {
            warn!(target: "runtime", error = %e, "class registration rejected");
            0
        }
    }
}

/// Register a host method backed by a callable; `argc < 0` accepts any arity
pub unsafe extern "C" fn classdb_register_method(
    class: *const RawStringName,
    method: *const RawStringName,
    callable: *const RawVariant,
    argc: i64,
) -> u8 {
    let (Some(class), Some(method)) = (Name::from_raw(class), Name::from_raw(method)) else {
        return 0;
    };
    let Value::Callable(callable) = variant::read(callable) else {
        return 0;
    };
    let argc = usize::try_from(argc).ok();
    match classdb().register_method(class, MethodBind::extension(method, callable, argc)) {
        Ok(_) => 1,
        Err(e) => {
            warn!(target: "runtime", error = %e, "method registration rejected");
            0
        }
    }
}

// ============================================================================
// Method binds
// ============================================================================

pub unsafe extern "C" fn object_method_bind_call(
    bind: *const c_void,
    object: *mut c_void,
    args: *const *const RawVariant,
    argc: i64,
    ret: *mut RawVariant,
    err: *mut CallErrorRaw,
) {
    let result = match (bind_ref(bind), ObjectData::from_ptr(object)) {
        (_, None) => Err(CallErrorRaw::instance_is_null()),
        (None, _) => Err(CallErrorRaw::invalid_method()),
        (Some(bind), Some(object)) => {
            let values = variant::read_args(args, usize::try_from(argc).unwrap_or(0));
            bind.call(&object, &values)
        }
    };
    let what = bind_ref(bind).map(|b| b.name().as_str()).unwrap_or("<null bind>");
    complete_call(what, result, ret, err);
}

/// Typed call; there is no error channel, failures are logged and leave
/// `ret` untouched
pub unsafe extern "C" fn object_method_bind_ptrcall(
    bind: *const c_void,
    object: *mut c_void,
    args: *const *const c_void,
    ret: *mut c_void,
) {
    let (Some(bind), Some(object)) = (bind_ref(bind), ObjectData::from_ptr(object)) else {
        warn!(target: "runtime", "ptrcall with null bind or instance");
        return;
    };
    if let Err(e) = bind.ptrcall(&object, args, ret) {
        crate::logging::log_call_error(bind.name().as_str(), e.error, e.argument);
    }
}

// ============================================================================
// Objects
// ============================================================================

pub unsafe extern "C" fn object_get_class_name(object: *const c_void, dst: *mut RawStringName) {
    if dst.is_null() {
        return;
    }
    let name = match ObjectData::from_ptr(object) {
        Some(obj) => obj.class().name(),
        None => Name::intern(""),
    };
    dst.write(name.to_raw());
}

pub unsafe extern "C" fn object_retain(object: *mut c_void) {
    if !object.is_null() {
        ObjectData::retain(object);
    }
}

pub unsafe extern "C" fn object_release(object: *mut c_void) {
    if !object.is_null() {
        ObjectData::release(object);
    }
}

pub unsafe extern "C" fn object_get_instance_id(object: *const c_void) -> u64 {
    ObjectData::from_ptr(object).map(|obj| obj.id()).unwrap_or(0)
}

// ============================================================================
// Callables
// ============================================================================

/// Wrap host userdata in a callable; a record without a call function
/// produces Nil
pub unsafe extern "C" fn callable_custom_create(dst: *mut RawVariant, info: *const CallableCustomInfo) {
    if dst.is_null() {
        return;
    }
    let value = info.as_ref().and_then(|info| callable::from_info(info)).unwrap_or(Value::Nil);
    variant::write_new(dst, value);
}

/// Reference `method` on `object`; a null object or invalid name produces Nil
///
/// The method is not resolved here: `is_valid` reports whether it exists.
pub unsafe extern "C" fn callable_method_create(
    dst: *mut RawVariant,
    object: *const c_void,
    method: *const RawStringName,
) {
    if dst.is_null() {
        return;
    }
    let value = match (ObjectData::from_ptr(object), Name::from_raw(method)) {
        (Some(object), Some(method)) => callable::bound_method(object, method),
        _ => Value::Nil,
    };
    variant::write_new(dst, value);
}
