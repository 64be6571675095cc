//! Variant and name entry points
//!
//! Constructors (`*_new_*`, from-type) write into uninitialized buffers.
//! Every other entry point that produces a variant overwrites an
//! initialized buffer and releases what it held.

use crate::builtins;
use crate::error::CallErrorRaw;
use crate::logging::{log_call_error, trace};
use crate::names::{Name, RawStringName};
use crate::variant::{self, RawVariant, Value, VariantType};
use core::ffi::c_void;
use std::sync::Arc;

pub type VariantFromTypeFn = unsafe extern "C" fn(dst: *mut RawVariant, src: *const c_void);
pub type VariantToTypeFn = unsafe extern "C" fn(dst: *mut c_void, src: *const RawVariant);

/// Copy UTF-8 into a caller buffer, returning the full byte length
unsafe fn copy_utf8(text: &str, buf: *mut u8, cap: i64) -> i64 {
    let bytes = text.as_bytes();
    if !buf.is_null() && cap > 0 {
        let n = bytes.len().min(cap as usize);
        core::ptr::copy_nonoverlapping(bytes.as_ptr(), buf, n);
    }
    bytes.len() as i64
}

unsafe fn utf8_arg<'a>(utf8: *const u8, len: i64) -> std::borrow::Cow<'a, str> {
    if utf8.is_null() || len <= 0 {
        return std::borrow::Cow::Borrowed("");
    }
    String::from_utf8_lossy(core::slice::from_raw_parts(utf8, len as usize))
}

// ============================================================================
// Variant lifecycle
// ============================================================================

pub unsafe extern "C" fn variant_new_nil(dst: *mut RawVariant) {
    if !dst.is_null() {
        variant::write_new(dst, Value::Nil);
    }
}

pub unsafe extern "C" fn variant_new_copy(dst: *mut RawVariant, src: *const RawVariant) {
    if !dst.is_null() {
        variant::write_new(dst, variant::read(src));
    }
}

pub unsafe extern "C" fn variant_destroy(v: *mut RawVariant) {
    if !v.is_null() {
        variant::destroy(v);
    }
}

pub unsafe extern "C" fn variant_get_type(v: *const RawVariant) -> u32 {
    v.as_ref().map(|raw| raw.tag()).unwrap_or(VariantType::Nil as u32)
}

pub unsafe extern "C" fn variant_equal(a: *const RawVariant, b: *const RawVariant) -> u8 {
    variant::read(a).equals(&variant::read(b)) as u8
}

pub unsafe extern "C" fn variant_hash(v: *const RawVariant) -> i64 {
    variant::read(v).hash_value()
}

pub unsafe extern "C" fn variant_stringify(v: *const RawVariant, dst: *mut RawVariant) {
    if !dst.is_null() {
        let text = variant::read(v).to_string();
        variant::assign(dst, Value::String(Arc::new(text)));
    }
}

// ============================================================================
// Strings
// ============================================================================

pub unsafe extern "C" fn variant_new_string(dst: *mut RawVariant, utf8: *const u8, len: i64) {
    if !dst.is_null() {
        variant::write_new(dst, Value::string(&utf8_arg(utf8, len)));
    }
}

/// Returns the byte length, or -1 when the variant is not a String
pub unsafe extern "C" fn variant_get_string(v: *const RawVariant, buf: *mut u8, cap: i64) -> i64 {
    match variant::read(v) {
        Value::String(s) => copy_utf8(&s, buf, cap),
        _ => -1,
    }
}

// ============================================================================
// Native layout constructors
// ============================================================================

macro_rules! native_constructors {
    ($($ty:ident => $from:ident, $to:ident;)*) => {
        $(
            unsafe extern "C" fn $from(dst: *mut RawVariant, src: *const c_void) {
                if dst.is_null() {
                    return;
                }
                let value = variant::read_native(src, VariantType::$ty).unwrap_or(Value::Nil);
                variant::write_new(dst, value);
            }

            unsafe extern "C" fn $to(dst: *mut c_void, src: *const RawVariant) {
                variant::write_native(dst, VariantType::$ty, variant::read(src));
            }
        )*

        pub unsafe extern "C" fn get_variant_from_type_constructor(ty: u32) -> Option<VariantFromTypeFn> {
            match VariantType::from_raw(ty) {
                $(Some(VariantType::$ty) => Some($from as VariantFromTypeFn),)*
                _ => None,
            }
        }

        pub unsafe extern "C" fn get_variant_to_type_constructor(ty: u32) -> Option<VariantToTypeFn> {
            match VariantType::from_raw(ty) {
                $(Some(VariantType::$ty) => Some($to as VariantToTypeFn),)*
                _ => None,
            }
        }
    };
}

native_constructors! {
    Bool => bool_to_variant, variant_to_bool;
    Int => int_to_variant, variant_to_int;
    Float => float_to_variant, variant_to_float;
    Vector3 => vector3_to_variant, variant_to_vector3;
    StringName => string_name_to_variant, variant_to_string_name;
    Object => object_to_variant, variant_to_object;
}

// ============================================================================
// Name-addressed calls on any variant
// ============================================================================

/// Finish a call: store the result (Nil on error) and the error record
pub(crate) unsafe fn complete_call(
    what: &str,
    result: Result<Value, CallErrorRaw>,
    ret: *mut RawVariant,
    err: *mut CallErrorRaw,
) {
    let (value, status) = match result {
        Ok(value) => (value, CallErrorRaw::OK),
        Err(e) => {
            log_call_error(what, e.error, e.argument);
            (Value::Nil, e)
        }
    };
    if !ret.is_null() {
        variant::assign(ret, value);
    }
    status.store(err);
}

pub unsafe extern "C" fn variant_call(
    target: *mut RawVariant,
    method: *const RawStringName,
    args: *const *const RawVariant,
    argc: i64,
    ret: *mut RawVariant,
    err: *mut CallErrorRaw,
) {
    let result = match Name::from_raw(method) {
        Some(name) => {
            trace!(target: "runtime", method = name.as_str(), argc, "variant_call");
            let receiver = variant::read(target);
            let values = variant::read_args(args, usize::try_from(argc).unwrap_or(0));
            builtins::call_on_value(&receiver, name, &values)
        }
        None => Err(CallErrorRaw::invalid_method()),
    };
    complete_call("variant_call", result, ret, err);
}

pub unsafe extern "C" fn variant_get_ptr_builtin_method(
    ty: u32,
    method: *const RawStringName,
) -> Option<builtins::BuiltinPtrFn> {
    let ty = VariantType::from_raw(ty)?;
    builtins::lookup_ptr(ty, Name::from_raw(method)?)
}

pub unsafe extern "C" fn variant_get_ptr_utility_function(
    name: *const RawStringName,
) -> Option<builtins::UtilityFn> {
    builtins::utility::lookup(Name::from_raw(name)?.as_str())
}

// ============================================================================
// Interned names
// ============================================================================

pub unsafe extern "C" fn string_name_new(dst: *mut RawStringName, utf8: *const u8, len: i64) {
    if !dst.is_null() {
        dst.write(Name::intern(&utf8_arg(utf8, len)).to_raw());
    }
}

pub unsafe extern "C" fn string_name_new_copy(dst: *mut RawStringName, src: *const RawStringName) {
    if dst.is_null() {
        return;
    }
    let name = Name::from_raw(src).unwrap_or_else(|| Name::intern(""));
    dst.write(name.to_raw());
}

/// Names are never freed
pub unsafe extern "C" fn string_name_destroy(_name: *mut RawStringName) {}

pub unsafe extern "C" fn string_name_to_utf8(name: *const RawStringName, buf: *mut u8, cap: i64) -> i64 {
    match Name::from_raw(name) {
        Some(name) => copy_utf8(name.as_str(), buf, cap),
        None => -1,
    }
}
