//! Builtin methods and utility functions
//!
//! Design: receivers without a class table (Vector3, String, Callable) get
//! name-addressed dispatch here; objects fall through to their class.
//! Utility functions are free, variadic and variant-level.

mod string;
pub mod utility;
pub mod vector3;

#[cfg(test)]
mod tests;

pub use utility::UtilityFn;
pub use vector3::BuiltinPtrFn;

use crate::callable;
use crate::error::{CallErrorRaw, CallResult};
use crate::names::Name;
use crate::variant::{Value, VariantType};

/// Resolve a typed builtin method pointer for a payload kind
pub fn lookup_ptr(ty: VariantType, method: Name) -> Option<BuiltinPtrFn> {
    match ty {
        VariantType::Vector3 => vector3::lookup(method.as_str()),
        _ => None,
    }
}

/// Name-addressed call on any value (`variant_call`)
pub fn call_on_value(target: &Value, method: Name, args: &[Value]) -> CallResult<Value> {
    match target {
        Value::Vector3(v) => vector3::call(*v, method.as_str(), args),
        Value::String(s) => string::call(s, method.as_str(), args),
        Value::Callable(c) => callable::call_named(c, method, args),
        Value::Object(obj) => obj.call_method(method, args),
        Value::Nil => Err(CallErrorRaw::instance_is_null()),
        _ => Err(CallErrorRaw::invalid_method()),
    }
}
