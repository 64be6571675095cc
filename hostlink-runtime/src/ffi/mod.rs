//! C ABI - entry points resolved by name
//!
//! Design: a single exported symbol, `hostlink_get_proc_address`, maps
//! entry point names to function pointers. Callers cast each pointer back
//! to its documented signature:
//! 1. Variant lifecycle, strings and native layout constructors
//! 2. Interned names
//! 3. Class database, method binds and object reference counting
//! 4. Builtin methods, utility functions and custom callables
//!
//! No entry point unwinds; failures are reported through return values,
//! null pointers or a `CallErrorRaw`.

mod object;
mod variant;

pub use object::*;
pub use variant::*;

use crate::logging::debug;
use core::ffi::{c_char, CStr};

/// Untyped entry point as returned by `hostlink_get_proc_address`
pub type ProcAddress = unsafe extern "C" fn();

macro_rules! proc_table {
    ($($name:ident),* $(,)?) => {
        /// Resolve an entry point by name
        pub fn lookup(name: &str) -> Option<ProcAddress> {
            match name {
                $(
                    // SAFETY: function pointers share one representation; the
                    // caller casts back to the real signature before calling.
                    stringify!($name) => Some(unsafe {
                        core::mem::transmute::<*const (), ProcAddress>($name as *const ())
                    }),
                )*
                _ => None,
            }
        }

        /// Every entry point name this runtime exports
        pub const ENTRY_POINTS: &[&str] = &[$(stringify!($name)),*];
    };
}

proc_table! {
    variant_new_nil,
    variant_new_copy,
    variant_destroy,
    variant_get_type,
    variant_equal,
    variant_hash,
    variant_stringify,
    variant_new_string,
    variant_get_string,
    get_variant_from_type_constructor,
    get_variant_to_type_constructor,
    variant_call,
    string_name_new,
    string_name_new_copy,
    string_name_destroy,
    string_name_to_utf8,
    classdb_get_method_bind,
    classdb_construct_object,
    classdb_register_class,
    classdb_register_method,
    object_method_bind_call,
    object_method_bind_ptrcall,
    object_get_class_name,
    object_retain,
    object_release,
    object_get_instance_id,
    variant_get_ptr_builtin_method,
    variant_get_ptr_utility_function,
    callable_custom_create,
    callable_method_create,
}

/// Name-based entry point lookup exported to the bridge
///
/// # Safety
/// `name` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn hostlink_get_proc_address(name: *const c_char) -> Option<ProcAddress> {
    if name.is_null() {
        return None;
    }
    let name = CStr::from_ptr(name).to_str().ok()?;
    let entry = lookup(name);
    if entry.is_none() {
        debug!(target: "runtime", symbol = name, "unknown entry point requested");
    }
    entry
}

#[cfg(test)]
mod tests;
