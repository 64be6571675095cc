//! Utility functions - receiver-less variadic calls
//!
//! Utilities are resolved by name once and cached as raw entry points.
//! Arguments travel as variant pointers through the same fixed-arity
//! arrays as method calls; more than `MAX_INLINE_ARGS` spill to the heap.
//!
//! The runtime reports no error record for utilities: a rejected call
//! writes nil into the result buffer.

use crate::call::pointers::{with_pointers, MAX_INLINE_ARGS};
use crate::config;
use crate::core::string_name::StringName;
use crate::core::variant::Variant;
use crate::logging::{debug, log_call};
use crate::sys::{self, UtilityFn};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use smallvec::SmallVec;

static UTILITIES: Lazy<DashMap<u64, UtilityFunction>> = Lazy::new(DashMap::new);

/// Resolved utility entry point
#[derive(Clone, Copy)]
pub struct UtilityFunction {
    func: UtilityFn,
}

impl UtilityFunction {
    pub fn resolve(name: &StringName) -> Option<UtilityFunction> {
        Self::resolve_with(name, config::current().dispatch.utility_cache)
    }

    pub(crate) fn resolve_with(name: &StringName, use_cache: bool) -> Option<UtilityFunction> {
        if use_cache {
            if let Some(found) = UTILITIES.get(&name.key()) {
                return Some(*found);
            }
        }

        let Some(func) = (unsafe { (sys::interface().variant_get_ptr_utility_function)(name.as_ptr()) }) else {
            debug!(target: "dispatch", utility = %name, "utility not resolved");
            return None;
        };
        let found = UtilityFunction { func };
        if use_cache {
            // Names are interned by the runtime, so the key outlives this entry
            UTILITIES.entry(name.key()).or_insert(found);
        }
        Some(found)
    }

    pub fn call(&self, args: &[&Variant]) -> Variant {
        let func = self.func;
        unsafe {
            Variant::new_with(|ret| {
                with_pointers(args.iter().map(|arg| arg.as_ptr()), |ptrs, argc| {
                    func(ret, ptrs, argc as i32)
                })
            })
        }
    }
}

/// Call the utility `name`; `None` when the runtime has no such utility
pub fn call_variadic(name: &StringName, args: &[&Variant]) -> Option<Variant> {
    log_call(name, args.len());
    UtilityFunction::resolve(name).map(|utility| utility.call(args))
}

/// Typed wrappers over the runtime's utilities
pub mod utility {
    use super::*;
    use crate::core::convert::ToVariant;

    fn call_cached(name: &'static str, args: &[&Variant]) -> Option<Variant> {
        call_variadic(StringName::cached(name), args)
    }

    fn with_rest<'a>(a: &'a Variant, b: &'a Variant, rest: &'a [Variant]) -> SmallVec<[&'a Variant; MAX_INLINE_ARGS]> {
        let mut args = SmallVec::with_capacity(rest.len() + 2);
        args.push(a);
        args.push(b);
        args.extend(rest.iter());
        args
    }

    /// Largest numeric argument, its kind preserved; nil when any argument
    /// is non-numeric
    pub fn max(a: &Variant, b: &Variant, rest: &[Variant]) -> Variant {
        call_cached("max", &with_rest(a, b, rest)).unwrap_or_default()
    }

    /// Smallest numeric argument; see `max`
    pub fn min(a: &Variant, b: &Variant, rest: &[Variant]) -> Variant {
        call_cached("min", &with_rest(a, b, rest)).unwrap_or_default()
    }

    /// Concatenated text form of every argument
    pub fn str(args: &[&Variant]) -> Option<String> {
        call_cached("str", args)?.to_native::<String>()
    }

    pub fn print(args: &[&Variant]) {
        call_cached("print", args);
    }

    pub fn typeof_(value: &Variant) -> Option<i64> {
        call_cached("typeof", &[value])?.to_native::<i64>()
    }

    pub fn absf(x: f64) -> Option<f64> {
        call_cached("absf", &[&x.to_variant()])?.to_native::<f64>()
    }
}
