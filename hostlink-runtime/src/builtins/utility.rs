//! Utility functions - receiver-less, variadic, variant-level
//!
//! Design: polymorphic dispatch on payload kind with:
//! - Automatic int → float widening for comparisons
//! - The winning argument is returned unchanged (its kind is preserved)
//! - Arguments are consumed strictly left to right

use crate::error::{CallErrorRaw, CallResult};
use crate::logging::log_utility_call;
use crate::variant::{self, RawVariant, Value, VariantType};
use std::io::Write;

pub type UtilityFn = unsafe extern "C" fn(ret: *mut RawVariant, args: *const *const RawVariant, argc: i32);

type UtilityImpl = fn(&[Value]) -> CallResult<Value>;

/// Compare two numeric values, `None` for non-numeric kinds
#[inline]
fn less_than(a: &Value, b: &Value) -> Option<bool> {
    match (a, b) {
        // Fast path: both integers, no widening
        (Value::Int(x), Value::Int(y)) => Some(x < y),
        _ => Some(a.as_number()? < b.as_number()?),
    }
}

fn check_numeric(args: &[Value]) -> CallResult<()> {
    for (i, arg) in args.iter().enumerate() {
        if !matches!(arg.get_type(), VariantType::Int | VariantType::Float) {
            return Err(CallErrorRaw::invalid_argument(i, VariantType::Float));
        }
    }
    Ok(())
}

/// Fold with a "replace when better" predicate; the first of equal values wins
fn reduce(args: &[Value], better: fn(&Value, &Value) -> bool) -> CallResult<Value> {
    if args.len() < 2 {
        return Err(CallErrorRaw::too_few(2));
    }
    check_numeric(args)?;

    let mut best = &args[0];
    for candidate in &args[1..] {
        if better(candidate, best) {
            best = candidate;
        }
    }
    Ok(best.clone())
}

/// max(a, b, ...) - largest numeric argument
pub fn max(args: &[Value]) -> CallResult<Value> {
    reduce(args, |candidate, best| less_than(best, candidate).unwrap_or(false))
}

/// min(a, b, ...) - smallest numeric argument
pub fn min(args: &[Value]) -> CallResult<Value> {
    reduce(args, |candidate, best| less_than(candidate, best).unwrap_or(false))
}

/// str(...) - concatenated string form of every argument
pub fn str(args: &[Value]) -> CallResult<Value> {
    let mut out = String::new();
    for arg in args {
        out.push_str(&arg.to_string());
    }
    Ok(Value::String(std::sync::Arc::new(out)))
}

/// print(...) - write the concatenated arguments to stdout
pub fn print(args: &[Value]) -> CallResult<Value> {
    if let Ok(Value::String(line)) = str(args) {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        let _ = writeln!(handle, "{}", line);
    }
    Ok(Value::Nil)
}

/// typeof(value) - payload kind code
pub fn type_of(args: &[Value]) -> CallResult<Value> {
    match args {
        [value] => Ok(Value::Int(value.get_type() as i64)),
        [] => Err(CallErrorRaw::too_few(1)),
        _ => Err(CallErrorRaw::too_many(1)),
    }
}

/// absf(x) - absolute value of a float
pub fn absf(args: &[Value]) -> CallResult<Value> {
    match args {
        [value] => match value.as_number() {
            Some(x) => Ok(Value::Float(x.abs())),
            None => Err(CallErrorRaw::invalid_argument(0, VariantType::Float)),
        },
        [] => Err(CallErrorRaw::too_few(1)),
        _ => Err(CallErrorRaw::too_many(1)),
    }
}

/// Shared ABI shim: read arguments, run, write the result (Nil on error)
unsafe fn invoke(name: &str, imp: UtilityImpl, ret: *mut RawVariant, args: *const *const RawVariant, argc: i32) {
    let argc = usize::try_from(argc).unwrap_or(0);
    log_utility_call(name, argc);

    let values = variant::read_args(args, argc);
    let result = match imp(&values) {
        Ok(value) => value,
        Err(err) => {
            crate::logging::log_call_error(name, err.error, err.argument);
            Value::Nil
        }
    };
    if !ret.is_null() {
        variant::assign(ret, result);
    }
}

macro_rules! utility_entry {
    ($($entry:ident => $name:literal, $imp:path;)*) => {
        $(
            unsafe extern "C" fn $entry(ret: *mut RawVariant, args: *const *const RawVariant, argc: i32) {
                invoke($name, $imp, ret, args, argc)
            }
        )*

        /// Resolve a utility function by name
        pub fn lookup(name: &str) -> Option<UtilityFn> {
            match name {
                $($name => Some($entry as UtilityFn),)*
                _ => None,
            }
        }
    };
}

utility_entry! {
    utility_max => "max", max;
    utility_min => "min", min;
    utility_str => "str", str;
    utility_print => "print", print;
    utility_typeof => "typeof", type_of;
    utility_absf => "absf", absf;
}
