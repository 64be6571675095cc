//! Vector3 builtin methods
//!
//! Each method has two entry points:
//! - A typed pointer form (`BuiltinPtrFn`) where the receiver, every
//!   argument and the result are raw pointers to native layouts
//! - A variant-level form used by `variant_call`

use crate::error::{CallErrorRaw, CallResult};
use crate::objects::coerce;
use crate::variant::{Value, VariantType};
use core::ffi::c_void;

pub type BuiltinPtrFn =
    unsafe extern "C" fn(base: *mut c_void, args: *const *const c_void, ret: *mut c_void, argc: i32);

pub type Vec3 = [f32; 3];

#[inline]
fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn scale(a: Vec3, s: f32) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub fn dot(a: Vec3, b: Vec3) -> f64 {
    (a[0] * b[0] + a[1] * b[1] + a[2] * b[2]) as f64
}

pub fn length(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

pub fn lerp(from: Vec3, to: Vec3, weight: f64) -> Vec3 {
    add(from, scale(sub(to, from), weight as f32))
}

/// Catmull-Rom interpolation between `from` and `to`
pub fn cubic_interpolate(from: Vec3, to: Vec3, pre: Vec3, post: Vec3, weight: f64) -> Vec3 {
    let w = weight as f32;
    let w2 = w * w;
    let w3 = w2 * w;

    let mut out = [0.0f32; 3];
    for i in 0..3 {
        let (p0, p1, p2, p3) = (pre[i], from[i], to[i], post[i]);
        out[i] = 0.5
            * ((p1 * 2.0)
                + (-p0 + p2) * w
                + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * w2
                + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * w3);
    }
    out
}

// ============================================================================
// Typed pointer entry points
// ============================================================================

#[inline]
unsafe fn arg<T: Copy>(args: *const *const c_void, index: usize) -> T {
    *(*args.add(index) as *const T)
}

unsafe extern "C" fn ptr_dot(base: *mut c_void, args: *const *const c_void, ret: *mut c_void, argc: i32) {
    if base.is_null() || args.is_null() || ret.is_null() || argc < 1 {
        return;
    }
    *(ret as *mut f64) = dot(*(base as *const Vec3), arg(args, 0));
}

unsafe extern "C" fn ptr_length(base: *mut c_void, _args: *const *const c_void, ret: *mut c_void, _argc: i32) {
    if base.is_null() || ret.is_null() {
        return;
    }
    *(ret as *mut f64) = length(*(base as *const Vec3));
}

unsafe extern "C" fn ptr_lerp(base: *mut c_void, args: *const *const c_void, ret: *mut c_void, argc: i32) {
    if base.is_null() || args.is_null() || ret.is_null() || argc < 2 {
        return;
    }
    *(ret as *mut Vec3) = lerp(*(base as *const Vec3), arg(args, 0), arg(args, 1));
}

unsafe extern "C" fn ptr_cubic_interpolate(
    base: *mut c_void,
    args: *const *const c_void,
    ret: *mut c_void,
    argc: i32,
) {
    if base.is_null() || args.is_null() || ret.is_null() || argc < 4 {
        return;
    }
    *(ret as *mut Vec3) = cubic_interpolate(
        *(base as *const Vec3),
        arg(args, 0),
        arg(args, 1),
        arg(args, 2),
        arg(args, 3),
    );
}

/// Resolve a typed builtin method by name
pub fn lookup(method: &str) -> Option<BuiltinPtrFn> {
    match method {
        "dot" => Some(ptr_dot as BuiltinPtrFn),
        "length" => Some(ptr_length as BuiltinPtrFn),
        "lerp" => Some(ptr_lerp as BuiltinPtrFn),
        "cubic_interpolate" => Some(ptr_cubic_interpolate as BuiltinPtrFn),
        _ => None,
    }
}

// ============================================================================
// Variant-level entry point
// ============================================================================

fn expect_args(args: &[Value], types: &[VariantType]) -> CallResult<Vec<Value>> {
    if args.len() > types.len() {
        return Err(CallErrorRaw::too_many(types.len()));
    }
    if args.len() < types.len() {
        return Err(CallErrorRaw::too_few(types.len()));
    }
    args.iter()
        .zip(types)
        .enumerate()
        .map(|(i, (arg, ty))| coerce(arg, *ty).ok_or(CallErrorRaw::invalid_argument(i, *ty)))
        .collect()
}

fn vec_of(value: &Value) -> Vec3 {
    match value {
        Value::Vector3(v) => *v,
        _ => [0.0; 3],
    }
}

fn float_of(value: &Value) -> f64 {
    value.as_number().unwrap_or(0.0)
}

/// `variant_call` on a Vector3 receiver
pub fn call(base: Vec3, method: &str, args: &[Value]) -> CallResult<Value> {
    use VariantType::{Float, Vector3};
    match method {
        "dot" => {
            let a = expect_args(args, &[Vector3])?;
            Ok(Value::Float(dot(base, vec_of(&a[0]))))
        }
        "length" => {
            expect_args(args, &[])?;
            Ok(Value::Float(length(base)))
        }
        "lerp" => {
            let a = expect_args(args, &[Vector3, Float])?;
            Ok(Value::Vector3(lerp(base, vec_of(&a[0]), float_of(&a[1]))))
        }
        "cubic_interpolate" => {
            let a = expect_args(args, &[Vector3, Vector3, Vector3, Float])?;
            Ok(Value::Vector3(cubic_interpolate(
                base,
                vec_of(&a[0]),
                vec_of(&a[1]),
                vec_of(&a[2]),
                float_of(&a[3]),
            )))
        }
        _ => Err(CallErrorRaw::invalid_method()),
    }
}
