//! Vector3 - builtin composite payload
//!
//! Arithmetic lives in the runtime; every method here resolves the
//! runtime's typed builtin once and calls it with native-layout pointers.

use crate::call::dispatch::resolve_builtin;
use crate::call::pointers::with_pointers;
use crate::core::variant::VariantType;
use crate::sys::BuiltinPtrFn;
use core::ffi::c_void;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

const _: () = assert!(core::mem::size_of::<Vector3>() == 12);

#[inline]
fn ptr_of<T>(value: &T) -> *const c_void {
    value as *const T as *const c_void
}

/// Runtime builtin for `method`; its absence means the runtime does not
/// match the ABI this bridge was built for
fn builtin(method: &'static str) -> BuiltinPtrFn {
    match resolve_builtin(VariantType::Vector3, method) {
        Some(func) => func,
        None => panic!("runtime does not provide Vector3::{}", method),
    }
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3::new(0.0, 0.0, 0.0);
    pub const ONE: Vector3 = Vector3::new(1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Call a builtin with `self` as base, writing the result into `R`
    fn call_builtin<R: Copy>(&self, method: &'static str, args: &[*const c_void], init: R) -> R {
        let func = builtin(method);
        // The runtime receives a mutable base; work on a copy
        let mut base = *self;
        let mut ret = init;
        with_pointers(args.iter().copied(), |ptrs, argc| unsafe {
            func(
                &mut base as *mut Vector3 as *mut c_void,
                ptrs,
                &mut ret as *mut R as *mut c_void,
                argc as i32,
            )
        });
        ret
    }

    pub fn dot(&self, with: Vector3) -> f64 {
        self.call_builtin("dot", &[ptr_of(&with)], 0.0f64)
    }

    pub fn length(&self) -> f64 {
        self.call_builtin("length", &[], 0.0f64)
    }

    pub fn lerp(&self, to: Vector3, weight: f64) -> Vector3 {
        self.call_builtin("lerp", &[ptr_of(&to), ptr_of(&weight)], Vector3::ZERO)
    }

    /// Catmull-Rom interpolation towards `b` with control points `pre_a` and `post_b`
    pub fn cubic_interpolate(&self, b: Vector3, pre_a: Vector3, post_b: Vector3, weight: f64) -> Vector3 {
        self.call_builtin(
            "cubic_interpolate",
            &[ptr_of(&b), ptr_of(&pre_a), ptr_of(&post_b), ptr_of(&weight)],
            Vector3::ZERO,
        )
    }
}
