//! Invocable references - method bindings and host closures
//!
//! Design:
//! - `BoundMethod` calls go through the dispatcher like any other call
//! - `HostClosure` calls from the host never cross the ABI
//! - `Foreign` wraps a callable the runtime handed us
//!
//! A bound method crosses to the runtime as a plain receiver and name
//! reference. A host closure boxes one `Arc<HostClosure>` as userdata; the
//! runtime calls back through `callable_trampoline` and drops the box
//! through `callable_free` when its last reference goes away. Panics inside
//! a closure are caught at the trampoline.

use crate::call::dispatch;
use crate::call::pointers::MAX_INLINE_ARGS;
use crate::core::convert::{ToVariant, VariantStorable};
use crate::core::string_name::StringName;
use crate::core::variant::{Variant, VariantType};
use crate::error::CallError;
use crate::logging::{log_closure_panic, trace};
use crate::object::Object;
use crate::sys::{self, CallErrorRaw, CallableCustomInfo, ConstVariantPtr, VariantPtr};
use core::ffi::c_void;
use smallvec::SmallVec;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

pub type HostFn = dyn Fn(&[&Variant]) -> Option<Variant> + Send + Sync;

/// Host closure with a diagnostic name
pub struct HostClosure {
    name: String,
    func: Box<HostFn>,
}

impl HostClosure {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn invoke(&self, args: &[&Variant]) -> Option<Variant> {
        (self.func)(args)
    }
}

#[derive(Clone)]
pub enum Callable {
    BoundMethod { receiver: Object, method: StringName },
    HostClosure(Arc<HostClosure>),
    Foreign(Variant),
}

impl Callable {
    pub fn from_object_method(receiver: &Object, method: impl Into<StringName>) -> Self {
        Callable::BoundMethod { receiver: receiver.clone(), method: method.into() }
    }

    pub fn from_fn<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[&Variant]) -> Option<Variant> + Send + Sync + 'static,
    {
        Callable::HostClosure(Arc::new(HostClosure { name: name.into(), func: Box::new(func) }))
    }

    pub fn call(&self, args: &[Variant]) -> Option<Variant> {
        let refs: SmallVec<[&Variant; MAX_INLINE_ARGS]> = args.iter().collect();
        self.call_ref(&refs)
    }

    pub fn call_ref(&self, args: &[&Variant]) -> Option<Variant> {
        match self {
            Callable::BoundMethod { receiver, method } => dispatch::call(receiver, method, args),
            Callable::HostClosure(closure) => closure.invoke(args),
            Callable::Foreign(variant) => {
                let mut target = variant.clone();
                dispatch::call_variant(&mut target, StringName::cached("call"), args)
            }
        }
    }

    /// Whether calling would reach a target
    pub fn is_valid(&self) -> bool {
        match self {
            Callable::BoundMethod { receiver, method } => dispatch::resolve(receiver, method).is_some(),
            Callable::HostClosure(_) => true,
            Callable::Foreign(variant) => {
                let mut target = variant.clone();
                dispatch::call_variant(&mut target, StringName::cached("is_valid"), &[])
                    .and_then(|valid| valid.to_native::<bool>())
                    .unwrap_or(false)
            }
        }
    }

    pub fn method_name(&self) -> Option<&StringName> {
        match self {
            Callable::BoundMethod { method, .. } => Some(method),
            _ => None,
        }
    }

    pub fn object(&self) -> Option<&Object> {
        match self {
            Callable::BoundMethod { receiver, .. } => Some(receiver),
            _ => None,
        }
    }
}

impl ToVariant for Callable {
    fn to_variant(&self) -> Variant {
        match self {
            Callable::BoundMethod { receiver, method } => method_variant(receiver, method),
            Callable::HostClosure(closure) => custom_variant(closure.clone()),
            Callable::Foreign(variant) => variant.clone(),
        }
    }
}

impl VariantStorable for Callable {
    fn from_variant(variant: &Variant) -> Option<Self> {
        match variant.get_type() {
            VariantType::Callable => Some(Callable::Foreign(variant.clone())),
            _ => None,
        }
    }
}

impl From<Callable> for Variant {
    fn from(callable: Callable) -> Variant {
        callable.to_variant()
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::BoundMethod { receiver, method } => write!(f, "{:?}::{}", receiver, method),
            Callable::HostClosure(closure) => write!(f, "Callable({})", closure.name),
            Callable::Foreign(variant) => write!(f, "{}", variant),
        }
    }
}

// ============================================================================
// Runtime-facing trampolines
// ============================================================================

fn method_variant(receiver: &Object, method: &StringName) -> Variant {
    trace!(target: "callable", method = %method, "handing bound method to runtime");
    unsafe {
        Variant::from_uninit(|dst| (sys::interface().callable_method_create)(dst, receiver.as_ptr(), method.as_ptr()))
    }
}

fn custom_variant(closure: Arc<HostClosure>) -> Variant {
    trace!(target: "callable", name = closure.name.as_str(), "handing closure to runtime");
    let info = CallableCustomInfo {
        userdata: Box::into_raw(Box::new(closure)) as *mut c_void,
        call_func: Some(callable_trampoline),
        free_func: Some(callable_free),
    };
    unsafe { Variant::from_uninit(|dst| (sys::interface().callable_custom_create)(dst, &info)) }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.as_str()
    } else {
        "non-string panic payload"
    }
}

unsafe extern "C" fn callable_trampoline(
    userdata: *mut c_void,
    args: *const ConstVariantPtr,
    argc: i64,
    ret: VariantPtr,
    err: *mut CallErrorRaw,
) {
    let closure = &*(userdata as *const Arc<HostClosure>);

    let argc = usize::try_from(argc).unwrap_or(0);
    let raw_args: &[ConstVariantPtr] = if args.is_null() || argc == 0 {
        &[]
    } else {
        core::slice::from_raw_parts(args, argc)
    };
    let borrowed: SmallVec<[&Variant; MAX_INLINE_ARGS]> =
        raw_args.iter().map(|&ptr| Variant::borrow_raw(ptr)).collect();

    let status = match panic::catch_unwind(AssertUnwindSafe(|| closure.invoke(&borrowed))) {
        Ok(result) => {
            if !ret.is_null() {
                result.unwrap_or_default().move_into(ret);
            }
            CallErrorRaw::default()
        }
        Err(payload) => {
            log_closure_panic(&closure.name, panic_message(payload.as_ref()));
            CallError::InvalidMethod.to_raw()
        }
    };

    if !err.is_null() {
        *err = status;
    }
}

unsafe extern "C" fn callable_free(userdata: *mut c_void) {
    if !userdata.is_null() {
        drop(Box::from_raw(userdata as *mut Arc<HostClosure>));
    }
}
