//! Callables - first-class call targets held inside variants
//!
//! Two kinds:
//! - Custom: opaque userdata plus call/free entry points supplied by the
//!   bridge (host closures). The free entry point runs exactly once, when
//!   the last runtime reference is released.
//! - Method: an object reference plus a method name, dispatched through the
//!   object's class table.

use crate::error::{CallErrorRaw, CallResult};
use crate::names::Name;
use crate::objects::ObjectData;
use crate::variant::{RawVariant, Value};
use core::ffi::c_void;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

pub type CallableCallFn = unsafe extern "C" fn(
    userdata: *mut c_void,
    args: *const *const RawVariant,
    argc: i64,
    ret: *mut RawVariant,
    err: *mut CallErrorRaw,
);

pub type CallableFreeFn = unsafe extern "C" fn(userdata: *mut c_void);

/// Registration record passed to `callable_custom_create`
#[repr(C)]
pub struct CallableCustomInfo {
    pub userdata: *mut c_void,
    pub call_func: Option<CallableCallFn>,
    pub free_func: Option<CallableFreeFn>,
}

static NEXT_CALLABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Host-provided callable
pub struct CustomCallable {
    id: u64,
    userdata: *mut c_void,
    call_func: CallableCallFn,
    free_func: Option<CallableFreeFn>,
}

// The bridge guarantees its userdata may be shared and invoked from any thread.
unsafe impl Send for CustomCallable {}
unsafe impl Sync for CustomCallable {}

impl CustomCallable {
    /// # Safety
    /// `userdata` must stay valid until `free_func` is called.
    pub unsafe fn new(
        userdata: *mut c_void,
        call_func: CallableCallFn,
        free_func: Option<CallableFreeFn>,
    ) -> Self {
        Self {
            id: NEXT_CALLABLE_ID.fetch_add(1, Ordering::Relaxed),
            userdata,
            call_func,
            free_func,
        }
    }

    fn call(&self, args: &[Value]) -> CallResult<Value> {
        // Arguments are lent to the host for the duration of the call
        let raw_args: Vec<RawVariant> = args.iter().cloned().map(Value::encode).collect();
        let ptrs: Vec<*const RawVariant> = raw_args.iter().map(|r| r as *const RawVariant).collect();
        let mut ret = Value::Nil.encode();
        let mut err = CallErrorRaw::OK;

        trace!(target: "runtime", callable = self.id, args = args.len(), "custom callable call");

        unsafe {
            (self.call_func)(
                self.userdata,
                if ptrs.is_empty() { core::ptr::null() } else { ptrs.as_ptr() },
                ptrs.len() as i64,
                &mut ret,
                &mut err,
            );
        }

        for raw in raw_args {
            drop(unsafe { Value::decode_take(raw) });
        }
        let result = unsafe { Value::decode_take(ret) };

        if err.is_ok() {
            Ok(result)
        } else {
            Err(err)
        }
    }
}

impl Drop for CustomCallable {
    fn drop(&mut self) {
        debug!(target: "runtime", callable = self.id, "releasing custom callable");
        if let Some(free) = self.free_func {
            unsafe { free(self.userdata) };
        }
    }
}

/// Callable payload stored behind `Value::Callable`
pub enum CallableData {
    Custom(CustomCallable),
    Method { object: Arc<ObjectData>, method: Name },
}

impl CallableData {
    /// Invoke with owned arguments
    pub fn call(&self, args: &[Value]) -> CallResult<Value> {
        match self {
            CallableData::Custom(custom) => custom.call(args),
            CallableData::Method { object, method } => object.call_method(*method, args),
        }
    }

    /// Two callables are equal when they target the same code
    pub fn same_target(&self, other: &CallableData) -> bool {
        match (self, other) {
            (CallableData::Custom(a), CallableData::Custom(b)) => a.id == b.id,
            (
                CallableData::Method { object: oa, method: ma },
                CallableData::Method { object: ob, method: mb },
            ) => Arc::ptr_eq(oa, ob) && ma == mb,
            _ => false,
        }
    }

    /// Hash consistent with `same_target`
    pub fn hash_target<H: Hasher>(&self, state: &mut H) {
        match self {
            CallableData::Custom(custom) => custom.id.hash(state),
            CallableData::Method { object, method } => {
                object.id().hash(state);
                method.hash(state);
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            CallableData::Custom(_) => true,
            CallableData::Method { object, method } => object.class().find_method(*method).is_some(),
        }
    }
}

impl fmt::Display for CallableData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallableData::Custom(c) => write!(f, "Callable(custom#{})", c.id),
            CallableData::Method { object, method } => {
                write!(f, "<{}#{}>::{}", object.class().name(), object.id(), method)
            }
        }
    }
}

/// Dispatch a named call on a callable value (`call`, `is_valid`)
pub fn call_named(callable: &CallableData, method: Name, args: &[Value]) -> CallResult<Value> {
    match method.as_str() {
        "call" => callable.call(args),
        "is_valid" if args.is_empty() => Ok(Value::Bool(callable.is_valid())),
        "is_valid" => Err(CallErrorRaw::too_many(0)),
        _ => Err(CallErrorRaw::invalid_method()),
    }
}

/// Bound method callable; holds one strong reference to `object`
pub fn bound_method(object: Arc<ObjectData>, method: Name) -> Value {
    trace!(target: "runtime", object = object.id(), method = method.as_str(), "method callable created");
    Value::Callable(Arc::new(CallableData::Method { object, method }))
}

/// Build a custom callable variant from a registration record
///
/// # Safety
/// `info` must be valid; see `CustomCallable::new`.
pub unsafe fn from_info(info: &CallableCustomInfo) -> Option<Value> {
    let call_func = info.call_func?;
    let custom = CustomCallable::new(info.userdata, call_func, info.free_func);
    Some(Value::Callable(Arc::new(CallableData::Custom(custom))))
}
