//! Object model - reference-counted instances with per-class method tables
//!
//! Design:
//! 1. Objects are `Arc<ObjectData>`; the ABI hands out `Arc::into_raw`
//!    pointers and `object_retain`/`object_release` map to strong counts
//! 2. Classes are leaked `&'static ClassInfo` entries, so method binds have
//!    stable addresses the bridge can cache
//! 3. Per-object state sits behind a `parking_lot::Mutex`; no lock is held
//!    while calling back into host code

mod bind;
mod class;
mod node;

pub use bind::{coerce, BindKind, DefaultArg, MethodBind, NativeMethod, Param};
pub use class::{classdb, ClassDb, ClassInfo, RegisterError};

use crate::error::{CallErrorRaw, CallResult};
use crate::logging::{log_method_call, log_object_free, log_object_new};
use crate::names::Name;
use crate::variant::Value;
use core::ffi::c_void;
use parking_lot::{Mutex, MutexGuard};
use std::mem::ManuallyDrop;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Child slot in the node hierarchy
pub struct ChildEntry {
    pub node: Arc<ObjectData>,
    pub internal: bool,
}

/// Mutable per-object state
#[derive(Default)]
pub struct ObjectState {
    pub name: Option<Name>,
    pub parent: Weak<ObjectData>,
    pub children: Vec<ChildEntry>,
}

/// Runtime object instance
pub struct ObjectData {
    id: u64,
    class: &'static ClassInfo,
    state: Mutex<ObjectState>,
}

impl ObjectData {
    /// Construct a new instance of `class`
    pub fn new(class: &'static ClassInfo) -> Arc<Self> {
        let id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed);
        log_object_new(class.name().as_str(), id);
        Arc::new(Self {
            id,
            class,
            state: Mutex::new(ObjectState::default()),
        })
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn class(&self) -> &'static ClassInfo {
        self.class
    }

    #[inline]
    pub fn state(&self) -> MutexGuard<'_, ObjectState> {
        self.state.lock()
    }

    /// Name-addressed call through the class table
    pub fn call_method(self: &Arc<Self>, method: Name, args: &[Value]) -> CallResult<Value> {
        log_method_call(self.class.name().as_str(), method.as_str(), args.len());
        match self.class.find_method(method) {
            Some(bind) => bind.call(self, args),
            None => Err(CallErrorRaw::invalid_method()),
        }
    }

    /// Hand out one strong reference as an ABI pointer
    #[inline]
    pub fn into_ptr(this: Arc<Self>) -> *mut c_void {
        Arc::into_raw(this) as *mut c_void
    }

    /// Clone a strong reference from an ABI pointer
    ///
    /// # Safety
    /// `ptr` must be null or a live pointer obtained from `into_ptr`.
    pub unsafe fn from_ptr(ptr: *const c_void) -> Option<Arc<Self>> {
        if ptr.is_null() {
            return None;
        }
        let borrowed = ManuallyDrop::new(Arc::from_raw(ptr as *const ObjectData));
        Some(Arc::clone(&borrowed))
    }

    /// # Safety
    /// `ptr` must be a live pointer obtained from `into_ptr`.
    #[inline]
    pub unsafe fn retain(ptr: *const c_void) {
        Arc::increment_strong_count(ptr as *const ObjectData);
    }

    /// # Safety
    /// `ptr` must be a live pointer obtained from `into_ptr`; the caller
    /// gives up the reference it held.
    #[inline]
    pub unsafe fn release(ptr: *const c_void) {
        Arc::decrement_strong_count(ptr as *const ObjectData);
    }
}

impl Drop for ObjectData {
    fn drop(&mut self) {
        log_object_free(self.class.name().as_str(), self.id);
    }
}
